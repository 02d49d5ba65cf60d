//! Field/operator/value tests shared by triggers and the `condition` action.
//!
//! Evaluation is permissive about types: ordered comparisons coerce both
//! sides to floats (numeric strings included) and fail with a type error when
//! a side is not numeric; equality falls back to strict JSON equality.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::context::lookup_path;
use super::errors::ConditionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    In,
    NotIn,
    Regex,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::Regex => "regex",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ConditionOperator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equals" => Ok(Self::Equals),
            "not_equals" => Ok(Self::NotEquals),
            "contains" => Ok(Self::Contains),
            "greater_than" => Ok(Self::GreaterThan),
            "less_than" => Ok(Self::LessThan),
            "in" => Ok(Self::In),
            "not_in" => Ok(Self::NotIn),
            "regex" => Ok(Self::Regex),
            other => Err(format!("invalid condition operator: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

impl Condition {
    /// Evaluate against a JSON object (trigger data or execution context).
    /// A missing field reads as JSON null.
    pub fn evaluate(&self, data: &Value) -> Result<bool, ConditionError> {
        let actual = lookup_path(data, &self.field).cloned().unwrap_or(Value::Null);

        match self.operator {
            ConditionOperator::Equals => Ok(loose_eq(&actual, &self.value)),
            ConditionOperator::NotEquals => Ok(!loose_eq(&actual, &self.value)),
            ConditionOperator::Contains => Ok(contains(&actual, &self.value)),
            ConditionOperator::GreaterThan => {
                Ok(self.as_number(&actual)? > self.as_number(&self.value)?)
            }
            ConditionOperator::LessThan => {
                Ok(self.as_number(&actual)? < self.as_number(&self.value)?)
            }
            ConditionOperator::In => Ok(membership(&actual, &self.value)),
            ConditionOperator::NotIn => Ok(!membership(&actual, &self.value)),
            ConditionOperator::Regex => self.regex_match(&actual),
        }
    }

    /// All conditions must pass (AND semantics). An empty list passes.
    pub fn evaluate_all(conditions: &[Condition], data: &Value) -> Result<bool, ConditionError> {
        for condition in conditions {
            if !condition.evaluate(data)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn as_number(&self, value: &Value) -> Result<f64, ConditionError> {
        match value {
            Value::Number(n) => n.as_f64().ok_or_else(|| self.non_numeric(value)),
            Value::String(s) => s.parse().map_err(|_| self.non_numeric(value)),
            _ => Err(self.non_numeric(value)),
        }
    }

    fn non_numeric(&self, value: &Value) -> ConditionError {
        ConditionError::NonNumeric {
            field: self.field.clone(),
            value: value.to_string(),
        }
    }

    fn regex_match(&self, actual: &Value) -> Result<bool, ConditionError> {
        let pattern = match &self.value {
            Value::String(s) => s.as_str(),
            other => {
                return Err(ConditionError::InvalidRegex {
                    pattern: other.to_string(),
                    reason: "pattern must be a string".to_string(),
                })
            }
        };
        let regex = Regex::new(pattern).map_err(|e| ConditionError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(regex.is_match(&render(actual)))
    }
}

/// Numbers compare as floats regardless of representation; everything else
/// uses strict JSON equality.
fn loose_eq(a: &Value, b: &Value) -> bool {
    if let (Value::Number(x), Value::Number(y)) = (a, b) {
        if let (Some(x), Some(y)) = (x.as_f64(), y.as_f64()) {
            return x == y;
        }
    }
    a == b
}

/// String containment for strings, element membership for arrays.
fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(s) => s.contains(&render(expected)),
        Value::Array(items) => items.iter().any(|item| loose_eq(item, expected)),
        _ => false,
    }
}

/// Whether `actual` is an element of the expected array.
fn membership(actual: &Value, expected: &Value) -> bool {
    match expected {
        Value::Array(items) => items.iter().any(|item| loose_eq(item, actual)),
        _ => false,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
