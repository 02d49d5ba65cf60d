//! Mutable key-value context threaded through one workflow execution.
//!
//! Seeded with the trigger data and workflow/execution identifiers; each
//! action may store its result under a caller-chosen key (`save_result_as`)
//! for later actions to reference through `{{variable}}` placeholders.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::{Map, Value};
use uuid::Uuid;

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("valid pattern"))
}

#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    values: Map<String, Value>,
}

impl ExecutionContext {
    /// Seed a context from trigger data. Top-level object keys of the trigger
    /// data become context keys; scalar trigger data is stored under
    /// `"trigger"`.
    pub fn seeded(workflow_id: Uuid, execution_id: Uuid, trigger_data: &Value) -> Self {
        let mut values = Map::new();
        match trigger_data {
            Value::Object(map) => values.extend(map.clone()),
            Value::Null => {}
            other => {
                values.insert("trigger".to_string(), other.clone());
            }
        }
        values.insert("workflow_id".to_string(), Value::String(workflow_id.to_string()));
        values.insert(
            "execution_id".to_string(),
            Value::String(execution_id.to_string()),
        );
        Self { values }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Dotted-path lookup (`"response.status"`).
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut parts = path.split('.');
        let first = parts.next()?;
        let mut current = self.values.get(first)?;
        for part in parts {
            current = current.get(part)?;
        }
        Some(current)
    }

    pub fn as_json(&self) -> Value {
        Value::Object(self.values.clone())
    }

    /// Replace `{{variable}}` placeholders in `template` from this context,
    /// recursing through objects and arrays. A string that is exactly one
    /// placeholder resolves to the raw value (numbers stay numbers); mixed
    /// strings interpolate scalar renderings. Unresolved placeholders are
    /// left verbatim.
    pub fn substitute(&self, template: &Value) -> Value {
        match template {
            Value::String(s) => self.substitute_string(s),
            Value::Array(items) => {
                Value::Array(items.iter().map(|v| self.substitute(v)).collect())
            }
            Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), self.substitute(v)))
                    .collect(),
            ),
            other => other.clone(),
        }
    }

    fn substitute_string(&self, s: &str) -> Value {
        let re = placeholder_regex();

        // A lone placeholder keeps the referenced value's type.
        if let Some(caps) = re.captures(s) {
            let full = caps.get(0).expect("capture 0");
            if full.start() == 0 && full.end() == s.len() {
                let path = &caps[1];
                return self.get(path).cloned().unwrap_or_else(|| Value::String(s.to_string()));
            }
        }

        let replaced = re.replace_all(s, |caps: &regex::Captures<'_>| {
            match self.get(&caps[1]) {
                Some(value) => render_scalar(value),
                None => caps[0].to_string(),
            }
        });
        Value::String(replaced.into_owned())
    }
}

/// Dotted-path lookup into an arbitrary JSON value.
pub fn lookup_path<'a>(data: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = data;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn context() -> ExecutionContext {
        let mut ctx = ExecutionContext::seeded(
            Uuid::new_v4(),
            Uuid::new_v4(),
            &json!({"deal_name": "Atlas", "amount": 250, "nested": {"stage": "loi"}}),
        );
        ctx.insert("api_result", json!({"status": 200}));
        ctx
    }

    #[test]
    fn lone_placeholder_keeps_type() {
        let ctx = context();
        assert_eq!(ctx.substitute(&json!("{{amount}}")), json!(250));
    }

    #[test]
    fn mixed_string_interpolates() {
        let ctx = context();
        assert_eq!(
            ctx.substitute(&json!("Deal {{deal_name}} at {{amount}}")),
            json!("Deal Atlas at 250")
        );
    }

    #[test]
    fn dotted_paths_resolve() {
        let ctx = context();
        assert_eq!(ctx.substitute(&json!("{{nested.stage}}")), json!("loi"));
        assert_eq!(ctx.substitute(&json!("{{api_result.status}}")), json!(200));
    }

    #[test]
    fn unresolved_placeholders_are_left_verbatim() {
        let ctx = context();
        assert_eq!(
            ctx.substitute(&json!("hello {{missing}}")),
            json!("hello {{missing}}")
        );
    }

    #[test]
    fn substitution_recurses_through_structures() {
        let ctx = context();
        let template = json!({
            "url": "https://crm.example.com/deals/{{deal_name}}",
            "tags": ["{{nested.stage}}", "fixed"],
        });
        assert_eq!(
            ctx.substitute(&template),
            json!({
                "url": "https://crm.example.com/deals/Atlas",
                "tags": ["loi", "fixed"],
            })
        );
    }

    #[test]
    fn scalar_trigger_data_lands_under_trigger_key() {
        let ctx = ExecutionContext::seeded(Uuid::new_v4(), Uuid::new_v4(), &json!("ping"));
        assert_eq!(ctx.get("trigger"), Some(&json!("ping")));
    }
}
