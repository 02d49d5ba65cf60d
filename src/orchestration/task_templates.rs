//! # Deal Task Templates
//!
//! Code-defined task catalogs keyed by deal type. Every deal type shares the
//! 8-step M&A base sequence; mergers append a regulatory approval step.
//! Template ids are internal to a set: every `depends_on` entry must resolve
//! inside the set and the set must be acyclic, which is validated before any
//! task is persisted.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::TaskPriority;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealType {
    Acquisition,
    Merger,
    Divestiture,
    JointVenture,
}

impl fmt::Display for DealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquisition => write!(f, "acquisition"),
            Self::Merger => write!(f, "merger"),
            Self::Divestiture => write!(f, "divestiture"),
            Self::JointVenture => write!(f, "joint_venture"),
        }
    }
}

impl FromStr for DealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acquisition" => Ok(Self::Acquisition),
            "merger" => Ok(Self::Merger),
            "divestiture" => Ok(Self::Divestiture),
            "joint_venture" => Ok(Self::JointVenture),
            other => Err(format!("unknown deal type: {other}")),
        }
    }
}

/// A single code-defined task template.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskTemplate {
    pub template_id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub priority: TaskPriority,
    pub estimated_hours: f64,
    /// Due-date offset from task creation.
    pub due_in_days: i64,
    pub deliverables: &'static [&'static str],
    pub acceptance_criteria: &'static [&'static str],
    /// Template ids that must complete before this step.
    pub depends_on: &'static [&'static str],
}

const BASE_TEMPLATES: &[TaskTemplate] = &[
    TaskTemplate {
        template_id: "initial_review",
        title: "Initial Deal Review",
        description: "Review the deal thesis, target overview and strategic fit",
        priority: TaskPriority::High,
        estimated_hours: 8.0,
        due_in_days: 3,
        deliverables: &["Deal summary memo"],
        acceptance_criteria: &["Go/no-go recommendation documented"],
        depends_on: &[],
    },
    TaskTemplate {
        template_id: "nda_execution",
        title: "NDA Execution",
        description: "Negotiate and execute the non-disclosure agreement",
        priority: TaskPriority::High,
        estimated_hours: 4.0,
        due_in_days: 5,
        deliverables: &["Executed NDA"],
        acceptance_criteria: &["Countersigned NDA on file"],
        depends_on: &["initial_review"],
    },
    TaskTemplate {
        template_id: "financial_analysis",
        title: "Financial Analysis",
        description: "Build the financial model from target financial statements",
        priority: TaskPriority::Critical,
        estimated_hours: 24.0,
        due_in_days: 14,
        deliverables: &["Three-statement model", "Quality of earnings summary"],
        acceptance_criteria: &["Model reviewed by deal lead"],
        depends_on: &["nda_execution"],
    },
    TaskTemplate {
        template_id: "market_analysis",
        title: "Market Analysis",
        description: "Assess market size, growth and the competitive landscape",
        priority: TaskPriority::Medium,
        estimated_hours: 16.0,
        due_in_days: 14,
        deliverables: &["Market assessment deck"],
        acceptance_criteria: &["Competitive positioning validated"],
        depends_on: &["nda_execution"],
    },
    TaskTemplate {
        template_id: "legal_review",
        title: "Legal Review",
        description: "Review corporate records, material contracts and compliance exposure",
        priority: TaskPriority::Critical,
        estimated_hours: 20.0,
        due_in_days: 14,
        deliverables: &["Legal risk memo"],
        acceptance_criteria: &["Material risks flagged with mitigations"],
        depends_on: &["nda_execution"],
    },
    TaskTemplate {
        template_id: "valuation",
        title: "Valuation Modeling",
        description: "Produce DCF and comparable-company valuation ranges",
        priority: TaskPriority::Critical,
        estimated_hours: 16.0,
        due_in_days: 21,
        deliverables: &["Valuation summary"],
        acceptance_criteria: &["Valuation range approved"],
        depends_on: &["financial_analysis", "market_analysis"],
    },
    TaskTemplate {
        template_id: "loi_preparation",
        title: "Letter of Intent",
        description: "Draft and negotiate the letter of intent and key terms",
        priority: TaskPriority::High,
        estimated_hours: 12.0,
        due_in_days: 28,
        deliverables: &["Executed LOI"],
        acceptance_criteria: &["LOI signed by both parties"],
        depends_on: &["valuation", "legal_review"],
    },
    TaskTemplate {
        template_id: "final_due_diligence",
        title: "Final Due Diligence",
        description: "Run confirmatory due diligence across all workstreams",
        priority: TaskPriority::Critical,
        estimated_hours: 40.0,
        due_in_days: 42,
        deliverables: &["Due diligence report"],
        acceptance_criteria: &["All workstreams signed off"],
        depends_on: &["loi_preparation"],
    },
];

const REGULATORY_APPROVAL: TaskTemplate = TaskTemplate {
    template_id: "regulatory_approval",
    title: "Regulatory Approval Filing",
    description: "Prepare and file merger control notifications with regulators",
    priority: TaskPriority::Critical,
    estimated_hours: 24.0,
    due_in_days: 35,
    deliverables: &["Regulatory filing package"],
    acceptance_criteria: &["Filing accepted by the regulator"],
    depends_on: &["legal_review"],
};

/// The task catalog for a deal type.
pub fn templates_for(deal_type: DealType) -> Vec<TaskTemplate> {
    let mut templates = BASE_TEMPLATES.to_vec();
    if deal_type == DealType::Merger {
        templates.push(REGULATORY_APPROVAL);
    }
    templates
}

/// Validate that `depends_on` references resolve inside the set and that the
/// set has no cycles. Runs before tasks are persisted so a bad catalog can
/// never produce an unschedulable task graph.
pub fn validate_template_set(templates: &[TaskTemplate]) -> Result<(), String> {
    let ids: HashSet<&str> = templates.iter().map(|t| t.template_id).collect();
    if ids.len() != templates.len() {
        return Err("duplicate template ids".to_string());
    }

    for template in templates {
        for dep in template.depends_on {
            if !ids.contains(dep) {
                return Err(format!(
                    "template '{}' depends on unknown template '{dep}'",
                    template.template_id
                ));
            }
        }
    }

    // Kahn's algorithm over template ids; leftovers mean a cycle.
    let mut indegree: HashMap<&str, usize> = templates
        .iter()
        .map(|t| (t.template_id, t.depends_on.len()))
        .collect();
    let mut ready: Vec<&str> = indegree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0;
    while let Some(id) = ready.pop() {
        visited += 1;
        for template in templates {
            if template.depends_on.contains(&id) {
                let deg = indegree
                    .get_mut(template.template_id)
                    .expect("all ids present");
                *deg -= 1;
                if *deg == 0 {
                    ready.push(template.template_id);
                }
            }
        }
    }

    if visited != templates.len() {
        let stuck: Vec<&str> = indegree
            .iter()
            .filter(|(_, deg)| **deg > 0)
            .map(|(id, _)| *id)
            .collect();
        return Err(format!("dependency cycle among templates {stuck:?}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_catalog_has_eight_steps() {
        assert_eq!(templates_for(DealType::Acquisition).len(), 8);
        assert_eq!(templates_for(DealType::Divestiture).len(), 8);
        assert_eq!(templates_for(DealType::JointVenture).len(), 8);
    }

    #[test]
    fn merger_appends_regulatory_approval() {
        let templates = templates_for(DealType::Merger);
        assert_eq!(templates.len(), 9);
        assert_eq!(templates.last().unwrap().template_id, "regulatory_approval");
    }

    #[test]
    fn all_catalogs_validate() {
        for deal_type in [
            DealType::Acquisition,
            DealType::Merger,
            DealType::Divestiture,
            DealType::JointVenture,
        ] {
            validate_template_set(&templates_for(deal_type)).unwrap();
        }
    }

    #[test]
    fn unresolved_dependency_is_rejected() {
        let mut templates = templates_for(DealType::Acquisition);
        templates.push(TaskTemplate {
            template_id: "orphan",
            title: "Orphan",
            description: "",
            priority: TaskPriority::Low,
            estimated_hours: 1.0,
            due_in_days: 1,
            deliverables: &[],
            acceptance_criteria: &[],
            depends_on: &["does_not_exist"],
        });
        assert!(validate_template_set(&templates).is_err());
    }

    #[test]
    fn cycle_is_rejected() {
        let templates = vec![
            TaskTemplate {
                template_id: "a",
                title: "A",
                description: "",
                priority: TaskPriority::Low,
                estimated_hours: 1.0,
                due_in_days: 1,
                deliverables: &[],
                acceptance_criteria: &[],
                depends_on: &["b"],
            },
            TaskTemplate {
                template_id: "b",
                title: "B",
                description: "",
                priority: TaskPriority::Low,
                estimated_hours: 1.0,
                due_in_days: 1,
                deliverables: &[],
                acceptance_criteria: &[],
                depends_on: &["a"],
            },
        ];
        let err = validate_template_set(&templates).unwrap_err();
        assert!(err.contains("cycle"));
    }

    #[test]
    fn deal_type_parses_from_strings() {
        assert_eq!("acquisition".parse::<DealType>().unwrap(), DealType::Acquisition);
        assert_eq!("merger".parse::<DealType>().unwrap(), DealType::Merger);
        assert!("hostile_takeover".parse::<DealType>().is_err());
    }
}
