//! # Skill Classification
//!
//! Maps task text to the skill names assignment scoring understands. The
//! classifier is injected into the orchestration engine so the rule table can
//! be replaced (per-tenant vocabularies, learned models) without touching
//! assignment logic.

use crate::models::TeamRole;

/// Classifies a task into the skills it calls for.
pub trait SkillClassifier: Send + Sync {
    /// Skill names inferred from a task's title and description.
    fn classify(&self, title: &str, description: Option<&str>) -> Vec<String>;
}

#[derive(Debug, Clone)]
struct SkillRule {
    skill: &'static str,
    keywords: &'static [&'static str],
}

/// Rule-table classifier: a skill matches when any of its keywords occurs in
/// the lowercased task text.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    rules: Vec<SkillRule>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                SkillRule {
                    skill: "Financial Analysis",
                    keywords: &["financial", "valuation", "model", "dcf", "earnings"],
                },
                SkillRule {
                    skill: "Legal Review",
                    keywords: &["legal", "nda", "contract", "regulatory", "compliance"],
                },
                SkillRule {
                    skill: "Due Diligence",
                    keywords: &["due diligence", "diligence", "audit", "review"],
                },
                SkillRule {
                    skill: "Market Research",
                    keywords: &["market", "industry", "competitive", "landscape"],
                },
                SkillRule {
                    skill: "Negotiation",
                    keywords: &["negotiation", "letter of intent", "loi", "term sheet"],
                },
                SkillRule {
                    skill: "Project Management",
                    keywords: &["coordination", "planning", "kickoff", "timeline"],
                },
                SkillRule {
                    skill: "Integration Planning",
                    keywords: &["integration", "synergy", "post-merger"],
                },
            ],
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl SkillClassifier for KeywordClassifier {
    fn classify(&self, title: &str, description: Option<&str>) -> Vec<String> {
        let haystack = match description {
            Some(desc) => format!("{title} {desc}").to_lowercase(),
            None => title.to_lowercase(),
        };

        self.rules
            .iter()
            .filter(|rule| rule.keywords.iter().any(|kw| haystack.contains(kw)))
            .map(|rule| rule.skill.to_string())
            .collect()
    }
}

/// Whether a member's role lines up with the category of work a task title
/// suggests; feeds the role bonus in assignment scoring.
pub fn role_matches_task(role: TeamRole, title: &str, description: Option<&str>) -> bool {
    let haystack = match description {
        Some(desc) => format!("{title} {desc}").to_lowercase(),
        None => title.to_lowercase(),
    };

    let keywords: &[&str] = match role {
        TeamRole::LegalSpecialist => &["legal", "nda", "contract", "regulatory"],
        TeamRole::FinancialSpecialist => &["financial", "valuation", "model"],
        TeamRole::SeniorAnalyst => &["negotiation", "letter of intent", "diligence"],
        TeamRole::Analyst => &["analysis", "research", "review"],
    };
    keywords.iter().any(|kw| haystack.contains(kw))
}
