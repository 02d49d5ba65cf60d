//! # Team Formation Engine
//!
//! Recommends and auto-creates deal teams. Candidates are fetched through the
//! repository, filtered by availability over the engagement window, and every
//! combination of the requested size is scored against skill coverage,
//! experience, budget and availability.
//!
//! Enumeration is exhaustive by design, so the candidate pool is capped by
//! `formation.max_candidate_pool`; trimming keeps the most-available
//! candidates and logs what was dropped.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::config::FormationConfig;
use crate::database::{AllocationWindow, WorkflowRepository};
use crate::events::{names, EventPublisher};
use crate::models::{
    CandidateMember, NewTeam, NewTeamChannel, NewTeamMember, TeamRole, TeamStatus,
};

use super::errors::{FormationError, FormationResult};
use super::types::{CostSummary, FormedTeam, TeamOption, TeamRecommendation, TeamRequirements};

/// Skills every M&A engagement needs when the caller specifies none.
pub const DEFAULT_REQUIRED_SKILLS: [&str; 7] = [
    "Financial Analysis",
    "Legal Review",
    "Due Diligence",
    "Market Research",
    "Negotiation",
    "Project Management",
    "Integration Planning",
];

/// Coverage below this is never viable.
const MIN_VIABLE_COVERAGE: f64 = 0.8;
/// Options returned to the caller.
const MAX_RECOMMENDATIONS: usize = 3;

pub struct TeamFormationEngine {
    repository: Arc<dyn WorkflowRepository>,
    events: EventPublisher,
    config: FormationConfig,
}

impl TeamFormationEngine {
    pub fn new(
        repository: Arc<dyn WorkflowRepository>,
        events: EventPublisher,
        config: FormationConfig,
    ) -> Self {
        Self {
            repository,
            events,
            config,
        }
    }

    /// Rank team combinations for the given requirements.
    #[instrument(skip(self, requirements), fields(team_size = requirements.team_size))]
    pub async fn recommend_team_composition(
        &self,
        requirements: &TeamRequirements,
    ) -> FormationResult<TeamRecommendation> {
        let required_skills = self.required_skills(requirements);
        let window = self.engagement_window(requirements);

        let mut pool = self
            .repository
            .candidates_with_any_skill(&required_skills)
            .await?;
        if pool.is_empty() {
            return Err(FormationError::EmptyCandidatePool { required_skills });
        }

        // Fill allocation over the engagement window; fully-booked candidates
        // drop out.
        let mut available = Vec::with_capacity(pool.len());
        for mut candidate in pool.drain(..) {
            let allocation = self
                .repository
                .allocation_within(candidate.user_id, window)
                .await?;
            if allocation >= 100.0 {
                debug!(user_id = candidate.user_id, allocation, "candidate fully allocated");
                continue;
            }
            candidate.allocation_percentage = allocation;
            candidate.availability = 100.0 - allocation;
            available.push(candidate);
        }

        if available.is_empty() {
            return Err(FormationError::EmptyCandidatePool { required_skills });
        }

        // Skill gaps are judged against the whole available pool, before any cap.
        let covered_by_pool: BTreeSet<&str> = available
            .iter()
            .flat_map(|c| c.skills.iter().map(String::as_str))
            .collect();
        let skill_gaps: Vec<String> = required_skills
            .iter()
            .filter(|s| !covered_by_pool.contains(s.as_str()))
            .cloned()
            .collect();

        if available.len() > self.config.max_candidate_pool {
            warn!(
                pool = available.len(),
                cap = self.config.max_candidate_pool,
                "candidate pool exceeds cap; keeping most-available candidates"
            );
            available.sort_by(|a, b| b.availability.total_cmp(&a.availability));
            available.truncate(self.config.max_candidate_pool);
        }

        let combination_size = requirements.team_size.min(available.len());
        let mut options: Vec<TeamOption> = Vec::new();
        let mut evaluated = 0usize;
        for combination in combinations(&available, combination_size) {
            evaluated += 1;
            options.push(Self::evaluate_combination(
                &combination,
                &required_skills,
                requirements.budget_limit,
                self.config.weekly_hours,
            ));
        }

        let viable: Vec<&TeamOption> = options.iter().filter(|o| o.viable).collect();
        let cost_summary = cost_summary(&viable);

        let mut ranked: Vec<TeamOption> = viable.into_iter().cloned().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(MAX_RECOMMENDATIONS);

        let risk_factors = risk_factors(&ranked, &available, requirements.team_size);

        info!(
            evaluated,
            viable = ranked.len(),
            gaps = skill_gaps.len(),
            "team composition evaluated"
        );

        Ok(TeamRecommendation {
            options: ranked,
            evaluated_count: evaluated,
            pool_size: available.len(),
            skill_gaps,
            cost_summary,
            risk_factors,
            window,
        })
    }

    /// Form a team from the best recommendation and persist it.
    ///
    /// The team starts in `forming` status with the first member as lead; one
    /// membership row per member and a default channel are created alongside.
    #[instrument(skip(self, requirements))]
    pub async fn auto_form_team(
        &self,
        team_name: &str,
        deal_id: Option<i64>,
        requirements: &TeamRequirements,
    ) -> FormationResult<FormedTeam> {
        let recommendation = self.recommend_team_composition(requirements).await?;
        let best = recommendation
            .options
            .into_iter()
            .next()
            .ok_or(FormationError::NoViableTeam {
                team_size: requirements.team_size,
            })?;

        let team = self
            .repository
            .insert_team(NewTeam {
                deal_id,
                name: team_name.to_string(),
                status: TeamStatus::Forming,
                lead_user_id: best.members.first().map(|m| m.user_id),
            })
            .await?;

        let mut members = Vec::with_capacity(best.members.len());
        for candidate in &best.members {
            let member = self
                .repository
                .insert_team_member(NewTeamMember {
                    team_id: team.team_id,
                    user_id: candidate.user_id,
                    role: infer_role(candidate),
                    allocation_percentage: self.config.default_member_allocation,
                    start_date: recommendation.window.start,
                    end_date: Some(recommendation.window.end),
                })
                .await?;
            members.push(member);
        }

        let channel = self
            .repository
            .insert_channel(NewTeamChannel {
                team_id: team.team_id,
                name: format!("{}-general", slugify(team_name)),
                channel_type: "general".to_string(),
            })
            .await?;

        let _ = self
            .events
            .publish(
                names::TEAM_FORMED,
                json!({
                    "team_id": team.team_id,
                    "deal_id": deal_id,
                    "member_count": members.len(),
                    "score": best.score,
                }),
            )
            .await;

        info!(team_id = team.team_id, members = members.len(), "team formed");

        Ok(FormedTeam {
            team,
            members,
            channel,
            option: best,
        })
    }

    /// Score one combination. Pure; exposed for property tests.
    pub fn evaluate_combination(
        members: &[CandidateMember],
        required_skills: &[String],
        budget_limit: Option<f64>,
        weekly_hours: f64,
    ) -> TeamOption {
        let covered: BTreeSet<&str> = members
            .iter()
            .flat_map(|m| m.skills.iter().map(String::as_str))
            .filter(|s| required_skills.iter().any(|r| r == s))
            .collect();
        let covered_skills: Vec<String> = covered.iter().map(|s| s.to_string()).collect();
        let missing_skills: Vec<String> = required_skills
            .iter()
            .filter(|s| !covered.contains(s.as_str()))
            .cloned()
            .collect();

        let skill_coverage = if required_skills.is_empty() {
            1.0
        } else {
            covered.len() as f64 / required_skills.len() as f64
        };

        let avg_years = if members.is_empty() {
            0.0
        } else {
            members.iter().map(|m| m.years_experience).sum::<f64>() / members.len() as f64
        };
        let experience_score = (avg_years * 10.0).min(100.0);

        let weekly_cost: f64 = members
            .iter()
            .filter_map(|m| m.hourly_rate)
            .map(|rate| rate * weekly_hours)
            .sum();

        let budget_viable = budget_limit.map_or(true, |limit| weekly_cost <= limit);
        let viable = budget_viable && skill_coverage >= MIN_VIABLE_COVERAGE;

        let average_availability = if members.is_empty() {
            0.0
        } else {
            members.iter().map(|m| m.availability).sum::<f64>() / members.len() as f64
        };

        let score = 0.4 * (skill_coverage * 100.0)
            + 0.3 * experience_score
            + 0.2 * if budget_viable { 100.0 } else { 0.0 }
            + 0.1 * average_availability;

        TeamOption {
            members: members.to_vec(),
            skill_coverage,
            covered_skills,
            missing_skills,
            experience_score,
            weekly_cost,
            budget_viable,
            viable,
            average_availability,
            score,
        }
    }

    fn required_skills(&self, requirements: &TeamRequirements) -> Vec<String> {
        if requirements.required_skills.is_empty() {
            DEFAULT_REQUIRED_SKILLS
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            requirements.required_skills.clone()
        }
    }

    fn engagement_window(&self, requirements: &TeamRequirements) -> AllocationWindow {
        let start = requirements
            .start_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let weeks = requirements
            .duration_weeks
            .unwrap_or(self.config.default_duration_weeks);
        AllocationWindow::new(start, start + Duration::weeks(i64::from(weeks)))
    }
}

/// Role from the threshold rule: deep experience first, then specialist
/// skills, then mid-level experience.
fn infer_role(candidate: &CandidateMember) -> TeamRole {
    if candidate.years_experience >= 10.0 {
        return TeamRole::SeniorAnalyst;
    }
    if candidate.skills.iter().any(|s| s.contains("Legal")) {
        return TeamRole::LegalSpecialist;
    }
    if candidate.skills.iter().any(|s| s.contains("Financial")) {
        return TeamRole::FinancialSpecialist;
    }
    TeamRole::Analyst
}

fn slugify(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// All k-combinations of the pool, in encounter order.
fn combinations(pool: &[CandidateMember], k: usize) -> Vec<Vec<CandidateMember>> {
    let mut result = Vec::new();
    if k == 0 || k > pool.len() {
        return result;
    }
    let mut indices: Vec<usize> = (0..k).collect();
    loop {
        result.push(indices.iter().map(|&i| pool[i].clone()).collect());

        // Advance the rightmost index that can still move.
        let mut i = k;
        loop {
            if i == 0 {
                return result;
            }
            i -= 1;
            if indices[i] != i + pool.len() - k {
                break;
            }
        }
        indices[i] += 1;
        for j in i + 1..k {
            indices[j] = indices[j - 1] + 1;
        }
    }
}

fn cost_summary(viable: &[&TeamOption]) -> Option<CostSummary> {
    if viable.is_empty() {
        return None;
    }
    let costs: Vec<f64> = viable.iter().map(|o| o.weekly_cost).collect();
    let min = costs.iter().copied().fold(f64::INFINITY, f64::min);
    let max = costs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = costs.iter().sum::<f64>() / costs.len() as f64;
    Some(CostSummary {
        min_weekly_cost: min,
        max_weekly_cost: max,
        avg_weekly_cost: avg,
    })
}

fn risk_factors(
    ranked: &[TeamOption],
    pool: &[CandidateMember],
    requested_size: usize,
) -> Vec<String> {
    let mut risks = Vec::new();
    if let Some(best) = ranked.first() {
        if best.skill_coverage < 1.0 {
            risks.push(format!(
                "Best option covers {:.0}% of required skills",
                best.skill_coverage * 100.0
            ));
        }
        if best.experience_score < 50.0 {
            risks.push("Average team experience is below five years".to_string());
        }
    }
    if pool.len() < requested_size {
        risks.push(format!(
            "Only {} available candidates for a team of {requested_size}",
            pool.len()
        ));
    }
    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn candidate(user_id: i64, skills: &[&str], years: f64, rate: Option<f64>) -> CandidateMember {
        CandidateMember {
            user_id,
            full_name: format!("user {user_id}"),
            skills: skills.iter().map(|s| s.to_string()).collect(),
            proficiency: skills.iter().map(|s| (s.to_string(), 3)).collect::<HashMap<_, _>>(),
            years_experience: years,
            allocation_percentage: 20.0,
            availability: 80.0,
            hourly_rate: rate,
        }
    }

    #[test]
    fn combinations_enumerate_n_choose_k() {
        let pool: Vec<CandidateMember> =
            (1..=5).map(|i| candidate(i, &["Negotiation"], 5.0, None)).collect();
        assert_eq!(combinations(&pool, 3).len(), 10);
        assert_eq!(combinations(&pool, 5).len(), 1);
        assert!(combinations(&pool, 6).is_empty());
    }

    #[test]
    fn full_coverage_and_budget_scores_high() {
        let required = vec!["Financial Analysis".to_string(), "Legal Review".to_string()];
        let members = vec![
            candidate(1, &["Financial Analysis"], 12.0, Some(100.0)),
            candidate(2, &["Legal Review"], 8.0, Some(100.0)),
        ];
        let option =
            TeamFormationEngine::evaluate_combination(&members, &required, None, 40.0);
        assert_eq!(option.skill_coverage, 1.0);
        assert!(option.viable);
        assert_eq!(option.weekly_cost, 8000.0);
        assert!(option.score > 80.0);
        assert!(option.score <= 100.0);
    }

    #[test]
    fn blown_budget_is_not_viable() {
        let required = vec!["Negotiation".to_string()];
        let members = vec![candidate(1, &["Negotiation"], 5.0, Some(500.0))];
        let option =
            TeamFormationEngine::evaluate_combination(&members, &required, Some(1000.0), 40.0);
        assert!(!option.budget_viable);
        assert!(!option.viable);
    }

    #[test]
    fn low_coverage_is_not_viable() {
        let required: Vec<String> = DEFAULT_REQUIRED_SKILLS.iter().map(|s| s.to_string()).collect();
        let members = vec![candidate(1, &["Negotiation"], 5.0, None)];
        let option = TeamFormationEngine::evaluate_combination(&members, &required, None, 40.0);
        assert!(option.skill_coverage < MIN_VIABLE_COVERAGE);
        assert!(!option.viable);
    }

    #[test]
    fn role_inference_thresholds() {
        assert_eq!(
            infer_role(&candidate(1, &["Negotiation"], 12.0, None)),
            TeamRole::SeniorAnalyst
        );
        assert_eq!(
            infer_role(&candidate(2, &["Legal Review"], 6.0, None)),
            TeamRole::LegalSpecialist
        );
        assert_eq!(
            infer_role(&candidate(3, &["Financial Analysis"], 4.0, None)),
            TeamRole::FinancialSpecialist
        );
        assert_eq!(
            infer_role(&candidate(4, &["Negotiation"], 3.0, None)),
            TeamRole::Analyst
        );
    }

    #[test]
    fn slugify_flattens_team_names() {
        assert_eq!(slugify("Project Atlas DD"), "project-atlas-dd");
        assert_eq!(slugify("Team  (Alpha)"), "team-alpha");
    }
}
