mod common;

use chrono::NaiveDate;
use common::{formation_engine, seeded_repository};
use dealflow_core::models::{NewTeamMember, TeamRole, TeamStatus};
use dealflow_core::orchestration::{FormationError, TeamRequirements};

fn requirements(skills: &[&str], team_size: usize) -> TeamRequirements {
    TeamRequirements {
        required_skills: skills.iter().map(|s| s.to_string()).collect(),
        team_size,
        ..TeamRequirements::default()
    }
}

#[tokio::test]
async fn full_coverage_pool_yields_a_full_coverage_option() {
    let (repo, _) = seeded_repository();
    let engine = formation_engine(repo);

    // Empty skill list falls back to the default seven-skill M&A set, all of
    // which the seeded pool covers.
    let recommendation = engine
        .recommend_team_composition(&requirements(&[], 5))
        .await
        .unwrap();

    assert!(!recommendation.options.is_empty());
    assert!(recommendation
        .options
        .iter()
        .any(|option| option.skill_coverage == 1.0));
    assert!(recommendation.skill_gaps.is_empty());
}

#[tokio::test]
async fn options_are_ranked_and_capped_at_three() {
    let (repo, _) = seeded_repository();
    let engine = formation_engine(repo);

    let recommendation = engine
        .recommend_team_composition(&requirements(
            &["Financial Analysis", "Due Diligence"],
            2,
        ))
        .await
        .unwrap();

    assert!(recommendation.options.len() <= 3);
    for pair in recommendation.options.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    for option in &recommendation.options {
        assert!((0.0..=1.0).contains(&option.skill_coverage));
        assert!((0.0..=100.0).contains(&option.score));
        assert!(option.viable);
    }
    assert!(recommendation.cost_summary.is_some());
}

#[tokio::test]
async fn missing_skill_is_reported_as_gap() {
    let (repo, _) = seeded_repository();
    let engine = formation_engine(repo);

    let recommendation = engine
        .recommend_team_composition(&requirements(
            &["Financial Analysis", "Quantum Underwriting"],
            2,
        ))
        .await
        .unwrap();

    assert_eq!(
        recommendation.skill_gaps,
        vec!["Quantum Underwriting".to_string()]
    );
    // Half coverage is below the 0.8 viability floor.
    assert!(recommendation.options.is_empty());
    assert!(recommendation.cost_summary.is_none());
}

#[tokio::test]
async fn fully_allocated_candidates_are_excluded() {
    let (repo, users) = seeded_repository();

    // Book Alice solid on an active team with an open-ended membership.
    let team = repo.seed_team("existing-engagement", TeamStatus::Active);
    repo.seed_membership(NewTeamMember {
        team_id: team.team_id,
        user_id: users.alice,
        role: TeamRole::SeniorAnalyst,
        allocation_percentage: 100.0,
        start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        end_date: None,
    });

    let engine = formation_engine(repo);
    let recommendation = engine
        .recommend_team_composition(&requirements(&["Financial Analysis"], 1))
        .await
        .unwrap();

    assert!(!recommendation.options.is_empty());
    for option in &recommendation.options {
        assert!(option.members.iter().all(|m| m.user_id != users.alice));
    }
    // Carla still covers the skill.
    assert!(recommendation.skill_gaps.is_empty());
}

#[tokio::test]
async fn partial_allocation_reduces_availability() {
    let (repo, users) = seeded_repository();

    let team = repo.seed_team("part-time-engagement", TeamStatus::Performing);
    repo.seed_membership(NewTeamMember {
        team_id: team.team_id,
        user_id: users.carla,
        role: TeamRole::Analyst,
        allocation_percentage: 60.0,
        start_date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        end_date: None,
    });

    let engine = formation_engine(repo);
    let recommendation = engine
        .recommend_team_composition(&requirements(&["Market Research"], 1))
        .await
        .unwrap();

    let carla_option = recommendation
        .options
        .iter()
        .flat_map(|o| &o.members)
        .find(|m| m.user_id == users.carla)
        .expect("Carla remains available at 60% allocation");
    assert_eq!(carla_option.allocation_percentage, 60.0);
    assert_eq!(carla_option.availability, 40.0);
}

#[tokio::test]
async fn budget_below_cheapest_viable_cost_fails_team_formation() {
    let (repo, _) = seeded_repository();
    let engine = formation_engine(repo);

    let mut reqs = requirements(&["Financial Analysis", "Legal Review"], 2);
    reqs.budget_limit = Some(100.0); // far below any pair's weekly cost

    let err = engine
        .auto_form_team("Project Atlas", Some(1), &reqs)
        .await
        .unwrap_err();
    assert!(matches!(err, FormationError::NoViableTeam { .. }));
}

#[tokio::test]
async fn no_candidate_pool_is_an_error() {
    let (repo, _) = seeded_repository();
    let engine = formation_engine(repo);

    let err = engine
        .recommend_team_composition(&requirements(&["Basket Weaving"], 2))
        .await
        .unwrap_err();
    assert!(matches!(err, FormationError::EmptyCandidatePool { .. }));
}

#[tokio::test]
async fn auto_form_team_persists_team_members_and_channel() {
    let (repo, _) = seeded_repository();
    let engine = formation_engine(repo);

    let formed = engine
        .auto_form_team(
            "Project Atlas",
            Some(42),
            &requirements(&["Financial Analysis", "Legal Review"], 3),
        )
        .await
        .unwrap();

    assert_eq!(formed.members.len(), 3);
    assert_eq!(formed.team.deal_id, Some(42));
    assert_eq!(formed.team.status, TeamStatus::Forming);
    // First member of the winning option leads the team.
    assert_eq!(
        formed.team.lead_user_id,
        Some(formed.option.members[0].user_id)
    );
    assert_eq!(formed.channel.name, "project-atlas-general");
    assert_eq!(formed.channel.channel_type, "general");

    // Memberships carry a bounded engagement window at default allocation.
    for member in &formed.members {
        assert!(member.end_date.is_some());
        assert!(member.end_date.unwrap() > member.start_date);
        assert_eq!(member.allocation_percentage, 50.0);
    }
}

#[tokio::test]
async fn role_inference_follows_experience_and_specialty() {
    let (repo, users) = seeded_repository();
    let engine = formation_engine(repo);

    let formed = engine
        .auto_form_team(
            "Role Check",
            None,
            &requirements(&["Financial Analysis", "Legal Review"], 3),
        )
        .await
        .unwrap();

    let role_of = |user_id: i64| {
        formed
            .members
            .iter()
            .find(|m| m.user_id == user_id)
            .map(|m| m.role)
    };

    // The Financial Analysis / Legal Review pool is exactly Alice, Bruno and
    // Carla: 12 years makes Alice a senior analyst, Bruno's Legal Review makes
    // him the legal specialist, Carla's Financial Analysis the financial one.
    assert_eq!(role_of(users.alice), Some(TeamRole::SeniorAnalyst));
    assert_eq!(role_of(users.bruno), Some(TeamRole::LegalSpecialist));
    assert_eq!(role_of(users.carla), Some(TeamRole::FinancialSpecialist));
}
