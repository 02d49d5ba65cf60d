mod common;

use std::sync::Arc;

use chrono::NaiveDate;
use common::{orchestration_engine, seeded_repository, SeededUsers};
use dealflow_core::database::{InMemoryRepository, WorkflowRepository};
use dealflow_core::models::{NewTeamMember, NewTeamTask, TaskPriority, TeamRole};
use dealflow_core::orchestration::{BottleneckReason, DealType, OrchestrationError};

/// A deal team of Alice, Bruno and Carla at 50% allocation.
fn staff_team(repo: &Arc<InMemoryRepository>, users: SeededUsers) -> i64 {
    let team = repo.seed_team("atlas-deal-team", dealflow_core::models::TeamStatus::Active);
    for (user_id, role) in [
        (users.alice, TeamRole::SeniorAnalyst),
        (users.bruno, TeamRole::LegalSpecialist),
        (users.carla, TeamRole::FinancialSpecialist),
    ] {
        repo.seed_membership(NewTeamMember {
            team_id: team.team_id,
            user_id,
            role,
            allocation_percentage: 50.0,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: None,
        });
    }
    team.team_id
}

#[tokio::test]
async fn acquisition_creates_the_eight_step_base_set() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo);

    let tasks = engine
        .auto_create_deal_tasks(team_id, Some(7), DealType::Acquisition)
        .await
        .unwrap();

    assert_eq!(tasks.len(), 8);
    assert!(tasks.iter().all(|t| t.deal_id == Some(7)));
    assert!(tasks.iter().all(|t| t.estimated_hours.is_some()));
    assert!(tasks.iter().all(|t| t.due_date.is_some()));
    assert!(!tasks.iter().any(|t| t.title == "Regulatory Approval Filing"));
}

#[tokio::test]
async fn merger_appends_the_regulatory_step() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo);

    let tasks = engine
        .auto_create_deal_tasks(team_id, None, DealType::Merger)
        .await
        .unwrap();

    assert_eq!(tasks.len(), 9);
    let regulatory = tasks
        .iter()
        .find(|t| t.title == "Regulatory Approval Filing")
        .unwrap();
    assert_eq!(regulatory.priority, TaskPriority::Critical);

    // Its dependency resolved to the persisted Legal Review task id.
    let legal = tasks.iter().find(|t| t.title == "Legal Review").unwrap();
    assert_eq!(regulatory.depends_on, vec![legal.task_id]);
}

#[tokio::test]
async fn template_dependencies_resolve_to_task_ids() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo);

    let tasks = engine
        .auto_create_deal_tasks(team_id, None, DealType::Acquisition)
        .await
        .unwrap();

    let id_of = |title: &str| tasks.iter().find(|t| t.title == title).unwrap().task_id;

    let valuation = tasks.iter().find(|t| t.title == "Valuation Modeling").unwrap();
    assert_eq!(
        valuation.depends_on,
        vec![id_of("Financial Analysis"), id_of("Market Analysis")]
    );

    let initial = tasks.iter().find(|t| t.title == "Initial Deal Review").unwrap();
    assert!(initial.depends_on.is_empty());
}

#[tokio::test]
async fn creation_auto_assigns_by_proficiency() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo);

    let tasks = engine
        .auto_create_deal_tasks(team_id, None, DealType::Acquisition)
        .await
        .unwrap();

    let assignee_of = |title: &str| tasks.iter().find(|t| t.title == title).unwrap().assignee_id;

    // Bruno holds Legal Review at proficiency 5.
    assert_eq!(assignee_of("Legal Review"), Some(users.bruno));
    // Alice's Financial Analysis (5) beats Carla's (4).
    assert_eq!(assignee_of("Financial Analysis"), Some(users.alice));
    // Carla is the only member with Market Research.
    assert_eq!(assignee_of("Market Analysis"), Some(users.carla));
}

#[tokio::test]
async fn unknown_team_is_an_error() {
    let (repo, _) = seeded_repository();
    let engine = orchestration_engine(repo);

    let err = engine
        .auto_create_deal_tasks(9999, None, DealType::Acquisition)
        .await
        .unwrap_err();
    assert!(matches!(err, OrchestrationError::TeamNotFound(9999)));
}

#[tokio::test]
async fn auto_assign_is_idempotent_for_assigned_tasks() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo.clone());

    let tasks = engine
        .auto_create_deal_tasks(team_id, None, DealType::Acquisition)
        .await
        .unwrap();
    let legal = tasks.iter().find(|t| t.title == "Legal Review").unwrap();
    assert!(legal.assignee_id.is_some());

    // Already assigned: a second pass reports no assignment and keeps Bruno.
    let outcome = engine.auto_assign_task(legal.task_id, &[]).await.unwrap();
    assert!(outcome.is_none());
    let reloaded = engine_task(&repo, legal.task_id).await;
    assert_eq!(reloaded.assignee_id, Some(users.bruno));
}

#[tokio::test]
async fn auto_assign_scores_above_the_floor() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo.clone());

    let task = repo
        .insert_task(NewTeamTask {
            team_id,
            deal_id: None,
            title: "Financial model and market review".to_string(),
            description: Some("Refresh the valuation model with market data".to_string()),
            priority: TaskPriority::High,
            estimated_hours: Some(6.0),
            due_date: None,
            metadata: None,
        })
        .await
        .unwrap();

    let assignment = engine
        .auto_assign_task(task.task_id, &[])
        .await
        .unwrap()
        .expect("a member clears the floor");
    // Carla: two matched skills (40) + free capacity (20) + financial
    // specialist role bonus (15) = 75, ahead of Alice's 60.
    assert_eq!(assignment.user_id, users.carla);
    assert_eq!(assignment.score, 75.0);
}

#[tokio::test]
async fn auto_assign_below_floor_reports_none() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo.clone());

    let task = repo
        .insert_task(NewTeamTask {
            team_id,
            deal_id: None,
            title: "Plan the offsite".to_string(),
            description: None,
            priority: TaskPriority::Low,
            estimated_hours: Some(2.0),
            due_date: None,
            metadata: None,
        })
        .await
        .unwrap();

    let outcome = engine.auto_assign_task(task.task_id, &[]).await.unwrap();
    assert!(outcome.is_none());
    let reloaded = engine_task(&repo, task.task_id).await;
    assert!(reloaded.assignee_id.is_none());
}

#[tokio::test]
async fn schedule_analysis_reports_critical_path_and_bottlenecks() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo);

    engine
        .auto_create_deal_tasks(team_id, None, DealType::Acquisition)
        .await
        .unwrap();

    let analysis = engine.optimize_task_schedule(team_id, None).await.unwrap();

    assert_eq!(analysis.task_count, 8);
    // Longest chain: initial review -> NDA -> financial analysis -> valuation
    // -> LOI -> final due diligence = 8 + 4 + 24 + 16 + 12 + 40 hours.
    assert_eq!(analysis.critical_path.duration_hours, 104.0);
    assert_eq!(analysis.critical_path.titles.first().unwrap(), "Initial Deal Review");
    assert_eq!(analysis.critical_path.titles.last().unwrap(), "Final Due Diligence");
    assert_eq!(analysis.critical_path.task_ids.len(), 6);

    // NDA Execution fans out to financial, market and legal workstreams.
    assert!(analysis.bottlenecks.iter().any(|b| {
        b.title == "NDA Execution"
            && matches!(b.reason, BottleneckReason::DependencyFanOut { dependents: 3 })
    }));

    // 140 estimated hours against three members at 40h/week.
    assert_eq!(analysis.total_estimated_hours, 140.0);
    assert_eq!(analysis.weekly_capacity_hours, 120.0);
    assert!(analysis.resource_utilization > 1.0);

    // Everything is assigned, due-dated and estimated.
    assert_eq!(analysis.unassigned_count, 0);
    assert_eq!(analysis.optimization_score, 100.0);
    assert!(analysis.projected_completion_date.is_some());
}

#[tokio::test]
async fn overloaded_assignee_is_flagged() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo);

    engine
        .auto_create_deal_tasks(team_id, None, DealType::Acquisition)
        .await
        .unwrap();
    let analysis = engine.optimize_task_schedule(team_id, None).await.unwrap();

    // Alice picks up five of the eight tasks in this catalog.
    assert!(analysis.bottlenecks.iter().any(|b| {
        matches!(
            b.reason,
            BottleneckReason::AssigneeOverload { user_id, open_tasks }
                if user_id == users.alice && open_tasks >= 5
        )
    }));
}

#[tokio::test]
async fn cyclic_dependencies_are_rejected_not_recursed() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo.clone());

    let mut task_ids = Vec::new();
    for title in ["alpha", "beta"] {
        let task = repo
            .insert_task(NewTeamTask {
                team_id,
                deal_id: None,
                title: title.to_string(),
                description: None,
                priority: TaskPriority::Medium,
                estimated_hours: Some(4.0),
                due_date: None,
                metadata: None,
            })
            .await
            .unwrap();
        task_ids.push(task.task_id);
    }
    repo.set_task_dependencies(task_ids[0], &[task_ids[1]])
        .await
        .unwrap();
    repo.set_task_dependencies(task_ids[1], &[task_ids[0]])
        .await
        .unwrap();

    let err = engine.optimize_task_schedule(team_id, None).await.unwrap_err();
    match err {
        OrchestrationError::DependencyCycle { task_ids: cyclic } => {
            assert_eq!(cyclic.len(), 2);
        }
        other => panic!("expected dependency cycle, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_team_schedule_is_benign() {
    let (repo, users) = seeded_repository();
    let team_id = staff_team(&repo, users);
    let engine = orchestration_engine(repo);

    let analysis = engine.optimize_task_schedule(team_id, None).await.unwrap();
    assert_eq!(analysis.task_count, 0);
    assert_eq!(analysis.optimization_score, 0.0);
    assert!(analysis.critical_path.task_ids.is_empty());
    assert_eq!(analysis.recommendations, vec!["No open tasks to schedule".to_string()]);
}

async fn engine_task(
    repo: &Arc<InMemoryRepository>,
    task_id: i64,
) -> dealflow_core::models::TeamTask {
    repo.task_by_id(task_id).await.unwrap().unwrap()
}
