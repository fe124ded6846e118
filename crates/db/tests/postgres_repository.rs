//! Integration tests for the PostgreSQL repository.
//!
//! Run with a database available:
//! `DATABASE_URL=postgres://... cargo test -p fitup-db -- --ignored`

use assert_matches::assert_matches;
use chrono::{NaiveDate, Utc};
use sqlx::PgPool;
use fitup_core::fitness::{Equipment, FitnessGoal, FitnessLevel};
use fitup_core::plan::{generate_plan, PerformanceSample, PlanRequest};
use fitup_core::session::{SessionStatus, SetRecord};
use fitup_db::models::exercise::ExerciseFilter;
use fitup_db::models::messaging::NewMessage;
use fitup_db::models::plan::{NewPerformanceRecord, NewPlan};
use fitup_db::models::session::NewSession;
use fitup_db::repository::*;
use fitup_db::{PgRepository, RepoError};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()
}

fn request() -> PlanRequest {
    PlanRequest {
        goals: vec![FitnessGoal::GeneralFitness],
        equipment: vec![Equipment::Bodyweight],
        level: FitnessLevel::Beginner,
        weekly_frequency: 3,
        time_per_workout: 30,
        limitations: vec![],
        recovery: None,
        one_rep_maxes: vec![],
    }
}

async fn new_plan(tx: &mut Box<dyn Transaction>, user: &str) -> NewPlan {
    let catalog: Vec<_> = tx
        .list_exercises(&ExerciseFilter::default())
        .await
        .unwrap()
        .iter()
        .map(|e| e.to_candidate())
        .collect();
    NewPlan {
        user_id: user.to_string(),
        week_start: monday(),
        algorithm: "fitup_adaptive_v1".to_string(),
        metadata: generate_plan(&request(), &catalog).unwrap(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn catalog_seed_is_present(pool: PgPool) {
    let repo = PgRepository::new(pool);
    repo.health_check().await.unwrap();
    let mut tx = repo.begin().await.unwrap();
    let squat = tx.get_exercise(23).await.unwrap();
    assert_eq!(squat.name, "Barbell Back Squat");
    assert!(squat.muscle_groups.contains(&"quads".to_string()));
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn plan_metadata_round_trips_and_second_active_plan_conflicts(pool: PgPool) {
    let repo = PgRepository::new(pool);
    let mut tx = repo.begin().await.unwrap();
    let input = new_plan(&mut tx, "u1").await;
    let plan = tx.insert_plan(&input).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    let active = tx.get_active_plan("u1").await.unwrap().unwrap();
    assert_eq!(active.id, plan.id);
    assert_eq!(active.metadata, input.metadata);

    assert_matches!(tx.insert_plan(&input).await, Err(RepoError::Conflict(c)) if c == "uq_generated_plans_active_user");
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn performance_records_list_newest_first(pool: PgPool) {
    let repo = PgRepository::new(pool);
    let mut tx = repo.begin().await.unwrap();
    let input = new_plan(&mut tx, "u1").await;
    let plan = tx.insert_plan(&input).await.unwrap();
    for rate in [0.5, 0.9] {
        tx.insert_performance_record(&NewPerformanceRecord {
            plan_id: plan.id,
            session_id: None,
            sample: PerformanceSample {
                completion_rate: rate,
                average_rpe: Some(7.0),
                skipped_count: 0,
            },
        })
        .await
        .unwrap();
    }
    let records = tx.list_performance_records(plan.id, Some(1)).await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].completion_rate, 0.9);
    assert_eq!(tx.list_performance_records(plan.id, None).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn second_active_session_conflicts(pool: PgPool) {
    let repo = PgRepository::new(pool);
    let mut tx = repo.begin().await.unwrap();
    let new = NewSession {
        user_id: "u1".into(),
        workout_id: None,
        plan_id: None,
        status: SessionStatus::Active,
        started_at: Utc::now(),
        ended_at: None,
        skip_reason: None,
    };
    let session = tx.create_session(&new).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    assert_matches!(tx.create_session(&new).await, Err(RepoError::Conflict(_)));
    drop(tx);

    let mut tx = repo.begin().await.unwrap();
    let set = SetRecord {
        weight: 60.0,
        reps: 10,
        rpe: None,
    };
    let perf = tx.save_exercise_performance(session.id, 1, &[set]).await.unwrap();
    assert_eq!(perf.best_set, Some(set));
    assert_eq!(perf.total_volume, 600.0);
}

#[sqlx::test(migrations = "../../db/migrations")]
#[ignore]
async fn read_status_and_cascade(pool: PgPool) {
    let repo = PgRepository::new(pool);
    let mut tx = repo.begin().await.unwrap();
    let c = tx.create_conversation("coach", "client").await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    assert_matches!(tx.create_conversation("client", "coach").await, Err(RepoError::Conflict(_)));
    drop(tx);

    let mut tx = repo.begin().await.unwrap();
    let message = tx
        .insert_message(&NewMessage {
            conversation_id: c.id,
            sender_id: "coach".into(),
            text: "hi".into(),
            reply_to_message_id: None,
            attachments: vec![],
        })
        .await
        .unwrap();
    assert_eq!(tx.unread_count(c.id, "client").await.unwrap(), 1);
    assert!(tx.mark_read(message.id, "client").await.unwrap());
    assert!(!tx.mark_read(message.id, "client").await.unwrap());
    assert_eq!(tx.unread_count(c.id, "client").await.unwrap(), 0);

    tx.delete_conversation(c.id).await.unwrap();
    assert_matches!(tx.get_message(message.id).await, Err(RepoError::NotFound { .. }));
}
