mod common;

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use fitup_core::error::CoreError;
use fitup_core::fitness::{Equipment, FitnessGoal, FitnessLevel};
use fitup_db::models::goal::NewGoal;
use fitup_db::models::profile::UpsertProfile;

use common::{coach, exercise_id, harness, user};

fn bench_goal(user_id: &str, days: i64) -> NewGoal {
    NewGoal {
        user_id: user_id.to_string(),
        goal_type: FitnessGoal::Strength,
        exercise_id: Some(exercise_id("Barbell Bench Press")),
        description: Some("Bench 100 kg".into()),
        current_value: 80.0,
        target_value: 100.0,
        target_date: Utc::now().date_naive() + Duration::days(days),
    }
}

// ---------------------------------------------------------------------------
// Test: goal lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn goal_progress_and_completion() {
    let h = harness();
    let alice = user("alice");

    let err = h.services.goals.create(&alice, bench_goal("alice", 0)).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));

    let goal = h.services.goals.create(&alice, bench_goal("alice", 84)).await.unwrap();
    assert!(goal.active);

    let updated = h.services.goals.update_progress(&alice, goal.id, 90.0).await.unwrap();
    assert_eq!(updated.current_value, 90.0);

    let prediction = h.services.analytics.goal_prediction(&alice, goal.id).await.unwrap();
    assert!((0.0..=1.0).contains(&prediction.probability));

    let done = h.services.goals.complete(&alice, goal.id).await.unwrap();
    assert!(done.completed);
    let err = h.services.goals.complete(&alice, goal.id).await.unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    assert!(h.services.goals.list(&alice, "alice", true).await.unwrap().is_empty());
    assert_eq!(h.services.goals.list(&alice, "alice", false).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Test: an assigned coach may act on a client's records
// ---------------------------------------------------------------------------

#[tokio::test]
async fn assigned_coach_can_manage_client_goals_and_profile() {
    let h = harness();
    let trainer = coach("coach1");

    let err = h.services.goals.create(&trainer, bench_goal("alice", 30)).await.unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));

    h.assign("coach1", "alice").await;
    h.services.goals.create(&trainer, bench_goal("alice", 30)).await.unwrap();

    let profile = UpsertProfile {
        level: FitnessLevel::Intermediate,
        primary_goal: FitnessGoal::MuscleGain,
        weekly_frequency: 4,
        time_per_workout: 60,
        equipment: vec![Equipment::Barbell, Equipment::Dumbbell],
        limitations: vec![],
    };
    let saved = h.services.profiles.upsert(&trainer, "alice", profile.clone()).await.unwrap();
    assert_eq!(saved.weekly_frequency, 4);
    assert_eq!(h.services.profiles.get(&user("alice"), "alice").await.unwrap(), saved);

    let mut invalid = profile;
    invalid.weekly_frequency = 8;
    let err = h.services.profiles.upsert(&trainer, "alice", invalid).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}
