mod common;

use assert_matches::assert_matches;
use fitup_core::catalog::EXERCISES;
use fitup_core::error::CoreError;
use fitup_core::fitness::{Equipment, FitnessLevel};

use common::{beginner_bodyweight_request, harness, user};

// ---------------------------------------------------------------------------
// Test: a beginner with bodyweight only gets a three-day bodyweight plan
// ---------------------------------------------------------------------------

#[tokio::test]
async fn beginner_bodyweight_plan_uses_eligible_exercises() {
    let h = harness();
    let alice = user("alice");

    let plan = h
        .services
        .plans
        .create_plan(&alice, "alice", beginner_bodyweight_request())
        .await
        .unwrap();

    assert!(plan.active);
    assert_eq!(plan.metadata.structure.len(), 7);
    assert_eq!(plan.metadata.workout_days().count(), 3);
    for exercise in plan.metadata.workout_days().flat_map(|d| d.exercises.iter()) {
        let entry = &EXERCISES[(exercise.exercise_id - 1) as usize];
        assert_eq!(entry.equipment, Equipment::Bodyweight, "{}", entry.name);
        assert_eq!(entry.difficulty, FitnessLevel::Beginner, "{}", entry.name);
        assert!(exercise.sets >= 1);
    }

    let schedule = h.services.plans.active_schedule(&alice, "alice").await.unwrap();
    assert_eq!(schedule.schema.plan_id, Some(plan.id));
    assert_eq!(schedule.workouts.len(), 3);
    assert!(schedule.workouts.iter().all(|w| !w.exercises.is_empty()));
}

// ---------------------------------------------------------------------------
// Test: request boundaries are validation errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn out_of_range_requests_are_rejected() {
    let h = harness();
    let alice = user("alice");

    for frequency in [0, 8] {
        let mut request = beginner_bodyweight_request();
        request.weekly_frequency = frequency;
        let err = h.services.plans.create_plan(&alice, "alice", request).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(_), "frequency {frequency}");
    }

    for minutes in [9, 181] {
        let mut request = beginner_bodyweight_request();
        request.time_per_workout = minutes;
        let err = h.services.plans.create_plan(&alice, "alice", request).await.unwrap_err();
        assert_matches!(err, CoreError::Validation(_), "minutes {minutes}");
    }

    let mut request = beginner_bodyweight_request();
    request.equipment.clear();
    let err = h.services.plans.create_plan(&alice, "alice", request).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));

    let err = h.services.plans.get_active_plan(&alice, "alice").await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { .. });
}

// ---------------------------------------------------------------------------
// Test: one active plan per user, regeneration replaces it
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_plan_conflicts_until_regenerated() {
    let h = harness();
    let alice = user("alice");
    let first = h
        .services
        .plans
        .create_plan(&alice, "alice", beginner_bodyweight_request())
        .await
        .unwrap();

    let err = h
        .services
        .plans
        .create_plan(&alice, "alice", beginner_bodyweight_request())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));

    let second = h
        .services
        .plans
        .regenerate(&alice, first.id, "moving to a new gym")
        .await
        .unwrap();
    assert_ne!(second.id, first.id);
    assert!(second.active);

    let active = h.services.plans.get_active_plan(&alice, "alice").await.unwrap();
    assert_eq!(active.id, second.id);

    let history = h.services.plans.history(&alice, "alice", None).await.unwrap();
    assert_eq!(history.len(), 2);
    let old = history.iter().find(|p| p.id == first.id).unwrap();
    assert!(!old.active);
    assert!(old.regeneration_requested);

    let schedule = h.services.plans.active_schedule(&alice, "alice").await.unwrap();
    assert_eq!(schedule.schema.plan_id, Some(second.id));

    let err = h
        .services
        .plans
        .regenerate(&alice, first.id, "again")
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Conflict(_));
}

// ---------------------------------------------------------------------------
// Test: plans of other users are off limits
// ---------------------------------------------------------------------------

#[tokio::test]
async fn other_users_cannot_read_a_plan() {
    let h = harness();
    let plan = h
        .services
        .plans
        .create_plan(&user("alice"), "alice", beginner_bodyweight_request())
        .await
        .unwrap();

    let bob = user("bob");
    let err = h.services.plans.effectiveness(&bob, plan.id).await.unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));
    let err = h.services.plans.get_active_plan(&bob, "alice").await.unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));
    let err = h
        .services
        .plans
        .create_plan(&bob, "alice", beginner_bodyweight_request())
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Forbidden(_));
}

// ---------------------------------------------------------------------------
// Test: PDF export produces a document
// ---------------------------------------------------------------------------

#[tokio::test]
async fn plan_exports_as_pdf() {
    let h = harness();
    let alice = user("alice");
    let plan = h
        .services
        .plans
        .create_plan(&alice, "alice", beginner_bodyweight_request())
        .await
        .unwrap();

    let bytes = h.services.plans.export_pdf(&alice, plan.id).await.unwrap();

    assert!(bytes.starts_with(b"%PDF-1.4"));
    assert!(bytes.ends_with(b"%%EOF\n"));
}
