use assert_matches::assert_matches;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;
use fitup_core::fitness::{Equipment, FitnessGoal, FitnessLevel};
use fitup_core::invitation::InvitationStatus;
use fitup_core::session::{SessionStatus, SetRecord};

use super::MemoryRepository;
use crate::error::RepoError;
use crate::models::coach::NewInvitation;
use crate::models::exercise::ExerciseFilter;
use crate::models::messaging::NewMessage;
use crate::models::profile::UpsertProfile;
use crate::models::schedule::NewWorkoutExercise;
use crate::models::session::NewSession;
use crate::repository::*;

fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()
}

fn active_session(user: &str) -> NewSession {
    NewSession {
        user_id: user.to_string(),
        workout_id: None,
        plan_id: None,
        status: SessionStatus::Active,
        started_at: Utc::now(),
        ended_at: None,
        skip_reason: None,
    }
}

fn invitation(coach: &str, email: &str, token_hash: &str) -> NewInvitation {
    NewInvitation {
        id: Uuid::new_v4(),
        coach_id: coach.to_string(),
        email: email.to_string(),
        token_hash: token_hash.to_string(),
        expires_at: Utc::now() + Duration::days(7),
    }
}

fn text(conversation_id: i64, sender: &str, body: &str) -> NewMessage {
    NewMessage {
        conversation_id,
        sender_id: sender.to_string(),
        text: body.to_string(),
        reply_to_message_id: None,
        attachments: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn committed_writes_are_visible_to_later_transactions() {
    let repo = MemoryRepository::new();
    let input = UpsertProfile {
        level: FitnessLevel::Beginner,
        primary_goal: FitnessGoal::GeneralFitness,
        weekly_frequency: 3,
        time_per_workout: 30,
        equipment: vec![Equipment::Bodyweight],
        limitations: vec![],
    };

    let mut tx = repo.begin().await.unwrap();
    tx.upsert_profile("u1", &input).await.unwrap();
    tx.commit().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    let profile = tx.get_profile("u1").await.unwrap();
    assert_eq!(profile.weekly_frequency, 3);
    assert_eq!(profile.equipment, vec![Equipment::Bodyweight]);
}

#[tokio::test]
async fn dropped_transaction_rolls_back() {
    let repo = MemoryRepository::new();
    {
        let mut tx = repo.begin().await.unwrap();
        tx.create_session(&active_session("u1")).await.unwrap();
        // dropped without commit
    }
    let mut tx = repo.begin().await.unwrap();
    assert!(tx.find_active_session("u1").await.unwrap().is_none());
}

#[tokio::test]
async fn explicit_rollback_discards_writes() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    tx.create_conversation("coach", "client").await.unwrap();
    tx.rollback().await.unwrap();

    let mut tx = repo.begin().await.unwrap();
    assert!(tx.find_conversation_between("coach", "client").await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[tokio::test]
async fn catalog_is_seeded_with_stable_ids() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let first = tx.get_exercise(1).await.unwrap();
    assert_eq!(first.name, "Push-Up");

    let barbell = tx
        .list_exercises(&ExerciseFilter {
            equipment: Some(Equipment::Barbell),
            ..Default::default()
        })
        .await
        .unwrap();
    assert!(!barbell.is_empty());
    assert!(barbell.iter().all(|e| e.equipment == Equipment::Barbell));

    assert_matches!(tx.get_exercise(9_999).await, Err(RepoError::NotFound { .. }));
}

// ---------------------------------------------------------------------------
// Uniqueness invariants
// ---------------------------------------------------------------------------

#[tokio::test]
async fn second_active_session_conflicts() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    tx.create_session(&active_session("u1")).await.unwrap();
    assert_matches!(
        tx.create_session(&active_session("u1")).await,
        Err(RepoError::Conflict(c)) if c == "uq_workout_sessions_active_user"
    );
    // a skip record is never active
    let mut skip = active_session("u1");
    skip.status = SessionStatus::Skipped;
    tx.create_session(&skip).await.unwrap();
}

#[tokio::test]
async fn conversation_pair_is_unique_in_either_order() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    tx.create_conversation("coach", "client").await.unwrap();
    assert_matches!(
        tx.create_conversation("client", "coach").await,
        Err(RepoError::Conflict(_))
    );
    let found = tx.find_conversation_between("client", "coach").await.unwrap();
    assert!(found.is_some());
}

#[tokio::test]
async fn one_pending_invitation_per_coach_and_email() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let first = tx.insert_invitation(&invitation("c1", "a@b.io", "h1")).await.unwrap();
    assert_matches!(
        tx.insert_invitation(&invitation("c1", "a@b.io", "h2")).await,
        Err(RepoError::Conflict(_))
    );

    tx.set_invitation_status(first.id, InvitationStatus::Cancelled).await.unwrap();
    tx.insert_invitation(&invitation("c1", "a@b.io", "h3")).await.unwrap();
}

#[tokio::test]
async fn expire_invitations_only_touches_overdue_pending_rows() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let mut overdue = invitation("c1", "old@b.io", "h1");
    overdue.expires_at = Utc::now() - Duration::hours(1);
    let overdue = tx.insert_invitation(&overdue).await.unwrap();
    let fresh = tx.insert_invitation(&invitation("c1", "new@b.io", "h2")).await.unwrap();

    assert_eq!(tx.expire_invitations(Utc::now()).await.unwrap(), 1);
    assert_eq!(tx.get_invitation(overdue.id).await.unwrap().status, InvitationStatus::Expired);
    assert_eq!(tx.get_invitation(fresh.id).await.unwrap().status, InvitationStatus::Pending);
}

#[tokio::test]
async fn deactivating_an_assignment_is_idempotent() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let a = tx.insert_assignment("coach", "client", None).await.unwrap();
    assert_matches!(
        tx.insert_assignment("other", "client", None).await,
        Err(RepoError::Conflict(_))
    );

    let first = tx.deactivate_assignment(a.id, Utc::now()).await.unwrap();
    let second = tx
        .deactivate_assignment(a.id, Utc::now() + Duration::hours(1))
        .await
        .unwrap();
    assert!(!second.active);
    assert_eq!(first.deactivated_at, second.deactivated_at);
    assert!(!tx.has_active_assignment("coach", "client").await.unwrap());
}

// ---------------------------------------------------------------------------
// Cascades
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deleting_a_schema_removes_its_workouts() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let schema = tx.create_schema("u1", None, monday()).await.unwrap();
    let workout = tx.create_workout(schema.id, 1, "Full Body").await.unwrap();
    tx.add_workout_exercise(
        workout.id,
        &NewWorkoutExercise {
            exercise_id: 1,
            sets: 3,
            reps: "10-12".into(),
            rest_seconds: 60,
            order_index: 0,
        },
    )
    .await
    .unwrap();
    assert_matches!(
        tx.create_workout(schema.id, 1, "Again").await,
        Err(RepoError::Conflict(_))
    );

    tx.delete_schema(schema.id).await.unwrap();
    assert_matches!(tx.get_workout(workout.id).await, Err(RepoError::NotFound { .. }));
    assert!(tx.list_workout_exercises(workout.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Sessions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn saving_a_performance_twice_replaces_it() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let session = tx.create_session(&active_session("u1")).await.unwrap();
    let set = SetRecord {
        weight: 100.0,
        reps: 5,
        rpe: Some(8.0),
    };

    let first = tx.save_exercise_performance(session.id, 23, &[set]).await.unwrap();
    let second = tx
        .save_exercise_performance(session.id, 23, &[set, set])
        .await
        .unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.sets_completed, 2);
    assert_eq!(second.total_volume, 1000.0);
    assert_eq!(second.best_set, Some(set));
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unread_count_ignores_own_and_deleted_messages() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let c = tx.create_conversation("coach", "client").await.unwrap();
    let m1 = tx.insert_message(&text(c.id, "coach", "one")).await.unwrap();
    let m2 = tx.insert_message(&text(c.id, "coach", "two")).await.unwrap();
    tx.insert_message(&text(c.id, "client", "mine")).await.unwrap();

    assert_eq!(tx.unread_count(c.id, "client").await.unwrap(), 2);
    tx.soft_delete_message(m2.id).await.unwrap();
    assert_eq!(tx.unread_count(c.id, "client").await.unwrap(), 1);

    assert!(tx.mark_read(m1.id, "client").await.unwrap());
    assert!(!tx.mark_read(m1.id, "client").await.unwrap());
    assert_eq!(tx.unread_count(c.id, "client").await.unwrap(), 0);

    let listed = tx.list_messages(c.id, None, 50).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|m| m.id != m2.id));
}

#[tokio::test]
async fn conversation_summary_carries_last_message() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let c = tx.create_conversation("coach", "client").await.unwrap();
    tx.insert_message(&text(c.id, "client", "first")).await.unwrap();
    let last = tx.insert_message(&text(c.id, "client", "second")).await.unwrap();

    let summaries = tx.list_conversations("coach", false).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].last_message.as_ref().map(|m| m.id), Some(last.id));
    assert_eq!(summaries[0].unread_count, 2);

    let marked = tx.mark_conversation_read(c.id, "coach").await.unwrap();
    assert_eq!(marked.len(), 2);
    assert!(tx.mark_conversation_read(c.id, "coach").await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_conversation_cascades_to_messages() {
    let repo = MemoryRepository::new();
    let mut tx = repo.begin().await.unwrap();
    let c = tx.create_conversation("coach", "client").await.unwrap();
    let m = tx.insert_message(&text(c.id, "coach", "bye")).await.unwrap();
    tx.mark_read(m.id, "client").await.unwrap();

    tx.delete_conversation(c.id).await.unwrap();
    assert_matches!(tx.get_message(m.id).await, Err(RepoError::NotFound { .. }));
    assert_matches!(tx.delete_conversation(c.id).await, Err(RepoError::NotFound { .. }));
}
