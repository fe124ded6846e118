//! Workout sessions and per-exercise performance.

use serde::Serialize;
use sqlx::FromRow;
use fitup_core::session::{SessionStatus, SessionSummary, SetRecord};
use fitup_core::types::{DbId, Timestamp, UserId};

/// A row from the `workout_sessions` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WorkoutSession {
    pub id: DbId,
    pub user_id: UserId,
    pub workout_id: Option<DbId>,
    pub plan_id: Option<DbId>,
    #[sqlx(try_from = "String")]
    pub status: SessionStatus,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    #[sqlx(json)]
    pub summary: SessionSummary,
    pub skip_reason: Option<String>,
    pub completion_rate: Option<f64>,
}

/// DTO for inserting a session (started or skipped).
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub user_id: UserId,
    pub workout_id: Option<DbId>,
    pub plan_id: Option<DbId>,
    pub status: SessionStatus,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub skip_reason: Option<String>,
}

/// A row from the `exercise_performances` table. One per exercise per session.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ExercisePerformance {
    pub id: DbId,
    pub session_id: DbId,
    pub exercise_id: DbId,
    #[sqlx(json)]
    pub sets: Vec<SetRecord>,
    pub sets_completed: i32,
    #[sqlx(json)]
    pub best_set: Option<SetRecord>,
    pub total_volume: f64,
    pub updated_at: Timestamp,
}

/// Completed/skipped counts over a window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionCounts {
    pub completed: i64,
    pub skipped: i64,
}
