//! Progress logs and 1RM estimate history.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use fitup_core::one_rep_max::OneRepMaxMethod;
use fitup_core::types::{DbId, Timestamp, UserId};

/// A row from the `progress_logs` table. One per exercise per session.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct ProgressLog {
    pub id: DbId,
    pub user_id: UserId,
    pub exercise_id: DbId,
    pub session_id: Option<DbId>,
    pub log_date: NaiveDate,
    pub sets_completed: i32,
    pub reps_completed: i32,
    pub weight_used: f64,
    pub duration_seconds: Option<i32>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewProgressLog {
    pub user_id: UserId,
    pub exercise_id: DbId,
    pub session_id: Option<DbId>,
    pub log_date: NaiveDate,
    pub sets_completed: i32,
    pub reps_completed: i32,
    pub weight_used: f64,
    pub duration_seconds: Option<i32>,
}

/// A row from the `one_rep_max_estimates` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct OneRepMaxRecord {
    pub id: DbId,
    pub user_id: UserId,
    pub exercise_id: DbId,
    pub estimated_max: f64,
    #[sqlx(try_from = "String")]
    pub method: OneRepMaxMethod,
    pub confidence: f64,
    pub source_weight: f64,
    pub source_reps: i32,
    pub source_rpe: Option<f64>,
    pub source_session_id: Option<DbId>,
    pub recorded_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOneRepMax {
    pub user_id: UserId,
    pub exercise_id: DbId,
    pub estimated_max: f64,
    pub method: OneRepMaxMethod,
    pub confidence: f64,
    pub source_weight: f64,
    pub source_reps: i32,
    pub source_rpe: Option<f64>,
    pub source_session_id: Option<DbId>,
    pub recorded_at: Timestamp,
}
