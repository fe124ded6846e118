//! Weekly schemas, workouts and workout exercises.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use fitup_core::types::{DbId, Timestamp, UserId};

/// A row from the `weekly_schemas` table. At most one active per user.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WeeklySchema {
    pub id: DbId,
    pub user_id: UserId,
    pub plan_id: Option<DbId>,
    pub week_start: NaiveDate,
    pub active: bool,
    pub created_at: Timestamp,
}

/// A row from the `workouts` table. Unique per `(schema_id, day_of_week)`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Workout {
    pub id: DbId,
    pub schema_id: DbId,
    pub day_of_week: i16,
    pub focus: String,
}

/// A row from the `workout_exercises` table, ordered by `order_index`.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WorkoutExercise {
    pub id: DbId,
    pub workout_id: DbId,
    pub exercise_id: DbId,
    pub sets: i16,
    pub reps: String,
    pub rest_seconds: i32,
    pub order_index: i16,
}

/// DTO for inserting a workout exercise.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWorkoutExercise {
    pub exercise_id: DbId,
    pub sets: i16,
    pub reps: String,
    pub rest_seconds: i32,
    pub order_index: i16,
}
