//! Workout profile model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use fitup_core::error::CoreError;
use fitup_core::fitness::{Equipment, FitnessGoal, FitnessLevel, Joint};
use fitup_core::types::{Timestamp, UserId};
use fitup_core::validation::{validate_int_range, validate_non_empty};

/// A row from the `workout_profiles` table. One per user.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct WorkoutProfile {
    pub user_id: UserId,
    #[sqlx(try_from = "String")]
    pub level: FitnessLevel,
    #[sqlx(try_from = "String")]
    pub primary_goal: FitnessGoal,
    pub weekly_frequency: i16,
    pub time_per_workout: i16,
    #[sqlx(json)]
    pub equipment: Vec<Equipment>,
    #[sqlx(json)]
    pub limitations: Vec<Joint>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating or replacing a profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpsertProfile {
    pub level: FitnessLevel,
    pub primary_goal: FitnessGoal,
    pub weekly_frequency: i16,
    pub time_per_workout: i16,
    pub equipment: Vec<Equipment>,
    #[serde(default)]
    pub limitations: Vec<Joint>,
}

impl UpsertProfile {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_int_range(i64::from(self.weekly_frequency), 1, 7, "weekly frequency")?;
        validate_int_range(i64::from(self.time_per_workout), 10, 180, "time per workout")?;
        validate_non_empty(&self.equipment, "equipment")?;
        Ok(())
    }
}
