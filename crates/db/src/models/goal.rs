//! Fitness goal model.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use fitup_core::fitness::FitnessGoal;
use fitup_core::types::{DbId, Timestamp, UserId};

/// A row from the `fitness_goals` table.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Goal {
    pub id: DbId,
    pub user_id: UserId,
    #[sqlx(try_from = "String")]
    pub goal_type: FitnessGoal,
    /// Exercise whose progress drives the goal, if any.
    pub exercise_id: Option<DbId>,
    pub description: Option<String>,
    pub current_value: f64,
    pub target_value: f64,
    pub target_date: NaiveDate,
    pub active: bool,
    pub completed: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

/// DTO for creating a goal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewGoal {
    #[serde(skip)]
    pub user_id: UserId,
    pub goal_type: FitnessGoal,
    #[serde(default)]
    pub exercise_id: Option<DbId>,
    #[serde(default)]
    pub description: Option<String>,
    pub current_value: f64,
    pub target_value: f64,
    pub target_date: NaiveDate,
}
