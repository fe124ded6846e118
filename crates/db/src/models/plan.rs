//! Generated plans, performance records and adaptation audit rows.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;
use fitup_core::plan::adaptation::PrescriptionChange;
use fitup_core::plan::{PerformanceSample, PlanMetadata};
use fitup_core::types::{DbId, Timestamp, UserId};

/// A row from the `generated_plans` table. At most one active per user.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Plan {
    pub id: DbId,
    pub user_id: UserId,
    pub week_start: NaiveDate,
    pub generated_at: Timestamp,
    pub algorithm: String,
    pub active: bool,
    pub regeneration_requested: bool,
    pub regeneration_reason: Option<String>,
    #[sqlx(json)]
    pub metadata: PlanMetadata,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPlan {
    pub user_id: UserId,
    pub week_start: NaiveDate,
    pub algorithm: String,
    pub metadata: PlanMetadata,
}

/// A row from the `plan_performance_records` table. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PerformanceRecord {
    pub id: DbId,
    pub plan_id: DbId,
    pub session_id: Option<DbId>,
    pub completion_rate: f64,
    pub average_rpe: Option<f64>,
    pub skipped_count: i32,
    pub recorded_at: Timestamp,
}

impl PerformanceRecord {
    pub fn sample(&self) -> PerformanceSample {
        PerformanceSample {
            completion_rate: self.completion_rate,
            average_rpe: self.average_rpe,
            skipped_count: self.skipped_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewPerformanceRecord {
    pub plan_id: DbId,
    pub session_id: Option<DbId>,
    pub sample: PerformanceSample,
}

/// A row from the `plan_adaptations` table. Append-only audit.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct PlanAdaptation {
    pub id: DbId,
    pub plan_id: DbId,
    pub user_id: UserId,
    pub reason: String,
    pub diff_summary: String,
    #[sqlx(json)]
    pub changes: Vec<PrescriptionChange>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAdaptation {
    pub plan_id: DbId,
    pub user_id: UserId,
    pub reason: String,
    pub diff_summary: String,
    pub changes: Vec<PrescriptionChange>,
}
