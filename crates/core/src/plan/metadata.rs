//! Typed plan metadata carried in the plan's metadata blob.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::enums::define_text_enum;
use crate::error::CoreError;
use crate::fitness::{Equipment, FitnessGoal, FitnessLevel, Joint, MovementClass, RecoveryStatus};
use crate::types::DbId;
use crate::validation::{validate_int_range, validate_non_empty};

/// Algorithm tag stored on every generated plan.
pub const ALGORITHM_ADAPTIVE_V1: &str = "fitup_adaptive_v1";

pub const MIN_FREQUENCY: u8 = 1;
pub const MAX_FREQUENCY: u8 = 7;
pub const MIN_WORKOUT_MINUTES: u16 = 10;
pub const MAX_WORKOUT_MINUTES: u16 = 180;

/// Inputs to plan generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanRequest {
    /// Non-empty; the first entry is the primary goal.
    pub goals: Vec<FitnessGoal>,
    pub equipment: Vec<Equipment>,
    pub level: FitnessLevel,
    pub weekly_frequency: u8,
    pub time_per_workout: u16,
    #[serde(default)]
    pub limitations: Vec<Joint>,
    #[serde(default)]
    pub recovery: Option<RecoveryStatus>,
    /// Known 1RM estimates, used to derive load targets.
    #[serde(default)]
    pub one_rep_maxes: Vec<ExerciseMax>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExerciseMax {
    pub exercise_id: DbId,
    pub one_rep_max: f64,
}

impl PlanRequest {
    /// Check the metadata invariants. Every failure is a validation error.
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_non_empty(&self.goals, "goals").map_err(invalid_metadata)?;
        validate_non_empty(&self.equipment, "equipment").map_err(invalid_metadata)?;
        validate_int_range(
            i64::from(self.weekly_frequency),
            i64::from(MIN_FREQUENCY),
            i64::from(MAX_FREQUENCY),
            "weekly frequency",
        )
        .map_err(invalid_metadata)?;
        validate_int_range(
            i64::from(self.time_per_workout),
            i64::from(MIN_WORKOUT_MINUTES),
            i64::from(MAX_WORKOUT_MINUTES),
            "time per workout",
        )
        .map_err(invalid_metadata)?;
        if self
            .one_rep_maxes
            .iter()
            .any(|m| !m.one_rep_max.is_finite() || m.one_rep_max <= 0.0) {
            return Err(invalid_metadata(CoreError::Validation(
                "1RM estimates must be positive".into(),
            )));
        }
        Ok(())
    }

    pub fn one_rep_max_for(&self, exercise_id: DbId) -> Option<f64> {
        self.one_rep_maxes
            .iter()
            .find(|m| m.exercise_id == exercise_id)
            .map(|m| m.one_rep_max)
    }

    pub fn primary_goal(&self) -> FitnessGoal {
        self.goals.first().copied().unwrap_or(FitnessGoal::GeneralFitness)
    }
}

fn invalid_metadata(err: CoreError) -> CoreError {
    match err {
        CoreError::Validation(msg) => CoreError::Validation(format!("invalid plan metadata: {msg}")),
        other => other,
    }
}

define_text_enum! {
    ProgressionMethod("progression method") {
        LinearLoad = "linear_load",
        DoubleProgression = "double_progression",
        Density = "density",
        VolumeProgression = "volume_progression",
    }
}

impl ProgressionMethod {
    pub fn for_goal(goal: FitnessGoal) -> Self {
        match goal {
            FitnessGoal::Strength => ProgressionMethod::LinearLoad,
            FitnessGoal::MuscleGain | FitnessGoal::GeneralFitness => ProgressionMethod::DoubleProgression,
            FitnessGoal::FatLoss => ProgressionMethod::Density,
            FitnessGoal::Endurance => ProgressionMethod::VolumeProgression,
        }
    }
}

/// One prescribed exercise in a planned day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedExercise {
    pub exercise_id: DbId,
    pub name: String,
    pub movement: MovementClass,
    pub sets: i16,
    /// Sets as first generated, before adaptations.
    pub base_sets: i16,
    pub reps: String,
    pub rest_seconds: i32,
    pub order_index: i16,
    /// Working load target, when a 1RM is known for the exercise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub load_target_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_load_kg: Option<f64>,
}

/// One day of the expanded week structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedDay {
    /// 1 = Monday .. 7 = Sunday.
    pub day_of_week: i16,
    pub focus: String,
    pub rest: bool,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
    #[serde(default)]
    pub exercises: Vec<PlannedExercise>,
}

define_text_enum! {
    IncreaseKind("increase kind") {
        Sets = "sets",
        Load = "load",
    }
}

/// Adaptation state of an adaptive-v1 plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptationState {
    /// Fraction of baseline set volume in force, floor 0.70.
    pub volume_factor: f64,
    /// Extra sets per exercise from increases, cap 2.
    pub extra_sets: i16,
    /// Multiplier on baseline load targets.
    pub load_factor: f64,
    pub next_increase: IncreaseKind,
    #[serde(default)]
    pub last_reduction_week: Option<NaiveDate>,
    #[serde(default)]
    pub last_increase_week: Option<NaiveDate>,
}

impl Default for AdaptationState {
    fn default() -> Self {
        Self {
            volume_factor: 1.0,
            extra_sets: 0,
            load_factor: 1.0,
            next_increase: IncreaseKind::Sets,
            last_reduction_week: None,
            last_increase_week: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveV1Parameters {
    pub request: PlanRequest,
    pub template_frequency: u8,
    pub exercises_per_workout: u8,
    #[serde(default)]
    pub adaptation: AdaptationState,
}

/// Algorithm-specific parameters, discriminated by the algorithm tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm")]
pub enum AlgorithmParameters {
    #[serde(rename = "fitup_adaptive_v1")]
    AdaptiveV1(AdaptiveV1Parameters),
}

impl AlgorithmParameters {
    pub fn algorithm(&self) -> &'static str {
        match self {
            AlgorithmParameters::AdaptiveV1(_) => ALGORITHM_ADAPTIVE_V1,
        }
    }
}

/// The structured metadata blob of a generated plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanMetadata {
    pub template: String,
    pub muscle_groups: Vec<String>,
    pub equipment: Vec<Equipment>,
    /// Total prescribed working sets across the week.
    pub estimated_weekly_volume: u32,
    pub progression_method: ProgressionMethod,
    pub structure: Vec<PlannedDay>,
    pub parameters: AlgorithmParameters,
    /// Free-form forward-compatible data.
    #[serde(default)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl PlanMetadata {
    pub fn workout_days(&self) -> impl Iterator<Item = &PlannedDay> {
        self.structure.iter().filter(|d| !d.rest)
    }

    /// Recompute the weekly set total from the structure.
    pub fn recompute_volume(&mut self) {
        self.estimated_weekly_volume = self
            .workout_days()
            .flat_map(|d| d.exercises.iter())
            .map(|e| e.sets.max(0) as u32)
            .sum();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> PlanRequest {
        PlanRequest {
            goals: vec![FitnessGoal::GeneralFitness],
            equipment: vec![Equipment::Bodyweight],
            level: FitnessLevel::Beginner,
            weekly_frequency: 3,
            time_per_workout: 30,
            limitations: vec![],
            recovery: None,
            one_rep_maxes: vec![ExerciseMax { exercise_id: 23, one_rep_max: 120.0 }],
        }
    }

    #[test]
    fn valid_request_passes() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn frequency_bounds() {
        for bad in [0, 8] {
            let err = PlanRequest { weekly_frequency: bad, ..request() }.validate().unwrap_err();
            assert!(matches!(err, CoreError::Validation(ref m) if m.contains("invalid plan metadata")));
        }
        assert!(PlanRequest { weekly_frequency: 7, ..request() }.validate().is_ok());
    }

    #[test]
    fn time_bounds() {
        assert!(PlanRequest { time_per_workout: 9, ..request() }.validate().is_err());
        assert!(PlanRequest { time_per_workout: 181, ..request() }.validate().is_err());
        assert!(PlanRequest { time_per_workout: 10, ..request() }.validate().is_ok());
        assert!(PlanRequest { time_per_workout: 180, ..request() }.validate().is_ok());
    }

    #[test]
    fn empty_equipment_or_goals_rejected() {
        assert!(PlanRequest { equipment: vec![], ..request() }.validate().is_err());
        assert!(PlanRequest { goals: vec![], ..request() }.validate().is_err());
    }

    #[test]
    fn parameters_are_tagged_by_algorithm() {
        let params = AlgorithmParameters::AdaptiveV1(AdaptiveV1Parameters {
            request: request(),
            template_frequency: 3,
            exercises_per_workout: 3,
            adaptation: AdaptationState::default(),
        });
        let json = serde_json::to_value(&params).unwrap();
        assert_eq!(json["algorithm"], "fitup_adaptive_v1");
        assert_eq!(json["request"]["level"], "beginner");
        let back: AlgorithmParameters = serde_json::from_value(json).unwrap();
        assert_eq!(back, params);
    }
}
