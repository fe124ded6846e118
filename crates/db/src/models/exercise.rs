//! Exercise catalog model.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use fitup_core::catalog::CatalogExercise;
use fitup_core::fitness::{Equipment, ExerciseType, FitnessLevel, Joint, MovementClass};
use fitup_core::plan::ExerciseCandidate;
use fitup_core::types::DbId;

/// A row from the `exercises` table. Read-only to the application.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct Exercise {
    pub id: DbId,
    pub name: String,
    pub muscle_groups: Vec<String>,
    #[sqlx(try_from = "String")]
    pub difficulty: FitnessLevel,
    #[sqlx(try_from = "String")]
    pub equipment: Equipment,
    #[sqlx(try_from = "String")]
    pub exercise_type: ExerciseType,
    #[sqlx(try_from = "String")]
    pub movement: MovementClass,
    #[sqlx(json)]
    pub stressed_joints: Vec<Joint>,
    pub default_sets: i16,
    pub default_reps: String,
    pub rest_seconds: i32,
}

impl Exercise {
    pub fn from_catalog(id: DbId, entry: &CatalogExercise) -> Self {
        Self {
            id,
            name: entry.name.to_string(),
            muscle_groups: entry.muscle_groups.iter().map(|g| g.to_string()).collect(),
            difficulty: entry.difficulty,
            equipment: entry.equipment,
            exercise_type: entry.exercise_type,
            movement: entry.movement,
            stressed_joints: entry.stressed_joints.to_vec(),
            default_sets: entry.default_sets,
            default_reps: entry.default_reps.to_string(),
            rest_seconds: entry.rest_seconds,
        }
    }

    pub fn to_candidate(&self) -> ExerciseCandidate {
        ExerciseCandidate {
            id: self.id,
            name: self.name.clone(),
            muscle_groups: self.muscle_groups.clone(),
            difficulty: self.difficulty,
            equipment: self.equipment,
            exercise_type: self.exercise_type,
            movement: self.movement,
            stressed_joints: self.stressed_joints.clone(),
            default_reps: self.default_reps.clone(),
        }
    }
}

/// Optional, AND-combined catalog filters.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExerciseFilter {
    pub muscle_group: Option<String>,
    pub equipment: Option<Equipment>,
    pub difficulty: Option<FitnessLevel>,
    pub exercise_type: Option<ExerciseType>,
}

impl ExerciseFilter {
    pub fn matches(&self, exercise: &Exercise) -> bool {
        self.muscle_group
            .as_ref()
            .is_none_or(|g| exercise.muscle_groups.iter().any(|m| m == g))
            && self.equipment.is_none_or(|e| exercise.equipment == e)
            && self.difficulty.is_none_or(|d| exercise.difficulty == d)
            && self.exercise_type.is_none_or(|t| exercise.exercise_type == t)
    }
}
