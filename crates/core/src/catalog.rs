//! Built-in exercise catalog.
//!
//! Seeded into the `exercises` table by migration (same order, so ids are
//! 1-based positions in [`EXERCISES`]) and loaded directly by the in-process
//! store.

use crate::fitness::muscle::*;
use crate::fitness::{Equipment, ExerciseType, FitnessLevel, Joint, MovementClass};
use crate::plan::selection::ExerciseCandidate;
use crate::types::DbId;

/// A catalog entry, independent of storage ids.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CatalogExercise {
    pub name: &'static str,
    pub muscle_groups: &'static [&'static str],
    pub difficulty: FitnessLevel,
    pub equipment: Equipment,
    pub exercise_type: ExerciseType,
    pub movement: MovementClass,
    pub stressed_joints: &'static [Joint],
    pub default_sets: i16,
    pub default_reps: &'static str,
    pub rest_seconds: i32,
}

macro_rules! exercise {
    (
        $name:literal, [$($group:ident),*], $difficulty:ident, $equipment:ident,
        $kind:ident, $movement:ident, [$($joint:ident),*], $sets:literal, $reps:literal, $rest:literal
    ) => {
        CatalogExercise {
            name: $name,
            muscle_groups: &[$($group),*],
            difficulty: FitnessLevel::$difficulty,
            equipment: Equipment::$equipment,
            exercise_type: ExerciseType::$kind,
            movement: MovementClass::$movement,
            stressed_joints: &[$(Joint::$joint),*],
            default_sets: $sets,
            default_reps: $reps,
            rest_seconds: $rest,
        }
    };
}

pub static EXERCISES: &[CatalogExercise] = &[
    exercise!("Push-Up", [CHEST, TRICEPS, SHOULDERS], Beginner, Bodyweight, Strength, Compound, [Shoulder, Wrist], 3, "10-15", 60),
    exercise!("Bodyweight Squat", [QUADS, GLUTES], Beginner, Bodyweight, Strength, Compound, [Knee], 3, "12-15", 60),
    exercise!("Inverted Row", [BACK, BICEPS], Beginner, Bodyweight, Strength, Compound, [Shoulder, Elbow], 3, "8-12", 60),
    exercise!("Glute Bridge", [GLUTES, HAMSTRINGS], Beginner, Bodyweight, Strength, Accessory, [Hip], 3, "12-15", 45),
    exercise!("Plank", [CORE], Beginner, Bodyweight, Strength, Isolation, [Shoulder], 3, "30 sec", 45),
    exercise!("Reverse Lunge", [QUADS, GLUTES, HAMSTRINGS], Beginner, Bodyweight, Strength, Compound, [Knee], 3, "10-12", 60),
    exercise!("Pike Push-Up", [SHOULDERS, TRICEPS], Intermediate, Bodyweight, Strength, Compound, [Shoulder, Wrist, Neck], 3, "8-12", 75),
    exercise!("Pull-Up", [BACK, BICEPS], Intermediate, Bodyweight, Strength, Compound, [Shoulder, Elbow], 4, "6-10", 90),
    exercise!("Parallel Bar Dip", [TRICEPS, CHEST], Intermediate, Bodyweight, Strength, Compound, [Shoulder, Elbow], 3, "8-12", 90),
    exercise!("Bird Dog", [CORE, GLUTES], Beginner, Bodyweight, Strength, Isolation, [], 3, "10-12", 30),
    exercise!("Dead Bug", [CORE], Beginner, Bodyweight, Strength, Isolation, [], 3, "10-12", 30),
    exercise!("Standing Calf Raise", [CALVES], Beginner, Bodyweight, Strength, Isolation, [Ankle], 3, "15-20", 30),
    exercise!("Dumbbell Bench Press", [CHEST, TRICEPS, SHOULDERS], Beginner, Dumbbell, Strength, Compound, [Shoulder], 4, "8-12", 90),
    exercise!("One-Arm Dumbbell Row", [BACK, BICEPS], Beginner, Dumbbell, Strength, Compound, [LowerBack, Elbow], 3, "8-12", 75),
    exercise!("Goblet Squat", [QUADS, GLUTES], Beginner, Dumbbell, Strength, Compound, [Knee], 3, "10-12", 75),
    exercise!("Dumbbell Romanian Deadlift", [HAMSTRINGS, GLUTES], Intermediate, Dumbbell, Strength, Compound, [LowerBack, Hip], 3, "8-12", 90),
    exercise!("Dumbbell Shoulder Press", [SHOULDERS, TRICEPS], Beginner, Dumbbell, Strength, Compound, [Shoulder], 3, "8-12", 75),
    exercise!("Dumbbell Lateral Raise", [SHOULDERS], Beginner, Dumbbell, Strength, Isolation, [Shoulder], 3, "12-15", 45),
    exercise!("Dumbbell Biceps Curl", [BICEPS], Beginner, Dumbbell, Strength, Isolation, [Elbow], 3, "10-12", 45),
    exercise!("Overhead Triceps Extension", [TRICEPS], Beginner, Dumbbell, Strength, Isolation, [Elbow, Shoulder], 3, "10-12", 45),
    exercise!("Dumbbell Walking Lunge", [QUADS, GLUTES], Intermediate, Dumbbell, Strength, Compound, [Knee], 3, "10-12", 75),
    exercise!("Dumbbell Fly", [CHEST], Intermediate, Dumbbell, Strength, Isolation, [Shoulder], 3, "10-15", 60),
    exercise!("Barbell Back Squat", [QUADS, GLUTES, HAMSTRINGS], Intermediate, Barbell, Strength, Compound, [Knee, LowerBack], 4, "5-8", 150),
    exercise!("Barbell Bench Press", [CHEST, TRICEPS, SHOULDERS], Intermediate, Barbell, Strength, Compound, [Shoulder, Wrist], 4, "5-8", 150),
    exercise!("Conventional Deadlift", [HAMSTRINGS, GLUTES, BACK], Intermediate, Barbell, Strength, Compound, [LowerBack, Hip], 3, "3-5", 180),
    exercise!("Overhead Press", [SHOULDERS, TRICEPS], Intermediate, Barbell, Strength, Compound, [Shoulder, LowerBack], 4, "5-8", 120),
    exercise!("Barbell Row", [BACK, BICEPS], Intermediate, Barbell, Strength, Compound, [LowerBack], 4, "6-10", 120),
    exercise!("Front Squat", [QUADS, CORE], Advanced, Barbell, Strength, Compound, [Knee, Wrist], 4, "3-6", 180),
    exercise!("Barbell Hip Thrust", [GLUTES, HAMSTRINGS], Intermediate, Barbell, Strength, Accessory, [Hip], 3, "8-12", 90),
    exercise!("Power Clean", [HAMSTRINGS, GLUTES, BACK, SHOULDERS], Advanced, Barbell, Strength, Compound, [Wrist, LowerBack, Knee], 5, "2-3", 180),
    exercise!("Leg Press", [QUADS, GLUTES], Beginner, Machine, Strength, Compound, [Knee], 3, "10-12", 90),
    exercise!("Lat Pulldown", [BACK, BICEPS], Beginner, Cable, Strength, Compound, [Shoulder], 3, "8-12", 75),
    exercise!("Seated Cable Row", [BACK, BICEPS], Beginner, Cable, Strength, Compound, [LowerBack], 3, "8-12", 75),
    exercise!("Leg Extension", [QUADS], Beginner, Machine, Strength, Isolation, [Knee], 3, "12-15", 60),
    exercise!("Lying Leg Curl", [HAMSTRINGS], Beginner, Machine, Strength, Isolation, [Knee], 3, "10-12", 60),
    exercise!("Machine Chest Press", [CHEST, TRICEPS], Beginner, Machine, Strength, Compound, [Shoulder], 3, "8-12", 75),
    exercise!("Cable Triceps Pushdown", [TRICEPS], Beginner, Cable, Strength, Isolation, [Elbow], 3, "10-15", 45),
    exercise!("Face Pull", [SHOULDERS, BACK], Beginner, Cable, Strength, Accessory, [Shoulder], 3, "12-15", 45),
    exercise!("Seated Calf Raise", [CALVES], Beginner, Machine, Strength, Isolation, [Ankle], 3, "15-20", 30),
    exercise!("Kettlebell Swing", [GLUTES, HAMSTRINGS, CORE], Intermediate, Kettlebell, Strength, Compound, [LowerBack, Hip], 4, "12-15", 60),
    exercise!("Turkish Get-Up", [CORE, SHOULDERS], Advanced, Kettlebell, Strength, Compound, [Shoulder, Wrist], 3, "3-5", 90),
    exercise!("Kettlebell Goblet Squat", [QUADS, GLUTES], Beginner, Kettlebell, Strength, Compound, [Knee], 3, "10-12", 60),
    exercise!("Band Pull-Apart", [SHOULDERS, BACK], Beginner, Band, Strength, Isolation, [Shoulder], 3, "15-20", 30),
    exercise!("Banded Lateral Walk", [GLUTES], Beginner, Band, Strength, Accessory, [Hip, Knee], 3, "12-15", 30),
    exercise!("Band Row", [BACK, BICEPS], Beginner, Band, Strength, Compound, [Elbow], 3, "12-15", 45),
    exercise!("Jumping Jacks", [CARDIO], Beginner, Bodyweight, Cardio, Compound, [Ankle, Knee], 3, "45 sec", 30),
    exercise!("Mountain Climbers", [CARDIO, CORE], Beginner, Bodyweight, Cardio, Compound, [Wrist, Shoulder], 3, "30 sec", 30),
    exercise!("Burpees", [CARDIO, CHEST, QUADS], Intermediate, Bodyweight, Cardio, Compound, [Knee, Wrist, Shoulder], 3, "30 sec", 45),
    exercise!("High Knees", [CARDIO], Beginner, Bodyweight, Cardio, Accessory, [Knee, Ankle], 3, "30 sec", 30),
    exercise!("Rowing Machine Intervals", [CARDIO, BACK], Beginner, Machine, Cardio, Compound, [LowerBack], 4, "60 sec", 60),
    exercise!("Hip Flexor Stretch", [GLUTES], Beginner, Bodyweight, Mobility, Isolation, [], 2, "30 sec", 15),
    exercise!("Cat-Cow", [CORE, BACK], Beginner, Bodyweight, Mobility, Isolation, [], 2, "30 sec", 15),
];

impl CatalogExercise {
    pub fn to_candidate(&self, id: DbId) -> ExerciseCandidate {
        ExerciseCandidate {
            id,
            name: self.name.to_string(),
            muscle_groups: self.muscle_groups.iter().map(|g| g.to_string()).collect(),
            difficulty: self.difficulty,
            equipment: self.equipment,
            exercise_type: self.exercise_type,
            movement: self.movement,
            stressed_joints: self.stressed_joints.to_vec(),
            default_reps: self.default_reps.to_string(),
        }
    }
}

/// The whole catalog as generator candidates, with seed ids (1-based).
pub fn seed_candidates() -> Vec<ExerciseCandidate> {
    EXERCISES
        .iter()
        .enumerate()
        .map(|(i, e)| e.to_candidate(i as DbId + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn names_are_unique() {
        let names: HashSet<&str> = EXERCISES.iter().map(|e| e.name).collect();
        assert_eq!(names.len(), EXERCISES.len());
    }

    #[test]
    fn every_entry_has_muscle_groups() {
        assert!(EXERCISES.iter().all(|e| !e.muscle_groups.is_empty()));
    }

    #[test]
    fn beginner_bodyweight_covers_full_body() {
        let groups: HashSet<&str> = EXERCISES
            .iter()
            .filter(|e| e.difficulty == FitnessLevel::Beginner && e.equipment == Equipment::Bodyweight)
            .flat_map(|e| e.muscle_groups.iter().copied())
            .collect();
        for g in [CHEST, BACK, QUADS, GLUTES, CORE, CARDIO] {
            assert!(groups.contains(g), "missing {g}");
        }
    }
}
