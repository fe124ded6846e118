//! Sets, reps and rest per goal.

use crate::fitness::{ExerciseType, FitnessGoal, RecoveryStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prescription {
    pub sets: i16,
    pub reps: &'static str,
    pub rest_seconds: i32,
}

pub fn for_goal(goal: FitnessGoal) -> Prescription {
    match goal {
        FitnessGoal::Strength => Prescription { sets: 5, reps: "3-5", rest_seconds: 180 },
        FitnessGoal::MuscleGain => Prescription { sets: 4, reps: "8-12", rest_seconds: 75 },
        FitnessGoal::FatLoss => Prescription { sets: 3, reps: "12-15", rest_seconds: 45 },
        FitnessGoal::Endurance => Prescription { sets: 3, reps: "15-20", rest_seconds: 30 },
        FitnessGoal::GeneralFitness => Prescription { sets: 3, reps: "10-12", rest_seconds: 60 },
    }
}

/// Work interval for timed exercises (cardio, mobility, holds).
pub fn timed_reps(goal: FitnessGoal) -> &'static str {
    match goal {
        FitnessGoal::Endurance => "60 sec",
        FitnessGoal::FatLoss => "45 sec",
        _ => "30 sec",
    }
}

/// Whether an exercise is prescribed by time rather than by repetitions.
pub fn is_timed(exercise_type: ExerciseType, default_reps: &str) -> bool {
    exercise_type != ExerciseType::Strength || default_reps.trim_end().ends_with("sec")
}

/// Working-load fraction of 1RM per goal.
pub fn load_fraction(goal: FitnessGoal) -> f64 {
    match goal {
        FitnessGoal::Strength => 0.85,
        FitnessGoal::MuscleGain => 0.72,
        FitnessGoal::GeneralFitness => 0.68,
        FitnessGoal::FatLoss => 0.65,
        FitnessGoal::Endurance => 0.55,
    }
}

/// Round a load to the nearest 0.5 kg.
pub fn round_load(kg: f64) -> f64 {
    (kg * 2.0).round() / 2.0
}

/// Scale a set count by a volume factor, never below one set.
pub fn scale_sets(sets: i16, factor: f64) -> i16 {
    ((f64::from(sets) * factor).round() as i16).max(1)
}

/// Sets after applying the recovery multiplier at generation time.
pub fn sets_for_recovery(sets: i16, recovery: Option<RecoveryStatus>) -> i16 {
    match recovery {
        Some(status) => scale_sets(sets, status.volume_multiplier()),
        None => sets,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn goal_table() {
        assert_eq!(for_goal(FitnessGoal::GeneralFitness), Prescription { sets: 3, reps: "10-12", rest_seconds: 60 });
        assert_eq!(for_goal(FitnessGoal::Strength).rest_seconds, 180);
        assert_eq!(for_goal(FitnessGoal::Endurance).reps, "15-20");
    }

    #[test]
    fn timed_detection() {
        assert!(is_timed(ExerciseType::Cardio, "10"));
        assert!(is_timed(ExerciseType::Strength, "30 sec"));
        assert!(!is_timed(ExerciseType::Strength, "8-12"));
    }

    #[test]
    fn recovery_scaling() {
        assert_eq!(sets_for_recovery(4, Some(RecoveryStatus::UnderRecovered)), 3);
        assert_eq!(sets_for_recovery(3, Some(RecoveryStatus::WellRecovered)), 3);
        assert_eq!(sets_for_recovery(5, None), 5);
        assert_eq!(scale_sets(1, 0.7), 1);
    }

    #[test]
    fn loads_round_to_half_kilo() {
        assert_eq!(round_load(81.3), 81.5);
        assert_eq!(round_load(81.2), 81.0);
    }
}
