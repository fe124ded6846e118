//! Fitness vocabulary: levels, goals, equipment, exercise taxonomy.

use crate::enums::define_text_enum;

define_text_enum! {
    /// Training experience. Ordering is significant: an exercise is eligible
    /// for a user when `exercise.difficulty <= user.level`.
    FitnessLevel("fitness level") {
        Beginner = "beginner",
        Intermediate = "intermediate",
        Advanced = "advanced",
    }
}

define_text_enum! {
    /// Training goal. The first goal of a plan request is the primary goal.
    FitnessGoal("fitness goal") {
        MuscleGain = "muscle_gain",
        FatLoss = "fat_loss",
        Strength = "strength",
        Endurance = "endurance",
        GeneralFitness = "general_fitness",
    }
}

define_text_enum! {
    /// Equipment an exercise needs / a user has access to.
    Equipment("equipment") {
        Bodyweight = "bodyweight",
        Dumbbell = "dumbbell",
        Barbell = "barbell",
        Machine = "machine",
        Cable = "cable",
        Kettlebell = "kettlebell",
        Band = "band",
    }
}

define_text_enum! {
    ExerciseType("exercise type") {
        Strength = "strength",
        Cardio = "cardio",
        Mobility = "mobility",
    }
}

define_text_enum! {
    /// Selection priority within a workout: compounds first, isolation last.
    MovementClass("movement class") {
        Compound = "compound",
        Accessory = "accessory",
        Isolation = "isolation",
    }
}

define_text_enum! {
    /// Joints an exercise loads. A user limitation on a joint excludes every
    /// exercise stressing it.
    Joint("joint") {
        Knee = "knee",
        LowerBack = "lower_back",
        Shoulder = "shoulder",
        Wrist = "wrist",
        Elbow = "elbow",
        Hip = "hip",
        Ankle = "ankle",
        Neck = "neck",
    }
}

define_text_enum! {
    /// Recovery state derived from recent session feedback.
    RecoveryStatus("recovery status") {
        UnderRecovered = "under_recovered",
        Normal = "normal",
        WellRecovered = "well_recovered",
    }
}

impl RecoveryStatus {
    /// Volume multiplier applied on top of the level preset.
    pub fn volume_multiplier(self) -> f64 {
        match self {
            RecoveryStatus::UnderRecovered => 0.85,
            RecoveryStatus::Normal => 1.0,
            RecoveryStatus::WellRecovered => 1.05,
        }
    }
}

/// Canonical muscle group names used by the exercise catalog and templates.
pub mod muscle {
    pub const CHEST: &str = "chest";
    pub const BACK: &str = "back";
    pub const SHOULDERS: &str = "shoulders";
    pub const BICEPS: &str = "biceps";
    pub const TRICEPS: &str = "triceps";
    pub const QUADS: &str = "quads";
    pub const HAMSTRINGS: &str = "hamstrings";
    pub const GLUTES: &str = "glutes";
    pub const CALVES: &str = "calves";
    pub const CORE: &str = "core";
    pub const CARDIO: &str = "cardio";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_ordering_matches_difficulty() {
        assert!(FitnessLevel::Beginner < FitnessLevel::Intermediate);
        assert!(FitnessLevel::Intermediate < FitnessLevel::Advanced);
    }

    #[test]
    fn goal_text_round_trips_through_serde() {
        let json = serde_json::to_string(&FitnessGoal::GeneralFitness).unwrap();
        assert_eq!(json, "\"general_fitness\"");
        let back: FitnessGoal = serde_json::from_str(&json).unwrap();
        assert_eq!(back, FitnessGoal::GeneralFitness);
    }

    #[test]
    fn unknown_equipment_is_a_validation_error() {
        let err = "trx".parse::<Equipment>().unwrap_err();
        assert!(err.to_string().contains("invalid equipment"));
    }

    #[test]
    fn recovery_multipliers() {
        assert_eq!(RecoveryStatus::UnderRecovered.volume_multiplier(), 0.85);
        assert_eq!(RecoveryStatus::Normal.volume_multiplier(), 1.0);
        assert_eq!(RecoveryStatus::WellRecovered.volume_multiplier(), 1.05);
    }
}
