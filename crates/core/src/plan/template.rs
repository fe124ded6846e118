//! Workout template catalog keyed by `(level, goal, frequency)`.

use crate::error::CoreError;
use crate::fitness::muscle::*;
use crate::fitness::{ExerciseType, FitnessGoal, FitnessLevel};

/// A training focus for one workout day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayFocus {
    pub name: &'static str,
    pub muscle_groups: &'static [&'static str],
    pub exercise_types: &'static [ExerciseType],
}

/// One slot of a template week, Monday first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DaySlot {
    Rest,
    Train(DayFocus),
}

impl DaySlot {
    pub fn is_rest(&self) -> bool {
        matches!(self, DaySlot::Rest)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutTemplate {
    pub name: &'static str,
    pub level: FitnessLevel,
    pub goal: FitnessGoal,
    pub days: &'static [DaySlot; 7],
}

impl WorkoutTemplate {
    /// Number of training days in the template week.
    pub fn frequency(&self) -> u8 {
        self.days.iter().filter(|d| !d.is_rest()).count() as u8
    }
}

// ---------------------------------------------------------------------------
// Day focuses
// ---------------------------------------------------------------------------

const STRENGTH: &[ExerciseType] = &[ExerciseType::Strength];
const CONDITIONING_TYPES: &[ExerciseType] = &[ExerciseType::Cardio, ExerciseType::Strength];

pub const FULL_BODY: DayFocus = DayFocus {
    name: "Full Body",
    muscle_groups: &[CHEST, BACK, QUADS, GLUTES, SHOULDERS, CORE],
    exercise_types: STRENGTH,
};
pub const UPPER_BODY: DayFocus = DayFocus {
    name: "Upper Body",
    muscle_groups: &[CHEST, BACK, SHOULDERS, BICEPS, TRICEPS],
    exercise_types: STRENGTH,
};
pub const UPPER_PUSH: DayFocus = DayFocus {
    name: "Upper Body Push",
    muscle_groups: &[CHEST, SHOULDERS, TRICEPS],
    exercise_types: STRENGTH,
};
pub const UPPER_PULL: DayFocus = DayFocus {
    name: "Upper Body Pull",
    muscle_groups: &[BACK, BICEPS],
    exercise_types: STRENGTH,
};
pub const LOWER_BODY: DayFocus = DayFocus {
    name: "Lower Body",
    muscle_groups: &[QUADS, HAMSTRINGS, GLUTES, CALVES],
    exercise_types: STRENGTH,
};
pub const CONDITIONING: DayFocus = DayFocus {
    name: "Conditioning",
    muscle_groups: &[CARDIO, CORE],
    exercise_types: CONDITIONING_TYPES,
};
pub const LOWER_STRENGTH: DayFocus = DayFocus {
    name: "Lower Body Strength",
    muscle_groups: &[QUADS, HAMSTRINGS, GLUTES],
    exercise_types: STRENGTH,
};
pub const UPPER_STRENGTH: DayFocus = DayFocus {
    name: "Upper Body Strength",
    muscle_groups: &[CHEST, BACK, SHOULDERS],
    exercise_types: STRENGTH,
};

use DaySlot::{Rest, Train};

// ---------------------------------------------------------------------------
// Week layouts
// ---------------------------------------------------------------------------

const FULL_BODY_1: [DaySlot; 7] = [Rest, Rest, Train(FULL_BODY), Rest, Rest, Rest, Rest];
const FULL_BODY_2: [DaySlot; 7] = [Train(FULL_BODY), Rest, Rest, Train(FULL_BODY), Rest, Rest, Rest];
const FULL_BODY_3: [DaySlot; 7] = [
    Train(FULL_BODY), Rest, Train(FULL_BODY), Rest, Train(FULL_BODY), Rest, Rest,
];
const CONDITIONING_3: [DaySlot; 7] = [
    Train(FULL_BODY), Rest, Train(CONDITIONING), Rest, Train(FULL_BODY), Rest, Rest,
];
const STRENGTH_3: [DaySlot; 7] = [
    Train(LOWER_STRENGTH), Rest, Train(UPPER_STRENGTH), Rest, Train(FULL_BODY), Rest, Rest,
];
const UPPER_LOWER_4: [DaySlot; 7] = [
    Train(UPPER_BODY), Train(LOWER_BODY), Rest, Train(UPPER_BODY), Train(LOWER_BODY), Rest, Rest,
];
const CONDITIONING_4: [DaySlot; 7] = [
    Train(UPPER_BODY), Train(LOWER_BODY), Rest, Train(CONDITIONING), Train(FULL_BODY), Rest, Rest,
];
const STRENGTH_4: [DaySlot; 7] = [
    Train(LOWER_STRENGTH), Train(UPPER_STRENGTH), Rest, Train(LOWER_STRENGTH), Train(UPPER_STRENGTH), Rest, Rest,
];
const PUSH_PULL_LEGS_5: [DaySlot; 7] = [
    Train(UPPER_PUSH), Train(UPPER_PULL), Train(LOWER_BODY), Rest, Train(UPPER_BODY), Train(LOWER_BODY), Rest,
];
const CONDITIONING_5: [DaySlot; 7] = [
    Train(UPPER_BODY), Train(LOWER_BODY), Train(CONDITIONING), Rest, Train(FULL_BODY), Train(CONDITIONING), Rest,
];
const STRENGTH_5: [DaySlot; 7] = [
    Train(LOWER_STRENGTH), Train(UPPER_STRENGTH), Rest, Train(LOWER_STRENGTH), Train(UPPER_STRENGTH), Train(FULL_BODY), Rest,
];
const PUSH_PULL_LEGS_6: [DaySlot; 7] = [
    Train(UPPER_PUSH), Train(UPPER_PULL), Train(LOWER_BODY), Train(UPPER_PUSH), Train(UPPER_PULL), Train(LOWER_BODY), Rest,
];

macro_rules! template {
    ($name:literal, $level:ident, $goal:ident, $layout:ident) => {
        WorkoutTemplate {
            name: $name,
            level: FitnessLevel::$level,
            goal: FitnessGoal::$goal,
            days: &$layout,
        }
    };
}

pub static TEMPLATES: &[WorkoutTemplate] = &[
    template!("beginner_general_1x", Beginner, GeneralFitness, FULL_BODY_1),
    template!("beginner_general_2x", Beginner, GeneralFitness, FULL_BODY_2),
    template!("beginner_general_3x", Beginner, GeneralFitness, FULL_BODY_3),
    template!("beginner_muscle_3x", Beginner, MuscleGain, FULL_BODY_3),
    template!("beginner_fat_loss_3x", Beginner, FatLoss, CONDITIONING_3),
    template!("beginner_strength_3x", Beginner, Strength, STRENGTH_3),
    template!("beginner_endurance_3x", Beginner, Endurance, CONDITIONING_3),
    template!("intermediate_general_3x", Intermediate, GeneralFitness, FULL_BODY_3),
    template!("intermediate_general_4x", Intermediate, GeneralFitness, UPPER_LOWER_4),
    template!("intermediate_muscle_4x", Intermediate, MuscleGain, UPPER_LOWER_4),
    template!("intermediate_muscle_5x", Intermediate, MuscleGain, PUSH_PULL_LEGS_5),
    template!("intermediate_fat_loss_4x", Intermediate, FatLoss, CONDITIONING_4),
    template!("intermediate_strength_4x", Intermediate, Strength, STRENGTH_4),
    template!("intermediate_endurance_4x", Intermediate, Endurance, CONDITIONING_4),
    template!("advanced_general_4x", Advanced, GeneralFitness, UPPER_LOWER_4),
    template!("advanced_muscle_5x", Advanced, MuscleGain, PUSH_PULL_LEGS_5),
    template!("advanced_muscle_6x", Advanced, MuscleGain, PUSH_PULL_LEGS_6),
    template!("advanced_fat_loss_5x", Advanced, FatLoss, CONDITIONING_5),
    template!("advanced_strength_4x", Advanced, Strength, STRENGTH_4),
    template!("advanced_strength_5x", Advanced, Strength, STRENGTH_5),
    template!("advanced_endurance_5x", Advanced, Endurance, CONDITIONING_5),
];

/// How a template was matched to the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateMatch {
    Exact,
    /// Same level and goal, nearest frequency.
    LevelAndGoal,
    /// Same level only, nearest frequency.
    LevelOnly,
}

/// Pick a template: exact key, else nearest frequency on `(level, goal)`,
/// else nearest frequency on `level`. Frequency ties prefer the lower one.
pub fn select_template(
    level: FitnessLevel,
    goal: FitnessGoal,
    frequency: u8,
) -> Result<(&'static WorkoutTemplate, TemplateMatch), CoreError> {
    select_from(TEMPLATES, level, goal, frequency)
}

pub(crate) fn select_from(
    templates: &'static [WorkoutTemplate],
    level: FitnessLevel,
    goal: FitnessGoal,
    frequency: u8,
) -> Result<(&'static WorkoutTemplate, TemplateMatch), CoreError> {
    if let Some(t) = templates
        .iter()
        .find(|t| t.level == level && t.goal == goal && t.frequency() == frequency)
    {
        return Ok((t, TemplateMatch::Exact));
    }

    let nearest = |candidates: Vec<&'static WorkoutTemplate>| {
        candidates
            .into_iter()
            .min_by_key(|t| ((i16::from(t.frequency()) - i16::from(frequency)).abs(), t.frequency()))
    };

    if let Some(t) = nearest(templates.iter().filter(|t| t.level == level && t.goal == goal).collect()) {
        return Ok((t, TemplateMatch::LevelAndGoal));
    }
    if let Some(t) = nearest(templates.iter().filter(|t| t.level == level).collect()) {
        return Ok((t, TemplateMatch::LevelOnly));
    }
    Err(CoreError::NoSuitableTemplate(format!(
        "no template for level={level}, goal={goal}, frequency={frequency}"
    )))
}
