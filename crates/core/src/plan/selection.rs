//! Exercise filtering and ordering for a workout day.

use std::collections::HashSet;

use serde::Serialize;

use crate::fitness::{Equipment, ExerciseType, FitnessLevel, Joint, MovementClass};
use crate::plan::template::DayFocus;
use crate::types::DbId;

pub const MIN_EXERCISES_PER_WORKOUT: u16 = 3;
pub const MAX_EXERCISES_PER_WORKOUT: u16 = 8;

/// The view of an exercise the generator needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseCandidate {
    pub id: DbId,
    pub name: String,
    pub muscle_groups: Vec<String>,
    pub difficulty: FitnessLevel,
    pub equipment: Equipment,
    pub exercise_type: ExerciseType,
    pub movement: MovementClass,
    pub stressed_joints: Vec<Joint>,
    pub default_reps: String,
}

/// `time_per_workout / 10`, clamped to `[3, 8]`.
pub fn exercises_per_workout(time_per_workout: u16) -> usize {
    usize::from((time_per_workout / 10).clamp(MIN_EXERCISES_PER_WORKOUT, MAX_EXERCISES_PER_WORKOUT))
}

fn targets_group(focus: &DayFocus, group: &str) -> bool {
    focus.muscle_groups.iter().any(|m| *m == group)
}

/// User-side constraints applied to every day.
#[derive(Debug, Clone, Copy)]
pub struct SelectionFilter<'a> {
    pub level: FitnessLevel,
    pub equipment: &'a [Equipment],
    pub limitations: &'a [Joint],
}

impl SelectionFilter<'_> {
    fn admits(&self, focus: &DayFocus, exercise: &ExerciseCandidate) -> bool {
        exercise.difficulty <= self.level
            && self.equipment.contains(&exercise.equipment)
            && focus.exercise_types.contains(&exercise.exercise_type)
            && exercise
                .muscle_groups
                .iter()
                .any(|g| targets_group(focus, g))
            && !exercise.stressed_joints.iter().any(|j| self.limitations.contains(j))
    }
}

/// Eligible pool for a day, ordered compound, accessory, isolation, each
/// class rotated by `occurrence` so repeated focuses vary their lead lift.
pub fn ordered_pool<'c>(
    catalog: &'c [ExerciseCandidate],
    focus: &DayFocus,
    filter: &SelectionFilter<'_>,
    occurrence: usize,
) -> Vec<&'c ExerciseCandidate> {
    let mut ordered = Vec::new();
    for class in MovementClass::ALL {
        let mut group: Vec<&ExerciseCandidate> = catalog
            .iter()
            .filter(|e| e.movement == *class && filter.admits(focus, e))
            .collect();
        group.sort_by_key(|e| e.id);
        if !group.is_empty() {
            let shift = occurrence % group.len();
            group.rotate_left(shift);
        }
        ordered.extend(group);
    }
    ordered
}

/// Pick up to `k` exercises from an ordered pool.
///
/// The first pass takes exercises that cover a not-yet-covered target group;
/// the second fills remaining slots in pool order. The result keeps pool
/// order (compounds first).
pub fn pick<'c>(pool: &[&'c ExerciseCandidate], focus: &DayFocus, k: usize) -> Vec<&'c ExerciseCandidate> {
    let mut chosen = vec![false; pool.len()];
    let mut covered: HashSet<&str> = HashSet::new();
    let mut count = 0;

    for (i, exercise) in pool.iter().enumerate() {
        if count == k {
            break;
        }
        let new_groups: Vec<&str> = exercise
            .muscle_groups
            .iter()
            .map(String::as_str)
            .filter(|g| targets_group(focus, g) && !covered.contains(g))
            .collect();
        if !new_groups.is_empty() {
            covered.extend(new_groups);
            chosen[i] = true;
            count += 1;
        }
    }
    for flag in chosen.iter_mut() {
        if count == k {
            break;
        }
        if !*flag {
            *flag = true;
            count += 1;
        }
    }

    pool.iter()
        .zip(chosen)
        .filter_map(|(e, keep)| keep.then_some(*e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::template::{CONDITIONING, FULL_BODY};

    fn candidate(
        id: DbId,
        groups: &[&str],
        equipment: Equipment,
        movement: MovementClass,
        joints: &[Joint],
    ) -> ExerciseCandidate {
        ExerciseCandidate {
            id,
            name: format!("exercise {id}"),
            muscle_groups: groups.iter().map(|g| g.to_string()).collect(),
            difficulty: FitnessLevel::Beginner,
            equipment,
            exercise_type: ExerciseType::Strength,
            movement,
            stressed_joints: joints.to_vec(),
            default_reps: "10-12".into(),
        }
    }

    fn filter<'a>(equipment: &'a [Equipment], limitations: &'a [Joint]) -> SelectionFilter<'a> {
        SelectionFilter {
            level: FitnessLevel::Beginner,
            equipment,
            limitations,
        }
    }

    #[test]
    fn k_is_clamped() {
        assert_eq!(exercises_per_workout(10), 3);
        assert_eq!(exercises_per_workout(30), 3);
        assert_eq!(exercises_per_workout(60), 6);
        assert_eq!(exercises_per_workout(180), 8);
    }

    #[test]
    fn equipment_and_limitations_filter_pool() {
        let catalog = vec![
            candidate(1, &["chest"], Equipment::Bodyweight, MovementClass::Compound, &[Joint::Wrist]),
            candidate(2, &["quads"], Equipment::Barbell, MovementClass::Compound, &[]),
            candidate(3, &["back"], Equipment::Bodyweight, MovementClass::Compound, &[]),
        ];
        let pool = ordered_pool(&catalog, &FULL_BODY, &filter(&[Equipment::Bodyweight], &[Joint::Wrist]), 0);
        let ids: Vec<DbId> = pool.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3]);
    }

    #[test]
    fn difficulty_above_level_excluded() {
        let mut hard = candidate(1, &["chest"], Equipment::Bodyweight, MovementClass::Compound, &[]);
        hard.difficulty = FitnessLevel::Advanced;
        let catalog = [hard];
        let pool = ordered_pool(&catalog, &FULL_BODY, &filter(&[Equipment::Bodyweight], &[]), 0);
        assert!(pool.is_empty());
    }

    #[test]
    fn exercise_type_must_match_focus() {
        let mut run = candidate(1, &["cardio"], Equipment::Bodyweight, MovementClass::Compound, &[]);
        run.exercise_type = ExerciseType::Cardio;
        let catalog = [run];
        assert!(ordered_pool(&catalog, &FULL_BODY, &filter(&[Equipment::Bodyweight], &[]), 0).is_empty());
        assert_eq!(ordered_pool(&catalog, &CONDITIONING, &filter(&[Equipment::Bodyweight], &[]), 0).len(), 1);
    }

    #[test]
    fn classes_ordered_and_rotated() {
        let catalog = vec![
            candidate(5, &["core"], Equipment::Bodyweight, MovementClass::Isolation, &[]),
            candidate(4, &["glutes"], Equipment::Bodyweight, MovementClass::Accessory, &[]),
            candidate(1, &["chest"], Equipment::Bodyweight, MovementClass::Compound, &[]),
            candidate(2, &["back"], Equipment::Bodyweight, MovementClass::Compound, &[]),
        ];
        let f = filter(&[Equipment::Bodyweight], &[]);
        let ids = |occ| -> Vec<DbId> { ordered_pool(&catalog, &FULL_BODY, &f, occ).iter().map(|e| e.id).collect() };
        assert_eq!(ids(0), vec![1, 2, 4, 5]);
        assert_eq!(ids(1), vec![2, 1, 4, 5]);
    }

    #[test]
    fn pick_prefers_coverage_then_fills() {
        let catalog = vec![
            candidate(1, &["chest"], Equipment::Bodyweight, MovementClass::Compound, &[]),
            candidate(2, &["chest"], Equipment::Bodyweight, MovementClass::Compound, &[]),
            candidate(3, &["back"], Equipment::Bodyweight, MovementClass::Compound, &[]),
            candidate(4, &["core"], Equipment::Bodyweight, MovementClass::Isolation, &[]),
        ];
        let pool: Vec<&ExerciseCandidate> = catalog.iter().collect();
        let picked: Vec<DbId> = pick(&pool, &FULL_BODY, 3).iter().map(|e| e.id).collect();
        assert_eq!(picked, vec![1, 3, 4]);

        let picked: Vec<DbId> = pick(&pool, &FULL_BODY, 4).iter().map(|e| e.id).collect();
        assert_eq!(picked, vec![1, 2, 3, 4]);
    }

    #[test]
    fn small_pool_returns_everything() {
        let catalog = vec![candidate(1, &["chest"], Equipment::Bodyweight, MovementClass::Compound, &[])];
        let pool: Vec<&ExerciseCandidate> = catalog.iter().collect();
        assert_eq!(pick(&pool, &FULL_BODY, 5).len(), 1);
    }
}
