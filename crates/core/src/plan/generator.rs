//! The `fitup_adaptive_v1` plan generator.

use std::collections::HashMap;

use serde_json::json;

use crate::error::CoreError;
use crate::fitness::Equipment;
use crate::plan::metadata::{
    AdaptationState, AdaptiveV1Parameters, AlgorithmParameters, PlanMetadata, PlanRequest, PlannedDay,
    PlannedExercise, ProgressionMethod,
};
use crate::plan::prescription;
use crate::plan::selection::{exercises_per_workout, ordered_pool, pick, ExerciseCandidate, SelectionFilter};
use crate::plan::template::{select_template, DaySlot, TemplateMatch};

/// Focus label used for rest days.
pub const REST_FOCUS: &str = "Rest";

/// Generate the week structure and metadata for a plan request.
///
/// Deterministic: the same request and catalog always yield the same plan.
pub fn generate_plan(request: &PlanRequest, catalog: &[ExerciseCandidate]) -> Result<PlanMetadata, CoreError> {
    request.validate()?;

    let goal = request.primary_goal();
    let (template, matched) = select_template(request.level, goal, request.weekly_frequency)?;
    let k = exercises_per_workout(request.time_per_workout);
    let base = prescription::for_goal(goal);
    let filter = SelectionFilter {
        level: request.level,
        equipment: &request.equipment,
        limitations: &request.limitations,
    };

    let mut occurrences: HashMap<&'static str, usize> = HashMap::new();
    let mut structure = Vec::with_capacity(7);
    let mut muscle_groups: Vec<String> = Vec::new();
    let mut equipment_used: Vec<Equipment> = Vec::new();

    for (index, slot) in template.days.iter().enumerate() {
        let day_of_week = index as i16 + 1;
        let focus = match slot {
            DaySlot::Rest => {
                structure.push(PlannedDay {
                    day_of_week,
                    focus: REST_FOCUS.to_string(),
                    rest: true,
                    muscle_groups: Vec::new(),
                    exercises: Vec::new(),
                });
                continue;
            }
            DaySlot::Train(focus) => focus,
        };

        let occurrence = occurrences.entry(focus.name).or_insert(0);
        let pool = ordered_pool(catalog, focus, &filter, *occurrence);
        *occurrence += 1;
        if pool.is_empty() {
            return Err(CoreError::NoSuitableTemplate(format!(
                "no eligible exercises for '{}' on day {day_of_week} with the available equipment",
                focus.name
            )));
        }

        let exercises: Vec<PlannedExercise> = pick(&pool, focus, k)
            .into_iter()
            .enumerate()
            .map(|(order, exercise)| {
                let timed = prescription::is_timed(exercise.exercise_type, &exercise.default_reps);
                let sets = prescription::sets_for_recovery(base.sets, request.recovery);
                let load = (!timed)
                    .then(|| request.one_rep_max_for(exercise.id))
                    .flatten()
                    .map(|max| prescription::round_load(max * prescription::load_fraction(goal)));
                PlannedExercise {
                    exercise_id: exercise.id,
                    name: exercise.name.clone(),
                    movement: exercise.movement,
                    sets,
                    base_sets: sets,
                    reps: if timed {
                        prescription::timed_reps(goal).to_string()
                    } else {
                        base.reps.to_string()
                    },
                    rest_seconds: base.rest_seconds,
                    order_index: order as i16,
                    load_target_kg: load,
                    base_load_kg: load,
                }
            })
            .collect();

        for group in focus.muscle_groups {
            if !muscle_groups.iter().any(|g| g == group) {
                muscle_groups.push(group.to_string());
            }
        }
        for exercise in pool.iter().filter(|e| exercises.iter().any(|p| p.exercise_id == e.id)) {
            if !equipment_used.contains(&exercise.equipment) {
                equipment_used.push(exercise.equipment);
            }
        }

        structure.push(PlannedDay {
            day_of_week,
            focus: focus.name.to_string(),
            rest: false,
            muscle_groups: focus.muscle_groups.iter().map(|g| g.to_string()).collect(),
            exercises,
        });
    }
    equipment_used.sort();

    let mut extensions = serde_json::Map::new();
    extensions.insert(
        "template_match".into(),
        json!(match matched {
            TemplateMatch::Exact => "exact",
            TemplateMatch::LevelAndGoal => "level_and_goal",
            TemplateMatch::LevelOnly => "level_only",
        }),
    );

    let mut metadata = PlanMetadata {
        template: template.name.to_string(),
        muscle_groups,
        equipment: equipment_used,
        estimated_weekly_volume: 0,
        progression_method: ProgressionMethod::for_goal(goal),
        structure,
        parameters: AlgorithmParameters::AdaptiveV1(AdaptiveV1Parameters {
            request: request.clone(),
            template_frequency: template.frequency(),
            exercises_per_workout: k as u8,
            adaptation: AdaptationState::default(),
        }),
        extensions,
    };
    metadata.recompute_volume();
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{seed_candidates, EXERCISES};
    use crate::fitness::{FitnessGoal, FitnessLevel, Joint};
    use crate::plan::metadata::ExerciseMax;

    fn beginner_bodyweight() -> PlanRequest {
        PlanRequest {
            goals: vec![FitnessGoal::GeneralFitness],
            equipment: vec![Equipment::Bodyweight],
            level: FitnessLevel::Beginner,
            weekly_frequency: 3,
            time_per_workout: 30,
            limitations: vec![],
            recovery: None,
            one_rep_maxes: vec![],
        }
    }

    #[test]
    fn beginner_bodyweight_plan() {
        let plan = generate_plan(&beginner_bodyweight(), &seed_candidates()).unwrap();

        assert_eq!(plan.structure.len(), 7);
        assert_eq!(plan.workout_days().count(), 3);
        assert_eq!(plan.structure.iter().filter(|d| d.rest).count(), 4);
        for day in plan.workout_days() {
            assert_eq!(day.exercises.len(), 3);
            for e in &day.exercises {
                assert_eq!(e.sets, 3);
                assert_eq!(e.reps, "10-12");
                assert_eq!(e.rest_seconds, 60);
                let catalog = &EXERCISES[(e.exercise_id - 1) as usize];
                assert_eq!(catalog.equipment, Equipment::Bodyweight);
            }
        }
        assert_eq!(plan.equipment, vec![Equipment::Bodyweight]);
        assert_eq!(plan.estimated_weekly_volume, 27);
        assert_eq!(plan.parameters.algorithm(), "fitup_adaptive_v1");
    }

    #[test]
    fn days_follow_template_order() {
        let plan = generate_plan(&beginner_bodyweight(), &seed_candidates()).unwrap();
        let days: Vec<i16> = plan.structure.iter().map(|d| d.day_of_week).collect();
        assert_eq!(days, vec![1, 2, 3, 4, 5, 6, 7]);
        assert!(!plan.structure[0].rest);
        assert!(plan.structure[1].rest);
    }

    #[test]
    fn generation_is_deterministic() {
        let a = generate_plan(&beginner_bodyweight(), &seed_candidates()).unwrap();
        let b = generate_plan(&beginner_bodyweight(), &seed_candidates()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn compounds_come_first() {
        let request = PlanRequest {
            equipment: vec![Equipment::Dumbbell, Equipment::Bodyweight],
            time_per_workout: 60,
            ..beginner_bodyweight()
        };
        let plan = generate_plan(&request, &seed_candidates()).unwrap();
        for day in plan.workout_days() {
            let classes: Vec<_> = day.exercises.iter().map(|e| e.movement).collect();
            let mut sorted = classes.clone();
            sorted.sort();
            assert_eq!(classes, sorted);
        }
    }

    #[test]
    fn limitations_exclude_exercises() {
        let request = PlanRequest {
            limitations: vec![Joint::Knee],
            ..beginner_bodyweight()
        };
        let plan = generate_plan(&request, &seed_candidates()).unwrap();
        for e in plan.workout_days().flat_map(|d| d.exercises.iter()) {
            let catalog = &EXERCISES[(e.exercise_id - 1) as usize];
            assert!(!catalog.stressed_joints.contains(&Joint::Knee), "{}", catalog.name);
        }
    }

    #[test]
    fn strength_goal_uses_strength_prescription_and_loads() {
        let request = PlanRequest {
            goals: vec![FitnessGoal::Strength],
            equipment: vec![Equipment::Barbell],
            level: FitnessLevel::Intermediate,
            weekly_frequency: 4,
            time_per_workout: 60,
            one_rep_maxes: vec![ExerciseMax { exercise_id: 23, one_rep_max: 140.0 }],
            ..beginner_bodyweight()
        };
        let plan = generate_plan(&request, &seed_candidates()).unwrap();
        let squat = plan
            .workout_days()
            .flat_map(|d| d.exercises.iter())
            .find(|e| e.exercise_id == 23)
            .unwrap();
        assert_eq!(squat.sets, 5);
        assert_eq!(squat.reps, "3-5");
        assert_eq!(squat.load_target_kg, Some(119.0));
    }

    #[test]
    fn empty_pool_is_fatal() {
        let request = PlanRequest {
            equipment: vec![Equipment::Band],
            goals: vec![FitnessGoal::Endurance],
            ..beginner_bodyweight()
        };
        // Conditioning needs cardio or core work; no band exercise trains either.
        let err = generate_plan(&request, &seed_candidates()).unwrap_err();
        assert!(matches!(err, CoreError::NoSuitableTemplate(_)));
    }

    #[test]
    fn invalid_metadata_rejected_before_generation() {
        let request = PlanRequest { equipment: vec![], ..beginner_bodyweight() };
        assert!(matches!(
            generate_plan(&request, &seed_candidates()),
            Err(CoreError::Validation(_))
        ));
    }
}
