//! Performance-driven plan adaptation rules.
//!
//! Reductions trim 10% of baseline weekly sets per step down to 70%;
//! increases alternate between one extra set per exercise (max two) and a
//! 2.5% load-target bump. Each direction fires at most once per week.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::plan::effectiveness::PerformanceSample;
use crate::plan::metadata::{AlgorithmParameters, IncreaseKind, PlanMetadata};
use crate::plan::prescription::round_load;
use crate::types::DbId;
use crate::volume::mean;

pub const LOW_COMPLETION_RATE: f64 = 0.7;
pub const HIGH_EFFORT_RPE: f64 = 9.0;
pub const HIGH_COMPLETION_RATE: f64 = 0.95;
pub const EASY_RPE: f64 = 7.0;
/// Sessions inspected for the effort and increase rules.
pub const WINDOW: usize = 3;

pub const VOLUME_STEP: f64 = 0.10;
pub const VOLUME_FLOOR: f64 = 0.70;
pub const MAX_EXTRA_SETS: i16 = 2;
pub const LOAD_STEP: f64 = 0.025;

/// Skips within [`SKIP_WINDOW_DAYS`] that trigger a reduction.
pub const SKIP_THRESHOLD: usize = 3;
pub const SKIP_WINDOW_DAYS: i64 = 14;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReductionReason {
    LowCompletion { completion_rate: f64 },
    HighEffort { average_rpe: f64 },
    SkipPattern { skips: usize },
}

impl std::fmt::Display for ReductionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReductionReason::LowCompletion { completion_rate } => {
                write!(f, "session completion {:.0}% below 70%", completion_rate * 100.0)
            }
            ReductionReason::HighEffort { average_rpe } => {
                write!(f, "average RPE {average_rpe:.1} over the last {WINDOW} sessions above 9")
            }
            ReductionReason::SkipPattern { skips } => {
                write!(f, "{skips} workouts skipped in the last {SKIP_WINDOW_DAYS} days")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AdaptationDecision {
    Reduce(ReductionReason),
    Increase,
}

/// Decide whether recent performance calls for an adaptation.
///
/// `recent` holds the plan's performance records, newest first.
pub fn decide(metadata: &PlanMetadata, recent: &[PerformanceSample], week: NaiveDate) -> Option<AdaptationDecision> {
    let window = &recent[..recent.len().min(WINDOW)];
    let latest = window.first()?;

    let reason = if latest.completion_rate < LOW_COMPLETION_RATE {
        Some(ReductionReason::LowCompletion {
            completion_rate: latest.completion_rate,
        })
    } else {
        let rpes: Vec<f64> = window.iter().filter_map(|s| s.average_rpe).collect();
        mean(&rpes)
            .filter(|rpe| *rpe > HIGH_EFFORT_RPE)
            .map(|average_rpe| ReductionReason::HighEffort { average_rpe })
    };
    if let Some(reason) = reason {
        return can_reduce(metadata, week).then_some(AdaptationDecision::Reduce(reason));
    }

    let all_easy = window.len() == WINDOW
        && window.iter().all(|s| {
            s.completion_rate >= HIGH_COMPLETION_RATE && s.average_rpe.is_some_and(|rpe| rpe <= EASY_RPE)
        });
    (all_easy && can_increase(metadata, week)).then_some(AdaptationDecision::Increase)
}

/// Decide on a skip-pattern reduction from skips in the trailing window.
pub fn decide_on_skips(metadata: &PlanMetadata, skips_in_window: usize, week: NaiveDate) -> Option<AdaptationDecision> {
    (skips_in_window >= SKIP_THRESHOLD && can_reduce(metadata, week))
        .then_some(AdaptationDecision::Reduce(ReductionReason::SkipPattern { skips: skips_in_window }))
}

fn can_reduce(metadata: &PlanMetadata, week: NaiveDate) -> bool {
    let AlgorithmParameters::AdaptiveV1(params) = &metadata.parameters;
    let state = &params.adaptation;
    state.last_reduction_week != Some(week) && state.volume_factor > VOLUME_FLOOR + 1e-9
}

fn can_increase(metadata: &PlanMetadata, week: NaiveDate) -> bool {
    let AlgorithmParameters::AdaptiveV1(params) = &metadata.parameters;
    params.adaptation.last_increase_week != Some(week)
}

/// A single changed prescription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrescriptionChange {
    pub day_of_week: i16,
    pub exercise_id: DbId,
    pub order_index: i16,
    pub sets_before: i16,
    pub sets_after: i16,
    pub load_before: Option<f64>,
    pub load_after: Option<f64>,
}

/// The audited outcome of applying a decision.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedAdaptation {
    pub reason: String,
    pub diff_summary: String,
    pub changes: Vec<PrescriptionChange>,
}

/// Apply a decision to the plan metadata in place.
pub fn apply(metadata: &mut PlanMetadata, decision: AdaptationDecision, week: NaiveDate) -> AppliedAdaptation {
    let before = snapshot(metadata);

    let AlgorithmParameters::AdaptiveV1(params) = &mut metadata.parameters;
    let state = &mut params.adaptation;
    let (reason, headline) = match decision {
        AdaptationDecision::Reduce(reason) => {
            let old = state.volume_factor;
            state.volume_factor = ((old - VOLUME_STEP) * 100.0).round().max(VOLUME_FLOOR * 100.0) / 100.0;
            state.last_reduction_week = Some(week);
            (
                format!("volume reduction: {reason}"),
                format!("volume {:.0}% -> {:.0}% of baseline", old * 100.0, state.volume_factor * 100.0),
            )
        }
        AdaptationDecision::Increase => {
            let kind = if state.next_increase == IncreaseKind::Sets && state.extra_sets >= MAX_EXTRA_SETS {
                IncreaseKind::Load
            } else {
                state.next_increase
            };
            state.last_increase_week = Some(week);
            state.next_increase = match kind {
                IncreaseKind::Sets => IncreaseKind::Load,
                IncreaseKind::Load => IncreaseKind::Sets,
            };
            let reason = format!(
                "progression: last {WINDOW} sessions completed at >= {:.0}% with RPE <= {EASY_RPE}",
                HIGH_COMPLETION_RATE * 100.0
            );
            match kind {
                IncreaseKind::Sets => {
                    state.extra_sets += 1;
                    (reason, format!("+1 set per exercise ({} extra)", state.extra_sets))
                }
                IncreaseKind::Load => {
                    let old = state.load_factor;
                    state.load_factor = old * (1.0 + LOAD_STEP);
                    (
                        reason,
                        format!("load targets x{:.3} -> x{:.3}", old, state.load_factor),
                    )
                }
            }
        }
    };

    let (volume_factor, extra_sets, load_factor) = (state.volume_factor, state.extra_sets, state.load_factor);
    distribute_sets(metadata, volume_factor, extra_sets);
    for exercise in metadata.structure.iter_mut().flat_map(|d| d.exercises.iter_mut()) {
        exercise.load_target_kg = exercise.base_load_kg.map(|base| round_load(base * load_factor));
    }
    metadata.recompute_volume();

    let changes = diff(&before, metadata);
    AppliedAdaptation {
        reason,
        diff_summary: format!("{headline}; {} prescriptions changed", changes.len()),
        changes,
    }
}

/// Set every prescription to `base + extra`, then trim whole sets until the
/// weekly total is `round(total * factor)`, taking from the last exercise of
/// each day first and never going below one set.
fn distribute_sets(metadata: &mut PlanMetadata, factor: f64, extra: i16) {
    let mut positions: Vec<(usize, usize, i16)> = Vec::new();
    let mut total: i64 = 0;
    for (d, day) in metadata.structure.iter_mut().enumerate().filter(|(_, d)| !d.rest) {
        for (e, exercise) in day.exercises.iter_mut().enumerate() {
            exercise.sets = exercise.base_sets + extra;
            total += i64::from(exercise.sets);
            positions.push((d, e, exercise.order_index));
        }
    }
    positions.sort_by_key(|&(d, _, order)| (std::cmp::Reverse(order), d));

    let target = (total as f64 * factor).round() as i64;
    let mut excess = total - target;
    while excess > 0 {
        let mut progressed = false;
        for &(d, e, _) in &positions {
            if excess == 0 {
                break;
            }
            let exercise = &mut metadata.structure[d].exercises[e];
            if exercise.sets > 1 {
                exercise.sets -= 1;
                excess -= 1;
                progressed = true;
            }
        }
        if !progressed {
            break;
        }
    }
}

type Snapshot = Vec<(i16, DbId, i16, i16, Option<f64>)>;

fn snapshot(metadata: &PlanMetadata) -> Snapshot {
    metadata
        .workout_days()
        .flat_map(|d| {
            d.exercises
                .iter()
                .map(move |e| (d.day_of_week, e.exercise_id, e.order_index, e.sets, e.load_target_kg))
        })
        .collect()
}

fn diff(before: &Snapshot, metadata: &PlanMetadata) -> Vec<PrescriptionChange> {
    before
        .iter()
        .zip(snapshot(metadata))
        .filter(|(b, a)| b.3 != a.3 || b.4 != a.4)
        .map(|(b, a)| PrescriptionChange {
            day_of_week: b.0,
            exercise_id: b.1,
            order_index: b.2,
            sets_before: b.3,
            sets_after: a.3,
            load_before: b.4,
            load_after: a.4,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::seed_candidates;
    use crate::fitness::{Equipment, FitnessGoal, FitnessLevel};
    use crate::plan::generator::generate_plan;
    use crate::plan::metadata::{ExerciseMax, PlanRequest};

    fn week(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, d).unwrap()
    }

    fn plan() -> PlanMetadata {
        generate_plan(
            &PlanRequest {
                goals: vec![FitnessGoal::Strength],
                equipment: vec![Equipment::Barbell],
                level: FitnessLevel::Intermediate,
                weekly_frequency: 4,
                time_per_workout: 30,
                limitations: vec![],
                recovery: None,
                one_rep_maxes: vec![ExerciseMax { exercise_id: 23, one_rep_max: 100.0 }],
            },
            &seed_candidates(),
        )
        .unwrap()
    }

    fn sample(rate: f64, rpe: f64) -> PerformanceSample {
        PerformanceSample {
            completion_rate: rate,
            average_rpe: Some(rpe),
            skipped_count: 0,
        }
    }

    fn state(metadata: &PlanMetadata) -> &crate::plan::metadata::AdaptationState {
        let AlgorithmParameters::AdaptiveV1(params) = &metadata.parameters;
        &params.adaptation
    }

    #[test]
    fn low_completion_triggers_reduction() {
        let decision = decide(&plan(), &[sample(0.5, 7.0)], week(12));
        assert!(matches!(
            decision,
            Some(AdaptationDecision::Reduce(ReductionReason::LowCompletion { .. }))
        ));
    }

    #[test]
    fn high_effort_over_window_triggers_reduction() {
        let recent = [sample(0.9, 9.5), sample(0.9, 9.5), sample(0.9, 9.2), sample(1.0, 5.0)];
        assert!(matches!(
            decide(&plan(), &recent, week(12)),
            Some(AdaptationDecision::Reduce(ReductionReason::HighEffort { .. }))
        ));
    }

    #[test]
    fn three_easy_sessions_trigger_increase() {
        let recent = [sample(1.0, 6.0), sample(0.96, 7.0), sample(1.0, 6.5)];
        assert_eq!(decide(&plan(), &recent, week(12)), Some(AdaptationDecision::Increase));
        assert_eq!(decide(&plan(), &recent[..2], week(12)), None);
    }

    #[test]
    fn reduction_trims_ten_percent_of_sets() {
        let mut metadata = plan();
        let before = metadata.estimated_weekly_volume;
        let applied = apply(
            &mut metadata,
            AdaptationDecision::Reduce(ReductionReason::LowCompletion { completion_rate: 0.5 }),
            week(12),
        );
        let expected = (f64::from(before) * 0.9).round() as u32;
        assert_eq!(metadata.estimated_weekly_volume, expected);
        assert!(!applied.changes.is_empty());
        assert!(applied.diff_summary.contains("100% -> 90%"));
        assert_eq!(state(&metadata).last_reduction_week, Some(week(12)));
    }

    #[test]
    fn one_reduction_per_week_and_floor_at_seventy_percent() {
        let mut metadata = plan();
        let baseline = metadata.estimated_weekly_volume;
        let reason = ReductionReason::SkipPattern { skips: 3 };
        apply(&mut metadata, AdaptationDecision::Reduce(reason), week(5));
        assert_eq!(decide_on_skips(&metadata, 3, week(5)), None);

        apply(&mut metadata, AdaptationDecision::Reduce(reason), week(12));
        apply(&mut metadata, AdaptationDecision::Reduce(reason), week(19));
        assert!((state(&metadata).volume_factor - 0.7).abs() < 1e-9);
        assert_eq!(metadata.estimated_weekly_volume, (f64::from(baseline) * 0.7).round() as u32);
        assert_eq!(decide_on_skips(&metadata, 5, week(26)), None);
    }

    #[test]
    fn increases_alternate_sets_and_load() {
        let mut metadata = plan();
        let base_sets: Vec<i16> = metadata.workout_days().flat_map(|d| d.exercises.iter().map(|e| e.sets)).collect();

        apply(&mut metadata, AdaptationDecision::Increase, week(5));
        let after: Vec<i16> = metadata.workout_days().flat_map(|d| d.exercises.iter().map(|e| e.sets)).collect();
        assert!(base_sets.iter().zip(&after).all(|(b, a)| *a == b + 1));
        assert_eq!(state(&metadata).next_increase, IncreaseKind::Load);

        apply(&mut metadata, AdaptationDecision::Increase, week(12));
        let squat = metadata
            .workout_days()
            .flat_map(|d| d.exercises.iter())
            .find(|e| e.exercise_id == 23)
            .unwrap();
        // 100 * 0.85 = 85 baseline, +2.5% => 87.125 => 87.0
        assert_eq!(squat.load_target_kg, Some(87.0));
        assert_eq!(state(&metadata).next_increase, IncreaseKind::Sets);
    }

    #[test]
    fn set_increases_cap_at_two() {
        let mut metadata = plan();
        for w in [5, 12, 19, 26] {
            apply(&mut metadata, AdaptationDecision::Increase, week(w));
        }
        // sets, load, sets, load; the fifth would be sets but the cap turns it into load.
        assert_eq!(state(&metadata).extra_sets, 2);
        apply(&mut metadata, AdaptationDecision::Increase, NaiveDate::from_ymd_opt(2026, 11, 2).unwrap());
        assert_eq!(state(&metadata).extra_sets, 2);
    }
}
