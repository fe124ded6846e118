//! Training volume and intensity analysis.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::DbId;

/// A muscle group below this share of weekly volume is under-trained.
pub const MIN_GROUP_SHARE: f64 = 0.10;
/// A muscle group above this share of weekly volume dominates the week.
pub const MAX_GROUP_SHARE: f64 = 0.40;
/// Largest safe week-over-week volume increase.
pub const MAX_WEEKLY_INCREASE: f64 = 0.10;

/// Relative intensity (fraction of 1RM) below which a set is light.
pub const LIGHT_ZONE_MAX: f64 = 0.70;
/// Relative intensity above which a set is heavy.
pub const HEAVY_ZONE_MIN: f64 = 0.85;

/// One logged exercise in the analysed week.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeEntry {
    pub exercise_id: DbId,
    pub muscle_groups: Vec<String>,
    pub sets: i32,
    pub reps: i32,
    pub weight: f64,
}

impl VolumeEntry {
    /// `sets * reps * weight`
    pub fn volume(&self) -> f64 {
        f64::from(self.sets) * f64::from(self.reps) * self.weight
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ImbalanceKind {
    UnderTrained,
    Dominant,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolumeImbalance {
    pub muscle_group: String,
    pub share: f64,
    pub kind: ImbalanceKind,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklyVolume {
    pub week_start: NaiveDate,
    pub total_volume: f64,
    pub by_exercise: BTreeMap<DbId, f64>,
    pub by_muscle_group: BTreeMap<String, f64>,
    pub imbalances: Vec<VolumeImbalance>,
    pub previous_week_volume: Option<f64>,
    /// Week-over-week change in percent.
    pub change_pct: Option<f64>,
    /// Set when the week-over-week increase exceeds the safe limit.
    pub warning: Option<String>,
    /// Largest total the next adjustment may apply.
    pub capped_volume: Option<f64>,
}

/// Aggregate a week's volume per exercise and per muscle group.
///
/// An exercise's volume is split evenly across its muscle groups, so group
/// totals add up to the weekly total. `targeted` groups with no volume at all
/// still count (share 0) when checking for imbalance.
pub fn analyze_weekly_volume(
    week_start: NaiveDate,
    entries: &[VolumeEntry],
    targeted: &[String],
    previous_week_volume: Option<f64>,
) -> WeeklyVolume {
    let mut by_exercise: BTreeMap<DbId, f64> = BTreeMap::new();
    let mut by_muscle_group: BTreeMap<String, f64> = BTreeMap::new();

    for entry in entries {
        let volume = entry.volume();
        if !volume.is_finite() || volume <= 0.0 {
            continue;
        }
        *by_exercise.entry(entry.exercise_id).or_default() += volume;
        if entry.muscle_groups.is_empty() {
            continue;
        }
        let share = volume / entry.muscle_groups.len() as f64;
        for group in &entry.muscle_groups {
            *by_muscle_group.entry(group.clone()).or_default() += share;
        }
    }

    let total_volume: f64 = by_exercise.values().sum();
    let imbalances = find_imbalances(&by_muscle_group, targeted, total_volume);

    let previous = previous_week_volume.filter(|v| *v > 0.0);
    let change_pct = previous.map(|prev| (total_volume - prev) / prev * 100.0);
    let warning = match (previous, change_pct) {
        (Some(prev), Some(change)) if change > MAX_WEEKLY_INCREASE * 100.0 => Some(format!(
            "Weekly volume rose {change:.1}% (from {prev:.0} to {total_volume:.0}); keep increases under {:.0}%",
            MAX_WEEKLY_INCREASE * 100.0
        )),
        _ => None,
    };

    WeeklyVolume {
        week_start,
        total_volume,
        by_exercise,
        by_muscle_group,
        imbalances,
        previous_week_volume: previous,
        change_pct,
        warning,
        capped_volume: previous.map(|prev| cap_volume_increase(prev, total_volume)),
    }
}

fn find_imbalances(
    by_group: &BTreeMap<String, f64>,
    targeted: &[String],
    total: f64,
) -> Vec<VolumeImbalance> {
    if total <= 0.0 {
        return Vec::new();
    }
    let groups: BTreeSet<&String> = by_group.keys().chain(targeted.iter()).collect();
    groups
        .into_iter()
        .filter_map(|group| {
            let share = by_group.get(group).copied().unwrap_or(0.0) / total;
            let kind = if share > MAX_GROUP_SHARE {
                ImbalanceKind::Dominant
            } else if share < MIN_GROUP_SHARE && (targeted.is_empty() || targeted.contains(group)) {
                ImbalanceKind::UnderTrained
            } else {
                return None;
            };
            Some(VolumeImbalance {
                muscle_group: group.clone(),
                share,
                kind,
            })
        })
        .collect()
}

/// Cap a proposed weekly volume at +10% of the previous week.
pub fn cap_volume_increase(previous: f64, proposed: f64) -> f64 {
    if previous <= 0.0 {
        return proposed;
    }
    proposed.min(previous * (1.0 + MAX_WEEKLY_INCREASE))
}

// ---------------------------------------------------------------------------
// Intensity
// ---------------------------------------------------------------------------

/// One logged set for intensity analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntensityEntry {
    pub exercise_id: DbId,
    pub weight: f64,
    pub reps: i32,
    pub rpe: Option<f64>,
    /// Best stored 1RM for the exercise, when one exists.
    pub one_rep_max: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IntensityZones {
    pub light: u32,
    pub moderate: u32,
    pub heavy: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntensityAnalysis {
    pub sets_analyzed: usize,
    pub average_rpe: Option<f64>,
    /// Mean load as a percentage of 1RM over sets with a known 1RM.
    pub average_relative_intensity: Option<f64>,
    pub zones: IntensityZones,
}

pub fn analyze_intensity(entries: &[IntensityEntry]) -> IntensityAnalysis {
    let rpes: Vec<f64> = entries.iter().filter_map(|e| e.rpe).collect();
    let relative: Vec<f64> = entries
        .iter()
        .filter_map(|e| match e.one_rep_max {
            Some(max) if max > 0.0 && e.weight >= 0.0 => Some(e.weight / max),
            _ => None,
        })
        .collect();

    let mut zones = IntensityZones::default();
    for r in &relative {
        if *r < LIGHT_ZONE_MAX {
            zones.light += 1;
        } else if *r > HEAVY_ZONE_MIN {
            zones.heavy += 1;
        } else {
            zones.moderate += 1;
        }
    }

    IntensityAnalysis {
        sets_analyzed: entries.len(),
        average_rpe: mean(&rpes),
        average_relative_intensity: mean(&relative).map(|m| m * 100.0),
        zones,
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_of_nothing_is_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[6.0, 8.0]), Some(7.0));
    }

    fn entry(id: DbId, groups: &[&str], sets: i32, reps: i32, weight: f64) -> VolumeEntry {
        VolumeEntry {
            exercise_id: id,
            muscle_groups: groups.iter().map(|g| g.to_string()).collect(),
            sets,
            reps,
            weight,
        }
    }

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 12).unwrap()
    }

    #[test]
    fn volume_is_sets_reps_weight() {
        let week = analyze_weekly_volume(monday(), &[entry(1, &["chest"], 3, 10, 50.0)], &[], None);
        assert_eq!(week.total_volume, 1500.0);
        assert_eq!(week.by_exercise[&1], 1500.0);
        assert_eq!(week.by_muscle_group["chest"], 1500.0);
    }

    #[test]
    fn group_volume_split_across_groups() {
        let week = analyze_weekly_volume(
            monday(),
            &[entry(1, &["chest", "triceps"], 4, 5, 100.0)],
            &[],
            None,
        );
        assert_eq!(week.by_muscle_group["chest"], 1000.0);
        assert_eq!(week.by_muscle_group["triceps"], 1000.0);
    }

    #[test]
    fn dominant_and_missing_groups_flagged() {
        let targeted = vec!["quads".to_string(), "back".to_string(), "chest".to_string()];
        let week = analyze_weekly_volume(
            monday(),
            &[entry(1, &["quads"], 5, 5, 100.0), entry(2, &["chest"], 3, 10, 30.0)],
            &targeted,
            None,
        );
        let quads = week.imbalances.iter().find(|i| i.muscle_group == "quads").unwrap();
        assert_eq!(quads.kind, ImbalanceKind::Dominant);
        let back = week.imbalances.iter().find(|i| i.muscle_group == "back").unwrap();
        assert_eq!(back.kind, ImbalanceKind::UnderTrained);
        assert_eq!(back.share, 0.0);
    }

    #[test]
    fn large_weekly_increase_warns_and_caps() {
        let week = analyze_weekly_volume(monday(), &[entry(1, &["back"], 3, 10, 50.0)], &[], Some(1000.0));
        assert!(week.warning.is_some());
        assert_eq!(week.capped_volume, Some(1100.0));
        assert!((week.change_pct.unwrap() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn small_increase_does_not_warn() {
        let week = analyze_weekly_volume(monday(), &[entry(1, &["back"], 3, 10, 35.0)], &[], Some(1000.0));
        assert!(week.warning.is_none());
    }

    #[test]
    fn intensity_zones() {
        let set = |weight: f64, rpe: Option<f64>| IntensityEntry {
            exercise_id: 1,
            weight,
            reps: 5,
            rpe,
            one_rep_max: Some(100.0),
        };
        let analysis = analyze_intensity(&[set(60.0, Some(6.0)), set(80.0, Some(8.0)), set(90.0, None)]);
        assert_eq!(analysis.zones, IntensityZones { light: 1, moderate: 1, heavy: 1 });
        assert_eq!(analysis.average_rpe, Some(7.0));
        assert!((analysis.average_relative_intensity.unwrap() - 76.666_666).abs() < 1e-3);
    }

    #[test]
    fn intensity_without_data() {
        let analysis = analyze_intensity(&[]);
        assert_eq!(analysis.sets_analyzed, 0);
        assert!(analysis.average_rpe.is_none());
    }
}
