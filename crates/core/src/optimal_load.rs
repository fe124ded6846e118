//! Optimal training-load recommendation.
//!
//! A level preset gives the baseline; the trend of recent strength
//! progression adjusts it, and the recovery status scales the weekly set
//! count last.

use serde::Serialize;

use crate::fitness::{FitnessLevel, RecoveryStatus};
use crate::progression::Trend;

/// Baseline prescription per training level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadPreset {
    /// Working sets per muscle group per week.
    pub sets_per_week: u32,
    pub rep_range: &'static str,
    /// Working load as a percentage of 1RM.
    pub intensity_pct: f64,
}

pub fn preset_for(level: FitnessLevel) -> LoadPreset {
    match level {
        FitnessLevel::Beginner => LoadPreset {
            sets_per_week: 10,
            rep_range: "8-12",
            intensity_pct: 65.0,
        },
        FitnessLevel::Intermediate => LoadPreset {
            sets_per_week: 14,
            rep_range: "6-10",
            intensity_pct: 75.0,
        },
        FitnessLevel::Advanced => LoadPreset {
            sets_per_week: 18,
            rep_range: "4-8",
            intensity_pct: 82.5,
        },
    }
}

/// Recent session signals used to infer recovery.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RecoverySignals {
    pub average_rpe: Option<f64>,
    pub completion_rate: Option<f64>,
    pub days_since_last_session: Option<i64>,
}

/// Infer recovery from recent sessions.
///
/// High effort or poor completion means under-recovered; low effort after at
/// least two rest days means well-recovered.
pub fn infer_recovery(signals: &RecoverySignals) -> RecoveryStatus {
    let hard = signals.average_rpe.is_some_and(|r| r > 8.5);
    let incomplete = signals.completion_rate.is_some_and(|c| c < 0.7);
    if hard || incomplete {
        return RecoveryStatus::UnderRecovered;
    }
    let easy = signals.average_rpe.is_some_and(|r| r < 6.5);
    let rested = signals.days_since_last_session.is_some_and(|d| d >= 2);
    if easy && rested {
        return RecoveryStatus::WellRecovered;
    }
    RecoveryStatus::Normal
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimalLoad {
    pub sets_per_week: u32,
    pub rep_range: String,
    pub intensity_pct: f64,
    pub recovery_status: RecoveryStatus,
    pub volume_multiplier: f64,
    pub rationale: Vec<String>,
}

pub fn recommend_load(level: FitnessLevel, trend: Option<Trend>, recovery: RecoveryStatus) -> OptimalLoad {
    let preset = preset_for(level);
    let mut sets = f64::from(preset.sets_per_week);
    let mut intensity = preset.intensity_pct;
    let mut rationale = vec![format!(
        "{level} preset: {} sets/week at {:.1}% of 1RM",
        preset.sets_per_week, preset.intensity_pct
    )];

    match trend {
        Some(Trend::StrongIncreasing | Trend::Increasing) => {
            intensity += 2.5;
            rationale.push("strength is trending up: intensity +2.5%".into());
        }
        Some(Trend::Decreasing | Trend::Declining) => {
            sets *= 0.9;
            intensity -= 2.5;
            rationale.push("strength is trending down: sets -10%, intensity -2.5%".into());
        }
        Some(Trend::Stable | Trend::InsufficientData) | None => {}
    }

    let multiplier = recovery.volume_multiplier();
    sets *= multiplier;
    if recovery != RecoveryStatus::Normal {
        rationale.push(format!("{recovery}: volume x{multiplier:.2}"));
    }

    OptimalLoad {
        sets_per_week: (sets.round() as u32).max(1),
        rep_range: preset.rep_range.to_string(),
        intensity_pct: intensity,
        recovery_status: recovery,
        volume_multiplier: multiplier,
        rationale,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_grow_with_level() {
        assert!(preset_for(FitnessLevel::Beginner).sets_per_week < preset_for(FitnessLevel::Advanced).sets_per_week);
    }

    #[test]
    fn under_recovered_scales_volume_down() {
        let load = recommend_load(FitnessLevel::Intermediate, None, RecoveryStatus::UnderRecovered);
        // 14 * 0.85 = 11.9
        assert_eq!(load.sets_per_week, 12);
        assert_eq!(load.volume_multiplier, 0.85);
        assert_eq!(load.rep_range, "6-10");
    }

    #[test]
    fn declining_trend_backs_off() {
        let load = recommend_load(FitnessLevel::Beginner, Some(Trend::Declining), RecoveryStatus::Normal);
        assert_eq!(load.sets_per_week, 9);
        assert_eq!(load.intensity_pct, 62.5);
    }

    #[test]
    fn recovery_inference() {
        assert_eq!(
            infer_recovery(&RecoverySignals { average_rpe: Some(9.0), ..Default::default() }),
            RecoveryStatus::UnderRecovered
        );
        assert_eq!(
            infer_recovery(&RecoverySignals {
                average_rpe: Some(6.0),
                completion_rate: Some(1.0),
                days_since_last_session: Some(3),
            }),
            RecoveryStatus::WellRecovered
        );
        assert_eq!(infer_recovery(&RecoverySignals::default()), RecoveryStatus::Normal);
    }
}
