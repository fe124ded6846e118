//! Plan effectiveness score over tracked performance records.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::validation::{validate_float_range, validate_int_range, validate_unit_range};
use crate::volume::mean;

pub const COMPLETION_WEIGHT: f64 = 0.5;
pub const RPE_WEIGHT: f64 = 0.3;
pub const SKIP_WEIGHT: f64 = 0.2;
/// RPE at which the effort component peaks.
pub const TARGET_RPE: f64 = 7.5;

/// One tracked performance record of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSample {
    pub completion_rate: f64,
    pub average_rpe: Option<f64>,
    pub skipped_count: i32,
}

impl PerformanceSample {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_unit_range(self.completion_rate, "completion rate")?;
        if let Some(rpe) = self.average_rpe {
            validate_float_range(rpe, 1.0, 10.0, "average rpe")?;
        }
        validate_int_range(i64::from(self.skipped_count), 0, 7, "skipped count")?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Effectiveness {
    pub score: f64,
    pub records: usize,
    pub mean_completion_rate: f64,
    pub mean_rpe: Option<f64>,
    pub skipped_ratio: f64,
}

/// `0.5 * completion + 0.3 * clamp(1 - |rpe - 7.5| / 3, 0, 1) + 0.2 * (1 - skipped_ratio)`
///
/// `skipped_ratio = skipped / (records + skipped)`. With no records the score
/// is 0; when no record carries an RPE the effort component is 0.5.
pub fn effectiveness(records: &[PerformanceSample]) -> Effectiveness {
    if records.is_empty() {
        return Effectiveness {
            score: 0.0,
            records: 0,
            mean_completion_rate: 0.0,
            mean_rpe: None,
            skipped_ratio: 0.0,
        };
    }

    let completions: Vec<f64> = records.iter().map(|r| r.completion_rate).collect();
    let rpes: Vec<f64> = records.iter().filter_map(|r| r.average_rpe).collect();
    let mean_completion_rate = mean(&completions).unwrap_or(0.0);
    let mean_rpe = mean(&rpes);

    let skipped: i64 = records.iter().map(|r| i64::from(r.skipped_count.max(0))).sum();
    let skipped_ratio = skipped as f64 / (records.len() as f64 + skipped as f64);

    let effort = mean_rpe
        .map(|rpe| (1.0 - (rpe - TARGET_RPE).abs() / 3.0).clamp(0.0, 1.0))
        .unwrap_or(0.5);

    let score = COMPLETION_WEIGHT * mean_completion_rate + RPE_WEIGHT * effort + SKIP_WEIGHT * (1.0 - skipped_ratio);

    Effectiveness {
        score: score.clamp(0.0, 1.0),
        records: records.len(),
        mean_completion_rate,
        mean_rpe,
        skipped_ratio,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(rate: f64, rpe: Option<f64>, skipped: i32) -> PerformanceSample {
        PerformanceSample {
            completion_rate: rate,
            average_rpe: rpe,
            skipped_count: skipped,
        }
    }

    #[test]
    fn perfect_plan_scores_one() {
        let e = effectiveness(&[sample(1.0, Some(7.5), 0), sample(1.0, Some(7.5), 0)]);
        assert!((e.score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_components() {
        // completion 0.8, rpe 9 => effort 0.5, skipped 1 of 3 => ratio 1/3
        let e = effectiveness(&[sample(0.8, Some(9.0), 1), sample(0.8, Some(9.0), 0)]);
        let expected = 0.5 * 0.8 + 0.3 * 0.5 + 0.2 * (1.0 - 1.0 / 3.0);
        assert!((e.score - expected).abs() < 1e-9);
    }

    #[test]
    fn no_records_scores_zero() {
        assert_eq!(effectiveness(&[]).score, 0.0);
    }

    #[test]
    fn missing_rpe_is_neutral() {
        let e = effectiveness(&[sample(1.0, None, 0)]);
        assert!((e.score - (0.5 + 0.15 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn sample_validation() {
        assert!(sample(1.1, None, 0).validate().is_err());
        assert!(sample(0.5, Some(0.5), 0).validate().is_err());
        assert!(sample(0.5, Some(7.0), -1).validate().is_err());
        assert!(sample(0.5, Some(7.0), 2).validate().is_ok());
    }
}
