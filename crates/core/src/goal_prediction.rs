//! Goal-achievement prediction.
//!
//! `probability = logistic(k * (weeks_available * r - required_pct))` with
//! `k = 0.2`, where `r` is the historical progress rate in percent per week
//! and `required_pct` the change still needed relative to the current value.

use serde::Serialize;

use crate::error::CoreError;
use crate::validation::{validate_float_range, validate_unit_range};

/// Logistic steepness.
pub const LOGISTIC_K: f64 = 0.2;
/// Half-width of the probability band at zero confidence.
pub const BOUND_SPREAD: f64 = 0.3;

/// Data points at or above which the rate estimate is fully trusted.
pub const FULL_CONFIDENCE_POINTS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GoalPredictionInput {
    pub current_value: f64,
    pub target_value: f64,
    /// Days from now until the goal's target date (may be negative).
    pub days_available: i64,
    /// Historical rate of change, percent per week.
    pub weekly_rate_pct: f64,
    /// Number of observations behind `weekly_rate_pct`.
    pub data_points: usize,
    /// Consistency score in `[0, 1]`.
    pub consistency: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalPrediction {
    pub probability: f64,
    /// Days until the target is reached at the current rate, if it is moving
    /// towards the target at all.
    pub estimated_days: Option<i64>,
    pub confidence: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
    /// Percent change still required to reach the target.
    pub required_change_pct: f64,
}

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Base confidence from the amount of rate data available.
fn data_confidence(points: usize) -> f64 {
    match points {
        0 | 1 => 0.3,
        p if p < FULL_CONFIDENCE_POINTS => 0.6,
        _ => 0.9,
    }
}

/// Predict the probability of reaching a goal by its target date.
///
/// The goal direction is taken from the sign of `target - current`: for a
/// decreasing goal (e.g. body weight) a negative rate counts as progress.
pub fn predict_goal(input: &GoalPredictionInput) -> Result<GoalPrediction, CoreError> {
    validate_float_range(input.target_value, f64::MIN_POSITIVE, f64::MAX, "target value")?;
    validate_float_range(input.current_value, 0.0, f64::MAX, "current value")?;
    validate_unit_range(input.consistency, "consistency")?;
    if !input.weekly_rate_pct.is_finite() {
        return Err(CoreError::Validation("weekly rate must be finite".into()));
    }

    let delta = input.target_value - input.current_value;
    let required_change_pct = if input.current_value > 0.0 {
        delta.abs() / input.current_value * 100.0
    } else {
        100.0
    };
    let direction = if delta < 0.0 { -1.0 } else { 1.0 };
    let progress_rate = input.weekly_rate_pct * direction;

    let confidence = (data_confidence(input.data_points) * input.consistency).clamp(0.0, 1.0);

    if delta == 0.0 {
        return Ok(GoalPrediction {
            probability: 1.0,
            estimated_days: Some(0),
            confidence,
            lower_bound: 1.0,
            upper_bound: 1.0,
            required_change_pct: 0.0,
        });
    }

    let weeks_available = input.days_available.max(0) as f64 / 7.0;
    let probability = logistic(LOGISTIC_K * (weeks_available * progress_rate - required_change_pct));

    let estimated_days = (progress_rate > 0.0)
        .then(|| (required_change_pct / progress_rate * 7.0).ceil() as i64);

    let spread = (1.0 - confidence) * BOUND_SPREAD;
    Ok(GoalPrediction {
        probability,
        estimated_days,
        confidence,
        lower_bound: (probability - spread).clamp(0.0, 1.0),
        upper_bound: (probability + spread).clamp(0.0, 1.0),
        required_change_pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> GoalPredictionInput {
        GoalPredictionInput {
            current_value: 100.0,
            target_value: 110.0,
            days_available: 70,
            weekly_rate_pct: 1.0,
            data_points: 8,
            consistency: 1.0,
        }
    }

    #[test]
    fn on_track_is_even_odds() {
        // 10 weeks * 1%/week == 10% required.
        let p = predict_goal(&input()).unwrap();
        assert!((p.probability - 0.5).abs() < 1e-9);
        assert_eq!(p.estimated_days, Some(70));
        assert!((p.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn ahead_of_schedule_is_likely() {
        let p = predict_goal(&GoalPredictionInput { weekly_rate_pct: 3.0, ..input() }).unwrap();
        assert!(p.probability > 0.95);
        assert!(p.lower_bound <= p.probability && p.probability <= p.upper_bound);
    }

    #[test]
    fn decreasing_goal_counts_negative_rate_as_progress() {
        let p = predict_goal(&GoalPredictionInput {
            current_value: 90.0,
            target_value: 81.0,
            weekly_rate_pct: -2.0,
            ..input()
        })
        .unwrap();
        assert!(p.probability > 0.85);
        assert_eq!(p.estimated_days, Some(35));
    }

    #[test]
    fn no_progress_has_no_estimate() {
        let p = predict_goal(&GoalPredictionInput { weekly_rate_pct: 0.0, ..input() }).unwrap();
        assert_eq!(p.estimated_days, None);
        assert!(p.probability < 0.2);
    }

    #[test]
    fn confidence_scales_with_consistency() {
        let p = predict_goal(&GoalPredictionInput { consistency: 0.5, data_points: 2, ..input() }).unwrap();
        assert!((p.confidence - 0.3).abs() < 1e-9);
        assert!((p.upper_bound - p.lower_bound - 2.0 * 0.7 * BOUND_SPREAD).abs() < 1e-9);
    }

    #[test]
    fn invalid_target_rejected() {
        assert!(predict_goal(&GoalPredictionInput { target_value: 0.0, ..input() }).is_err());
    }
}
