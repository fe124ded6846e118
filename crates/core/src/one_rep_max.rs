//! One-repetition-maximum estimation and the stored-estimate sanity gate.
//!
//! Formula selection by repetitions to failure:
//!
//! | reps    | method                                   | base confidence |
//! |---------|------------------------------------------|-----------------|
//! | 1..=5   | Epley                                    | 0.95            |
//! | 6..=10  | Brzycki                                  | 0.85            |
//! | 11..=36 | mean of Epley, Brzycki, McGlothin        | 0.70            |
//! | >= 37   | not estimable (Brzycki diverges)         | --              |
//!
//! Selection and the estimate itself use the performed reps only. An RPE, when
//! supplied, is reported back as reps in reserve (`10 - RPE`, rounded) and
//! does not change the estimate.

use serde::Serialize;

use crate::enums::define_text_enum;
use crate::error::CoreError;
use crate::validation::{validate_float_range, validate_int_range};

/// Base confidence for the Epley path (<= 5 reps).
pub const EPLEY_CONFIDENCE: f64 = 0.95;
/// Base confidence for the Brzycki path (6..=10 reps).
pub const BRZYCKI_CONFIDENCE: f64 = 0.85;
/// Base confidence for the composite path (> 10 reps).
pub const COMPOSITE_CONFIDENCE: f64 = 0.70;

/// Brzycki is undefined at and above this rep count.
pub const BRZYCKI_REP_LIMIT: u32 = 37;

/// Largest accepted upward jump over the previous stored estimate (+25%).
pub const MAX_INCREASE_RATIO: f64 = 1.25;
/// Largest accepted drop below the previous stored estimate (-15%).
pub const MAX_DECREASE_RATIO: f64 = 0.85;

define_text_enum! {
    OneRepMaxMethod("1RM method") {
        Epley = "epley",
        Brzycki = "brzycki",
        McGlothin = "mcglothin",
        Lombardi = "lombardi",
        Composite = "composite",
    }
}

/// `w * (1 + r / 30)`
pub fn epley(weight: f64, reps: u32) -> f64 {
    weight * (1.0 + f64::from(reps) / 30.0)
}

/// `w * 36 / (37 - r)`, undefined for `r >= 37`.
pub fn brzycki(weight: f64, reps: u32) -> Result<f64, CoreError> {
    if reps >= BRZYCKI_REP_LIMIT {
        return Err(CoreError::NotEstimable(format!(
            "Brzycki is undefined for {reps} reps (limit {})",
            BRZYCKI_REP_LIMIT - 1
        )));
    }
    Ok(weight * 36.0 / (37.0 - f64::from(reps)))
}

/// `w * (1 + 0.025 * r)`
pub fn mcglothin(weight: f64, reps: u32) -> f64 {
    weight * (1.0 + 0.025 * f64::from(reps))
}

/// `w * r^0.10`
pub fn lombardi(weight: f64, reps: u32) -> f64 {
    weight * f64::from(reps).powf(0.10)
}

/// Result of a single 1RM estimation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneRepMaxEstimate {
    pub estimated_max: f64,
    pub method: OneRepMaxMethod,
    /// Confidence in `[0, 1]` before training-history adjustment.
    pub confidence: f64,
    /// `10 - RPE`, rounded, when an RPE was supplied. Informational only.
    pub reps_in_reserve: Option<u32>,
}

/// Estimate a 1RM from one set using the rep-range selection rule.
pub fn estimate(weight: f64, reps: u32, rpe: Option<f64>) -> Result<OneRepMaxEstimate, CoreError> {
    validate_set_inputs(weight, reps, rpe)?;

    let (estimated_max, method, confidence) = match reps {
        0..=5 => (epley(weight, reps), OneRepMaxMethod::Epley, EPLEY_CONFIDENCE),
        6..=10 => (
            brzycki(weight, reps)?,
            OneRepMaxMethod::Brzycki,
            BRZYCKI_CONFIDENCE,
        ),
        r => {
            let b = brzycki(weight, r)?;
            (
                (epley(weight, r) + b + mcglothin(weight, r)) / 3.0,
                OneRepMaxMethod::Composite,
                COMPOSITE_CONFIDENCE,
            )
        }
    };

    Ok(OneRepMaxEstimate {
        estimated_max,
        method,
        confidence,
        reps_in_reserve: rpe.map(|r| (10.0 - r).round() as u32),
    })
}

/// Evaluate one explicit formula (no selection, no RPE adjustment).
pub fn estimate_with(method: OneRepMaxMethod, weight: f64, reps: u32) -> Result<f64, CoreError> {
    validate_set_inputs(weight, reps, None)?;
    match method {
        OneRepMaxMethod::Epley => Ok(epley(weight, reps)),
        OneRepMaxMethod::Brzycki => brzycki(weight, reps),
        OneRepMaxMethod::McGlothin => Ok(mcglothin(weight, reps)),
        OneRepMaxMethod::Lombardi => Ok(lombardi(weight, reps)),
        OneRepMaxMethod::Composite => {
            let b = brzycki(weight, reps)?;
            Ok((epley(weight, reps) + b + mcglothin(weight, reps)) / 3.0)
        }
    }
}

fn validate_set_inputs(weight: f64, reps: u32, rpe: Option<f64>) -> Result<(), CoreError> {
    validate_float_range(weight, 0.0, f64::MAX, "weight")?;
    validate_int_range(i64::from(reps), 1, 100, "reps")?;
    if let Some(rpe) = rpe {
        validate_float_range(rpe, 1.0, 10.0, "rpe")?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Training-history confidence adjustment
// ---------------------------------------------------------------------------

/// Training history used to scale estimate confidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingHistory {
    /// Completed sessions on record for the user.
    pub sessions_logged: u32,
    /// Consistency score in `[0, 1]`.
    pub consistency: f64,
}

/// Apply history factors to a base confidence.
///
/// Users with no logged sessions keep the base confidence.
pub fn adjust_confidence(base: f64, history: &TrainingHistory) -> f64 {
    if history.sessions_logged == 0 {
        return base;
    }
    let mut confidence = base;
    if history.sessions_logged < 10 {
        confidence *= 0.8;
    } else if history.sessions_logged > 100 {
        confidence *= 1.1;
    }
    if history.consistency < 0.7 {
        confidence *= 0.9;
    }
    confidence.clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Sanity gate
// ---------------------------------------------------------------------------

/// Outcome of checking a new estimate against the latest stored one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EstimateCheck {
    Accepted,
    /// Accepted, but lower than the previous estimate by `drop_pct` percent.
    AcceptedWithDrop { drop_pct: f64 },
}

/// Gate a proposed estimate: it must lie within `[prev * 0.85, prev * 1.25]`.
pub fn check_estimate_update(previous: Option<f64>, proposed: f64) -> Result<EstimateCheck, CoreError> {
    let Some(previous) = previous.filter(|p| *p > 0.0) else {
        return Ok(EstimateCheck::Accepted);
    };
    let ratio = proposed / previous;
    if !(MAX_DECREASE_RATIO..=MAX_INCREASE_RATIO).contains(&ratio) {
        return Err(CoreError::UnrealisticEstimate { previous, proposed });
    }
    if ratio < 1.0 {
        return Ok(EstimateCheck::AcceptedWithDrop {
            drop_pct: (1.0 - ratio) * 100.0,
        });
    }
    Ok(EstimateCheck::Accepted)
}

/// Round to two decimal places for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn epley_path_for_five_reps() {
        let est = estimate(100.0, 5, None).unwrap();
        assert_eq!(est.method, OneRepMaxMethod::Epley);
        assert_eq!(round2(est.estimated_max), 116.67);
        assert!(close(est.confidence, 0.95));
    }

    #[test]
    fn brzycki_path_for_eight_reps() {
        let est = estimate(100.0, 8, None).unwrap();
        assert_eq!(est.method, OneRepMaxMethod::Brzycki);
        assert!(close(est.estimated_max, 100.0 * 36.0 / 29.0));
        assert!(close(est.confidence, 0.85));
    }

    #[test]
    fn composite_path_above_ten_reps() {
        let est = estimate(50.0, 12, None).unwrap();
        let expected = (epley(50.0, 12) + brzycki(50.0, 12).unwrap() + mcglothin(50.0, 12)) / 3.0;
        assert_eq!(est.method, OneRepMaxMethod::Composite);
        assert!(close(est.estimated_max, expected));
        assert!(close(est.confidence, 0.70));
    }

    #[test]
    fn brzycki_not_estimable_at_37_reps() {
        assert!(matches!(brzycki(60.0, 37), Err(CoreError::NotEstimable(_))));
        assert!(brzycki(60.0, 36).is_ok());
        assert!(matches!(estimate(60.0, 37, None), Err(CoreError::NotEstimable(_))));
    }

    #[test]
    fn rpe_does_not_change_formula_selection() {
        let est = estimate(100.0, 5, Some(7.0)).unwrap();
        assert_eq!(est.method, OneRepMaxMethod::Epley);
        assert_eq!(round2(est.estimated_max), 116.67);
        assert!(close(est.confidence, 0.95));
        assert_eq!(est.reps_in_reserve, Some(3));
    }

    #[test]
    fn high_rep_set_with_low_rpe_is_estimable() {
        let est = estimate(100.0, 30, Some(1.0)).unwrap();
        let expected = (epley(100.0, 30) + brzycki(100.0, 30).unwrap() + mcglothin(100.0, 30)) / 3.0;
        assert_eq!(est.method, OneRepMaxMethod::Composite);
        assert!(close(est.estimated_max, expected));
        assert_eq!(est.reps_in_reserve, Some(9));
    }

    #[test]
    fn explicit_formulas() {
        assert!(close(estimate_with(OneRepMaxMethod::McGlothin, 100.0, 10).unwrap(), 125.0));
        assert!(close(
            estimate_with(OneRepMaxMethod::Lombardi, 100.0, 10).unwrap(),
            100.0 * 10f64.powf(0.1)
        ));
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        assert!(matches!(estimate(-1.0, 5, None), Err(CoreError::Validation(_))));
        assert!(matches!(estimate(100.0, 0, None), Err(CoreError::Validation(_))));
        assert!(matches!(estimate(100.0, 5, Some(11.0)), Err(CoreError::Validation(_))));
    }

    #[test]
    fn history_factors() {
        let fresh = TrainingHistory { sessions_logged: 0, consistency: 0.0 };
        assert!(close(adjust_confidence(0.95, &fresh), 0.95));

        let novice = TrainingHistory { sessions_logged: 5, consistency: 0.9 };
        assert!(close(adjust_confidence(0.95, &novice), 0.76));

        let veteran = TrainingHistory { sessions_logged: 150, consistency: 0.9 };
        assert!(close(adjust_confidence(0.95, &veteran), 1.0));

        let erratic = TrainingHistory { sessions_logged: 50, consistency: 0.5 };
        assert!(close(adjust_confidence(0.85, &erratic), 0.765));
    }

    #[test]
    fn sanity_gate_rejects_thirty_percent_jump() {
        let err = check_estimate_update(Some(100.0), 130.0).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnrealisticEstimate { previous, proposed } if previous == 100.0 && proposed == 130.0
        ));
    }

    #[test]
    fn sanity_gate_boundaries() {
        assert_eq!(check_estimate_update(Some(100.0), 125.0).unwrap(), EstimateCheck::Accepted);
        assert!(check_estimate_update(Some(100.0), 84.0).is_err());
        assert!(matches!(
            check_estimate_update(Some(100.0), 90.0).unwrap(),
            EstimateCheck::AcceptedWithDrop { drop_pct } if close(drop_pct, 10.0)
        ));
        assert_eq!(check_estimate_update(None, 500.0).unwrap(), EstimateCheck::Accepted);
    }
}
