//! Strength progression trends and plateau detection over 1RM history.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::enums::define_text_enum;
use crate::week::week_start;

/// Percent change above which the trend is `strong_increasing`.
pub const STRONG_INCREASE_PCT: f64 = 5.0;
/// Percent change above which the trend is `increasing`.
pub const INCREASE_PCT: f64 = 1.0;
/// Percent change below which the trend is `decreasing`.
pub const DECREASE_PCT: f64 = -1.0;
/// Percent change below which the trend is `declining`.
pub const DECLINE_PCT: f64 = -5.0;

/// Improvement below which a window counts as a plateau.
pub const PLATEAU_IMPROVEMENT_PCT: f64 = 2.5;
/// Consecutive weeks inspected for a plateau.
pub const PLATEAU_WINDOW_WEEKS: usize = 4;

/// Default analysis window for progression queries.
pub const DEFAULT_TIMEFRAME_DAYS: i64 = 90;
/// Largest accepted analysis window.
pub const MAX_TIMEFRAME_DAYS: i64 = 730;

define_text_enum! {
    Trend("trend") {
        StrongIncreasing = "strong_increasing",
        Increasing = "increasing",
        Stable = "stable",
        Decreasing = "decreasing",
        Declining = "declining",
        InsufficientData = "insufficient_data",
    }
}

impl Trend {
    /// Classify a percent change over the analysis window.
    pub fn from_rate(rate_pct: f64) -> Self {
        if rate_pct > STRONG_INCREASE_PCT {
            Trend::StrongIncreasing
        } else if rate_pct > INCREASE_PCT {
            Trend::Increasing
        } else if rate_pct < DECLINE_PCT {
            Trend::Declining
        } else if rate_pct < DECREASE_PCT {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

/// One dated max observation for an exercise (estimated 1RM or best-set max).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaxSample {
    pub date: NaiveDate,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrengthProgression {
    pub starting_max: f64,
    pub current_max: f64,
    /// Percent change across the window.
    pub progression_rate: f64,
    /// Percent change per week, derived from the fitted slope.
    pub weekly_rate: f64,
    pub trend: Trend,
    pub data_points: usize,
    pub timeframe_days: i64,
}

/// Fit a progression rate to the samples.
///
/// Three or more points use an ordinary least-squares line over days; two
/// points use the straight two-point rate. Fewer yield `insufficient_data`.
pub fn analyze_progression(samples: &[MaxSample], timeframe_days: i64) -> StrengthProgression {
    let mut sorted: Vec<MaxSample> = samples
        .iter()
        .copied()
        .filter(|s| s.max.is_finite() && s.max > 0.0)
        .collect();
    sorted.sort_by_key(|s| s.date);

    let insufficient = |sorted: &[MaxSample]| StrengthProgression {
        starting_max: sorted.first().map(|s| s.max).unwrap_or(0.0),
        current_max: sorted.last().map(|s| s.max).unwrap_or(0.0),
        progression_rate: 0.0,
        weekly_rate: 0.0,
        trend: Trend::InsufficientData,
        data_points: sorted.len(),
        timeframe_days,
    };

    let (Some(first), Some(last)) = (sorted.first().copied(), sorted.last().copied()) else {
        return insufficient(&sorted);
    };
    if sorted.len() < 2 {
        return insufficient(&sorted);
    }

    let span_days = (last.date - first.date).num_days() as f64;
    let slope_per_day = if sorted.len() == 2 {
        if span_days > 0.0 {
            (last.max - first.max) / span_days
        } else {
            0.0
        }
    } else {
        least_squares_slope(&sorted, first.date)
    };

    let fitted_start = if sorted.len() == 2 {
        first.max
    } else {
        least_squares_intercept(&sorted, first.date, slope_per_day)
    };
    let base = if fitted_start > 0.0 { fitted_start } else { first.max };

    let progression_rate = slope_per_day * span_days / base * 100.0;
    let weekly_rate = slope_per_day * 7.0 / base * 100.0;

    StrengthProgression {
        starting_max: first.max,
        current_max: last.max,
        progression_rate,
        weekly_rate,
        trend: Trend::from_rate(progression_rate),
        data_points: sorted.len(),
        timeframe_days,
    }
}

fn day_offsets(samples: &[MaxSample], origin: NaiveDate) -> impl Iterator<Item = (f64, f64)> + '_ {
    samples
        .iter()
        .map(move |s| ((s.date - origin).num_days() as f64, s.max))
}

fn least_squares_slope(samples: &[MaxSample], origin: NaiveDate) -> f64 {
    let n = samples.len() as f64;
    let (sum_x, sum_y) = day_offsets(samples, origin).fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    let mean_x = sum_x / n;
    let mean_y = sum_y / n;
    let (num, den) = day_offsets(samples, origin).fold((0.0, 0.0), |(num, den), (x, y)| {
        (num + (x - mean_x) * (y - mean_y), den + (x - mean_x).powi(2))
    });
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn least_squares_intercept(samples: &[MaxSample], origin: NaiveDate, slope: f64) -> f64 {
    let n = samples.len() as f64;
    let (sum_x, sum_y) = day_offsets(samples, origin).fold((0.0, 0.0), |(sx, sy), (x, y)| (sx + x, sy + y));
    sum_y / n - slope * sum_x / n
}

// ---------------------------------------------------------------------------
// Plateau detection
// ---------------------------------------------------------------------------

/// Best max per calendar week (keyed by the week's Monday).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WeeklyMax {
    pub week_start: NaiveDate,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateauAnalysis {
    pub plateau: bool,
    pub duration_days: i64,
    /// Improvement across the inspected weeks, in percent.
    pub improvement_pct: f64,
    pub weeks_analyzed: usize,
    pub recommendation: String,
}

/// Collapse samples into one best max per calendar week, oldest first.
pub fn weekly_maxes(samples: &[MaxSample]) -> Vec<WeeklyMax> {
    let mut by_week: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for s in samples.iter().filter(|s| s.max.is_finite() && s.max > 0.0) {
        let entry = by_week.entry(week_start(s.date)).or_insert(s.max);
        if s.max > *entry {
            *entry = s.max;
        }
    }
    by_week
        .into_iter()
        .map(|(week_start, max)| WeeklyMax { week_start, max })
        .collect()
}

fn improvement_pct(weeks: &[WeeklyMax]) -> f64 {
    let Some(first) = weeks.first() else {
        return 0.0;
    };
    let best_after = weeks[1..]
        .iter()
        .map(|w| w.max)
        .fold(first.max, f64::max);
    (best_after - first.max) / first.max * 100.0
}

/// Detect a plateau in the most recent run of consecutive logged weeks.
///
/// The last [`PLATEAU_WINDOW_WEEKS`] weeks must be consecutive calendar weeks
/// and improve by less than [`PLATEAU_IMPROVEMENT_PCT`]. The reported
/// duration extends backwards over earlier consecutive weeks while the
/// extended run is still flat.
pub fn detect_plateau(weeks: &[WeeklyMax]) -> PlateauAnalysis {
    let run = trailing_consecutive_run(weeks);
    if run.len() < PLATEAU_WINDOW_WEEKS {
        return PlateauAnalysis {
            plateau: false,
            duration_days: 0,
            improvement_pct: improvement_pct(run),
            weeks_analyzed: run.len(),
            recommendation: format!(
                "Not enough data yet: log this exercise for {PLATEAU_WINDOW_WEEKS} consecutive weeks to assess plateaus."
            ),
        };
    }

    let window = &run[run.len() - PLATEAU_WINDOW_WEEKS..];
    let improvement = improvement_pct(window);
    if improvement >= PLATEAU_IMPROVEMENT_PCT {
        return PlateauAnalysis {
            plateau: false,
            duration_days: 0,
            improvement_pct: improvement,
            weeks_analyzed: window.len(),
            recommendation: format!(
                "Progressing ({improvement:.1}% over {PLATEAU_WINDOW_WEEKS} weeks). Keep applying progressive overload: add a rep or 2.5% load when all sets hit the top of the rep range."
            ),
        };
    }

    let mut start = run.len() - PLATEAU_WINDOW_WEEKS;
    while start > 0 && improvement_pct(&run[start - 1..]) < PLATEAU_IMPROVEMENT_PCT {
        start -= 1;
    }
    let flat_weeks = run.len() - start;
    let duration_days = (flat_weeks * 7) as i64;

    PlateauAnalysis {
        plateau: true,
        duration_days,
        improvement_pct: improvement,
        weeks_analyzed: flat_weeks,
        recommendation: format!(
            "Plateau for {duration_days} days ({improvement:.1}% improvement). Take a deload week at 60% of working volume, then resume with a varied rep scheme."
        ),
    }
}

fn trailing_consecutive_run(weeks: &[WeeklyMax]) -> &[WeeklyMax] {
    if weeks.is_empty() {
        return weeks;
    }
    let mut start = weeks.len() - 1;
    while start > 0 && weeks[start].week_start - weeks[start - 1].week_start == Duration::weeks(1) {
        start -= 1;
    }
    &weeks[start..]
}
