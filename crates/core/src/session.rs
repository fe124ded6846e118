//! Workout session rules: lifecycle, set validation and metrics.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::enums::define_text_enum;
use crate::error::CoreError;
use crate::one_rep_max::epley;
use crate::types::{DbId, Timestamp};
use crate::validation::{validate_float_range, validate_int_range, validate_text_length, validate_unit_range};
use crate::volume::mean;
use crate::week::day_of_week;

/// An active session older than this is stale.
pub const STALE_AFTER_HOURS: i64 = 24;

pub const MIN_SETS: usize = 1;
pub const MAX_SETS: usize = 20;
pub const MIN_REPS: i32 = 1;
pub const MAX_REPS: i32 = 100;
/// RPE above which a form warning is emitted.
pub const FORM_WARNING_RPE: f64 = 9.0;

/// Trailing window for the consistency score.
pub const CONSISTENCY_WINDOW_DAYS: i64 = 28;

pub const MAX_NOTES_LEN: usize = 2000;
pub const MAX_SKIP_REASON_LEN: usize = 500;

define_text_enum! {
    /// `active -> {completed, skipped, stale}`; every state but `active` is terminal.
    SessionStatus("session status") {
        Active = "active",
        Completed = "completed",
        Skipped = "skipped",
        Stale = "stale",
    }
}

impl SessionStatus {
    pub fn is_terminal(self) -> bool {
        self != SessionStatus::Active
    }
}

/// Whether an active session started at `started_at` is stale at `now`.
pub fn is_stale(started_at: Timestamp, now: Timestamp) -> bool {
    now - started_at > Duration::hours(STALE_AFTER_HOURS)
}

/// Fail unless the session is still active.
pub fn ensure_active(status: SessionStatus, session_id: DbId) -> Result<(), CoreError> {
    if status != SessionStatus::Active {
        return Err(CoreError::Conflict(format!(
            "session {session_id} is {status}, not active"
        )));
    }
    Ok(())
}

/// One performed set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SetRecord {
    pub weight: f64,
    pub reps: i32,
    #[serde(default)]
    pub rpe: Option<f64>,
}

impl SetRecord {
    pub fn volume(&self) -> f64 {
        self.weight * f64::from(self.reps)
    }

    /// Epley estimate used to rank sets.
    pub fn estimated_max(&self) -> f64 {
        epley(self.weight, self.reps.max(0) as u32)
    }
}

/// Validate a batch of set records for one exercise.
pub fn validate_sets(records: &[SetRecord]) -> Result<(), CoreError> {
    validate_int_range(records.len() as i64, MIN_SETS as i64, MAX_SETS as i64, "sets")?;
    for (i, set) in records.iter().enumerate() {
        validate_int_range(i64::from(set.reps), i64::from(MIN_REPS), i64::from(MAX_REPS), "reps")
            .map_err(|e| in_set(i, e))?;
        validate_float_range(set.weight, 0.0, f64::MAX, "weight").map_err(|e| in_set(i, e))?;
        if let Some(rpe) = set.rpe {
            validate_float_range(rpe, 1.0, 10.0, "rpe").map_err(|e| in_set(i, e))?;
        }
    }
    Ok(())
}

fn in_set(index: usize, err: CoreError) -> CoreError {
    match err {
        CoreError::Validation(msg) => CoreError::Validation(format!("set {}: {msg}", index + 1)),
        other => other,
    }
}

/// The set with the highest estimated max (ties: heavier weight).
pub fn best_set(records: &[SetRecord]) -> Option<SetRecord> {
    records.iter().copied().max_by(|a, b| {
        a.estimated_max()
            .total_cmp(&b.estimated_max())
            .then(a.weight.total_cmp(&b.weight))
    })
}

pub fn total_volume(records: &[SetRecord]) -> f64 {
    records.iter().map(SetRecord::volume).sum()
}

/// Highest RPE above the form-warning threshold, if any.
pub fn form_warning(records: &[SetRecord]) -> Option<f64> {
    records
        .iter()
        .filter_map(|s| s.rpe)
        .filter(|rpe| *rpe > FORM_WARNING_RPE)
        .max_by(f64::total_cmp)
}

/// Performed over prescribed sets, in `[0, 1]`. No prescription counts as complete.
pub fn completion_rate(performed_sets: i64, prescribed_sets: i64) -> f64 {
    if prescribed_sets <= 0 {
        return 1.0;
    }
    (performed_sets as f64 / prescribed_sets as f64).clamp(0.0, 1.0)
}

/// `completed / (completed + skipped)`, or 0 with no sessions.
pub fn consistency_score(completed: u32, skipped: u32) -> f64 {
    let total = completed + skipped;
    if total == 0 {
        return 0.0;
    }
    f64::from(completed) / f64::from(total)
}

/// User-supplied completion summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    #[serde(default)]
    pub notes: Option<String>,
    /// Overall session RPE.
    #[serde(default)]
    pub perceived_effort: Option<f64>,
    /// Overrides the computed completion rate when present.
    #[serde(default)]
    pub completion_rate: Option<f64>,
}

impl SessionSummary {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(notes) = &self.notes {
            validate_text_length(notes, 0, MAX_NOTES_LEN, "notes")?;
        }
        if let Some(effort) = self.perceived_effort {
            validate_float_range(effort, 1.0, 10.0, "perceived effort")?;
        }
        if let Some(rate) = self.completion_rate {
            validate_unit_range(rate, "completion rate")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExerciseMetrics {
    pub exercise_id: DbId,
    pub sets_completed: usize,
    pub total_reps: i64,
    pub total_volume: f64,
    pub best_set: Option<SetRecord>,
    pub average_rpe: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionMetrics {
    pub duration_seconds: Option<i64>,
    pub total_sets: usize,
    pub total_reps: i64,
    pub total_volume: f64,
    pub average_rpe: Option<f64>,
    pub exercises: Vec<ExerciseMetrics>,
}

pub fn exercise_metrics(exercise_id: DbId, sets: &[SetRecord]) -> ExerciseMetrics {
    let rpes: Vec<f64> = sets.iter().filter_map(|s| s.rpe).collect();
    ExerciseMetrics {
        exercise_id,
        sets_completed: sets.len(),
        total_reps: sets.iter().map(|s| i64::from(s.reps)).sum(),
        total_volume: total_volume(sets),
        best_set: best_set(sets),
        average_rpe: mean(&rpes),
    }
}

/// Metrics for one session from its per-exercise set records.
pub fn session_metrics(
    started_at: Timestamp,
    ended_at: Option<Timestamp>,
    performances: &[(DbId, Vec<SetRecord>)],
) -> SessionMetrics {
    let exercises: Vec<ExerciseMetrics> = performances
        .iter()
        .map(|(id, sets)| exercise_metrics(*id, sets))
        .collect();
    let rpes: Vec<f64> = performances
        .iter()
        .flat_map(|(_, sets)| sets.iter().filter_map(|s| s.rpe))
        .collect();
    SessionMetrics {
        duration_seconds: ended_at.map(|end| (end - started_at).num_seconds().max(0)),
        total_sets: exercises.iter().map(|e| e.sets_completed).sum(),
        total_reps: exercises.iter().map(|e| e.total_reps).sum(),
        total_volume: exercises.iter().map(|e| e.total_volume).sum(),
        average_rpe: mean(&rpes),
        exercises,
    }
}

/// Per-session input to weekly stats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionDigest {
    pub status: SessionStatus,
    pub started_at: Timestamp,
    pub total_volume: f64,
    pub completion_rate: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct DayStats {
    pub day_of_week: i16,
    pub completed: u32,
    pub skipped: u32,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeeklySessionStats {
    pub week_start: NaiveDate,
    pub completed: u32,
    pub skipped: u32,
    pub stale: u32,
    pub total_volume: f64,
    pub mean_completion_rate: Option<f64>,
    pub per_day: Vec<DayStats>,
}

pub fn weekly_stats(week_start: NaiveDate, sessions: &[SessionDigest]) -> WeeklySessionStats {
    let mut per_day: Vec<DayStats> = (1..=7)
        .map(|d| DayStats {
            day_of_week: d,
            ..DayStats::default()
        })
        .collect();
    let mut stats = WeeklySessionStats {
        week_start,
        completed: 0,
        skipped: 0,
        stale: 0,
        total_volume: 0.0,
        mean_completion_rate: None,
        per_day: Vec::new(),
    };
    let mut rates = Vec::new();

    for session in sessions {
        let day = &mut per_day[(day_of_week(session.started_at.date_naive()) - 1) as usize];
        match session.status {
            SessionStatus::Completed => {
                stats.completed += 1;
                day.completed += 1;
                stats.total_volume += session.total_volume;
                day.volume += session.total_volume;
                rates.extend(session.completion_rate);
            }
            SessionStatus::Skipped => {
                stats.skipped += 1;
                day.skipped += 1;
            }
            SessionStatus::Stale => stats.stale += 1,
            SessionStatus::Active => {}
        }
    }

    stats.mean_completion_rate = mean(&rates);
    stats.per_day = per_day;
    stats
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn set(weight: f64, reps: i32, rpe: Option<f64>) -> SetRecord {
        SetRecord { weight, reps, rpe }
    }

    #[test]
    fn stale_after_24_hours() {
        let start = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        assert!(!is_stale(start, start + Duration::hours(24)));
        assert!(is_stale(start, start + Duration::hours(24) + Duration::seconds(1)));
    }

    #[test]
    fn terminal_states() {
        assert!(!SessionStatus::Active.is_terminal());
        assert!(SessionStatus::Stale.is_terminal());
        assert!(ensure_active(SessionStatus::Completed, 1).is_err());
    }

    #[test]
    fn set_validation_bounds() {
        assert!(validate_sets(&[set(60.0, 10, Some(8.0))]).is_ok());
        assert!(validate_sets(&[]).is_err());
        assert!(validate_sets(&vec![set(60.0, 10, None); 21]).is_err());
        assert!(validate_sets(&vec![set(60.0, 10, None); 20]).is_ok());
        assert!(validate_sets(&[set(60.0, 0, None)]).is_err());
        assert!(validate_sets(&[set(60.0, 101, None)]).is_err());
        assert!(validate_sets(&[set(-1.0, 5, None)]).is_err());
        assert!(validate_sets(&[set(0.0, 5, None)]).is_ok());
        let err = validate_sets(&[set(60.0, 5, None), set(60.0, 5, Some(11.0))]).unwrap_err();
        assert!(err.to_string().contains("set 2"));
    }

    #[test]
    fn best_set_by_estimated_max() {
        let best = best_set(&[set(100.0, 5, None), set(110.0, 1, None), set(90.0, 10, None)]).unwrap();
        // 90 x 10 => 120, 100 x 5 => 116.7, 110 x 1 => 113.7
        assert_eq!(best.weight, 90.0);
    }

    #[test]
    fn form_warning_only_above_nine() {
        assert_eq!(form_warning(&[set(100.0, 5, Some(9.0))]), None);
        assert_eq!(form_warning(&[set(100.0, 5, Some(9.5)), set(100.0, 5, Some(10.0))]), Some(10.0));
    }

    #[test]
    fn rates_and_consistency() {
        assert_eq!(completion_rate(9, 12), 0.75);
        assert_eq!(completion_rate(15, 12), 1.0);
        assert_eq!(completion_rate(0, 0), 1.0);
        assert_eq!(consistency_score(0, 0), 0.0);
        assert_eq!(consistency_score(3, 1), 0.75);
    }

    #[test]
    fn metrics_aggregate_sets() {
        let start = Utc.with_ymd_and_hms(2026, 10, 16, 8, 0, 0).unwrap();
        let metrics = session_metrics(
            start,
            Some(start + Duration::minutes(45)),
            &[
                (1, vec![set(100.0, 5, Some(8.0)), set(100.0, 5, Some(9.0))]),
                (2, vec![set(20.0, 12, None)]),
            ],
        );
        assert_eq!(metrics.duration_seconds, Some(2700));
        assert_eq!(metrics.total_sets, 3);
        assert_eq!(metrics.total_reps, 22);
        assert_eq!(metrics.total_volume, 1240.0);
        assert_eq!(metrics.average_rpe, Some(8.5));
        assert_eq!(metrics.exercises[1].best_set.map(|s| s.reps), Some(12));
    }

    #[test]
    fn weekly_stats_by_day() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 12).unwrap();
        let at = |d: u32| Utc.with_ymd_and_hms(2026, 10, d, 18, 0, 0).unwrap();
        let stats = weekly_stats(
            monday,
            &[
                SessionDigest { status: SessionStatus::Completed, started_at: at(12), total_volume: 1000.0, completion_rate: Some(1.0) },
                SessionDigest { status: SessionStatus::Completed, started_at: at(14), total_volume: 500.0, completion_rate: Some(0.5) },
                SessionDigest { status: SessionStatus::Skipped, started_at: at(16), total_volume: 0.0, completion_rate: None },
            ],
        );
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.total_volume, 1500.0);
        assert_eq!(stats.mean_completion_rate, Some(0.75));
        assert_eq!(stats.per_day.len(), 7);
        assert_eq!(stats.per_day[2].completed, 1);
        assert_eq!(stats.per_day[4].skipped, 1);
    }
}
