//! Performance analytics: 1RM estimates, progression, plateaus, goal
//! prediction, volume, intensity and load recommendations.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use fitup_core::error::{CoreError, CoreResult};
use fitup_core::fitness::FitnessLevel;
use fitup_core::goal_prediction::{predict_goal, GoalPrediction, GoalPredictionInput};
use fitup_core::one_rep_max::{
    adjust_confidence, check_estimate_update, estimate, round2, EstimateCheck, OneRepMaxEstimate, TrainingHistory,
};
use fitup_core::optimal_load::{infer_recovery, recommend_load, OptimalLoad, RecoverySignals};
use fitup_core::plan::metadata::AlgorithmParameters;
use fitup_core::progression::{
    analyze_progression, detect_plateau, weekly_maxes, MaxSample, PlateauAnalysis, StrengthProgression, Trend,
    DEFAULT_TIMEFRAME_DAYS, MAX_TIMEFRAME_DAYS,
};
use fitup_core::session::{consistency_score, SessionStatus, CONSISTENCY_WINDOW_DAYS};
use fitup_core::types::{DbId, Timestamp};
use fitup_core::validation::{validate_float_range, validate_id, validate_int_range, validate_user_id};
use fitup_core::volume::{
    analyze_intensity, analyze_weekly_volume, mean, IntensityAnalysis, IntensityEntry, VolumeEntry, WeeklyVolume,
};
use fitup_core::week::{validate_week_start, week_bounds};
use fitup_db::models::progress::{NewOneRepMax, OneRepMaxRecord};
use fitup_db::{
    ExerciseRepo, GoalRepo, PlanRepo, ProfileRepo, ProgressRepo, RepoError, Repository, SessionRepo, Transaction,
};
use serde::{Deserialize, Serialize};

use crate::access::{ensure_can_access, Actor};
use crate::deadline;

/// Weeks of 1RM history scanned for plateau detection.
const PLATEAU_LOOKBACK_WEEKS: i64 = 26;
pub const DEFAULT_INTENSITY_DAYS: i64 = 28;
const MAX_INTENSITY_DAYS: i64 = 365;
const RECOVERY_WINDOW_DAYS: i64 = 7;
const RECENT_SESSION_SCAN: i64 = 50;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OneRepMaxRequest {
    pub exercise_id: DbId,
    pub weight: f64,
    pub reps: u32,
    #[serde(default)]
    pub rpe: Option<f64>,
    /// Persist the estimate through the sanity gate.
    #[serde(default)]
    pub store: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OneRepMaxResult {
    #[serde(flatten)]
    pub estimate: OneRepMaxEstimate,
    pub previous_max: Option<f64>,
    pub stored: Option<OneRepMaxRecord>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConsistencyReport {
    pub completed: i64,
    pub skipped: i64,
    pub window_days: i64,
    pub score: f64,
}

pub struct AnalyticsService {
    repo: Arc<dyn Repository>,
}

impl AnalyticsService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Estimate a 1RM from one set, scaled by the actor's training history.
    /// With `store`, the estimate is persisted after the sanity gate.
    pub async fn estimate_one_rep_max(&self, actor: &Actor, request: OneRepMaxRequest) -> CoreResult<OneRepMaxResult> {
        validate_id(request.exercise_id, "exercise id")?;
        validate_float_range(request.weight, f64::MIN_POSITIVE, 1000.0, "weight")?;
        validate_int_range(i64::from(request.reps), 1, 100, "reps")?;
        if let Some(rpe) = request.rpe {
            validate_float_range(rpe, 1.0, 10.0, "rpe")?;
        }
        let mut result = estimate(request.weight, request.reps, request.rpe)?;

        let op = if request.store { "store_one_rep_max" } else { "estimate_one_rep_max" };
        deadline::write(op, async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            tx.get_exercise(request.exercise_id).await?;
            let history = training_history(&mut *tx, &actor.user_id, now).await?;
            result.confidence = round2(adjust_confidence(result.confidence, &history));

            let previous_max = tx
                .latest_one_rep_max(&actor.user_id, request.exercise_id)
                .await?
                .map(|r| r.estimated_max);

            let (stored, warning) = if request.store {
                let (record, check) = record_one_rep_max(
                    &mut *tx,
                    &NewOneRepMax {
                        user_id: actor.user_id.clone(),
                        exercise_id: request.exercise_id,
                        estimated_max: result.estimated_max,
                        method: result.method,
                        confidence: result.confidence,
                        source_weight: request.weight,
                        source_reps: request.reps as i32,
                        source_rpe: request.rpe,
                        source_session_id: None,
                        recorded_at: now,
                    },
                )
                .await?;
                (Some(record), drop_warning(check))
            } else {
                (None, check_estimate_update(previous_max, result.estimated_max).ok().and_then(drop_warning))
            };
            tx.commit().await?;

            Ok(OneRepMaxResult {
                estimate: result,
                previous_max,
                stored,
                warning,
            })
        })
        .await
    }

    /// Completed over completed-plus-skipped sessions in the last 28 days.
    pub async fn consistency(&self, actor: &Actor, user_id: &str) -> CoreResult<ConsistencyReport> {
        validate_user_id(user_id)?;
        deadline::read("consistency", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let since = Utc::now() - Duration::days(CONSISTENCY_WINDOW_DAYS);
            let counts = tx.count_sessions_since(user_id, since).await?;
            tx.commit().await?;
            Ok(ConsistencyReport {
                completed: counts.completed,
                skipped: counts.skipped,
                window_days: CONSISTENCY_WINDOW_DAYS,
                score: consistency_score(counts.completed as u32, counts.skipped as u32),
            })
        })
        .await
    }

    pub async fn strength_progression(
        &self,
        actor: &Actor,
        user_id: &str,
        exercise_id: DbId,
        timeframe_days: Option<i64>,
    ) -> CoreResult<StrengthProgression> {
        validate_user_id(user_id)?;
        validate_id(exercise_id, "exercise id")?;
        let days = timeframe_days.unwrap_or(DEFAULT_TIMEFRAME_DAYS);
        validate_int_range(days, 1, MAX_TIMEFRAME_DAYS, "timeframe")?;

        deadline::read("strength_progression", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            tx.get_exercise(exercise_id).await?;
            let samples = max_samples(&mut *tx, user_id, exercise_id, Utc::now() - Duration::days(days)).await?;
            tx.commit().await?;
            Ok(analyze_progression(&samples, days))
        })
        .await
    }

    pub async fn plateau(&self, actor: &Actor, user_id: &str, exercise_id: DbId) -> CoreResult<PlateauAnalysis> {
        validate_user_id(user_id)?;
        validate_id(exercise_id, "exercise id")?;

        deadline::read("plateau", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            tx.get_exercise(exercise_id).await?;
            let since = Utc::now() - Duration::weeks(PLATEAU_LOOKBACK_WEEKS);
            let samples = max_samples(&mut *tx, user_id, exercise_id, since).await?;
            tx.commit().await?;
            let analysis = detect_plateau(&weekly_maxes(&samples));
            if analysis.plateau {
                tracing::info!(user_id = %user_id, exercise_id, duration_days = analysis.duration_days, "Plateau detected");
            }
            Ok(analysis)
        })
        .await
    }

    /// Probability of reaching a goal by its target date. Goals linked to an
    /// exercise use that exercise's weekly 1RM progression as the rate.
    pub async fn goal_prediction(&self, actor: &Actor, goal_id: DbId) -> CoreResult<GoalPrediction> {
        validate_id(goal_id, "goal id")?;

        deadline::read("goal_prediction", async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            let goal = tx.get_goal(goal_id).await?;
            ensure_can_access(&mut *tx, actor, &goal.user_id).await?;

            let (weekly_rate_pct, data_points) = match goal.exercise_id {
                Some(exercise_id) => {
                    let since = now - Duration::days(DEFAULT_TIMEFRAME_DAYS);
                    let samples = max_samples(&mut *tx, &goal.user_id, exercise_id, since).await?;
                    let progression = analyze_progression(&samples, DEFAULT_TIMEFRAME_DAYS);
                    (progression.weekly_rate, progression.data_points)
                }
                None => (0.0, 0),
            };
            let history = training_history(&mut *tx, &goal.user_id, now).await?;
            tx.commit().await?;

            predict_goal(&GoalPredictionInput {
                current_value: goal.current_value,
                target_value: goal.target_value,
                days_available: (goal.target_date - now.date_naive()).num_days(),
                weekly_rate_pct,
                data_points,
                consistency: history.consistency,
            })
        })
        .await
    }

    /// Volume of a Monday-started week, compared with the week before.
    pub async fn weekly_volume(&self, actor: &Actor, user_id: &str, week_start: NaiveDate) -> CoreResult<WeeklyVolume> {
        validate_user_id(user_id)?;
        validate_week_start(week_start)?;

        deadline::read("weekly_volume", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;

            let mut groups = MuscleGroups::default();
            let current = volume_entries(&mut *tx, &mut groups, user_id, week_start).await?;
            let previous = volume_entries(&mut *tx, &mut groups, user_id, week_start - Duration::days(7)).await?;
            let previous_total: f64 = previous.iter().map(VolumeEntry::volume).sum();

            let targeted = match tx.get_active_plan(user_id).await? {
                Some(plan) => plan.metadata.muscle_groups,
                None => Vec::new(),
            };
            tx.commit().await?;

            let analysis = analyze_weekly_volume(
                week_start,
                &current,
                &targeted,
                (previous_total > 0.0).then_some(previous_total),
            );
            if let Some(warning) = &analysis.warning {
                tracing::warn!(user_id = %user_id, week_start = %week_start, "{warning}");
            }
            Ok(analysis)
        })
        .await
    }

    /// RPE and relative-intensity distribution over the last `days` days.
    pub async fn intensity(&self, actor: &Actor, user_id: &str, days: Option<i64>) -> CoreResult<IntensityAnalysis> {
        validate_user_id(user_id)?;
        let days = days.unwrap_or(DEFAULT_INTENSITY_DAYS);
        validate_int_range(days, 1, MAX_INTENSITY_DAYS, "days")?;

        deadline::read("intensity", async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let performances = tx
                .list_performances_between(user_id, now - Duration::days(days), now)
                .await?;
            let best: HashMap<DbId, f64> = tx
                .best_one_rep_maxes(user_id)
                .await?
                .into_iter()
                .map(|r| (r.exercise_id, r.estimated_max))
                .collect();
            tx.commit().await?;

            let entries: Vec<IntensityEntry> = performances
                .iter()
                .flat_map(|p| {
                    let one_rep_max = best.get(&p.exercise_id).copied();
                    p.sets.iter().map(move |set| IntensityEntry {
                        exercise_id: p.exercise_id,
                        weight: set.weight,
                        reps: set.reps,
                        rpe: set.rpe,
                        one_rep_max,
                    })
                })
                .collect();
            Ok(analyze_intensity(&entries))
        })
        .await
    }

    /// Weekly load recommendation from level preset, strength trend and
    /// recovery over the last week.
    pub async fn optimal_load(&self, actor: &Actor, user_id: &str) -> CoreResult<OptimalLoad> {
        validate_user_id(user_id)?;

        deadline::read("optimal_load", async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let level = training_level(&mut *tx, user_id).await?;
            let trend = overall_trend(&mut *tx, user_id, now).await?;
            let signals = recovery_signals(&mut *tx, user_id, now).await?;
            tx.commit().await?;

            let recovery = infer_recovery(&signals);
            tracing::debug!(user_id = %user_id, %level, ?trend, %recovery, "Load recommendation inputs");
            Ok(recommend_load(level, trend, recovery))
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Transaction-scoped helpers
// ---------------------------------------------------------------------------

/// Session count and 28-day consistency used to scale confidences.
pub(crate) async fn training_history(
    tx: &mut dyn Transaction,
    user_id: &str,
    now: Timestamp,
) -> CoreResult<TrainingHistory> {
    let completed = tx.count_completed_sessions(user_id).await?;
    let recent = tx
        .count_sessions_since(user_id, now - Duration::days(CONSISTENCY_WINDOW_DAYS))
        .await?;
    Ok(TrainingHistory {
        sessions_logged: u32::try_from(completed).unwrap_or(u32::MAX),
        consistency: consistency_score(recent.completed as u32, recent.skipped as u32),
    })
}

/// Store an estimate after checking it against the latest stored one.
///
/// Fails with `UnrealisticEstimate` outside `[prev * 0.85, prev * 1.25]`;
/// accepted drops are logged.
pub(crate) async fn record_one_rep_max(
    tx: &mut dyn Transaction,
    input: &NewOneRepMax,
) -> CoreResult<(OneRepMaxRecord, EstimateCheck)> {
    let previous = tx
        .latest_one_rep_max(&input.user_id, input.exercise_id)
        .await?
        .map(|r| r.estimated_max);
    let check = check_estimate_update(previous, input.estimated_max)?;
    if let EstimateCheck::AcceptedWithDrop { drop_pct } = check {
        tracing::warn!(
            user_id = %input.user_id,
            exercise_id = input.exercise_id,
            drop_pct = round2(drop_pct),
            "1RM estimate dropped"
        );
    }
    let record = tx.insert_one_rep_max(input).await?;
    Ok((record, check))
}

fn drop_warning(check: EstimateCheck) -> Option<String> {
    match check {
        EstimateCheck::Accepted => None,
        EstimateCheck::AcceptedWithDrop { drop_pct } => {
            Some(format!("estimate is {:.1}% below the previous one", drop_pct))
        }
    }
}

async fn max_samples(
    tx: &mut dyn Transaction,
    user_id: &str,
    exercise_id: DbId,
    since: Timestamp,
) -> CoreResult<Vec<MaxSample>> {
    Ok(tx
        .list_one_rep_maxes(user_id, exercise_id, since)
        .await?
        .iter()
        .map(|r| MaxSample {
            date: r.recorded_at.date_naive(),
            max: r.estimated_max,
        })
        .collect())
}

/// Muscle groups per exercise, fetched once per request.
#[derive(Default)]
struct MuscleGroups(HashMap<DbId, Vec<String>>);

impl MuscleGroups {
    async fn of(&mut self, tx: &mut dyn Transaction, exercise_id: DbId) -> CoreResult<Vec<String>> {
        if let Some(groups) = self.0.get(&exercise_id) {
            return Ok(groups.clone());
        }
        let groups = tx.get_exercise(exercise_id).await?.muscle_groups;
        self.0.insert(exercise_id, groups.clone());
        Ok(groups)
    }
}

/// One entry per performed set in the week starting `monday`.
async fn volume_entries(
    tx: &mut dyn Transaction,
    groups: &mut MuscleGroups,
    user_id: &str,
    monday: NaiveDate,
) -> CoreResult<Vec<VolumeEntry>> {
    let (from, to) = week_bounds(monday);
    let mut entries = Vec::new();
    for performance in tx.list_performances_between(user_id, from, to).await? {
        let muscle_groups = groups.of(tx, performance.exercise_id).await?;
        entries.extend(performance.sets.iter().map(|set| VolumeEntry {
            exercise_id: performance.exercise_id,
            muscle_groups: muscle_groups.clone(),
            sets: 1,
            reps: set.reps,
            weight: set.weight,
        }));
    }
    Ok(entries)
}

/// Profile level, else the active plan's level, else beginner.
async fn training_level(tx: &mut dyn Transaction, user_id: &str) -> CoreResult<FitnessLevel> {
    match tx.get_profile(user_id).await {
        Ok(profile) => return Ok(profile.level),
        Err(RepoError::NotFound { .. }) => {}
        Err(e) => return Err(e.into()),
    }
    Ok(match tx.get_active_plan(user_id).await? {
        Some(plan) => {
            let AlgorithmParameters::AdaptiveV1(params) = &plan.metadata.parameters;
            params.request.level
        }
        None => FitnessLevel::Beginner,
    })
}

/// Trend of the mean progression rate over every exercise with enough 1RM
/// history in the default timeframe.
async fn overall_trend(tx: &mut dyn Transaction, user_id: &str, now: Timestamp) -> CoreResult<Option<Trend>> {
    let since = now - Duration::days(DEFAULT_TIMEFRAME_DAYS);
    let exercises: BTreeSet<DbId> = tx
        .best_one_rep_maxes(user_id)
        .await?
        .iter()
        .map(|r| r.exercise_id)
        .collect();

    let mut rates = Vec::new();
    for exercise_id in exercises {
        let samples = max_samples(tx, user_id, exercise_id, since).await?;
        let progression = analyze_progression(&samples, DEFAULT_TIMEFRAME_DAYS);
        if progression.trend != Trend::InsufficientData {
            rates.push(progression.progression_rate);
        }
    }
    if rates.is_empty() {
        return Ok(None);
    }
    Ok(Some(Trend::from_rate(rates.iter().sum::<f64>() / rates.len() as f64)))
}

async fn recovery_signals(tx: &mut dyn Transaction, user_id: &str, now: Timestamp) -> CoreResult<RecoverySignals> {
    let sessions = tx.list_sessions(user_id, None, None, RECENT_SESSION_SCAN, 0).await?;
    let last_completed = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed)
        .map(|s| s.ended_at.unwrap_or(s.started_at))
        .max();

    let window_start = now - Duration::days(RECOVERY_WINDOW_DAYS);
    let rates: Vec<f64> = sessions
        .iter()
        .filter(|s| s.status == SessionStatus::Completed && s.started_at >= window_start)
        .filter_map(|s| s.completion_rate)
        .collect();

    let rpes: Vec<f64> = tx
        .list_performances_between(user_id, window_start, now)
        .await?
        .iter()
        .flat_map(|p| p.sets.iter().filter_map(|s| s.rpe))
        .collect();

    Ok(RecoverySignals {
        average_rpe: mean(&rpes),
        completion_rate: mean(&rates),
        days_since_last_session: last_completed.map(|at| (now - at).num_days()),
    })
}
