//! Workout session lifecycle and progress tracking.
//!
//! `active -> {completed, skipped, stale}`. Completing a session writes the
//! progress logs, refreshes 1RM estimates and feeds the plan's adaptation in
//! the same transaction.

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use fitup_core::error::{CoreError, CoreResult};
use fitup_core::one_rep_max::{adjust_confidence, estimate, round2};
use fitup_core::plan::adaptation::SKIP_WINDOW_DAYS;
use fitup_core::plan::PerformanceSample;
use fitup_core::session::{
    best_set, completion_rate, ensure_active, form_warning, is_stale, session_metrics, validate_sets, weekly_stats,
    SessionDigest, SessionMetrics, SessionStatus, SessionSummary, SetRecord, WeeklySessionStats, MAX_SKIP_REASON_LEN,
};
use fitup_core::types::{DbId, Timestamp};
use fitup_core::validation::{clamp_limit, clamp_offset, validate_id, validate_text_length, validate_user_id};
use fitup_core::week::{validate_week_start, week_bounds, week_start};
use fitup_db::models::plan::PlanAdaptation;
use fitup_db::models::progress::{NewOneRepMax, NewProgressLog, OneRepMaxRecord};
use fitup_db::models::schedule::Workout;
use fitup_db::models::session::{ExercisePerformance, NewSession, WorkoutSession};
use fitup_db::{ExerciseRepo, PlanRepo, ProgressRepo, Repository, ScheduleRepo, SessionRepo, Transaction};
use fitup_events::bus::event_types;
use fitup_events::{DomainEvent, EventBus};
use serde::Serialize;
use serde_json::json;

use crate::access::{ensure_can_access, Actor};
use crate::analytics::{record_one_rep_max, training_history};
use crate::locks::KeyedLocks;
use crate::plans::{adapt_after_session, adapt_after_skips};
use crate::{conflict_as, deadline};

const ACTIVE_SESSION_EXISTS: &str = "user already has an active session";
/// Upper bound on sessions considered for one week's stats.
const WEEK_SESSION_LIMIT: i64 = 200;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletedSession {
    pub session: WorkoutSession,
    pub metrics: SessionMetrics,
    pub one_rep_max_updates: Vec<OneRepMaxRecord>,
    pub adaptation: Option<PlanAdaptation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedWorkout {
    pub session: WorkoutSession,
    pub skips_in_window: usize,
    pub adaptation: Option<PlanAdaptation>,
}

pub struct SessionService {
    repo: Arc<dyn Repository>,
    bus: Arc<EventBus>,
    /// Serializes set logging per session.
    session_locks: KeyedLocks<DbId>,
}

impl SessionService {
    pub fn new(repo: Arc<dyn Repository>, bus: Arc<EventBus>) -> Self {
        Self {
            repo,
            bus,
            session_locks: KeyedLocks::new(),
        }
    }

    /// Open a session, optionally for a scheduled workout. An active session
    /// older than 24 hours is promoted to `stale` first.
    pub async fn start_session(&self, actor: &Actor, workout_id: Option<DbId>) -> CoreResult<WorkoutSession> {
        if let Some(id) = workout_id {
            validate_id(id, "workout id")?;
        }

        deadline::write("start_session", async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            if let Some(open) = tx.find_active_session(&actor.user_id).await? {
                if !is_stale(open.started_at, now) {
                    return Err(CoreError::Conflict(ACTIVE_SESSION_EXISTS.into()));
                }
                tx.mark_session_stale(open.id).await?;
                tracing::info!(session_id = open.id, user_id = %actor.user_id, "Stale session closed");
            }

            let plan_id = match workout_id {
                Some(id) => owned_workout(&mut *tx, actor, id).await?.1,
                None => tx.get_active_plan(&actor.user_id).await?.map(|p| p.id),
            };
            let session = tx
                .create_session(&NewSession {
                    user_id: actor.user_id.clone(),
                    workout_id,
                    plan_id,
                    status: SessionStatus::Active,
                    started_at: now,
                    ended_at: None,
                    skip_reason: None,
                })
                .await
                .map_err(conflict_as(ACTIVE_SESSION_EXISTS))?;
            tx.commit().await?;
            tracing::info!(session_id = session.id, user_id = %actor.user_id, ?workout_id, "Session started");
            Ok(session)
        })
        .await
    }

    /// Append set records for one exercise. Calls for the same session are
    /// serialized; the combined sets must stay valid.
    pub async fn log_exercise(
        &self,
        actor: &Actor,
        session_id: DbId,
        exercise_id: DbId,
        sets: Vec<SetRecord>,
    ) -> CoreResult<ExercisePerformance> {
        validate_id(session_id, "session id")?;
        validate_id(exercise_id, "exercise id")?;
        validate_sets(&sets)?;

        let _guard = self.session_locks.acquire(session_id).await;

        let performance = deadline::write("log_exercise", async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            let session = owned_session(&mut *tx, actor, session_id).await?;
            ensure_active(session.status, session.id)?;
            if is_stale(session.started_at, now) {
                tx.mark_session_stale(session.id).await?;
                tx.commit().await?;
                return Err(CoreError::Conflict(format!("session {session_id} went stale")));
            }
            tx.get_exercise(exercise_id).await?;

            let mut combined = tx
                .get_exercise_performance(session_id, exercise_id)
                .await?
                .map(|p| p.sets)
                .unwrap_or_default();
            combined.extend_from_slice(&sets);
            validate_sets(&combined)?;

            let performance = tx.save_exercise_performance(session_id, exercise_id, &combined).await?;
            tx.commit().await?;
            Ok(performance)
        })
        .await?;

        if let Some(rpe) = form_warning(&sets) {
            tracing::warn!(session_id, exercise_id, user_id = %actor.user_id, rpe, "RPE above 9, check form");
        }
        Ok(performance)
    }

    /// Complete an active session.
    ///
    /// Writes one progress log per exercise, stores new 1RM estimates from
    /// each exercise's best set (estimates failing the sanity gate are
    /// skipped), and records the session against its plan, which may adapt.
    pub async fn complete_session(
        &self,
        actor: &Actor,
        session_id: DbId,
        summary: SessionSummary,
    ) -> CoreResult<CompletedSession> {
        validate_id(session_id, "session id")?;
        summary.validate()?;

        let completed = {
            let _guard = self.session_locks.acquire(session_id).await;
            deadline::write("complete_session", self.complete_in_tx(actor, session_id, summary)).await?
        };

        self.bus.publish(
            DomainEvent::new(event_types::SESSION_COMPLETED)
                .with_source("workout_session", session_id)
                .with_actor(actor.user_id.clone())
                .with_payload(json!({
                    "completion_rate": completed.session.completion_rate,
                    "total_volume": completed.metrics.total_volume,
                })),
        );
        if let Some(adaptation) = &completed.adaptation {
            publish_adaptation(&self.bus, adaptation);
        }
        Ok(completed)
    }

    async fn complete_in_tx(
        &self,
        actor: &Actor,
        session_id: DbId,
        summary: SessionSummary,
    ) -> CoreResult<CompletedSession> {
        let now = Utc::now();
        let mut tx = self.repo.begin().await?;
        let session = owned_session(&mut *tx, actor, session_id).await?;
        ensure_active(session.status, session.id)?;

        let performances = tx.list_exercise_performances(session_id).await?;
        let performed: Vec<(DbId, Vec<SetRecord>)> =
            performances.iter().map(|p| (p.exercise_id, p.sets.clone())).collect();

        let rate = match summary.completion_rate {
            Some(rate) => rate,
            None => computed_completion(&mut *tx, &session, &performances).await?,
        };
        let session = tx.complete_session(session_id, now, &summary, rate).await?;
        let metrics = session_metrics(session.started_at, session.ended_at, &performed);

        for performance in &performances {
            tx.insert_progress_log(&progress_log(&session, performance, now.date_naive()))
                .await?;
        }

        let history = training_history(&mut *tx, &session.user_id, now).await?;
        let mut one_rep_max_updates = Vec::new();
        for performance in &performances {
            let Some(best) = best_set(&performance.sets).filter(|s| s.weight > 0.0) else {
                continue;
            };
            let estimate = match estimate(best.weight, best.reps as u32, best.rpe) {
                Ok(estimate) => estimate,
                Err(e) => {
                    tracing::debug!(session_id, exercise_id = performance.exercise_id, error = %e, "Best set not estimable");
                    continue;
                }
            };
            let input = NewOneRepMax {
                user_id: session.user_id.clone(),
                exercise_id: performance.exercise_id,
                estimated_max: estimate.estimated_max,
                method: estimate.method,
                confidence: round2(adjust_confidence(estimate.confidence, &history)),
                source_weight: best.weight,
                source_reps: best.reps,
                source_rpe: best.rpe,
                source_session_id: Some(session_id),
                recorded_at: now,
            };
            match record_one_rep_max(&mut *tx, &input).await {
                Ok((record, _)) => one_rep_max_updates.push(record),
                Err(CoreError::UnrealisticEstimate { previous, proposed }) => {
                    tracing::warn!(
                        session_id,
                        exercise_id = performance.exercise_id,
                        previous,
                        proposed,
                        "Unrealistic 1RM estimate not stored"
                    );
                }
                Err(e) => return Err(e),
            }
        }

        let adaptation = match session.plan_id {
            Some(plan_id) => {
                let plan = tx.get_plan(plan_id).await?;
                if plan.active {
                    let sample = PerformanceSample {
                        completion_rate: rate,
                        average_rpe: metrics.average_rpe.or(summary.perceived_effort),
                        skipped_count: 0,
                    };
                    adapt_after_session(&mut *tx, &plan, session_id, sample, week_start(now.date_naive())).await?
                } else {
                    None
                }
            }
            None => None,
        };

        tx.commit().await?;
        tracing::info!(
            session_id,
            user_id = %session.user_id,
            completion_rate = rate,
            adapted = adaptation.is_some(),
            "Session completed"
        );
        Ok(CompletedSession {
            session,
            metrics,
            one_rep_max_updates,
            adaptation,
        })
    }

    /// Record a skipped workout. Three or more skips in 14 days downscale
    /// the active plan.
    pub async fn skip_workout(&self, actor: &Actor, workout_id: DbId, reason: &str) -> CoreResult<SkippedWorkout> {
        validate_id(workout_id, "workout id")?;
        validate_text_length(reason, 1, MAX_SKIP_REASON_LEN, "skip reason")?;

        let skipped = deadline::write("skip_workout", async {
            let now = Utc::now();
            let mut tx = self.repo.begin().await?;
            let (_, plan_id) = owned_workout(&mut *tx, actor, workout_id).await?;
            let session = tx
                .create_session(&NewSession {
                    user_id: actor.user_id.clone(),
                    workout_id: Some(workout_id),
                    plan_id,
                    status: SessionStatus::Skipped,
                    started_at: now,
                    ended_at: Some(now),
                    skip_reason: Some(reason.trim().to_string()),
                })
                .await?;

            let skips_in_window = tx
                .count_sessions_since(&actor.user_id, now - Duration::days(SKIP_WINDOW_DAYS))
                .await?
                .skipped as usize;

            let adaptation = match tx.get_active_plan(&actor.user_id).await? {
                Some(plan) => adapt_after_skips(&mut *tx, &plan, skips_in_window, week_start(now.date_naive())).await?,
                None => None,
            };
            tx.commit().await?;
            tracing::info!(
                session_id = session.id,
                user_id = %actor.user_id,
                workout_id,
                skips_in_window,
                "Workout skipped"
            );
            Ok(SkippedWorkout {
                session,
                skips_in_window,
                adaptation,
            })
        })
        .await?;

        if let Some(adaptation) = &skipped.adaptation {
            publish_adaptation(&self.bus, adaptation);
        }
        Ok(skipped)
    }

    /// The actor's open session, or `None`. A session open longer than 24
    /// hours is marked `stale` on read.
    pub async fn get_active_session(&self, actor: &Actor) -> CoreResult<Option<WorkoutSession>> {
        deadline::write("get_active_session", async {
            let mut tx = self.repo.begin().await?;
            let Some(session) = tx.find_active_session(&actor.user_id).await? else {
                return Ok(None);
            };
            if is_stale(session.started_at, Utc::now()) {
                tx.mark_session_stale(session.id).await?;
                tx.commit().await?;
                tracing::info!(session_id = session.id, user_id = %actor.user_id, "Stale session closed on read");
                return Ok(None);
            }
            Ok(Some(session))
        })
        .await
    }

    pub async fn history(
        &self,
        actor: &Actor,
        user_id: &str,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> CoreResult<Vec<WorkoutSession>> {
        validate_user_id(user_id)?;
        if let (Some(from), Some(to)) = (from, to) {
            if from >= to {
                return Err(CoreError::Validation("'from' must be before 'to'".into()));
            }
        }
        let (limit, offset) = (clamp_limit(limit), clamp_offset(offset));

        deadline::read("session_history", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let sessions = tx.list_sessions(user_id, from, to, limit, offset).await?;
            tx.commit().await?;
            Ok(sessions)
        })
        .await
    }

    pub async fn metrics(&self, actor: &Actor, session_id: DbId) -> CoreResult<SessionMetrics> {
        validate_id(session_id, "session id")?;
        deadline::read("session_metrics", async {
            let mut tx = self.repo.begin().await?;
            let session = tx.get_session(session_id).await?;
            ensure_can_access(&mut *tx, actor, &session.user_id).await?;
            let performed: Vec<(DbId, Vec<SetRecord>)> = tx
                .list_exercise_performances(session_id)
                .await?
                .into_iter()
                .map(|p| (p.exercise_id, p.sets))
                .collect();
            tx.commit().await?;
            Ok(session_metrics(session.started_at, session.ended_at, &performed))
        })
        .await
    }

    pub async fn weekly_stats(
        &self,
        actor: &Actor,
        user_id: &str,
        week_start: NaiveDate,
    ) -> CoreResult<WeeklySessionStats> {
        validate_user_id(user_id)?;
        validate_week_start(week_start)?;

        deadline::read("weekly_session_stats", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let (from, to) = week_bounds(week_start);
            let sessions = tx
                .list_sessions(user_id, Some(from), Some(to), WEEK_SESSION_LIMIT, 0)
                .await?;

            let mut digests = Vec::with_capacity(sessions.len());
            for session in &sessions {
                let total_volume = tx
                    .list_exercise_performances(session.id)
                    .await?
                    .iter()
                    .map(|p| p.total_volume)
                    .sum();
                digests.push(SessionDigest {
                    status: session.status,
                    started_at: session.started_at,
                    total_volume,
                    completion_rate: session.completion_rate,
                });
            }
            tx.commit().await?;
            Ok(weekly_stats(week_start, &digests))
        })
        .await
    }

    /// Sessions with a logging or completion call in flight.
    pub fn sessions_in_flight(&self) -> usize {
        self.session_locks.len()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn owned_session(tx: &mut dyn Transaction, actor: &Actor, session_id: DbId) -> CoreResult<WorkoutSession> {
    let session = tx.get_session(session_id).await?;
    if session.user_id != actor.user_id {
        return Err(CoreError::Forbidden(format!("session {session_id} belongs to another user")));
    }
    Ok(session)
}

/// The workout with the plan its schema belongs to, if the actor owns it.
async fn owned_workout(
    tx: &mut dyn Transaction,
    actor: &Actor,
    workout_id: DbId,
) -> CoreResult<(Workout, Option<DbId>)> {
    let workout = tx.get_workout(workout_id).await?;
    let schema = tx.get_schema(workout.schema_id).await?;
    if schema.user_id != actor.user_id {
        return Err(CoreError::Forbidden(format!("workout {workout_id} belongs to another user")));
    }
    Ok((workout, schema.plan_id))
}

/// Performed over prescribed sets, each exercise capped at its prescription.
/// Sessions without a workout count as complete once anything was logged.
async fn computed_completion(
    tx: &mut dyn Transaction,
    session: &WorkoutSession,
    performances: &[ExercisePerformance],
) -> CoreResult<f64> {
    let Some(workout_id) = session.workout_id else {
        return Ok(if performances.is_empty() { 0.0 } else { 1.0 });
    };
    let prescribed = tx.list_workout_exercises(workout_id).await?;
    let total: i64 = prescribed.iter().map(|e| i64::from(e.sets)).sum();
    let performed: i64 = prescribed
        .iter()
        .map(|e| {
            let done = performances
                .iter()
                .find(|p| p.exercise_id == e.exercise_id)
                .map_or(0, |p| p.sets.len() as i64);
            done.min(i64::from(e.sets))
        })
        .sum();
    Ok(completion_rate(performed, total))
}

fn progress_log(session: &WorkoutSession, performance: &ExercisePerformance, date: NaiveDate) -> NewProgressLog {
    NewProgressLog {
        user_id: session.user_id.clone(),
        exercise_id: performance.exercise_id,
        session_id: Some(session.id),
        log_date: date,
        sets_completed: performance.sets.len() as i32,
        reps_completed: performance.sets.iter().map(|s| s.reps).sum(),
        weight_used: performance.best_set.map_or(0.0, |s| s.weight),
        duration_seconds: None,
    }
}

fn publish_adaptation(bus: &EventBus, adaptation: &PlanAdaptation) {
    bus.publish(
        DomainEvent::new(event_types::PLAN_ADAPTED)
            .with_source("plan", adaptation.plan_id)
            .with_actor(adaptation.user_id.clone())
            .with_payload(json!({
                "adaptation_id": adaptation.id,
                "reason": adaptation.reason,
                "diff_summary": adaptation.diff_summary,
            })),
    );
}
