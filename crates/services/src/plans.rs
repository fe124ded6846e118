//! Plan generation, tracking, regeneration and adaptation.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use fitup_core::error::{CoreError, CoreResult};
use fitup_core::plan::adaptation::{self, AdaptationDecision, PrescriptionChange};
use fitup_core::plan::metadata::{AlgorithmParameters, ExerciseMax};
use fitup_core::plan::{effectiveness, generate_plan, Effectiveness, PerformanceSample, PlanRequest};
use fitup_core::types::{DbId, Timestamp};
use fitup_core::validation::{clamp_limit, validate_id, validate_text_length, validate_user_id};
use fitup_core::week::week_start;
use fitup_db::models::exercise::{Exercise, ExerciseFilter};
use fitup_db::models::plan::{NewAdaptation, NewPerformanceRecord, NewPlan, PerformanceRecord, Plan, PlanAdaptation};
use fitup_db::models::schedule::{NewWorkoutExercise, WeeklySchema, Workout, WorkoutExercise};
use fitup_db::{ExerciseRepo, PlanRepo, ProgressRepo, Repository, ScheduleRepo, Transaction};
use serde::{Deserialize, Serialize};

use crate::access::{ensure_can_access, Actor};
use crate::pdf::PlanRenderer;
use crate::{conflict_as, deadline};

const ACTIVE_PLAN_EXISTS: &str = "user already has an active plan";
const MAX_REASON_LEN: usize = 500;

/// A manually logged adaptation (coach adjustments outside the automatic rules).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AdaptationLog {
    pub reason: String,
    pub diff_summary: String,
    #[serde(default)]
    pub changes: Vec<PrescriptionChange>,
}

/// The active weekly schema with its workouts, in day order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Schedule {
    pub schema: WeeklySchema,
    pub workouts: Vec<ScheduledWorkout>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScheduledWorkout {
    #[serde(flatten)]
    pub workout: Workout,
    pub exercises: Vec<WorkoutExercise>,
}

pub struct PlanService {
    repo: Arc<dyn Repository>,
    renderer: Arc<dyn PlanRenderer>,
}

impl PlanService {
    pub fn new(repo: Arc<dyn Repository>, renderer: Arc<dyn PlanRenderer>) -> Self {
        Self { repo, renderer }
    }

    /// Generate and persist a plan for `user_id`.
    ///
    /// Fails with `Conflict` while the user has an active plan, unless that
    /// plan was flagged for regeneration; it is then replaced in the same
    /// transaction.
    pub async fn create_plan(&self, actor: &Actor, user_id: &str, request: PlanRequest) -> CoreResult<Plan> {
        validate_user_id(user_id)?;
        request.validate()?;

        deadline::write("create_plan", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let plan = generate_into(&mut *tx, user_id, request, Utc::now()).await?;
            tx.commit().await?;
            tracing::info!(plan_id = plan.id, user_id = %user_id, template = %plan.metadata.template, "Plan generated");
            Ok(plan)
        })
        .await
    }

    pub async fn get_active_plan(&self, actor: &Actor, user_id: &str) -> CoreResult<Plan> {
        validate_user_id(user_id)?;
        deadline::read("get_active_plan", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let plan = tx
                .get_active_plan(user_id)
                .await?
                .ok_or_else(|| CoreError::not_found("active plan", user_id))?;
            tx.commit().await?;
            Ok(plan)
        })
        .await
    }

    /// The user's active schedule; sessions are started against its workouts.
    pub async fn active_schedule(&self, actor: &Actor, user_id: &str) -> CoreResult<Schedule> {
        validate_user_id(user_id)?;
        deadline::read("active_schedule", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let schema = tx
                .get_active_schema(user_id)
                .await?
                .ok_or_else(|| CoreError::not_found("active schedule", user_id))?;
            let mut workouts = Vec::new();
            for workout in tx.list_workouts(schema.id).await? {
                let exercises = tx.list_workout_exercises(workout.id).await?;
                workouts.push(ScheduledWorkout { workout, exercises });
            }
            tx.commit().await?;
            Ok(Schedule { schema, workouts })
        })
        .await
    }

    pub async fn history(&self, actor: &Actor, user_id: &str, limit: Option<i64>) -> CoreResult<Vec<Plan>> {
        validate_user_id(user_id)?;
        let limit = clamp_limit(limit);
        deadline::read("plan_history", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let plans = tx.list_plans(user_id, limit).await?;
            tx.commit().await?;
            Ok(plans)
        })
        .await
    }

    pub async fn track_performance(
        &self,
        actor: &Actor,
        plan_id: DbId,
        sample: PerformanceSample,
    ) -> CoreResult<PerformanceRecord> {
        validate_id(plan_id, "plan id")?;
        sample.validate()?;

        deadline::write("track_performance", async {
            let mut tx = self.repo.begin().await?;
            let plan = accessible_plan(&mut *tx, actor, plan_id).await?;
            let record = tx
                .insert_performance_record(&NewPerformanceRecord {
                    plan_id: plan.id,
                    session_id: None,
                    sample,
                })
                .await?;
            tx.commit().await?;
            Ok(record)
        })
        .await
    }

    pub async fn effectiveness(&self, actor: &Actor, plan_id: DbId) -> CoreResult<Effectiveness> {
        validate_id(plan_id, "plan id")?;
        deadline::read("plan_effectiveness", async {
            let mut tx = self.repo.begin().await?;
            accessible_plan(&mut *tx, actor, plan_id).await?;
            let samples: Vec<PerformanceSample> = tx
                .list_performance_records(plan_id, None)
                .await?
                .iter()
                .map(PerformanceRecord::sample)
                .collect();
            tx.commit().await?;
            Ok(effectiveness(&samples))
        })
        .await
    }

    /// Flag the plan so the next `create_plan` replaces it.
    pub async fn mark_for_regeneration(&self, actor: &Actor, plan_id: DbId, reason: &str) -> CoreResult<Plan> {
        validate_id(plan_id, "plan id")?;
        validate_text_length(reason, 1, MAX_REASON_LEN, "reason")?;

        deadline::write("mark_for_regeneration", async {
            let mut tx = self.repo.begin().await?;
            let plan = accessible_plan(&mut *tx, actor, plan_id).await?;
            ensure_plan_active(&plan)?;
            let plan = tx.flag_for_regeneration(plan.id, reason).await?;
            tx.commit().await?;
            tracing::info!(plan_id, reason = %reason, "Plan flagged for regeneration");
            Ok(plan)
        })
        .await
    }

    /// Flag the plan and generate its replacement from the stored request in
    /// one transaction. Stored 1RM figures are refreshed from history.
    pub async fn regenerate(&self, actor: &Actor, plan_id: DbId, reason: &str) -> CoreResult<Plan> {
        validate_id(plan_id, "plan id")?;
        validate_text_length(reason, 1, MAX_REASON_LEN, "reason")?;

        deadline::write("regenerate_plan", async {
            let mut tx = self.repo.begin().await?;
            let plan = accessible_plan(&mut *tx, actor, plan_id).await?;
            ensure_plan_active(&plan)?;
            tx.flag_for_regeneration(plan.id, reason).await?;

            let AlgorithmParameters::AdaptiveV1(params) = &plan.metadata.parameters;
            let mut request = params.request.clone();
            request.one_rep_maxes.clear();

            let replacement = generate_into(&mut *tx, &plan.user_id, request, Utc::now()).await?;
            tx.commit().await?;
            tracing::info!(
                plan_id,
                replacement_id = replacement.id,
                user_id = %plan.user_id,
                reason = %reason,
                "Plan regenerated"
            );
            Ok(replacement)
        })
        .await
    }

    pub async fn log_adaptation(&self, actor: &Actor, plan_id: DbId, log: AdaptationLog) -> CoreResult<PlanAdaptation> {
        validate_id(plan_id, "plan id")?;
        validate_text_length(&log.reason, 1, MAX_REASON_LEN, "reason")?;
        validate_text_length(&log.diff_summary, 1, 2000, "diff summary")?;

        deadline::write("log_adaptation", async {
            let mut tx = self.repo.begin().await?;
            let plan = accessible_plan(&mut *tx, actor, plan_id).await?;
            let record = tx
                .insert_adaptation(&NewAdaptation {
                    plan_id: plan.id,
                    user_id: plan.user_id.clone(),
                    reason: log.reason,
                    diff_summary: log.diff_summary,
                    changes: log.changes,
                })
                .await?;
            tx.commit().await?;
            Ok(record)
        })
        .await
    }

    pub async fn adaptations(&self, actor: &Actor, plan_id: DbId) -> CoreResult<Vec<PlanAdaptation>> {
        validate_id(plan_id, "plan id")?;
        deadline::read("plan_adaptations", async {
            let mut tx = self.repo.begin().await?;
            accessible_plan(&mut *tx, actor, plan_id).await?;
            let records = tx.list_adaptations(plan_id).await?;
            tx.commit().await?;
            Ok(records)
        })
        .await
    }

    /// Adaptation history across all of a user's plans, newest first.
    pub async fn user_adaptations(
        &self,
        actor: &Actor,
        user_id: &str,
        limit: Option<i64>,
    ) -> CoreResult<Vec<PlanAdaptation>> {
        validate_user_id(user_id)?;
        let limit = clamp_limit(limit);
        deadline::read("user_adaptations", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let records = tx.list_user_adaptations(user_id, limit).await?;
            tx.commit().await?;
            Ok(records)
        })
        .await
    }

    /// Render the plan as a PDF document.
    pub async fn export_pdf(&self, actor: &Actor, plan_id: DbId) -> CoreResult<Vec<u8>> {
        validate_id(plan_id, "plan id")?;
        deadline::export("export_plan_pdf", async {
            let plan = {
                let mut tx = self.repo.begin().await?;
                let plan = accessible_plan(&mut *tx, actor, plan_id).await?;
                tx.commit().await?;
                plan
            };
            self.renderer.render(&plan).await.map_err(|e| {
                tracing::error!(plan_id, error = %e, "PDF rendering failed");
                CoreError::Infrastructure(e.to_string())
            })
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Transaction-scoped helpers
// ---------------------------------------------------------------------------

async fn accessible_plan(tx: &mut dyn Transaction, actor: &Actor, plan_id: DbId) -> CoreResult<Plan> {
    let plan = tx.get_plan(plan_id).await?;
    ensure_can_access(tx, actor, &plan.user_id).await?;
    Ok(plan)
}

fn ensure_plan_active(plan: &Plan) -> CoreResult<()> {
    if !plan.active {
        return Err(CoreError::Conflict(format!("plan {} is no longer active", plan.id)));
    }
    Ok(())
}

/// Generate a plan and its weekly schema inside `tx`.
pub(crate) async fn generate_into(
    tx: &mut dyn Transaction,
    user_id: &str,
    mut request: PlanRequest,
    now: Timestamp,
) -> CoreResult<Plan> {
    if let Some(active) = tx.get_active_plan(user_id).await? {
        if !active.regeneration_requested {
            return Err(CoreError::Conflict(ACTIVE_PLAN_EXISTS.into()));
        }
        tx.deactivate_plan(active.id).await?;
        tracing::debug!(plan_id = active.id, user_id = %user_id, "Replacing plan flagged for regeneration");
    }
    tx.deactivate_schemas(user_id).await?;

    if request.one_rep_maxes.is_empty() {
        request.one_rep_maxes = tx
            .best_one_rep_maxes(user_id)
            .await?
            .into_iter()
            .map(|r| ExerciseMax {
                exercise_id: r.exercise_id,
                one_rep_max: r.estimated_max,
            })
            .collect();
    }

    let catalog: Vec<_> = tx
        .list_exercises(&ExerciseFilter::default())
        .await?
        .iter()
        .map(Exercise::to_candidate)
        .collect();
    let metadata = generate_plan(&request, &catalog)?;

    let plan = tx
        .insert_plan(&NewPlan {
            user_id: user_id.to_string(),
            week_start: week_start(now.date_naive()),
            algorithm: metadata.parameters.algorithm().to_string(),
            metadata,
        })
        .await
        .map_err(conflict_as(ACTIVE_PLAN_EXISTS))?;

    let schema = tx.create_schema(user_id, Some(plan.id), plan.week_start).await?;
    for day in plan.metadata.workout_days() {
        let workout = tx.create_workout(schema.id, day.day_of_week, &day.focus).await?;
        for exercise in &day.exercises {
            tx.add_workout_exercise(
                workout.id,
                &NewWorkoutExercise {
                    exercise_id: exercise.exercise_id,
                    sets: exercise.sets,
                    reps: exercise.reps.clone(),
                    rest_seconds: exercise.rest_seconds,
                    order_index: exercise.order_index,
                },
            )
            .await?;
        }
    }
    Ok(plan)
}

/// Record a completed session's performance against its plan and adapt the
/// plan when the recent window calls for it.
pub(crate) async fn adapt_after_session(
    tx: &mut dyn Transaction,
    plan: &Plan,
    session_id: DbId,
    sample: PerformanceSample,
    week: NaiveDate,
) -> CoreResult<Option<PlanAdaptation>> {
    tx.insert_performance_record(&NewPerformanceRecord {
        plan_id: plan.id,
        session_id: Some(session_id),
        sample,
    })
    .await?;

    let recent: Vec<PerformanceSample> = tx
        .list_performance_records(plan.id, Some(adaptation::WINDOW as i64))
        .await?
        .iter()
        .map(PerformanceRecord::sample)
        .collect();

    match adaptation::decide(&plan.metadata, &recent, week) {
        Some(decision) => apply_decision(tx, plan, decision, week).await.map(Some),
        None => Ok(None),
    }
}

/// Downscale the plan when skips in the trailing window form a pattern.
pub(crate) async fn adapt_after_skips(
    tx: &mut dyn Transaction,
    plan: &Plan,
    skips_in_window: usize,
    week: NaiveDate,
) -> CoreResult<Option<PlanAdaptation>> {
    match adaptation::decide_on_skips(&plan.metadata, skips_in_window, week) {
        Some(decision) => apply_decision(tx, plan, decision, week).await.map(Some),
        None => Ok(None),
    }
}

async fn apply_decision(
    tx: &mut dyn Transaction,
    plan: &Plan,
    decision: AdaptationDecision,
    week: NaiveDate,
) -> CoreResult<PlanAdaptation> {
    let mut metadata = plan.metadata.clone();
    let applied = adaptation::apply(&mut metadata, decision, week);
    let updated = tx.update_plan_metadata(plan.id, &metadata).await?;
    sync_schema_sets(tx, &updated).await?;

    let record = tx
        .insert_adaptation(&NewAdaptation {
            plan_id: plan.id,
            user_id: plan.user_id.clone(),
            reason: applied.reason,
            diff_summary: applied.diff_summary,
            changes: applied.changes,
        })
        .await?;
    tracing::info!(
        plan_id = plan.id,
        user_id = %plan.user_id,
        reason = %record.reason,
        changes = record.changes.len(),
        "Plan adapted"
    );
    Ok(record)
}

/// Mirror prescribed set counts from the plan metadata onto the plan's
/// active weekly schema.
async fn sync_schema_sets(tx: &mut dyn Transaction, plan: &Plan) -> CoreResult<()> {
    let Some(schema) = tx
        .get_active_schema(&plan.user_id)
        .await?
        .filter(|s| s.plan_id == Some(plan.id))
    else {
        return Ok(());
    };

    for workout in tx.list_workouts(schema.id).await? {
        let Some(day) = plan
            .metadata
            .workout_days()
            .find(|d| d.day_of_week == workout.day_of_week)
        else {
            continue;
        };
        for row in tx.list_workout_exercises(workout.id).await? {
            let planned = day
                .exercises
                .iter()
                .find(|e| e.order_index == row.order_index && e.exercise_id == row.exercise_id);
            if let Some(planned) = planned.filter(|p| p.sets != row.sets) {
                tx.update_workout_exercise_sets(row.id, planned.sets).await?;
            }
        }
    }
    Ok(())
}
