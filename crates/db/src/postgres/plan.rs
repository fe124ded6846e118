use async_trait::async_trait;
use sqlx::types::Json;
use fitup_core::plan::PlanMetadata;
use fitup_core::types::DbId;

use super::PgTransaction;
use crate::error::{OrNotFound, RepoResult};
use crate::models::plan::{
    NewAdaptation, NewPerformanceRecord, NewPlan, PerformanceRecord, Plan, PlanAdaptation,
};
use crate::repository::PlanRepo;

/// Column list for `generated_plans` queries.
const PLAN_COLUMNS: &str = "\
    id, user_id, week_start, generated_at, algorithm, active, \
    regeneration_requested, regeneration_reason, metadata";

const RECORD_COLUMNS: &str = "\
    id, plan_id, session_id, completion_rate, average_rpe, skipped_count, recorded_at";

const ADAPTATION_COLUMNS: &str = "\
    id, plan_id, user_id, reason, diff_summary, changes, created_at";

#[async_trait]
impl PlanRepo for PgTransaction {
    async fn insert_plan(&mut self, input: &NewPlan) -> RepoResult<Plan> {
        let query = format!(
            "INSERT INTO generated_plans (user_id, week_start, algorithm, metadata) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {PLAN_COLUMNS}"
        );
        let plan = sqlx::query_as::<_, Plan>(&query)
            .bind(&input.user_id)
            .bind(input.week_start)
            .bind(&input.algorithm)
            .bind(Json(&input.metadata))
            .fetch_one(self.conn())
            .await?;
        Ok(plan)
    }

    async fn get_plan(&mut self, id: DbId) -> RepoResult<Plan> {
        let query = format!("SELECT {PLAN_COLUMNS} FROM generated_plans WHERE id = $1");
        sqlx::query_as::<_, Plan>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Plan", id)
    }

    async fn get_active_plan(&mut self, user_id: &str) -> RepoResult<Option<Plan>> {
        let query = format!("SELECT {PLAN_COLUMNS} FROM generated_plans WHERE user_id = $1 AND active");
        let plan = sqlx::query_as::<_, Plan>(&query)
            .bind(user_id)
            .fetch_optional(self.conn())
            .await?;
        Ok(plan)
    }

    async fn list_plans(&mut self, user_id: &str, limit: i64) -> RepoResult<Vec<Plan>> {
        let query = format!(
            "SELECT {PLAN_COLUMNS} FROM generated_plans WHERE user_id = $1 \
             ORDER BY generated_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, Plan>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn deactivate_plan(&mut self, id: DbId) -> RepoResult<Plan> {
        let query = format!("UPDATE generated_plans SET active = FALSE WHERE id = $1 RETURNING {PLAN_COLUMNS}");
        sqlx::query_as::<_, Plan>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Plan", id)
    }

    async fn flag_for_regeneration(&mut self, id: DbId, reason: &str) -> RepoResult<Plan> {
        let query = format!(
            "UPDATE generated_plans \
             SET regeneration_requested = TRUE, regeneration_reason = $2 \
             WHERE id = $1 RETURNING {PLAN_COLUMNS}"
        );
        sqlx::query_as::<_, Plan>(&query)
            .bind(id)
            .bind(reason)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Plan", id)
    }

    async fn update_plan_metadata(&mut self, id: DbId, metadata: &PlanMetadata) -> RepoResult<Plan> {
        let query = format!("UPDATE generated_plans SET metadata = $2 WHERE id = $1 RETURNING {PLAN_COLUMNS}");
        sqlx::query_as::<_, Plan>(&query)
            .bind(id)
            .bind(Json(metadata))
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Plan", id)
    }

    async fn insert_performance_record(&mut self, input: &NewPerformanceRecord) -> RepoResult<PerformanceRecord> {
        let query = format!(
            "INSERT INTO plan_performance_records \
                (plan_id, session_id, completion_rate, average_rpe, skipped_count) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {RECORD_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PerformanceRecord>(&query)
            .bind(input.plan_id)
            .bind(input.session_id)
            .bind(input.sample.completion_rate)
            .bind(input.sample.average_rpe)
            .bind(input.sample.skipped_count)
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn list_performance_records(
        &mut self,
        plan_id: DbId,
        limit: Option<i64>,
    ) -> RepoResult<Vec<PerformanceRecord>> {
        let query = format!(
            "SELECT {RECORD_COLUMNS} FROM plan_performance_records WHERE plan_id = $1 \
             ORDER BY recorded_at DESC, id DESC LIMIT $2"
        );
        // LIMIT NULL is LIMIT ALL.
        let rows = sqlx::query_as::<_, PerformanceRecord>(&query)
            .bind(plan_id)
            .bind(limit)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn insert_adaptation(&mut self, input: &NewAdaptation) -> RepoResult<PlanAdaptation> {
        let query = format!(
            "INSERT INTO plan_adaptations (plan_id, user_id, reason, diff_summary, changes) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {ADAPTATION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, PlanAdaptation>(&query)
            .bind(input.plan_id)
            .bind(&input.user_id)
            .bind(&input.reason)
            .bind(&input.diff_summary)
            .bind(Json(&input.changes))
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn list_adaptations(&mut self, plan_id: DbId) -> RepoResult<Vec<PlanAdaptation>> {
        let query = format!(
            "SELECT {ADAPTATION_COLUMNS} FROM plan_adaptations WHERE plan_id = $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, PlanAdaptation>(&query)
            .bind(plan_id)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn list_user_adaptations(&mut self, user_id: &str, limit: i64) -> RepoResult<Vec<PlanAdaptation>> {
        let query = format!(
            "SELECT {ADAPTATION_COLUMNS} FROM plan_adaptations WHERE user_id = $1 \
             ORDER BY created_at DESC, id DESC LIMIT $2"
        );
        let rows = sqlx::query_as::<_, PlanAdaptation>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }
}
