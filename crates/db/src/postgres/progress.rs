use async_trait::async_trait;
use chrono::NaiveDate;
use fitup_core::types::{DbId, Timestamp};

use super::PgTransaction;
use crate::error::RepoResult;
use crate::models::progress::{NewOneRepMax, NewProgressLog, OneRepMaxRecord, ProgressLog};
use crate::repository::ProgressRepo;

const LOG_COLUMNS: &str = "\
    id, user_id, exercise_id, session_id, log_date, sets_completed, \
    reps_completed, weight_used, duration_seconds, created_at";

const ONE_REP_MAX_COLUMNS: &str = "\
    id, user_id, exercise_id, estimated_max, method, confidence, source_weight, \
    source_reps, source_rpe, source_session_id, recorded_at";

#[async_trait]
impl ProgressRepo for PgTransaction {
    async fn insert_progress_log(&mut self, input: &NewProgressLog) -> RepoResult<ProgressLog> {
        let query = format!(
            "INSERT INTO progress_logs \
                (user_id, exercise_id, session_id, log_date, sets_completed, \
                 reps_completed, weight_used, duration_seconds) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {LOG_COLUMNS}"
        );
        let log = sqlx::query_as::<_, ProgressLog>(&query)
            .bind(&input.user_id)
            .bind(input.exercise_id)
            .bind(input.session_id)
            .bind(input.log_date)
            .bind(input.sets_completed)
            .bind(input.reps_completed)
            .bind(input.weight_used)
            .bind(input.duration_seconds)
            .fetch_one(self.conn())
            .await?;
        Ok(log)
    }

    async fn list_progress_logs(
        &mut self,
        user_id: &str,
        exercise_id: Option<DbId>,
        since: Option<NaiveDate>,
    ) -> RepoResult<Vec<ProgressLog>> {
        let query = format!(
            "SELECT {LOG_COLUMNS} FROM progress_logs \
             WHERE user_id = $1 \
               AND ($2::BIGINT IS NULL OR exercise_id = $2) \
               AND ($3::DATE IS NULL OR log_date >= $3) \
             ORDER BY log_date, id"
        );
        let rows = sqlx::query_as::<_, ProgressLog>(&query)
            .bind(user_id)
            .bind(exercise_id)
            .bind(since)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn latest_one_rep_max(&mut self, user_id: &str, exercise_id: DbId) -> RepoResult<Option<OneRepMaxRecord>> {
        let query = format!(
            "SELECT {ONE_REP_MAX_COLUMNS} FROM one_rep_max_estimates \
             WHERE user_id = $1 AND exercise_id = $2 \
             ORDER BY recorded_at DESC, id DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, OneRepMaxRecord>(&query)
            .bind(user_id)
            .bind(exercise_id)
            .fetch_optional(self.conn())
            .await?;
        Ok(row)
    }

    async fn insert_one_rep_max(&mut self, input: &NewOneRepMax) -> RepoResult<OneRepMaxRecord> {
        let query = format!(
            "INSERT INTO one_rep_max_estimates \
                (user_id, exercise_id, estimated_max, method, confidence, source_weight, \
                 source_reps, source_rpe, source_session_id, recorded_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING {ONE_REP_MAX_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OneRepMaxRecord>(&query)
            .bind(&input.user_id)
            .bind(input.exercise_id)
            .bind(input.estimated_max)
            .bind(input.method.as_str())
            .bind(input.confidence)
            .bind(input.source_weight)
            .bind(input.source_reps)
            .bind(input.source_rpe)
            .bind(input.source_session_id)
            .bind(input.recorded_at)
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn list_one_rep_maxes(
        &mut self,
        user_id: &str,
        exercise_id: DbId,
        since: Timestamp,
    ) -> RepoResult<Vec<OneRepMaxRecord>> {
        let query = format!(
            "SELECT {ONE_REP_MAX_COLUMNS} FROM one_rep_max_estimates \
             WHERE user_id = $1 AND exercise_id = $2 AND recorded_at >= $3 \
             ORDER BY recorded_at, id"
        );
        let rows = sqlx::query_as::<_, OneRepMaxRecord>(&query)
            .bind(user_id)
            .bind(exercise_id)
            .bind(since)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn best_one_rep_maxes(&mut self, user_id: &str) -> RepoResult<Vec<OneRepMaxRecord>> {
        let query = format!(
            "SELECT DISTINCT ON (exercise_id) {ONE_REP_MAX_COLUMNS} FROM one_rep_max_estimates \
             WHERE user_id = $1 \
             ORDER BY exercise_id, estimated_max DESC, recorded_at DESC"
        );
        let rows = sqlx::query_as::<_, OneRepMaxRecord>(&query)
            .bind(user_id)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }
}
