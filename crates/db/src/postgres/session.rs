use async_trait::async_trait;
use sqlx::types::Json;
use fitup_core::session::{best_set, total_volume, SessionStatus, SessionSummary, SetRecord};
use fitup_core::types::{DbId, Timestamp};

use super::PgTransaction;
use crate::error::{OrNotFound, RepoResult};
use crate::models::session::{ExercisePerformance, NewSession, SessionCounts, WorkoutSession};
use crate::repository::SessionRepo;

/// Column list for `workout_sessions` queries.
const SESSION_COLUMNS: &str = "\
    id, user_id, workout_id, plan_id, status, started_at, ended_at, \
    summary, skip_reason, completion_rate";

/// Column list for `exercise_performances` queries.
const PERFORMANCE_COLUMNS: &str = "\
    id, session_id, exercise_id, sets, sets_completed, best_set, total_volume, updated_at";

/// Same columns, qualified for joins against `workout_sessions`.
const PERFORMANCE_COLUMNS_EP: &str = "\
    ep.id, ep.session_id, ep.exercise_id, ep.sets, ep.sets_completed, \
    ep.best_set, ep.total_volume, ep.updated_at";

#[async_trait]
impl SessionRepo for PgTransaction {
    async fn create_session(&mut self, input: &NewSession) -> RepoResult<WorkoutSession> {
        let query = format!(
            "INSERT INTO workout_sessions \
                (user_id, workout_id, plan_id, status, started_at, ended_at, skip_reason) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {SESSION_COLUMNS}"
        );
        let session = sqlx::query_as::<_, WorkoutSession>(&query)
            .bind(&input.user_id)
            .bind(input.workout_id)
            .bind(input.plan_id)
            .bind(input.status.as_str())
            .bind(input.started_at)
            .bind(input.ended_at)
            .bind(input.skip_reason.as_deref())
            .fetch_one(self.conn())
            .await?;
        Ok(session)
    }

    async fn get_session(&mut self, id: DbId) -> RepoResult<WorkoutSession> {
        let query = format!("SELECT {SESSION_COLUMNS} FROM workout_sessions WHERE id = $1");
        sqlx::query_as::<_, WorkoutSession>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("WorkoutSession", id)
    }

    async fn find_active_session(&mut self, user_id: &str) -> RepoResult<Option<WorkoutSession>> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions \
             WHERE user_id = $1 AND status = $2"
        );
        let session = sqlx::query_as::<_, WorkoutSession>(&query)
            .bind(user_id)
            .bind(SessionStatus::Active.as_str())
            .fetch_optional(self.conn())
            .await?;
        Ok(session)
    }

    async fn complete_session(
        &mut self,
        id: DbId,
        ended_at: Timestamp,
        summary: &SessionSummary,
        completion_rate: f64,
    ) -> RepoResult<WorkoutSession> {
        let query = format!(
            "UPDATE workout_sessions \
             SET status = $2, ended_at = $3, summary = $4, completion_rate = $5 \
             WHERE id = $1 \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, WorkoutSession>(&query)
            .bind(id)
            .bind(SessionStatus::Completed.as_str())
            .bind(ended_at)
            .bind(Json(summary))
            .bind(completion_rate)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("WorkoutSession", id)
    }

    async fn mark_session_stale(&mut self, id: DbId) -> RepoResult<WorkoutSession> {
        let query = format!(
            "UPDATE workout_sessions SET status = $2 WHERE id = $1 \
             RETURNING {SESSION_COLUMNS}"
        );
        sqlx::query_as::<_, WorkoutSession>(&query)
            .bind(id)
            .bind(SessionStatus::Stale.as_str())
            .fetch_optional(self.conn())
            .await?
            .or_not_found("WorkoutSession", id)
    }

    async fn list_sessions(
        &mut self,
        user_id: &str,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<WorkoutSession>> {
        let query = format!(
            "SELECT {SESSION_COLUMNS} FROM workout_sessions \
             WHERE user_id = $1 \
               AND ($2::TIMESTAMPTZ IS NULL OR started_at >= $2) \
               AND ($3::TIMESTAMPTZ IS NULL OR started_at < $3) \
             ORDER BY started_at DESC, id DESC \
             LIMIT $4 OFFSET $5"
        );
        let rows = sqlx::query_as::<_, WorkoutSession>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .bind(limit)
            .bind(offset)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn count_sessions_since(&mut self, user_id: &str, since: Timestamp) -> RepoResult<SessionCounts> {
        let (completed, skipped) = sqlx::query_as::<_, (i64, i64)>(
            "SELECT \
                COUNT(*) FILTER (WHERE status = 'completed'), \
                COUNT(*) FILTER (WHERE status = 'skipped') \
             FROM workout_sessions \
             WHERE user_id = $1 AND started_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_one(self.conn())
        .await?;
        Ok(SessionCounts { completed, skipped })
    }

    async fn count_completed_sessions(&mut self, user_id: &str) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM workout_sessions WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_one(self.conn())
        .await?;
        Ok(count)
    }

    async fn get_exercise_performance(
        &mut self,
        session_id: DbId,
        exercise_id: DbId,
    ) -> RepoResult<Option<ExercisePerformance>> {
        let query = format!(
            "SELECT {PERFORMANCE_COLUMNS} FROM exercise_performances \
             WHERE session_id = $1 AND exercise_id = $2"
        );
        let row = sqlx::query_as::<_, ExercisePerformance>(&query)
            .bind(session_id)
            .bind(exercise_id)
            .fetch_optional(self.conn())
            .await?;
        Ok(row)
    }

    async fn save_exercise_performance(
        &mut self,
        session_id: DbId,
        exercise_id: DbId,
        sets: &[SetRecord],
    ) -> RepoResult<ExercisePerformance> {
        let query = format!(
            "INSERT INTO exercise_performances \
                (session_id, exercise_id, sets, sets_completed, best_set, total_volume) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (session_id, exercise_id) DO UPDATE SET \
                sets = EXCLUDED.sets, \
                sets_completed = EXCLUDED.sets_completed, \
                best_set = EXCLUDED.best_set, \
                total_volume = EXCLUDED.total_volume, \
                updated_at = NOW() \
             RETURNING {PERFORMANCE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ExercisePerformance>(&query)
            .bind(session_id)
            .bind(exercise_id)
            .bind(Json(sets))
            .bind(sets.len() as i32)
            .bind(Json(best_set(sets)))
            .bind(total_volume(sets))
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn list_exercise_performances(&mut self, session_id: DbId) -> RepoResult<Vec<ExercisePerformance>> {
        let query = format!(
            "SELECT {PERFORMANCE_COLUMNS} FROM exercise_performances \
             WHERE session_id = $1 ORDER BY id"
        );
        let rows = sqlx::query_as::<_, ExercisePerformance>(&query)
            .bind(session_id)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn list_performances_between(
        &mut self,
        user_id: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> RepoResult<Vec<ExercisePerformance>> {
        let query = format!(
            "SELECT {PERFORMANCE_COLUMNS_EP} \
             FROM exercise_performances ep \
             JOIN workout_sessions s ON s.id = ep.session_id \
             WHERE s.user_id = $1 AND s.status = 'completed' \
               AND s.started_at >= $2 AND s.started_at < $3 \
             ORDER BY s.started_at, ep.id"
        );
        let rows = sqlx::query_as::<_, ExercisePerformance>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }
}
