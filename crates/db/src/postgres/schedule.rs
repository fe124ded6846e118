use async_trait::async_trait;
use chrono::NaiveDate;
use fitup_core::types::DbId;

use super::PgTransaction;
use crate::error::{OrNotFound, RepoError, RepoResult};
use crate::models::schedule::{NewWorkoutExercise, WeeklySchema, Workout, WorkoutExercise};
use crate::repository::ScheduleRepo;

const SCHEMA_COLUMNS: &str = "id, user_id, plan_id, week_start, active, created_at";

const WORKOUT_COLUMNS: &str = "id, schema_id, day_of_week, focus";

const WORKOUT_EXERCISE_COLUMNS: &str = "\
    id, workout_id, exercise_id, sets, reps, rest_seconds, order_index";

#[async_trait]
impl ScheduleRepo for PgTransaction {
    async fn create_schema(
        &mut self,
        user_id: &str,
        plan_id: Option<DbId>,
        week_start: NaiveDate,
    ) -> RepoResult<WeeklySchema> {
        let query = format!(
            "INSERT INTO weekly_schemas (user_id, plan_id, week_start) \
             VALUES ($1, $2, $3) \
             RETURNING {SCHEMA_COLUMNS}"
        );
        let schema = sqlx::query_as::<_, WeeklySchema>(&query)
            .bind(user_id)
            .bind(plan_id)
            .bind(week_start)
            .fetch_one(self.conn())
            .await?;
        Ok(schema)
    }

    async fn deactivate_schemas(&mut self, user_id: &str) -> RepoResult<u64> {
        let result = sqlx::query("UPDATE weekly_schemas SET active = FALSE WHERE user_id = $1 AND active")
            .bind(user_id)
            .execute(self.conn())
            .await?;
        Ok(result.rows_affected())
    }

    async fn get_active_schema(&mut self, user_id: &str) -> RepoResult<Option<WeeklySchema>> {
        let query = format!("SELECT {SCHEMA_COLUMNS} FROM weekly_schemas WHERE user_id = $1 AND active");
        let schema = sqlx::query_as::<_, WeeklySchema>(&query)
            .bind(user_id)
            .fetch_optional(self.conn())
            .await?;
        Ok(schema)
    }

    async fn get_schema(&mut self, id: DbId) -> RepoResult<WeeklySchema> {
        let query = format!("SELECT {SCHEMA_COLUMNS} FROM weekly_schemas WHERE id = $1");
        sqlx::query_as::<_, WeeklySchema>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("WeeklySchema", id)
    }

    async fn delete_schema(&mut self, id: DbId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM weekly_schemas WHERE id = $1")
            .bind(id)
            .execute(self.conn())
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::not_found("WeeklySchema", id));
        }
        Ok(())
    }

    async fn create_workout(&mut self, schema_id: DbId, day_of_week: i16, focus: &str) -> RepoResult<Workout> {
        let query = format!(
            "INSERT INTO workouts (schema_id, day_of_week, focus) \
             VALUES ($1, $2, $3) \
             RETURNING {WORKOUT_COLUMNS}"
        );
        let workout = sqlx::query_as::<_, Workout>(&query)
            .bind(schema_id)
            .bind(day_of_week)
            .bind(focus)
            .fetch_one(self.conn())
            .await?;
        Ok(workout)
    }

    async fn get_workout(&mut self, id: DbId) -> RepoResult<Workout> {
        let query = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE id = $1");
        sqlx::query_as::<_, Workout>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Workout", id)
    }

    async fn list_workouts(&mut self, schema_id: DbId) -> RepoResult<Vec<Workout>> {
        let query = format!("SELECT {WORKOUT_COLUMNS} FROM workouts WHERE schema_id = $1 ORDER BY day_of_week");
        let rows = sqlx::query_as::<_, Workout>(&query)
            .bind(schema_id)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn add_workout_exercise(
        &mut self,
        workout_id: DbId,
        input: &NewWorkoutExercise,
    ) -> RepoResult<WorkoutExercise> {
        let query = format!(
            "INSERT INTO workout_exercises \
                (workout_id, exercise_id, sets, reps, rest_seconds, order_index) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {WORKOUT_EXERCISE_COLUMNS}"
        );
        let row = sqlx::query_as::<_, WorkoutExercise>(&query)
            .bind(workout_id)
            .bind(input.exercise_id)
            .bind(input.sets)
            .bind(&input.reps)
            .bind(input.rest_seconds)
            .bind(input.order_index)
            .fetch_one(self.conn())
            .await?;
        Ok(row)
    }

    async fn list_workout_exercises(&mut self, workout_id: DbId) -> RepoResult<Vec<WorkoutExercise>> {
        let query = format!(
            "SELECT {WORKOUT_EXERCISE_COLUMNS} FROM workout_exercises \
             WHERE workout_id = $1 ORDER BY order_index"
        );
        let rows = sqlx::query_as::<_, WorkoutExercise>(&query)
            .bind(workout_id)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn update_workout_exercise_sets(&mut self, id: DbId, sets: i16) -> RepoResult<WorkoutExercise> {
        let query = format!(
            "UPDATE workout_exercises SET sets = $2 WHERE id = $1 \
             RETURNING {WORKOUT_EXERCISE_COLUMNS}"
        );
        sqlx::query_as::<_, WorkoutExercise>(&query)
            .bind(id)
            .bind(sets)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("WorkoutExercise", id)
    }
}
