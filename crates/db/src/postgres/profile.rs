use async_trait::async_trait;
use sqlx::types::Json;
use fitup_core::types::DbId;

use super::PgTransaction;
use crate::error::{OrNotFound, RepoResult};
use crate::models::exercise::{Exercise, ExerciseFilter};
use crate::models::profile::{UpsertProfile, WorkoutProfile};
use crate::repository::{ExerciseRepo, ProfileRepo};

/// Column list for `workout_profiles` queries.
const PROFILE_COLUMNS: &str = "\
    user_id, level, primary_goal, weekly_frequency, time_per_workout, \
    equipment, limitations, created_at, updated_at";

/// Column list for `exercises` queries.
const EXERCISE_COLUMNS: &str = "\
    id, name, muscle_groups, difficulty, equipment, exercise_type, movement, \
    stressed_joints, default_sets, default_reps, rest_seconds";

#[async_trait]
impl ProfileRepo for PgTransaction {
    async fn get_profile(&mut self, user_id: &str) -> RepoResult<WorkoutProfile> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM workout_profiles WHERE user_id = $1");
        sqlx::query_as::<_, WorkoutProfile>(&query)
            .bind(user_id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("WorkoutProfile", user_id)
    }

    async fn upsert_profile(&mut self, user_id: &str, input: &UpsertProfile) -> RepoResult<WorkoutProfile> {
        let query = format!(
            "INSERT INTO workout_profiles \
                (user_id, level, primary_goal, weekly_frequency, time_per_workout, equipment, limitations) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (user_id) DO UPDATE SET \
                level = EXCLUDED.level, \
                primary_goal = EXCLUDED.primary_goal, \
                weekly_frequency = EXCLUDED.weekly_frequency, \
                time_per_workout = EXCLUDED.time_per_workout, \
                equipment = EXCLUDED.equipment, \
                limitations = EXCLUDED.limitations, \
                updated_at = NOW() \
             RETURNING {PROFILE_COLUMNS}"
        );
        let profile = sqlx::query_as::<_, WorkoutProfile>(&query)
            .bind(user_id)
            .bind(input.level.as_str())
            .bind(input.primary_goal.as_str())
            .bind(input.weekly_frequency)
            .bind(input.time_per_workout)
            .bind(Json(&input.equipment))
            .bind(Json(&input.limitations))
            .fetch_one(self.conn())
            .await?;
        Ok(profile)
    }
}

#[async_trait]
impl ExerciseRepo for PgTransaction {
    async fn list_exercises(&mut self, filter: &ExerciseFilter) -> RepoResult<Vec<Exercise>> {
        let query = format!(
            "SELECT {EXERCISE_COLUMNS} FROM exercises \
             WHERE ($1::TEXT IS NULL OR $1 = ANY(muscle_groups)) \
               AND ($2::TEXT IS NULL OR equipment = $2) \
               AND ($3::TEXT IS NULL OR difficulty = $3) \
               AND ($4::TEXT IS NULL OR exercise_type = $4) \
             ORDER BY id"
        );
        let rows = sqlx::query_as::<_, Exercise>(&query)
            .bind(filter.muscle_group.as_deref())
            .bind(filter.equipment.map(|e| e.as_str()))
            .bind(filter.difficulty.map(|d| d.as_str()))
            .bind(filter.exercise_type.map(|t| t.as_str()))
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn get_exercise(&mut self, id: DbId) -> RepoResult<Exercise> {
        let query = format!("SELECT {EXERCISE_COLUMNS} FROM exercises WHERE id = $1");
        sqlx::query_as::<_, Exercise>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Exercise", id)
    }
}
