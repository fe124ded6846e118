use async_trait::async_trait;
use fitup_core::types::{DbId, Timestamp};

use super::PgTransaction;
use crate::error::{OrNotFound, RepoResult};
use crate::models::goal::{Goal, NewGoal};
use crate::repository::GoalRepo;

const GOAL_COLUMNS: &str = "\
    id, user_id, goal_type, exercise_id, description, current_value, target_value, \
    target_date, active, completed, created_at, updated_at, completed_at";

#[async_trait]
impl GoalRepo for PgTransaction {
    async fn insert_goal(&mut self, input: &NewGoal) -> RepoResult<Goal> {
        let query = format!(
            "INSERT INTO fitness_goals \
                (user_id, goal_type, exercise_id, description, current_value, target_value, target_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {GOAL_COLUMNS}"
        );
        let goal = sqlx::query_as::<_, Goal>(&query)
            .bind(&input.user_id)
            .bind(input.goal_type.as_str())
            .bind(input.exercise_id)
            .bind(input.description.as_deref())
            .bind(input.current_value)
            .bind(input.target_value)
            .bind(input.target_date)
            .fetch_one(self.conn())
            .await?;
        Ok(goal)
    }

    async fn get_goal(&mut self, id: DbId) -> RepoResult<Goal> {
        let query = format!("SELECT {GOAL_COLUMNS} FROM fitness_goals WHERE id = $1");
        sqlx::query_as::<_, Goal>(&query)
            .bind(id)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Goal", id)
    }

    async fn list_goals(&mut self, user_id: &str, active_only: bool) -> RepoResult<Vec<Goal>> {
        let query = format!(
            "SELECT {GOAL_COLUMNS} FROM fitness_goals \
             WHERE user_id = $1 AND (NOT $2 OR active) \
             ORDER BY target_date, id"
        );
        let rows = sqlx::query_as::<_, Goal>(&query)
            .bind(user_id)
            .bind(active_only)
            .fetch_all(self.conn())
            .await?;
        Ok(rows)
    }

    async fn update_goal_progress(&mut self, id: DbId, current_value: f64) -> RepoResult<Goal> {
        let query = format!(
            "UPDATE fitness_goals SET current_value = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {GOAL_COLUMNS}"
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(id)
            .bind(current_value)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Goal", id)
    }

    async fn complete_goal(&mut self, id: DbId, at: Timestamp) -> RepoResult<Goal> {
        let query = format!(
            "UPDATE fitness_goals \
             SET completed = TRUE, active = FALSE, completed_at = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {GOAL_COLUMNS}"
        );
        sqlx::query_as::<_, Goal>(&query)
            .bind(id)
            .bind(at)
            .fetch_optional(self.conn())
            .await?
            .or_not_found("Goal", id)
    }
}
