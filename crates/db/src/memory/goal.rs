use async_trait::async_trait;
use chrono::Utc;
use fitup_core::types::{DbId, Timestamp};

use super::MemoryTransaction;
use crate::error::{OrNotFound, RepoResult};
use crate::models::goal::{Goal, NewGoal};
use crate::repository::GoalRepo;

#[async_trait]
impl GoalRepo for MemoryTransaction {
    async fn insert_goal(&mut self, input: &NewGoal) -> RepoResult<Goal> {
        let state = self.state();
        let now = Utc::now();
        let goal = Goal {
            id: state.next_id("fitness_goals"),
            user_id: input.user_id.clone(),
            goal_type: input.goal_type,
            exercise_id: input.exercise_id,
            description: input.description.clone(),
            current_value: input.current_value,
            target_value: input.target_value,
            target_date: input.target_date,
            active: true,
            completed: false,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        state.goals.insert(goal.id, goal.clone());
        Ok(goal)
    }

    async fn get_goal(&mut self, id: DbId) -> RepoResult<Goal> {
        self.state().goals.get(&id).cloned().or_not_found("Goal", id)
    }

    async fn list_goals(&mut self, user_id: &str, active_only: bool) -> RepoResult<Vec<Goal>> {
        let mut rows: Vec<Goal> = self
            .state()
            .goals
            .values()
            .filter(|g| g.user_id == user_id && (!active_only || g.active))
            .cloned()
            .collect();
        rows.sort_by_key(|g| (g.target_date, g.id));
        Ok(rows)
    }

    async fn update_goal_progress(&mut self, id: DbId, current_value: f64) -> RepoResult<Goal> {
        let goal = self.state().goals.get_mut(&id).or_not_found("Goal", id)?;
        goal.current_value = current_value;
        goal.updated_at = Utc::now();
        Ok(goal.clone())
    }

    async fn complete_goal(&mut self, id: DbId, at: Timestamp) -> RepoResult<Goal> {
        let goal = self.state().goals.get_mut(&id).or_not_found("Goal", id)?;
        goal.completed = true;
        goal.active = false;
        goal.completed_at = Some(at);
        goal.updated_at = Utc::now();
        Ok(goal.clone())
    }
}
