use std::sync::Arc;

use chrono::Utc;
use fitup_core::error::{CoreError, CoreResult};
use fitup_core::types::DbId;
use fitup_core::validation::{validate_id, validate_text_length, validate_user_id};
use fitup_db::models::goal::{Goal, NewGoal};
use fitup_db::{ExerciseRepo, GoalRepo, Repository, Transaction};

use crate::access::{ensure_can_access, Actor};
use crate::deadline;

const MAX_DESCRIPTION_LEN: usize = 500;

/// Fitness goals. Predictions live in the analytics service.
pub struct GoalService {
    repo: Arc<dyn Repository>,
}

impl GoalService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    /// Create a goal for `input.user_id`.
    ///
    /// Targets must be positive, the target date in the future, and a linked
    /// exercise must exist in the catalog.
    pub async fn create(&self, actor: &Actor, input: NewGoal) -> CoreResult<Goal> {
        validate_user_id(&input.user_id)?;
        validate_values(input.current_value, input.target_value)?;
        if input.target_date <= Utc::now().date_naive() {
            return Err(CoreError::Validation("target date must be in the future".into()));
        }
        if let Some(description) = &input.description {
            validate_text_length(description, 0, MAX_DESCRIPTION_LEN, "description")?;
        }

        deadline::write("create_goal", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, &input.user_id).await?;
            if let Some(exercise_id) = input.exercise_id {
                tx.get_exercise(exercise_id).await?;
            }
            let goal = tx.insert_goal(&input).await?;
            tx.commit().await?;
            tracing::info!(goal_id = goal.id, user_id = %goal.user_id, goal_type = %goal.goal_type, "Goal created");
            Ok(goal)
        })
        .await
    }

    pub async fn list(&self, actor: &Actor, user_id: &str, active_only: bool) -> CoreResult<Vec<Goal>> {
        validate_user_id(user_id)?;
        deadline::read("list_goals", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let goals = tx.list_goals(user_id, active_only).await?;
            tx.commit().await?;
            Ok(goals)
        })
        .await
    }

    pub async fn update_progress(&self, actor: &Actor, goal_id: DbId, current_value: f64) -> CoreResult<Goal> {
        validate_id(goal_id, "goal id")?;
        if !current_value.is_finite() || current_value < 0.0 {
            return Err(CoreError::Validation("current value must be zero or positive".into()));
        }
        deadline::write("update_goal_progress", async {
            let mut tx = self.repo.begin().await?;
            let goal = open_goal(&mut *tx, actor, goal_id).await?;
            let goal = tx.update_goal_progress(goal.id, current_value).await?;
            tx.commit().await?;
            Ok(goal)
        })
        .await
    }

    /// Mark a goal reached. Completing it twice is a conflict.
    pub async fn complete(&self, actor: &Actor, goal_id: DbId) -> CoreResult<Goal> {
        validate_id(goal_id, "goal id")?;
        deadline::write("complete_goal", async {
            let mut tx = self.repo.begin().await?;
            let goal = open_goal(&mut *tx, actor, goal_id).await?;
            let goal = tx.complete_goal(goal.id, Utc::now()).await?;
            tx.commit().await?;
            tracing::info!(goal_id = goal.id, user_id = %goal.user_id, "Goal completed");
            Ok(goal)
        })
        .await
    }
}

fn validate_values(current: f64, target: f64) -> CoreResult<()> {
    if !target.is_finite() || target <= 0.0 {
        return Err(CoreError::Validation("target value must be positive".into()));
    }
    if !current.is_finite() || current < 0.0 {
        return Err(CoreError::Validation("current value must be zero or positive".into()));
    }
    Ok(())
}

async fn open_goal(tx: &mut dyn Transaction, actor: &Actor, goal_id: DbId) -> CoreResult<Goal> {
    let goal = tx.get_goal(goal_id).await?;
    ensure_can_access(tx, actor, &goal.user_id).await?;
    if goal.completed {
        return Err(CoreError::Conflict("goal is already completed".into()));
    }
    Ok(goal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_must_be_sensible() {
        assert!(validate_values(0.0, 100.0).is_ok());
        assert!(validate_values(50.0, 0.0).is_err());
        assert!(validate_values(-1.0, 100.0).is_err());
        assert!(validate_values(f64::NAN, 100.0).is_err());
    }
}
