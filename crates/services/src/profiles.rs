use std::sync::Arc;

use fitup_core::error::CoreResult;
use fitup_core::types::DbId;
use fitup_core::validation::validate_user_id;
use fitup_db::models::exercise::{Exercise, ExerciseFilter};
use fitup_db::models::profile::{UpsertProfile, WorkoutProfile};
use fitup_db::{ExerciseRepo, ProfileRepo, Repository};

use crate::access::{ensure_can_access, Actor};
use crate::deadline;

/// Workout profiles and the exercise catalog.
pub struct ProfileService {
    repo: Arc<dyn Repository>,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self { repo }
    }

    pub async fn get(&self, actor: &Actor, user_id: &str) -> CoreResult<WorkoutProfile> {
        validate_user_id(user_id)?;
        deadline::read("get_profile", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let profile = tx.get_profile(user_id).await?;
            tx.commit().await?;
            Ok(profile)
        })
        .await
    }

    /// Create or replace a profile.
    pub async fn upsert(&self, actor: &Actor, user_id: &str, input: UpsertProfile) -> CoreResult<WorkoutProfile> {
        validate_user_id(user_id)?;
        input.validate()?;
        deadline::write("upsert_profile", async {
            let mut tx = self.repo.begin().await?;
            ensure_can_access(&mut *tx, actor, user_id).await?;
            let profile = tx.upsert_profile(user_id, &input).await?;
            tx.commit().await?;
            tracing::info!(user_id, level = %profile.level, goal = %profile.primary_goal, "Profile saved");
            Ok(profile)
        })
        .await
    }

    pub async fn list_exercises(&self, filter: &ExerciseFilter) -> CoreResult<Vec<Exercise>> {
        deadline::read("list_exercises", async {
            let mut tx = self.repo.begin().await?;
            let exercises = tx.list_exercises(filter).await?;
            tx.commit().await?;
            Ok(exercises)
        })
        .await
    }

    pub async fn get_exercise(&self, exercise_id: DbId) -> CoreResult<Exercise> {
        deadline::read("get_exercise", async {
            let mut tx = self.repo.begin().await?;
            let exercise = tx.get_exercise(exercise_id).await?;
            tx.commit().await?;
            Ok(exercise)
        })
        .await
    }
}
