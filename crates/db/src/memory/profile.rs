use async_trait::async_trait;
use chrono::Utc;
use fitup_core::types::DbId;

use super::MemoryTransaction;
use crate::error::{OrNotFound, RepoResult};
use crate::models::exercise::{Exercise, ExerciseFilter};
use crate::models::profile::{UpsertProfile, WorkoutProfile};
use crate::repository::{ExerciseRepo, ProfileRepo};

#[async_trait]
impl ProfileRepo for MemoryTransaction {
    async fn get_profile(&mut self, user_id: &str) -> RepoResult<WorkoutProfile> {
        self.state()
            .profiles
            .get(user_id)
            .cloned()
            .or_not_found("WorkoutProfile", user_id)
    }

    async fn upsert_profile(&mut self, user_id: &str, input: &UpsertProfile) -> RepoResult<WorkoutProfile> {
        let now = Utc::now();
        let created_at = self
            .state()
            .profiles
            .get(user_id)
            .map_or(now, |p| p.created_at);
        let profile = WorkoutProfile {
            user_id: user_id.to_string(),
            level: input.level,
            primary_goal: input.primary_goal,
            weekly_frequency: input.weekly_frequency,
            time_per_workout: input.time_per_workout,
            equipment: input.equipment.clone(),
            limitations: input.limitations.clone(),
            created_at,
            updated_at: now,
        };
        self.state().profiles.insert(user_id.to_string(), profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl ExerciseRepo for MemoryTransaction {
    async fn list_exercises(&mut self, filter: &ExerciseFilter) -> RepoResult<Vec<Exercise>> {
        Ok(self
            .state()
            .exercises
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn get_exercise(&mut self, id: DbId) -> RepoResult<Exercise> {
        self.state().exercises.get(&id).cloned().or_not_found("Exercise", id)
    }
}
