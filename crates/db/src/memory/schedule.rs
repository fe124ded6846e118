use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use fitup_core::types::DbId;

use super::{conflict, MemoryTransaction};
use crate::error::{OrNotFound, RepoError, RepoResult};
use crate::models::schedule::{NewWorkoutExercise, WeeklySchema, Workout, WorkoutExercise};
use crate::repository::ScheduleRepo;

#[async_trait]
impl ScheduleRepo for MemoryTransaction {
    async fn create_schema(
        &mut self,
        user_id: &str,
        plan_id: Option<DbId>,
        week_start: NaiveDate,
    ) -> RepoResult<WeeklySchema> {
        let state = self.state();
        if state.schemas.values().any(|s| s.user_id == user_id && s.active) {
            return Err(conflict("uq_weekly_schemas_active_user"));
        }
        let schema = WeeklySchema {
            id: state.next_id("weekly_schemas"),
            user_id: user_id.to_string(),
            plan_id,
            week_start,
            active: true,
            created_at: Utc::now(),
        };
        state.schemas.insert(schema.id, schema.clone());
        Ok(schema)
    }

    async fn deactivate_schemas(&mut self, user_id: &str) -> RepoResult<u64> {
        let mut touched = 0;
        for schema in self.state().schemas.values_mut() {
            if schema.user_id == user_id && schema.active {
                schema.active = false;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn get_active_schema(&mut self, user_id: &str) -> RepoResult<Option<WeeklySchema>> {
        Ok(self
            .state()
            .schemas
            .values()
            .find(|s| s.user_id == user_id && s.active)
            .cloned())
    }

    async fn get_schema(&mut self, id: DbId) -> RepoResult<WeeklySchema> {
        self.state().schemas.get(&id).cloned().or_not_found("WeeklySchema", id)
    }

    async fn delete_schema(&mut self, id: DbId) -> RepoResult<()> {
        let state = self.state();
        if state.schemas.remove(&id).is_none() {
            return Err(RepoError::not_found("WeeklySchema", id));
        }
        let workout_ids: Vec<DbId> = state
            .workouts
            .values()
            .filter(|w| w.schema_id == id)
            .map(|w| w.id)
            .collect();
        state.workouts.retain(|_, w| w.schema_id != id);
        state
            .workout_exercises
            .retain(|_, we| !workout_ids.contains(&we.workout_id));
        for session in state.sessions.values_mut() {
            if session.workout_id.is_some_and(|w| workout_ids.contains(&w)) {
                session.workout_id = None;
            }
        }
        Ok(())
    }

    async fn create_workout(&mut self, schema_id: DbId, day_of_week: i16, focus: &str) -> RepoResult<Workout> {
        let state = self.state();
        if !state.schemas.contains_key(&schema_id) {
            return Err(RepoError::not_found("WeeklySchema", schema_id));
        }
        if state
            .workouts
            .values()
            .any(|w| w.schema_id == schema_id && w.day_of_week == day_of_week)
        {
            return Err(conflict("uq_workouts_schema_day"));
        }
        let workout = Workout {
            id: state.next_id("workouts"),
            schema_id,
            day_of_week,
            focus: focus.to_string(),
        };
        state.workouts.insert(workout.id, workout.clone());
        Ok(workout)
    }

    async fn get_workout(&mut self, id: DbId) -> RepoResult<Workout> {
        self.state().workouts.get(&id).cloned().or_not_found("Workout", id)
    }

    async fn list_workouts(&mut self, schema_id: DbId) -> RepoResult<Vec<Workout>> {
        let mut rows: Vec<Workout> = self
            .state()
            .workouts
            .values()
            .filter(|w| w.schema_id == schema_id)
            .cloned()
            .collect();
        rows.sort_by_key(|w| w.day_of_week);
        Ok(rows)
    }

    async fn add_workout_exercise(
        &mut self,
        workout_id: DbId,
        input: &NewWorkoutExercise,
    ) -> RepoResult<WorkoutExercise> {
        let state = self.state();
        if !state.workouts.contains_key(&workout_id) {
            return Err(RepoError::not_found("Workout", workout_id));
        }
        if state
            .workout_exercises
            .values()
            .any(|we| we.workout_id == workout_id && we.order_index == input.order_index)
        {
            return Err(conflict("uq_workout_exercises_order"));
        }
        let row = WorkoutExercise {
            id: state.next_id("workout_exercises"),
            workout_id,
            exercise_id: input.exercise_id,
            sets: input.sets,
            reps: input.reps.clone(),
            rest_seconds: input.rest_seconds,
            order_index: input.order_index,
        };
        state.workout_exercises.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_workout_exercises(&mut self, workout_id: DbId) -> RepoResult<Vec<WorkoutExercise>> {
        let mut rows: Vec<WorkoutExercise> = self
            .state()
            .workout_exercises
            .values()
            .filter(|we| we.workout_id == workout_id)
            .cloned()
            .collect();
        rows.sort_by_key(|we| we.order_index);
        Ok(rows)
    }

    async fn update_workout_exercise_sets(&mut self, id: DbId, sets: i16) -> RepoResult<WorkoutExercise> {
        let row = self
            .state()
            .workout_exercises
            .get_mut(&id)
            .or_not_found("WorkoutExercise", id)?;
        row.sets = sets;
        Ok(row.clone())
    }
}
