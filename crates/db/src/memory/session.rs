use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use fitup_core::session::{best_set, total_volume, SessionStatus, SessionSummary, SetRecord};
use fitup_core::types::{DbId, Timestamp};

use super::{conflict, page, MemoryTransaction};
use crate::error::{OrNotFound, RepoResult};
use crate::models::session::{ExercisePerformance, NewSession, SessionCounts, WorkoutSession};
use crate::repository::SessionRepo;

#[async_trait]
impl SessionRepo for MemoryTransaction {
    async fn create_session(&mut self, input: &NewSession) -> RepoResult<WorkoutSession> {
        let state = self.state();
        if input.status == SessionStatus::Active
            && state
                .sessions
                .values()
                .any(|s| s.user_id == input.user_id && s.status == SessionStatus::Active)
        {
            return Err(conflict("uq_workout_sessions_active_user"));
        }
        let session = WorkoutSession {
            id: state.next_id("workout_sessions"),
            user_id: input.user_id.clone(),
            workout_id: input.workout_id,
            plan_id: input.plan_id,
            status: input.status,
            started_at: input.started_at,
            ended_at: input.ended_at,
            summary: SessionSummary::default(),
            skip_reason: input.skip_reason.clone(),
            completion_rate: None,
        };
        state.sessions.insert(session.id, session.clone());
        Ok(session)
    }

    async fn get_session(&mut self, id: DbId) -> RepoResult<WorkoutSession> {
        self.state().sessions.get(&id).cloned().or_not_found("WorkoutSession", id)
    }

    async fn find_active_session(&mut self, user_id: &str) -> RepoResult<Option<WorkoutSession>> {
        Ok(self
            .state()
            .sessions
            .values()
            .find(|s| s.user_id == user_id && s.status == SessionStatus::Active)
            .cloned())
    }

    async fn complete_session(
        &mut self,
        id: DbId,
        ended_at: Timestamp,
        summary: &SessionSummary,
        completion_rate: f64,
    ) -> RepoResult<WorkoutSession> {
        let session = self
            .state()
            .sessions
            .get_mut(&id)
            .or_not_found("WorkoutSession", id)?;
        session.status = SessionStatus::Completed;
        session.ended_at = Some(ended_at);
        session.summary = summary.clone();
        session.completion_rate = Some(completion_rate);
        Ok(session.clone())
    }

    async fn mark_session_stale(&mut self, id: DbId) -> RepoResult<WorkoutSession> {
        let session = self
            .state()
            .sessions
            .get_mut(&id)
            .or_not_found("WorkoutSession", id)?;
        session.status = SessionStatus::Stale;
        Ok(session.clone())
    }

    async fn list_sessions(
        &mut self,
        user_id: &str,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<WorkoutSession>> {
        let mut rows: Vec<&WorkoutSession> = self
            .state()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id)
            .filter(|s| from.is_none_or(|f| s.started_at >= f))
            .filter(|s| to.is_none_or(|t| s.started_at < t))
            .collect();
        rows.sort_by_key(|s| Reverse((s.started_at, s.id)));
        Ok(page(rows.into_iter().cloned(), limit, offset))
    }

    async fn count_sessions_since(&mut self, user_id: &str, since: Timestamp) -> RepoResult<SessionCounts> {
        let mut counts = SessionCounts::default();
        for s in self
            .state()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.started_at >= since)
        {
            match s.status {
                SessionStatus::Completed => counts.completed += 1,
                SessionStatus::Skipped => counts.skipped += 1,
                _ => {}
            }
        }
        Ok(counts)
    }

    async fn count_completed_sessions(&mut self, user_id: &str) -> RepoResult<i64> {
        let count = self
            .state()
            .sessions
            .values()
            .filter(|s| s.user_id == user_id && s.status == SessionStatus::Completed)
            .count();
        Ok(count as i64)
    }

    async fn get_exercise_performance(
        &mut self,
        session_id: DbId,
        exercise_id: DbId,
    ) -> RepoResult<Option<ExercisePerformance>> {
        Ok(self
            .state()
            .performances
            .values()
            .find(|p| p.session_id == session_id && p.exercise_id == exercise_id)
            .cloned())
    }

    async fn save_exercise_performance(
        &mut self,
        session_id: DbId,
        exercise_id: DbId,
        sets: &[SetRecord],
    ) -> RepoResult<ExercisePerformance> {
        let state = self.state();
        let existing = state
            .performances
            .values()
            .find(|p| p.session_id == session_id && p.exercise_id == exercise_id)
            .map(|p| p.id);
        let id = match existing {
            Some(id) => id,
            None => state.next_id("exercise_performances"),
        };
        let row = ExercisePerformance {
            id,
            session_id,
            exercise_id,
            sets: sets.to_vec(),
            sets_completed: sets.len() as i32,
            best_set: best_set(sets),
            total_volume: total_volume(sets),
            updated_at: Utc::now(),
        };
        state.performances.insert(id, row.clone());
        Ok(row)
    }

    async fn list_exercise_performances(&mut self, session_id: DbId) -> RepoResult<Vec<ExercisePerformance>> {
        Ok(self
            .state()
            .performances
            .values()
            .filter(|p| p.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn list_performances_between(
        &mut self,
        user_id: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> RepoResult<Vec<ExercisePerformance>> {
        let state = self.state();
        let mut rows: Vec<(Timestamp, ExercisePerformance)> = state
            .performances
            .values()
            .filter_map(|p| {
                let s = state.sessions.get(&p.session_id)?;
                let in_window = s.user_id == user_id
                    && s.status == SessionStatus::Completed
                    && s.started_at >= from
                    && s.started_at < to;
                in_window.then(|| (s.started_at, p.clone()))
            })
            .collect();
        rows.sort_by_key(|(started, p)| (*started, p.id));
        Ok(rows.into_iter().map(|(_, p)| p).collect())
    }
}
