use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use fitup_core::types::{DbId, Timestamp};

use super::{conflict, MemoryTransaction};
use crate::error::RepoResult;
use crate::models::progress::{NewOneRepMax, NewProgressLog, OneRepMaxRecord, ProgressLog};
use crate::repository::ProgressRepo;

#[async_trait]
impl ProgressRepo for MemoryTransaction {
    async fn insert_progress_log(&mut self, input: &NewProgressLog) -> RepoResult<ProgressLog> {
        let state = self.state();
        if input.session_id.is_some()
            && state
                .progress_logs
                .values()
                .any(|l| l.session_id == input.session_id && l.exercise_id == input.exercise_id)
        {
            return Err(conflict("uq_progress_logs_session_exercise"));
        }
        let log = ProgressLog {
            id: state.next_id("progress_logs"),
            user_id: input.user_id.clone(),
            exercise_id: input.exercise_id,
            session_id: input.session_id,
            log_date: input.log_date,
            sets_completed: input.sets_completed,
            reps_completed: input.reps_completed,
            weight_used: input.weight_used,
            duration_seconds: input.duration_seconds,
            created_at: Utc::now(),
        };
        state.progress_logs.insert(log.id, log.clone());
        Ok(log)
    }

    async fn list_progress_logs(
        &mut self,
        user_id: &str,
        exercise_id: Option<DbId>,
        since: Option<NaiveDate>,
    ) -> RepoResult<Vec<ProgressLog>> {
        let mut rows: Vec<ProgressLog> = self
            .state()
            .progress_logs
            .values()
            .filter(|l| l.user_id == user_id)
            .filter(|l| exercise_id.is_none_or(|e| l.exercise_id == e))
            .filter(|l| since.is_none_or(|d| l.log_date >= d))
            .cloned()
            .collect();
        rows.sort_by_key(|l| (l.log_date, l.id));
        Ok(rows)
    }

    async fn latest_one_rep_max(&mut self, user_id: &str, exercise_id: DbId) -> RepoResult<Option<OneRepMaxRecord>> {
        Ok(self
            .state()
            .one_rep_maxes
            .values()
            .filter(|r| r.user_id == user_id && r.exercise_id == exercise_id)
            .max_by_key(|r| (r.recorded_at, r.id))
            .cloned())
    }

    async fn insert_one_rep_max(&mut self, input: &NewOneRepMax) -> RepoResult<OneRepMaxRecord> {
        let state = self.state();
        let record = OneRepMaxRecord {
            id: state.next_id("one_rep_max_estimates"),
            user_id: input.user_id.clone(),
            exercise_id: input.exercise_id,
            estimated_max: input.estimated_max,
            method: input.method,
            confidence: input.confidence,
            source_weight: input.source_weight,
            source_reps: input.source_reps,
            source_rpe: input.source_rpe,
            source_session_id: input.source_session_id,
            recorded_at: input.recorded_at,
        };
        state.one_rep_maxes.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_one_rep_maxes(
        &mut self,
        user_id: &str,
        exercise_id: DbId,
        since: Timestamp,
    ) -> RepoResult<Vec<OneRepMaxRecord>> {
        let mut rows: Vec<OneRepMaxRecord> = self
            .state()
            .one_rep_maxes
            .values()
            .filter(|r| r.user_id == user_id && r.exercise_id == exercise_id && r.recorded_at >= since)
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.recorded_at, r.id));
        Ok(rows)
    }

    async fn best_one_rep_maxes(&mut self, user_id: &str) -> RepoResult<Vec<OneRepMaxRecord>> {
        let mut best: BTreeMap<DbId, OneRepMaxRecord> = BTreeMap::new();
        for r in self.state().one_rep_maxes.values().filter(|r| r.user_id == user_id) {
            match best.get(&r.exercise_id) {
                Some(current) if current.estimated_max >= r.estimated_max => {}
                _ => {
                    best.insert(r.exercise_id, r.clone());
                }
            }
        }
        Ok(best.into_values().collect())
    }
}
