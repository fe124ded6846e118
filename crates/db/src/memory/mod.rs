//! In-process implementation of the repository contract.
//!
//! A transaction holds the store lock for its whole lifetime and works on a
//! private copy of the state; `commit` swaps the copy in, anything else
//! discards it. Transactions are therefore serialised: a service must never
//! open a second transaction while it still holds one.

mod coach;
mod goal;
mod messaging;
mod plan;
mod profile;
mod progress;
mod schedule;
mod session;

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;
use fitup_core::catalog::EXERCISES;
use fitup_core::types::{DbId, UserId};

use crate::error::{RepoError, RepoResult};
use crate::models::coach::{CoachAssignment, CoachInvitation};
use crate::models::exercise::Exercise;
use crate::models::goal::Goal;
use crate::models::messaging::{Attachment, Conversation, Message, ReadStatus};
use crate::models::plan::{PerformanceRecord, Plan, PlanAdaptation};
use crate::models::profile::WorkoutProfile;
use crate::models::progress::{OneRepMaxRecord, ProgressLog};
use crate::models::schedule::{WeeklySchema, Workout, WorkoutExercise};
use crate::models::session::{ExercisePerformance, WorkoutSession};
use crate::repository::{Repository, Transaction};

/// Every table of the store. Cloned once per transaction.
#[derive(Debug, Clone, Default)]
pub(crate) struct MemoryState {
    sequences: BTreeMap<&'static str, DbId>,
    profiles: BTreeMap<UserId, WorkoutProfile>,
    exercises: BTreeMap<DbId, Exercise>,
    schemas: BTreeMap<DbId, WeeklySchema>,
    workouts: BTreeMap<DbId, Workout>,
    workout_exercises: BTreeMap<DbId, WorkoutExercise>,
    sessions: BTreeMap<DbId, WorkoutSession>,
    performances: BTreeMap<DbId, ExercisePerformance>,
    progress_logs: BTreeMap<DbId, ProgressLog>,
    one_rep_maxes: BTreeMap<DbId, OneRepMaxRecord>,
    plans: BTreeMap<DbId, Plan>,
    performance_records: BTreeMap<DbId, PerformanceRecord>,
    adaptations: BTreeMap<DbId, PlanAdaptation>,
    goals: BTreeMap<DbId, Goal>,
    assignments: BTreeMap<DbId, CoachAssignment>,
    invitations: BTreeMap<Uuid, CoachInvitation>,
    conversations: BTreeMap<DbId, Conversation>,
    messages: BTreeMap<DbId, Message>,
    attachments: BTreeMap<DbId, Attachment>,
    read_status: BTreeMap<(DbId, UserId), ReadStatus>,
}

impl MemoryState {
    /// Next value of a per-table id sequence, starting at 1.
    fn next_id(&mut self, table: &'static str) -> DbId {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq += 1;
        *seq
    }

    fn seeded() -> Self {
        let mut state = Self::default();
        for entry in EXERCISES.iter() {
            let id = state.next_id("exercises");
            state.exercises.insert(id, Exercise::from_catalog(id, entry));
        }
        state
    }
}

/// Shared handle to an in-process store seeded with the exercise catalog.
#[derive(Clone)]
pub struct MemoryRepository {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::seeded())),
        }
    }
}

impl Default for MemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn begin(&self) -> RepoResult<Box<dyn Transaction>> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryTransaction { guard, working }))
    }

    async fn health_check(&self) -> RepoResult<()> {
        Ok(())
    }
}

pub struct MemoryTransaction {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

impl MemoryTransaction {
    fn state(&mut self) -> &mut MemoryState {
        &mut self.working
    }
}

#[async_trait]
impl Transaction for MemoryTransaction {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        let MemoryTransaction { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        Ok(())
    }
}

fn conflict(constraint: &str) -> RepoError {
    RepoError::Conflict(constraint.to_string())
}

/// `LIMIT` / `OFFSET` over an already ordered iterator.
fn page<T>(items: impl Iterator<Item = T>, limit: i64, offset: i64) -> Vec<T> {
    items
        .skip(usize::try_from(offset).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

#[cfg(test)]
mod tests;
