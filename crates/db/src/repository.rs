//! The persistence contract consumed by the service layer.
//!
//! Every entity family is its own trait; a [`Transaction`] implements all of
//! them so a service can mix families inside one atomic unit of work.
//! Dropping a transaction without calling [`Transaction::commit`] rolls it
//! back, including when the owning future is cancelled or panics.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;
use fitup_core::invitation::InvitationStatus;
use fitup_core::plan::PlanMetadata;
use fitup_core::session::{SessionSummary, SetRecord};
use fitup_core::types::{DbId, Timestamp};

use crate::error::RepoResult;
use crate::models::coach::{CoachAssignment, CoachInvitation, NewInvitation};
use crate::models::exercise::{Exercise, ExerciseFilter};
use crate::models::goal::{Goal, NewGoal};
use crate::models::messaging::{Conversation, ConversationSummary, Message, NewMessage};
use crate::models::plan::{
    NewAdaptation, NewPerformanceRecord, NewPlan, PerformanceRecord, Plan, PlanAdaptation,
};
use crate::models::profile::{UpsertProfile, WorkoutProfile};
use crate::models::progress::{NewOneRepMax, NewProgressLog, OneRepMaxRecord, ProgressLog};
use crate::models::schedule::{NewWorkoutExercise, WeeklySchema, Workout, WorkoutExercise};
use crate::models::session::{ExercisePerformance, NewSession, SessionCounts, WorkoutSession};

/// Entry point to a store.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Open a transaction. All family operations run through it.
    async fn begin(&self) -> RepoResult<Box<dyn Transaction>>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> RepoResult<()>;
}

/// One atomic unit of work over every entity family.
#[async_trait]
pub trait Transaction:
    ProfileRepo
    + ExerciseRepo
    + ScheduleRepo
    + SessionRepo
    + ProgressRepo
    + PlanRepo
    + GoalRepo
    + CoachRepo
    + InvitationRepo
    + ConversationRepo
    + MessageRepo
    + Send
{
    async fn commit(self: Box<Self>) -> RepoResult<()>;

    async fn rollback(self: Box<Self>) -> RepoResult<()>;
}

// ---------------------------------------------------------------------------
// Profiles and catalog
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProfileRepo {
    async fn get_profile(&mut self, user_id: &str) -> RepoResult<WorkoutProfile>;

    /// Create or replace the user's profile.
    async fn upsert_profile(&mut self, user_id: &str, input: &UpsertProfile) -> RepoResult<WorkoutProfile>;
}

#[async_trait]
pub trait ExerciseRepo {
    /// Catalog entries matching every set filter, ordered by id.
    async fn list_exercises(&mut self, filter: &ExerciseFilter) -> RepoResult<Vec<Exercise>>;

    async fn get_exercise(&mut self, id: DbId) -> RepoResult<Exercise>;
}

// ---------------------------------------------------------------------------
// Schemas, workouts, workout exercises
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ScheduleRepo {
    /// Insert an active schema. `Conflict` if the user already has one.
    async fn create_schema(
        &mut self,
        user_id: &str,
        plan_id: Option<DbId>,
        week_start: NaiveDate,
    ) -> RepoResult<WeeklySchema>;

    /// Deactivate every active schema of the user. Returns rows touched.
    async fn deactivate_schemas(&mut self, user_id: &str) -> RepoResult<u64>;

    async fn get_active_schema(&mut self, user_id: &str) -> RepoResult<Option<WeeklySchema>>;

    async fn get_schema(&mut self, id: DbId) -> RepoResult<WeeklySchema>;

    /// Delete a schema with its workouts and workout exercises.
    async fn delete_schema(&mut self, id: DbId) -> RepoResult<()>;

    /// `Conflict` if the schema already has a workout on that day.
    async fn create_workout(&mut self, schema_id: DbId, day_of_week: i16, focus: &str) -> RepoResult<Workout>;

    async fn get_workout(&mut self, id: DbId) -> RepoResult<Workout>;

    /// Workouts of a schema ordered by day.
    async fn list_workouts(&mut self, schema_id: DbId) -> RepoResult<Vec<Workout>>;

    async fn add_workout_exercise(
        &mut self,
        workout_id: DbId,
        input: &NewWorkoutExercise,
    ) -> RepoResult<WorkoutExercise>;

    /// Exercises of a workout ordered by `order_index`.
    async fn list_workout_exercises(&mut self, workout_id: DbId) -> RepoResult<Vec<WorkoutExercise>>;

    async fn update_workout_exercise_sets(&mut self, id: DbId, sets: i16) -> RepoResult<WorkoutExercise>;
}

// ---------------------------------------------------------------------------
// Sessions and exercise performance
// ---------------------------------------------------------------------------

#[async_trait]
pub trait SessionRepo {
    /// Insert a session. An `active` insert is `Conflict` while the user
    /// already has an active session.
    async fn create_session(&mut self, input: &NewSession) -> RepoResult<WorkoutSession>;

    async fn get_session(&mut self, id: DbId) -> RepoResult<WorkoutSession>;

    async fn find_active_session(&mut self, user_id: &str) -> RepoResult<Option<WorkoutSession>>;

    async fn complete_session(
        &mut self,
        id: DbId,
        ended_at: Timestamp,
        summary: &SessionSummary,
        completion_rate: f64,
    ) -> RepoResult<WorkoutSession>;

    async fn mark_session_stale(&mut self, id: DbId) -> RepoResult<WorkoutSession>;

    /// Sessions of a user newest first, optionally bounded by `started_at`.
    async fn list_sessions(
        &mut self,
        user_id: &str,
        from: Option<Timestamp>,
        to: Option<Timestamp>,
        limit: i64,
        offset: i64,
    ) -> RepoResult<Vec<WorkoutSession>>;

    async fn count_sessions_since(&mut self, user_id: &str, since: Timestamp) -> RepoResult<SessionCounts>;

    /// All-time completed sessions.
    async fn count_completed_sessions(&mut self, user_id: &str) -> RepoResult<i64>;

    async fn get_exercise_performance(
        &mut self,
        session_id: DbId,
        exercise_id: DbId,
    ) -> RepoResult<Option<ExercisePerformance>>;

    /// Replace the set records of one exercise in a session, recomputing the
    /// best set and volume.
    async fn save_exercise_performance(
        &mut self,
        session_id: DbId,
        exercise_id: DbId,
        sets: &[SetRecord],
    ) -> RepoResult<ExercisePerformance>;

    async fn list_exercise_performances(&mut self, session_id: DbId) -> RepoResult<Vec<ExercisePerformance>>;

    /// Performances from the user's completed sessions started in `[from, to)`.
    async fn list_performances_between(
        &mut self,
        user_id: &str,
        from: Timestamp,
        to: Timestamp,
    ) -> RepoResult<Vec<ExercisePerformance>>;
}

// ---------------------------------------------------------------------------
// Progress logs and 1RM history
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ProgressRepo {
    async fn insert_progress_log(&mut self, input: &NewProgressLog) -> RepoResult<ProgressLog>;

    async fn list_progress_logs(
        &mut self,
        user_id: &str,
        exercise_id: Option<DbId>,
        since: Option<NaiveDate>,
    ) -> RepoResult<Vec<ProgressLog>>;

    async fn latest_one_rep_max(&mut self, user_id: &str, exercise_id: DbId) -> RepoResult<Option<OneRepMaxRecord>>;

    async fn insert_one_rep_max(&mut self, input: &NewOneRepMax) -> RepoResult<OneRepMaxRecord>;

    /// Estimates for one exercise recorded at or after `since`, oldest first.
    async fn list_one_rep_maxes(
        &mut self,
        user_id: &str,
        exercise_id: DbId,
        since: Timestamp,
    ) -> RepoResult<Vec<OneRepMaxRecord>>;

    /// The highest estimate per exercise.
    async fn best_one_rep_maxes(&mut self, user_id: &str) -> RepoResult<Vec<OneRepMaxRecord>>;
}

// ---------------------------------------------------------------------------
// Plans
// ---------------------------------------------------------------------------

#[async_trait]
pub trait PlanRepo {
    /// Insert an active plan. `Conflict` while another plan is active.
    async fn insert_plan(&mut self, input: &NewPlan) -> RepoResult<Plan>;

    async fn get_plan(&mut self, id: DbId) -> RepoResult<Plan>;

    async fn get_active_plan(&mut self, user_id: &str) -> RepoResult<Option<Plan>>;

    /// Plans newest first.
    async fn list_plans(&mut self, user_id: &str, limit: i64) -> RepoResult<Vec<Plan>>;

    async fn deactivate_plan(&mut self, id: DbId) -> RepoResult<Plan>;

    async fn flag_for_regeneration(&mut self, id: DbId, reason: &str) -> RepoResult<Plan>;

    async fn update_plan_metadata(&mut self, id: DbId, metadata: &PlanMetadata) -> RepoResult<Plan>;

    async fn insert_performance_record(&mut self, input: &NewPerformanceRecord) -> RepoResult<PerformanceRecord>;

    /// Records newest first, all of them when `limit` is `None`.
    async fn list_performance_records(
        &mut self,
        plan_id: DbId,
        limit: Option<i64>,
    ) -> RepoResult<Vec<PerformanceRecord>>;

    async fn insert_adaptation(&mut self, input: &NewAdaptation) -> RepoResult<PlanAdaptation>;

    async fn list_adaptations(&mut self, plan_id: DbId) -> RepoResult<Vec<PlanAdaptation>>;

    async fn list_user_adaptations(&mut self, user_id: &str, limit: i64) -> RepoResult<Vec<PlanAdaptation>>;
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[async_trait]
pub trait GoalRepo {
    async fn insert_goal(&mut self, input: &NewGoal) -> RepoResult<Goal>;

    async fn get_goal(&mut self, id: DbId) -> RepoResult<Goal>;

    async fn list_goals(&mut self, user_id: &str, active_only: bool) -> RepoResult<Vec<Goal>>;

    async fn update_goal_progress(&mut self, id: DbId, current_value: f64) -> RepoResult<Goal>;

    async fn complete_goal(&mut self, id: DbId, at: Timestamp) -> RepoResult<Goal>;
}

// ---------------------------------------------------------------------------
// Coaching
// ---------------------------------------------------------------------------

#[async_trait]
pub trait CoachRepo {
    /// `Conflict` while the user already has an active assignment.
    async fn insert_assignment(
        &mut self,
        coach_id: &str,
        user_id: &str,
        notes: Option<&str>,
    ) -> RepoResult<CoachAssignment>;

    async fn get_assignment(&mut self, id: DbId) -> RepoResult<CoachAssignment>;

    async fn active_assignment_for_user(&mut self, user_id: &str) -> RepoResult<Option<CoachAssignment>>;

    async fn list_assignments_for_coach(
        &mut self,
        coach_id: &str,
        active_only: bool,
    ) -> RepoResult<Vec<CoachAssignment>>;

    /// Idempotent; an inactive assignment is returned unchanged.
    async fn deactivate_assignment(&mut self, id: DbId, at: Timestamp) -> RepoResult<CoachAssignment>;

    async fn has_active_assignment(&mut self, coach_id: &str, user_id: &str) -> RepoResult<bool>;
}

#[async_trait]
pub trait InvitationRepo {
    /// `Conflict` while a pending invitation exists for `(coach, email)`.
    async fn insert_invitation(&mut self, input: &NewInvitation) -> RepoResult<CoachInvitation>;

    async fn get_invitation(&mut self, id: Uuid) -> RepoResult<CoachInvitation>;

    async fn find_invitation_by_token_hash(&mut self, token_hash: &str) -> RepoResult<Option<CoachInvitation>>;

    /// Invitations of a coach newest first.
    async fn list_invitations(&mut self, coach_id: &str) -> RepoResult<Vec<CoachInvitation>>;

    /// Rotate the token, restart the window and reopen the invitation as
    /// pending.
    async fn refresh_invitation_token(
        &mut self,
        id: Uuid,
        token_hash: &str,
        expires_at: Timestamp,
    ) -> RepoResult<CoachInvitation>;

    async fn set_invitation_status(&mut self, id: Uuid, status: InvitationStatus) -> RepoResult<CoachInvitation>;

    async fn mark_invitation_accepted(
        &mut self,
        id: Uuid,
        user_id: &str,
        at: Timestamp,
    ) -> RepoResult<CoachInvitation>;

    /// Move every pending invitation past `now` to `expired`.
    async fn expire_invitations(&mut self, now: Timestamp) -> RepoResult<u64>;
}

// ---------------------------------------------------------------------------
// Messaging
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ConversationRepo {
    /// `Conflict` if the pair already has a conversation, in either order.
    async fn create_conversation(&mut self, coach_id: &str, client_id: &str) -> RepoResult<Conversation>;

    async fn find_conversation_between(&mut self, a: &str, b: &str) -> RepoResult<Option<Conversation>>;

    async fn get_conversation(&mut self, id: DbId) -> RepoResult<Conversation>;

    /// Conversations of a user, most recent activity first.
    async fn list_conversations(
        &mut self,
        user_id: &str,
        include_archived: bool,
    ) -> RepoResult<Vec<ConversationSummary>>;

    async fn set_conversation_archived(&mut self, id: DbId, archived: bool) -> RepoResult<Conversation>;

    /// Delete with messages, attachments and read status.
    async fn delete_conversation(&mut self, id: DbId) -> RepoResult<()>;

    async fn is_participant(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<bool>;
}

#[async_trait]
pub trait MessageRepo {
    /// Insert a message with its attachments and bump the conversation's
    /// `last_message_at`.
    async fn insert_message(&mut self, input: &NewMessage) -> RepoResult<Message>;

    async fn get_message(&mut self, id: DbId) -> RepoResult<Message>;

    /// Non-deleted messages newest first, strictly older than `before_id`.
    async fn list_messages(
        &mut self,
        conversation_id: DbId,
        before_id: Option<DbId>,
        limit: i64,
    ) -> RepoResult<Vec<Message>>;

    async fn update_message_text(&mut self, id: DbId, text: &str) -> RepoResult<Message>;

    async fn soft_delete_message(&mut self, id: DbId) -> RepoResult<Message>;

    /// Record a read. Returns `false` when it was already recorded.
    async fn mark_read(&mut self, message_id: DbId, user_id: &str) -> RepoResult<bool>;

    /// Mark every unread message from the other participant. Returns the ids
    /// newly marked.
    async fn mark_conversation_read(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<Vec<DbId>>;

    async fn unread_count(&mut self, conversation_id: DbId, user_id: &str) -> RepoResult<i64>;
}
