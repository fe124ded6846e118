//! Persistence for the fitup backend: entity models, the repository
//! contract, and its PostgreSQL and in-process implementations.

pub mod error;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod repository;

use sqlx::postgres::PgPoolOptions;

pub use error::{RepoError, RepoResult};
pub use memory::MemoryRepository;
pub use postgres::PgRepository;
pub use repository::{
    CoachRepo, ConversationRepo, ExerciseRepo, GoalRepo, InvitationRepo, MessageRepo, PlanRepo,
    ProfileRepo, ProgressRepo, Repository, ScheduleRepo, SessionRepo, Transaction,
};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Apply the embedded migrations under `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
