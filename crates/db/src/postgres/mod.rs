//! PostgreSQL implementation of the repository contract.
//!
//! Uniqueness invariants live in partial unique indexes (see the migrations);
//! a violation comes back as `23505` and is classified as `Conflict`.

mod coach;
mod goal;
mod messaging;
mod plan;
mod profile;
mod progress;
mod schedule;
mod session;

use async_trait::async_trait;
use sqlx::{PgConnection, Postgres};

use crate::error::RepoResult;
use crate::repository::{Repository, Transaction};
use crate::DbPool;

/// Pool-backed store.
#[derive(Clone)]
pub struct PgRepository {
    pool: DbPool,
}

impl PgRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl Repository for PgRepository {
    async fn begin(&self) -> RepoResult<Box<dyn Transaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }

    async fn health_check(&self) -> RepoResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// An open database transaction. Rolled back by `sqlx` on drop.
pub struct PgTransaction {
    tx: sqlx::Transaction<'static, Postgres>,
}

impl PgTransaction {
    fn conn(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

#[async_trait]
impl Transaction for PgTransaction {
    async fn commit(self: Box<Self>) -> RepoResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> RepoResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
