//! Who is calling, and what they may touch.

use fitup_core::error::{CoreError, CoreResult};
use fitup_core::roles::Role;
use fitup_core::types::UserId;
use fitup_db::{CoachRepo, Transaction};

/// The authenticated caller of a service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: UserId,
    pub role: Role,
    pub email: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<UserId>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Fail unless the actor may act in a coaching capacity.
pub fn ensure_coach(actor: &Actor) -> CoreResult<()> {
    if !actor.role.can_coach() {
        return Err(CoreError::Forbidden("coach role required".into()));
    }
    Ok(())
}

/// A user may read and manage their own data; an admin anyone's; a coach
/// that of users with an active assignment to them.
pub async fn ensure_can_access(tx: &mut dyn Transaction, actor: &Actor, owner_id: &str) -> CoreResult<()> {
    if actor.user_id == owner_id || actor.is_admin() {
        return Ok(());
    }
    if actor.role.can_coach() && tx.has_active_assignment(&actor.user_id, owner_id).await? {
        return Ok(());
    }
    tracing::debug!(actor = %actor.user_id, owner = %owner_id, "Access denied");
    Err(CoreError::Forbidden("not allowed to access this user's data".into()))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use fitup_db::{MemoryRepository, Repository};

    use super::*;

    #[test]
    fn only_coaches_and_admins_coach() {
        assert!(ensure_coach(&Actor::new("c", Role::Coach)).is_ok());
        assert!(ensure_coach(&Actor::new("a", Role::Admin)).is_ok());
        assert!(matches!(
            ensure_coach(&Actor::new("u", Role::User)),
            Err(CoreError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn assigned_coach_can_access_client() {
        let repo: Arc<dyn Repository> = Arc::new(MemoryRepository::new());
        let mut tx = repo.begin().await.unwrap();
        tx.insert_assignment("coach-1", "user-1", None).await.unwrap();

        let coach = Actor::new("coach-1", Role::Coach);
        let stranger = Actor::new("coach-2", Role::Coach);
        let admin = Actor::new("root", Role::Admin);
        let own = Actor::new("user-1", Role::User);

        assert!(ensure_can_access(&mut *tx, &coach, "user-1").await.is_ok());
        assert!(ensure_can_access(&mut *tx, &admin, "user-1").await.is_ok());
        assert!(ensure_can_access(&mut *tx, &own, "user-1").await.is_ok());
        assert!(matches!(
            ensure_can_access(&mut *tx, &stranger, "user-1").await,
            Err(CoreError::Forbidden(_))
        ));
    }
}
