//! Service layer of the fitup backend.
//!
//! Every public operation validates its input at entry, runs inside a single
//! repository transaction under a deadline, and only publishes events or hub
//! broadcasts after that transaction committed.

pub mod access;
pub mod analytics;
pub mod coaching;
pub mod deadline;
pub mod goals;
pub mod locks;
pub mod messaging;
pub mod pdf;
pub mod plans;
pub mod profiles;
pub mod sessions;

use std::sync::Arc;

use fitup_core::error::CoreError;
use fitup_db::{RepoError, Repository};
use fitup_events::{EventBus, Hub};

pub use access::Actor;
pub use analytics::AnalyticsService;
pub use coaching::CoachingService;
pub use goals::GoalService;
pub use messaging::MessagingService;
pub use pdf::{PlanRenderer, SimplePdfRenderer};
pub use plans::PlanService;
pub use profiles::ProfileService;
pub use sessions::SessionService;

/// All services wired over one repository, hub and event bus.
#[derive(Clone)]
pub struct Services {
    pub plans: Arc<PlanService>,
    pub analytics: Arc<AnalyticsService>,
    pub sessions: Arc<SessionService>,
    pub messaging: Arc<MessagingService>,
    pub coaching: Arc<CoachingService>,
    pub profiles: Arc<ProfileService>,
    pub goals: Arc<GoalService>,
}

impl Services {
    pub fn new(repo: Arc<dyn Repository>, hub: Arc<Hub>, bus: Arc<EventBus>) -> Self {
        Self::with_renderer(repo, hub, bus, Arc::new(SimplePdfRenderer))
    }

    pub fn with_renderer(
        repo: Arc<dyn Repository>,
        hub: Arc<Hub>,
        bus: Arc<EventBus>,
        renderer: Arc<dyn PlanRenderer>,
    ) -> Self {
        Self {
            plans: Arc::new(PlanService::new(repo.clone(), renderer)),
            analytics: Arc::new(AnalyticsService::new(repo.clone())),
            sessions: Arc::new(SessionService::new(repo.clone(), bus.clone())),
            messaging: Arc::new(MessagingService::new(repo.clone(), hub)),
            coaching: Arc::new(CoachingService::new(repo.clone(), bus)),
            profiles: Arc::new(ProfileService::new(repo.clone())),
            goals: Arc::new(GoalService::new(repo)),
        }
    }
}

/// Translate a store uniqueness violation into a domain conflict with a
/// readable message; other errors keep their classification.
pub(crate) fn conflict_as(message: &'static str) -> impl FnOnce(RepoError) -> CoreError {
    move |err| match err {
        RepoError::Conflict(constraint) => {
            tracing::debug!(constraint = %constraint, "Uniqueness violation");
            CoreError::Conflict(message.to_string())
        }
        other => other.into(),
    }
}
