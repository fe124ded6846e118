#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use fitup_core::catalog::EXERCISES;
use fitup_core::fitness::{Equipment, FitnessGoal, FitnessLevel};
use fitup_core::one_rep_max::OneRepMaxMethod;
use fitup_core::plan::PlanRequest;
use fitup_core::roles::Role;
use fitup_core::types::DbId;
use fitup_db::models::progress::NewOneRepMax;
use fitup_db::{CoachRepo, MemoryRepository, ProgressRepo, Repository};
use fitup_events::{EventBus, Hub};
use fitup_services::{Actor, Services};

pub struct Harness {
    pub repo: Arc<MemoryRepository>,
    pub hub: Arc<Hub>,
    pub bus: Arc<EventBus>,
    pub services: Services,
}

/// Services over a fresh in-memory store seeded with the catalog.
pub fn harness() -> Harness {
    let repo = Arc::new(MemoryRepository::new());
    let hub = Arc::new(Hub::new());
    let bus = Arc::new(EventBus::default());
    let services = Services::new(repo.clone(), hub.clone(), bus.clone());
    Harness {
        repo,
        hub,
        bus,
        services,
    }
}

pub fn user(id: &str) -> Actor {
    Actor::new(id, Role::User).with_email(format!("{id}@example.com"))
}

pub fn coach(id: &str) -> Actor {
    Actor::new(id, Role::Coach).with_email(format!("{id}@example.com"))
}

/// Catalog id of the exercise with this name.
pub fn exercise_id(name: &str) -> DbId {
    EXERCISES
        .iter()
        .position(|e| e.name == name)
        .map(|i| i as DbId + 1)
        .unwrap_or_else(|| panic!("{name} is not in the catalog"))
}

pub fn beginner_bodyweight_request() -> PlanRequest {
    PlanRequest {
        goals: vec![FitnessGoal::GeneralFitness],
        equipment: vec![Equipment::Bodyweight],
        level: FitnessLevel::Beginner,
        weekly_frequency: 3,
        time_per_workout: 45,
        limitations: vec![],
        recovery: None,
        one_rep_maxes: vec![],
    }
}

impl Harness {
    /// Store a 1RM estimate directly, `days_ago` days in the past.
    pub async fn seed_one_rep_max(&self, user_id: &str, exercise_id: DbId, estimated_max: f64, days_ago: i64) {
        let mut tx = self.repo.begin().await.unwrap();
        tx.insert_one_rep_max(&NewOneRepMax {
            user_id: user_id.to_string(),
            exercise_id,
            estimated_max,
            method: OneRepMaxMethod::Epley,
            confidence: 0.95,
            source_weight: estimated_max,
            source_reps: 1,
            source_rpe: None,
            source_session_id: None,
            recorded_at: Utc::now() - Duration::days(days_ago),
        })
        .await
        .unwrap();
        tx.commit().await.unwrap();
    }

    pub async fn assign(&self, coach_id: &str, user_id: &str) -> DbId {
        let mut tx = self.repo.begin().await.unwrap();
        let assignment = tx.insert_assignment(coach_id, user_id, None).await.unwrap();
        tx.commit().await.unwrap();
        assignment.id
    }
}
