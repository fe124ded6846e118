use std::cmp::Reverse;

use async_trait::async_trait;
use chrono::Utc;
use fitup_core::plan::PlanMetadata;
use fitup_core::types::DbId;

use super::{conflict, page, MemoryTransaction};
use crate::error::{OrNotFound, RepoError, RepoResult};
use crate::models::plan::{
    NewAdaptation, NewPerformanceRecord, NewPlan, PerformanceRecord, Plan, PlanAdaptation,
};
use crate::repository::PlanRepo;

impl MemoryTransaction {
    fn plan_mut(&mut self, id: DbId) -> RepoResult<&mut Plan> {
        self.state().plans.get_mut(&id).or_not_found("Plan", id)
    }
}

#[async_trait]
impl PlanRepo for MemoryTransaction {
    async fn insert_plan(&mut self, input: &NewPlan) -> RepoResult<Plan> {
        let state = self.state();
        if state.plans.values().any(|p| p.user_id == input.user_id && p.active) {
            return Err(conflict("uq_generated_plans_active_user"));
        }
        let plan = Plan {
            id: state.next_id("generated_plans"),
            user_id: input.user_id.clone(),
            week_start: input.week_start,
            generated_at: Utc::now(),
            algorithm: input.algorithm.clone(),
            active: true,
            regeneration_requested: false,
            regeneration_reason: None,
            metadata: input.metadata.clone(),
        };
        state.plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn get_plan(&mut self, id: DbId) -> RepoResult<Plan> {
        self.state().plans.get(&id).cloned().or_not_found("Plan", id)
    }

    async fn get_active_plan(&mut self, user_id: &str) -> RepoResult<Option<Plan>> {
        Ok(self
            .state()
            .plans
            .values()
            .find(|p| p.user_id == user_id && p.active)
            .cloned())
    }

    async fn list_plans(&mut self, user_id: &str, limit: i64) -> RepoResult<Vec<Plan>> {
        let mut rows: Vec<&Plan> = self.state().plans.values().filter(|p| p.user_id == user_id).collect();
        rows.sort_by_key(|p| Reverse((p.generated_at, p.id)));
        Ok(page(rows.into_iter().cloned(), limit, 0))
    }

    async fn deactivate_plan(&mut self, id: DbId) -> RepoResult<Plan> {
        let plan = self.plan_mut(id)?;
        plan.active = false;
        Ok(plan.clone())
    }

    async fn flag_for_regeneration(&mut self, id: DbId, reason: &str) -> RepoResult<Plan> {
        let plan = self.plan_mut(id)?;
        plan.regeneration_requested = true;
        plan.regeneration_reason = Some(reason.to_string());
        Ok(plan.clone())
    }

    async fn update_plan_metadata(&mut self, id: DbId, metadata: &PlanMetadata) -> RepoResult<Plan> {
        let plan = self.plan_mut(id)?;
        plan.metadata = metadata.clone();
        Ok(plan.clone())
    }

    async fn insert_performance_record(&mut self, input: &NewPerformanceRecord) -> RepoResult<PerformanceRecord> {
        let state = self.state();
        if !state.plans.contains_key(&input.plan_id) {
            return Err(RepoError::not_found("Plan", input.plan_id));
        }
        let record = PerformanceRecord {
            id: state.next_id("plan_performance_records"),
            plan_id: input.plan_id,
            session_id: input.session_id,
            completion_rate: input.sample.completion_rate,
            average_rpe: input.sample.average_rpe,
            skipped_count: input.sample.skipped_count,
            recorded_at: Utc::now(),
        };
        state.performance_records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_performance_records(
        &mut self,
        plan_id: DbId,
        limit: Option<i64>,
    ) -> RepoResult<Vec<PerformanceRecord>> {
        let mut rows: Vec<&PerformanceRecord> = self
            .state()
            .performance_records
            .values()
            .filter(|r| r.plan_id == plan_id)
            .collect();
        rows.sort_by_key(|r| Reverse((r.recorded_at, r.id)));
        Ok(page(rows.into_iter().cloned(), limit.unwrap_or(i64::MAX), 0))
    }

    async fn insert_adaptation(&mut self, input: &NewAdaptation) -> RepoResult<PlanAdaptation> {
        let state = self.state();
        if !state.plans.contains_key(&input.plan_id) {
            return Err(RepoError::not_found("Plan", input.plan_id));
        }
        let row = PlanAdaptation {
            id: state.next_id("plan_adaptations"),
            plan_id: input.plan_id,
            user_id: input.user_id.clone(),
            reason: input.reason.clone(),
            diff_summary: input.diff_summary.clone(),
            changes: input.changes.clone(),
            created_at: Utc::now(),
        };
        state.adaptations.insert(row.id, row.clone());
        Ok(row)
    }

    async fn list_adaptations(&mut self, plan_id: DbId) -> RepoResult<Vec<PlanAdaptation>> {
        let mut rows: Vec<PlanAdaptation> = self
            .state()
            .adaptations
            .values()
            .filter(|a| a.plan_id == plan_id)
            .cloned()
            .collect();
        rows.sort_by_key(|a| Reverse((a.created_at, a.id)));
        Ok(rows)
    }

    async fn list_user_adaptations(&mut self, user_id: &str, limit: i64) -> RepoResult<Vec<PlanAdaptation>> {
        let mut rows: Vec<&PlanAdaptation> = self
            .state()
            .adaptations
            .values()
            .filter(|a| a.user_id == user_id)
            .collect();
        rows.sort_by_key(|a| Reverse((a.created_at, a.id)));
        Ok(page(rows.into_iter().cloned(), limit, 0))
    }
}
