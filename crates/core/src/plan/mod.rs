//! Plan generation (`fitup_adaptive_v1`), effectiveness and adaptation.

pub mod adaptation;
pub mod effectiveness;
pub mod generator;
pub mod metadata;
pub mod prescription;
pub mod selection;
pub mod template;

pub use adaptation::{AdaptationDecision, AppliedAdaptation, ReductionReason};
pub use effectiveness::{effectiveness, Effectiveness, PerformanceSample};
pub use generator::generate_plan;
pub use metadata::{PlanMetadata, PlanRequest, ALGORITHM_ADAPTIVE_V1};
pub use selection::ExerciseCandidate;
