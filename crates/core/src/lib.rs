//! Domain logic for the fitup coaching backend. No I/O lives here.

pub mod catalog;
pub mod enums;
pub mod error;
pub mod fitness;
pub mod goal_prediction;
pub mod invitation;
pub mod messaging;
pub mod one_rep_max;
pub mod optimal_load;
pub mod plan;
pub mod progression;
pub mod roles;
pub mod session;
pub mod types;
pub mod validation;
pub mod volume;
pub mod week;
