pub mod coach;
pub mod exercise;
pub mod goal;
pub mod messaging;
pub mod plan;
pub mod profile;
pub mod progress;
pub mod schedule;
pub mod session;
