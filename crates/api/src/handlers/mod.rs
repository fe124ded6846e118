pub mod analytics;
pub mod coach;
pub mod goals;
pub mod messages;
pub mod plans;
pub mod profile;
pub mod sessions;
