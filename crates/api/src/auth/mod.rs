//! Authentication primitives.
//!
//! - [`jwt`] -- access-token generation and validation. Tokens are issued by
//!   the auth collaborator; this server only verifies them (generation exists
//!   for tests and tooling).

pub mod jwt;
