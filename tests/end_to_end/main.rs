//! End-to-end tests through the `mnemos` facade
//!
//! - scenarios: the four reference scenarios (search, capacity, update,
//!   idempotent normalization)
//! - persistence: round trip across manager instances
//! - dual: knowledge/reflection separation

#[path = "../common/mod.rs"]
mod common;

mod dual;
mod persistence;
mod scenarios;
