//! Test helpers for ridx.
//!
//! Provides security fixtures, a permissive rule set, and an alert sink that
//! records everything it receives.

mod fixtures;
mod sink;

pub use fixtures::{permissive_rules, universe, SecurityBuilder};
pub use sink::CollectingSink;
