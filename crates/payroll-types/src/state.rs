//! The payroll document model and its shape validation.
//!
//! The server synchronizes exactly one document: an ordered sequence of
//! "week" records. Week internals are opaque to the core; clients own
//! their meaning. The only shape requirement, enforced everywhere a
//! candidate document enters the system, is that `weeks` is a JSON
//! array (possibly empty, any element type).

use serde::{Deserialize, Serialize};

/// The single authoritative document synchronized across clients.
///
/// Created empty at first boot, loaded from the active storage backend
/// at startup, replaced in memory on every accepted client update, and
/// persisted after each replacement. Never deleted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PayrollState {
    /// Ordered sequence of opaque week records.
    pub weeks: Vec<serde_json::Value>,
}

impl PayrollState {
    /// The empty default state, substituted whenever persisted data is
    /// absent or corrupt.
    pub const fn empty() -> Self {
        Self { weeks: Vec::new() }
    }
}

/// Result of validating a candidate document against the required shape.
///
/// Validation is an explicit tagged check, never a runtime type probe:
/// every candidate is classified before it can touch the authoritative
/// state.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation {
    /// The candidate carries a `weeks` array and may replace the state.
    Valid(PayrollState),
    /// The candidate is malformed and must be discarded.
    Invalid(&'static str),
}

/// Validate a candidate payload.
///
/// A candidate is valid iff it is a JSON object whose `weeks` member is
/// an array. Element types are not inspected.
pub fn validate_candidate(candidate: &serde_json::Value) -> Validation {
    match candidate.get("weeks") {
        Some(serde_json::Value::Array(weeks)) => Validation::Valid(PayrollState {
            weeks: weeks.clone(),
        }),
        Some(_) => Validation::Invalid("weeks is not an array"),
        None => Validation::Invalid("weeks is missing"),
    }
}
