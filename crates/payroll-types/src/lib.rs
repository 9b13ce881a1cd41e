//! Shared types for the payroll sync server.
//!
//! This crate defines the data model shared by every other crate:
//!
//! - [`PayrollState`] -- the single authoritative document being
//!   synchronized across clients
//! - [`validate_candidate`] -- shape validation for incoming documents
//! - [`ClientId`] -- identifier for one live connection
//! - [`ServerMessage`] -- the JSON wire protocol pushed to clients
//!
//! # Modules
//!
//! - [`state`] -- document model and validation
//! - [`protocol`] -- wire message shapes and frame parsing

pub mod protocol;
pub mod state;

// Re-export primary types for convenience.
pub use protocol::{ClientId, ServerMessage, parse_client_frame};
pub use state::{PayrollState, Validation, validate_candidate};
