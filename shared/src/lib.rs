//! Shared types for the GEO tracking pipeline
//!
//! Contains the data model (LLM configs, prompts, schedules, responses), the
//! provider failure taxonomy, the [`Store`] capability and the logging setup
//! used by every other crate in the workspace.

pub mod errors;
pub mod logging;
pub mod store;
pub mod types;

pub use errors::*;
pub use store::{MemoryStore, MockStore, RunLease, Store};
pub use types::*;
