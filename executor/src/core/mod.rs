//! Core executor components

pub mod batch;
pub mod coordinator;
pub mod registry;

pub use batch::BatchRunner;
pub use coordinator::Coordinator;
pub use registry::ProviderRegistry;
