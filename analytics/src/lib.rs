//! Keyword extraction and statistics over stored responses

pub mod core;
pub mod error;

pub use crate::core::*;
pub use error::{AnalyticsError, AnalyticsResult};
