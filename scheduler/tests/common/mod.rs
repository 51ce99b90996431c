//! Common test utilities and infrastructure
//!
//! Gated providers and a scheduler wired to an in-memory store.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{GatedProvider, Harness};
