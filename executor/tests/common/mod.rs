//! Common test utilities and infrastructure
//!
//! Shared fixtures, scripted providers and pipeline builders used across the
//! executor test suites.

#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::TestFixtures;
pub use helpers::{OverlapProvider, Pipeline, ScriptedProvider};
