//! Shared test utilities for shotlog integration tests.
//!
//! `TestHarness` gives each test its own data root, an in-memory database
//! and a clock pinned to a known date.

pub mod harness;

pub use harness::TestHarness;
