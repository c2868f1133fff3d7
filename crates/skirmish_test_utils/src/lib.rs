//! # Skirmish Test Utilities
//!
//! Shared testing utilities for the simulation crates:
//! - Determinism test harness
//! - Fixture and scenario helpers
//! - Pickers standing in for the presentation layer's hit test
//! - Property-based testing strategies

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod determinism;
pub mod fixtures;
pub mod pickers;

/// Re-export proptest for convenience.
pub use proptest;

/// Install a `tracing` subscriber that writes through the test harness.
///
/// Filtering follows `RUST_LOG`. Safe to call from every test; only the
/// first call installs the subscriber.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
