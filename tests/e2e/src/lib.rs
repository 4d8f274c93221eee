//! Portfolio E2E Tests
//!
//! Runs the smoke suites against a local solana-test-validator with the
//! built portfolio program preloaded, and optionally against devnet.

pub mod utils;

pub use harness::*;
