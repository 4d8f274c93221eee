//! Portfolio Program Smoke Harness
//!
//! Drives the deployed portfolio program through create and update
//! instructions, reads the accounts back, and compares what landed on chain
//! with what was sent.

pub mod config;
pub mod discriminator;
pub mod error;
pub mod idl;
pub mod instruction;
pub mod keypair;
pub mod report;
pub mod retry;
pub mod scenario;
pub mod session;
pub mod state;

pub use config::Config;
pub use report::{Check, RunSummary, SuiteReport};
pub use scenario::{run_lifecycle, run_suite, run_suites, Lifecycle, Suite, Timings};
pub use session::{ProgramSession, RpcSession, Submission};
