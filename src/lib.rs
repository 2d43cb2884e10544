//! UI Conductor test runner
//!
//! Runs pre-recorded UI Conductor tests through the uicd command-line tool
//! and reports a pass/fail verdict for every test case.

pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use testing::{RunConfiguration, SuiteRunner};
