//! UI Conductor test runner
//!
//! Discovers JSON test definitions, runs each one through the UI Conductor
//! CLI under a timeout, and turns the action result tree the CLI writes into
//! a pass/fail verdict per test case.

pub mod command;
mod config;
pub mod device;
pub mod discovery;
pub mod process;
pub mod result;
mod runner;
pub mod sink;
pub mod workdir;

pub use config::*;
pub use device::{Device, SerialDevice};
pub use discovery::TestCase;
pub use process::{CommandStatus, ExecutionOutcome, ProcessRunner, TokioProcessRunner};
pub use runner::{RunSummary, SuiteRunner};
pub use sink::{ConsoleReporter, FanOut, ReportCollector, ResultSink};
