//! CLI command definitions
//!
//! Defines the clap commands for the runner.

use clap::{Args, Subcommand};
use std::path::PathBuf;

use crate::testing::PlayMode;

#[derive(Subcommand)]
pub enum Commands {
    /// Run UI Conductor tests through the uicd CLI
    Run(RunArgs),

    /// Print the failures recorded in an action execution result file
    Inspect {
        /// Path to an `action_execution_result` file
        result_file: PathBuf,
    },

    /// Show the configuration and log file locations
    Paths,
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Configuration file (default: the platform config directory)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// UI Conductor CLI jar to use when running tests
    #[arg(long)]
    pub cli_jar: Option<PathBuf>,

    /// JSON test file or directory of JSON test files, as KEY=PATH
    /// Can be specified multiple times; KEY selects the global variables
    #[arg(long = "test", short = 't')]
    pub tests: Vec<String>,

    /// Additional binary needed by command line actions. Can be repeated
    #[arg(long = "binary")]
    pub binaries: Vec<PathBuf>,

    /// Global variable for tests with KEY, as KEY=NAME=VALUE. Can be repeated
    #[arg(long = "global-variable", short = 'g')]
    pub global_variables: Vec<String>,

    /// Play mode
    #[arg(long, value_enum, ignore_case = true)]
    pub play_mode: Option<PlayMode>,

    /// Timeout for each test case, in seconds
    #[arg(long = "timeout")]
    pub timeout_secs: Option<u64>,

    /// Serial number of a device to run on. Can be repeated
    #[arg(long = "device", short = 'd')]
    pub devices: Vec<String>,

    /// Directory under which the work directory is created
    #[arg(long)]
    pub work_root: Option<PathBuf>,

    /// Keep the work directory after the run
    #[arg(long)]
    pub keep_work_dir: bool,

    /// Write a JSON report of the run to this file
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Replace the `java -jar` launcher (space separated tokens)
    #[arg(long)]
    pub launcher: Option<String>,
}
