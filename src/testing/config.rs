//! Run configuration types
//!
//! A `RunConfiguration` is resolved once, before the run starts, and passed
//! to the orchestrator by value. Nothing in the runner looks options up by
//! name afterwards.

use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::common::Error;

/// Timeout applied to each test case when none is configured (30 minutes)
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Run name reported to result sinks when none is configured
pub const DEFAULT_RUN_NAME: &str = "UiConductorTest";

/// How the UI Conductor CLI distributes a test across the given devices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "UPPERCASE")]
pub enum PlayMode {
    /// Play on a single device
    #[default]
    #[value(name = "SINGLE")]
    Single,
    /// One test driving several devices at once
    #[value(name = "MULTIDEVICE")]
    MultiDevice,
    /// Play the same test on every device
    #[value(name = "PLAYALL")]
    PlayAll,
}

impl PlayMode {
    /// Canonical name passed on the CLI command line
    pub fn as_str(&self) -> &'static str {
        match self {
            PlayMode::Single => "SINGLE",
            PlayMode::MultiDevice => "MULTIDEVICE",
            PlayMode::PlayAll => "PLAYALL",
        }
    }
}

impl fmt::Display for PlayMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SINGLE" => Ok(PlayMode::Single),
            "MULTIDEVICE" => Ok(PlayMode::MultiDevice),
            "PLAYALL" => Ok(PlayMode::PlayAll),
            _ => Err(Error::invalid_argument(
                s,
                "expected one of SINGLE, MULTIDEVICE, PLAYALL",
            )),
        }
    }
}

/// A JSON test file or directory of test files, tagged with the key whose
/// global variables apply to it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TestSource {
    /// Grouping key; selects the global variables passed to the CLI
    pub key: String,
    /// Test file or directory
    pub path: PathBuf,
}

impl TestSource {
    pub fn new(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            key: key.into(),
            path: path.into(),
        }
    }
}

impl FromStr for TestSource {
    type Err = Error;

    /// Parses `KEY=PATH`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, path)) if !key.is_empty() && !path.is_empty() => {
                Ok(TestSource::new(key, path))
            }
            _ => Err(Error::invalid_argument(s, "expected KEY=PATH")),
        }
    }
}

/// Parses a `KEY=NAME=VALUE` global variable argument into its key and the
/// `NAME=VALUE` pair handed to the CLI
pub fn parse_global_variable(s: &str) -> Result<(String, String), Error> {
    match s.split_once('=') {
        Some((key, variable)) if !key.is_empty() && variable.contains('=') => {
            Ok((key.to_string(), variable.to_string()))
        }
        _ => Err(Error::invalid_argument(s, "expected KEY=NAME=VALUE")),
    }
}

/// Fully resolved settings for one run
#[derive(Debug, Clone)]
pub struct RunConfiguration {
    /// UI Conductor CLI jar (or other executable artifact)
    pub cli_jar: PathBuf,
    /// Tokens placed before the jar path, `java -jar` by default
    pub launcher: Vec<String>,
    /// Additional binaries needed by command-line actions
    pub binaries: Vec<PathBuf>,
    /// Key -> `name=value` strings, in registration order
    pub global_variables: HashMap<String, Vec<String>>,
    pub play_mode: PlayMode,
    /// Deadline for each test case
    pub test_timeout: Duration,
    /// Test files or directories, in the order they were given
    pub tests: Vec<TestSource>,
    /// Parent of the per-run work directory; the system temp dir if unset
    pub work_root: Option<PathBuf>,
    /// Name reported to the result sinks
    pub run_name: String,
}

impl RunConfiguration {
    /// Configuration with defaults for everything except the CLI jar
    pub fn new(cli_jar: impl Into<PathBuf>) -> Self {
        Self {
            cli_jar: cli_jar.into(),
            launcher: default_launcher(),
            binaries: Vec::new(),
            global_variables: HashMap::new(),
            play_mode: PlayMode::default(),
            test_timeout: DEFAULT_TEST_TIMEOUT,
            tests: Vec::new(),
            work_root: None,
            run_name: DEFAULT_RUN_NAME.to_string(),
        }
    }

    /// Register a test file or directory under `key`
    pub fn add_test(&mut self, key: impl Into<String>, path: impl Into<PathBuf>) {
        self.tests.push(TestSource::new(key, path));
    }

    /// Append a `name=value` global variable for `key`
    pub fn add_global_variable(&mut self, key: impl Into<String>, variable: impl Into<String>) {
        self.global_variables
            .entry(key.into())
            .or_default()
            .push(variable.into());
    }

    /// Global variables registered for `key`, empty if none
    pub fn variables_for(&self, key: &str) -> &[String] {
        self.global_variables
            .get(key)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

pub fn default_launcher() -> Vec<String> {
    vec!["java".to_string(), "-jar".to_string()]
}
