//! Configuration file handling
//!
//! The TOML file supplies defaults for a run; command-line flags override
//! scalar settings and extend the lists. The merged result is turned into a
//! `RunConfiguration` exactly once.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::paths::config_path;
use super::{Error, Result};
use crate::testing::{
    default_launcher, PlayMode, RunConfiguration, TestSource, DEFAULT_RUN_NAME,
    DEFAULT_TEST_TIMEOUT,
};

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// UI Conductor CLI settings
    #[serde(default)]
    pub cli: CliConfig,

    /// Run settings
    #[serde(default)]
    pub run: RunSettings,

    /// Test files or directories
    #[serde(default)]
    pub tests: Vec<TestSource>,

    /// Key -> `name=value` global variables
    #[serde(default)]
    pub global_variables: HashMap<String, Vec<String>>,
}

/// Settings for the external CLI
#[derive(Debug, Deserialize)]
pub struct CliConfig {
    /// Path to the UI Conductor CLI jar
    pub jar: Option<PathBuf>,

    /// Launcher tokens placed before the jar path
    #[serde(default = "default_launcher")]
    pub launcher: Vec<String>,

    /// Additional binaries needed by command-line actions
    #[serde(default)]
    pub binaries: Vec<PathBuf>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            jar: None,
            launcher: default_launcher(),
            binaries: Vec::new(),
        }
    }
}

/// Run settings
#[derive(Debug, Deserialize)]
pub struct RunSettings {
    /// Name reported for the run
    #[serde(default = "default_run_name")]
    pub name: String,

    #[serde(default)]
    pub play_mode: PlayMode,

    /// Timeout for each test case
    #[serde(default = "default_test_timeout")]
    pub test_timeout_secs: u64,

    /// Directory under which the work directory is created
    pub work_root: Option<PathBuf>,

    /// Serial numbers of the devices handed to the CLI
    #[serde(default)]
    pub devices: Vec<String>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            play_mode: PlayMode::default(),
            test_timeout_secs: default_test_timeout(),
            work_root: None,
            devices: Vec::new(),
        }
    }
}

fn default_run_name() -> String {
    DEFAULT_RUN_NAME.to_string()
}

fn default_test_timeout() -> u64 {
    DEFAULT_TEST_TIMEOUT.as_secs()
}

/// Values given on the command line
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub cli_jar: Option<PathBuf>,
    pub launcher: Option<Vec<String>>,
    pub binaries: Vec<PathBuf>,
    pub tests: Vec<TestSource>,
    /// `(key, name=value)` pairs
    pub global_variables: Vec<(String, String)>,
    pub play_mode: Option<PlayMode>,
    pub test_timeout_secs: Option<u64>,
    pub work_root: Option<PathBuf>,
    pub devices: Vec<String>,
}

impl Config {
    /// Load configuration from `path`, or from the default config file
    ///
    /// An explicitly named file must exist. The default file is optional and
    /// defaults are used when it is absent. Relative paths inside a file are
    /// resolved against the file's directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        let mut config = Self::parse(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        if let Some(jar) = self.cli.jar.as_mut() {
            resolve(jar);
        }
        self.cli.binaries.iter_mut().for_each(resolve);
        self.tests.iter_mut().for_each(|t| resolve(&mut t.path));
        if let Some(root) = self.run.work_root.as_mut() {
            resolve(root);
        }
    }

    /// Apply command-line values on top of the file configuration
    pub fn merge(&mut self, overrides: Overrides) {
        if let Some(jar) = overrides.cli_jar {
            self.cli.jar = Some(jar);
        }
        if let Some(launcher) = overrides.launcher {
            self.cli.launcher = launcher;
        }
        self.cli.binaries.extend(overrides.binaries);
        self.tests.extend(overrides.tests);
        for (key, variable) in overrides.global_variables {
            self.global_variables.entry(key).or_default().push(variable);
        }
        if let Some(mode) = overrides.play_mode {
            self.run.play_mode = mode;
        }
        if let Some(secs) = overrides.test_timeout_secs {
            self.run.test_timeout_secs = secs;
        }
        if let Some(root) = overrides.work_root {
            self.run.work_root = Some(root);
        }
        self.run.devices.extend(overrides.devices);
    }

    /// Resolve the final run configuration
    pub fn run_configuration(&self) -> Result<RunConfiguration> {
        let jar = self.cli.jar.clone().ok_or_else(|| {
            Error::Config("No UI Conductor CLI jar configured (use --cli-jar)".to_string())
        })?;
        if self.tests.is_empty() {
            return Err(Error::Config(
                "No tests configured (use --test KEY=PATH)".to_string(),
            ));
        }
        if self.run.test_timeout_secs == 0 {
            return Err(Error::Config(
                "test_timeout_secs must be greater than zero".to_string(),
            ));
        }

        let mut config = RunConfiguration::new(jar);
        config.launcher = self.cli.launcher.clone();
        config.binaries = self.cli.binaries.clone();
        config.global_variables = self.global_variables.clone();
        config.play_mode = self.run.play_mode;
        config.test_timeout = Duration::from_secs(self.run.test_timeout_secs);
        config.tests = self.tests.clone();
        config.work_root = self.run.work_root.clone();
        config.run_name = self.run.name.clone();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[cli]
jar = "/opt/uicd/uicd-cli.jar"
binaries = ["/opt/uicd/helper.sh"]

[run]
play_mode = "PLAYALL"
test_timeout_secs = 60
devices = ["emulator-5554"]

[[tests]]
key = "login"
path = "/data/tests/login"

[global_variables]
login = ["uicd_user=alice"]
"#;

    #[test]
    fn test_parse_sample() {
        let config = Config::parse(SAMPLE).unwrap();
        assert_eq!(config.cli.jar, Some(PathBuf::from("/opt/uicd/uicd-cli.jar")));
        assert_eq!(config.cli.launcher, ["java", "-jar"]);
        assert_eq!(config.run.play_mode, PlayMode::PlayAll);
        assert_eq!(config.run.devices, ["emulator-5554"]);
        assert_eq!(config.tests, [TestSource::new("login", "/data/tests/login")]);
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.run.test_timeout_secs, 1800);
        assert_eq!(config.run.name, "UiConductorTest");
        assert!(config.cli.jar.is_none());
    }

    #[test]
    fn test_invalid_play_mode_is_parse_error() {
        let err = Config::parse("[run]\nplay_mode = \"SOMETIMES\"\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn test_merge_overrides_and_extends() {
        let mut config = Config::parse(SAMPLE).unwrap();
        config.merge(Overrides {
            play_mode: Some(PlayMode::Single),
            tests: vec![TestSource::new("extra", "/data/tests/extra.json")],
            global_variables: vec![("login".to_string(), "uicd_pass=secret".to_string())],
            devices: vec!["emulator-5556".to_string()],
            ..Default::default()
        });

        let run = config.run_configuration().unwrap();
        assert_eq!(run.play_mode, PlayMode::Single);
        assert_eq!(run.tests.len(), 2);
        assert_eq!(
            run.variables_for("login"),
            ["uicd_user=alice", "uicd_pass=secret"]
        );
        assert_eq!(run.test_timeout, Duration::from_secs(60));
        assert_eq!(config.run.devices, ["emulator-5554", "emulator-5556"]);
    }

    #[test]
    fn test_missing_jar_is_config_error() {
        let config = Config::parse("[[tests]]\nkey = \"a\"\npath = \"a.json\"\n").unwrap();
        assert!(matches!(config.run_configuration(), Err(Error::Config(_))));
    }

    #[test]
    fn test_relative_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[cli]\njar = \"cli.jar\"\n\n[[tests]]\nkey = \"a\"\npath = \"tests\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.cli.jar, Some(dir.path().join("cli.jar")));
        assert_eq!(config.tests[0].path, dir.path().join("tests"));
    }
}
