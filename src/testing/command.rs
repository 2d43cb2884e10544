//! UI Conductor CLI command construction
//!
//! The flag literals and their order are the CLI's contract; they must not
//! change.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::config::RunConfiguration;
use super::device::Device;
use super::discovery::TestCase;
use super::workdir::WorkDirectory;

pub const INPUT_OPTION: &str = "--input";
pub const OUTPUT_OPTION: &str = "--output";
pub const MODE_OPTION: &str = "--mode";
pub const DEVICES_OPTION: &str = "--devices";
pub const GLOBAL_VARIABLE_OPTION: &str = "--global_variable";

/// A fully built CLI invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Program to execute (the first launcher token)
    pub program: OsString,
    /// Arguments after the program
    pub args: Vec<OsString>,
    /// Directory the process runs in
    pub working_dir: PathBuf,
}

impl CommandInvocation {
    /// The complete argument vector, program first
    pub fn argv(&self) -> Vec<OsString> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Space-separated rendering for logs
    pub fn display(&self) -> String {
        self.argv()
            .iter()
            .map(|a| a.to_string_lossy())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Build the CLI invocation for one test case
///
/// Layout: launcher tokens, CLI jar, `--input`, `--output`, `--mode`, then
/// `--devices` when at least one device is given and `--global_variable`
/// when the case's key has variables. Identical inputs always give an
/// identical invocation.
pub fn build_command<D: Device>(
    case: &TestCase,
    devices: &[D],
    config: &RunConfiguration,
    work_dir: &WorkDirectory,
) -> CommandInvocation {
    let mut argv: Vec<OsString> = config.launcher.iter().map(OsString::from).collect();
    argv.push(config.cli_jar.clone().into_os_string());

    argv.push(INPUT_OPTION.into());
    argv.push(case.source_file.clone().into_os_string());

    argv.push(OUTPUT_OPTION.into());
    argv.push(work_dir.case_output_dir(&case.id).into_os_string());

    argv.push(MODE_OPTION.into());
    argv.push(config.play_mode.as_str().into());

    if !devices.is_empty() {
        let serials: Vec<&str> = devices.iter().map(|d| d.serial_number()).collect();
        argv.push(DEVICES_OPTION.into());
        argv.push(serials.join(",").into());
    }

    let variables = config.variables_for(&case.key);
    if !variables.is_empty() {
        argv.push(GLOBAL_VARIABLE_OPTION.into());
        argv.push(variables.join(",").into());
    }

    let mut argv = argv.into_iter();
    // An empty launcher means the jar itself is the program
    let program = argv.next().unwrap_or_default();
    CommandInvocation {
        program,
        args: argv.collect(),
        working_dir: work_dir.path().to_path_buf(),
    }
}

/// Whether `program` can be found, either as a path or on `PATH`
pub fn program_available(program: &Path) -> bool {
    program.components().count() > 1 && program.exists() || which::which(program).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PlayMode;

    fn case(key: &str) -> TestCase {
        TestCase {
            id: "suite#test.json".to_string(),
            key: key.to_string(),
            source_file: PathBuf::from("/tests/suite/test.json"),
        }
    }

    fn args(invocation: &CommandInvocation) -> Vec<String> {
        invocation
            .argv()
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_default_command_layout() {
        let config = RunConfiguration::new("/opt/uicd/cli.jar");
        let work_dir = WorkDirectory::at("/work");

        let invocation = build_command(&case("TEST"), &["SERIAL"], &config, &work_dir);

        assert_eq!(
            args(&invocation),
            [
                "java",
                "-jar",
                "/opt/uicd/cli.jar",
                "--input",
                "/tests/suite/test.json",
                "--output",
                "/work/suite#test.json",
                "--mode",
                "SINGLE",
                "--devices",
                "SERIAL",
            ]
        );
        assert_eq!(invocation.working_dir, PathBuf::from("/work"));
    }

    #[test]
    fn test_play_all_with_two_devices_and_no_variables() {
        let mut config = RunConfiguration::new("/opt/uicd/cli.jar");
        config.play_mode = PlayMode::PlayAll;
        config.add_global_variable("OTHER", "key=value");

        let invocation = build_command(
            &case("TEST"),
            &["SERIAL1", "SERIAL2"],
            &config,
            &WorkDirectory::at("/work"),
        );

        let argv = args(&invocation);
        assert_eq!(
            argv[argv.len() - 4..],
            ["--mode", "PLAYALL", "--devices", "SERIAL1,SERIAL2"]
        );
        assert!(!argv.iter().any(|a| a == GLOBAL_VARIABLE_OPTION));
    }

    #[test]
    fn test_global_variables_joined_in_order() {
        let mut config = RunConfiguration::new("/opt/uicd/cli.jar");
        config.add_global_variable("TEST", "key1=value1");
        config.add_global_variable("TEST", "key2=value2");

        let invocation = build_command(
            &case("TEST"),
            &["SERIAL"],
            &config,
            &WorkDirectory::at("/work"),
        );

        let argv = args(&invocation);
        assert_eq!(
            argv[argv.len() - 2..],
            ["--global_variable", "key1=value1,key2=value2"]
        );
    }

    #[test]
    fn test_devices_keep_given_order() {
        let config = RunConfiguration::new("/opt/uicd/cli.jar");
        let invocation = build_command(
            &case("TEST"),
            &["zz-serial", "aa-serial"],
            &config,
            &WorkDirectory::at("/work"),
        );
        assert_eq!(args(&invocation).last().unwrap(), "zz-serial,aa-serial");
    }

    #[test]
    fn test_no_devices_omits_flag() {
        let config = RunConfiguration::new("/opt/uicd/cli.jar");
        let devices: [&str; 0] = [];
        let invocation = build_command(
            &case("TEST"),
            &devices,
            &config,
            &WorkDirectory::at("/work"),
        );
        assert!(!args(&invocation).iter().any(|a| a == DEVICES_OPTION));
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut config = RunConfiguration::new("/opt/uicd/cli.jar");
        config.play_mode = PlayMode::MultiDevice;
        config.add_global_variable("TEST", "a=1");
        let work_dir = WorkDirectory::at("/work");
        let devices = ["SERIAL1".to_string(), "SERIAL2".to_string()];

        let first = build_command(&case("TEST"), &devices, &config, &work_dir);
        let second = build_command(&case("TEST"), &devices, &config, &work_dir);

        assert_eq!(first, second);
    }

    #[test]
    fn test_custom_launcher() {
        let mut config = RunConfiguration::new("/opt/uicd/run.sh");
        config.launcher = vec!["sh".to_string()];
        let invocation = build_command(
            &case("TEST"),
            &["SERIAL"],
            &config,
            &WorkDirectory::at("/work"),
        );
        assert_eq!(invocation.program, OsString::from("sh"));
        assert_eq!(invocation.args[0], OsString::from("/opt/uicd/run.sh"));
    }
}
