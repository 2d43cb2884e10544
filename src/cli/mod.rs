//! CLI command handling
//!
//! Resolves the run configuration from the config file and flags, drives the
//! suite runner and formats output.

use std::path::Path;

use colored::Colorize;

use crate::commands::{Commands, RunArgs};
use crate::common::config::{Config, Overrides};
use crate::common::{logging, paths, Error, Result};
use crate::testing::{
    parse_global_variable, result, ConsoleReporter, FanOut, ReportCollector, SerialDevice,
    SuiteRunner, TestSource, TokioProcessRunner,
};
use crate::testing::workdir::WorkDirectory;

/// Exit status returned when at least one test case failed
pub const EXIT_TESTS_FAILED: i32 = 1;

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Run(args) => run(args).await,

        Commands::Inspect { result_file } => {
            let errors = result::parse_result_file(&result_file);
            if errors.is_empty() {
                println!("{} no failures recorded", "✓".green());
                Ok(0)
            } else {
                println!("{} {} failure(s):", "✗".red(), errors.len());
                for error in &errors {
                    println!("  {}", error);
                }
                Ok(EXIT_TESTS_FAILED)
            }
        }

        Commands::Paths => {
            let show = |p: Option<std::path::PathBuf>| {
                p.map(|p| p.display().to_string())
                    .unwrap_or_else(|| "(unavailable)".to_string())
            };
            println!("Config file: {}", show(paths::config_path()));
            println!("Log file:    {}", show(logging::log_path()));
            Ok(0)
        }
    }
}

/// Convert run flags into configuration overrides
pub fn overrides_from_args(args: &RunArgs) -> Result<Overrides> {
    let tests = args
        .tests
        .iter()
        .map(|t| t.parse::<TestSource>())
        .collect::<Result<Vec<_>>>()?;
    let global_variables = args
        .global_variables
        .iter()
        .map(|g| parse_global_variable(g))
        .collect::<Result<Vec<_>>>()?;
    let launcher = args
        .launcher
        .as_deref()
        .map(|l| l.split_whitespace().map(str::to_string).collect());

    Ok(Overrides {
        cli_jar: args.cli_jar.clone(),
        launcher,
        binaries: args.binaries.clone(),
        tests,
        global_variables,
        play_mode: args.play_mode,
        test_timeout_secs: args.timeout_secs,
        work_root: args.work_root.clone(),
        devices: args.devices.clone(),
    })
}

async fn run(args: RunArgs) -> Result<i32> {
    let mut config = Config::load(args.config.as_deref())?;
    config.merge(overrides_from_args(&args)?);
    let run_config = config.run_configuration()?;
    let devices: Vec<SerialDevice> = config
        .run
        .devices
        .iter()
        .cloned()
        .map(SerialDevice)
        .collect();
    if devices.is_empty() {
        tracing::warn!("No devices given; the CLI will pick its default device");
    }

    let mut console = ConsoleReporter::new();
    let mut collector = ReportCollector::new();
    let suite = SuiteRunner::new(run_config, TokioProcessRunner);
    let summary = {
        let mut sink = FanOut::new().with(&mut console).with(&mut collector);
        suite.run(&devices, &mut sink).await?
    };

    // Remove the work dir even when the report could not be written
    let report_written = args.report.as_deref().map(|path| write_report(path, &collector));

    if args.keep_work_dir {
        println!("Work directory kept at: {}", summary.work_dir.display());
    } else {
        WorkDirectory::at(&summary.work_dir).remove();
    }
    report_written.transpose()?;

    Ok(if summary.all_passed() {
        0
    } else {
        EXIT_TESTS_FAILED
    })
}

fn write_report(path: &Path, collector: &ReportCollector) -> Result<()> {
    if let Some(report) = collector.report() {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(path, json).map_err(|e| Error::FileWrite {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        println!("JSON report saved to: {}", path.display());
    }
    Ok(())
}

/// Map a top-level error to a hint printed after the message
pub fn hint(error: &Error) -> Option<&'static str> {
    match error {
        Error::CliNotFound(_) => Some(
            "Download uicd_cli.tar.gz from the UI Conductor releases and pass the extracted jar with --cli-jar",
        ),
        Error::DuplicateTestId { .. } => Some("Each test root must have a distinct directory name"),
        _ => None,
    }
}
