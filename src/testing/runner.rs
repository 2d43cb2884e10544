//! Test run orchestration
//!
//! Validates the configuration, discovers the test cases, prepares the work
//! directory and then runs every case through the CLI, one at a time.
//! Configuration problems abort the run before anything is reported; a
//! failing case never stops the cases after it.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use super::command::{build_command, program_available};
use super::config::RunConfiguration;
use super::device::Device;
use super::discovery::{discover_all, TestCase};
use super::process::{CommandStatus, ExecutionOutcome, ProcessRunner};
use super::result::parse_result_file;
use super::sink::{LogKind, ResultSink};
use super::workdir::{WorkDirectory, RESULT_FILE_NAME};
use crate::common::{Error, Result};

/// Prefix of the per-run work directory name
const WORK_DIR_PREFIX: &str = "uicd";

/// Totals for a finished run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub elapsed: Duration,
    /// Work directory left on disk for the caller to inspect or remove
    pub work_dir: PathBuf,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Runs UI Conductor test cases through the CLI
pub struct SuiteRunner<P> {
    config: RunConfiguration,
    process_runner: P,
}

impl<P: ProcessRunner> SuiteRunner<P> {
    pub fn new(config: RunConfiguration, process_runner: P) -> Self {
        Self {
            config,
            process_runner,
        }
    }

    /// Execute the whole run, reporting to `sink`
    ///
    /// Returns an error only for configuration problems found before the run
    /// starts; in that case nothing has been reported.
    pub async fn run<D: Device>(
        &self,
        devices: &[D],
        sink: &mut dyn ResultSink,
    ) -> Result<RunSummary> {
        self.validate()?;

        let cases = discover_all(&self.config.tests)?;
        let work_dir =
            WorkDirectory::create(self.config.work_root.as_deref(), WORK_DIR_PREFIX)?;
        for binary in &self.config.binaries {
            if let Err(e) = work_dir.install_executable(binary) {
                work_dir.remove();
                return Err(e);
            }
        }

        tracing::info!(
            "Starting {} UI Conductor test case(s) in {}",
            cases.len(),
            work_dir.path().display()
        );

        let started = Instant::now();
        sink.run_started(&self.config.run_name, cases.len());

        let mut failed = 0;
        for case in &cases {
            if !self.run_case(case, devices, &work_dir, sink).await {
                failed += 1;
            }
        }

        let elapsed = started.elapsed();
        sink.run_ended(elapsed);
        tracing::info!(
            "Finished UI Conductor tests: {} passed, {} failed",
            cases.len() - failed,
            failed
        );

        Ok(RunSummary {
            total: cases.len(),
            passed: cases.len() - failed,
            failed,
            elapsed,
            work_dir: work_dir.path().to_path_buf(),
        })
    }

    fn validate(&self) -> Result<()> {
        if !self.config.cli_jar.is_file() {
            tracing::error!(
                "UI Conductor CLI not found: {}",
                self.config.cli_jar.display()
            );
            return Err(Error::CliNotFound(self.config.cli_jar.clone()));
        }
        if let Some(launcher) = self.config.launcher.first() {
            if !program_available(Path::new(launcher)) {
                tracing::warn!("Launcher '{}' was not found on PATH", launcher);
            }
        }
        Ok(())
    }

    /// Run one case and report it; returns whether it passed
    async fn run_case<D: Device>(
        &self,
        case: &TestCase,
        devices: &[D],
        work_dir: &WorkDirectory,
        sink: &mut dyn ResultSink,
    ) -> bool {
        sink.case_started(&case.id, SystemTime::now());

        let invocation = build_command(case, devices, &self.config, work_dir);
        tracing::debug!("Running {}: {}", case.id, invocation.display());

        let outcome = self
            .process_runner
            .run(&invocation, self.config.test_timeout)
            .await;
        log_output(&case.id, &outcome);

        let errors = match &outcome.status {
            CommandStatus::Success => {
                let result_file = work_dir.result_file(&case.id);
                let errors = parse_result_file(&result_file);
                attach_result_file(case, &result_file, sink);
                errors
            }
            CommandStatus::Failed { .. } | CommandStatus::Error(_) | CommandStatus::TimedOut(_) => {
                vec![format!(
                    "UI Conductor CLI {} ({})",
                    outcome.status,
                    outcome.status.label()
                )]
            }
        };

        let passed = errors.is_empty();
        if !passed {
            tracing::info!("Test {} failed due to following errors:", case.id);
            for error in &errors {
                tracing::info!("  {}", error);
            }
            sink.case_failed(&case.id, &errors.join("\n"));
        }

        let mut metadata = BTreeMap::new();
        metadata.insert(
            "command_status".to_string(),
            outcome.status.label().to_string(),
        );
        sink.case_ended(&case.id, SystemTime::now(), &metadata);
        passed
    }
}

/// Log captured CLI output between start/end banners
fn log_output(id: &str, outcome: &ExecutionOutcome) {
    tracing::info!("CLI for {} finished: {}", id, outcome.status.label());
    for (kind, content) in [("STD", &outcome.stdout), ("ERR", &outcome.stderr)] {
        if content.is_empty() {
            continue;
        }
        tracing::info!("=========== {} logs for {} starts ===========", kind, id);
        tracing::info!("{}", content.trim_end());
        tracing::info!("=========== {} logs for {} ends ===========", kind, id);
    }
}

fn attach_result_file(case: &TestCase, result_file: &Path, sink: &mut dyn ResultSink) {
    if !result_file.exists() {
        return;
    }
    match File::open(result_file) {
        Ok(mut file) => {
            let name = format!("{}_{}", case.id, RESULT_FILE_NAME);
            sink.attach_log(&name, LogKind::Text, &mut file);
        }
        Err(e) => tracing::warn!(
            "Could not attach result file {}: {}",
            result_file.display(),
            e
        ),
    }
}
