//! Result sinks
//!
//! The orchestrator reports run and case events to a `ResultSink`. The
//! console reporter prints progress; the report collector keeps every event
//! so the run can be written out as JSON.

use std::collections::BTreeMap;
use std::io::Read;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use colored::Colorize;
use serde::Serialize;

/// Kind of an attached log artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogKind {
    Text,
}

/// Receives the events of a run
pub trait ResultSink {
    fn run_started(&mut self, name: &str, case_count: usize);
    fn run_ended(&mut self, elapsed: Duration);
    fn case_started(&mut self, id: &str, timestamp: SystemTime);
    fn case_ended(&mut self, id: &str, timestamp: SystemTime, metadata: &BTreeMap<String, String>);
    fn case_failed(&mut self, id: &str, message: &str);
    fn attach_log(&mut self, name: &str, kind: LogKind, content: &mut dyn Read);
}

/// Forwards every event to each inner sink, in order
#[derive(Default)]
pub struct FanOut<'a> {
    sinks: Vec<&'a mut dyn ResultSink>,
}

impl<'a> FanOut<'a> {
    pub fn new() -> Self {
        Self { sinks: Vec::new() }
    }

    pub fn with(mut self, sink: &'a mut dyn ResultSink) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl ResultSink for FanOut<'_> {
    fn run_started(&mut self, name: &str, case_count: usize) {
        for sink in &mut self.sinks {
            sink.run_started(name, case_count);
        }
    }

    fn run_ended(&mut self, elapsed: Duration) {
        for sink in &mut self.sinks {
            sink.run_ended(elapsed);
        }
    }

    fn case_started(&mut self, id: &str, timestamp: SystemTime) {
        for sink in &mut self.sinks {
            sink.case_started(id, timestamp);
        }
    }

    fn case_ended(&mut self, id: &str, timestamp: SystemTime, metadata: &BTreeMap<String, String>) {
        for sink in &mut self.sinks {
            sink.case_ended(id, timestamp, metadata);
        }
    }

    fn case_failed(&mut self, id: &str, message: &str) {
        for sink in &mut self.sinks {
            sink.case_failed(id, message);
        }
    }

    fn attach_log(&mut self, name: &str, kind: LogKind, content: &mut dyn Read) {
        // Each sink needs its own reader, so buffer the content once
        let mut buffer = Vec::new();
        if let Err(e) = content.read_to_end(&mut buffer) {
            tracing::warn!("Failed to read log artifact '{}': {}", name, e);
            return;
        }
        for sink in &mut self.sinks {
            sink.attach_log(name, kind, &mut buffer.as_slice());
        }
    }
}

/// Prints run progress to stdout
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    current_failed: bool,
    passed: usize,
    failed: usize,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSink for ConsoleReporter {
    fn run_started(&mut self, name: &str, case_count: usize) {
        println!(
            "\n{} {} ({} test case{})",
            "Running:".blue().bold(),
            name.white().bold(),
            case_count,
            if case_count == 1 { "" } else { "s" }
        );
    }

    fn run_ended(&mut self, elapsed: Duration) {
        let summary = format!("{} passed, {} failed", self.passed, self.failed);
        let summary = if self.failed == 0 {
            summary.green().bold()
        } else {
            summary.red().bold()
        };
        println!(
            "\n{} {} in {:.1}s",
            "Result:".blue().bold(),
            summary,
            elapsed.as_secs_f64()
        );
    }

    fn case_started(&mut self, id: &str, _timestamp: SystemTime) {
        self.current_failed = false;
        println!("  {} {}", "▶".cyan(), id);
    }

    fn case_ended(
        &mut self,
        id: &str,
        _timestamp: SystemTime,
        _metadata: &BTreeMap<String, String>,
    ) {
        if self.current_failed {
            self.failed += 1;
            println!("  {} {}", "✗".red(), id.red());
        } else {
            self.passed += 1;
            println!("  {} {}", "✓".green(), id);
        }
    }

    fn case_failed(&mut self, _id: &str, message: &str) {
        self.current_failed = true;
        for line in message.lines() {
            println!("      {}", line.dimmed());
        }
    }

    fn attach_log(&mut self, name: &str, _kind: LogKind, _content: &mut dyn Read) {
        tracing::debug!("Log artifact attached: {}", name);
    }
}

/// Final state of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Running,
    Passed,
    Failed,
}

/// A log artifact attached to a case
#[derive(Debug, Clone, Serialize)]
pub struct LogArtifact {
    pub name: String,
    pub kind: LogKind,
    pub content: String,
}

/// Report entry for one test case
#[derive(Debug, Clone, Serialize)]
pub struct CaseReport {
    pub id: String,
    pub status: CaseStatus,
    pub started_at_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metadata: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogArtifact>,
}

/// Report for a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub name: String,
    pub case_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
    pub cases: Vec<CaseReport>,
}

impl RunReport {
    pub fn case(&self, id: &str) -> Option<&CaseReport> {
        self.cases.iter().find(|c| c.id == id)
    }
}

/// Records every event into a `RunReport`
#[derive(Debug, Default)]
pub struct ReportCollector {
    report: Option<RunReport>,
}

impl ReportCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected report, `None` if the run never started
    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    pub fn into_report(self) -> Option<RunReport> {
        self.report
    }

    fn case_mut(&mut self, id: &str) -> Option<&mut CaseReport> {
        self.report
            .as_mut()
            .and_then(|r| r.cases.iter_mut().rev().find(|c| c.id == id))
    }

    /// Most recently started case; log artifacts belong to it
    fn current_case(&mut self) -> Option<&mut CaseReport> {
        self.report.as_mut().and_then(|r| r.cases.last_mut())
    }
}

fn epoch_millis(timestamp: SystemTime) -> u64 {
    timestamp
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

impl ResultSink for ReportCollector {
    fn run_started(&mut self, name: &str, case_count: usize) {
        self.report = Some(RunReport {
            name: name.to_string(),
            case_count,
            ..Default::default()
        });
    }

    fn run_ended(&mut self, elapsed: Duration) {
        if let Some(report) = self.report.as_mut() {
            report.elapsed_ms = Some(elapsed.as_millis() as u64);
        }
    }

    fn case_started(&mut self, id: &str, timestamp: SystemTime) {
        if let Some(report) = self.report.as_mut() {
            report.cases.push(CaseReport {
                id: id.to_string(),
                status: CaseStatus::Running,
                started_at_ms: epoch_millis(timestamp),
                ended_at_ms: None,
                failures: Vec::new(),
                metadata: BTreeMap::new(),
                logs: Vec::new(),
            });
        }
    }

    fn case_ended(&mut self, id: &str, timestamp: SystemTime, metadata: &BTreeMap<String, String>) {
        if let Some(case) = self.case_mut(id) {
            if case.status == CaseStatus::Running {
                case.status = CaseStatus::Passed;
            }
            case.ended_at_ms = Some(epoch_millis(timestamp));
            case.metadata = metadata.clone();
        }
    }

    fn case_failed(&mut self, id: &str, message: &str) {
        if let Some(case) = self.case_mut(id) {
            case.status = CaseStatus::Failed;
            case.failures.push(message.to_string());
        }
    }

    fn attach_log(&mut self, name: &str, kind: LogKind, content: &mut dyn Read) {
        let mut buffer = Vec::new();
        if let Err(e) = content.read_to_end(&mut buffer) {
            tracing::warn!("Failed to read log artifact '{}': {}", name, e);
            return;
        }
        if let Some(case) = self.current_case() {
            case.logs.push(LogArtifact {
                name: name.to_string(),
                kind,
                content: String::from_utf8_lossy(&buffer).into_owned(),
            });
        }
    }
}
