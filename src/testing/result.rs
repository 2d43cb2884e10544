//! Action execution result parsing
//!
//! The CLI writes a tree of action results for each test case. Leaf actions
//! carry the failure details; container actions aggregate their children.
//! Field names are fixed by the CLI's output format.

use serde::Deserialize;
use std::path::Path;

/// Play status marking a failed action (compared case-insensitively)
const FAIL_STATUS: &str = "FAIL";

/// One node of the action execution result tree
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ResultNode {
    pub play_status: Option<String>,
    pub action_id: Option<String>,
    pub content: Option<String>,
    pub validation_details: Option<String>,
    pub children_result: Option<Vec<ResultNode>>,
}

impl ResultNode {
    /// Whether this node's own status is a failure
    pub fn is_failure(&self) -> bool {
        self.play_status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case(FAIL_STATUS))
    }

    /// `actionId (content): validationDetails`, blanks for missing fields
    fn failure_message(&self) -> String {
        format!(
            "{} ({}): {}",
            self.action_id.as_deref().unwrap_or(""),
            self.content.as_deref().unwrap_or(""),
            self.validation_details.as_deref().unwrap_or("")
        )
    }
}

/// Collect failure messages from a result tree, descendants before ancestors
pub fn collect_errors(node: &ResultNode) -> Vec<String> {
    let mut errors = Vec::new();
    collect_into(node, &mut errors);
    errors
}

fn collect_into(node: &ResultNode, errors: &mut Vec<String>) {
    for child in node.children_result.iter().flatten() {
        collect_into(child, errors);
    }
    if node.is_failure() {
        errors.push(node.failure_message());
    }
}

/// Parse result file text; an empty or `null` document has no errors
pub fn parse_result(content: &str) -> serde_json::Result<Vec<String>> {
    if content.trim().is_empty() {
        return Ok(Vec::new());
    }
    let root: Option<ResultNode> = serde_json::from_str(content)?;
    Ok(root.as_ref().map(collect_errors).unwrap_or_default())
}

/// Read and evaluate a result file
///
/// Never fails: a missing, unreadable or malformed file is reported as a
/// single error message. An empty list means the test case passed.
pub fn parse_result_file(path: &Path) -> Vec<String> {
    if !path.exists() {
        return vec![format!("Test result file not found: {}", path.display())];
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return vec![format!(
                "Failed to read test result file '{}': {}",
                path.display(),
                e
            )]
        }
    };

    match parse_result(&content) {
        Ok(errors) => errors,
        Err(e) => {
            tracing::warn!("Invalid test result file {}: {}", path.display(), e);
            vec![format!(
                "Invalid test result file '{}': {}",
                path.display(),
                e
            )]
        }
    }
}
