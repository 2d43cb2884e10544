//! Test case discovery
//!
//! Expands the configured test files and directories into an ordered list of
//! test cases. Each case gets an id derived from its relative path, usable
//! both as a display label and as a single path segment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::config::TestSource;
use crate::common::{Error, Result};

/// Replaces path separators inside test ids
pub const ID_DELIMITER: char = '#';

/// One JSON test definition to hand to the CLI
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    /// Unique within a run
    pub id: String,
    /// Key of the source this case came from; selects global variables
    pub key: String,
    /// Absolute path to the JSON test definition
    pub source_file: PathBuf,
}

/// Discover the test cases under a single file or directory
///
/// A file yields one case named after the file. A directory yields every
/// regular file beneath it, sorted by relative path, with ids relative to the
/// directory's parent so that `suite_a/login.json` and `suite_b/login.json`
/// stay distinct.
pub fn discover(key: &str, path: &Path) -> Result<Vec<TestCase>> {
    let not_found = || Error::TestNotFound {
        key: key.to_string(),
        path: path.to_path_buf(),
    };
    // Ids come from the path as given; symlinks are followed only for reading
    let root = std::path::absolute(path).map_err(|_| not_found())?;
    let metadata = std::fs::metadata(&root).map_err(|_| not_found())?;

    if metadata.is_file() {
        let id = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| Error::invalid_argument(&root.display().to_string(), "not a file"))?;
        let source_file = root.canonicalize().map_err(|_| not_found())?;
        return Ok(vec![TestCase {
            id,
            key: key.to_string(),
            source_file,
        }]);
    }

    let base = root.parent().unwrap_or(&root).to_path_buf();
    let mut files = Vec::new();
    for entry in WalkDir::new(&root).follow_links(true) {
        let entry = entry.map_err(|e| Error::FileRead {
            path: root.display().to_string(),
            error: e.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let relative = entry
            .path()
            .strip_prefix(&base)
            .map_err(|e| Error::Internal(format!("Walked outside test root: {}", e)))?;
        let sort_key = relative.to_string_lossy().into_owned();
        let id = test_id(relative);
        let source_file = entry.path().canonicalize()?;
        files.push((sort_key, id, source_file));
    }
    files.sort_by(|a, b| a.0.cmp(&b.0));

    tracing::debug!(
        "Discovered {} test file(s) under {} (key '{}')",
        files.len(),
        root.display(),
        key
    );

    Ok(files
        .into_iter()
        .map(|(_, id, source_file)| TestCase {
            id,
            key: key.to_string(),
            source_file,
        })
        .collect())
}

/// Discover every source in order and concatenate the results
///
/// Fails on the first missing source, or if two sources produce the same id.
pub fn discover_all(sources: &[TestSource]) -> Result<Vec<TestCase>> {
    let mut cases = Vec::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();

    for source in sources {
        for case in discover(&source.key, &source.path)? {
            if let Some(first) = seen.get(&case.id) {
                return Err(Error::DuplicateTestId {
                    id: case.id,
                    first: first.clone(),
                    second: case.source_file,
                });
            }
            seen.insert(case.id.clone(), case.source_file.clone());
            cases.push(case);
        }
    }

    Ok(cases)
}

/// Join the components of a relative path with `ID_DELIMITER`
fn test_id(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join(&ID_DELIMITER.to_string())
}
