//! Per-run scratch directory
//!
//! Holds the auxiliary binaries used by command-line actions and one output
//! subtree per test case. The directory outlives this type; removing it is
//! up to the caller.

use std::fs;
use std::path::{Path, PathBuf};

use crate::common::{Error, Result};

/// Directory (relative to a case's output dir) where the CLI writes results
const RESULTS_RELATIVE_PATH: &str = "result";

/// File name of the action execution result written by the CLI
pub const RESULT_FILE_NAME: &str = "action_execution_result";

/// A scratch directory owned by one run
#[derive(Debug, Clone)]
pub struct WorkDirectory {
    path: PathBuf,
}

impl WorkDirectory {
    /// Create a fresh, uniquely named directory under `root`
    ///
    /// Falls back to the system temp directory when `root` is `None`.
    pub fn create(root: Option<&Path>, prefix: &str) -> Result<Self> {
        let root = root
            .map(Path::to_path_buf)
            .unwrap_or_else(crate::common::paths::default_work_root);
        fs::create_dir_all(&root).map_err(|e| Error::work_dir(&root, e))?;

        let dir = tempfile::Builder::new()
            .prefix(&format!("{}_", prefix))
            .tempdir_in(&root)
            .map_err(|e| Error::work_dir(&root, e))?;
        // Keep the directory on disk after the handle is dropped
        let path = dir.keep();

        tracing::debug!("Created work directory {}", path.display());
        Ok(Self { path })
    }

    /// Use an existing directory as the work directory
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the directory and everything in it, logging any failure
    pub fn remove(&self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            tracing::warn!(
                "Failed to remove work directory {}: {}",
                self.path.display(),
                e
            );
        }
    }

    /// Output directory handed to the CLI for test case `id`
    pub fn case_output_dir(&self, id: &str) -> PathBuf {
        self.path.join(id)
    }

    /// Result file the CLI writes for test case `id`
    pub fn result_file(&self, id: &str) -> PathBuf {
        self.case_output_dir(id)
            .join(RESULTS_RELATIVE_PATH)
            .join(RESULT_FILE_NAME)
    }

    /// Copy `source` into the work directory root and make it executable
    pub fn install_executable(&self, source: &Path) -> Result<PathBuf> {
        let copied = copy_into(source, &self.path)?;
        make_executable(&copied)?;
        tracing::debug!("Installed {} as {}", source.display(), copied.display());
        Ok(copied)
    }
}

/// Copy a file, or a directory tree, into `dest_root`
///
/// The copy keeps the source's file name. Missing intermediate directories
/// are created.
pub fn copy_into(source: &Path, dest_root: &Path) -> Result<PathBuf> {
    let name = source.file_name().ok_or_else(|| {
        Error::invalid_argument(&source.display().to_string(), "path has no file name")
    })?;
    let metadata = fs::metadata(source).map_err(|e| Error::FileRead {
        path: source.display().to_string(),
        error: e.to_string(),
    })?;

    fs::create_dir_all(dest_root).map_err(|e| Error::work_dir(dest_root, e))?;
    let dest = dest_root.join(name);

    if metadata.is_dir() {
        fs::create_dir_all(&dest).map_err(|e| Error::work_dir(&dest, e))?;
        for entry in fs::read_dir(source)? {
            copy_into(&entry?.path(), &dest)?;
        }
    } else {
        fs::copy(source, &dest)?;
    }

    Ok(dest)
}

/// Add execute permission for the owner (`u+x`)
#[cfg(unix)]
fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = fs::metadata(path)?.permissions();
    permissions.set_mode(permissions.mode() | 0o100);
    fs::set_permissions(path, permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_under_root() {
        let root = tempdir().unwrap();
        let work_dir = WorkDirectory::create(Some(root.path()), "uicd").unwrap();

        assert!(work_dir.path().is_dir());
        assert!(work_dir.path().starts_with(root.path()));
        let name = work_dir.path().file_name().unwrap().to_string_lossy();
        assert!(name.starts_with("uicd_"));
    }

    #[test]
    fn test_create_twice_gives_distinct_dirs() {
        let root = tempdir().unwrap();
        let a = WorkDirectory::create(Some(root.path()), "uicd").unwrap();
        let b = WorkDirectory::create(Some(root.path()), "uicd").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_remove_deletes_tree() {
        let root = tempdir().unwrap();
        let work_dir = WorkDirectory::create(Some(root.path()), "uicd").unwrap();
        fs::create_dir_all(work_dir.case_output_dir("a.json").join("result")).unwrap();

        work_dir.remove();

        assert!(!work_dir.path().exists());
    }

    #[test]
    fn test_result_file_layout() {
        let work_dir = WorkDirectory::at("/work");
        assert_eq!(
            work_dir.result_file("tests#login.json"),
            PathBuf::from("/work/tests#login.json/result/action_execution_result")
        );
    }

    #[test]
    fn test_copy_into_copies_tree() {
        let src = tempdir().unwrap();
        let dest = tempdir().unwrap();
        let tree = src.path().join("tree");
        fs::create_dir_all(tree.join("nested")).unwrap();
        fs::write(tree.join("nested").join("a.txt"), "a").unwrap();

        let copied = copy_into(&tree, &dest.path().join("deeper")).unwrap();

        assert_eq!(copied, dest.path().join("deeper").join("tree"));
        let content = fs::read_to_string(copied.join("nested").join("a.txt")).unwrap();
        assert_eq!(content, "a");
    }

    #[test]
    fn test_copy_into_missing_source_fails() {
        let dest = tempdir().unwrap();
        let result = copy_into(&dest.path().join("missing.sh"), dest.path());
        assert!(matches!(result, Err(Error::FileRead { .. })));
    }

    #[cfg(unix)]
    #[test]
    fn test_install_executable_sets_exec_bit() {
        use std::os::unix::fs::PermissionsExt;

        let src = tempdir().unwrap();
        let binary = src.path().join("binary.sh");
        fs::write(&binary, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o644)).unwrap();

        let work = tempdir().unwrap();
        let installed = WorkDirectory::at(work.path())
            .install_executable(&binary)
            .unwrap();

        assert_eq!(installed, work.path().join("binary.sh"));
        let mode = fs::metadata(&installed).unwrap().permissions().mode();
        assert_eq!(mode & 0o100, 0o100);
    }
}
