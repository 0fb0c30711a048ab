//! Suite discovery configuration
//!
//! A suite lives in a directory named by an environment variable and is
//! enumerated through a `test_files.txt` manifest inside it, one relative
//! file name per line. Discovery problems are setup errors that abort the
//! run before anything executes.

use specdrive_core::{Error, Result};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// Environment variable locating the CRUD suite directory
pub const CRUD_TESTS_PATH: &str = "CRUD_TESTS_PATH";

/// Environment variable locating the unified-format suite directory
pub const UNIFIED_TESTS_PATH: &str = "UNIFIED_TESTS_PATH";

/// Manifest file enumerating a suite's test files
pub const MANIFEST_FILE_NAME: &str = "test_files.txt";

/// A located suite directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteConfig {
    root: PathBuf,
}

impl SuiteConfig {
    /// Locate a suite through an environment variable
    ///
    /// # Errors
    ///
    /// Returns [`Error::Setup`] when the variable is unset or empty.
    pub fn from_env(variable: &str) -> Result<Self> {
        match env::var(variable) {
            Ok(value) if !value.is_empty() => Ok(Self::from_root(PathBuf::from(value))),
            _ => Err(Error::Setup(format!(
                "environment variable {variable} must name the suite directory"
            ))),
        }
    }

    /// Use an explicit suite directory
    pub fn from_root(root: PathBuf) -> Self {
        Self { root }
    }

    /// The suite directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve the suite's test files through its manifest
    ///
    /// Blank lines in the manifest are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Setup`] when the manifest is missing or unreadable.
    pub fn manifest(&self) -> Result<Vec<PathBuf>> {
        let manifest_path = self.root.join(MANIFEST_FILE_NAME);
        let contents = fs::read_to_string(&manifest_path).map_err(|e| {
            Error::Setup(format!(
                "cannot read manifest {}: {e}",
                manifest_path.display()
            ))
        })?;
        let files: Vec<PathBuf> = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| self.root.join(line))
            .collect();
        info!(root = %self.root.display(), files = files.len(), "suite manifest loaded");
        Ok(files)
    }
}
