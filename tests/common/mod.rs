//! Shared test utilities for the integration test suites.
//!
//! Import via `mod common;` from any test's main file.

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Once;
use tempfile::TempDir;

// ============================================================================
// Initialization
// ============================================================================

static INIT_TRACING: Once = Once::new();

/// Install a test-friendly tracing subscriber once per process.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "warn".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

// ============================================================================
// TestSuite - On-disk suite directory wrapper
// ============================================================================

/// A temporary suite directory with a manifest, mirroring the layout the
/// runner discovers through environment variables.
pub struct TestSuite {
    pub dir: TempDir,
}

impl TestSuite {
    /// Create an empty suite with an empty manifest.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create suite dir");
        fs::write(dir.path().join("test_files.txt"), "").expect("write manifest");
        Self { dir }
    }

    /// Add a test file and register it in the manifest.
    pub fn add_file(&self, name: &str, contents: &serde_json::Value) {
        fs::write(self.dir.path().join(name), contents.to_string()).expect("write test file");
        let manifest_path = self.dir.path().join("test_files.txt");
        let mut manifest = fs::read_to_string(&manifest_path).expect("read manifest");
        manifest.push_str(name);
        manifest.push('\n');
        fs::write(&manifest_path, manifest).expect("update manifest");
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
