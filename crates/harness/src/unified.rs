//! Unified-format validation pass
//!
//! Files in the newer unified layout are not executed yet; this pass
//! proves they parse, applies the schema and requirement gates, and
//! reports which cases would run. Execution support can replace the body
//! of [`validate_file`] without changing callers.

use crate::config::SuiteConfig;
use crate::gate::{schema_compatible, ServerInfo};
use crate::loader::RunOnRequirement;
use serde::Deserialize;
use specdrive_client::Client;
use specdrive_core::{Result, Version};
use std::path::{Path, PathBuf};
use tracing::info;

/// A parsed unified-format test file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedFile {
    /// Declared schema version
    pub schema_version: Version,
    /// Human-readable file description
    pub description: String,
    /// File-level requirement alternatives
    #[serde(default)]
    pub run_on_requirements: Vec<RunOnRequirement>,
    /// Declared cases
    pub tests: Vec<UnifiedCase>,
}

/// One case of a unified-format file
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnifiedCase {
    /// Case identifier
    pub description: String,
    /// Case-level requirement alternatives, combined with the file's
    #[serde(default)]
    pub run_on_requirements: Vec<RunOnRequirement>,
    /// Author-declared reason the case must not run
    pub skip_reason: Option<String>,
}

/// Validation result for one unified-format file
#[derive(Debug, Clone)]
pub struct UnifiedFileReport {
    /// Path the file was loaded from
    pub path: PathBuf,
    /// Whether the schema gate excluded the whole file
    pub schema_skipped: bool,
    /// Descriptions of cases that would execute
    pub eligible: Vec<String>,
    /// Descriptions of skipped cases, with the skip reason
    pub skipped: Vec<(String, String)>,
}

/// Validate one unified-format file against a client's server
///
/// # Errors
///
/// Returns a fatal error when the file cannot be read or parsed, or when
/// server introspection fails.
pub fn validate_file(
    client: &dyn Client,
    server: &ServerInfo,
    path: &Path,
) -> Result<UnifiedFileReport> {
    let contents = std::fs::read_to_string(path)?;
    let file: UnifiedFile = serde_json::from_str(&contents)?;
    if !schema_compatible(&file.schema_version) {
        info!(
            path = %path.display(),
            schema_version = %file.schema_version,
            "unified file skipped: unsupported schema version"
        );
        return Ok(UnifiedFileReport {
            path: path.to_path_buf(),
            schema_skipped: true,
            eligible: Vec::new(),
            skipped: Vec::new(),
        });
    }
    let mut report = UnifiedFileReport {
        path: path.to_path_buf(),
        schema_skipped: false,
        eligible: Vec::new(),
        skipped: Vec::new(),
    };
    let file_eligible = server.requirements_met(client, &file.run_on_requirements)?;
    for case in &file.tests {
        if let Some(reason) = &case.skip_reason {
            report.skipped.push((case.description.clone(), reason.clone()));
            continue;
        }
        if !file_eligible {
            report.skipped.push((
                case.description.clone(),
                "file runOn requirements unsatisfied".to_string(),
            ));
            continue;
        }
        if !server.requirements_met(client, &case.run_on_requirements)? {
            report.skipped.push((
                case.description.clone(),
                "case runOn requirements unsatisfied".to_string(),
            ));
            continue;
        }
        report.eligible.push(case.description.clone());
    }
    Ok(report)
}

/// Validate every unified-format file named by a suite's manifest
///
/// # Errors
///
/// Returns a fatal error for discovery, I/O, or parse problems.
pub fn validate_suite(client: &dyn Client, config: &SuiteConfig) -> Result<Vec<UnifiedFileReport>> {
    let server = ServerInfo::new();
    let mut reports = Vec::new();
    for path in config.manifest()? {
        reports.push(validate_file(client, &server, &path)?);
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use specdrive_client::MemoryClient;
    use specdrive_core::Topology;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_file(value: serde_json::Value) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(value.to_string().as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_eligible_and_skipped_cases() {
        let file = write_file(json!({
            "schemaVersion": "1.1",
            "description": "insert behaviors",
            "tests": [
                {"description": "runs"},
                {"description": "declared skip", "skipReason": "not implemented"},
                {"description": "needs future server",
                 "runOnRequirements": [{"minServerVersion": "99.0"}]}
            ]
        }));
        let client = MemoryClient::new();
        let server = ServerInfo::new();
        let report = validate_file(&client, &server, file.path()).unwrap();
        assert!(!report.schema_skipped);
        assert_eq!(report.eligible, vec!["runs"]);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].1, "not implemented");
    }

    #[test]
    fn test_file_level_requirements_gate_every_case() {
        let file = write_file(json!({
            "schemaVersion": "1.0",
            "description": "replica-set only",
            "runOnRequirements": [{"topologies": ["replicaset"]}],
            "tests": [{"description": "never eligible here"}]
        }));
        let client = MemoryClient::with_server(Version::new(7, 0, 0), Topology::Single);
        let server = ServerInfo::new();
        let report = validate_file(&client, &server, file.path()).unwrap();
        assert!(report.eligible.is_empty());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_unsupported_schema_version() {
        let file = write_file(json!({
            "schemaVersion": "1.22",
            "description": "too new",
            "tests": [{"description": "ignored"}]
        }));
        let client = MemoryClient::new();
        let server = ServerInfo::new();
        let report = validate_file(&client, &server, file.path()).unwrap();
        assert!(report.schema_skipped);
    }
}
