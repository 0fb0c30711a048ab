//! Suite execution
//!
//! The runner walks a suite file by file and case by case, applying the
//! gates, fixtures, operations, and verifiers in a fixed order:
//!
//! 1. schema gate (whole file), requirement gate (per case)
//! 2. collection fixture, outcome-collection pre-clear, fail point install
//! 3. event recorder reset, then per declared operation: run it, bank its
//!    recorded events, fetch the outcome collection, verify the outcome
//! 4. unconditional fail point disable
//! 5. expectation verification against the banked events
//!
//! The outcome collection is fetched after every operation, not once at
//! the end, so a multi-operation case whose intermediate state diverges
//! from the declared outcome fails. Each operation's events are banked
//! before that fetch because the fetch goes through the monitored client
//! and its traffic must not appear in the verified event list.

use crate::config::SuiteConfig;
use crate::fixture::initialize_collection;
use crate::gate::{schema_compatible, ServerInfo};
use crate::loader::{load_test_file, Outcome, TestCase, TestFile};
use crate::operation::OperationRunner;
use crate::verifier::{verify_expectations, verify_operation};
use serde_json::Value;
use specdrive_client::{Client, Database, FindOptions};
use specdrive_core::{ClientError, Document, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Database used when a file does not override it
pub const DEFAULT_DATABASE: &str = "crud_test";

/// Collection used when a file does not override it
pub const DEFAULT_COLLECTION: &str = "test";

/// Terminal state of one executed case
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseStatus {
    /// Every declared check held
    Passed,
    /// A gate kept the case from running; the reason is recorded
    Skipped(String),
    /// A check diverged or the case could not be driven
    Failed(String),
}

/// Report for one case
#[derive(Debug, Clone)]
pub struct CaseReport {
    /// The case's declared description
    pub description: String,
    /// How the case ended
    pub status: CaseStatus,
}

/// Report for one test file
#[derive(Debug, Clone)]
pub struct FileReport {
    /// Path the file was loaded from
    pub path: PathBuf,
    /// Whether the schema gate skipped the whole file
    pub schema_skipped: bool,
    /// Per-case reports, in declaration order
    pub cases: Vec<CaseReport>,
}

impl FileReport {
    /// Number of failed cases
    pub fn failed(&self) -> usize {
        self.cases
            .iter()
            .filter(|c| matches!(c.status, CaseStatus::Failed(_)))
            .count()
    }

    /// Whether nothing in this file failed
    pub fn all_passed(&self) -> bool {
        self.failed() == 0
    }
}

/// Aggregate report for a whole suite
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    /// Per-file reports, in manifest order
    pub files: Vec<FileReport>,
}

impl SuiteReport {
    /// Whether nothing in the suite failed
    pub fn all_passed(&self) -> bool {
        self.files.iter().all(FileReport::all_passed)
    }

    /// Total number of failed cases across all files
    pub fn failed(&self) -> usize {
        self.files.iter().map(FileReport::failed).sum()
    }
}

/// Drives a suite against one client
pub struct TestRunner<'a> {
    client: &'a dyn Client,
    operations: OperationRunner,
    server: ServerInfo,
}

impl<'a> TestRunner<'a> {
    /// Bind a runner to a client
    pub fn new(client: &'a dyn Client) -> Self {
        Self {
            client,
            operations: OperationRunner::new(),
            server: ServerInfo::new(),
        }
    }

    /// Run every file named by the suite's manifest
    ///
    /// # Errors
    ///
    /// Returns a fatal error for discovery, I/O, or parse problems; check
    /// divergences are reported per case instead.
    pub fn run_suite(&self, config: &SuiteConfig) -> Result<SuiteReport> {
        let mut report = SuiteReport::default();
        for path in config.manifest()? {
            report.files.push(self.run_file(&path)?);
        }
        info!(
            files = report.files.len(),
            failed = report.failed(),
            "suite finished"
        );
        Ok(report)
    }

    /// Run one test file
    ///
    /// # Errors
    ///
    /// Returns a fatal error when the file cannot be loaded or the server
    /// cannot be introspected.
    pub fn run_file(&self, path: &Path) -> Result<FileReport> {
        let file = load_test_file(path)?;
        if !schema_compatible(&file.schema_version) {
            info!(
                path = %path.display(),
                schema_version = %file.schema_version,
                "file skipped: unsupported schema version"
            );
            return Ok(FileReport {
                path: path.to_path_buf(),
                schema_skipped: true,
                cases: Vec::new(),
            });
        }
        let mut cases = Vec::with_capacity(file.tests.len());
        for case in &file.tests {
            let status = self.run_case(&file, case)?;
            match &status {
                CaseStatus::Passed => info!(case = %case.description, "passed"),
                CaseStatus::Skipped(reason) => {
                    info!(case = %case.description, reason = %reason, "skipped");
                }
                CaseStatus::Failed(reason) => {
                    warn!(case = %case.description, reason = %reason, "failed");
                }
            }
            cases.push(CaseReport {
                description: case.description.clone(),
                status,
            });
        }
        Ok(FileReport {
            path: path.to_path_buf(),
            schema_skipped: false,
            cases,
        })
    }

    /// Run one case, reporting divergences as a failed status
    ///
    /// # Errors
    ///
    /// Only setup, I/O, and parse problems propagate; everything else is
    /// folded into [`CaseStatus::Failed`].
    pub fn run_case(&self, file: &TestFile, case: &TestCase) -> Result<CaseStatus> {
        if !self.server.requirements_met(self.client, &case.run_on_requirements)? {
            return Ok(CaseStatus::Skipped("no runOn requirement satisfied".into()));
        }
        match self.execute_case(file, case) {
            Ok(()) => Ok(CaseStatus::Passed),
            Err(fatal @ (Error::Setup(_) | Error::Io(_) | Error::Parse(_))) => Err(fatal),
            Err(check) => Ok(CaseStatus::Failed(check.to_string())),
        }
    }

    fn execute_case(&self, file: &TestFile, case: &TestCase) -> Result<()> {
        let database_name = file.database_name.as_deref().unwrap_or(DEFAULT_DATABASE);
        let collection_name = file.collection_name.as_deref().unwrap_or(DEFAULT_COLLECTION);
        let database = self.client.database(database_name);
        let collection = database.collection(collection_name);

        let data = case.data.as_deref().unwrap_or(&file.data);
        initialize_collection(collection.as_ref(), data)?;

        // $out targets start empty so stale contents cannot satisfy the
        // outcome by accident
        if let Some(target) = case
            .outcome
            .as_ref()
            .and_then(|o| o.collection.as_ref())
            .and_then(|c| c.name.as_deref())
            .filter(|name| *name != collection_name)
        {
            database.collection(target).delete_many(Document::new())?;
        }

        let fail_point_name = match &case.fail_point {
            Some(fail_point) => {
                let name = fail_point.get_str("configureFailPoint")?.to_string();
                self.client.run_admin_command(fail_point)?;
                Some(name)
            }
            None => None,
        };

        self.client.events().clear();

        let mut events = Vec::new();
        let mut failure = None;
        for operation in case.operations() {
            match self
                .operations
                .run(collection.as_ref(), &operation.name, &operation.arguments)
            {
                Ok(result) => {
                    // bank this operation's events before the outcome fetch
                    events.extend(self.client.events().snapshot());
                    self.client.events().clear();
                    let verdict = self.verify_one(
                        database.as_ref(),
                        collection_name,
                        case.outcome.as_ref(),
                        &operation.name,
                        &result,
                    );
                    // the fetch's own traffic is not part of the case
                    self.client.events().clear();
                    if let Err(error) = verdict {
                        failure = Some(error);
                        break;
                    }
                }
                Err(error) => {
                    failure = Some(error);
                    break;
                }
            }
        }

        if let Some(name) = fail_point_name {
            self.disable_fail_point(&name);
        }
        if let Some(error) = failure {
            return Err(error);
        }

        if let Some(expectations) = &case.expectations {
            verify_expectations(expectations, &events)?;
        }
        Ok(())
    }

    /// Verify one operation's captured result against the case's outcome,
    /// fetching the outcome collection's current contents when declared
    fn verify_one(
        &self,
        database: &dyn Database,
        collection_name: &str,
        outcome: Option<&Outcome>,
        name: &str,
        result: &std::result::Result<Value, ClientError>,
    ) -> Result<()> {
        let Some(outcome) = outcome else {
            // with no declared outcome an operation error is still a failure
            if let Err(error) = result {
                return Err(Error::Assertion(format!(
                    "operation {name} raised an unexpected error: {error}"
                )));
            }
            return Ok(());
        };
        let actual_collection = match outcome.collection.as_ref().and_then(|c| c.data.as_ref()) {
            Some(_) => {
                let target = outcome
                    .collection
                    .as_ref()
                    .and_then(|c| c.name.as_deref())
                    .unwrap_or(collection_name);
                Some(
                    database
                        .collection(target)
                        .find(Document::new(), FindOptions::default())?,
                )
            }
            None => None,
        };
        verify_operation(name, outcome, result, actual_collection.as_deref())
    }

    fn disable_fail_point(&self, name: &str) {
        let mut command = Document::new();
        command.insert("configureFailPoint".to_string(), Value::String(name.to_string()));
        command.insert("mode".to_string(), Value::String("off".to_string()));
        if let Err(error) = self.client.run_admin_command(&command) {
            warn!(fail_point = name, %error, "failed to disable fail point");
        }
    }
}
