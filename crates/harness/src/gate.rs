//! Version and requirement gating
//!
//! Two gates run before any operation executes:
//!
//! - the **schema gate** skips a whole file whose declared schema version
//!   the runner does not support;
//! - the **requirement gate** skips a single case whose
//!   `runOnRequirements` alternatives are all unsatisfied by the connected
//!   server.
//!
//! Both are silent skips, never failures.

use crate::loader::RunOnRequirement;
use once_cell::sync::OnceCell;
use specdrive_client::Client;
use specdrive_core::{Result, Topology, Version};
use std::cmp::Ordering;
use tracing::debug;

/// The newest test-file schema version this runner understands
pub const SUPPORTED_SCHEMA_VERSION: Version = Version::new(1, 8, 0);

/// Schema-gate decision for a file's declared version
pub fn schema_compatible(file_version: &Version) -> bool {
    file_version.is_schema_compatible_with(&SUPPORTED_SCHEMA_VERSION)
}

/// Memoized server introspection
///
/// The connected server does not change during a test run, so version and
/// topology are fetched exactly once per runner lifetime and never
/// invalidated mid-run.
#[derive(Debug, Default)]
pub struct ServerInfo {
    version: OnceCell<Version>,
    topology: OnceCell<Topology>,
}

impl ServerInfo {
    /// Create an unpopulated cache
    pub fn new() -> Self {
        Self::default()
    }

    /// The server's version, fetched on first use
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails on the first call.
    pub fn version(&self, client: &dyn Client) -> Result<Version> {
        self.version
            .get_or_try_init(|| client.server_version())
            .copied()
            .map_err(Into::into)
    }

    /// The server's topology, fetched on first use
    ///
    /// # Errors
    ///
    /// Returns an error if introspection fails on the first call.
    pub fn topology(&self, client: &dyn Client) -> Result<Topology> {
        self.topology
            .get_or_try_init(|| client.topology())
            .copied()
            .map_err(Into::into)
    }

    /// Requirement-gate decision for one case
    ///
    /// No requirements means always eligible; otherwise at least one
    /// alternative must be satisfied.
    ///
    /// # Errors
    ///
    /// Returns an error if server introspection fails.
    pub fn requirements_met(
        &self,
        client: &dyn Client,
        requirements: &[RunOnRequirement],
    ) -> Result<bool> {
        if requirements.is_empty() {
            return Ok(true);
        }
        let version = self.version(client)?;
        let topology = self.topology(client)?;
        let met = requirements
            .iter()
            .any(|r| requirement_satisfied(r, &version, topology));
        if !met {
            debug!(%version, %topology, "no requirement alternative satisfied");
        }
        Ok(met)
    }
}

fn requirement_satisfied(
    requirement: &RunOnRequirement,
    actual: &Version,
    topology: Topology,
) -> bool {
    if let Some(min) = &requirement.min_server_version {
        if actual.cmp_major_minor(min) == Ordering::Less {
            return false;
        }
    }
    if let Some(max) = &requirement.max_server_version {
        if actual.cmp_major_minor(max) == Ordering::Greater {
            return false;
        }
    }
    if let Some(topologies) = &requirement.topologies {
        if !topologies.iter().any(|declared| declared.accepts(topology)) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use specdrive_client::MemoryClient;

    fn requirement(
        min: Option<&str>,
        max: Option<&str>,
        topologies: Option<Vec<Topology>>,
    ) -> RunOnRequirement {
        RunOnRequirement {
            min_server_version: min.map(|s| s.parse().unwrap()),
            max_server_version: max.map(|s| s.parse().unwrap()),
            topologies,
        }
    }

    #[test]
    fn test_schema_gate() {
        assert!(schema_compatible(&Version::new(1, 0, 0)));
        assert!(schema_compatible(&Version::new(1, 8, 3)));
        assert!(!schema_compatible(&Version::new(1, 9, 0)));
        assert!(!schema_compatible(&Version::new(2, 0, 0)));
    }

    #[test]
    fn test_no_requirements_always_eligible() {
        let client = MemoryClient::new();
        let server = ServerInfo::new();
        assert!(server.requirements_met(&client, &[]).unwrap());
    }

    #[test]
    fn test_min_version_gate() {
        let client = MemoryClient::with_server(Version::new(7, 0, 0), Topology::Single);
        let server = ServerInfo::new();
        assert!(server
            .requirements_met(&client, &[requirement(Some("4.0"), None, None)])
            .unwrap());
        assert!(!server
            .requirements_met(&client, &[requirement(Some("99.0"), None, None)])
            .unwrap());
    }

    #[test]
    fn test_max_version_gate_ignores_patch() {
        let client = MemoryClient::with_server(Version::new(4, 0, 9), Topology::Single);
        let server = ServerInfo::new();
        // 4.0.9 vs maxServerVersion 4.0.2: patch is not consulted
        assert!(server
            .requirements_met(&client, &[requirement(None, Some("4.0.2"), None)])
            .unwrap());
        assert!(!server
            .requirements_met(&client, &[requirement(None, Some("3.6"), None)])
            .unwrap());
    }

    #[test]
    fn test_topology_gate_with_shim() {
        let client = MemoryClient::with_server(Version::new(7, 0, 0), Topology::Sharded);
        let server = ServerInfo::new();
        assert!(server
            .requirements_met(
                &client,
                &[requirement(None, None, Some(vec![Topology::ShardedReplicaSet]))]
            )
            .unwrap());
        assert!(!server
            .requirements_met(
                &client,
                &[requirement(None, None, Some(vec![Topology::ReplicaSet]))]
            )
            .unwrap());
    }

    #[test]
    fn test_any_alternative_suffices() {
        let client = MemoryClient::with_server(Version::new(3, 6, 0), Topology::Single);
        let server = ServerInfo::new();
        let requirements = [
            requirement(Some("99.0"), None, None),
            requirement(None, Some("3.6"), None),
        ];
        assert!(server.requirements_met(&client, &requirements).unwrap());
    }

    #[test]
    fn test_combined_version_and_topology() {
        let client = MemoryClient::with_server(Version::new(4, 2, 0), Topology::ReplicaSet);
        let server = ServerInfo::new();
        let satisfied = requirement(Some("4.0"), Some("5.0"), Some(vec![Topology::ReplicaSet]));
        let wrong_topology = requirement(Some("4.0"), Some("5.0"), Some(vec![Topology::Sharded]));
        assert!(server.requirements_met(&client, &[satisfied]).unwrap());
        assert!(!server.requirements_met(&client, &[wrong_topology]).unwrap());
    }
}
