//! Deployment-topology classification and requirement matching

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for topology-string parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown topology '{0}'")]
pub struct TopologyParseError(pub String);

/// Deployment shape of the connected server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topology {
    /// A standalone single node
    Single,
    /// A replica set
    ReplicaSet,
    /// A sharded cluster
    Sharded,
    /// A sharded cluster whose shards are replica sets
    ShardedReplicaSet,
    /// A load-balanced deployment
    LoadBalanced,
}

impl Topology {
    /// The textual form used in specification files
    pub fn as_str(&self) -> &'static str {
        match self {
            Topology::Single => "single",
            Topology::ReplicaSet => "replicaset",
            Topology::Sharded => "sharded",
            Topology::ShardedReplicaSet => "sharded-replicaset",
            Topology::LoadBalanced => "load-balanced",
        }
    }

    /// Whether this *declared* requirement topology is satisfied by the
    /// *actual* topology of the connected server
    ///
    /// A declared `sharded-replicaset` also accepts an actual `sharded`
    /// topology. This is a compatibility shim for inconsistent topology
    /// naming in upstream test files, not a general subsumption rule;
    /// do not extend it to other pairs.
    pub fn accepts(&self, actual: Topology) -> bool {
        *self == actual || (*self == Topology::ShardedReplicaSet && actual == Topology::Sharded)
    }
}

impl FromStr for Topology {
    type Err = TopologyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Topology::Single),
            "replicaset" => Ok(Topology::ReplicaSet),
            "sharded" => Ok(Topology::Sharded),
            "sharded-replicaset" => Ok(Topology::ShardedReplicaSet),
            "load-balanced" => Ok(Topology::LoadBalanced),
            other => Err(TopologyParseError(other.to_string())),
        }
    }
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Topology {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Topology {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TopologyVisitor;

        impl Visitor<'_> for TopologyVisitor {
            type Value = Topology;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a topology string like \"replicaset\"")
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Topology, E> {
                s.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(TopologyVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_variants() {
        for s in ["single", "replicaset", "sharded", "sharded-replicaset", "load-balanced"] {
            let t: Topology = s.parse().unwrap();
            assert_eq!(t.as_str(), s);
        }
    }

    #[test]
    fn test_parse_unknown() {
        let err = "mesh".parse::<Topology>().unwrap_err();
        assert_eq!(err, TopologyParseError("mesh".to_string()));
    }

    #[test]
    fn test_accepts_exact_match() {
        assert!(Topology::ReplicaSet.accepts(Topology::ReplicaSet));
        assert!(!Topology::ReplicaSet.accepts(Topology::Single));
    }

    #[test]
    fn test_sharded_replicaset_shim() {
        // Declared sharded-replicaset accepts actual sharded, never the reverse
        assert!(Topology::ShardedReplicaSet.accepts(Topology::Sharded));
        assert!(!Topology::Sharded.accepts(Topology::ShardedReplicaSet));
    }

    #[test]
    fn test_serde_roundtrip() {
        let t: Topology = serde_json::from_str("\"sharded-replicaset\"").unwrap();
        assert_eq!(t, Topology::ShardedReplicaSet);
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"sharded-replicaset\"");
    }
}
