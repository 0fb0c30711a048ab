//! Version triples for schema and server compatibility checks
//!
//! Two version comparisons exist in the harness and they are deliberately
//! different:
//!
//! - **Schema compatibility** ([`Version::is_schema_compatible_with`]):
//!   a test file may only run if its major component equals the runner's
//!   supported major and its minor component does not exceed the supported
//!   minor. Patch is never consulted.
//! - **Server requirements** ([`Version::cmp_major_minor`]): `minServerVersion`
//!   and `maxServerVersion` predicates compare component-wise over major and
//!   minor only.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error type for version-string parsing
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VersionParseError {
    /// The string was empty
    #[error("empty version string")]
    Empty,
    /// A component was not a number
    #[error("invalid version component '{0}'")]
    InvalidComponent(String),
    /// More than three components were given
    #[error("too many version components in '{0}'")]
    TooManyComponents(String),
}

/// A `major.minor.patch` version triple
///
/// Parsed from the textual form found in specification files
/// (`"4.0"`, `"4.2.1"`). Missing minor/patch components default to zero.
/// Pre-release suffixes after the numeric components (as in `"4.4.0-rc3"`)
/// are ignored on the patch component, matching the tolerant parsing the
/// test files rely on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Version {
    /// Major component
    pub major: u32,
    /// Minor component
    pub minor: u32,
    /// Patch component (never consulted by compatibility checks)
    pub patch: u32,
}

impl Version {
    /// Create a version from explicit components
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Version { major, minor, patch }
    }

    /// Compare over major and minor components only
    ///
    /// Server-requirement predicates ignore the patch component entirely:
    /// a server at `4.0.9` satisfies `minServerVersion: "4.0.10"`.
    pub fn cmp_major_minor(&self, other: &Version) -> Ordering {
        (self.major, self.minor).cmp(&(other.major, other.minor))
    }

    /// Schema-version compatibility against the runner's supported version
    ///
    /// Majors must match exactly; this file's minor must not exceed the
    /// supported minor. Patch is not checked.
    pub fn is_schema_compatible_with(&self, supported: &Version) -> bool {
        self.major == supported.major && self.minor <= supported.minor
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(VersionParseError::Empty);
        }
        let mut components = [0u32; 3];
        let mut count = 0;
        for (i, part) in s.split('.').enumerate() {
            if i >= 3 {
                return Err(VersionParseError::TooManyComponents(s.to_string()));
            }
            // The patch component may carry a pre-release suffix ("0-rc3")
            let numeric = if i == 2 {
                part.split(|c: char| !c.is_ascii_digit()).next().unwrap_or(part)
            } else {
                part
            };
            components[i] = numeric
                .parse()
                .map_err(|_| VersionParseError::InvalidComponent(part.to_string()))?;
            count = i + 1;
        }
        debug_assert!(count >= 1);
        Ok(Version::new(components[0], components[1], components[2]))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VersionVisitor;

        impl Visitor<'_> for VersionVisitor {
            type Value = Version;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a version string like \"4.0\" or \"4.2.1\"")
            }

            fn visit_str<E: de::Error>(self, s: &str) -> Result<Version, E> {
                s.parse().map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(VersionVisitor)
    }
}
