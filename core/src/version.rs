//! Strict semantic version used as a resource family's schema marker.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A `MAJOR.MINOR.PATCH` schema version.
///
/// Ordering compares major, then minor, then patch numerically, so
/// `1.10.0 > 1.9.0`. Pre-release and build suffixes are rejected.
///
/// # Examples
///
/// ```
/// use resource_store_core::SchemaVersion;
///
/// let v: SchemaVersion = "2.0.0".parse().unwrap();
/// assert_eq!(v, SchemaVersion::new(2, 0, 0));
/// assert_eq!(v.to_string(), "2.0.0");
/// assert!("2.0".parse::<SchemaVersion>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
}

impl SchemaVersion {
    /// Version assumed when none has been stored.
    pub const ZERO: SchemaVersion = SchemaVersion::new(0, 0, 0);

    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for SchemaVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoreError::InvalidVersion(s.to_string());

        let mut parts = s.trim().split('.');
        let mut next = || -> Result<u64, CoreError> {
            let part = parts.next().ok_or_else(invalid)?;
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse().map_err(|_| invalid())
        };

        let version = SchemaVersion::new(next()?, next()?, next()?);
        if parts.next().is_some() {
            return Err(invalid());
        }
        Ok(version)
    }
}

impl TryFrom<String> for SchemaVersion {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SchemaVersion> for String {
    fn from(value: SchemaVersion) -> Self {
        value.to_string()
    }
}
