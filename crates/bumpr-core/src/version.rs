//! SemVer bump algorithm.
//!
//! Pure functions shared by every engine: parse a `MAJOR.MINOR.PATCH`
//! string (optionally `v`-prefixed), apply a [`BumpInterval`], and render
//! the result without a prefix.

use std::fmt;
use std::str::FromStr;

use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from version operations.
#[derive(Error, Debug)]
pub enum VersionError {
    /// Failed to parse a semver string.
    #[error("invalid semver: {0}")]
    InvalidSemver(#[from] semver::Error),

    /// The bump interval is not `major`, `minor` or `patch`.
    #[error("unknown version bump interval `{0}` (expected major, minor or patch)")]
    UnknownInterval(String),

    /// The component to increment is already at its maximum.
    #[error("cannot bump {interval} component of {version}: value out of range")]
    Overflow {
        /// Version that was being bumped.
        version: Version,
        /// Component that would overflow.
        interval: BumpInterval,
    },
}

/// Result alias for version operations.
pub type VersionResult<T> = Result<T, VersionError>;

/// Which semver component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BumpInterval {
    /// Major release (X.0.0).
    Major,
    /// Minor release (x.Y.0).
    Minor,
    /// Patch release (x.y.Z).
    #[default]
    Patch,
}

impl fmt::Display for BumpInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Major => write!(f, "major"),
            Self::Minor => write!(f, "minor"),
            Self::Patch => write!(f, "patch"),
        }
    }
}

impl FromStr for BumpInterval {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Self::Major),
            "minor" => Ok(Self::Minor),
            "patch" => Ok(Self::Patch),
            other => Err(VersionError::UnknownInterval(other.to_owned())),
        }
    }
}

/// Compute the next version by applying a bump interval.
///
/// Pre-release and build metadata on `current` are dropped. Fails when the
/// incremented component is already `u64::MAX`.
pub fn next_version(current: &Version, interval: BumpInterval) -> VersionResult<Version> {
    let overflow = || VersionError::Overflow {
        version: current.clone(),
        interval,
    };
    let next = match interval {
        BumpInterval::Major => {
            Version::new(current.major.checked_add(1).ok_or_else(overflow)?, 0, 0)
        }
        BumpInterval::Minor => Version::new(
            current.major,
            current.minor.checked_add(1).ok_or_else(overflow)?,
            0,
        ),
        BumpInterval::Patch => Version::new(
            current.major,
            current.minor,
            current.patch.checked_add(1).ok_or_else(overflow)?,
        ),
    };
    Ok(next)
}

/// Parse a version string, stripping an optional `v` prefix.
pub fn parse_version(s: &str) -> VersionResult<Version> {
    let s = s.strip_prefix('v').unwrap_or(s);
    Ok(Version::parse(s)?)
}

/// Produce the next version string for `current` bumped by `interval`.
///
/// The version is parsed before the interval, so an unparsable version is
/// reported even when the interval is also invalid.
pub fn generate_next_version(current: &str, interval: &str) -> VersionResult<String> {
    let version = parse_version(current)?;
    let interval: BumpInterval = interval.parse()?;
    Ok(next_version(&version, interval)?.to_string())
}
