//! `major.minor.patch` parsing and comparison.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::CheckError;

/// Leading tag, three numeric components, then end of input or a separator.
static VERSION_REGEX: OnceLock<Regex> = OnceLock::new();

fn version_regex() -> &'static Regex {
    VERSION_REGEX.get_or_init(|| {
        Regex::new(r"^[^0-9.]*([0-9]+)\.([0-9]+)\.([0-9]+)(?:$|[.+\-])").expect("Invalid regex")
    })
}

/// A parsed `(major, minor, patch)` version.
///
/// Ordering is lexicographic over the three components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VersionTriple {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl VersionTriple {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Parse the first `major.minor.patch` run of a free-form version string.
    ///
    /// A leading non-numeric tag (`v`, `stable-`) is skipped. Anything after
    /// the patch component (`-gke.2`, `+build`, `.4`) is discarded.
    pub fn parse(raw: &str) -> Result<Self, CheckError> {
        let caps = version_regex()
            .captures(raw.trim())
            .ok_or_else(|| CheckError::VersionParse(raw.to_string()))?;

        let component = |idx: usize| -> Result<u32, CheckError> {
            caps[idx]
                .parse::<u32>()
                .map_err(|_| CheckError::VersionParse(raw.to_string()))
        };

        Ok(Self {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
        })
    }

    /// Returns true if `self` is at least `required`.
    pub fn is_compatible(&self, required: &VersionTriple) -> bool {
        self >= required
    }

    /// Fail with [`CheckError::VersionIncompatible`] when below `required`.
    pub fn require(&self, subject: &str, required: &VersionTriple) -> Result<(), CheckError> {
        if self.is_compatible(required) {
            Ok(())
        } else {
            Err(CheckError::VersionIncompatible {
                subject: subject.to_string(),
                actual: *self,
                required: *required,
            })
        }
    }
}

impl fmt::Display for VersionTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for VersionTriple {
    type Err = CheckError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
