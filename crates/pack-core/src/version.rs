//! Pack version parsing and ordering.
//!
//! Versions look like `1.2.3` or `1.2.3-beta2`: three numeric components and
//! an optional alphabetic flag with an optional counter.
//!
//! ```
//! use pack_core::Version;
//!
//! let release: Version = "1.2.0".parse().unwrap();
//! let beta: Version = "1.2.0-beta3".parse().unwrap();
//! assert!(beta < release);
//! assert_eq!(beta.to_string(), "1.2.0-beta3");
//! ```
//!
//! Two orderings exist. [`Ord`] on [`Version`] is the strict one. The
//! [`legacy`] functions reproduce the comparison older changelists were
//! written against, where any larger component wins regardless of the
//! components before it; [`VersionOrdering`] picks between the two.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Error, Result};

static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([A-Za-z]+)(\d*))?$").expect("version pattern is valid")
});

/// A parsed pack version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    /// Pre-release flag such as `beta`.
    pub flag: Option<String>,
    /// Counter after the flag, `beta2` -> 2.
    pub flagv: Option<u64>,
}

impl Version {
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            flag: None,
            flagv: None,
        }
    }

    pub fn with_flag(mut self, flag: impl Into<String>, flagv: Option<u64>) -> Self {
        self.flag = Some(flag.into());
        self.flagv = flagv;
        self
    }

    pub fn parse(input: &str) -> Result<Self> {
        input.parse()
    }
}

impl FromStr for Version {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        let invalid = || Error::VersionParse {
            input: input.to_string(),
        };
        let caps = VERSION_PATTERN.captures(input.trim()).ok_or_else(invalid)?;
        let number = |index: usize| -> Result<u64> {
            caps[index].parse().map_err(|_| invalid())
        };

        let flagv = match caps.get(5).map(|m| m.as_str()) {
            Some(digits) if !digits.is_empty() => Some(digits.parse().map_err(|_| invalid())?),
            _ => None,
        };

        Ok(Self {
            major: number(1)?,
            minor: number(2)?,
            patch: number(3)?,
            flag: caps.get(4).map(|m| m.as_str().to_string()),
            flagv,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(flag) = &self.flag {
            write!(f, "-{flag}")?;
            if let Some(flagv) = self.flagv {
                write!(f, "{flagv}")?;
            }
        }
        Ok(())
    }
}

impl Ord for Version {
    /// Numeric components first. At equal numbers a flagged version sorts
    /// before the plain release; two flags sort by name, then by counter.
    ///
    /// Unlike [`legacy`], differing or absent flags are ordered here: a total
    /// order needs exactly one of lt, eq, gt for every pair.
    fn cmp(&self, other: &Self) -> Ordering {
        self.major
            .cmp(&other.major)
            .then(self.minor.cmp(&other.minor))
            .then(self.patch.cmp(&other.patch))
            .then_with(|| match (&self.flag, &other.flag) {
                (None, None) => Ordering::Equal,
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (Some(a), Some(b)) => a.cmp(b).then(self.flagv.cmp(&other.flagv)),
            })
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The component-wise comparison older changelists rely on.
///
/// `gt` holds when *any* component is larger, so `1.0.5` is "greater" than
/// `2.0.0`. Flag counters only compare when both sides carry the same flag
/// and both have a counter.
pub mod legacy {
    use super::Version;

    pub fn gt(a: &Version, b: &Version) -> bool {
        a.major > b.major || a.minor > b.minor || a.patch > b.patch || flag_cmp(a, b, |x, y| x > y)
    }

    pub fn lt(a: &Version, b: &Version) -> bool {
        a.major < b.major || a.minor < b.minor || a.patch < b.patch || flag_cmp(a, b, |x, y| x < y)
    }

    pub fn gte(a: &Version, b: &Version) -> bool {
        !lt(a, b)
    }

    pub fn lte(a: &Version, b: &Version) -> bool {
        !gt(a, b)
    }

    pub fn eq(a: &Version, b: &Version) -> bool {
        a == b
    }

    fn flag_cmp(a: &Version, b: &Version, op: impl Fn(u64, u64) -> bool) -> bool {
        match (&a.flag, &b.flag, a.flagv, b.flagv) {
            (Some(fa), Some(fb), Some(va), Some(vb)) => fa == fb && op(va, vb),
            _ => false,
        }
    }
}

/// Which comparison decides whether an upstream version is newer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum VersionOrdering {
    #[default]
    Strict,
    Legacy,
}

impl VersionOrdering {
    pub fn from_legacy_flag(legacy: bool) -> Self {
        if legacy { Self::Legacy } else { Self::Strict }
    }

    /// Whether `candidate` should replace `current`.
    pub fn is_newer(&self, candidate: &Version, current: &Version) -> bool {
        match self {
            Self::Strict => candidate > current,
            Self::Legacy => legacy::gt(candidate, current),
        }
    }
}
