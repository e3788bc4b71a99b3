//! Mod versions
//!
//! A version is `MAJOR(.N)*(-PRERELEASE)?(+BUILD)?` with any number of
//! numeric components. Parsing is strict: anything else is rejected.
//!
//! ## Ordering
//!
//! ```text
//! 1.0 == 1.0.0 < 1.0.1-alpha < 1.0.1-alpha.1 < 1.0.1-beta < 1.0.1 < 1.0.1+build.2
//! ```
//!
//! Missing numeric components count as zero. A pre-release sorts before the
//! release with the same core. Build metadata only breaks ties, so two
//! candidates with the same core and pre-release still have a stable order.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::ParseError;

/// One dot-separated pre-release identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PreRelease {
    Numeric(u64),
    Alpha(String),
}

impl Ord for PreRelease {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PreRelease::Numeric(a), PreRelease::Numeric(b)) => a.cmp(b),
            (PreRelease::Numeric(_), PreRelease::Alpha(_)) => Ordering::Less,
            (PreRelease::Alpha(_), PreRelease::Numeric(_)) => Ordering::Greater,
            (PreRelease::Alpha(a), PreRelease::Alpha(b)) => a.cmp(b),
        }
    }
}

impl PartialOrd for PreRelease {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreRelease::Numeric(n) => write!(f, "{n}"),
            PreRelease::Alpha(s) => f.write_str(s),
        }
    }
}

/// A parsed mod version
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    components: Vec<u64>,
    pre: Vec<PreRelease>,
    build: Option<String>,
}

impl Version {
    /// Creates a release version from numeric components
    pub fn new(components: impl Into<Vec<u64>>) -> Self {
        let mut components = components.into();
        if components.is_empty() {
            components.push(0);
        }
        Self {
            components,
            pre: Vec::new(),
            build: None,
        }
    }

    /// Parses a version string
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] when any part of the string is not a valid
    /// numeric component, pre-release identifier or build identifier.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let fail = |reason: &str| ParseError::new(input, reason);
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(fail("version is empty"));
        }

        let (rest, build) = match trimmed.split_once('+') {
            Some((rest, build)) => {
                if !valid_identifiers(build) {
                    return Err(fail("invalid build metadata"));
                }
                (rest, Some(build.to_string()))
            }
            None => (trimmed, None),
        };

        let (core, pre) = match rest.split_once('-') {
            Some((core, pre)) => {
                if !valid_identifiers(pre) {
                    return Err(fail("invalid pre-release"));
                }
                (core, parse_pre_release(pre))
            }
            None => (rest, Vec::new()),
        };

        let mut components = Vec::new();
        for part in core.split('.') {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(fail(&format!("'{part}' is not a numeric version component")));
            }
            let value = part
                .parse::<u64>()
                .map_err(|_| fail(&format!("component '{part}' is too large")))?;
            components.push(value);
        }

        Ok(Self {
            components,
            pre,
            build,
        })
    }

    /// Numeric components as written
    pub fn components(&self) -> &[u64] {
        &self.components
    }

    /// Numeric component at `index`, zero when absent
    pub fn component(&self, index: usize) -> u64 {
        self.components.get(index).copied().unwrap_or(0)
    }

    pub fn pre_release(&self) -> &[PreRelease] {
        &self.pre
    }

    pub fn build(&self) -> Option<&str> {
        self.build.as_deref()
    }

    pub fn is_pre_release(&self) -> bool {
        !self.pre.is_empty()
    }

    /// The smallest version strictly greater than every version sharing the
    /// first `depth` components with this one
    ///
    /// Carries a `-0` pre-release so that pre-releases of the bumped version
    /// stay outside ranges such as `~1.2` and `^1`.
    pub(crate) fn bump(&self, depth: usize) -> Version {
        let depth = depth.max(1);
        let mut components: Vec<u64> = (0..depth).map(|i| self.component(i)).collect();
        if let Some(last) = components.last_mut() {
            *last = last.saturating_add(1);
        }
        Version {
            components,
            pre: vec![PreRelease::Numeric(0)],
            build: None,
        }
    }

    fn cmp_core(&self, other: &Self) -> Ordering {
        let len = self.components.len().max(other.components.len());
        for i in 0..len {
            match self.component(i).cmp(&other.component(i)) {
                Ordering::Equal => {}
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    fn cmp_pre(&self, other: &Self) -> Ordering {
        match (self.pre.is_empty(), other.pre.is_empty()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => self.pre.cmp(&other.pre),
        }
    }

    /// Compares ignoring build metadata
    ///
    /// Ranges use this precedence, so `=1.0.0` matches `1.0.0+build.5`.
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.cmp_core(other).then_with(|| self.cmp_pre(other))
    }
}

fn valid_identifiers(s: &str) -> bool {
    !s.is_empty()
        && s.split('.').all(|id| {
            !id.is_empty() && id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

fn parse_pre_release(s: &str) -> Vec<PreRelease> {
    s.split('.')
        .map(|id| match id.parse::<u64>() {
            Ok(n) if id.bytes().all(|b| b.is_ascii_digit()) => PreRelease::Numeric(n),
            _ => PreRelease::Alpha(id.to_string()),
        })
        .collect()
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_precedence(other)
            .then_with(|| self.build.cmp(&other.build))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Trailing zero components do not change equality
        let significant = self
            .components
            .iter()
            .rposition(|c| *c != 0)
            .map_or(0, |i| i + 1);
        self.components[..significant].hash(state);
        self.pre.hash(state);
        self.build.hash(state);
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let core: Vec<String> = self.components.iter().map(u64::to_string).collect();
        f.write_str(&core.join("."))?;
        if !self.pre.is_empty() {
            let pre: Vec<String> = self.pre.iter().map(ToString::to_string).collect();
            write!(f, "-{}", pre.join("."))?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

impl FromStr for Version {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl TryFrom<String> for Version {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Version::parse(&value)
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).expect("valid version")
    }

    #[test]
    fn test_parse_components() {
        let version = v("1.20.4");
        assert_eq!(version.components(), &[1, 20, 4]);
        assert!(!version.is_pre_release());
        assert_eq!(version.build(), None);
    }

    #[test]
    fn test_parse_pre_release_and_build() {
        let version = v("2.0.0-beta.3+git.abc");
        assert_eq!(
            version.pre_release(),
            &[PreRelease::Alpha("beta".to_string()), PreRelease::Numeric(3)]
        );
        assert_eq!(version.build(), Some("git.abc"));
        assert_eq!(version.to_string(), "2.0.0-beta.3+git.abc");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "a.b", "1..2", "1.2.", "-1", "1.0-", "1.0+", "1.0-be ta", "1.x"] {
            assert!(Version::parse(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn test_missing_components_are_zero() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert!(v("1.0") < v("1.0.1"));
        assert!(v("1.10") > v("1.9.9"));
    }

    #[test]
    fn test_pre_release_sorts_before_release() {
        let mut versions = vec![
            v("1.0.1"),
            v("1.0.1-beta"),
            v("1.0.1-alpha.1"),
            v("1.0.1-alpha"),
            v("1.0.1-1"),
            v("1.0"),
        ];
        versions.sort();
        let rendered: Vec<String> = versions.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["1.0", "1.0.1-1", "1.0.1-alpha", "1.0.1-alpha.1", "1.0.1-beta", "1.0.1"]
        );
    }

    #[test]
    fn test_build_metadata_breaks_ties() {
        assert!(v("1.0.0") < v("1.0.0+a"));
        assert!(v("1.0.0+a") < v("1.0.0+b"));
        assert_eq!(
            v("1.0.0+a").cmp_precedence(&v("1.0.0+b")),
            Ordering::Equal
        );
    }

    #[test]
    fn test_bump() {
        assert!(v("1.2.9") < v("1.2.0").bump(2));
        assert!(v("1.3.0-alpha") > v("1.2.0").bump(2));
        assert!(v("1.3.0") > v("1.2.0").bump(2));
        assert!(v("1.99") < v("1.2").bump(1));
    }

    #[test]
    fn test_hash_matches_equality() {
        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(v("1.0"));
        assert!(set.contains(&v("1.0.0")));
    }

    #[test]
    fn test_serde_as_string() {
        let version: Version = serde_json::from_str("\"3.1.4\"").expect("deserialize");
        assert_eq!(version, v("3.1.4"));
        assert_eq!(
            serde_json::to_string(&version).expect("serialize"),
            "\"3.1.4\""
        );
        assert!(serde_json::from_str::<Version>("\"nope\"").is_err());
    }
}
