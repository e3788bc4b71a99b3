//! ModDependency: one declared relationship between two mods

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ParseError, Version, VersionRange};

/// How a dependency constrains the resolved set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    /// A matching version of the target must be loaded
    Requires,
    /// A matching version of the target should be loaded; only warns
    Recommends,
    /// A matching version of the target must not be loaded
    Breaks,
    /// Treated like `breaks`
    Conflicts,
}

impl DependencyKind {
    /// Hard kinds make resolution fail when violated
    pub fn is_hard(self) -> bool {
        !matches!(self, DependencyKind::Recommends)
    }

    /// Kinds that forbid the matching target rather than demanding it
    pub fn is_negative(self) -> bool {
        matches!(self, DependencyKind::Breaks | DependencyKind::Conflicts)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DependencyKind::Requires => "requires",
            DependencyKind::Recommends => "recommends",
            DependencyKind::Breaks => "breaks",
            DependencyKind::Conflicts => "conflicts",
        }
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dependency declaration in leaf.mod.json
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModDependency {
    /// Target mod id
    pub target: String,

    /// Acceptable target versions
    pub range: VersionRange,

    pub kind: DependencyKind,
}

impl ModDependency {
    pub fn new(target: impl Into<String>, range: VersionRange, kind: DependencyKind) -> Self {
        Self {
            target: target.into(),
            range,
            kind,
        }
    }

    /// Parses the version expressions of a manifest entry
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] of the first malformed expression.
    pub fn parse<S: AsRef<str>>(
        target: impl Into<String>,
        ranges: &[S],
        kind: DependencyKind,
    ) -> Result<Self, ParseError> {
        Ok(Self::new(target, VersionRange::parse_any(ranges)?, kind))
    }

    /// Whether a candidate with this id and version is matched by the declaration
    pub fn matches(&self, id: &str, version: &Version) -> bool {
        self.target == id && self.range.matches(version)
    }
}

impl fmt::Display for ModDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.kind, self.target, self.range)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert!(DependencyKind::Requires.is_hard());
        assert!(DependencyKind::Conflicts.is_hard());
        assert!(!DependencyKind::Recommends.is_hard());
        assert!(DependencyKind::Breaks.is_negative());
        assert!(!DependencyKind::Requires.is_negative());
    }

    #[test]
    fn test_matches() {
        let dep = ModDependency::parse("core", &[">=2.0"], DependencyKind::Requires)
            .expect("valid range");
        let v = |s: &str| Version::parse(s).expect("valid version");
        assert!(dep.matches("core", &v("2.1")));
        assert!(!dep.matches("core", &v("1.9")));
        assert!(!dep.matches("other", &v("2.1")));
    }

    #[test]
    fn test_display() {
        let dep = ModDependency::parse("core", &["^1.2"], DependencyKind::Breaks)
            .expect("valid range");
        assert_eq!(dep.to_string(), "breaks core ^1.2");
    }

    #[test]
    fn test_malformed_range() {
        assert!(ModDependency::parse("core", &[">=one"], DependencyKind::Requires).is_err());
    }
}
