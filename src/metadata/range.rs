//! Version ranges
//!
//! A [`VersionRange`] is a predicate over [`Version`] stored as a union of
//! intervals, so intersection and emptiness are exact.
//!
//! ## Syntax
//!
//! ```text
//! *            any version
//! 1.2.3        exactly 1.2.3 (also =1.2.3)
//! >1.2 >=1.2   lower bounds
//! <2 <=2.1     upper bounds
//! ~1.4.2       >=1.4.2, same minor (<1.5)
//! ^2.1         >=2.1, same major (<3)
//! 1.x 1.2.*    x-ranges
//! >=1.2 <2     space separated terms must all hold
//! ```
//!
//! A dependency may list several expressions; [`VersionRange::parse_any`]
//! matches when any of them does.

use std::cmp::Ordering;
use std::fmt;

use super::{ParseError, Version};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Bound {
    Unbounded,
    Included(Version),
    Excluded(Version),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Interval {
    lower: Bound,
    upper: Bound,
}

impl Interval {
    const ANY: Interval = Interval {
        lower: Bound::Unbounded,
        upper: Bound::Unbounded,
    };

    fn exact(version: Version) -> Self {
        Interval {
            lower: Bound::Included(version.clone()),
            upper: Bound::Included(version),
        }
    }

    fn contains(&self, version: &Version) -> bool {
        let above = match &self.lower {
            Bound::Unbounded => true,
            Bound::Included(v) => version.cmp_precedence(v) != Ordering::Less,
            Bound::Excluded(v) => version.cmp_precedence(v) == Ordering::Greater,
        };
        let below = match &self.upper {
            Bound::Unbounded => true,
            Bound::Included(v) => version.cmp_precedence(v) != Ordering::Greater,
            Bound::Excluded(v) => version.cmp_precedence(v) == Ordering::Less,
        };
        above && below
    }

    fn is_empty(&self) -> bool {
        match (&self.lower, &self.upper) {
            (Bound::Unbounded, _) | (_, Bound::Unbounded) => false,
            (Bound::Included(lo), Bound::Included(hi)) => {
                lo.cmp_precedence(hi) == Ordering::Greater
            }
            (Bound::Included(lo) | Bound::Excluded(lo), Bound::Excluded(hi))
            | (Bound::Excluded(lo), Bound::Included(hi)) => {
                lo.cmp_precedence(hi) != Ordering::Less
            }
        }
    }

    fn intersect(&self, other: &Interval) -> Interval {
        Interval {
            lower: tighter_lower(&self.lower, &other.lower),
            upper: tighter_upper(&self.upper, &other.upper),
        }
    }
}

fn tighter_lower(a: &Bound, b: &Bound) -> Bound {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(va) | Bound::Excluded(va), Bound::Included(vb) | Bound::Excluded(vb)) => {
            match va.cmp_precedence(vb) {
                Ordering::Greater => a.clone(),
                Ordering::Less => b.clone(),
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a.clone(),
                Ordering::Equal => b.clone(),
            }
        }
    }
}

fn tighter_upper(a: &Bound, b: &Bound) -> Bound {
    match (a, b) {
        (Bound::Unbounded, other) | (other, Bound::Unbounded) => other.clone(),
        (Bound::Included(va) | Bound::Excluded(va), Bound::Included(vb) | Bound::Excluded(vb)) => {
            match va.cmp_precedence(vb) {
                Ordering::Less => a.clone(),
                Ordering::Greater => b.clone(),
                Ordering::Equal if matches!(a, Bound::Excluded(_)) => a.clone(),
                Ordering::Equal => b.clone(),
            }
        }
    }
}

/// A set of acceptable versions
#[derive(Debug, Clone)]
pub struct VersionRange {
    intervals: Vec<Interval>,
    text: Option<String>,
}

impl VersionRange {
    /// Range matching every version
    pub fn any() -> Self {
        Self {
            intervals: vec![Interval::ANY],
            text: Some("*".to_string()),
        }
    }

    /// Range matching exactly `version`
    pub fn exact(version: Version) -> Self {
        let text = format!("={version}");
        Self {
            intervals: vec![Interval::exact(version)],
            text: Some(text),
        }
    }

    /// Parses one range expression
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if a term has an unknown shape or carries a
    /// malformed version.
    pub fn parse(input: &str) -> Result<Self, ParseError> {
        let trimmed = input.trim();
        let mut interval = Interval::ANY;

        for term in terms(trimmed) {
            let parsed = parse_term(&term).map_err(|reason| ParseError::new(input, reason))?;
            interval = interval.intersect(&parsed);
        }

        let intervals = if interval.is_empty() {
            Vec::new()
        } else {
            vec![interval]
        };
        Ok(Self {
            intervals,
            text: Some(if trimmed.is_empty() {
                "*".to_string()
            } else {
                trimmed.to_string()
            }),
        })
    }

    /// Parses a list of expressions, any of which may match
    ///
    /// An empty list matches every version.
    ///
    /// # Errors
    ///
    /// Returns the first expression's [`ParseError`].
    pub fn parse_any<S: AsRef<str>>(inputs: &[S]) -> Result<Self, ParseError> {
        if inputs.is_empty() {
            return Ok(Self::any());
        }
        let mut intervals = Vec::new();
        let mut texts = Vec::new();
        for input in inputs {
            let range = Self::parse(input.as_ref())?;
            texts.push(range.to_string());
            intervals.extend(range.intervals);
        }
        Ok(Self {
            intervals,
            text: Some(texts.join(" || ")),
        })
    }

    pub fn matches(&self, version: &Version) -> bool {
        self.intervals.iter().any(|i| i.contains(version))
    }

    /// Versions matched by both ranges
    pub fn intersect(&self, other: &VersionRange) -> VersionRange {
        let mut intervals = Vec::new();
        for a in &self.intervals {
            for b in &other.intervals {
                let both = a.intersect(b);
                if !both.is_empty() {
                    intervals.push(both);
                }
            }
        }
        VersionRange {
            intervals,
            text: None,
        }
    }

    /// True when no version can match
    pub fn is_empty(&self) -> bool {
        self.intervals.iter().all(Interval::is_empty)
    }

    pub fn is_any(&self) -> bool {
        self.intervals.contains(&Interval::ANY)
    }
}

impl PartialEq for VersionRange {
    fn eq(&self, other: &Self) -> bool {
        self.intervals == other.intervals
    }
}

impl Eq for VersionRange {}

impl fmt::Display for VersionRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(text) = &self.text {
            return f.write_str(text);
        }
        if self.is_empty() {
            return f.write_str("<empty>");
        }
        let rendered: Vec<String> = self.intervals.iter().map(render_interval).collect();
        f.write_str(&rendered.join(" || "))
    }
}

fn render_interval(interval: &Interval) -> String {
    match (&interval.lower, &interval.upper) {
        (Bound::Unbounded, Bound::Unbounded) => "*".to_string(),
        (Bound::Included(lo), Bound::Included(hi)) if lo.cmp_precedence(hi) == Ordering::Equal => {
            format!("={lo}")
        }
        (lower, upper) => {
            let mut parts = Vec::new();
            match lower {
                Bound::Included(v) => parts.push(format!(">={v}")),
                Bound::Excluded(v) => parts.push(format!(">{v}")),
                Bound::Unbounded => {}
            }
            match upper {
                Bound::Included(v) => parts.push(format!("<={v}")),
                Bound::Excluded(v) => parts.push(format!("<{v}")),
                Bound::Unbounded => {}
            }
            parts.join(" ")
        }
    }
}

/// Splits an expression into terms, gluing a bare operator to the version
/// that follows it (`>= 1.2` reads as `>=1.2`)
fn terms(expr: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    for token in expr.split_whitespace() {
        if let Some(op) = pending.take() {
            out.push(format!("{op}{token}"));
        } else if matches!(token, ">" | ">=" | "<" | "<=" | "=" | "~" | "^") {
            pending = Some(token.to_string());
        } else {
            out.push(token.to_string());
        }
    }
    if let Some(op) = pending {
        out.push(op);
    }
    out
}

fn parse_term(term: &str) -> Result<Interval, String> {
    if matches!(term, "*" | "x" | "X") {
        return Ok(Interval::ANY);
    }

    let (op, rest) = split_operator(term);
    if rest.is_empty() {
        return Err(format!("operator '{op}' has no version"));
    }

    if is_x_range(rest) {
        if !op.is_empty() && op != "=" {
            return Err(format!("'{term}' combines an operator with a wildcard"));
        }
        return parse_x_range(rest);
    }

    let version = Version::parse(rest).map_err(|e| e.reason)?;
    let depth = version.components().len();
    let interval = match op {
        "" | "=" => Interval::exact(version),
        ">" => Interval {
            lower: Bound::Excluded(version),
            upper: Bound::Unbounded,
        },
        ">=" => Interval {
            lower: Bound::Included(version),
            upper: Bound::Unbounded,
        },
        "<" => Interval {
            lower: Bound::Unbounded,
            upper: Bound::Excluded(version),
        },
        "<=" => Interval {
            lower: Bound::Unbounded,
            upper: Bound::Included(version),
        },
        "~" => Interval {
            upper: Bound::Excluded(version.bump(if depth >= 2 { 2 } else { 1 })),
            lower: Bound::Included(version),
        },
        "^" => Interval {
            upper: Bound::Excluded(version.bump(1)),
            lower: Bound::Included(version),
        },
        other => return Err(format!("unknown operator '{other}'")),
    };
    Ok(interval)
}

fn split_operator(term: &str) -> (&str, &str) {
    for op in [">=", "<=", ">", "<", "=", "~", "^"] {
        if let Some(rest) = term.strip_prefix(op) {
            return (op, rest);
        }
    }
    ("", term)
}

fn is_x_range(s: &str) -> bool {
    s.split('.').any(|part| matches!(part, "x" | "X" | "*"))
}

fn parse_x_range(s: &str) -> Result<Interval, String> {
    let parts: Vec<&str> = s.split('.').collect();
    let mut fixed = Vec::new();
    let mut wildcard_seen = false;
    for part in &parts {
        if matches!(*part, "x" | "X" | "*") {
            wildcard_seen = true;
        } else if wildcard_seen {
            return Err(format!("'{s}' has a number after a wildcard"));
        } else {
            let n = part
                .parse::<u64>()
                .map_err(|_| format!("'{part}' is not a numeric version component"))?;
            fixed.push(n);
        }
    }
    if fixed.is_empty() {
        return Ok(Interval::ANY);
    }
    let lower = Version::new(fixed.clone());
    let upper = lower.bump(fixed.len());
    Ok(Interval {
        lower: Bound::Included(lower),
        upper: Bound::Excluded(upper),
    })
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        Version::parse(s).expect("valid version")
    }

    fn r(s: &str) -> VersionRange {
        VersionRange::parse(s).expect("valid range")
    }

    #[test]
    fn test_any() {
        assert!(r("*").matches(&v("0.0.1")));
        assert!(r("").matches(&v("99")));
        assert!(VersionRange::any().is_any());
    }

    #[test]
    fn test_exact() {
        assert!(r("1.2.3").matches(&v("1.2.3")));
        assert!(r("=1.2").matches(&v("1.2.0")));
        assert!(r("=1.2.3").matches(&v("1.2.3+build.4")));
        assert!(!r("1.2.3").matches(&v("1.2.4")));
    }

    #[test]
    fn test_comparators() {
        assert!(r(">=2.0").matches(&v("2.0.0")));
        assert!(!r(">2.0").matches(&v("2.0.0")));
        assert!(r("<2").matches(&v("1.99")));
        assert!(r("<=2").matches(&v("2.0")));
        assert!(r(">= 1.0 < 2.0").matches(&v("1.5")));
        assert!(!r(">=1.0 <2.0").matches(&v("2.0")));
    }

    #[test]
    fn test_tilde_and_caret() {
        let tilde = r("~1.4.2");
        assert!(tilde.matches(&v("1.4.9")));
        assert!(!tilde.matches(&v("1.5.0")));
        assert!(!tilde.matches(&v("1.5.0-alpha")));
        assert!(!tilde.matches(&v("1.4.1")));

        let caret = r("^2.1");
        assert!(caret.matches(&v("2.9.9")));
        assert!(!caret.matches(&v("3.0.0")));
        assert!(!caret.matches(&v("2.0.9")));
    }

    #[test]
    fn test_x_ranges() {
        assert!(r("1.x").matches(&v("1.9.9")));
        assert!(!r("1.x").matches(&v("2.0")));
        assert!(r("1.2.*").matches(&v("1.2.7")));
        assert!(!r("1.2.*").matches(&v("1.3")));
        assert!(VersionRange::parse("1.x.3").is_err());
    }

    #[test]
    fn test_parse_errors() {
        for input in [">=", ">=banana", "!1.0", ">1.x"] {
            assert!(VersionRange::parse(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn test_parse_any_is_union() {
        let range = VersionRange::parse_any(&["1.x", ">=3"]).expect("valid ranges");
        assert!(range.matches(&v("1.5")));
        assert!(!range.matches(&v("2.5")));
        assert!(range.matches(&v("3.1")));
        assert_eq!(range.to_string(), "1.x || >=3");
    }

    #[test]
    fn test_intersect() {
        let both = r(">=1.0").intersect(&r("<2.0"));
        assert!(both.matches(&v("1.5")));
        assert!(!both.matches(&v("2.0")));
        assert!(!both.is_empty());
        assert_eq!(both.to_string(), ">=1.0 <2.0");
    }

    #[test]
    fn test_empty() {
        assert!(r(">2 <1").is_empty());
        assert!(r(">=1 <1").is_empty());
        assert!(!r(">=1 <=1").is_empty());
        assert!(r("^1").intersect(&r("^2")).is_empty());
        assert!(!r("^1").is_empty());
    }
}
