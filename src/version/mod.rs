//! Version parsing and ordering.
//!
//! Versions follow PEP 440 public-version semantics: an optional epoch, a
//! dotted release, then optional pre-, post- and dev-release segments and a
//! local label. Parsing normalizes the alternative spellings (`alpha`, `-1`,
//! `rev`, `_`, ...) so that equal versions compare and display identically.

mod specifier;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use thiserror::Error;

pub use specifier::{Operator, Specifier, SpecifierError, SpecifierSet};

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?xi)
        ^\s*v?
        (?:(?P<epoch>[0-9]+)!)?
        (?P<release>[0-9]+(?:\.[0-9]+)*)
        (?P<pre>
            [-_.]?
            (?P<pre_l>alpha|a|beta|b|preview|pre|rc|c)
            [-_.]?
            (?P<pre_n>[0-9]+)?
        )?
        (?P<post>
            (?:-(?P<post_n1>[0-9]+))
            |
            (?:[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)
        )?
        (?P<dev>[-_.]?dev[-_.]?(?P<dev_n>[0-9]+)?)?
        (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
        \s*$",
    )
    .expect("version pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
    #[error("invalid version: '{0}'")]
    Invalid(String),
}

/// Pre-release phase, ordered alpha < beta < release candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    Rc,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::Rc,
        }
    }
}

impl fmt::Display for PreRelease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreRelease::Alpha => write!(f, "a"),
            PreRelease::Beta => write!(f, "b"),
            PreRelease::Rc => write!(f, "rc"),
        }
    }
}

/// One dot-separated piece of a local version label.
///
/// Variant order matters: alphanumeric segments sort below numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalSegment {
    Text(String),
    Number(u64),
}

impl LocalSegment {
    fn parse(segment: &str) -> Self {
        match segment.parse::<u64>() {
            Ok(n) if segment.bytes().all(|b| b.is_ascii_digit()) => LocalSegment::Number(n),
            _ => LocalSegment::Text(segment.to_ascii_lowercase()),
        }
    }
}

impl fmt::Display for LocalSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocalSegment::Text(s) => write!(f, "{}", s),
            LocalSegment::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A parsed, normalized version.
#[derive(Debug, Clone)]
pub struct Version {
    epoch: u64,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Vec<LocalSegment>,
}

/// Placement of the pre-release segment within the ordering key.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum PreKey {
    /// A dev release with no pre or post segment sorts before every pre-release.
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

impl Version {
    /// Build a plain release version such as `3.8` or `1.0.2`.
    pub fn from_release(release: impl Into<Vec<u64>>) -> Self {
        Self {
            epoch: 0,
            release: release.into(),
            pre: None,
            post: None,
            dev: None,
            local: Vec::new(),
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn release(&self) -> &[u64] {
        &self.release
    }

    pub fn pre(&self) -> Option<(PreRelease, u64)> {
        self.pre
    }

    pub fn post(&self) -> Option<u64> {
        self.post
    }

    pub fn dev(&self) -> Option<u64> {
        self.dev
    }

    pub fn local(&self) -> &[LocalSegment] {
        &self.local
    }

    /// Pre-releases and dev releases both count as pre-releases.
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    pub fn is_devrelease(&self) -> bool {
        self.dev.is_some()
    }

    pub fn is_postrelease(&self) -> bool {
        self.post.is_some()
    }

    /// The version without its local label.
    pub fn public(&self) -> Version {
        Version {
            local: Vec::new(),
            ..self.clone()
        }
    }

    /// Epoch and release only, e.g. `1.0` for `1.0rc1.post2`.
    pub fn base_version(&self) -> Version {
        Version {
            epoch: self.epoch,
            ..Version::from_release(self.release.clone())
        }
    }

    fn trimmed_release(&self) -> &[u64] {
        let end = self
            .release
            .iter()
            .rposition(|&n| n != 0)
            .map_or(0, |i| i + 1);
        &self.release[..end]
    }

    fn pre_key(&self) -> PreKey {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => PreKey::DevOnly,
            (Some((kind, n)), _, _) => PreKey::Pre(kind, n),
            (None, _, _) => PreKey::Final,
        }
    }

    fn dev_key(&self) -> (bool, u64) {
        // A missing dev segment sorts after any dev number.
        (self.dev.is_none(), self.dev.unwrap_or(0))
    }

    fn local_key(&self) -> (bool, &[LocalSegment]) {
        (!self.local.is_empty(), &self.local)
    }

    fn parse_number(input: &str, text: &str) -> Result<u64, VersionError> {
        text.parse::<u64>()
            .map_err(|_| VersionError::Invalid(input.to_string()))
    }

    fn optional_number(
        input: &str,
        caps: &Captures<'_>,
        name: &str,
    ) -> Result<Option<u64>, VersionError> {
        caps.name(name)
            .map(|m| Self::parse_number(input, m.as_str()))
            .transpose()
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = VERSION_RE
            .captures(s)
            .ok_or_else(|| VersionError::Invalid(s.to_string()))?;

        let epoch = Self::optional_number(s, &caps, "epoch")?.unwrap_or(0);
        let release = caps["release"]
            .split('.')
            .map(|part| Self::parse_number(s, part))
            .collect::<Result<Vec<_>, _>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some((
                PreRelease::from_label(label.as_str()),
                Self::optional_number(s, &caps, "pre_n")?.unwrap_or(0),
            )),
            None => None,
        };

        let post = if caps.name("post").is_some() {
            let n1 = Self::optional_number(s, &caps, "post_n1")?;
            let n2 = Self::optional_number(s, &caps, "post_n2")?;
            Some(n1.or(n2).unwrap_or(0))
        } else {
            None
        };

        let dev = if caps.name("dev").is_some() {
            Some(Self::optional_number(s, &caps, "dev_n")?.unwrap_or(0))
        } else {
            None
        };

        let local = caps
            .name("local")
            .map(|m| {
                m.as_str()
                    .split(['-', '_', '.'])
                    .map(LocalSegment::parse)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Version {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((kind, n)) = self.pre {
            write!(f, "{}{}", kind, n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        if !self.local.is_empty() {
            let local: Vec<String> = self.local.iter().map(LocalSegment::to_string).collect();
            write!(f, "+{}", local.join("."))?;
        }
        Ok(())
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.trimmed_release().cmp(other.trimmed_release()))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local_key().cmp(&other.local_key()))
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
        self.epoch.hash(state);
        self.trimmed_release().hash(state);
        self.pre.hash(state);
        self.post.hash(state);
        self.dev.hash(state);
        self.local.hash(state);
    }
}

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> Version {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_normalizes_spellings() {
        assert_eq!(v("1.0ALPHA1").to_string(), "1.0a1");
        assert_eq!(v("1.0-beta.2").to_string(), "1.0b2");
        assert_eq!(v("1.0c3").to_string(), "1.0rc3");
        assert_eq!(v("1.0-preview").to_string(), "1.0rc0");
        assert_eq!(v("1.0-1").to_string(), "1.0.post1");
        assert_eq!(v("1.0.rev4").to_string(), "1.0.post4");
        assert_eq!(v("1.0-dev").to_string(), "1.0.dev0");
        assert_eq!(v("v2.1").to_string(), "2.1");
        assert_eq!(v("1!2.0").to_string(), "1!2.0");
        assert_eq!(v("1.0+Ubuntu-1").to_string(), "1.0+ubuntu.1");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Version>().is_err());
        assert!("-invalid-".parse::<Version>().is_err());
        assert!("1.0.x".parse::<Version>().is_err());
        assert!("one".parse::<Version>().is_err());
        assert!("1.0+".parse::<Version>().is_err());
    }

    #[test]
    fn test_trailing_zeros_are_insignificant() {
        assert_eq!(v("1.0"), v("1.0.0"));
        assert_eq!(v("1"), v("1.0.0.0"));
        assert!(v("1.0.1") > v("1.0"));
    }

    #[test]
    fn test_release_segments_compare_numerically() {
        assert!(v("1.10") > v("1.9"));
        assert!(v("0.11.5") > v("0.10.4"));
        assert!(v("2.0") > v("1.99.99"));
    }

    #[test]
    fn test_release_phases_order() {
        let ordered = [
            "1.0.dev0",
            "1.0a1.dev1",
            "1.0a1",
            "1.0b1",
            "1.0rc1",
            "1.0",
            "1.0+local",
            "1.0.post1.dev0",
            "1.0.post1",
            "1.1.dev0",
        ];
        for pair in ordered.windows(2) {
            assert!(v(pair[0]) < v(pair[1]), "{} < {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_epoch_dominates() {
        assert!(v("1!0.1") > v("99.0"));
    }

    #[test]
    fn test_local_numeric_beats_text() {
        assert!(v("1.0+5") > v("1.0+abc"));
        assert!(v("1.0+abc.1") > v("1.0+abc"));
    }

    #[test]
    fn test_prerelease_flags() {
        assert!(v("2.0b1").is_prerelease());
        assert!(v("2.0.dev1").is_prerelease());
        assert!(v("2.0.dev1").is_devrelease());
        assert!(!v("2.0.post1").is_prerelease());
        assert!(v("2.0.post1").is_postrelease());
    }

    #[test]
    fn test_public_and_base_version() {
        let version = v("1!2.0rc1.post3+abc");
        assert_eq!(version.public().to_string(), "1!2.0rc1.post3");
        assert_eq!(version.base_version().to_string(), "1!2.0");
    }

    #[test]
    fn test_hash_matches_equality() {
        use std::collections::HashSet;

        let set: HashSet<Version> = [v("1.0"), v("1.0.0"), v("1.0.0.0")].into_iter().collect();
        assert_eq!(set.len(), 1);
    }
}
