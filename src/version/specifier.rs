//! Version specifiers (`>=1.0,<2.0`, `==1.4.*`, `~=2.2`).

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::Version;

static CLAUSE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?P<op>~=|===|==|!=|<=|>=|<|>)\s*(?P<version>[^\s,;]+)\s*$")
        .expect("specifier pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecifierError {
    #[error("invalid specifier: '{0}'")]
    Invalid(String),

    #[error("invalid version '{version}' in specifier '{specifier}'")]
    InvalidVersion { specifier: String, version: String },

    #[error("specifier '{0}' does not allow a '.*' suffix")]
    UnexpectedWildcard(String),

    #[error("specifier '{0}' does not allow a local version label")]
    UnexpectedLocal(String),

    #[error("specifier '{0}' needs at least two release segments")]
    CompatibleTooShort(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `~=`
    Compatible,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `===`
    Arbitrary,
}

impl Operator {
    fn parse(s: &str) -> Option<Self> {
        Some(match s {
            "~=" => Operator::Compatible,
            "==" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "<=" => Operator::LessEqual,
            ">=" => Operator::GreaterEqual,
            "<" => Operator::Less,
            ">" => Operator::Greater,
            "===" => Operator::Arbitrary,
            _ => return None,
        })
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Operator::Compatible => "~=",
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessEqual => "<=",
            Operator::GreaterEqual => ">=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::Arbitrary => "===",
        };
        write!(f, "{}", s)
    }
}

/// A single comparison clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    operator: Operator,
    /// The version text as written, without any `.*` suffix.
    raw: String,
    /// `None` only for `===` clauses whose text is not a valid version.
    version: Option<Version>,
    wildcard: bool,
}

impl Specifier {
    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn version(&self) -> Option<&Version> {
        self.version.as_ref()
    }

    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Whether this clause explicitly asks for a pre-release, e.g. `>=2.0b1`.
    pub fn prereleases(&self) -> bool {
        match self.operator {
            Operator::Equal
            | Operator::GreaterEqual
            | Operator::LessEqual
            | Operator::Compatible
            | Operator::Arbitrary => self.version.as_ref().is_some_and(Version::is_prerelease),
            _ => false,
        }
    }

    /// The exact version this clause pins, if it pins one.
    pub fn pinned_version(&self) -> Option<&Version> {
        match self.operator {
            Operator::Equal if !self.wildcard => self.version.as_ref(),
            Operator::Arbitrary => self.version.as_ref(),
            _ => None,
        }
    }

    /// Test a version against this clause, without any pre-release gating.
    pub fn matches(&self, candidate: &Version) -> bool {
        let Some(spec) = &self.version else {
            return self.operator == Operator::Arbitrary
                && candidate.to_string().eq_ignore_ascii_case(&self.raw);
        };

        match self.operator {
            Operator::Compatible => {
                let prefix = &spec.release()[..spec.release().len() - 1];
                candidate.public() >= *spec && Self::prefix_matches(candidate, spec.epoch(), prefix)
            }
            Operator::Equal => self.equal(candidate, spec),
            Operator::NotEqual => !self.equal(candidate, spec),
            Operator::LessEqual => candidate.public() <= *spec,
            Operator::GreaterEqual => candidate.public() >= *spec,
            Operator::Less => {
                // `<2.0` must not admit 2.0a1 unless the clause itself is a pre-release.
                candidate < spec
                    && !(!spec.is_prerelease()
                        && candidate.is_prerelease()
                        && candidate.base_version() == spec.base_version())
            }
            Operator::Greater => {
                let same_base = candidate.base_version() == spec.base_version();
                candidate > spec
                    && !(!spec.is_postrelease() && candidate.is_postrelease() && same_base)
                    && !(!candidate.local().is_empty() && same_base)
            }
            Operator::Arbitrary => candidate.to_string().eq_ignore_ascii_case(&self.raw),
        }
    }

    fn equal(&self, candidate: &Version, spec: &Version) -> bool {
        if self.wildcard {
            Self::prefix_matches(candidate, spec.epoch(), spec.release())
        } else if spec.local().is_empty() {
            candidate.public() == *spec
        } else {
            candidate == spec
        }
    }

    /// Release-prefix match with zero padding, so `1` matches the prefix `1.0`.
    fn prefix_matches(candidate: &Version, epoch: u64, prefix: &[u64]) -> bool {
        candidate.epoch() == epoch
            && prefix
                .iter()
                .enumerate()
                .all(|(i, n)| candidate.release().get(i).copied().unwrap_or(0) == *n)
    }
}

impl FromStr for Specifier {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = CLAUSE_RE
            .captures(s)
            .ok_or_else(|| SpecifierError::Invalid(s.trim().to_string()))?;
        let operator =
            Operator::parse(&caps["op"]).ok_or_else(|| SpecifierError::Invalid(s.to_string()))?;
        let text = &caps["version"];
        let clause = format!("{}{}", operator, text);

        if operator == Operator::Arbitrary {
            return Ok(Specifier {
                operator,
                raw: text.to_string(),
                version: text.parse().ok(),
                wildcard: false,
            });
        }

        let (raw, wildcard) = match text.strip_suffix(".*") {
            Some(prefix) => (prefix, true),
            None => (text, false),
        };

        let version: Version = raw.parse().map_err(|_| SpecifierError::InvalidVersion {
            specifier: clause.clone(),
            version: text.to_string(),
        })?;

        if wildcard {
            let release_only = version.pre().is_none()
                && version.post().is_none()
                && version.dev().is_none()
                && version.local().is_empty();
            if !matches!(operator, Operator::Equal | Operator::NotEqual) || !release_only {
                return Err(SpecifierError::UnexpectedWildcard(clause));
            }
        }

        if !version.local().is_empty() && !matches!(operator, Operator::Equal | Operator::NotEqual)
        {
            return Err(SpecifierError::UnexpectedLocal(clause));
        }

        if operator == Operator::Compatible && version.release().len() < 2 {
            return Err(SpecifierError::CompatibleTooShort(clause));
        }

        Ok(Specifier {
            operator,
            raw: raw.to_string(),
            version: Some(version),
            wildcard,
        })
    }
}

impl fmt::Display for Specifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator, self.raw)?;
        if self.wildcard {
            write!(f, ".*")?;
        }
        Ok(())
    }
}

/// A conjunction of specifier clauses. The empty set matches every version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpecifierSet {
    specifiers: Vec<Specifier>,
}

impl SpecifierSet {
    pub fn is_empty(&self) -> bool {
        self.specifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Specifier> {
        self.specifiers.iter()
    }

    /// True when any clause demands a pre-release.
    pub fn prereleases(&self) -> bool {
        self.specifiers.iter().any(Specifier::prereleases)
    }

    /// The version pinned by a lone `==V` or `===V` clause.
    pub fn pinned_version(&self) -> Option<&Version> {
        match self.specifiers.as_slice() {
            [only] => only.pinned_version(),
            _ => None,
        }
    }

    /// Test a version against every clause.
    ///
    /// `prereleases` of `None` defers to the clauses: pre-releases are only
    /// admitted when some clause explicitly names one.
    pub fn contains(&self, version: &Version, prereleases: Option<bool>) -> bool {
        let allow_pre = prereleases.unwrap_or_else(|| self.prereleases());
        if version.is_prerelease() && !allow_pre {
            return false;
        }
        self.specifiers.iter().all(|s| s.matches(version))
    }
}

impl FromStr for SpecifierSet {
    type Err = SpecifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let specifiers = s
            .split(',')
            .map(str::trim)
            .filter(|clause| !clause.is_empty())
            .map(str::parse)
            .collect::<Result<Vec<Specifier>, _>>()?;
        Ok(SpecifierSet { specifiers })
    }
}

impl fmt::Display for SpecifierSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self.specifiers.iter().map(Specifier::to_string).collect();
        write!(f, "{}", clauses.join(","))
    }
}

impl Serialize for SpecifierSet {
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

    fn set(s: &str) -> SpecifierSet {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        assert_eq!(set(">=1.0, <2.0").to_string(), ">=1.0,<2.0");
        assert_eq!(set("== 1.4.*").to_string(), "==1.4.*");
        assert!(set("").is_empty());
        assert!(set(" , ").is_empty());
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            "1.0".parse::<SpecifierSet>(),
            Err(SpecifierError::Invalid(_))
        ));
        assert!(matches!(
            ">=one".parse::<SpecifierSet>(),
            Err(SpecifierError::InvalidVersion { .. })
        ));
        assert!(matches!(
            ">=1.*".parse::<SpecifierSet>(),
            Err(SpecifierError::UnexpectedWildcard(_))
        ));
        assert!(matches!(
            "==1.0a1.*".parse::<SpecifierSet>(),
            Err(SpecifierError::UnexpectedWildcard(_))
        ));
        assert!(matches!(
            "<=1.0+local".parse::<SpecifierSet>(),
            Err(SpecifierError::UnexpectedLocal(_))
        ));
        assert!(matches!(
            "~=1".parse::<SpecifierSet>(),
            Err(SpecifierError::CompatibleTooShort(_))
        ));
    }

    #[test]
    fn test_range() {
        let spec = set(">=1.0,<2.0");
        assert!(spec.contains(&v("1.0"), None));
        assert!(spec.contains(&v("1.9.9"), None));
        assert!(!spec.contains(&v("2.0"), None));
        assert!(!spec.contains(&v("0.9"), None));
    }

    #[test]
    fn test_equal_pads_and_ignores_local() {
        assert!(set("==1.0").contains(&v("1.0.0"), None));
        assert!(set("==1.0").contains(&v("1.0+local"), None));
        assert!(!set("==1.0+a").contains(&v("1.0+b"), None));
        assert!(!set("!=1.0").contains(&v("1.0"), None));
    }

    #[test]
    fn test_wildcard() {
        let spec = set("==1.4.*");
        assert!(spec.contains(&v("1.4"), None));
        assert!(spec.contains(&v("1.4.7"), None));
        assert!(!spec.contains(&v("1.5"), None));
        assert!(set("!=1.4.*").contains(&v("1.5"), None));
    }

    #[test]
    fn test_compatible_release() {
        let spec = set("~=2.2");
        assert!(spec.contains(&v("2.2"), None));
        assert!(spec.contains(&v("2.9"), None));
        assert!(!spec.contains(&v("3.0"), None));

        let spec = set("~=1.4.5");
        assert!(spec.contains(&v("1.4.9"), None));
        assert!(!spec.contains(&v("1.5.0"), None));
    }

    #[test]
    fn test_exclusive_bounds_exclude_own_pre_and_post_releases() {
        assert!(!set("<2.0").contains(&v("2.0a1"), Some(true)));
        assert!(set("<2.0").contains(&v("1.9a1"), Some(true)));
        assert!(set("<2.0b2").contains(&v("2.0b1"), Some(true)));
        assert!(!set(">1.0").contains(&v("1.0.post1"), None));
        assert!(set(">1.0.post1").contains(&v("1.0.post2"), None));
        assert!(!set(">1.0").contains(&v("1.0+local"), None));
        assert!(set(">1.0").contains(&v("1.1"), None));
    }

    #[test]
    fn test_prereleases_hidden_unless_requested() {
        let empty = SpecifierSet::default();
        assert!(!empty.contains(&v("2.0b1"), None));
        assert!(empty.contains(&v("2.0b1"), Some(true)));

        let demands = set(">=0.0.dev0");
        assert!(demands.prereleases());
        assert!(demands.contains(&v("2.0b1"), None));

        assert!(!set("!=2.0b1").prereleases());
    }

    #[test]
    fn test_arbitrary_equality() {
        let spec = set("===1.0");
        assert!(spec.contains(&v("1.0"), None));
        assert!(!spec.contains(&v("1.0.0"), None));
    }

    #[test]
    fn test_pinned_version() {
        assert_eq!(set("==1.2").pinned_version(), Some(&v("1.2")));
        assert_eq!(set("===1.2").pinned_version(), Some(&v("1.2")));
        assert_eq!(set("==1.*").pinned_version(), None);
        assert_eq!(set(">=1.2").pinned_version(), None);
        assert_eq!(set("==1.2,!=1.3").pinned_version(), None);
    }
}
