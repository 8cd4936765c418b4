use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

use super::{Link, canonicalize_name};
use crate::version::SpecifierSet;

static NAME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^([a-z0-9]|[a-z0-9][a-z0-9._-]*[a-z0-9])$").expect("name pattern is valid")
});

/// A single requirement: a project, a version constraint and optionally a
/// direct link that bypasses discovery.
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub name: String,
    pub specifier: SpecifierSet,
    pub link: Option<Link>,
}

impl Requirement {
    pub fn new(name: impl Into<String>, specifier: SpecifierSet) -> Self {
        Self {
            name: name.into(),
            specifier,
            link: None,
        }
    }

    pub fn canonical_name(&self) -> String {
        canonicalize_name(&self.name)
    }
}

fn validate_name(name: &str) -> Result<()> {
    if !NAME_RE.is_match(name) {
        bail!("Invalid project name '{}'", name);
    }
    Ok(())
}

impl FromStr for Requirement {
    type Err = anyhow::Error;

    /// Accepts `name`, `name<specifiers>` and `name @ <url-or-absolute-path>`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();

        if let Some((name, location)) = s.split_once('@') {
            let name = name.trim();
            validate_name(name)?;
            let link = Link::from_location(location.trim())
                .with_context(|| format!("Invalid direct reference in '{}'", s))?;
            return Ok(Self {
                name: name.to_string(),
                specifier: SpecifierSet::default(),
                link: Some(link),
            });
        }

        let split = s
            .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
            .unwrap_or(s.len());
        let (name, rest) = s.split_at(split);
        validate_name(name)?;

        let rest = rest.trim();
        let rest = rest
            .strip_prefix('(')
            .and_then(|r| r.strip_suffix(')'))
            .unwrap_or(rest);
        let specifier = rest
            .parse::<SpecifierSet>()
            .with_context(|| format!("Invalid requirement '{}'", s))?;

        Ok(Self::new(name, specifier))
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.link {
            Some(link) => write!(f, "{} @ {}", self.name, link.url()),
            None => write!(f, "{}{}", self.name, self.specifier),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_name() {
        let req: Requirement = "Simple".parse().unwrap();
        assert_eq!(req.name, "Simple");
        assert_eq!(req.canonical_name(), "simple");
        assert!(req.specifier.is_empty());
        assert!(req.link.is_none());
    }

    #[test]
    fn test_parse_with_specifiers() {
        let req: Requirement = "zope.interface >=5.0, <6".parse().unwrap();
        assert_eq!(req.name, "zope.interface");
        assert_eq!(req.specifier.iter().count(), 2);
        assert_eq!(req.to_string(), "zope.interface>=5.0,<6");

        let req: Requirement = "pkg (==1.0)".parse().unwrap();
        assert_eq!(req.specifier.iter().count(), 1);
    }

    #[test]
    fn test_parse_direct_reference() {
        let req: Requirement = "simple @ https://example.com/simple-1.0.tar.gz"
            .parse()
            .unwrap();
        assert_eq!(req.name, "simple");
        assert_eq!(
            req.link.as_ref().map(Link::filename),
            Some("simple-1.0.tar.gz")
        );
        assert_eq!(
            req.to_string(),
            "simple @ https://example.com/simple-1.0.tar.gz"
        );
    }

    #[test]
    fn test_parse_invalid() {
        assert!("".parse::<Requirement>().is_err());
        assert!("-pkg".parse::<Requirement>().is_err());
        assert!("pkg >>1.0".parse::<Requirement>().is_err());
        assert!("pkg[extra]".parse::<Requirement>().is_err());
        assert!("pkg @ relative/path.tar.gz".parse::<Requirement>().is_err());
    }
}
