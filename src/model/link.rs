use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use url::Url;

use super::Hashes;

static DIGEST_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(md5|sha1|sha224|sha256|sha384|sha512)=([0-9a-f]+)")
        .expect("digest pattern is valid")
});

static EGG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|&)egg=([^&]*)").expect("egg pattern is valid"));

/// URL scheme class of a link, used for source ranking.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    File,
    Http,
    Https,
    Other(String),
}

impl Scheme {
    fn from_url(url: &Url) -> Self {
        match url.scheme() {
            "file" => Scheme::File,
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            other => Scheme::Other(other.to_string()),
        }
    }

    /// Local files rank above the network, which ranks above anything else.
    pub fn priority(&self) -> u8 {
        match self {
            Scheme::File => 2,
            Scheme::Http | Scheme::Https => 1,
            Scheme::Other(_) => 0,
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::File => write!(f, "file"),
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
            Scheme::Other(s) => write!(f, "{}", s),
        }
    }
}

/// A digest carried in a link's URL fragment, e.g. `#sha256=ab12...`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct LinkHash {
    pub algorithm: String,
    pub hex: String,
}

impl fmt::Display for LinkHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// A candidate location found in a listing, plus the metadata the index
/// attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    url: String,
    scheme: Scheme,
    filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    requires_interpreter: Option<String>,
    yanked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    yank_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    digest: Option<LinkHash>,
    /// `<name>-<version>` from an `#egg=` fragment, for links whose filename
    /// does not name the distribution.
    #[serde(skip_serializing_if = "Option::is_none")]
    egg_fragment: Option<String>,
}

impl Link {
    pub fn from_url(url: &Url) -> Self {
        let filename = url
            .path()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
            .unwrap_or_default();

        let digest = url.fragment().and_then(|fragment| {
            DIGEST_RE.captures(fragment).map(|caps| LinkHash {
                algorithm: caps[1].to_ascii_lowercase(),
                hex: caps[2].to_ascii_lowercase(),
            })
        });

        let egg_fragment = url.fragment().and_then(|fragment| {
            EGG_RE
                .captures(fragment)
                .map(|caps| percent_decode_str(&caps[1]).decode_utf8_lossy().into_owned())
                .filter(|egg| !egg.is_empty())
        });

        Self {
            url: url.to_string(),
            scheme: Scheme::from_url(url),
            filename,
            requires_interpreter: None,
            yanked: false,
            yank_reason: None,
            digest,
            egg_fragment,
        }
    }

    pub fn parse(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).with_context(|| format!("Invalid link URL: {}", url))?;
        Ok(Self::from_url(&parsed))
    }

    /// Link to a local file. The path must be absolute.
    pub fn from_path(path: &Path) -> Result<Self> {
        let url = Url::from_file_path(path)
            .map_err(|_| anyhow::anyhow!("Path is not absolute: {}", path.display()))?;
        Ok(Self::from_url(&url))
    }

    /// Accept either a URL or an absolute filesystem path.
    pub fn from_location(location: &str) -> Result<Self> {
        if !location.contains("://") && Path::new(location).is_absolute() {
            Self::from_path(Path::new(location))
        } else {
            Self::parse(location)
        }
    }

    pub fn with_requires_interpreter(mut self, constraint: impl Into<String>) -> Self {
        self.requires_interpreter = Some(constraint.into());
        self
    }

    /// Mark the link yanked. An empty reason counts as no reason.
    pub fn with_yank(mut self, reason: Option<String>) -> Self {
        self.yanked = true;
        self.yank_reason = reason.filter(|r| !r.is_empty());
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn requires_interpreter(&self) -> Option<&str> {
        self.requires_interpreter.as_deref()
    }

    pub fn is_yanked(&self) -> bool {
        self.yanked
    }

    pub fn yank_reason(&self) -> Option<&str> {
        self.yank_reason.as_deref()
    }

    pub fn digest(&self) -> Option<&LinkHash> {
        self.digest.as_ref()
    }

    pub fn is_hash_allowed(&self, hashes: &Hashes) -> bool {
        self.digest.as_ref().is_some_and(|d| hashes.is_allowed(d))
    }

    pub fn egg_fragment(&self) -> Option<&str> {
        self.egg_fragment.as_deref()
    }

    /// A `.zip` under a `macosx10` path: an old Mac installer bundle, not a
    /// source archive.
    pub fn is_macosx10_zip(&self) -> bool {
        let path = self.url.split(['?', '#']).next().unwrap_or(&self.url);
        path.contains("macosx10") && self.filename.to_ascii_lowercase().ends_with(".zip")
    }
}

impl fmt::Display for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)?;
        if let Some(constraint) = &self.requires_interpreter {
            write!(f, " (requires-python:{})", constraint)?;
        }
        Ok(())
    }
}
