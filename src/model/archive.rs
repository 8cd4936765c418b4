use serde::Serialize;
use std::fmt;
use thiserror::Error;

use super::{Link, canonicalize_name};
use crate::tags::Tag;
use crate::version::Version;

const WHEEL_EXTENSION: &str = ".whl";

/// Source archive extensions, longest first so `.tar.gz` wins over `.gz`.
const SOURCE_EXTENSIONS: &[&str] = &[
    ".tar.lzma",
    ".tar.bz2",
    ".tar.gz",
    ".tar.xz",
    ".tar.lz",
    ".tar",
    ".tbz",
    ".tgz",
    ".txz",
    ".tlz",
    ".zip",
];

/// Distribution format. Binary sorts above source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Source,
    Binary,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Source => write!(f, "source"),
            Format::Binary => write!(f, "binary"),
        }
    }
}

/// Wheel build tag: a leading integer and an optional trailing label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct BuildTag {
    pub number: u64,
    pub suffix: String,
}

impl BuildTag {
    fn parse(raw: &str) -> Option<Self> {
        let split = raw
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(raw.len());
        let number = raw[..split].parse().ok()?;
        Some(Self {
            number,
            suffix: raw[split..].to_string(),
        })
    }
}

impl fmt::Display for BuildTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.number, self.suffix)
    }
}

/// Why a filename could not be read as a distribution archive.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnparsableName {
    #[error("not a file")]
    NotAFile,
    #[error("unsupported archive format: {0}")]
    UnsupportedFormat(String),
    #[error("invalid wheel filename")]
    InvalidWheel,
    #[error("ambiguous name/version split")]
    Ambiguous,
    #[error("missing project name")]
    MissingName,
}

/// Project, version and tags recovered from a distribution filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    pub project_name: String,
    /// As written in the filename. Parsed later so a bad version is its own
    /// rejection reason.
    pub version: String,
    pub format: Format,
    pub build_tag: Option<BuildTag>,
    pub interpreter_tag: Option<String>,
    pub abi_tag: Option<String>,
    pub platform_tag: Option<String>,
}

impl ArchiveName {
    pub fn parse(filename: &str) -> Result<Self, UnparsableName> {
        if filename.is_empty() {
            return Err(UnparsableName::NotAFile);
        }
        let lower = filename.to_ascii_lowercase();

        if lower.ends_with(WHEEL_EXTENSION) {
            let stem = &filename[..filename.len() - WHEEL_EXTENSION.len()];
            return Self::parse_wheel(stem);
        }

        match SOURCE_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)) {
            Some(ext) => Self::parse_source(&filename[..filename.len() - ext.len()]),
            None => {
                let ext = filename
                    .rfind('.')
                    .map(|i| filename[i..].to_string())
                    .unwrap_or_default();
                Err(UnparsableName::UnsupportedFormat(ext))
            }
        }
    }

    /// The archive a link stands for when looking for `project`: its egg
    /// fragment when it carries one, else its filename.
    pub fn for_link(link: &Link, project: &str) -> Result<Self, UnparsableName> {
        match link.egg_fragment() {
            Some(fragment) => Self::from_egg_fragment(fragment, project),
            None => Self::parse(link.filename()),
        }
    }

    /// `<name>-<version>` from an `#egg=` fragment. Names and versions may both
    /// contain hyphens, so the split is taken at the first hyphen whose left
    /// side canonicalizes to `project`. Without one the whole fragment is the
    /// name. Always a source distribution.
    pub fn from_egg_fragment(fragment: &str, project: &str) -> Result<Self, UnparsableName> {
        if fragment.is_empty() || fragment.starts_with('-') {
            return Err(UnparsableName::MissingName);
        }
        let canonical = canonicalize_name(project);
        let split = fragment
            .match_indices('-')
            .map(|(i, _)| i)
            .find(|&i| canonicalize_name(&fragment[..i]) == canonical);

        let (name, version) = match split {
            Some(i) => (&fragment[..i], &fragment[i + 1..]),
            None => (fragment, ""),
        };

        Ok(Self {
            project_name: name.to_string(),
            version: version.to_string(),
            format: Format::Source,
            build_tag: None,
            interpreter_tag: None,
            abi_tag: None,
            platform_tag: None,
        })
    }

    fn parse_wheel(stem: &str) -> Result<Self, UnparsableName> {
        let parts: Vec<&str> = stem.split('-').collect();
        if parts.iter().any(|p| p.is_empty()) {
            return Err(UnparsableName::InvalidWheel);
        }

        let (name, version, build, interpreter, abi, platform) = match parts.as_slice() {
            [n, v, i, a, p] => (*n, *v, None, *i, *a, *p),
            [n, v, b, i, a, p] => {
                if !b.starts_with(|c: char| c.is_ascii_digit()) {
                    return Err(UnparsableName::InvalidWheel);
                }
                (*n, *v, BuildTag::parse(b), *i, *a, *p)
            }
            _ => return Err(UnparsableName::InvalidWheel),
        };

        Ok(Self {
            project_name: name.to_string(),
            version: version.replace('_', "-"),
            format: Format::Binary,
            build_tag: build,
            interpreter_tag: Some(interpreter.to_string()),
            abi_tag: Some(abi.to_string()),
            platform_tag: Some(platform.to_string()),
        })
    }

    /// `<name>-<version>` where both halves may contain hyphens. The split is
    /// taken at the only hyphen whose right side is a valid version.
    fn parse_source(stem: &str) -> Result<Self, UnparsableName> {
        if stem.is_empty() {
            return Err(UnparsableName::MissingName);
        }

        let hyphens: Vec<usize> = stem.match_indices('-').map(|(i, _)| i).collect();
        let valid: Vec<usize> = hyphens
            .iter()
            .copied()
            .filter(|&i| stem[i + 1..].parse::<Version>().is_ok())
            .collect();

        let split = match valid.as_slice() {
            [only] => Some(*only),
            [] => hyphens.last().copied(),
            _ => return Err(UnparsableName::Ambiguous),
        };

        let (name, version) = match split {
            Some(i) => (&stem[..i], &stem[i + 1..]),
            None => (stem, ""),
        };
        if name.is_empty() {
            return Err(UnparsableName::MissingName);
        }

        Ok(Self {
            project_name: name.to_string(),
            version: version.to_string(),
            format: Format::Source,
            build_tag: None,
            interpreter_tag: None,
            abi_tag: None,
            platform_tag: None,
        })
    }

    /// Every tag triple this archive claims, expanding compressed sets such as
    /// `py2.py3`. Empty for source archives.
    pub fn tags(&self) -> Vec<Tag> {
        let (Some(interpreters), Some(abis), Some(platforms)) =
            (&self.interpreter_tag, &self.abi_tag, &self.platform_tag)
        else {
            return Vec::new();
        };

        let mut tags = Vec::new();
        for interpreter in interpreters.split('.') {
            for abi in abis.split('.') {
                for platform in platforms.split('.') {
                    tags.push(Tag::new(interpreter, abi, platform));
                }
            }
        }
        tags
    }
}
