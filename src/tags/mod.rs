//! Compatibility tags and the target interpreter profile.
//!
//! A built distribution names the interpreter, ABI and platform it was built
//! for. The target profile lists the triples it can run, most preferred
//! first; that order doubles as the tie-break priority between wheels.

mod platform;
mod supported;

use anyhow::Result;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::version::Version;

pub use platform::Platform;
pub use supported::{default_abis, supported_tags};

/// An interpreter/ABI/platform triple, e.g. `cp312-cp312-manylinux2014_x86_64`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Tag {
    interpreter: String,
    abi: String,
    platform: String,
}

impl Tag {
    /// Tags compare case-insensitively, so they are stored lowercase.
    pub fn new(interpreter: &str, abi: &str, platform: &str) -> Self {
        Self {
            interpreter: interpreter.to_ascii_lowercase(),
            abi: abi.to_ascii_lowercase(),
            platform: platform.to_ascii_lowercase(),
        }
    }

    pub fn interpreter(&self) -> &str {
        &self.interpreter
    }

    pub fn abi(&self) -> &str {
        &self.abi
    }

    pub fn platform(&self) -> &str {
        &self.platform
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.interpreter, self.abi, self.platform)
    }
}

impl FromStr for Tag {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split('-').collect();
        match parts.as_slice() {
            [interpreter, abi, platform]
                if !interpreter.is_empty() && !abi.is_empty() && !platform.is_empty() =>
            {
                Ok(Tag::new(interpreter, abi, platform))
            }
            _ => anyhow::bail!(
                "Invalid tag '{}'. Expected 'interpreter-abi-platform'.",
                s
            ),
        }
    }
}

impl Serialize for Tag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Ordered list of supported tags, most preferred first.
#[derive(Debug, Clone, Default)]
pub struct TagList {
    tags: Vec<Tag>,
    positions: HashMap<Tag, usize>,
}

impl TagList {
    /// Duplicates keep their first (most preferred) position.
    pub fn new(tags: Vec<Tag>) -> Self {
        let mut positions = HashMap::with_capacity(tags.len());
        let mut unique = Vec::with_capacity(tags.len());
        for tag in tags {
            if !positions.contains_key(&tag) {
                positions.insert(tag.clone(), unique.len());
                unique.push(tag);
            }
        }
        Self {
            tags: unique,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tag> {
        self.tags.iter()
    }

    pub fn position(&self, tag: &Tag) -> Option<usize> {
        self.positions.get(tag).copied()
    }

    /// Most preferred position among `tags`, `None` when none is supported.
    pub fn best_position(&self, tags: &[Tag]) -> Option<usize> {
        tags.iter().filter_map(|t| self.position(t)).min()
    }
}

impl PartialEq for TagList {
    fn eq(&self, other: &Self) -> bool {
        self.tags == other.tags
    }
}

impl FromIterator<Tag> for TagList {
    fn from_iter<I: IntoIterator<Item = Tag>>(iter: I) -> Self {
        TagList::new(iter.into_iter().collect())
    }
}

/// The interpreter and platform a lookup is performed for.
#[derive(Debug, Clone)]
pub struct TargetProfile {
    interpreter_version: Version,
    supported_tags: TagList,
}

impl TargetProfile {
    pub fn new(interpreter_version: Version, supported_tags: TagList) -> Self {
        Self {
            interpreter_version,
            supported_tags,
        }
    }

    /// Profile for `implementation` at `major.minor` on the running platform.
    pub fn detect(implementation: &str, major: u64, minor: u64) -> Self {
        let platform = Platform::detect();
        let abis = default_abis(implementation, major, minor);
        let tags = supported_tags(implementation, (major, minor), &abis, &platform.platform_tags());
        Self::new(Version::from_release([major, minor]), tags)
    }

    pub fn interpreter_version(&self) -> &Version {
        &self.interpreter_version
    }

    pub fn supported_tags(&self) -> &TagList {
        &self.supported_tags
    }
}
