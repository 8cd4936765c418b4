use serde::Serialize;
use std::fmt;

use super::{ArchiveName, Format, Link};
use crate::tags::Tag;
use crate::version::Version;

/// A link that passed evaluation, with its parsed name and version.
#[derive(Debug, Clone, Serialize)]
pub struct InstallationCandidate {
    name: String,
    version: Version,
    link: Link,
    #[serde(skip)]
    archive: ArchiveName,
}

impl InstallationCandidate {
    /// Only the link evaluator builds candidates; `name` is already canonical.
    pub(crate) fn new(name: String, version: Version, link: Link, archive: ArchiveName) -> Self {
        Self {
            name,
            version,
            link,
            archive,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &Version {
        &self.version
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn archive(&self) -> &ArchiveName {
        &self.archive
    }

    pub fn format(&self) -> Format {
        self.archive.format
    }

    pub fn tags(&self) -> Vec<Tag> {
        self.archive.tags()
    }
}

impl PartialEq for InstallationCandidate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.version == other.version
            && self.link.url() == other.link.url()
    }
}

impl Eq for InstallationCandidate {}

impl fmt::Display for InstallationCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} ({})", self.name, self.version, self.link.url())
    }
}
