//! Link sources: where raw links for a project come from.
//!
//! The engine never performs I/O itself. It asks a [`LinkSource`] for the
//! listings of a project, each listing being the links one location offered.
//! [`LinkSnapshot`] is the in-memory source the collector fills.

mod snapshot;

use serde::Serialize;
use std::fmt;

use crate::model::Link;

pub use snapshot::LinkSnapshot;

/// Kind of location a listing came from. Find-links precede indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    FindLinks,
    Index,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::FindLinks => write!(f, "find-links"),
            SourceKind::Index => write!(f, "index"),
        }
    }
}

/// The links one location offered for a project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceListing {
    pub location: String,
    pub kind: SourceKind,
    pub links: Vec<Link>,
    /// Set when the location could not be read. The listing is then empty.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl SourceListing {
    pub fn new(location: impl Into<String>, kind: SourceKind, links: Vec<Link>) -> Self {
        Self {
            location: location.into(),
            kind,
            links,
            failure: None,
        }
    }

    pub fn failed(location: impl Into<String>, kind: SourceKind, reason: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            kind,
            links: Vec::new(),
            failure: Some(reason.into()),
        }
    }
}

/// Supplies already-resolved listings for a project.
#[cfg_attr(test, mockall::automock)]
pub trait LinkSource {
    /// Every listing consulted for `project`, in declaration order.
    fn listings(&self, project: &str) -> Vec<SourceListing>;
}

/// Order listings for evaluation: find-links first, then indexes, each in
/// declaration order.
pub fn prioritize(mut listings: Vec<SourceListing>) -> Vec<SourceListing> {
    listings.sort_by_key(|l| l.kind);
    listings
}
