use serde::{Serialize, Serializer};
use std::fmt;

use crate::evaluate::{LinkEvaluation, RejectReason};
use crate::model::InstallationCandidate;
use crate::version::Version;

/// Why a lookup produced nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum NotFoundReason {
    NoLinks,
    NoCompatibleLinks,
    NoMatchingVersion(String),
    DirectLink(RejectReason),
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundReason::NoLinks => write!(f, "no links found"),
            NotFoundReason::NoCompatibleLinks => write!(f, "no compatible distributions found"),
            NotFoundReason::NoMatchingVersion(spec) if spec.is_empty() => {
                write!(f, "no stable version available")
            }
            NotFoundReason::NoMatchingVersion(spec) => {
                write!(f, "no version satisfies {}", spec)
            }
            NotFoundReason::DirectLink(reason) => write!(f, "direct link rejected: {}", reason),
        }
    }
}

impl Serialize for NotFoundReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of a best-candidate lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum Outcome {
    Found {
        candidate: InstallationCandidate,
    },
    /// The installed version ranks at least as high as anything available.
    AlreadySatisfied {
        installed: Version,
        best_available: Version,
    },
    NotFound {
        project: String,
        reason: NotFoundReason,
        consulted_sources: Vec<String>,
        /// Versions of accepted links before version filtering, ascending.
        versions_seen: Vec<Version>,
    },
}

impl Outcome {
    pub fn candidate(&self) -> Option<&InstallationCandidate> {
        match self {
            Outcome::Found { candidate } => Some(candidate),
            _ => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Outcome::Found { .. })
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Found { candidate } => write!(f, "Found {}", candidate),
            Outcome::AlreadySatisfied {
                installed,
                best_available,
            } => write!(
                f,
                "Already satisfied by installed {} (best available: {})",
                installed, best_available
            ),
            Outcome::NotFound {
                project,
                reason,
                consulted_sources,
                versions_seen,
            } => {
                write!(f, "No candidate for {}: {}", project, reason)?;
                if !versions_seen.is_empty() {
                    let versions: Vec<String> =
                        versions_seen.iter().map(ToString::to_string).collect();
                    write!(f, " (from versions: {})", versions.join(", "))?;
                }
                if consulted_sources.is_empty() {
                    write!(f, "; no sources were consulted")
                } else {
                    write!(f, "; consulted {}", consulted_sources.join(", "))
                }
            }
        }
    }
}

/// Everything a lookup looked at, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct FindReport {
    pub requirement: String,
    pub outcome: Outcome,
    pub evaluations: Vec<LinkEvaluation>,
    /// Candidates that passed version filtering, best first.
    pub applicable: Vec<InstallationCandidate>,
}
