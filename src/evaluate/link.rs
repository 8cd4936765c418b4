use log::debug;
use serde::{Serialize, Serializer};
use std::fmt;

use super::{AllowedFormats, EvaluationPolicy, Evaluator};
use crate::model::{
    ArchiveName, Format, InstallationCandidate, Link, UnparsableName, canonicalize_name,
};
use crate::tags::TargetProfile;
use crate::version::{SpecifierSet, Version};

/// Why a link was turned down. The display strings are stable and meant for
/// diagnostics output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Unparsable(UnparsableName),
    MacInstallerZip,
    WrongProject(String),
    MissingVersion,
    InvalidVersion(String),
    UnsupportedTags(Vec<String>),
    RequiresInterpreter { constraint: String, version: Version },
    FormatNotAllowed(Format),
    Yanked(Option<String>),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Unparsable(reason) => write!(f, "unparsable filename ({})", reason),
            RejectReason::MacInstallerZip => write!(f, "macosx10 installer zip"),
            RejectReason::WrongProject(name) => write!(f, "wrong project name: {}", name),
            RejectReason::MissingVersion => write!(f, "missing version"),
            RejectReason::InvalidVersion(raw) => write!(f, "invalid version: {}", raw),
            RejectReason::UnsupportedTags(tags) => {
                write!(f, "none of the wheel's tags ({}) are compatible", tags.join(", "))
            }
            RejectReason::RequiresInterpreter {
                constraint,
                version,
            } => write!(
                f,
                "requires-python {} does not match interpreter {}",
                constraint, version
            ),
            RejectReason::FormatNotAllowed(format) => {
                write!(f, "{} distributions are not allowed", format)
            }
            RejectReason::Yanked(Some(reason)) => write!(f, "yanked ({})", reason),
            RejectReason::Yanked(None) => write!(f, "yanked"),
        }
    }
}

impl Serialize for RejectReason {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Result of evaluating one link.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Verdict {
    Accepted(InstallationCandidate),
    Rejected { reason: RejectReason },
}

impl Verdict {
    pub fn candidate(&self) -> Option<&InstallationCandidate> {
        match self {
            Verdict::Accepted(candidate) => Some(candidate),
            Verdict::Rejected { .. } => None,
        }
    }

    pub fn into_candidate(self) -> Option<InstallationCandidate> {
        match self {
            Verdict::Accepted(candidate) => Some(candidate),
            Verdict::Rejected { .. } => None,
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        Verdict::Rejected { reason }
    }
}

/// One evaluated link, kept for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct LinkEvaluation {
    pub source: String,
    pub link: Link,
    #[serde(flatten)]
    pub verdict: Verdict,
}

/// Single-link compatibility gate for one project.
#[derive(Debug, Clone)]
pub struct LinkEvaluator<'a> {
    project: String,
    formats: AllowedFormats,
    target: &'a TargetProfile,
    ignore_requires_python: bool,
    /// Yanked links are only accepted at this exact version.
    yank_pin: Option<Version>,
}

impl<'a> LinkEvaluator<'a> {
    pub fn new(policy: &EvaluationPolicy<'a>) -> Self {
        let yank_pin = if policy.allow_yanked {
            policy.specifier.pinned_version().cloned()
        } else {
            None
        };
        Self {
            project: policy.project.clone(),
            formats: policy.formats,
            target: policy.target,
            ignore_requires_python: policy.ignore_requires_python,
            yank_pin,
        }
    }

    /// An evaluator that never admits yanked links, whatever the policy.
    pub fn without_yanked(mut self) -> Self {
        self.yank_pin = None;
        self
    }

    fn check_requires_interpreter(&self, link: &Link) -> Result<(), RejectReason> {
        let Some(constraint) = link.requires_interpreter() else {
            return Ok(());
        };
        if self.ignore_requires_python {
            return Ok(());
        }
        let set = match constraint.parse::<SpecifierSet>() {
            Ok(set) => set,
            Err(e) => {
                debug!("Ignoring invalid requires-python '{}' on {}: {}", constraint, link, e);
                return Ok(());
            }
        };
        let version = self.target.interpreter_version();
        if set.contains(version, Some(true)) {
            Ok(())
        } else {
            Err(RejectReason::RequiresInterpreter {
                constraint: constraint.to_string(),
                version: version.clone(),
            })
        }
    }

    fn check(&self, link: &Link) -> Result<InstallationCandidate, RejectReason> {
        if link.egg_fragment().is_none() && link.is_macosx10_zip() {
            return Err(RejectReason::MacInstallerZip);
        }
        let archive =
            ArchiveName::for_link(link, &self.project).map_err(RejectReason::Unparsable)?;

        let name = canonicalize_name(&archive.project_name);
        if name != self.project {
            return Err(RejectReason::WrongProject(archive.project_name.clone()));
        }

        if archive.version.is_empty() {
            return Err(RejectReason::MissingVersion);
        }
        let version: Version = archive
            .version
            .parse()
            .map_err(|_| RejectReason::InvalidVersion(archive.version.clone()))?;

        if archive.format == Format::Binary {
            let tags = archive.tags();
            if self.target.supported_tags().best_position(&tags).is_none() {
                return Err(RejectReason::UnsupportedTags(
                    tags.iter().map(ToString::to_string).collect(),
                ));
            }
        }

        self.check_requires_interpreter(link)?;

        if !self.formats.contains(archive.format) {
            return Err(RejectReason::FormatNotAllowed(archive.format));
        }

        if link.is_yanked() && self.yank_pin.as_ref() != Some(&version) {
            return Err(RejectReason::Yanked(
                link.yank_reason().map(ToString::to_string),
            ));
        }

        Ok(InstallationCandidate::new(name, version, link.clone(), archive))
    }
}

impl Evaluator for LinkEvaluator<'_> {
    fn evaluate_link(&self, link: &Link) -> Verdict {
        match self.check(link) {
            Ok(candidate) => Verdict::Accepted(candidate),
            Err(reason) => {
                debug!("Skipping link {}: {}", link, reason);
                Verdict::rejected(reason)
            }
        }
    }
}
