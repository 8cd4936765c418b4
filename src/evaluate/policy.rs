use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::{Format, Hashes, canonicalize_name};
use crate::tags::TargetProfile;
use crate::version::SpecifierSet;

const ALL: &str = ":all:";
const NONE: &str = ":none:";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("the supported tag list is empty but binary distributions are allowed")]
    EmptySupportedTags,
}

/// Distribution formats a lookup may return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AllowedFormats {
    pub source: bool,
    pub binary: bool,
}

impl AllowedFormats {
    pub const BOTH: AllowedFormats = AllowedFormats {
        source: true,
        binary: true,
    };

    pub fn only(format: Format) -> Self {
        Self {
            source: format == Format::Source,
            binary: format == Format::Binary,
        }
    }

    pub fn contains(&self, format: Format) -> bool {
        match format {
            Format::Source => self.source,
            Format::Binary => self.binary,
        }
    }
}

impl fmt::Display for AllowedFormats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.binary, self.source) {
            (true, true) => write!(f, "binary, source"),
            (true, false) => write!(f, "binary"),
            (false, true) => write!(f, "source"),
            (false, false) => write!(f, "none"),
        }
    }
}

/// Per-project restrictions on binary and source distributions.
///
/// Entries are canonical project names or `:all:`. Naming a project in one
/// set removes it from the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatControl {
    no_binary: BTreeSet<String>,
    only_binary: BTreeSet<String>,
}

impl FormatControl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a comma-separated list of names to the no-binary set.
    pub fn add_no_binary(&mut self, value: &str) {
        Self::merge(value, &mut self.no_binary, &mut self.only_binary);
    }

    /// Add a comma-separated list of names to the only-binary set.
    pub fn add_only_binary(&mut self, value: &str) {
        Self::merge(value, &mut self.only_binary, &mut self.no_binary);
    }

    fn merge(value: &str, target: &mut BTreeSet<String>, other: &mut BTreeSet<String>) {
        let mut entries: Vec<&str> = value
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .collect();

        // `:all:` resets both sets; only a later `:none:` can continue the list.
        while let Some(index) = entries.iter().position(|e| *e == ALL) {
            other.clear();
            target.clear();
            target.insert(ALL.to_string());
            entries.drain(..=index);
            if !entries.contains(&NONE) {
                return;
            }
        }

        for entry in entries {
            if entry == NONE {
                target.clear();
                continue;
            }
            let name = canonicalize_name(entry);
            other.remove(&name);
            target.insert(name);
        }
    }

    pub fn allowed_formats(&self, project: &str) -> AllowedFormats {
        let name = canonicalize_name(project);
        if self.only_binary.contains(&name) {
            AllowedFormats::only(Format::Binary)
        } else if self.no_binary.contains(&name) {
            AllowedFormats::only(Format::Source)
        } else if self.only_binary.contains(ALL) {
            AllowedFormats::only(Format::Binary)
        } else if self.no_binary.contains(ALL) {
            AllowedFormats::only(Format::Source)
        } else {
            AllowedFormats::BOTH
        }
    }

    /// True when some project could still receive a binary distribution.
    pub fn binary_allowed_anywhere(&self) -> bool {
        !self.no_binary.contains(ALL) || !self.only_binary.is_empty()
    }
}

/// Options fixed for the lifetime of a finder.
#[derive(Debug, Clone, Default)]
pub struct FinderPolicy {
    pub allow_prereleases: bool,
    pub allow_yanked: bool,
    pub ignore_requires_python: bool,
    pub format_control: FormatControl,
    pub hashes: Hashes,
}

impl FinderPolicy {
    pub fn validate(&self, target: &TargetProfile) -> Result<(), PolicyError> {
        if target.supported_tags().is_empty() && self.format_control.binary_allowed_anywhere() {
            return Err(PolicyError::EmptySupportedTags);
        }
        Ok(())
    }

    /// Narrow the finder-wide options to one requirement.
    pub fn for_project<'a>(
        &'a self,
        project: &str,
        specifier: &'a SpecifierSet,
        target: &'a TargetProfile,
    ) -> EvaluationPolicy<'a> {
        EvaluationPolicy {
            project: canonicalize_name(project),
            specifier,
            allow_prereleases: self.allow_prereleases,
            formats: self.format_control.allowed_formats(project),
            target,
            allow_yanked: self.allow_yanked,
            ignore_requires_python: self.ignore_requires_python,
            hashes: &self.hashes,
        }
    }
}

/// Everything the evaluators need to judge links for one requirement.
#[derive(Debug, Clone)]
pub struct EvaluationPolicy<'a> {
    /// Canonical project name.
    pub project: String,
    pub specifier: &'a SpecifierSet,
    pub allow_prereleases: bool,
    pub formats: AllowedFormats,
    pub target: &'a TargetProfile,
    pub allow_yanked: bool,
    pub ignore_requires_python: bool,
    pub hashes: &'a Hashes,
}
