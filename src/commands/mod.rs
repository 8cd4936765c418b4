//! Command implementations behind the `pkgfinder` binary.
//!
//! Each command collects links for the projects it needs, builds a
//! [`PackageFinder`] over the resulting snapshot and prints the answer.

use anyhow::{Context, Result, bail};

use crate::{
    collect::{LinkCollector, MemoryPageStore, PageFetcher},
    evaluate::{FinderPolicy, FormatControl},
    finder::PackageFinder,
    model::Hashes,
    runtime::Runtime,
    source::LinkSnapshot,
    tags::TargetProfile,
};

pub mod config;
mod find;
mod list;
mod tags;

pub use find::{find, render_report};
pub use list::list;
pub use tags::tags;

/// Interpreter assumed when none is given.
pub const DEFAULT_PYTHON: &str = "3.12";
pub const DEFAULT_IMPLEMENTATION: &str = "cp";

/// Target interpreter and finder-wide policy, as given on the command line.
#[derive(Debug, Clone)]
pub struct FinderOptions {
    pub python_version: String,
    pub implementation: String,
    pub allow_prereleases: bool,
    pub allow_yanked: bool,
    pub ignore_requires_python: bool,
    pub no_binary: Vec<String>,
    pub only_binary: Vec<String>,
    pub hashes: Vec<String>,
}

impl Default for FinderOptions {
    fn default() -> Self {
        Self {
            python_version: DEFAULT_PYTHON.to_string(),
            implementation: DEFAULT_IMPLEMENTATION.to_string(),
            allow_prereleases: false,
            allow_yanked: false,
            ignore_requires_python: false,
            no_binary: Vec::new(),
            only_binary: Vec::new(),
            hashes: Vec::new(),
        }
    }
}

impl FinderOptions {
    pub fn target(&self) -> Result<TargetProfile> {
        let (major, minor) = parse_python_version(&self.python_version)?;
        Ok(TargetProfile::detect(
            &self.implementation.to_ascii_lowercase(),
            major,
            minor,
        ))
    }

    pub fn policy(&self) -> Result<FinderPolicy> {
        let mut format_control = FormatControl::new();
        for value in &self.no_binary {
            format_control.add_no_binary(value);
        }
        for value in &self.only_binary {
            format_control.add_only_binary(value);
        }

        let hashes: Hashes = self
            .hashes
            .join(",")
            .parse()
            .context("Invalid --hash value")?;

        Ok(FinderPolicy {
            allow_prereleases: self.allow_prereleases,
            allow_yanked: self.allow_yanked,
            ignore_requires_python: self.ignore_requires_python,
            format_control,
            hashes,
        })
    }
}

/// Accepts `3.12` or the compact `312` form.
pub fn parse_python_version(value: &str) -> Result<(u64, u64)> {
    let value = value.trim();
    let (major, minor) = match value.split_once('.') {
        Some(parts) => parts,
        None if value.len() >= 2 && value.is_ascii() => value.split_at(1),
        None => bail!("Invalid Python version '{}'. Expected e.g. '3.12'.", value),
    };
    let major = major
        .parse()
        .with_context(|| format!("Invalid Python major version in '{}'", value))?;
    let minor = minor
        .parse()
        .with_context(|| format!("Invalid Python minor version in '{}'", value))?;
    Ok((major, minor))
}

/// Collect links for `projects` and build a finder over them.
pub(crate) async fn prepare_finder<R: Runtime, F: PageFetcher>(
    collector: &LinkCollector<R, F>,
    projects: &[String],
    options: &FinderOptions,
) -> Result<PackageFinder<LinkSnapshot>> {
    let target = options.target()?;
    let policy = options.policy()?;
    let store = MemoryPageStore::new();
    let snapshot = collector.snapshot(projects, &store).await;
    Ok(PackageFinder::new(snapshot, target, policy)?)
}
