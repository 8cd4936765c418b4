use anyhow::{Context, Result, bail};
use log::debug;
use std::fmt::Write as _;

use crate::{
    collect::{LinkCollector, PageFetcher, SearchScope},
    evaluate::Verdict,
    finder::{FindReport, Outcome},
    model::Requirement,
    runtime::Runtime,
    version::Version,
};

use super::{FinderOptions, config::Config, prepare_finder};

/// Find the best candidate for a requirement and print it.
///
/// Fails after printing when nothing matches, so scripts can rely on the
/// exit status.
#[tracing::instrument(skip(runtime, scope, options))]
pub async fn find<R: Runtime + 'static>(
    runtime: R,
    scope: SearchScope,
    requirement: &str,
    installed: Option<&str>,
    options: &FinderOptions,
    json: bool,
    explain: bool,
) -> Result<()> {
    let config = Config::new(runtime, scope)?;
    let report = run(&config.collector, requirement, installed, options).await?;
    println!("{}", render_report(&report, json, explain)?);

    if let Outcome::NotFound { .. } = report.outcome {
        bail!("No matching distribution found for {}", report.requirement);
    }
    Ok(())
}

pub(crate) async fn run<R: Runtime, F: PageFetcher>(
    collector: &LinkCollector<R, F>,
    requirement: &str,
    installed: Option<&str>,
    options: &FinderOptions,
) -> Result<FindReport> {
    let requirement: Requirement = requirement.parse()?;
    let installed = installed
        .map(str::parse::<Version>)
        .transpose()
        .context("Invalid installed version")?;

    // A direct reference never consults the configured locations.
    let projects = match requirement.link {
        Some(_) => Vec::new(),
        None => vec![requirement.canonical_name()],
    };
    debug!("Looking up {} in {} project(s)", requirement, projects.len());

    let finder = prepare_finder(collector, &projects, options).await?;
    Ok(finder.explain_best_candidate(&requirement, installed.as_ref()))
}

/// Render a report as JSON, or as a one-line answer optionally followed by
/// every evaluated link.
pub fn render_report(report: &FindReport, json: bool, explain: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }

    let mut out = match &report.outcome {
        Outcome::Found { candidate } => format!(
            "{} {} {}",
            candidate.name(),
            candidate.version(),
            candidate.link().url()
        ),
        other => other.to_string(),
    };

    if explain {
        write!(out, "\n\nEvaluated links:")?;
        for evaluation in &report.evaluations {
            match &evaluation.verdict {
                Verdict::Accepted(candidate) => {
                    write!(
                        out,
                        "\n  + {} ({}, from {})",
                        evaluation.link.url(),
                        candidate.version(),
                        evaluation.source
                    )?;
                }
                Verdict::Rejected { reason } => {
                    write!(
                        out,
                        "\n  - {}: {} (from {})",
                        evaluation.link.url(),
                        reason,
                        evaluation.source
                    )?;
                }
            }
        }
        write!(out, "\n\nApplicable candidates, best first:")?;
        for candidate in &report.applicable {
            write!(out, "\n  {}", candidate)?;
        }
    }
    Ok(out)
}
