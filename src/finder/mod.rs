//! The package finder: discovery and best-candidate selection.
//!
//! A finder owns a [`LinkSource`], the target profile and the finder-wide
//! policy. Each call builds fresh evaluators from those, so calls share no
//! state and the same inputs always give the same answer.

mod outcome;

use log::{debug, info};
use std::collections::HashSet;

use crate::evaluate::{
    CandidateEvaluator, Comparator, EvaluationPolicy, Evaluator, FinderPolicy, LinkEvaluation,
    LinkEvaluator, PolicyError, RejectReason, Verdict,
};
use crate::model::{
    ArchiveName, InstallationCandidate, Link, Requirement, canonicalize_name,
};
use crate::source::{LinkSource, prioritize};
use crate::tags::TargetProfile;
use crate::version::{SpecifierSet, Version};

pub use outcome::{FindReport, NotFoundReason, Outcome};

/// Source location recorded for a requirement's own direct link.
const DIRECT_SOURCE: &str = "direct";

/// Links evaluated for one project, with the deduplicated accepted ones.
struct Collected {
    evaluations: Vec<LinkEvaluation>,
    candidates: Vec<InstallationCandidate>,
    consulted: Vec<String>,
}

pub struct PackageFinder<S> {
    source: S,
    target: TargetProfile,
    policy: FinderPolicy,
}

impl<S: LinkSource> PackageFinder<S> {
    pub fn new(source: S, target: TargetProfile, policy: FinderPolicy) -> Result<Self, PolicyError> {
        policy.validate(&target)?;
        Ok(Self {
            source,
            target,
            policy,
        })
    }

    pub fn target(&self) -> &TargetProfile {
        &self.target
    }

    pub fn policy(&self) -> &FinderPolicy {
        &self.policy
    }

    /// Every usable candidate for `project`: find-links first, then indexes,
    /// each in declaration order, with duplicate (version, url) pairs removed.
    /// No version is pinned here, so yanked links never appear.
    #[tracing::instrument(skip(self))]
    pub fn find_all_candidates(&self, project: &str) -> Vec<InstallationCandidate> {
        let specifier = SpecifierSet::default();
        let policy = self.policy.for_project(project, &specifier, &self.target);
        let evaluator = LinkEvaluator::new(&policy).without_yanked();
        self.collect(project, &evaluator).candidates
    }

    /// The best candidate for `requirement`, or why there is none.
    pub fn find_best_candidate(
        &self,
        requirement: &Requirement,
        installed: Option<&Version>,
    ) -> Outcome {
        self.explain_best_candidate(requirement, installed).outcome
    }

    /// Like [`find_best_candidate`](Self::find_best_candidate), also returning
    /// every evaluated link and the ranked applicable candidates.
    #[tracing::instrument(skip(self, requirement), fields(requirement = %requirement))]
    pub fn explain_best_candidate(
        &self,
        requirement: &Requirement,
        installed: Option<&Version>,
    ) -> FindReport {
        if let Some(link) = &requirement.link {
            return self.explain_direct(requirement, link);
        }

        let project = requirement.canonical_name();
        let policy = self
            .policy
            .for_project(&project, &requirement.specifier, &self.target);
        let collected = self.collect(&project, &LinkEvaluator::new(&policy));

        let ranker = CandidateEvaluator::new(&policy);
        let mut applicable = ranker.filter(collected.candidates.clone());
        ranker.sort_best_first(&mut applicable);
        debug!(
            "{} of {} candidates for {} match '{}'",
            applicable.len(),
            collected.candidates.len(),
            project,
            requirement.specifier
        );

        let outcome = match applicable.first() {
            None => Self::not_found(&project, &policy, &collected),
            Some(best) => match installed {
                // An installed version matches any candidate on every
                // component but the version, so only a newer version wins.
                Some(installed)
                    if requirement.specifier.contains(installed, Some(true))
                        && !applicable.iter().any(|c| c.version() > installed) =>
                {
                    info!(
                        "Installed {} {} is not older than any candidate",
                        project, installed
                    );
                    Outcome::AlreadySatisfied {
                        installed: installed.clone(),
                        best_available: best.version().clone(),
                    }
                }
                _ => {
                    info!("Selected {}", best);
                    Outcome::Found {
                        candidate: best.clone(),
                    }
                }
            },
        };

        FindReport {
            requirement: requirement.to_string(),
            outcome,
            evaluations: collected.evaluations,
            applicable,
        }
    }

    fn collect<E: Evaluator>(&self, project: &str, evaluator: &E) -> Collected {
        let listings = prioritize(self.source.listings(project));

        let mut seen = HashSet::new();
        let mut collected = Collected {
            evaluations: Vec::new(),
            candidates: Vec::new(),
            consulted: Vec::with_capacity(listings.len()),
        };

        for mut listing in listings {
            // Real archives before `#egg=` links, each group in page order.
            listing.links.sort_by_key(|link| link.egg_fragment().is_some());
            debug!(
                "Evaluating {} links from {} ({})",
                listing.links.len(),
                listing.location,
                listing.kind
            );
            for link in listing.links {
                let verdict = evaluator.evaluate_link(&link);
                if let Some(candidate) = verdict.candidate() {
                    let key = (candidate.version().clone(), candidate.link().url().to_string());
                    if seen.insert(key) {
                        collected.candidates.push(candidate.clone());
                    }
                }
                collected.evaluations.push(LinkEvaluation {
                    source: listing.location.clone(),
                    link,
                    verdict,
                });
            }
            collected.consulted.push(listing.location);
        }
        collected
    }

    fn not_found(project: &str, policy: &EvaluationPolicy<'_>, collected: &Collected) -> Outcome {
        let mut versions_seen: Vec<Version> = collected
            .candidates
            .iter()
            .map(|c| c.version().clone())
            .collect();
        versions_seen.sort();
        versions_seen.dedup();

        let reason = if collected.evaluations.is_empty() {
            NotFoundReason::NoLinks
        } else if collected.candidates.is_empty() {
            NotFoundReason::NoCompatibleLinks
        } else {
            NotFoundReason::NoMatchingVersion(policy.specifier.to_string())
        };
        info!("No candidate for {}: {}", project, reason);

        Outcome::NotFound {
            project: project.to_string(),
            reason,
            consulted_sources: collected.consulted.clone(),
            versions_seen,
        }
    }

    /// A direct link bypasses discovery; only its name and version are
    /// checked.
    fn explain_direct(&self, requirement: &Requirement, link: &Link) -> FindReport {
        let project = requirement.canonical_name();
        let verdict = match direct_candidate(&project, link) {
            Ok(candidate) => Verdict::Accepted(candidate),
            Err(reason) => Verdict::Rejected { reason },
        };

        let outcome = match &verdict {
            Verdict::Accepted(candidate) => {
                info!("Using direct link {}", candidate);
                Outcome::Found {
                    candidate: candidate.clone(),
                }
            }
            Verdict::Rejected { reason } => Outcome::NotFound {
                project: project.clone(),
                reason: NotFoundReason::DirectLink(reason.clone()),
                consulted_sources: Vec::new(),
                versions_seen: Vec::new(),
            },
        };

        FindReport {
            requirement: requirement.to_string(),
            outcome,
            applicable: verdict.candidate().cloned().into_iter().collect(),
            evaluations: vec![LinkEvaluation {
                source: DIRECT_SOURCE.to_string(),
                link: link.clone(),
                verdict,
            }],
        }
    }
}

fn direct_candidate(project: &str, link: &Link) -> Result<InstallationCandidate, RejectReason> {
    let archive = ArchiveName::for_link(link, project).map_err(RejectReason::Unparsable)?;
    if canonicalize_name(&archive.project_name) != project {
        return Err(RejectReason::WrongProject(archive.project_name.clone()));
    }
    if archive.version.is_empty() {
        return Err(RejectReason::MissingVersion);
    }
    let version = archive
        .version
        .parse()
        .map_err(|_| RejectReason::InvalidVersion(archive.version.clone()))?;
    Ok(InstallationCandidate::new(
        project.to_string(),
        version,
        link.clone(),
        archive,
    ))
}
