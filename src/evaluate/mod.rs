//! Link verdicts and candidate ordering.
//!
//! `LinkEvaluator` decides whether a single link is usable for a project;
//! `CandidateEvaluator` filters the accepted candidates by version policy and
//! ranks them. Both are built per lookup from an [`EvaluationPolicy`].

mod candidate;
mod link;
mod policy;

use std::cmp::Ordering;

use crate::model::{InstallationCandidate, Link};

pub use candidate::{CandidateEvaluator, SortKey};
pub use link::{LinkEvaluation, LinkEvaluator, RejectReason, Verdict};
pub use policy::{AllowedFormats, EvaluationPolicy, FinderPolicy, FormatControl, PolicyError};

/// Accept or reject one link.
pub trait Evaluator {
    fn evaluate_link(&self, link: &Link) -> Verdict;
}

/// Total order over candidates. `Ordering::Greater` means "better".
pub trait Comparator {
    fn compare(&self, a: &InstallationCandidate, b: &InstallationCandidate) -> Ordering;

    fn sort_best_first(&self, candidates: &mut [InstallationCandidate]) {
        candidates.sort_by(|a, b| self.compare(b, a));
    }

    fn best<'c>(&self, candidates: &'c [InstallationCandidate]) -> Option<&'c InstallationCandidate> {
        candidates.iter().max_by(|a, b| self.compare(a, b))
    }
}
