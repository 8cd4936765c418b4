use std::cmp::{Ordering, Reverse};

use super::{Comparator, EvaluationPolicy};
use crate::model::{BuildTag, Format, Hashes, InstallationCandidate};
use crate::tags::TagList;
use crate::version::{SpecifierSet, Version};

/// Ranking key for a candidate. Larger is better; fields compare in
/// declaration order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SortKey {
    pub not_yanked: bool,
    pub hash_allowed: bool,
    pub scheme_priority: u8,
    pub format: Format,
    pub version: Version,
    pub build_tag: Option<BuildTag>,
    /// Position in the supported-tag list; source archives sit past the end.
    pub tag_rank: Reverse<usize>,
    /// Real archives rank above `#egg=` links that otherwise tie.
    pub not_egg: bool,
    pub url: Reverse<String>,
}

/// Version filtering and ranking of accepted candidates.
#[derive(Debug, Clone)]
pub struct CandidateEvaluator<'a> {
    specifier: &'a SpecifierSet,
    allow_prereleases: bool,
    supported_tags: &'a TagList,
    hashes: &'a Hashes,
}

impl<'a> CandidateEvaluator<'a> {
    pub fn new(policy: &EvaluationPolicy<'a>) -> Self {
        Self {
            specifier: policy.specifier,
            allow_prereleases: policy.allow_prereleases,
            supported_tags: policy.target.supported_tags(),
            hashes: policy.hashes,
        }
    }

    /// Keep candidates the specifier admits, then apply the hash policy.
    ///
    /// Pre-releases pass only when allowed explicitly or when a clause names
    /// one. Under an active hash policy with at least one allowed digest,
    /// candidates whose digest is known but not allowed are dropped.
    pub fn filter(&self, candidates: Vec<InstallationCandidate>) -> Vec<InstallationCandidate> {
        let prereleases = self.allow_prereleases.then_some(true);
        let applicable: Vec<InstallationCandidate> = candidates
            .into_iter()
            .filter(|c| self.specifier.contains(c.version(), prereleases))
            .collect();

        if !self.hashes.is_active() {
            return applicable;
        }
        let any_allowed = applicable
            .iter()
            .any(|c| c.link().is_hash_allowed(self.hashes));
        if !any_allowed {
            return applicable;
        }
        applicable
            .into_iter()
            .filter(|c| c.link().digest().is_none() || c.link().is_hash_allowed(self.hashes))
            .collect()
    }

    pub fn sort_key(&self, candidate: &InstallationCandidate) -> SortKey {
        let link = candidate.link();
        let tag_rank = match candidate.format() {
            Format::Binary => self
                .supported_tags
                .best_position(&candidate.tags())
                .unwrap_or(usize::MAX),
            Format::Source => usize::MAX,
        };
        SortKey {
            not_yanked: !link.is_yanked(),
            hash_allowed: self.hashes.is_active() && link.is_hash_allowed(self.hashes),
            scheme_priority: link.scheme().priority(),
            format: candidate.format(),
            version: candidate.version().clone(),
            build_tag: candidate.archive().build_tag.clone(),
            tag_rank: Reverse(tag_rank),
            not_egg: link.egg_fragment().is_none(),
            url: Reverse(link.url().to_string()),
        }
    }
}

impl Comparator for CandidateEvaluator<'_> {
    fn compare(&self, a: &InstallationCandidate, b: &InstallationCandidate) -> Ordering {
        self.sort_key(a).cmp(&self.sort_key(b))
    }

    /// Keys are computed once per candidate.
    fn sort_best_first(&self, candidates: &mut [InstallationCandidate]) {
        candidates.sort_by_cached_key(|c| Reverse(self.sort_key(c)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{Evaluator, FinderPolicy, LinkEvaluator};
    use crate::model::Link;
    use crate::tags::{Tag, TargetProfile};
    use proptest::prelude::*;

    fn target() -> TargetProfile {
        TargetProfile::new(
            Version::from_release([3, 8]),
            TagList::new(vec![
                Tag::new("cp38", "cp38", "manylinux1_x86_64"),
                Tag::new("py3", "none", "manylinux1_x86_64"),
                Tag::new("py3", "none", "any"),
            ]),
        )
    }

    struct Fixture {
        policy: FinderPolicy,
        specifier: SpecifierSet,
        target: TargetProfile,
    }

    impl Fixture {
        fn new(policy: FinderPolicy, specifier: &str) -> Self {
            Self {
                policy,
                specifier: specifier.parse().unwrap(),
                target: target(),
            }
        }

        fn candidates(&self, urls: &[&str]) -> Vec<InstallationCandidate> {
            let eval_policy = self.policy.for_project("simple", &self.specifier, &self.target);
            let evaluator = LinkEvaluator::new(&eval_policy);
            urls.iter()
                .map(|u| {
                    evaluator
                        .evaluate_link(&Link::parse(u).unwrap())
                        .into_candidate()
                        .unwrap()
                })
                .collect()
        }

        fn best(&self, urls: &[&str]) -> Option<String> {
            let eval_policy = self.policy.for_project("simple", &self.specifier, &self.target);
            let evaluator = CandidateEvaluator::new(&eval_policy);
            let filtered = evaluator.filter(self.candidates(urls));
            evaluator.best(&filtered).map(|c| c.link().url().to_string())
        }
    }

    const HOST: &str = "https://example.com/simple";

    fn url(filename: &str) -> String {
        format!("{}/{}", HOST, filename)
    }

    #[test]
    fn test_wheel_beats_sdist_of_same_version() {
        let fixture = Fixture::new(FinderPolicy::default(), "");
        let wheel = url("simple-1.0-py3-none-any.whl");
        let sdist = url("simple-1.0.tar.gz");
        assert_eq!(fixture.best(&[&sdist, &wheel]), Some(wheel.clone()));
        assert_eq!(fixture.best(&[&wheel, &sdist]), Some(wheel));
    }

    #[test]
    fn test_prereleases_need_opt_in() {
        let stable = url("simple-1.0.tar.gz");
        let beta = url("simple-2.0b1.tar.gz");

        let default = Fixture::new(FinderPolicy::default(), "");
        assert_eq!(default.best(&[&stable, &beta]), Some(stable.clone()));

        let allowing = Fixture::new(
            FinderPolicy {
                allow_prereleases: true,
                ..Default::default()
            },
            "",
        );
        assert_eq!(allowing.best(&[&stable, &beta]), Some(beta.clone()));

        let demanded = Fixture::new(FinderPolicy::default(), ">=0.0.dev0");
        assert_eq!(demanded.best(&[&stable, &beta]), Some(beta));
    }

    #[test]
    fn test_only_prereleases_yield_nothing() {
        let fixture = Fixture::new(FinderPolicy::default(), "");
        assert_eq!(fixture.best(&[&url("simple-2.0b1.tar.gz")]), None);
    }

    #[test]
    fn test_local_file_beats_remote() {
        let fixture = Fixture::new(FinderPolicy::default(), "");
        let local = "file:///srv/wheels/simple-1.0.tar.gz".to_string();
        let remote = url("simple-1.0.tar.gz");
        assert_eq!(fixture.best(&[&remote, &local]), Some(local));
    }

    #[test]
    fn test_build_tag_wins() {
        let fixture = Fixture::new(FinderPolicy::default(), "");
        let built = url("simple-2.0-1-py3-none-any.whl");
        let plain = url("simple-2.0-py3-none-any.whl");
        assert_eq!(fixture.best(&[&plain, &built]), Some(built));
    }

    #[test]
    fn test_more_specific_tag_wins() {
        let fixture = Fixture::new(FinderPolicy::default(), "");
        let specific = url("simple-1.0-cp38-cp38-manylinux1_x86_64.whl");
        let generic = url("simple-1.0-py3-none-any.whl");
        assert_eq!(fixture.best(&[&generic, &specific]), Some(specific));
    }

    #[test]
    fn test_newer_version_wins_within_format() {
        let fixture = Fixture::new(FinderPolicy::default(), "<3");
        let old = url("simple-1.0-py3-none-any.whl");
        let new = url("simple-2.0-py3-none-any.whl");
        let excluded = url("simple-3.0-py3-none-any.whl");
        assert_eq!(fixture.best(&[&old, &new, &excluded]), Some(new));
    }

    #[test]
    fn test_hash_policy() {
        let allowed = format!("{}#sha256=aaaa", url("simple-1.0.tar.gz"));
        let wrong = format!("{}#sha256=bbbb", url("simple-2.0.tar.gz"));
        let unknown = url("simple-1.5.tar.gz");

        let fixture = Fixture::new(
            FinderPolicy {
                hashes: "sha256:aaaa".parse().unwrap(),
                ..Default::default()
            },
            "",
        );
        let eval_policy = fixture
            .policy
            .for_project("simple", &fixture.specifier, &fixture.target);
        let evaluator = CandidateEvaluator::new(&eval_policy);
        let mut kept = evaluator.filter(fixture.candidates(&[&allowed, &wrong, &unknown]));
        evaluator.sort_best_first(&mut kept);

        let urls: Vec<&str> = kept.iter().map(|c| c.link().url()).collect();
        assert_eq!(urls, vec![allowed.as_str(), unknown.as_str()]);
    }

    #[test]
    fn test_hash_filter_keeps_all_without_match() {
        let fixture = Fixture::new(
            FinderPolicy {
                hashes: "sha256:cccc".parse().unwrap(),
                ..Default::default()
            },
            "",
        );
        let wrong = format!("{}#sha256=bbbb", url("simple-2.0.tar.gz"));
        assert_eq!(fixture.best(&[&wrong]), Some(wrong.clone()));
    }

    #[test]
    fn test_url_breaks_ties() {
        let fixture = Fixture::new(FinderPolicy::default(), "");
        let a = "https://a.example.com/simple-1.0.tar.gz".to_string();
        let b = "https://b.example.com/simple-1.0.tar.gz".to_string();
        assert_eq!(fixture.best(&[&b, &a]), Some(a.clone()));
        assert_eq!(fixture.best(&[&a, &b]), Some(a));
    }

    #[test]
    fn test_archive_beats_egg_fragment_of_same_version() {
        let fixture = Fixture::new(FinderPolicy::default(), "");
        // The egg link's URL sorts first, so only the egg component decides.
        let egg = "https://a.example.com/simple.py#egg=simple-1.0".to_string();
        let archive = "https://b.example.com/simple-1.0.tar.gz".to_string();
        assert_eq!(fixture.best(&[&egg, &archive]), Some(archive.clone()));
        assert_eq!(fixture.best(&[&archive, &egg]), Some(archive));
    }

    fn pool() -> Vec<String> {
        vec![
            url("simple-1.0.tar.gz"),
            url("simple-1.0-py3-none-any.whl"),
            url("simple-1.0-cp38-cp38-manylinux1_x86_64.whl"),
            url("simple-2.0-1-py3-none-any.whl"),
            url("simple-2.0-py3-none-any.whl"),
            url("simple-2.0.zip"),
            "file:///srv/simple-1.0.tar.gz".to_string(),
            "https://mirror.example.com/simple-1.0.tar.gz".to_string(),
        ]
    }

    /// Links that tie on everything up to the yank, hash and egg components.
    fn pinned_pool() -> Vec<Link> {
        vec![
            Link::parse(&format!("{}#sha256=aaaa", url("simple-1.0.tar.gz"))).unwrap(),
            Link::parse(&format!("{}#sha256=bbbb", url("simple-1.0.zip"))).unwrap(),
            Link::parse(&url("simple-1.0.tar.bz2"))
                .unwrap()
                .with_yank(Some("broken".into())),
            Link::parse(&format!("{}#sha256=aaaa", url("simple-1.0-py3-none-any.whl")))
                .unwrap()
                .with_yank(None),
            Link::parse(&url("simple-1.0-py3-none-any.whl")).unwrap(),
            Link::parse("https://mirror.example.com/simple.py#egg=simple-1.0").unwrap(),
            Link::parse("https://mirror.example.com/simple-1.0.tar.gz#sha256=aaaa").unwrap(),
            Link::parse(&url("simple-2.0.tar.gz")).unwrap(),
        ]
    }

    fn ranked(fixture: &Fixture, links: &[Link]) -> Vec<InstallationCandidate> {
        let eval_policy = fixture.policy.for_project("simple", &fixture.specifier, &fixture.target);
        let link_evaluator = LinkEvaluator::new(&eval_policy);
        let evaluator = CandidateEvaluator::new(&eval_policy);
        let candidates = links
            .iter()
            .filter_map(|l| link_evaluator.evaluate_link(l).into_candidate())
            .collect();
        let mut kept = evaluator.filter(candidates);
        evaluator.sort_best_first(&mut kept);
        kept
    }

    #[test]
    fn test_pinned_pool_ranking() {
        let fixture = Fixture::new(
            FinderPolicy {
                allow_yanked: true,
                hashes: "sha256:aaaa".parse().unwrap(),
                ..Default::default()
            },
            "==1.0",
        );
        let ranked = ranked(&fixture, &pinned_pool());
        let urls: Vec<&str> = ranked.iter().map(|c| c.link().url()).collect();
        assert_eq!(
            urls,
            vec![
                format!("{}#sha256=aaaa", url("simple-1.0.tar.gz")),
                "https://mirror.example.com/simple-1.0.tar.gz#sha256=aaaa".to_string(),
                url("simple-1.0-py3-none-any.whl"),
                "https://mirror.example.com/simple.py#egg=simple-1.0".to_string(),
                format!("{}#sha256=aaaa", url("simple-1.0-py3-none-any.whl")),
                url("simple-1.0.tar.bz2"),
            ]
        );
    }

    proptest! {
        #[test]
        fn prop_sort_is_permutation_invariant(order in Just(pool()).prop_shuffle()) {
            let fixture = Fixture::new(FinderPolicy::default(), "");
            let eval_policy = fixture.policy.for_project("simple", &fixture.specifier, &fixture.target);
            let evaluator = CandidateEvaluator::new(&eval_policy);

            let owned = pool();
            let reference_urls: Vec<&str> = owned.iter().map(String::as_str).collect();
            let mut reference = fixture.candidates(&reference_urls);
            evaluator.sort_best_first(&mut reference);

            let shuffled_urls: Vec<&str> = order.iter().map(String::as_str).collect();
            let mut shuffled = fixture.candidates(&shuffled_urls);
            evaluator.sort_best_first(&mut shuffled);

            let mut reversed = fixture.candidates(&shuffled_urls);
            reversed.reverse();
            evaluator.sort_best_first(&mut reversed);

            prop_assert_eq!(&reference, &shuffled);
            prop_assert_eq!(&reference, &reversed);
        }

        #[test]
        fn prop_pinned_sort_is_permutation_invariant(order in Just(pinned_pool()).prop_shuffle()) {
            let fixture = Fixture::new(
                FinderPolicy {
                    allow_yanked: true,
                    hashes: "sha256:aaaa".parse().unwrap(),
                    ..Default::default()
                },
                "==1.0",
            );
            let reference = ranked(&fixture, &pinned_pool());
            let shuffled = ranked(&fixture, &order);

            prop_assert_eq!(reference.len(), 6);
            prop_assert_eq!(&reference, &shuffled);
        }
    }
}
