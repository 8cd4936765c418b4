use std::collections::HashMap;

use super::{LinkSource, SourceKind, SourceListing};
use crate::model::canonicalize_name;

/// Listings gathered ahead of time, keyed by canonical project name.
///
/// Projects that were never collected report every known location with no
/// links, so a miss still names the sources that would have been consulted.
#[derive(Debug, Clone, Default)]
pub struct LinkSnapshot {
    locations: Vec<(String, SourceKind)>,
    projects: HashMap<String, Vec<SourceListing>>,
}

impl LinkSnapshot {
    pub fn new(locations: Vec<(String, SourceKind)>) -> Self {
        Self {
            locations,
            projects: HashMap::new(),
        }
    }

    pub fn insert(&mut self, project: &str, listings: Vec<SourceListing>) {
        self.projects.insert(canonicalize_name(project), listings);
    }

    pub fn with_listings(mut self, project: &str, listings: Vec<SourceListing>) -> Self {
        self.insert(project, listings);
        self
    }
}

impl LinkSource for LinkSnapshot {
    fn listings(&self, project: &str) -> Vec<SourceListing> {
        match self.projects.get(&canonicalize_name(project)) {
            Some(listings) => listings.clone(),
            None => self
                .locations
                .iter()
                .map(|(location, kind)| SourceListing::new(location.clone(), *kind, Vec::new()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Link;

    #[test]
    fn test_lookup_is_name_normalized() {
        let link = Link::parse("https://example.com/zope.interface-5.0.tar.gz").unwrap();
        let snapshot = LinkSnapshot::default().with_listings(
            "Zope_Interface",
            vec![SourceListing::new(
                "https://example.com/simple/zope-interface/",
                SourceKind::Index,
                vec![link.clone()],
            )],
        );

        let listings = snapshot.listings("zope.interface");
        assert_eq!(listings.len(), 1);
        assert_eq!(listings[0].links, vec![link]);
        assert_eq!(snapshot.listings("ZOPE-interface"), listings);
    }

    #[test]
    fn test_unknown_project_reports_locations() {
        let snapshot = LinkSnapshot::new(vec![
            ("/srv/wheels".to_string(), SourceKind::FindLinks),
            ("https://pypi.org/simple".to_string(), SourceKind::Index),
        ]);

        let listings = snapshot.listings("absent");
        assert_eq!(listings.len(), 2);
        assert!(listings.iter().all(|l| l.links.is_empty()));
        assert_eq!(listings[1].kind, SourceKind::Index);
    }
}
