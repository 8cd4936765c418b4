//! Link collection: turning find-links locations and index URLs into
//! listings the finder can evaluate.
//!
//! Everything that touches the network or the filesystem lives here. The
//! result is a [`LinkSnapshot`] that is complete before evaluation starts.
//!
//! # Structure
//!
//! - `fetcher` - Page retrieval over HTTP
//! - `html` - Anchor extraction from listing pages
//! - `store` - Owned cache of retrieved pages

mod fetcher;
pub mod html;
mod store;

use futures_util::future::{join, join_all};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use url::Url;

use crate::http::NonRetryableError;
use crate::model::{ArchiveName, Link, canonicalize_name};
use crate::runtime::Runtime;
use crate::source::{LinkSnapshot, SourceKind, SourceListing};

pub use fetcher::{HttpPageFetcher, IndexPage, PageFetcher};
pub use store::{MemoryPageStore, PageStore};

#[cfg(test)]
pub use fetcher::MockPageFetcher;

/// Where to look for links: find-links locations, then index base URLs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchScope {
    pub find_links: Vec<String>,
    pub index_urls: Vec<String>,
}

impl SearchScope {
    pub fn new(find_links: Vec<String>, index_urls: Vec<String>) -> Self {
        Self {
            find_links,
            index_urls,
        }
    }

    /// The project page under each index, e.g. `<index>/zope-interface/`.
    pub fn index_page_urls(&self, project: &str) -> Vec<String> {
        let name = canonicalize_name(project);
        self.index_urls
            .iter()
            .map(|base| format!("{}/{}/", base.trim_end_matches('/'), name))
            .collect()
    }

    pub fn locations(&self) -> Vec<(String, SourceKind)> {
        self.find_links
            .iter()
            .map(|l| (l.clone(), SourceKind::FindLinks))
            .chain(self.index_urls.iter().map(|u| (u.clone(), SourceKind::Index)))
            .collect()
    }
}

fn is_not_found(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<NonRetryableError>(),
            Some(NonRetryableError::NotFound(_))
        )
    })
}

fn is_html_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"))
}

pub struct LinkCollector<R: Runtime, F: PageFetcher> {
    runtime: R,
    fetcher: F,
    scope: SearchScope,
}

impl<R: Runtime, F: PageFetcher> LinkCollector<R, F> {
    pub fn new(runtime: R, fetcher: F, scope: SearchScope) -> Self {
        Self {
            runtime,
            fetcher,
            scope,
        }
    }

    pub fn scope(&self) -> &SearchScope {
        &self.scope
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// One listing per find-links location and per index, in declaration
    /// order. Unreachable locations produce a listing with `failure` set.
    #[tracing::instrument(skip(self, store))]
    pub async fn collect_links(&self, project: &str, store: &dyn PageStore) -> Vec<SourceListing> {
        let index_urls = self.scope.index_page_urls(project);

        let find_links = join_all(
            self.scope
                .find_links
                .iter()
                .map(|location| self.collect_find_links(location, store)),
        );
        let indexes = join_all(
            index_urls
                .iter()
                .map(|url| self.collect_page(url, SourceKind::Index, store)),
        );

        let (mut listings, index_listings) = join(find_links, indexes).await;
        listings.extend(index_listings);
        debug!(
            "Collected {} links for {} from {} locations",
            listings.iter().map(|l| l.links.len()).sum::<usize>(),
            project,
            listings.len()
        );
        listings
    }

    /// Collect every project up front into a snapshot the finder can query.
    pub async fn snapshot(&self, projects: &[String], store: &dyn PageStore) -> LinkSnapshot {
        let mut snapshot = LinkSnapshot::new(self.scope.locations());
        for project in projects {
            let listings = self.collect_links(project, store).await;
            snapshot.insert(project, listings);
        }
        snapshot
    }

    async fn collect_find_links(&self, location: &str, store: &dyn PageStore) -> SourceListing {
        let kind = SourceKind::FindLinks;

        if location.contains("://") {
            let url = match Url::parse(location) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Ignoring invalid find-links URL {}: {}", location, e);
                    return SourceListing::failed(location, kind, e.to_string());
                }
            };
            if url.scheme() == "file" {
                return match url.to_file_path() {
                    Ok(path) => self.collect_local(location, &path),
                    Err(()) => SourceListing::failed(location, kind, "not a local path"),
                };
            }
            // A URL to an archive is itself the only link.
            let link = Link::from_url(&url);
            if ArchiveName::parse(link.filename()).is_ok() {
                return SourceListing::new(location, kind, vec![link]);
            }
            let mut listing = self.collect_page(location, kind, store).await;
            listing.location = location.to_string();
            return listing;
        }

        match self.expand_path(location) {
            Ok(path) => self.collect_local(location, &path),
            Err(e) => {
                warn!("Ignoring find-links location {}: {:#}", location, e);
                SourceListing::failed(location, kind, format!("{:#}", e))
            }
        }
    }

    /// Expand a leading `~` and make the path absolute.
    fn expand_path(&self, location: &str) -> anyhow::Result<PathBuf> {
        let path = match location.strip_prefix('~') {
            Some(rest) if rest.is_empty() || rest.starts_with(['/', '\\']) => {
                let home = self
                    .runtime
                    .home_dir()
                    .ok_or_else(|| anyhow::anyhow!("Cannot expand '~': no home directory"))?;
                home.join(rest.trim_start_matches(['/', '\\']))
            }
            _ => PathBuf::from(location),
        };
        Ok(std::path::absolute(&path)?)
    }

    fn collect_local(&self, location: &str, path: &Path) -> SourceListing {
        let kind = SourceKind::FindLinks;

        if !self.runtime.exists(path) {
            warn!("Find-links location {} does not exist", path.display());
            return SourceListing::new(location, kind, Vec::new());
        }

        if !self.runtime.is_dir(path) {
            return match self.local_file_links(path) {
                Ok(links) => SourceListing::new(location, kind, links),
                Err(e) => SourceListing::failed(location, kind, format!("{:#}", e)),
            };
        }

        let mut entries = match self.runtime.read_dir(path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not list {}: {:#}", path.display(), e);
                return SourceListing::failed(location, kind, format!("{:#}", e));
            }
        };
        entries.sort();

        let mut links = Vec::new();
        for entry in entries {
            if self.runtime.is_dir(&entry) {
                continue;
            }
            match self.local_file_links(&entry) {
                Ok(found) => links.extend(found),
                Err(e) => debug!("Skipping {}: {:#}", entry.display(), e),
            }
        }
        SourceListing::new(location, kind, links)
    }

    /// A local HTML file is read as a listing page; any other file is a link.
    fn local_file_links(&self, path: &Path) -> anyhow::Result<Vec<Link>> {
        if is_html_file(path) {
            let content = self.runtime.read_to_string(path)?;
            let url = Url::from_file_path(path)
                .map_err(|_| anyhow::anyhow!("Path is not absolute: {}", path.display()))?;
            Ok(html::parse_links(&content, &url))
        } else {
            Ok(vec![Link::from_path(path)?])
        }
    }

    async fn collect_page(&self, url: &str, kind: SourceKind, store: &dyn PageStore) -> SourceListing {
        let page = match store.get(url) {
            Some(page) => {
                debug!("Using stored page for {}", url);
                page
            }
            None => match self.fetcher.fetch_page(url).await {
                Ok(Some(page)) => {
                    store.put(url, page.clone());
                    page
                }
                Ok(None) => return SourceListing::new(url, kind, Vec::new()),
                Err(e) => {
                    if is_not_found(&e) {
                        // Indexes answer 404 for projects they do not carry.
                        debug!("No page at {}: {:#}", url, e);
                    } else {
                        warn!("Could not fetch {}: {:#}", url, e);
                    }
                    return SourceListing::failed(url, kind, format!("{:#}", e));
                }
            },
        };

        match Url::parse(&page.url) {
            Ok(page_url) => SourceListing::new(url, kind, html::parse_links(&page.content, &page_url)),
            Err(e) => SourceListing::failed(url, kind, format!("Invalid page URL {}: {}", page.url, e)),
        }
    }
}
