use anyhow::Result;
use async_trait::async_trait;
use log::debug;

use crate::http::HttpClient;

/// A retrieved HTML listing.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexPage {
    /// URL the content was served from, used to resolve relative links.
    pub url: String,
    pub content: String,
}

/// Retrieves listing pages. `Ok(None)` means the URL answered with something
/// that is not an HTML page.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, url: &str) -> Result<Option<IndexPage>>;
}

pub struct HttpPageFetcher {
    http_client: HttpClient,
}

impl HttpPageFetcher {
    pub fn new(http_client: HttpClient) -> Self {
        Self { http_client }
    }

    pub fn http_client(&self) -> &HttpClient {
        &self.http_client
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    #[tracing::instrument(skip(self))]
    async fn fetch_page(&self, url: &str) -> Result<Option<IndexPage>> {
        let response = self.http_client.get_text(url, "text/html").await?;

        let is_html = response
            .content_type
            .as_deref()
            .is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("text/html"));
        if !is_html {
            debug!(
                "Skipping page {} because of Content-Type: {}",
                url,
                response.content_type.as_deref().unwrap_or("unknown")
            );
            return Ok(None);
        }

        Ok(Some(IndexPage {
            url: response.url,
            content: response.body,
        }))
    }
}
