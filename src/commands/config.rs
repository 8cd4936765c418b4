use anyhow::{Context, Result};
use log::debug;
use reqwest::{
    Client,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};

use crate::{
    collect::{HttpPageFetcher, LinkCollector, SearchScope},
    http::HttpClient,
    runtime::Runtime,
};

/// Environment variable holding a bearer token for private indexes.
pub const INDEX_TOKEN_ENV: &str = "PKGFINDER_INDEX_TOKEN";

pub struct Config<R: Runtime> {
    pub collector: LinkCollector<R, HttpPageFetcher>,
}

impl<R: Runtime> Config<R> {
    pub fn new(runtime: R, scope: SearchScope) -> Result<Self> {
        let mut headers = HeaderMap::new();
        if let Ok(token) = runtime.env_var(INDEX_TOKEN_ENV) {
            let mut auth_value = HeaderValue::from_str(&format!("Bearer {}", token))
                .with_context(|| format!("{} is not a valid header value", INDEX_TOKEN_ENV))?;
            auth_value.set_sensitive(true);
            headers.insert(AUTHORIZATION, auth_value);
            debug!(
                "Using {} for authentication: {}",
                INDEX_TOKEN_ENV,
                mask_token(&token)
            );
        }

        let client = Client::builder()
            .user_agent(concat!("pkgfinder/", env!("PKGFINDER_VERSION")))
            .default_headers(headers)
            .build()?;

        let fetcher = HttpPageFetcher::new(HttpClient::new(client));
        Ok(Self {
            collector: LinkCollector::new(runtime, fetcher, scope),
        })
    }
}

fn mask_token(token: &str) -> String {
    match (token.get(..4), token.get(token.len().saturating_sub(4)..)) {
        (Some(head), Some(tail)) if token.len() > 12 => format!("{}*********{}", head, tail),
        _ => "*********".to_string(),
    }
}
