use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::crawl::types::{Document, Fetcher};

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Plain HTTP GET fetcher. One attempt per call, no retries.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Document> {
        let target = Url::parse(url).with_context(|| format!("invalid source url {url:?}"))?;
        let resp = self
            .client
            .get(target)
            .send()
            .await
            .with_context(|| format!("GET {url}"))?
            .error_for_status()
            .with_context(|| format!("GET {url} returned an error status"))?;

        // Redirects may land on another host; extraction keys on where the
        // page actually came from.
        let final_url = resp.url().clone();
        let html = resp
            .text()
            .await
            .with_context(|| format!("reading body of {url}"))?;

        Ok(Document::new(final_url, html))
    }
}
