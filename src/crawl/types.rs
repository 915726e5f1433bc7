// src/crawl/types.rs
use anyhow::Result;
use url::Url;

/// One scraped article summary.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct ArticleRecord {
    pub title: String,
    pub description: String,
    pub source: String, // host of the page it came from, e.g. "example.com"
}

impl ArticleRecord {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            source: source.into(),
        }
    }
}

/// A fetched HTML page together with the URL it was served from.
#[derive(Debug, Clone)]
pub struct Document {
    pub url: Url,
    pub html: String,
}

impl Document {
    pub fn new(url: Url, html: impl Into<String>) -> Self {
        Self {
            url,
            html: html.into(),
        }
    }
}

#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Document>;
}
