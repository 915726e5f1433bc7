// src/crawl/mod.rs
pub mod cycle;
pub mod extract;
pub mod fetch;
pub mod scheduler;
pub mod types;

use std::sync::Arc;

use metrics::{describe_counter, describe_gauge};
use once_cell::sync::OnceCell;

use crate::crawl::cycle::CycleReport;
use crate::crawl::extract::ArticleExtractor;
use crate::crawl::types::Fetcher;
use crate::store::NewsStore;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("crawl_cycles_total", "Completed crawl cycles.");
        describe_counter!(
            "crawl_fetch_errors_total",
            "Sources that failed to fetch during a cycle."
        );
        describe_counter!(
            "crawl_records_total",
            "Article records appended to the news store."
        );
        describe_counter!(
            "crawl_ticks_skipped_total",
            "Scheduler ticks skipped because a cycle was still running."
        );
        describe_gauge!("crawl_last_run_ts", "Unix ts when a crawl cycle last finished.");
        describe_gauge!("news_store_len", "Records currently held by the news store.");
    });
}

/// Everything a crawl cycle needs, bundled so the scheduler can clone it into
/// each worker task.
#[derive(Clone)]
pub struct Crawler {
    sources: Arc<[String]>,
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<ArticleExtractor>,
    store: Arc<NewsStore>,
}

impl Crawler {
    pub fn new(
        sources: Vec<String>,
        fetcher: Arc<dyn Fetcher>,
        extractor: ArticleExtractor,
        store: Arc<NewsStore>,
    ) -> Self {
        Self {
            sources: sources.into(),
            fetcher,
            extractor: Arc::new(extractor),
            store,
        }
    }

    /// Run a single pass over every configured source.
    pub async fn run_once(&self) -> CycleReport {
        cycle::run_cycle(
            &self.sources,
            self.fetcher.as_ref(),
            &self.extractor,
            &self.store,
        )
        .await
    }

    pub fn sources(&self) -> &[String] {
        &self.sources
    }
}
