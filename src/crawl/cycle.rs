// src/crawl/cycle.rs
use metrics::{counter, gauge};
use tracing::{error, info};

use crate::crawl::ensure_metrics_described;
use crate::crawl::extract::ArticleExtractor;
use crate::crawl::types::Fetcher;
use crate::store::NewsStore;

/// Counts collected during one crawl cycle. Informational only: a cycle
/// never fails as a whole.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub visited: usize,
    pub failed: usize,
    pub accepted: usize,
}

/// Visit every source once, in order, and append whatever the extractor finds.
///
/// A source that cannot be fetched is logged and skipped; the remaining ones
/// are still visited. Fetching happens before the store lock is taken for the
/// corresponding appends.
pub async fn run_cycle(
    sources: &[String],
    fetcher: &dyn Fetcher,
    extractor: &ArticleExtractor,
    store: &NewsStore,
) -> CycleReport {
    ensure_metrics_described();

    let mut report = CycleReport::default();
    if sources.is_empty() {
        error!(target: "crawl", "no news sources configured (NEWS_URLS is empty); nothing to crawl");
        return report;
    }

    for url in sources {
        report.visited += 1;
        let doc = match fetcher.fetch(url).await {
            Ok(doc) => doc,
            Err(e) => {
                report.failed += 1;
                counter!("crawl_fetch_errors_total").increment(1);
                error!(target: "crawl", %url, error = %format!("{e:#}"), "error visiting url");
                continue;
            }
        };
        info!(target: "crawl", %url, "visited url");

        let records = extractor.extract(&doc.html, &doc.url);
        if records.is_empty() {
            info!(target: "crawl", %url, "no articles found");
        }
        for record in records {
            info!(target: "crawl", title = %record.title, source = %record.source, "fetched news");
            store.append(record);
            report.accepted += 1;
        }
    }

    counter!("crawl_cycles_total").increment(1);
    counter!("crawl_records_total").increment(report.accepted as u64);
    gauge!("news_store_len").set(store.len() as f64);
    gauge!("crawl_last_run_ts").set(chrono::Utc::now().timestamp() as f64);

    info!(
        target: "crawl",
        visited = report.visited,
        failed = report.failed,
        accepted = report.accepted,
        "crawl cycle finished"
    );
    report
}
