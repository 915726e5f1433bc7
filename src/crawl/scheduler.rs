// src/crawl/scheduler.rs
//! Periodic crawl trigger.
//!
//! `Scheduler` is the idle state; `start` consumes it and returns a
//! `RunningScheduler`. A dedicated task ticks every interval (the first tick
//! fires immediately) and runs each crawl cycle on its own worker task. The
//! loop ends only when the shutdown channel flips to `true` or its sender is
//! dropped.

use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::crawl::Crawler;

/// What to do when a tick fires while the previous cycle is still running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlapPolicy {
    /// Drop the tick and wait for the next one.
    #[default]
    Skip,
    /// Start another cycle alongside the running one.
    Allow,
}

impl FromStr for OverlapPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "allow" => Ok(Self::Allow),
            other => Err(other.to_string()),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SchedulerCfg {
    pub interval: Duration,
    pub overlap: OverlapPolicy,
}

impl SchedulerCfg {
    /// `None` when `minutes` is zero or too large to express in seconds.
    pub fn every_minutes(minutes: u64) -> Option<Self> {
        let secs = minutes.checked_mul(60).filter(|s| *s > 0)?;
        Some(Self {
            interval: Duration::from_secs(secs),
            overlap: OverlapPolicy::default(),
        })
    }
}

pub struct Scheduler {
    cfg: SchedulerCfg,
    crawler: Crawler,
}

pub struct RunningScheduler {
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn new(cfg: SchedulerCfg, crawler: Crawler) -> Self {
        Self { cfg, crawler }
    }

    /// Spawn the tick loop on the current tokio runtime.
    pub fn start(self, shutdown: watch::Receiver<bool>) -> RunningScheduler {
        info!(
            target: "crawl",
            interval_secs = self.cfg.interval.as_secs(),
            overlap = ?self.cfg.overlap,
            sources = self.crawler.sources().len(),
            "news crawler running"
        );
        let handle = tokio::spawn(tick_loop(self.cfg, self.crawler, shutdown));
        RunningScheduler { handle }
    }
}

impl RunningScheduler {
    /// Wait for the tick loop to exit after shutdown was signalled.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            warn!(target: "crawl", error = %e, "scheduler task ended abnormally");
        }
    }
}

// Clears the in-flight flag when the worker finishes, panics, or is aborted.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn tick_loop(cfg: SchedulerCfg, crawler: Crawler, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(cfg.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let busy = Arc::new(AtomicBool::new(false));
    let mut workers = JoinSet::new();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
        }

        while let Some(done) = workers.try_join_next() {
            if let Err(e) = done {
                error!(target: "crawl", error = %e, "crawl cycle task failed");
            }
        }

        let guard = match cfg.overlap {
            OverlapPolicy::Skip => {
                if busy.swap(true, Ordering::AcqRel) {
                    counter!("crawl_ticks_skipped_total").increment(1);
                    warn!(target: "crawl", "previous crawl cycle still running; skipping tick");
                    continue;
                }
                Some(InFlight(busy.clone()))
            }
            OverlapPolicy::Allow => None,
        };

        let crawler = crawler.clone();
        workers.spawn(async move {
            let _guard = guard;
            crawler.run_once().await
        });
        debug!(target: "crawl", in_flight = workers.len(), "crawl cycle started");
    }

    if !workers.is_empty() {
        info!(target: "crawl", in_flight = workers.len(), "aborting running crawl cycles");
    }
    workers.shutdown().await;
    info!(target: "crawl", "news crawler stopped");
}
