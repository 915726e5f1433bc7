//! # News Store
//! Fixed-capacity, insertion-ordered buffer of [`ArticleRecord`]s.
//!
//! The crawler appends, the HTTP layer takes snapshots. Both go through the
//! same mutex, so a reader sees the buffer either before or after an append,
//! never halfway through one. Once full, every append evicts the oldest
//! record: the store is a sliding window over time, not a ranking.

use std::{
    collections::VecDeque,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::crawl::types::ArticleRecord;

/// Default number of records kept in memory.
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("news store capacity must be greater than 0")]
    ZeroCapacity,
}

/// Thread-safe bounded FIFO of article records.
#[derive(Debug)]
pub struct NewsStore {
    inner: Mutex<VecDeque<ArticleRecord>>,
    cap: usize,
}

impl NewsStore {
    /// Create an empty store holding at most `cap` records.
    ///
    /// Only a default-sized buffer is reserved up front; the deque grows on
    /// demand up to `cap`.
    pub fn with_capacity(cap: usize) -> Result<Self, StoreError> {
        if cap == 0 {
            return Err(StoreError::ZeroCapacity);
        }
        Ok(Self {
            inner: Mutex::new(VecDeque::with_capacity(cap.min(DEFAULT_CAPACITY))),
            cap,
        })
    }

    /// Append a record, evicting the oldest one first when the store is full.
    pub fn append(&self, record: ArticleRecord) {
        let mut buf = self.lock();
        if buf.len() == self.cap {
            buf.pop_front();
        }
        buf.push_back(record);
    }

    /// Copy of the current contents, oldest first.
    pub fn snapshot(&self) -> Vec<ArticleRecord> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    // push/pop never leave the deque half-updated, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, VecDeque<ArticleRecord>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for NewsStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(VecDeque::with_capacity(DEFAULT_CAPACITY)),
            cap: DEFAULT_CAPACITY,
        }
    }
}
