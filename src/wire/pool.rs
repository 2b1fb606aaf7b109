//! Presence-mask pool
//!
//! Reuses mask buffers across encode/decode calls so the hot path does not
//! allocate.
//!
//! ## Concurrency
//! - `buckets`: RwLock over the word-count → sub-pool map. Readers take the
//!   shared lock; the exclusive lock is only taken to create a sub-pool.
//! - Each sub-pool is a bounded lock-free queue. A release into a full
//!   sub-pool drops the mask instead of retaining it.

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam::queue::ArrayQueue;
use parking_lot::RwLock;

use super::mask::PresenceMask;
use crate::config::PoolConfig;

/// Counters describing pool effectiveness
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Masks created because the sub-pool was empty
    pub allocated: u64,
    /// Masks handed out from a sub-pool
    pub reused: u64,
    /// Released masks dropped because the sub-pool was full
    pub discarded: u64,
}

/// Pool of presence masks keyed by word count
pub struct MaskPool {
    config: PoolConfig,
    buckets: RwLock<HashMap<usize, Arc<ArrayQueue<PresenceMask>>>>,
    allocated: AtomicU64,
    reused: AtomicU64,
    discarded: AtomicU64,
}

impl MaskPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            buckets: RwLock::new(HashMap::new()),
            allocated: AtomicU64::new(0),
            reused: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
        }
    }

    /// Take a cleared mask of `words` words
    pub fn acquire(&self, words: usize) -> PresenceMask {
        if words == 0 {
            return PresenceMask::default();
        }

        match self.bucket(words).pop() {
            Some(mut mask) => {
                self.reused.fetch_add(1, Ordering::Relaxed);
                mask.clear();
                mask
            }
            None => {
                self.allocated.fetch_add(1, Ordering::Relaxed);
                PresenceMask::new(words)
            }
        }
    }

    /// Return a mask to its sub-pool
    pub fn release(&self, mask: PresenceMask) {
        let words = mask.word_count();
        if words == 0 {
            return;
        }
        if self.bucket(words).push(mask).is_err() {
            self.discarded.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Masks currently retained for `words`-word requests
    pub fn retained(&self, words: usize) -> usize {
        self.buckets.read().get(&words).map_or(0, |q| q.len())
    }

    /// Capacity of the sub-pool for `words`-word masks
    pub fn capacity(&self, words: usize) -> usize {
        self.config.capacity_for(words)
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated: self.allocated.load(Ordering::Relaxed),
            reused: self.reused.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
        }
    }

    fn bucket(&self, words: usize) -> Arc<ArrayQueue<PresenceMask>> {
        if let Some(bucket) = self.buckets.read().get(&words) {
            return Arc::clone(bucket);
        }

        let mut buckets = self.buckets.write();
        let capacity = self.config.capacity_for(words);
        Arc::clone(
            buckets
                .entry(words)
                .or_insert_with(|| Arc::new(ArrayQueue::new(capacity))),
        )
    }
}

impl Default for MaskPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}

/// A mask that goes back to its pool when dropped.
///
/// Without a pool it is a plain owned mask.
pub struct PooledMask {
    mask: PresenceMask,
    pool: Option<Arc<MaskPool>>,
}

impl PooledMask {
    pub fn acquire(pool: Option<Arc<MaskPool>>, words: usize) -> Self {
        let mask = match &pool {
            Some(pool) => pool.acquire(words),
            None => PresenceMask::new(words),
        };
        Self { mask, pool }
    }
}

impl Deref for PooledMask {
    type Target = PresenceMask;

    fn deref(&self) -> &PresenceMask {
        &self.mask
    }
}

impl DerefMut for PooledMask {
    fn deref_mut(&mut self) -> &mut PresenceMask {
        &mut self.mask
    }
}

impl Drop for PooledMask {
    fn drop(&mut self) {
        if let Some(pool) = self.pool.as_ref() {
            pool.release(std::mem::take(&mut self.mask));
        }
    }
}
