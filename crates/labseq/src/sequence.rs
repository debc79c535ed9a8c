//! SequenceCache: dense memo table for the labseq recurrence
//!
//! The table always holds `l(0)..=l(watermark)` with no gaps. A miss extends
//! it one index at a time: each value is summed under a shared read lock and
//! appended under a short write lock, so cached lookups never queue behind a
//! long extension.

use num_bigint::BigUint;
use parking_lot::RwLock;
use tracing::{debug, info, trace, warn};

use crate::error::{Error, Result};
use crate::stats::CacheStats;

/// Seed values l(0), l(1), l(2), l(3)
pub const BASE_VALUES: [u32; 4] = [0, 1, 0, 1];

/// Thread-safe memoizing evaluator for l(n)
pub struct SequenceCache {
    /// l(i) at position i, dense from 0
    values: RwLock<Vec<BigUint>>,

    /// Lookup statistics
    stats: CacheStats,

    /// Entries reserved up front (and again after every reset)
    capacity: usize,
}

impl SequenceCache {
    /// Create a cache holding only the base cases
    pub fn new() -> Self {
        Self::with_capacity(BASE_VALUES.len())
    }

    /// Create a cache with room for `capacity` entries before reallocating
    ///
    /// # Arguments
    /// * `capacity` - Number of entries to reserve (at least the four base cases)
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(BASE_VALUES.len());
        let cache = Self {
            values: RwLock::new(seeded(capacity)),
            stats: CacheStats::new(),
            capacity,
        };
        info!("Sequence cache initialized with base values (capacity {})", capacity);
        cache
    }

    /// Evaluate l(n), extending the cache up to `n` if needed
    ///
    /// # Arguments
    /// * `n` - Index in the sequence
    ///
    /// # Returns
    /// * `Result<BigUint>` - The value, or `Error::InvalidIndex` if `n < 0`
    pub fn evaluate(&self, n: i64) -> Result<BigUint> {
        let index = to_index(n)?;

        if let Some(value) = self.values.read().get(index) {
            self.stats.record_hit();
            trace!("Cache hit for l({})", n);
            return Ok(value.clone());
        }

        self.stats.record_miss();
        debug!(
            "Cache miss for l({}), extending from index {}",
            n,
            self.watermark() + 1
        );

        loop {
            // Length is re-read on every step: another thread may have
            // extended the table, or a reset may have shrunk it.
            let (next, value) = {
                let values = self.values.read();
                if let Some(value) = values.get(index) {
                    return Ok(value.clone());
                }
                let next = values.len();
                (next, &values[next - 4] + &values[next - 3])
            };

            let mut values = self.values.write();
            if values.len() == next {
                trace!("Calculated and cached l({})", next);
                values.push(value);
                self.stats.record_insert();
            }
        }
    }

    /// Get a cached value without triggering calculation
    ///
    /// Returns `None` for negative indices and indices above the watermark.
    pub fn peek(&self, n: i64) -> Option<BigUint> {
        let index = usize::try_from(n).ok()?;
        self.values.read().get(index).cloned()
    }

    /// Check whether l(n) is cached
    pub fn is_cached(&self, n: i64) -> bool {
        usize::try_from(n).is_ok_and(|index| index < self.size())
    }

    /// Number of cached entries (always at least 4)
    pub fn size(&self) -> usize {
        self.values.read().len()
    }

    /// Highest contiguously cached index
    pub fn watermark(&self) -> usize {
        self.size() - 1
    }

    /// Drop every computed value and reseed the base cases
    ///
    /// # Returns
    /// * `usize` - Cache size after the reset (always 4)
    pub fn reset(&self) -> usize {
        let (previous, size) = {
            let mut values = self.values.write();
            let previous = values.len();
            *values = seeded(self.capacity);
            (previous, values.len())
        };

        self.stats.record_reset();
        info!("Cache cleared (was {} entries, now {})", previous, size);
        size
    }

    /// Get cache statistics
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Get reserved capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for SequenceCache {
    fn default() -> Self {
        Self::new()
    }
}

fn seeded(capacity: usize) -> Vec<BigUint> {
    let mut values = Vec::with_capacity(capacity);
    values.extend(BASE_VALUES.iter().map(|&v| BigUint::from(v)));
    values
}

fn to_index(n: i64) -> Result<usize> {
    if n < 0 {
        warn!("Invalid index requested: {}", n);
        return Err(Error::InvalidIndex(n));
    }
    usize::try_from(n).map_err(|_| Error::IndexOutOfRange(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Barrier};
    use std::thread;

    fn value(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn test_base_cases() {
        let cache = SequenceCache::new();

        assert_eq!(cache.evaluate(0).unwrap(), value(0));
        assert_eq!(cache.evaluate(1).unwrap(), value(1));
        assert_eq!(cache.evaluate(2).unwrap(), value(0));
        assert_eq!(cache.evaluate(3).unwrap(), value(1));
        assert_eq!(cache.size(), 4);
    }

    #[test]
    fn test_known_values() {
        let cache = SequenceCache::new();
        let expected = [1, 1, 1, 2, 2, 2, 3, 4, 4, 5, 7, 8, 9, 12, 15, 17];

        for (i, &v) in expected.iter().enumerate() {
            assert_eq!(cache.evaluate(i as i64 + 4).unwrap(), value(v), "l({})", i + 4);
        }
        assert_eq!(cache.evaluate(100).unwrap(), value(182_376_579));
    }

    #[test]
    fn test_large_index() {
        let cache = SequenceCache::new();

        let l1000 = cache.evaluate(1000).unwrap();
        assert_eq!(
            l1000.to_string(),
            "167160955464809121248529556576412921573832214518206312831697195479802277127983539364995"
        );

        let l10000 = cache.evaluate(10_000).unwrap().to_string();
        assert_eq!(l10000.len(), 866);
        assert!(l10000.starts_with("69950566878097184013"));
        assert_eq!(cache.size(), 10_001);
    }

    #[test]
    fn test_recurrence_law() {
        let cache = SequenceCache::new();

        for n in 4..300 {
            let expected = cache.evaluate(n - 4).unwrap() + cache.evaluate(n - 3).unwrap();
            assert_eq!(cache.evaluate(n).unwrap(), expected, "l({})", n);
        }
    }

    #[test]
    fn test_idempotent() {
        let cache = SequenceCache::new();

        let first = cache.evaluate(50).unwrap();
        let size = cache.size();
        let second = cache.evaluate(50).unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.size(), size);
    }

    #[test]
    fn test_dense_growth() {
        let cache = SequenceCache::new();

        cache.evaluate(10).unwrap();
        assert_eq!(cache.size(), 11);
        assert_eq!(cache.watermark(), 10);

        // Lower index must not shrink or grow the table
        cache.evaluate(7).unwrap();
        assert_eq!(cache.size(), 11);

        cache.evaluate(25).unwrap();
        assert_eq!(cache.size(), 26);
        assert!((0..=25).all(|i| cache.is_cached(i)));
        assert!(!cache.is_cached(26));
    }

    #[test]
    fn test_negative_index_rejected() {
        let cache = SequenceCache::new();
        cache.evaluate(12).unwrap();
        let size = cache.size();

        let err = cache.evaluate(-1).unwrap_err();
        assert_eq!(err, Error::InvalidIndex(-1));
        assert_eq!(err.to_string(), "Index must be non-negative, got: -1");
        assert_eq!(cache.size(), size);
    }

    #[test]
    fn test_peek_does_not_compute() {
        let cache = SequenceCache::new();

        assert_eq!(cache.peek(3), Some(value(1)));
        assert_eq!(cache.peek(10), None);
        assert_eq!(cache.peek(-5), None);
        assert_eq!(cache.size(), 4);

        cache.evaluate(10).unwrap();
        assert_eq!(cache.peek(10), Some(value(3)));
    }

    #[test]
    fn test_reset() {
        let cache = SequenceCache::new();
        assert_eq!(cache.evaluate(10).unwrap(), value(3));
        assert_eq!(cache.size(), 11);

        assert_eq!(cache.reset(), 4);
        assert_eq!(cache.size(), 4);
        assert_eq!(cache.peek(4), None);
        for (i, &v) in BASE_VALUES.iter().enumerate() {
            assert_eq!(cache.evaluate(i as i64).unwrap(), value(v as u64));
        }

        assert_eq!(cache.evaluate(10).unwrap(), value(3));
        assert_eq!(cache.size(), 11);
    }

    #[test]
    fn test_with_capacity() {
        let cache = SequenceCache::with_capacity(0);
        assert_eq!(cache.capacity(), 4);
        assert_eq!(cache.size(), 4);

        let cache = SequenceCache::with_capacity(512);
        assert_eq!(cache.capacity(), 512);
        assert_eq!(cache.size(), 4);
    }

    #[test]
    fn test_stats() {
        let cache = SequenceCache::new();

        cache.evaluate(2).unwrap(); // hit
        cache.evaluate(10).unwrap(); // miss, 7 inserts
        cache.evaluate(10).unwrap(); // hit
        cache.evaluate(-3).unwrap_err();

        assert_eq!(cache.stats().hits(), 2);
        assert_eq!(cache.stats().misses(), 1);
        assert_eq!(cache.stats().inserts(), 7);

        cache.reset();
        let snap = cache.stats().snapshot();
        assert_eq!(snap.resets, 1);
        // Lookup history survives a reset
        assert_eq!(snap.hits, 2);
        assert_eq!(snap.inserts, 7);
    }

    #[test]
    fn test_concurrent_same_index() {
        let cache = Arc::new(SequenceCache::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || cache.evaluate(100).unwrap())
            })
            .collect();

        let results: Vec<BigUint> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert!(results.iter().all(|v| *v == value(182_376_579)));
        assert_eq!(cache.size(), 101);
        // Racing threads may compute an index twice but insert it once
        assert_eq!(cache.stats().inserts(), 97);
    }

    #[test]
    fn test_concurrent_overlapping_ranges() {
        let cache = Arc::new(SequenceCache::new());
        let reference = SequenceCache::new();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    let n = 50 + t * 25;
                    (n, cache.evaluate(n).unwrap())
                })
            })
            .collect();

        for handle in handles {
            let (n, v) = handle.join().unwrap();
            assert_eq!(v, reference.evaluate(n).unwrap());
        }
        assert_eq!(cache.size(), 226);
    }

    #[test]
    fn test_reset_during_evaluation() {
        const N: i64 = 50_000;

        let cache = Arc::new(SequenceCache::new());
        let expected = SequenceCache::new().evaluate(N).unwrap();
        let done = Arc::new(AtomicBool::new(false));
        let start = Arc::new(Barrier::new(2));

        let evaluator = {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let value = cache.evaluate(N).unwrap();
                done.store(true, Ordering::SeqCst);
                value
            })
        };
        let resetter = {
            let cache = Arc::clone(&cache);
            let done = Arc::clone(&done);
            let start = Arc::clone(&start);
            thread::spawn(move || {
                start.wait();
                let mut overlapped = 0;
                // Reset only once the extension is well under way
                while overlapped < 5 && !done.load(Ordering::SeqCst) {
                    if cache.size() > 1_000 {
                        cache.reset();
                        if !done.load(Ordering::SeqCst) {
                            overlapped += 1;
                        }
                    }
                }
                overlapped
            })
        };

        let overlapped = resetter.join().unwrap();
        assert_eq!(evaluator.join().unwrap(), expected);
        assert!(overlapped > 0, "no reset landed during the extension");
        assert!(cache.stats().resets() >= overlapped);

        let size = cache.size();
        assert!(size == 4 || size == N as usize + 1, "unexpected size {}", size);
    }
}
