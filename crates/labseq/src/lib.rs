//! # labseq
//!
//! Memoizing evaluator for the labseq recurrence:
//!
//! ```text
//! l(0) = 0, l(1) = 1, l(2) = 0, l(3) = 1
//! l(n) = l(n-4) + l(n-3)    for n > 3
//! ```
//!
//! ## Architecture
//! - **Dense cache**: values for indices `0..=watermark`, stored contiguously
//! - **Extension**: misses fill every index from the watermark up to `n`
//! - **Concurrency**: shared `RwLock`, one short write lock per insert
//! - **Values**: `BigUint`, exact for any index
//!
//! ```
//! use labseq::SequenceCache;
//!
//! let cache = SequenceCache::new();
//! assert_eq!(cache.evaluate(10).unwrap().to_string(), "3");
//! assert_eq!(cache.size(), 11);
//! ```

#![warn(missing_docs)]

mod error;
mod sequence;
mod stats;

pub use error::{Error, Result};
pub use num_bigint::BigUint;
pub use sequence::{SequenceCache, BASE_VALUES};
pub use stats::{CacheStats, StatsSnapshot};
