//! # mvfifo
//!
//! Size-bounded, in-memory multi-value FIFO cache.
//!
//! Each key holds an ordered run of `(cursor, value)` records, while a single
//! global insertion order decides eviction across all keys combined.
//!
//! ## Architecture
//! - **Arena**: Slot vector with a free list, records addressed by index
//! - **Global chain**: Insertion order across all keys (oldest evicted first)
//! - **Key chains**: Per-key insertion order, indexed by an AHash map
//! - **Locking**: One `parking_lot::RwLock`; iterators hold the read guard
//!
//! ## Example
//! ```
//! use mvfifo::{CacheConfig, MvFifoCache};
//!
//! let cache = MvFifoCache::with_config(CacheConfig::new().max_size_bytes(1024));
//! cache.add("stream", 1, "hello");
//! cache.add("stream", 2, "world");
//!
//! let newer: Vec<_> = cache.iter_after("stream", 1).map(|(cursor, _)| cursor).collect();
//! assert_eq!(newer, vec![2]);
//! ```

#![warn(missing_docs)]

mod cache;
mod chain;
mod config;
mod error;
mod stats;


pub use cache::{Iter, MvFifoCache};
pub use chain::{footprint, RECORD_OVERHEAD};
pub use config::{CacheConfig, DEFAULT_MAX_SIZE_BYTES, MAX_SIZE_ENV};
pub use error::{Error, Result};
pub use stats::CacheStats;
