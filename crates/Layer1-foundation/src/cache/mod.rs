//! # Pare Response Cache
//!
//! In-memory cache for optimized responses, keyed by operation, request
//! parameters and the shaping applied.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  CachePolicy   cacheable? ──► ttl_for(op) ──► invalidations │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  CacheKey  = op : canonical(params) : canonical(variant)     │
//! │        │                                                     │
//! │        ▼                                                     │
//! │  ResponseCache (IndexMap, FIFO eviction, lazy TTL)           │
//! │        ▲                                                     │
//! │        │ purge_expired() every interval                      │
//! │  CacheSweeper (tokio task, Weak ref, shutdown hook)          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`key`] - Canonical key derivation
//! - [`policy`] - Cacheable operations, TTLs, invalidation map
//! - [`store`] - Bounded TTL store
//! - [`sweeper`] - Background expiry sweep

pub mod key;
pub mod policy;
pub mod store;
pub mod sweeper;

pub use key::{canonical_json, canonicalize, CacheKey};
pub use policy::CachePolicy;
pub use store::{CacheEntry, ResponseCache, ResponseCacheConfig, ResponseCacheStats};
pub use sweeper::CacheSweeper;
