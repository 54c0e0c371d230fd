//! Normalized key/value cache for Arbor.
//!
//! A normalized cache keeps one record per data id in a single top-level
//! mapping. This crate exposes that mapping through the [`NormalizedCache`]
//! trait and implements it on top of a shared [`arbor_store::Store`], so
//! every cache mutation becomes a store command and is visible to the
//! store's subscribers.
//!
//! # Key Types
//!
//! - [`NormalizedCache`] -- Trait: get/set/delete/clear over data ids
//! - [`StoreCache`] -- Store-backed implementation
//! - [`CacheError`] -- Error type for cache operations

pub mod error;
pub mod store_cache;
pub mod traits;

pub use error::{CacheError, CacheResult};
pub use store_cache::StoreCache;
pub use traits::NormalizedCache;
