//! Client record cache.
//!
//! - [`CacheEntry`]: a record plus its absolute expiration instant
//! - [`ClientCache`]: keyed, TTL-bounded, single-flight cache in front of a
//!   [`ClientStore`](crate::traits::ClientStore)

mod client_cache;
mod entry;

pub use client_cache::{ClientCache, FetchOutcome};
pub use entry::CacheEntry;
