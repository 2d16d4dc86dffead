//! # Signet Cache — Key-Material Cache Domain
//!
//! **Purpose**: Store and refresh externally-sourced threshold-key blobs for
//! ledger entities, with refresh arbitrated by a claim/reclaim token protocol
//! so at most one worker fetches a given entry at a time.
//!
//! # Architecture Constraints
//!
//! - YES the claim-token protocol and its store trait obligations
//! - YES the async fetcher seam for the upstream ledger key-query service
//! - YES an in-memory store satisfying the atomic round-trip contract
//! - NO in-process locks standing in for claim state: claim ownership is
//!   always the persisted token field, compared optimistically
//! - NO retry policy: a losing or late writer's result is discarded and the
//!   caller decides whether to poll

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Cached-key rows, cache keys, claim tokens
pub mod row;

/// Store trait with atomic claim/commit round-trips, plus the in-memory impl
pub mod store;

/// The claim/reclaim coordinator
pub mod claim;

/// Upstream fetcher seam and fixtures
pub mod fetch;

/// Cache facade: claim, fetch outside the claim window, optimistic commit
pub mod cache;

pub use cache::KeyMaterialCache;
pub use claim::{CacheClaimCoordinator, ClaimOutcome};
pub use fetch::{FetchedKeyMaterial, KeyMaterialFetcher, StaticFetcher};
pub use row::{CacheKey, CachedKeyEntity, ClaimToken};
pub use store::{ClaimStore, MemoryClaimStore};
