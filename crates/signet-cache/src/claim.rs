//! The claim/reclaim coordinator.
//!
//! For N simultaneous claims on one key exactly one caller observes
//! ownership; the rest see the winner's token. Ownership means "proceed to
//! fetch and write back", nothing more: a claim is not a lease that must be
//! released, an abandoned claim simply ages past the reclaim horizon and
//! becomes claimable again.

use std::sync::Arc;

use chrono::Duration;
use signet_core::{Clock, SignetResult};

use crate::row::{CacheKey, CachedKeyEntity, ClaimToken};
use crate::store::ClaimStore;

/// Result of a claim attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimOutcome {
    /// The winning token currently on the row. When `is_owner`, this is the
    /// token the caller must present at commit.
    pub token: ClaimToken,
    /// Whether this caller won the right to refresh.
    pub is_owner: bool,
    /// The row as it stood after the claim round-trip.
    pub row: CachedKeyEntity,
}

/// Arbitrates concurrent refresh of cached key-metadata rows.
pub struct CacheClaimCoordinator<S: ClaimStore> {
    store: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<S: ClaimStore> CacheClaimCoordinator<S> {
    /// Build a coordinator over a claim store.
    pub fn new(store: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Claim the right to refresh `key`, creating the row on first touch.
    ///
    /// The caller generates a candidate token, the store applies its atomic
    /// insert-or-update-or-select, and ownership is decided by comparing the
    /// candidate against the token on the returned row.
    pub fn claim_or_create(
        &self,
        key: &CacheKey,
        reclaim_horizon: Duration,
    ) -> SignetResult<ClaimOutcome> {
        let candidate = ClaimToken::generate();
        let now = self.clock.now();
        let row = self.store.claim_row(key, candidate, reclaim_horizon, now)?;

        let winner = row.claim_token.unwrap_or(candidate);
        let is_owner = row.claim_token == Some(candidate);
        if is_owner {
            tracing::debug!(key = %key, token = %candidate, "claim won");
        } else {
            tracing::debug!(key = %key, holder = %winner, "claim lost, refresh already in flight");
        }
        Ok(ClaimOutcome {
            token: winner,
            is_owner,
            row,
        })
    }

    /// Write back fetched key material under an optimistic token check.
    ///
    /// Returns `false` when the token no longer matches: another worker
    /// reclaimed the row as abandoned and this writer's payload is discarded.
    /// That is a normal outcome, not an error.
    pub fn commit(
        &self,
        key: &CacheKey,
        token: ClaimToken,
        payload: Vec<u8>,
    ) -> SignetResult<bool> {
        let wrote = self
            .store
            .commit_row(key, token, payload, self.clock.now())?;
        if !wrote {
            tracing::warn!(key = %key, token = %token, "commit discarded, claim was reclaimed");
        }
        Ok(wrote)
    }

    /// Read the row without touching claim state.
    pub fn read(&self, key: &CacheKey) -> SignetResult<Option<CachedKeyEntity>> {
        self.store.read_row(key)
    }
}
