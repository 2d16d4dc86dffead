//! Cache facade tying the claim protocol to the upstream fetcher.
//!
//! The upstream fetch happens strictly outside the claim round-trips, so a
//! slow ledger-query call never holds anything: the claim is just a token on
//! the row, and if the fetch outlives the reclaim horizon another worker
//! takes over and this one's late commit is discarded.

use std::sync::Arc;

use signet_core::{
    decode_key_blob, CacheConfig, Clock, EntityId, KeyTree, Network, SignetError, SignetResult,
};

use crate::claim::CacheClaimCoordinator;
use crate::fetch::KeyMaterialFetcher;
use crate::row::CacheKey;
use crate::store::ClaimStore;

/// Cache of externally-sourced threshold-key blobs.
pub struct KeyMaterialCache<S: ClaimStore, F: KeyMaterialFetcher> {
    coordinator: CacheClaimCoordinator<S>,
    fetcher: Arc<F>,
    clock: Arc<dyn Clock>,
    config: CacheConfig,
}

impl<S: ClaimStore, F: KeyMaterialFetcher> KeyMaterialCache<S, F> {
    /// Build a cache over a claim store and an upstream fetcher.
    pub fn new(
        store: Arc<S>,
        fetcher: Arc<F>,
        clock: Arc<dyn Clock>,
        config: CacheConfig,
    ) -> Self {
        Self {
            coordinator: CacheClaimCoordinator::new(store, clock.clone()),
            fetcher,
            clock,
            config,
        }
    }

    /// Resolve an entity's threshold key tree through the cache.
    ///
    /// The claim winner fetches upstream and commits; losers decode whatever
    /// blob the row carries, accepting staleness rather than blocking. An
    /// empty committed blob is the legitimate "entity has no custom key"
    /// case and decodes to the default tree, distinct from `NotFound`.
    pub async fn resolve(&self, entity_id: &EntityId, network: Network) -> SignetResult<KeyTree> {
        let key = CacheKey::new(entity_id.clone(), network);
        let outcome = self
            .coordinator
            .claim_or_create(&key, self.config.reclaim_horizon())?;

        if outcome.is_owner {
            return self.refresh(&key, outcome.token).await;
        }

        // Not the owner: another worker's refresh is in flight. Serve what
        // the row has rather than block on the upstream.
        match outcome.row.key_blob {
            Some(ref blob) => {
                if outcome
                    .row
                    .is_stale(self.clock.now(), self.config.freshness_window())
                {
                    tracing::warn!(
                        key = %key,
                        updated_at = %outcome.row.updated_at,
                        "serving stale key material while refresh is in flight"
                    );
                } else {
                    tracing::debug!(
                        key = %key,
                        updated_at = %outcome.row.updated_at,
                        "serving cached key material while refresh is in flight"
                    );
                }
                decode_key_blob(&blob)
            }
            None => Err(SignetError::fetch_failed(format!(
                "key material for {key} is being fetched by another worker"
            ))),
        }
    }

    async fn refresh(&self, key: &CacheKey, token: crate::row::ClaimToken) -> SignetResult<KeyTree> {
        let fetched = self
            .fetcher
            .fetch_key_material(&key.entity_id, key.network)
            .await;

        let material = match fetched {
            Ok(material) => material,
            // The claim is simply abandoned; the horizon reclaims it.
            Err(err) if err.is_not_found() => {
                tracing::debug!(key = %key, "entity does not exist upstream");
                return Err(err);
            }
            Err(err) => {
                tracing::warn!(key = %key, error = %err, "upstream key fetch failed");
                return Err(SignetError::fetch_failed(err.to_string()));
            }
        };

        let tree = decode_key_blob(&material.encoded_key)?;
        let wrote = self
            .coordinator
            .commit(key, token, material.encoded_key)?;
        if wrote {
            tracing::debug!(key = %key, etag = %material.etag, "key material refreshed");
        }
        // Even a discarded commit resolved real upstream data; return it.
        Ok(tree)
    }
}
