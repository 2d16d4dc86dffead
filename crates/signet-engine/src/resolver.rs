//! Key-tree resolution for transaction entity references.
//!
//! The submission pipeline may attach inline key hints to a transaction;
//! those bypass the cache entirely. Everything else goes through the
//! [`KeySource`] seam, implemented by the key-material cache.

use std::sync::Arc;

use async_trait::async_trait;
use signet_cache::{ClaimStore, KeyMaterialCache, KeyMaterialFetcher};
use signet_core::{EntityId, EntityRef, KeyTree, Network, SignetResult, Transaction};

/// Source of entity key trees, implemented by the key-material cache.
#[async_trait]
pub trait KeySource: Send + Sync {
    /// Resolve an entity's current threshold key tree.
    async fn entity_key_tree(
        &self,
        entity_id: &EntityId,
        network: Network,
    ) -> SignetResult<KeyTree>;
}

#[async_trait]
impl<S, F> KeySource for KeyMaterialCache<S, F>
where
    S: ClaimStore,
    F: KeyMaterialFetcher,
{
    async fn entity_key_tree(
        &self,
        entity_id: &EntityId,
        network: Network,
    ) -> SignetResult<KeyTree> {
        self.resolve(entity_id, network).await
    }
}

/// Expands a ledger entity reference into its threshold key tree.
pub struct KeyResolver {
    keys: Arc<dyn KeySource>,
    network: Network,
}

impl KeyResolver {
    /// Build a resolver over a key source for one network.
    pub fn new(keys: Arc<dyn KeySource>, network: Network) -> Self {
        Self { keys, network }
    }

    /// The network this resolver serves.
    pub fn network(&self) -> Network {
        self.network
    }

    /// Resolve the key tree gating `entity` for `transaction`.
    ///
    /// An inline key hint wins outright and never touches the cache; this is
    /// how the pipeline supplies keys for entities the upstream cannot serve
    /// yet (e.g. an account being created by this very transaction).
    pub async fn resolve(
        &self,
        transaction: &Transaction,
        entity: &EntityRef,
    ) -> SignetResult<KeyTree> {
        if let Some(tree) = transaction.inline_keys.get(entity) {
            tracing::debug!(entity = %entity.entity_id(), "using inline key hint");
            return Ok(tree.clone());
        }
        self.keys
            .entity_key_tree(entity.entity_id(), self.network)
            .await
    }
}
