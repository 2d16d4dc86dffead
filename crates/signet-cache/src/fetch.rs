//! Upstream fetcher seam.
//!
//! The ledger key-query service is an external collaborator; this trait is
//! its interface. Failures map onto `SignetError::{NotFound, RateLimited,
//! FetchFailed}` and the cache decides what each means for resolution.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use signet_core::{EntityId, Network, SignetResult};

/// Key material as returned by the upstream ledger-query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedKeyMaterial {
    /// Encoded threshold-key blob; empty when the entity has no custom key
    pub encoded_key: Vec<u8>,
    /// Upstream entity tag for change detection
    pub etag: String,
}

/// Interface to the upstream ledger key-query service.
#[async_trait]
pub trait KeyMaterialFetcher: Send + Sync {
    /// Fetch the current key material for an entity.
    ///
    /// Errors: `NotFound` when the entity does not exist upstream,
    /// `RateLimited` and `FetchFailed` for transport-class failures.
    async fn fetch_key_material(
        &self,
        entity_id: &EntityId,
        network: Network,
    ) -> SignetResult<FetchedKeyMaterial>;
}

/// Fixture fetcher serving a fixed table of responses.
///
/// Used by tests and local embedders; counts calls so tests can assert that
/// inline keys and cache hits never touch the upstream.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    entries: HashMap<(EntityId, Network), SignetResult<FetchedKeyMaterial>>,
    calls: AtomicUsize,
}

impl StaticFetcher {
    /// Create an empty fetcher; every lookup is `NotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `blob` for an entity.
    pub fn with_key(mut self, entity_id: EntityId, network: Network, blob: Vec<u8>) -> Self {
        let etag = format!("etag-{}", self.entries.len());
        self.entries.insert(
            (entity_id, network),
            Ok(FetchedKeyMaterial {
                encoded_key: blob,
                etag,
            }),
        );
        self
    }

    /// Serve a fixed error for an entity.
    pub fn with_error(
        mut self,
        entity_id: EntityId,
        network: Network,
        error: signet_core::SignetError,
    ) -> Self {
        self.entries.insert((entity_id, network), Err(error));
        self
    }

    /// How many fetches have been made.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeyMaterialFetcher for StaticFetcher {
    async fn fetch_key_material(
        &self,
        entity_id: &EntityId,
        network: Network,
    ) -> SignetResult<FetchedKeyMaterial> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.entries.get(&(entity_id.clone(), network)) {
            Some(result) => result.clone(),
            None => Err(signet_core::SignetError::not_found(format!(
                "entity {entity_id} on {network}"
            ))),
        }
    }
}
