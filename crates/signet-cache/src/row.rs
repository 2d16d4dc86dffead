//! Cached-key rows and claim tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use signet_core::{EntityId, Network};
use uuid::Uuid;

/// Opaque token marking current ownership of the right to refresh a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimToken(Uuid);

impl ClaimToken {
    /// Mint a fresh token.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Borrow the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl std::fmt::Display for ClaimToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Cache rows are unique on `(entity, network)`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    /// Ledger entity address
    pub entity_id: EntityId,
    /// Network the address lives on
    pub network: Network,
}

impl CacheKey {
    /// Build a cache key.
    pub fn new(entity_id: EntityId, network: Network) -> Self {
        Self {
            entity_id,
            network,
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.entity_id, self.network)
    }
}

/// One cached threshold-key blob for a ledger entity.
///
/// `updated_at` is dual-purpose: freshness of the blob AND age of the current
/// claim. A row is created on first resolution miss, mutated only through the
/// claim protocol, and never hard-deleted in normal operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedKeyEntity {
    /// Unique row key
    pub key: CacheKey,
    /// Encoded key tree; `None` until the first successful fetch commits
    pub key_blob: Option<Vec<u8>>,
    /// Current refresh claim; `None` when no refresh is in flight
    pub claim_token: Option<ClaimToken>,
    /// Freshness of the blob and age of the claim
    pub updated_at: DateTime<Utc>,
}

impl CachedKeyEntity {
    /// A freshly claimed row with no data yet.
    pub fn claimed(key: CacheKey, token: ClaimToken, now: DateTime<Utc>) -> Self {
        Self {
            key,
            key_blob: None,
            claim_token: Some(token),
            updated_at: now,
        }
    }

    /// Whether the blob has aged past the freshness window at `now`.
    ///
    /// The window boundary counts as stale, matching the reclaim horizon's
    /// inclusive comparison.
    pub fn is_stale(&self, now: DateTime<Utc>, freshness_window: Duration) -> bool {
        now - self.updated_at >= freshness_window
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn staleness_is_inclusive_at_the_window_boundary() {
        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let key = CacheKey::new(EntityId::from("0.0.7"), Network::Testnet);
        let row = CachedKeyEntity {
            key,
            key_blob: Some(vec![1]),
            claim_token: None,
            updated_at: t0,
        };
        let window = Duration::seconds(300);

        assert!(!row.is_stale(t0 + Duration::seconds(299), window));
        assert!(row.is_stale(t0 + Duration::seconds(300), window));
        assert!(row.is_stale(t0 + Duration::seconds(301), window));
    }
}
