//! Claim store trait and the in-memory implementation.
//!
//! The trait carries the protocol's atomicity obligations: `claim_row` and
//! `commit_row` must each execute as ONE atomic round-trip against the
//! backing store (a relational store expresses them as a single conditional
//! upsert / conditional update). The engine never holds a lock across either
//! call, and never across the upstream fetch between them.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use signet_core::{SignetError, SignetResult};

use crate::row::{CacheKey, CachedKeyEntity, ClaimToken};

/// Storage obligations for the claim protocol.
pub trait ClaimStore: Send + Sync {
    /// Insert-or-update-or-select in one atomic statement.
    ///
    /// - no row for `key`: insert it with `candidate` as the claim token and
    ///   `updated_at = now`;
    /// - row exists with a null token, or `now - updated_at >= horizon`:
    ///   install `candidate` and touch `updated_at`;
    /// - otherwise: leave the row unmodified.
    ///
    /// Always returns the resulting row. The caller learns ownership by
    /// comparing `candidate` against the returned token; the store itself
    /// decides nothing about ownership.
    fn claim_row(
        &self,
        key: &CacheKey,
        candidate: ClaimToken,
        horizon: Duration,
        now: DateTime<Utc>,
    ) -> SignetResult<CachedKeyEntity>;

    /// Plain read, `None` when the row has never been created.
    fn read_row(&self, key: &CacheKey) -> SignetResult<Option<CachedKeyEntity>>;

    /// Conditional write-back in one atomic statement.
    ///
    /// Stores `blob`, clears the claim token, and refreshes `updated_at`
    /// only if `token` still matches the stored token. Returns whether the
    /// write happened; a mismatch is a silent no-op, not an error.
    fn commit_row(
        &self,
        key: &CacheKey,
        token: ClaimToken,
        blob: Vec<u8>,
        now: DateTime<Utc>,
    ) -> SignetResult<bool>;
}

/// In-memory claim store.
///
/// One mutex-guarded critical section per call stands in for the relational
/// store's single-statement atomicity. The mutex is never held across a
/// fetch; claim state lives in the row's token field exactly as it would in
/// a persisted table.
#[derive(Debug, Default)]
pub struct MemoryClaimStore {
    rows: parking_lot::Mutex<HashMap<CacheKey, CachedKeyEntity>>,
}

impl MemoryClaimStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows ever created. Test observability.
    pub fn row_count(&self) -> usize {
        self.rows.lock().len()
    }
}

impl ClaimStore for MemoryClaimStore {
    fn claim_row(
        &self,
        key: &CacheKey,
        candidate: ClaimToken,
        horizon: Duration,
        now: DateTime<Utc>,
    ) -> SignetResult<CachedKeyEntity> {
        if horizon <= Duration::zero() {
            return Err(SignetError::invalid("reclaim horizon must be positive"));
        }
        let mut rows = self.rows.lock();
        let row = rows
            .entry(key.clone())
            .and_modify(|row| {
                let reclaimable =
                    row.claim_token.is_none() || now - row.updated_at >= horizon;
                if reclaimable {
                    row.claim_token = Some(candidate);
                    row.updated_at = now;
                }
            })
            .or_insert_with(|| CachedKeyEntity::claimed(key.clone(), candidate, now));
        Ok(row.clone())
    }

    fn read_row(&self, key: &CacheKey) -> SignetResult<Option<CachedKeyEntity>> {
        Ok(self.rows.lock().get(key).cloned())
    }

    fn commit_row(
        &self,
        key: &CacheKey,
        token: ClaimToken,
        blob: Vec<u8>,
        now: DateTime<Utc>,
    ) -> SignetResult<bool> {
        let mut rows = self.rows.lock();
        match rows.get_mut(key) {
            Some(row) if row.claim_token == Some(token) => {
                row.key_blob = Some(blob);
                row.claim_token = None;
                row.updated_at = now;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use signet_core::{EntityId, Network};

    fn key() -> CacheKey {
        CacheKey::new(EntityId::from("0.0.1001"), Network::Testnet)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_claim_inserts_the_row() {
        let store = MemoryClaimStore::new();
        let token = ClaimToken::generate();
        let row = store
            .claim_row(&key(), token, Duration::seconds(60), t0())
            .expect("claim");
        assert_eq!(row.claim_token, Some(token));
        assert!(row.key_blob.is_none());
        assert_eq!(store.row_count(), 1);
    }

    #[test]
    fn held_claim_is_returned_unmodified() {
        let store = MemoryClaimStore::new();
        let winner = ClaimToken::generate();
        store
            .claim_row(&key(), winner, Duration::seconds(60), t0())
            .expect("claim");

        let loser = ClaimToken::generate();
        let row = store
            .claim_row(
                &key(),
                loser,
                Duration::seconds(60),
                t0() + Duration::seconds(30),
            )
            .expect("claim");
        assert_eq!(row.claim_token, Some(winner));
        assert_eq!(row.updated_at, t0());
    }

    #[test]
    fn commit_with_stale_token_is_discarded() {
        let store = MemoryClaimStore::new();
        let original = ClaimToken::generate();
        store
            .claim_row(&key(), original, Duration::seconds(60), t0())
            .expect("claim");

        let stale = ClaimToken::generate();
        let wrote = store
            .commit_row(&key(), stale, vec![1, 2, 3], t0())
            .expect("commit");
        assert!(!wrote);
        let row = store.read_row(&key()).expect("read").expect("row");
        assert!(row.key_blob.is_none());
    }

    #[test]
    fn commit_clears_the_token() {
        let store = MemoryClaimStore::new();
        let token = ClaimToken::generate();
        store
            .claim_row(&key(), token, Duration::seconds(60), t0())
            .expect("claim");
        assert!(store
            .commit_row(&key(), token, vec![7], t0() + Duration::seconds(1))
            .expect("commit"));
        let row = store.read_row(&key()).expect("read").expect("row");
        assert_eq!(row.key_blob.as_deref(), Some(&[7u8][..]));
        assert!(row.claim_token.is_none());
        assert_eq!(row.updated_at, t0() + Duration::seconds(1));
    }

    #[test]
    fn zero_horizon_is_rejected() {
        let store = MemoryClaimStore::new();
        let err = store
            .claim_row(&key(), ClaimToken::generate(), Duration::zero(), t0())
            .expect_err("must fail");
        assert!(matches!(err, SignetError::Invalid { .. }));
    }
}
