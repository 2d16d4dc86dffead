//! Engine-owned mutations on the transaction aggregate.
//!
//! Signer, observer, and approver rows belong to the transaction aggregate
//! and change only through these operations. Each validates against the
//! status machine first: terminal transactions are frozen history.

use std::collections::BTreeSet;
use std::sync::Arc;

use signet_core::{
    ApproverId, Clock, PublicKey, SignetError, SignetResult, TransactionApprover, TransactionId,
    TransactionObserver, TransactionSigner, UserId, UserKeyId,
};

use crate::store::TransactionStore;

/// Performs the engine's mutations over the store seam.
pub struct TransactionMutator<T: TransactionStore> {
    store: Arc<T>,
    clock: Arc<dyn Clock>,
}

impl<T: TransactionStore> TransactionMutator<T> {
    /// Build a mutator over a store.
    pub fn new(store: Arc<T>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Record that a user key signed the transaction.
    ///
    /// On the first signature of a transaction carrying no snapshot, the
    /// caller-resolved required-key set is persisted as the snapshot, so the
    /// requirement is frozen against later upstream key rotations. Returns
    /// `false` when this `(transaction, key)` pair already signed.
    pub fn record_signature(
        &self,
        transaction_id: &TransactionId,
        user_key_id: &UserKeyId,
        required_keys: &BTreeSet<PublicKey>,
    ) -> SignetResult<bool> {
        let transaction = self.store.transaction(transaction_id)?;
        if transaction.status.is_terminal() {
            return Err(SignetError::invalid(format!(
                "transaction {transaction_id} is terminal and cannot collect signatures"
            )));
        }
        let key = self
            .store
            .user_key(user_key_id)?
            .ok_or_else(|| SignetError::not_found(format!("user key {user_key_id}")))?;
        if key.deleted {
            return Err(SignetError::invalid(format!(
                "user key {user_key_id} is deleted"
            )));
        }

        if transaction.key_snapshot.is_none() {
            self.store.set_key_snapshot(
                transaction_id,
                required_keys.iter().cloned().collect(),
                self.clock.now(),
            )?;
            tracing::debug!(
                transaction = %transaction_id,
                key_count = required_keys.len(),
                "snapshotted required keys on first signature"
            );
        }

        let inserted = self.store.insert_signer(TransactionSigner {
            transaction_id: *transaction_id,
            user_key_id: key.id,
            public_key: key.public_key,
            signed_at: self.clock.now(),
        })?;
        if inserted {
            tracing::debug!(transaction = %transaction_id, key = %user_key_id, "signature recorded");
        }
        Ok(inserted)
    }

    /// Invite a user to observe a transaction. Idempotent.
    pub fn invite_observer(
        &self,
        transaction_id: &TransactionId,
        user: &UserId,
    ) -> SignetResult<bool> {
        // Observer invites on terminal transactions are pointless but
        // harmless; reject them to keep the aggregate frozen.
        let transaction = self.store.transaction(transaction_id)?;
        if transaction.status.is_terminal() {
            return Err(SignetError::invalid(format!(
                "transaction {transaction_id} is terminal"
            )));
        }
        self.store.insert_observer(TransactionObserver {
            transaction_id: *transaction_id,
            user_id: *user,
        })
    }

    /// Revoke a user's observer access.
    pub fn remove_observer(
        &self,
        transaction_id: &TransactionId,
        user: &UserId,
    ) -> SignetResult<bool> {
        self.store.remove_observer(transaction_id, user)
    }

    /// Attach an approver row to a transaction or nest one under a parent.
    ///
    /// Exactly one of `parent` or the transaction attachment applies: rows
    /// with a parent join that list, rows without become roots.
    pub fn add_approver(
        &self,
        transaction_id: &TransactionId,
        parent: Option<ApproverId>,
        user: Option<UserId>,
    ) -> SignetResult<ApproverId> {
        let transaction = self.store.transaction(transaction_id)?;
        if transaction.status.is_terminal() {
            return Err(SignetError::invalid(format!(
                "transaction {transaction_id} is terminal"
            )));
        }
        let id = ApproverId::generate();
        self.store.insert_approver(TransactionApprover {
            id,
            transaction_id: parent.is_none().then_some(*transaction_id),
            parent_id: parent,
            user_id: user,
            approved: None,
            deleted: false,
        })?;
        Ok(id)
    }

    /// Soft-delete an approver row; history stays, the grant goes.
    pub fn revoke_approver(&self, id: &ApproverId) -> SignetResult<bool> {
        self.store.soft_delete_approver(id)
    }
}
