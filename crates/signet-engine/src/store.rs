//! Relational store seam.
//!
//! The engine reads membership rows and performs its mutations through this
//! trait; everything behind it (a relational database in production, the
//! in-memory store here) is an external collaborator. Reads are synchronous
//! row lookups; the recursive approver traversal lives in the eligibility
//! module, not the store, so the cycle guard is engine logic rather than a
//! hope about recursive-query termination.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use signet_core::{
    ApproverId, GroupId, GroupItem, SignetError, SignetResult, Transaction, TransactionApprover,
    TransactionGroup, TransactionId, TransactionObserver, TransactionSigner, TransactionStatus,
    UserId, UserKey, UserKeyId,
};

/// Read and mutation operations the engine needs from the backing store.
pub trait TransactionStore: Send + Sync {
    /// Load a transaction by id.
    fn transaction(&self, id: &TransactionId) -> SignetResult<Transaction>;

    /// All keys owned by a user, including soft-deleted rows.
    fn user_keys(&self, user: &UserId) -> SignetResult<Vec<UserKey>>;

    /// Load a single user key.
    fn user_key(&self, id: &UserKeyId) -> SignetResult<Option<UserKey>>;

    /// Signer rows for a transaction.
    fn signers_for(&self, tx: &TransactionId) -> SignetResult<Vec<TransactionSigner>>;

    /// Observer rows for a transaction.
    fn observers_for(&self, tx: &TransactionId) -> SignetResult<Vec<TransactionObserver>>;

    /// Approver rows attached directly to a transaction.
    fn approver_roots(&self, tx: &TransactionId) -> SignetResult<Vec<TransactionApprover>>;

    /// Approver rows nested under a parent row.
    fn approver_children(&self, parent: &ApproverId) -> SignetResult<Vec<TransactionApprover>>;

    /// Load a group by id.
    fn group(&self, id: &GroupId) -> SignetResult<TransactionGroup>;

    /// Ordered membership of a group.
    fn group_items(&self, id: &GroupId) -> SignetResult<Vec<GroupItem>>;

    /// Insert a signer row; `false` when the `(transaction, key)` pair
    /// already exists.
    fn insert_signer(&self, row: TransactionSigner) -> SignetResult<bool>;

    /// Persist the required-key snapshot on a transaction.
    fn set_key_snapshot(
        &self,
        tx: &TransactionId,
        keys: Vec<signet_core::PublicKey>,
        now: DateTime<Utc>,
    ) -> SignetResult<()>;

    /// Insert an observer row; `false` when the pair already exists.
    fn insert_observer(&self, row: TransactionObserver) -> SignetResult<bool>;

    /// Remove an observer row; `false` when it did not exist.
    fn remove_observer(&self, tx: &TransactionId, user: &UserId) -> SignetResult<bool>;

    /// Insert an approver row.
    fn insert_approver(&self, row: TransactionApprover) -> SignetResult<()>;

    /// Soft-delete an approver row; `false` when it did not exist.
    fn soft_delete_approver(&self, id: &ApproverId) -> SignetResult<bool>;

    /// Move a transaction to a new status, enforcing the status machine.
    fn update_status(
        &self,
        tx: &TransactionId,
        next: TransactionStatus,
        now: DateTime<Utc>,
    ) -> SignetResult<()>;
}

#[derive(Debug, Default)]
struct Tables {
    transactions: HashMap<TransactionId, Transaction>,
    user_keys: HashMap<UserKeyId, UserKey>,
    signers: Vec<TransactionSigner>,
    observers: Vec<TransactionObserver>,
    approvers: HashMap<ApproverId, TransactionApprover>,
    groups: HashMap<GroupId, TransactionGroup>,
    group_items: Vec<GroupItem>,
}

/// In-memory transaction store for tests and local embedders.
#[derive(Debug, Default)]
pub struct MemoryTransactionStore {
    tables: parking_lot::RwLock<Tables>,
}

impl MemoryTransactionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a transaction row.
    pub fn put_transaction(&self, tx: Transaction) {
        self.tables.write().transactions.insert(tx.id, tx);
    }

    /// Insert or replace a user key row.
    pub fn put_user_key(&self, key: UserKey) {
        self.tables.write().user_keys.insert(key.id, key);
    }

    /// Insert or replace a group row.
    pub fn put_group(&self, group: TransactionGroup) {
        self.tables.write().groups.insert(group.id, group);
    }

    /// Append a group item; rejects a duplicate `(group, seq)` pair.
    pub fn put_group_item(&self, item: GroupItem) -> SignetResult<()> {
        let mut tables = self.tables.write();
        let duplicate = tables
            .group_items
            .iter()
            .any(|i| i.group_id == item.group_id && i.seq == item.seq);
        if duplicate {
            return Err(SignetError::invalid(format!(
                "group {} already has seq {}",
                item.group_id, item.seq
            )));
        }
        tables.group_items.push(item);
        Ok(())
    }
}

impl TransactionStore for MemoryTransactionStore {
    fn transaction(&self, id: &TransactionId) -> SignetResult<Transaction> {
        self.tables
            .read()
            .transactions
            .get(id)
            .cloned()
            .ok_or_else(|| SignetError::not_found(format!("transaction {id}")))
    }

    fn user_keys(&self, user: &UserId) -> SignetResult<Vec<UserKey>> {
        Ok(self
            .tables
            .read()
            .user_keys
            .values()
            .filter(|k| k.user_id == *user)
            .cloned()
            .collect())
    }

    fn user_key(&self, id: &UserKeyId) -> SignetResult<Option<UserKey>> {
        Ok(self.tables.read().user_keys.get(id).cloned())
    }

    fn signers_for(&self, tx: &TransactionId) -> SignetResult<Vec<TransactionSigner>> {
        Ok(self
            .tables
            .read()
            .signers
            .iter()
            .filter(|s| s.transaction_id == *tx)
            .cloned()
            .collect())
    }

    fn observers_for(&self, tx: &TransactionId) -> SignetResult<Vec<TransactionObserver>> {
        Ok(self
            .tables
            .read()
            .observers
            .iter()
            .filter(|o| o.transaction_id == *tx)
            .cloned()
            .collect())
    }

    fn approver_roots(&self, tx: &TransactionId) -> SignetResult<Vec<TransactionApprover>> {
        Ok(self
            .tables
            .read()
            .approvers
            .values()
            .filter(|a| a.transaction_id == Some(*tx))
            .cloned()
            .collect())
    }

    fn approver_children(&self, parent: &ApproverId) -> SignetResult<Vec<TransactionApprover>> {
        Ok(self
            .tables
            .read()
            .approvers
            .values()
            .filter(|a| a.parent_id == Some(*parent))
            .cloned()
            .collect())
    }

    fn group(&self, id: &GroupId) -> SignetResult<TransactionGroup> {
        self.tables
            .read()
            .groups
            .get(id)
            .cloned()
            .ok_or_else(|| SignetError::not_found(format!("group {id}")))
    }

    fn group_items(&self, id: &GroupId) -> SignetResult<Vec<GroupItem>> {
        let mut items: Vec<_> = self
            .tables
            .read()
            .group_items
            .iter()
            .filter(|i| i.group_id == *id)
            .cloned()
            .collect();
        items.sort_by_key(|i| i.seq);
        Ok(items)
    }

    fn insert_signer(&self, row: TransactionSigner) -> SignetResult<bool> {
        let mut tables = self.tables.write();
        let duplicate = tables
            .signers
            .iter()
            .any(|s| s.transaction_id == row.transaction_id && s.user_key_id == row.user_key_id);
        if duplicate {
            return Ok(false);
        }
        let now = row.signed_at;
        if let Some(tx) = tables.transactions.get_mut(&row.transaction_id) {
            tx.updated_at = now;
        }
        tables.signers.push(row);
        Ok(true)
    }

    fn set_key_snapshot(
        &self,
        tx: &TransactionId,
        keys: Vec<signet_core::PublicKey>,
        now: DateTime<Utc>,
    ) -> SignetResult<()> {
        let mut tables = self.tables.write();
        let row = tables
            .transactions
            .get_mut(tx)
            .ok_or_else(|| SignetError::not_found(format!("transaction {tx}")))?;
        row.key_snapshot = Some(keys);
        row.updated_at = now;
        Ok(())
    }

    fn insert_observer(&self, row: TransactionObserver) -> SignetResult<bool> {
        let mut tables = self.tables.write();
        let duplicate = tables
            .observers
            .iter()
            .any(|o| o.transaction_id == row.transaction_id && o.user_id == row.user_id);
        if duplicate {
            return Ok(false);
        }
        tables.observers.push(row);
        Ok(true)
    }

    fn remove_observer(&self, tx: &TransactionId, user: &UserId) -> SignetResult<bool> {
        let mut tables = self.tables.write();
        let before = tables.observers.len();
        tables
            .observers
            .retain(|o| !(o.transaction_id == *tx && o.user_id == *user));
        Ok(tables.observers.len() != before)
    }

    fn insert_approver(&self, row: TransactionApprover) -> SignetResult<()> {
        self.tables.write().approvers.insert(row.id, row);
        Ok(())
    }

    fn soft_delete_approver(&self, id: &ApproverId) -> SignetResult<bool> {
        let mut tables = self.tables.write();
        match tables.approvers.get_mut(id) {
            Some(row) => {
                row.deleted = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn update_status(
        &self,
        tx: &TransactionId,
        next: TransactionStatus,
        now: DateTime<Utc>,
    ) -> SignetResult<()> {
        let mut tables = self.tables.write();
        let row = tables
            .transactions
            .get_mut(tx)
            .ok_or_else(|| SignetError::not_found(format!("transaction {tx}")))?;
        if !row.status.can_transition_to(next) {
            return Err(SignetError::invalid(format!(
                "illegal status transition {:?} -> {next:?} for {tx}",
                row.status
            )));
        }
        row.status = next;
        row.updated_at = now;
        if next == TransactionStatus::Executed {
            row.executed_at = Some(now);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{transaction, user_key};
    use signet_core::PublicKey;

    #[test]
    fn duplicate_signer_pair_is_rejected() {
        let store = MemoryTransactionStore::new();
        let key = user_key(1);
        let tx = transaction(&[], TransactionStatus::WaitingForSignatures, key.id);
        store.put_transaction(tx.clone());
        store.put_user_key(key.clone());

        let row = TransactionSigner {
            transaction_id: tx.id,
            user_key_id: key.id,
            public_key: key.public_key.clone(),
            signed_at: Utc::now(),
        };
        assert!(store.insert_signer(row.clone()).expect("insert"));
        assert!(!store.insert_signer(row).expect("insert"));
        assert_eq!(store.signers_for(&tx.id).expect("read").len(), 1);
    }

    #[test]
    fn duplicate_group_seq_is_an_error() {
        let store = MemoryTransactionStore::new();
        let key = user_key(1);
        let group = signet_core::TransactionGroup {
            id: GroupId::generate(),
            description: "batch".into(),
            atomic: true,
            sequential: false,
            created_at: Utc::now(),
        };
        store.put_group(group.clone());
        let tx = transaction(&[], TransactionStatus::WaitingForSignatures, key.id);
        store.put_transaction(tx.clone());

        store
            .put_group_item(GroupItem {
                group_id: group.id,
                seq: 0,
                transaction_id: tx.id,
            })
            .expect("first");
        let err = store
            .put_group_item(GroupItem {
                group_id: group.id,
                seq: 0,
                transaction_id: tx.id,
            })
            .expect_err("duplicate seq");
        assert!(matches!(err, SignetError::Invalid { .. }));
    }

    #[test]
    fn illegal_status_transition_is_rejected() {
        let store = MemoryTransactionStore::new();
        let key = user_key(1);
        let tx = transaction(&[], TransactionStatus::WaitingForSignatures, key.id);
        store.put_transaction(tx.clone());

        let err = store
            .update_status(&tx.id, TransactionStatus::Executed, Utc::now())
            .expect_err("must fail");
        assert!(matches!(err, SignetError::Invalid { .. }));

        store
            .update_status(&tx.id, TransactionStatus::WaitingForExecution, Utc::now())
            .expect("legal");
        store
            .update_status(&tx.id, TransactionStatus::Executed, Utc::now())
            .expect("legal");
        let row = store.transaction(&tx.id).expect("read");
        assert!(row.executed_at.is_some());
    }

    #[test]
    fn snapshot_write_touches_updated_at() {
        let store = MemoryTransactionStore::new();
        let key = user_key(1);
        let tx = transaction(&[], TransactionStatus::WaitingForSignatures, key.id);
        let created = tx.updated_at;
        store.put_transaction(tx.clone());

        let later = created + chrono::Duration::seconds(5);
        store
            .set_key_snapshot(&tx.id, vec![PublicKey::new(vec![9u8; 32])], later)
            .expect("snapshot");
        let row = store.transaction(&tx.id).expect("read");
        assert_eq!(row.updated_at, later);
        assert_eq!(row.key_snapshot.as_ref().map(Vec::len), Some(1));
    }
}
