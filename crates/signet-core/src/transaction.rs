//! Transaction aggregate, membership rows, and the status machine.
//!
//! These are pure domain rows: the engine mutates them only through the store
//! seam in `signet-engine`, and the status matrix is a static `match` so the
//! legal transitions are auditable in one place.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identifiers::{
    ApproverId, EntityRef, GroupId, TransactionId, UserId, UserKeyId,
};
use crate::keys::{KeyTree, PublicKey};

/// Lifecycle status of a transaction.
///
/// Normal flow: `WaitingForSignatures → WaitingForExecution → {Executed,
/// Failed, Expired}`. Any non-terminal status may move to `Canceled`,
/// `Rejected`, or `Archived` through administrative action. `New` exists in
/// persisted data but normal flow never enters it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    /// Persisted placeholder, never entered by normal flow
    New,
    /// Collecting signatures
    WaitingForSignatures,
    /// Fully signed, queued for submission
    WaitingForExecution,
    /// Submitted and accepted by the ledger
    Executed,
    /// Submitted and rejected by the ledger
    Failed,
    /// Valid-start window elapsed before execution
    Expired,
    /// Withdrawn by its creator
    Canceled,
    /// Declined by a required approver
    Rejected,
    /// Removed from active view administratively
    Archived,
}

impl TransactionStatus {
    /// Stable numeric code used by rollups and persisted snapshots.
    pub fn code(&self) -> i32 {
        match self {
            Self::New => 0,
            Self::WaitingForSignatures => 1,
            Self::WaitingForExecution => 2,
            Self::Executed => 3,
            Self::Failed => 4,
            Self::Expired => 5,
            Self::Canceled => 6,
            Self::Rejected => 7,
            Self::Archived => 8,
        }
    }

    /// Once terminal, required-key and eligibility computation is frozen;
    /// the persisted snapshot is authoritative.
    ///
    /// `Rejected` is deliberately not terminal: participants still resolve
    /// eligibility on rejected transactions to see why they were involved.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Executed | Self::Failed | Self::Expired | Self::Canceled | Self::Archived
        )
    }

    /// Whether the status machine permits `self → next`.
    pub fn can_transition_to(&self, next: TransactionStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        // Administrative exits are allowed from any non-terminal status.
        if matches!(next, Self::Canceled | Self::Rejected | Self::Archived) {
            return true;
        }
        match (self, next) {
            (Self::New, Self::WaitingForSignatures) => true,
            (Self::WaitingForSignatures, Self::WaitingForExecution) => true,
            (Self::WaitingForExecution, Self::Executed | Self::Failed | Self::Expired) => true,
            (Self::WaitingForSignatures, Self::Expired) => true,
            (Self::Rejected, _) => false,
            _ => false,
        }
    }
}

/// Kind of ledger operation a transaction performs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Create a ledger account
    AccountCreate,
    /// Update a ledger account, including its key
    AccountUpdate,
    /// Transfer between accounts
    Transfer,
    /// Update a consensus node
    NodeUpdate,
    /// Remove a consensus node
    NodeDelete,
    /// Update a ledger file
    FileUpdate,
    /// Freeze the network for maintenance
    Freeze,
    /// Anything the engine has no special handling for
    Other,
}

/// A transaction awaiting multi-party approval and signing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Row identifier
    pub id: TransactionId,
    /// Ledger-format transaction id, e.g. `0.0.5@1700000000.000000001`
    pub sdk_transaction_id: String,
    /// Kind of ledger operation
    pub transaction_type: TransactionType,
    /// Lifecycle status
    pub status: TransactionStatus,
    /// Raw transaction bytes as they will be submitted
    pub body: Vec<u8>,
    /// Snapshot of the required public keys, authoritative once terminal
    pub key_snapshot: Option<Vec<PublicKey>>,
    /// Key the creator used when building the transaction
    pub creator_key_id: UserKeyId,
    /// Earliest instant the ledger will accept the transaction
    pub valid_start: DateTime<Utc>,
    /// Group this transaction belongs to, if any
    pub group_id: Option<GroupId>,
    /// Entities whose signing policies gate this transaction
    pub entity_refs: Vec<EntityRef>,
    /// Key hints supplied by the submission pipeline; these bypass the cache
    pub inline_keys: BTreeMap<EntityRef, KeyTree>,
    /// Row creation time
    pub created_at: DateTime<Utc>,
    /// Last mutation time
    pub updated_at: DateTime<Utc>,
    /// Execution time, once executed
    pub executed_at: Option<DateTime<Utc>>,
}

impl Transaction {
    /// The snapshotted required keys as a sorted set, empty when absent.
    pub fn snapshot_keys(&self) -> std::collections::BTreeSet<PublicKey> {
        self.key_snapshot
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

/// An atomic or sequential bundle of transactions sharing rollup semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionGroup {
    /// Row identifier
    pub id: GroupId,
    /// Human-readable description
    pub description: String,
    /// All members execute or none do
    pub atomic: bool,
    /// Members execute in `seq` order
    pub sequential: bool,
    /// Row creation time
    pub created_at: DateTime<Utc>,
}

/// Ordered membership of a transaction in a group; unique on `(group, seq)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupItem {
    /// Owning group
    pub group_id: GroupId,
    /// Position within the group
    pub seq: u32,
    /// Member transaction
    pub transaction_id: TransactionId,
}

/// A public key owned by a user. Soft-deletable: a removed key keeps its row
/// so historical signatures stay attributable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserKey {
    /// Row identifier
    pub id: UserKeyId,
    /// Owning user
    pub user_id: UserId,
    /// The key itself
    pub public_key: PublicKey,
    /// Soft-delete flag
    pub deleted: bool,
}

/// Records that a key has signed a transaction; unique on the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSigner {
    /// Signed transaction
    pub transaction_id: TransactionId,
    /// Key that produced the signature
    pub user_key_id: UserKeyId,
    /// The signing key's bytes at signing time
    pub public_key: PublicKey,
    /// When the signature was recorded
    pub signed_at: DateTime<Utc>,
}

/// A node in a transaction's approver delegation chain.
///
/// Root rows carry `transaction_id`; descendants carry `parent_id` pointing
/// at the row they delegate under. `user_id` is absent on pure list nodes.
/// The chain is persisted data and not guaranteed acyclic; traversals must
/// carry a visited set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionApprover {
    /// Row identifier
    pub id: ApproverId,
    /// Set on rows attached directly to a transaction
    pub transaction_id: Option<TransactionId>,
    /// Set on rows nested under another approver row
    pub parent_id: Option<ApproverId>,
    /// The approving user, absent on structural list nodes
    pub user_id: Option<UserId>,
    /// The user's recorded decision, if any
    pub approved: Option<bool>,
    /// Soft-delete flag; deleted rows stay for audit but grant nothing
    pub deleted: bool,
}

/// Grants a user read access to a transaction; unique on the pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionObserver {
    /// Observed transaction
    pub transaction_id: TransactionId,
    /// Observing user
    pub user_id: UserId,
}
