//! Per-user role computation.
//!
//! Four independent pure predicates, combined by union into a [`RoleSet`]:
//! signer, creator, observer, approver. Keeping them free functions makes
//! each trivially testable and keeps role logic out of any type hierarchy.
//!
//! The approver predicate runs over a delegation closure: approver rows
//! attached to the transaction plus every row nested under them through
//! parent references. The chain is persisted data and not guaranteed
//! acyclic, so the traversal carries a visited set and a depth bound.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use signet_core::{
    EligibilityConfig, PublicKey, SignetError, SignetResult, Transaction, TransactionApprover,
    TransactionId, TransactionObserver, TransactionSigner, UserId, UserKey,
};

use crate::requirements::SignatureRequirementEngine;
use crate::store::TransactionStore;

/// Why a user may view or act on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleSet {
    /// Holds a key the transaction still needs (or needed)
    pub signer: bool,
    /// Created the transaction
    pub creator: bool,
    /// Explicitly invited to observe
    pub observer: bool,
    /// Reachable through the approver delegation chain
    pub approver: bool,
}

impl RoleSet {
    /// Whether any role applies.
    pub fn any(&self) -> bool {
        self.signer || self.creator || self.observer || self.approver
    }
}

impl Eligibility {
    /// Whether the user may see the transaction at all.
    ///
    /// Terminal transactions are readable history regardless of roles; a
    /// non-terminal transaction requires at least one role.
    pub fn authorized(&self) -> bool {
        self.terminal || self.roles.any()
    }
}

/// Outcome of an eligibility resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    /// The user's roles on the transaction
    pub roles: RoleSet,
    /// The required-key set the signer predicate ran against
    pub required_keys: BTreeSet<PublicKey>,
    /// True when the transaction was terminal and the snapshot was used
    pub terminal: bool,
}

/// Signer predicate: the user's live keys intersect the required set or the
/// snapshot. With `only_unsigned`, keys that already signed are excluded, so
/// a user whose every applicable key has signed no longer "needs to sign"
/// even though their signing history is preserved.
pub fn signer_eligible(
    user_keys: &[UserKey],
    required: &BTreeSet<PublicKey>,
    snapshot: &BTreeSet<PublicKey>,
    signed: &BTreeSet<PublicKey>,
    only_unsigned: bool,
) -> bool {
    user_keys
        .iter()
        .filter(|key| !key.deleted)
        .map(|key| &key.public_key)
        .filter(|pk| required.contains(*pk) || snapshot.contains(*pk))
        .any(|pk| !(only_unsigned && signed.contains(pk)))
}

/// Creator predicate: the transaction's creator key belongs to the user.
/// Soft-deleted keys still count; removing a key does not orphan history.
pub fn creator_eligible(transaction: &Transaction, user_keys: &[UserKey]) -> bool {
    user_keys
        .iter()
        .any(|key| key.id == transaction.creator_key_id)
}

/// Observer predicate: an observer row exists for the pair.
pub fn observer_eligible(observers: &[TransactionObserver], user: &UserId) -> bool {
    observers.iter().any(|row| row.user_id == *user)
}

/// Approver predicate over an already-collected closure: any non-soft-deleted
/// row naming the user grants the role.
pub fn approver_eligible(closure: &[TransactionApprover], user: &UserId) -> bool {
    closure
        .iter()
        .any(|row| !row.deleted && row.user_id == Some(*user))
}

/// Collect the approver delegation closure for a transaction.
///
/// Breadth-first from the rows attached to the transaction, following parent
/// references downward. Soft-deleted rows break the chain: they are neither
/// collected nor expanded, so everything delegated through them is cut off.
/// The visited set guarantees termination on cyclic chains; `max_depth` caps
/// pathological nesting. Rows beyond either guard are simply not collected.
pub fn approver_closure<T: TransactionStore + ?Sized>(
    store: &T,
    transaction: &TransactionId,
    max_depth: usize,
) -> SignetResult<Vec<TransactionApprover>> {
    let mut closure = Vec::new();
    let mut visited: HashSet<_> = HashSet::new();
    let mut frontier: VecDeque<_> = store
        .approver_roots(transaction)?
        .into_iter()
        .map(|row| (row, 0usize))
        .collect();

    while let Some((row, depth)) = frontier.pop_front() {
        if row.deleted {
            continue;
        }
        if !visited.insert(row.id) {
            // Revisit: a cycle or a diamond in the chain. Either way the row
            // is already accounted for.
            tracing::warn!(
                transaction = %transaction,
                approver = %row.id,
                "approver chain revisited a row"
            );
            continue;
        }
        if depth < max_depth {
            for child in store.approver_children(&row.id)? {
                frontier.push_back((child, depth + 1));
            }
        }
        closure.push(row);
    }
    Ok(closure)
}

/// Computes a user's role set for a transaction.
pub struct EligibilityResolver<T: TransactionStore> {
    store: Arc<T>,
    requirements: SignatureRequirementEngine,
    config: EligibilityConfig,
}

impl<T: TransactionStore> EligibilityResolver<T> {
    /// Build the resolver over a store and a requirement engine.
    pub fn new(
        store: Arc<T>,
        requirements: SignatureRequirementEngine,
        config: EligibilityConfig,
    ) -> Self {
        Self {
            store,
            requirements,
            config,
        }
    }

    /// Resolve the user's roles on a transaction.
    ///
    /// Always reports the role set; callers gating access use
    /// [`resolve_authorized`](Self::resolve_authorized) or check
    /// [`Eligibility::authorized`] themselves. Terminal transactions skip
    /// key resolution entirely: the snapshot is authoritative.
    pub async fn resolve(
        &self,
        transaction_id: &TransactionId,
        user: &UserId,
        only_unsigned: bool,
    ) -> SignetResult<Eligibility> {
        let transaction = self.store.transaction(transaction_id)?;
        let user_keys = self.store.user_keys(user)?;
        let observers = self.store.observers_for(transaction_id)?;
        let signers = self.store.signers_for(transaction_id)?;
        let signed: BTreeSet<_> = signers
            .iter()
            .map(|row: &TransactionSigner| row.public_key.clone())
            .collect();
        let snapshot = transaction.snapshot_keys();

        let terminal = transaction.status.is_terminal();
        let required = if terminal {
            snapshot.clone()
        } else {
            self.requirements.required_keys(&transaction).await?
        };

        let closure =
            approver_closure(&*self.store, transaction_id, self.config.max_approver_depth)?;

        let roles = RoleSet {
            signer: signer_eligible(&user_keys, &required, &snapshot, &signed, only_unsigned),
            creator: creator_eligible(&transaction, &user_keys),
            observer: observer_eligible(&observers, user),
            approver: approver_eligible(&closure, user),
        };

        if !terminal && !roles.any() {
            tracing::debug!(transaction = %transaction_id, user = %user, "no role applies");
        }

        Ok(Eligibility {
            roles,
            required_keys: required,
            terminal,
        })
    }

    /// Resolve roles and deny access when none applies.
    ///
    /// The access-denied condition only exists for non-terminal
    /// transactions; terminal ones are readable history.
    pub async fn resolve_authorized(
        &self,
        transaction_id: &TransactionId,
        user: &UserId,
        only_unsigned: bool,
    ) -> SignetResult<Eligibility> {
        let eligibility = self.resolve(transaction_id, user, only_unsigned).await?;
        if !eligibility.authorized() {
            return Err(SignetError::unauthorized(format!(
                "user {user} holds no role on transaction {transaction_id}"
            )));
        }
        Ok(eligibility)
    }
}
