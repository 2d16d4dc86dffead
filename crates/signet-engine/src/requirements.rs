//! Required-key flattening and sufficiency evaluation.
//!
//! Two separate questions about the same trees: *membership* ("which keys
//! could ever be required") drives snapshots and signer eligibility, and
//! *sufficiency* ("has enough signed") drives the move to execution. The
//! engine never conflates them: a flattened set says nothing about whether
//! the thresholds are met.

use std::collections::BTreeSet;

use signet_core::{EntityRef, PublicKey, SignetResult, Transaction};

use crate::resolver::KeyResolver;

/// Flattens threshold key trees into required-key sets and evaluates
/// signature sufficiency.
pub struct SignatureRequirementEngine {
    resolver: KeyResolver,
}

impl SignatureRequirementEngine {
    /// Build the engine over a key resolver.
    pub fn new(resolver: KeyResolver) -> Self {
        Self { resolver }
    }

    /// Every entity the transaction depends on: its declared references plus
    /// any inline-keyed entities the pipeline attached beyond them.
    fn referenced_entities(transaction: &Transaction) -> Vec<EntityRef> {
        let mut entities = transaction.entity_refs.clone();
        for entity in transaction.inline_keys.keys() {
            if !entities.contains(entity) {
                entities.push(entity.clone());
            }
        }
        entities
    }

    /// The union of public keys that could be required to sign.
    ///
    /// Deduplicated and deterministically sorted so snapshots are stable.
    /// Terminal transactions are frozen: the persisted snapshot is returned
    /// as-is and no resolution happens.
    pub async fn required_keys(
        &self,
        transaction: &Transaction,
    ) -> SignetResult<BTreeSet<PublicKey>> {
        if transaction.status.is_terminal() {
            return Ok(transaction.snapshot_keys());
        }

        let mut keys = BTreeSet::new();
        for entity in Self::referenced_entities(transaction) {
            let tree = self.resolver.resolve(transaction, &entity).await?;
            tree.flatten_into(&mut keys);
        }
        tracing::debug!(
            transaction = %transaction.id,
            key_count = keys.len(),
            "resolved required keys"
        );
        Ok(keys)
    }

    /// Whether every top-level tree the transaction depends on is satisfied
    /// by the collected signatures.
    pub async fn is_fully_signed(
        &self,
        transaction: &Transaction,
        signatures: &BTreeSet<PublicKey>,
    ) -> SignetResult<bool> {
        for entity in Self::referenced_entities(transaction) {
            let tree = self.resolver.resolve(transaction, &entity).await?;
            if !tree.is_satisfied(signatures) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
