//! Rollup views over transaction groups.
//!
//! A group folds its members into one row for listing: fields that only make
//! sense singly come from a representative member, divergent fields collapse
//! to `None`, and timestamps fold to min/max. The fold runs over the members
//! *visible* to the requesting user, which may legitimately be fewer than the
//! group holds — multi-party groups are expected to be partially visible.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use signet_core::{
    GroupId, SignetResult, Transaction, TransactionId, TransactionStatus, TransactionType,
};

use crate::store::TransactionStore;

/// Folded view over a group's visible members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    /// The group
    pub group_id: GroupId,
    /// Group description
    pub description: String,
    /// All members execute or none do
    pub atomic: bool,
    /// Members execute in sequence order
    pub sequential: bool,
    /// Representative member's type; `None` when no member is visible
    pub transaction_type: Option<TransactionType>,
    /// Representative member's ledger-format id
    pub sdk_transaction_id: Option<String>,
    /// The common status, `None` when members disagree
    pub status: Option<TransactionStatus>,
    /// The common status code, `None` when members disagree
    pub status_code: Option<i32>,
    /// Earliest valid-start across visible members
    pub valid_start: Option<DateTime<Utc>>,
    /// Latest mutation across visible members
    pub updated_at: Option<DateTime<Utc>>,
    /// Latest execution across visible members
    pub executed_at: Option<DateTime<Utc>>,
    /// Total members in the group
    pub group_item_count: usize,
    /// Members visible to the requesting user; at most `group_item_count`
    pub group_collected_count: usize,
}

/// Folds per-member fields into a [`GroupView`].
pub struct GroupAggregator<T: TransactionStore> {
    store: Arc<T>,
}

impl<T: TransactionStore> GroupAggregator<T> {
    /// Build the aggregator over a store.
    pub fn new(store: Arc<T>) -> Self {
        Self { store }
    }

    /// Aggregate a group over the members visible to the requesting user.
    ///
    /// Computed per request, never cached; it is only as consistent as the
    /// underlying read, and a signer landing mid-aggregation simply shows up
    /// on the next read.
    pub fn aggregate(
        &self,
        group_id: &GroupId,
        visible: &BTreeSet<TransactionId>,
    ) -> SignetResult<GroupView> {
        let group = self.store.group(group_id)?;
        let items = self.store.group_items(group_id)?;

        let mut members = Vec::new();
        for item in &items {
            if visible.contains(&item.transaction_id) {
                members.push(self.store.transaction(&item.transaction_id)?);
            }
        }

        let representative = members.iter().max_by_key(|tx| tx.created_at);

        Ok(GroupView {
            group_id: group.id,
            description: group.description,
            atomic: group.atomic,
            sequential: group.sequential,
            transaction_type: representative.map(|tx| tx.transaction_type.clone()),
            sdk_transaction_id: representative.map(|tx| tx.sdk_transaction_id.clone()),
            status: common_value(&members, |tx| tx.status),
            status_code: common_value(&members, |tx| tx.status.code()),
            valid_start: members.iter().map(|tx| tx.valid_start).min(),
            updated_at: members.iter().map(|tx| tx.updated_at).max(),
            executed_at: members.iter().filter_map(|tx| tx.executed_at).max(),
            group_item_count: items.len(),
            group_collected_count: members.len(),
        })
    }
}

/// The single common value across members, `None` when absent or mixed.
fn common_value<V: PartialEq>(
    members: &[Transaction],
    field: impl Fn(&Transaction) -> V,
) -> Option<V> {
    let mut iter = members.iter().map(&field);
    let first = iter.next()?;
    iter.all(|value| value == first).then_some(first)
}
