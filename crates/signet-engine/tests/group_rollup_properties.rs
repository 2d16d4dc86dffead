//! Group rollup properties
//!
//! - a rollup's status is `Some` exactly when visible members agree
//! - visible count never exceeds total count
//! - timestamps fold to min (valid-start) and max (updated-at)

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use signet_core::{
    GroupId, GroupItem, PublicKey, Transaction, TransactionGroup, TransactionId,
    TransactionStatus, TransactionType, UserKeyId,
};
use signet_engine::{GroupAggregator, MemoryTransactionStore};

fn arb_status() -> impl Strategy<Value = TransactionStatus> {
    prop_oneof![
        Just(TransactionStatus::WaitingForSignatures),
        Just(TransactionStatus::WaitingForExecution),
        Just(TransactionStatus::Executed),
        Just(TransactionStatus::Failed),
        Just(TransactionStatus::Expired),
    ]
}

fn build_group(statuses: &[TransactionStatus]) -> (Arc<MemoryTransactionStore>, GroupId, Vec<TransactionId>) {
    let store = Arc::new(MemoryTransactionStore::new());
    let group = TransactionGroup {
        id: GroupId::generate(),
        description: "property batch".into(),
        atomic: false,
        sequential: true,
        created_at: Utc::now(),
    };
    store.put_group(group.clone());

    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    let creator_key = UserKeyId::generate();
    let mut ids = Vec::new();
    for (seq, status) in statuses.iter().enumerate() {
        let tx = Transaction {
            id: TransactionId::generate(),
            sdk_transaction_id: format!("0.0.5@1717200000.{seq:09}"),
            transaction_type: TransactionType::Transfer,
            status: *status,
            body: vec![seq as u8],
            key_snapshot: Some(vec![PublicKey::new(vec![seq as u8; 32])]),
            creator_key_id: creator_key,
            valid_start: t0 + Duration::seconds(seq as i64),
            group_id: Some(group.id),
            entity_refs: Vec::new(),
            inline_keys: Default::default(),
            created_at: t0 + Duration::seconds(seq as i64),
            updated_at: t0 + Duration::seconds(10 + seq as i64),
            executed_at: None,
        };
        store
            .put_group_item(GroupItem {
                group_id: group.id,
                seq: seq as u32,
                transaction_id: tx.id,
            })
            .expect("unique seq");
        ids.push(tx.id);
        store.put_transaction(tx);
    }
    (store, group.id, ids)
}

proptest! {
    #[test]
    fn status_folds_to_common_or_none(statuses in prop::collection::vec(arb_status(), 1..8)) {
        let (store, group_id, ids) = build_group(&statuses);
        let visible: BTreeSet<_> = ids.iter().copied().collect();
        let view = GroupAggregator::new(store)
            .aggregate(&group_id, &visible)
            .expect("aggregate");

        let uniform = statuses.iter().all(|s| *s == statuses[0]);
        if uniform {
            prop_assert_eq!(view.status, Some(statuses[0]));
            prop_assert_eq!(view.status_code, Some(statuses[0].code()));
        } else {
            prop_assert_eq!(view.status, None);
            prop_assert_eq!(view.status_code, None);
        }
    }

    #[test]
    fn visible_count_is_bounded_by_total(
        statuses in prop::collection::vec(arb_status(), 1..8),
        keep in prop::collection::vec(any::<bool>(), 8),
    ) {
        let (store, group_id, ids) = build_group(&statuses);
        let visible: BTreeSet<_> = ids
            .iter()
            .zip(keep.iter())
            .filter(|(_, keep)| **keep)
            .map(|(id, _)| *id)
            .collect();
        let view = GroupAggregator::new(store)
            .aggregate(&group_id, &visible)
            .expect("aggregate");

        prop_assert_eq!(view.group_item_count, statuses.len());
        prop_assert_eq!(view.group_collected_count, visible.len());
        prop_assert!(view.group_collected_count <= view.group_item_count);
    }

    #[test]
    fn timestamps_fold_min_and_max(statuses in prop::collection::vec(arb_status(), 1..8)) {
        let (store, group_id, ids) = build_group(&statuses);
        let visible: BTreeSet<_> = ids.iter().copied().collect();
        let view = GroupAggregator::new(store)
            .aggregate(&group_id, &visible)
            .expect("aggregate");

        let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        prop_assert_eq!(view.valid_start, Some(t0));
        prop_assert_eq!(
            view.updated_at,
            Some(t0 + Duration::seconds(10 + statuses.len() as i64 - 1))
        );
    }
}
