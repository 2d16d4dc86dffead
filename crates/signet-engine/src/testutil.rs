//! Shared fixtures for engine unit tests.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use signet_core::{
    EntityRef, PublicKey, Transaction, TransactionId, TransactionStatus, TransactionType, UserId,
    UserKey, UserKeyId,
};

pub fn pk(byte: u8) -> PublicKey {
    PublicKey::new(vec![byte; 32])
}

pub fn user_key(byte: u8) -> UserKey {
    user_key_for(UserId::generate(), byte)
}

pub fn user_key_for(user_id: UserId, byte: u8) -> UserKey {
    UserKey {
        id: UserKeyId::generate(),
        user_id,
        public_key: pk(byte),
        deleted: false,
    }
}

pub fn transaction(
    entity_refs: &[EntityRef],
    status: TransactionStatus,
    creator_key_id: UserKeyId,
) -> Transaction {
    let t0 = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    Transaction {
        id: TransactionId::generate(),
        sdk_transaction_id: "0.0.5@1717200000.000000001".into(),
        transaction_type: TransactionType::Transfer,
        status,
        body: vec![0xab, 0xcd],
        key_snapshot: None,
        creator_key_id,
        valid_start: t0,
        group_id: None,
        entity_refs: entity_refs.to_vec(),
        inline_keys: BTreeMap::new(),
        created_at: t0,
        updated_at: t0,
        executed_at: None,
    }
}
