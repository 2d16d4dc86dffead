//! # Signet Core — Foundation Crate
//!
//! **Purpose**: Define the domain types and pure logic shared by every Signet
//! crate: identifiers, threshold key trees, the transaction aggregate and its
//! status machine, the unified error type, the clock seam, and configuration.
//!
//! # Architecture Constraints
//!
//! This crate sits at the bottom of the workspace and depends on no other
//! Signet crate.
//! - YES domain types and pure functions (flattening, satisfaction, rollups)
//! - YES the unified `SignetError` used across crate boundaries
//! - NO storage implementations (those live in `signet-cache` / embedders)
//! - NO network or async execution (the fetcher seam is in `signet-cache`)

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Typed identifiers for users, keys, transactions, groups, and ledger entities
pub mod identifiers;

/// Unified error type for all Signet operations
pub mod errors;

/// Public keys, recursive threshold key trees, and the key-blob codec
pub mod keys;

/// Transaction aggregate, membership rows, and the status state machine
pub mod transaction;

/// Clock seam for deterministic time under test
pub mod time;

/// Engine configuration with validation and TOML loading
pub mod config;

pub use config::{CacheConfig, EligibilityConfig, EngineConfig};
pub use errors::{SignetError, SignetResult};
pub use identifiers::{
    ApproverId, EntityId, EntityRef, GroupId, Network, TransactionId, UserId, UserKeyId,
};
pub use keys::{decode_key_blob, encode_key_blob, KeyTree, PublicKey};
pub use time::{Clock, ManualClock, SystemClock};
pub use transaction::{
    GroupItem, Transaction, TransactionApprover, TransactionGroup, TransactionObserver,
    TransactionSigner, TransactionStatus, TransactionType, UserKey,
};
