//! # Signet Engine — Eligibility & Signing-Key Resolution
//!
//! **Purpose**: Decide, for every transaction, which public keys must sign
//! it, which roles a user holds on it, and how grouped transactions roll up
//! into a single view.
//!
//! Data flow: transaction bytes + entity references → [`KeyResolver`]
//! (cache-backed) → [`SignatureRequirementEngine`] → required-key set →
//! [`EligibilityResolver`] (per user) → role set; grouped transactions fold
//! through the [`GroupAggregator`].
//!
//! # Architecture Constraints
//!
//! - YES pure decision logic over the `TransactionStore` / `KeySource` seams
//! - YES the engine-owned mutations (signing, invite, revoke)
//! - NO transport, authentication, or notification delivery
//! - NO cross-component locks: the only coordinated state is the cache row,
//!   and `signet-cache` owns that protocol

#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Relational store seam and the in-memory implementation
pub mod store;

/// Key-tree resolution with inline-key bypass
pub mod resolver;

/// Required-key flattening and sufficiency evaluation
pub mod requirements;

/// Per-user role computation
pub mod eligibility;

/// Rollup views over transaction groups
pub mod groups;

/// Engine-owned mutations on the transaction aggregate
pub mod mutations;

#[cfg(test)]
mod testutil;

pub use eligibility::{Eligibility, EligibilityResolver, RoleSet};
pub use groups::{GroupAggregator, GroupView};
pub use mutations::TransactionMutator;
pub use requirements::SignatureRequirementEngine;
pub use resolver::{KeyResolver, KeySource};
pub use store::{MemoryTransactionStore, TransactionStore};
