//! Strongly typed identifiers for the custody domain.
//!
//! UUID-backed ids for rows the engine owns, a string-backed id for ledger
//! entities (the upstream ledger uses `shard.realm.num` style addresses), and
//! the network discriminant that scopes cached key material.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Create a fresh random identifier.
            pub fn generate() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Borrow the underlying UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(
    /// Identifier for a transaction awaiting multi-party signing.
    TransactionId
);
uuid_id!(
    /// Identifier for a user of the custody system.
    UserId
);
uuid_id!(
    /// Identifier for a single public key owned by a user.
    UserKeyId
);
uuid_id!(
    /// Identifier for a transaction group.
    GroupId
);
uuid_id!(
    /// Identifier for an approver row in a delegation chain.
    ApproverId
);

/// Ledger entity address, e.g. `0.0.1234`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    /// Create a new entity identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger network scoping cached key material.
///
/// Cache rows are unique on `(entity, network)`; the same entity address on
/// two networks is two independent rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Network {
    /// Production ledger
    Mainnet,
    /// Public test ledger
    Testnet,
    /// Preview/staging ledger
    Previewnet,
    /// Locally hosted ledger for development
    Local,
}

impl Network {
    /// Stable string form used in logs and persisted keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Previewnet => "previewnet",
            Self::Local => "local",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a ledger entity whose signing key a transaction depends on.
///
/// A transaction names the entities that must authorize it: the sending
/// account, the fee payer, an affected consensus node. The kind matters only
/// for upstream lookup routing; key-tree semantics are identical.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityRef {
    /// A ledger account (sender, fee payer, updated account)
    Account(EntityId),
    /// A consensus node affected by the transaction
    Node(EntityId),
}

impl EntityRef {
    /// The entity address, regardless of kind.
    pub fn entity_id(&self) -> &EntityId {
        match self {
            Self::Account(id) | Self::Node(id) => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuid_ids_are_unique_and_round_trip() {
        let a = TransactionId::generate();
        let b = TransactionId::generate();
        assert_ne!(a, b);

        let json = serde_json::to_string(&a).expect("serialize");
        let back: TransactionId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(a, back);
    }

    #[test]
    fn entity_ref_exposes_address() {
        let account = EntityRef::Account(EntityId::from("0.0.1001"));
        let node = EntityRef::Node(EntityId::from("0.0.3"));
        assert_eq!(account.entity_id().as_str(), "0.0.1001");
        assert_eq!(node.entity_id().as_str(), "0.0.3");
    }

    #[test]
    fn network_string_forms_are_stable() {
        assert_eq!(Network::Mainnet.as_str(), "mainnet");
        assert_eq!(Network::Local.to_string(), "local");
    }
}
