//! Threshold key trees and the cached-blob codec.
//!
//! A signing policy is a recursive M-of-N structure. Two concerns stay
//! separate on purpose: *flattening* answers "who could sign" (membership,
//! used for required-key resolution) and *satisfaction* answers "has enough
//! signed" (sufficiency, a bottom-up count). Conflating them would make a
//! user with one leaf key look sufficient for a 2-of-3 policy.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::errors::{SignetError, SignetResult};

/// A raw public key as stored on the ledger.
///
/// The engine treats keys as opaque bytes; verification of actual signatures
/// happens outside this system. Ordering is byte-lexicographic so required-key
/// sets have a stable, deterministic order for snapshots.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Borrow the raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Hex form used in logs and snapshots.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl From<&[u8]> for PublicKey {
    fn from(value: &[u8]) -> Self {
        Self::new(value.to_vec())
    }
}

impl std::fmt::Display for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Recursive threshold signing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyTree {
    /// A single public key.
    Leaf(PublicKey),
    /// M-of-N over child policies. `required = 0` is vacuously satisfied;
    /// the ledger encodes "all must sign" as `required = children.len()`.
    Threshold {
        /// How many children must be satisfied.
        required: u32,
        /// Child policies, keys or nested thresholds.
        children: Vec<KeyTree>,
    },
}

impl Default for KeyTree {
    /// The empty policy: an entity with no custom key.
    fn default() -> Self {
        Self::Threshold {
            required: 0,
            children: Vec::new(),
        }
    }
}

impl KeyTree {
    /// Build a leaf from raw key bytes.
    pub fn leaf(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Leaf(PublicKey::new(bytes))
    }

    /// Build a threshold node.
    pub fn threshold(required: u32, children: Vec<KeyTree>) -> Self {
        Self::Threshold { required, children }
    }

    /// True for the empty default policy.
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Threshold { children, .. } if children.is_empty())
    }

    /// Flatten to the set of member public keys.
    ///
    /// Membership only: a key appears iff it occurs somewhere in the tree,
    /// regardless of whether the thresholds above it could ever be met.
    pub fn flatten(&self) -> BTreeSet<PublicKey> {
        let mut keys = BTreeSet::new();
        self.flatten_into(&mut keys);
        keys
    }

    /// Flatten into an existing set, for unions across several trees.
    pub fn flatten_into(&self, keys: &mut BTreeSet<PublicKey>) {
        match self {
            Self::Leaf(key) => {
                keys.insert(key.clone());
            }
            Self::Threshold { children, .. } => {
                for child in children {
                    child.flatten_into(keys);
                }
            }
        }
    }

    /// Bottom-up sufficiency walk.
    ///
    /// A leaf is satisfied iff its key appears among the collected
    /// signatures; a threshold node is satisfied iff at least `required`
    /// children are.
    pub fn is_satisfied(&self, signatures: &BTreeSet<PublicKey>) -> bool {
        match self {
            Self::Leaf(key) => signatures.contains(key),
            Self::Threshold { required, children } => {
                let satisfied = children
                    .iter()
                    .filter(|child| child.is_satisfied(signatures))
                    .count();
                satisfied as u64 >= u64::from(*required)
            }
        }
    }
}

/// Encode a key tree into the blob form stored in cache rows.
pub fn encode_key_blob(tree: &KeyTree) -> SignetResult<Vec<u8>> {
    bincode::serialize(tree)
        .map_err(|e| SignetError::serialization(format!("key tree encode: {e}")))
}

/// Decode a cached key blob.
///
/// An empty blob is the legitimate "entity has no custom key" case and
/// decodes to the default tree; it is not an error and not a `NotFound`.
pub fn decode_key_blob(blob: &[u8]) -> SignetResult<KeyTree> {
    if blob.is_empty() {
        return Ok(KeyTree::default());
    }
    bincode::deserialize(blob)
        .map_err(|e| SignetError::serialization(format!("key tree decode: {e}")))
}
