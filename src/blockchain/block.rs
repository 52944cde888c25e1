use chrono::Utc;
use serde::Serialize;

use super::encoding;
use super::transaction::Transaction;

/// A sealed block in the chain. Immutable once constructed.
///
/// The serialized form (timestamp, nonce, previous_hash as lowercase hex,
/// transactions in pool order) is both the wire representation and the
/// canonical encoding the block hash is computed over.
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Creation time in Unix nanoseconds. Informational only: the
    /// proof-of-work predicate evaluates candidates with a zero timestamp,
    /// so the sealed hash is not what the search satisfied.
    timestamp: i64,

    /// The nonce found by the proof-of-work search
    nonce: u64,

    /// Hash of the previous block
    #[serde(serialize_with = "encoding::serialize_hash_hex")]
    previous_hash: [u8; 32],

    /// Transactions sealed into this block, in admission order
    transactions: Vec<Transaction>,
}

impl Block {
    /// Creates a new block stamped with the current wall-clock time.
    pub fn new(nonce: u64, previous_hash: [u8; 32], transactions: Vec<Transaction>) -> Self {
        Block {
            // In range until 2262, so the fallback never triggers in practice.
            timestamp: Utc::now().timestamp_nanos_opt().unwrap_or_default(),
            nonce,
            previous_hash,
            transactions,
        }
    }

    /// SHA-256 over the canonical block encoding.
    pub fn hash(&self) -> Result<[u8; 32], serde_json::Error> {
        encoding::block_hash(self)
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn previous_hash(&self) -> &[u8; 32] {
        &self.previous_hash
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}
