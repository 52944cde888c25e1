use serde::{Serialize, Serializer};
use sha2::{Digest, Sha256};

use super::block::Block;
use super::transaction::Transaction;

// Canonical encoding for hashing and signing.
//
// Everything that feeds SHA-256 goes through this module so the signer and
// the verifier can never diverge. Field order is fixed: a transaction
// serializes as {sender_blockchain_address, receiver_blockchain_address,
// value}, a block as {timestamp, nonce, previous_hash, transactions}.
// Admission rejects non-finite values before anything reaches here, so for
// admitted data these functions cannot fail; the Result is kept because a
// serialization failure would be an internal invariant violation worth
// surfacing rather than swallowing.

/// Timestamp used for proof-of-work candidates so the proof does not
/// depend on wall-clock time.
const CANDIDATE_TIMESTAMP: i64 = 0;

/// Canonical bytes of a transaction, as signed by wallets and re-derived
/// by the chain during verification.
pub fn transaction_bytes(transaction: &Transaction) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(transaction)
}

/// Canonical bytes of a sealed block.
pub fn block_bytes(block: &Block) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(block)
}

/// SHA-256 over the canonical block encoding.
pub fn block_hash(block: &Block) -> Result<[u8; 32], serde_json::Error> {
    Ok(Sha256::digest(block_bytes(block)?).into())
}

/// Hash of a proof-of-work candidate: same shape as a sealed block but with
/// the timestamp pinned to zero. Also used (with nonce 0, a zero previous
/// hash and no transactions) as the genesis sentinel.
pub fn candidate_hash(
    nonce: u64,
    previous_hash: [u8; 32],
    transactions: &[Transaction],
) -> Result<[u8; 32], serde_json::Error> {
    #[derive(Serialize)]
    struct Candidate<'a> {
        timestamp: i64,
        nonce: u64,
        #[serde(serialize_with = "serialize_hash_hex")]
        previous_hash: [u8; 32],
        transactions: &'a [Transaction],
    }

    let candidate = Candidate {
        timestamp: CANDIDATE_TIMESTAMP,
        nonce,
        previous_hash,
        transactions,
    };

    Ok(Sha256::digest(serde_json::to_vec(&candidate)?).into())
}

/// Renders a 32-byte digest as a lowercase hex string, the form in which
/// previous-hash participates in the canonical block encoding.
pub fn serialize_hash_hex<S>(hash: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&hex::encode(hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::crypto::Address;

    fn transfer(value: f64) -> Transaction {
        Transaction::new(
            Address("sender".to_string()),
            Address("receiver".to_string()),
            value,
        )
    }

    #[test]
    fn test_transaction_bytes_field_order() {
        let bytes = transaction_bytes(&transfer(2.5)).unwrap();
        let encoded = String::from_utf8(bytes).unwrap();

        assert_eq!(
            encoded,
            r#"{"sender_blockchain_address":"sender","receiver_blockchain_address":"receiver","value":2.5}"#
        );
    }

    #[test]
    fn test_transaction_bytes_deterministic() {
        let first = transaction_bytes(&transfer(1.0)).unwrap();
        let second = transaction_bytes(&transfer(1.0)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_transaction_bytes_value_sensitive() {
        let first = transaction_bytes(&transfer(1.0)).unwrap();
        let second = transaction_bytes(&transfer(1.5)).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_candidate_hash_ignores_wall_clock() {
        let first = candidate_hash(7, [0u8; 32], &[transfer(1.0)]).unwrap();
        let second = candidate_hash(7, [0u8; 32], &[transfer(1.0)]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_candidate_hash_nonce_sensitive() {
        let first = candidate_hash(0, [0u8; 32], &[]).unwrap();
        let second = candidate_hash(1, [0u8; 32], &[]).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_candidate_hash_previous_hash_sensitive() {
        let first = candidate_hash(0, [0u8; 32], &[]).unwrap();
        let second = candidate_hash(0, [1u8; 32], &[]).unwrap();
        assert_ne!(first, second);
    }
}
