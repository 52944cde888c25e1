use p256::ecdsa::signature::{Signer, Verifier};
use p256::ecdsa::{SigningKey, VerifyingKey};
use p256::elliptic_curve::sec1::ToEncodedPoint;
use rand::rngs::OsRng;
use ripemd::Ripemd160;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use std::fmt;

use super::encoding;
use super::transaction::Transaction;

/// Version byte prepended to the RIPEMD-160 digest (main network).
const ADDRESS_VERSION: u8 = 0x00;

/// Number of checksum bytes appended to the versioned payload.
const ADDRESS_CHECKSUM_LEN: usize = 4;

/// Errors that can occur during cryptographic operations
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Failed to generate keypair: {0}")]
    KeyGeneration(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// A wallet address: the Base58Check rendering of the hashed public key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Address(pub String);

impl Address {
    /// Derives an address from a public key:
    /// SHA-256 over the X and Y coordinate bytes, RIPEMD-160 of the result,
    /// a 0x00 version byte in front, a 4-byte double-SHA-256 checksum at the
    /// end, the 25 bytes Base58-encoded.
    pub fn from_public_key(public_key: &VerifyingKey) -> Result<Self, CryptoError> {
        let point = public_key.to_encoded_point(false);
        let x = point.x().ok_or_else(|| {
            CryptoError::InvalidPublicKey("point has no x coordinate".to_string())
        })?;
        let y = point.y().ok_or_else(|| {
            CryptoError::InvalidPublicKey("point has no y coordinate".to_string())
        })?;

        let mut hasher = Sha256::new();
        hasher.update(x);
        hasher.update(y);
        let sha = hasher.finalize();

        let ripe = Ripemd160::digest(sha);

        let mut payload = Vec::with_capacity(1 + ripe.len() + ADDRESS_CHECKSUM_LEN);
        payload.push(ADDRESS_VERSION);
        payload.extend_from_slice(ripe.as_slice());
        let checksum = checksum(&payload);
        payload.extend_from_slice(&checksum);

        Ok(Address(bs58::encode(payload).into_string()))
    }

    /// Base58Check validation: decodes the address and verifies the embedded
    /// checksum. Useful to transports for catching typos before admission.
    pub fn is_valid(address: &str) -> bool {
        let bytes = match bs58::decode(address).into_vec() {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        if bytes.len() != 1 + 20 + ADDRESS_CHECKSUM_LEN {
            return false;
        }

        let (payload, embedded) = bytes.split_at(bytes.len() - ADDRESS_CHECKSUM_LEN);
        checksum(payload) == *embedded
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// First four bytes of a double SHA-256 over the versioned payload.
fn checksum(payload: &[u8]) -> [u8; ADDRESS_CHECKSUM_LEN] {
    let first = Sha256::digest(payload);
    let second = Sha256::digest(first);
    let mut out = [0u8; ADDRESS_CHECKSUM_LEN];
    out.copy_from_slice(&second[..ADDRESS_CHECKSUM_LEN]);
    out
}

/// An ECDSA (r, s) signature over a transaction's canonical digest.
#[derive(Debug, Clone, PartialEq)]
pub struct Signature(p256::ecdsa::Signature);

impl Signature {
    /// Parses a signature from its hex rendering: r and s concatenated,
    /// 64 bytes total.
    pub fn from_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        let signature = p256::ecdsa::Signature::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
        Ok(Signature(signature))
    }

    /// Renders the signature as hex: r followed by s.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0.to_bytes())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Parses a public key from its hex rendering: the X and Y coordinates
/// concatenated, 64 bytes total.
pub fn public_key_from_hex(hex_str: &str) -> Result<VerifyingKey, CryptoError> {
    let bytes = hex::decode(hex_str).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
    if bytes.len() != 64 {
        return Err(CryptoError::InvalidPublicKey(format!(
            "expected 64 bytes, got {}",
            bytes.len()
        )));
    }

    // Rebuild the uncompressed SEC1 form: 0x04 || X || Y.
    let mut sec1 = Vec::with_capacity(65);
    sec1.push(0x04);
    sec1.extend_from_slice(&bytes);

    VerifyingKey::from_sec1_bytes(&sec1).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))
}

/// Renders a public key as hex: the X and Y coordinates concatenated.
pub fn public_key_to_hex(public_key: &VerifyingKey) -> String {
    let point = public_key.to_encoded_point(false);
    // Skip the SEC1 tag byte, leaving X || Y.
    hex::encode(&point.as_bytes()[1..])
}

/// A wallet holding a P-256 key pair and its derived address.
///
/// The private scalar never leaves the wallet except through
/// `export_private_key`; signing only ever returns signatures.
#[derive(Clone)]
pub struct Wallet {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
    address: Address,
}

// Keep the private scalar out of debug output.
impl fmt::Debug for Wallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl Wallet {
    /// Creates a new wallet with a random key pair. Key material comes from
    /// the operating system's secure random source; if that source is
    /// unavailable the process aborts, there is no degraded fallback.
    pub fn new() -> Result<Self, CryptoError> {
        let signing_key = SigningKey::random(&mut OsRng);
        Self::from_signing_key(signing_key)
    }

    /// Restores a wallet from an exported private key.
    pub fn from_private_key_hex(hex_str: &str) -> Result<Self, CryptoError> {
        let bytes =
            hex::decode(hex_str).map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        let signing_key = SigningKey::from_slice(&bytes)
            .map_err(|e| CryptoError::InvalidPrivateKey(e.to_string()))?;
        Self::from_signing_key(signing_key)
    }

    fn from_signing_key(signing_key: SigningKey) -> Result<Self, CryptoError> {
        let verifying_key = VerifyingKey::from(&signing_key);
        let address = Address::from_public_key(&verifying_key)?;
        Ok(Wallet {
            signing_key,
            verifying_key,
            address,
        })
    }

    /// Gets the wallet's address
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Gets the wallet's public key
    pub fn public_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// The public key as hex (X and Y coordinates concatenated).
    pub fn public_key_hex(&self) -> String {
        public_key_to_hex(&self.verifying_key)
    }

    /// Explicitly exports the private scalar as hex. This is the only way
    /// key material leaves the wallet.
    pub fn export_private_key(&self) -> String {
        hex::encode(self.signing_key.to_bytes())
    }

    /// Signs the canonical encoding of a transaction. The signer hashes the
    /// message with SHA-256 internally, so the signed digest is exactly
    /// SHA-256 over the canonical bytes the verifier re-derives.
    pub fn sign_transaction(&self, transaction: &Transaction) -> Result<Signature, CryptoError> {
        let message = encoding::transaction_bytes(transaction)?;
        let signature: p256::ecdsa::Signature = self.signing_key.sign(&message);
        Ok(Signature(signature))
    }
}

/// Verifies a signature against a transaction's canonical digest and the
/// claimed sender's public key. `Ok(false)` means the signature does not
/// match; `Err` is reserved for encoding failures.
pub fn verify_transaction(
    transaction: &Transaction,
    public_key: &VerifyingKey,
    signature: &Signature,
) -> Result<bool, CryptoError> {
    let message = encoding::transaction_bytes(transaction)?;
    Ok(public_key.verify(&message, &signature.0).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transfer(sender: &Wallet, recipient: &Wallet, value: f64) -> Transaction {
        Transaction::new(sender.address().clone(), recipient.address().clone(), value)
    }

    #[test]
    fn test_wallet_creation() {
        let wallet = Wallet::new().unwrap();
        assert!(!wallet.address().0.is_empty());
        assert!(Address::is_valid(&wallet.address().0));
    }

    #[test]
    fn test_address_derivation_is_deterministic() {
        let wallet = Wallet::new().unwrap();
        let restored = Wallet::from_private_key_hex(&wallet.export_private_key()).unwrap();

        assert_eq!(wallet.address(), restored.address());
        assert_eq!(wallet.public_key_hex(), restored.public_key_hex());
    }

    #[test]
    fn test_distinct_keys_give_distinct_addresses() {
        let first = Wallet::new().unwrap();
        let second = Wallet::new().unwrap();
        assert_ne!(first.address(), second.address());
    }

    #[test]
    fn test_address_decodes_to_25_bytes() {
        let wallet = Wallet::new().unwrap();
        let bytes = bs58::decode(&wallet.address().0).into_vec().unwrap();

        assert_eq!(bytes.len(), 25);
        assert_eq!(bytes[0], ADDRESS_VERSION);
    }

    #[test]
    fn test_mutated_address_fails_checksum() {
        let wallet = Wallet::new().unwrap();
        let mut chars: Vec<char> = wallet.address().0.chars().collect();
        // Swap the first character for a different Base58 digit.
        chars[0] = if chars[0] == '2' { '3' } else { '2' };
        let mutated: String = chars.into_iter().collect();

        assert!(!Address::is_valid(&mutated));
        assert!(!Address::is_valid("not base58 0OIl"));
    }

    #[test]
    fn test_sign_and_verify() {
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let transaction = transfer(&sender, &recipient, 2.0);

        let signature = sender.sign_transaction(&transaction).unwrap();
        assert!(verify_transaction(&transaction, sender.public_key(), &signature).unwrap());
    }

    #[test]
    fn test_verify_rejects_tampered_value() {
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let transaction = transfer(&sender, &recipient, 2.0);
        let signature = sender.sign_transaction(&transaction).unwrap();

        let tampered = transfer(&sender, &recipient, 100.0);
        assert!(!verify_transaction(&tampered, sender.public_key(), &signature).unwrap());
    }

    #[test]
    fn test_verify_rejects_corrupted_signature() {
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let transaction = transfer(&sender, &recipient, 2.0);
        let signature = sender.sign_transaction(&transaction).unwrap();

        // Flip one nibble in the middle of the s component; the result is
        // still a well-formed signature, just not a valid one.
        let mut hex = signature.to_hex().into_bytes();
        hex[100] = if hex[100] == b'0' { b'1' } else { b'0' };
        let corrupted = Signature::from_hex(std::str::from_utf8(&hex).unwrap()).unwrap();

        assert!(!verify_transaction(&transaction, sender.public_key(), &corrupted).unwrap());
    }

    #[test]
    fn test_verify_rejects_substituted_key() {
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let transaction = transfer(&sender, &recipient, 2.0);
        let signature = sender.sign_transaction(&transaction).unwrap();

        let stranger = Wallet::new().unwrap();
        assert!(!verify_transaction(&transaction, stranger.public_key(), &signature).unwrap());
    }

    #[test]
    fn test_signature_hex_round_trip() {
        let sender = Wallet::new().unwrap();
        let recipient = Wallet::new().unwrap();
        let transaction = transfer(&sender, &recipient, 2.0);
        let signature = sender.sign_transaction(&transaction).unwrap();

        let hex = signature.to_hex();
        assert_eq!(hex.len(), 128);

        let parsed = Signature::from_hex(&hex).unwrap();
        assert!(verify_transaction(&transaction, sender.public_key(), &parsed).unwrap());
    }

    #[test]
    fn test_public_key_hex_round_trip() {
        let wallet = Wallet::new().unwrap();

        let hex = wallet.public_key_hex();
        assert_eq!(hex.len(), 128);

        let parsed = public_key_from_hex(&hex).unwrap();
        assert_eq!(&parsed, wallet.public_key());
    }

    #[test]
    fn test_invalid_key_and_signature_hex_rejected() {
        assert!(public_key_from_hex("deadbeef").is_err());
        assert!(public_key_from_hex("zz").is_err());
        assert!(Signature::from_hex("deadbeef").is_err());
        assert!(Wallet::from_private_key_hex("zz").is_err());
    }
}
