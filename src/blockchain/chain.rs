use log::{info, warn};
use p256::ecdsa::VerifyingKey;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use thiserror::Error;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::block::Block;
use super::crypto::{self, Address, CryptoError, Signature};
use super::encoding;
use super::transaction::Transaction;

/// Required count of leading zero hex characters in a block hash.
pub const MINING_DIFFICULTY: usize = 3;

/// Reserved sender identity for reward issuance; exempt from signature
/// verification and never a real wallet address.
pub const MINING_SENDER: &str = "I AM A MINER";

/// Value credited to the chain owner for each sealed block.
pub const MINING_REWARD: f64 = 1.0;

/// Errors that can occur during blockchain operations
#[derive(Debug, Error)]
pub enum BlockchainError {
    #[error("Invalid transaction signature")]
    InvalidSignature,

    #[error("Missing sender public key or signature")]
    MissingCredentials,

    #[error("Invalid transaction value: {0}")]
    InvalidValue(f64),

    #[error("Mining was cancelled")]
    MiningCancelled,

    #[error("Crypto error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Canonical encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Cooperative cancellation for an in-flight proof-of-work search.
///
/// Cloned tokens share one flag: cancel any clone and the search observes it
/// on its next nonce iteration, rolling back the pending reward admission.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Checks the difficulty predicate for a candidate block: the hex rendering
/// of its hash (computed with the zero sentinel timestamp) must start with
/// `difficulty` zero characters.
pub fn valid_proof(
    nonce: u64,
    previous_hash: [u8; 32],
    transactions: &[Transaction],
    difficulty: usize,
) -> Result<bool, serde_json::Error> {
    let target = "0".repeat(difficulty);
    let hash = encoding::candidate_hash(nonce, previous_hash, transactions)?;
    Ok(hex::encode(hash).starts_with(&target))
}

/// The single-node ledger: an append-only chain of sealed blocks plus the
/// pool of admitted, not-yet-sealed transactions.
#[derive(Debug, Clone)]
pub struct Blockchain {
    /// The chain of blocks; chain[0] is the genesis block
    chain: Arc<Mutex<Vec<Block>>>,

    /// Admitted transactions waiting to be sealed
    transaction_pool: Arc<Mutex<Vec<Transaction>>>,

    /// Held for the whole seal sequence so two concurrent mining calls
    /// cannot race on the same pool snapshot.
    seal_lock: Arc<Mutex<()>>,

    /// Owner address credited with mining rewards
    address: Address,

    /// Required leading zero hex characters in a block hash
    difficulty: usize,
}

impl Blockchain {
    /// Creates a new blockchain for the given owner, sealed with a genesis
    /// block at the default difficulty.
    pub fn new(address: Address) -> Result<Self, BlockchainError> {
        Self::with_difficulty(address, MINING_DIFFICULTY)
    }

    /// Creates a new blockchain with an explicit difficulty.
    pub fn with_difficulty(address: Address, difficulty: usize) -> Result<Self, BlockchainError> {
        let blockchain = Blockchain {
            chain: Arc::new(Mutex::new(Vec::new())),
            transaction_pool: Arc::new(Mutex::new(Vec::new())),
            seal_lock: Arc::new(Mutex::new(())),
            address,
            difficulty,
        };

        // Genesis: nonce 0 over the hash of the all-zero sentinel block.
        let sentinel = encoding::candidate_hash(0, [0u8; 32], &[])?;
        let genesis = Block::new(0, sentinel, Vec::new());
        blockchain.chain.lock().unwrap().push(genesis);

        Ok(blockchain)
    }

    /// The owner address credited with mining rewards.
    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// A snapshot of the sealed chain.
    pub fn chain(&self) -> Vec<Block> {
        self.chain.lock().unwrap().clone()
    }

    /// A snapshot of the pending-transaction pool.
    pub fn transaction_pool(&self) -> Vec<Transaction> {
        self.transaction_pool.lock().unwrap().clone()
    }

    /// The most recently sealed block.
    pub fn last_block(&self) -> Block {
        self.chain.lock().unwrap().last().unwrap().clone()
    }

    /// Validates a transaction and appends it to the pool.
    ///
    /// The reserved system sender bypasses signature verification; every
    /// other sender must supply its public key and a signature over the
    /// transaction's canonical digest. On any rejection the pool is left
    /// untouched. Balance sufficiency is deliberately not checked here.
    pub fn add_transaction(
        &self,
        transaction: Transaction,
        sender_public_key: Option<&VerifyingKey>,
        signature: Option<&Signature>,
    ) -> Result<(), BlockchainError> {
        if !transaction.value.is_finite() || transaction.value < 0.0 {
            return Err(BlockchainError::InvalidValue(transaction.value));
        }

        if transaction.sender.0 == MINING_SENDER {
            self.transaction_pool.lock().unwrap().push(transaction);
            return Ok(());
        }

        let (public_key, signature) = match (sender_public_key, signature) {
            (Some(public_key), Some(signature)) => (public_key, signature),
            _ => return Err(BlockchainError::MissingCredentials),
        };

        if !crypto::verify_transaction(&transaction, public_key, signature)? {
            warn!(
                "Rejected transaction from {}: signature verification failed",
                transaction.sender
            );
            return Err(BlockchainError::InvalidSignature);
        }

        self.transaction_pool.lock().unwrap().push(transaction);
        Ok(())
    }

    /// Admits the mining reward, runs the proof-of-work search over a
    /// snapshot of the pool and seals the result into a new block.
    ///
    /// Blocks the caller until a nonce is found. Transactions admitted while
    /// the search is running are not sealed into this block; they stay in
    /// the pool and are carried into the next one.
    pub fn mine(&self) -> Result<Block, BlockchainError> {
        self.mine_with_token(&CancelToken::new())
    }

    /// Like [`mine`](Self::mine), but aborts when the token is cancelled,
    /// rolling back the reward admission and leaving pool and chain as they
    /// were.
    pub fn mine_with_token(&self, token: &CancelToken) -> Result<Block, BlockchainError> {
        let _seal = self.seal_lock.lock().unwrap();

        let reward = Transaction::new(
            Address(MINING_SENDER.to_string()),
            self.address.clone(),
            MINING_REWARD,
        );

        let previous_hash = self.last_block().hash()?;

        // Admit the reward and snapshot in one critical section so the
        // reward's position is known exactly in case of rollback.
        let (snapshot, snapshot_len, reward_index) = {
            let mut pool = self.transaction_pool.lock().unwrap();
            let reward_index = pool.len();
            pool.push(reward);
            (pool.clone(), pool.len(), reward_index)
        };

        // The search runs against the zero-timestamp candidate; the seal
        // below re-derives the previous hash over the real creation time.
        let search = self
            .proof_of_work(&snapshot, previous_hash, token)
            .and_then(|nonce| Ok((nonce, self.last_block().hash()?)));
        let (nonce, previous_hash) = match search {
            Ok(found) => found,
            Err(err) => {
                // Entries before the reward are stable while the seal lock
                // is held, so its index still points at it.
                self.transaction_pool.lock().unwrap().remove(reward_index);
                return Err(err);
            }
        };
        let sealed: Vec<Transaction> = {
            let mut pool = self.transaction_pool.lock().unwrap();
            pool.drain(..snapshot_len).collect()
        };
        let block = Block::new(nonce, previous_hash, sealed);
        self.chain.lock().unwrap().push(block.clone());

        info!("action=mining status=success nonce={}", nonce);
        Ok(block)
    }

    /// Exhaustive nonce search: 0, 1, 2, ... until the difficulty predicate
    /// holds. CPU-bound and single-path.
    fn proof_of_work(
        &self,
        transactions: &[Transaction],
        previous_hash: [u8; 32],
        token: &CancelToken,
    ) -> Result<u64, BlockchainError> {
        let mut nonce = 0u64;
        loop {
            if token.is_cancelled() {
                return Err(BlockchainError::MiningCancelled);
            }
            if valid_proof(nonce, previous_hash, transactions, self.difficulty)? {
                return Ok(nonce);
            }
            nonce += 1;
        }
    }

    /// Replays every transaction in every sealed block: credits where the
    /// address is the receiver, debits where it is the sender. Pending pool
    /// transactions are excluded. O(total transactions), uncached.
    pub fn calculate_total(&self, address: &Address) -> f64 {
        let chain = self.chain.lock().unwrap();
        let mut total = 0.0;

        for block in chain.iter() {
            for transaction in block.transactions() {
                if &transaction.recipient == address {
                    total += transaction.value;
                }
                if &transaction.sender == address {
                    total -= transaction.value;
                }
            }
        }

        total
    }

    /// Walks the chain and checks that every block links to its
    /// predecessor's hash.
    pub fn is_valid(&self) -> bool {
        let chain = self.chain.lock().unwrap();

        for i in 1..chain.len() {
            match chain[i - 1].hash() {
                Ok(hash) => {
                    if chain[i].previous_hash() != &hash {
                        return false;
                    }
                }
                Err(_) => return false,
            }
        }

        true
    }
}

/// Serializes the chain as `{"chains":[ ...blocks... ]}`, the wire shape
/// existing clients expect.
impl Serialize for Blockchain {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let chain = self.chain.lock().unwrap();
        let mut state = serializer.serialize_struct("Blockchain", 1)?;
        state.serialize_field("chains", &*chain)?;
        state.end()
    }
}
