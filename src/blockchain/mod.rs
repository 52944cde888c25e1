// Blockchain module
//
// This module contains the core ledger implementation:
// - Canonical encoding and hashing
// - Block structure
// - Blockchain structure with pool, mining and balance replay
// - Transaction structure
// - Wallet, address derivation and signatures

pub mod block;
pub mod chain;
pub mod crypto;
pub mod encoding;
pub mod transaction;

// Re-export main components for easier access
pub use block::Block;
pub use chain::{Blockchain, BlockchainError, CancelToken};
pub use chain::{MINING_DIFFICULTY, MINING_REWARD, MINING_SENDER};
pub use crypto::{Address, Signature, Wallet};
pub use transaction::Transaction;
