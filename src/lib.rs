//! A minimal single-node proof-of-work ledger.
//!
//! The [`blockchain`] module is the core: canonical encoding and hashing,
//! wallets and signatures, the proof-of-work search and balance replay.
//! The [`api`] module is a thin HTTP shim that parses requests, calls the
//! core with plain values and serializes its outputs.

pub mod api;
pub mod blockchain;

pub use blockchain::{
    Address, Block, Blockchain, BlockchainError, CancelToken, Signature, Transaction, Wallet,
};
