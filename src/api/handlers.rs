use actix_web::{web, HttpResponse, Responder};
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::blockchain::{crypto, Address, Blockchain, Signature, Transaction, Wallet};

/// Shared handle to the process-wide chain
pub type BlockchainData = web::Data<Blockchain>;

/// Status envelope used by the original clients
#[derive(Serialize)]
pub struct StatusResponse {
    pub message: String,
}

fn status(message: &str) -> StatusResponse {
    StatusResponse {
        message: message.to_string(),
    }
}

/// Request for the transaction endpoint. Keys and signature arrive as hex,
/// exactly as a wallet exports them.
#[derive(Deserialize)]
pub struct TransactionRequest {
    pub sender_public_key: String,
    pub sender_blockchain_address: String,
    pub recipient_blockchain_address: String,
    pub value: f64,
    pub signature: String,
}

/// Response for the pending-transactions endpoint
#[derive(Serialize)]
pub struct PoolResponse {
    pub transactions: Vec<Transaction>,
    pub length: usize,
}

/// Response for the amount endpoint
#[derive(Serialize)]
pub struct AmountResponse {
    pub message: String,
    pub amount: f64,
}

/// Query for the amount endpoint
#[derive(Deserialize)]
pub struct AmountQuery {
    pub blockchain_address: String,
}

/// Response for the wallet endpoint
#[derive(Serialize)]
pub struct WalletResponse {
    pub private_key: String,
    pub public_key: String,
    pub blockchain_address: String,
}

/// Get the full blockchain as `{"chains":[...]}`
pub async fn get_chain(blockchain: BlockchainData) -> impl Responder {
    HttpResponse::Ok().json(blockchain.get_ref())
}

/// Get all pending transactions
pub async fn get_transactions(blockchain: BlockchainData) -> impl Responder {
    let transactions = blockchain.transaction_pool();
    let length = transactions.len();
    HttpResponse::Ok().json(PoolResponse {
        transactions,
        length,
    })
}

/// Submit a signed transaction for admission
pub async fn new_transaction(
    blockchain: BlockchainData,
    request: web::Json<TransactionRequest>,
) -> impl Responder {
    let public_key = match crypto::public_key_from_hex(&request.sender_public_key) {
        Ok(public_key) => public_key,
        Err(err) => {
            warn!("Rejected transaction request: {}", err);
            return HttpResponse::BadRequest().json(status("Failed"));
        }
    };

    let signature = match Signature::from_hex(&request.signature) {
        Ok(signature) => signature,
        Err(err) => {
            warn!("Rejected transaction request: {}", err);
            return HttpResponse::BadRequest().json(status("Failed"));
        }
    };

    let transaction = Transaction::new(
        Address(request.sender_blockchain_address.clone()),
        Address(request.recipient_blockchain_address.clone()),
        request.value,
    );

    match blockchain.add_transaction(transaction, Some(&public_key), Some(&signature)) {
        Ok(()) => HttpResponse::Created().json(status("Success")),
        Err(err) => {
            warn!("Transaction not admitted: {}", err);
            HttpResponse::BadRequest().json(status("Failed"))
        }
    }
}

/// Mine one block: admit the reward transaction, then seal the pool.
/// Blocks the worker until the proof-of-work search finds a nonce.
pub async fn mine(blockchain: BlockchainData) -> impl Responder {
    match blockchain.mine() {
        Ok(_) => HttpResponse::Ok().json(status("Success")),
        Err(err) => {
            error!("Mining failed: {}", err);
            HttpResponse::BadRequest().json(status("Failed"))
        }
    }
}

/// Get the replayed balance of an address
pub async fn get_amount(
    blockchain: BlockchainData,
    query: web::Query<AmountQuery>,
) -> impl Responder {
    let amount = blockchain.calculate_total(&Address(query.blockchain_address.clone()));
    HttpResponse::Ok().json(AmountResponse {
        message: "Success".to_string(),
        amount,
    })
}

/// Create a new wallet and return its key material
pub async fn create_wallet() -> impl Responder {
    match Wallet::new() {
        Ok(wallet) => HttpResponse::Created().json(WalletResponse {
            private_key: wallet.export_private_key(),
            public_key: wallet.public_key_hex(),
            blockchain_address: wallet.address().0.clone(),
        }),
        Err(err) => {
            error!("Failed to create wallet: {}", err);
            HttpResponse::InternalServerError().json(status("Failed"))
        }
    }
}
