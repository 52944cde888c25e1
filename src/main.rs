use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use log::info;

use minichain::api;
use minichain::blockchain::{Blockchain, Wallet};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // The node owns a miner wallet; rewards for sealed blocks go to it.
    let miner_wallet = Wallet::new().map_err(std::io::Error::other)?;
    info!("Miner private key: {}", miner_wallet.export_private_key());
    info!("Miner public key: {}", miner_wallet.public_key_hex());
    info!("Miner blockchain address: {}", miner_wallet.address());

    let blockchain =
        Blockchain::new(miner_wallet.address().clone()).map_err(std::io::Error::other)?;
    let blockchain = web::Data::new(blockchain);

    info!("Starting HTTP server at http://127.0.0.1:8080");

    HttpServer::new(move || {
        // Configure CORS
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(blockchain.clone())
            .configure(api::configure_routes)
    })
    .bind(("127.0.0.1", 8080))?
    .run()
    .await
}
