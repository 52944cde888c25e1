use actix_web::web;

use super::handlers;

/// Configures the API routes
///
/// Paths and envelopes follow the original node so existing clients keep
/// working.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(handlers::get_chain))
        .route("/transactions", web::get().to(handlers::get_transactions))
        .route("/transactions", web::post().to(handlers::new_transaction))
        .route("/mine", web::get().to(handlers::mine))
        .route("/amount", web::get().to(handlers::get_amount))
        .route("/wallet", web::post().to(handlers::create_wallet));
}
