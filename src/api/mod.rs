// API module
//
// Thin transport shim over the core: parses requests, calls the chain,
// serializes responses. No ledger logic lives here.

pub mod handlers;
pub mod routes;

// Re-export main components for easier access
pub use routes::configure_routes;
