//! API Module
//!
//! HTTP handlers and routing for the storefront API. Reads go through the
//! response cache; writes invalidate it.

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
