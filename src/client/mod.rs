//! Client Module
//!
//! The cart side of the storefront client: a transport to the cart endpoints
//! and a short-lived mirror of the current cart in front of it.

mod api;
mod mirror;

pub use api::{CartApi, HttpCartApi};
pub use mirror::{CartMirror, CartSnapshot, SharedCartMirror, CACHE_DURATION};
