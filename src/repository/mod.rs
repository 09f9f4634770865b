//! Repository Module
//!
//! The system of record behind the cache. Route handlers read through the
//! cache and write here; whatever this returns is authoritative.

mod memory;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    AddToCartRequest, Campaign, CartLine, Category, Customer, NewCampaign, Product,
    ProductListQuery, ProductPage, ProductUpdate, UpdateCartItemRequest,
};

pub use memory::InMemoryRepository;

// == Storefront Repository ==
/// Reads and writes against the storefront's system of record.
#[async_trait]
pub trait StorefrontRepository: Send + Sync {
    /// Fails with `NotFound` for unknown ids.
    async fn get_product(&self, id: &str) -> Result<Product>;

    async fn list_products(&self, query: &ProductListQuery) -> Result<ProductPage>;

    async fn update_product(&self, id: &str, update: &ProductUpdate) -> Result<Product>;

    /// Lines of a cart; an unknown cart is empty.
    async fn cart_lines(&self, cart_id: &str) -> Result<Vec<CartLine>>;

    /// Adds to the matching line or appends a new one. Returns the new lines.
    async fn add_cart_line(&self, cart_id: &str, request: &AddToCartRequest)
        -> Result<Vec<CartLine>>;

    /// Sets a line's quantity; zero removes it. Returns the new lines.
    async fn set_cart_quantity(
        &self,
        cart_id: &str,
        request: &UpdateCartItemRequest,
    ) -> Result<Vec<CartLine>>;

    async fn clear_cart(&self, cart_id: &str) -> Result<()>;

    async fn list_campaigns(&self) -> Result<Vec<Campaign>>;

    async fn create_campaign(&self, campaign: &NewCampaign) -> Result<Campaign>;

    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn list_customers(&self) -> Result<Vec<Customer>>;
}
