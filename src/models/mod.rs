//! Domain models and request/response DTOs for the storefront API.

pub mod admin;
pub mod cart;
pub mod product;
pub mod requests;
pub mod responses;

pub use admin::{Campaign, Category, Customer};
pub use cart::{CartItem, CartItemsResponse, CartLine, CartView};
pub use product::{Product, ProductListQuery, ProductPage, SortField, SortOrder};
pub use requests::{
    AddToCartRequest, ClearCacheParams, NewCampaign, ProductUpdate, UpdateCartItemRequest,
    MAX_LINE_QUANTITY, MAX_PRICE_UNITS,
};
pub use responses::{ClearCacheResponse, ErrorResponse, HealthResponse, StatsResponse};
