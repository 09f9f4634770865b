//! API Handlers
//!
//! HTTP request handlers. Read handlers go through the response cache; write
//! handlers update the repository and then invalidate what the write made
//! stale.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, RawQuery, State},
    http::StatusCode,
    Json,
};
use tracing::{debug, warn};

use crate::cache::{invalidation, system_clock, AdminCache, CacheKey, Invalidation, SharedCache};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::models::{
    AddToCartRequest, Campaign, CartItem, CartItemsResponse, CartLine, CartView, Category,
    ClearCacheParams, ClearCacheResponse, Customer, HealthResponse, NewCampaign, Product,
    ProductListQuery, ProductPage, ProductUpdate, StatsResponse, UpdateCartItemRequest,
};
use crate::repository::StorefrontRepository;

/// Admin endpoint names, also their cache identities.
pub const CAMPAIGNS: &str = "campaigns";
pub const CATEGORIES: &str = "categories";
pub const CUSTOMERS: &str = "customers";

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide response cache
    pub cache: SharedCache,
    /// `admin:` facade over the same cache
    pub admin: AdminCache,
    /// System of record
    pub repo: Arc<dyn StorefrontRepository>,
    /// TTLs and invalidation policy
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates a new AppState around an existing cache.
    pub fn new(repo: Arc<dyn StorefrontRepository>, cache: SharedCache, config: Config) -> Self {
        Self {
            admin: AdminCache::with_ttl(cache.clone(), config.admin_ttl),
            cache,
            repo,
            config: Arc::new(config),
        }
    }

    /// Creates a new AppState with a fresh wall-clock cache sized from
    /// configuration.
    pub fn from_config(config: &Config, repo: Arc<dyn StorefrontRepository>) -> Self {
        let cache = SharedCache::from_config(config, system_clock());
        Self::new(repo, cache, config.clone())
    }
}

// == Shared Read Paths ==
async fn cached_product(state: &AppState, id: &str) -> Result<Product> {
    let key = CacheKey::product(id).to_string();
    state
        .cache
        .get_or_fetch(&key, state.config.product_ttl, || state.repo.get_product(id))
        .await
}

/// Prices cart lines with current product data. Lines whose product no
/// longer exists are left out.
async fn price_lines(state: &AppState, lines: &[CartLine]) -> Result<Vec<CartItem>> {
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let product = match cached_product(state, &line.product_id).await {
            Ok(product) => product,
            Err(AppError::NotFound(what)) => {
                warn!(cart_line = %line.product_id, "skipping cart line: {what}");
                continue;
            }
            Err(err) => return Err(err),
        };
        items.push(CartItem {
            line_total: CartItem::line_total_for(product.price, line.quantity)?,
            product_id: product.id,
            name: product.name,
            unit_price: product.price,
            quantity: line.quantity,
            color_id: line.color_id.clone(),
            size_id: line.size_id.clone(),
        });
    }
    Ok(items)
}

/// Drops every cached snapshot of `cart_id` after a cart write.
async fn invalidate_cart(state: &AppState, cart_id: &str) {
    let removed = state.cache.invalidate(&Invalidation::cart(cart_id)).await;
    debug!(cart_id, removed, "cart cache invalidated");
}

// == Products ==
/// Handler for GET /products/:id
pub async fn get_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Product>> {
    cached_product(&state, &id).await.map(Json)
}

/// Handler for GET /products
///
/// Repeated `category` / `color` parameters select several values.
pub async fn list_products_handler(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ProductPage>> {
    let query = ProductListQuery::from_query_string(raw.as_deref().unwrap_or_default())?;
    let key = CacheKey::product_list(&query).to_string();

    state
        .cache
        .get_or_fetch(&key, state.config.product_list_ttl, || {
            state.repo.list_products(&query)
        })
        .await
        .map(Json)
}

/// Handler for PATCH /products/:id
pub async fn update_product_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ProductUpdate>,
) -> Result<Json<Product>> {
    if let Some(error_msg) = update.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let product = state.repo.update_product(&id, &update).await?;

    let include_lists = state.config.invalidate_lists_on_product_write;
    let removed = state
        .cache
        .invalidate_all(&invalidation::for_product_write(&id, include_lists))
        .await;
    debug!(product_id = %id, include_lists, removed, "product cache invalidated");

    Ok(Json(product))
}

// == Cart ==
/// Handler for GET /cart/:cart_id
///
/// The raw lines are always read; the priced snapshot is cached per exact
/// cart contents.
pub async fn get_cart_handler(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartView>> {
    let lines = state.repo.cart_lines(&cart_id).await?;
    let key = CacheKey::cart(&cart_id, &lines).to_string();

    state
        .cache
        .get_or_fetch(&key, state.config.cart_ttl, || async {
            let items = price_lines(&state, &lines).await?;
            CartView::new(cart_id.as_str(), items)
        })
        .await
        .map(Json)
}

/// Handler for POST /cart/:cart_id/items
pub async fn add_cart_item_handler(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<CartItemsResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let lines = state.repo.add_cart_line(&cart_id, &req).await?;
    invalidate_cart(&state, &cart_id).await;

    let items = price_lines(&state, &lines).await?;
    Ok(Json(CartItemsResponse::with_items(items)))
}

/// Handler for PATCH /cart/:cart_id/items
///
/// A quantity of zero removes the line.
pub async fn update_cart_item_handler(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
    Json(req): Json<UpdateCartItemRequest>,
) -> Result<Json<CartItemsResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let lines = state.repo.set_cart_quantity(&cart_id, &req).await?;
    invalidate_cart(&state, &cart_id).await;

    let items = price_lines(&state, &lines).await?;
    Ok(Json(CartItemsResponse::with_items(items)))
}

/// Handler for DELETE /cart/:cart_id
pub async fn clear_cart_handler(
    State(state): State<AppState>,
    Path(cart_id): Path<String>,
) -> Result<Json<CartItemsResponse>> {
    state.repo.clear_cart(&cart_id).await?;
    invalidate_cart(&state, &cart_id).await;

    Ok(Json(CartItemsResponse::with_items(Vec::new())))
}

// == Admin ==
/// Handler for GET /admin/campaigns
pub async fn list_campaigns_handler(State(state): State<AppState>) -> Result<Json<Vec<Campaign>>> {
    state
        .admin
        .get_or_fetch(CAMPAIGNS, || state.repo.list_campaigns())
        .await
        .map(Json)
}

/// Handler for POST /admin/campaigns
pub async fn create_campaign_handler(
    State(state): State<AppState>,
    Json(req): Json<NewCampaign>,
) -> Result<(StatusCode, Json<Campaign>)> {
    if let Some(error_msg) = req.validate() {
        return Err(AppError::InvalidRequest(error_msg));
    }

    let campaign = state.repo.create_campaign(&req).await?;
    state.admin.clear_admin_cache(Some(CAMPAIGNS)).await;

    Ok((StatusCode::CREATED, Json(campaign)))
}

/// Handler for GET /admin/categories
pub async fn list_categories_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>> {
    state
        .admin
        .get_or_fetch(CATEGORIES, || state.repo.list_categories())
        .await
        .map(Json)
}

/// Handler for GET /admin/customers
pub async fn list_customers_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<Customer>>> {
    state
        .admin
        .get_or_fetch(CUSTOMERS, || state.repo.list_customers())
        .await
        .map(Json)
}

// == Cache Maintenance ==
/// Handler for GET /cache/stats
pub async fn cache_stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.cache.stats().await.into())
}

/// Handler for DELETE /cache
///
/// Without `pattern` every entry is dropped. An empty pattern is rejected
/// rather than read as "everything".
pub async fn clear_cache_handler(
    State(state): State<AppState>,
    Query(params): Query<ClearCacheParams>,
) -> Result<Json<ClearCacheResponse>> {
    if params.pattern.as_deref() == Some("") {
        return Err(AppError::InvalidRequest(
            "Pattern cannot be empty; omit it to clear everything".to_string(),
        ));
    }

    let removed = state.cache.clear_cache(params.pattern.as_deref()).await;
    Ok(Json(ClearCacheResponse {
        pattern: params.pattern,
        removed,
    }))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
