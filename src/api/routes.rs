//! API Routes
//!
//! Configures the Axum router with all storefront endpoints.

use axum::{
    routing::{delete, get, patch},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    add_cart_item_handler, cache_stats_handler, clear_cache_handler, clear_cart_handler,
    create_campaign_handler, get_cart_handler, get_product_handler, health_handler,
    list_campaigns_handler, list_categories_handler, list_customers_handler,
    list_products_handler, update_cart_item_handler, update_product_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /health` - Health check
/// - `GET /products`, `GET|PATCH /products/:id` - Catalog reads and writes
/// - `GET|DELETE /cart/:cart_id`, `POST|PATCH /cart/:cart_id/items` - Cart
/// - `GET /admin/{campaigns,categories,customers}`, `POST /admin/campaigns` - Back office
/// - `GET /cache/stats`, `DELETE /cache` - Cache maintenance
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/products", get(list_products_handler))
        .route(
            "/products/:id",
            get(get_product_handler).patch(update_product_handler),
        )
        .route(
            "/cart/:cart_id",
            get(get_cart_handler).delete(clear_cart_handler),
        )
        .route(
            "/cart/:cart_id/items",
            patch(update_cart_item_handler).post(add_cart_item_handler),
        )
        .route(
            "/admin/campaigns",
            get(list_campaigns_handler).post(create_campaign_handler),
        )
        .route("/admin/categories", get(list_categories_handler))
        .route("/admin/customers", get(list_customers_handler))
        .route("/cache/stats", get(cache_stats_handler))
        .route("/cache", delete(clear_cache_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
