//! Client-Side Cart Mirror
//!
//! Keeps the last server-confirmed cart items for a short freshness window so
//! repeated cart reads in the client do not each hit the cart API.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::cache::{system_clock, SharedClock};
use crate::client::CartApi;
use crate::config::Config;
use crate::error::Result;
use crate::models::{AddToCartRequest, CartItem, CartItemsResponse, UpdateCartItemRequest};

/// How long mirrored items are trusted without revalidation.
pub const CACHE_DURATION: Duration = Duration::from_millis(15_000);

// == Cart Snapshot ==
/// Outcome of reading the cart through the mirror.
#[derive(Debug, Clone, PartialEq)]
pub enum CartSnapshot {
    /// Server-confirmed items, either mirrored or freshly fetched
    Items(Vec<CartItem>),
    /// The cart API could not be reached; the cart contents are unknown
    Unavailable(String),
}

impl CartSnapshot {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Items(_))
    }

    /// Items, with an unavailable cart read as empty.
    pub fn into_items(self) -> Vec<CartItem> {
        match self {
            Self::Items(items) => items,
            Self::Unavailable(_) => Vec::new(),
        }
    }
}

#[derive(Debug, Default)]
struct MirrorState {
    items: Option<Vec<CartItem>>,
    last_fetch: u64,
}

// == Cart Mirror ==
/// Mirror of one cart, in front of a [`CartApi`].
///
/// Operations are serialized: a read that has to fetch, or any mutation, holds
/// the mirror until the server has answered, so a read never observes the
/// mirror between a mutation and its update.
#[derive(Debug)]
pub struct CartMirror<A> {
    api: A,
    clock: SharedClock,
    duration: Duration,
    state: Mutex<MirrorState>,
}

impl<A: CartApi> CartMirror<A> {
    /// Creates a mirror with wall-clock time and [`CACHE_DURATION`].
    pub fn new(api: A) -> Self {
        Self::with_clock(api, system_clock(), CACHE_DURATION)
    }

    /// Creates a mirror with wall-clock time and the configured freshness
    /// window.
    pub fn from_config(api: A, config: &Config) -> Self {
        Self::with_clock(api, system_clock(), config.cart_mirror_duration)
    }

    pub fn with_clock(api: A, clock: SharedClock, duration: Duration) -> Self {
        Self {
            api,
            clock,
            duration,
            state: Mutex::new(MirrorState::default()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    // == Load ==
    /// Returns the cart, from the mirror when fresh and not forced, otherwise
    /// from the server.
    ///
    /// A failed fetch drops the mirror and reports [`CartSnapshot::Unavailable`].
    pub async fn load(&self, force_refresh: bool) -> CartSnapshot {
        let mut state = self.state.lock().await;

        if !force_refresh {
            if let Some(items) = self.fresh_items(&state) {
                debug!(count = items.len(), "cart served from mirror");
                return CartSnapshot::Items(items.to_vec());
            }
        }

        match self.api.fetch_cart().await {
            Ok(items) => {
                state.items = Some(items.clone());
                state.last_fetch = self.clock.now_ms();
                debug!(count = items.len(), "cart mirror refreshed");
                CartSnapshot::Items(items)
            }
            Err(err) => {
                warn!(error = %err, "cart fetch failed");
                Self::clear(&mut state);
                CartSnapshot::Unavailable(err.to_string())
            }
        }
    }

    // == Get Cart Items ==
    /// Returns the cart items; an unreachable cart API reads as an empty cart.
    pub async fn get_cart_items(&self, force_refresh: bool) -> Vec<CartItem> {
        self.load(force_refresh).await.into_items()
    }

    /// Mirrored items if they are still fresh, without contacting the server.
    pub async fn mirrored_items(&self) -> Option<Vec<CartItem>> {
        let state = self.state.lock().await;
        self.fresh_items(&state).map(<[CartItem]>::to_vec)
    }

    // == Mutations ==
    pub async fn add_to_cart(&self, request: &AddToCartRequest) -> Result<CartItemsResponse> {
        let mut state = self.state.lock().await;
        let result = self.api.add_item(request).await;
        self.settle(&mut state, result)
    }

    pub async fn update_cart_item(
        &self,
        request: &UpdateCartItemRequest,
    ) -> Result<CartItemsResponse> {
        let mut state = self.state.lock().await;
        let result = self.api.update_item(request).await;
        self.settle(&mut state, result)
    }

    /// Removes a line by setting its quantity to zero.
    pub async fn remove_from_cart(
        &self,
        product_id: &str,
        color_id: Option<&str>,
        size_id: Option<&str>,
    ) -> Result<CartItemsResponse> {
        self.update_cart_item(&UpdateCartItemRequest {
            product_id: product_id.to_string(),
            quantity: 0,
            color_id: color_id.map(str::to_string),
            size_id: size_id.map(str::to_string),
        })
        .await
    }

    pub async fn clear_cart(&self) -> Result<CartItemsResponse> {
        let mut state = self.state.lock().await;
        let result = self.api.clear().await;
        self.settle(&mut state, result)
    }

    /// Forgets the mirrored items; the next read goes to the server.
    pub async fn invalidate(&self) {
        let mut state = self.state.lock().await;
        Self::clear(&mut state);
    }

    // == Internals ==
    fn fresh_items<'a>(&self, state: &'a MirrorState) -> Option<&'a [CartItem]> {
        let items = state.items.as_deref()?;
        let age = self.clock.now_ms().saturating_sub(state.last_fetch);
        (u128::from(age) < self.duration.as_millis()).then_some(items)
    }

    /// Applies a mutation's outcome: adopt returned items, otherwise drop the
    /// mirror. Errors are returned unchanged.
    fn settle(
        &self,
        state: &mut MutexGuard<'_, MirrorState>,
        result: Result<CartItemsResponse>,
    ) -> Result<CartItemsResponse> {
        match &result {
            Ok(CartItemsResponse { items: Some(items) }) => {
                state.items = Some(items.clone());
                state.last_fetch = self.clock.now_ms();
            }
            Ok(CartItemsResponse { items: None }) => Self::clear(state),
            Err(err) => {
                debug!(error = %err, "cart mutation failed, dropping mirror");
                Self::clear(state);
            }
        }
        result
    }

    fn clear(state: &mut MirrorState) {
        state.items = None;
        state.last_fetch = 0;
    }
}

/// A mirror shared between tasks.
pub type SharedCartMirror<A> = Arc<CartMirror<A>>;

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::ManualClock;
    use crate::error::AppError;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio_test::assert_ok;

    /// In-process cart API that counts fetches.
    #[derive(Debug, Default)]
    struct FakeCartApi {
        items: StdMutex<Vec<CartItem>>,
        fetches: AtomicUsize,
        fail: AtomicBool,
        omit_items: AtomicBool,
    }

    impl FakeCartApi {
        fn fetches(&self) -> usize {
            self.fetches.load(Ordering::SeqCst)
        }

        fn respond(&self) -> Result<CartItemsResponse> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Internal("connection refused".into()));
            }
            if self.omit_items.load(Ordering::SeqCst) {
                return Ok(CartItemsResponse::default());
            }
            Ok(CartItemsResponse::with_items(self.items.lock().unwrap().clone()))
        }
    }

    fn item(product_id: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: product_id.to_string(),
            name: format!("Product {product_id}"),
            unit_price: Decimal::from(10),
            quantity,
            color_id: None,
            size_id: None,
            line_total: Decimal::from(10 * quantity),
        }
    }

    #[async_trait]
    impl CartApi for FakeCartApi {
        async fn fetch_cart(&self) -> Result<Vec<CartItem>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(AppError::Internal("connection refused".into()));
            }
            Ok(self.items.lock().unwrap().clone())
        }

        async fn add_item(&self, request: &AddToCartRequest) -> Result<CartItemsResponse> {
            if !self.fail.load(Ordering::SeqCst) {
                let mut items = self.items.lock().unwrap();
                match items.iter_mut().find(|i| i.product_id == request.product_id) {
                    Some(existing) => existing.quantity += request.quantity,
                    None => items.push(item(&request.product_id, request.quantity)),
                }
            }
            self.respond()
        }

        async fn update_item(&self, request: &UpdateCartItemRequest) -> Result<CartItemsResponse> {
            if !self.fail.load(Ordering::SeqCst) {
                let mut items = self.items.lock().unwrap();
                items.retain(|i| i.product_id != request.product_id || request.quantity > 0);
                if let Some(existing) = items.iter_mut().find(|i| i.product_id == request.product_id) {
                    existing.quantity = request.quantity;
                }
            }
            self.respond()
        }

        async fn clear(&self) -> Result<CartItemsResponse> {
            self.items.lock().unwrap().clear();
            self.respond()
        }
    }

    fn mirror() -> (CartMirror<FakeCartApi>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let mirror = CartMirror::with_clock(FakeCartApi::default(), clock.clone(), CACHE_DURATION);
        (mirror, clock)
    }

    fn add(product_id: &str, quantity: u32) -> AddToCartRequest {
        AddToCartRequest {
            product_id: product_id.to_string(),
            quantity,
            color_id: None,
            size_id: None,
        }
    }

    #[tokio::test]
    async fn test_two_reads_in_window_fetch_once() {
        let (mirror, clock) = mirror();
        mirror.api().items.lock().unwrap().push(item("p1", 1));

        let first = mirror.get_cart_items(false).await;
        clock.advance(Duration::from_millis(14_999));
        let second = mirror.get_cart_items(false).await;

        assert_eq!(first, second);
        assert_eq!(mirror.api().fetches(), 1);
    }

    #[tokio::test]
    async fn test_read_after_window_refetches() {
        let (mirror, clock) = mirror();

        mirror.get_cart_items(false).await;
        clock.advance(CACHE_DURATION);
        mirror.get_cart_items(false).await;

        assert_eq!(mirror.api().fetches(), 2);
    }

    #[tokio::test]
    async fn test_force_refresh_always_fetches() {
        let (mirror, _) = mirror();

        mirror.get_cart_items(false).await;
        mirror.get_cart_items(true).await;
        mirror.get_cart_items(true).await;

        assert_eq!(mirror.api().fetches(), 3);
    }

    #[tokio::test]
    async fn test_add_adopts_returned_items_without_refetch() {
        let (mirror, clock) = mirror();
        mirror.get_cart_items(false).await;

        assert_ok!(mirror.add_to_cart(&add("p1", 2)).await);
        assert_ok!(mirror.add_to_cart(&add("p1", 1)).await);
        clock.advance(Duration::from_secs(10));
        let items = mirror.get_cart_items(false).await;

        assert_eq!(mirror.api().fetches(), 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_mutation_restarts_freshness_window() {
        let (mirror, clock) = mirror();
        mirror.get_cart_items(false).await;

        clock.advance(Duration::from_secs(14));
        assert_ok!(mirror.add_to_cart(&add("p1", 1)).await);
        clock.advance(Duration::from_secs(14));

        assert!(mirror.mirrored_items().await.is_some());
        mirror.get_cart_items(false).await;
        assert_eq!(mirror.api().fetches(), 1);
    }

    #[tokio::test]
    async fn test_mutation_without_items_invalidates() {
        let (mirror, _) = mirror();
        mirror.get_cart_items(false).await;
        mirror.api().omit_items.store(true, Ordering::SeqCst);

        assert_ok!(mirror.add_to_cart(&add("p1", 1)).await);
        assert!(mirror.mirrored_items().await.is_none());

        let items = mirror.get_cart_items(false).await;
        assert_eq!(mirror.api().fetches(), 2);
        assert_eq!(items[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (mirror, _) = mirror();
        assert_ok!(mirror.add_to_cart(&add("p1", 1)).await);
        assert_ok!(mirror.add_to_cart(&add("p2", 1)).await);

        assert_ok!(mirror.remove_from_cart("p1", None, None).await);
        let items = mirror.get_cart_items(false).await;
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p2");

        assert_ok!(mirror.clear_cart().await);
        assert!(mirror.get_cart_items(false).await.is_empty());
        assert_eq!(mirror.api().fetches(), 0);
    }

    #[tokio::test]
    async fn test_fetch_failure_reads_as_empty() {
        let (mirror, _) = mirror();
        mirror.api().fail.store(true, Ordering::SeqCst);

        assert!(mirror.get_cart_items(false).await.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_failure_is_distinguishable_through_load() {
        let (mirror, _) = mirror();
        mirror.api().fail.store(true, Ordering::SeqCst);

        let snapshot = mirror.load(false).await;
        assert!(!snapshot.is_available());
        assert!(matches!(snapshot, CartSnapshot::Unavailable(msg) if msg.contains("connection refused")));

        mirror.api().fail.store(false, Ordering::SeqCst);
        assert_eq!(mirror.load(false).await, CartSnapshot::Items(vec![]));
    }

    #[tokio::test]
    async fn test_failed_mutation_propagates_and_invalidates() {
        let (mirror, _) = mirror();
        mirror.get_cart_items(false).await;
        mirror.api().fail.store(true, Ordering::SeqCst);

        let result = mirror.add_to_cart(&add("p1", 1)).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(mirror.mirrored_items().await.is_none());
    }

    #[tokio::test]
    async fn test_explicit_invalidate() {
        let (mirror, _) = mirror();
        mirror.get_cart_items(false).await;

        mirror.invalidate().await;
        mirror.get_cart_items(false).await;

        assert_eq!(mirror.api().fetches(), 2);
    }
}
