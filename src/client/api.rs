//! Cart API transport used by the client-side mirror.

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{AddToCartRequest, CartItem, CartItemsResponse, UpdateCartItemRequest};

// == Cart API ==
/// Calls the server's cart endpoints for one cart.
#[async_trait]
pub trait CartApi: Send + Sync {
    /// Reads the current cart items.
    async fn fetch_cart(&self) -> Result<Vec<CartItem>>;

    async fn add_item(&self, request: &AddToCartRequest) -> Result<CartItemsResponse>;

    async fn update_item(&self, request: &UpdateCartItemRequest) -> Result<CartItemsResponse>;

    async fn clear(&self) -> Result<CartItemsResponse>;
}

// == HTTP Cart API ==
/// [`CartApi`] over HTTP with reqwest.
#[derive(Debug, Clone)]
pub struct HttpCartApi {
    client: Client,
    cart_url: Url,
    items_url: Url,
}

impl HttpCartApi {
    /// Targets `{base_url}/cart/{cart_id}`.
    pub fn new(base_url: &str, cart_id: &str) -> Result<Self> {
        Self::with_client(Client::new(), base_url, cart_id)
    }

    pub fn with_client(client: Client, base_url: &str, cart_id: &str) -> Result<Self> {
        let mut cart_url = Url::parse(base_url)
            .map_err(|e| AppError::InvalidRequest(format!("Invalid cart API URL {base_url}: {e}")))?;
        cart_url
            .path_segments_mut()
            .map_err(|_| AppError::InvalidRequest(format!("Cart API URL cannot be a base: {base_url}")))?
            .pop_if_empty()
            .push("cart")
            .push(cart_id);

        let mut items_url = cart_url.clone();
        if let Ok(mut segments) = items_url.path_segments_mut() {
            segments.push("items");
        }

        Ok(Self {
            client,
            cart_url,
            items_url,
        })
    }

    pub fn cart_url(&self) -> &Url {
        &self.cart_url
    }

    async fn decode(response: reqwest::Response) -> Result<CartItemsResponse> {
        let response = response.error_for_status()?;
        Ok(response.json::<CartItemsResponse>().await?)
    }
}

#[async_trait]
impl CartApi for HttpCartApi {
    async fn fetch_cart(&self) -> Result<Vec<CartItem>> {
        debug!(url = %self.cart_url, "fetching cart");
        let response = self.client.get(self.cart_url.clone()).send().await?;
        Ok(Self::decode(response).await?.items.unwrap_or_default())
    }

    async fn add_item(&self, request: &AddToCartRequest) -> Result<CartItemsResponse> {
        let response = self
            .client
            .post(self.items_url.clone())
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn update_item(&self, request: &UpdateCartItemRequest) -> Result<CartItemsResponse> {
        let response = self
            .client
            .patch(self.items_url.clone())
            .json(request)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn clear(&self) -> Result<CartItemsResponse> {
        let response = self.client.delete(self.cart_url.clone()).send().await?;
        Self::decode(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_are_built_from_base() {
        let api = HttpCartApi::new("http://localhost:3000/", "c 1").unwrap();
        assert_eq!(api.cart_url.as_str(), "http://localhost:3000/cart/c%201");
        assert_eq!(api.items_url.as_str(), "http://localhost:3000/cart/c%201/items");
    }

    #[test]
    fn test_base_path_is_kept() {
        let api = HttpCartApi::new("http://shop.test/api", "c1").unwrap();
        assert_eq!(api.cart_url().as_str(), "http://shop.test/api/cart/c1");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            HttpCartApi::new("not a url", "c1"),
            Err(AppError::InvalidRequest(_))
        ));
        assert!(matches!(
            HttpCartApi::new("mailto:shop@example.com", "c1"),
            Err(AppError::InvalidRequest(_))
        ));
    }
}
