//! Request DTOs for the storefront API
//!
//! Defines the structure of incoming HTTP request bodies.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body for `PATCH /products/:id`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl ProductUpdate {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.name.is_none() && self.price.is_none() && self.stock.is_none() {
            return Some("Update must change at least one field".to_string());
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Some("Name cannot be empty".to_string());
        }
        if self.price.is_some_and(|p| p.is_sign_negative()) {
            return Some("Price cannot be negative".to_string());
        }
        if self.price.is_some_and(|p| p > Decimal::from(MAX_PRICE_UNITS)) {
            return Some(format!("Price cannot exceed {MAX_PRICE_UNITS}"));
        }
        None
    }
}

/// Upper bound for the quantity of a single cart line.
pub const MAX_LINE_QUANTITY: u32 = 999;

/// Upper bound for a product price.
pub const MAX_PRICE_UNITS: i64 = 1_000_000_000;

/// Request body for `POST /cart/:cart_id/items`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub size_id: Option<String>,
}

impl AddToCartRequest {
    pub fn validate(&self) -> Option<String> {
        if self.product_id.is_empty() {
            return Some("Product id cannot be empty".to_string());
        }
        if self.quantity == 0 {
            return Some("Quantity must be at least 1".to_string());
        }
        if self.quantity > MAX_LINE_QUANTITY {
            return Some(format!("Quantity cannot exceed {MAX_LINE_QUANTITY}"));
        }
        None
    }
}

/// Request body for `PATCH /cart/:cart_id/items`. A quantity of zero removes
/// the line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub size_id: Option<String>,
}

impl UpdateCartItemRequest {
    pub fn validate(&self) -> Option<String> {
        if self.product_id.is_empty() {
            return Some("Product id cannot be empty".to_string());
        }
        if self.quantity > MAX_LINE_QUANTITY {
            return Some(format!("Quantity cannot exceed {MAX_LINE_QUANTITY}"));
        }
        None
    }
}

/// Request body for `POST /admin/campaigns`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCampaign {
    pub name: String,
    pub discount_percent: u8,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
}

impl NewCampaign {
    pub fn validate(&self) -> Option<String> {
        if self.name.trim().is_empty() {
            return Some("Campaign name cannot be empty".to_string());
        }
        if self.discount_percent == 0 || self.discount_percent > 100 {
            return Some("Discount must be between 1 and 100 percent".to_string());
        }
        if let (Some(start), Some(end)) = (self.starts_at, self.ends_at) {
            if end <= start {
                return Some("Campaign must end after it starts".to_string());
            }
        }
        None
    }
}

/// Query parameters for `DELETE /cache`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClearCacheParams {
    #[serde(default)]
    pub pattern: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_to_cart_deserialize() {
        let json = r#"{"productId": "p1", "quantity": 2, "colorId": "red"}"#;
        let req: AddToCartRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.product_id, "p1");
        assert_eq!(req.color_id.as_deref(), Some("red"));
        assert!(req.size_id.is_none());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_add_to_cart_zero_quantity_is_invalid() {
        let req = AddToCartRequest {
            product_id: "p1".into(),
            quantity: 0,
            color_id: None,
            size_id: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_cart_quantities_are_bounded() {
        let add = AddToCartRequest {
            product_id: "p1".into(),
            quantity: MAX_LINE_QUANTITY + 1,
            color_id: None,
            size_id: None,
        };
        assert!(add.validate().is_some());

        let update = UpdateCartItemRequest {
            product_id: "p1".into(),
            quantity: u32::MAX,
            color_id: None,
            size_id: None,
        };
        assert!(update.validate().is_some());
    }

    #[test]
    fn test_update_allows_zero_quantity() {
        let req = UpdateCartItemRequest {
            product_id: "p1".into(),
            quantity: 0,
            color_id: None,
            size_id: None,
        };
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_product_update_validation() {
        assert!(ProductUpdate::default().validate().is_some());
        let negative = ProductUpdate {
            price: Some(Decimal::from(-1)),
            ..Default::default()
        };
        assert!(negative.validate().is_some());
        let huge = ProductUpdate {
            price: Some(Decimal::MAX),
            ..Default::default()
        };
        assert!(huge.validate().is_some());
        let ok = ProductUpdate {
            stock: Some(4),
            ..Default::default()
        };
        assert!(ok.validate().is_none());
    }

    #[test]
    fn test_new_campaign_validation() {
        let json = r#"{"name": "Spring sale", "discountPercent": 20}"#;
        let campaign: NewCampaign = serde_json::from_str(json).unwrap();
        assert!(campaign.validate().is_none());

        let too_much = NewCampaign {
            discount_percent: 120,
            ..campaign
        };
        assert!(too_much.validate().is_some());
    }
}
