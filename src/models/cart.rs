//! Cart models shared by the server routes and the client-side mirror.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// A raw cart line as stored in the system of record.
///
/// A line is identified by its product together with the chosen color and
/// size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub size_id: Option<String>,
}

impl CartLine {
    /// Whether `other` refers to the same product variant.
    pub fn same_variant(&self, product_id: &str, color_id: Option<&str>, size_id: Option<&str>) -> bool {
        self.product_id == product_id
            && self.color_id.as_deref() == color_id
            && self.size_id.as_deref() == size_id
    }
}

/// A cart line enriched with product details, as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub name: String,
    pub unit_price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub color_id: Option<String>,
    #[serde(default)]
    pub size_id: Option<String>,
    pub line_total: Decimal,
}

/// A priced snapshot of one cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub cart_id: String,
    pub items: Vec<CartItem>,
    pub item_count: u64,
    pub subtotal: Decimal,
}

impl CartView {
    /// Totals `items`. Fails if the subtotal does not fit a `Decimal`.
    pub fn new(cart_id: impl Into<String>, items: Vec<CartItem>) -> Result<Self> {
        let item_count = items.iter().map(|item| u64::from(item.quantity)).sum();
        let subtotal = items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.line_total))
            .ok_or_else(|| AppError::Internal("cart subtotal overflows".to_string()))?;
        Ok(Self {
            cart_id: cart_id.into(),
            items,
            item_count,
            subtotal,
        })
    }
}

impl CartItem {
    /// `unit_price * quantity`, or an error if it does not fit a `Decimal`.
    pub fn line_total_for(unit_price: Decimal, quantity: u32) -> Result<Decimal> {
        unit_price
            .checked_mul(Decimal::from(quantity))
            .ok_or_else(|| AppError::Internal("cart line total overflows".to_string()))
    }
}

/// Body returned by cart reads and mutations: `{ "items": [...] }`.
///
/// `items` is optional on the wire; a mutation that does not echo the cart
/// leaves it out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CartItemsResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<CartItem>>,
}

impl CartItemsResponse {
    pub fn with_items(items: Vec<CartItem>) -> Self {
        Self { items: Some(items) }
    }
}
