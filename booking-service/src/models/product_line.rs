//! Menu/add-on product line model.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A purchased add-on product attached to a booking.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProductLine {
    pub product_line_id: Uuid,
    pub booking_id: Uuid,
    pub menu_item_id: Uuid,
    pub menu_item_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub parameter_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
    pub created_utc: DateTime<Utc>,
}

impl ProductLine {
    /// Pre-discount subtotal for this product line.
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Input for attaching a product line to a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub parameter_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}

/// A priced product line ready to persist with its booking, in the same
/// transaction.
#[derive(Debug, Clone)]
pub struct NewProductLine {
    pub menu_item_id: Uuid,
    pub menu_item_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub discount_amount: Decimal,
    pub parameter_id: Option<Uuid>,
    pub metadata: Option<serde_json::Value>,
}
