//! Accommodation line model (one unit within a booking).

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// How an item's configured unit price applies across the stay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingRate {
    PerNight,
    PerStay,
    PerHour,
}

impl PricingRate {
    pub fn as_str(&self) -> &'static str {
        match self {
            PricingRate::PerNight => "per_night",
            PricingRate::PerStay => "per_stay",
            PricingRate::PerHour => "per_hour",
        }
    }

    /// Unknown modes fall back to `per_night`; the caller logs the fallback.
    pub fn from_string(s: &str) -> Self {
        match s {
            "per_stay" => PricingRate::PerStay,
            "per_hour" => PricingRate::PerHour,
            _ => PricingRate::PerNight,
        }
    }
}

/// One accommodation unit reserved within a booking. Owned by the booking,
/// cascade-deleted with it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AccommodationLine {
    pub line_id: Uuid,
    pub booking_id: Uuid,
    pub item_id: Uuid,
    pub item_name: String,
    pub category_id: Option<Uuid>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub nights: i32,
    /// Pre-discount subtotal for this line.
    pub subtotal: Decimal,
    pub voucher_id: Option<Uuid>,
    pub voucher_code: Option<String>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub discount_amount: Decimal,
    pub sort_order: i32,
    pub created_utc: DateTime<Utc>,
}

/// Input for adding an accommodation line to a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAccommodationLine {
    pub item_id: Uuid,
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub voucher_code: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

/// A priced accommodation line ready to persist with its booking, in the
/// same transaction. The voucher fields snapshot the applied voucher's
/// terms so the line keeps them even if the voucher later changes.
#[derive(Debug, Clone)]
pub struct NewAccommodationLine {
    pub item_id: Uuid,
    pub item_name: String,
    pub category_id: Option<Uuid>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub subtotal: Decimal,
    pub voucher_id: Option<Uuid>,
    pub voucher_code: Option<String>,
    pub discount_type: Option<String>,
    pub discount_value: Option<Decimal>,
    pub discount_amount: Decimal,
    pub sort_order: i32,
}

/// The priceable view of an accommodation item, joined from the catalog:
/// per-guest-parameter unit prices plus the pricing-rate mode.
#[derive(Debug, Clone)]
pub struct PriceableItem {
    pub item_id: Uuid,
    pub item_name: String,
    pub category_id: Option<Uuid>,
    pub pricing_rate: String,
    /// Guest-parameter key to unit price (one price per configured guest type).
    pub parameter_prices: Vec<(String, Decimal)>,
}
