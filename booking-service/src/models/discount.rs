//! Discount and voucher model.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Promotional rule category. Vouchers require a unique redemption code;
/// plain discounts apply without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountKind {
    Discount,
    Voucher,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Discount => "discount",
            DiscountKind::Voucher => "voucher",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "voucher" => DiscountKind::Voucher,
            _ => DiscountKind::Discount,
        }
    }
}

/// Percentage of the base, or a fixed amount off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::FixedAmount => "fixed_amount",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "fixed_amount" => DiscountType::FixedAmount,
            _ => DiscountType::Percentage,
        }
    }
}

/// Which base a discount applies against. Before-tax and after-tax booking
/// scopes are mutually exclusive per discount and are never summed into the
/// same base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountScope {
    PerItem,
    PerBookingBeforeTax,
    PerBookingAfterTax,
}

impl DiscountScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountScope::PerItem => "per_item",
            DiscountScope::PerBookingBeforeTax => "per_booking_before_tax",
            DiscountScope::PerBookingAfterTax => "per_booking_after_tax",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "per_booking_before_tax" => DiscountScope::PerBookingBeforeTax,
            "per_booking_after_tax" => DiscountScope::PerBookingAfterTax,
            _ => DiscountScope::PerItem,
        }
    }
}

/// Discount/voucher row.
///
/// At most one applicability dimension (`zone_ids`, `item_type_ids`,
/// `product_ids`) is populated; all three empty means "applies to all".
/// The exclusivity is enforced at validation time, not by the schema.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Discount {
    pub discount_id: Uuid,
    pub kind: String,
    pub code: Option<String>,
    pub name: String,
    pub discount_type: String,
    pub value: Decimal,
    /// Cap on the computed amount; percentage type only.
    pub max_discount_amount: Option<Decimal>,
    pub scope: String,
    pub zone_ids: Option<Vec<Uuid>>,
    pub item_type_ids: Option<Vec<Uuid>>,
    pub product_ids: Option<Vec<Uuid>>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub usage_limit: Option<i32>,
    pub per_customer_limit: Option<i32>,
    pub usage_count: i32,
    pub min_order_amount: Option<Decimal>,
    /// ISO weekday numbers (1 = Monday .. 7 = Sunday) the rule is active on;
    /// empty or null means every day.
    pub weekdays: Option<Vec<i16>>,
    pub priority: i32,
    pub active: bool,
    pub created_utc: DateTime<Utc>,
}

impl Discount {
    pub fn kind(&self) -> DiscountKind {
        DiscountKind::from_string(&self.kind)
    }

    pub fn discount_type(&self) -> DiscountType {
        DiscountType::from_string(&self.discount_type)
    }

    pub fn scope(&self) -> DiscountScope {
        DiscountScope::from_string(&self.scope)
    }
}

fn has_ids(ids: &Option<Vec<Uuid>>) -> bool {
    ids.as_ref().is_some_and(|v| !v.is_empty())
}

/// Input for creating a discount or voucher.
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = validate_discount_shape))]
pub struct CreateDiscountRequest {
    pub kind: DiscountKind,
    #[validate(length(min = 3, max = 64))]
    pub code: Option<String>,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    pub discount_type: DiscountType,
    pub value: Decimal,
    pub max_discount_amount: Option<Decimal>,
    pub scope: DiscountScope,
    pub zone_ids: Option<Vec<Uuid>>,
    pub item_type_ids: Option<Vec<Uuid>>,
    pub product_ids: Option<Vec<Uuid>>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    #[validate(range(min = 1))]
    pub usage_limit: Option<i32>,
    #[validate(range(min = 1))]
    pub per_customer_limit: Option<i32>,
    pub min_order_amount: Option<Decimal>,
    pub weekdays: Option<Vec<i16>>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Field-level checks the derive attributes cannot express: voucher code
/// presence, applicability exclusivity, numeric ranges on Decimal fields.
pub fn validate_discount_shape(req: &CreateDiscountRequest) -> Result<(), ValidationError> {
    if req.kind == DiscountKind::Voucher && req.code.as_deref().map_or(true, str::is_empty) {
        return Err(ValidationError::new("voucher_code_required"));
    }

    let populated = [&req.zone_ids, &req.item_type_ids, &req.product_ids]
        .iter()
        .filter(|ids| has_ids(ids))
        .count();
    if populated > 1 {
        return Err(ValidationError::new("applicability_not_exclusive"));
    }

    if req.value <= Decimal::ZERO {
        return Err(ValidationError::new("value_not_positive"));
    }
    if req.discount_type == DiscountType::Percentage && req.value > Decimal::from(100) {
        return Err(ValidationError::new("percentage_over_100"));
    }
    if req.discount_type == DiscountType::FixedAmount && req.max_discount_amount.is_some() {
        return Err(ValidationError::new("cap_on_fixed_amount"));
    }
    if let (Some(from), Some(to)) = (req.valid_from, req.valid_to) {
        if from > to {
            return Err(ValidationError::new("validity_window_inverted"));
        }
    }
    if let Some(days) = &req.weekdays {
        if days.iter().any(|d| !(1..=7).contains(d)) {
            return Err(ValidationError::new("weekday_out_of_range"));
        }
    }

    Ok(())
}

/// Input for updating a discount.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDiscount {
    pub name: Option<String>,
    pub value: Option<Decimal>,
    pub max_discount_amount: Option<Decimal>,
    pub valid_from: Option<NaiveDate>,
    pub valid_to: Option<NaiveDate>,
    pub usage_limit: Option<i32>,
    pub per_customer_limit: Option<i32>,
    pub min_order_amount: Option<Decimal>,
    pub weekdays: Option<Vec<i16>>,
    pub priority: Option<i32>,
    pub active: Option<bool>,
}
