//! Shared builders for pricing and reporting tests.
#![allow(dead_code)]

use booking_service::models::{Booking, Discount, Payment, PriceableItem};
use chrono::{NaiveDate, TimeZone, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

/// A permissive baseline discount; tests override the fields they exercise.
pub fn base_discount() -> Discount {
    Discount {
        discount_id: Uuid::new_v4(),
        kind: "discount".to_string(),
        code: None,
        name: "Test discount".to_string(),
        discount_type: "percentage".to_string(),
        value: Decimal::from(10),
        max_discount_amount: None,
        scope: "per_item".to_string(),
        zone_ids: None,
        item_type_ids: None,
        product_ids: None,
        valid_from: None,
        valid_to: None,
        usage_limit: None,
        per_customer_limit: None,
        usage_count: 0,
        min_order_amount: None,
        weekdays: None,
        priority: 0,
        active: true,
        created_utc: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
    }
}

/// A stored booking with zero totals and no stamps; tests override the
/// fields they exercise.
pub fn booking(status: &str, payment_status: &str) -> Booking {
    Booking {
        booking_id: Uuid::new_v4(),
        zone_id: Uuid::new_v4(),
        customer_id: Uuid::new_v4(),
        staff_id: None,
        status: status.to_string(),
        payment_status: payment_status.to_string(),
        check_in: NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
        check_out: NaiveDate::from_ymd_opt(2025, 8, 4).unwrap(),
        guest_counts: serde_json::json!({"adult": 2}),
        subtotal_amount: Decimal::ZERO,
        discount_amount: Decimal::ZERO,
        tax_amount: Decimal::ZERO,
        total_amount: Decimal::ZERO,
        deposit_due: Decimal::ZERO,
        balance_due: Decimal::ZERO,
        currency: "VND".to_string(),
        tax_invoice_required: false,
        tax_rate: Decimal::ZERO,
        notes: None,
        created_utc: Utc::now(),
        confirmed_utc: None,
        cancelled_utc: None,
    }
}

pub fn payment(amount: Decimal, status: &str) -> Payment {
    Payment {
        payment_id: Uuid::new_v4(),
        booking_id: Uuid::new_v4(),
        method: "bank_transfer".to_string(),
        amount,
        status: status.to_string(),
        transaction_ref: None,
        is_vat_payment: false,
        paid_utc: Some(Utc::now()),
        created_utc: Utc::now(),
    }
}

pub fn item(pricing_rate: &str, parameter_prices: Vec<(&str, Decimal)>) -> PriceableItem {
    PriceableItem {
        item_id: Uuid::new_v4(),
        item_name: "Riverside tent".to_string(),
        category_id: Some(Uuid::new_v4()),
        pricing_rate: pricing_rate.to_string(),
        parameter_prices: parameter_prices
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    }
}
