//! Discount aggregation tests: stacking order, clamps and voucher gates.

mod common;

use booking_service::models::DiscountScope;
use booking_service::pricing::{applied_voucher, apply_discounts, DiscountContext, DiscountTarget};
use chrono::{NaiveDate, TimeZone, Utc};
use common::base_discount;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn stacking_applies_in_priority_then_age_order_with_cumulative_clamp() {
    // Fixed 800 at priority 0, then 50% of the remaining 200.
    let mut fixed = base_discount();
    fixed.name = "Fixed 800".to_string();
    fixed.discount_type = "fixed_amount".to_string();
    fixed.value = dec!(800);
    fixed.priority = 0;

    let mut percent = base_discount();
    percent.name = "Half off".to_string();
    percent.value = dec!(50);
    percent.priority = 1;

    let outcome = apply_discounts(
        dec!(1000),
        &[percent.clone(), fixed.clone()],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );

    assert_eq!(outcome.applied.len(), 2);
    assert_eq!(outcome.applied[0].name, "Fixed 800");
    assert_eq!(outcome.applied[0].amount, dec!(800));
    assert_eq!(outcome.applied[1].amount, dec!(100));
    assert_eq!(outcome.discount_amount, dec!(900));
    assert_eq!(outcome.net_subtotal, dec!(100));
}

#[test]
fn equal_priority_breaks_ties_by_creation_time() {
    let mut older = base_discount();
    older.name = "Older".to_string();
    older.discount_type = "fixed_amount".to_string();
    older.value = dec!(700);
    older.created_utc = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();

    let mut newer = base_discount();
    newer.name = "Newer".to_string();
    newer.discount_type = "fixed_amount".to_string();
    newer.value = dec!(700);
    newer.created_utc = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();

    let outcome = apply_discounts(
        dec!(1000),
        &[newer, older],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );

    // Older takes its full 700; newer is clamped to the remaining 300.
    assert_eq!(outcome.applied[0].name, "Older");
    assert_eq!(outcome.applied[0].amount, dec!(700));
    assert_eq!(outcome.applied[1].amount, dec!(300));
    assert_eq!(outcome.net_subtotal, Decimal::ZERO);
}

#[test]
fn cumulative_discount_never_exceeds_the_base() {
    let mut a = base_discount();
    a.discount_type = "fixed_amount".to_string();
    a.value = dec!(900);
    a.priority = 0;

    let mut b = base_discount();
    b.discount_type = "fixed_amount".to_string();
    b.value = dec!(900);
    b.priority = 1;

    let outcome = apply_discounts(
        dec!(1000),
        &[a, b],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );

    assert_eq!(outcome.discount_amount, dec!(1000));
    assert_eq!(outcome.net_subtotal, Decimal::ZERO);
}

#[test]
fn percentage_amount_respects_the_cap() {
    let mut capped = base_discount();
    capped.value = dec!(20);
    capped.max_discount_amount = Some(dec!(50_000));

    let outcome = apply_discounts(
        dec!(1_000_000),
        &[capped],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );

    assert_eq!(outcome.discount_amount, dec!(50_000));
    assert_eq!(outcome.net_subtotal, dec!(950_000));
}

#[test]
fn inactive_and_wrong_scope_rules_are_ignored() {
    let mut inactive = base_discount();
    inactive.active = false;

    let mut booking_scope = base_discount();
    booking_scope.scope = "per_booking_before_tax".to_string();

    let outcome = apply_discounts(
        dec!(1000),
        &[inactive, booking_scope],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );

    assert!(outcome.applied.is_empty());
    assert_eq!(outcome.net_subtotal, dec!(1000));
}

#[test]
fn validity_window_and_weekdays_gate_on_booking_date() {
    let mut windowed = base_discount();
    windowed.valid_from = Some(date(2025, 8, 1));
    windowed.valid_to = Some(date(2025, 8, 31));
    // 2025-08-16 is a Saturday.
    windowed.weekdays = Some(vec![6, 7]);

    let ctx_in = DiscountContext {
        booking_date: Some(date(2025, 8, 16)),
        ..Default::default()
    };
    let outcome = apply_discounts(dec!(1000), &[windowed.clone()], DiscountScope::PerItem, &ctx_in);
    assert_eq!(outcome.applied.len(), 1);

    let ctx_weekday = DiscountContext {
        booking_date: Some(date(2025, 8, 13)),
        ..Default::default()
    };
    let outcome =
        apply_discounts(dec!(1000), &[windowed.clone()], DiscountScope::PerItem, &ctx_weekday);
    assert!(outcome.applied.is_empty());

    let ctx_out = DiscountContext {
        booking_date: Some(date(2025, 9, 6)),
        ..Default::default()
    };
    let outcome = apply_discounts(dec!(1000), &[windowed], DiscountScope::PerItem, &ctx_out);
    assert!(outcome.applied.is_empty());
}

#[test]
fn applicability_dimensions_match_exactly() {
    let zone = Uuid::new_v4();
    let other_zone = Uuid::new_v4();

    let mut zoned = base_discount();
    zoned.zone_ids = Some(vec![zone]);

    let ctx_match = DiscountContext {
        target: DiscountTarget {
            zone_id: Some(zone),
            ..Default::default()
        },
        ..Default::default()
    };
    let outcome = apply_discounts(dec!(1000), &[zoned.clone()], DiscountScope::PerItem, &ctx_match);
    assert_eq!(outcome.applied.len(), 1);

    let ctx_other = DiscountContext {
        target: DiscountTarget {
            zone_id: Some(other_zone),
            ..Default::default()
        },
        ..Default::default()
    };
    let outcome = apply_discounts(dec!(1000), &[zoned], DiscountScope::PerItem, &ctx_other);
    assert!(outcome.applied.is_empty());

    // No dimension populated applies everywhere.
    let unscoped = base_discount();
    let outcome = apply_discounts(dec!(1000), &[unscoped], DiscountScope::PerItem, &ctx_other);
    assert_eq!(outcome.applied.len(), 1);
}

#[test]
fn voucher_gates_make_rules_inapplicable_never_errors() {
    let mut exhausted = base_discount();
    exhausted.kind = "voucher".to_string();
    exhausted.code = Some("SUMMER".to_string());
    exhausted.usage_limit = Some(5);
    exhausted.usage_count = 5;

    let outcome = apply_discounts(
        dec!(1000),
        &[exhausted],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );
    assert!(outcome.applied.is_empty());

    let mut per_customer = base_discount();
    per_customer.kind = "voucher".to_string();
    per_customer.code = Some("ONCE".to_string());
    per_customer.per_customer_limit = Some(1);

    let ctx = DiscountContext {
        customer_redemptions: BTreeMap::from([(per_customer.discount_id, 1)]),
        ..Default::default()
    };
    let outcome = apply_discounts(dec!(1000), &[per_customer], DiscountScope::PerItem, &ctx);
    assert!(outcome.applied.is_empty());

    let mut min_order = base_discount();
    min_order.kind = "voucher".to_string();
    min_order.code = Some("BIG".to_string());
    min_order.min_order_amount = Some(dec!(5000));

    let outcome = apply_discounts(
        dec!(1000),
        &[min_order.clone()],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );
    assert!(outcome.applied.is_empty());

    let outcome = apply_discounts(
        dec!(5000),
        &[min_order],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );
    assert_eq!(outcome.applied.len(), 1);
}

#[test]
fn zero_or_negative_base_discounts_nothing() {
    let discount = base_discount();

    let outcome = apply_discounts(
        Decimal::ZERO,
        &[discount.clone()],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );
    assert_eq!(outcome.discount_amount, Decimal::ZERO);
    assert!(outcome.applied.is_empty());
}

#[test]
fn only_voucher_rules_snapshot_onto_lines() {
    let plain = base_discount();

    let mut voucher = base_discount();
    voucher.kind = "voucher".to_string();
    voucher.code = Some("CAMP10".to_string());

    let discounts = [plain.clone(), voucher.clone()];
    let outcome = apply_discounts(
        dec!(1000),
        &discounts,
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );
    assert_eq!(outcome.applied.len(), 2);

    let snapshot = applied_voucher(&outcome.applied, &discounts).unwrap();
    assert_eq!(snapshot.discount_id, voucher.discount_id);
    assert_eq!(snapshot.code.as_deref(), Some("CAMP10"));

    // An ordinary rule alone leaves no voucher to snapshot.
    let outcome = apply_discounts(
        dec!(1000),
        &[plain.clone()],
        DiscountScope::PerItem,
        &DiscountContext::default(),
    );
    assert!(applied_voucher(&outcome.applied, &[plain]).is_none());
}
