//! Rate resolution and booking quote tests.

mod common;

use booking_service::pricing::{
    guest_counts_from_json, line_subtotal, price_booking, resolve_nightly_rate, DiscountContext,
    LineCharge,
};
use chrono::NaiveDate;
use common::{base_discount, item};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::BTreeMap;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn counts(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

#[test]
fn per_night_charges_every_night() {
    let item = item("per_night", vec![("adult", dec!(150_000)), ("child", dec!(75_000))]);
    let guests = counts(&[("adult", 2), ("child", 1)]);

    let breakdown = resolve_nightly_rate(&item, date(2025, 8, 1), date(2025, 8, 4), &guests);

    assert_eq!(breakdown.len(), 3);
    for night in &breakdown {
        assert_eq!(night.subtotal, dec!(375_000));
        assert_eq!(night.components.len(), 2);
    }
    assert_eq!(line_subtotal(&breakdown), dec!(1_125_000));
}

#[test]
fn per_stay_charges_only_the_first_night() {
    let item = item("per_stay", vec![("adult", dec!(500_000))]);
    let guests = counts(&[("adult", 2)]);

    let breakdown = resolve_nightly_rate(&item, date(2025, 8, 1), date(2025, 8, 4), &guests);

    assert_eq!(breakdown.len(), 3);
    assert_eq!(breakdown[0].subtotal, dec!(1_000_000));
    assert_eq!(breakdown[1].subtotal, Decimal::ZERO);
    assert_eq!(breakdown[2].subtotal, Decimal::ZERO);
    assert_eq!(line_subtotal(&breakdown), dec!(1_000_000));
}

#[test]
fn zero_night_range_yields_empty_breakdown() {
    let item = item("per_night", vec![("adult", dec!(150_000))]);
    let guests = counts(&[("adult", 2)]);

    let same_day = resolve_nightly_rate(&item, date(2025, 8, 1), date(2025, 8, 1), &guests);
    assert!(same_day.is_empty());

    let inverted = resolve_nightly_rate(&item, date(2025, 8, 4), date(2025, 8, 1), &guests);
    assert!(inverted.is_empty());
}

#[test]
fn unknown_rate_mode_falls_back_to_per_night() {
    let item = item("per_fortnight", vec![("adult", dec!(100_000))]);
    let guests = counts(&[("adult", 1)]);

    let breakdown = resolve_nightly_rate(&item, date(2025, 8, 1), date(2025, 8, 3), &guests);

    assert_eq!(breakdown.len(), 2);
    assert_eq!(line_subtotal(&breakdown), dec!(200_000));
}

#[test]
fn unpriced_and_zero_count_parameters_are_skipped() {
    let item = item("per_night", vec![("adult", dec!(150_000)), ("pet", dec!(50_000))]);
    let guests = counts(&[("adult", 1), ("pet", 0), ("infant", 3)]);

    let breakdown = resolve_nightly_rate(&item, date(2025, 8, 1), date(2025, 8, 2), &guests);

    assert_eq!(breakdown[0].components.len(), 1);
    assert_eq!(breakdown[0].components[0].parameter, "adult");
    assert_eq!(line_subtotal(&breakdown), dec!(150_000));
}

#[test]
fn guest_counts_parse_drops_invalid_entries() {
    let parsed = guest_counts_from_json(&json!({
        "adult": 2,
        "child": "three",
        "pet": -1,
        "infant": 0
    }));

    assert_eq!(parsed.get("adult"), Some(&2));
    assert_eq!(parsed.get("infant"), Some(&0));
    assert!(!parsed.contains_key("child"));
    assert!(!parsed.contains_key("pet"));

    assert!(guest_counts_from_json(&json!(null)).is_empty());
    assert!(guest_counts_from_json(&json!([1, 2])).is_empty());
}

#[test]
fn quote_composes_capped_discount_and_tax() {
    // 2,000,000 base; 10% capped at 150,000 before tax; 10% tax.
    let mut discount = base_discount();
    discount.scope = "per_booking_before_tax".to_string();
    discount.max_discount_amount = Some(dec!(150_000));

    let lines = [LineCharge {
        subtotal: dec!(2_000_000),
        ctx: DiscountContext::default(),
    }];
    let totals = price_booking(
        &lines,
        &[discount],
        &DiscountContext::default(),
        dec!(10),
        true,
    );

    assert_eq!(totals.subtotal_amount, dec!(2_000_000));
    assert_eq!(totals.discount_amount, dec!(150_000));
    assert_eq!(totals.tax_amount, dec!(185_000));
    assert_eq!(totals.total_amount, dec!(2_035_000));
    assert_eq!(
        totals.total_amount,
        totals.subtotal_amount - totals.discount_amount + totals.tax_amount
    );
}

#[test]
fn quote_without_tax_requirement_charges_no_tax() {
    let mut discount = base_discount();
    discount.scope = "per_booking_before_tax".to_string();
    discount.max_discount_amount = Some(dec!(150_000));

    let lines = [LineCharge {
        subtotal: dec!(2_000_000),
        ctx: DiscountContext::default(),
    }];
    let totals = price_booking(
        &lines,
        &[discount],
        &DiscountContext::default(),
        dec!(10),
        false,
    );

    assert_eq!(totals.tax_amount, Decimal::ZERO);
    assert_eq!(totals.total_amount, dec!(1_850_000));
}

#[test]
fn after_tax_discount_reduces_the_tax_inclusive_total() {
    let mut after = base_discount();
    after.scope = "per_booking_after_tax".to_string();
    after.discount_type = "fixed_amount".to_string();
    after.value = dec!(100_000);

    let lines = [LineCharge {
        subtotal: dec!(1_000_000),
        ctx: DiscountContext::default(),
    }];
    let totals = price_booking(
        &lines,
        &[after],
        &DiscountContext::default(),
        dec!(10),
        true,
    );

    // Tax on the full net, then 100,000 off the tax-inclusive 1,100,000.
    assert_eq!(totals.tax_amount, dec!(100_000));
    assert_eq!(totals.discount_amount, dec!(100_000));
    assert_eq!(totals.total_amount, dec!(1_000_000));
    assert_eq!(
        totals.total_amount,
        totals.subtotal_amount - totals.discount_amount + totals.tax_amount
    );
}

#[test]
fn per_item_discounts_apply_per_line_before_booking_scopes() {
    let mut per_item = base_discount();
    per_item.value = dec!(50);

    let lines = [
        LineCharge {
            subtotal: dec!(400_000),
            ctx: DiscountContext::default(),
        },
        LineCharge {
            subtotal: dec!(600_000),
            ctx: DiscountContext::default(),
        },
    ];
    let totals = price_booking(
        &lines,
        &[per_item],
        &DiscountContext::default(),
        dec!(8),
        true,
    );

    assert_eq!(totals.subtotal_amount, dec!(1_000_000));
    assert_eq!(totals.discount_amount, dec!(500_000));
    // Tax on the discounted net of 500,000.
    assert_eq!(totals.tax_amount, dec!(40_000));
    assert_eq!(totals.total_amount, dec!(540_000));
    assert_eq!(totals.applied.len(), 2);
}
