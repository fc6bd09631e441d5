//! Booking quote orchestration.
//!
//! Composes rate resolution, discount aggregation and tax into the totals
//! persisted on a booking, enforcing
//! `total_amount = subtotal_amount - discount_amount + tax_amount`.

use crate::models::{Discount, DiscountScope};
use crate::pricing::discounts::{apply_discounts, AppliedDiscount, DiscountContext};
use crate::pricing::tax::apply_tax;
use rust_decimal::Decimal;

/// One charge entering the quote: an accommodation or product line's
/// pre-discount subtotal with the target its per-item discounts match on.
#[derive(Debug, Clone)]
pub struct LineCharge {
    pub subtotal: Decimal,
    pub ctx: DiscountContext,
}

/// The money fields persisted on a booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingTotals {
    pub subtotal_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub applied: Vec<AppliedDiscount>,
}

/// Price a booking from its line charges and the live discount set.
///
/// Per-item rules discount each line on its own base; before-tax booking
/// rules discount the summed net; tax applies to the result; after-tax
/// booking rules discount the tax-inclusive total. The two booking scopes
/// never share a base.
pub fn price_booking(
    lines: &[LineCharge],
    discounts: &[Discount],
    booking_ctx: &DiscountContext,
    tax_rate: Decimal,
    tax_required: bool,
) -> BookingTotals {
    let mut applied = Vec::new();

    let subtotal_amount: Decimal = lines.iter().map(|l| l.subtotal).sum();

    let mut item_discounts = Decimal::ZERO;
    for line in lines {
        let outcome = apply_discounts(line.subtotal, discounts, DiscountScope::PerItem, &line.ctx);
        item_discounts += outcome.discount_amount;
        applied.extend(outcome.applied);
    }

    let before_tax_base = subtotal_amount - item_discounts;
    let before = apply_discounts(
        before_tax_base,
        discounts,
        DiscountScope::PerBookingBeforeTax,
        booking_ctx,
    );
    applied.extend(before.applied.clone());

    let tax = apply_tax(before.net_subtotal, tax_rate, tax_required);

    let after = apply_discounts(
        tax.total_with_tax,
        discounts,
        DiscountScope::PerBookingAfterTax,
        booking_ctx,
    );
    applied.extend(after.applied.clone());

    let discount_amount = item_discounts + before.discount_amount + after.discount_amount;

    BookingTotals {
        subtotal_amount,
        discount_amount,
        tax_amount: tax.tax_amount,
        total_amount: after.net_subtotal,
        applied,
    }
}
