//! Discount aggregation.
//!
//! Filters a discount set down to the rules applicable to a target, computes
//! per-rule amounts and the resulting net subtotal. Stacking is
//! deterministic: rules apply in (priority ASC, created_utc ASC, id ASC)
//! order and each amount is clamped to the subtotal remaining after the
//! rules before it, so the cumulative discount never exceeds the base.

use crate::models::{Discount, DiscountKind, DiscountScope, DiscountType};
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use uuid::Uuid;

/// What a discount is being matched against.
#[derive(Debug, Clone, Default)]
pub struct DiscountTarget {
    pub zone_id: Option<Uuid>,
    pub item_type_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
}

/// Per-booking facts the voucher gates need.
#[derive(Debug, Clone, Default)]
pub struct DiscountContext {
    pub booking_date: Option<NaiveDate>,
    pub target: DiscountTarget,
    /// This customer's prior redemption count per discount id.
    pub customer_redemptions: BTreeMap<Uuid, u32>,
}

/// One rule that contributed to the outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedDiscount {
    pub discount_id: Uuid,
    pub code: Option<String>,
    pub name: String,
    pub amount: Decimal,
}

/// Result of applying a discount set to a base amount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountOutcome {
    pub discount_amount: Decimal,
    pub net_subtotal: Decimal,
    pub applied: Vec<AppliedDiscount>,
}

impl DiscountOutcome {
    pub fn none(subtotal: Decimal) -> Self {
        DiscountOutcome {
            discount_amount: Decimal::ZERO,
            net_subtotal: subtotal,
            applied: Vec::new(),
        }
    }
}

/// Does the rule's applicability dimension match the target? Exactly one of
/// the three id sets is populated (or none, meaning applies-to-all).
fn matches_target(discount: &Discount, target: &DiscountTarget) -> bool {
    fn dim(ids: &Option<Vec<Uuid>>, candidate: Option<Uuid>) -> Option<bool> {
        match ids {
            Some(ids) if !ids.is_empty() => {
                Some(candidate.map_or(false, |id| ids.contains(&id)))
            }
            _ => None,
        }
    }

    dim(&discount.zone_ids, target.zone_id)
        .or_else(|| dim(&discount.item_type_ids, target.item_type_id))
        .or_else(|| dim(&discount.product_ids, target.product_id))
        .unwrap_or(true)
}

/// Is the rule live on `date` (validity window and weekday set)?
fn within_window(discount: &Discount, date: Option<NaiveDate>) -> bool {
    let Some(date) = date else {
        // No booking date to check against: only the active flag gates.
        return true;
    };
    if discount.valid_from.is_some_and(|from| date < from) {
        return false;
    }
    if discount.valid_to.is_some_and(|to| date > to) {
        return false;
    }
    match &discount.weekdays {
        Some(days) if !days.is_empty() => {
            days.contains(&(date.weekday().number_from_monday() as i16))
        }
        _ => true,
    }
}

/// Voucher gates: usage limits and minimum order amount. Failing a gate
/// makes the rule *not applicable*; it is never an error.
fn passes_voucher_gates(discount: &Discount, subtotal: Decimal, ctx: &DiscountContext) -> bool {
    if discount.kind() != DiscountKind::Voucher {
        return true;
    }
    if discount
        .usage_limit
        .is_some_and(|limit| discount.usage_count >= limit)
    {
        return false;
    }
    if let Some(per_customer) = discount.per_customer_limit {
        let used = ctx
            .customer_redemptions
            .get(&discount.discount_id)
            .copied()
            .unwrap_or(0);
        if used as i32 >= per_customer {
            return false;
        }
    }
    if discount.min_order_amount.is_some_and(|min| subtotal < min) {
        return false;
    }
    true
}

/// Whether a single rule applies to this target, date and subtotal.
pub fn is_applicable(discount: &Discount, subtotal: Decimal, ctx: &DiscountContext) -> bool {
    discount.active
        && within_window(discount, ctx.booking_date)
        && matches_target(discount, &ctx.target)
        && passes_voucher_gates(discount, subtotal, ctx)
}

/// Amount a single rule takes off `base`, before stacking clamps.
///
/// Percentage: `base * value / 100`, capped at `max_discount_amount`.
/// Fixed: `min(value, base)` so the net never goes negative.
pub fn discount_amount(discount: &Discount, base: Decimal) -> Decimal {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match discount.discount_type() {
        DiscountType::Percentage => {
            let amount = base * discount.value / Decimal::from(100);
            match discount.max_discount_amount {
                Some(cap) => amount.min(cap),
                None => amount,
            }
        }
        DiscountType::FixedAmount => discount.value.min(base),
    }
}

/// The voucher rule behind an applied discount, if any. Its terms get
/// snapshotted onto the persisted line; ordinary rules leave no snapshot.
pub fn applied_voucher<'a>(
    applied: &[AppliedDiscount],
    discounts: &'a [Discount],
) -> Option<&'a Discount> {
    applied.iter().find_map(|a| {
        discounts
            .iter()
            .find(|d| d.discount_id == a.discount_id && d.kind() == DiscountKind::Voucher)
    })
}

/// Apply every applicable rule of `scope` to `subtotal`.
pub fn apply_discounts(
    subtotal: Decimal,
    discounts: &[Discount],
    scope: DiscountScope,
    ctx: &DiscountContext,
) -> DiscountOutcome {
    let mut candidates: Vec<&Discount> = discounts
        .iter()
        .filter(|d| d.scope() == scope && is_applicable(d, subtotal, ctx))
        .collect();
    candidates.sort_by(|a, b| {
        a.priority
            .cmp(&b.priority)
            .then(a.created_utc.cmp(&b.created_utc))
            .then(a.discount_id.cmp(&b.discount_id))
    });

    let mut remaining = subtotal.max(Decimal::ZERO);
    let mut applied = Vec::with_capacity(candidates.len());
    for discount in candidates {
        let amount = discount_amount(discount, remaining);
        if amount <= Decimal::ZERO {
            continue;
        }
        remaining -= amount;
        applied.push(AppliedDiscount {
            discount_id: discount.discount_id,
            code: discount.code.clone(),
            name: discount.name.clone(),
            amount,
        });
    }

    let discount_amount = applied.iter().map(|a| a.amount).sum();
    DiscountOutcome {
        discount_amount,
        net_subtotal: remaining,
        applied,
    }
}
