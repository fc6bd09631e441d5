//! Nightly rate resolution.

use crate::models::{PriceableItem, PricingRate};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::warn;

/// One priced component of a night: a guest parameter at its unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChargeComponent {
    pub parameter: String,
    pub quantity: u32,
    pub unit_price: Decimal,
    pub amount: Decimal,
}

/// Pre-discount charges for a single night of a stay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NightlyCharge {
    pub night: NaiveDate,
    pub components: Vec<ChargeComponent>,
    pub subtotal: Decimal,
}

/// Parse the booking's guest-count JSON map into typed counts. Non-numeric
/// or negative entries are dropped.
pub fn guest_counts_from_json(value: &serde_json::Value) -> BTreeMap<String, u32> {
    value
        .as_object()
        .map(|map| {
            map.iter()
                .filter_map(|(k, v)| {
                    v.as_u64()
                        .and_then(|n| u32::try_from(n).ok())
                        .map(|n| (k.clone(), n))
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Resolve the per-night breakdown for one accommodation item over a stay.
///
/// `per_night` multiplies each guest-parameter unit price by its count for
/// every night of the range. `per_stay` and `per_hour` apply the unit
/// prices once, attributed to the first night so the breakdown still sums
/// to the line subtotal. An unrecognized mode falls back to `per_night`.
/// A zero-night range yields an empty breakdown.
pub fn resolve_nightly_rate(
    item: &PriceableItem,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guest_counts: &BTreeMap<String, u32>,
) -> Vec<NightlyCharge> {
    let nights = (check_out - check_in).num_days();
    if nights <= 0 {
        return Vec::new();
    }

    let known_modes = ["per_night", "per_stay", "per_hour"];
    if !known_modes.contains(&item.pricing_rate.as_str()) {
        warn!(
            item_id = %item.item_id,
            pricing_rate = %item.pricing_rate,
            "Unknown pricing rate mode, falling back to per_night"
        );
    }
    let mode = PricingRate::from_string(&item.pricing_rate);

    let night_components = |charged: bool| -> Vec<ChargeComponent> {
        if !charged {
            return Vec::new();
        }
        item.parameter_prices
            .iter()
            .filter_map(|(parameter, unit_price)| {
                let quantity = *guest_counts.get(parameter).unwrap_or(&0);
                if quantity == 0 {
                    return None;
                }
                Some(ChargeComponent {
                    parameter: parameter.clone(),
                    quantity,
                    unit_price: *unit_price,
                    amount: *unit_price * Decimal::from(quantity),
                })
            })
            .collect()
    };

    (0..nights)
        .map(|offset| {
            // per_stay / per_hour charge the unit prices once, on night one.
            let charged = mode == PricingRate::PerNight || offset == 0;
            let components = night_components(charged);
            let subtotal = components.iter().map(|c| c.amount).sum();
            NightlyCharge {
                night: check_in + chrono::Duration::days(offset),
                components,
                subtotal,
            }
        })
        .collect()
}

/// Sum a nightly breakdown into the line's pre-discount subtotal.
pub fn line_subtotal(breakdown: &[NightlyCharge]) -> Decimal {
    breakdown.iter().map(|n| n.subtotal).sum()
}
