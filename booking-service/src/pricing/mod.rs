//! Pricing core: rate resolution, discount aggregation, tax and payment
//! reconciliation. Pure functions over fetched rows; all money math in
//! `rust_decimal`.

pub mod discounts;
pub mod quote;
pub mod rates;
pub mod reconcile;
pub mod tax;

pub use discounts::{
    applied_voucher, apply_discounts, discount_amount, is_applicable, AppliedDiscount,
    DiscountContext, DiscountOutcome, DiscountTarget,
};
pub use quote::{price_booking, BookingTotals, LineCharge};
pub use rates::{
    guest_counts_from_json, line_subtotal, resolve_nightly_rate, ChargeComponent, NightlyCharge,
};
pub use reconcile::{reconcile, suggested_payment_status, Reconciliation};
pub use tax::{apply_tax, vat_payable_delta, TaxOutcome};
