//! Tax calculation.
//!
//! Tax requirement is a per-booking runtime toggle decided at checkout, not
//! fixed at creation. Toggling recomputes the total and balance without
//! touching recorded payments.

use rust_decimal::Decimal;

/// Result of applying (or not applying) tax to a net subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxOutcome {
    pub tax_amount: Decimal,
    pub total_with_tax: Decimal,
}

/// Exclusive tax on a net subtotal: `net * rate / 100` when required, zero
/// otherwise.
pub fn apply_tax(net_subtotal: Decimal, tax_rate: Decimal, required: bool) -> TaxOutcome {
    let tax_amount = if required && tax_rate > Decimal::ZERO {
        net_subtotal * tax_rate / Decimal::from(100)
    } else {
        Decimal::ZERO
    };
    TaxOutcome {
        tax_amount,
        total_with_tax: net_subtotal + tax_amount,
    }
}

/// The newly-owed tax delta when a booking that was already settled becomes
/// tax-required. Surfaced as a distinct VAT payable rather than reopening
/// the payment ledger; zero when the toggle left nothing extra owed.
pub fn vat_payable_delta(previous_total: Decimal, new_total: Decimal, amount_paid: Decimal) -> Decimal {
    if amount_paid < previous_total {
        // Balance not yet settled; the delta folds into the ordinary balance.
        return Decimal::ZERO;
    }
    (new_total - amount_paid).max(Decimal::ZERO)
}
