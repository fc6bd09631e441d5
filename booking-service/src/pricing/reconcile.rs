//! Payment/balance reconciliation.

use crate::models::{Payment, PaymentStatus};
use rust_decimal::Decimal;

/// Reconciliation of recorded payments against a computed grand total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciliation {
    pub amount_paid: Decimal,
    pub remaining: Decimal,
    pub is_fully_paid: bool,
}

/// Sum settled payments and compute the remaining balance, floored at zero.
pub fn reconcile(total_amount: Decimal, payments: &[Payment]) -> Reconciliation {
    let amount_paid: Decimal = payments
        .iter()
        .filter(|p| p.is_settled())
        .map(|p| p.amount)
        .sum();
    let remaining = (total_amount - amount_paid).max(Decimal::ZERO);
    Reconciliation {
        amount_paid,
        remaining,
        is_fully_paid: remaining == Decimal::ZERO && amount_paid > Decimal::ZERO,
    }
}

/// Payment status the ledger supports after reconciliation. Returns `None`
/// when the current status should stand (refund states advance through
/// their own flow, never via reconciliation).
pub fn suggested_payment_status(
    current: PaymentStatus,
    reconciliation: &Reconciliation,
    deposit_due: Decimal,
) -> Option<PaymentStatus> {
    match current {
        PaymentStatus::RefundPending
        | PaymentStatus::Refunded
        | PaymentStatus::NoRefund
        | PaymentStatus::Expired => None,
        _ => {
            let next = if reconciliation.is_fully_paid {
                PaymentStatus::FullyPaid
            } else if reconciliation.amount_paid >= deposit_due
                && reconciliation.amount_paid > Decimal::ZERO
            {
                PaymentStatus::DepositPaid
            } else {
                PaymentStatus::Pending
            };
            (next != current).then_some(next)
        }
    }
}
