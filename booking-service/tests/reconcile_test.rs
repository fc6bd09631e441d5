//! Payment reconciliation tests.

mod common;

use booking_service::models::{BookingStatus, PaymentStatus};
use booking_service::pricing::{reconcile, suggested_payment_status, vat_payable_delta};
use chrono::Utc;
use common::{booking, payment};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[test]
fn only_settled_statuses_count_toward_amount_paid() {
    let payments = [
        payment(dec!(500_000), "successful"),
        payment(dec!(300_000), "completed"),
        payment(dec!(200_000), "success"),
        payment(dec!(999_999), "pending"),
        payment(dec!(999_999), "failed"),
    ];

    let rec = reconcile(dec!(2_035_000), &payments);

    assert_eq!(rec.amount_paid, dec!(1_000_000));
    assert_eq!(rec.remaining, dec!(1_035_000));
    assert!(!rec.is_fully_paid);
}

#[test]
fn overpayment_floors_remaining_at_zero() {
    let payments = [payment(dec!(1_200_000), "completed")];

    let rec = reconcile(dec!(1_000_000), &payments);

    assert_eq!(rec.remaining, Decimal::ZERO);
    assert!(rec.is_fully_paid);
}

#[test]
fn zero_total_with_no_payments_is_not_fully_paid() {
    let rec = reconcile(Decimal::ZERO, &[]);

    assert_eq!(rec.amount_paid, Decimal::ZERO);
    assert_eq!(rec.remaining, Decimal::ZERO);
    assert!(!rec.is_fully_paid);
}

#[test]
fn reconciliation_suggests_forward_transitions_only() {
    let full = reconcile(dec!(1_000_000), &[payment(dec!(1_000_000), "completed")]);
    assert_eq!(
        suggested_payment_status(PaymentStatus::Pending, &full, dec!(300_000)),
        Some(PaymentStatus::FullyPaid)
    );

    let deposit = reconcile(dec!(1_000_000), &[payment(dec!(300_000), "completed")]);
    assert_eq!(
        suggested_payment_status(PaymentStatus::Pending, &deposit, dec!(300_000)),
        Some(PaymentStatus::DepositPaid)
    );

    let below_deposit = reconcile(dec!(1_000_000), &[payment(dec!(100_000), "completed")]);
    assert_eq!(
        suggested_payment_status(PaymentStatus::Pending, &below_deposit, dec!(300_000)),
        None
    );
}

#[test]
fn unchanged_status_suggests_nothing() {
    let deposit = reconcile(dec!(1_000_000), &[payment(dec!(400_000), "completed")]);
    assert_eq!(
        suggested_payment_status(PaymentStatus::DepositPaid, &deposit, dec!(300_000)),
        None
    );
}

#[test]
fn refund_states_never_advance_via_reconciliation() {
    let full = reconcile(dec!(1_000_000), &[payment(dec!(1_000_000), "completed")]);

    for status in [
        PaymentStatus::RefundPending,
        PaymentStatus::Refunded,
        PaymentStatus::NoRefund,
        PaymentStatus::Expired,
    ] {
        assert_eq!(suggested_payment_status(status, &full, dec!(300_000)), None);
    }
}

#[test]
fn resetting_the_current_status_plans_a_noop() {
    let stored = booking("confirmed", "deposit_paid");

    let plan = stored.plan_status_transition(BookingStatus::Confirmed);
    assert!(!plan.apply);
    assert!(!plan.stamp_confirmed);
    assert!(!plan.stamp_cancelled);

    assert!(!stored.is_payment_transition(PaymentStatus::DepositPaid));
}

#[test]
fn first_confirm_and_cancel_stamp_their_timestamps_once() {
    let stored = booking("pending", "pending");

    let plan = stored.plan_status_transition(BookingStatus::Confirmed);
    assert!(plan.apply);
    assert!(plan.stamp_confirmed);
    assert!(!plan.stamp_cancelled);

    let plan = stored.plan_status_transition(BookingStatus::Cancelled);
    assert!(plan.apply);
    assert!(plan.stamp_cancelled);

    // A booking that was already confirmed once keeps its original stamp.
    let mut reconfirmed = booking("cancelled", "pending");
    reconfirmed.confirmed_utc = Some(Utc::now());
    let plan = reconfirmed.plan_status_transition(BookingStatus::Confirmed);
    assert!(plan.apply);
    assert!(!plan.stamp_confirmed);
}

#[test]
fn payment_status_change_is_a_real_transition() {
    let stored = booking("confirmed", "pending");
    assert!(stored.is_payment_transition(PaymentStatus::DepositPaid));
    assert!(stored.is_payment_transition(PaymentStatus::FullyPaid));
}

#[test]
fn vat_delta_applies_only_to_settled_bookings() {
    // Settled at 1,850,000, then tax pushes the total to 2,035,000.
    assert_eq!(
        vat_payable_delta(dec!(1_850_000), dec!(2_035_000), dec!(1_850_000)),
        dec!(185_000)
    );

    // Balance still open: the delta folds into the ordinary balance.
    assert_eq!(
        vat_payable_delta(dec!(1_850_000), dec!(2_035_000), dec!(1_000_000)),
        Decimal::ZERO
    );

    // Toggle off after settlement never goes negative.
    assert_eq!(
        vat_payable_delta(dec!(2_035_000), dec!(1_850_000), dec!(2_035_000)),
        Decimal::ZERO
    );
}
