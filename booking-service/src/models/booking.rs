//! Booking model for booking-service.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Booking lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "confirmed" => BookingStatus::Confirmed,
            "checked_in" => BookingStatus::CheckedIn,
            "checked_out" => BookingStatus::CheckedOut,
            "cancelled" => BookingStatus::Cancelled,
            _ => BookingStatus::Pending,
        }
    }
}

/// Payment status of a booking, advanced independently of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    DepositPaid,
    FullyPaid,
    RefundPending,
    Refunded,
    NoRefund,
    Expired,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::DepositPaid => "deposit_paid",
            PaymentStatus::FullyPaid => "fully_paid",
            PaymentStatus::RefundPending => "refund_pending",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::NoRefund => "no_refund",
            PaymentStatus::Expired => "expired",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "deposit_paid" => PaymentStatus::DepositPaid,
            "fully_paid" => PaymentStatus::FullyPaid,
            "refund_pending" => PaymentStatus::RefundPending,
            "refunded" => PaymentStatus::Refunded,
            "no_refund" => PaymentStatus::NoRefund,
            "expired" => PaymentStatus::Expired,
            _ => PaymentStatus::Pending,
        }
    }
}

/// Booking row.
///
/// Money invariant: `total_amount = subtotal_amount - discount_amount +
/// tax_amount`, tax applied only while `tax_invoice_required` is set.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub booking_id: Uuid,
    pub zone_id: Uuid,
    pub customer_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    /// Guest-type key to head count, e.g. `{"adult": 2, "child": 1}`.
    pub guest_counts: serde_json::Value,
    pub subtotal_amount: Decimal,
    pub discount_amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,
    pub deposit_due: Decimal,
    pub balance_due: Decimal,
    pub currency: String,
    pub tax_invoice_required: bool,
    pub tax_rate: Decimal,
    pub notes: Option<String>,
    pub created_utc: DateTime<Utc>,
    pub confirmed_utc: Option<DateTime<Utc>>,
    pub cancelled_utc: Option<DateTime<Utc>>,
}

impl Booking {
    pub fn status(&self) -> BookingStatus {
        BookingStatus::from_string(&self.status)
    }

    pub fn payment_status(&self) -> PaymentStatus {
        PaymentStatus::from_string(&self.payment_status)
    }

    /// Plan a lifecycle-status change. Re-setting the current status is a
    /// no-op: nothing is stamped, no history is appended, nothing fires.
    /// Confirm/cancel timestamps are stamped on the first transition only.
    pub fn plan_status_transition(&self, requested: BookingStatus) -> TransitionPlan {
        if self.status == requested.as_str() {
            return TransitionPlan::noop();
        }
        TransitionPlan {
            apply: true,
            stamp_confirmed: requested == BookingStatus::Confirmed && self.confirmed_utc.is_none(),
            stamp_cancelled: requested == BookingStatus::Cancelled && self.cancelled_utc.is_none(),
        }
    }

    /// Payment-status analogue of [`Booking::plan_status_transition`]: only
    /// a real change is applied and recorded.
    pub fn is_payment_transition(&self, requested: PaymentStatus) -> bool {
        self.payment_status != requested.as_str()
    }
}

/// Decision for a requested status change against the stored row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionPlan {
    pub apply: bool,
    pub stamp_confirmed: bool,
    pub stamp_cancelled: bool,
}

impl TransitionPlan {
    pub fn noop() -> Self {
        TransitionPlan {
            apply: false,
            stamp_confirmed: false,
            stamp_cancelled: false,
        }
    }
}

/// Append-only status-history record, written in the same transaction as
/// the booking update it describes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusHistory {
    pub history_id: Uuid,
    pub booking_id: Uuid,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub actor: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Filter parameters for listing bookings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListBookingsFilter {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub zone_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub check_in_from: Option<NaiveDate>,
    pub check_in_to: Option<NaiveDate>,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
}

/// Input for creating a booking.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBooking {
    pub zone_id: Uuid,
    pub customer_id: Uuid,
    pub staff_id: Option<Uuid>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    #[serde(default)]
    pub guest_counts: serde_json::Value,
    pub currency: Option<String>,
    pub tax_invoice_required: Option<bool>,
    pub notes: Option<String>,
}

/// Input for updating booking details (re-priced on save).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateBooking {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
    pub guest_counts: Option<serde_json::Value>,
    pub staff_id: Option<Uuid>,
    pub notes: Option<String>,
}
