//! Payment model for booking-service.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Payment statuses that count toward "amount paid". The gateway reports
/// settled payments under several labels; all three are equivalent.
pub const SETTLED_STATUSES: [&str; 3] = ["successful", "completed", "success"];

/// A recorded payment event against a booking. Append-only from the
/// reconciler's perspective.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub method: String,
    pub amount: Decimal,
    pub status: String,
    pub transaction_ref: Option<String>,
    /// Marks the payment as covering a tax delta raised after settlement.
    pub is_vat_payment: bool,
    pub paid_utc: Option<DateTime<Utc>>,
    pub created_utc: DateTime<Utc>,
}

impl Payment {
    pub fn is_settled(&self) -> bool {
        SETTLED_STATUSES.contains(&self.status.as_str())
    }
}

/// Input for recording a payment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    pub method: String,
    pub amount: Decimal,
    pub status: String,
    pub transaction_ref: Option<String>,
    #[serde(default)]
    pub is_vat_payment: bool,
    pub paid_utc: Option<DateTime<Utc>>,
}
