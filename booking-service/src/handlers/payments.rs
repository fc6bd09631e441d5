//! Payment handlers: record a payment, reconcile the balance and advance
//! the booking's payment status when the settled sum says so.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use admin_core::error::AppError;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    models::{CreatePayment, Payment},
    pricing::{reconcile, suggested_payment_status},
    services::metrics::PAYMENTS_TOTAL,
    services::Notification,
    AppState,
};

#[derive(Debug, Serialize)]
pub struct RecordPaymentResponse {
    pub payment: Payment,
    pub amount_paid: Decimal,
    pub remaining: Decimal,
    pub is_fully_paid: bool,
    pub payment_status: String,
}

/// Record a payment against a booking. Settled payments fold into the paid
/// sum; the payment status moves forward only when the reconciliation says
/// so and never touches refund states.
pub async fn record_payment(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<CreatePayment>,
) -> Result<(StatusCode, Json<RecordPaymentResponse>), AppError> {
    if input.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Payment amount must be positive"
        )));
    }

    let booking = state
        .db
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    let payment = state.db.record_payment(booking_id, &input).await?;
    PAYMENTS_TOTAL.with_label_values(&[&input.method]).inc();

    let payments = state.db.get_payments(booking_id).await?;
    let rec = reconcile(booking.total_amount, &payments);

    let mut payment_status = booking.payment_status.clone();
    if let Some(next) = suggested_payment_status(booking.payment_status(), &rec, booking.deposit_due)
    {
        if let Some((updated, changed)) = state
            .db
            .update_payment_status(booking_id, next, None)
            .await?
        {
            payment_status = updated.payment_status.clone();
            if changed {
                state.notifier.dispatch(Notification {
                    recipient: booking.customer_id.to_string(),
                    event: "payment_status_changed".to_string(),
                    payload: BTreeMap::from([
                        ("booking_id".to_string(), booking_id.to_string()),
                        ("payment_status".to_string(), next.as_str().to_string()),
                        ("amount_paid".to_string(), rec.amount_paid.to_string()),
                    ]),
                });
            }
        }
    }

    Ok((
        StatusCode::CREATED,
        Json(RecordPaymentResponse {
            payment,
            amount_paid: rec.amount_paid,
            remaining: rec.remaining,
            is_fully_paid: rec.is_fully_paid,
            payment_status,
        }),
    ))
}

/// Payments recorded against a booking, oldest first.
pub async fn list_payments(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<Payment>>, AppError> {
    state
        .db
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;
    Ok(Json(state.db.get_payments(booking_id).await?))
}
