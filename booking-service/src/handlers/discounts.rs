//! Discount and voucher handlers: CRUD plus an applicability preview.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use admin_core::error::AppError;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{CreateDiscountRequest, Discount, UpdateDiscount},
    pricing::{discount_amount, is_applicable, DiscountContext, DiscountTarget},
    services::metrics::VOUCHER_REDEMPTIONS_TOTAL,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct ListDiscountsQuery {
    #[serde(default)]
    pub active_only: bool,
}

/// Preview input: a hypothetical base amount and target to test a code
/// against, without touching any booking.
#[derive(Debug, Deserialize)]
pub struct PreviewRequest {
    pub code: String,
    pub amount: Decimal,
    pub customer_id: Option<Uuid>,
    pub zone_id: Option<Uuid>,
    pub item_type_id: Option<Uuid>,
    pub product_id: Option<Uuid>,
    pub booking_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    pub applicable: bool,
    pub discount_amount: Decimal,
    pub net_amount: Decimal,
    pub discount: Discount,
}

pub async fn create_discount(
    State(state): State<AppState>,
    Json(input): Json<CreateDiscountRequest>,
) -> Result<(StatusCode, Json<Discount>), AppError> {
    input.validate()?;
    let discount = state.db.create_discount(&input).await?;
    Ok((StatusCode::CREATED, Json(discount)))
}

pub async fn get_discount(
    State(state): State<AppState>,
    Path(discount_id): Path<Uuid>,
) -> Result<Json<Discount>, AppError> {
    let discount = state
        .db
        .get_discount(discount_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Discount not found")))?;
    Ok(Json(discount))
}

pub async fn list_discounts(
    State(state): State<AppState>,
    Query(query): Query<ListDiscountsQuery>,
) -> Result<Json<Vec<Discount>>, AppError> {
    Ok(Json(state.db.list_discounts(query.active_only).await?))
}

pub async fn update_discount(
    State(state): State<AppState>,
    Path(discount_id): Path<Uuid>,
    Json(input): Json<UpdateDiscount>,
) -> Result<Json<Discount>, AppError> {
    let discount = state
        .db
        .update_discount(discount_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Discount not found")))?;
    Ok(Json(discount))
}

pub async fn delete_discount(
    State(state): State<AppState>,
    Path(discount_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.db.delete_discount(discount_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!("Discount not found")))
    }
}

/// Dry-run a voucher code against a hypothetical amount. Unknown codes are
/// an error; a known code that fails a gate previews as not applicable.
pub async fn preview_voucher(
    State(state): State<AppState>,
    Json(input): Json<PreviewRequest>,
) -> Result<Json<PreviewResponse>, AppError> {
    let discount = state
        .db
        .get_discount_by_code(&input.code)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(anyhow::anyhow!("Unknown voucher code: {}", input.code))
        })?;

    let customer_redemptions = match input.customer_id {
        Some(customer_id) => state.db.customer_redemptions(customer_id).await?,
        None => Default::default(),
    };

    let ctx = DiscountContext {
        booking_date: input.booking_date,
        target: DiscountTarget {
            zone_id: input.zone_id,
            item_type_id: input.item_type_id,
            product_id: input.product_id,
        },
        customer_redemptions,
    };

    let applicable = is_applicable(&discount, input.amount, &ctx);
    let amount = if applicable {
        discount_amount(&discount, input.amount.max(Decimal::ZERO))
    } else {
        Decimal::ZERO
    };

    VOUCHER_REDEMPTIONS_TOTAL
        .with_label_values(&[if applicable { "preview_ok" } else { "preview_rejected" }])
        .inc();

    Ok(Json(PreviewResponse {
        applicable,
        discount_amount: amount,
        net_amount: input.amount - amount,
        discount,
    }))
}
