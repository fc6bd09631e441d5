//! Booking handlers: create/read/update/delete, status transitions, the
//! tax-invoice toggle and the status history.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use admin_core::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::{
    models::{
        AccommodationLine, Booking, BookingStatus, CreateAccommodationLine, CreateBooking,
        CreateProductLine, Discount, DiscountKind, DiscountScope, ListBookingsFilter,
        NewAccommodationLine, NewProductLine, Payment, ProductLine,
    },
    pricing::{
        applied_voucher, apply_discounts, guest_counts_from_json, line_subtotal, price_booking,
        reconcile, resolve_nightly_rate, vat_payable_delta, BookingTotals, DiscountContext,
        DiscountOutcome, DiscountTarget, LineCharge, Reconciliation,
    },
    services::metrics::{BOOKINGS_TOTAL, VOUCHER_REDEMPTIONS_TOTAL},
    services::Notification,
    AppState,
};

/// Full create payload: booking fields plus its lines and add-ons.
#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    #[serde(flatten)]
    pub booking: CreateBooking,
    pub lines: Vec<CreateAccommodationLine>,
    #[serde(default)]
    pub products: Vec<CreateProductLine>,
    pub voucher_code: Option<String>,
}

/// A booking with everything the detail screen shows.
#[derive(Debug, Serialize)]
pub struct BookingDetail {
    pub booking: Booking,
    pub lines: Vec<AccommodationLine>,
    pub products: Vec<ProductLine>,
    pub payments: Vec<Payment>,
    pub amount_paid: Decimal,
    pub remaining: Decimal,
    pub is_fully_paid: bool,
}

#[derive(Debug, Serialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: BookingStatus,
    pub actor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaxInvoiceRequest {
    pub required: bool,
    pub actor: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TaxInvoiceResponse {
    pub booking: Booking,
    /// Tax newly owed on an already-settled booking, payable as a distinct
    /// VAT payment. Zero while the ordinary balance still absorbs the delta.
    pub vat_payable: Decimal,
}

/// One line priced and ready to persist.
struct PricedLine {
    input_index: usize,
    check_in: chrono::NaiveDate,
    check_out: chrono::NaiveDate,
    subtotal: Decimal,
    outcome: DiscountOutcome,
    ctx: DiscountContext,
}

/// The discount set a quote runs against: every active rule plus, when a
/// code was supplied, the voucher it names. An unknown code is the one
/// voucher failure that is an error rather than "not applicable".
async fn load_discounts(
    state: &AppState,
    voucher_code: Option<&str>,
) -> Result<Vec<Discount>, AppError> {
    let mut discounts = state.db.list_discounts(true).await?;
    if let Some(code) = voucher_code {
        let voucher = state
            .db
            .get_discount_by_code(code)
            .await?
            .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Unknown voucher code: {}", code)))?;
        if !discounts.iter().any(|d| d.discount_id == voucher.discount_id) {
            discounts.push(voucher);
        }
    }
    Ok(discounts)
}

fn line_context(
    zone_id: Uuid,
    category_id: Option<Uuid>,
    product_id: Option<Uuid>,
    booking_date: chrono::NaiveDate,
    redemptions: &BTreeMap<Uuid, u32>,
) -> DiscountContext {
    DiscountContext {
        booking_date: Some(booking_date),
        target: DiscountTarget {
            zone_id: Some(zone_id),
            item_type_id: category_id,
            product_id,
        },
        customer_redemptions: redemptions.clone(),
    }
}

/// Create a booking: resolve nightly rates, apply discounts, tax and
/// deposit, persist the booking with its lines and product lines.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingDetail>), AppError> {
    let booking = &payload.booking;

    let zone = state
        .db
        .get_zone(booking.zone_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Zone not found")))?;

    let nights = (booking.check_out - booking.check_in).num_days();
    if nights <= 0 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "check_out must be after check_in"
        )));
    }
    if nights < zone.min_stay_nights as i64 {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Stay of {} nights is below the zone minimum of {}",
            nights,
            zone.min_stay_nights
        )));
    }
    if payload.lines.is_empty() {
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "A booking needs at least one accommodation line"
        )));
    }

    let discounts = load_discounts(&state, payload.voucher_code.as_deref()).await?;
    let redemptions = state.db.customer_redemptions(booking.customer_id).await?;
    let guest_counts = guest_counts_from_json(&booking.guest_counts);

    // Price each accommodation line.
    let mut priced_lines = Vec::with_capacity(payload.lines.len());
    let mut items = Vec::with_capacity(payload.lines.len());
    for (index, line) in payload.lines.iter().enumerate() {
        let item = state
            .db
            .get_priceable_item(line.item_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Accommodation item {} not found", line.item_id))
            })?;

        let check_in = line.check_in.unwrap_or(booking.check_in);
        let check_out = line.check_out.unwrap_or(booking.check_out);
        let breakdown = resolve_nightly_rate(&item, check_in, check_out, &guest_counts);
        let subtotal = line_subtotal(&breakdown);

        let ctx = line_context(
            booking.zone_id,
            item.category_id,
            None,
            booking.check_in,
            &redemptions,
        );
        let outcome = apply_discounts(subtotal, &discounts, DiscountScope::PerItem, &ctx);

        priced_lines.push(PricedLine {
            input_index: index,
            check_in,
            check_out,
            subtotal,
            outcome,
            ctx,
        });
        items.push(item);
    }

    // Price each product line.
    let mut priced_products = Vec::with_capacity(payload.products.len());
    for product in &payload.products {
        if product.quantity <= 0 {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "Product quantity must be positive"
            )));
        }
        let (name, unit_price) = state
            .db
            .get_menu_item(product.menu_item_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(anyhow::anyhow!("Menu item {} not found", product.menu_item_id))
            })?;
        let subtotal = unit_price * Decimal::from(product.quantity);
        let ctx = line_context(
            booking.zone_id,
            None,
            Some(product.menu_item_id),
            booking.check_in,
            &redemptions,
        );
        let outcome = apply_discounts(subtotal, &discounts, DiscountScope::PerItem, &ctx);
        priced_products.push((name, unit_price, subtotal, outcome, ctx));
    }

    // Booking-level totals.
    let charges: Vec<LineCharge> = priced_lines
        .iter()
        .map(|l| LineCharge {
            subtotal: l.subtotal,
            ctx: l.ctx.clone(),
        })
        .chain(priced_products.iter().map(|(_, _, subtotal, _, ctx)| LineCharge {
            subtotal: *subtotal,
            ctx: ctx.clone(),
        }))
        .collect();
    let booking_ctx = line_context(booking.zone_id, None, None, booking.check_in, &redemptions);

    let tax_required = booking.tax_invoice_required.unwrap_or(false) && zone.tax_enabled;
    let tax_rate = if zone.tax_enabled { zone.tax_rate } else { Decimal::ZERO };
    let totals = price_booking(&charges, &discounts, &booking_ctx, tax_rate, tax_required);
    let deposit_due = zone.deposit_for(totals.total_amount);

    // Vouchers that actually contributed get their redemption recorded.
    let applied_vouchers: Vec<Uuid> = {
        let mut ids: Vec<Uuid> = totals
            .applied
            .iter()
            .filter_map(|a| {
                discounts
                    .iter()
                    .find(|d| d.discount_id == a.discount_id && d.kind() == DiscountKind::Voucher)
                    .map(|d| d.discount_id)
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    };

    let currency = booking
        .currency
        .clone()
        .unwrap_or_else(|| state.config.default_currency.clone());

    // Everything below persists atomically: booking, lines, products and
    // voucher redemptions commit together or not at all.
    let new_lines: Vec<NewAccommodationLine> = priced_lines
        .iter()
        .map(|priced| {
            let input = &payload.lines[priced.input_index];
            let item = &items[priced.input_index];
            let voucher = applied_voucher(&priced.outcome.applied, &discounts);
            NewAccommodationLine {
                item_id: item.item_id,
                item_name: item.item_name.clone(),
                category_id: item.category_id,
                check_in: priced.check_in,
                check_out: priced.check_out,
                subtotal: priced.subtotal,
                voucher_id: voucher.map(|v| v.discount_id),
                voucher_code: voucher.and_then(|v| v.code.clone()),
                discount_type: voucher.map(|v| v.discount_type.clone()),
                discount_value: voucher.map(|v| v.value),
                discount_amount: priced.outcome.discount_amount,
                sort_order: input.sort_order,
            }
        })
        .collect();

    let new_products: Vec<NewProductLine> = priced_products
        .iter()
        .enumerate()
        .map(|(index, (name, unit_price, _, outcome, _))| {
            let input = &payload.products[index];
            NewProductLine {
                menu_item_id: input.menu_item_id,
                menu_item_name: name.clone(),
                quantity: input.quantity,
                unit_price: *unit_price,
                discount_amount: outcome.discount_amount,
                parameter_id: input.parameter_id,
                metadata: input.metadata.clone(),
            }
        })
        .collect();

    let created = state
        .db
        .create_booking(
            booking.zone_id,
            booking.customer_id,
            booking.staff_id,
            booking.check_in,
            booking.check_out,
            &booking.guest_counts,
            &currency,
            tax_required,
            tax_rate,
            deposit_due,
            booking.notes.as_deref(),
            &totals,
            &applied_vouchers,
            &new_lines,
            &new_products,
        )
        .await?;

    BOOKINGS_TOTAL.with_label_values(&["pending"]).inc();
    for _ in &applied_vouchers {
        VOUCHER_REDEMPTIONS_TOTAL.with_label_values(&["applied"]).inc();
    }

    state.notifier.dispatch(Notification {
        recipient: "manager".to_string(),
        event: "booking_created".to_string(),
        payload: BTreeMap::from([
            ("booking_id".to_string(), created.booking_id.to_string()),
            ("total".to_string(), created.total_amount.to_string()),
            ("currency".to_string(), created.currency.clone()),
        ]),
    });

    let detail = booking_detail(&state, created).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Get a booking with lines, products, payments and the live balance.
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetail>, AppError> {
    let booking = state
        .db
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    Ok(Json(booking_detail(&state, booking).await?))
}

/// List bookings with filters and page/limit pagination.
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(filter): Query<ListBookingsFilter>,
) -> Result<Json<BookingListResponse>, AppError> {
    let mut filter = filter;
    if filter.limit == 0 {
        filter.limit = 20;
    }
    if filter.page == 0 {
        filter.page = 1;
    }
    let (bookings, total) = state.db.list_bookings(&filter).await?;
    Ok(Json(BookingListResponse {
        bookings,
        total,
        page: filter.page,
        limit: filter.limit,
    }))
}

/// Update booking details and re-price when dates or guest counts changed.
pub async fn update_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(input): Json<crate::models::UpdateBooking>,
) -> Result<Json<BookingDetail>, AppError> {
    let existing = state
        .db
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    let reprice = input.check_in.is_some()
        || input.check_out.is_some()
        || input.guest_counts.is_some();

    let booking = state
        .db
        .update_booking_details(booking_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    if reprice {
        let zone = state
            .db
            .get_zone(booking.zone_id)
            .await?
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Zone not found")))?;
        let discounts = load_discounts(&state, None).await?;
        let redemptions = state.db.customer_redemptions(booking.customer_id).await?;
        let guest_counts = guest_counts_from_json(&booking.guest_counts);
        let dates_changed =
            existing.check_in != booking.check_in || existing.check_out != booking.check_out;

        // Re-resolve every line against the catalog.
        for line in state.db.get_lines(booking_id).await? {
            let item = state
                .db
                .get_priceable_item(line.item_id)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(anyhow::anyhow!(
                        "Accommodation item {} no longer exists",
                        line.item_id
                    ))
                })?;
            let (check_in, check_out) = line_stay(
                dates_changed,
                (booking.check_in, booking.check_out),
                (line.check_in, line.check_out),
            );
            let breakdown = resolve_nightly_rate(&item, check_in, check_out, &guest_counts);
            let subtotal = line_subtotal(&breakdown);
            let ctx = line_context(
                booking.zone_id,
                item.category_id,
                None,
                booking.check_in,
                &redemptions,
            );
            let outcome = apply_discounts(subtotal, &discounts, DiscountScope::PerItem, &ctx);
            state
                .db
                .update_line_pricing(
                    line.line_id,
                    check_in,
                    check_out,
                    subtotal,
                    outcome.discount_amount,
                )
                .await?;
        }

        let totals = reprice_stored_booking(
            &state,
            &booking,
            &discounts,
            &redemptions,
            booking.tax_invoice_required,
            booking.tax_rate,
        )
        .await?;
        let payments = state.db.get_payments(booking_id).await?;
        let rec = reconcile(totals.total_amount, &payments);
        let deposit_due = zone.deposit_for(totals.total_amount);
        state
            .db
            .update_booking_totals(booking_id, &totals, rec.remaining, deposit_due)
            .await?;
    } else if existing.notes != booking.notes || existing.staff_id != booking.staff_id {
        tracing::debug!(booking_id = %booking_id, "Booking details updated without re-pricing");
    }

    let booking = state
        .db
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;
    Ok(Json(booking_detail(&state, booking).await?))
}

/// Update booking lifecycle status. Idempotent: re-setting the current
/// status stamps nothing, appends no history and fires no notification.
pub async fn update_status(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    let result = state
        .db
        .update_booking_status(booking_id, payload.status, payload.actor.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    let (booking, changed) = result;
    if changed {
        BOOKINGS_TOTAL
            .with_label_values(&[payload.status.as_str()])
            .inc();
        state.notifier.dispatch(Notification {
            recipient: booking.customer_id.to_string(),
            event: format!("booking_{}", payload.status.as_str()),
            payload: BTreeMap::from([
                ("booking_id".to_string(), booking.booking_id.to_string()),
                ("status".to_string(), payload.status.as_str().to_string()),
            ]),
        });
    }

    Ok(Json(booking))
}

/// Toggle the tax-invoice requirement, recomputing totals and balance
/// without touching recorded payments.
pub async fn set_tax_invoice(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
    Json(payload): Json<TaxInvoiceRequest>,
) -> Result<Json<TaxInvoiceResponse>, AppError> {
    let booking = state
        .db
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    let zone = state
        .db
        .get_zone(booking.zone_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Zone not found")))?;

    let required = payload.required && zone.tax_enabled;
    let tax_rate = if zone.tax_enabled { zone.tax_rate } else { Decimal::ZERO };

    let discounts = load_discounts(&state, None).await?;
    let redemptions = state.db.customer_redemptions(booking.customer_id).await?;
    let totals =
        reprice_stored_booking(&state, &booking, &discounts, &redemptions, required, tax_rate)
            .await?;

    let payments = state.db.get_payments(booking_id).await?;
    let rec = reconcile(totals.total_amount, &payments);
    let vat_payable = vat_payable_delta(booking.total_amount, totals.total_amount, rec.amount_paid);

    let booking = state
        .db
        .set_tax_invoice_required(
            booking_id,
            required,
            tax_rate,
            &totals,
            rec.remaining,
            payload.actor.as_deref(),
        )
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;

    Ok(Json(TaxInvoiceResponse {
        booking,
        vat_payable,
    }))
}

/// Delete a booking and everything it owns.
pub async fn delete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if state.db.delete_booking(booking_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(anyhow::anyhow!("Booking not found")))
    }
}

/// Status-history records for a booking.
pub async fn get_history(
    State(state): State<AppState>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<Vec<crate::models::StatusHistory>>, AppError> {
    state
        .db
        .get_booking(booking_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Booking not found")))?;
    Ok(Json(state.db.get_status_history(booking_id).await?))
}

/// Stay dates to re-price a line with. A line keeps its own stay override
/// unless the booking-level dates themselves moved, which re-syncs every
/// line to the new stay.
fn line_stay(
    booking_dates_changed: bool,
    booking: (chrono::NaiveDate, chrono::NaiveDate),
    line: (chrono::NaiveDate, chrono::NaiveDate),
) -> (chrono::NaiveDate, chrono::NaiveDate) {
    if booking_dates_changed {
        booking
    } else {
        line
    }
}

/// Recompute booking totals from its stored lines and product lines.
async fn reprice_stored_booking(
    state: &AppState,
    booking: &Booking,
    discounts: &[Discount],
    redemptions: &BTreeMap<Uuid, u32>,
    tax_required: bool,
    tax_rate: Decimal,
) -> Result<BookingTotals, AppError> {
    let lines = state.db.get_lines(booking.booking_id).await?;
    let products = state.db.get_product_lines(booking.booking_id).await?;

    let charges: Vec<LineCharge> = lines
        .iter()
        .map(|l| LineCharge {
            subtotal: l.subtotal,
            ctx: line_context(
                booking.zone_id,
                l.category_id,
                None,
                booking.check_in,
                redemptions,
            ),
        })
        .chain(products.iter().map(|p| LineCharge {
            subtotal: p.subtotal(),
            ctx: line_context(
                booking.zone_id,
                None,
                Some(p.menu_item_id),
                booking.check_in,
                redemptions,
            ),
        }))
        .collect();

    let booking_ctx = line_context(booking.zone_id, None, None, booking.check_in, redemptions);
    Ok(price_booking(
        &charges,
        discounts,
        &booking_ctx,
        tax_rate,
        tax_required,
    ))
}

/// Assemble the booking detail response.
async fn booking_detail(state: &AppState, booking: Booking) -> Result<BookingDetail, AppError> {
    let lines = state.db.get_lines(booking.booking_id).await?;
    let products = state.db.get_product_lines(booking.booking_id).await?;
    let payments = state.db.get_payments(booking.booking_id).await?;
    let Reconciliation {
        amount_paid,
        remaining,
        is_fully_paid,
    } = reconcile(booking.total_amount, &payments);

    Ok(BookingDetail {
        booking,
        lines,
        products,
        payments,
        amount_paid,
        remaining,
        is_fully_paid,
    })
}

#[cfg(test)]
mod tests {
    use super::line_stay;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn line_keeps_its_stay_override_when_booking_dates_are_unchanged() {
        let booking = (date(2025, 8, 1), date(2025, 8, 5));
        let line = (date(2025, 8, 2), date(2025, 8, 4));
        assert_eq!(line_stay(false, booking, line), line);
    }

    #[test]
    fn moved_booking_dates_resync_every_line() {
        let booking = (date(2025, 8, 10), date(2025, 8, 14));
        let line = (date(2025, 8, 2), date(2025, 8, 4));
        assert_eq!(line_stay(true, booking, line), booking);
    }
}
