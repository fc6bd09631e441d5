//! Database service for booking-service.

use crate::models::{
    AccommodationLine, Booking, BookingStatus, CreateDiscountRequest, CreatePayment, Discount,
    ListBookingsFilter, NewAccommodationLine, NewProductLine, Payment, PaymentStatus,
    PriceableItem, ProductLine, SettingsAudit, StatusHistory, UpdateDiscount, UpdateZoneSettings,
    ZoneSettings,
};
use crate::pricing::BookingTotals;
use crate::services::metrics::DB_QUERY_DURATION;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use admin_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const BOOKING_COLUMNS: &str = "booking_id, zone_id, customer_id, staff_id, status, payment_status, \
    check_in, check_out, guest_counts, subtotal_amount, discount_amount, tax_amount, total_amount, \
    deposit_due, balance_due, currency, tax_invoice_required, tax_rate, notes, created_utc, \
    confirmed_utc, cancelled_utc";

const DISCOUNT_COLUMNS: &str = "discount_id, kind, code, name, discount_type, value, \
    max_discount_amount, scope, zone_ids, item_type_ids, product_ids, valid_from, valid_to, \
    usage_limit, per_customer_limit, usage_count, min_order_amount, weekdays, priority, active, \
    created_utc";

const LINE_COLUMNS: &str = "line_id, booking_id, item_id, item_name, category_id, check_in, \
    check_out, nights, subtotal, voucher_id, voucher_code, discount_type, discount_value, \
    discount_amount, sort_order, created_utc";

const PAYMENT_COLUMNS: &str = "payment_id, booking_id, method, amount, status, transaction_ref, \
    is_vat_payment, paid_utc, created_utc";

const PRODUCT_COLUMNS: &str = "product_line_id, booking_id, menu_item_id, menu_item_name, \
    quantity, unit_price, discount_amount, parameter_id, metadata, created_utc";

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "booking-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Zone Settings Operations
    // -------------------------------------------------------------------------

    /// Get settings for a zone.
    #[instrument(skip(self), fields(zone_id = %zone_id))]
    pub async fn get_zone(&self, zone_id: Uuid) -> Result<Option<ZoneSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_zone"])
            .start_timer();

        let zone = sqlx::query_as::<_, ZoneSettings>(
            r#"
            SELECT zone_id, name, tax_enabled, tax_rate, deposit_mode, deposit_value,
                commission_rate, min_stay_nights, created_utc, updated_utc
            FROM zones
            WHERE zone_id = $1
            "#,
        )
        .bind(zone_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get zone: {}", e)))?;

        timer.observe_duration();

        Ok(zone)
    }

    /// List all zones.
    #[instrument(skip(self))]
    pub async fn list_zones(&self) -> Result<Vec<ZoneSettings>, AppError> {
        let zones = sqlx::query_as::<_, ZoneSettings>(
            r#"
            SELECT zone_id, name, tax_enabled, tax_rate, deposit_mode, deposit_value,
                commission_rate, min_stay_nights, created_utc, updated_utc
            FROM zones
            ORDER BY created_utc
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list zones: {}", e)))?;

        Ok(zones)
    }

    /// Update zone settings, appending one audit record per changed field in
    /// the same transaction.
    #[instrument(skip(self, input), fields(zone_id = %zone_id))]
    pub async fn update_zone_settings(
        &self,
        zone_id: Uuid,
        input: &UpdateZoneSettings,
    ) -> Result<Option<ZoneSettings>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_zone_settings"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, ZoneSettings>(
            r#"
            SELECT zone_id, name, tax_enabled, tax_rate, deposit_mode, deposit_value,
                commission_rate, min_stay_nights, created_utc, updated_utc
            FROM zones
            WHERE zone_id = $1
            FOR UPDATE
            "#,
        )
        .bind(zone_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get zone: {}", e)))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        // One audit row per field that actually changes.
        let mut changes: Vec<(&str, String, String)> = Vec::new();
        if let Some(name) = &input.name {
            if *name != existing.name {
                changes.push(("name", existing.name.to_string(), name.to_string()));
            }
        }
        if let Some(enabled) = input.tax_enabled {
            if enabled != existing.tax_enabled {
                changes.push((
                    "tax_enabled",
                    existing.tax_enabled.to_string(),
                    enabled.to_string(),
                ));
            }
        }
        if let Some(rate) = input.tax_rate {
            if rate != existing.tax_rate {
                changes.push(("tax_rate", existing.tax_rate.to_string(), rate.to_string()));
            }
        }
        if let Some(mode) = input.deposit_mode {
            if mode.as_str() != existing.deposit_mode {
                changes.push((
                    "deposit_mode",
                    existing.deposit_mode.clone(),
                    mode.as_str().to_string(),
                ));
            }
        }
        if let Some(value) = input.deposit_value {
            if value != existing.deposit_value {
                changes.push((
                    "deposit_value",
                    existing.deposit_value.to_string(),
                    value.to_string(),
                ));
            }
        }
        if let Some(rate) = input.commission_rate {
            if rate != existing.commission_rate {
                changes.push((
                    "commission_rate",
                    existing.commission_rate.to_string(),
                    rate.to_string(),
                ));
            }
        }
        if let Some(nights) = input.min_stay_nights {
            if nights != existing.min_stay_nights {
                changes.push((
                    "min_stay_nights",
                    existing.min_stay_nights.to_string(),
                    nights.to_string(),
                ));
            }
        }

        let zone = sqlx::query_as::<_, ZoneSettings>(
            r#"
            UPDATE zones
            SET name = COALESCE($2, name),
                tax_enabled = COALESCE($3, tax_enabled),
                tax_rate = COALESCE($4, tax_rate),
                deposit_mode = COALESCE($5, deposit_mode),
                deposit_value = COALESCE($6, deposit_value),
                commission_rate = COALESCE($7, commission_rate),
                min_stay_nights = COALESCE($8, min_stay_nights),
                updated_utc = NOW()
            WHERE zone_id = $1
            RETURNING zone_id, name, tax_enabled, tax_rate, deposit_mode, deposit_value,
                commission_rate, min_stay_nights, created_utc, updated_utc
            "#,
        )
        .bind(zone_id)
        .bind(&input.name)
        .bind(input.tax_enabled)
        .bind(input.tax_rate)
        .bind(input.deposit_mode.map(|m| m.as_str().to_string()))
        .bind(input.deposit_value)
        .bind(input.commission_rate)
        .bind(input.min_stay_nights)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update zone: {}", e)))?;

        for (field, old_value, new_value) in &changes {
            sqlx::query(
                r#"
                INSERT INTO zone_settings_audit (audit_id, zone_id, field, old_value, new_value, reason, actor)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(zone_id)
            .bind(field)
            .bind(old_value)
            .bind(new_value)
            .bind(&input.reason)
            .bind(&input.actor)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to append settings audit: {}", e))
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit zone update: {}", e))
        })?;

        timer.observe_duration();

        info!(zone_id = %zone_id, changed_fields = changes.len(), "Zone settings updated");

        Ok(Some(zone))
    }

    /// List the settings-audit history for a zone, newest first.
    #[instrument(skip(self), fields(zone_id = %zone_id))]
    pub async fn list_zone_audit(&self, zone_id: Uuid) -> Result<Vec<SettingsAudit>, AppError> {
        let audit = sqlx::query_as::<_, SettingsAudit>(
            r#"
            SELECT audit_id, zone_id, field, old_value, new_value, reason, actor, created_utc
            FROM zone_settings_audit
            WHERE zone_id = $1
            ORDER BY created_utc DESC
            "#,
        )
        .bind(zone_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list zone audit: {}", e)))?;

        Ok(audit)
    }

    // -------------------------------------------------------------------------
    // Discount Operations
    // -------------------------------------------------------------------------

    /// Create a discount or voucher.
    #[instrument(skip(self, input), fields(kind = %input.kind.as_str(), name = %input.name))]
    pub async fn create_discount(
        &self,
        input: &CreateDiscountRequest,
    ) -> Result<Discount, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_discount"])
            .start_timer();

        let discount_id = Uuid::new_v4();
        let discount = sqlx::query_as::<_, Discount>(&format!(
            r#"
            INSERT INTO discounts (
                discount_id, kind, code, name, discount_type, value, max_discount_amount,
                scope, zone_ids, item_type_ids, product_ids, valid_from, valid_to,
                usage_limit, per_customer_limit, min_order_amount, weekdays, priority, active
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
            RETURNING {DISCOUNT_COLUMNS}
            "#,
        ))
        .bind(discount_id)
        .bind(input.kind.as_str())
        .bind(&input.code)
        .bind(&input.name)
        .bind(input.discount_type.as_str())
        .bind(input.value)
        .bind(input.max_discount_amount)
        .bind(input.scope.as_str())
        .bind(&input.zone_ids)
        .bind(&input.item_type_ids)
        .bind(&input.product_ids)
        .bind(input.valid_from)
        .bind(input.valid_to)
        .bind(input.usage_limit)
        .bind(input.per_customer_limit)
        .bind(input.min_order_amount)
        .bind(&input.weekdays)
        .bind(input.priority)
        .bind(input.active)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!(
                    "Voucher code '{}' already exists",
                    input.code.as_deref().unwrap_or("")
                ))
            }
            _ => AppError::DatabaseError(anyhow::anyhow!("Failed to create discount: {}", e)),
        })?;

        timer.observe_duration();

        info!(discount_id = %discount.discount_id, name = %discount.name, "Discount created");

        Ok(discount)
    }

    /// Get a discount by ID.
    #[instrument(skip(self), fields(discount_id = %discount_id))]
    pub async fn get_discount(&self, discount_id: Uuid) -> Result<Option<Discount>, AppError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE discount_id = $1"
        ))
        .bind(discount_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get discount: {}", e)))?;

        Ok(discount)
    }

    /// Look up a voucher by its redemption code.
    #[instrument(skip(self), fields(code = %code))]
    pub async fn get_discount_by_code(&self, code: &str) -> Result<Option<Discount>, AppError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            "SELECT {DISCOUNT_COLUMNS} FROM discounts WHERE code = $1"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get voucher: {}", e)))?;

        Ok(discount)
    }

    /// List discounts, optionally only active ones.
    #[instrument(skip(self))]
    pub async fn list_discounts(&self, active_only: bool) -> Result<Vec<Discount>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_discounts"])
            .start_timer();

        let discounts = sqlx::query_as::<_, Discount>(&format!(
            r#"
            SELECT {DISCOUNT_COLUMNS}
            FROM discounts
            WHERE ($1::bool = FALSE OR active = TRUE)
            ORDER BY priority, created_utc, discount_id
            "#
        ))
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list discounts: {}", e)))?;

        timer.observe_duration();

        Ok(discounts)
    }

    /// Update a discount.
    #[instrument(skip(self, input), fields(discount_id = %discount_id))]
    pub async fn update_discount(
        &self,
        discount_id: Uuid,
        input: &UpdateDiscount,
    ) -> Result<Option<Discount>, AppError> {
        let discount = sqlx::query_as::<_, Discount>(&format!(
            r#"
            UPDATE discounts
            SET name = COALESCE($2, name),
                value = COALESCE($3, value),
                max_discount_amount = COALESCE($4, max_discount_amount),
                valid_from = COALESCE($5, valid_from),
                valid_to = COALESCE($6, valid_to),
                usage_limit = COALESCE($7, usage_limit),
                per_customer_limit = COALESCE($8, per_customer_limit),
                min_order_amount = COALESCE($9, min_order_amount),
                weekdays = COALESCE($10, weekdays),
                priority = COALESCE($11, priority),
                active = COALESCE($12, active)
            WHERE discount_id = $1
            RETURNING {DISCOUNT_COLUMNS}
            "#
        ))
        .bind(discount_id)
        .bind(&input.name)
        .bind(input.value)
        .bind(input.max_discount_amount)
        .bind(input.valid_from)
        .bind(input.valid_to)
        .bind(input.usage_limit)
        .bind(input.per_customer_limit)
        .bind(input.min_order_amount)
        .bind(&input.weekdays)
        .bind(input.priority)
        .bind(input.active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to update discount: {}", e)))?;

        Ok(discount)
    }

    /// Delete a discount.
    #[instrument(skip(self), fields(discount_id = %discount_id))]
    pub async fn delete_discount(&self, discount_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM discounts WHERE discount_id = $1")
            .bind(discount_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete discount: {}", e))
            })?;

        Ok(result.rows_affected() > 0)
    }

    /// This customer's prior redemption count per discount id.
    #[instrument(skip(self), fields(customer_id = %customer_id))]
    pub async fn customer_redemptions(
        &self,
        customer_id: Uuid,
    ) -> Result<BTreeMap<Uuid, u32>, AppError> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            r#"
            SELECT discount_id, COUNT(*)
            FROM voucher_redemptions
            WHERE customer_id = $1
            GROUP BY discount_id
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to count redemptions: {}", e))
        })?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, count.max(0) as u32))
            .collect())
    }

    // -------------------------------------------------------------------------
    // Booking Operations
    // -------------------------------------------------------------------------

    /// Create a booking with its priced accommodation lines, product lines
    /// and computed totals in one transaction. Redemptions for any applied
    /// vouchers are recorded in the same transaction, so a failed line
    /// insert rolls back the booking and the voucher usage with it.
    #[instrument(
        skip(self, totals, applied_discounts, lines, products),
        fields(zone_id = %zone_id, customer_id = %customer_id)
    )]
    #[allow(clippy::too_many_arguments)]
    pub async fn create_booking(
        &self,
        zone_id: Uuid,
        customer_id: Uuid,
        staff_id: Option<Uuid>,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guest_counts: &serde_json::Value,
        currency: &str,
        tax_invoice_required: bool,
        tax_rate: Decimal,
        deposit_due: Decimal,
        notes: Option<&str>,
        totals: &BookingTotals,
        applied_discounts: &[Uuid],
        lines: &[NewAccommodationLine],
        products: &[NewProductLine],
    ) -> Result<Booking, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_booking"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let booking_id = Uuid::new_v4();
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            INSERT INTO bookings (
                booking_id, zone_id, customer_id, staff_id, status, payment_status,
                check_in, check_out, guest_counts, subtotal_amount, discount_amount,
                tax_amount, total_amount, deposit_due, balance_due, currency,
                tax_invoice_required, tax_rate, notes
            )
            VALUES ($1, $2, $3, $4, 'pending', 'pending', $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(booking_id)
        .bind(zone_id)
        .bind(customer_id)
        .bind(staff_id)
        .bind(check_in)
        .bind(check_out)
        .bind(guest_counts)
        .bind(totals.subtotal_amount)
        .bind(totals.discount_amount)
        .bind(totals.tax_amount)
        .bind(totals.total_amount)
        .bind(deposit_due)
        .bind(totals.total_amount)
        .bind(currency)
        .bind(tax_invoice_required)
        .bind(tax_rate)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to create booking: {}", e)))?;

        for line in lines {
            let nights = (line.check_out - line.check_in).num_days().max(0) as i32;
            sqlx::query(
                r#"
                INSERT INTO booking_lines (
                    line_id, booking_id, item_id, item_name, category_id, check_in, check_out,
                    nights, subtotal, voucher_id, voucher_code, discount_type, discount_value,
                    discount_amount, sort_order
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(booking_id)
            .bind(line.item_id)
            .bind(&line.item_name)
            .bind(line.category_id)
            .bind(line.check_in)
            .bind(line.check_out)
            .bind(nights)
            .bind(line.subtotal)
            .bind(line.voucher_id)
            .bind(&line.voucher_code)
            .bind(&line.discount_type)
            .bind(line.discount_value)
            .bind(line.discount_amount)
            .bind(line.sort_order)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to add line: {}", e)))?;
        }

        for product in products {
            sqlx::query(
                r#"
                INSERT INTO booking_products (
                    product_line_id, booking_id, menu_item_id, menu_item_name, quantity,
                    unit_price, discount_amount, parameter_id, metadata
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(booking_id)
            .bind(product.menu_item_id)
            .bind(&product.menu_item_name)
            .bind(product.quantity)
            .bind(product.unit_price)
            .bind(product.discount_amount)
            .bind(product.parameter_id)
            .bind(&product.metadata)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to add product line: {}", e))
            })?;
        }

        for discount_id in applied_discounts {
            sqlx::query(
                r#"
                INSERT INTO voucher_redemptions (redemption_id, discount_id, booking_id, customer_id)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(discount_id)
            .bind(booking_id)
            .bind(customer_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to record redemption: {}", e))
            })?;

            sqlx::query("UPDATE discounts SET usage_count = usage_count + 1 WHERE discount_id = $1")
                .bind(discount_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to bump voucher usage: {}", e))
                })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit booking: {}", e))
        })?;

        timer.observe_duration();

        info!(booking_id = %booking.booking_id, total = %booking.total_amount, "Booking created");

        Ok(booking)
    }

    /// Get a booking by ID.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Option<Booking>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_booking"])
            .start_timer();

        let booking = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1"
        ))
        .bind(booking_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get booking: {}", e)))?;

        timer.observe_duration();

        Ok(booking)
    }

    /// List bookings with page/limit pagination; returns the rows plus the
    /// total count over the same filtered set.
    #[instrument(skip(self, filter))]
    pub async fn list_bookings(
        &self,
        filter: &ListBookingsFilter,
    ) -> Result<(Vec<Booking>, i64), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_bookings"])
            .start_timer();

        let limit = filter.limit.clamp(1, 100);
        let page = filter.page.max(1);
        let offset = (page - 1) * limit;
        let status = filter.status.map(|s| s.as_str().to_string());
        let payment_status = filter.payment_status.map(|s| s.as_str().to_string());

        let where_clause = r#"
            WHERE ($1::varchar IS NULL OR status = $1)
              AND ($2::varchar IS NULL OR payment_status = $2)
              AND ($3::uuid IS NULL OR zone_id = $3)
              AND ($4::uuid IS NULL OR customer_id = $4)
              AND ($5::date IS NULL OR check_in >= $5)
              AND ($6::date IS NULL OR check_in <= $6)
        "#;

        let bookings = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings {where_clause} \
             ORDER BY created_utc DESC LIMIT $7 OFFSET $8"
        ))
        .bind(&status)
        .bind(&payment_status)
        .bind(filter.zone_id)
        .bind(filter.customer_id)
        .bind(filter.check_in_from)
        .bind(filter.check_in_to)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to list bookings: {}", e)))?;

        let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM bookings {where_clause}"))
            .bind(&status)
            .bind(&payment_status)
            .bind(filter.zone_id)
            .bind(filter.customer_id)
            .bind(filter.check_in_from)
            .bind(filter.check_in_to)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count bookings: {}", e))
            })?;

        timer.observe_duration();

        Ok((bookings, total))
    }

    /// Persist recomputed totals and the matching balance on a booking.
    #[instrument(skip(self, totals), fields(booking_id = %booking_id))]
    pub async fn update_booking_totals(
        &self,
        booking_id: Uuid,
        totals: &BookingTotals,
        balance_due: Decimal,
        deposit_due: Decimal,
    ) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET subtotal_amount = $2,
                discount_amount = $3,
                tax_amount = $4,
                total_amount = $5,
                balance_due = $6,
                deposit_due = $7
            WHERE booking_id = $1
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(booking_id)
        .bind(totals.subtotal_amount)
        .bind(totals.discount_amount)
        .bind(totals.tax_amount)
        .bind(totals.total_amount)
        .bind(balance_due)
        .bind(deposit_due)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update booking totals: {}", e))
        })?;

        Ok(booking)
    }

    /// Update booking lifecycle status in a single transaction: stamp the
    /// first confirm/cancel transition, append a status-history record.
    ///
    /// Idempotent: setting the current status again changes nothing, stamps
    /// nothing and appends no history. Returns the booking plus whether a
    /// transition actually happened.
    #[instrument(skip(self), fields(booking_id = %booking_id, new_status = %new_status.as_str()))]
    pub async fn update_booking_status(
        &self,
        booking_id: Uuid,
        new_status: BookingStatus,
        actor: Option<&str>,
    ) -> Result<Option<(Booking, bool)>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_booking_status"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1 FOR UPDATE"
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get booking: {}", e)))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let plan = existing.plan_status_transition(new_status);
        if !plan.apply {
            // Idempotent no-op; do not re-stamp or re-fire anything.
            return Ok(Some((existing, false)));
        }

        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET status = $2,
                confirmed_utc = COALESCE(confirmed_utc, $3),
                cancelled_utc = COALESCE(cancelled_utc, $4)
            WHERE booking_id = $1
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(booking_id)
        .bind(new_status.as_str())
        .bind(plan.stamp_confirmed.then(Utc::now))
        .bind(plan.stamp_cancelled.then(Utc::now))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update booking status: {}", e))
        })?;

        self.append_history(&mut tx, booking_id, "status", &existing.status, new_status.as_str(), actor)
            .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit status update: {}", e))
        })?;

        timer.observe_duration();

        info!(
            booking_id = %booking_id,
            old_status = %existing.status,
            new_status = %new_status.as_str(),
            "Booking status updated"
        );

        Ok(Some((booking, true)))
    }

    /// Update the payment status with a history record; idempotent like
    /// `update_booking_status`.
    #[instrument(skip(self), fields(booking_id = %booking_id, new_status = %new_status.as_str()))]
    pub async fn update_payment_status(
        &self,
        booking_id: Uuid,
        new_status: PaymentStatus,
        actor: Option<&str>,
    ) -> Result<Option<(Booking, bool)>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1 FOR UPDATE"
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get booking: {}", e)))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        if !existing.is_payment_transition(new_status) {
            return Ok(Some((existing, false)));
        }

        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET payment_status = $2
            WHERE booking_id = $1
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(booking_id)
        .bind(new_status.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update payment status: {}", e))
        })?;

        self.append_history(
            &mut tx,
            booking_id,
            "payment_status",
            &existing.payment_status,
            new_status.as_str(),
            actor,
        )
        .await?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit payment status: {}", e))
        })?;

        Ok(Some((booking, true)))
    }

    /// Toggle the tax-invoice flag and persist the recomputed totals in one
    /// transaction, with a history record for the flag flip.
    #[instrument(skip(self, totals), fields(booking_id = %booking_id, required = required))]
    pub async fn set_tax_invoice_required(
        &self,
        booking_id: Uuid,
        required: bool,
        tax_rate: Decimal,
        totals: &BookingTotals,
        balance_due: Decimal,
        actor: Option<&str>,
    ) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let existing = sqlx::query_as::<_, Booking>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1 FOR UPDATE"
        ))
        .bind(booking_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get booking: {}", e)))?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET tax_invoice_required = $2,
                tax_rate = $3,
                discount_amount = $4,
                tax_amount = $5,
                total_amount = $6,
                balance_due = $7
            WHERE booking_id = $1
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(booking_id)
        .bind(required)
        .bind(tax_rate)
        .bind(totals.discount_amount)
        .bind(totals.tax_amount)
        .bind(totals.total_amount)
        .bind(balance_due)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to toggle tax invoice: {}", e))
        })?;

        if existing.tax_invoice_required != required {
            self.append_history(
                &mut tx,
                booking_id,
                "tax_invoice_required",
                &existing.tax_invoice_required.to_string(),
                &required.to_string(),
                actor,
            )
            .await?;
        }

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit tax toggle: {}", e))
        })?;

        Ok(Some(booking))
    }

    /// Update booking details (dates, guest counts, staff, notes). Totals
    /// are recomputed and persisted separately by the caller.
    #[instrument(skip(self, input), fields(booking_id = %booking_id))]
    pub async fn update_booking_details(
        &self,
        booking_id: Uuid,
        input: &crate::models::UpdateBooking,
    ) -> Result<Option<Booking>, AppError> {
        let booking = sqlx::query_as::<_, Booking>(&format!(
            r#"
            UPDATE bookings
            SET check_in = COALESCE($2, check_in),
                check_out = COALESCE($3, check_out),
                guest_counts = COALESCE($4, guest_counts),
                staff_id = COALESCE($5, staff_id),
                notes = COALESCE($6, notes)
            WHERE booking_id = $1
            RETURNING {BOOKING_COLUMNS}
            "#,
        ))
        .bind(booking_id)
        .bind(input.check_in)
        .bind(input.check_out)
        .bind(&input.guest_counts)
        .bind(input.staff_id)
        .bind(&input.notes)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update booking: {}", e))
        })?;

        Ok(booking)
    }

    /// Re-price an accommodation line after its stay dates changed.
    #[instrument(skip(self), fields(line_id = %line_id))]
    pub async fn update_line_pricing(
        &self,
        line_id: Uuid,
        check_in: NaiveDate,
        check_out: NaiveDate,
        subtotal: Decimal,
        discount_amount: Decimal,
    ) -> Result<(), AppError> {
        let nights = (check_out - check_in).num_days().max(0) as i32;
        sqlx::query(
            r#"
            UPDATE booking_lines
            SET check_in = $2, check_out = $3, nights = $4, subtotal = $5, discount_amount = $6
            WHERE line_id = $1
            "#,
        )
        .bind(line_id)
        .bind(check_in)
        .bind(check_out)
        .bind(nights)
        .bind(subtotal)
        .bind(discount_amount)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to update line pricing: {}", e))
        })?;

        Ok(())
    }

    /// Delete a booking; lines, product lines, payments and history cascade.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn delete_booking(&self, booking_id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM bookings WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete booking: {}", e))
            })?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(booking_id = %booking_id, "Booking deleted");
        }

        Ok(deleted)
    }

    /// Status-history records for a booking, oldest first.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_status_history(
        &self,
        booking_id: Uuid,
    ) -> Result<Vec<StatusHistory>, AppError> {
        let history = sqlx::query_as::<_, StatusHistory>(
            r#"
            SELECT history_id, booking_id, field, old_value, new_value, actor, created_utc
            FROM booking_status_history
            WHERE booking_id = $1
            ORDER BY created_utc
            "#,
        )
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get history: {}", e)))?;

        Ok(history)
    }

    async fn append_history(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        booking_id: Uuid,
        field: &str,
        old_value: &str,
        new_value: &str,
        actor: Option<&str>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO booking_status_history (history_id, booking_id, field, old_value, new_value, actor)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(field)
        .bind(old_value)
        .bind(new_value)
        .bind(actor)
        .execute(&mut **tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to append history: {}", e)))?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Accommodation Line Operations
    // -------------------------------------------------------------------------

    /// The priceable view of a catalog item: pricing-rate mode plus one unit
    /// price per guest parameter.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_priceable_item(&self, item_id: Uuid) -> Result<Option<PriceableItem>, AppError> {
        let item: Option<(Uuid, String, Option<Uuid>, String)> = sqlx::query_as(
            r#"
            SELECT item_id, name, category_id, pricing_rate
            FROM accommodation_items
            WHERE item_id = $1
            "#,
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get item: {}", e)))?;

        let Some((item_id, item_name, category_id, pricing_rate)) = item else {
            return Ok(None);
        };

        let parameter_prices: Vec<(String, Decimal)> = sqlx::query_as(
            r#"
            SELECT parameter_key, unit_price
            FROM item_parameter_prices
            WHERE item_id = $1
            ORDER BY parameter_key
            "#,
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get item prices: {}", e)))?;

        Ok(Some(PriceableItem {
            item_id,
            item_name,
            category_id,
            pricing_rate,
            parameter_prices,
        }))
    }

    /// Accommodation lines for a booking, in display order.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_lines(&self, booking_id: Uuid) -> Result<Vec<AccommodationLine>, AppError> {
        let lines = sqlx::query_as::<_, AccommodationLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM booking_lines WHERE booking_id = $1 \
             ORDER BY sort_order, created_utc"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get lines: {}", e)))?;

        Ok(lines)
    }

    /// Remove an accommodation line.
    #[instrument(skip(self), fields(booking_id = %booking_id, line_id = %line_id))]
    pub async fn remove_line(&self, booking_id: Uuid, line_id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("DELETE FROM booking_lines WHERE booking_id = $1 AND line_id = $2")
                .bind(booking_id)
                .bind(line_id)
                .execute(&self.pool)
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to remove line: {}", e))
                })?;

        Ok(result.rows_affected() > 0)
    }

    // -------------------------------------------------------------------------
    // Product Line Operations
    // -------------------------------------------------------------------------

    /// Menu item name and unit price from the catalog.
    #[instrument(skip(self), fields(menu_item_id = %menu_item_id))]
    pub async fn get_menu_item(
        &self,
        menu_item_id: Uuid,
    ) -> Result<Option<(String, Decimal)>, AppError> {
        let item: Option<(String, Decimal)> = sqlx::query_as(
            "SELECT name, unit_price FROM menu_items WHERE menu_item_id = $1",
        )
        .bind(menu_item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get menu item: {}", e)))?;

        Ok(item)
    }

    /// Product lines for a booking.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_product_lines(&self, booking_id: Uuid) -> Result<Vec<ProductLine>, AppError> {
        let lines = sqlx::query_as::<_, ProductLine>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM booking_products WHERE booking_id = $1 \
             ORDER BY created_utc"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to get product lines: {}", e))
        })?;

        Ok(lines)
    }

    // -------------------------------------------------------------------------
    // Payment Operations
    // -------------------------------------------------------------------------

    /// Record a payment against a booking and refresh the stored balance
    /// from the settled sum, in one transaction.
    #[instrument(skip(self, input), fields(booking_id = %booking_id, amount = %input.amount))]
    pub async fn record_payment(
        &self,
        booking_id: Uuid,
        input: &CreatePayment,
    ) -> Result<Payment, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["record_payment"])
            .start_timer();

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to begin transaction: {}", e))
        })?;

        let payment = sqlx::query_as::<_, Payment>(&format!(
            r#"
            INSERT INTO payments (
                payment_id, booking_id, method, amount, status, transaction_ref,
                is_vat_payment, paid_utc
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PAYMENT_COLUMNS}
            "#,
        ))
        .bind(Uuid::new_v4())
        .bind(booking_id)
        .bind(&input.method)
        .bind(input.amount)
        .bind(&input.status)
        .bind(&input.transaction_ref)
        .bind(input.is_vat_payment)
        .bind(input.paid_utc)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to record payment: {}", e)))?;

        sqlx::query(
            r#"
            UPDATE bookings
            SET balance_due = GREATEST(
                0,
                total_amount - (
                    SELECT COALESCE(SUM(amount), 0)
                    FROM payments
                    WHERE booking_id = $1 AND status IN ('successful', 'completed', 'success')
                )
            )
            WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to refresh balance: {}", e)))?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to commit payment: {}", e))
        })?;

        timer.observe_duration();

        info!(payment_id = %payment.payment_id, amount = %payment.amount, "Payment recorded");

        Ok(payment)
    }

    /// Payments recorded against a booking, oldest first.
    #[instrument(skip(self), fields(booking_id = %booking_id))]
    pub async fn get_payments(&self, booking_id: Uuid) -> Result<Vec<Payment>, AppError> {
        let payments = sqlx::query_as::<_, Payment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments WHERE booking_id = $1 ORDER BY created_utc"
        ))
        .bind(booking_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get payments: {}", e)))?;

        Ok(payments)
    }
}
