//! Sales report execution.
//!
//! The data, count and summary queries share one WHERE clause and one bind
//! set, so the paginated rows and the summary always describe the same
//! filtered set.

use crate::reports::{
    DateRangePreset, Dimension, DimensionSpec, FilterOptions, Pagination, ReportFilters,
    ReportResponse, ReportRow, ReportSummary, ZoneScope,
};
use crate::services::database::Database;
use crate::services::metrics::REPORT_DURATION;
use admin_core::error::AppError;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::Postgres;
use tracing::instrument;
use uuid::Uuid;

const MAX_PAGE_SIZE: i64 = 100;

/// Executes dimension specs against the store.
#[derive(Clone)]
pub struct SalesReportService {
    db: Database,
}

fn bind_filters<'q, T>(
    query: QueryAs<'q, Postgres, T, PgArguments>,
    filters: &'q ReportFilters,
    zone_ids: &'q Option<Vec<Uuid>>,
) -> QueryAs<'q, Postgres, T, PgArguments> {
    query
        .bind(filters.date_from)
        .bind(filters.date_to)
        .bind(filters.staff_id)
        .bind(filters.category_id)
        .bind(filters.item_id)
        .bind(zone_ids)
}

impl SalesReportService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Run a sales report for one dimension over the resolved filter set.
    ///
    /// An empty zone scope short-circuits to the fail-closed empty report
    /// before any query executes.
    #[instrument(skip(self, filters), fields(dimension = %dimension.as_str()))]
    pub async fn run(
        &self,
        dimension: Dimension,
        filters: &ReportFilters,
        page: i64,
        limit: i64,
    ) -> Result<ReportResponse, AppError> {
        let limit = limit.clamp(1, MAX_PAGE_SIZE);
        let page = page.max(1);

        if filters.zone_scope == ZoneScope::Empty {
            return Ok(ReportResponse::empty(limit));
        }

        let timer = REPORT_DURATION
            .with_label_values(&[dimension.as_str()])
            .start_timer();

        let spec = DimensionSpec::for_dimension(dimension);
        let zone_ids = filters.zone_ids();
        let offset = (page - 1) * limit;

        let rows_sql = spec.rows_sql();
        let rows: Vec<ReportRow> =
            bind_filters(sqlx::query_as(&rows_sql), filters, &zone_ids)
                .bind(limit)
                .bind(offset)
                .fetch_all(self.db.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to fetch report rows: {}", e))
                })?;

        let count_sql = spec.count_sql();
        let total: i64 = bind_filters(sqlx::query_as(&count_sql), filters, &zone_ids)
            .fetch_one(self.db.pool())
            .await
            .map(|(count,): (i64,)| count)
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to count report groups: {}", e))
            })?;

        let summary_sql = spec.summary_sql();
        let summary: ReportSummary =
            bind_filters(sqlx::query_as(&summary_sql), filters, &zone_ids)
                .fetch_one(self.db.pool())
                .await
                .map_err(|e| {
                    AppError::DatabaseError(anyhow::anyhow!("Failed to fetch summary: {}", e))
                })?;

        timer.observe_duration();

        let total_pages = if total == 0 {
            0
        } else {
            (total + limit - 1) / limit
        };

        Ok(ReportResponse {
            rows,
            summary,
            pagination: Pagination {
                current_page: page,
                total_pages,
                total,
                limit,
            },
            filter_options: self.filter_options(filters),
        })
    }

    /// Filter choices the report screen renders: available dimensions, date
    /// presets and the zones visible under the caller's scope.
    fn filter_options(&self, filters: &ReportFilters) -> FilterOptions {
        let dimensions = [
            Dimension::Day,
            Dimension::Booking,
            Dimension::LineItem,
            Dimension::Customer,
            Dimension::Staff,
            Dimension::Category,
            Dimension::Item,
            Dimension::Product,
        ]
        .iter()
        .map(|d| d.as_str().to_string())
        .collect();

        let date_presets = [
            DateRangePreset::Today,
            DateRangePreset::Yesterday,
            DateRangePreset::ThisWeek,
            DateRangePreset::ThisMonth,
            DateRangePreset::LastMonth,
            DateRangePreset::Last30,
            DateRangePreset::Last90,
            DateRangePreset::ThisYear,
            DateRangePreset::Custom,
        ]
        .iter()
        .map(|p| p.as_str().to_string())
        .collect();

        let zones = match &filters.zone_scope {
            ZoneScope::Zones(zones) => zones.clone(),
            _ => Vec::new(),
        };

        FilterOptions {
            dimensions,
            date_presets,
            zones,
        }
    }
}
