//! Sales reporting: request/response shapes, filters and dimension specs.

mod dimensions;
mod filters;

pub use dimensions::{Dimension, DimensionSpec, ReportBase};
pub use filters::{DateRangePreset, ReportFilters, ZoneAccess, ZoneScope};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One aggregated row of a sales report.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ReportRow {
    pub group_key: String,
    pub group_label: String,
    pub group_count: i64,
    pub gross_sales: Decimal,
    pub discount_total: Decimal,
    pub net_sales: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
}

/// Aggregation over the entire filtered set, independent of pagination.
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow)]
pub struct ReportSummary {
    pub group_count: i64,
    pub gross_sales: Decimal,
    pub discount_total: Decimal,
    pub net_sales: Decimal,
    pub tax_total: Decimal,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub limit: i64,
}

/// Filter choices echoed back so the report screen can render its controls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub dimensions: Vec<String>,
    pub date_presets: Vec<String>,
    pub zones: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportResponse {
    pub rows: Vec<ReportRow>,
    pub summary: ReportSummary,
    pub pagination: Pagination,
    pub filter_options: FilterOptions,
}

impl ReportResponse {
    /// The fail-closed empty report: no rows, zero summary, no query run.
    pub fn empty(limit: i64) -> Self {
        ReportResponse {
            rows: Vec::new(),
            summary: ReportSummary::default(),
            pagination: Pagination {
                current_page: 1,
                total_pages: 0,
                total: 0,
                limit,
            },
            filter_options: FilterOptions::default(),
        }
    }
}
