//! Sales report handler.
//!
//! Zone access arrives in the `x-allowed-zones` header, set by the gateway
//! after authentication. No header means an unrestricted administrator; a
//! present header is the caller's full zone list, and an empty one grants
//! nothing.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    Json,
};
use admin_core::error::AppError;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    reports::{DateRangePreset, Dimension, ReportFilters, ReportResponse, ZoneAccess},
    AppState,
};

const ALLOWED_ZONES_HEADER: &str = "x-allowed-zones";

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub dimension: String,
    pub preset: Option<DateRangePreset>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub zone_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    #[serde(default)]
    pub page: i64,
    #[serde(default)]
    pub limit: i64,
}

fn zone_access(headers: &HeaderMap) -> Result<ZoneAccess, AppError> {
    let Some(value) = headers.get(ALLOWED_ZONES_HEADER) else {
        return Ok(ZoneAccess::Unrestricted);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Malformed zone access header")))?;

    let mut zones = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let zone = Uuid::parse_str(part).map_err(|_| {
            AppError::BadRequest(anyhow::anyhow!("Malformed zone id in access header: {}", part))
        })?;
        zones.push(zone);
    }
    Ok(ZoneAccess::Restricted(zones))
}

/// Run a sales report for one dimension.
pub async fn run_report(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ReportQuery>,
) -> Result<Json<ReportResponse>, AppError> {
    let dimension = Dimension::from_string(&query.dimension).ok_or_else(|| {
        AppError::BadRequest(anyhow::anyhow!(
            "Unknown report dimension: {}",
            query.dimension
        ))
    })?;

    let access = zone_access(&headers)?;
    let zone_scope = access.scope(query.zone_id)?;

    let preset = query.preset.unwrap_or(DateRangePreset::Custom);
    let (date_from, date_to) =
        preset.resolve(Utc::now().date_naive(), query.date_from, query.date_to);
    if let (Some(from), Some(to)) = (date_from, date_to) {
        if from > to {
            return Err(AppError::BadRequest(anyhow::anyhow!(
                "date_from is after date_to"
            )));
        }
    }

    let filters = ReportFilters {
        date_from,
        date_to,
        staff_id: query.staff_id,
        category_id: query.category_id,
        item_id: query.item_id,
        zone_scope,
    };

    let page = if query.page > 0 { query.page } else { 1 };
    let limit = if query.limit > 0 { query.limit } else { 20 };

    let report = state.reports.run(dimension, &filters, page, limit).await?;
    Ok(Json(report))
}
