//! Zone settings handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use admin_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::{
    models::{SettingsAudit, UpdateZoneSettings, ZoneSettings},
    AppState,
};

pub async fn list_zones(
    State(state): State<AppState>,
) -> Result<Json<Vec<ZoneSettings>>, AppError> {
    Ok(Json(state.db.list_zones().await?))
}

pub async fn get_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<Uuid>,
) -> Result<Json<ZoneSettings>, AppError> {
    let zone = state
        .db
        .get_zone(zone_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Zone not found")))?;
    Ok(Json(zone))
}

/// Update zone settings; each changed field lands one audit record.
pub async fn update_zone(
    State(state): State<AppState>,
    Path(zone_id): Path<Uuid>,
    Json(input): Json<UpdateZoneSettings>,
) -> Result<Json<ZoneSettings>, AppError> {
    input.validate()?;
    let zone = state
        .db
        .update_zone_settings(zone_id, &input)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Zone not found")))?;
    Ok(Json(zone))
}

/// Settings-audit history for a zone, newest first.
pub async fn zone_audit(
    State(state): State<AppState>,
    Path(zone_id): Path<Uuid>,
) -> Result<Json<Vec<SettingsAudit>>, AppError> {
    state
        .db
        .get_zone(zone_id)
        .await?
        .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("Zone not found")))?;
    Ok(Json(state.db.list_zone_audit(zone_id).await?))
}
