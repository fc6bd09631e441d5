//! Zone/campsite settings model.

use admin_core::localized::LocalizedText;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// Deposit configuration mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepositMode {
    Percentage,
    Fixed,
}

impl DepositMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DepositMode::Percentage => "percentage",
            DepositMode::Fixed => "fixed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "fixed" => DepositMode::Fixed,
            _ => DepositMode::Percentage,
        }
    }
}

/// Per-zone configuration: tax, deposit, commission and minimum stay.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ZoneSettings {
    pub zone_id: Uuid,
    /// Bilingual zone name, plain string or `{"vi": .., "en": ..}`.
    pub name: serde_json::Value,
    pub tax_enabled: bool,
    pub tax_rate: Decimal,
    pub deposit_mode: String,
    pub deposit_value: Decimal,
    pub commission_rate: Decimal,
    pub min_stay_nights: i32,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

impl ZoneSettings {
    pub fn deposit_mode(&self) -> DepositMode {
        DepositMode::from_string(&self.deposit_mode)
    }

    pub fn localized_name(&self, locale: &str) -> String {
        serde_json::from_value::<LocalizedText>(self.name.clone())
            .ok()
            .and_then(|t| t.localize(locale, &["en", "vi"]).map(str::to_owned))
            .unwrap_or_default()
    }

    /// Deposit due for a booking total under this zone's settings.
    pub fn deposit_for(&self, total: Decimal) -> Decimal {
        match self.deposit_mode() {
            DepositMode::Percentage => total * self.deposit_value / Decimal::from(100),
            DepositMode::Fixed => self.deposit_value.min(total),
        }
    }
}

/// Audit record appended on every settings change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SettingsAudit {
    pub audit_id: Uuid,
    pub zone_id: Uuid,
    pub field: String,
    pub old_value: String,
    pub new_value: String,
    pub reason: Option<String>,
    pub actor: Option<String>,
    pub created_utc: DateTime<Utc>,
}

/// Input for updating zone settings. Every changed field produces one audit
/// record carrying `reason` and `actor`.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateZoneSettings {
    pub name: Option<serde_json::Value>,
    pub tax_enabled: Option<bool>,
    pub tax_rate: Option<Decimal>,
    pub deposit_mode: Option<DepositMode>,
    pub deposit_value: Option<Decimal>,
    pub commission_rate: Option<Decimal>,
    #[validate(range(min = 1, max = 365))]
    pub min_stay_nights: Option<i32>,
    pub reason: Option<String>,
    pub actor: Option<String>,
}
