//! Report filters: date-range presets and zone access scoping.

use admin_core::error::AppError;
use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Named date-range presets offered by the report screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRangePreset {
    Today,
    Yesterday,
    ThisWeek,
    ThisMonth,
    LastMonth,
    Last30,
    Last90,
    ThisYear,
    Custom,
}

impl DateRangePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            DateRangePreset::Today => "today",
            DateRangePreset::Yesterday => "yesterday",
            DateRangePreset::ThisWeek => "this_week",
            DateRangePreset::ThisMonth => "this_month",
            DateRangePreset::LastMonth => "last_month",
            DateRangePreset::Last30 => "last_30",
            DateRangePreset::Last90 => "last_90",
            DateRangePreset::ThisYear => "this_year",
            DateRangePreset::Custom => "custom",
        }
    }

    /// Resolve the preset into an inclusive [from, to] pair relative to
    /// `today`. `Custom` passes the explicit bounds through; a missing
    /// custom bound is open on that side.
    pub fn resolve(
        self,
        today: NaiveDate,
        custom_from: Option<NaiveDate>,
        custom_to: Option<NaiveDate>,
    ) -> (Option<NaiveDate>, Option<NaiveDate>) {
        match self {
            DateRangePreset::Today => (Some(today), Some(today)),
            DateRangePreset::Yesterday => {
                let y = today - Duration::days(1);
                (Some(y), Some(y))
            }
            DateRangePreset::ThisWeek => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (Some(monday), Some(today))
            }
            DateRangePreset::ThisMonth => (today.with_day(1), Some(today)),
            DateRangePreset::LastMonth => {
                let first_of_this = today.with_day(1).unwrap_or(today);
                let last_of_prev = first_of_this - Duration::days(1);
                (last_of_prev.with_day(1), Some(last_of_prev))
            }
            DateRangePreset::Last30 => (Some(today - Duration::days(29)), Some(today)),
            DateRangePreset::Last90 => (Some(today - Duration::days(89)), Some(today)),
            DateRangePreset::ThisYear => (today.with_ordinal(1), Some(today)),
            DateRangePreset::Custom => (custom_from, custom_to),
        }
    }
}

/// The zones a caller may see. Staff accounts carry an explicit zone list;
/// administrators are unrestricted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneAccess {
    Unrestricted,
    Restricted(Vec<Uuid>),
}

/// Effective zone scope after intersecting access with an explicit filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneScope {
    /// No zone constraint in the query.
    All,
    /// Constrain to these zones.
    Zones(Vec<Uuid>),
    /// Fail-closed: return an empty report without running any query.
    Empty,
}

impl ZoneAccess {
    /// Intersect this access set with an explicitly requested zone.
    ///
    /// Requesting a zone outside a restricted set is Forbidden; an empty
    /// restricted set fails closed to an empty result, never an error and
    /// never another zone's data.
    pub fn scope(&self, requested: Option<Uuid>) -> Result<ZoneScope, AppError> {
        match self {
            ZoneAccess::Unrestricted => Ok(match requested {
                Some(zone) => ZoneScope::Zones(vec![zone]),
                None => ZoneScope::All,
            }),
            ZoneAccess::Restricted(zones) if zones.is_empty() => Ok(ZoneScope::Empty),
            ZoneAccess::Restricted(zones) => match requested {
                Some(zone) if zones.contains(&zone) => Ok(ZoneScope::Zones(vec![zone])),
                Some(zone) => Err(AppError::Forbidden(anyhow::anyhow!(
                    "Zone {} is outside the caller's accessible zones",
                    zone
                ))),
                None => Ok(ZoneScope::Zones(zones.clone())),
            },
        }
    }
}

/// Fully resolved filter set, bound identically to the data, count and
/// summary queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFilters {
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub staff_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    pub item_id: Option<Uuid>,
    pub zone_scope: ZoneScope,
}

impl ReportFilters {
    /// The zone list bound as `= ANY($n)`, or None when unconstrained.
    /// `ZoneScope::Empty` must short-circuit before binding.
    pub fn zone_ids(&self) -> Option<Vec<Uuid>> {
        match &self.zone_scope {
            ZoneScope::All => None,
            ZoneScope::Zones(zones) => Some(zones.clone()),
            ZoneScope::Empty => Some(Vec::new()),
        }
    }
}
