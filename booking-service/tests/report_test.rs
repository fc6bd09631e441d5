//! Report filter, zone-scope and dimension-spec tests.

use admin_core::error::AppError;
use booking_service::reports::{
    DateRangePreset, Dimension, DimensionSpec, ReportFilters, ReportResponse, ZoneAccess,
    ZoneScope,
};
use chrono::NaiveDate;
use uuid::Uuid;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn unrestricted_access_passes_the_requested_zone_through() {
    let zone = Uuid::new_v4();

    assert_eq!(ZoneAccess::Unrestricted.scope(None).unwrap(), ZoneScope::All);
    assert_eq!(
        ZoneAccess::Unrestricted.scope(Some(zone)).unwrap(),
        ZoneScope::Zones(vec![zone])
    );
}

#[test]
fn restricted_access_constrains_to_the_caller_zones() {
    let a = Uuid::new_v4();
    let b = Uuid::new_v4();
    let access = ZoneAccess::Restricted(vec![a, b]);

    assert_eq!(access.scope(None).unwrap(), ZoneScope::Zones(vec![a, b]));
    assert_eq!(access.scope(Some(a)).unwrap(), ZoneScope::Zones(vec![a]));
}

#[test]
fn requesting_a_zone_outside_the_set_is_forbidden() {
    let access = ZoneAccess::Restricted(vec![Uuid::new_v4()]);
    let outside = Uuid::new_v4();

    let err = access.scope(Some(outside)).unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

#[test]
fn empty_restricted_set_fails_closed() {
    let access = ZoneAccess::Restricted(Vec::new());

    assert_eq!(access.scope(None).unwrap(), ZoneScope::Empty);
    // Even an explicit request grants nothing rather than erroring.
    assert_eq!(access.scope(Some(Uuid::new_v4())).unwrap(), ZoneScope::Empty);
}

#[test]
fn zone_ids_binding_reflects_the_scope() {
    let zone = Uuid::new_v4();
    let filters = |scope| ReportFilters {
        date_from: None,
        date_to: None,
        staff_id: None,
        category_id: None,
        item_id: None,
        zone_scope: scope,
    };

    assert_eq!(filters(ZoneScope::All).zone_ids(), None);
    assert_eq!(
        filters(ZoneScope::Zones(vec![zone])).zone_ids(),
        Some(vec![zone])
    );
    assert_eq!(filters(ZoneScope::Empty).zone_ids(), Some(Vec::new()));
}

#[test]
fn presets_resolve_relative_to_today() {
    // 2025-08-20 is a Wednesday.
    let today = date(2025, 8, 20);

    assert_eq!(
        DateRangePreset::Today.resolve(today, None, None),
        (Some(today), Some(today))
    );
    assert_eq!(
        DateRangePreset::Yesterday.resolve(today, None, None),
        (Some(date(2025, 8, 19)), Some(date(2025, 8, 19)))
    );
    assert_eq!(
        DateRangePreset::ThisWeek.resolve(today, None, None),
        (Some(date(2025, 8, 18)), Some(today))
    );
    assert_eq!(
        DateRangePreset::ThisMonth.resolve(today, None, None),
        (Some(date(2025, 8, 1)), Some(today))
    );
    assert_eq!(
        DateRangePreset::LastMonth.resolve(today, None, None),
        (Some(date(2025, 7, 1)), Some(date(2025, 7, 31)))
    );
    assert_eq!(
        DateRangePreset::Last30.resolve(today, None, None),
        (Some(date(2025, 7, 22)), Some(today))
    );
    assert_eq!(
        DateRangePreset::ThisYear.resolve(today, None, None),
        (Some(date(2025, 1, 1)), Some(today))
    );
}

#[test]
fn custom_preset_passes_bounds_through() {
    let today = date(2025, 8, 20);
    let from = Some(date(2025, 3, 1));
    let to = Some(date(2025, 3, 31));

    assert_eq!(DateRangePreset::Custom.resolve(today, from, to), (from, to));
    assert_eq!(DateRangePreset::Custom.resolve(today, from, None), (from, None));
    assert_eq!(DateRangePreset::Custom.resolve(today, None, None), (None, None));
}

#[test]
fn dimension_names_round_trip() {
    for dim in [
        Dimension::Day,
        Dimension::Booking,
        Dimension::LineItem,
        Dimension::Customer,
        Dimension::Staff,
        Dimension::Category,
        Dimension::Item,
        Dimension::Product,
    ] {
        assert_eq!(Dimension::from_string(dim.as_str()), Some(dim));
    }
    assert_eq!(Dimension::from_string("fortnight"), None);
}

#[test]
fn every_dimension_compiles_consistent_sql() {
    for dim in [
        Dimension::Day,
        Dimension::Booking,
        Dimension::LineItem,
        Dimension::Customer,
        Dimension::Staff,
        Dimension::Category,
        Dimension::Item,
        Dimension::Product,
    ] {
        let spec = DimensionSpec::for_dimension(dim);
        let rows = spec.rows_sql();
        let count = spec.count_sql();
        let summary = spec.summary_sql();

        // Cancelled bookings never contribute to sales.
        for sql in [&rows, &count, &summary] {
            assert!(sql.contains("b.status <> 'cancelled'"), "{}", sql);
            assert!(sql.contains("ANY($6)"), "{}", sql);
        }
        assert!(rows.contains("LIMIT $7 OFFSET $8"), "{}", rows);
        assert!(rows.contains("GROUP BY"), "{}", rows);
        assert!(!count.contains("$7"), "{}", count);
        assert!(!summary.contains("$7"), "{}", summary);
    }
}

#[test]
fn product_dimension_ignores_line_only_filters() {
    let spec = DimensionSpec::for_dimension(Dimension::Product);

    // Category and item filters cannot match product rows; the clause keeps
    // the bind positions but matches nothing when they are set.
    assert!(spec.where_clause().contains("($4::uuid IS NULL OR FALSE)"));
    assert!(spec.where_clause().contains("($5::uuid IS NULL OR FALSE)"));
}

#[test]
fn line_dimensions_carry_no_booking_tax() {
    for dim in [Dimension::LineItem, Dimension::Category, Dimension::Item] {
        let spec = DimensionSpec::for_dimension(dim);
        assert!(spec.aggregates().contains("0::numeric AS tax_total"));
    }
    let booking = DimensionSpec::for_dimension(Dimension::Day);
    assert!(booking.aggregates().contains("SUM(b.tax_amount)"));
}

#[test]
fn empty_report_is_zeroed_and_unpaginated() {
    let report = ReportResponse::empty(25);

    assert!(report.rows.is_empty());
    assert_eq!(report.summary.group_count, 0);
    assert_eq!(report.pagination.total, 0);
    assert_eq!(report.pagination.total_pages, 0);
    assert_eq!(report.pagination.limit, 25);
}
