//! Typed aggregation specs, one per report dimension.
//!
//! Each dimension compiles to a parameterized query from compile-time SQL
//! fragments; filter values are always bound, never spliced.

use serde::{Deserialize, Serialize};

/// Report grouping dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Day,
    Booking,
    LineItem,
    Customer,
    Staff,
    Category,
    Item,
    Product,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Day => "day",
            Dimension::Booking => "booking",
            Dimension::LineItem => "line_item",
            Dimension::Customer => "customer",
            Dimension::Staff => "staff",
            Dimension::Category => "category",
            Dimension::Item => "item",
            Dimension::Product => "product",
        }
    }

    pub fn from_string(s: &str) -> Option<Self> {
        match s {
            "day" => Some(Dimension::Day),
            "booking" => Some(Dimension::Booking),
            "line_item" => Some(Dimension::LineItem),
            "customer" => Some(Dimension::Customer),
            "staff" => Some(Dimension::Staff),
            "category" => Some(Dimension::Category),
            "item" => Some(Dimension::Item),
            "product" => Some(Dimension::Product),
            _ => None,
        }
    }
}

/// Which table the aggregation runs over. Booking-level dimensions carry
/// booking tax in their totals; line and product dimensions total at net.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportBase {
    Bookings,
    Lines,
    Products,
}

/// SQL fragments for one dimension: group key, display label and base.
#[derive(Debug, Clone, Copy)]
pub struct DimensionSpec {
    pub dimension: Dimension,
    pub base: ReportBase,
    /// Expression producing the group key, cast to text.
    pub key_expr: &'static str,
    /// Expression producing a human-readable group label.
    pub label_expr: &'static str,
}

impl DimensionSpec {
    pub fn for_dimension(dimension: Dimension) -> DimensionSpec {
        match dimension {
            Dimension::Day => DimensionSpec {
                dimension,
                base: ReportBase::Bookings,
                key_expr: "b.check_in::text",
                label_expr: "b.check_in::text",
            },
            Dimension::Booking => DimensionSpec {
                dimension,
                base: ReportBase::Bookings,
                key_expr: "b.booking_id::text",
                label_expr: "b.booking_id::text",
            },
            Dimension::Customer => DimensionSpec {
                dimension,
                base: ReportBase::Bookings,
                key_expr: "b.customer_id::text",
                label_expr: "b.customer_id::text",
            },
            // staff_id is an external directory reference with no local
            // table to join; the admin UI resolves display names.
            Dimension::Staff => DimensionSpec {
                dimension,
                base: ReportBase::Bookings,
                key_expr: "COALESCE(b.staff_id::text, 'unassigned')",
                label_expr: "COALESCE(b.staff_id::text, 'unassigned')",
            },
            Dimension::LineItem => DimensionSpec {
                dimension,
                base: ReportBase::Lines,
                key_expr: "l.line_id::text",
                label_expr: "MIN(l.item_name)",
            },
            Dimension::Category => DimensionSpec {
                dimension,
                base: ReportBase::Lines,
                key_expr: "COALESCE(l.category_id::text, 'uncategorized')",
                label_expr: "COALESCE(l.category_id::text, 'uncategorized')",
            },
            Dimension::Item => DimensionSpec {
                dimension,
                base: ReportBase::Lines,
                key_expr: "l.item_id::text",
                label_expr: "MIN(l.item_name)",
            },
            Dimension::Product => DimensionSpec {
                dimension,
                base: ReportBase::Products,
                key_expr: "p.menu_item_id::text",
                label_expr: "MIN(p.menu_item_name)",
            },
        }
    }

    /// FROM/JOIN clause for this dimension's base. Line and product bases
    /// join bookings so every filter applies identically across bases.
    pub fn from_clause(&self) -> &'static str {
        match self.base {
            ReportBase::Bookings => "FROM bookings b",
            ReportBase::Lines => "FROM booking_lines l JOIN bookings b ON b.booking_id = l.booking_id",
            ReportBase::Products => {
                "FROM booking_products p JOIN bookings b ON b.booking_id = p.booking_id"
            }
        }
    }

    /// Aggregate column list shared by the row and summary projections.
    /// Gross is the pre-discount subtotal; net = gross - discounts; total
    /// adds booking tax only for booking-level dimensions.
    pub fn aggregates(&self) -> &'static str {
        match self.base {
            ReportBase::Bookings => {
                "COUNT(*) AS group_count, \
                 COALESCE(SUM(b.subtotal_amount), 0) AS gross_sales, \
                 COALESCE(SUM(b.discount_amount), 0) AS discount_total, \
                 COALESCE(SUM(b.subtotal_amount - b.discount_amount), 0) AS net_sales, \
                 COALESCE(SUM(b.tax_amount), 0) AS tax_total, \
                 COALESCE(SUM(b.total_amount), 0) AS total"
            }
            ReportBase::Lines => {
                "COUNT(*) AS group_count, \
                 COALESCE(SUM(l.subtotal), 0) AS gross_sales, \
                 COALESCE(SUM(l.discount_amount), 0) AS discount_total, \
                 COALESCE(SUM(l.subtotal - l.discount_amount), 0) AS net_sales, \
                 0::numeric AS tax_total, \
                 COALESCE(SUM(l.subtotal - l.discount_amount), 0) AS total"
            }
            ReportBase::Products => {
                "COALESCE(SUM(p.quantity), 0)::bigint AS group_count, \
                 COALESCE(SUM(p.unit_price * p.quantity), 0) AS gross_sales, \
                 COALESCE(SUM(p.discount_amount), 0) AS discount_total, \
                 COALESCE(SUM(p.unit_price * p.quantity - p.discount_amount), 0) AS net_sales, \
                 0::numeric AS tax_total, \
                 COALESCE(SUM(p.unit_price * p.quantity - p.discount_amount), 0) AS total"
            }
        }
    }

    /// Shared WHERE clause. The same five binds, in the same order, back
    /// the data, count and summary queries:
    /// `$1/$2` date bounds, `$3` staff, `$4` category, `$5` item, `$6` zones.
    pub fn where_clause(&self) -> &'static str {
        match self.base {
            ReportBase::Bookings => {
                "WHERE b.status <> 'cancelled' \
                 AND ($1::date IS NULL OR b.check_in >= $1) \
                 AND ($2::date IS NULL OR b.check_in <= $2) \
                 AND ($3::uuid IS NULL OR b.staff_id = $3) \
                 AND ($4::uuid IS NULL OR EXISTS (SELECT 1 FROM booking_lines fl \
                      WHERE fl.booking_id = b.booking_id AND fl.category_id = $4)) \
                 AND ($5::uuid IS NULL OR EXISTS (SELECT 1 FROM booking_lines fl \
                      WHERE fl.booking_id = b.booking_id AND fl.item_id = $5)) \
                 AND ($6::uuid[] IS NULL OR b.zone_id = ANY($6))"
            }
            ReportBase::Lines => {
                "WHERE b.status <> 'cancelled' \
                 AND ($1::date IS NULL OR b.check_in >= $1) \
                 AND ($2::date IS NULL OR b.check_in <= $2) \
                 AND ($3::uuid IS NULL OR b.staff_id = $3) \
                 AND ($4::uuid IS NULL OR l.category_id = $4) \
                 AND ($5::uuid IS NULL OR l.item_id = $5) \
                 AND ($6::uuid[] IS NULL OR b.zone_id = ANY($6))"
            }
            ReportBase::Products => {
                "WHERE b.status <> 'cancelled' \
                 AND ($1::date IS NULL OR b.check_in >= $1) \
                 AND ($2::date IS NULL OR b.check_in <= $2) \
                 AND ($3::uuid IS NULL OR b.staff_id = $3) \
                 AND ($4::uuid IS NULL OR FALSE) \
                 AND ($5::uuid IS NULL OR FALSE) \
                 AND ($6::uuid[] IS NULL OR b.zone_id = ANY($6))"
            }
        }
    }

    /// Grouped rows query with stable ordering and page binds `$7`/`$8`.
    pub fn rows_sql(&self) -> String {
        format!(
            "SELECT {key} AS group_key, {label} AS group_label, {aggs} {from} {wher} \
             GROUP BY {key} ORDER BY {key} LIMIT $7 OFFSET $8",
            key = self.key_expr,
            label = self.label_expr,
            aggs = self.aggregates(),
            from = self.from_clause(),
            wher = self.where_clause(),
        )
    }

    /// Count of groups in the whole filtered set.
    pub fn count_sql(&self) -> String {
        format!(
            "SELECT COUNT(*) FROM (SELECT {key} {from} {wher} GROUP BY {key}) AS grouped",
            key = self.key_expr,
            from = self.from_clause(),
            wher = self.where_clause(),
        )
    }

    /// Summary over the whole filtered set, independent of pagination.
    pub fn summary_sql(&self) -> String {
        format!(
            "SELECT {aggs} {from} {wher}",
            aggs = self.aggregates(),
            from = self.from_clause(),
            wher = self.where_clause(),
        )
    }
}
