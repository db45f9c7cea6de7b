#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Analytics record and aggregation result types.
//!
//! The Analytics API returns loosely-shaped rows with optional fields.
//! This crate defines the raw wire shapes and the single normalization
//! step ([`AnalyticsRecord::from_raw`]) that converts them into the
//! non-optional records the aggregation engine consumes. Normalization
//! happens once, at the API boundary, never ad hoc in aggregation
//! code.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use swachh_monitor_geography_models::GeoId;

/// Geography granularity of an analytics query, as the API spells it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalyticsLevel {
    /// One row per district (statewide view).
    District,
    /// One row per block within a district.
    Block,
    /// One row per village/GP within a block.
    Village,
}

/// Data domain served by the analytics endpoint; selects the URL path
/// segment (`/{domain}/analytics`).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalyticsDomain {
    /// Contractor attendance records.
    Attendance,
    /// Sanitation inspection records.
    Inspections,
    /// Citizen complaint records.
    Complaints,
}

/// An analytics row exactly as the backend sends it: every field may
/// be absent or null.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAnalyticsRecord {
    /// Geography unit id.
    #[serde(default)]
    pub geography_id: Option<GeoId>,
    /// Geography unit display name.
    #[serde(default)]
    pub geography_name: Option<String>,
    /// Contractors marked present.
    #[serde(default)]
    pub present_count: Option<i64>,
    /// Contractors marked absent.
    #[serde(default)]
    pub absent_count: Option<i64>,
    /// Contractors registered for the unit.
    #[serde(default)]
    pub total_contractors: Option<i64>,
    /// Attendance rate reported by the backend.
    #[serde(default)]
    pub attendance_rate: Option<f64>,
    /// Calendar date of the row, for per-day series.
    #[serde(default)]
    pub date: Option<NaiveDate>,
}

/// Envelope wrapping the analytics response body.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsEnvelope {
    /// Echo of the requested level (e.g. `"BLOCK"`).
    #[serde(default)]
    pub geo_type: Option<String>,
    /// The analytics rows.
    #[serde(default)]
    pub response: Vec<RawAnalyticsRecord>,
}

/// A normalized analytics row. Consumed by the aggregation engine,
/// never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsRecord {
    /// Geography unit id (0 when the backend omitted it).
    pub geography_id: GeoId,
    /// Geography unit display name.
    pub geography_name: String,
    /// Contractors marked present.
    pub present_count: u64,
    /// Contractors marked absent.
    pub absent_count: u64,
    /// Contractors registered for the unit.
    pub total_contractors: u64,
    /// Attendance rate; non-finite values are normalized to 0.
    pub attendance_rate: f64,
    /// Calendar date of the row, when the query was per-day.
    pub date: Option<NaiveDate>,
}

impl AnalyticsRecord {
    /// Normalizes one raw row: absent counts become 0, negative counts
    /// are clamped to 0, a missing name becomes `"Unknown"`, and a
    /// missing or non-finite rate becomes 0.
    #[must_use]
    pub fn from_raw(raw: RawAnalyticsRecord) -> Self {
        let clamp = |value: Option<i64>| u64::try_from(value.unwrap_or(0).max(0)).unwrap_or(0);

        let rate = raw.attendance_rate.unwrap_or(0.0);

        Self {
            geography_id: raw.geography_id.unwrap_or(0),
            geography_name: raw.geography_name.unwrap_or_else(|| "Unknown".to_owned()),
            present_count: clamp(raw.present_count),
            absent_count: clamp(raw.absent_count),
            total_contractors: clamp(raw.total_contractors),
            attendance_rate: if rate.is_finite() { rate } else { 0.0 },
            date: raw.date,
        }
    }
}

/// Summed counts plus the unweighted mean attendance rate of a record
/// set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of `present_count`.
    pub present: u64,
    /// Sum of `absent_count`.
    pub absent: u64,
    /// Sum of `total_contractors`.
    pub total_contractors: u64,
    /// Arithmetic mean of the per-record `attendance_rate`, not
    /// weighted by contractor count.
    pub average_rate: f64,
}

/// One row of a top-N ranking.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEntry {
    /// Geography unit id.
    pub id: GeoId,
    /// Geography unit display name.
    pub name: String,
    /// Derived score the ranking was computed from.
    pub score: f64,
    /// 1-based rank; ties keep their input order.
    pub rank: u32,
}

/// Per-group accumulation produced by grouping records by geography.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedStats {
    /// Grouping key (typically the geography id).
    pub key: GeoId,
    /// Display name of the first record seen for the key.
    pub name: String,
    /// Group mean `attendance_rate`, scaled by 100 and capped at 100.
    pub average_rate: f64,
    /// Summed counts for the group.
    pub totals: Totals,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_fills_gaps() {
        let raw: RawAnalyticsRecord =
            serde_json::from_str(r#"{"geography_id": 42, "present_count": -3}"#).unwrap();
        let record = AnalyticsRecord::from_raw(raw);

        assert_eq!(record.geography_id, 42);
        assert_eq!(record.geography_name, "Unknown");
        assert_eq!(record.present_count, 0);
        assert_eq!(record.absent_count, 0);
        assert!((record.attendance_rate - 0.0).abs() < f64::EPSILON);
        assert_eq!(record.date, None);
    }

    #[test]
    fn envelope_tolerates_missing_response() {
        let envelope: AnalyticsEnvelope = serde_json::from_str(r#"{"geo_type": "BLOCK"}"#).unwrap();
        assert_eq!(envelope.geo_type.as_deref(), Some("BLOCK"));
        assert!(envelope.response.is_empty());
    }

    #[test]
    fn level_wire_form() {
        assert_eq!(AnalyticsLevel::Village.as_ref(), "VILLAGE");
        assert_eq!(
            "DISTRICT".parse::<AnalyticsLevel>().ok(),
            Some(AnalyticsLevel::District)
        );
    }

    #[test]
    fn domain_is_a_path_segment() {
        assert_eq!(AnalyticsDomain::Attendance.as_ref(), "attendance");
        assert_eq!(
            "complaints".parse::<AnalyticsDomain>().ok(),
            Some(AnalyticsDomain::Complaints)
        );
    }
}
