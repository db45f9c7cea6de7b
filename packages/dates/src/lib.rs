#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Date-range resolution and working-day arithmetic.
//!
//! Every dashboard screen filters its analytics queries by a
//! [`DateRange`] picked from the predefined catalog or entered as a
//! two-step custom range. Attendance percentages use working days as
//! their denominator: every calendar day except the weekly off-day
//! (Sunday in this program).
//!
//! All resolution is pure: `today` is always passed in by the caller,
//! never read from a clock here.

use chrono::{Datelike as _, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The weekly off-day excluded from working-day counts.
pub const WEEKLY_OFF: Weekday = Weekday::Sun;

/// The predefined range catalog shown in the date drop-down.
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
pub enum PredefinedRange {
    /// Start and end are both today.
    Today,
    /// Start and end are both yesterday.
    Yesterday,
    /// The last 7 calendar days, ending today.
    Last7Days,
    /// The last 15 calendar days, ending today.
    Last15Days,
    /// The last 30 calendar days, ending today.
    Last30Days,
    /// Manual two-step entry; see [`apply_custom_date`].
    Custom,
}

impl PredefinedRange {
    /// Catalog order as presented in the UI.
    pub const ALL: &[Self] = &[
        Self::Today,
        Self::Yesterday,
        Self::Last7Days,
        Self::Last15Days,
        Self::Last30Days,
        Self::Custom,
    ];

    /// Display label for the drop-down entry.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Yesterday => "Yesterday",
            Self::Last7Days => "Last 7 Days",
            Self::Last15Days => "Last 15 Days",
            Self::Last30Days => "Last 30 Days",
            Self::Custom => "Custom Range",
        }
    }

    /// Resolves this entry into a concrete range ending at (or before)
    /// `today`. Returns `None` for [`Self::Custom`], which switches the
    /// UI into two-step manual entry instead of resolving immediately.
    #[must_use]
    pub fn resolve(self, today: NaiveDate) -> Option<DateRange> {
        let (start, end) = match self {
            Self::Today => (today, today),
            Self::Yesterday => {
                let yesterday = today - Duration::days(1);
                (yesterday, yesterday)
            }
            Self::Last7Days => (today - Duration::days(7), today),
            Self::Last15Days => (today - Duration::days(15), today),
            Self::Last30Days => (today - Duration::days(30), today),
            Self::Custom => return None,
        };

        Some(DateRange {
            kind: RangeKind::Predefined,
            label: self.label().to_owned(),
            start,
            end,
        })
    }
}

/// Whether a range came from the predefined catalog or manual entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeKind {
    /// Picked from the [`PredefinedRange`] catalog.
    Predefined,
    /// Entered manually via the custom date picker.
    Custom,
}

/// A resolved, inclusive calendar date range.
///
/// `start <= end` always holds: custom entry swaps an out-of-order
/// pair instead of rejecting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    /// Catalog or manual origin.
    pub kind: RangeKind,
    /// Display label (catalog label, or the formatted pair for custom).
    pub label: String,
    /// First day, inclusive.
    pub start: NaiveDate,
    /// Last day, inclusive.
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a custom range from two picked dates, swapping them when
    /// the second pick lies before the first. Never rejects input.
    #[must_use]
    pub fn custom(first: NaiveDate, second: NaiveDate) -> Self {
        let (start, end) = if second < first {
            (second, first)
        } else {
            (first, second)
        };

        Self {
            kind: RangeKind::Custom,
            label: format!("{} to {}", start.format("%d %b %Y"), end.format("%d %b %Y")),
            start,
            end,
        }
    }

    /// ISO `YYYY-MM-DD` form of the start date, as sent to the APIs.
    #[must_use]
    pub fn start_iso(&self) -> String {
        self.start.format("%Y-%m-%d").to_string()
    }

    /// ISO `YYYY-MM-DD` form of the end date, as sent to the APIs.
    #[must_use]
    pub fn end_iso(&self) -> String {
        self.end.format("%Y-%m-%d").to_string()
    }

    /// Number of working days covered by this range.
    #[must_use]
    pub fn working_days(&self) -> u32 {
        count_working_days(self.start, self.end)
    }
}

/// Outcome of one step of the two-step custom date entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomPick {
    /// First pick recorded; the end date is still open.
    Start(NaiveDate),
    /// Second pick completed the range (normalized, never rejected).
    Range(DateRange),
}

/// Applies one picked date to the custom-entry state. The first pick
/// becomes the pending start; the second completes the range, swapping
/// the pair when it arrives out of order.
#[must_use]
pub fn apply_custom_date(picked: NaiveDate, pending_start: Option<NaiveDate>) -> CustomPick {
    match pending_start {
        None => CustomPick::Start(picked),
        Some(start) => CustomPick::Range(DateRange::custom(start, picked)),
    }
}

/// Counts the working days from `start` to `end`, both inclusive,
/// excluding the weekly off-day.
///
/// A same-day range yields 0 when that day is the off-day, else 1.
/// Callers dividing by this value must treat 0 as "percentage
/// undefined, render 0".
#[must_use]
pub fn count_working_days(start: NaiveDate, end: NaiveDate) -> u32 {
    if start > end {
        return 0;
    }

    let days = start
        .iter_days()
        .take_while(|day| *day <= end)
        .filter(|day| day.weekday() != WEEKLY_OFF)
        .count();

    u32::try_from(days).unwrap_or(u32::MAX)
}

/// Working days from the 1st of `today`'s month through `today`,
/// inclusive. Denominator of the monthly attendance score.
#[must_use]
pub fn working_days_in_month_to_date(today: NaiveDate) -> u32 {
    let first = today.with_day(1).unwrap_or(today);
    count_working_days(first, today)
}
