//! Folds analytics rows into the numbers the dashboard displays.
//!
//! Two different attendance percentages exist on purpose:
//! [`average_of_rates`] (unweighted mean of per-row rates, used by the
//! summary card) and [`percentage_from_working_days`] (present count
//! over working days, used by the monthly score). They come from
//! different screens of the program and must stay distinct operations.

use std::collections::HashMap;

use chrono::NaiveDate;
use swachh_monitor_analytics_models::{AnalyticsRecord, GroupedStats, RankedEntry, Totals};
use swachh_monitor_dates::working_days_in_month_to_date;
use swachh_monitor_geography_models::GeoId;

/// Upper bound for every displayed percentage.
const PERCENT_CAP: f64 = 100.0;

/// Sums counts across `records` and takes the unweighted mean of their
/// attendance rates. Empty input yields all zeroes.
#[must_use]
pub fn summarize(records: &[AnalyticsRecord]) -> Totals {
    let mut totals = Totals::default();

    for record in records {
        totals.present += record.present_count;
        totals.absent += record.absent_count;
        totals.total_contractors += record.total_contractors;
    }

    totals.average_rate = average_of_rates(records);
    totals
}

/// Arithmetic mean of the per-record `attendance_rate`, deliberately
/// not weighted by contractor count. Returns 0 for empty input.
#[must_use]
pub fn average_of_rates(records: &[AnalyticsRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    #[allow(clippy::cast_precision_loss)]
    let len = records.len() as f64;
    records.iter().map(|r| r.attendance_rate).sum::<f64>() / len
}

/// Attendance percentage over a working-day denominator:
/// `round(present / working_days * 100)` clamped to `[0, 100]`.
/// Returns 0 when `working_days` is 0: the percentage is undefined
/// and the UI renders 0 instead of dividing by zero.
#[must_use]
pub fn percentage_from_working_days(present_count: u64, working_days: u32) -> u8 {
    if working_days == 0 {
        return 0;
    }

    #[allow(clippy::cast_precision_loss)]
    let raw = present_count as f64 / f64::from(working_days) * PERCENT_CAP;
    let clamped = raw.round().clamp(0.0, PERCENT_CAP);

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let percent = clamped as u8;
    percent
}

/// Monthly attendance score of one record: its present count over the
/// working days elapsed in `today`'s month.
#[must_use]
pub fn monthly_score(record: &AnalyticsRecord, today: NaiveDate) -> f64 {
    f64::from(percentage_from_working_days(
        record.present_count,
        working_days_in_month_to_date(today),
    ))
}

/// Ranks `records` by `score_fn`, descending, and returns the first
/// `n` as 1-based [`RankedEntry`] rows. The sort is stable: records
/// with equal scores keep their input order.
#[must_use]
pub fn rank_top_n<F>(records: &[AnalyticsRecord], score_fn: F, n: usize) -> Vec<RankedEntry>
where
    F: Fn(&AnalyticsRecord) -> f64,
{
    let mut scored: Vec<(&AnalyticsRecord, f64)> =
        records.iter().map(|r| (r, score_fn(r))).collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1));

    scored
        .into_iter()
        .take(n)
        .enumerate()
        .map(|(index, (record, score))| RankedEntry {
            id: record.geography_id,
            name: record.geography_name.clone(),
            score,
            rank: u32::try_from(index + 1).unwrap_or(u32::MAX),
        })
        .collect()
}

/// Groups `records` by `key_fn`, accumulating counts per group and
/// averaging the group's attendance rate, scaled by 100 and capped at
/// 100. Output rows appear in first-seen key order; every key that
/// appeared at least once produces exactly one row.
#[must_use]
pub fn group_and_average<F>(records: &[AnalyticsRecord], key_fn: F) -> Vec<GroupedStats>
where
    F: Fn(&AnalyticsRecord) -> GeoId,
{
    let mut index_by_key: HashMap<GeoId, usize> = HashMap::new();
    let mut groups: Vec<(GroupedStats, u64)> = Vec::new();

    for record in records {
        let key = key_fn(record);

        let slot = *index_by_key.entry(key).or_insert_with(|| {
            groups.push((
                GroupedStats {
                    key,
                    name: record.geography_name.clone(),
                    average_rate: 0.0,
                    totals: Totals::default(),
                },
                0,
            ));
            groups.len() - 1
        });

        let (group, count) = &mut groups[slot];
        group.totals.present += record.present_count;
        group.totals.absent += record.absent_count;
        group.totals.total_contractors += record.total_contractors;
        group.average_rate += record.attendance_rate;
        *count += 1;
    }

    groups
        .into_iter()
        .map(|(mut group, count)| {
            if count > 0 {
                #[allow(clippy::cast_precision_loss)]
                let mean = group.average_rate / count as f64;
                group.average_rate = (mean * PERCENT_CAP).min(PERCENT_CAP);
                group.totals.average_rate = mean;
            }
            group
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: GeoId, name: &str, present: u64, absent: u64, rate: f64) -> AnalyticsRecord {
        AnalyticsRecord {
            geography_id: id,
            geography_name: name.to_owned(),
            present_count: present,
            absent_count: absent,
            total_contractors: present + absent,
            attendance_rate: rate,
            date: None,
        }
    }

    #[test]
    fn summarize_sums_counts_and_averages_rates() {
        let records = vec![
            record(1, "Ajmer", 40, 10, 0.8),
            record(2, "Alwar", 30, 30, 0.5),
        ];

        let totals = summarize(&records);
        assert_eq!(totals.present, 70);
        assert_eq!(totals.absent, 40);
        assert_eq!(totals.total_contractors, 110);
        assert!((totals.average_rate - 0.65).abs() < 1e-9);
    }

    #[test]
    fn summarize_empty_is_all_zero() {
        let totals = summarize(&[]);
        assert_eq!(totals, Totals::default());
    }

    #[test]
    fn percentage_caps_at_one_hundred() {
        // 120 present over 26 working days is over 400% raw.
        assert_eq!(percentage_from_working_days(120, 26), 100);
    }

    #[test]
    fn percentage_with_zero_working_days_is_zero() {
        assert_eq!(percentage_from_working_days(5, 0), 0);
    }

    #[test]
    fn percentage_rounds() {
        // 5 / 26 * 100 = 19.23 rounds down to 19.
        assert_eq!(percentage_from_working_days(5, 26), 19);
        assert_eq!(percentage_from_working_days(13, 26), 50);
    }

    #[test]
    fn rank_top_n_is_stable_on_ties() {
        let records = vec![
            record(1, "Ajmer", 70, 0, 0.0),
            record(2, "Alwar", 90, 0, 0.0),
            record(3, "Sikar", 90, 0, 0.0),
            record(4, "Kota", 40, 0, 0.0),
        ];

        #[allow(clippy::cast_precision_loss)]
        let ranked = rank_top_n(&records, |r| r.present_count as f64, 3);

        assert_eq!(ranked.len(), 3);
        // The two 90s keep their input order: Alwar before Sikar.
        assert_eq!(ranked[0].name, "Alwar");
        assert_eq!(ranked[1].name, "Sikar");
        assert_eq!(ranked[2].name, "Ajmer");
        assert_eq!(
            ranked.iter().map(|e| e.rank).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
    }

    #[test]
    fn rank_top_n_handles_short_input() {
        let records = vec![record(1, "Ajmer", 70, 0, 0.0)];
        #[allow(clippy::cast_precision_loss)]
        let ranked = rank_top_n(&records, |r| r.present_count as f64, 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].rank, 1);
    }

    #[test]
    fn group_and_average_keeps_first_seen_order() {
        let records = vec![
            record(2, "Alwar", 10, 0, 0.5),
            record(1, "Ajmer", 20, 0, 0.9),
            record(2, "Alwar", 30, 0, 0.7),
        ];

        let groups = group_and_average(&records, |r| r.geography_id);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, 2);
        assert_eq!(groups[0].totals.present, 40);
        assert!((groups[0].average_rate - 60.0).abs() < 1e-9);
        assert_eq!(groups[1].key, 1);
        assert!((groups[1].average_rate - 90.0).abs() < 1e-9);
    }

    #[test]
    fn group_average_is_capped() {
        // Backend occasionally reports rates above 1.0; the scaled
        // group average still caps at 100.
        let records = vec![record(1, "Ajmer", 10, 0, 1.4)];
        let groups = group_and_average(&records, |r| r.geography_id);
        assert!((groups[0].average_rate - 100.0).abs() < 1e-9);
    }

    #[test]
    fn monthly_score_uses_month_to_date_denominator() {
        // 2025-01-15: 13 working days elapsed (Sundays on the 5th and
        // 12th). 13 present over 13 working days is a perfect score.
        let today = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let r = record(1, "Ajmer", 13, 0, 0.0);
        assert!((monthly_score(&r, today) - 100.0).abs() < f64::EPSILON);
    }
}
