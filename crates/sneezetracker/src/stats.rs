//! Dashboard aggregates over a fetched list of sneezes.
//!
//! Everything here is a pure function of the record slice (and, for the
//! daily count, of "now"). Nothing is cached between calls.

use chrono::{DateTime, Local, TimeZone};
use serde::Serialize;

use crate::sneeze::SneezeRecord;

/// The three numbers shown above the sneeze list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    /// Number of records.
    pub total_count: usize,
    /// Records whose date falls on the viewer's current calendar day.
    pub today_count: usize,
    /// Mean intensity rounded to one decimal, `0.0` when empty.
    pub average_intensity: f64,
}

impl DashboardStats {
    /// Compute all aggregates using the process's local time zone.
    #[must_use]
    pub fn from_records(records: &[SneezeRecord]) -> Self {
        Self::at(records, &Local::now())
    }

    /// Compute all aggregates as seen by a viewer whose clock reads `now`.
    #[must_use]
    pub fn at<Tz: TimeZone>(records: &[SneezeRecord], now: &DateTime<Tz>) -> Self {
        Self {
            total_count: records.len(),
            today_count: today_count(records, now),
            average_intensity: average_intensity(records),
        }
    }
}

/// Count records dated on the same calendar day as `now`, in `now`'s zone.
///
/// This is calendar-day equality, not a 24 hour window: 23:59 and 00:01 on
/// the following day are different days.
#[must_use]
pub fn today_count<Tz: TimeZone>(records: &[SneezeRecord], now: &DateTime<Tz>) -> usize {
    let zone = now.timezone();
    let today = now.date_naive();
    records
        .iter()
        .filter(|r| r.date.with_timezone(&zone).date_naive() == today)
        .count()
}

/// Mean intensity rounded to one decimal place.
#[must_use]
pub fn average_intensity(records: &[SneezeRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }

    let sum: u32 = records
        .iter()
        .map(|r| u32::from(r.intensity.value()))
        .sum();
    #[allow(clippy::cast_precision_loss)]
    let mean = f64::from(sum) / records.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sneeze::Intensity;
    use chrono::{Duration, FixedOffset, Utc};

    fn record(id: i64, intensity: i64, date: DateTime<Utc>) -> SneezeRecord {
        SneezeRecord {
            id,
            intensity: Intensity::new(intensity).unwrap(),
            location: None,
            notes: None,
            date,
            created_at: date,
            updated_at: date,
        }
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_empty_list_is_all_zero() {
        let stats = DashboardStats::from_records(&[]);
        assert_eq!(stats.total_count, 0);
        assert_eq!(stats.today_count, 0);
        assert!(stats.average_intensity.abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_of_one_through_five() {
        let now = Utc::now();
        let records: Vec<_> = (1..=5).map(|i| record(i, i, now)).collect();
        assert!((average_intensity(&records) - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        let now = Utc::now();
        // 1 + 2 + 2 = 5 / 3 = 1.666...
        let records = vec![record(1, 1, now), record(2, 2, now), record(3, 2, now)];
        assert!((average_intensity(&records) - 1.7).abs() < 1e-9);

        // 4 + 5 = 9 / 2 = 4.5
        let records = vec![record(1, 4, now), record(2, 5, now)];
        assert!((average_intensity(&records) - 4.5).abs() < 1e-9);
    }

    #[test]
    fn test_today_count_uses_calendar_day() {
        let now = at("2024-03-10T12:00:00Z");
        let records = vec![
            record(1, 3, at("2024-03-10T00:01:00Z")),
            record(2, 3, at("2024-03-09T23:59:00Z")),
        ];
        assert_eq!(today_count(&records, &now), 1);
    }

    #[test]
    fn test_today_count_respects_viewer_zone() {
        // 22:30 UTC on the 9th is already the 10th in UTC+02:00.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = at("2024-03-10T08:00:00Z").with_timezone(&plus_two);
        let records = vec![
            record(1, 3, at("2024-03-09T22:30:00Z")),
            record(2, 3, at("2024-03-09T21:30:00Z")),
        ];
        assert_eq!(today_count(&records, &now), 1);
        assert_eq!(today_count(&records, &now.with_timezone(&Utc)), 0);
    }

    #[test]
    fn test_today_count_excludes_future_days() {
        let now = at("2024-03-10T12:00:00Z");
        let records = vec![
            record(1, 3, now + Duration::days(1)),
            record(2, 3, now),
        ];
        assert_eq!(today_count(&records, &now), 1);
    }

    #[test]
    fn test_dashboard_stats_at() {
        let now = at("2024-03-10T12:00:00Z");
        let records = vec![
            record(1, 5, at("2024-03-10T09:00:00Z")),
            record(2, 2, at("2024-03-10T07:00:00Z")),
            record(3, 1, at("2024-03-08T07:00:00Z")),
        ];

        let stats = DashboardStats::at(&records, &now);
        assert_eq!(stats.total_count, 3);
        assert_eq!(stats.today_count, 2);
        assert!((stats.average_intensity - 2.7).abs() < 1e-9);
    }

    #[test]
    fn test_dashboard_stats_serialize_camel_case() {
        let stats = DashboardStats {
            total_count: 2,
            today_count: 1,
            average_intensity: 3.5,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalCount"], 2);
        assert_eq!(json["todayCount"], 1);
        assert_eq!(json["averageIntensity"], 3.5);
    }
}
