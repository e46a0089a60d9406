//! Validation of loosely-typed sneeze input.
//!
//! Callers (the HTTP layer, the CLI) hand over a [`SneezeCandidate`] exactly
//! as received. [`validate`] either produces a fully typed [`NewSneeze`] or a
//! [`ValidationError`] naming the offending field; there is no partially
//! validated state in between.

use chrono::{
    DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::sneeze::{Intensity, NewSneeze};

/// Naive date-time layouts accepted for `date`, interpreted in local time.
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Years representable in the fixed-width stored form.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// Raw sneeze input as it arrives at the boundary.
///
/// `intensity` and `date` may be any JSON value; numbers and strings are
/// coerced during validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SneezeCandidate {
    /// Intensity as a number or numeric string.
    pub intensity: Option<Value>,
    /// Optional location text.
    pub location: Option<String>,
    /// Optional notes text.
    pub notes: Option<String>,
    /// Optional occurrence time.
    pub date: Option<Value>,
}

/// Validate and normalize a candidate.
///
/// Intensity is checked before date; the first failure is returned.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidIntensity`] or
/// [`ValidationError::InvalidDate`].
pub fn validate(candidate: &SneezeCandidate) -> Result<NewSneeze, ValidationError> {
    let intensity = coerce_intensity(candidate.intensity.as_ref())?;
    let date = coerce_date(candidate.date.as_ref())?;

    Ok(NewSneeze {
        intensity,
        location: normalize_text(candidate.location.as_deref()),
        notes: normalize_text(candidate.notes.as_deref()),
        date,
    })
}

/// Coerce a JSON number or numeric string into an [`Intensity`].
///
/// The value is rounded half away from zero before the range check, so
/// `4.6` becomes 5 and `5.5` is rejected.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidIntensity`] for missing, non-numeric,
/// non-finite or out-of-range input.
pub fn coerce_intensity(value: Option<&Value>) -> Result<Intensity, ValidationError> {
    let raw = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
    .ok_or(ValidationError::InvalidIntensity)?;

    let rounded = raw.round();
    if !(f64::from(Intensity::MIN)..=f64::from(Intensity::MAX)).contains(&rounded) {
        return Err(ValidationError::InvalidIntensity);
    }

    // In range, so the cast is exact.
    #[allow(clippy::cast_possible_truncation)]
    let value = rounded as i64;
    Intensity::new(value)
}

/// Coerce an optional JSON value into a UTC timestamp.
///
/// `None`, `null` and `""` mean "not supplied" and yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`ValidationError::InvalidDate`] if a value is present but not a
/// recognizable timestamp, or falls outside the years 0000 to 9999.
pub fn coerce_date(value: Option<&Value>) -> Result<Option<DateTime<Utc>>, ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => parse_date_str(s)
            .filter(|dt| SUPPORTED_YEARS.contains(&dt.year()))
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidDate { value: s.clone() }),
        Some(Value::Number(n)) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .filter(|dt| SUPPORTED_YEARS.contains(&dt.year()))
            .map(Some)
            .ok_or_else(|| ValidationError::InvalidDate {
                value: n.to_string(),
            }),
        Some(other) => Err(ValidationError::InvalidDate {
            value: other.to_string(),
        }),
    }
}

/// Parse the textual date forms we accept.
fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return wall_clock_to_utc(&Local, naive);
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Interpret a wall-clock time in `zone`.
///
/// Ambiguous times (clocks falling back) take the earlier instant. Times in a
/// spring-forward gap are read with the offset in force before the gap, which
/// moves them forward by the gap's length.
fn wall_clock_to_utc<Tz: TimeZone>(zone: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    if let Some(dt) = zone.from_local_datetime(&naive).earliest() {
        return Some(dt.with_timezone(&Utc));
    }

    let before_gap = zone
        .from_local_datetime(&(naive - Duration::hours(24)))
        .earliest()?;
    let offset = Duration::seconds(i64::from(before_gap.offset().fix().local_minus_utc()));
    Some((naive - offset).and_utc())
}

/// Empty text is treated the same as absent text.
fn normalize_text(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, MappedLocalTime};
    use serde_json::json;

    fn candidate(intensity: Value) -> SneezeCandidate {
        SneezeCandidate {
            intensity: Some(intensity),
            ..SneezeCandidate::default()
        }
    }

    #[test]
    fn test_accepts_integer_range() {
        for v in 1..=5 {
            let sneeze = validate(&candidate(json!(v))).unwrap();
            assert_eq!(i64::from(sneeze.intensity.value()), v);
        }
    }

    #[test]
    fn test_rejects_zero_and_six() {
        assert_eq!(
            validate(&candidate(json!(0))),
            Err(ValidationError::InvalidIntensity)
        );
        assert_eq!(
            validate(&candidate(json!(6))),
            Err(ValidationError::InvalidIntensity)
        );
    }

    #[test]
    fn test_accepts_iff_rounded_value_in_range() {
        let cases = [
            (0.4_f64, false),
            (0.5, true),
            (1.0, true),
            (2.49, true),
            (4.6, true),
            (5.49, true),
            (5.5, false),
            (-3.0, false),
            (100.0, false),
        ];
        for (v, accepted) in cases {
            let result = coerce_intensity(Some(&json!(v)));
            assert_eq!(result.is_ok(), accepted, "value {v}");
            if let Ok(intensity) = result {
                #[allow(clippy::cast_possible_truncation)]
                let expected = v.round() as u8;
                assert_eq!(intensity.value(), expected);
            }
        }
    }

    #[test]
    fn test_accepts_numeric_strings() {
        assert_eq!(coerce_intensity(Some(&json!("3"))).unwrap().value(), 3);
        assert_eq!(coerce_intensity(Some(&json!(" 4 "))).unwrap().value(), 4);
        assert_eq!(coerce_intensity(Some(&json!("1.6"))).unwrap().value(), 2);
    }

    #[test]
    fn test_rejects_missing_and_non_numeric_intensity() {
        let bad = [
            None,
            Some(json!(null)),
            Some(json!(true)),
            Some(json!("loud")),
            Some(json!("")),
            Some(json!([3])),
            Some(json!({"value": 3})),
            Some(json!("NaN")),
            Some(json!("inf")),
        ];
        for value in bad {
            assert_eq!(
                coerce_intensity(value.as_ref()),
                Err(ValidationError::InvalidIntensity),
                "value {value:?}"
            );
        }
    }

    #[test]
    fn test_empty_text_normalized_to_none() {
        let sneeze = validate(&SneezeCandidate {
            intensity: Some(json!(2)),
            location: Some(String::new()),
            notes: Some(String::new()),
            date: None,
        })
        .unwrap();

        assert!(sneeze.location.is_none());
        assert!(sneeze.notes.is_none());
    }

    #[test]
    fn test_text_kept_verbatim() {
        let sneeze = validate(&SneezeCandidate {
            intensity: Some(json!(2)),
            location: Some("Office".to_string()),
            notes: Some("  dusty  ".to_string()),
            date: None,
        })
        .unwrap();

        assert_eq!(sneeze.location.as_deref(), Some("Office"));
        assert_eq!(sneeze.notes.as_deref(), Some("  dusty  "));
    }

    #[test]
    fn test_missing_date_left_unset() {
        let sneeze = validate(&candidate(json!(3))).unwrap();
        assert!(sneeze.date.is_none());

        assert_eq!(coerce_date(Some(&json!(null))), Ok(None));
        assert_eq!(coerce_date(Some(&json!(""))), Ok(None));
    }

    #[test]
    fn test_parses_rfc3339_date() {
        let date = coerce_date(Some(&json!("2024-03-10T14:30:00+02:00")))
            .unwrap()
            .unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-10T12:30:00+00:00");

        let date = coerce_date(Some(&json!("2024-03-10T14:30:00.250Z")))
            .unwrap()
            .unwrap();
        assert_eq!(date.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_parses_bare_date_as_utc_midnight() {
        let date = coerce_date(Some(&json!("2024-03-10"))).unwrap().unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-10T00:00:00+00:00");
    }

    #[test]
    fn test_parses_naive_datetime_as_local() {
        let date = coerce_date(Some(&json!("2024-03-10T14:30:00")))
            .unwrap()
            .unwrap();
        let local = date.with_timezone(&Local);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2024-03-10 14:30");
    }

    /// UTC+1 until 2024-03-31 01:00 UTC, UTC+2 afterwards.
    #[derive(Debug, Clone, Copy)]
    struct SpringForward;

    impl SpringForward {
        fn switch() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2024, 3, 31)
                .unwrap()
                .and_hms_opt(1, 0, 0)
                .unwrap()
        }

        fn winter() -> FixedOffset {
            FixedOffset::east_opt(3600).unwrap()
        }

        fn summer() -> FixedOffset {
            FixedOffset::east_opt(7200).unwrap()
        }
    }

    impl TimeZone for SpringForward {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            SpringForward
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
            self.offset_from_local_datetime(&local.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_local_datetime(&self, local: &NaiveDateTime) -> MappedLocalTime<FixedOffset> {
            let as_winter = *local - Duration::hours(1) < Self::switch();
            let as_summer = *local - Duration::hours(2) >= Self::switch();
            match (as_winter, as_summer) {
                (true, false) => MappedLocalTime::Single(Self::winter()),
                (false, true) => MappedLocalTime::Single(Self::summer()),
                (true, true) => MappedLocalTime::Ambiguous(Self::winter(), Self::summer()),
                (false, false) => MappedLocalTime::None,
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_hms_opt(0, 0, 0).unwrap())
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::switch() {
                Self::winter()
            } else {
                Self::summer()
            }
        }
    }

    fn naive(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap()
    }

    #[test]
    fn test_wall_clock_outside_gap_uses_zone_offset() {
        let before = wall_clock_to_utc(&SpringForward, naive("2024-03-31T01:30")).unwrap();
        assert_eq!(before.to_rfc3339(), "2024-03-31T00:30:00+00:00");

        let after = wall_clock_to_utc(&SpringForward, naive("2024-03-31T03:30")).unwrap();
        assert_eq!(after.to_rfc3339(), "2024-03-31T01:30:00+00:00");
    }

    #[test]
    fn test_wall_clock_in_gap_shifts_forward() {
        let shifted = wall_clock_to_utc(&SpringForward, naive("2024-03-31T02:30")).unwrap();
        assert_eq!(shifted.to_rfc3339(), "2024-03-31T01:30:00+00:00");
        assert_eq!(
            shifted.with_timezone(&SpringForward).format("%H:%M").to_string(),
            "03:30"
        );
    }

    #[test]
    fn test_rejects_dates_outside_four_digit_years() {
        for millis in [999_999_999_999_999_i64, -62_198_755_200_000] {
            assert_eq!(
                coerce_date(Some(&json!(millis))),
                Err(ValidationError::InvalidDate {
                    value: millis.to_string()
                })
            );
        }

        // 9999-12-31T23:59:59.999Z and 0000-01-01T00:00:00Z are the bounds.
        assert!(coerce_date(Some(&json!(253_402_300_799_999_i64))).unwrap().is_some());
        assert!(coerce_date(Some(&json!(-62_167_219_200_000_i64))).unwrap().is_some());
        assert!(coerce_date(Some(&json!(253_402_300_800_000_i64))).is_err());
    }

    #[test]
    fn test_parses_epoch_millis() {
        let date = coerce_date(Some(&json!(1_700_000_000_000_i64)))
            .unwrap()
            .unwrap();
        assert_eq!(date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_rejects_unparseable_date() {
        let err = validate(&SneezeCandidate {
            intensity: Some(json!(3)),
            date: Some(json!("last tuesday")),
            ..SneezeCandidate::default()
        })
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::InvalidDate {
                value: "last tuesday".to_string()
            }
        );
        assert_eq!(err.field(), "date");

        assert!(coerce_date(Some(&json!(true))).is_err());
        assert!(coerce_date(Some(&json!(1.5))).is_err());
    }

    #[test]
    fn test_intensity_checked_before_date() {
        let err = validate(&SneezeCandidate {
            intensity: Some(json!(9)),
            date: Some(json!("garbage")),
            ..SneezeCandidate::default()
        })
        .unwrap_err();
        assert_eq!(err, ValidationError::InvalidIntensity);
    }

    #[test]
    fn test_candidate_deserializes_loose_json() {
        let candidate: SneezeCandidate =
            serde_json::from_str(r#"{"intensity": "4", "location": "Home"}"#).unwrap();
        assert_eq!(candidate.intensity, Some(json!("4")));
        assert_eq!(candidate.location.as_deref(), Some("Home"));
        assert!(candidate.notes.is_none());
        assert!(candidate.date.is_none());
    }
}
