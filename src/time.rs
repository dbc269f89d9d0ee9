//! Local time derived from UTC and longitude.
//!
//! There is no time zone database on the clock. The offset is the nominal
//! solar zone of the last known longitude: one hour per 15 degrees, centred on
//! the meridian. Political zones are ignored.
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

pub const MIN_TZ: i8 = -12;
pub const MAX_TZ: i8 = 14;

/// Whole-hour offset from UTC for `longitude` in signed degrees (east positive).
pub fn tz_from_longitude(longitude: f32) -> i8 {
    if longitude.is_nan() {
        return 0;
    }
    let zone = libm::floorf((longitude + 7.5) / 15.0);
    // Saturating float to int cast, then clamp to the zones that exist
    (zone as i32).clamp(MIN_TZ.into(), MAX_TZ.into()) as i8
}

/// Offset for an optional longitude. No position yet means UTC.
pub fn offset_from_longitude(longitude: Option<f32>) -> FixedOffset {
    let hours = longitude.map_or(0, tz_from_longitude);
    FixedOffset::east_opt(i32::from(hours) * 3600).unwrap_or(Utc.fix())
}

/// Shift UTC to local time.
///
/// With a date the shift rolls over day, month and year boundaries. Without
/// one only the time of day wraps and no local date is produced.
pub fn localize(
    utc_time: NaiveTime,
    utc_date: Option<NaiveDate>,
    longitude: Option<f32>,
) -> (NaiveTime, Option<NaiveDate>) {
    let offset = offset_from_longitude(longitude);
    match utc_date {
        Some(date) => {
            let local = DateTime::<Utc>::from_naive_utc_and_offset(date.and_time(utc_time), Utc)
                .with_timezone(&offset);
            (local.time(), Some(local.date_naive()))
        }
        None => {
            let shift = Duration::seconds(offset.local_minus_utc().into());
            (utc_time.overflowing_add_signed(shift).0, None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn hms(h: u32, m: u32, s: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, s).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn zone_from_longitude() {
        assert_eq!(tz_from_longitude(138.0), 9);
        assert_eq!(tz_from_longitude(-7.4), 0);
        assert_eq!(tz_from_longitude(7.5), 1);
        assert_eq!(tz_from_longitude(-7.6), -1);
        assert_eq!(tz_from_longitude(-74.0), -5);
        assert_eq!(tz_from_longitude(180.0), 12);
        assert_eq!(tz_from_longitude(f32::NAN), 0);
    }

    #[test]
    fn zone_is_clamped() {
        assert_eq!(tz_from_longitude(210.0), 14);
        assert_eq!(tz_from_longitude(-400.0), -12);
        assert_eq!(tz_from_longitude(f32::INFINITY), 14);
        assert_eq!(tz_from_longitude(f32::NEG_INFINITY), -12);
    }

    #[test]
    fn unknown_longitude_is_utc() {
        assert_eq!(offset_from_longitude(None).local_minus_utc(), 0);
        assert_eq!(offset_from_longitude(Some(30.0)).local_minus_utc(), 2 * 3600);
        let (time, date) = localize(hms(12, 35, 19), Some(ymd(2024, 5, 1)), None);
        assert_eq!(time, hms(12, 35, 19));
        assert_eq!(date, Some(ymd(2024, 5, 1)));
    }

    #[test]
    fn rolls_into_leap_day() {
        // 30 degrees east is UTC+2
        let (time, date) = localize(hms(23, 10, 5), Some(ymd(2024, 2, 28)), Some(30.0));
        assert_eq!(time, hms(1, 10, 5));
        assert_eq!(date, Some(ymd(2024, 2, 29)));
    }

    #[test]
    fn rolls_into_march_without_leap_day() {
        let (time, date) = localize(hms(23, 0, 0), Some(ymd(2023, 2, 28)), Some(30.0));
        assert_eq!(time, hms(1, 0, 0));
        assert_eq!(date, Some(ymd(2023, 3, 1)));

        // Centuries are only leap years when divisible by 400
        let (_, date) = localize(hms(23, 0, 0), Some(ymd(2100, 2, 28)), Some(30.0));
        assert_eq!(date, Some(ymd(2100, 3, 1)));
        let (_, date) = localize(hms(23, 0, 0), Some(ymd(2000, 2, 28)), Some(30.0));
        assert_eq!(date, Some(ymd(2000, 2, 29)));
    }

    #[test]
    fn rolls_into_new_year() {
        // 135 degrees east is UTC+9
        let (time, date) = localize(hms(23, 30, 0), Some(ymd(2024, 12, 31)), Some(135.0));
        assert_eq!(time, hms(8, 30, 0));
        assert_eq!(date, Some(ymd(2025, 1, 1)));
    }

    #[test]
    fn rolls_back_over_new_year() {
        // New York, UTC-5
        let (time, date) = localize(hms(2, 30, 0), Some(ymd(2025, 1, 1)), Some(-74.0));
        assert_eq!(time, hms(21, 30, 0));
        assert_eq!(date, Some(ymd(2024, 12, 31)));
    }

    #[test]
    fn minutes_and_seconds_follow_utc() {
        let utc = hms(6, 47, 59);
        for lon in [-170.0, -45.0, 0.0, 100.0, 179.0] {
            let (local, _) = localize(utc, Some(ymd(2024, 7, 14)), Some(lon));
            assert_eq!((local.minute(), local.second()), (47, 59));
        }
    }

    #[test]
    fn time_wraps_without_date() {
        let (time, date) = localize(hms(22, 15, 0), None, Some(138.0));
        assert_eq!(time, hms(7, 15, 0));
        assert_eq!(date, None);

        let (time, _) = localize(hms(3, 0, 0), None, Some(-120.0));
        assert_eq!(time, hms(19, 0, 0));
    }
}
