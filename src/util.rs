//! Numeric and time helpers shared by every stage of the generator.
//!
//! - rounding with explicit half-up / toward-zero / away-from-zero semantics
//! - the run's seedable random source
//! - parsing and formatting of the timestamp formats used by the inputs and
//!   outputs (all times are UTC)

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Format of `stream.start` and of the event catalog start times
pub const STREAM_TIME_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

/// Format of the creation date column in the record stream
pub const RECORD_DATE_FORMAT: &str = "%a %b %d %H:%M:%S GMT %Y";

/// Prefix of output files, one per hour of stream time
pub const HOUR_FILE_FORMAT: &str = "%Y_%m_%d_%H";

/// Round to the nearest integer, ties away from zero
pub fn round_half_up(value: f64) -> i64 {
    value.round() as i64
}

/// Round to `places` decimal places, ties away from zero
pub fn round_places(value: f64, places: u32) -> f64 {
    let factor = 10f64.powi(places as i32);
    (value * factor).round() / factor
}

/// Drop the fractional part, either away from zero (`up`) or toward zero
pub fn round_to_integer(value: f64, up: bool) -> i64 {
    if up {
        if value >= 0.0 {
            value.ceil() as i64
        } else {
            value.floor() as i64
        }
    } else {
        value.trunc() as i64
    }
}

/// Create the run's random source
///
/// A fixed seed makes the whole run reproducible; without one the generator
/// is seeded from the operating system.
pub fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    }
}

/// Uniform integer in `[low, high]`
pub fn random_between<R: Rng + ?Sized>(rng: &mut R, low: i64, high: i64) -> i64 {
    if high <= low {
        return low;
    }
    rng.random_range(low..=high)
}

/// Pick `amount` distinct indices out of `0..len` in random order
pub fn sample_indices<R: Rng + ?Sized>(rng: &mut R, len: usize, amount: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..len).collect();
    order.shuffle(rng);
    order.truncate(amount);
    order
}

/// Parse a `MM/dd/yyyy HH:mm:ss` UTC string into epoch seconds
pub fn parse_stream_time(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value.trim(), STREAM_TIME_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp())
}

/// Format epoch seconds as `MM/dd/yyyy HH:mm:ss`
pub fn format_stream_time(seconds: i64) -> String {
    format_seconds(seconds, STREAM_TIME_FORMAT)
}

/// Format epoch milliseconds the way the record stream shows creation dates
pub fn format_record_date(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .map(|dt| dt.format(RECORD_DATE_FORMAT).to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Parse a creation date written by [`format_record_date`] back to millis
pub fn parse_record_date(value: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(value.trim(), RECORD_DATE_FORMAT)
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

/// Epoch seconds as `yyyy_MM_dd_HH`
pub fn hour_stamp(seconds: i64) -> String {
    format_seconds(seconds, HOUR_FILE_FORMAT)
}

fn format_seconds(seconds: i64, format: &str) -> String {
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|dt| dt.format(format).to_string())
        .unwrap_or_else(|| seconds.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding_modes() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_to_integer(1.2, true), 2);
        assert_eq!(round_to_integer(1.0, true), 1);
        assert_eq!(round_to_integer(1.8, false), 1);
        assert_eq!(round_to_integer(-1.2, true), -2);
        assert_eq!(round_places(1.23456, 2), 1.23);
    }

    #[test]
    fn test_stream_time_roundtrip() {
        let seconds = parse_stream_time("01/01/2000 00:00:00").unwrap();
        assert_eq!(seconds, 946_684_800);
        assert_eq!(format_stream_time(seconds), "01/01/2000 00:00:00");
        assert!(parse_stream_time("2000-01-01").is_none());
    }

    #[test]
    fn test_record_date_format() {
        let millis = 946_684_801_000;
        let text = format_record_date(millis);
        assert_eq!(text, "Sat Jan 01 00:00:01 GMT 2000");
        assert_eq!(parse_record_date(&text), Some(millis));
        assert_eq!(hour_stamp(946_684_800 + 3600), "2000_01_01_01");
    }

    #[test]
    fn test_sample_indices_distinct() {
        let mut rng = seeded_rng(Some(7));
        let picked = sample_indices(&mut rng, 10, 4);
        assert_eq!(picked.len(), 4);
        let mut sorted = picked.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), 4);
        assert!(picked.iter().all(|&i| i < 10));
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut a = seeded_rng(Some(42));
        let mut b = seeded_rng(Some(42));
        for _ in 0..16 {
            assert_eq!(random_between(&mut a, 0, 100), random_between(&mut b, 0, 100));
        }
        assert_eq!(random_between(&mut a, 5, 5), 5);
    }
}
