//! Simulated events
//!
//! Fabricated trajectories follow a three-phase curve per term:
//!
//! ```text
//! idf
//!  ^  ______
//!  |        \            ___---
//!  |         \     ___---
//!  |          \_---
//!  +--------------------------------> minutes
//!     lead    ramp     recovery
//! ```
//!
//! 1. a flat plateau at the start IDF for the lead minutes,
//! 2. a linear drop to the drop IDF over `ramp_minutes`,
//! 3. a recovery by `recovery_input / 100` per minute for the rest of the
//!    event duration.
//!
//! Every minute target is expanded into 60 per-second values whose mean is
//! the target, ordered in the direction of the curve.

use crate::events::curve::{Event, EventInputEntry};
use crate::events::error::{EventError, EventResult};
use crate::util::round_to_integer;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

/// Accepted range of the 1..10 shape inputs
pub const INPUT_RANGE: RangeInclusive<u8> = 1..=10;

/// Seconds per minute, i.e. samples per minute target
const SAMPLES_PER_MINUTE: usize = 60;

/// Relative weights of the five stepped buckets of a minute
const BUCKET_WEIGHTS: [u32; 5] = [5, 5, 5, 18, 17];

/// Weight of the remainder bucket that restores the minute mean
const REMAINDER_WEIGHT: u32 = 10;

/// Shape of one simulated term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedTerm {
    pub term: String,
    /// 1 = minimum IDF, 10 = maximum IDF
    pub start_input: u8,
    /// 1..10, tenths of the distance to the minimum IDF dropped during the ramp
    pub drop_input: u8,
    /// Minutes the drop takes
    #[serde(default = "default_ramp_minutes")]
    pub ramp_minutes: u32,
    /// 1..10, hundredths of IDF recovered per minute after the drop
    #[serde(default = "default_recovery_input")]
    pub recovery_input: u8,
}

fn default_ramp_minutes() -> u32 {
    1
}

fn default_recovery_input() -> u8 {
    1
}

/// Run-wide parameters of simulated curves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveShape {
    pub min_idf: f64,
    pub max_idf: f64,
    pub lead_minutes: u32,
    pub duration_minutes: u32,
}

impl SimulatedTerm {
    pub fn new(term: impl Into<String>, start_input: u8, drop_input: u8, ramp_minutes: u32, recovery_input: u8) -> Self {
        Self {
            term: term.into(),
            start_input,
            drop_input,
            ramp_minutes,
            recovery_input,
        }
    }

    /// Reject inputs outside their ranges
    pub fn validate(&self, event: &str, shape: &CurveShape) -> EventResult<()> {
        let invalid = |reason: String| EventError::InvalidShape {
            event: event.to_string(),
            term: self.term.clone(),
            reason,
        };

        for (name, value) in [
            ("start input", self.start_input),
            ("drop input", self.drop_input),
            ("recovery input", self.recovery_input),
        ] {
            if !INPUT_RANGE.contains(&value) {
                return Err(invalid(format!("{} must be between 1 and 10, got {}", name, value)));
            }
        }

        if self.ramp_minutes == 0 {
            return Err(invalid("ramp must last at least one minute".to_string()));
        }

        if shape.lead_minutes + self.ramp_minutes > shape.duration_minutes {
            return Err(invalid(format!(
                "lead ({}) and ramp ({}) exceed the event duration ({})",
                shape.lead_minutes, self.ramp_minutes, shape.duration_minutes
            )));
        }

        Ok(())
    }

    /// Plateau IDF, interpolated between the minimum and maximum
    pub fn start_idf(&self, shape: &CurveShape) -> f64 {
        let position = f64::from(self.start_input.saturating_sub(1)) / 9.0;
        shape.min_idf + (shape.max_idf - shape.min_idf) * position
    }

    /// IDF reached at the end of the ramp
    pub fn drop_idf(&self, shape: &CurveShape) -> f64 {
        let start = self.start_idf(shape);
        start - f64::from(self.drop_input) * (start - shape.min_idf) / 10.0
    }

    /// Per-second samples of this term, starting at `start_secs`
    pub fn series(&self, shape: &CurveShape, start_secs: i64) -> Vec<EventInputEntry> {
        let start_idf = self.start_idf(shape);
        let ramp_step = (start_idf - self.drop_idf(shape)) / f64::from(self.ramp_minutes);
        let recovery_step = f64::from(self.recovery_input) / 100.0;
        let recovery_minutes = shape.duration_minutes.saturating_sub(shape.lead_minutes + self.ramp_minutes);

        let mut minutes: Vec<Vec<f64>> = Vec::new();

        for _ in 0..shape.lead_minutes {
            minutes.push(minute_values(start_idf, 0.0, true));
        }

        let mut current = start_idf;
        for _ in 0..self.ramp_minutes {
            current -= ramp_step;
            minutes.push(minute_values(current, ramp_step, false));
        }

        for _ in 0..recovery_minutes {
            current += recovery_step;
            minutes.push(minute_values(current, recovery_step, true));
        }

        minutes
            .iter()
            .enumerate()
            .flat_map(|(minute, values)| {
                let minute_start = start_secs + minute as i64 * 60;
                spread_over_minute(values)
                    .into_iter()
                    .enumerate()
                    .map(move |(second, idf)| EventInputEntry::new(minute_start + second as i64, idf))
            })
            .collect()
    }
}

/// Expand a minute target into 60 per-second values
///
/// Five buckets step through `[value - step/2, value + step/6]` with fixed
/// weights; a remainder bucket makes the 60 values average to `value`.
/// Values are sorted ascending (`up`) or descending. A zero step yields 60
/// copies of `value`.
pub fn minute_values(value: f64, step: f64, up: bool) -> Vec<f64> {
    if step == 0.0 {
        return vec![value; SAMPLES_PER_MINUTE];
    }

    let stepping = step / 6.0;
    let mut buckets: Vec<(f64, u32)> = BUCKET_WEIGHTS
        .iter()
        .enumerate()
        .map(|(i, &weight)| (value - step / 2.0 + stepping * i as f64, weight))
        .collect();

    let weighted: f64 = buckets.iter().map(|&(v, w)| v * f64::from(w)).sum();
    let remainder = (value * SAMPLES_PER_MINUTE as f64 - weighted) / f64::from(REMAINDER_WEIGHT);
    match buckets.iter_mut().find(|(v, _)| *v == remainder) {
        Some((_, weight)) => *weight += REMAINDER_WEIGHT,
        None => buckets.push((remainder, REMAINDER_WEIGHT)),
    }

    buckets.sort_by(|a, b| a.0.total_cmp(&b.0));
    if !up {
        buckets.reverse();
    }

    buckets
        .into_iter()
        .flat_map(|(v, weight)| std::iter::repeat(v).take(weight as usize))
        .collect()
}

/// Place up to 60 values onto the seconds of one minute
///
/// A full minute takes one value per second. Otherwise values land on every
/// `stride`-th second (`stride = ceil(60 / count)`), the slots lost to the
/// rounded stride are filled first, and the remaining seconds stay empty.
pub fn spread_over_minute(values: &[f64]) -> Vec<Option<f64>> {
    let count = values.len().min(SAMPLES_PER_MINUTE);
    if count == SAMPLES_PER_MINUTE {
        return values.iter().take(SAMPLES_PER_MINUTE).copied().map(Some).collect();
    }
    if count == 0 {
        return vec![None; SAMPLES_PER_MINUTE];
    }

    let stride = round_to_integer(SAMPLES_PER_MINUTE as f64 / count as f64, true) as usize;
    let mut missed = count - SAMPLES_PER_MINUTE / stride;
    let mut next = values.iter().take(count).copied();

    (0..SAMPLES_PER_MINUTE)
        .map(|second| {
            if second > 0 && second % stride == stride - 1 {
                next.next()
            } else if missed > 0 {
                missed -= 1;
                next.next()
            } else {
                None
            }
        })
        .collect()
}

/// Build a simulated event starting with the stream
///
/// The event start is placed after the lead minutes, like a trimmed
/// historical event.
pub fn simulated_event(id: &str, terms: &[SimulatedTerm], shape: &CurveShape, stream_start: i64) -> EventResult<Event> {
    let mut series = BTreeMap::new();
    for term in terms {
        term.validate(id, shape)?;
        series.insert(term.term.clone(), term.series(shape, stream_start));
    }

    let mut event = Event::from_series(id, series);
    event.set_event_start_raw(stream_start + i64::from(shape.lead_minutes) * 60);
    Ok(event)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(lead: u32, duration: u32) -> CurveShape {
        CurveShape {
            min_idf: 2.0,
            max_idf: 6.0,
            lead_minutes: lead,
            duration_minutes: duration,
        }
    }

    fn mean(values: &[f64]) -> f64 {
        values.iter().sum::<f64>() / values.len() as f64
    }

    #[test]
    fn test_start_and_drop_idf() {
        let shape = shape(2, 20);
        assert_eq!(SimulatedTerm::new("t", 1, 5, 1, 1).start_idf(&shape), 2.0);
        assert_eq!(SimulatedTerm::new("t", 10, 5, 1, 1).start_idf(&shape), 6.0);
        assert!((SimulatedTerm::new("t", 4, 5, 1, 1).start_idf(&shape) - 3.333).abs() < 1e-3);

        assert_eq!(SimulatedTerm::new("t", 10, 10, 1, 1).drop_idf(&shape), 2.0);
        assert_eq!(SimulatedTerm::new("t", 10, 5, 1, 1).drop_idf(&shape), 4.0);
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let shape = shape(2, 20);
        assert!(SimulatedTerm::new("t", 4, 10, 1, 1).validate("SIM", &shape).is_ok());

        for term in [
            SimulatedTerm::new("t", 0, 10, 1, 1),
            SimulatedTerm::new("t", 4, 11, 1, 1),
            SimulatedTerm::new("t", 4, 10, 1, 0),
            SimulatedTerm::new("t", 4, 10, 0, 1),
            SimulatedTerm::new("t", 4, 10, 19, 1),
        ] {
            let err = term.validate("SIM", &shape).unwrap_err();
            assert!(matches!(err, EventError::InvalidShape { .. }));
        }
    }

    #[test]
    fn test_minute_values_keep_mean() {
        for (value, step, up) in [(4.0, 2.0, false), (2.5, 0.01, true), (3.1, 0.7, false)] {
            let values = minute_values(value, step, up);
            assert_eq!(values.len(), 60);
            assert!((mean(&values) - value).abs() < 1e-9);
        }
        assert_eq!(minute_values(3.0, 0.0, true), vec![3.0; 60]);
    }

    #[test]
    fn test_minute_values_are_ordered() {
        let down = minute_values(4.0, 2.0, false);
        assert!(down.windows(2).all(|p| p[0] >= p[1]));
        assert!(down[0] > down[59]);

        let up = minute_values(4.0, 0.05, true);
        assert!(up.windows(2).all(|p| p[0] <= p[1]));
    }

    #[test]
    fn test_full_drop_in_one_minute() {
        // Start at the maximum, drop all the way to the minimum in one minute
        let shape = shape(0, 1);
        let series = SimulatedTerm::new("t", 10, 10, 1, 1).series(&shape, 0);
        assert_eq!(series.len(), 60);

        let values: Vec<f64> = series.iter().filter_map(|e| e.idf).collect();
        assert_eq!(values.len(), 60);
        assert!(values.windows(2).all(|p| p[0] >= p[1]));
        assert!((mean(&values) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_series_phases() {
        let shape = shape(2, 6);
        let series = SimulatedTerm::new("t", 10, 10, 2, 5).series(&shape, 1_000);
        assert_eq!(series.len(), 6 * 60);
        assert_eq!(series[0].timestamp, 1_000);
        assert_eq!(series[359].timestamp, 1_000 + 359);

        let minute_mean = |m: usize| {
            let values: Vec<f64> = series[m * 60..(m + 1) * 60].iter().filter_map(|e| e.idf).collect();
            mean(&values)
        };
        // Plateau, two ramp minutes, two recovery minutes
        assert!((minute_mean(0) - 6.0).abs() < 1e-9);
        assert!((minute_mean(1) - 6.0).abs() < 1e-9);
        assert!((minute_mean(2) - 4.0).abs() < 1e-9);
        assert!((minute_mean(3) - 2.0).abs() < 1e-9);
        assert!((minute_mean(4) - 2.05).abs() < 1e-9);
        assert!((minute_mean(5) - 2.10).abs() < 1e-9);
    }

    #[test]
    fn test_spread_over_minute() {
        let full = spread_over_minute(&[1.0; 60]);
        assert!(full.iter().all(Option::is_some));

        // Stride 3 fits exactly
        let spread = spread_over_minute(&[1.0; 20]);
        assert_eq!(spread.iter().filter(|v| v.is_some()).count(), 20);
        assert_eq!(spread[2], Some(1.0));
        assert_eq!(spread[0], None);

        // Stride 9 leaves one value for the first free second
        let values: Vec<f64> = (0..7).map(f64::from).collect();
        let spread = spread_over_minute(&values);
        assert_eq!(spread.len(), 60);
        assert_eq!(spread.iter().filter(|v| v.is_some()).count(), 7);
        assert_eq!(spread[0], Some(0.0));
        assert_eq!(spread[8], Some(1.0));

        assert!(spread_over_minute(&[]).iter().all(Option::is_none));
    }

    #[test]
    fn test_simulated_event() {
        let shape = shape(2, 20);
        let terms = vec![
            SimulatedTerm::new("test1", 4, 10, 1, 1),
            SimulatedTerm::new("test2", 5, 10, 4, 2),
        ];
        let event = simulated_event("SIMULATED", &terms, &shape, 946_684_800).unwrap();

        assert_eq!(event.series().len(), 2);
        assert_eq!(event.sample_count(), 20 * 60);
        assert_eq!(event.event_start(), 946_684_800 + 120);
        assert_eq!(event.terms(), &["test1".to_string(), "test2".to_string()]);

        let bad = vec![SimulatedTerm::new("x", 11, 1, 1, 1)];
        assert!(simulated_event("SIMULATED", &bad, &shape, 0).is_err());
    }
}
