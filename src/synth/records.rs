//! Record synthesis
//!
//! Turns a window aggregate into concrete records:
//!
//! 1. For every terms-per-record bucket `k` (ascending) and each of its
//!    records, take `k` terms from the front of the term supply.
//! 2. Shuffle the records.
//! 3. Spread them over the window with the stream clock and number them.

use crate::synth::aggregate::AggregateState;
use crate::util::round_half_up;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

/// One synthetic record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Position in the whole stream, starting at 0
    pub id: u64,
    /// Creation time in epoch millis (whole seconds)
    pub timestamp: i64,
    pub terms: Vec<Arc<str>>,
}

impl Record {
    pub fn new(id: u64, timestamp: i64, terms: Vec<Arc<str>>) -> Self {
        Self {
            id,
            timestamp,
            terms,
        }
    }

    /// Terms joined by single spaces
    pub fn text(&self) -> String {
        self.terms
            .iter()
            .map(|t| &**t)
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| &**t == term)
    }

    /// Timestamp truncated to whole seconds
    pub fn second(&self) -> i64 {
        self.timestamp.div_euclid(1000)
    }
}

/// Assigns timestamps to consecutive windows
///
/// Timestamps never decrease across windows: each window resumes one second
/// after the last timestamp handed out (and never before its own start).
#[derive(Debug, Clone, Default)]
pub struct StreamClock {
    last: Option<i64>,
}

impl StreamClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timestamps for `count` records in `[start_ms, end_ms)`
    ///
    /// With at least one second per record the clock advances by the
    /// rounded per-record spacing before every record. Denser windows
    /// advance one second after every `round(records per second)` records.
    /// Timestamps reaching the window end are pinned to its last second.
    pub fn assign(&mut self, start_ms: i64, end_ms: i64, count: usize) -> Vec<i64> {
        if count == 0 || end_ms <= start_ms {
            return Vec::new();
        }

        let mut clock = match self.last {
            Some(last) => (last - last.rem_euclid(1000) + 1000).max(start_ms),
            None => start_ms,
        };
        let last_second = end_ms - 1000;

        let window_secs = (end_ms - start_ms) / 1000;
        let seconds_per_record = window_secs as f64 / count as f64;
        let step = if seconds_per_record >= 1.0 {
            Some(round_half_up(seconds_per_record) * 1000)
        } else {
            None
        };
        let batch = round_half_up(count as f64 / window_secs.max(1) as f64).max(1) as usize;

        let mut timestamps = Vec::with_capacity(count);
        for i in 0..count {
            match step {
                Some(step) => clock += step,
                None if i > 0 && i % batch == 0 => clock += 1000,
                None => {}
            }
            if clock >= end_ms {
                clock = last_second;
            }
            timestamps.push(clock);
        }

        self.last = timestamps.last().copied();
        timestamps
    }

    /// Last timestamp handed out
    pub fn last(&self) -> Option<i64> {
        self.last
    }
}

/// Produces the records of consecutive windows
#[derive(Debug, Default)]
pub struct RecordSynthesizer {
    next_id: u64,
    clock: StreamClock,
}

impl RecordSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Term sets for every record of the census, smallest buckets first
    ///
    /// Produces exactly `state.record_count()` sets. A set is shorter than
    /// its bucket only when the term supply is exhausted, which happens
    /// only for inconsistent input.
    pub fn build_term_sets(state: AggregateState) -> Vec<Vec<Arc<str>>> {
        let AggregateState {
            mut term_frequency,
            size_frequency,
        } = state;

        let mut sets = Vec::with_capacity(size_frequency.values().sum::<u64>() as usize);
        let mut short = 0u64;

        for (&bucket, &records) in &size_frequency {
            for _ in 0..records {
                let terms = term_frequency.take_front(bucket as usize);
                if terms.len() < bucket as usize {
                    short += 1;
                }
                sets.push(terms);
            }
        }

        if short > 0 {
            tracing::warn!(records = short, "Term supply exhausted before the record census");
        }

        sets
    }

    /// Synthesize the records of one window
    pub fn synthesize<R: Rng + ?Sized>(
        &mut self,
        state: AggregateState,
        start_ms: i64,
        end_ms: i64,
        rng: &mut R,
    ) -> Vec<Record> {
        let mut sets = Self::build_term_sets(state);
        sets.shuffle(rng);

        let timestamps = self.clock.assign(start_ms, end_ms, sets.len());
        sets.into_iter()
            .zip(timestamps)
            .map(|(terms, timestamp)| {
                let id = self.next_id;
                self.next_id += 1;
                Record::new(id, timestamp, terms)
            })
            .collect()
    }

    /// Number of records produced so far
    pub fn records_emitted(&self) -> u64 {
        self.next_id
    }

    pub fn clock(&self) -> &StreamClock {
        &self.clock
    }
}
