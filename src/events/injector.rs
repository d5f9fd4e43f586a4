//! Event term injection
//!
//! The records of a window are cut into sub-windows of `idf_window_seconds`:
//! a sub-window starts at the second of its first record and takes every
//! following record less than `idf_window_seconds` later.
//!
//! For every sub-window with `N` records and every active event term with a
//! target `idf`, the term count `c` is the integer next to `N / e^idf` that
//! brings `ln(N / c)` closest to `idf`. The term is then appended to every
//! `ceil(N / c)`-th record of the sub-window, starting with the first.
//!
//! Records that already carry the term naturally are not discounted.

use crate::events::curve::Event;
use crate::synth::Record;
use std::ops::Range;
use std::sync::Arc;

/// Count that realizes `idf` among `records` records
///
/// Picks between `floor` and `ceil` of `records / e^idf`; ties go to the
/// floor, and a zero floor falls back to the ceiling.
pub fn target_count(records: u64, idf: f64) -> u64 {
    let exact = records as f64 / idf.exp();
    let ceil = exact.ceil() as u64;
    let floor = exact.floor() as u64;

    if floor == 0 {
        return ceil;
    }

    let n = records as f64;
    let ceil_error = ((n / ceil as f64).ln() - idf).abs();
    let floor_error = ((n / floor as f64).ln() - idf).abs();
    if ceil_error < floor_error {
        ceil
    } else {
        floor
    }
}

/// Split a window's records into sub-windows
pub fn partition_sub_windows(records: &[Record], idf_window_secs: i64) -> Vec<Range<usize>> {
    let Some(first) = records.first() else {
        return Vec::new();
    };

    let mut ranges = Vec::new();
    let mut start = 0;
    let mut start_second = first.second();

    for (i, record) in records.iter().enumerate().skip(1) {
        if record.second() - start_second >= idf_window_secs {
            ranges.push(start..i);
            start = i;
            start_second = record.second();
        }
    }
    ranges.push(start..records.len());
    ranges
}

/// Count and spacing chosen for one term
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InjectionTarget {
    /// Records that receive the term
    pub count: u64,
    /// Every `period`-th record receives the term
    pub period: u64,
    /// Requested IDF
    pub idf: f64,
    /// IDF realized by `count`
    pub reached: f64,
}

impl InjectionTarget {
    pub fn new(records: u64, idf: f64) -> Self {
        let count = target_count(records, idf).max(1);
        let period = records.div_ceil(count).max(1);
        Self {
            count,
            period,
            idf,
            reached: (records as f64 / count as f64).ln(),
        }
    }
}

/// Outcome for one event term in one sub-window
#[derive(Debug, Clone, PartialEq)]
pub struct TermReport {
    pub event: String,
    pub term: String,
    /// `None` for a missing sample; the term is not injected
    pub target: Option<InjectionTarget>,
}

/// Injection performed in one sub-window
#[derive(Debug, Clone, PartialEq)]
pub struct SubWindowReport {
    /// Position within the window
    pub local_index: usize,
    /// Position within the whole stream
    pub global_index: u64,
    /// Records of the window covered by this sub-window
    pub records: Range<usize>,
    pub terms: Vec<TermReport>,
}

impl SubWindowReport {
    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

/// Injects event terms window by window
///
/// Keeps the number of sub-windows seen so far; an event becomes active once
/// that number reaches its start delay expressed in sub-windows.
#[derive(Debug)]
pub struct EventInjector<'a> {
    events: &'a [Event],
    idf_window_secs: i64,
    elapsed: u64,
}

impl<'a> EventInjector<'a> {
    pub fn new(events: &'a [Event], idf_window_secs: u32) -> Self {
        Self {
            events,
            idf_window_secs: i64::from(idf_window_secs.max(1)),
            elapsed: 0,
        }
    }

    /// Sub-windows processed so far
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    pub fn idf_window_secs(&self) -> i64 {
        self.idf_window_secs
    }

    /// Inject into the records of one window, in order
    pub fn inject(&mut self, records: &mut [Record]) -> Vec<SubWindowReport> {
        partition_sub_windows(records, self.idf_window_secs)
            .into_iter()
            .enumerate()
            .map(|(local_index, range)| {
                let report = self.inject_sub_window(local_index, range.clone(), &mut records[range]);
                self.elapsed += 1;
                report
            })
            .collect()
    }

    fn inject_sub_window(&self, local_index: usize, range: Range<usize>, records: &mut [Record]) -> SubWindowReport {
        let n = records.len() as u64;
        let mut active: Vec<(Arc<str>, u64)> = Vec::new();
        let mut terms = Vec::new();

        for event in self.events {
            let Some(offset) = self.offset(event) else {
                continue;
            };

            for term in event.series().keys() {
                let Some(sample) = event.sample(term, offset) else {
                    continue;
                };

                let target = sample.map(|idf| InjectionTarget::new(n, idf));
                let slot = active.iter().position(|(t, _)| &**t == term.as_str());
                match (target, slot) {
                    (Some(target), Some(i)) => active[i].1 = target.period,
                    (Some(target), None) => active.push((Arc::from(term.as_str()), target.period)),
                    (None, Some(i)) => {
                        active.remove(i);
                    }
                    (None, None) => {}
                }

                if let Some(target) = target {
                    tracing::trace!(
                        event = %event.id(),
                        term = %term,
                        records = n,
                        count = target.count,
                        idf = target.idf,
                        "Injection target"
                    );
                }

                terms.push(TermReport {
                    event: event.id().to_string(),
                    term: term.clone(),
                    target,
                });
            }
        }

        for (i, record) in records.iter_mut().enumerate() {
            for (term, period) in &active {
                if i as u64 % period == 0 {
                    record.terms.push(Arc::clone(term));
                }
            }
        }

        SubWindowReport {
            local_index,
            global_index: self.elapsed,
            records: range,
            terms,
        }
    }

    /// Series offset of an active event
    fn offset(&self, event: &Event) -> Option<usize> {
        let delay_windows = event.start_delay() / self.idf_window_secs;
        let elapsed = self.elapsed as i64;
        if delay_windows <= elapsed {
            usize::try_from(elapsed - delay_windows).ok()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::curve::EventInputEntry;
    use std::collections::BTreeMap;

    const START: i64 = 946_684_800_000;

    fn records(seconds: &[i64]) -> Vec<Record> {
        seconds
            .iter()
            .enumerate()
            .map(|(i, s)| Record::new(i as u64, START + s * 1000, vec![Arc::from("base")]))
            .collect()
    }

    fn event(id: &str, term: &str, idfs: &[Option<f64>], delay: i64) -> Event {
        let mut series = BTreeMap::new();
        series.insert(
            term.to_string(),
            idfs.iter().map(|&idf| EventInputEntry::new(0, idf)).collect::<Vec<_>>(),
        );
        let mut event = Event::from_series(id, series);
        event.set_start_delay(delay);
        event
    }

    #[test]
    fn test_target_count_minimizes_error() {
        for n in [1u64, 7, 10, 60, 100, 1000, 4321] {
            for idf in [0.0, 0.3, 1.0, 2.0, 2.7, 4.5, 6.0] {
                let c = target_count(n, idf);
                assert!(c >= 1);
                let exact = n as f64 / f64::exp(idf);
                let (floor, ceil) = (exact.floor(), exact.ceil());
                assert!(c as f64 == floor || c as f64 == ceil);
                if floor >= 1.0 {
                    let err = |x: f64| ((n as f64 / x).ln() - idf).abs();
                    assert!(err(c as f64) <= err(floor).min(err(ceil)) + 1e-12);
                }
            }
        }
        // 100 / e^2 = 13.53: ln(100/14) is closer to 2 than ln(100/13)
        assert_eq!(target_count(100, 2.0), 14);
        // Fewer records than e^idf still yields one
        assert_eq!(target_count(10, 6.0), 1);
    }

    #[test]
    fn test_partition_sub_windows() {
        let records = records(&[0, 0, 0, 1, 1, 3, 4, 5, 5]);
        assert_eq!(partition_sub_windows(&records, 1), vec![0..3, 3..5, 5..6, 6..7, 7..9]);
        assert_eq!(partition_sub_windows(&records, 2), vec![0..5, 5..7, 7..9]);
        assert!(partition_sub_windows(&[], 1).is_empty());
    }

    #[test]
    fn test_inject_every_period() {
        // 10 records in one second, idf ln(10/3) → 3 records, period 4
        let mut records = records(&[0; 10]);
        let idf = (10.0f64 / 3.0).ln();
        let events = vec![event("E", "boom", &[Some(idf)], 0)];

        let mut injector = EventInjector::new(&events, 1);
        let reports = injector.inject(&mut records);

        assert_eq!(reports.len(), 1);
        let target = reports[0].terms[0].target.unwrap();
        assert_eq!(target.count, 3);
        assert_eq!(target.period, 4);

        let hits: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.contains("boom"))
            .map(|(i, _)| i)
            .collect();
        assert_eq!(hits, vec![0, 4, 8]);
        assert_eq!(injector.elapsed(), 1);
    }

    #[test]
    fn test_delay_and_series_end() {
        // One record per second; event starts after 2 sub-windows, 2 samples long
        let mut records = records(&[0, 1, 2, 3, 4, 5]);
        let events = vec![event("E", "boom", &[Some(0.0), Some(0.0)], 2)];

        let mut injector = EventInjector::new(&events, 1);
        let reports = injector.inject(&mut records);

        let injected: Vec<bool> = records.iter().map(|r| r.contains("boom")).collect();
        assert_eq!(injected, vec![false, false, true, true, false, false]);
        assert!(reports[0].terms.is_empty());
        assert_eq!(reports[2].terms.len(), 1);
        assert_eq!(reports[5].global_index, 5);
    }

    #[test]
    fn test_missing_sample_removes_term() {
        let mut records = records(&[0, 0, 1, 1]);
        let events = vec![
            event("A", "boom", &[Some(0.0), Some(0.0)], 0),
            event("B", "boom", &[Some(0.0), None], 0),
        ];

        let mut injector = EventInjector::new(&events, 1);
        let reports = injector.inject(&mut records);

        assert!(records[0].contains("boom"));
        // B's missing sample drops the term set by A for that sub-window
        assert!(!records[2].contains("boom"));
        assert!(!records[3].contains("boom"));
        assert_eq!(reports[1].terms[1].target, None);
    }

    #[test]
    fn test_elapsed_carries_across_windows() {
        let events = vec![event("E", "boom", &[Some(0.0); 4], 3)];
        let mut injector = EventInjector::new(&events, 1);

        let mut first = records(&[0, 1]);
        injector.inject(&mut first);
        assert!(first.iter().all(|r| !r.contains("boom")));

        let mut second = records(&[60, 61]);
        injector.inject(&mut second);
        assert!(!second[0].contains("boom"));
        assert!(second[1].contains("boom"));
    }
}
