//! Event trajectories
//!
//! An [`Event`] holds one IDF series per tracked term. Series are sampled once
//! per sub-window: the `n`-th entry is the target of the `n`-th sub-window
//! after the event became active.
//!
//! Historical events are read from tab-separated sample files with the
//! columns `timestamp_seconds`, `idf` and `term`.

use crate::events::error::{EventError, EventResult};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// One sample of a term trajectory
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EventInputEntry {
    /// Epoch seconds
    pub timestamp: i64,
    /// `None` marks a missing or unmeasured sample
    pub idf: Option<f64>,
}

impl EventInputEntry {
    pub fn new(timestamp: i64, idf: Option<f64>) -> Self {
        // Non-finite samples count as missing
        let idf = idf.filter(|v| v.is_finite());
        Self { timestamp, idf }
    }
}

/// Clip applied to historical trajectories around their real start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimWindow {
    /// Minutes kept before the real-world start
    pub lead_minutes: u32,
    /// Total minutes kept
    pub duration_minutes: u32,
}

/// An injectable event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    id: String,
    series: BTreeMap<String, Vec<EventInputEntry>>,
    /// Epoch second of the event start on the synthetic timeline
    event_start: i64,
    /// Seconds after stream start at which injection begins
    start_delay: i64,
    terms: Vec<String>,
    /// Delay used when events are placed by hand
    fixed_delay: Option<i64>,
}

impl Event {
    pub fn from_series(id: impl Into<String>, series: BTreeMap<String, Vec<EventInputEntry>>) -> Self {
        let terms = series.keys().cloned().collect();
        Self {
            id: id.into(),
            series,
            event_start: 0,
            start_delay: 0,
            terms,
            fixed_delay: None,
        }
    }

    /// Load a historical event from its sample file
    ///
    /// A missing file or malformed rows are logged; the event then simply
    /// has fewer (or no) samples.
    pub fn load(id: impl Into<String>, path: &Path) -> Self {
        let id = id.into();
        let series = match File::open(path)
            .map_err(EventError::from)
            .and_then(parse_samples)
        {
            Ok((series, skipped)) => {
                if skipped > 0 {
                    tracing::warn!(event = %id, path = ?path, rows = skipped, "Skipped malformed sample rows");
                }
                series
            }
            Err(e) => {
                tracing::warn!(event = %id, path = ?path, error = %e, "Failed to read event samples");
                BTreeMap::new()
            }
        };

        tracing::debug!(event = %id, terms = series.len(), "Loaded event samples");
        Self::from_series(id, series)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_start(&self) -> i64 {
        self.event_start
    }

    pub fn start_delay(&self) -> i64 {
        self.start_delay
    }

    /// Terms reported for this event, in selection order
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn series(&self) -> &BTreeMap<String, Vec<EventInputEntry>> {
        &self.series
    }

    pub fn fixed_delay(&self) -> Option<i64> {
        self.fixed_delay
    }

    pub fn set_fixed_delay(&mut self, seconds: Option<i64>) {
        self.fixed_delay = seconds;
    }

    pub fn set_event_start_raw(&mut self, seconds: i64) {
        self.event_start = seconds;
    }

    /// Sample of `term` at `offset` sub-windows after activation
    ///
    /// Returns `None` past the end of the series.
    pub fn sample(&self, term: &str, offset: usize) -> Option<Option<f64>> {
        self.series.get(term)?.get(offset).map(|entry| entry.idf)
    }

    /// Earliest first sample across all terms
    pub fn first_timestamp(&self) -> Option<i64> {
        self.series
            .values()
            .filter_map(|entries| entries.first())
            .map(|entry| entry.timestamp)
            .min()
    }

    /// Length of the longest series
    pub fn sample_count(&self) -> usize {
        self.series.values().map(Vec::len).max().unwrap_or(0)
    }

    pub fn has_samples(&self) -> bool {
        self.series.values().any(|entries| !entries.is_empty())
    }

    /// Place the event on the synthetic timeline
    ///
    /// Keeps the offset between the first observed sample and the real
    /// start. With `trim`, the series are clipped to the trim window and
    /// the start is anchored `lead_minutes` after the stream start.
    pub fn set_event_start(&mut self, real_start: i64, stream_start: i64, trim: Option<TrimWindow>) {
        self.event_start = match self.first_timestamp() {
            Some(first) => stream_start + (real_start - first),
            None => stream_start,
        };

        if let Some(trim) = trim {
            let from = real_start - i64::from(trim.lead_minutes) * 60;
            let to = from + i64::from(trim.duration_minutes) * 60;
            self.trim(from, to);
            self.event_start = stream_start + i64::from(trim.lead_minutes) * 60;
        }
    }

    /// Keep samples strictly between `from` and `to`
    pub fn trim(&mut self, from: i64, to: i64) {
        for entries in self.series.values_mut() {
            entries.retain(|entry| entry.timestamp > from && entry.timestamp < to);
        }
    }

    /// Delay the event by `seconds`
    pub fn set_start_delay(&mut self, seconds: i64) {
        self.start_delay = seconds;
        self.event_start += seconds;
    }

    /// Keep only the series of `terms`
    ///
    /// The selection is kept as the event's term list even for terms
    /// without samples.
    pub fn select_terms(&mut self, terms: &[String]) {
        self.series.retain(|term, _| terms.contains(term));
        self.terms = terms.to_vec();
    }
}

/// Parse a tab-separated sample file
///
/// Returns the per-term series (in file order) and the number of rows that
/// were skipped as malformed.
pub fn parse_samples<R: Read>(reader: R) -> EventResult<(BTreeMap<String, Vec<EventInputEntry>>, usize)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);

    let mut series: BTreeMap<String, Vec<EventInputEntry>> = BTreeMap::new();
    let mut skipped = 0;

    for result in reader.records() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                tracing::trace!(error = %e, "Unreadable sample row");
                skipped += 1;
                continue;
            }
        };

        // An unreadable IDF still occupies its slot in the series
        let parsed = match (record.get(0), record.get(1), record.get(2)) {
            (Some(ts), Some(idf), Some(term)) if !term.trim().is_empty() => ts
                .trim()
                .parse::<i64>()
                .ok()
                .map(|ts| (term.trim(), ts, idf.trim().parse::<f64>().ok())),
            _ => None,
        };

        match parsed {
            Some((term, timestamp, idf)) => series
                .entry(term.to_string())
                .or_default()
                .push(EventInputEntry::new(timestamp, idf)),
            None => skipped += 1,
        }
    }

    Ok((series, skipped))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLES: &str = "100\t3.5\tquake\n\
                           100\tNaN\tnepal\n\
                           101\t3.0\tquake\n\
                           101\tInfinity\tnepal\n\
                           102\t2.5\tquake\n\
                           102\t4.0\tnepal\n\
                           garbage line\n\
                           103\t2.0\tother\n";

    fn sample_event() -> Event {
        let (series, skipped) = parse_samples(SAMPLES.as_bytes()).unwrap();
        assert_eq!(skipped, 1);
        Event::from_series("NEPAL", series)
    }

    #[test]
    fn test_parse_samples() {
        let event = sample_event();
        assert_eq!(event.series().len(), 3);
        assert_eq!(event.sample("quake", 0), Some(Some(3.5)));
        assert_eq!(event.sample("quake", 2), Some(Some(2.5)));
        assert_eq!(event.sample("quake", 3), None);
        // Non-finite values are missing samples
        assert_eq!(event.sample("nepal", 0), Some(None));
        assert_eq!(event.sample("nepal", 1), Some(None));
        assert_eq!(event.sample("nepal", 2), Some(Some(4.0)));
    }

    #[test]
    fn test_unreadable_idf_keeps_position() {
        let samples = "100\t\tquake\n\
                       101\tInf\tquake\n\
                       102\t-\tquake\n\
                       103\t3.0\tquake\n\
                       x\t1.0\tquake\n";
        let (series, skipped) = parse_samples(samples.as_bytes()).unwrap();
        assert_eq!(skipped, 1);

        let entries = &series["quake"];
        assert_eq!(entries.len(), 4);
        assert_eq!(
            entries.iter().map(|e| e.timestamp).collect::<Vec<_>>(),
            vec![100, 101, 102, 103]
        );
        assert!(entries[..3].iter().all(|e| e.idf.is_none()));

        let event = Event::from_series("E", series);
        assert_eq!(event.sample("quake", 3), Some(Some(3.0)));
    }

    #[test]
    fn test_event_start_keeps_offset() {
        let mut event = sample_event();
        // Real start 30 seconds after the first sample
        event.set_event_start(130, 1_000, None);
        assert_eq!(event.event_start(), 1_030);

        event.set_start_delay(120);
        assert_eq!(event.start_delay(), 120);
        assert_eq!(event.event_start(), 1_150);
    }

    #[test]
    fn test_trim_anchors_start() {
        let mut series = BTreeMap::new();
        series.insert(
            "t".to_string(),
            (0..600).map(|s| EventInputEntry::new(s, Some(1.0))).collect::<Vec<_>>(),
        );
        let mut event = Event::from_series("E", series);

        let trim = TrimWindow {
            lead_minutes: 2,
            duration_minutes: 5,
        };
        event.set_event_start(300, 10_000, Some(trim));

        // Keeps (180, 480)
        let entries = &event.series()["t"];
        assert_eq!(entries.first().map(|e| e.timestamp), Some(181));
        assert_eq!(entries.last().map(|e| e.timestamp), Some(479));
        assert_eq!(event.event_start(), 10_120);
    }

    #[test]
    fn test_select_terms() {
        let mut event = sample_event();
        event.select_terms(&["quake".to_string(), "earthquake".to_string()]);

        assert_eq!(event.series().len(), 1);
        assert!(event.series().contains_key("quake"));
        assert_eq!(event.terms(), &["quake".to_string(), "earthquake".to_string()]);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let event = Event::load("BORIS", &dir.path().join("boris").join("data.txt"));
        assert!(!event.has_samples());
        assert_eq!(event.sample_count(), 0);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("data.txt");
        std::fs::write(&path, SAMPLES).unwrap();

        let event = Event::load("NEPAL", &path);
        assert_eq!(event.id(), "NEPAL");
        assert_eq!(event.first_timestamp(), Some(100));
        assert_eq!(event.sample_count(), 3);
    }
}
