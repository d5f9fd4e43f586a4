//! Candidate events
//!
//! The benchmark ships with ten historical events. Each has a real-world
//! start time and three selected terms; its samples are read from
//! `<data_dir>/<id in lowercase>/data.txt`. Simulated events configured by
//! the user join the same candidate pool.

use crate::events::curve::{Event, TrimWindow};
use crate::events::error::{EventError, EventResult};
use crate::events::simulated::{simulated_event, CurveShape, SimulatedTerm};
use crate::util::parse_stream_time;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A historical event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    /// Real-world start, `MM/dd/yyyy HH:mm:ss` UTC
    pub start: String,
    pub terms: Vec<String>,
}

impl CatalogEntry {
    pub fn new(id: &str, start: &str, terms: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            start: start.to_string(),
            terms: terms.iter().map(|t| t.to_string()).collect(),
        }
    }

    /// Location of the sample file below `data_dir`
    pub fn sample_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(self.id.to_lowercase()).join("data.txt")
    }
}

/// A fabricated event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulatedEventSpec {
    pub id: String,
    /// Delay used when events are placed by hand
    #[serde(default)]
    pub delay_seconds: Option<i64>,
    pub terms: Vec<SimulatedTerm>,
}

/// The ten benchmark events
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("BOSTON_BOMBING", "04/15/2013 18:50:00", &["boston", "marathon", "explosion"]),
        CatalogEntry::new("CHARLOTTE", "05/02/2015 10:09:00", &["royal", "princess", "cambridge"]),
        CatalogEntry::new("BORIS", "02/27/2015 21:24:00", &["boris", "nemtsov", "nemzow"]),
        CatalogEntry::new("GERMANWINGS", "03/24/2015 10:29:00", &["airbus", "plane", "crash"]),
        CatalogEntry::new("MH17", "07/17/2014 15:08:00", &["malaysian", "airlines", "crashed"]),
        CatalogEntry::new("NEPAL", "04/25/2015 06:11:00", &["nepal", "earthquake", "quake"]),
        CatalogEntry::new("PHILIP", "02/02/2014 18:22:00", &["philip", "hoffman", "deadphilip"]),
        CatalogEntry::new("POPE_ELECTION", "03/13/2013 18:06:00", &["habemus", "papam", "fumata"]),
        CatalogEntry::new("ROBIN", "08/11/2014 22:51:00", &["robin", "williams", "deadrobin"]),
        CatalogEntry::new("WORLDCUP", "07/13/2014 21:24:00", &["mario", "goetze", "scored"]),
    ]
}

/// Inputs needed to turn catalog entries into events
#[derive(Debug, Clone)]
pub struct CandidateOptions {
    pub data_dir: PathBuf,
    /// Epoch second of the first stream record
    pub stream_start: i64,
    /// Clip for historical events, `None` keeps whole trajectories
    pub trim: Option<TrimWindow>,
    pub shape: CurveShape,
}

/// Build the candidate pool: historical events first, then simulated ones
///
/// Fails on an unparsable start time or invalid simulated shape; a missing
/// sample file only leaves the event without samples.
pub fn load_candidates(
    catalog: &[CatalogEntry],
    simulated: &[SimulatedEventSpec],
    options: &CandidateOptions,
) -> EventResult<Vec<Event>> {
    let mut candidates = Vec::with_capacity(catalog.len() + simulated.len());

    for entry in catalog {
        let real_start = parse_stream_time(&entry.start).ok_or_else(|| EventError::InvalidStart {
            event: entry.id.clone(),
            value: entry.start.clone(),
        })?;

        let mut event = Event::load(entry.id.clone(), &entry.sample_path(&options.data_dir));
        if !event.has_samples() {
            tracing::warn!(event = %entry.id, "Event has no samples and will not inject terms");
        }
        event.set_event_start(real_start, options.stream_start, options.trim);
        event.select_terms(&entry.terms);
        candidates.push(event);
    }

    for spec in simulated {
        let mut event = simulated_event(&spec.id, &spec.terms, &options.shape, options.stream_start)?;
        event.set_fixed_delay(spec.delay_seconds);
        candidates.push(event);
    }

    tracing::info!(candidates = candidates.len(), "Loaded candidate events");
    Ok(candidates)
}
