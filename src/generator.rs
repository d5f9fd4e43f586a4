//! Stream generation
//!
//! Drives one run end to end:
//!
//! 1. validate the configuration and open the archive
//! 2. build the candidate events and schedule them (fatal errors stop the
//!    run here, before any file is created)
//! 3. write the event manifest
//! 4. for every window: page chunks, aggregate, synthesize, inject, write

use crate::archive::{ArchiveError, ChunkCache, DistributionArchive, Window};
use crate::config::{Config, ConfigError};
use crate::events::{load_candidates, EventError, EventInjector, EventScheduler, ManifestEntry, TermReport};
use crate::output::{EventManifest, OutputError, RecordSink};
use crate::synth::{RecordSynthesizer, WindowAggregator};
use crate::util::seeded_rng;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a run
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Event error: {0}")]
    Event(#[from] EventError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),
}

/// What a run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub windows: usize,
    pub records: u64,
    pub sub_windows: u64,
    pub chunk_loads: usize,
    pub chunk_unloads: usize,
    pub events: Vec<ManifestEntry>,
    pub output_files: Vec<PathBuf>,
    pub manifest: PathBuf,
    pub seed: Option<u64>,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Windows:      {}", self.windows)?;
        writeln!(f, "Records:      {}", self.records)?;
        writeln!(f, "Sub-windows:  {}", self.sub_windows)?;
        writeln!(f, "Chunk loads:  {} ({} unloads)", self.chunk_loads, self.chunk_unloads)?;
        writeln!(f, "Seed:         {}", self.seed.map_or("random".to_string(), |s| s.to_string()))?;
        writeln!(f, "Manifest:     {}", self.manifest.display())?;
        for file in &self.output_files {
            writeln!(f, "Output:       {}", file.display())?;
        }
        writeln!(f, "Events:       {}", self.events.len())?;
        for event in &self.events {
            writeln!(
                f,
                "  {:<16} +{:>3} min  {}  [{}]",
                event.id, event.delay_to_pre_event, event.start_string, event.terms
            )?;
        }
        Ok(())
    }
}

/// Comment line describing one event term of a sub-window
fn term_comment(report: &TermReport) -> String {
    match &report.target {
        Some(target) => format!(
            "{}: {} -> {} -> idf to reach: {}, idf reached: {}",
            report.event, report.term, target.count, target.idf, target.reached
        ),
        None => format!("{}: {} -> 0", report.event, report.term),
    }
}

/// Runs the generator for one configuration
#[derive(Debug)]
pub struct StreamGenerator {
    config: Config,
}

impl StreamGenerator {
    pub fn new(config: Config) -> Result<Self, GenerateError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn run(&self) -> Result<RunSummary, GenerateError> {
        let config = &self.config;
        let stream_start = config.stream_start()?;
        let mut rng = seeded_rng(config.stream.seed);

        let mut archive = DistributionArchive::open(&config.stream.archive)?;
        let windows = Window::plan(
            archive.info().total_minutes,
            config.stream.window_minutes,
            config.stream.limit_minutes,
        );
        let length = windows.last().map_or(0, |w| w.end);

        tracing::info!(
            archive = %config.stream.archive,
            windows = windows.len(),
            minutes = length,
            scale = config.stream.scale_percent,
            "Starting generation"
        );

        let candidates = load_candidates(
            &config.events.catalog,
            &config.events.simulated,
            &config.candidate_options(stream_start),
        )?;
        let schedule = EventScheduler::new(config.schedule_options(length)).schedule(candidates, &mut rng)?;

        let mut sink = RecordSink::create(
            config.output_layout(stream_start),
            config.output.header,
            config.output.comments,
        )?;

        let manifest_path = EventManifest::path_in(&PathBuf::from(&config.output.dir), config.stream.scale_percent);
        EventManifest::new(
            config.events.minutes_before_start,
            config.events.duration_minutes,
            schedule.entries.clone(),
        )
        .write(&manifest_path)?;

        let mut cache = ChunkCache::new(archive.chunk_ranges());
        let aggregator = WindowAggregator::new(config.stream.scale_percent);
        let mut synthesizer = RecordSynthesizer::new();
        let mut injector = EventInjector::new(&schedule.events, config.events.idf_window_seconds);

        for window in &windows {
            cache.activate(&mut archive, window);
            let state = aggregator.aggregate(&cache, window, archive.vocabulary());
            let count = state.record_count();

            sink.begin_window(window)?;
            sink.comment(format_args!("window {}, tweet count: {}", window.index, count))?;
            if count == 0 {
                continue;
            }

            let mut records = synthesizer.synthesize(
                state,
                window.start_millis(stream_start),
                window.end_millis(stream_start),
                &mut rng,
            );
            let reports = injector.inject(&mut records);

            for report in &reports {
                if sink.comments_enabled() {
                    sink.comment(format_args!(
                        "start {} seconds idf window {} ({}), amount tweets: {}",
                        injector.idf_window_secs(),
                        report.local_index,
                        report.global_index,
                        report.record_count()
                    ))?;
                    for term in &report.terms {
                        sink.comment(term_comment(term))?;
                    }
                }
                sink.write_records(&records[report.records.clone()])?;
            }

            tracing::debug!(
                window = %window,
                records = records.len(),
                sub_windows = reports.len(),
                "Wrote window"
            );
        }

        let stats = cache.stats();
        let summary = RunSummary {
            windows: windows.len(),
            records: synthesizer.records_emitted(),
            sub_windows: injector.elapsed(),
            chunk_loads: stats.loads,
            chunk_unloads: stats.unloads,
            events: schedule.entries.clone(),
            output_files: sink.finish()?,
            manifest: manifest_path,
            seed: config.stream.seed,
        };

        tracing::info!(
            records = summary.records,
            sub_windows = summary.sub_windows,
            events = summary.events.len(),
            "Generation complete"
        );

        Ok(summary)
    }
}
