//! # Twistor
//!
//! Synthetic tweet-stream generator with ground-truth event injection, for
//! benchmarking event detection.
//!
//! ## Features
//!
//! - **Archive-driven synthesis**: per-minute term and record-size statistics
//!   are paged in from a chunked zip archive and turned into records
//! - **Scalable volume**: the archive's 10% sample is rescaled to any
//!   sampling percentage
//! - **Event injection**: historical or simulated IDF trajectories are
//!   realized term by term, sub-window by sub-window
//! - **Reproducible runs**: one seedable random source per run
//!
//! ## Modules
//!
//! - [`archive`]: distribution archive, chunk tables and chunk cache
//! - [`synth`]: window aggregation and record synthesis
//! - [`events`]: trajectories, scheduling and injection
//! - [`output`]: record stream files and the event manifest
//! - [`generator`]: the window loop tying everything together
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use twistor::{Config, StreamGenerator};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.stream.archive = "./data/stream.zip".to_string();
//!     config.stream.limit_minutes = Some(60);
//!     config.stream.seed = Some(42);
//!
//!     let summary = StreamGenerator::new(config)?.run()?;
//!     println!("{}", summary);
//!
//!     Ok(())
//! }
//! ```

pub mod archive;
pub mod config;
pub mod events;
pub mod generator;
pub mod output;
pub mod synth;
pub mod util;

// Re-export top-level types for convenience
pub use archive::{
    ArchiveError, ArchiveInfo, ArchiveResult, ChunkCache, ChunkRange, DistributionArchive, Window,
};

pub use synth::{AggregateState, Record, RecordSynthesizer, StreamClock, TermSupply, WindowAggregator};

pub use events::{
    Event, EventError, EventInjector, EventInputEntry, EventResult, EventScheduler, ManifestEntry,
    SimulatedTerm,
};

pub use output::{read_records, EventManifest, OutputError, OutputResult, RecordSink};

pub use generator::{GenerateError, RunSummary, StreamGenerator};

pub use config::{Config, ConfigError, EventsConfig, LoggingConfig, OutputConfig, StreamConfig};
