//! Event error types
//!
//! Every variant except `Io`/`Csv` is fatal for a run: it is raised while the
//! candidate set is built or scheduled, before any output exists.

use thiserror::Error;

/// Errors raised while building or scheduling events
#[derive(Error, Debug)]
pub enum EventError {
    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Sample file could not be parsed
    #[error("Sample file error: {0}")]
    Csv(#[from] csv::Error),

    /// Simulated event parameters out of range
    #[error("Invalid shape for simulated event {event}, term {term}: {reason}")]
    InvalidShape {
        event: String,
        term: String,
        reason: String,
    },

    /// The events cannot be placed within the stream length
    #[error(
        "{amount} events at {min_distance} minutes apart plus an event duration of {duration} \
         minutes need {required} minutes, but the stream is only {limit} minutes long"
    )]
    InfeasibleSchedule {
        amount: usize,
        min_distance: u32,
        duration: u32,
        required: i64,
        limit: u32,
    },

    /// More events requested than candidates available
    #[error("Requested {requested} events but only {available} candidates are available")]
    NotEnoughCandidates { requested: usize, available: usize },

    /// A hand-picked event id matches no candidate
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// A catalog start time does not follow `MM/dd/yyyy HH:mm:ss`
    #[error("Invalid start time for event {event}: {value:?}")]
    InvalidStart { event: String, value: String },
}

/// Result type alias for event operations
pub type EventResult<T> = Result<T, EventError>;
