//! Stream synthesis
//!
//! - **aggregate**: window-scoped term supply and record census
//! - **records**: term sets, shuffling, timestamps and record ids

pub mod aggregate;
pub mod records;

pub use aggregate::{scale_count, AggregateState, TermSupply, WindowAggregator, ARCHIVE_BASELINE_PERCENT};
pub use records::{Record, RecordSynthesizer, StreamClock};
