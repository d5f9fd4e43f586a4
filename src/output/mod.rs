//! Generator output
//!
//! - **writer**: the record stream, single file or split by hour
//! - **manifest**: the XML list of scheduled events
//! - **error**: error types

pub mod error;
pub mod manifest;
pub mod writer;

pub use error::{OutputError, OutputResult};
pub use manifest::EventManifest;
pub use writer::{
    format_record, hour_file_name, parse_record_line, read_records, stream_file_name, OutputLayout,
    RecordSink, STREAM_HEADER,
};
