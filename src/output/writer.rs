//! Record stream files
//!
//! Line format (tab-separated):
//!
//! ```text
//! TWEET_ID            TWEET_CREATIONDATE             TWEET_CONTENT
//! 000000000000000042  Sat Jan 01 00:00:42 GMT 2000   term term term
//! ```
//!
//! Lines starting with `#` are comments. The stream goes either into one
//! file or into one file per hour of stream time.

use crate::archive::Window;
use crate::output::error::{OutputError, OutputResult};
use crate::synth::Record;
use crate::util::{format_record_date, hour_stamp, parse_record_date};
use std::fmt::Display;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// First line of every stream file when headers are enabled
pub const STREAM_HEADER: &str = "TWEET_ID\tTWEET_CREATIONDATE\tTWEET_CONTENT";

/// Default single-stream file name
pub fn stream_file_name(stream_start: i64, window_minutes: u32, limit_minutes: Option<u32>, scale_percent: u32) -> String {
    let length = match limit_minutes {
        Some(limit) => format!("{}min", limit),
        None => "24h".to_string(),
    };
    format!(
        "{}_{}min_{}_{}s.txt",
        hour_stamp(stream_start),
        window_minutes,
        length,
        scale_percent
    )
}

/// Name of the file holding the hour starting at `hour_start`
pub fn hour_file_name(hour_start: i64, window_minutes: u32, scale_percent: u32) -> String {
    format!("{}_{}min_{}s.txt", hour_stamp(hour_start), window_minutes, scale_percent)
}

/// One stream line
pub fn format_record(record: &Record) -> String {
    format!(
        "{:018}\t{}\t{}",
        record.id,
        format_record_date(record.timestamp),
        record.text()
    )
}

/// Parse one stream line; `None` for anything that is not a record
pub fn parse_record_line(line: &str) -> Option<Record> {
    let mut fields = line.splitn(3, '\t');
    let id = fields.next()?.trim().parse::<u64>().ok()?;
    let timestamp = parse_record_date(fields.next()?)?;
    let terms = fields
        .next()
        .unwrap_or("")
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(Arc::from)
        .collect();
    Some(Record::new(id, timestamp, terms))
}

/// Read a stream file back, skipping the header and comments
pub fn read_records(path: &Path) -> OutputResult<Vec<Record>> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.is_empty() || line.starts_with('#') || line == STREAM_HEADER {
            continue;
        }
        let record = parse_record_line(&line).ok_or_else(|| OutputError::Malformed {
            path: path.to_path_buf(),
            line: idx + 1,
            reason: "expected id, creation date and terms".to_string(),
        })?;
        records.push(record);
    }

    Ok(records)
}

/// Where records go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputLayout {
    /// Everything in one file
    Single(PathBuf),
    /// One file per hour of stream time
    Hourly {
        dir: PathBuf,
        stream_start: i64,
        window_minutes: u32,
        scale_percent: u32,
    },
}

/// Writes the record stream
///
/// Files are truncated when opened.
#[derive(Debug)]
pub struct RecordSink {
    layout: OutputLayout,
    header: bool,
    comments: bool,
    writer: Option<BufWriter<File>>,
    current_hour: Option<u32>,
    files: Vec<PathBuf>,
    records: u64,
}

impl RecordSink {
    pub fn create(layout: OutputLayout, header: bool, comments: bool) -> OutputResult<Self> {
        let mut sink = Self {
            layout,
            header,
            comments,
            writer: None,
            current_hour: None,
            files: Vec::new(),
            records: 0,
        };

        if let OutputLayout::Single(path) = &sink.layout {
            let path = path.clone();
            sink.open(path)?;
        }

        Ok(sink)
    }

    pub fn comments_enabled(&self) -> bool {
        self.comments
    }

    /// Route the following lines to the file of `window`
    pub fn begin_window(&mut self, window: &Window) -> OutputResult<()> {
        let OutputLayout::Hourly {
            dir,
            stream_start,
            window_minutes,
            scale_percent,
        } = &self.layout
        else {
            return Ok(());
        };

        let hour = window.start / 60;
        if self.current_hour == Some(hour) {
            return Ok(());
        }

        let path = dir.join(hour_file_name(
            stream_start + i64::from(hour) * 3600,
            *window_minutes,
            *scale_percent,
        ));
        self.open(path)?;
        self.current_hour = Some(hour);
        Ok(())
    }

    /// Write a `#` comment line when comments are enabled
    pub fn comment(&mut self, text: impl Display) -> OutputResult<()> {
        if !self.comments {
            return Ok(());
        }
        let writer = self.writer.as_mut().ok_or(OutputError::NotOpen)?;
        writeln!(writer, "# {}", text)?;
        Ok(())
    }

    pub fn write_record(&mut self, record: &Record) -> OutputResult<()> {
        let writer = self.writer.as_mut().ok_or(OutputError::NotOpen)?;
        writeln!(writer, "{}", format_record(record))?;
        self.records += 1;
        Ok(())
    }

    pub fn write_records(&mut self, records: &[Record]) -> OutputResult<()> {
        records.iter().try_for_each(|record| self.write_record(record))
    }

    /// Records written so far
    pub fn records_written(&self) -> u64 {
        self.records
    }

    /// Files opened so far
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Flush and close, returning the written files
    pub fn finish(mut self) -> OutputResult<Vec<PathBuf>> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }
        Ok(self.files)
    }

    fn open(&mut self, path: PathBuf) -> OutputResult<()> {
        if let Some(mut previous) = self.writer.take() {
            previous.flush()?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&path)?);
        if self.header {
            writeln!(writer, "{}", STREAM_HEADER)?;
        }

        tracing::debug!(path = ?path, "Opened output file");
        self.writer = Some(writer);
        self.files.push(path);
        Ok(())
    }
}
