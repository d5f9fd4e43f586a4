//! Distribution archive reader
//!
//! The archive is a zip container:
//!
//! ```text
//! info.txt                              header + "chunkWindow \t totalMinutes \t vocabularySize"
//! terms.txt                             header + one vocabulary term per line
//! term_counts_{start}-{end}.txt         per-term per-minute counts
//! amount_terms_in_tweets_{start}-{end}.txt
//!                                       per-bucket per-minute record counts
//! ```
//!
//! The zip handle stays open for the lifetime of the reader and is released
//! when it is dropped.

use crate::archive::chunk::ChunkTables;
use crate::archive::error::{ArchiveError, ArchiveResult};
use crate::archive::types::{ArchiveInfo, ChunkRange};
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::ZipArchive;

const INFO_ENTRY: &str = "info.txt";
const TERMS_ENTRY: &str = "terms.txt";
const TERM_COUNTS_PREFIX: &str = "term_counts_";

/// Open distribution archive with its metadata
pub struct DistributionArchive<R: Read + Seek = BufReader<File>> {
    path: PathBuf,
    zip: ZipArchive<R>,
    info: ArchiveInfo,
    vocabulary: Vec<Arc<str>>,
    chunks: Vec<ChunkRange>,
}

impl DistributionArchive<BufReader<File>> {
    /// Open an archive file and read its metadata
    pub fn open(path: impl AsRef<Path>) -> ArchiveResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = BufReader::new(File::open(&path)?);
        Self::from_reader(path, file)
    }
}

impl<R: Read + Seek> DistributionArchive<R> {
    /// Read the metadata of an archive from any seekable reader
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> ArchiveResult<Self> {
        let path = path.into();
        let mut zip = ZipArchive::new(reader)?;

        let info = parse_info(&read_entry(&mut zip, INFO_ENTRY)?)?;
        let vocabulary = parse_vocabulary(&read_entry(&mut zip, TERMS_ENTRY)?);

        if vocabulary.len() != info.vocabulary_size {
            tracing::warn!(
                declared = info.vocabulary_size,
                found = vocabulary.len(),
                "Vocabulary size differs from info.txt"
            );
        }

        let chunk_count = zip
            .file_names()
            .filter(|name| name.starts_with(TERM_COUNTS_PREFIX))
            .count();
        let chunks = ChunkRange::layout(info.chunk_window_minutes, info.total_minutes, chunk_count);

        tracing::info!(
            path = %path.display(),
            chunks = chunks.len(),
            total_minutes = info.total_minutes,
            vocabulary = vocabulary.len(),
            "Opened distribution archive"
        );

        Ok(Self {
            path,
            zip,
            info,
            vocabulary,
            chunks,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn info(&self) -> &ArchiveInfo {
        &self.info
    }

    /// Vocabulary in chunk-table row order
    pub fn vocabulary(&self) -> &[Arc<str>] {
        &self.vocabulary
    }

    /// Chunk layout, ordered and contiguous
    pub fn chunk_ranges(&self) -> &[ChunkRange] {
        &self.chunks
    }

    /// Read the tables of one chunk
    ///
    /// A missing or unreadable entry is logged and yields an empty table.
    pub fn load_tables(&mut self, range: &ChunkRange) -> ChunkTables {
        let terms = self.read_or_empty(&range.term_counts_entry());
        let sizes = self.read_or_empty(&range.size_counts_entry());
        ChunkTables::parse(range, &terms, &sizes)
    }

    fn read_or_empty(&mut self, name: &str) -> String {
        match read_entry(&mut self.zip, name) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(entry = name, error = %e, "Failed to read chunk entry, using empty data");
                String::new()
            }
        }
    }
}

fn read_entry<R: Read + Seek>(zip: &mut ZipArchive<R>, name: &str) -> ArchiveResult<String> {
    let mut entry = zip.by_name(name).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ArchiveError::MissingEntry(name.to_string()),
        other => ArchiveError::Zip(other),
    })?;
    let mut content = String::with_capacity(entry.size() as usize);
    entry.read_to_string(&mut content)?;
    Ok(content)
}

fn parse_info(content: &str) -> ArchiveResult<ArchiveInfo> {
    let malformed = |reason: &str| ArchiveError::Malformed {
        entry: INFO_ENTRY.to_string(),
        reason: reason.to_string(),
    };

    let row = content
        .lines()
        .nth(1)
        .ok_or_else(|| malformed("missing data row"))?;
    let fields: Vec<&str> = row
        .split(|c| c == '\t' || c == ',')
        .map(str::trim)
        .collect();
    if fields.len() < 3 {
        return Err(malformed("expected 3 columns"));
    }

    let number = |field: &str| {
        field
            .parse::<u32>()
            .map_err(|e| malformed(&format!("invalid number {:?}: {}", field, e)))
    };

    let info = ArchiveInfo {
        chunk_window_minutes: number(fields[0])?,
        total_minutes: number(fields[1])?,
        vocabulary_size: number(fields[2])? as usize,
    };

    if info.chunk_window_minutes == 0 {
        return Err(malformed("chunk window must be positive"));
    }

    Ok(info)
}

fn parse_vocabulary(content: &str) -> Vec<Arc<str>> {
    content
        .lines()
        .skip(1)
        .map(|line| Arc::from(line.trim_end_matches('\r')))
        .collect()
}
