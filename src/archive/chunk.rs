//! Chunk tables
//!
//! A chunk holds per-minute counts for a contiguous slice of the archived
//! timeline. Two tables are stored per chunk:
//!
//! ```text
//! term_counts_{start}-{end}.txt
//!   header
//!   one row per vocabulary term (row i = terms.txt line i):
//!     c0,c1,...,cN            comma-separated per-minute counts
//!
//! amount_terms_in_tweets_{start}-{end}.txt
//!   header
//!   one row per term-count bucket:
//!     bucket \t c0,c1,...,cN
//! ```
//!
//! Empty fields count as zero. A row that cannot be parsed is logged and
//! treated as all zeros; the rest of the table is still used.

use crate::archive::types::ChunkRange;
use std::collections::BTreeMap;

/// Per-minute counts of one chunk, indexed by minute offset within the chunk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkTables {
    /// Row `i` belongs to vocabulary term `i`
    pub term_counts: Vec<Vec<u32>>,
    /// Records containing `bucket` terms, per minute
    pub size_counts: BTreeMap<u32, Vec<u32>>,
}

impl ChunkTables {
    /// Parse both tables from their entry contents
    pub fn parse(range: &ChunkRange, term_counts: &str, size_counts: &str) -> Self {
        Self {
            term_counts: parse_term_counts(&range.term_counts_entry(), term_counts),
            size_counts: parse_size_counts(&range.size_counts_entry(), size_counts),
        }
    }

    /// Sum each term row over the closed offset range `[first, last]`
    ///
    /// Yields `(term index, sum)` for every term with a non-zero sum.
    pub fn term_sums(&self, first: usize, last: usize) -> impl Iterator<Item = (usize, u64)> + '_ {
        self.term_counts
            .iter()
            .enumerate()
            .filter_map(move |(idx, row)| {
                let sum = range_sum(row, first, last);
                (sum > 0).then_some((idx, sum))
            })
    }

    /// Sum each bucket row over the closed offset range `[first, last]`
    pub fn size_sums(&self, first: usize, last: usize) -> impl Iterator<Item = (u32, u64)> + '_ {
        self.size_counts.iter().filter_map(move |(&bucket, row)| {
            let sum = range_sum(row, first, last);
            (sum > 0).then_some((bucket, sum))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.term_counts.is_empty() && self.size_counts.is_empty()
    }
}

/// A chunk of the archive and, while paged in, its tables
#[derive(Debug)]
pub struct Chunk {
    pub range: ChunkRange,
    tables: Option<ChunkTables>,
}

impl Chunk {
    pub fn new(range: ChunkRange) -> Self {
        Self {
            range,
            tables: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.tables.is_some()
    }

    pub fn tables(&self) -> Option<&ChunkTables> {
        self.tables.as_ref()
    }

    pub(crate) fn set_tables(&mut self, tables: ChunkTables) {
        self.tables = Some(tables);
    }

    /// Drop the tables; returns whether anything was loaded
    pub(crate) fn unload(&mut self) -> bool {
        self.tables.take().is_some()
    }
}

fn range_sum(row: &[u32], first: usize, last: usize) -> u64 {
    row.iter()
        .skip(first)
        .take(last.saturating_sub(first) + 1)
        .map(|&c| c as u64)
        .sum()
}

/// Parse a comma-separated list of counts; empty fields are zero
pub fn parse_counts(field: &str) -> Result<Vec<u32>, std::num::ParseIntError> {
    field
        .trim_end_matches(['\r', '\n'])
        .split(',')
        .map(|v| {
            let v = v.trim();
            if v.is_empty() {
                Ok(0)
            } else {
                v.parse::<u32>()
            }
        })
        .collect()
}

fn parse_term_counts(entry: &str, content: &str) -> Vec<Vec<u32>> {
    let mut rows = Vec::new();
    for (line_num, line) in content.lines().enumerate().skip(1) {
        match parse_counts(line) {
            Ok(counts) => rows.push(counts),
            Err(e) => {
                tracing::warn!(entry, line = line_num + 1, error = %e, "Malformed term count row");
                rows.push(Vec::new());
            }
        }
    }
    rows
}

fn parse_size_counts(entry: &str, content: &str) -> BTreeMap<u32, Vec<u32>> {
    let mut buckets = BTreeMap::new();
    for (line_num, line) in content.lines().enumerate().skip(1) {
        if line.trim().is_empty() {
            continue;
        }
        let parsed = parse_bucket_row(line);

        match parsed {
            Ok((bucket, counts)) => {
                buckets.insert(bucket, counts);
            }
            Err(e) => {
                tracing::warn!(entry, line = line_num + 1, error = %e, "Malformed bucket row");
            }
        }
    }
    buckets
}

fn parse_bucket_row(line: &str) -> Result<(u32, Vec<u32>), String> {
    let (bucket, counts) = line
        .split_once('\t')
        .ok_or_else(|| "missing tab separator".to_string())?;
    let bucket = bucket.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let counts = parse_counts(counts).map_err(|e| e.to_string())?;
    Ok((bucket, counts))
}
