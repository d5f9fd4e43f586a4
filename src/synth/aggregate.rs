//! Window aggregation
//!
//! Merges the per-minute counts of every chunk overlapping a window into two
//! window-scoped maps:
//!
//! - term → occurrences (the term supply records draw from)
//! - terms-per-record → record count (the record census)
//!
//! The archive is stored at a 10% sample; each per-chunk sum is rescaled to
//! the configured percentage and rounded half-up before merging.

use crate::archive::{ChunkCache, Window};
use crate::util::round_half_up;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

/// Sampling percentage the archive counts were recorded at
pub const ARCHIVE_BASELINE_PERCENT: u32 = 10;

/// Rescale an archive count to `scale_percent`
pub fn scale_count(sum: u64, scale_percent: u32) -> u64 {
    if scale_percent == ARCHIVE_BASELINE_PERCENT {
        return sum;
    }
    let scaled = sum as f64 * scale_percent as f64 / ARCHIVE_BASELINE_PERCENT as f64;
    round_half_up(scaled).max(0) as u64
}

/// Ordered multiset of terms with their remaining supply
///
/// Entries are ordered by descending initial count (ties by term) and keep
/// that order while being consumed; an entry disappears when its supply
/// reaches zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TermSupply {
    entries: VecDeque<(Arc<str>, u64)>,
}

impl TermSupply {
    pub fn from_counts(counts: impl IntoIterator<Item = (Arc<str>, u64)>) -> Self {
        let mut entries: Vec<(Arc<str>, u64)> = counts.into_iter().filter(|(_, c)| *c > 0).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        Self {
            entries: entries.into(),
        }
    }

    /// Take one unit of each of the first `k` terms
    ///
    /// Returns fewer than `k` terms once the supply runs out.
    pub fn take_front(&mut self, k: usize) -> Vec<Arc<str>> {
        let n = k.min(self.entries.len());
        let taken: Vec<(Arc<str>, u64)> = self.entries.drain(..n).collect();
        let terms = taken.iter().map(|(term, _)| Arc::clone(term)).collect();

        for (term, count) in taken.into_iter().rev() {
            if count > 1 {
                self.entries.push_front((term, count - 1));
            }
        }
        terms
    }

    /// Remaining supply of a term
    pub fn remaining(&self, term: &str) -> u64 {
        self.entries
            .iter()
            .find(|(t, _)| &**t == term)
            .map_or(0, |(_, c)| *c)
    }

    /// Total remaining units across all terms
    pub fn total(&self) -> u64 {
        self.entries.iter().map(|(_, c)| c).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries.iter().map(|(t, c)| (&**t, *c))
    }
}

/// Aggregate statistics of one window
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregateState {
    /// Term supply, most frequent first
    pub term_frequency: TermSupply,
    /// Terms per record → number of records
    pub size_frequency: BTreeMap<u32, u64>,
}

impl AggregateState {
    /// Number of records the window must produce
    pub fn record_count(&self) -> u64 {
        self.size_frequency.values().sum()
    }

    /// Term occurrences the census asks for
    pub fn term_demand(&self) -> u64 {
        self.size_frequency
            .iter()
            .map(|(&k, &records)| k as u64 * records)
            .sum()
    }
}

/// Builds the aggregate of a window from the chunk cache
#[derive(Debug, Clone, Copy)]
pub struct WindowAggregator {
    scale_percent: u32,
}

impl WindowAggregator {
    pub fn new(scale_percent: u32) -> Self {
        Self { scale_percent }
    }

    /// Merge the chunks overlapping `window`
    ///
    /// The cache must already have `window` activated.
    pub fn aggregate(&self, cache: &ChunkCache, window: &Window, vocabulary: &[Arc<str>]) -> AggregateState {
        let mut terms: HashMap<usize, u64> = HashMap::new();
        let mut sizes: BTreeMap<u32, u64> = BTreeMap::new();

        for (tables, (first, last)) in cache.overlapping(window) {
            for (idx, sum) in tables.term_sums(first, last) {
                *terms.entry(idx).or_insert(0) += scale_count(sum, self.scale_percent);
            }
            for (bucket, sum) in tables.size_sums(first, last) {
                *sizes.entry(bucket).or_insert(0) += scale_count(sum, self.scale_percent);
            }
        }

        let unknown = terms.keys().filter(|&&idx| idx >= vocabulary.len()).count();
        if unknown > 0 {
            tracing::warn!(window = %window, rows = unknown, "Term rows beyond the vocabulary ignored");
        }

        sizes.retain(|_, records| *records > 0);

        let state = AggregateState {
            term_frequency: TermSupply::from_counts(
                terms
                    .into_iter()
                    .filter_map(|(idx, count)| vocabulary.get(idx).map(|t| (Arc::clone(t), count))),
            ),
            size_frequency: sizes,
        };

        tracing::debug!(
            window = %window,
            records = state.record_count(),
            terms = state.term_frequency.len(),
            "Aggregated window"
        );

        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::fixtures::ArchiveFixture;
    use crate::archive::DistributionArchive;
    use tempfile::tempdir;

    fn supply(pairs: &[(&str, u64)]) -> TermSupply {
        TermSupply::from_counts(pairs.iter().map(|(t, c)| (Arc::from(*t), *c)))
    }

    #[test]
    fn test_scale_count() {
        assert_eq!(scale_count(7, 10), 7);
        assert_eq!(scale_count(7, 100), 70);
        assert_eq!(scale_count(5, 1), 1); // 0.5 rounds up
        assert_eq!(scale_count(4, 1), 0);
    }

    #[test]
    fn test_supply_order_and_consumption() {
        let mut supply = supply(&[("low", 1), ("high", 3), ("mid", 2), ("zero", 0)]);
        assert_eq!(supply.len(), 3);
        assert_eq!(supply.iter().next(), Some(("high", 3)));

        let terms = supply.take_front(2);
        assert_eq!(terms.iter().map(|t| &**t).collect::<Vec<_>>(), vec!["high", "mid"]);
        assert_eq!(supply.remaining("high"), 2);
        assert_eq!(supply.remaining("mid"), 1);

        // Order is kept while consuming
        let terms = supply.take_front(3);
        assert_eq!(terms.len(), 3);
        assert_eq!(supply.remaining("low"), 0);
        assert_eq!(supply.remaining("mid"), 0);
        assert_eq!(supply.total(), 1);

        let terms = supply.take_front(4);
        assert_eq!(terms.len(), 1);
        assert!(supply.is_empty());
        assert!(supply.take_front(1).is_empty());
    }

    #[test]
    fn test_aggregate_two_chunk_window() {
        let dir = tempdir().unwrap();
        let path = ArchiveFixture::two_chunks().write(dir.path());
        let mut archive = DistributionArchive::open(&path).unwrap();
        let mut cache = ChunkCache::new(archive.chunk_ranges());

        let window = Window::new(0, 0, 60);
        cache.activate(&mut archive, &window);
        let state = WindowAggregator::new(10).aggregate(&cache, &window, archive.vocabulary());

        assert_eq!(state.record_count(), 60);
        assert_eq!(state.size_frequency.get(&1), Some(&60));
        assert_eq!(state.term_frequency.remaining("a"), 30);
        assert_eq!(state.term_frequency.remaining("b"), 30);
        assert_eq!(state.term_demand(), state.term_frequency.total());
    }

    #[test]
    fn test_aggregate_scales_each_chunk() {
        let dir = tempdir().unwrap();
        let path = ArchiveFixture::two_chunks().write(dir.path());
        let mut archive = DistributionArchive::open(&path).unwrap();
        let mut cache = ChunkCache::new(archive.chunk_ranges());

        // Minutes 28..32 straddle both chunks
        let window = Window::new(0, 28, 32);
        cache.activate(&mut archive, &window);
        let state = WindowAggregator::new(100).aggregate(&cache, &window, archive.vocabulary());

        assert_eq!(state.record_count(), 40);
        assert_eq!(state.term_frequency.remaining("a"), 20);
        assert_eq!(state.term_frequency.remaining("b"), 20);
    }
}
