//! Timeline types for the distribution archive
//!
//! Minutes are counted from the beginning of the archived timeline.
//! - `ChunkRange`: the closed minute interval `[start, end]` a chunk covers
//! - `Window`: the half-open minute interval `[start, end)` being synthesized
//! - `ArchiveInfo`: the archive header (`info.txt`)

use serde::Serialize;

/// Header row of `info.txt`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ArchiveInfo {
    /// Minutes covered by each stored chunk (the last chunk may be longer)
    pub chunk_window_minutes: u32,
    /// Length of the archived timeline in minutes
    pub total_minutes: u32,
    /// Number of vocabulary terms declared by the header
    pub vocabulary_size: usize,
}

/// Closed minute interval `[start, end]` covered by one chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ChunkRange {
    pub start: u32,
    pub end: u32,
}

/// How a chunk overlaps a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlap {
    /// The chunk lies completely inside the window
    Contained,
    /// The window's tail reaches into a chunk that ends after the window
    Tail,
    /// The window's head starts inside a chunk that began earlier
    Head,
}

impl ChunkRange {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "ChunkRange: start must not exceed end");
        Self { start, end }
    }

    /// Contiguous chunk layout for an archive holding `chunk_count` chunks
    ///
    /// Every chunk spans `chunk_window` minutes except the last one, which
    /// absorbs the remainder up to `total_minutes`.
    pub fn layout(chunk_window: u32, total_minutes: u32, chunk_count: usize) -> Vec<ChunkRange> {
        let mut ranges = Vec::with_capacity(chunk_count);
        let mut start = 0u32;
        for i in 0..chunk_count {
            let end = if i + 1 == chunk_count {
                total_minutes
            } else {
                start + chunk_window
            };
            if end <= start {
                break;
            }
            ranges.push(ChunkRange::new(start, end - 1));
            start = end;
        }
        ranges
    }

    /// Number of minutes in the chunk
    pub fn minutes(&self) -> usize {
        (self.end - self.start + 1) as usize
    }

    /// Classify the overlap with a window, `None` when they are disjoint
    pub fn overlap(&self, window: &Window) -> Option<Overlap> {
        if window.is_empty() {
            return None;
        }
        let last = window.last_minute();
        if self.start >= window.start && self.end <= last {
            Some(Overlap::Contained)
        } else if self.start <= last && self.end > last {
            Some(Overlap::Tail)
        } else if self.start < window.start && self.end >= window.start {
            Some(Overlap::Head)
        } else {
            None
        }
    }

    /// Minute offsets inside this chunk that fall within the window
    ///
    /// Returns the closed index range `(first, last)` relative to `start`.
    pub fn intersect(&self, window: &Window) -> Option<(usize, usize)> {
        self.overlap(window)?;
        let start = self.start.max(window.start);
        let end = self.end.min(window.last_minute());
        let first = (start - self.start) as usize;
        Some((first, first + (end - start) as usize))
    }

    /// Entry name of the term count table
    pub fn term_counts_entry(&self) -> String {
        format!("term_counts_{}-{}.txt", self.start, self.end)
    }

    /// Entry name of the terms-per-record table
    pub fn size_counts_entry(&self) -> String {
        format!("amount_terms_in_tweets_{}-{}.txt", self.start, self.end)
    }
}

impl std::fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}

/// Half-open minute interval `[start, end)` synthesized in one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Position in the run, starting at 0
    pub index: usize,
    pub start: u32,
    pub end: u32,
}

impl Window {
    pub fn new(index: usize, start: u32, end: u32) -> Self {
        Self { index, start, end }
    }

    /// Windows of `window_minutes` covering `[0, limit)`
    ///
    /// `limit` defaults to the archive length and never exceeds it; the
    /// final window is shortened when the limit is not a multiple of the
    /// window size.
    pub fn plan(total_minutes: u32, window_minutes: u32, limit: Option<u32>) -> Vec<Window> {
        let limit = limit.map_or(total_minutes, |l| l.min(total_minutes));
        let step = window_minutes.max(1);
        let mut windows = Vec::new();
        let mut start = 0;
        while start < limit {
            let end = (start + step).min(limit);
            windows.push(Window::new(windows.len(), start, end));
            start = end;
        }
        windows
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Last minute included in the window
    pub fn last_minute(&self) -> u32 {
        self.end.saturating_sub(1)
    }

    pub fn minutes(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    /// Window start in epoch millis, relative to the stream start
    pub fn start_millis(&self, stream_start_secs: i64) -> i64 {
        (stream_start_secs + self.start as i64 * 60) * 1000
    }

    /// Window end (exclusive) in epoch millis, relative to the stream start
    pub fn end_millis(&self, stream_start_secs: i64) -> i64 {
        (stream_start_secs + self.end as i64 * 60) * 1000
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.start, self.last_minute())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_is_contiguous() {
        let ranges = ChunkRange::layout(30, 100, 3);
        assert_eq!(
            ranges,
            vec![
                ChunkRange::new(0, 29),
                ChunkRange::new(30, 59),
                ChunkRange::new(60, 99),
            ]
        );

        // Every minute is covered by exactly one chunk
        for minute in 0..100u32 {
            let window = Window::new(0, minute, minute + 1);
            let covering = ranges.iter().filter(|r| r.overlap(&window).is_some()).count();
            assert_eq!(covering, 1, "minute {}", minute);
        }
    }

    #[test]
    fn test_overlap_cases() {
        let chunk = ChunkRange::new(30, 59);

        assert_eq!(chunk.overlap(&Window::new(0, 0, 60)), Some(Overlap::Contained));
        assert_eq!(chunk.overlap(&Window::new(0, 20, 40)), Some(Overlap::Tail));
        assert_eq!(chunk.overlap(&Window::new(0, 50, 70)), Some(Overlap::Head));
        assert_eq!(chunk.overlap(&Window::new(0, 35, 40)), Some(Overlap::Tail));
        assert_eq!(chunk.overlap(&Window::new(0, 0, 30)), None);
        assert_eq!(chunk.overlap(&Window::new(0, 60, 61)), None);
    }

    #[test]
    fn test_intersect_indices() {
        let chunk = ChunkRange::new(30, 59);
        assert_eq!(chunk.intersect(&Window::new(0, 20, 40)), Some((0, 9)));
        assert_eq!(chunk.intersect(&Window::new(0, 50, 70)), Some((20, 29)));
        assert_eq!(chunk.intersect(&Window::new(0, 35, 36)), Some((5, 5)));
        assert_eq!(chunk.intersect(&Window::new(0, 60, 90)), None);
    }

    #[test]
    fn test_window_plan() {
        let windows = Window::plan(60, 25, None);
        assert_eq!(windows.len(), 3);
        assert_eq!((windows[2].start, windows[2].end), (50, 60));

        let windows = Window::plan(1440, 1, Some(60));
        assert_eq!(windows.len(), 60);
        assert_eq!(windows[59].index, 59);

        // Limit never runs past the archive
        assert_eq!(Window::plan(30, 10, Some(100)).len(), 3);
    }

    #[test]
    fn test_entry_names() {
        let chunk = ChunkRange::new(0, 29);
        assert_eq!(chunk.term_counts_entry(), "term_counts_0-29.txt");
        assert_eq!(chunk.size_counts_entry(), "amount_terms_in_tweets_0-29.txt");
        assert_eq!(chunk.minutes(), 30);
    }
}
