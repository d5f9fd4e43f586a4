//! Chunk cache
//!
//! Pages chunk tables in and out as the synthesis window advances. Only the
//! chunks overlapping the active window are held in memory; a chunk is loaded
//! on its first overlap and released as soon as the window moves past it.

use crate::archive::chunk::{Chunk, ChunkTables};
use crate::archive::reader::DistributionArchive;
use crate::archive::types::{ChunkRange, Window};
use std::io::{Read, Seek};

/// Load/unload counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub loads: usize,
    pub unloads: usize,
}

/// Windowed cache over the chunks of one archive
#[derive(Debug)]
pub struct ChunkCache {
    chunks: Vec<Chunk>,
    /// Indices into `chunks` overlapping the active window
    active: Vec<usize>,
    stats: CacheStats,
}

impl ChunkCache {
    pub fn new(ranges: &[ChunkRange]) -> Self {
        Self {
            chunks: ranges.iter().copied().map(Chunk::new).collect(),
            active: Vec::new(),
            stats: CacheStats::default(),
        }
    }

    /// Make `window` the active window
    ///
    /// Loads every newly overlapping chunk from the archive and unloads
    /// those that no longer overlap.
    pub fn activate<R: Read + Seek>(&mut self, archive: &mut DistributionArchive<R>, window: &Window) {
        let next: Vec<usize> = self
            .chunks
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.range.overlap(window).is_some())
            .map(|(idx, _)| idx)
            .collect();

        for &idx in &self.active {
            if !next.contains(&idx) && self.chunks[idx].unload() {
                self.stats.unloads += 1;
                tracing::info!(chunk = %self.chunks[idx].range, "Unloaded chunk");
            }
        }

        for &idx in &next {
            let chunk = &mut self.chunks[idx];
            if !chunk.is_loaded() {
                let tables = archive.load_tables(&chunk.range);
                chunk.set_tables(tables);
                self.stats.loads += 1;
                tracing::info!(chunk = %chunk.range, "Loaded chunk");
            }
        }

        self.active = next;
    }

    /// Active chunks with the offset range each contributes to `window`
    pub fn overlapping<'a>(
        &'a self,
        window: &'a Window,
    ) -> impl Iterator<Item = (&'a ChunkTables, (usize, usize))> + 'a {
        self.active.iter().filter_map(move |&idx| {
            let chunk = &self.chunks[idx];
            let tables = chunk.tables()?;
            let span = chunk.range.intersect(window)?;
            Some((tables, span))
        })
    }

    /// Ranges of the chunks currently in memory
    pub fn loaded(&self) -> Vec<ChunkRange> {
        self.chunks
            .iter()
            .filter(|c| c.is_loaded())
            .map(|c| c.range)
            .collect()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::fixtures::ArchiveFixture;
    use tempfile::tempdir;

    fn three_chunk_archive(dir: &std::path::Path) -> DistributionArchive {
        let row = vec![1u32; 10];
        let fixture = ArchiveFixture::new(10, 30, &["a"])
            .chunk(vec![row.clone()], vec![(1, row.clone())])
            .chunk(vec![row.clone()], vec![(1, row.clone())])
            .chunk(vec![row.clone()], vec![(1, row)]);
        DistributionArchive::open(fixture.write(dir)).unwrap()
    }

    #[test]
    fn test_pages_chunks_with_window() {
        let dir = tempdir().unwrap();
        let mut archive = three_chunk_archive(dir.path());
        let mut cache = ChunkCache::new(archive.chunk_ranges());

        cache.activate(&mut archive, &Window::new(0, 0, 5));
        assert_eq!(cache.loaded(), vec![ChunkRange::new(0, 9)]);

        // Straddles the first and second chunk
        cache.activate(&mut archive, &Window::new(1, 5, 15));
        assert_eq!(
            cache.loaded(),
            vec![ChunkRange::new(0, 9), ChunkRange::new(10, 19)]
        );

        cache.activate(&mut archive, &Window::new(2, 15, 25));
        assert_eq!(
            cache.loaded(),
            vec![ChunkRange::new(10, 19), ChunkRange::new(20, 29)]
        );

        assert_eq!(cache.stats(), CacheStats { loads: 3, unloads: 1 });
    }

    #[test]
    fn test_overlapping_spans() {
        let dir = tempdir().unwrap();
        let mut archive = three_chunk_archive(dir.path());
        let mut cache = ChunkCache::new(archive.chunk_ranges());

        let window = Window::new(0, 5, 15);
        cache.activate(&mut archive, &window);

        let spans: Vec<(usize, usize)> = cache.overlapping(&window).map(|(_, span)| span).collect();
        assert_eq!(spans, vec![(5, 9), (0, 4)]);
    }
}
