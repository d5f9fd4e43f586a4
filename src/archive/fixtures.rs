//! Small in-test archives

use std::io::Write;
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Builder for a distribution archive written to a temp directory
pub(crate) struct ArchiveFixture {
    chunk_window: u32,
    total_minutes: u32,
    vocabulary: Vec<String>,
    /// Per chunk: one row of per-minute counts per vocabulary term
    term_rows: Vec<Vec<Vec<u32>>>,
    /// Per chunk: (bucket, per-minute counts)
    size_rows: Vec<Vec<(u32, Vec<u32>)>>,
    with_info: bool,
}

impl ArchiveFixture {
    pub(crate) fn new(chunk_window: u32, total_minutes: u32, vocabulary: &[&str]) -> Self {
        Self {
            chunk_window,
            total_minutes,
            vocabulary: vocabulary.iter().map(|t| t.to_string()).collect(),
            term_rows: Vec::new(),
            size_rows: Vec::new(),
            with_info: true,
        }
    }

    /// Two 30-minute chunks, vocabulary `{a, b}`, one single-term record per
    /// minute; `a` appears on even minutes and `b` on odd minutes.
    pub(crate) fn two_chunks() -> Self {
        let even: Vec<u32> = (0..30).map(|m| u32::from(m % 2 == 0)).collect();
        let odd: Vec<u32> = (0..30).map(|m| u32::from(m % 2 == 1)).collect();
        let per_minute = vec![1u32; 30];

        let mut fixture = Self::new(30, 60, &["a", "b"]);
        for _ in 0..2 {
            fixture = fixture.chunk(
                vec![even.clone(), odd.clone()],
                vec![(1, per_minute.clone())],
            );
        }
        fixture
    }

    pub(crate) fn chunk(mut self, terms: Vec<Vec<u32>>, sizes: Vec<(u32, Vec<u32>)>) -> Self {
        self.term_rows.push(terms);
        self.size_rows.push(sizes);
        self
    }

    pub(crate) fn without_info(mut self) -> Self {
        self.with_info = false;
        self
    }

    pub(crate) fn write(&self, dir: &Path) -> PathBuf {
        let path = dir.join("stream.zip");
        let file = std::fs::File::create(&path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        if self.with_info {
            zip.start_file("info.txt", options).unwrap();
            writeln!(zip, "chunk_window\ttotal_minutes\tvocabulary_size").unwrap();
            writeln!(
                zip,
                "{}\t{}\t{}",
                self.chunk_window,
                self.total_minutes,
                self.vocabulary.len()
            )
            .unwrap();
        }

        zip.start_file("terms.txt", options).unwrap();
        writeln!(zip, "term").unwrap();
        for term in &self.vocabulary {
            writeln!(zip, "{}", term).unwrap();
        }

        let mut start = 0;
        for (i, (terms, sizes)) in self.term_rows.iter().zip(&self.size_rows).enumerate() {
            let end = if i + 1 == self.term_rows.len() {
                self.total_minutes - 1
            } else {
                start + self.chunk_window - 1
            };

            zip.start_file(format!("term_counts_{}-{}.txt", start, end), options)
                .unwrap();
            writeln!(zip, "counts").unwrap();
            for row in terms {
                writeln!(zip, "{}", join(row)).unwrap();
            }

            zip.start_file(
                format!("amount_terms_in_tweets_{}-{}.txt", start, end),
                options,
            )
            .unwrap();
            writeln!(zip, "amount\tcounts").unwrap();
            for (bucket, row) in sizes {
                writeln!(zip, "{}\t{}", bucket, join(row)).unwrap();
            }

            start = end + 1;
        }

        zip.finish().unwrap();
        path
    }
}

fn join(row: &[u32]) -> String {
    row.iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}
