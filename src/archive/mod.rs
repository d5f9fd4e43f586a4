//! Distribution Archive
//!
//! Pre-aggregated term statistics the synthetic stream is drawn from:
//!
//! - **types**: timeline types (`ChunkRange`, `Window`, `ArchiveInfo`)
//! - **reader**: the zip container and its metadata
//! - **chunk**: per-chunk count tables
//! - **cache**: pages chunk tables in and out with the active window
//! - **error**: error types
//!
//! # Architecture
//!
//! ```text
//! archive (cold, zip) → chunk tables (warm, paged) → window aggregate (hot)
//! ```

pub mod cache;
pub mod chunk;
pub mod error;
pub mod reader;
pub mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use cache::{CacheStats, ChunkCache};
pub use chunk::{Chunk, ChunkTables};
pub use error::{ArchiveError, ArchiveResult};
pub use reader::DistributionArchive;
pub use types::{ArchiveInfo, ChunkRange, Overlap, Window};
