//! # chunkprep chunker
//!
//! Packs heterogeneous prompt input into bounded chunks for language-model calls.
//!
//! Input is an ordered list of [`ChunkItem`]s: plain text, structured values
//! that render themselves through [`ToText`], file references, and labelled
//! files. The builder makes one greedy pass and emits [`Chunk`]s that respect:
//! - a token limit on each chunk's text (counted by a pluggable [`TokenCounter`])
//! - a per-file size cap (larger files are silently dropped)
//! - a per-chunk file-count cap and a per-chunk total file size cap
//!
//! ## Architecture
//!
//! ```text
//! ChunkItem[]
//!     │
//!     ├──> Text / KeyedText / Convertible ──> token count
//!     │         ├─> fits        → append to accumulator ("\n")
//!     │         ├─> overflows   → flush, start new chunk
//!     │         └─> above limit → flush, split (words | natural boundaries)
//!     │
//!     ├──> File ──> size checks ──> attach, or flush then attach, or drop
//!     │
//!     └──> KeyedFile ──> label token check ──> File rules ──> label (",\n")
//!
//! Chunk[] (text, files, total_files_size, token_count)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use chunkprep_chunker::{ChunkBuilder, ChunkItem, ChunkerConfig, FileRef};
//!
//! let config = ChunkerConfig::default()
//!     .with_token_limit(8)
//!     .with_max_files_per_chunk(1);
//! let builder = ChunkBuilder::new(config)?;
//!
//! let chunks = builder.build_chunks(vec![
//!     ChunkItem::text("Summarize the attached screenshots"),
//!     ChunkItem::keyed_file("login.png", FileRef::new("login.png", 2_048)),
//!     ChunkItem::keyed_file("error.png", FileRef::new("error.png", 4_096)),
//! ])?;
//!
//! assert_eq!(chunks.len(), 2);
//! assert_eq!(chunks[0].text(), "Summarize the attached screenshots,\nlogin.png");
//! assert_eq!(chunks[1].files()[0].size(), 4_096);
//! # Ok::<(), chunkprep_chunker::ChunkerError>(())
//! ```

mod chunker;
mod config;
mod error;
mod split;
mod tokens;
mod types;

pub use chunker::{ChunkBuilder, ChunkingStats};
pub use config::{
    mib_to_bytes, ChunkerConfig, SplitStrategy, DEFAULT_MAX_FILES_PER_CHUNK,
    DEFAULT_MAX_SINGLE_FILE_SIZE, DEFAULT_MAX_TOTAL_FILES_SIZE, DEFAULT_TOKEN_LIMIT,
    MAX_FILES_ENV, MAX_SINGLE_FILE_SIZE_MB_ENV, MAX_TOTAL_FILES_SIZE_MB_ENV, SPLIT_STRATEGY_ENV,
    TOKEN_LIMIT_ENV,
};
pub use error::{ChunkerError, Result};
pub use split::split_oversized_text;
pub use tokens::{CharEstimateTokenCounter, FnTokenCounter, TokenCounter, WordTokenCounter};
pub use types::{Chunk, ChunkItem, FileRef, ToText};
