use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::split::split_oversized_text;
use crate::tokens::{TokenCounter, WordTokenCounter};
use crate::types::{Chunk, ChunkItem, FileRef};
use serde::Serialize;

const TEXT_SEPARATOR: &str = "\n";
const KEY_SEPARATOR: &str = ",\n";

/// Packs ordered input items into chunks bounded by a token limit and file caps
#[derive(Debug, Clone)]
pub struct ChunkBuilder<C = WordTokenCounter> {
    config: ChunkerConfig,
    counter: C,
}

impl ChunkBuilder {
    /// Create a builder with the default word-based token counter
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        Self::with_counter(config, WordTokenCounter)
    }
}

impl<C: TokenCounter> ChunkBuilder<C> {
    /// Create a builder with a custom token counter
    pub fn with_counter(config: ChunkerConfig, counter: C) -> Result<Self> {
        config.validate().map_err(ChunkerError::InvalidConfig)?;
        Ok(Self { config, counter })
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Configured token limit
    #[must_use]
    pub const fn token_limit(&self) -> usize {
        self.config.token_limit
    }

    /// Token counter used for every item
    #[must_use]
    pub const fn counter(&self) -> &C {
        &self.counter
    }

    /// Build chunks using the configured token limit
    pub fn build_chunks<I>(&self, items: I) -> Result<Vec<Chunk>>
    where
        I: IntoIterator<Item = ChunkItem>,
    {
        self.build_chunks_with_limit(items, self.config.token_limit)
    }

    /// Build chunks with an explicit token limit.
    ///
    /// Items are consumed in order in a single greedy pass. A convertible item
    /// that fails to render aborts the whole call.
    pub fn build_chunks_with_limit<I>(&self, items: I, token_limit: usize) -> Result<Vec<Chunk>>
    where
        I: IntoIterator<Item = ChunkItem>,
    {
        if token_limit == 0 {
            return Err(ChunkerError::invalid_config("token_limit must be > 0"));
        }

        let mut pass = BuildPass {
            config: &self.config,
            counter: &self.counter,
            token_limit,
            chunks: Vec::new(),
            current: ChunkAccumulator::default(),
            dropped_files: 0,
        };

        for (index, item) in items.into_iter().enumerate() {
            match item {
                ChunkItem::Text(text) => pass.push_text(&text),
                ChunkItem::KeyedText { key, value } => pass.push_text(&format!("{key}={value}")),
                ChunkItem::Convertible(value) => {
                    let text = value
                        .to_text()
                        .map_err(|e| ChunkerError::text_conversion(index, e))?;
                    pass.push_text(&text);
                }
                ChunkItem::File(file) => pass.push_file(file),
                ChunkItem::KeyedFile { key, file } => pass.push_keyed_file(&key, file),
            }
        }

        Ok(pass.finish())
    }

    /// Get statistics about chunking
    #[must_use]
    pub fn stats(chunks: &[Chunk]) -> ChunkingStats {
        ChunkingStats::collect(chunks)
    }
}

/// Working state for the chunk currently being filled
#[derive(Debug, Default)]
struct ChunkAccumulator {
    text: String,
    files: Vec<FileRef>,
    token_count: usize,
    files_size: u64,
}

impl ChunkAccumulator {
    fn is_empty(&self) -> bool {
        self.text.is_empty() && self.files.is_empty()
    }

    fn can_attach(&self, file: &FileRef, config: &ChunkerConfig) -> bool {
        self.files.len() < config.max_files_per_chunk
            && self.files_size.saturating_add(file.size()) <= config.max_total_files_size
    }

    fn attach(&mut self, file: FileRef) {
        self.files_size = self.files_size.saturating_add(file.size());
        self.files.push(file);
    }

    fn append_text(&mut self, text: &str, separator: &str, tokens: usize) {
        if !self.text.is_empty() {
            self.text.push_str(separator);
        }
        self.text.push_str(text);
        self.token_count = self.token_count.saturating_add(tokens);
    }

    fn into_chunk(self) -> Chunk {
        Chunk::new(self.text, self.files, self.files_size, self.token_count)
    }
}

/// One call's worth of state; discarded when the call returns
struct BuildPass<'a, C: ?Sized> {
    config: &'a ChunkerConfig,
    counter: &'a C,
    token_limit: usize,
    chunks: Vec<Chunk>,
    current: ChunkAccumulator,
    dropped_files: usize,
}

impl<C: TokenCounter + ?Sized> BuildPass<'_, C> {
    fn flush(&mut self) {
        if !self.current.is_empty() {
            let done = std::mem::take(&mut self.current);
            self.chunks.push(done.into_chunk());
        }
    }

    fn would_overflow(&self, tokens: usize) -> bool {
        self.current.token_count.saturating_add(tokens) > self.token_limit
    }

    fn push_text(&mut self, text: &str) {
        let tokens = self.counter.count_tokens(text);

        if tokens > self.token_limit {
            self.flush();
            let pieces = split_oversized_text(
                text,
                self.token_limit,
                self.config.split_strategy,
                self.counter,
            );
            log::debug!(
                "Split text of {tokens} tokens into {} chunks (limit {})",
                pieces.len(),
                self.token_limit
            );
            self.chunks.extend(pieces);
            return;
        }

        if self.would_overflow(tokens) {
            self.flush();
        }
        self.current.append_text(text, TEXT_SEPARATOR, tokens);
    }

    fn push_file(&mut self, file: FileRef) {
        if file.size() > self.config.max_single_file_size {
            log::debug!(
                "Skipping {} ({} bytes): above single-file cap of {} bytes",
                file.path().display(),
                file.size(),
                self.config.max_single_file_size
            );
            self.dropped_files += 1;
            return;
        }

        if !self.current.can_attach(&file, self.config) {
            self.flush();
            if !self.current.can_attach(&file, self.config) {
                log::debug!(
                    "Skipping {} ({} bytes): cannot fit an empty chunk",
                    file.path().display(),
                    file.size()
                );
                self.dropped_files += 1;
                return;
            }
        }
        self.current.attach(file);
    }

    /// The label is appended whole, so a label that alone exceeds the token
    /// limit leaves its chunk over the limit.
    fn push_keyed_file(&mut self, key: &str, file: FileRef) {
        let key_tokens = self.counter.count_tokens(key);
        if self.would_overflow(key_tokens) {
            self.flush();
        }

        // The label is kept even when the file itself is dropped.
        self.push_file(file);
        self.current.append_text(key, KEY_SEPARATOR, key_tokens);
    }

    fn finish(mut self) -> Vec<Chunk> {
        self.flush();
        log::debug!(
            "Prepared {} chunks ({} files dropped)",
            self.chunks.len(),
            self.dropped_files
        );
        self.chunks
    }
}

/// Statistics about chunking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_files: usize,
    pub total_files_size: u64,
    pub total_tokens: usize,
    pub avg_tokens_per_chunk: usize,
    pub min_tokens: usize,
    pub max_tokens: usize,
}

impl ChunkingStats {
    #[must_use]
    pub fn collect(chunks: &[Chunk]) -> Self {
        let total_tokens: usize = chunks.iter().map(Chunk::token_count).sum();
        Self {
            total_chunks: chunks.len(),
            total_files: chunks.iter().map(|c| c.files().len()).sum(),
            total_files_size: chunks.iter().map(Chunk::total_files_size).sum(),
            total_tokens,
            avg_tokens_per_chunk: if chunks.is_empty() {
                0
            } else {
                total_tokens / chunks.len()
            },
            min_tokens: chunks.iter().map(Chunk::token_count).min().unwrap_or(0),
            max_tokens: chunks.iter().map(Chunk::token_count).max().unwrap_or(0),
        }
    }
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Files: {} ({} bytes) | Tokens: {} | Avg: {} | Range: {}-{}",
            self.total_chunks,
            self.total_files,
            self.total_files_size,
            self.total_tokens,
            self.avg_tokens_per_chunk,
            self.min_tokens,
            self.max_tokens
        )
    }
}
