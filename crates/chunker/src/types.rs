use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// One bounded unit of text and attached files, ready for a single model request
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    text: String,
    files: Vec<FileRef>,
    total_files_size: u64,
    token_count: usize,
}

impl Chunk {
    /// Create a new chunk
    #[must_use]
    pub const fn new(
        text: String,
        files: Vec<FileRef>,
        total_files_size: u64,
        token_count: usize,
    ) -> Self {
        Self {
            text,
            files,
            total_files_size,
            token_count,
        }
    }

    /// Create a chunk that carries text only
    #[must_use]
    pub const fn text_only(text: String, token_count: usize) -> Self {
        Self::new(text, Vec::new(), 0, token_count)
    }

    /// Concatenated text of every text-bearing input folded into this chunk
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attached files, in input order
    #[must_use]
    pub fn files(&self) -> &[FileRef] {
        &self.files
    }

    /// Sum of the byte sizes of all attached files
    #[must_use]
    pub const fn total_files_size(&self) -> u64 {
        self.total_files_size
    }

    /// Token count tracked for this chunk's text while it was built
    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_count
    }

    #[must_use]
    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.files.is_empty()
    }

    /// Split into owned parts
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<FileRef>) {
        (self.text, self.files)
    }
}

/// A file attached to a chunk. Only the size is inspected while chunking;
/// downstream consumers read the content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct FileRef {
    path: PathBuf,
    size: u64,
}

impl FileRef {
    /// Reference a file whose size is already known
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Reference a file on disk, reading its size from metadata once
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        Ok(Self::new(path, metadata.len()))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Size in bytes
    #[must_use]
    pub const fn size(&self) -> u64 {
        self.size
    }

    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(&self.path)
    }

    pub fn read_to_string(&self) -> std::io::Result<String> {
        std::fs::read_to_string(&self.path)
    }
}

/// Structured values that flatten themselves into chunk text.
///
/// Rendering may fail (for example when it needs to read from disk); the
/// error aborts the whole build.
pub trait ToText {
    fn to_text(&self) -> std::io::Result<String>;
}

/// One input element for chunk building
pub enum ChunkItem {
    /// Plain text
    Text(String),
    /// A structured value rendered through [`ToText`]
    Convertible(Box<dyn ToText + Send + Sync>),
    /// A bare file reference
    File(FileRef),
    /// A file labelled by `key`; the key becomes text in the same chunk
    KeyedFile { key: String, file: FileRef },
    /// A key/value pair rendered as `key=value`
    KeyedText { key: String, value: String },
}

impl ChunkItem {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    #[must_use]
    pub const fn file(file: FileRef) -> Self {
        Self::File(file)
    }

    pub fn keyed_file(key: impl fmt::Display, file: FileRef) -> Self {
        Self::KeyedFile {
            key: key.to_string(),
            file,
        }
    }

    pub fn keyed_text(key: impl fmt::Display, value: impl fmt::Display) -> Self {
        Self::KeyedText {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    pub fn convertible(value: impl ToText + Send + Sync + 'static) -> Self {
        Self::Convertible(Box::new(value))
    }

    /// Get human-readable kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Convertible(_) => "convertible",
            Self::File(_) => "file",
            Self::KeyedFile { .. } => "keyed_file",
            Self::KeyedText { .. } => "keyed_text",
        }
    }
}

impl fmt::Debug for ChunkItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Convertible(_) => f.write_str("Convertible(..)"),
            Self::File(file) => f.debug_tuple("File").field(file).finish(),
            Self::KeyedFile { key, file } => f
                .debug_struct("KeyedFile")
                .field("key", key)
                .field("file", file)
                .finish(),
            Self::KeyedText { key, value } => f
                .debug_struct("KeyedText")
                .field("key", key)
                .field("value", value)
                .finish(),
        }
    }
}

impl From<String> for ChunkItem {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ChunkItem {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<FileRef> for ChunkItem {
    fn from(file: FileRef) -> Self {
        Self::File(file)
    }
}
