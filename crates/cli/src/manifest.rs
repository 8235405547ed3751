use anyhow::{Context as AnyhowContext, Result};
use chunkprep_chunker::{ChunkItem, FileRef};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// One element of the JSON manifest.
///
/// Variant order matters for untagged matching: keyed forms come first so a
/// `{"key", "file"}` object is not read as a bare file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ManifestEntry {
    Bare(String),
    KeyedFile { key: String, file: PathBuf },
    KeyedText { key: String, value: serde_json::Value },
    Text { text: String },
    File { file: PathBuf },
}

/// Parse a manifest document (a JSON array of entries)
pub fn parse_manifest(raw: &str) -> Result<Vec<ManifestEntry>> {
    serde_json::from_str(raw).context("Manifest must be a JSON array of items")
}

/// Turn entries into chunk items, resolving relative file paths against `base_dir`
pub fn into_items(entries: Vec<ManifestEntry>, base_dir: &Path) -> Result<Vec<ChunkItem>> {
    entries
        .into_iter()
        .map(|entry| match entry {
            ManifestEntry::Bare(text) | ManifestEntry::Text { text } => Ok(ChunkItem::Text(text)),
            ManifestEntry::File { file } => Ok(ChunkItem::File(file_ref(base_dir, &file)?)),
            ManifestEntry::KeyedFile { key, file } => Ok(ChunkItem::KeyedFile {
                key,
                file: file_ref(base_dir, &file)?,
            }),
            ManifestEntry::KeyedText { key, value } => {
                let value = match value {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                Ok(ChunkItem::KeyedText { key, value })
            }
        })
        .collect()
}

fn file_ref(base_dir: &Path, file: &Path) -> Result<FileRef> {
    let path = base_dir.join(file);
    FileRef::from_path(&path).with_context(|| format!("Failed to read file {}", path.display()))
}
