pub mod apply;
pub mod edit;
pub mod find;
pub mod info;
pub mod merge;
pub mod pages;
pub mod preview;
pub mod render;
pub mod split;
pub mod text;

use crate::session::DocumentVersion;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Output path next to `input`, with `prefix` added to its file name
pub fn default_output(input: &Path, prefix: &str) -> PathBuf {
    input.with_file_name(format!("{}{}", prefix, file_name(input)))
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document.pdf".to_string())
}

pub fn open_version(path: &Path) -> Result<DocumentVersion> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read PDF: {}", path.display()))?;
    DocumentVersion::from_bytes(bytes)
        .with_context(|| format!("Failed to open PDF: {}", path.display()))
}

pub fn write_bytes(bytes: &[u8], path: &Path) -> Result<()> {
    std::fs::write(path, bytes)
        .with_context(|| format!("Failed to save PDF: {}", path.display()))?;
    tracing::debug!(path = %path.display(), size = bytes.len(), "wrote file");
    Ok(())
}
