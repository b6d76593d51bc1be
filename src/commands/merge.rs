use super::write_bytes;
use crate::pdf::document::{load_bytes, to_bytes};
use crate::pdf::pages::merge_documents;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const DEFAULT_OUTPUT: &str = "merged_document.pdf";

/// Expand directories into the PDFs they contain, sorted by path.
/// Files are kept in the order given.
pub fn collect_inputs<P: AsRef<Path>>(inputs: &[P]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for input in inputs {
        let input = input.as_ref();
        if !input.is_dir() {
            files.push(input.to_path_buf());
            continue;
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(input).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to read {}", input.display()))?;
            let is_pdf = entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
            if entry.file_type().is_file() && is_pdf {
                found.push(entry.into_path());
            }
        }
        tracing::debug!(dir = %input.display(), count = found.len(), "collected PDFs");
        files.extend(found);
    }
    Ok(files)
}

/// Merge the inputs into `output`, returning the merged page count.
pub fn merge_files(inputs: &[PathBuf], output: &Path) -> Result<u32> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }

    let mut documents = Vec::with_capacity(inputs.len());
    for input in inputs {
        let bytes = std::fs::read(input)
            .with_context(|| format!("Failed to read PDF: {}", input.display()))?;
        let doc = load_bytes(&bytes)
            .with_context(|| format!("Failed to load PDF: {}", input.display()))?;
        documents.push(doc);
    }

    let mut merged = merge_documents(documents)?;
    let total_pages = merged.get_pages().len() as u32;
    write_bytes(&to_bytes(&mut merged)?, output)?;
    Ok(total_pages)
}

pub fn run<P: AsRef<Path>>(inputs: &[P], output: Option<&Path>) -> Result<()> {
    let files = collect_inputs(inputs)?;
    let output = output.unwrap_or_else(|| Path::new(DEFAULT_OUTPUT));
    let total_pages = merge_files(&files, output)?;

    println!(
        "Merged {} files ({} pages) into {}",
        files.len(),
        total_pages,
        output.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{build_pdf, page_strings};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_merge_files_and_directories() {
        let dir = tempfile::tempdir().unwrap();
        let parts = dir.path().join("parts");
        std::fs::create_dir(&parts).unwrap();
        std::fs::write(parts.join("b.pdf"), build_pdf(&["b"])).unwrap();
        std::fs::write(parts.join("a.PDF"), build_pdf(&["a1", "a2"])).unwrap();
        std::fs::write(parts.join("notes.txt"), "ignored").unwrap();
        let cover = dir.path().join("cover.pdf");
        std::fs::write(&cover, build_pdf(&["cover"])).unwrap();

        let files = collect_inputs(&[cover.clone(), parts.clone()]).unwrap();
        assert_eq!(
            files,
            vec![cover, parts.join("a.PDF"), parts.join("b.pdf")]
        );

        let output = dir.path().join("out.pdf");
        assert_eq!(merge_files(&files, &output).unwrap(), 4);
        assert_eq!(
            page_strings(&std::fs::read(&output).unwrap()),
            vec!["cover", "a1", "a2", "b"]
        );
    }

    #[test]
    fn test_merge_nothing_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(merge_files(&[], &dir.path().join("out.pdf")).is_err());
    }
}
