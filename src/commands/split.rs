use super::{file_name, open_version, write_bytes};
use crate::page_selection::parse_split_points;
use crate::pdf::document::to_bytes;
use crate::pdf::pages::split_document;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Split `input` after each of `points` (every page when `None`), writing
/// `split_{n}_{name}` files into `output_dir`.
pub fn split_file(input: &Path, points: Option<&str>, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    let version = open_version(input)?;
    let total_pages = version.page_count();
    let points = match points {
        Some(points) => parse_split_points(points, total_pages)?,
        None => (1..total_pages).collect(),
    };

    let name = file_name(input);
    let mut outputs = Vec::new();
    for (index, mut part) in split_document(&version.document()?, &points)?
        .into_iter()
        .enumerate()
    {
        let output_path = output_dir.join(format!("split_{}_{}", index + 1, name));
        write_bytes(&to_bytes(&mut part)?, &output_path)?;
        outputs.push(output_path);
    }
    Ok(outputs)
}

pub fn run(input: &Path, points: Option<&str>, output_dir: Option<&Path>) -> Result<()> {
    let output_dir = output_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    let outputs = split_file(input, points, &output_dir)?;

    for output in &outputs {
        println!("{}", output.display());
    }
    println!(
        "Split {} into {} part(s) in {}",
        input.display(),
        outputs.len(),
        output_dir.display()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{build_pdf, page_strings};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_split_at_points() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("book.pdf");
        let texts: Vec<String> = (1..=6).map(|i| format!("p{}", i)).collect();
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        std::fs::write(&input, build_pdf(&texts)).unwrap();

        let out = dir.path().join("parts");
        let outputs = split_file(&input, Some("2,4,9"), &out).unwrap();
        assert_eq!(
            outputs,
            vec![
                out.join("split_1_book.pdf"),
                out.join("split_2_book.pdf"),
                out.join("split_3_book.pdf"),
            ]
        );
        assert_eq!(
            page_strings(&std::fs::read(&outputs[2]).unwrap()),
            vec!["p5", "p6"]
        );
    }

    #[test]
    fn test_burst_without_points() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("doc.pdf");
        std::fs::write(&input, build_pdf(&["a", "b", "c"])).unwrap();
        assert_eq!(split_file(&input, None, dir.path()).unwrap().len(), 3);
    }
}
