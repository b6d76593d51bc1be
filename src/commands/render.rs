use super::open_version;
use crate::config::EditorConfig;
use crate::edit::select_pages;
use crate::pdf::render::{encode_png, Renderer};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub fn render_file(
    input: &Path,
    pages: Option<&str>,
    output_dir: &Path,
    config: &EditorConfig,
) -> Result<Vec<PathBuf>> {
    let version = open_version(input)?;
    let pages = select_pages(pages, version.page_count())?;
    let renderer = Renderer::new(config.pdfium_path.as_deref())
        .context("Failed to load pdfium (set PDFIUM_LIB_PATH to its directory)")?;

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("page");

    let mut outputs = Vec::new();
    for rendered in renderer.render_pages(version.bytes(), &pages, config.render_scale)? {
        let path = output_dir.join(format!("{}_page_{}.png", stem, rendered.page));
        std::fs::write(&path, encode_png(&rendered.image)?)
            .with_context(|| format!("Failed to write image: {}", path.display()))?;
        outputs.push(path);
    }
    Ok(outputs)
}

pub fn run(
    input: &Path,
    pages: Option<&str>,
    output_dir: Option<&Path>,
    config: &EditorConfig,
) -> Result<()> {
    let output_dir = output_dir.unwrap_or_else(|| Path::new("."));
    let outputs = render_file(input, pages, output_dir, config)?;
    for output in &outputs {
        println!("{}", output.display());
    }
    println!(
        "Rendered {} page(s) at scale {}",
        outputs.len(),
        config.render_scale
    );
    Ok(())
}
