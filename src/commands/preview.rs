use super::{file_name, open_version};
use crate::config::EditorConfig;
use crate::pdf::render::{encode_png, Renderer};
use crate::preview::{preview_html, Thumbnail};
use crate::session::DocumentVersion;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

fn thumbnails(version: &DocumentVersion, config: &EditorConfig) -> Result<Vec<Thumbnail>> {
    let renderer = Renderer::new(config.pdfium_path.as_deref())?;
    let pages: Vec<u32> = (1..=version.page_count()).collect();
    renderer
        .render_pages(version.bytes(), &pages, config.render_scale)?
        .into_iter()
        .map(|rendered| {
            Ok(Thumbnail {
                page: rendered.page,
                png: encode_png(&rendered.image)?,
            })
        })
        .collect()
}

pub fn run(
    input: &Path,
    output: Option<&Path>,
    with_thumbnails: bool,
    config: &EditorConfig,
) -> Result<()> {
    let version = open_version(input)?;

    let thumbnails = if with_thumbnails {
        // a preview without thumbnails is still useful
        thumbnails(&version, config).unwrap_or_else(|e| {
            tracing::warn!("skipping thumbnails: {:#}", e);
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let output: PathBuf = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| {
            let stem = input.file_stem().and_then(|s| s.to_str()).unwrap_or("document");
            input.with_file_name(format!("{}_preview.html", stem))
        });
    let html = preview_html(&file_name(input), version.bytes(), &thumbnails);
    std::fs::write(&output, html)
        .with_context(|| format!("Failed to write preview: {}", output.display()))?;

    println!(
        "Wrote preview of {} page(s) to {}",
        version.page_count(),
        output.display()
    );
    Ok(())
}
