//! Rasterizing pages through pdfium.

use crate::error::{EditError, EditResult};
use image::{DynamicImage, ImageFormat};
use pdfium_render::prelude::*;
use std::collections::BTreeSet;
use std::io::Cursor;
use std::path::Path;

pub const DEFAULT_SCALE: f32 = 1.5;

fn render_error(err: PdfiumError) -> EditError {
    EditError::Render(err.to_string())
}

pub struct RenderedPage {
    pub page: u32,
    pub image: DynamicImage,
}

pub struct Renderer {
    pdfium: Pdfium,
}

impl Renderer {
    /// Bind pdfium from `library_dir` (or the working directory), falling
    /// back to the system library.
    pub fn new(library_dir: Option<&Path>) -> EditResult<Self> {
        let dir = library_dir.unwrap_or_else(|| Path::new("./"));
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .or_else(|_| Pdfium::bind_to_system_library())
            .map_err(render_error)?;
        Ok(Renderer {
            pdfium: Pdfium::new(bindings),
        })
    }

    /// Render the given 1-indexed pages at `scale` pixels per point.
    pub fn render_pages(
        &self,
        bytes: &[u8],
        pages: &[u32],
        scale: f32,
    ) -> EditResult<Vec<RenderedPage>> {
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(bytes, None)
            .map_err(render_error)?;
        let wanted: BTreeSet<u32> = pages.iter().copied().collect();

        let mut rendered = Vec::with_capacity(wanted.len());
        for (index, page) in document.pages().iter().enumerate() {
            let number = index as u32 + 1;
            if !wanted.contains(&number) {
                continue;
            }
            let width = (page.width().value * scale) as i32;
            let height = (page.height().value * scale) as i32;
            let bitmap = page
                .render_with_config(
                    &PdfRenderConfig::new()
                        .set_target_width(width)
                        .set_target_height(height)
                        .render_annotations(true),
                )
                .map_err(render_error)?;
            tracing::debug!(page = number, width, height, "rendered page");
            rendered.push(RenderedPage {
                page: number,
                image: bitmap.as_image(),
            });
        }
        Ok(rendered)
    }
}

pub fn encode_png(image: &DynamicImage) -> EditResult<Vec<u8>> {
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .map_err(|e| EditError::Render(e.to_string()))?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::build_pdf;

    #[test]
    fn test_encode_png() {
        let image = DynamicImage::new_rgba8(3, 2);
        let png = encode_png(&image).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    #[ignore = "needs the pdfium shared library"]
    fn test_render_selected_pages() {
        let renderer = Renderer::new(None).unwrap();
        let bytes = build_pdf(&["one", "two", "three"]);
        let pages = renderer.render_pages(&bytes, &[1, 3], DEFAULT_SCALE).unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[1].page, 3);
        assert_eq!(pages[0].image.width(), 918);
        assert_eq!(pages[0].image.height(), 1188);
    }
}
