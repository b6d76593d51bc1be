use crate::edit::select_pages;
use crate::pdf::document::{media_box, page_object_id};
use crate::pdf::geometry::Rect;
use crate::pdf::search::find_text;
use crate::pdf::PdfDocument;
use anyhow::Result;
use serde::Serialize;
use std::path::Path;

/// A match with its areas given from the top-left corner of the page
#[derive(Debug, Clone, Serialize)]
pub struct FoundText {
    pub page: u32,
    pub text: String,
    pub rects: Vec<Rect>,
}

pub fn find_in_file(
    path: &Path,
    needle: &str,
    pages: Option<&str>,
    ignore_case: bool,
) -> Result<Vec<FoundText>> {
    let doc = PdfDocument::open(path)?;
    let pages = select_pages(pages, doc.page_count())?;

    let mut found = Vec::new();
    for m in find_text(&doc.doc, &pages, needle, ignore_case)? {
        let media = media_box(&doc.doc, page_object_id(&doc.doc, m.page)?);
        found.push(FoundText {
            page: m.page,
            rects: m.rects.iter().map(|r| r.to_top_left(&media)).collect(),
            text: m.text,
        });
    }
    Ok(found)
}

pub fn run(
    path: &Path,
    needle: &str,
    pages: Option<&str>,
    ignore_case: bool,
    json: bool,
) -> Result<()> {
    let found = find_in_file(path, needle, pages, ignore_case)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&found)?);
        return Ok(());
    }

    if found.is_empty() {
        println!("No matches found");
        return Ok(());
    }
    for m in &found {
        for rect in &m.rects {
            println!(
                "Page {}: {:?} at ({:.1}, {:.1}, {:.1}, {:.1})",
                m.page, m.text, rect.x0, rect.y0, rect.x1, rect.y1
            );
        }
    }
    println!("{} match(es)", found.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::build_pdf;

    #[test]
    fn test_find_in_file_reports_top_left_areas() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        std::fs::write(&path, build_pdf(&["skip", "needle in hay"])).unwrap();

        let found = find_in_file(&path, "NEEDLE", None, true).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].page, 2);
        assert_eq!(found[0].text, "needle");
        // baseline at 700 from the bottom is 92 from the top
        let rect = found[0].rects[0];
        assert!(rect.y1 > 92.0 && rect.y0 < 92.0);
        assert!((rect.x0 - 72.0).abs() < 0.01);

        assert!(find_in_file(&path, "needle", Some("1"), false)
            .unwrap()
            .is_empty());
    }
}
