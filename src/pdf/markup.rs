//! Search-driven edits across many pages.

use crate::error::EditResult;
use crate::pdf::annotate::add_highlight;
use crate::pdf::document::page_object_id;
use crate::pdf::geometry::Color;
use crate::pdf::layout::page_layout;
use crate::pdf::overlay::{append_operations, ensure_font, fill_rect_operations, text_operations};
use crate::pdf::redact::remove_glyphs;
use crate::pdf::search::{find_in_layout, find_text};
use lopdf::Document;
use serde::Serialize;
use std::collections::BTreeSet;

/// How many occurrences were edited, and on which pages
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkupReport {
    pub count: usize,
    pub pages: Vec<u32>,
}

impl MarkupReport {
    fn record(&mut self, page: u32, count: usize) {
        if count > 0 {
            self.count += count;
            self.pages.push(page);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReplaceStyle {
    pub font_size: f32,
    pub color: Color,
}

impl Default for ReplaceStyle {
    fn default() -> Self {
        ReplaceStyle {
            font_size: 11.0,
            color: Color::BLACK,
        }
    }
}

pub fn highlight_all(
    doc: &mut Document,
    needle: &str,
    color: Color,
    pages: &[u32],
    ignore_case: bool,
) -> EditResult<MarkupReport> {
    let mut report = MarkupReport::default();
    for &page in pages {
        let matches = find_text(doc, &[page], needle, ignore_case)?;
        for found in &matches {
            add_highlight(doc, page, &found.rects, color)?;
        }
        report.record(page, matches.len());
    }
    tracing::info!(needle, count = report.count, "highlighted matches");
    Ok(report)
}

/// Replace every occurrence of `old` with `new`. The old glyphs are removed
/// from the content, their area is painted white and `new` is written at the
/// old baseline.
pub fn replace_all(
    doc: &mut Document,
    old: &str,
    new: &str,
    pages: &[u32],
    ignore_case: bool,
    style: &ReplaceStyle,
) -> EditResult<MarkupReport> {
    let mut report = MarkupReport::default();
    for &page in pages {
        let page_id = page_object_id(doc, page)?;
        let layout = page_layout(doc, page_id)?;
        let matches = find_in_layout(&layout, page, old, ignore_case);
        if matches.is_empty() {
            continue;
        }

        let glyphs: BTreeSet<usize> = matches
            .iter()
            .flat_map(|m| m.glyphs.iter().copied())
            .collect();
        remove_glyphs(doc, page_id, &layout, &glyphs)?;

        let mut operations = Vec::new();
        for found in &matches {
            for rect in &found.rects {
                operations.extend(fill_rect_operations(rect, Color::WHITE));
            }
            if !new.is_empty() {
                operations.extend(text_operations(found.origin, new, style.font_size, style.color));
            }
        }
        ensure_font(doc, page_id)?;
        append_operations(doc, page_id, operations)?;
        report.record(page, matches.len());
    }
    tracing::info!(old, new, count = report.count, "replaced matches");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::annotate::page_annotations;
    use crate::pdf::document::{load_bytes, to_bytes};
    use crate::pdf::testing::build_pdf;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_highlight_all_reports_pages() {
        let mut doc = load_bytes(&build_pdf(&["cat and cat", "dog", "Cat"])).unwrap();
        let report = highlight_all(&mut doc, "cat", Color::YELLOW, &[1, 2, 3], false).unwrap();
        assert_eq!(
            report,
            MarkupReport {
                count: 2,
                pages: vec![1]
            }
        );
        assert_eq!(page_annotations(&doc, 1).unwrap().len(), 2);

        let report = highlight_all(&mut doc, "cat", Color::YELLOW, &[1, 2, 3], true).unwrap();
        assert_eq!(report.pages, vec![1, 3]);
    }

    #[test]
    fn test_highlight_without_match_is_not_an_error() {
        let mut doc = load_bytes(&build_pdf(&["abc"])).unwrap();
        let report = highlight_all(&mut doc, "xyz", Color::YELLOW, &[1], false).unwrap();
        assert!(report.is_empty());
    }

    #[test]
    fn test_replace_all() {
        let mut doc = load_bytes(&build_pdf(&["Total: 100 USD", "no match"])).unwrap();
        let style = ReplaceStyle::default();
        let report = replace_all(&mut doc, "100", "250", &[1, 2], false, &style).unwrap();
        assert_eq!(report.count, 1);
        assert_eq!(report.pages, vec![1]);

        let doc = load_bytes(&to_bytes(&mut doc).unwrap()).unwrap();
        assert!(find_text(&doc, &[1], "100", false).unwrap().is_empty());

        let new = find_text(&doc, &[1], "250", false).unwrap();
        assert_eq!(new.len(), 1);
        assert_eq!(new[0].origin.1, 700.0);
        assert!((new[0].font_size - 11.0).abs() < 1e-4);
        // the surrounding text did not move
        assert_eq!(find_text(&doc, &[1], "USD", false).unwrap().len(), 1);
    }

    #[test]
    fn test_replace_is_case_insensitive_when_asked() {
        let mut doc = load_bytes(&build_pdf(&["Draft draft"])).unwrap();
        let style = ReplaceStyle::default();
        let report = replace_all(&mut doc, "DRAFT", "final", &[1], true, &style).unwrap();
        assert_eq!(report.count, 2);
    }
}
