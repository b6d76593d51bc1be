use crate::error::EditResult;
use crate::pdf::document::page_object_id;
use crate::pdf::geometry::Rect;
use crate::pdf::layout::{page_layout, Glyph, PageLayout};
use lopdf::Document;
use serde::Serialize;

/// One occurrence of a search string on a page
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextMatch {
    pub page: u32,
    pub text: String,
    /// One rectangle per line the match spans
    pub rects: Vec<Rect>,
    /// Baseline origin of the first glyph
    #[serde(skip)]
    pub origin: (f32, f32),
    #[serde(skip)]
    pub font_size: f32,
    /// Indices into the page layout's glyphs
    #[serde(skip)]
    pub glyphs: Vec<usize>,
}

impl TextMatch {
    pub fn bounds(&self) -> Option<Rect> {
        self.rects.iter().copied().reduce(|a, b| a.union(&b))
    }
}

/// A page's text with each character traced back to its glyph
struct PageText {
    chars: Vec<char>,
    sources: Vec<Option<usize>>,
}

fn same_line(a: &Glyph, b: &Glyph) -> bool {
    (a.origin.1 - b.origin.1).abs() <= 0.5 * b.font_size.max(a.font_size)
}

fn page_text(glyphs: &[Glyph]) -> PageText {
    let mut text = PageText {
        chars: Vec::new(),
        sources: Vec::new(),
    };
    let mut previous: Option<&Glyph> = None;

    for (index, glyph) in glyphs.iter().enumerate() {
        if let Some(prev) = previous {
            let separator = if !same_line(prev, glyph) {
                Some('\n')
            } else if glyph.rect.x0 - prev.rect.x1 > 0.25 * glyph.font_size {
                Some(' ')
            } else {
                None
            };
            let already_spaced = prev.text.ends_with(char::is_whitespace)
                || glyph.text.starts_with(char::is_whitespace);
            if let Some(separator) = separator {
                if separator == '\n' || !already_spaced {
                    text.chars.push(separator);
                    text.sources.push(None);
                }
            }
        }
        for c in glyph.text.chars() {
            text.chars.push(c);
            text.sources.push(Some(index));
        }
        previous = Some(glyph);
    }
    text
}

fn fold(c: char, ignore_case: bool) -> char {
    if ignore_case {
        c.to_lowercase().next().unwrap_or(c)
    } else {
        c
    }
}

/// Find every non-overlapping occurrence of `needle` in a laid-out page.
pub fn find_in_layout(
    layout: &PageLayout,
    page: u32,
    needle: &str,
    ignore_case: bool,
) -> Vec<TextMatch> {
    let needle: Vec<char> = needle.chars().map(|c| fold(c, ignore_case)).collect();
    if needle.is_empty() {
        return Vec::new();
    }

    let text = page_text(&layout.glyphs);
    let haystack: Vec<char> = text.chars.iter().map(|&c| fold(c, ignore_case)).collect();

    let mut matches = Vec::new();
    let mut start = 0;
    while start + needle.len() <= haystack.len() {
        if haystack[start..start + needle.len()] != needle[..] {
            start += 1;
            continue;
        }
        let end = start + needle.len();

        let mut glyphs: Vec<usize> = text.sources[start..end].iter().flatten().copied().collect();
        glyphs.dedup();
        if let Some(&first) = glyphs.first() {
            let first = &layout.glyphs[first];
            matches.push(TextMatch {
                page,
                text: text.chars[start..end].iter().collect(),
                rects: line_rects(&layout.glyphs, &glyphs),
                origin: first.origin,
                font_size: first.font_size,
                glyphs,
            });
        }
        start = end;
    }
    matches
}

/// Group the matched glyphs into one rectangle per line
fn line_rects(all: &[Glyph], indices: &[usize]) -> Vec<Rect> {
    let mut rects: Vec<Rect> = Vec::new();
    let mut line_start: Option<&Glyph> = None;
    for &index in indices {
        let glyph = &all[index];
        match (line_start, rects.last_mut()) {
            (Some(start), Some(rect)) if same_line(start, glyph) => *rect = rect.union(&glyph.rect),
            _ => {
                rects.push(glyph.rect);
                line_start = Some(glyph);
            }
        }
    }
    rects
}

/// Search the given pages of a document
pub fn find_text(
    doc: &Document,
    pages: &[u32],
    needle: &str,
    ignore_case: bool,
) -> EditResult<Vec<TextMatch>> {
    let mut matches = Vec::new();
    for &page in pages {
        let layout = page_layout(doc, page_object_id(doc, page)?)?;
        let found = find_in_layout(&layout, page, needle, ignore_case);
        tracing::debug!(page, count = found.len(), "searched page");
        matches.extend(found);
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::load_bytes;
    use crate::pdf::testing::{build_pdf, build_pdf_from_operations};
    use lopdf::content::Operation;
    use lopdf::Object;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_reports_page_and_position() {
        let doc = load_bytes(&build_pdf(&["nothing here", "Hello World"])).unwrap();
        let matches = find_text(&doc, &[1, 2], "World", false).unwrap();
        assert_eq!(matches.len(), 1);

        let found = &matches[0];
        assert_eq!(found.page, 2);
        assert_eq!(found.text, "World");
        assert_eq!(found.glyphs, vec![6, 7, 8, 9, 10]);
        assert_eq!(found.rects.len(), 1);
        // "Hello " is 30.672pt wide at 12pt Helvetica
        assert!((found.rects[0].x0 - (72.0 + 30.672)).abs() < 0.01);
    }

    #[test]
    fn test_case_sensitivity() {
        let doc = load_bytes(&build_pdf(&["Apple apple APPLE"])).unwrap();
        assert_eq!(find_text(&doc, &[1], "apple", false).unwrap().len(), 1);

        let texts: Vec<String> = find_text(&doc, &[1], "apple", true)
            .unwrap()
            .into_iter()
            .map(|m| m.text)
            .collect();
        assert_eq!(texts, vec!["Apple", "apple", "APPLE"]);
    }

    #[test]
    fn test_matches_do_not_overlap() {
        let doc = load_bytes(&build_pdf(&["aaaa"])).unwrap();
        assert_eq!(find_text(&doc, &[1], "aa", false).unwrap().len(), 2);
        assert!(find_text(&doc, &[1], "", false).unwrap().is_empty());
    }

    #[test]
    fn test_separate_show_operations_are_joined() {
        let bytes = build_pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("Hello")]),
            // a gap wider than a quarter em reads as a space
            Operation::new("Td", vec![40.into(), 0.into()]),
            Operation::new("Tj", vec![Object::string_literal("there")]),
            // a new baseline reads as a line break
            Operation::new("Td", vec![0.into(), (-20).into()]),
            Operation::new("Tj", vec![Object::string_literal("friend")]),
            Operation::new("ET", vec![]),
        ]]);
        let doc = load_bytes(&bytes).unwrap();
        assert_eq!(find_text(&doc, &[1], "Hello there", false).unwrap().len(), 1);
        assert!(find_text(&doc, &[1], "there friend", false).unwrap().is_empty());
        assert_eq!(find_text(&doc, &[1], "there\nfriend", false).unwrap().len(), 1);
    }

    #[test]
    fn test_multiline_match_has_rect_per_line() {
        let bytes = build_pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("Tj", vec![Object::string_literal("ab")]),
            Operation::new("Td", vec![0.into(), (-20).into()]),
            Operation::new("Tj", vec![Object::string_literal("cd")]),
            Operation::new("ET", vec![]),
        ]]);
        let doc = load_bytes(&bytes).unwrap();
        let matches = find_text(&doc, &[1], "b\nc", false).unwrap();
        assert_eq!(matches[0].rects.len(), 2);
    }
}
