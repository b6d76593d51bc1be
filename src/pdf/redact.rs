//! Removing glyphs from content streams.
//!
//! A removed glyph is replaced by a `TJ` adjustment of the same advance, so
//! that the glyphs after it stay where they were.

use crate::error::EditResult;
use crate::pdf::document::page_object_id;
use crate::pdf::geometry::{Color, Rect};
use crate::pdf::layout::{page_layout, Glyph, PageLayout};
use crate::pdf::overlay::{append_operations, fill_rect_operations, replace_content};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, StringFormat};
use std::collections::{BTreeMap, BTreeSet};

/// Glyphs to drop, keyed by (op, element) and then by byte offset
type Removals<'a> = BTreeMap<(usize, usize), BTreeMap<usize, &'a Glyph>>;

fn push_adjustment(items: &mut Vec<Object>, amount: f32) {
    if let Some(Object::Real(previous)) = items.last_mut() {
        *previous += amount;
        return;
    }
    items.push(Object::Real(amount));
}

/// Rewrite one shown string with the removed codes turned into adjustments
fn rewrite_string(
    bytes: &[u8],
    format: StringFormat,
    removed: Option<&BTreeMap<usize, &Glyph>>,
    items: &mut Vec<Object>,
) {
    let Some(removed) = removed else {
        items.push(Object::String(bytes.to_vec(), format));
        return;
    };

    let mut kept = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        match removed.get(&offset) {
            Some(glyph) => {
                if !kept.is_empty() {
                    items.push(Object::String(std::mem::take(&mut kept), format));
                }
                push_adjustment(items, glyph.kerning);
                offset = glyph.bytes.end.max(offset + 1);
            }
            None => {
                kept.push(bytes[offset]);
                offset += 1;
            }
        }
    }
    if !kept.is_empty() {
        items.push(Object::String(kept, format));
    }
}

fn string_operand(op: &Operation, index: usize) -> Option<(&[u8], StringFormat)> {
    match op.operands.get(index) {
        Some(Object::String(bytes, format)) => Some((bytes, *format)),
        _ => None,
    }
}

/// The operations that replace `op` once its removed glyphs are gone
fn rewrite_operation(index: usize, op: &Operation, removals: &Removals) -> Vec<Operation> {
    let mut items = Vec::new();
    let removed_in = |element: usize| removals.get(&(index, element));

    match op.operator.as_str() {
        "TJ" => {
            let Some(Object::Array(elements)) = op.operands.first() else {
                return vec![op.clone()];
            };
            for (element, item) in elements.iter().enumerate() {
                match item {
                    Object::String(bytes, format) => {
                        rewrite_string(bytes, *format, removed_in(element), &mut items)
                    }
                    other => items.push(other.clone()),
                }
            }
            vec![Operation::new("TJ", vec![Object::Array(items)])]
        }
        "Tj" | "'" | "\"" => {
            let element = if op.operator == "\"" { 2 } else { 0 };
            let Some((bytes, format)) = string_operand(op, element) else {
                return vec![op.clone()];
            };
            rewrite_string(bytes, format, removed_in(element), &mut items);

            let mut replacement = Vec::new();
            if op.operator == "\"" {
                replacement.push(Operation::new("Tw", vec![op.operands[0].clone()]));
                replacement.push(Operation::new("Tc", vec![op.operands[1].clone()]));
            }
            if op.operator != "Tj" {
                replacement.push(Operation::new("T*", vec![]));
            }
            replacement.push(Operation::new("TJ", vec![Object::Array(items)]));
            replacement
        }
        _ => vec![op.clone()],
    }
}

/// Rebuild a page's content without the given glyphs.
pub fn remove_glyphs(
    doc: &mut Document,
    page_id: ObjectId,
    layout: &PageLayout,
    glyphs: &BTreeSet<usize>,
) -> EditResult<usize> {
    let mut removals: Removals = BTreeMap::new();
    for &index in glyphs {
        if let Some(glyph) = layout.glyphs.get(index) {
            removals
                .entry((glyph.op, glyph.element))
                .or_default()
                .insert(glyph.bytes.start, glyph);
        }
    }
    if removals.is_empty() {
        return Ok(0);
    }

    let touched: BTreeSet<usize> = removals.keys().map(|&(op, _)| op).collect();
    let mut operations = Vec::with_capacity(layout.content.operations.len());
    for (index, op) in layout.content.operations.iter().enumerate() {
        if touched.contains(&index) {
            operations.extend(rewrite_operation(index, op, &removals));
        } else {
            operations.push(op.clone());
        }
    }

    let content = Content { operations }.encode()?;
    replace_content(doc, page_id, content)?;
    Ok(removals.values().map(BTreeMap::len).sum())
}

/// Remove every glyph whose centre lies inside `rect`, then paint the area
/// white. Returns the number of glyphs removed.
pub fn redact_area(doc: &mut Document, page: u32, rect: &Rect) -> EditResult<usize> {
    let page_id = page_object_id(doc, page)?;
    let layout = page_layout(doc, page_id)?;
    let inside: BTreeSet<usize> = layout
        .glyphs
        .iter()
        .enumerate()
        .filter(|(_, glyph)| rect.contains(glyph.center()))
        .map(|(index, _)| index)
        .collect();

    let removed = remove_glyphs(doc, page_id, &layout, &inside)?;
    append_operations(doc, page_id, fill_rect_operations(rect, Color::WHITE))?;
    tracing::debug!(page, removed, "redacted area");
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::{load_bytes, to_bytes};
    use crate::pdf::search::find_text;
    use crate::pdf::testing::{build_pdf, build_pdf_from_operations, page_strings};
    use pretty_assertions::assert_eq;

    fn origins(doc: &Document, needle: &str) -> Vec<(f32, f32)> {
        find_text(doc, &[1], needle, false)
            .unwrap()
            .iter()
            .map(|m| m.origin)
            .collect()
    }

    #[test]
    fn test_redaction_removes_text_and_keeps_neighbours() {
        let mut doc = load_bytes(&build_pdf(&["public SECRET public"])).unwrap();
        let secret = find_text(&doc, &[1], "SECRET", false).unwrap()[0].clone();
        let before = origins(&doc, "public");

        let removed = redact_area(&mut doc, 1, &secret.bounds().unwrap()).unwrap();
        assert_eq!(removed, 6);

        let bytes = to_bytes(&mut doc).unwrap();
        assert_eq!(page_strings(&bytes), vec!["public  public"]);

        let doc = load_bytes(&bytes).unwrap();
        assert!(find_text(&doc, &[1], "SECRET", false).unwrap().is_empty());
        let after = origins(&doc, "public");
        assert_eq!(after.len(), 2);
        assert!((after[1].0 - before[1].0).abs() < 0.01);
    }

    #[test]
    fn test_redaction_of_empty_area_only_paints() {
        let mut doc = load_bytes(&build_pdf(&["text"])).unwrap();
        let removed = redact_area(&mut doc, 1, &Rect::new(0.0, 0.0, 10.0, 10.0)).unwrap();
        assert_eq!(removed, 0);
        let bytes = to_bytes(&mut doc).unwrap();
        assert_eq!(page_strings(&bytes), vec!["text"]);
    }

    #[test]
    fn test_quote_operators_are_rewritten() {
        let bytes = build_pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 700.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new(
                "\"",
                vec![1.into(), 0.into(), Object::string_literal("keep drop keep")],
            ),
            Operation::new("ET", vec![]),
        ]]);
        let mut doc = load_bytes(&bytes).unwrap();
        let before = origins(&doc, "keep");
        let drop = find_text(&doc, &[1], "drop", false).unwrap()[0].clone();

        redact_area(&mut doc, 1, &drop.bounds().unwrap()).unwrap();
        let doc = load_bytes(&to_bytes(&mut doc).unwrap()).unwrap();
        assert!(find_text(&doc, &[1], "drop", false).unwrap().is_empty());

        let after = origins(&doc, "keep");
        assert_eq!(after.len(), 2);
        for (a, b) in before.iter().zip(&after) {
            assert!((a.0 - b.0).abs() < 0.01 && (a.1 - b.1).abs() < 0.01);
        }
    }
}
