//! Drawing on top of existing page content.

use crate::error::EditResult;
use crate::pdf::document::{inherited_attribute, media_box, page_object_id, resolve};
use crate::pdf::fonts::{encode_win_ansi, helvetica_text_width};
use crate::pdf::geometry::{Color, Rect};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream, StringFormat};

/// Resource name under which the overlay font is registered on a page
pub const OVERLAY_FONT: &str = "PdfEditHelv";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkStyle {
    pub font_size: f32,
    pub color: Color,
}

impl Default for WatermarkStyle {
    fn default() -> Self {
        WatermarkStyle {
            font_size: 12.0,
            color: Color::gray(0.7),
        }
    }
}

fn color_operation(operator: &str, color: Color) -> Operation {
    Operation::new(
        operator,
        color.components().into_iter().map(Object::Real).collect(),
    )
}

fn encode(operations: Vec<Operation>) -> EditResult<Vec<u8>> {
    Ok(Content { operations }.encode()?)
}

/// Replace the page's content with a single new stream.
pub fn replace_content(doc: &mut Document, page_id: ObjectId, content: Vec<u8>) -> EditResult<()> {
    let stream_id = doc.add_object(Stream::new(Dictionary::new(), content));
    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Reference(stream_id));
    Ok(())
}

/// Append operations to a page, isolated from the graphics state that the
/// existing content leaves behind.
pub fn append_operations(
    doc: &mut Document,
    page_id: ObjectId,
    operations: Vec<Operation>,
) -> EditResult<()> {
    let existing: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id)? {
            Object::Array(items) => items.clone(),
            _ => vec![Object::Reference(*id)],
        },
        Ok(Object::Array(items)) => items.clone(),
        _ => Vec::new(),
    };

    let mut overlay = Vec::with_capacity(operations.len() + 3);
    if !existing.is_empty() {
        overlay.push(Operation::new("Q", vec![]));
    }
    overlay.push(Operation::new("q", vec![]));
    overlay.extend(operations);
    overlay.push(Operation::new("Q", vec![]));

    // streams are concatenated, so start on a fresh token
    let mut bytes = b"\n".to_vec();
    bytes.extend(encode(overlay)?);
    let overlay_id = doc.add_object(Stream::new(Dictionary::new(), bytes));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    if !existing.is_empty() {
        let save_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        contents.push(Object::Reference(save_id));
        contents.extend(existing);
    }
    contents.push(Object::Reference(overlay_id));

    doc.get_dictionary_mut(page_id)?
        .set("Contents", Object::Array(contents));
    Ok(())
}

/// Make the overlay font available to the page, copying inherited
/// resources onto the page itself.
pub fn ensure_font(doc: &mut Document, page_id: ObjectId) -> EditResult<()> {
    let mut resources = inherited_attribute(doc, page_id, b"Resources")
        .and_then(|obj| resolve(doc, &obj).as_dict().ok().cloned())
        .unwrap_or_default();
    let mut fonts = resources
        .get(b"Font")
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok().cloned())
        .unwrap_or_default();
    if fonts.has(OVERLAY_FONT.as_bytes()) {
        return Ok(());
    }

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
        ("Encoding", Object::Name(b"WinAnsiEncoding".to_vec())),
    ]));
    fonts.set(OVERLAY_FONT, Object::Reference(font_id));
    resources.set("Font", Object::Dictionary(fonts));
    doc.get_dictionary_mut(page_id)?
        .set("Resources", Object::Dictionary(resources));
    Ok(())
}

pub fn text_operations(origin: (f32, f32), text: &str, font_size: f32, color: Color) -> Vec<Operation> {
    vec![
        Operation::new("BT", vec![]),
        Operation::new(
            "Tf",
            vec![OVERLAY_FONT.into(), Object::Real(font_size)],
        ),
        color_operation("rg", color),
        Operation::new(
            "Tm",
            vec![
                1.into(),
                0.into(),
                0.into(),
                1.into(),
                Object::Real(origin.0),
                Object::Real(origin.1),
            ],
        ),
        Operation::new(
            "Tj",
            vec![Object::String(encode_win_ansi(text), StringFormat::Literal)],
        ),
        Operation::new("ET", vec![]),
    ]
}

pub fn fill_rect_operations(rect: &Rect, color: Color) -> Vec<Operation> {
    vec![
        color_operation("rg", color),
        Operation::new(
            "re",
            vec![
                Object::Real(rect.x0),
                Object::Real(rect.y0),
                Object::Real(rect.width()),
                Object::Real(rect.height()),
            ],
        ),
        Operation::new("f", vec![]),
    ]
}

/// Paint a filled rectangle over the page
pub fn fill_rect(doc: &mut Document, page: u32, rect: &Rect, color: Color) -> EditResult<()> {
    let page_id = page_object_id(doc, page)?;
    append_operations(doc, page_id, fill_rect_operations(rect, color))
}

/// Write a line of Helvetica text with its baseline starting at `origin`
pub fn insert_text(
    doc: &mut Document,
    page: u32,
    origin: (f32, f32),
    text: &str,
    font_size: f32,
    color: Color,
) -> EditResult<()> {
    let page_id = page_object_id(doc, page)?;
    ensure_font(doc, page_id)?;
    append_operations(doc, page_id, text_operations(origin, text, font_size, color))
}

/// Where a watermark line goes: centred, in the band 20 to 50 points
/// above the bottom of the page.
pub fn watermark_origin(media: &Rect, text: &str, font_size: f32) -> (f32, f32) {
    let width = helvetica_text_width(text, font_size);
    let x = media.x0 + (media.width() - width) / 2.0;
    let y = media.y0 + 50.0 - font_size;
    (x, y.max(media.y0 + 20.0))
}

pub fn add_watermark(
    doc: &mut Document,
    text: &str,
    pages: &[u32],
    style: &WatermarkStyle,
) -> EditResult<()> {
    for &page in pages {
        let page_id = page_object_id(doc, page)?;
        let origin = watermark_origin(&media_box(doc, page_id), text, style.font_size);
        ensure_font(doc, page_id)?;
        append_operations(
            doc,
            page_id,
            text_operations(origin, text, style.font_size, style.color),
        )?;
    }
    tracing::debug!(pages = pages.len(), "watermarked pages");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::{load_bytes, to_bytes};
    use crate::pdf::search::find_text;
    use crate::pdf::testing::{build_pdf, page_strings};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_insert_text_is_findable() {
        let mut doc = load_bytes(&build_pdf(&["original"])).unwrap();
        insert_text(&mut doc, 1, (100.0, 300.0), "Added (note)", 14.0, Color::BLACK).unwrap();

        let doc = load_bytes(&to_bytes(&mut doc).unwrap()).unwrap();
        let matches = find_text(&doc, &[1], "Added (note)", false).unwrap();
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].origin, (100.0, 300.0));
        assert!((matches[0].font_size - 14.0).abs() < 1e-4);
        // existing text is untouched
        assert_eq!(find_text(&doc, &[1], "original", false).unwrap().len(), 1);
    }

    #[test]
    fn test_overlay_keeps_inherited_resources() {
        let mut doc = load_bytes(&build_pdf(&["a"])).unwrap();
        insert_text(&mut doc, 1, (10.0, 10.0), "b", 12.0, Color::BLACK).unwrap();
        let page_id = page_object_id(&doc, 1).unwrap();
        let resources = doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"Resources")
            .unwrap()
            .as_dict()
            .unwrap();
        let fonts = resources.get(b"Font").unwrap().as_dict().unwrap();
        assert!(fonts.has(b"F1"));
        assert!(fonts.has(OVERLAY_FONT.as_bytes()));
    }

    #[test]
    fn test_watermark_selected_pages_only() {
        let mut doc = load_bytes(&build_pdf(&["one", "two", "three"])).unwrap();
        add_watermark(&mut doc, "DRAFT", &[1, 3], &WatermarkStyle::default()).unwrap();
        let bytes = to_bytes(&mut doc).unwrap();
        assert_eq!(
            page_strings(&bytes),
            vec!["oneDRAFT", "two", "threeDRAFT"]
        );

        let doc = load_bytes(&bytes).unwrap();
        let mark = &find_text(&doc, &[1], "DRAFT", false).unwrap()[0];
        assert!(mark.origin.1 >= 20.0 && mark.origin.1 <= 50.0);
        let center = mark.bounds().unwrap().center().0;
        assert!((center - 306.0).abs() < 0.5);
    }

    #[test]
    fn test_fill_rect_appends_after_content() {
        let mut doc = load_bytes(&build_pdf(&["a"])).unwrap();
        fill_rect(&mut doc, 1, &Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE).unwrap();
        let page_id = page_object_id(&doc, 1).unwrap();
        let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
        let operators: Vec<&str> = content
            .operations
            .iter()
            .map(|op| op.operator.as_str())
            .collect();
        assert_eq!(operators.first(), Some(&"q"));
        assert_eq!(
            &operators[operators.len() - 6..],
            &["Q", "q", "rg", "re", "f", "Q"]
        );
    }
}
