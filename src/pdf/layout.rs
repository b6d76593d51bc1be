//! Glyph positions from a page's content stream.
//!
//! The interpreter understands enough of the graphics and text state to
//! place every shown character code on the page. It does not render and it
//! does not enter form XObjects.

use crate::error::EditResult;
use crate::pdf::document::{inherited_attribute, number, resolve};
use crate::pdf::fonts::{page_fonts, FontMetrics};
use crate::pdf::geometry::{Matrix, Rect};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::ops::Range;

/// Descent and ascent of the glyph box, as fractions of the font size
const GLYPH_DESCENT: f32 = -0.2;
const GLYPH_ASCENT: f32 = 0.8;

/// One character code shown by a text operator
#[derive(Debug, Clone, PartialEq)]
pub struct Glyph {
    /// Index of the showing operation in the decoded content
    pub op: usize,
    /// Index of the string operand (or `TJ` array element) holding the code
    pub element: usize,
    /// Byte range of the code within that string
    pub bytes: Range<usize>,
    pub text: String,
    pub rect: Rect,
    /// Baseline origin in user space
    pub origin: (f32, f32),
    /// Font size after the text and graphics transforms
    pub font_size: f32,
    /// `TJ` adjustment that moves the pen exactly as showing this glyph does
    pub kerning: f32,
}

impl Glyph {
    pub fn center(&self) -> (f32, f32) {
        self.rect.center()
    }
}

#[derive(Debug, Clone)]
pub struct PageLayout {
    pub content: Content,
    pub glyphs: Vec<Glyph>,
}

pub fn page_layout(doc: &Document, page_id: ObjectId) -> EditResult<PageLayout> {
    let content = Content::decode(&doc.get_page_content(page_id)?)?;
    let resources = inherited_attribute(doc, page_id, b"Resources");
    let resources = resources
        .as_ref()
        .and_then(|obj| resolve(doc, obj).as_dict().ok());
    let fonts = page_fonts(doc, resources);

    let fallback = FontMetrics::default();
    let glyphs = Interpreter::new(&fonts, &fallback).run(&content.operations);
    Ok(PageLayout { content, glyphs })
}

#[derive(Debug, Clone)]
struct TextState {
    font: Option<Vec<u8>>,
    size: f32,
    char_spacing: f32,
    word_spacing: f32,
    horizontal_scale: f32,
    leading: f32,
    rise: f32,
}

impl Default for TextState {
    fn default() -> Self {
        TextState {
            font: None,
            size: 0.0,
            char_spacing: 0.0,
            word_spacing: 0.0,
            horizontal_scale: 1.0,
            leading: 0.0,
            rise: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

struct Interpreter<'a> {
    fonts: &'a BTreeMap<Vec<u8>, FontMetrics>,
    fallback: &'a FontMetrics,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    glyphs: Vec<Glyph>,
}

fn operand(op: &Operation, index: usize) -> f32 {
    op.operands.get(index).and_then(number).unwrap_or(0.0)
}

fn matrix_operands(op: &Operation) -> Matrix {
    Matrix::new(
        operand(op, 0),
        operand(op, 1),
        operand(op, 2),
        operand(op, 3),
        operand(op, 4),
        operand(op, 5),
    )
}

impl<'a> Interpreter<'a> {
    fn new(fonts: &'a BTreeMap<Vec<u8>, FontMetrics>, fallback: &'a FontMetrics) -> Self {
        Interpreter {
            fonts,
            fallback,
            state: GraphicsState {
                ctm: Matrix::IDENTITY,
                text: TextState::default(),
            },
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            glyphs: Vec::new(),
        }
    }

    fn run(mut self, operations: &[Operation]) -> Vec<Glyph> {
        for (index, op) in operations.iter().enumerate() {
            self.step(index, op);
        }
        self.glyphs
    }

    fn step(&mut self, index: usize, op: &Operation) {
        match op.operator.as_str() {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(state) = self.stack.pop() {
                    self.state = state;
                }
            }
            "cm" => self.state.ctm = matrix_operands(op).then(&self.state.ctm),
            "BT" => {
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "Tf" => {
                self.state.text.font = op
                    .operands
                    .first()
                    .and_then(|o| o.as_name().ok())
                    .map(<[u8]>::to_vec);
                self.state.text.size = operand(op, 1);
            }
            "Tc" => self.state.text.char_spacing = operand(op, 0),
            "Tw" => self.state.text.word_spacing = operand(op, 0),
            "Tz" => self.state.text.horizontal_scale = operand(op, 0) / 100.0,
            "TL" => self.state.text.leading = operand(op, 0),
            "Ts" => self.state.text.rise = operand(op, 0),
            "Td" => self.move_line(operand(op, 0), operand(op, 1)),
            "TD" => {
                self.state.text.leading = -operand(op, 1);
                self.move_line(operand(op, 0), operand(op, 1));
            }
            "Tm" => {
                self.tm = matrix_operands(op);
                self.tlm = self.tm;
            }
            "T*" => self.next_line(),
            "Tj" => self.show_operand(index, op, 0),
            "'" => {
                self.next_line();
                self.show_operand(index, op, 0);
            }
            "\"" => {
                self.state.text.word_spacing = operand(op, 0);
                self.state.text.char_spacing = operand(op, 1);
                self.next_line();
                self.show_operand(index, op, 2);
            }
            "TJ" => {
                let Some(Object::Array(items)) = op.operands.first() else {
                    return;
                };
                for (element, item) in items.iter().enumerate() {
                    match item {
                        Object::String(bytes, _) => self.show(index, element, bytes),
                        other => {
                            if let Some(adjust) = number(other) {
                                let text = &self.state.text;
                                let tx = -adjust / 1000.0 * text.size * text.horizontal_scale;
                                self.tm = Matrix::translate(tx, 0.0).then(&self.tm);
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn show_operand(&mut self, index: usize, op: &Operation, element: usize) {
        if let Some(Object::String(bytes, _)) = op.operands.get(element) {
            self.show(index, element, bytes);
        }
    }

    fn show(&mut self, index: usize, element: usize, bytes: &[u8]) {
        let text = self.state.text.clone();
        let fonts = self.fonts;
        let font = text
            .font
            .as_ref()
            .and_then(|name| fonts.get(name))
            .unwrap_or(self.fallback);

        let size = text.size;
        let scale = text.horizontal_scale;
        let font_matrix = Matrix::new(size * scale, 0.0, 0.0, size, 0.0, text.rise);

        for (code, range) in font.codes(bytes) {
            let w0 = font.width(code) / 1000.0;
            let trm = font_matrix.then(&self.tm).then(&self.state.ctm);
            let corners = [
                trm.apply(0.0, GLYPH_DESCENT),
                trm.apply(w0, GLYPH_DESCENT),
                trm.apply(w0, GLYPH_ASCENT),
                trm.apply(0.0, GLYPH_ASCENT),
            ];

            let spacing = text.char_spacing
                + if !font.two_byte && code == 32 {
                    text.word_spacing
                } else {
                    0.0
                };
            let kerning = if size != 0.0 {
                -(w0 * 1000.0 + spacing * 1000.0 / size)
            } else {
                0.0
            };

            self.glyphs.push(Glyph {
                op: index,
                element,
                bytes: range,
                text: font.decode(code),
                rect: Rect::bounding(&corners),
                origin: trm.apply(0.0, 0.0),
                font_size: trm.vertical_scale(),
                kerning,
            });

            let tx = (w0 * size + spacing) * scale;
            self.tm = Matrix::translate(tx, 0.0).then(&self.tm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::document::{load_bytes, page_object_id};
    use crate::pdf::testing::{build_pdf, build_pdf_from_operations};

    fn layout_of(bytes: &[u8]) -> PageLayout {
        let doc = load_bytes(bytes).unwrap();
        let page_id = page_object_id(&doc, 1).unwrap();
        page_layout(&doc, page_id).unwrap()
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.01
    }

    #[test]
    fn test_glyph_positions_follow_widths() {
        let layout = layout_of(&build_pdf(&["AV"]));
        assert_eq!(layout.glyphs.len(), 2);

        let a = &layout.glyphs[0];
        assert_eq!(a.text, "A");
        assert_eq!(a.origin, (72.0, 700.0));
        assert!(close(a.rect.width(), 0.667 * 12.0));
        assert!(close(a.rect.y0, 700.0 - 2.4));
        assert!(close(a.font_size, 12.0));

        let v = &layout.glyphs[1];
        assert!(close(v.origin.0, 72.0 + 0.667 * 12.0));
        assert_eq!(v.bytes, 1..2);
    }

    #[test]
    fn test_tj_adjustments_and_transforms() {
        let bytes = build_pdf_from_operations(vec![vec![
            Operation::new("q", vec![]),
            Operation::new("cm", vec![2.into(), 0.into(), 0.into(), 2.into(), 10.into(), 0.into()]),
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 10.into()]),
            Operation::new("Td", vec![0.into(), 100.into()]),
            Operation::new(
                "TJ",
                vec![Object::Array(vec![
                    Object::string_literal("a"),
                    Object::Integer(-1000),
                    Object::string_literal("b"),
                ])],
            ),
            Operation::new("ET", vec![]),
            Operation::new("Q", vec![]),
        ]]);
        let layout = layout_of(&bytes);
        let b = &layout.glyphs[1];
        assert_eq!(b.element, 2);
        // 'a' is 5.56 wide, the adjustment moves 10 more; all scaled by 2
        assert!(close(b.origin.0, 10.0 + 2.0 * (5.56 + 10.0)));
        assert!(close(b.origin.1, 200.0));
        assert!(close(b.font_size, 20.0));
    }

    #[test]
    fn test_next_line_operators() {
        let bytes = build_pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("TL", vec![14.into()]),
            Operation::new("Td", vec![50.into(), 500.into()]),
            Operation::new("Tj", vec![Object::string_literal("x")]),
            Operation::new("'", vec![Object::string_literal("y")]),
            Operation::new("ET", vec![]),
        ]]);
        let layout = layout_of(&bytes);
        assert_eq!(layout.glyphs[1].origin, (50.0, 486.0));
        assert_eq!(layout.glyphs[1].op, 5);
    }

    #[test]
    fn test_kerning_replaces_advance() {
        let bytes = build_pdf_from_operations(vec![vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Tc", vec![1.into()]),
            Operation::new("Td", vec![0.into(), 0.into()]),
            Operation::new("Tj", vec![Object::string_literal("ab")]),
            Operation::new("ET", vec![]),
        ]]);
        let layout = layout_of(&bytes);
        let a = &layout.glyphs[0];
        let b = &layout.glyphs[1];
        let advance = -a.kerning / 1000.0 * 12.0;
        assert!(close(b.origin.0 - a.origin.0, advance));
    }
}
