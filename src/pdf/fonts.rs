//! Font metrics and code-to-text decoding for the layout interpreter.

use crate::pdf::document::{dictionary_entry, number, resolve};
use lopdf::{Dictionary, Document, Object};
use std::collections::BTreeMap;

/// Helvetica advance widths (thousandths of an em) for codes 32..=126
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, //
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, //
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, //
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, //
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, //
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// WinAnsiEncoding glyphs in 0x80..=0x9F, where it departs from Latin-1.
/// 0x81, 0x8D, 0x8F, 0x90 and 0x9D are unassigned.
const WIN_ANSI_HIGH: [(u8, char); 27] = [
    (0x80, '\u{20AC}'),
    (0x82, '\u{201A}'),
    (0x83, '\u{0192}'),
    (0x84, '\u{201E}'),
    (0x85, '\u{2026}'),
    (0x86, '\u{2020}'),
    (0x87, '\u{2021}'),
    (0x88, '\u{02C6}'),
    (0x89, '\u{2030}'),
    (0x8A, '\u{0160}'),
    (0x8B, '\u{2039}'),
    (0x8C, '\u{0152}'),
    (0x8E, '\u{017D}'),
    (0x91, '\u{2018}'),
    (0x92, '\u{2019}'),
    (0x93, '\u{201C}'),
    (0x94, '\u{201D}'),
    (0x95, '\u{2022}'),
    (0x96, '\u{2013}'),
    (0x97, '\u{2014}'),
    (0x98, '\u{02DC}'),
    (0x99, '\u{2122}'),
    (0x9A, '\u{0161}'),
    (0x9B, '\u{203A}'),
    (0x9C, '\u{0153}'),
    (0x9E, '\u{017E}'),
    (0x9F, '\u{0178}'),
];

pub fn helvetica_width(code: u8) -> f32 {
    match code {
        32..=126 => f32::from(HELVETICA_WIDTHS[usize::from(code - 32)]),
        0x82 | 0x91 | 0x92 => 222.0,
        0x84 | 0x88 | 0x8B | 0x93 | 0x94 | 0x98 | 0x9B => 333.0,
        0x95 => 350.0,
        0x85 | 0x89 | 0x97 | 0x99 | 0x8C => 1000.0,
        0x9C => 944.0,
        _ => 556.0,
    }
}

/// The character a WinAnsi code stands for
pub fn win_ansi_char(code: u8) -> Option<char> {
    match code {
        0x80..=0x9F => WIN_ANSI_HIGH
            .iter()
            .find(|&&(c, _)| c == code)
            .map(|&(_, ch)| ch),
        _ => Some(char::from(code)),
    }
}

fn win_ansi_code(c: char) -> Option<u8> {
    match u32::from(c) {
        0x80..=0x9F => None,
        0..=0xFF => u8::try_from(u32::from(c)).ok(),
        _ => WIN_ANSI_HIGH
            .iter()
            .find(|&&(_, ch)| ch == c)
            .map(|&(code, _)| code),
    }
}

/// Width of `text` set in Helvetica at `font_size`, in points
pub fn helvetica_text_width(text: &str, font_size: f32) -> f32 {
    encode_win_ansi(text)
        .iter()
        .map(|&b| helvetica_width(b))
        .sum::<f32>()
        * font_size
        / 1000.0
}

/// Encode text for a simple font using WinAnsi, replacing what it cannot hold.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| win_ansi_code(c).unwrap_or(b'?'))
        .collect()
}

/// What the interpreter needs from a font: code width and code meaning
#[derive(Debug, Clone, Default)]
pub struct FontMetrics {
    /// Type0 fonts use two-byte codes
    pub two_byte: bool,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: BTreeMap<u32, f32>,
    default_width: f32,
    fixed_width: Option<f32>,
    to_unicode: BTreeMap<u32, String>,
}

impl FontMetrics {
    pub fn from_dict(doc: &Document, dict: &Dictionary) -> Self {
        let subtype = dict.get(b"Subtype").and_then(Object::as_name).unwrap_or(b"");
        let base_font = dict
            .get(b"BaseFont")
            .and_then(Object::as_name)
            .map(|name| String::from_utf8_lossy(name).into_owned())
            .unwrap_or_default();

        let mut metrics = FontMetrics {
            default_width: 500.0,
            to_unicode: to_unicode_map(doc, dict),
            ..Default::default()
        };

        if subtype == b"Type0" {
            metrics.two_byte = true;
            metrics.default_width = 1000.0;
            let descendant = dict
                .get(b"DescendantFonts")
                .ok()
                .and_then(|o| resolve(doc, o).as_array().ok())
                .and_then(|arr| arr.first())
                .and_then(|o| resolve(doc, o).as_dict().ok());
            if let Some(cid_font) = descendant {
                if let Some(dw) = cid_font.get(b"DW").ok().and_then(|o| number(resolve(doc, o))) {
                    metrics.default_width = dw;
                }
                if let Ok(w) = cid_font.get(b"W") {
                    metrics.cid_widths = parse_cid_widths(doc, resolve(doc, w));
                }
            }
            return metrics;
        }

        metrics.first_char = dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| resolve(doc, o).as_i64().ok())
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(0);
        metrics.widths = dict
            .get(b"Widths")
            .ok()
            .and_then(|o| resolve(doc, o).as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|o| number(resolve(doc, o)).unwrap_or(0.0))
                    .collect()
            })
            .unwrap_or_default();

        if metrics.widths.is_empty() && base_font.starts_with("Courier") {
            metrics.fixed_width = Some(600.0);
        }
        metrics
    }

    /// Advance width in thousandths of an em
    pub fn width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        if let Some(width) = self.fixed_width {
            return width;
        }
        if let Some(index) = code.checked_sub(self.first_char) {
            if let Some(&width) = self.widths.get(index as usize) {
                return width;
            }
        }
        if self.widths.is_empty() {
            // standard 14 fonts without a Widths array
            return u8::try_from(code).map(helvetica_width).unwrap_or(self.default_width);
        }
        self.default_width
    }

    pub fn decode(&self, code: u32) -> String {
        if let Some(text) = self.to_unicode.get(&code) {
            return text.clone();
        }
        if self.two_byte {
            return String::new();
        }
        u8::try_from(code)
            .ok()
            .and_then(win_ansi_char)
            .map(String::from)
            .unwrap_or_default()
    }

    /// Split a shown string into character codes with their byte offsets
    pub fn codes(&self, bytes: &[u8]) -> Vec<(u32, std::ops::Range<usize>)> {
        let step = if self.two_byte { 2 } else { 1 };
        bytes
            .chunks(step)
            .enumerate()
            .map(|(i, chunk)| {
                let code = chunk.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b));
                (code, i * step..i * step + chunk.len())
            })
            .collect()
    }
}

/// Fonts available to a page, keyed by resource name
pub fn page_fonts(doc: &Document, resources: Option<&Dictionary>) -> BTreeMap<Vec<u8>, FontMetrics> {
    let mut fonts = BTreeMap::new();
    let Some(font_dict) = resources.and_then(|r| dictionary_entry(doc, r, b"Font")) else {
        return fonts;
    };
    for (name, obj) in font_dict.iter() {
        if let Ok(dict) = resolve(doc, obj).as_dict() {
            fonts.insert(name.clone(), FontMetrics::from_dict(doc, dict));
        }
    }
    fonts
}

/// `W` array: `c [w1 w2 ...]` or `cfirst clast w`
fn parse_cid_widths(doc: &Document, w: &Object) -> BTreeMap<u32, f32> {
    let mut widths = BTreeMap::new();
    let Ok(items) = w.as_array() else {
        return widths;
    };

    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve(doc, &items[i])) else {
            break;
        };
        let first = first as u32;
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(list)) => {
                for (offset, width) in list.iter().enumerate() {
                    if let Some(width) = number(resolve(doc, width)) {
                        widths.insert(first + offset as u32, width);
                    }
                }
                i += 2;
            }
            Some(last) => {
                let last = number(last).unwrap_or(first as f32) as u32;
                let width = items
                    .get(i + 2)
                    .and_then(|o| number(resolve(doc, o)))
                    .unwrap_or(1000.0);
                for code in first..=last {
                    widths.insert(code, width);
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

fn to_unicode_map(doc: &Document, font: &Dictionary) -> BTreeMap<u32, String> {
    let content = font
        .get(b"ToUnicode")
        .ok()
        .and_then(|o| resolve(doc, o).as_stream().ok())
        .and_then(|stream| {
            stream
                .decompressed_content()
                .ok()
                .or_else(|| Some(stream.content.clone()))
        });
    match content {
        Some(bytes) => parse_cmap(&String::from_utf8_lossy(&bytes)),
        None => BTreeMap::new(),
    }
}

#[derive(Debug, PartialEq)]
enum CmapToken {
    Hex(Vec<u8>),
    Open,
    Close,
    Word(String),
}

fn cmap_tokens(s: &str) -> Vec<CmapToken> {
    let mut tokens = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut digits = String::new();
                for d in chars.by_ref() {
                    if d == '>' {
                        break;
                    }
                    if d.is_ascii_hexdigit() {
                        digits.push(d);
                    }
                }
                if digits.len() % 2 == 1 {
                    digits.push('0');
                }
                let bytes = (0..digits.len())
                    .step_by(2)
                    .filter_map(|i| u8::from_str_radix(&digits[i..i + 2], 16).ok())
                    .collect();
                tokens.push(CmapToken::Hex(bytes));
            }
            '[' => tokens.push(CmapToken::Open),
            ']' => tokens.push(CmapToken::Close),
            c if c.is_whitespace() => {}
            c => {
                let mut word = String::from(c);
                while let Some(&next) = chars.peek() {
                    if next.is_whitespace() || matches!(next, '<' | '[' | ']') {
                        break;
                    }
                    word.push(next);
                    chars.next();
                }
                tokens.push(CmapToken::Word(word));
            }
        }
    }
    tokens
}

fn code_of(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
}

fn utf16_text(bytes: &[u8]) -> String {
    let units: Vec<u16> = bytes
        .chunks(2)
        .map(|c| match c {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [lo] => u16::from(*lo),
            _ => 0,
        })
        .collect();
    String::from_utf16_lossy(&units)
}

/// Parse the `bfchar` and `bfrange` sections of a ToUnicode CMap
pub fn parse_cmap(source: &str) -> BTreeMap<u32, String> {
    let mut map = BTreeMap::new();
    let tokens = cmap_tokens(source);
    let mut i = 0;
    let mut section = "";

    while i < tokens.len() {
        match &tokens[i] {
            CmapToken::Word(w) if w == "beginbfchar" => section = "bfchar",
            CmapToken::Word(w) if w == "beginbfrange" => section = "bfrange",
            CmapToken::Word(w) if w.starts_with("end") => section = "",
            CmapToken::Hex(src) if section == "bfchar" => {
                if let Some(CmapToken::Hex(dst)) = tokens.get(i + 1) {
                    map.insert(code_of(src), utf16_text(dst));
                    i += 1;
                }
            }
            CmapToken::Hex(lo) if section == "bfrange" => {
                let lo = code_of(lo);
                let hi = match tokens.get(i + 1) {
                    Some(CmapToken::Hex(hi)) => code_of(hi),
                    _ => {
                        i += 1;
                        continue;
                    }
                };
                match tokens.get(i + 2) {
                    Some(CmapToken::Hex(dst)) => {
                        let base = utf16_text(dst);
                        let mut base_chars: Vec<char> = base.chars().collect();
                        for code in lo..=hi {
                            map.insert(code, base_chars.iter().collect());
                            if let Some(last) = base_chars.last_mut() {
                                *last = char::from_u32(u32::from(*last) + 1).unwrap_or(*last);
                            }
                        }
                        i += 2;
                    }
                    Some(CmapToken::Open) => {
                        let mut j = i + 3;
                        let mut code = lo;
                        while let Some(CmapToken::Hex(dst)) = tokens.get(j) {
                            if code <= hi {
                                map.insert(code, utf16_text(dst));
                            }
                            code += 1;
                            j += 1;
                        }
                        i = j;
                    }
                    _ => i += 1,
                }
            }
            _ => {}
        }
        i += 1;
    }
    map
}
