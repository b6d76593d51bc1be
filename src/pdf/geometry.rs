use crate::error::{EditError, EditResult};
use serde::{Deserialize, Serialize};

/// Rectangle in PDF user space (origin bottom-left, units of points)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl Rect {
    /// Build a rectangle from any two opposite corners
    pub fn new(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect {
            x0: x0.min(x1),
            y0: y0.min(y1),
            x1: x0.max(x1),
            y1: y0.max(y1),
        }
    }

    /// Convert a rectangle given with a top-left origin (as on a rendered
    /// page) into user space, relative to the page's MediaBox.
    pub fn from_top_left(media_box: &Rect, x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
        Rect::new(
            media_box.x0 + x0,
            media_box.y1 - y0,
            media_box.x0 + x1,
            media_box.y1 - y1,
        )
    }

    /// The inverse of [`Rect::from_top_left`]
    pub fn to_top_left(&self, media_box: &Rect) -> Rect {
        Rect::new(
            self.x0 - media_box.x0,
            media_box.y1 - self.y1,
            self.x1 - media_box.x0,
            media_box.y1 - self.y0,
        )
    }

    pub fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    pub fn center(&self) -> (f32, f32) {
        ((self.x0 + self.x1) / 2.0, (self.y0 + self.y1) / 2.0)
    }

    pub fn contains(&self, (x, y): (f32, f32)) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    pub fn union(&self, other: &Rect) -> Rect {
        Rect {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    /// Bounding box of a set of points
    pub fn bounding(points: &[(f32, f32)]) -> Rect {
        let mut rect = Rect {
            x0: f32::INFINITY,
            y0: f32::INFINITY,
            x1: f32::NEG_INFINITY,
            y1: f32::NEG_INFINITY,
        };
        for &(x, y) in points {
            rect.x0 = rect.x0.min(x);
            rect.y0 = rect.y0.min(y);
            rect.x1 = rect.x1.max(x);
            rect.y1 = rect.y1.max(y);
        }
        rect
    }
}

/// Convert a point given with a top-left origin into user space.
pub fn point_from_top_left(media_box: &Rect, x: f32, y: f32) -> (f32, f32) {
    (media_box.x0 + x, media_box.y1 - y)
}

/// Affine transform `[a b c d e f]` applied to row vectors, as in PDF.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Matrix {
    pub const IDENTITY: Matrix = Matrix {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    pub fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Matrix { a, b, c, d, e, f }
    }

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit vertical vector
    pub fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }
}

/// Which set of color names a user-facing color string is resolved against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    Highlight,
    Text,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const YELLOW: Color = Color::rgb(1.0, 1.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Color { r, g, b }
    }

    pub const fn gray(level: f32) -> Self {
        Color::rgb(level, level, level)
    }

    /// Resolve a color name (case-insensitive) or a `#RRGGBB` hex string.
    pub fn parse(name: &str, palette: Palette) -> EditResult<Color> {
        let name = name.trim();
        if let Some(color) = parse_hex(name) {
            return Ok(color);
        }

        let color = match (palette, name.to_ascii_lowercase().as_str()) {
            (Palette::Highlight, "yellow") => Color::rgb(1.0, 1.0, 0.0),
            (Palette::Highlight, "green") => Color::rgb(0.0, 1.0, 0.0),
            (Palette::Highlight, "blue") => Color::rgb(0.3, 0.7, 1.0),
            (Palette::Highlight, "pink") => Color::rgb(1.0, 0.4, 0.8),
            (Palette::Highlight, "orange") => Color::rgb(1.0, 0.6, 0.0),
            (Palette::Text, "black") => Color::rgb(0.0, 0.0, 0.0),
            (Palette::Text, "red") => Color::rgb(1.0, 0.0, 0.0),
            (Palette::Text, "blue") => Color::rgb(0.0, 0.0, 1.0),
            (Palette::Text, "green") => Color::rgb(0.0, 0.5, 0.0),
            (Palette::Text, "purple") => Color::rgb(0.5, 0.0, 0.5),
            _ => return Err(EditError::InvalidColor(name.to_string())),
        };
        Ok(color)
    }

    pub fn components(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

fn parse_hex(s: &str) -> Option<Color> {
    let hex = s.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .ok()
            .map(|v| f32::from(v) / 255.0)
    };
    Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_from_top_left() {
        let media = Rect::new(0.0, 0.0, 612.0, 792.0);
        let rect = Rect::from_top_left(&media, 10.0, 20.0, 110.0, 70.0);
        assert_eq!(rect, Rect::new(10.0, 722.0, 110.0, 772.0));
        assert_eq!(rect.to_top_left(&media), Rect::new(10.0, 20.0, 110.0, 70.0));
    }

    #[test]
    fn test_matrix_then() {
        let scale = Matrix::new(2.0, 0.0, 0.0, 2.0, 0.0, 0.0);
        let m = Matrix::translate(10.0, 5.0).then(&scale);
        assert_eq!(m.apply(1.0, 1.0), (22.0, 12.0));
    }

    #[test]
    fn test_color_names_follow_palette() {
        assert_eq!(
            Color::parse("Blue", Palette::Highlight).unwrap(),
            Color::rgb(0.3, 0.7, 1.0)
        );
        assert_eq!(
            Color::parse("blue", Palette::Text).unwrap(),
            Color::rgb(0.0, 0.0, 1.0)
        );
        assert!(Color::parse("Purple", Palette::Highlight).is_err());
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(
            Color::parse("#FF0000", Palette::Text).unwrap(),
            Color::rgb(1.0, 0.0, 0.0)
        );
        assert!(Color::parse("#FF00", Palette::Text).is_err());
    }
}
