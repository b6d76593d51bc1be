pub mod annotate;
pub mod document;
pub mod fonts;
pub mod geometry;
pub mod layout;
pub mod markup;
pub mod overlay;
pub mod pages;
pub mod redact;
pub mod render;
pub mod search;
pub mod text;

#[cfg(test)]
pub(crate) mod testing;

pub use document::PdfDocument;
