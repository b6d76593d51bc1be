use crate::error::{EditError, EditResult};
use crate::pdf::geometry::Rect;
use anyhow::{Context, Result};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::path::Path;

/// Attributes a page may inherit from its ancestors in the page tree
pub const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

pub struct PdfDocument {
    pub doc: Document,
    pub source: String,
    pub file_size: usize,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let source = path.as_ref().display().to_string();
        let bytes =
            std::fs::read(&path).with_context(|| format!("Failed to read PDF: {}", source))?;
        let doc = load_bytes(&bytes).with_context(|| format!("Failed to open PDF: {}", source))?;
        Ok(PdfDocument {
            doc,
            source,
            file_size: bytes.len(),
        })
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get metadata from the document info dictionary
    pub fn get_info(&self) -> PdfInfo {
        let mut info = PdfInfo::default();

        let dict = match self.doc.trailer.get(b"Info") {
            Ok(Object::Reference(info_ref)) => self.doc.get_dictionary(*info_ref).ok(),
            Ok(Object::Dictionary(dict)) => Some(dict),
            _ => None,
        };
        if let Some(dict) = dict {
            info.title = get_string_from_dict(dict, b"Title");
            info.author = get_string_from_dict(dict, b"Author");
            info.creator = get_string_from_dict(dict, b"Creator");
            info.producer = get_string_from_dict(dict, b"Producer");
            info.creation_date = get_string_from_dict(dict, b"CreationDate");
            info.mod_date = get_string_from_dict(dict, b"ModDate");
            info.subject = get_string_from_dict(dict, b"Subject");
            info.keywords = get_string_from_dict(dict, b"Keywords");
        }

        info.version = self.doc.version.clone();
        info.page_count = self.page_count();
        info.file_size = self.file_size;
        info
    }
}

#[derive(Debug, Default, Clone)]
pub struct PdfInfo {
    pub title: Option<String>,
    pub author: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub creation_date: Option<String>,
    pub mod_date: Option<String>,
    pub subject: Option<String>,
    pub keywords: Option<String>,
    pub version: String,
    pub page_count: u32,
    pub file_size: usize,
}

pub fn load_bytes(bytes: &[u8]) -> EditResult<Document> {
    Ok(Document::load_mem(bytes)?)
}

pub fn to_bytes(doc: &mut Document) -> EditResult<Vec<u8>> {
    doc.compress();
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

/// 1-indexed page numbers with their object IDs, in page order
pub fn page_ids(doc: &Document) -> Vec<(u32, ObjectId)> {
    doc.get_pages().into_iter().collect()
}

pub fn page_object_id(doc: &Document, page: u32) -> EditResult<ObjectId> {
    let pages = doc.get_pages();
    pages.get(&page).copied().ok_or(EditError::PageOutOfRange {
        page,
        total: pages.len() as u32,
    })
}

/// Follow indirect references until a direct object is reached.
pub fn resolve<'a>(doc: &'a Document, mut object: &'a Object) -> &'a Object {
    for _ in 0..16 {
        match object {
            Object::Reference(id) => match doc.get_object(*id) {
                Ok(target) => object = target,
                Err(_) => break,
            },
            _ => break,
        }
    }
    object
}

/// Look up a page attribute, walking up the page tree for inheritable keys.
pub fn inherited_attribute(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..32 {
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

pub fn number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// The page's MediaBox, defaulting to US Letter when absent or malformed
pub fn media_box(doc: &Document, page_id: ObjectId) -> Rect {
    let values: Vec<f32> = inherited_attribute(doc, page_id, b"MediaBox")
        .and_then(|obj| resolve(doc, &obj).as_array().ok().cloned())
        .map(|arr| {
            arr.iter()
                .filter_map(|o| number(resolve(doc, o)))
                .collect()
        })
        .unwrap_or_default();

    match values.as_slice() {
        [x0, y0, x1, y1] => Rect::new(*x0, *y0, *x1, *y1),
        _ => Rect::new(0.0, 0.0, 612.0, 792.0),
    }
}

/// Resolve a dictionary-valued entry, whether inline or referenced
pub fn dictionary_entry<'a>(
    doc: &'a Document,
    dict: &'a Dictionary,
    key: &[u8],
) -> Option<&'a Dictionary> {
    dict.get(key)
        .ok()
        .and_then(|obj| resolve(doc, obj).as_dict().ok())
}

fn get_string_from_dict(dict: &Dictionary, key: &[u8]) -> Option<String> {
    dict.get(key).ok().and_then(|obj| match obj {
        Object::String(bytes, _) => decode_pdf_string(bytes),
        _ => None,
    })
}

fn decode_pdf_string(bytes: &[u8]) -> Option<String> {
    // Check for UTF-16 BOM
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let u16_chars: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        String::from_utf16(&u16_chars).ok()
    } else {
        // PDFDocEncoding, treated as Latin-1
        Some(bytes.iter().map(|&b| b as char).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::build_pdf;

    #[test]
    fn test_page_count_and_ids() {
        let doc = load_bytes(&build_pdf(&["a", "b", "c"])).unwrap();
        let ids = page_ids(&doc);
        assert_eq!(ids.len(), 3);
        assert_eq!(ids[0].0, 1);
        assert_eq!(page_object_id(&doc, 2).unwrap(), ids[1].1);
        assert!(matches!(
            page_object_id(&doc, 4),
            Err(EditError::PageOutOfRange { page: 4, total: 3 })
        ));
    }

    #[test]
    fn test_inherited_media_box() {
        let doc = load_bytes(&build_pdf(&["a"])).unwrap();
        let page_id = page_object_id(&doc, 1).unwrap();
        // the test builder puts MediaBox on the Pages node only
        assert_eq!(media_box(&doc, page_id), Rect::new(0.0, 0.0, 612.0, 792.0));
        assert!(doc
            .get_dictionary(page_id)
            .unwrap()
            .get(b"MediaBox")
            .is_err());
    }

    #[test]
    fn test_decode_utf16_string() {
        let bytes = [0xFE, 0xFF, 0x00, b'H', 0x00, b'i'];
        assert_eq!(decode_pdf_string(&bytes).as_deref(), Some("Hi"));
    }
}
