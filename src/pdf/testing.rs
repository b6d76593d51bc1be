//! In-memory PDFs for unit tests.

use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, Stream};

/// One page per entry, each showing its text in 12pt Helvetica at (72, 700).
pub fn build_pdf(texts: &[&str]) -> Vec<u8> {
    let pages = texts
        .iter()
        .map(|text| {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        })
        .collect();
    build_pdf_from_operations(pages)
}

/// One page per operation list. Font `F1` (Helvetica) and the MediaBox live
/// on the Pages node so that pages inherit them.
pub fn build_pdf_from_operations(pages: Vec<Vec<Operation>>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Font".to_vec())),
        ("Subtype", Object::Name(b"Type1".to_vec())),
        ("BaseFont", Object::Name(b"Helvetica".to_vec())),
    ]));
    let resources_id = doc.add_object(Dictionary::from_iter(vec![(
        "Font",
        Object::Dictionary(Dictionary::from_iter(vec![("F1", Object::Reference(font_id))])),
    )]));

    let mut kids = Vec::new();
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            content.encode().unwrap(),
        ));
        let page_id = doc.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
        ]));
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Pages".to_vec())),
            ("Kids", Object::Array(kids)),
            ("Count", Object::Integer(count)),
            ("Resources", Object::Reference(resources_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ])),
    );

    let catalog_id = doc.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// The literal strings shown on each page, concatenated per page.
pub fn page_strings(bytes: &[u8]) -> Vec<String> {
    let doc = Document::load_mem(bytes).unwrap();
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
            let mut text = Vec::new();
            for op in &content.operations {
                for operand in &op.operands {
                    match operand {
                        Object::String(bytes, _) => text.extend_from_slice(bytes),
                        Object::Array(items) => {
                            for item in items {
                                if let Object::String(bytes, _) = item {
                                    text.extend_from_slice(bytes);
                                }
                            }
                        }
                        _ => {}
                    }
                }
            }
            String::from_utf8_lossy(&text).into_owned()
        })
        .collect()
}
