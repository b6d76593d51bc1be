use crate::error::{EditError, EditResult};
use crate::pdf::document::page_object_id;
use crate::pdf::geometry::{Color, Rect};
use lopdf::{Dictionary, Document, Object, ObjectId};

/// Annotation flag: print the annotation with the page
const PRINT_FLAG: i64 = 4;

fn real_array(values: &[f32]) -> Object {
    Object::Array(values.iter().copied().map(Object::Real).collect())
}

/// Add a `/Highlight` annotation covering `rects` (one quad per rect).
pub fn add_highlight(
    doc: &mut Document,
    page: u32,
    rects: &[Rect],
    color: Color,
) -> EditResult<ObjectId> {
    let page_id = page_object_id(doc, page)?;
    let bounds = rects
        .iter()
        .copied()
        .reduce(|a, b| a.union(&b))
        .ok_or_else(|| EditError::Malformed("highlight needs at least one area".into()))?;

    // QuadPoints run top-left, top-right, bottom-left, bottom-right
    let quads: Vec<f32> = rects
        .iter()
        .flat_map(|r| [r.x0, r.y1, r.x1, r.y1, r.x0, r.y0, r.x1, r.y0])
        .collect();

    let mut annot = Dictionary::new();
    annot.set("Type", Object::Name(b"Annot".to_vec()));
    annot.set("Subtype", Object::Name(b"Highlight".to_vec()));
    annot.set("Rect", real_array(&[bounds.x0, bounds.y0, bounds.x1, bounds.y1]));
    annot.set("QuadPoints", real_array(&quads));
    annot.set("C", real_array(&color.components()));
    annot.set("F", Object::Integer(PRINT_FLAG));
    annot.set("P", Object::Reference(page_id));
    let annot_id = doc.add_object(annot);

    add_annotation_to_page(doc, page_id, annot_id)?;
    Ok(annot_id)
}

fn add_annotation_to_page(
    doc: &mut Document,
    page_id: ObjectId,
    annot_id: ObjectId,
) -> EditResult<()> {
    // Annots may live in a separate array object
    let shared = match doc.get_dictionary(page_id)?.get(b"Annots") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    };
    if let Some(array_id) = shared {
        if let Ok(Object::Array(arr)) = doc.get_object_mut(array_id) {
            arr.push(Object::Reference(annot_id));
            return Ok(());
        }
    }

    let page_dict = doc.get_dictionary_mut(page_id)?;
    if let Ok(Object::Array(ref mut arr)) = page_dict.get_mut(b"Annots") {
        arr.push(Object::Reference(annot_id));
    } else {
        page_dict.set("Annots", Object::Array(vec![Object::Reference(annot_id)]));
    }
    Ok(())
}

/// Annotations on a page, resolved to their dictionaries
pub fn page_annotations(doc: &Document, page: u32) -> EditResult<Vec<&Dictionary>> {
    let page_id = page_object_id(doc, page)?;
    let annots = match doc.get_dictionary(page_id)?.get(b"Annots") {
        Ok(Object::Reference(id)) => doc.get_object(*id)?.as_array()?,
        Ok(Object::Array(arr)) => arr,
        _ => return Ok(Vec::new()),
    };
    Ok(annots
        .iter()
        .filter_map(|obj| match obj {
            Object::Reference(id) => doc.get_dictionary(*id).ok(),
            Object::Dictionary(dict) => Some(dict),
            _ => None,
        })
        .collect())
}
