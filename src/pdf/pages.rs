//! Page-level editing: extract, remove, reorder, merge, split and rotate.
//!
//! Every operation rebuilds the page tree as a single flat `Pages` node
//! holding the chosen pages in the chosen order. Attributes a page used to
//! inherit from intermediate nodes are copied onto the page first, and
//! anything no longer reachable is pruned.

use crate::error::{EditError, EditResult};
use crate::pdf::document::{inherited_attribute, page_ids, INHERITABLE};
use lopdf::{Document, Object, ObjectId};
use std::collections::{BTreeMap, BTreeSet};

/// Build a document containing exactly `pages` (1-based), in the given order.
pub fn extract_pages(doc: &Document, pages: &[u32]) -> EditResult<Document> {
    if pages.is_empty() {
        return Err(EditError::NoPages);
    }
    let ids = resolve_pages(doc, pages)?;
    let mut new_doc = doc.clone();
    rebuild_page_tree(&mut new_doc, &ids)?;
    Ok(new_doc)
}

/// Build a document without `pages`, keeping the rest in order.
pub fn remove_pages(doc: &Document, pages: &[u32]) -> EditResult<Document> {
    let all = page_ids(doc);
    let total = all.len() as u32;
    for &page in pages {
        check_page(page, total)?;
    }

    let remove: BTreeSet<u32> = pages.iter().copied().collect();
    let keep: Vec<ObjectId> = all
        .into_iter()
        .filter(|(num, _)| !remove.contains(num))
        .map(|(_, id)| id)
        .collect();
    if keep.is_empty() {
        return Err(EditError::NothingToKeep);
    }

    let mut new_doc = doc.clone();
    rebuild_page_tree(&mut new_doc, &keep)?;
    Ok(new_doc)
}

/// Build a document with every page exactly once, in `order`.
pub fn reorder_pages(doc: &Document, order: &[u32]) -> EditResult<Document> {
    let total = doc.get_pages().len();
    let distinct: BTreeSet<u32> = order.iter().copied().collect();
    if order.len() != total || distinct.len() != total {
        return Err(EditError::InvalidOrder(format!(
            "expected each of the {} pages exactly once",
            total
        )));
    }
    extract_pages(doc, order)
}

/// Split after each of `points` (1-based page numbers), producing
/// contiguous parts. `[3, 7, 12]` on 15 pages yields 1-3, 4-7, 8-12, 13-15.
pub fn split_document(doc: &Document, points: &[u32]) -> EditResult<Vec<Document>> {
    let total = doc.get_pages().len() as u32;
    if total == 0 {
        return Err(EditError::NoPages);
    }

    let mut bounds: Vec<u32> = points
        .iter()
        .copied()
        .filter(|&p| p >= 1 && p < total)
        .collect();
    bounds.sort_unstable();
    bounds.dedup();
    bounds.insert(0, 0);
    bounds.push(total);

    bounds
        .windows(2)
        .map(|w| {
            let pages: Vec<u32> = (w[0] + 1..=w[1]).collect();
            tracing::debug!(first = w[0] + 1, last = w[1], "building split part");
            extract_pages(doc, &pages)
        })
        .collect()
}

/// Concatenate the pages of every document, in order.
pub fn merge_documents(documents: Vec<Document>) -> EditResult<Document> {
    let mut documents = documents.into_iter();
    let mut dest = documents.next().ok_or(EditError::NoPages)?;
    let mut dest_pages: Vec<ObjectId> = dest.get_pages().values().copied().collect();

    for source in documents {
        let source_pages: Vec<ObjectId> = source.get_pages().values().copied().collect();
        let id_offset = dest.max_id;

        for (old_id, object) in source.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            dest.objects.insert(new_id, remap_object_refs(object, id_offset));
        }
        dest_pages.extend(
            source_pages
                .into_iter()
                .map(|(num, gen)| (num + id_offset, gen)),
        );
        dest.max_id += source.max_id;
    }

    rebuild_page_tree(&mut dest, &dest_pages)?;
    Ok(dest)
}

/// Clockwise rotation in quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Right, // 90° clockwise
    Down,  // 180°
    Left,  // 90° counter-clockwise
}

impl Rotation {
    pub fn from_degrees(degrees: i64) -> EditResult<Self> {
        if degrees % 90 != 0 {
            return Err(EditError::InvalidRotation(degrees));
        }
        Ok(match degrees.rem_euclid(360) {
            0 => Rotation::None,
            90 => Rotation::Right,
            180 => Rotation::Down,
            _ => Rotation::Left,
        })
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Right => 90,
            Rotation::Down => 180,
            Rotation::Left => 270,
        }
    }
}

/// Add a rotation to each listed page on top of whatever it already has.
pub fn rotate_pages(doc: &mut Document, rotations: &BTreeMap<u32, Rotation>) -> EditResult<()> {
    let pages = doc.get_pages();
    let total = pages.len() as u32;

    for (&page, &rotation) in rotations {
        check_page(page, total)?;
        if rotation == Rotation::None {
            continue;
        }
        let page_id = pages[&page];
        let current = inherited_attribute(doc, page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .unwrap_or(0);
        let rotate = (current + rotation.degrees()).rem_euclid(360);

        doc.get_dictionary_mut(page_id)?
            .set("Rotate", Object::Integer(rotate));
        tracing::debug!(page, rotate, "rotated page");
    }
    Ok(())
}

fn check_page(page: u32, total: u32) -> EditResult<()> {
    if page == 0 || page > total {
        return Err(EditError::PageOutOfRange { page, total });
    }
    Ok(())
}

fn resolve_pages(doc: &Document, pages: &[u32]) -> EditResult<Vec<ObjectId>> {
    let all = doc.get_pages();
    let total = all.len() as u32;
    pages
        .iter()
        .map(|&page| {
            check_page(page, total)?;
            Ok(all[&page])
        })
        .collect()
}

/// Point the root `Pages` node at exactly `page_refs`, then prune.
fn rebuild_page_tree(doc: &mut Document, page_refs: &[ObjectId]) -> EditResult<()> {
    let pages_id = doc
        .catalog()?
        .get(b"Pages")
        .and_then(Object::as_reference)
        .map_err(|_| EditError::Malformed("catalog has no Pages reference".into()))?;

    for &page_id in page_refs {
        let inherited: Vec<(&[u8], Object)> = INHERITABLE
            .iter()
            .filter_map(|&key| inherited_attribute(doc, page_id, key).map(|v| (key, v)))
            .collect();

        let page = doc.get_dictionary_mut(page_id)?;
        for (key, value) in inherited {
            if !page.has(key) {
                page.set(key, value);
            }
        }
        page.set("Parent", Object::Reference(pages_id));
    }

    let pages = doc.get_dictionary_mut(pages_id)?;
    pages.set(
        "Kids",
        Object::Array(page_refs.iter().map(|&id| Object::Reference(id)).collect()),
    );
    pages.set("Count", Object::Integer(page_refs.len() as i64));

    let pruned = doc.prune_objects();
    tracing::trace!(pruned = pruned.len(), "pruned unreachable objects");
    Ok(())
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(std::mem::replace(value, Object::Null), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
