//! Single edit operations, as issued by the CLI, the MCP server or a JSON
//! edit script.
//!
//! Page arguments use the selection syntax ("1-3,7"); when omitted an
//! operation applies to every page. Coordinates are in points with the
//! origin at the top-left corner of the page.

use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::page_selection::{format_page_set, parse_page_order, parse_page_selection};
use crate::pdf::annotate::add_highlight;
use crate::pdf::document::{load_bytes, media_box, page_object_id};
use crate::pdf::geometry::{point_from_top_left, Color, Palette, Rect};
use crate::pdf::markup::{highlight_all, replace_all, MarkupReport};
use crate::pdf::overlay::{add_watermark, insert_text};
use crate::pdf::pages::{
    extract_pages, merge_documents, remove_pages, reorder_pages, rotate_pages, Rotation,
};
use crate::pdf::redact::redact_area;
use crate::session::{DocumentVersion, EditSession};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

fn default_highlight_color() -> String {
    "yellow".to_string()
}

fn default_text_color() -> String {
    "black".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditOperation {
    /// Keep only the selected pages
    Extract { pages: String },
    /// Drop the selected pages
    Remove { pages: String },
    /// Put every page in a new order
    Reorder { order: String },
    Rotate {
        degrees: i64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pages: Option<String>,
    },
    /// Add the pages of another PDF at the end
    Append { path: PathBuf },
    Watermark {
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pages: Option<String>,
    },
    /// Highlight every occurrence of `text`, or a single area of one page
    Highlight {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        area: Option<PageArea>,
        #[serde(default = "default_highlight_color")]
        color: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pages: Option<String>,
        #[serde(default)]
        ignore_case: bool,
    },
    Replace {
        old: String,
        new: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pages: Option<String>,
        #[serde(default)]
        ignore_case: bool,
    },
    AddText {
        page: u32,
        x: f32,
        /// Baseline, measured from the top of the page
        y: f32,
        text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<f32>,
        #[serde(default = "default_text_color")]
        color: String,
    },
    Redact { area: PageArea },
    /// Script only: drop the latest revision
    Undo,
    /// Script only: go back to the document as loaded
    Reset,
}

/// A rectangle on one page, top-left origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageArea {
    pub page: u32,
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

/// What an applied operation produced
#[derive(Debug, Clone)]
pub struct Outcome {
    pub version: DocumentVersion,
    pub message: String,
    pub report: Option<MarkupReport>,
}

/// Resolve an optional selection: `None` means every page; a selection that
/// yields nothing is an error.
pub fn select_pages(selection: Option<&str>, total_pages: u32) -> EditResult<Vec<u32>> {
    let pages = match selection {
        None => (1..=total_pages).collect(),
        Some(selection) => parse_page_selection(selection, total_pages).warn_and_take(),
    };
    if pages.is_empty() {
        return Err(EditError::NoPages);
    }
    Ok(pages)
}

fn area_rect(doc: &lopdf::Document, area: &PageArea) -> EditResult<Rect> {
    let media = media_box(doc, page_object_id(doc, area.page)?);
    Ok(Rect::from_top_left(
        &media, area.x0, area.y0, area.x1, area.y1,
    ))
}

fn describe(report: &MarkupReport, verb: &str, what: &str) -> String {
    if report.is_empty() {
        format!("No occurrences of '{}' found", what)
    } else {
        format!(
            "{} {} occurrence(s) of '{}' on page(s) {}",
            verb,
            report.count,
            what,
            format_page_set(&report.pages)
        )
    }
}

impl EditOperation {
    /// Short label recorded in the session history
    pub fn label(&self) -> String {
        match self {
            EditOperation::Extract { pages } => format!("extract {}", pages),
            EditOperation::Remove { pages } => format!("remove {}", pages),
            EditOperation::Reorder { order } => format!("reorder {}", order),
            EditOperation::Rotate { degrees, .. } => format!("rotate {}", degrees),
            EditOperation::Append { path } => format!("append {}", path.display()),
            EditOperation::Watermark { text, .. } => format!("watermark '{}'", text),
            EditOperation::Highlight { text: Some(text), .. } => format!("highlight '{}'", text),
            EditOperation::Highlight { .. } => "highlight area".to_string(),
            EditOperation::Replace { old, new, .. } => format!("replace '{}' with '{}'", old, new),
            EditOperation::AddText { text, page, .. } => format!("add text '{}' on page {}", text, page),
            EditOperation::Redact { area } => format!("redact area on page {}", area.page),
            EditOperation::Undo => "undo".to_string(),
            EditOperation::Reset => "reset".to_string(),
        }
    }

    /// File name prefix for the output when none is given
    pub fn output_prefix(&self) -> &'static str {
        match self {
            EditOperation::Extract { .. } => "extracted_",
            EditOperation::Reorder { .. } => "reordered_",
            EditOperation::Rotate { .. } => "rotated_",
            EditOperation::Watermark { .. } => "watermarked_",
            EditOperation::Highlight { .. } => "highlighted_",
            EditOperation::Append { .. } => "merged_",
            _ => "edited_",
        }
    }

    pub fn apply(&self, version: &DocumentVersion, config: &EditorConfig) -> EditResult<Outcome> {
        let total = version.page_count();
        let mut doc = version.document()?;
        let mut report = None;

        let (mut doc, message) = match self {
            EditOperation::Extract { pages } => {
                let pages = select_pages(Some(pages.as_str()), total)?;
                let message = format!("Extracted {} page(s)", pages.len());
                (extract_pages(&doc, &pages)?, message)
            }
            EditOperation::Remove { pages } => {
                let pages = select_pages(Some(pages.as_str()), total)?;
                let message = format!("Removed {} page(s)", pages.len());
                (remove_pages(&doc, &pages)?, message)
            }
            EditOperation::Reorder { order } => {
                let order = parse_page_order(order, total)
                    .map_err(|e| EditError::InvalidOrder(e.to_string()))?;
                (reorder_pages(&doc, &order)?, "Reordered pages".to_string())
            }
            EditOperation::Rotate { degrees, pages } => {
                let rotation = Rotation::from_degrees(*degrees)?;
                let pages = select_pages(pages.as_deref(), total)?;
                let rotations: BTreeMap<u32, Rotation> =
                    pages.iter().map(|&page| (page, rotation)).collect();
                rotate_pages(&mut doc, &rotations)?;
                let message = format!("Rotated {} page(s) by {}°", pages.len(), degrees);
                (doc, message)
            }
            EditOperation::Append { path } => {
                let bytes = std::fs::read(path)?;
                let other = load_bytes(&bytes)?;
                let added = other.get_pages().len();
                let message = format!("Appended {} page(s) from {}", added, path.display());
                (merge_documents(vec![doc, other])?, message)
            }
            EditOperation::Watermark { text, pages } => {
                let pages = select_pages(pages.as_deref(), total)?;
                add_watermark(&mut doc, text, &pages, &config.watermark)?;
                let message = format!("Watermarked {} page(s)", pages.len());
                (doc, message)
            }
            EditOperation::Highlight {
                text,
                area,
                color,
                pages,
                ignore_case,
            } => {
                let color = Color::parse(color, Palette::Highlight)?;
                let message = match (text, area) {
                    (Some(text), None) => {
                        let pages = select_pages(pages.as_deref(), total)?;
                        let found = highlight_all(&mut doc, text, color, &pages, *ignore_case)?;
                        let message = describe(&found, "Highlighted", text);
                        report = Some(found);
                        message
                    }
                    (None, Some(area)) => {
                        let rect = area_rect(&doc, area)?;
                        add_highlight(&mut doc, area.page, &[rect], color)?;
                        format!("Highlighted area on page {}", area.page)
                    }
                    _ => {
                        return Err(EditError::Malformed(
                            "highlight needs exactly one of text or area".into(),
                        ))
                    }
                };
                (doc, message)
            }
            EditOperation::Replace {
                old,
                new,
                pages,
                ignore_case,
            } => {
                let pages = select_pages(pages.as_deref(), total)?;
                let found = replace_all(&mut doc, old, new, &pages, *ignore_case, &config.replace)?;
                let message = describe(&found, "Replaced", old);
                report = Some(found);
                (doc, message)
            }
            EditOperation::AddText {
                page,
                x,
                y,
                text,
                size,
                color,
            } => {
                let color = Color::parse(color, Palette::Text)?;
                let media = media_box(&doc, page_object_id(&doc, *page)?);
                let origin = point_from_top_left(&media, *x, *y);
                let size = size.unwrap_or(config.text_font_size);
                insert_text(&mut doc, *page, origin, text, size, color)?;
                (doc, format!("Added text on page {}", page))
            }
            EditOperation::Redact { area } => {
                let rect = area_rect(&doc, area)?;
                let removed = redact_area(&mut doc, area.page, &rect)?;
                let message = format!(
                    "Redacted area on page {} ({} glyph(s) removed)",
                    area.page, removed
                );
                (doc, message)
            }
            EditOperation::Undo | EditOperation::Reset => {
                return Err(EditError::Malformed(format!(
                    "{} is only valid inside an edit script",
                    self.label()
                )))
            }
        };

        tracing::info!(op = %self.label(), "{}", message);
        Ok(Outcome {
            version: DocumentVersion::from_document(&mut doc)?,
            message,
            report,
        })
    }
}

pub fn load_script(json: &str) -> serde_json::Result<Vec<EditOperation>> {
    serde_json::from_str(json)
}

/// Apply operations in order, one revision each. Stops at the first
/// failure; revisions applied before it are kept.
pub fn apply_script(
    session: &mut EditSession,
    operations: &[EditOperation],
    config: &EditorConfig,
) -> anyhow::Result<Vec<String>> {
    let mut messages = Vec::with_capacity(operations.len());
    for (index, operation) in operations.iter().enumerate() {
        match operation {
            EditOperation::Undo => {
                messages.push(match session.undo() {
                    Some(revision) => format!("Undid {}", revision.label),
                    None => "Nothing to undo".to_string(),
                });
                continue;
            }
            EditOperation::Reset => {
                session.reset();
                messages.push("Reset to the original document".to_string());
                continue;
            }
            _ => {}
        }

        let outcome = operation
            .apply(session.current(), config)
            .with_context(|| format!("Operation {} ({}) failed", index + 1, operation.label()))?;
        session.commit(operation.label(), outcome.version);
        messages.push(outcome.message);
    }
    Ok(messages)
}
