use crate::page_selection::{format_page_set, parse_page_selection};
use crate::pdf::PdfDocument;
use anyhow::{Context, Result};
use std::path::Path;

/// Page count to parse against: given directly or read from a PDF
pub fn total_pages(path: Option<&Path>, total: Option<u32>) -> Result<u32> {
    match (path, total) {
        (_, Some(total)) => Ok(total),
        (Some(path), None) => Ok(PdfDocument::open(path)?.page_count()),
        (None, None) => anyhow::bail!("Either a PDF file or --total is required"),
    }
}

pub fn run(selection: &str, path: Option<&Path>, total: Option<u32>) -> Result<()> {
    let total = total_pages(path, total).context("Cannot determine the page count")?;
    let parsed = parse_page_selection(selection, total);

    if parsed.is_empty() {
        println!("No pages selected (document has {} pages)", total);
    } else {
        println!(
            "Selected {} of {} page(s): {}",
            parsed.pages.len(),
            total,
            format_page_set(&parsed.pages)
        );
    }
    if parsed.has_errors() {
        println!("Skipped {} invalid part(s):", parsed.errors.len());
        for error in &parsed.errors {
            println!("  warning: {}", error);
        }
    }

    Ok(())
}
