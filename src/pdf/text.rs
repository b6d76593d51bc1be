use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct PageText {
    pub page: u32,
    pub text: String,
}

/// Extract plain text from specific pages of a PDF
pub fn extract_text_pages(bytes: &[u8], pages: &[u32]) -> Result<Vec<PageText>> {
    let texts = pdf_extract::extract_text_from_mem_by_pages(bytes)
        .context("Failed to extract text from PDF")?;
    let total_pages = texts.len() as u32;

    pages
        .iter()
        .map(|&page| {
            let text = page
                .checked_sub(1)
                .and_then(|index| texts.get(index as usize))
                .with_context(|| format!("Page {} is out of range (1-{})", page, total_pages))?;
            Ok(PageText {
                page,
                text: text.clone(),
            })
        })
        .collect()
}
