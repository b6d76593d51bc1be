use crate::edit::select_pages;
use crate::pdf::text::{extract_text_pages, PageText};
use crate::session::DocumentVersion;
use anyhow::Result;
use std::path::Path;

pub fn run(path: &Path, pages: Option<&str>) -> Result<()> {
    let version = super::open_version(path)?;
    for page_text in read_pages(&version, pages)? {
        println!("--- Page {} ---", page_text.page);
        println!("{}", page_text.text);
        println!();
    }
    Ok(())
}

pub fn read_pages(
    version: &DocumentVersion,
    pages: Option<&str>,
) -> Result<Vec<PageText>> {
    let pages = select_pages(pages, version.page_count())?;
    extract_text_pages(version.bytes(), &pages)
}
