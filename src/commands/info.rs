use crate::pdf::annotate::page_annotations;
use crate::pdf::document::{inherited_attribute, media_box, page_ids};
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P, show_pages: bool) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let info = doc.get_info();

    println!("File: {}", doc.source);
    println!("Pages: {}", info.page_count);
    println!("PDF version: {}", info.version);
    println!("Size: {}", format_size(info.file_size));

    if let Some(title) = &info.title {
        println!("Title: {}", title);
    }
    if let Some(author) = &info.author {
        println!("Author: {}", author);
    }
    if let Some(subject) = &info.subject {
        println!("Subject: {}", subject);
    }
    if let Some(keywords) = &info.keywords {
        println!("Keywords: {}", keywords);
    }
    if let Some(creator) = &info.creator {
        println!("Creator: {}", creator);
    }
    if let Some(producer) = &info.producer {
        println!("Producer: {}", producer);
    }
    if let Some(creation_date) = &info.creation_date {
        println!("Created: {}", format_pdf_date(creation_date));
    }
    if let Some(mod_date) = &info.mod_date {
        println!("Modified: {}", format_pdf_date(mod_date));
    }

    if show_pages {
        for (page, page_id) in page_ids(&doc.doc) {
            let media = media_box(&doc.doc, page_id);
            let rotate = inherited_attribute(&doc.doc, page_id, b"Rotate")
                .and_then(|obj| obj.as_i64().ok())
                .unwrap_or(0);
            let annotations = page_annotations(&doc.doc, page)?.len();
            println!(
                "  Page {}: {:.0} x {:.0} pt, rotated {}°, {} annotation(s)",
                page,
                media.width(),
                media.height(),
                rotate,
                annotations
            );
        }
    }

    Ok(())
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} bytes", bytes)
    }
}

pub fn format_pdf_date(date: &str) -> String {
    // D:YYYYMMDDHHmmSSOHH'mm
    if date.starts_with("D:") && date.len() >= 10 && date.is_ascii() {
        let d = &date[2..];
        let year = &d[0..4];
        let month = &d[4..6];
        let day = &d[6..8];
        let time = if d.len() >= 14 {
            format!(" {}:{}:{}", &d[8..10], &d[10..12], &d[12..14])
        } else {
            String::new()
        };
        return format!("{}-{}-{}{}", year, month, day, time);
    }
    date.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_pdf_date() {
        assert_eq!(format_pdf_date("D:20240131120000+01'00"), "2024-01-31 12:00:00");
        assert_eq!(format_pdf_date("D:20240131"), "2024-01-31");
        assert_eq!(format_pdf_date("yesterday"), "yesterday");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 bytes");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}
