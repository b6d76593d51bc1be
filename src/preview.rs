//! Standalone HTML previews of a document.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

pub struct Thumbnail {
    pub page: u32,
    pub png: Vec<u8>,
}

pub fn pdf_data_uri(pdf: &[u8]) -> String {
    format!("data:application/pdf;base64,{}", STANDARD.encode(pdf))
}

fn png_data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// An HTML page embedding the PDF in an iframe, followed by page thumbnails.
pub fn preview_html(title: &str, pdf: &[u8], thumbnails: &[Thumbnail]) -> String {
    let title = escape_html(title);
    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str(&format!("<title>{}</title>\n", title));
    html.push_str(
        "<style>\n\
         body { font-family: sans-serif; margin: 2em; }\n\
         .thumbs { display: flex; flex-wrap: wrap; gap: 1em; }\n\
         figure { margin: 0; text-align: center; }\n\
         figure img { max-width: 200px; border: 1px solid #ccc; }\n\
         </style>\n</head>\n<body>\n",
    );
    html.push_str(&format!("<h1>{}</h1>\n", title));
    html.push_str(&format!(
        "<iframe src=\"{}\" width=\"700\" height=\"1000\" type=\"application/pdf\"></iframe>\n",
        pdf_data_uri(pdf)
    ));

    if !thumbnails.is_empty() {
        html.push_str("<div class=\"thumbs\">\n");
        for thumbnail in thumbnails {
            html.push_str(&format!(
                "<figure><img src=\"{}\" alt=\"Page {page}\"><figcaption>Page {page}</figcaption></figure>\n",
                png_data_uri(&thumbnail.png),
                page = thumbnail.page
            ));
        }
        html.push_str("</div>\n");
    }
    html.push_str("</body>\n</html>\n");
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_uri() {
        assert_eq!(pdf_data_uri(b"%PDF"), "data:application/pdf;base64,JVBERg==");
    }

    #[test]
    fn test_preview_html() {
        let thumbnails = vec![
            Thumbnail {
                page: 1,
                png: vec![1, 2, 3],
            },
            Thumbnail {
                page: 2,
                png: vec![4],
            },
        ];
        let html = preview_html("a <b> & c.pdf", b"%PDF", &thumbnails);
        assert!(html.contains("<title>a &lt;b&gt; &amp; c.pdf</title>"));
        assert!(html.contains("data:application/pdf;base64,JVBERg=="));
        assert!(html.contains("<figcaption>Page 2</figcaption>"));
        assert_eq!(html.matches("data:image/png;base64,").count(), 2);
    }

    #[test]
    fn test_preview_without_thumbnails() {
        let html = preview_html("doc", b"%PDF", &[]);
        assert!(!html.contains("class=\"thumbs\""));
    }
}
