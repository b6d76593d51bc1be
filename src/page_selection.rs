use std::collections::BTreeSet;
use std::num::IntErrorKind;
use std::ops::RangeInclusive;
use thiserror::Error;

/// A problem with one comma-separated token of a page specification.
///
/// None of these abort a parse: every bad token yields one error and the
/// remaining tokens still contribute pages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Invalid range format: {token}")]
    MalformedRange { token: String },

    #[error("Invalid range: {token} (document has pages 1-{total_pages})")]
    RangeOutOfBounds {
        token: String,
        start: i64,
        end: i64,
        total_pages: u32,
    },

    #[error("Invalid page number: {token}")]
    InvalidPageNumber { token: String },

    #[error("Page {page} out of range (1-{total_pages})")]
    PageOutOfBounds {
        token: String,
        page: i64,
        total_pages: u32,
    },
}

impl SelectionError {
    /// The token (trimmed) that produced this error
    pub fn token(&self) -> &str {
        match self {
            SelectionError::MalformedRange { token }
            | SelectionError::RangeOutOfBounds { token, .. }
            | SelectionError::InvalidPageNumber { token }
            | SelectionError::PageOutOfBounds { token, .. } => token,
        }
    }
}

/// Result of parsing a page specification: the valid pages in ascending
/// order plus one error per rejected token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSelection {
    pub pages: Vec<u32>,
    pub errors: Vec<SelectionError>,
}

impl PageSelection {
    /// Every page of a document, as used when no selection is given
    pub fn all(total_pages: u32) -> Self {
        PageSelection {
            pages: (1..=total_pages).collect(),
            errors: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Log every token error as a warning and hand back the pages.
    pub fn warn_and_take(self) -> Vec<u32> {
        for error in &self.errors {
            tracing::warn!(token = error.token(), "{}", error);
        }
        self.pages
    }
}

/// Parse a page specification like "2,10,45", "21-45" or "1-5,10,15-20".
///
/// Blank input is a valid empty selection. The result is de-duplicated
/// and sorted regardless of token order.
pub fn parse_page_selection(selection: &str, total_pages: u32) -> PageSelection {
    let mut pages = BTreeSet::new();
    let mut errors = Vec::new();

    for token in tokens(selection) {
        match parse_token(token, total_pages) {
            Ok(range) => pages.extend(range),
            Err(e) => errors.push(e),
        }
    }

    tracing::debug!(
        selection,
        total_pages,
        selected = pages.len(),
        rejected = errors.len(),
        "parsed page selection"
    );

    PageSelection {
        pages: pages.into_iter().collect(),
        errors,
    }
}

/// Errors for a full page ordering, where every page must appear once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrderError {
    #[error(transparent)]
    Token(#[from] SelectionError),

    #[error("Please specify all {expected} pages (got {found})")]
    IncompleteOrder { expected: u32, found: usize },

    #[error("Page {0} appears more than once")]
    DuplicatePage(u32),
}

/// Parse a new page order like "3,1,2" or "4-6,1-3".
///
/// Unlike a selection, the order of tokens is kept and the first bad token
/// fails the parse. The result is a permutation of `1..=total_pages`.
pub fn parse_page_order(order: &str, total_pages: u32) -> Result<Vec<u32>, OrderError> {
    let mut pages = Vec::new();
    for token in tokens(order) {
        pages.extend(parse_token(token, total_pages)?);
    }

    let mut seen = BTreeSet::new();
    for &page in &pages {
        if !seen.insert(page) {
            return Err(OrderError::DuplicatePage(page));
        }
    }

    // all pages are in range and distinct, so the right count means every page
    if pages.len() != total_pages as usize {
        return Err(OrderError::IncompleteOrder {
            expected: total_pages,
            found: pages.len(),
        });
    }

    Ok(pages)
}

/// Parse split points like "3,7,12": the last page of each part but the final one.
///
/// Points that do not fall strictly inside the document are dropped with a
/// warning. A token that is not a number fails the parse.
pub fn parse_split_points(points: &str, total_pages: u32) -> Result<Vec<u32>, SelectionError> {
    let mut kept = BTreeSet::new();
    for token in tokens(points) {
        let point = parse_number(token).ok_or_else(|| SelectionError::InvalidPageNumber {
            token: token.to_string(),
        })?;
        if point >= 1 && point < i64::from(total_pages) {
            kept.insert(point as u32);
        } else {
            tracing::warn!(point, total_pages, "dropping split point outside the document");
        }
    }
    Ok(kept.into_iter().collect())
}

/// Render a page set in its canonical form, collapsing runs into ranges.
///
/// Parsing the output again yields the same pages.
pub fn format_page_set(pages: &[u32]) -> String {
    let mut parts = Vec::new();
    let mut iter = pages.iter().copied().peekable();
    while let Some(start) = iter.next() {
        let mut end = start;
        while iter.peek() == Some(&(end + 1)) {
            end += 1;
            iter.next();
        }
        if start == end {
            parts.push(start.to_string());
        } else {
            parts.push(format!("{}-{}", start, end));
        }
    }
    parts.join(",")
}

fn tokens(s: &str) -> impl Iterator<Item = &str> {
    let blank = s.trim().is_empty();
    s.split(',').map(str::trim).filter(move |_| !blank)
}

fn parse_token(token: &str, total_pages: u32) -> Result<RangeInclusive<u32>, SelectionError> {
    let total = i64::from(total_pages);

    if token.contains('-') {
        let mut parts = token.split('-');
        let bounds = match (parts.next(), parts.next(), parts.next()) {
            (Some(start), Some(end), None) => {
                parse_number(start.trim()).zip(parse_number(end.trim()))
            }
            _ => None,
        };
        let Some((start, end)) = bounds else {
            return Err(SelectionError::MalformedRange {
                token: token.to_string(),
            });
        };

        if start < 1 || end > total || start > end {
            return Err(SelectionError::RangeOutOfBounds {
                token: token.to_string(),
                start,
                end,
                total_pages,
            });
        }

        // 1 <= start <= end <= total_pages, so both fit in u32
        Ok(start as u32..=end as u32)
    } else {
        let page = parse_number(token).ok_or_else(|| SelectionError::InvalidPageNumber {
            token: token.to_string(),
        })?;

        if page < 1 || page > total {
            return Err(SelectionError::PageOutOfBounds {
                token: token.to_string(),
                page,
                total_pages,
            });
        }

        Ok(page as u32..=page as u32)
    }
}

/// Integer parse where an over-long run of digits is still a number, just
/// one that no document can contain.
fn parse_number(s: &str) -> Option<i64> {
    match s.parse::<i64>() {
        Ok(n) => Some(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Some(i64::MAX),
            IntErrorKind::NegOverflow => Some(i64::MIN),
            _ => None,
        },
    }
}
