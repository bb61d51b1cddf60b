//! Markdown table scanning
//!
//! Line-level helpers: finding the header, recognising the separator,
//! splitting cells and unpacking `[text](url)` title cells.

use crate::model::{ExtractedRow, Rating};

/// Words that mark a line as the table header
const HEADER_KEYWORDS: [&str; 2] = ["title", "post"];

/// Where the table sits inside the text
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TableBounds {
    /// Index of the header line
    pub header: usize,

    /// Whether the line after the header is a separator
    pub has_separator: bool,

    /// First candidate body line
    pub body_start: usize,

    /// One past the last body line
    pub end: usize,
}

/// First line holding a pipe and a header keyword
pub fn find_header(lines: &[&str]) -> Option<usize> {
    lines.iter().position(|line| {
        if !line.contains('|') {
            return false;
        }
        let lower = line.to_lowercase();
        HEADER_KEYWORDS.iter().any(|kw| lower.contains(kw))
    })
}

/// A separator line has only `|`, `-`, `:` and spaces, and at least one dash
pub fn is_separator(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty()
        && trimmed.contains('-')
        && trimmed.chars().all(|c| matches!(c, '|' | '-' | ':' | ' '))
}

/// Locate header, separator and end of the table
pub fn locate(lines: &[&str]) -> Option<TableBounds> {
    let header = find_header(lines)?;

    let has_separator = lines.get(header + 1).is_some_and(|l| is_separator(l));
    let body_start = if has_separator { header + 2 } else { header + 1 };

    let end = lines
        .iter()
        .enumerate()
        .skip(body_start)
        .find(|(_, line)| line.trim().is_empty() || !line.contains('|'))
        .map_or(lines.len(), |(i, _)| i);

    Some(TableBounds {
        header,
        has_separator,
        body_start,
        end: end.max(body_start).min(lines.len()),
    })
}

/// Split a row on `|`, trimming cells and dropping the empty edge cells a
/// leading or trailing pipe produces
pub fn split_cells(line: &str) -> Vec<&str> {
    let mut cells: Vec<&str> = line.split('|').map(str::trim).collect();

    if cells.first().is_some_and(|c| c.is_empty()) {
        cells.remove(0);
    }
    if cells.last().is_some_and(|c| c.is_empty()) {
        cells.pop();
    }
    cells
}

/// Unpack `[text](url)` into display text and URL
pub fn parse_link(cell: &str) -> Option<(String, String)> {
    let open = cell.find('[')?;
    let close = open + cell[open..].find("](")?;
    let url_start = close + 2;
    let url_end = url_start + cell[url_start..].find(')')?;

    let text = cell[open + 1..close].trim();
    let url = cell[url_start..url_end].trim();
    if url.is_empty() {
        return None;
    }
    Some((text.to_string(), url.to_string()))
}

/// Turn a body line into a row, or `None` when it lacks a title, response
/// and rating
pub fn parse_row(line: &str) -> Option<ExtractedRow> {
    let cells = split_cells(line);
    let [title_cell, response, rating, ..] = cells.as_slice() else {
        return None;
    };
    if title_cell.is_empty() || response.is_empty() || rating.is_empty() {
        return None;
    }

    let (title, link) = match parse_link(title_cell) {
        Some((text, url)) => (text, Some(url)),
        None => ((*title_cell).to_string(), None),
    };

    Some(ExtractedRow {
        title_cell: (*title_cell).to_string(),
        title,
        link,
        response: (*response).to_string(),
        rating: Rating::parse(rating),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_detection_is_case_insensitive() {
        let lines = ["Intro", "| POST TITLE | Reply | Rating |", "|---|---|---|"];
        assert_eq!(find_header(&lines), Some(1));
        assert_eq!(find_header(&["no table here", "a | b"]), None);
    }

    #[test]
    fn test_separator_variants() {
        assert!(is_separator("|---|---|---|"));
        assert!(is_separator("| :-- | :-: | --: |"));
        assert!(!is_separator("| a | b |"));
        assert!(!is_separator(""));
        assert!(!is_separator("|   |"));
    }

    #[test]
    fn test_locate_stops_at_blank_line() {
        let lines = ["| Post Title | R | E |", "|---|---|---|", "| a | b | c |", "", "| x | y | z |"];
        let bounds = locate(&lines).unwrap();
        assert!(bounds.has_separator);
        assert_eq!(bounds.body_start, 2);
        assert_eq!(bounds.end, 3);
    }

    #[test]
    fn test_locate_without_separator_starts_after_header() {
        let lines = ["| Post Title | R | E |", "| a | b | c |"];
        let bounds = locate(&lines).unwrap();
        assert!(!bounds.has_separator);
        assert_eq!(bounds.body_start, 1);
        assert_eq!(bounds.end, 2);
    }

    #[test]
    fn test_locate_header_on_last_line() {
        let lines = ["text", "| Post Title | R | E |"];
        let bounds = locate(&lines).unwrap();
        assert_eq!(bounds.body_start, 2);
        assert_eq!(bounds.end, 2);
    }

    #[test]
    fn test_split_cells_drops_edges_only() {
        assert_eq!(split_cells("| a | b | c |"), vec!["a", "b", "c"]);
        assert_eq!(split_cells("a | b | c"), vec!["a", "b", "c"]);
        assert_eq!(split_cells("| a |  | c |"), vec!["a", "", "c"]);
    }

    #[test]
    fn test_parse_link() {
        assert_eq!(
            parse_link("[Foo Bar](http://example.com/foo)"),
            Some(("Foo Bar".into(), "http://example.com/foo".into()))
        );
        assert_eq!(parse_link("Plain title"), None);
        assert_eq!(parse_link("[broken](no close"), None);
        assert_eq!(parse_link("[empty]()"), None);
    }

    #[test]
    fn test_parse_row_requires_three_filled_cells() {
        assert!(parse_row("| Title | Response |").is_none());
        assert!(parse_row("| Title |  | High |").is_none());

        let row = parse_row("| [Foo](http://x/foo) | Nice one | **High** | extra |").unwrap();
        assert_eq!(row.title, "Foo");
        assert_eq!(row.link.as_deref(), Some("http://x/foo"));
        assert_eq!(row.rating, Rating::High);
    }
}
