//! Row Extractor
//!
//! Pulls `| Post Title | Suggested Response | Engagement Potential |` rows out
//! of free-form model output and associates each row with one of the posts
//! it was written for.
//!
//! ```text
//!   text ──► locate table ──► parse rows ──► associate ──► placeholders
//!                 │                              ▲
//!                 └── no header ──► text search ─┘
//! ```
//!
//! Association priority per row is exact title/URL, then case-insensitive
//! containment, then the first record nobody has claimed. A record is claimed
//! by at most one row. Records left over get [`PLACEHOLDER_RESPONSE`].
//!
//! Extraction never fails: malformed rows are skipped and missing matches
//! degrade to the placeholder. Every step is recorded in the report's trace.

pub mod table;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::{ExtractedRow, Rating, SourceRecord};

/// Response used for records no row could be associated with
pub const PLACEHOLDER_RESPONSE: &str =
    "Please see the full analysis for the suggested response to this post.";

/// Lines inspected after a title hit during text search
const TEXT_SEARCH_WINDOW: usize = 4;

/// How a row was tied to its record
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// Title or URL equal to the record's
    Exact,
    /// One title contains the other
    Fuzzy,
    /// First record still unclaimed
    Positional,
    /// No table; response found next to the title in running text
    TextSearch,
    /// Nothing found
    Placeholder,
}

/// One record and the row associated with it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    /// Locator of the record
    pub locator: String,

    /// Position of the record in the input
    pub record_index: usize,

    pub row: ExtractedRow,

    pub kind: MatchKind,
}

impl Association {
    pub fn response(&self) -> &str {
        &self.row.response
    }

    pub const fn rating(&self) -> &Rating {
        &self.row.rating
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == MatchKind::Placeholder
    }
}

/// Extraction result: one association per record, in record order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub entries: Vec<Association>,

    /// Whether a table header was found
    pub table_found: bool,

    /// Human-readable parsing steps
    pub trace: Vec<String>,
}

impl ExtractionReport {
    /// Association for a record locator
    pub fn get(&self, locator: &str) -> Option<&Association> {
        self.entries.iter().find(|a| a.locator == locator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Association> {
        self.entries.iter()
    }

    /// Number of records that got a real response
    pub fn matched(&self) -> usize {
        self.entries.iter().filter(|a| !a.is_placeholder()).count()
    }

    /// Keyed by locator. Records sharing a locator collapse to the first.
    pub fn into_map(self) -> HashMap<String, Association> {
        let mut map = HashMap::with_capacity(self.entries.len());
        for entry in self.entries {
            map.entry(entry.locator.clone()).or_insert(entry);
        }
        map
    }
}

impl<'a> IntoIterator for &'a ExtractionReport {
    type Item = &'a Association;
    type IntoIter = std::slice::Iter<'a, Association>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Working state for one extraction
struct Extraction<'a, R> {
    records: &'a [R],
    slots: Vec<Option<(ExtractedRow, MatchKind)>>,
    trace: Vec<String>,
}

impl<'a, R: SourceRecord> Extraction<'a, R> {
    fn new(records: &'a [R]) -> Self {
        Self {
            records,
            slots: vec![None; records.len()],
            trace: Vec::new(),
        }
    }

    fn step(&mut self, message: String) {
        tracing::debug!(target: "reddit_engage::extract", "{message}");
        self.trace.push(message);
    }

    fn unclaimed(&self) -> impl Iterator<Item = (usize, &'a R)> + '_ {
        self.records
            .iter()
            .enumerate()
            .filter(|(i, _)| self.slots[*i].is_none())
    }

    fn find_exact(&self, row: &ExtractedRow) -> Option<usize> {
        self.unclaimed()
            .find(|(_, r)| {
                r.title() == row.title
                    || r.title() == row.title_cell
                    || row.link.as_deref().is_some_and(|url| url == r.locator())
            })
            .map(|(i, _)| i)
    }

    fn find_fuzzy(&self, row: &ExtractedRow) -> Option<usize> {
        let wanted = row.title.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        self.unclaimed()
            .find(|(_, r)| {
                let have = r.title().trim().to_lowercase();
                !have.is_empty() && (have.contains(&wanted) || wanted.contains(&have))
            })
            .map(|(i, _)| i)
    }

    fn find_positional(&self) -> Option<usize> {
        self.unclaimed().next().map(|(i, _)| i)
    }

    fn associate(&mut self, row: ExtractedRow) {
        let found = self
            .find_exact(&row)
            .map(|i| (i, MatchKind::Exact))
            .or_else(|| self.find_fuzzy(&row).map(|i| (i, MatchKind::Fuzzy)))
            .or_else(|| self.find_positional().map(|i| (i, MatchKind::Positional)));

        match found {
            Some((index, kind)) => {
                self.step(format!(
                    "{kind:?} match: '{}' -> '{}'",
                    row.title,
                    self.records[index].title()
                ));
                self.slots[index] = Some((row, kind));
            }
            None => self.step(format!("No record left for row '{}'", row.title)),
        }
    }

    fn parse_table(&mut self, lines: &[&str], bounds: table::TableBounds) {
        self.step(format!("Found table header at line {}: {}", bounds.header, lines[bounds.header]));
        if bounds.has_separator {
            self.step(format!("Found separator at line {}", bounds.header + 1));
        } else {
            self.step("No separator line after header".into());
        }
        if bounds.end == lines.len() {
            self.step("Table extends to end of text".into());
        } else {
            self.step(format!("Found table end at line {}", bounds.end));
        }

        for (offset, line) in lines[bounds.body_start..bounds.end].iter().enumerate() {
            let line_no = bounds.body_start + offset;
            if table::is_separator(line) {
                continue;
            }
            match table::parse_row(line) {
                Some(row) => self.associate(row),
                None => self.step(format!("Skipped malformed row at line {line_no}")),
            }
        }
    }

    fn search_text(&mut self, lines: &[&str]) {
        self.step("No table header found, searching text for post titles".into());

        let records = self.records;
        for (index, record) in records.iter().enumerate() {
            let title = record.title().trim().to_lowercase();
            if title.is_empty() {
                continue;
            }

            let hit = lines
                .iter()
                .enumerate()
                .filter(|(_, line)| line.to_lowercase().contains(&title))
                .find_map(|(i, _)| response_after(lines, i).map(|r| (i, r)));

            if let Some((line_no, response)) = hit {
                self.step(format!("Found title '{}' at line {line_no}", record.title()));
                let row = ExtractedRow {
                    title_cell: record.title().to_string(),
                    title: record.title().to_string(),
                    link: None,
                    response: response.to_string(),
                    rating: Rating::Medium,
                };
                self.slots[index] = Some((row, MatchKind::TextSearch));
            }
        }
    }

    fn finish(mut self, table_found: bool) -> ExtractionReport {
        let records = self.records;
        let slots = std::mem::take(&mut self.slots);
        let mut entries = Vec::with_capacity(records.len());

        for (index, (record, slot)) in records.iter().zip(slots).enumerate() {
            let (row, kind) = slot.unwrap_or_else(|| {
                self.step(format!("Placeholder for '{}'", record.title()));
                (placeholder_row(record), MatchKind::Placeholder)
            });
            entries.push(Association {
                locator: record.locator().to_string(),
                record_index: index,
                row,
                kind,
            });
        }

        self.step(format!(
            "Associated {} of {} records",
            entries.iter().filter(|a| a.kind != MatchKind::Placeholder).count(),
            entries.len()
        ));

        ExtractionReport {
            entries,
            table_found,
            trace: self.trace,
        }
    }
}

/// First usable line within the window after `hit`
fn response_after<'t>(lines: &[&'t str], hit: usize) -> Option<&'t str> {
    lines
        .iter()
        .skip(hit + 1)
        .take(TEXT_SEARCH_WINDOW)
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && *l != "---" && !l.starts_with('#') && !table::is_separator(l))
}

fn placeholder_row<R: SourceRecord>(record: &R) -> ExtractedRow {
    ExtractedRow {
        title_cell: record.title().to_string(),
        title: record.title().to_string(),
        link: None,
        response: PLACEHOLDER_RESPONSE.to_string(),
        rating: Rating::Unknown,
    }
}

/// Associate the table rows in `text` with `records`.
///
/// Always returns exactly one entry per record, in input order.
pub fn extract<R: SourceRecord>(text: &str, records: &[R]) -> ExtractionReport {
    let lines: Vec<&str> = text.lines().collect();
    let mut extraction = Extraction::new(records);
    extraction.step(format!("Total lines in response: {}", lines.len()));

    match table::locate(&lines) {
        Some(bounds) => {
            extraction.parse_table(&lines, bounds);
            extraction.finish(true)
        }
        None => {
            extraction.search_text(&lines);
            extraction.finish(false)
        }
    }
}

/// Whether `text` holds something that looks like a table header
pub fn has_table(text: &str) -> bool {
    let lines: Vec<&str> = text.lines().collect();
    table::find_header(&lines).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug)]
    struct Rec {
        title: &'static str,
        url: &'static str,
    }

    impl SourceRecord for Rec {
        fn title(&self) -> &str {
            self.title
        }

        fn locator(&self) -> &str {
            self.url
        }
    }

    fn rec(title: &'static str, url: &'static str) -> Rec {
        Rec { title, url }
    }

    fn three_posts() -> Vec<Rec> {
        vec![
            rec("Rust 2024 edition released", "https://r/1"),
            rec("Best local LLM for coding?", "https://r/2"),
            rec("What are you building this week", "https://r/3"),
        ]
    }

    const WELL_FORMED: &str = "\
Here are my suggestions:

| Post Title | Suggested Response | Engagement Potential |
|-----------|-------------------|---------------------|
| Best local LLM for coding? | Try a quantized coder model first. | High |
| Rust 2024 edition released | The new capture rules are great. | Medium |
| What are you building this week | A tiny HTTP cache in Rust. | Low |

Good luck!";

    #[test]
    fn test_one_entry_per_record_for_any_text() {
        let records = three_posts();
        for text in ["", "no table", WELL_FORMED, "| Post | x |\n|---|", "|||||\n|||"] {
            let report = extract(text, &records);
            assert_eq!(report.len(), records.len(), "text: {text:?}");
            for (i, entry) in report.iter().enumerate() {
                assert_eq!(entry.record_index, i);
                assert_eq!(entry.locator, records[i].url);
                assert!(!entry.response().is_empty());
            }
        }
    }

    #[test]
    fn test_well_formed_table_matches_exactly() {
        let report = extract(WELL_FORMED, &three_posts());

        assert!(report.table_found);
        assert!(report.iter().all(|a| a.kind == MatchKind::Exact));
        assert_eq!(report.get("https://r/1").unwrap().response(), "The new capture rules are great.");
        assert_eq!(report.get("https://r/2").unwrap().rating(), &Rating::High);
        assert_eq!(report.get("https://r/3").unwrap().rating(), &Rating::Low);
        assert_eq!(report.matched(), 3);
    }

    #[test]
    fn test_no_pipes_gives_placeholders() {
        let report = extract("I could not think of anything useful.\nSorry.", &three_posts());

        assert!(!report.table_found);
        for entry in &report {
            assert_eq!(entry.kind, MatchKind::Placeholder);
            assert_eq!(entry.response(), PLACEHOLDER_RESPONSE);
            assert_eq!(entry.rating(), &Rating::Unknown);
        }
    }

    #[test]
    fn test_link_title_cell() {
        let records = vec![rec("Something else entirely", "http://example.com/foo")];
        let text = "| Post Title | Response | Potential |\n|---|---|---|\n| [Foo Bar](http://example.com/foo) | Nice | High |";
        let report = extract(text, &records);

        let entry = report.get("http://example.com/foo").unwrap();
        assert_eq!(entry.row.title, "Foo Bar");
        assert_eq!(entry.row.link.as_deref(), Some("http://example.com/foo"));
        assert_eq!(entry.kind, MatchKind::Exact);
    }

    #[test]
    fn test_overlapping_titles_are_not_double_assigned() {
        let records = vec![rec("AI", "u/ai"), rec("AI News", "u/news")];
        let text = "\
| Post Title | Response | Potential |
|---|---|---|
| AI | first | High |
| AI | second | Low |";
        let report = extract(text, &records);

        let ai = report.get("u/ai").unwrap();
        assert_eq!(ai.response(), "first");
        assert_eq!(ai.kind, MatchKind::Exact);

        let news = report.get("u/news").unwrap();
        assert_eq!(news.response(), "second");
        assert_eq!(news.kind, MatchKind::Fuzzy);
    }

    #[test]
    fn test_two_cell_row_is_skipped() {
        let records = vec![rec("AI News", "u/news"), rec("Rust", "u/rust")];
        let text = "\
| Post Title | Response | Potential |
|---|---|---|
| AI News | orphan reply |
| Rust | Ship it | High |";
        let report = extract(text, &records);

        assert!(report.get("u/news").unwrap().is_placeholder());
        assert_eq!(report.get("u/rust").unwrap().response(), "Ship it");
        assert!(report.trace.iter().any(|s| s.contains("Skipped malformed row")));
    }

    #[test]
    fn test_extraction_is_idempotent() {
        let records = three_posts();
        let first = extract(WELL_FORMED, &records);
        let second = extract(WELL_FORMED, &records);
        assert_eq!(first, second);
    }

    #[test]
    fn test_fuzzy_then_positional() {
        let records = vec![
            rec("Show HN style thread: my Rust game engine", "u/engine"),
            rec("Weekly discussion", "u/weekly"),
        ];
        let text = "\
| Post Title | Suggested Response | Engagement Potential |
|---|---|---|
| my rust game engine | Love the ECS design. | High |
| Totally unrelated heading | Thanks for hosting! | Medium |";
        let report = extract(text, &records);

        assert_eq!(report.get("u/engine").unwrap().kind, MatchKind::Fuzzy);
        let weekly = report.get("u/weekly").unwrap();
        assert_eq!(weekly.kind, MatchKind::Positional);
        assert_eq!(weekly.response(), "Thanks for hosting!");
    }

    #[test]
    fn test_surplus_rows_are_dropped() {
        let records = vec![rec("Only one", "u/1")];
        let text = "| Post Title | R | E |\n|---|---|---|\n| Only one | a | High |\n| Extra | b | Low |";
        let report = extract(text, &records);
        assert_eq!(report.len(), 1);
        assert_eq!(report.get("u/1").unwrap().response(), "a");
        assert!(report.trace.iter().any(|s| s.contains("No record left")));
    }

    #[test]
    fn test_text_search_without_table() {
        let records = vec![rec("Best local LLM for coding?", "u/llm"), rec("Unmentioned", "u/none")];
        let text = "\
### Best local LLM for coding?

---
Have you tried running a small coder model with 4-bit quantization?

### Something else";
        let report = extract(text, &records);

        let llm = report.get("u/llm").unwrap();
        assert_eq!(llm.kind, MatchKind::TextSearch);
        assert_eq!(
            llm.response(),
            "Have you tried running a small coder model with 4-bit quantization?"
        );
        assert_eq!(llm.rating(), &Rating::Medium);
        assert!(report.get("u/none").unwrap().is_placeholder());
    }

    #[test]
    fn test_missing_separator_keeps_first_row() {
        let records = vec![rec("First", "u/1"), rec("Second", "u/2")];
        let text = "| Post Title | R | E |\n| First | one | High |\n| Second | two | Low |";
        let report = extract(text, &records);

        assert_eq!(report.get("u/1").unwrap().response(), "one");
        assert_eq!(report.get("u/2").unwrap().response(), "two");
        assert!(report.trace.iter().any(|s| s.contains("No separator")));
    }

    #[test]
    fn test_empty_records() {
        let report = extract(WELL_FORMED, &Vec::<Rec>::new());
        assert!(report.is_empty());
    }

    #[test]
    fn test_into_map_keys_by_locator() {
        let map = extract(WELL_FORMED, &three_posts()).into_map();
        assert_eq!(map.len(), 3);
        assert_eq!(map["https://r/2"].response(), "Try a quantized coder model first.");
    }

    #[test]
    fn test_has_table() {
        assert!(has_table(WELL_FORMED));
        assert!(!has_table("plain prose"));
    }
}
