//! Offline Extraction
//!
//! Runs the row extractor over saved model output without touching Reddit
//! or a model.


use anyhow::Context;
use reddit_engage::{ExtractionReport, SourceRecord, extract};
use serde::Deserialize;

/// Minimal record read from the `--posts` file
#[derive(Clone, Debug, Deserialize)]
pub struct Record {
    pub title: String,
    #[serde(alias = "locator", alias = "permalink")]
    pub url: String,
    #[serde(default)]
    pub selftext: String,
}

impl SourceRecord for Record {
    fn title(&self) -> &str {
        &self.title
    }

    fn locator(&self) -> &str {
        &self.url
    }

    fn body(&self) -> &str {
        &self.selftext
    }
}

/// Parse the posts JSON: an array of `{title, url}` objects
pub fn parse_records(json: &str) -> anyhow::Result<Vec<Record>> {
    serde_json::from_str(json).context("posts file must be a JSON array of {title, url} objects")
}

pub fn run(text: &str, records: &[Record]) -> ExtractionReport {
    extract(text, records)
}

/// Human-readable listing of a report
pub fn render(records: &[Record], report: &ExtractionReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{} of {} posts matched (table {})\n",
        report.matched(),
        report.len(),
        if report.table_found { "found" } else { "not found" },
    ));

    for entry in report {
        let title = records.get(entry.record_index).map_or("?", |r| r.title.as_str());
        out.push('\n');
        out.push_str(&format!("{}. {title}\n", entry.record_index + 1));
        out.push_str(&format!("   {}\n", entry.locator));
        out.push_str(&format!("   [{:?}] {}\n", entry.kind, entry.rating()));
        out.push_str(&format!("   {}\n", entry.response()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use reddit_engage::MatchKind;

    const POSTS: &str = r#"[
        {"title": "Best model for coding?", "url": "https://www.reddit.com/r/LocalLLaMA/comments/1/a/"},
        {"title": "AI News", "locator": "https://www.reddit.com/r/ChatGPT/comments/2/b/", "selftext": "weekly"}
    ]"#;

    #[test]
    fn test_parse_records_accepts_aliases() {
        let records = parse_records(POSTS).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].locator(), "https://www.reddit.com/r/ChatGPT/comments/2/b/");
        assert_eq!(records[1].body(), "weekly");

        assert!(parse_records("{\"title\": \"x\"}").is_err());
    }

    #[test]
    fn test_render_lists_every_record() {
        let records = parse_records(POSTS).unwrap();
        let text = "| Post Title | Suggested Response | Engagement Potential |\n\
                    |---|---|---|\n\
                    | AI News | Thanks for the roundup! | Medium |";

        let report = run(text, &records);
        assert_eq!(report.get("https://www.reddit.com/r/ChatGPT/comments/2/b/").unwrap().kind, MatchKind::Exact);

        let rendered = render(&records, &report);
        assert!(rendered.starts_with("1 of 2 posts matched (table found)"));
        assert!(rendered.contains("2. AI News"));
        assert!(rendered.contains("[Exact] Medium"));
        assert!(rendered.contains("[Placeholder] Unknown"));
    }
}
