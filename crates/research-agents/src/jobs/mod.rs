//! Job Openings
//!
//! The search agent is asked for `{"job_openings": [{"title", "link"}]}` but
//! models wrap, trim or garble it. Extraction tries, in order:
//!
//! 1. the first fenced `json` block, read as that object
//! 2. every `"title": "…"` and `"link": "…"` pair in the raw text, used only
//!    when both counts agree
//! 3. nothing: an empty list

mod search;

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

pub use search::{JobSearch, JobSearchResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobOpening {
    pub title: String,
    #[serde(alias = "url")]
    pub link: String,
}

static FENCED_JSON: OnceLock<Option<Regex>> = OnceLock::new();
static TITLE_FIELD: OnceLock<Option<Regex>> = OnceLock::new();
static LINK_FIELD: OnceLock<Option<Regex>> = OnceLock::new();

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

/// Pull job openings out of a model reply
pub fn extract_jobs(text: &str) -> Vec<JobOpening> {
    if let Some(jobs) = from_fenced_json(text) {
        return jobs;
    }

    let jobs = from_field_pairs(text);
    if jobs.is_empty() {
        tracing::debug!("No job openings found in reply");
    }
    jobs
}

/// `None` when there is no usable block; an empty list is a valid answer
fn from_fenced_json(text: &str) -> Option<Vec<JobOpening>> {
    let fenced = pattern(&FENCED_JSON, r"```json\s*([\s\S]*?)\s*```")?;
    let block = fenced.captures(text)?.get(1)?.as_str();

    let value: serde_json::Value = match serde_json::from_str(block) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "Fenced json block did not parse");
            return None;
        }
    };
    let openings = value.get("job_openings")?.clone();

    match serde_json::from_value(openings) {
        Ok(jobs) => Some(jobs),
        Err(e) => {
            tracing::debug!(error = %e, "job_openings entries are malformed");
            None
        }
    }
}

fn from_field_pairs(text: &str) -> Vec<JobOpening> {
    let (Some(title), Some(link)) = (
        pattern(&TITLE_FIELD, r#""title":\s*"([^"]+)""#),
        pattern(&LINK_FIELD, r#""link":\s*"([^"]+)""#),
    ) else {
        return Vec::new();
    };

    let titles: Vec<&str> = title.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();
    let links: Vec<&str> = link.captures_iter(text).filter_map(|c| c.get(1)).map(|m| m.as_str()).collect();

    if titles.len() != links.len() {
        tracing::debug!(titles = titles.len(), links = links.len(), "Unpaired job fields ignored");
        return Vec::new();
    }

    titles
        .into_iter()
        .zip(links)
        .map(|(title, link)| JobOpening {
            title: title.to_string(),
            link: link.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(title: &str, link: &str) -> JobOpening {
        JobOpening {
            title: title.into(),
            link: link.into(),
        }
    }

    #[test]
    fn test_fenced_json_block() {
        let text = r#"Here is what I found:

```json
{
  "job_openings": [
    {"title": "Backend Engineer", "link": "https://jobs.example/1"},
    {"title": "Platform Engineer", "link": "https://jobs.example/2"}
  ]
}
```

Good luck!"#;
        assert_eq!(
            extract_jobs(text),
            vec![
                job("Backend Engineer", "https://jobs.example/1"),
                job("Platform Engineer", "https://jobs.example/2"),
            ]
        );
    }

    #[test]
    fn test_only_first_fenced_block_is_read() {
        let text = "```json\n{\"job_openings\": [{\"title\": \"A\", \"link\": \"https://a\"}]}\n```\n\
                    ```json\n{\"job_openings\": [{\"title\": \"B\", \"link\": \"https://b\"}]}\n```";
        assert_eq!(extract_jobs(text), vec![job("A", "https://a")]);
    }

    #[test]
    fn test_empty_openings_list_is_an_answer() {
        let text = "```json\n{\"job_openings\": []}\n```\n\"title\": \"Stray\", \"link\": \"https://stray\"";
        assert!(extract_jobs(text).is_empty());
    }

    #[test]
    fn test_broken_block_falls_back_to_field_pairs() {
        let text = r#"```json
{"job_openings": [{"title": "Data Engineer", "link": "https://jobs.example/9"},
```
"#;
        assert_eq!(extract_jobs(text), vec![job("Data Engineer", "https://jobs.example/9")]);
    }

    #[test]
    fn test_unfenced_json_uses_field_pairs() {
        let text = r#"{"job_openings": [{"title": "SRE", "link": "https://x/1"}, {"title": "QA", "link": "https://x/2"}]}"#;
        assert_eq!(extract_jobs(text), vec![job("SRE", "https://x/1"), job("QA", "https://x/2")]);
    }

    #[test]
    fn test_block_without_openings_key_falls_back() {
        let text = "```json\n{\"results\": [{\"title\": \"Dev\", \"link\": \"https://d\"}]}\n```";
        assert_eq!(extract_jobs(text), vec![job("Dev", "https://d")]);
    }

    #[test]
    fn test_url_alias_in_block() {
        let text = "```json\n{\"job_openings\": [{\"title\": \"Dev\", \"url\": \"https://d\"}]}\n```";
        assert_eq!(extract_jobs(text), vec![job("Dev", "https://d")]);
    }

    #[test]
    fn test_unpaired_fields_give_nothing() {
        let text = r#""title": "One", "link": "https://1", "title": "Two""#;
        assert!(extract_jobs(text).is_empty());
    }

    #[test]
    fn test_plain_prose_gives_nothing() {
        assert!(extract_jobs("I could not find any openings in that location.").is_empty());
        assert!(extract_jobs("").is_empty());
    }
}
