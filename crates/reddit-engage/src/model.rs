//! Domain Models
//!
//! Posts fetched from Reddit and the rows the extractor pulls out of model
//! output.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Anything the extractor can match a table row against
pub trait SourceRecord {
    /// Identifying title
    fn title(&self) -> &str;

    /// Unique locator (URL)
    fn locator(&self) -> &str;

    /// Free-text body
    fn body(&self) -> &str {
        ""
    }
}

/// A Reddit post
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub title: String,

    /// Absolute permalink, `https://www.reddit.com/r/.../comments/...`
    pub url: String,

    pub subreddit: String,

    pub author: String,

    pub score: i64,

    pub num_comments: u64,

    pub created: DateTime<Utc>,

    /// Body of a text post; empty for link posts
    #[serde(default)]
    pub selftext: String,

    /// Whether this is a text post
    #[serde(default)]
    pub is_self: bool,
}

impl Post {
    /// Self-text of a text post, if any
    pub fn text(&self) -> Option<&str> {
        (self.is_self && !self.selftext.trim().is_empty()).then_some(self.selftext.as_str())
    }

    pub fn created_display(&self) -> String {
        self.created.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl SourceRecord for Post {
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

/// Convert Reddit's float epoch seconds
#[allow(clippy::cast_possible_truncation)]
pub fn epoch_to_utc(seconds: f64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds.trunc() as i64, 0)
        .single()
        .unwrap_or_default()
}

/// A top-level comment on a post
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub author: String,
    pub body: String,
    pub score: i64,
}

/// A post together with its top comments
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PostDetails {
    pub post: Post,
    pub top_comments: Vec<Comment>,
}

/// Listing to fetch from a subreddit
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    #[default]
    Hot,
    New,
    Top,
}

impl std::str::FromStr for PostKind {
    type Err = std::convert::Infallible;

    /// Unknown kinds fall back to `Hot`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_lowercase().as_str() {
            "new" => Self::New,
            "top" => Self::Top,
            _ => Self::Hot,
        })
    }
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hot => write!(f, "hot"),
            Self::New => write!(f, "new"),
            Self::Top => write!(f, "top"),
        }
    }
}

/// Window for top posts
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Hour,
    #[default]
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Timeframe {
    /// Parse a timeframe; anything unrecognised means `Day`
    pub fn parse_or_day(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hour" => Self::Hour,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            "all" => Self::All,
            _ => Self::Day,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::All => "all",
        }
    }
}

/// Result ordering for searches
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchSort {
    #[default]
    Relevance,
    Hot,
    New,
    Top,
    Comments,
}

impl SearchSort {
    pub fn parse_or_relevance(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "hot" => Self::Hot,
            "new" => Self::New,
            "top" => Self::Top,
            "comments" => Self::Comments,
            _ => Self::Relevance,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Hot => "hot",
            Self::New => "new",
            Self::Top => "top",
            Self::Comments => "comments",
        }
    }
}

/// Coarse engagement rating from an open set
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rating {
    High,
    Medium,
    Low,
    /// No rating could be determined
    Unknown,
    /// Anything else the model wrote, verbatim
    Other(String),
}

impl Rating {
    /// Parse a rating cell. Markdown emphasis and case are ignored.
    pub fn parse(cell: &str) -> Self {
        let cleaned = cell.trim().trim_matches(|c| c == '*' || c == '_').trim();
        match cleaned.to_lowercase().as_str() {
            "high" => Self::High,
            "medium" | "med" | "moderate" => Self::Medium,
            "low" => Self::Low,
            "" | "unknown" | "n/a" => Self::Unknown,
            _ => Self::Other(cleaned.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Unknown => "Unknown",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Rating {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Rating> for String {
    fn from(r: Rating) -> Self {
        r.as_str().to_string()
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parsed table row
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Title cell exactly as written
    pub title_cell: String,

    /// Display title (link text when the cell was `[text](url)`)
    pub title: String,

    /// URL from a link-style title cell
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    pub response: String,

    pub rating: Rating,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rating_parse() {
        assert_eq!(Rating::parse("**High**"), Rating::High);
        assert_eq!(Rating::parse(" medium "), Rating::Medium);
        assert_eq!(Rating::parse("LOW"), Rating::Low);
        assert_eq!(Rating::parse(""), Rating::Unknown);
        assert_eq!(Rating::parse("Very High"), Rating::Other("Very High".into()));
    }

    #[test]
    fn test_rating_serializes_as_string() {
        assert_eq!(serde_json::to_string(&Rating::High).unwrap(), "\"High\"");
        let back: Rating = serde_json::from_str("\"Stellar\"").unwrap();
        assert_eq!(back, Rating::Other("Stellar".into()));
    }

    #[test]
    fn test_timeframe_defaults_to_day() {
        assert_eq!(Timeframe::parse_or_day("week"), Timeframe::Week);
        assert_eq!(Timeframe::parse_or_day("fortnight"), Timeframe::Day);
    }

    #[test]
    fn test_post_kind_parse() {
        assert_eq!("TOP".parse::<PostKind>().unwrap(), PostKind::Top);
        assert_eq!("rising".parse::<PostKind>().unwrap(), PostKind::Hot);
    }

    #[test]
    fn test_epoch_conversion() {
        let dt = epoch_to_utc(1_700_000_000.5);
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }
}
