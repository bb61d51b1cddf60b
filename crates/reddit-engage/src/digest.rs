//! Engagement Digest
//!
//! A markdown summary of generated responses, mailed through whatever
//! `send_email` tool the remote toolkit provides.

use std::sync::Arc;

use agent_core::mail::{Mailer, is_plausible_email};
use agent_core::{GenerationOptions, LlmProvider, ToolRegistry};
use serde::Serialize;

use crate::context::EngagementContext;
use crate::error::{EngageError, Result};
use crate::extract::ExtractionReport;
use crate::model::Post;
use crate::prompt;

pub const DEFAULT_SUBJECT: &str = "Reddit Engagement Opportunities";

pub use agent_core::mail::Delivery;

/// A composed digest
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub subject: String,
    /// Markdown body
    pub body: String,
}

/// Cells may not contain raw newlines or pipes
fn table_cell(text: &str) -> String {
    text.replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace('|', "\\|")
}

impl Digest {
    /// Render the report as a markdown table.
    ///
    /// `posts` must be the records the report was extracted against.
    pub fn compose(posts: &[Post], report: &ExtractionReport, analysis: Option<&str>) -> Self {
        let mut body = String::from(
            "# Reddit Engagement Opportunities\n\nHere are your engagement opportunities for maximum karma:\n\n",
        );
        body.push_str("| Post Title & Link | Suggested Response | Engagement Potential |\n");
        body.push_str("|-------------------|-------------------|---------------------|\n");

        for entry in report {
            let (title, url) = posts
                .get(entry.record_index)
                .map_or((entry.row.title.as_str(), entry.locator.as_str()), |p| {
                    (p.title.as_str(), p.url.as_str())
                });

            body.push_str(&format!(
                "| [{}]({url}) | {} | {} |\n",
                table_cell(title).replace(']', "\\]"),
                table_cell(entry.response()),
                entry.rating(),
            ));
        }

        if let Some(analysis) = analysis.filter(|a| !a.trim().is_empty()) {
            body.push_str("\n\n## Full Analysis\n\n");
            body.push_str(analysis);
        }

        Self {
            subject: DEFAULT_SUBJECT.into(),
            body,
        }
    }

    /// Compose from a context that already has responses
    pub fn from_context(context: &EngagementContext, include_analysis: bool) -> Result<Self> {
        let report = context
            .report()
            .ok_or_else(|| EngageError::Empty("generate responses first".into()))?;
        let analysis = include_analysis.then(|| context.analysis()).flatten();
        Ok(Self::compose(context.responded_posts(), report, analysis))
    }

    #[must_use]
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        let subject = subject.into();
        if !subject.trim().is_empty() {
            self.subject = subject;
        }
        self
    }
}

/// Sends digests through a mailer agent with the email system prompt
pub struct DigestMailer {
    mailer: Mailer,
}

impl DigestMailer {
    pub fn new(provider: Arc<dyn LlmProvider>, tools: Arc<ToolRegistry>, generation: GenerationOptions) -> Self {
        Self {
            mailer: Mailer::new(provider, tools, generation, prompt::EMAIL_PROMPT),
        }
    }

    pub fn has_email_tool(&self) -> bool {
        self.mailer.has_email_tool()
    }

    pub async fn send(&self, to: &str, digest: &Digest) -> Result<Delivery> {
        let to = to.trim();
        if !is_plausible_email(to) {
            return Err(EngageError::InvalidRecipient(to.to_string()));
        }

        let request = format!(
            "Please send an email with the following details in a well structured table using the \
             CONTENT material using HTML/CSS formatting:\n\nTO: {to}\nSUBJECT: {}\n\nCONTENT:\n{}\n\n\
             IMPORTANT: MAKE SURE THE EMAIL IS FORMATTED WELL IN A TABLE FORMAT.",
            digest.subject, digest.body
        );

        Ok(self.mailer.deliver(to, request).await?)
    }

    /// Send the context's digest and record success on it
    pub async fn send_for(
        &self,
        context: &mut EngagementContext,
        to: &str,
        subject: Option<&str>,
        include_analysis: bool,
    ) -> Result<Delivery> {
        let mut digest = Digest::from_context(context, include_analysis)?;
        if let Some(subject) = subject {
            digest = digest.with_subject(subject);
        }
        let delivery = self.send(to, &digest).await?;
        if delivery.sent {
            context.mark_email_sent();
        }
        Ok(delivery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract;
    use crate::model::epoch_to_utc;
    use agent_core::testing::{EmailTool, ScriptedProvider};

    fn post(title: &str, url: &str) -> Post {
        Post {
            title: title.into(),
            url: url.into(),
            subreddit: "rust".into(),
            author: "a".into(),
            score: 1,
            num_comments: 0,
            created: epoch_to_utc(0.0),
            selftext: String::new(),
            is_self: false,
        }
    }

    fn sample() -> (Vec<Post>, ExtractionReport) {
        let posts = vec![post("First post", "https://r/1"), post("Second post", "https://r/2")];
        let text = "| Post Title | Suggested Response | Engagement Potential |\n|---|---|---|\n| First post | Line one<br>continues | High |";
        let report = extract(text, &posts);
        (posts, report)
    }

    #[test]
    fn test_compose_layout() {
        let (posts, report) = sample();
        let digest = Digest::compose(&posts, &report, Some("Full reply text"));

        assert_eq!(digest.subject, DEFAULT_SUBJECT);
        assert!(digest.body.starts_with("# Reddit Engagement Opportunities\n"));
        assert!(digest.body.contains("| Post Title & Link | Suggested Response | Engagement Potential |"));
        assert!(digest.body.contains("| [First post](https://r/1) | Line one<br>continues | High |"));
        assert!(digest.body.contains(&format!(
            "| [Second post](https://r/2) | {} | Unknown |",
            crate::extract::PLACEHOLDER_RESPONSE
        )));
        assert!(digest.body.ends_with("## Full Analysis\n\nFull reply text"));
    }

    #[test]
    fn test_compose_flattens_newlines() {
        assert_eq!(table_cell("a\nb\r\nc|d"), "a b c\\|d");

        let (posts, report) = sample();
        let digest = Digest::compose(&posts, &report, None);
        assert!(!digest.body.contains("## Full Analysis"));
    }

    #[test]
    fn test_from_context_requires_responses() {
        let ctx = EngagementContext::new();
        assert!(matches!(Digest::from_context(&ctx, true), Err(EngageError::Empty(_))));
    }

    fn mailer(provider: Arc<ScriptedProvider>, with_tool: bool) -> DigestMailer {
        let mut tools = ToolRegistry::new();
        if with_tool {
            tools.register(EmailTool);
        }
        DigestMailer::new(provider, Arc::new(tools), GenerationOptions::default())
    }

    #[tokio::test]
    async fn test_send_succeeds_when_tool_succeeds() {
        let provider = Arc::new(ScriptedProvider::new([
            "```tool\n{\"tool\": \"send_email\", \"arguments\": {\"to\": \"me@example.com\"}}\n```",
            "Email sent.",
        ]));
        let (posts, report) = sample();
        let digest = Digest::compose(&posts, &report, None);

        let delivery = mailer(provider.clone(), true).send("me@example.com", &digest).await.unwrap();
        assert!(delivery.sent);
        assert_eq!(delivery.reply, "Email sent.");

        let request = &provider.prompts()[0][1].content;
        assert!(request.contains("TO: me@example.com"));
        assert!(request.contains("SUBJECT: Reddit Engagement Opportunities"));
    }

    #[tokio::test]
    async fn test_send_without_tool_call_is_not_success() {
        let provider = Arc::new(ScriptedProvider::new(["I have sent the email!"]));
        let (posts, report) = sample();
        let digest = Digest::compose(&posts, &report, None);

        let delivery = mailer(provider, false).send("me@example.com", &digest).await.unwrap();
        assert!(!delivery.sent);
    }

    #[tokio::test]
    async fn test_send_rejects_bad_recipient() {
        let provider = Arc::new(ScriptedProvider::new(Vec::<String>::new()));
        let digest = Digest {
            subject: "s".into(),
            body: "b".into(),
        };
        let result = mailer(provider.clone(), true).send("nobody", &digest).await;
        assert!(matches!(result, Err(EngageError::InvalidRecipient(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_send_for_marks_context() {
        let provider = Arc::new(ScriptedProvider::new([
            "```tool\n{\"tool\": \"send_email\", \"arguments\": {\"to\": \"me@example.com\"}}\n```",
            "Done.",
        ]));
        let (posts, report) = sample();
        let mut ctx = EngagementContext::new();
        ctx.set_posts(posts.clone());
        ctx.set_responses(posts, "analysis".into(), report);

        let delivery = mailer(provider, true)
            .send_for(&mut ctx, "me@example.com", Some("Custom"), true)
            .await
            .unwrap();
        assert!(delivery.sent);
        assert!(ctx.email_sent);
    }
}
