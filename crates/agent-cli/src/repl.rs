//! Reddit Assistant REPL
//!
//! Slash commands fetch posts and hand them to the assistant; anything else
//! is sent as-is, with linked posts expanded first.

use std::sync::Arc;

use reddit_engage::{
    RedditClient, SearchSort,
    prompt,
    reddit::{expand_post_link, normalize_subreddit},
};

use crate::session::ChatSession;

/// Posts fetched per `/hot` or `/search`
pub const FETCH_LIMIT: u32 = 5;

pub const HELP: &str = "\
=== REDDIT ASSISTANT COMMANDS ===
Example queries:
  • Search for recent hot posts on r/LocalLLaMA and r/ChatGPT
  • Draft responses for posts about AI tools
  • Email me engagement opportunities from these posts
  • What's the best response for this post: [URL]

Commands:
  /hot [subreddit] - Get hot posts from a subreddit (default: all)
  /search [query]  - Search for posts across Reddit
  /help            - Show this help message
  /clear           - Clear conversation history
  /exit            - Exit the assistant";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Hot(String),
    Search(String),
    Help,
    Clear,
    Exit,
    Unknown(String),
}

impl Command {
    /// `None` when the line is not a slash command
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if !line.starts_with('/') {
            return None;
        }

        let (name, rest) = line
            .split_once(char::is_whitespace)
            .map_or((line, ""), |(name, rest)| (name, rest.trim()));

        Some(match name.to_lowercase().as_str() {
            "/hot" => Self::Hot(rest.split_whitespace().next().unwrap_or("all").to_string()),
            "/search" => Self::Search(rest.to_string()),
            "/help" => Self::Help,
            "/clear" => Self::Clear,
            "/exit" | "/quit" => Self::Exit,
            _ => Self::Unknown(name.to_string()),
        })
    }

    /// Whether the command reaches Reddit or the model
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Hot(_) | Self::Search(_))
    }
}

/// What one line of input produced
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// Assistant reply
    Reply(String),
    /// Local message (help text, errors)
    Notice(String),
    Cleared,
    Quit,
}

pub struct RedditRepl {
    session: ChatSession,
    reddit: Arc<dyn RedditClient>,
}

impl RedditRepl {
    pub fn new(session: ChatSession, reddit: Arc<dyn RedditClient>) -> Self {
        Self { session, reddit }
    }

    pub async fn handle(&mut self, line: &str) -> Step {
        let line = line.trim();
        if line.is_empty() {
            return Step::Notice(String::new());
        }

        match Command::parse(line) {
            None => {
                let input = expand_post_link(self.reddit.as_ref(), line).await;
                self.ask(input).await
            }
            Some(Command::Exit) => Step::Quit,
            Some(Command::Help) => Step::Notice(HELP.into()),
            Some(Command::Clear) => {
                self.session.clear();
                Step::Cleared
            }
            Some(Command::Unknown(name)) => {
                Step::Notice(format!("Unknown command '{name}'. Type /help for options."))
            }
            Some(Command::Hot(subreddit)) => self.hot(&subreddit).await,
            Some(Command::Search(query)) => self.search(&query).await,
        }
    }

    async fn hot(&mut self, subreddit: &str) -> Step {
        let subreddit = match normalize_subreddit(subreddit) {
            Ok(s) => s,
            Err(e) => return Step::Notice(e.to_string()),
        };

        match self.reddit.hot_posts(&subreddit, FETCH_LIMIT).await {
            Ok(posts) if posts.is_empty() => Step::Notice(format!("No posts found in r/{subreddit}.")),
            Ok(posts) => self.ask(prompt::hot_request(&subreddit, &posts)).await,
            Err(e) => Step::Notice(format!("Error fetching posts from r/{subreddit}: {e}")),
        }
    }

    async fn search(&mut self, query: &str) -> Step {
        if query.is_empty() {
            return Step::Notice("Please provide a search query.".into());
        }

        match self.reddit.search_posts(query, None, SearchSort::Hot, FETCH_LIMIT).await {
            Ok(posts) if posts.is_empty() => Step::Notice(format!("No posts found for '{query}'.")),
            Ok(posts) => self.ask(prompt::search_request(query, &posts)).await,
            Err(e) => Step::Notice(format!("Error searching for '{query}': {e}")),
        }
    }

    async fn ask(&mut self, input: String) -> Step {
        match self.session.ask(input).await {
            Ok(reply) => Step::Reply(reply),
            Err(e) => {
                tracing::debug!(error = %e, "Assistant turn failed");
                Step::Notice(format!("An error occurred: {}", e.user_message()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::{GenerationOptions, ToolRegistry, testing::ScriptedProvider};
    use reddit_engage::MockRedditClient;

    fn repl(replies: &[&str]) -> (RedditRepl, Arc<ScriptedProvider>, Arc<MockRedditClient>) {
        let provider = Arc::new(ScriptedProvider::new(replies.iter().copied()));
        let reddit = Arc::new(MockRedditClient::new());
        let session = ChatSession::new(
            provider.clone(),
            Arc::new(ToolRegistry::new()),
            prompt::ASSISTANT_PROMPT,
            GenerationOptions::default(),
        );
        (RedditRepl::new(session, reddit.clone()), provider, reddit)
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse("/hot"), Some(Command::Hot("all".into())));
        assert_eq!(Command::parse("/hot  rust "), Some(Command::Hot("rust".into())));
        assert_eq!(
            Command::parse("/search async closures"),
            Some(Command::Search("async closures".into()))
        );
        assert_eq!(Command::parse("/search"), Some(Command::Search(String::new())));
        assert_eq!(Command::parse("/QUIT"), Some(Command::Exit));
        assert_eq!(Command::parse("/nope x"), Some(Command::Unknown("/nope".into())));
        assert!(Command::parse("/hot").unwrap().is_remote());
        assert!(!Command::parse("/help").unwrap().is_remote());
    }

    #[tokio::test]
    async fn test_hot_sends_posts_to_assistant() {
        let (mut repl, provider, _) = repl(&["Here are some ideas."]);

        let step = repl.handle("/hot rust").await;
        assert_eq!(step, Step::Reply("Here are some ideas.".into()));

        let request = &provider.prompts()[0][1].content;
        assert!(request.starts_with("I found these hot posts on r/rust."));
        assert!(request.contains("Async closures are stable"));
    }

    #[tokio::test]
    async fn test_search_without_query() {
        let (mut repl, provider, reddit) = repl(&[]);
        assert_eq!(
            repl.handle("/search").await,
            Step::Notice("Please provide a search query.".into())
        );
        assert_eq!(provider.calls(), 0);
        assert_eq!(reddit.fetches(), 0);
    }

    #[tokio::test]
    async fn test_search_with_no_results() {
        let (mut repl, provider, _) = repl(&[]);
        let step = repl.handle("/search zzzqqq").await;
        assert_eq!(step, Step::Notice("No posts found for 'zzzqqq'.".into()));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_link_is_expanded() {
        let (mut repl, provider, _) = repl(&["Say thanks."]);
        let url = "https://www.reddit.com/r/Python/comments/4d5e6f/uv_replaced_my_whole_toolchain/";

        repl.handle(&format!("How should I reply to {url}")).await;
        let request = &provider.prompts()[0][1].content;
        assert!(request.contains("Here are the details of the post:"));
        assert!(request.contains("uv replaced my whole toolchain"));
    }

    #[tokio::test]
    async fn test_clear_and_exit() {
        let (mut repl, provider, _) = repl(&["first", "second"]);
        repl.handle("hello").await;
        assert_eq!(repl.handle("/clear").await, Step::Cleared);
        repl.handle("again").await;
        assert_eq!(provider.prompts()[1].len(), 2);

        assert_eq!(repl.handle("/exit").await, Step::Quit);
    }

    #[tokio::test]
    async fn test_provider_failure_is_a_notice() {
        let (mut repl, _, _) = repl(&[]);
        let step = repl.handle("hello").await;
        assert!(matches!(step, Step::Notice(ref m) if m.starts_with("An error occurred")));
    }
}
