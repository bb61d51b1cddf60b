//! Prompts and post formatting
//!
//! Everything here is plain string building; the agents see posts only
//! through these renderings.


use crate::model::{Post, PostDetails};

/// System prompt for batch response generation
pub const ENGAGEMENT_PROMPT: &str = r#"You're helping craft engaging Reddit responses that get upvotes.

Your task:
1. Analyze the Reddit post content I've selected
2. Draft a concise, authentic response (2-3 sentences works best)
3. Match the subreddit's vibe and culture

Your response should be:
- Helpful or informative
- Add something valuable to the discussion
- Sound natural, not corporate or robotic
- Encourage further conversation

REQUIRED FORMAT - You MUST present your responses in a properly formatted markdown table with these EXACT columns:
| Post Title | Suggested Response | Engagement Potential |

Include a header row and separator row like this:
| Post Title | Suggested Response | Engagement Potential |
|-----------|-------------------|---------------------|

For each post:
1. Post Title: Use the exact title of the post (no need for links)
2. Suggested Response: Write a brief, engaging comment (2-3 sentences)
3. Engagement Potential: Rate as "High", "Medium", or "Low"

Remember: Reddit rewards authenticity and value. No fluff or jargon."#;

/// System prompt for the interactive terminal assistant
pub const ASSISTANT_PROMPT: &str = r#"You are the Reddit Engagement Assistant - you help users craft effective responses to Reddit posts that will earn upvotes and start good discussions.

Your goal is simple:
1. Analyze each Reddit post provided by the user
2. Create ONE engaging response for each post that would be likely to get upvotes
3. Format your output as a clear table showing the post title and your suggested response

Guidelines for good responses:
- Keep them concise but substantive (2-3 sentences is often ideal)
- Be helpful, informative, and authentic
- Match the tone of the subreddit when appropriate
- Add value to the conversation rather than just agreeing
- Ask thoughtful questions or share relevant experiences when appropriate

Format your output as a markdown table with:
| Post Title | Suggested Response | Engagement Potential |
|------------|-------------------|----------------------|
| Title here | Your response here | High/Medium/Low |

When the user asks for posts you have not been shown, use the Reddit tools to fetch them first."#;

/// System prompt for the digest mailer
pub const EMAIL_PROMPT: &str = r#"You are an email sending assistant. Your only job is to send an email with the provided content in a table format.

DO NOT modify, summarize, or change the email content in any way.
DO NOT add any additional text, commentary, or explanations.
DO NOT respond to the user with anything except confirmation that you've sent the email.

Send the email exactly as instructed with the provided subject and content."#;

/// Follow-up sent when a reply came back without a table
pub const TABLE_REQUEST: &str = r#"I need you to provide engaging Reddit responses for the posts I shared earlier.
IMPORTANT: Present your responses in a markdown table with these exact columns:
| Post Title | Suggested Response | Engagement Potential |

For each post, provide:
1. The exact post title
2. A 2-3 sentence response that would get upvotes
3. Rate the engagement potential as High, Medium, or Low

Please format as a proper markdown table, including the header row and separator row."#;

/// Self-text budget in generation requests
pub const CONTEXT_SELFTEXT_CHARS: usize = 300;

/// Self-text budget in terminal listings
pub const TERMINAL_SELFTEXT_CHARS: usize = 500;

/// Comment budget in post details
pub const COMMENT_CHARS: usize = 200;

/// Cut `text` to `max` characters, appending `suffix` when anything was cut
pub fn truncate_chars(text: &str, max: usize, suffix: &str) -> String {
    match text.char_indices().nth(max) {
        Some((byte, _)) => format!("{}{suffix}", &text[..byte]),
        None => text.to_string(),
    }
}

/// Numbered posts for a response-generation request
pub fn format_posts_for_context(posts: &[Post]) -> String {
    let mut out = String::from("Here are the Reddit posts to respond to:\n\n");
    for (i, post) in posts.iter().enumerate() {
        out.push_str(&format!("POST {}:\n", i + 1));
        out.push_str(&format!("Title: {}\n", post.title));
        out.push_str(&format!("Subreddit: r/{}\n", post.subreddit));
        if let Some(text) = post.text() {
            out.push_str(&format!(
                "Content: {}\n",
                truncate_chars(text, CONTEXT_SELFTEXT_CHARS, "..."),
            ));
        }
        out.push_str(&format!("URL: {}\n\n", post.url));
    }
    out
}

/// User message that opens a generation run
pub fn generation_request(posts: &[Post]) -> String {
    format!(
        "Help me write engaging Reddit responses for these posts. For each one, give me a brief \
         but valuable response that would likely get upvotes. Format your response in a table \
         with Post Title, Suggested Response, and Engagement Potential columns.\n\n{}",
        format_posts_for_context(posts)
    )
}

/// Full listing for the terminal assistant
pub fn format_posts_for_terminal(posts: &[Post]) -> String {
    if posts.is_empty() {
        return "No posts found.".into();
    }

    let mut out = String::from("Here are the posts I found on Reddit:\n\n");
    for (i, post) in posts.iter().enumerate() {
        out.push_str(&format!("Post {}:\n", i + 1));
        out.push_str(&format!("Title: {}\n", post.title));
        out.push_str(&format!("URL: {}\n", post.url));
        out.push_str(&format!("Subreddit: r/{}\n", post.subreddit));
        out.push_str(&format!("Author: u/{}\n", post.author));
        out.push_str(&format!(
            "Score: {} | Comments: {} | Posted: {}\n",
            post.score,
            post.num_comments,
            post.created_display(),
        ));
        if let Some(text) = post.text() {
            out.push_str(&format!(
                "Content: {}\n",
                truncate_chars(text, TERMINAL_SELFTEXT_CHARS, "... [truncated]"),
            ));
        }
        out.push('\n');
    }
    out
}

/// Post plus its top comments, appended to a question about that post
pub fn format_post_details(details: &PostDetails) -> String {
    let post = &details.post;
    let mut out = String::new();
    out.push_str(&format!("Post Title: {}\n", post.title));
    out.push_str(&format!("URL: {}\n", post.url));
    out.push_str(&format!("Subreddit: r/{}\n", post.subreddit));
    out.push_str(&format!("Author: u/{}\n", post.author));
    out.push_str(&format!("Score: {} | Comments: {}\n\n", post.score, post.num_comments));

    if !post.selftext.trim().is_empty() {
        out.push_str(&format!("Content: {}\n\n", post.selftext));
    }

    if !details.top_comments.is_empty() {
        out.push_str("Top Comments:\n");
        for (i, comment) in details.top_comments.iter().take(crate::reddit::MAX_TOP_COMMENTS).enumerate() {
            out.push_str(&format!(
                "{}. u/{} (Score: {}): {}\n\n",
                i + 1,
                comment.author,
                comment.score,
                truncate_chars(&comment.body, COMMENT_CHARS, "..."),
            ));
        }
    }
    out
}

/// User message for `/hot`
pub fn hot_request(subreddit: &str, posts: &[Post]) -> String {
    format!(
        "I found these hot posts on r/{subreddit}. Can you help me craft engaging responses to \
         increase my karma?\n\n{}",
        format_posts_for_terminal(posts)
    )
}

/// User message for `/search`
pub fn search_request(query: &str, posts: &[Post]) -> String {
    format!(
        "I found these posts when searching for '{query}'. Can you help me craft engaging \
         responses to increase my karma?\n\n{}",
        format_posts_for_terminal(posts)
    )
}

/// Append fetched post details to the user's own words
pub fn with_post_details(input: &str, details: &PostDetails) -> String {
    format!("{input}\n\nHere are the details of the post:\n\n{}", format_post_details(details))
}

/// First Reddit post URL mentioned in `text`
pub fn find_reddit_url(text: &str) -> Option<String> {
    text.split_whitespace()
        .find(|word| word.contains("reddit.com/r/") && word.contains("/comments/"))
        .map(|word| {
            word.trim_matches(|c: char| matches!(c, '.' | ',' | '!' | '?' | '(' | ')' | '"' | '\'' | '<' | '>'))
                .to_string()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Comment, epoch_to_utc};

    fn post(title: &str, selftext: &str) -> Post {
        Post {
            title: title.into(),
            url: "https://www.reddit.com/r/rust/comments/abc/x/".into(),
            subreddit: "rust".into(),
            author: "ferris".into(),
            score: 10,
            num_comments: 2,
            created: epoch_to_utc(1_735_689_600.0),
            selftext: selftext.into(),
            is_self: !selftext.is_empty(),
        }
    }

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo wörld", 5, "..."), "héllo...");
        assert_eq!(truncate_chars("short", 10, "..."), "short");
        assert_eq!(truncate_chars("exact", 5, "..."), "exact");
    }

    #[test]
    fn test_context_formatting() {
        let long = "x".repeat(400);
        let out = format_posts_for_context(&[post("First", &long), post("Second", "")]);

        assert!(out.starts_with("Here are the Reddit posts to respond to:"));
        assert!(out.contains("POST 1:\nTitle: First\nSubreddit: r/rust\n"));
        assert!(out.contains(&format!("Content: {}...\n", "x".repeat(300))));
        assert!(out.contains("POST 2:\nTitle: Second\nSubreddit: r/rust\nURL: "));
    }

    #[test]
    fn test_terminal_formatting() {
        assert_eq!(format_posts_for_terminal(&[]), "No posts found.");

        let long = "y".repeat(600);
        let out = format_posts_for_terminal(&[post("Title", &long)]);
        assert!(out.contains("Author: u/ferris"));
        assert!(out.contains("Score: 10 | Comments: 2 | Posted: 2025-01-01 00:00:00"));
        assert!(out.contains("... [truncated]"));
    }

    #[test]
    fn test_post_details_formatting() {
        let details = PostDetails {
            post: post("Question", "Body text"),
            top_comments: vec![Comment {
                author: "helper".into(),
                body: "z".repeat(250),
                score: 7,
            }],
        };
        let out = format_post_details(&details);
        assert!(out.contains("Content: Body text"));
        assert!(out.contains(&format!("1. u/helper (Score: 7): {}...", "z".repeat(200))));
    }

    #[test]
    fn test_find_reddit_url() {
        assert_eq!(
            find_reddit_url("What should I say here: https://www.reddit.com/r/rust/comments/abc/title/?"),
            Some("https://www.reddit.com/r/rust/comments/abc/title/".into())
        );
        assert_eq!(find_reddit_url("(reddit.com/r/rust/comments/x)"), Some("reddit.com/r/rust/comments/x".into()));
        assert_eq!(find_reddit_url("see reddit.com/r/rust for more"), None);
    }

    #[test]
    fn test_generation_request_mentions_columns() {
        let req = generation_request(&[post("A", "")]);
        assert!(req.contains("Post Title, Suggested Response, and Engagement Potential"));
        assert!(req.contains("POST 1:"));
    }
}
