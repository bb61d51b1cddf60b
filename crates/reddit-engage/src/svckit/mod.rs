//! Service Kit - Agent Tools
//!
//! Reddit tools implementing `agent_core::Tool` so the assistant can fetch
//! posts on its own.

mod post_details;
mod posts;
mod search;

pub use post_details::PostDetailsTool;
pub use posts::RedditPostsTool;
pub use search::RedditSearchTool;

use std::sync::Arc;

use agent_core::ToolRegistry;

use crate::reddit::RedditClient;

/// Largest listing a tool call may request
pub const MAX_LIMIT: u64 = 25;

fn clamp_limit(requested: Option<u64>, default: u32) -> u32 {
    requested
        .map_or(default, |n| u32::try_from(n.clamp(1, MAX_LIMIT)).unwrap_or(default))
}

/// Register every Reddit tool against one client
pub fn register_all(registry: &mut ToolRegistry, reddit: &Arc<dyn RedditClient>) {
    registry.register(RedditPostsTool::new(Arc::clone(reddit)));
    registry.register(RedditSearchTool::new(Arc::clone(reddit)));
    registry.register(PostDetailsTool::new(Arc::clone(reddit)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reddit::MockRedditClient;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 5), 5);
        assert_eq!(clamp_limit(Some(0), 5), 1);
        assert_eq!(clamp_limit(Some(500), 5), 25);
    }

    #[test]
    fn test_register_all() {
        let reddit: Arc<dyn RedditClient> = Arc::new(MockRedditClient::new());
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &reddit);
        assert_eq!(
            registry.names(),
            vec!["reddit_post_details", "reddit_posts", "reddit_search"]
        );
    }
}
