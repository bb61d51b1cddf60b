//! Email Delivery
//!
//! Mail goes out through whatever `send_email` tool the registry holds. The
//! model composes the message; a send only counts when that tool ran and
//! succeeded.

use std::sync::Arc;

use serde::Serialize;

use crate::error::Result;
use crate::message::{Conversation, Message};
use crate::provider::{GenerationOptions, LlmProvider};
use crate::reasoning::{Agent, AgentConfig};
use crate::tool::ToolRegistry;

/// Tool a mailer must see succeed
pub const SEND_EMAIL_TOOL: &str = "send_email";

/// Result of a send attempt
#[derive(Clone, Debug, Serialize)]
pub struct Delivery {
    /// A `send_email` call ran and succeeded
    pub sent: bool,
    /// What the mailer agent said
    pub reply: String,
}

/// Agent restricted to one job: turning a request into a `send_email` call
pub struct Mailer {
    agent: Agent,
}

impl Mailer {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        generation: GenerationOptions,
        system_prompt: impl Into<String>,
    ) -> Self {
        let config = AgentConfig {
            system_prompt: system_prompt.into(),
            max_iterations: 4,
            generation,
            ..AgentConfig::default()
        };
        Self {
            agent: Agent::new(provider, tools, config),
        }
    }

    pub fn has_email_tool(&self) -> bool {
        self.agent
            .tools()
            .names()
            .iter()
            .any(|n| n.contains(SEND_EMAIL_TOOL))
    }

    /// Run `request` and report whether an email actually left.
    ///
    /// `to` is only used for logging; callers check it with
    /// [`is_plausible_email`] first.
    pub async fn deliver(&self, to: &str, request: String) -> Result<Delivery> {
        if !self.has_email_tool() {
            tracing::warn!("No send_email tool registered; nothing can be delivered");
        }

        let mut conversation = Conversation::with_system_prompt(self.agent.build_system_prompt());
        conversation.push(Message::user(request));

        let outcome = self.agent.run_traced(&mut conversation).await?;
        let sent = outcome.tool_succeeded(SEND_EMAIL_TOOL);

        if sent {
            tracing::info!(%to, "Email sent");
        } else {
            tracing::warn!(%to, "Email not sent: no successful send_email call");
        }

        Ok(Delivery {
            sent,
            reply: outcome.reply,
        })
    }
}

/// Cheap shape check run before any model call
pub fn is_plausible_email(address: &str) -> bool {
    let Some((local, domain)) = address.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.contains(char::is_whitespace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EmailTool, ScriptedProvider};

    fn mailer(provider: Arc<ScriptedProvider>, with_tool: bool) -> Mailer {
        let mut tools = ToolRegistry::new();
        if with_tool {
            tools.register(EmailTool);
        }
        Mailer::new(provider, Arc::new(tools), GenerationOptions::default(), "Send mail.")
    }

    #[test]
    fn test_email_validation() {
        assert!(is_plausible_email("me@example.com"));
        assert!(!is_plausible_email("me@localhost"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("me @example.com"));
        assert!(!is_plausible_email("me@.com"));
    }

    #[tokio::test]
    async fn test_deliver_needs_successful_tool_call() {
        let provider = Arc::new(ScriptedProvider::new([
            "```tool\n{\"tool\": \"send_email\", \"arguments\": {\"to\": \"me@example.com\"}}\n```",
            "Sent.",
        ]));
        let delivery = mailer(provider, true)
            .deliver("me@example.com", "TO: me@example.com".into())
            .await
            .unwrap();
        assert!(delivery.sent);
        assert_eq!(delivery.reply, "Sent.");
    }

    #[tokio::test]
    async fn test_claimed_send_is_not_delivery() {
        let provider = Arc::new(ScriptedProvider::new(["I have sent the email!"]));
        let mailer = mailer(provider, false);
        assert!(!mailer.has_email_tool());

        let delivery = mailer.deliver("me@example.com", "TO: me@example.com".into()).await.unwrap();
        assert!(!delivery.sent);
    }
}
