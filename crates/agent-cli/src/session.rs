//! Interactive chat session shared by the REPLs

use std::sync::Arc;

use agent_core::{
    Agent, AgentConfig, Conversation, GenerationOptions, LlmProvider, Message, Result, ToolRegistry,
};

/// One agent plus the conversation it keeps across turns
pub struct ChatSession {
    agent: Agent,
    conversation: Conversation,
}

impl ChatSession {
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        tools: Arc<ToolRegistry>,
        system_prompt: &str,
        generation: GenerationOptions,
    ) -> Self {
        let agent = Agent::new(
            provider,
            tools,
            AgentConfig {
                system_prompt: system_prompt.into(),
                generation,
                ..AgentConfig::default()
            },
        );
        let conversation = Conversation::with_system_prompt(agent.build_system_prompt());
        Self { agent, conversation }
    }

    /// Send one user turn and return the reply
    pub async fn ask(&mut self, input: impl Into<String>) -> Result<String> {
        self.conversation.push(Message::user(input));
        self.agent.run(&mut self.conversation).await
    }

    /// Forget everything but the system prompt
    pub fn clear(&mut self) {
        self.conversation.clear_history();
    }

    pub fn turns(&self) -> usize {
        self.conversation.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_core::testing::ScriptedProvider;

    #[tokio::test]
    async fn test_history_and_clear() {
        let provider = Arc::new(ScriptedProvider::new(["one", "two"]));
        let mut session = ChatSession::new(
            provider.clone(),
            Arc::new(ToolRegistry::new()),
            "Be brief.",
            GenerationOptions::default(),
        );

        assert_eq!(session.ask("a").await.unwrap(), "one");
        assert_eq!(session.turns(), 3);

        session.clear();
        assert_eq!(session.turns(), 1);

        assert_eq!(session.ask("b").await.unwrap(), "two");
        assert_eq!(provider.prompts()[1].len(), 2);
        assert!(provider.prompts()[1][0].content.starts_with("Be brief."));
    }
}
