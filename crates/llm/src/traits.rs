use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::AgentContext;
use crate::error::Result;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

/// One message in a running conversation transcript, provider-neutral.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// A stateless request/response text generator bound to one role.
///
/// The caller supplies the role's system context and the conversation
/// so far; implementations hold provider details (endpoint, model,
/// credentials) and nothing about the task tree.
#[async_trait]
pub trait Agent: Send + Sync {
    async fn send(
        &self,
        context: &AgentContext,
        history: &[ChatMessage],
        input: &str,
    ) -> Result<String>;
}

/// Assemble the provider-neutral message list for one agent call.
pub fn build_messages(
    context: &AgentContext,
    history: &[ChatMessage],
    input: &str,
) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(context.system_prompt()));
    messages.extend_from_slice(history);
    messages.push(ChatMessage::user(input));
    messages
}
