//! Chat-completions contract: role-tagged messages in, one assistant message out.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use client::{ApiError, ChatCompletionsClient};

pub const DEFAULT_MODEL: &str = "Qwen2.5-72B-Instruct";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling settings attached to every outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f64,
    pub top_p: f64,
    pub max_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.1,
            top_p: 0.1,
            max_tokens: 500,
        }
    }
}

/// A remote model that answers a message list with a single generated message.
///
/// Implementations perform one request per call and keep no conversation state.
#[async_trait]
pub trait ChatClient: Send + Sync {
    async fn chat(
        &self,
        params: &GenerationParams,
        messages: &[Message],
    ) -> Result<Message, ApiError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
        assert_eq!(Role::System.to_string(), "system");
    }

    #[test]
    fn default_params_match_turn_settings() {
        let params = GenerationParams::default();
        assert_eq!(params.model, "Qwen2.5-72B-Instruct");
        assert_eq!(params.temperature, 0.1);
        assert_eq!(params.top_p, 0.1);
        assert_eq!(params.max_tokens, 500);
    }
}
