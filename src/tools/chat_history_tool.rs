use once_cell::sync::Lazy;
use serde_json::json;
use tracing::debug;

use crate::mcp::types::{CallToolResult, ToolAnnotations, ToolDefinition};
use crate::session::Session;

pub static CHAT_HISTORY_TOOL_DEFINITION: Lazy<ToolDefinition> = Lazy::new(|| ToolDefinition {
    name: "chat-history".to_string(),
    description: "Show the conversation transcript of this session, oldest message first"
        .to_string(),
    input_schema: json!({
        "type": "object",
        "properties": {}
    }),
    annotations: Some(ToolAnnotations {
        title: Some("Chat History".to_string()),
        read_only_hint: Some(true),
        open_world_hint: Some(false),
    }),
});

pub struct ChatHistoryTool;

impl ChatHistoryTool {
    pub fn new() -> Self {
        Self
    }

    pub fn execute(&self, session: &Session) -> CallToolResult {
        debug!("Rendering {} transcript entries", session.transcript().len());

        let rendered = session
            .transcript()
            .messages()
            .iter()
            .enumerate()
            .map(|(i, message)| format!("{}. [{}] {}", i + 1, message.role, message.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        CallToolResult::success(rendered)
    }
}
