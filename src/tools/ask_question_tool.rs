use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::mcp::types::{CallToolResult, ToolAnnotations, ToolDefinition};
use crate::session::{Orchestrator, Session, TurnError};
use crate::utils::content_guard::build_error_payload;

pub static ASK_QUESTION_TOOL_DEFINITION: Lazy<ToolDefinition> = Lazy::new(|| ToolDefinition {
    name: "ask-question".to_string(),
    description: "Ask a question about the uploaded PDF. The model sees the beginning of the document and the whole conversation so far.".to_string(),
    input_schema: json!({
        "type": "object",
        "properties": {
            "question": {
                "type": "string",
                "description": "The question about the document"
            }
        },
        "required": ["question"]
    }),
    annotations: Some(ToolAnnotations {
        title: Some("Ask About Document".to_string()),
        read_only_hint: Some(false),
        open_world_hint: Some(true),
    }),
});

#[derive(Debug, Deserialize)]
struct AskQuestionParams {
    question: String,
}

pub struct AskQuestionTool<'a> {
    orchestrator: &'a Orchestrator,
}

impl<'a> AskQuestionTool<'a> {
    pub fn new(orchestrator: &'a Orchestrator) -> Self {
        Self { orchestrator }
    }

    pub async fn execute(
        &self,
        session: &mut Session,
        arguments: Option<serde_json::Value>,
    ) -> CallToolResult {
        let params = match arguments {
            Some(args) => match serde_json::from_value::<AskQuestionParams>(args) {
                Ok(params) => params,
                Err(e) => {
                    error!("Invalid question parameters: {}", e);
                    return CallToolResult::error(format!("Invalid parameters: {}", e));
                }
            },
            None => {
                return CallToolResult::error("Missing required parameters");
            }
        };

        info!(
            "Answering question: \"{}\" (session state: {:?})",
            params.question,
            self.orchestrator.state(session)
        );

        match self.orchestrator.ask(session, &params.question).await {
            Ok(answer) => CallToolResult::success(answer),
            Err(e) => {
                let code = match &e {
                    TurnError::EmptyQuestion => "ERR_EMPTY_QUESTION",
                    TurnError::NoDocument => "ERR_NO_DOCUMENT",
                    TurnError::MissingApiKey => "ERR_CONFIG_API_KEY",
                    TurnError::Api(_) => "ERR_CHAT_API",
                };
                warn!("Question not answered ({}): {}", code, e);
                CallToolResult::error(build_error_payload(
                    code,
                    &e.to_string(),
                    json!({ "question": params.question }),
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::orchestrator::tests::ScriptedClient;
    use crate::utils::pdf::document_from_pages;

    #[tokio::test]
    async fn returns_trimmed_answer() {
        let mut session = Session::new();
        session.load_document(document_from_pages(&["Doc"]));
        let orchestrator = Orchestrator::new(Some(Box::new(ScriptedClient::replying(&[Ok("  Forty-two \n")]))));

        let result = AskQuestionTool::new(&orchestrator)
            .execute(&mut session, Some(json!({"question": "Meaning?"})))
            .await;
        assert!(!result.is_error());
        assert_eq!(result.text(), "Forty-two");
    }

    #[tokio::test]
    async fn reports_missing_api_key() {
        let mut session = Session::new();
        session.load_document(document_from_pages(&["Doc"]));
        let orchestrator = Orchestrator::new(None);

        let result = AskQuestionTool::new(&orchestrator)
            .execute(&mut session, Some(json!({"question": "Meaning?"})))
            .await;
        assert!(result.is_error());
        assert!(result
            .text()
            .starts_with("API key not found! Please check your secrets settings."));
        assert!(result.text().contains("ERR_CONFIG_API_KEY"));
    }

    #[tokio::test]
    async fn reports_api_failure_text() {
        let mut session = Session::new();
        session.load_document(document_from_pages(&["Doc"]));
        let orchestrator = Orchestrator::new(Some(Box::new(ScriptedClient::replying(&[Err("quota exceeded")]))));

        let result = AskQuestionTool::new(&orchestrator)
            .execute(&mut session, Some(json!({"question": "Meaning?"})))
            .await;
        assert!(result.is_error());
        assert!(result.text().starts_with("Error occurred while fetching response:"));
        assert!(result.text().contains("quota exceeded"));
        assert!(result.text().contains("ERR_CHAT_API"));
    }

    #[tokio::test]
    async fn rejects_missing_question_field() {
        let mut session = Session::new();
        let orchestrator = Orchestrator::new(None);
        let result = AskQuestionTool::new(&orchestrator)
            .execute(&mut session, Some(json!({"text": "Meaning?"})))
            .await;
        assert!(result.is_error());
        assert!(result.text().starts_with("Invalid parameters"));
    }
}
