use anyhow::Result;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, error, info, warn};

use super::transport::{parse_message, LineTransport, StdioTransport};
use super::types::*;
use crate::session::{Orchestrator, Session};
use crate::tools::{
    ask_question_tool::{AskQuestionTool, ASK_QUESTION_TOOL_DEFINITION},
    chat_history_tool::{ChatHistoryTool, CHAT_HISTORY_TOOL_DEFINITION},
    upload_pdf_tool::{UploadPdfTool, UPLOAD_PDF_TOOL_DEFINITION},
};

const PROTOCOL_VERSION: &str = "2024-11-05";

/// One MCP connection is one chat session.
pub struct McpServer {
    orchestrator: Orchestrator,
    session: Session,
    initialized: bool,
}

impl McpServer {
    pub fn new(orchestrator: Orchestrator) -> Self {
        Self {
            orchestrator,
            session: Session::new(),
            initialized: false,
        }
    }

    pub async fn start(&mut self) -> Result<()> {
        info!("MCP server started and listening on stdio");
        let mut transport = StdioTransport::stdio();
        self.serve(&mut transport).await
    }

    pub async fn serve<R, W>(&mut self, transport: &mut LineTransport<R, W>) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while let Some(line) = transport.read_line().await? {
            match parse_message(&line) {
                Ok(McpMessage::Request(request)) => {
                    let response = self.handle_request(request).await;
                    transport.write_response(response).await?;
                }
                Ok(McpMessage::Notification(notification)) => {
                    self.handle_notification(notification);
                }
                Err(e) => {
                    error!("Dropping unparsable message: {}", e);
                    let response =
                        McpResponse::failure(Self::ensure_valid_id(None), PARSE_ERROR, e.to_string());
                    transport.write_response(response).await?;
                }
            }
        }

        info!("Client disconnected");
        Ok(())
    }

    async fn handle_request(&mut self, request: McpRequest) -> McpResponse {
        let id = Self::ensure_valid_id(request.id.clone());

        match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "tools/list" => self.handle_list_tools(id),
            "tools/call" => self.handle_call_tool(id, request.params).await,
            "ping" => McpResponse::success(id, serde_json::json!({})),
            _ => McpResponse::failure(id, METHOD_NOT_FOUND, "Method not found"),
        }
    }

    fn handle_notification(&mut self, notification: McpNotification) {
        debug!("Received notification: {}", notification.method);

        match notification.method.as_str() {
            "notifications/initialized" => {
                info!("Client initialization completed");
                self.initialized = true;
            }
            "notifications/cancelled" => {
                debug!("Request cancelled notification received");
            }
            _ => {
                warn!("Unknown notification method: {}", notification.method);
            }
        }
    }

    fn ensure_valid_id(id: Option<serde_json::Value>) -> serde_json::Value {
        match id {
            Some(serde_json::Value::Null) | None => serde_json::Value::String("0".to_string()),
            Some(value) => value,
        }
    }

    fn handle_initialize(
        &self,
        id: serde_json::Value,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let Some(params) = params else {
            return McpResponse::failure(id, INVALID_PARAMS, "Missing params");
        };

        match serde_json::from_value::<InitializeParams>(params) {
            Ok(init_params) => {
                info!(
                    "Initializing session for {} {} (protocol {}, API key configured: {})",
                    init_params.client_info.name,
                    init_params.client_info.version,
                    init_params.protocol_version,
                    self.orchestrator.has_credentials()
                );

                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    server_info: ServerInfo {
                        name: "PDF Chat MCP".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                        description: Some(
                            "Ask questions about an uploaded PDF using a hosted chat model"
                                .to_string(),
                        ),
                    },
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: Some(false),
                        }),
                        logging: Some(serde_json::json!({})),
                    },
                };

                McpResponse::from_result(id, &result)
            }
            Err(e) => McpResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
        }
    }

    fn handle_list_tools(&self, id: serde_json::Value) -> McpResponse {
        let result = ListToolsResult {
            tools: vec![
                UPLOAD_PDF_TOOL_DEFINITION.clone(),
                ASK_QUESTION_TOOL_DEFINITION.clone(),
                CHAT_HISTORY_TOOL_DEFINITION.clone(),
            ],
        };

        McpResponse::from_result(id, &result)
    }

    async fn handle_call_tool(
        &mut self,
        id: serde_json::Value,
        params: Option<serde_json::Value>,
    ) -> McpResponse {
        let Some(params) = params else {
            return McpResponse::failure(id, INVALID_PARAMS, "Missing params");
        };

        match serde_json::from_value::<CallToolParams>(params) {
            Ok(call_params) => {
                if !self.initialized {
                    debug!("Tool {} called before client initialization", call_params.name);
                }
                let name = call_params.name.clone();
                let result = self.execute_tool(call_params).await;
                if result.is_error() {
                    let text = result.text();
                    warn!("Tool {} failed: {}", name, text.lines().next().unwrap_or_default());
                }
                McpResponse::from_result(id, &result)
            }
            Err(e) => McpResponse::failure(id, INVALID_PARAMS, format!("Invalid params: {}", e)),
        }
    }

    async fn execute_tool(&mut self, params: CallToolParams) -> CallToolResult {
        match params.name.as_str() {
            "upload-pdf" => {
                UploadPdfTool::new()
                    .execute(&mut self.session, params.arguments)
                    .await
            }
            "ask-question" => {
                AskQuestionTool::new(&self.orchestrator)
                    .execute(&mut self.session, params.arguments)
                    .await
            }
            "chat-history" => ChatHistoryTool::new().execute(&self.session),
            _ => CallToolResult::error(format!("Tool not found: {}", params.name)),
        }
    }
}
