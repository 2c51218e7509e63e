use base64::Engine;
use once_cell::sync::Lazy;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::mcp::types::{CallToolResult, ToolAnnotations, ToolDefinition};
use crate::session::Session;
use crate::utils::content_guard::build_error_payload;
use crate::utils::pdf::extract_document_text_blocking;

pub static UPLOAD_PDF_TOOL_DEFINITION: Lazy<ToolDefinition> = Lazy::new(|| ToolDefinition {
    name: "upload-pdf".to_string(),
    description: "Upload a PDF document and extract its text so that questions can be asked about it. Replaces any previously uploaded document.".to_string(),
    input_schema: json!({
        "type": "object",
        "properties": {
            "path": {
                "type": "string",
                "description": "Path of a PDF file readable by the server"
            },
            "contentBase64": {
                "type": "string",
                "description": "The PDF file content encoded as standard base64"
            }
        },
        "oneOf": [
            {"required": ["path"]},
            {"required": ["contentBase64"]}
        ]
    }),
    annotations: Some(ToolAnnotations {
        title: Some("Upload PDF".to_string()),
        read_only_hint: Some(false),
        open_world_hint: Some(false),
    }),
});

#[derive(Debug, Deserialize)]
struct UploadPdfParams {
    path: Option<String>,
    #[serde(rename = "contentBase64")]
    content_base64: Option<String>,
}

pub struct UploadPdfTool;

impl UploadPdfTool {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute(
        &self,
        session: &mut Session,
        arguments: Option<serde_json::Value>,
    ) -> CallToolResult {
        let params = match arguments {
            Some(args) => match serde_json::from_value::<UploadPdfParams>(args) {
                Ok(params) => params,
                Err(e) => {
                    error!("Invalid upload parameters: {}", e);
                    return CallToolResult::error(format!("Invalid parameters: {}", e));
                }
            },
            None => {
                return CallToolResult::error("Missing required parameters");
            }
        };

        let (source, bytes) = match (params.path, params.content_base64) {
            (Some(path), None) => match tokio::fs::read(&path).await {
                Ok(bytes) => (path, bytes),
                Err(e) => {
                    warn!("Cannot read PDF file {}: {}", path, e);
                    return CallToolResult::error(build_error_payload(
                        "ERR_PDF_SOURCE",
                        "The PDF file could not be read",
                        json!({ "path": path, "error": e.to_string() }),
                    ));
                }
            },
            (None, Some(encoded)) => {
                match base64::engine::general_purpose::STANDARD.decode(encoded.trim()) {
                    Ok(bytes) => ("inline upload".to_string(), bytes),
                    Err(e) => {
                        warn!("Rejected inline PDF upload: {}", e);
                        return CallToolResult::error(build_error_payload(
                            "ERR_PDF_SOURCE",
                            "The uploaded content is not valid base64",
                            json!({ "error": e.to_string() }),
                        ));
                    }
                }
            }
            _ => {
                return CallToolResult::error(
                    "Invalid parameters: provide exactly one of `path` or `contentBase64`",
                );
            }
        };

        info!("Extracting text from {} ({} bytes)", source, bytes.len());

        match extract_document_text_blocking(bytes).await {
            Ok(document) => {
                let summary = format!(
                    "PDF content extracted successfully.\n---\nDocument:\n- Source: {}\n- Pages: {}\n- Characters: {}\n---",
                    source,
                    document.page_count(),
                    document.char_count()
                );
                session.load_document(document);
                CallToolResult::success(summary)
            }
            Err(e) => {
                warn!("Failed to extract text from {}: {}", source, e);
                session.clear_document();
                CallToolResult::error(build_error_payload(
                    "ERR_PDF_PARSE",
                    &format!("Could not read the PDF: {}", e),
                    json!({
                        "source": source,
                        "hint": "Upload a valid PDF file before asking questions."
                    }),
                ))
            }
        }
    }
}
