use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

use super::{ChatClient, GenerationParams, Message};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed API response: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct ChatCompletionsClient {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl ChatCompletionsClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self::with_http_client(client, api_key, base_url))
    }

    pub fn with_http_client(client: Client, api_key: String, base_url: &str) -> Self {
        Self {
            client,
            api_key,
            endpoint: completions_endpoint(base_url),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn completions_endpoint(base_url: &str) -> String {
    format!("{}/chat/completions", base_url.trim_end_matches('/'))
}

/// Takes the first choice of a completion body as the assistant reply.
fn parse_completion(body: &str) -> Result<Message, ApiError> {
    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| ApiError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::MalformedResponse("response contains no choices".to_string()))?;

    let content = choice.message.content.ok_or_else(|| {
        ApiError::MalformedResponse("first choice has no message content".to_string())
    })?;

    Ok(Message::assistant(content))
}

#[async_trait]
impl ChatClient for ChatCompletionsClient {
    async fn chat(
        &self,
        params: &GenerationParams,
        messages: &[Message],
    ) -> Result<Message, ApiError> {
        let request_body = ChatCompletionRequest {
            model: &params.model,
            messages,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_tokens,
        };

        debug!(
            "Sending chat completion request to {} (model: {}, messages: {})",
            self.endpoint,
            params.model,
            messages.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!("Chat completions API error: Status {}", status);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Received chat completion response ({} bytes)", body.len());
        parse_completion(&body)
    }
}
