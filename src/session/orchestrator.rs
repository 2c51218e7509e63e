use thiserror::Error;
use tracing::{info, warn};

use super::prompt::build_augmented_prompt;
use super::Session;
use crate::chat::{ApiError, ChatClient, GenerationParams, Message};

/// Where the augmented prompt lives once a turn has been sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContextMode {
    /// Appended to the transcript and replayed on every later turn.
    #[default]
    Persisted,
    /// Attached to the outgoing request only.
    Ephemeral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    DocumentReady,
    Blocked,
}

#[derive(Error, Debug)]
pub enum TurnError {
    #[error("question is empty")]
    EmptyQuestion,

    #[error("no document has been uploaded")]
    NoDocument,

    #[error("API key not found! Please check your secrets settings.")]
    MissingApiKey,

    #[error("Error occurred while fetching response: {0}")]
    Api(#[from] ApiError),
}

/// Turns user questions into model turns against a [`Session`].
pub struct Orchestrator {
    client: Option<Box<dyn ChatClient>>,
    params: GenerationParams,
    context_mode: ContextMode,
}

impl Orchestrator {
    /// `client` is `None` when no API key was configured.
    pub fn new(client: Option<Box<dyn ChatClient>>) -> Self {
        Self {
            client,
            params: GenerationParams::default(),
            context_mode: ContextMode::default(),
        }
    }

    pub fn with_context_mode(mut self, context_mode: ContextMode) -> Self {
        self.context_mode = context_mode;
        self
    }

    pub fn has_credentials(&self) -> bool {
        self.client.is_some()
    }

    pub fn state(&self, session: &Session) -> SessionState {
        match (session.document(), &self.client) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), None) => SessionState::Blocked,
            (Some(_), Some(_)) => SessionState::DocumentReady,
        }
    }

    /// Runs one turn and returns the trimmed assistant reply.
    ///
    /// Precondition failures leave the transcript untouched. Once the request is
    /// built, the user question (and, when persisted, the augmented prompt) stay
    /// in the transcript even if the call fails.
    pub async fn ask(&self, session: &mut Session, question: &str) -> Result<String, TurnError> {
        if question.is_empty() {
            return Err(TurnError::EmptyQuestion);
        }
        let document = session.document().ok_or(TurnError::NoDocument)?;
        let client = self.client.as_deref().ok_or(TurnError::MissingApiKey)?;

        let prompt = build_augmented_prompt(document.text(), question);
        let transcript = session.transcript_mut();
        transcript.push(Message::user(question));

        let outgoing = match self.context_mode {
            ContextMode::Persisted => {
                transcript.push(Message::system(prompt));
                transcript.messages().to_vec()
            }
            ContextMode::Ephemeral => {
                let mut messages = transcript.messages().to_vec();
                messages.push(Message::system(prompt));
                messages
            }
        };

        info!(
            "Sending question to {} with {} messages",
            self.params.model,
            outgoing.len()
        );

        let reply = match client.chat(&self.params, &outgoing).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Chat turn failed: {}", e);
                return Err(TurnError::Api(e));
            }
        };

        let answer = reply.content.trim().to_string();
        transcript.push(Message::assistant(answer.clone()));
        Ok(answer)
    }
}
