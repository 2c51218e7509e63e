//! Per-session state: the cached document and the append-only transcript.

pub mod orchestrator;
pub mod prompt;

use crate::chat::Message;
use crate::utils::pdf::DocumentText;

pub use orchestrator::{ContextMode, Orchestrator, SessionState, TurnError};

pub const SEED_INSTRUCTION: &str = "You are a helpful assistant";

/// Ordered message log. Entries can only be appended.
#[derive(Debug, Clone)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn seeded(instruction: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::system(instruction)],
        }
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    transcript: Transcript,
    document: Option<DocumentText>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::seeded(SEED_INSTRUCTION),
            document: None,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub(crate) fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn document(&self) -> Option<&DocumentText> {
        self.document.as_ref()
    }

    /// Replaces any previously cached document. The transcript is kept.
    pub fn load_document(&mut self, document: DocumentText) {
        self.document = Some(document);
    }

    /// Drops the cached document after a failed upload.
    pub fn clear_document(&mut self) {
        self.document = None;
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
