//! Conversational retrieval-augmented answering.

mod engine;

pub use engine::RetrievalEngine;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question/answer exchange in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogueTurn {
    /// The question as asked.
    pub question: String,
    /// The generated answer.
    pub answer: String,
    /// When the question was asked.
    pub asked_at: DateTime<Utc>,
}

impl DialogueTurn {
    pub fn new(question: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            asked_at: Utc::now(),
        }
    }
}

/// Ordered, append-only conversation history for one session.
pub type DialogueHistory = Vec<DialogueTurn>;
