//! Session event types

use crate::quiz::Quiz;

/// Events broadcast while a turn runs
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The user message and assistant placeholder were appended
    TurnStart { message: String },

    /// The server issued a continuation token
    Checkpoint { id: String },

    /// A fragment of assistant text
    Content { text: String },

    /// The server started a tool; `action` is a human-readable status
    ToolStart { action: String },

    /// The turn finished normally
    TurnEnd,

    /// The turn failed; the partial response is kept with an annotation
    Error { message: String },

    /// A valid quiz was extracted from the response
    QuizReady { quiz: Quiz },
}

impl SessionEvent {
    /// Whether this event ends the turn's stream of updates
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionEvent::TurnEnd | SessionEvent::Error { .. })
    }
}
