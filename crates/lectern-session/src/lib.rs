//! lectern-session: conversations with the study assistant
//!
//! This crate owns the per-document conversation state, folds chat stream
//! events into it, extracts quizzes from assistant responses and runs
//! cancellable turns against a [`lectern_api::ChatTransport`].

pub mod attempt;
pub mod conversation;
pub mod error;
pub mod events;
pub mod handle;
pub mod prompt;
pub mod quiz;
pub mod reducer;
pub mod session;
pub mod store;

pub use attempt::{Answer, QuizAttempt, Score};
pub use conversation::{Conversation, ConversationRecord, Message, Role};
pub use error::{Error, Result};
pub use events::SessionEvent;
pub use handle::TurnHandle;
pub use prompt::{Difficulty, QuizPrompt};
pub use quiz::{Quiz, QuizQuestion, extract_quiz, is_quiz_request, validate_quiz, validate_quiz_value};
pub use session::{SessionConfig, StudySession, TurnOutcome};
pub use store::{ConversationStore, MemoryStore, StoreError};
