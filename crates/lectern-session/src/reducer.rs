//! Folds stream events into conversation state

use lectern_api::StreamEvent;

use crate::conversation::Conversation;

/// What applying an event did to the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Messages or the continuation token changed; the state must be persisted
    Mutated,
    /// Nothing persistent changed
    Unchanged,
}

impl Applied {
    pub fn is_mutated(self) -> bool {
        self == Applied::Mutated
    }
}

/// Format an error so it reads inline after the partial response
pub fn error_annotation(message: &str) -> String {
    format!("\n\n**Error:** {}", message)
}

/// Apply one event to the conversation.
///
/// Each kind touches a different part of the state, so events of different
/// kinds commute. `Content` events concatenate and must arrive in order.
pub fn apply(conversation: &mut Conversation, event: &StreamEvent) -> Applied {
    match event {
        StreamEvent::Checkpoint { id } => {
            conversation.checkpoint_id = Some(id.clone());
            Applied::Mutated
        }
        StreamEvent::Content { text } => {
            if text.is_empty() {
                return Applied::Unchanged;
            }
            match conversation.in_progress_mut() {
                Some(message) => {
                    message.content.push_str(text);
                    Applied::Mutated
                }
                None => {
                    tracing::warn!("Content arrived with no assistant message in progress");
                    Applied::Unchanged
                }
            }
        }
        StreamEvent::ToolStart { .. } => Applied::Unchanged,
        StreamEvent::End => {
            conversation.is_streaming = false;
            Applied::Unchanged
        }
        StreamEvent::Error { message } => {
            conversation.is_streaming = false;
            match conversation.in_progress_mut() {
                Some(in_progress) => {
                    in_progress.content.push_str(&error_annotation(message));
                    Applied::Mutated
                }
                None => {
                    tracing::warn!("Error arrived with no assistant message in progress: {}", message);
                    Applied::Unchanged
                }
            }
        }
    }
}
