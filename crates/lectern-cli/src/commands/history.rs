//! /history command - list the conversation so far

use lectern_session::{Message, Role};

/// Preview length per message
const PREVIEW_CHARS: usize = 100;

pub struct HistoryCommand;

impl HistoryCommand {
    pub fn execute(messages: &[Message]) -> String {
        if messages.is_empty() {
            return "No messages yet.".to_string();
        }

        let mut output = format!("Conversation ({} messages)\n", messages.len());
        output.push_str(&"-".repeat(40));
        for (i, message) in messages.iter().enumerate() {
            let role = match message.role {
                Role::User => "you",
                Role::Assistant => "assistant",
            };
            let preview = truncate_chars(&message.content.replace('\n', " "), PREVIEW_CHARS);
            output.push_str(&format!("\n{:>3} [{}] {}", i + 1, role, preview));
        }
        output
    }
}

/// Truncate a string to `max` characters, appending "..." if truncated.
/// Operates on Unicode char boundaries, not bytes.
pub fn truncate_chars(s: &str, max: usize) -> String {
    let mut chars = s.chars();
    let truncated: String = chars.by_ref().take(max).collect();
    if chars.next().is_some() {
        format!("{}...", truncated)
    } else {
        truncated
    }
}
