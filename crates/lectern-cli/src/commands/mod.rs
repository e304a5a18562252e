//! Slash commands for interactive mode

mod history;
mod quiz;

pub use history::HistoryCommand;
pub use quiz::QuizCommand;

use std::path::PathBuf;

use lectern_session::{QuizPrompt, StudySession};

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Start a fresh conversation for this document
    NewConversation,
    /// Send this text as the next user message
    Send(String),
    /// Write the last generated quiz to a file
    Export(PathBuf),
    /// Take the last generated quiz again
    TakeQuiz,
    /// Show a message to the user (not sent to the assistant)
    Message(String),
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(
    input: &str,
    session: &StudySession,
    quiz_defaults: &QuizPrompt,
) -> Option<CommandResult> {
    let input = input.trim();
    let rest = input.strip_prefix('/')?;

    let parts: Vec<&str> = rest.splitn(2, ' ').collect();
    let command = parts[0].to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "new" | "clear" | "n" => CommandResult::NewConversation,

        "quiz" => QuizCommand::execute(args, quiz_defaults),

        "take" => CommandResult::TakeQuiz,

        "history" => CommandResult::Message(HistoryCommand::execute(session.messages())),

        "export" => {
            if args.is_empty() {
                CommandResult::Message("Usage: /export <file.json>".to_string())
            } else {
                CommandResult::Export(expand_home(args))
            }
        }

        "quit" | "exit" | "q" => CommandResult::Exit,

        _ => CommandResult::Unknown(command),
    })
}

/// Expand a leading `~` to the home directory
fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest.trim_start_matches('/'),
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?                    Show this help message
  /quiz [n] [easy|medium|hard] [pages]
                                   Ask for a multiple-choice quiz
  /take                            Take the last generated quiz again
  /export <file>                   Save the last generated quiz as JSON
  /history                         Show the conversation so far
  /new, /clear                     Start a new conversation for this document
  /quit, /exit, /q                 Exit lectern

Ctrl-C cancels a response while it is streaming and exits otherwise.

Examples:
  /quiz                            Default quiz (see config file)
  /quiz 10 hard                    Ten hard questions
  /quiz 3 easy 12-15               Three easy questions from pages 12-15
  /export ~/quizzes/biology.json   Save the quiz for later (lectern --take-quiz)"#
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use lectern_api::{ChatEventStream, ChatRequest, ChatTransport};
    use lectern_session::{MemoryStore, SessionConfig};
    use std::sync::Arc;
    use tokio_util::sync::CancellationToken;

    struct NoTransport;

    #[async_trait]
    impl ChatTransport for NoTransport {
        async fn stream_chat(
            &self,
            _request: ChatRequest,
            _cancel: CancellationToken,
        ) -> lectern_api::Result<ChatEventStream> {
            Err(lectern_api::Error::Aborted)
        }
    }

    fn session() -> StudySession {
        StudySession::open(
            "doc",
            Arc::new(NoTransport),
            Arc::new(MemoryStore::new()),
            SessionConfig::default(),
        )
    }

    #[test]
    fn test_not_a_command() {
        assert!(execute_command("hello", &session(), &QuizPrompt::default()).is_none());
    }

    #[test]
    fn test_basic_commands() {
        let s = session();
        let d = QuizPrompt::default();
        assert_eq!(execute_command("/q", &s, &d), Some(CommandResult::Exit));
        assert_eq!(execute_command(" /NEW ", &s, &d), Some(CommandResult::NewConversation));
        assert_eq!(execute_command("/take", &s, &d), Some(CommandResult::TakeQuiz));
        assert_eq!(
            execute_command("/export out/quiz.json", &s, &d),
            Some(CommandResult::Export(PathBuf::from("out/quiz.json")))
        );
        assert!(matches!(execute_command("/export", &s, &d), Some(CommandResult::Message(_))));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                execute_command("/export ~/quizzes/biology.json", &s, &d),
                Some(CommandResult::Export(home.join("quizzes/biology.json")))
            );
        }
        assert_eq!(
            execute_command("/export ~other/quiz.json", &s, &d),
            Some(CommandResult::Export(PathBuf::from("~other/quiz.json")))
        );
        assert_eq!(
            execute_command("/frobnicate now", &s, &d),
            Some(CommandResult::Unknown("frobnicate".into()))
        );
    }

    #[test]
    fn test_quiz_command_sends_prompt() {
        let result = execute_command("/quiz 3 hard", &session(), &QuizPrompt::default());
        let Some(CommandResult::Send(text)) = result else {
            panic!("expected Send, got {:?}", result);
        };
        assert!(text.starts_with("Create 3 multiple-choice quiz questions at hard difficulty level."));
    }

    #[test]
    fn test_history_on_empty_session() {
        let result = execute_command("/history", &session(), &QuizPrompt::default());
        assert_eq!(
            result,
            Some(CommandResult::Message("No messages yet.".to_string()))
        );
    }
}
