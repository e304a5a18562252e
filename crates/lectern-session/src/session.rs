//! Streaming session controller
//!
//! A [`StudySession`] owns the conversation for one document and runs turns
//! against a [`ChatTransport`]: it appends the user message and an assistant
//! placeholder, feeds decoded stream events through the reducer, persists
//! every mutation and, when the user asked for one, hands back a quiz.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use lectern_api::{ChatRequest, ChatTransport, StreamEvent};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::{
    conversation::{Conversation, Message},
    error::{Error, Result},
    events::SessionEvent,
    handle::TurnHandle,
    quiz::{Quiz, is_quiz_request},
    reducer::{self, Applied},
    store::{ConversationStore, StoreError},
};

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Pause between the end of a quiz response and handing over the quiz
    pub quiz_delay: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quiz_delay: Duration::from_millis(1500),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The server finished the response. `quiz` is set when the user asked
    /// for a quiz and the response contained a valid one.
    Completed { quiz: Option<Quiz> },
    /// The turn failed; the message is also shown inline in the response
    Failed { message: String },
    /// The turn was aborted through its [`TurnHandle`]
    Cancelled,
}

/// Conversation with the study assistant about one document
pub struct StudySession {
    doc_id: String,
    conversation: Conversation,
    transport: Arc<dyn ChatTransport>,
    store: Arc<dyn ConversationStore>,
    config: SessionConfig,
    event_tx: broadcast::Sender<SessionEvent>,
    handle: TurnHandle,
    tool_status: Option<String>,
}

impl StudySession {
    /// Open the session for `doc_id`, restoring any saved conversation.
    ///
    /// A saved record that cannot be decoded is discarded and removed.
    pub fn open(
        doc_id: impl Into<String>,
        transport: Arc<dyn ChatTransport>,
        store: Arc<dyn ConversationStore>,
        config: SessionConfig,
    ) -> Self {
        let doc_id = doc_id.into();
        let conversation = match store.load(&doc_id) {
            Ok(Some(record)) => {
                tracing::debug!(
                    "Restored {} messages for document {}",
                    record.messages.len(),
                    doc_id
                );
                Conversation::from_record(record)
            }
            Ok(None) => Conversation::default(),
            Err(e @ StoreError::Corrupt { .. }) => {
                tracing::warn!("Discarding saved conversation: {}", e);
                if let Err(e) = store.remove(&doc_id) {
                    tracing::warn!("Failed to remove corrupt conversation for {}: {}", doc_id, e);
                }
                Conversation::default()
            }
            Err(e) => {
                tracing::warn!("Failed to load conversation for {}: {}", doc_id, e);
                Conversation::default()
            }
        };

        let (event_tx, _) = broadcast::channel(256);
        Self {
            doc_id,
            conversation,
            transport,
            store,
            config,
            event_tx,
            handle: TurnHandle::new(),
            tool_status: None,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Get a cloneable handle for aborting the current turn from outside
    pub fn handle(&self) -> TurnHandle {
        self.handle.clone()
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn messages(&self) -> &[Message] {
        &self.conversation.messages
    }

    pub fn checkpoint_id(&self) -> Option<&str> {
        self.conversation.checkpoint_id.as_deref()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Status of the server-side tool currently running, if any
    pub fn tool_status(&self) -> Option<&str> {
        self.tool_status.as_deref()
    }

    /// Start over: clear the conversation and forget the saved record
    pub fn new_conversation(&mut self) -> Result<()> {
        self.conversation.clear();
        self.tool_status = None;
        self.store.remove(&self.doc_id)?;
        tracing::debug!("Started a new conversation for {}", self.doc_id);
        Ok(())
    }

    /// Run one turn.
    ///
    /// Taking `&mut self` keeps a second turn from starting while one is in
    /// flight. Transport failures are reported as [`TurnOutcome::Failed`] (and
    /// an `Error` event); only an empty message is an `Err`.
    pub async fn send(&mut self, text: &str) -> Result<TurnOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyMessage);
        }

        let cancel = self.handle.begin();
        self.tool_status = None;
        self.conversation.messages.push(Message::user(text));
        self.conversation.messages.push(Message::assistant_empty());
        self.conversation.is_streaming = true;
        self.persist();
        let _ = self.event_tx.send(SessionEvent::TurnStart {
            message: text.to_string(),
        });

        let request = ChatRequest::new(text, self.doc_id.clone(), self.conversation.checkpoint_id.clone());
        let outcome = self.run_turn(request, is_quiz_request(text), &cancel).await;

        self.conversation.is_streaming = false;
        self.tool_status = None;
        self.handle.finish();
        Ok(outcome)
    }

    async fn run_turn(
        &mut self,
        request: ChatRequest,
        wants_quiz: bool,
        cancel: &CancellationToken,
    ) -> TurnOutcome {
        let mut stream = match self.transport.stream_chat(request, cancel.clone()).await {
            Ok(stream) => stream,
            Err(e) if e.is_aborted() => {
                tracing::debug!("Turn cancelled before the stream opened");
                return TurnOutcome::Cancelled;
            }
            Err(e) => {
                tracing::warn!("Chat request failed: {}", e);
                let message = e.to_string();
                self.handle_event(StreamEvent::Error {
                    message: message.clone(),
                });
                return TurnOutcome::Failed { message };
            }
        };

        let mut ended = false;
        while let Some(event) = stream.next().await {
            if cancel.is_cancelled() {
                break;
            }
            match &event {
                StreamEvent::End => ended = true,
                StreamEvent::Error { message } => {
                    tracing::warn!("Chat stream reported an error: {}", message);
                    let message = message.clone();
                    self.handle_event(event);
                    return TurnOutcome::Failed { message };
                }
                _ => {}
            }
            self.handle_event(event);
            if ended {
                break;
            }
        }

        if cancel.is_cancelled() {
            tracing::debug!("Turn cancelled");
            return TurnOutcome::Cancelled;
        }
        if !ended {
            tracing::debug!("Chat stream closed without an end event");
            return TurnOutcome::Completed { quiz: None };
        }

        let quiz = if wants_quiz {
            self.deliver_quiz(cancel).await
        } else {
            None
        };
        TurnOutcome::Completed { quiz }
    }

    /// Status, then subscribers, then state
    fn handle_event(&mut self, event: StreamEvent) {
        match &event {
            StreamEvent::ToolStart { action } => self.tool_status = Some(action.clone()),
            StreamEvent::Checkpoint { .. } => {}
            StreamEvent::Content { .. } | StreamEvent::End | StreamEvent::Error { .. } => {
                self.tool_status = None
            }
        }

        let _ = self.event_tx.send(match &event {
            StreamEvent::Checkpoint { id } => SessionEvent::Checkpoint { id: id.clone() },
            StreamEvent::Content { text } => SessionEvent::Content { text: text.clone() },
            StreamEvent::ToolStart { action } => SessionEvent::ToolStart {
                action: action.clone(),
            },
            StreamEvent::End => SessionEvent::TurnEnd,
            StreamEvent::Error { message } => SessionEvent::Error {
                message: message.clone(),
            },
        });

        if reducer::apply(&mut self.conversation, &event) == Applied::Mutated {
            self.persist();
        }
    }

    /// Extract a quiz from the finished response and hand it over after the
    /// configured delay. An abort during the delay drops the quiz.
    async fn deliver_quiz(&mut self, cancel: &CancellationToken) -> Option<Quiz> {
        let response = self
            .conversation
            .messages
            .last()
            .filter(|m| m.is_assistant())
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        let Some(quiz) = Quiz::from_response(response) else {
            tracing::debug!("No valid quiz found in the response");
            return None;
        };
        tracing::info!("Extracted a quiz with {} questions", quiz.len());

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Quiz delivery cancelled");
                return None;
            }
            _ = tokio::time::sleep(self.config.quiz_delay) => {}
        }

        let _ = self.event_tx.send(SessionEvent::QuizReady { quiz: quiz.clone() });
        Some(quiz)
    }

    /// Write the conversation through the store; failures are logged only
    fn persist(&self) {
        if self.conversation.is_empty() {
            return;
        }
        if let Err(e) = self.store.save(&self.doc_id, &self.conversation.to_record()) {
            tracing::warn!("Failed to save conversation for {}: {}", self.doc_id, e);
        }
    }
}
