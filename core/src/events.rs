use std::sync::mpsc::Sender;

use crate::backend::BackendError;

/// Everything the session pushes outward: requests for the host to drive a
/// collaborator call, and the notifications the surrounding application
/// reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Run the suggestion source for `query` and feed the result back through
    /// `Session::on_suggestions` with the same `seq`.
    FetchSuggestions { seq: u64, query: String },

    /// Run the command executor and feed the result back through
    /// `Session::on_response`.
    ExecuteCommand { command: String },

    /// Ask the executor for its greeting and feed it back through
    /// `Session::on_greeting`.
    FetchGreeting,

    /// A command was accepted for execution.
    CommandSubmitted { command: String },

    /// A response (or error block) was rendered into the transcript.
    ResponseRendered,

    /// Scroll the view to the bottom, animated unless reduced motion is
    /// preferred.
    ScrollToBottom { smooth: bool },
}

/// Cloneable handle the session uses to emit events. If the receiving side
/// has gone away we swallow the error and log it; a dying host should not
/// panic the session.
#[derive(Debug, Clone)]
pub struct SessionEventSender {
    tx: Sender<SessionEvent>,
}

impl SessionEventSender {
    pub fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    pub fn send(&self, event: SessionEvent) {
        if let Err(err) = self.tx.send(event) {
            tracing::error!("failed to send session event: {err}");
        }
    }
}

/// Shorthand used when a collaborator call resolves.
pub type SuggestionsResult = Result<Vec<crate::autocomplete::Suggestion>, BackendError>;
pub type ResponseResult = Result<String, BackendError>;
