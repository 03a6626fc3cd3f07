//! Collaborator seams: the external suggestion source and command executor.
//!
//! Both are asynchronous and driven by the host; the session itself never
//! awaits. A failed suggestion query degrades to an empty list, a failed
//! execution to a rendered error block; nothing here is fatal.

use async_trait::async_trait;
use thiserror::Error;

use crate::autocomplete::Suggestion;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("Unrecognized command: {0}")]
    UnknownCommand(String),
    #[error("{0}")]
    Failed(String),
}

/// Produces autocomplete suggestions for a query string. Must tolerate
/// arbitrary queries, including the empty string.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    async fn suggest(&self, query: &str) -> Result<Vec<Suggestion>, BackendError>;
}

/// Interprets and runs a submitted command, returning response markup.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    async fn execute(&self, command: &str) -> Result<String, BackendError>;

    /// Markup rendered before any input is accepted, if the executor has a
    /// greeting to show.
    async fn greeting(&self) -> Option<String> {
        None
    }
}
