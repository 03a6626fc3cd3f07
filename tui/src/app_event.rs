use crossterm::event::KeyEvent;
use crossterm::event::MouseEvent;
use lorebook_core::BackendError;
use lorebook_core::Suggestion;

/// Events handled by the [`App`](crate::app::App) loop: terminal input plus
/// the completions of collaborator calls running on the tokio runtime.
#[derive(Debug)]
pub(crate) enum AppEvent {
    Key(KeyEvent),

    Mouse(MouseEvent),

    /// Text pasted from the terminal clipboard.
    Paste(String),

    /// Draw the next frame (also used to step scroll animation).
    RequestRedraw,

    /// A suggestion query resolved. `seq` and `query` echo the original
    /// request so the session can discard superseded results.
    SuggestionsReady {
        seq: u64,
        query: String,
        result: Result<Vec<Suggestion>, BackendError>,
    },

    /// The executor finished a submitted command.
    ResponseReady(Result<String, BackendError>),

    /// The executor's greeting, fetched once at startup.
    GreetingReady(Option<String>),

    /// Leave the application gracefully.
    ExitRequest,
}
