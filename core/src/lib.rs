//! Host-agnostic core of the lorebook terminal: an owned session state
//! machine coordinating the input buffer, command history, placeholder
//! selection, autocomplete, dispatch, and the reconciling transcript.
//!
//! The core never touches a UI surface or an event loop. Hosts feed it input
//! through [`Session`] methods and drain [`SessionEvent`]s from the channel it
//! was constructed with; the two asynchronous collaborators
//! ([`SuggestionSource`] and [`CommandExecutor`]) are driven by the host and
//! their results re-enter the session via `Session::on_suggestions` and
//! `Session::on_response`.

pub mod autocomplete;
pub mod backend;
pub mod config;
pub mod events;
pub mod history;
pub mod input;
pub mod placeholder;
pub mod session;
pub mod transcript;

pub use autocomplete::Suggestion;
pub use backend::BackendError;
pub use backend::CommandExecutor;
pub use backend::SuggestionSource;
pub use config::Config;
pub use config::ConfigOverrides;
pub use events::SessionEvent;
pub use events::SessionEventSender;
pub use history::HistoryNavigator;
pub use history::RecallDirection;
pub use input::InputBuffer;
pub use placeholder::PlaceholderSpan;
pub use session::KeyInput;
pub use session::Session;
pub use transcript::EntityKey;
pub use transcript::FieldRecord;
pub use transcript::OutputBlock;
pub use transcript::Reconciliation;
pub use transcript::Transcript;
