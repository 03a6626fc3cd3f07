//! The terminal session: one owned object holding every piece of state the
//! terminal needs, with all branching and ordering rules inside. Hosts wire
//! keyboard and pointer events to the methods here and drain the emitted
//! [`SessionEvent`]s; nothing in this module touches a UI surface.

use crate::autocomplete;
use crate::autocomplete::Suggestion;
use crate::autocomplete::SuggestionList;
use crate::config::Config;
use crate::events::ResponseResult;
use crate::events::SessionEvent;
use crate::events::SessionEventSender;
use crate::events::SuggestionsResult;
use crate::history::HistoryNavigator;
use crate::history::RecallDirection;
use crate::input::InputBuffer;
use crate::placeholder;
use crate::transcript::OutputBlock;
use crate::transcript::Transcript;

/// Keyboard input after the host has stripped its own shortcuts. Keys with
/// Ctrl/Meta modifiers must not be routed here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Backspace,
    Enter,
    Tab,
    Escape,
    Up,
    Down,
}

pub struct Session {
    config: Config,
    input: InputBuffer,
    history: HistoryNavigator,
    suggestions: SuggestionList,
    transcript: Transcript,
    /// Query text sent with the most recent suggestion request; ghost-text
    /// extension only fires while the query is growing.
    last_query: String,
    /// Sequence number of the most recent suggestion request. Responses
    /// carrying an older number are stale and discarded.
    latest_seq: u64,
    tx: SessionEventSender,
}

impl Session {
    pub fn new(config: Config, tx: SessionEventSender) -> Self {
        Self {
            config,
            input: InputBuffer::new(),
            history: HistoryNavigator::new(),
            suggestions: SuggestionList::default(),
            transcript: Transcript::new(),
            last_query: String::new(),
            latest_seq: 0,
            tx,
        }
    }

    /// Kick off the greeting fetch. Call once after construction.
    pub fn start(&mut self) {
        self.tx.send(SessionEvent::FetchGreeting);
    }

    pub fn input(&self) -> &InputBuffer {
        &self.input
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn history(&self) -> &HistoryNavigator {
        &self.history
    }

    pub fn suggestions_open(&self) -> bool {
        self.suggestions.is_open()
    }

    pub fn suggestion_items(&self) -> &[Suggestion] {
        self.suggestions.items()
    }

    pub fn suggestion_cursor(&self) -> Option<usize> {
        self.suggestions.cursor()
    }

    pub fn handle_key(&mut self, key: KeyInput) {
        match key {
            KeyInput::Char(ch) => {
                self.input.insert_char(ch);
                self.request_suggestions();
            }
            KeyInput::Backspace => {
                self.input.backspace();
                self.request_suggestions();
            }
            KeyInput::Up => {
                if self.suggestions.is_open() {
                    self.suggestions.move_up();
                    self.preview_highlighted();
                } else if !self.history.is_empty() {
                    self.recall_history(RecallDirection::Older);
                }
            }
            KeyInput::Down => {
                if self.suggestions.is_open() {
                    self.suggestions.move_down();
                    self.preview_highlighted();
                } else if !self.history.is_empty() {
                    self.recall_history(RecallDirection::Newer);
                }
            }
            KeyInput::Tab => self.tab_complete(),
            KeyInput::Escape => {
                if self.suggestions.is_open() {
                    self.suggestions.close();
                } else {
                    self.input.clear();
                }
            }
            KeyInput::Enter => {
                let text = self.input.text().to_string();
                self.submit(&text);
            }
        }
    }

    /// Submit a command: either its first placeholder is selected for
    /// editing, or it is echoed, recorded, and handed to the executor.
    pub fn submit(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.select_expression(text) {
            return;
        }
        self.transcript.push(OutputBlock::echo(text));
        self.input.clear();
        self.suggestions.close();
        self.emit_scroll();
        self.history.record(text);
        self.tx.send(SessionEvent::CommandSubmitted {
            command: text.to_string(),
        });
        self.tx.send(SessionEvent::ExecuteCommand {
            command: text.to_string(),
        });
    }

    /// Pointer activation on an inline command span in rendered output:
    /// re-submit that exact text.
    pub fn activate_command(&mut self, text: &str) {
        self.submit(text);
    }

    /// Pointer activation on a suggestion row: submit it (a suggestion with a
    /// placeholder lands in the buffer for editing instead of executing).
    pub fn activate_suggestion(&mut self, index: usize) {
        if let Some(item) = self.suggestions.items().get(index) {
            let text = item.suggestion.clone();
            self.submit(&text);
        }
    }

    /// Install the result of a suggestion query issued with `seq`.
    pub fn on_suggestions(&mut self, seq: u64, query: &str, result: SuggestionsResult) {
        if seq != self.latest_seq {
            tracing::trace!("discarding superseded suggestion response (seq {seq})");
            return;
        }
        let items = match result {
            Ok(items) => items,
            Err(err) => {
                tracing::debug!("suggestion query failed: {err}");
                Vec::new()
            }
        };
        if let Some((text, (sel_start, sel_end))) =
            autocomplete::ghost_extension(self.input.text(), &items, query, &self.last_query)
        {
            self.input.set_text(&text);
            self.input.select(sel_start, sel_end);
        }
        self.last_query = query.to_string();
        self.suggestions.set_items(items);
    }

    /// Install the executor's response; a failure renders as an error block
    /// through the same path.
    pub fn on_response(&mut self, result: ResponseResult) {
        let markup = match result {
            Ok(markup) => markup,
            Err(err) => format!("! {err}"),
        };
        self.render_response(&markup);
    }

    /// Install the executor's greeting, if it offered one.
    pub fn on_greeting(&mut self, greeting: Option<String>) {
        if let Some(markup) = greeting {
            self.render_response(&markup);
        }
    }

    fn render_response(&mut self, markup: &str) {
        self.transcript.push(OutputBlock::response(markup));
        self.tx.send(SessionEvent::ResponseRendered);
        self.emit_scroll();
    }

    /// Set the buffer to `text` and select its first placeholder span.
    /// Returns true when a span was selected (and the suggestion list was
    /// opened for the new context); false leaves the caret at end-of-text.
    fn select_expression(&mut self, text: &str) -> bool {
        self.input.set_text(text);
        match placeholder::find_span(text) {
            Some(span) => {
                let (start, end) = span.interior();
                self.input.select(start, end);
                if !self.suggestions.is_open() {
                    self.request_suggestions();
                }
                true
            }
            None => false,
        }
    }

    /// Arrow navigation previews the highlighted suggestion in the buffer,
    /// with its placeholder selected for editing.
    fn preview_highlighted(&mut self) {
        if let Some(item) = self.suggestions.selected() {
            let text = item.suggestion.clone();
            self.select_expression(&text);
        }
    }

    fn recall_history(&mut self, direction: RecallDirection) {
        let text = self.history.recall(direction).to_string();
        self.input.set_text(&text);
    }

    /// Tab: take the highlighted suggestion, or extend the buffer to the
    /// longest common prefix of the current list, then re-query so the list
    /// reflects the new state.
    fn tab_complete(&mut self) {
        if let Some(item) = self.suggestions.selected() {
            let text = item.suggestion.clone();
            self.select_expression(&text);
        } else {
            if self.suggestions.items().is_empty() {
                return;
            }
            let prefix = autocomplete::common_prefix(self.input.text(), self.suggestions.items());
            self.select_expression(&prefix);
        }
        self.request_suggestions();
    }

    /// The query for the current buffer state: the text before an active
    /// selection, otherwise the text before the first `[`.
    fn extract_query(&self) -> String {
        let text = self.input.text();
        if self.input.has_selection() {
            let (start, _) = self.input.selection();
            text.chars().take(start).collect()
        } else {
            text.split('[').next().unwrap_or(text).to_string()
        }
    }

    fn request_suggestions(&mut self) {
        let query = self.extract_query();
        self.latest_seq += 1;
        self.tx.send(SessionEvent::FetchSuggestions {
            seq: self.latest_seq,
            query,
        });
    }

    fn emit_scroll(&mut self) {
        self.tx.send(SessionEvent::ScrollToBottom {
            smooth: !self.config.reduced_motion,
        });
    }
}
