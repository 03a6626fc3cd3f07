//! End-to-end exercises of the session state machine: submission, placeholder
//! selection, history recall, autocomplete, and reconciliation, with the
//! collaborator responses injected by hand the way a host would feed them in.

#![expect(clippy::expect_used)]

use std::sync::mpsc::Receiver;
use std::sync::mpsc::channel;

use assert_matches::assert_matches;
use lorebook_core::BackendError;
use lorebook_core::Config;
use lorebook_core::KeyInput;
use lorebook_core::OutputBlock;
use lorebook_core::Session;
use lorebook_core::SessionEvent;
use lorebook_core::SessionEventSender;
use lorebook_core::Suggestion;
use pretty_assertions::assert_eq;

fn new_session() -> (Session, Receiver<SessionEvent>) {
    let (tx, rx) = channel();
    let session = Session::new(Config::default(), SessionEventSender::new(tx));
    (session, rx)
}

fn drain(rx: &Receiver<SessionEvent>) -> Vec<SessionEvent> {
    rx.try_iter().collect()
}

fn item(suggestion: &str) -> Suggestion {
    Suggestion::new(suggestion, "")
}

fn npc_card(id: &str, age: u32) -> String {
    format!(
        "<div class=\"record npc\" data-id=\"{id}\">\n\n# Alice\n\nName: Alice\nAge: {age}\n\n</div>"
    )
}

#[test]
fn submitting_a_plain_command_echoes_records_and_executes() {
    let (mut session, rx) = new_session();

    session.submit("greet world");

    assert!(session.input().is_empty());
    assert_eq!(session.history().entries(), ["greet world"]);
    assert_eq!(session.transcript().blocks().len(), 1);
    assert_matches!(&session.transcript().blocks()[0], OutputBlock::Echo { command } if command == "greet world");

    let events = drain(&rx);
    assert_eq!(
        events,
        vec![
            SessionEvent::ScrollToBottom { smooth: true },
            SessionEvent::CommandSubmitted {
                command: "greet world".to_string(),
            },
            SessionEvent::ExecuteCommand {
                command: "greet world".to_string(),
            },
        ]
    );

    session.on_response(Ok("Well met.".to_string()));
    assert_eq!(session.transcript().blocks().len(), 2);
    let events = drain(&rx);
    assert_eq!(
        events,
        vec![
            SessionEvent::ResponseRendered,
            SessionEvent::ScrollToBottom { smooth: true },
        ]
    );
}

#[test]
fn empty_input_never_submits() {
    let (mut session, rx) = new_session();
    session.handle_key(KeyInput::Enter);
    assert!(drain(&rx).is_empty());
    assert!(session.transcript().is_empty());
}

#[test]
fn submitting_a_template_selects_its_placeholder_instead() {
    let (mut session, rx) = new_session();

    session.submit("person [name]");

    assert_eq!(session.input().text(), "person [name]");
    assert_eq!(session.input().selection(), (8, 12));
    assert_eq!(session.input().selected_text(), "name");
    assert!(session.history().entries().is_empty());

    let events = drain(&rx);
    assert_eq!(events.len(), 1);
    assert_matches!(
        &events[0],
        SessionEvent::FetchSuggestions { query, .. } if query == "person ["
    );
}

#[test]
fn unclosed_bracket_falls_through_to_execution() {
    let (mut session, rx) = new_session();
    session.submit("look at [this");
    let events = drain(&rx);
    assert_matches!(events.last(), Some(SessionEvent::ExecuteCommand { command }) if command == "look at [this");
}

#[test]
fn duplicate_consecutive_submissions_collapse_in_history() {
    let (mut session, _rx) = new_session();
    session.submit("x");
    session.submit("x");
    assert_eq!(session.history().entries(), ["x"]);
}

#[test]
fn arrow_keys_recall_history_when_no_list_is_open() {
    let (mut session, _rx) = new_session();
    for command in ["a", "b", "c"] {
        session.submit(command);
    }

    session.handle_key(KeyInput::Up);
    assert_eq!(session.input().text(), "c");
    session.handle_key(KeyInput::Up);
    assert_eq!(session.input().text(), "b");
    session.handle_key(KeyInput::Up);
    assert_eq!(session.input().text(), "a");
    session.handle_key(KeyInput::Up);
    assert_eq!(session.input().text(), "");
    session.handle_key(KeyInput::Down);
    assert_eq!(session.input().text(), "");
}

#[test]
fn typing_issues_sequenced_suggestion_queries() {
    let (mut session, rx) = new_session();
    session.handle_key(KeyInput::Char('h'));
    session.handle_key(KeyInput::Char('e'));

    let events = drain(&rx);
    assert_eq!(
        events,
        vec![
            SessionEvent::FetchSuggestions {
                seq: 1,
                query: "h".to_string(),
            },
            SessionEvent::FetchSuggestions {
                seq: 2,
                query: "he".to_string(),
            },
        ]
    );
}

#[test]
fn stale_suggestion_responses_are_discarded() {
    let (mut session, _rx) = new_session();
    session.handle_key(KeyInput::Char('h'));
    session.handle_key(KeyInput::Char('e'));

    // The response to the first keystroke arrives after the second.
    session.on_suggestions(1, "h", Ok(vec![item("harbor"), item("help")]));
    assert!(!session.suggestions_open());
    assert!(session.suggestion_items().is_empty());

    session.on_suggestions(2, "he", Ok(vec![item("help")]));
    assert!(session.suggestions_open());
}

#[test]
fn ghost_text_extends_the_buffer_and_selects_the_remainder() {
    let (mut session, _rx) = new_session();
    session.handle_key(KeyInput::Char('h'));
    session.on_suggestions(1, "h", Ok(vec![item("hat"), item("hello")]));
    session.handle_key(KeyInput::Char('e'));
    session.on_suggestions(2, "he", Ok(vec![item("hello")]));

    assert_eq!(session.input().text(), "hello");
    assert_eq!(session.input().selection(), (2, 5));
    assert_eq!(session.input().selected_text(), "llo");
}

#[test]
fn ghost_text_does_not_fire_when_backspacing() {
    let (mut session, _rx) = new_session();
    for ch in ['h', 'e', 'l'] {
        session.handle_key(KeyInput::Char(ch));
    }
    session.on_suggestions(3, "hel", Ok(vec![item("hello")]));
    assert_eq!(session.input().text(), "hello");

    // Backspace drops the speculative selection; the re-issued query is no
    // longer than the previous one, so the lone suggestion must not
    // re-extend the buffer.
    session.handle_key(KeyInput::Backspace);
    assert_eq!(session.input().text(), "hel");
    session.on_suggestions(4, "hel", Ok(vec![item("hello")]));
    assert_eq!(session.input().text(), "hel");
}

#[test]
fn suggestion_failures_read_as_empty_lists() {
    let (mut session, _rx) = new_session();
    session.handle_key(KeyInput::Char('h'));
    session.on_suggestions(1, "h", Err(BackendError::Failed("socket closed".to_string())));
    assert!(!session.suggestions_open());
    assert!(session.suggestion_items().is_empty());
}

#[test]
fn tab_completes_to_the_common_prefix_and_requeries() {
    let (mut session, rx) = new_session();
    for ch in ['c', 'r', 'e'] {
        session.handle_key(KeyInput::Char(ch));
    }
    session.on_suggestions(3, "cre", Ok(vec![item("create-npc"), item("create-place")]));
    drain(&rx);

    session.handle_key(KeyInput::Tab);

    assert_eq!(session.input().text(), "create-");
    let events = drain(&rx);
    assert_matches!(
        events.last(),
        Some(SessionEvent::FetchSuggestions { seq: 4, query }) if query == "create-"
    );
}

#[test]
fn tab_takes_the_highlighted_suggestion() {
    let (mut session, _rx) = new_session();
    session.handle_key(KeyInput::Char('p'));
    session.on_suggestions(1, "p", Ok(vec![item("person [name]"), item("place [name]")]));

    session.handle_key(KeyInput::Down);
    assert_eq!(session.suggestion_cursor(), Some(0));
    session.handle_key(KeyInput::Tab);

    assert_eq!(session.input().text(), "person [name]");
    assert_eq!(session.input().selected_text(), "name");
}

#[test]
fn arrow_navigation_previews_the_highlighted_suggestion() {
    let (mut session, _rx) = new_session();
    session.handle_key(KeyInput::Char('p'));
    session.on_suggestions(1, "p", Ok(vec![item("person [name]"), item("place [name]")]));

    session.handle_key(KeyInput::Down);
    assert_eq!(session.input().text(), "person [name]");
    session.handle_key(KeyInput::Down);
    assert_eq!(session.input().text(), "place [name]");
    assert_eq!(session.input().selected_text(), "name");
}

#[test]
fn escape_closes_the_list_then_clears_the_buffer() {
    let (mut session, _rx) = new_session();
    session.handle_key(KeyInput::Char('h'));
    session.on_suggestions(1, "h", Ok(vec![item("help")]));
    assert!(session.suggestions_open());

    session.handle_key(KeyInput::Escape);
    assert!(!session.suggestions_open());
    assert_eq!(session.input().text(), "h");

    session.handle_key(KeyInput::Escape);
    assert_eq!(session.input().text(), "");
}

#[test]
fn activating_a_suggestion_with_a_placeholder_edits_instead_of_running() {
    let (mut session, rx) = new_session();
    session.handle_key(KeyInput::Char('p'));
    session.on_suggestions(1, "p", Ok(vec![item("person [name]"), item("pay 5gp")]));
    drain(&rx);

    // A clicked template lands in the buffer for editing.
    session.activate_suggestion(0);
    assert_eq!(session.input().selected_text(), "name");
    assert!(session.history().entries().is_empty());

    // A clicked plain suggestion runs immediately.
    session.activate_suggestion(1);
    let events = drain(&rx);
    assert_matches!(events.last(), Some(SessionEvent::ExecuteCommand { command }) if command == "pay 5gp");
}

#[test]
fn command_span_activation_resubmits_that_text() {
    let (mut session, rx) = new_session();
    session.activate_command("person Alice");
    let events = drain(&rx);
    assert_matches!(events.last(), Some(SessionEvent::ExecuteCommand { command }) if command == "person Alice");
}

#[test]
fn repeated_lookup_of_the_same_record_updates_in_place() {
    let (mut session, _rx) = new_session();

    session.submit("person Alice");
    session.on_response(Ok(npc_card("123", 30)));
    session.submit("person Alice");
    session.on_response(Ok(npc_card("123", 31)));

    // Echo, card (replaced in place), echo.
    let blocks = session.transcript().blocks();
    assert_eq!(blocks.len(), 3);
    let fields = blocks[1].fields();
    assert_eq!(fields[0].text, "Name: Alice");
    assert!(!fields[0].changed);
    assert_eq!(fields[1].text, "Age: 31");
    assert!(fields[1].changed);
}

#[test]
fn different_records_stack_separately() {
    let (mut session, _rx) = new_session();
    session.on_response(Ok(npc_card("123", 30)));
    session.on_response(Ok(npc_card("456", 30)));
    assert_eq!(session.transcript().blocks().len(), 2);
}

#[test]
fn executor_failure_renders_one_error_block_and_nothing_else_changes() {
    let (mut session, rx) = new_session();
    session.submit("explode");
    drain(&rx);

    session.on_response(Err(BackendError::Failed("the vault is sealed".to_string())));

    let blocks = session.transcript().blocks();
    assert_eq!(blocks.len(), 2);
    let OutputBlock::Response { document, .. } = &blocks[1] else {
        panic!("expected a response block");
    };
    assert_matches!(document.blocks[0], lorebook_markup::Block::Error(_));
    assert!(session.input().is_empty());
    assert_eq!(session.history().entries(), ["explode"]);

    let events = drain(&rx);
    assert_eq!(
        events,
        vec![
            SessionEvent::ResponseRendered,
            SessionEvent::ScrollToBottom { smooth: true },
        ]
    );
}

#[test]
fn greeting_renders_before_any_input() {
    let (mut session, rx) = new_session();
    session.start();
    assert_eq!(drain(&rx), vec![SessionEvent::FetchGreeting]);

    session.on_greeting(Some("# Welcome\n\nTry ~~help~~.".to_string()));
    assert_eq!(session.transcript().blocks().len(), 1);

    session.on_greeting(None);
    assert_eq!(session.transcript().blocks().len(), 1);
}

#[test]
fn reduced_motion_scrolls_instantly() {
    let (tx, rx) = channel();
    let config = Config {
        reduced_motion: true,
    };
    let mut session = Session::new(config, SessionEventSender::new(tx));
    session.submit("hello");
    let events = drain(&rx);
    assert!(events.contains(&SessionEvent::ScrollToBottom { smooth: false }));
}
