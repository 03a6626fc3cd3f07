use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::sync::mpsc::channel;
use std::time::Duration;

use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyEventKind;
use crossterm::event::KeyModifiers;
use crossterm::event::MouseButton;
use crossterm::event::MouseEvent;
use crossterm::event::MouseEventKind;
use lorebook_core::CommandExecutor;
use lorebook_core::Config;
use lorebook_core::KeyInput;
use lorebook_core::Session;
use lorebook_core::SessionEvent;
use lorebook_core::SessionEventSender;
use lorebook_core::SuggestionSource;
use ratatui::layout::Rect;
use ratatui::text::Text;
use ratatui::widgets::Paragraph;
use ratatui::widgets::WidgetRef;

use crate::app_event::AppEvent;
use crate::app_event_sender::AppEventSender;
use crate::composer::Composer;
use crate::suggestion_popup::SuggestionPopup;
use crate::transcript_view::CommandSpanPos;
use crate::transcript_view::render_transcript;
use crate::tui::Tui;

/// Interval between scroll animation frames.
const FRAME_INTERVAL: Duration = Duration::from_millis(33);

#[derive(Debug, Default)]
struct ScrollState {
    current: usize,
    target: usize,
    /// Set when the session asked to scroll to the bottom; resolved against
    /// the line count at the next draw.
    pending_bottom: bool,
    smooth: bool,
}

pub(crate) struct App {
    session: Session,
    session_rx: Receiver<SessionEvent>,
    app_event_tx: AppEventSender,
    app_event_rx: Receiver<AppEvent>,
    suggestion_source: Arc<dyn SuggestionSource>,
    executor: Arc<dyn CommandExecutor>,
    runtime: tokio::runtime::Handle,
    scroll: ScrollState,
    /// Hit-test state captured at the last draw.
    popup_area: Option<Rect>,
    transcript_area: Rect,
    command_spans: Vec<CommandSpanPos>,
    animation_scheduled: bool,
    should_exit: bool,
}

impl App {
    pub(crate) fn new(
        config: Config,
        suggestion_source: Arc<dyn SuggestionSource>,
        executor: Arc<dyn CommandExecutor>,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        let (session_tx, session_rx) = channel();
        let session = Session::new(config, SessionEventSender::new(session_tx));
        let (app_event_tx, app_event_rx) = channel();
        let app_event_tx = AppEventSender::new(app_event_tx);

        // Dedicated thread reading crossterm events and re-publishing them as
        // AppEvents. The poll timeout keeps the event lock from being held
        // across resizes.
        {
            let app_event_tx = app_event_tx.clone();
            std::thread::spawn(move || {
                loop {
                    if let Ok(true) = crossterm::event::poll(Duration::from_millis(100)) {
                        if let Ok(event) = crossterm::event::read() {
                            match event {
                                crossterm::event::Event::Key(key_event) => {
                                    app_event_tx.send(AppEvent::Key(key_event));
                                }
                                crossterm::event::Event::Mouse(mouse_event) => {
                                    app_event_tx.send(AppEvent::Mouse(mouse_event));
                                }
                                crossterm::event::Event::Paste(pasted) => {
                                    app_event_tx.send(AppEvent::Paste(pasted.replace('\r', "")));
                                }
                                crossterm::event::Event::Resize(_, _) => {
                                    app_event_tx.send(AppEvent::RequestRedraw);
                                }
                                _ => {}
                            }
                        }
                    }
                }
            });
        }

        Self {
            session,
            session_rx,
            app_event_tx,
            app_event_rx,
            suggestion_source,
            executor,
            runtime,
            scroll: ScrollState::default(),
            popup_area: None,
            transcript_area: Rect::default(),
            command_spans: Vec::new(),
            animation_scheduled: false,
            should_exit: false,
        }
    }

    pub(crate) fn run(&mut self, terminal: &mut Tui) -> anyhow::Result<()> {
        self.session.start();
        self.drain_session_events();
        self.draw(terminal)?;

        while !self.should_exit {
            let Ok(event) = self.app_event_rx.recv() else {
                break;
            };
            self.handle_event(event);
            self.draw(terminal)?;
        }
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Key(key_event) => self.handle_key(key_event),
            AppEvent::Mouse(mouse_event) => self.handle_mouse(mouse_event),
            AppEvent::Paste(pasted) => {
                for ch in pasted.chars().filter(|ch| !ch.is_control()) {
                    self.session.handle_key(KeyInput::Char(ch));
                }
                self.drain_session_events();
            }
            AppEvent::RequestRedraw => {
                self.animation_scheduled = false;
            }
            AppEvent::SuggestionsReady { seq, query, result } => {
                self.session.on_suggestions(seq, &query, result);
                self.drain_session_events();
            }
            AppEvent::ResponseReady(result) => {
                self.session.on_response(result);
                self.drain_session_events();
            }
            AppEvent::GreetingReady(greeting) => {
                self.session.on_greeting(greeting);
                self.drain_session_events();
            }
            AppEvent::ExitRequest => {
                self.should_exit = true;
            }
        }
    }

    fn handle_key(&mut self, key_event: KeyEvent) {
        if key_event.kind == KeyEventKind::Release {
            return;
        }
        let modifiers = key_event.modifiers;
        if modifiers.contains(KeyModifiers::CONTROL) {
            // Host shortcuts stay with the host; the only ones we own are the
            // exits.
            if matches!(key_event.code, KeyCode::Char('c') | KeyCode::Char('q')) {
                self.should_exit = true;
            }
            return;
        }
        if modifiers.contains(KeyModifiers::ALT) || modifiers.contains(KeyModifiers::META) {
            return;
        }
        let key = match key_event.code {
            KeyCode::Char(ch) => Some(KeyInput::Char(ch)),
            KeyCode::Backspace => Some(KeyInput::Backspace),
            KeyCode::Enter => Some(KeyInput::Enter),
            KeyCode::Tab => Some(KeyInput::Tab),
            KeyCode::Esc => Some(KeyInput::Escape),
            KeyCode::Up => Some(KeyInput::Up),
            KeyCode::Down => Some(KeyInput::Down),
            _ => None,
        };
        if let Some(key) = key {
            self.session.handle_key(key);
            self.drain_session_events();
        }
    }

    fn handle_mouse(&mut self, mouse_event: MouseEvent) {
        match mouse_event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.handle_click(mouse_event.column, mouse_event.row);
            }
            MouseEventKind::ScrollUp => {
                self.scroll.current = self.scroll.current.saturating_sub(3);
                self.scroll.target = self.scroll.current;
            }
            MouseEventKind::ScrollDown => {
                self.scroll.current += 3;
                self.scroll.target = self.scroll.current;
            }
            _ => {}
        }
    }

    fn handle_click(&mut self, column: u16, row: u16) {
        if let Some(popup_area) = self.popup_area {
            if popup_area.contains((column, row).into()) {
                let popup = SuggestionPopup::new(
                    self.session.suggestion_items(),
                    self.session.suggestion_cursor(),
                );
                if let Some(index) = popup.item_at(popup_area, row) {
                    self.session.activate_suggestion(index);
                    self.drain_session_events();
                }
                return;
            }
        }
        if self.transcript_area.contains((column, row).into()) {
            let line = self.scroll.current + usize::from(row - self.transcript_area.y);
            let x = column - self.transcript_area.x;
            let command = self
                .command_spans
                .iter()
                .find(|span| span.line == line && x >= span.x_start && x < span.x_end)
                .map(|span| span.command.clone());
            if let Some(command) = command {
                self.session.activate_command(&command);
                self.drain_session_events();
            }
        }
    }

    /// Forward the session's outbound events: collaborator calls are spawned
    /// on the runtime and post their completions back to the app channel.
    fn drain_session_events(&mut self) {
        while let Ok(event) = self.session_rx.try_recv() {
            match event {
                SessionEvent::FetchSuggestions { seq, query } => {
                    let source = Arc::clone(&self.suggestion_source);
                    let tx = self.app_event_tx.clone();
                    self.runtime.spawn(async move {
                        let result = source.suggest(&query).await;
                        tx.send(AppEvent::SuggestionsReady { seq, query, result });
                    });
                }
                SessionEvent::ExecuteCommand { command } => {
                    let executor = Arc::clone(&self.executor);
                    let tx = self.app_event_tx.clone();
                    self.runtime.spawn(async move {
                        let result = executor.execute(&command).await;
                        tx.send(AppEvent::ResponseReady(result));
                    });
                }
                SessionEvent::FetchGreeting => {
                    let executor = Arc::clone(&self.executor);
                    let tx = self.app_event_tx.clone();
                    self.runtime.spawn(async move {
                        let greeting = executor.greeting().await;
                        tx.send(AppEvent::GreetingReady(greeting));
                    });
                }
                SessionEvent::CommandSubmitted { command } => {
                    tracing::info!("command submitted: {command}");
                }
                SessionEvent::ResponseRendered => {
                    tracing::debug!("response rendered");
                }
                SessionEvent::ScrollToBottom { smooth } => {
                    self.scroll.pending_bottom = true;
                    self.scroll.smooth = smooth;
                }
            }
        }
    }

    fn draw(&mut self, terminal: &mut Tui) -> anyhow::Result<()> {
        terminal.draw(|frame| {
            let area = frame.area();
            if area.height < 2 {
                return;
            }
            let rendered =
                render_transcript(self.session.transcript().blocks(), area.width);

            let popup_open = self.session.suggestions_open();
            let popup = SuggestionPopup::new(
                self.session.suggestion_items(),
                self.session.suggestion_cursor(),
            );
            let popup_height = if popup_open {
                popup.required_height().min(area.height.saturating_sub(2))
            } else {
                0
            };

            let composer_area = Rect::new(area.x, area.bottom() - 1, area.width, 1);
            let popup_area = Rect::new(
                area.x,
                composer_area.y - popup_height,
                area.width,
                popup_height,
            );
            let transcript_area = Rect::new(
                area.x,
                area.y,
                area.width,
                area.height - 1 - popup_height,
            );

            // Resolve scrolling against the freshly rendered line count.
            let total = rendered.lines.len();
            let max_scroll = total.saturating_sub(transcript_area.height as usize);
            if self.scroll.pending_bottom {
                self.scroll.pending_bottom = false;
                self.scroll.target = max_scroll;
                if !self.scroll.smooth {
                    self.scroll.current = max_scroll;
                }
            }
            self.scroll.target = self.scroll.target.min(max_scroll);
            self.scroll.current = self.scroll.current.min(max_scroll);
            if self.scroll.current < self.scroll.target {
                let step = (self.scroll.target - self.scroll.current).div_ceil(3);
                self.scroll.current += step;
            }

            let transcript =
                Paragraph::new(Text::from(rendered.lines)).scroll((self.scroll.current as u16, 0));
            frame.render_widget(transcript, transcript_area);

            if popup_height > 0 {
                popup.render_ref(popup_area, frame.buffer_mut());
            }

            let composer = Composer::new(self.session.input());
            composer.render_ref(composer_area, frame.buffer_mut());
            frame.set_cursor_position(composer.cursor_position(composer_area));

            self.popup_area = (popup_height > 0).then_some(popup_area);
            self.transcript_area = transcript_area;
            self.command_spans = rendered.commands;
        })?;

        if self.scroll.current != self.scroll.target && !self.animation_scheduled {
            self.animation_scheduled = true;
            let tx = self.app_event_tx.clone();
            std::thread::spawn(move || {
                std::thread::sleep(FRAME_INTERVAL);
                tx.send(AppEvent::RequestRedraw);
            });
        }
        Ok(())
    }
}
