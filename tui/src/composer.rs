//! The single-line prompt at the bottom of the screen. The active selection
//! (a placeholder interior or a ghost-text extension) renders reversed, the
//! way a text input shows selected text.

use lorebook_core::InputBuffer;
use ratatui::buffer::Buffer;
use ratatui::layout::Position;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;
use unicode_width::UnicodeWidthStr;

const PROMPT: &str = "› ";

pub(crate) struct Composer<'a> {
    input: &'a InputBuffer,
}

impl<'a> Composer<'a> {
    pub(crate) fn new(input: &'a InputBuffer) -> Self {
        Self { input }
    }

    /// Where the terminal cursor belongs: at the end of the selection, or the
    /// caret when the selection is collapsed.
    pub(crate) fn cursor_position(&self, area: Rect) -> Position {
        let (_, sel_end) = self.input.selection();
        let before: String = self.input.text().chars().take(sel_end).collect();
        let x = area.x
            + UnicodeWidthStr::width(PROMPT) as u16
            + UnicodeWidthStr::width(before.as_str()) as u16;
        Position::new(x.min(area.x + area.width.saturating_sub(1)), area.y)
    }
}

impl WidgetRef for Composer<'_> {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let (sel_start, sel_end) = self.input.selection();
        let chars: Vec<char> = self.input.text().chars().collect();
        let slice = |from: usize, to: usize| -> String { chars[from..to].iter().collect() };

        let mut spans = vec![Span::styled(
            PROMPT,
            Style::default().fg(Color::LightCyan),
        )];
        if self.input.has_selection() {
            spans.push(Span::raw(slice(0, sel_start)));
            spans.push(Span::styled(
                slice(sel_start, sel_end),
                Style::default().add_modifier(Modifier::REVERSED),
            ));
            spans.push(Span::raw(slice(sel_end, chars.len())));
        } else {
            spans.push(Span::raw(self.input.text().to_string()));
        }

        Line::from(spans).render(area, buf);
    }
}
