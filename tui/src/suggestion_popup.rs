//! The autocomplete popup: a two-column table of suggestion and description
//! rendered directly above the composer, windowed to a handful of rows.

use lorebook_core::Suggestion;
use ratatui::buffer::Buffer;
use ratatui::layout::Constraint;
use ratatui::layout::Rect;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Cell;
use ratatui::widgets::Row;
use ratatui::widgets::Table;
use ratatui::widgets::Widget;
use ratatui::widgets::WidgetRef;

pub(crate) const MAX_POPUP_ROWS: usize = 5;
/// Wide enough for the longest command template.
const FIRST_COLUMN_WIDTH: u16 = 24;

pub(crate) struct SuggestionPopup<'a> {
    items: &'a [Suggestion],
    cursor: Option<usize>,
}

impl<'a> SuggestionPopup<'a> {
    pub(crate) fn new(items: &'a [Suggestion], cursor: Option<usize>) -> Self {
        Self { items, cursor }
    }

    /// Rows needed to show at most [`MAX_POPUP_ROWS`] suggestions.
    pub(crate) fn required_height(&self) -> u16 {
        self.items.len().clamp(1, MAX_POPUP_ROWS) as u16
    }

    /// First visible item index, keeping the highlighted row in the window.
    fn window_start(&self, visible_rows: usize) -> usize {
        let Some(selected) = self.cursor else {
            return 0;
        };
        if visible_rows == 0 {
            return 0;
        }
        selected.saturating_sub(visible_rows - 1)
    }

    /// Map a row within `area` back to the item index it displays.
    pub(crate) fn item_at(&self, area: Rect, row: u16) -> Option<usize> {
        if row < area.y || row >= area.y + area.height {
            return None;
        }
        let visible_rows = MAX_POPUP_ROWS
            .min(self.items.len())
            .min(area.height as usize);
        let idx = self.window_start(visible_rows) + usize::from(row - area.y);
        (idx < self.items.len()).then_some(idx)
    }
}

impl WidgetRef for SuggestionPopup<'_> {
    fn render_ref(&self, area: Rect, buf: &mut Buffer) {
        let mut rows: Vec<Row> = Vec::new();

        if self.items.is_empty() {
            rows.push(Row::new(vec![
                Cell::from(""),
                Cell::from(Span::styled(
                    "No matches",
                    Style::default().add_modifier(Modifier::ITALIC),
                )),
            ]));
        } else {
            let visible_rows = MAX_POPUP_ROWS
                .min(self.items.len())
                .min((area.height as usize).max(1));
            let start_idx = self.window_start(visible_rows);

            for (global_idx, item) in self
                .items
                .iter()
                .enumerate()
                .skip(start_idx)
                .take(visible_rows)
            {
                let marker = if Some(global_idx) == self.cursor {
                    Span::styled("›", Style::default().fg(Color::LightCyan))
                } else {
                    Span::styled(" ", Style::default())
                };
                let mut primary = Style::default().fg(Color::LightBlue);
                let mut description = Style::default().fg(Color::DarkGray);
                if Some(global_idx) == self.cursor {
                    primary = primary.add_modifier(Modifier::BOLD);
                    description = Style::default();
                }
                rows.push(Row::new(vec![
                    Cell::from(Line::from(vec![
                        marker,
                        Span::styled(item.suggestion.clone(), primary),
                    ])),
                    Cell::from(item.description.clone()).style(description),
                ]));
            }
        }

        let table = Table::new(
            rows,
            [Constraint::Length(FIRST_COLUMN_WIDTH), Constraint::Min(10)],
        )
        .column_spacing(1);

        table.render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn items(n: usize) -> Vec<Suggestion> {
        (0..n)
            .map(|i| Suggestion::new(format!("command-{i}"), format!("description {i}")))
            .collect()
    }

    fn buffer_text(buf: &Buffer, area: Rect) -> Vec<String> {
        (0..area.height)
            .map(|y| {
                (0..area.width)
                    .map(|x| buf[(x, y)].symbol().to_string())
                    .collect::<String>()
            })
            .collect()
    }

    #[test]
    fn renders_one_row_per_item_up_to_the_cap() {
        let items = items(3);
        let popup = SuggestionPopup::new(&items, None);
        assert_eq!(popup.required_height(), 3);

        let area = Rect::new(0, 0, 60, 3);
        let mut buf = Buffer::empty(area);
        popup.render_ref(area, &mut buf);
        let rows = buffer_text(&buf, area);
        assert!(rows[0].contains("command-0"));
        assert!(rows[2].contains("command-2"));
    }

    #[test]
    fn highlight_scrolls_the_window() {
        let items = items(8);
        let popup = SuggestionPopup::new(&items, Some(6));
        let area = Rect::new(0, 0, 60, 5);
        let mut buf = Buffer::empty(area);
        popup.render_ref(area, &mut buf);
        let rows = buffer_text(&buf, area);
        // Rows 2..=6 are visible so the highlighted row is the last one.
        assert!(rows[0].contains("command-2"));
        assert!(rows[4].contains("command-6"));
        assert!(rows[4].contains('›'));
    }

    #[test]
    fn item_at_maps_clicks_through_the_window() {
        let all = items(8);
        let popup = SuggestionPopup::new(&all, Some(6));
        let area = Rect::new(0, 10, 60, 5);
        assert_eq!(popup.item_at(area, 10), Some(2));
        assert_eq!(popup.item_at(area, 14), Some(6));
        assert_eq!(popup.item_at(area, 15), None);
    }

    #[test]
    fn empty_list_renders_a_placeholder_row() {
        let popup = SuggestionPopup::new(&[], None);
        assert_eq!(popup.required_height(), 1);
        let area = Rect::new(0, 0, 40, 1);
        let mut buf = Buffer::empty(area);
        popup.render_ref(area, &mut buf);
        let rows = buffer_text(&buf, area);
        assert!(rows[0].contains("No matches"));
    }
}
