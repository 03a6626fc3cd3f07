/// Single-line editable command text plus a selection range.
///
/// Offsets are in characters, not bytes, so hosts can map them straight onto
/// cursor columns. The selection is always kept within buffer bounds; a
/// collapsed selection (`start == end`) is the caret.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
    sel_start: usize,
    sel_end: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Selection range in char offsets, `start <= end`.
    pub fn selection(&self) -> (usize, usize) {
        (self.sel_start, self.sel_end)
    }

    pub fn has_selection(&self) -> bool {
        self.sel_start < self.sel_end
    }

    pub fn selected_text(&self) -> &str {
        let start = self.byte_index(self.sel_start);
        let end = self.byte_index(self.sel_end);
        &self.text[start..end]
    }

    /// Replace the buffer contents and place the caret at end-of-text.
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.caret_to_end();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.sel_start = 0;
        self.sel_end = 0;
    }

    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.char_len();
        let start = start.min(len);
        let end = end.min(len);
        self.sel_start = start.min(end);
        self.sel_end = start.max(end);
    }

    pub fn caret_to_end(&mut self) {
        let len = self.char_len();
        self.sel_start = len;
        self.sel_end = len;
    }

    /// Insert a character, replacing the selection when one is active.
    pub fn insert_char(&mut self, ch: char) {
        self.replace_selection(&ch.to_string());
    }

    /// Delete the selection, or the character before the caret.
    pub fn backspace(&mut self) {
        if self.has_selection() {
            self.replace_selection("");
        } else if self.sel_start > 0 {
            let start = self.byte_index(self.sel_start - 1);
            let end = self.byte_index(self.sel_start);
            self.text.replace_range(start..end, "");
            self.sel_start -= 1;
            self.sel_end = self.sel_start;
        }
    }

    fn replace_selection(&mut self, replacement: &str) {
        let start = self.byte_index(self.sel_start);
        let end = self.byte_index(self.sel_end);
        self.text.replace_range(start..end, replacement);
        let caret = self.sel_start + replacement.chars().count();
        self.sel_start = caret;
        self.sel_end = caret;
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.text
            .char_indices()
            .nth(char_idx)
            .map(|(idx, _)| idx)
            .unwrap_or(self.text.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn typing_replaces_an_active_selection() {
        let mut buffer = InputBuffer::new();
        buffer.set_text("person [name]");
        buffer.select(8, 12);
        assert_eq!(buffer.selected_text(), "name");

        buffer.insert_char('A');
        assert_eq!(buffer.text(), "person [A]");
        assert_eq!(buffer.selection(), (9, 9));
    }

    #[test]
    fn backspace_removes_selection_then_single_chars() {
        let mut buffer = InputBuffer::new();
        buffer.set_text("héllo");
        buffer.select(1, 3);
        buffer.backspace();
        assert_eq!(buffer.text(), "hlo");
        buffer.backspace();
        assert_eq!(buffer.text(), "lo");
        assert_eq!(buffer.selection(), (0, 0));
    }

    #[test]
    fn selection_is_clamped_to_bounds() {
        let mut buffer = InputBuffer::new();
        buffer.set_text("abc");
        buffer.select(10, 2);
        assert_eq!(buffer.selection(), (2, 3));
    }

    #[test]
    fn set_text_places_caret_at_end() {
        let mut buffer = InputBuffer::new();
        buffer.set_text("recall");
        assert_eq!(buffer.selection(), (6, 6));
        assert!(!buffer.has_selection());
    }
}
