//! Suggestion list state and the text-level autocompletion rules: ghost-text
//! extension and common-prefix tab completion.

/// One entry produced by the external suggestion source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// The completed command text.
    pub suggestion: String,
    /// Short human-readable description shown next to it.
    pub description: String,
}

impl Suggestion {
    pub fn new(suggestion: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            suggestion: suggestion.into(),
            description: description.into(),
        }
    }
}

/// The ordered suggestions for the most recent query plus a highlight cursor.
/// Items survive closing so tab completion can still consult the last list.
#[derive(Debug, Clone, Default)]
pub(crate) struct SuggestionList {
    items: Vec<Suggestion>,
    cursor: Option<usize>,
    open: bool,
}

impl SuggestionList {
    /// Install results for a fresh query; the list opens when non-empty and
    /// the highlight resets.
    pub fn set_items(&mut self, items: Vec<Suggestion>) {
        self.open = !items.is_empty();
        self.items = items;
        self.cursor = None;
    }

    pub fn close(&mut self) {
        self.open = false;
        self.cursor = None;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn items(&self) -> &[Suggestion] {
        &self.items
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn selected(&self) -> Option<&Suggestion> {
        self.cursor.and_then(|idx| self.items.get(idx))
    }

    /// Move the highlight up, clamped at the first row.
    pub fn move_up(&mut self) {
        if let Some(idx) = self.cursor {
            if idx > 0 {
                self.cursor = Some(idx - 1);
            }
        }
    }

    /// Move the highlight down, clamped at the last row; from no highlight,
    /// land on the first row.
    pub fn move_down(&mut self) {
        match self.cursor {
            Some(idx) => {
                if idx + 1 < self.items.len() {
                    self.cursor = Some(idx + 1);
                }
            }
            None => {
                if !self.items.is_empty() {
                    self.cursor = Some(0);
                }
            }
        }
    }
}

/// Decide whether a suggestion response triggers a ghost-text extension.
///
/// Fires only when the source returned exactly one suggestion, that
/// suggestion is a case-insensitive prefix extension of the current buffer,
/// and the query is strictly longer than the previous one, i.e. the user is
/// typing forward, never while deleting. Returns the extended buffer text and
/// the selection to place over the speculative remainder; the selection start
/// is pulled back to the suggestion's first `[` when it has one, so a
/// completed template lands with its placeholder selected.
pub(crate) fn ghost_extension(
    buffer: &str,
    items: &[Suggestion],
    query: &str,
    last_query: &str,
) -> Option<(String, (usize, usize))> {
    if items.len() != 1 {
        return None;
    }
    if query.chars().count() <= last_query.chars().count() {
        return None;
    }
    let suggestion = items[0].suggestion.as_str();
    let buffer_len = buffer.chars().count();
    let suggestion_len = suggestion.chars().count();
    if suggestion_len < buffer_len {
        return None;
    }
    let prefix_matches = buffer
        .chars()
        .zip(suggestion.chars())
        .all(|(b, s)| chars_eq_ignore_case(b, s));
    if !prefix_matches {
        return None;
    }

    let extension: String = suggestion.chars().skip(buffer_len).collect();
    let extended = format!("{buffer}{extension}");
    let sel_start = match suggestion.chars().position(|ch| ch == '[') {
        Some(bracket) => buffer_len.min(bracket),
        None => buffer_len,
    };
    Some((extended, (sel_start, suggestion_len)))
}

/// The longest shared prefix of all suggestions, grown character by character
/// beyond the text already typed. An exact character match is preserved as
/// is; where the candidates differ only by case the lowercase form is kept;
/// the first true mismatch stops the scan.
pub(crate) fn common_prefix(buffer: &str, items: &[Suggestion]) -> String {
    let mut candidates = items.iter().map(|item| item.suggestion.as_str());
    let Some(first) = candidates.next() else {
        return buffer.to_string();
    };
    candidates.fold(first.to_string(), |acc, other| {
        pairwise_prefix(buffer, &acc, other)
    })
}

fn pairwise_prefix(buffer: &str, a: &str, b: &str) -> String {
    let mut acc = buffer.to_string();
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let start = buffer.chars().count();
    for idx in start..a_chars.len().min(b_chars.len()) {
        let (ca, cb) = (a_chars[idx], b_chars[idx]);
        if ca == cb {
            acc.push(ca);
        } else if ca.to_lowercase().eq(cb.to_lowercase()) {
            acc.extend(ca.to_lowercase());
        } else {
            break;
        }
    }
    acc
}

fn chars_eq_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}
