//! Detection of editable `[...]` placeholder spans in command templates.

/// The first bracketed span of a command template, in char offsets. `start`
/// points at the opening bracket and `end` is exclusive of the closing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaceholderSpan {
    pub start: usize,
    pub end: usize,
}

impl PlaceholderSpan {
    /// The span between the brackets, exclusive of both.
    pub fn interior(&self) -> (usize, usize) {
        (self.start + 1, self.end - 1)
    }
}

/// Find the leftmost well-formed `[...]` span: a non-empty run of characters
/// other than `]` between brackets. An unclosed bracket is not a placeholder.
pub fn find_span(text: &str) -> Option<PlaceholderSpan> {
    let chars: Vec<char> = text.chars().collect();
    for (start, &ch) in chars.iter().enumerate() {
        if ch != '[' {
            continue;
        }
        let mut end = start + 1;
        while end < chars.len() && chars[end] != ']' {
            end += 1;
        }
        if end < chars.len() && end > start + 1 {
            return Some(PlaceholderSpan {
                start,
                end: end + 1,
            });
        }
    }
    None
}
