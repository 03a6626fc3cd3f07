//! Turns the session transcript into styled terminal lines.
//!
//! Output blocks render top to bottom with a blank line between them. Record
//! cards get a gutter bar and changed-field highlighting; inline command
//! spans keep their on-screen positions so pointer activation can map a click
//! back to the command text.

use lorebook_core::FieldRecord;
use lorebook_core::OutputBlock;
use lorebook_markup::Block;
use lorebook_markup::Document;
use lorebook_markup::Inline;
use lorebook_markup::SpanStyle;
use ratatui::style::Color;
use ratatui::style::Modifier;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use unicode_width::UnicodeWidthStr;

/// A clickable command span at its rendered position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CommandSpanPos {
    pub line: usize,
    /// Column range in terminal cells, end exclusive.
    pub x_start: u16,
    pub x_end: u16,
    pub command: String,
}

#[derive(Debug, Default)]
pub(crate) struct RenderedTranscript {
    pub lines: Vec<Line<'static>>,
    pub commands: Vec<CommandSpanPos>,
}

/// A styled fragment plus the command it activates, if any. The intermediate
/// form wrapping works on, before conversion to ratatui spans.
#[derive(Debug, Clone)]
struct Chunk {
    text: String,
    style: Style,
    command: Option<String>,
}

pub(crate) fn render_transcript(blocks: &[OutputBlock], width: u16) -> RenderedTranscript {
    let width = width.max(8);
    let mut out = RenderedTranscript::default();
    for (idx, block) in blocks.iter().enumerate() {
        if idx > 0 {
            out.lines.push(Line::from(""));
        }
        match block {
            OutputBlock::Echo { command } => {
                let line = Line::from(vec![
                    Span::styled("› ", Style::default().fg(Color::DarkGray)),
                    Span::styled(
                        command.clone(),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::ITALIC),
                    ),
                ]);
                out.lines.push(line);
            }
            OutputBlock::Response {
                document, fields, ..
            } => {
                render_document(document, fields, width, &mut out);
            }
        }
    }
    out
}

fn render_document(
    document: &Document,
    fields: &[FieldRecord],
    width: u16,
    out: &mut RenderedTranscript,
) {
    // Fields were extracted from card paragraphs in document order; consume
    // them in the same order to find changed-field highlights.
    let mut next_field = 0usize;
    let mut first = true;
    for block in &document.blocks {
        if !first {
            out.lines.push(Line::from(""));
        }
        first = false;
        match block {
            Block::Card(card) => {
                let mut card_first = true;
                for inner in &card.blocks {
                    if !card_first {
                        push_wrapped(out, Vec::new(), width, Some(card_gutter()));
                    }
                    card_first = false;
                    render_text_block(inner, fields, &mut next_field, width, true, out);
                }
            }
            other => render_text_block(other, fields, &mut next_field, width, false, out),
        }
    }
}

fn card_gutter() -> Chunk {
    Chunk {
        text: "│ ".to_string(),
        style: Style::default().fg(Color::Magenta),
        command: None,
    }
}

fn render_text_block(
    block: &Block,
    fields: &[FieldRecord],
    next_field: &mut usize,
    width: u16,
    in_card: bool,
    out: &mut RenderedTranscript,
) {
    let gutter = in_card.then(card_gutter);
    match block {
        Block::Heading { inlines, .. } => {
            let chunks = inline_chunks(inlines, Some(Modifier::BOLD));
            for line_chunks in split_chunk_lines(chunks) {
                push_wrapped(out, line_chunks, width, gutter.clone());
            }
        }
        Block::Paragraph(inlines) => {
            let chunks = inline_chunks(inlines, None);
            for mut line_chunks in split_chunk_lines(chunks) {
                if in_card && is_changed_field_line(&line_chunks, fields, next_field) {
                    for chunk in &mut line_chunks {
                        chunk.style = chunk
                            .style
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD);
                    }
                }
                push_wrapped(out, line_chunks, width, gutter.clone());
            }
        }
        Block::Error(inlines) => {
            let mut chunks = vec![Chunk {
                text: "! ".to_string(),
                style: Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                command: None,
            }];
            for chunk in inline_chunks(inlines, None) {
                chunks.push(Chunk {
                    style: chunk.style.fg(Color::Red),
                    ..chunk
                });
            }
            for line_chunks in split_chunk_lines(chunks) {
                push_wrapped(out, line_chunks, width, gutter.clone());
            }
        }
        Block::ListItem(inlines) => {
            let mut chunks = vec![Chunk {
                text: "• ".to_string(),
                style: Style::default().fg(Color::DarkGray),
                command: None,
            }];
            chunks.extend(inline_chunks(inlines, None));
            for line_chunks in split_chunk_lines(chunks) {
                push_wrapped(out, line_chunks, width, gutter.clone());
            }
        }
        Block::Rule => {
            let rule_width = usize::from(width).saturating_sub(if in_card { 2 } else { 0 });
            push_wrapped(
                out,
                vec![Chunk {
                    text: "─".repeat(rule_width.min(40)),
                    style: Style::default().fg(Color::DarkGray),
                    command: None,
                }],
                width,
                gutter,
            );
        }
        Block::Card(_) => {}
    }
}

/// Does this rendered line correspond to the next extracted field, and is
/// that field marked changed? Advances the field counter on a label match.
fn is_changed_field_line(
    chunks: &[Chunk],
    fields: &[FieldRecord],
    next_field: &mut usize,
) -> bool {
    let text: String = chunks.iter().map(|c| c.text.as_str()).collect();
    let Some(field) = fields.get(*next_field) else {
        return false;
    };
    if text.trim() == field.text {
        *next_field += 1;
        return field.changed;
    }
    false
}

fn inline_chunks(inlines: &[Inline], extra: Option<Modifier>) -> Vec<Chunk> {
    inlines
        .iter()
        .map(|inline| {
            let mut style = match &inline.style {
                SpanStyle::Plain => Style::default(),
                SpanStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
                SpanStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
                SpanStyle::Code => Style::default().fg(Color::Cyan),
                SpanStyle::Command => Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::UNDERLINED),
                SpanStyle::Link(_) => Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED),
            };
            if let Some(modifier) = extra {
                style = style.add_modifier(modifier);
            }
            let command = match &inline.style {
                SpanStyle::Command => Some(inline.text.clone()),
                _ => None,
            };
            Chunk {
                text: inline.text.clone(),
                style,
                command,
            }
        })
        .collect()
}

/// Split chunks on embedded newlines into per-source-line chunk runs.
fn split_chunk_lines(chunks: Vec<Chunk>) -> Vec<Vec<Chunk>> {
    let mut lines: Vec<Vec<Chunk>> = vec![Vec::new()];
    for chunk in chunks {
        let mut parts = chunk.text.split('\n').peekable();
        while let Some(part) = parts.next() {
            if !part.is_empty() {
                if let Some(last) = lines.last_mut() {
                    last.push(Chunk {
                        text: part.to_string(),
                        style: chunk.style,
                        command: chunk.command.clone(),
                    });
                }
            }
            if parts.peek().is_some() {
                lines.push(Vec::new());
            }
        }
    }
    lines
}

/// Greedy word wrap of one logical line, emitting final lines and recording
/// command span positions.
fn push_wrapped(
    out: &mut RenderedTranscript,
    chunks: Vec<Chunk>,
    width: u16,
    gutter: Option<Chunk>,
) {
    let gutter_width = gutter
        .as_ref()
        .map(|g| UnicodeWidthStr::width(g.text.as_str()))
        .unwrap_or(0);
    let usable = usize::from(width).saturating_sub(gutter_width).max(1);

    let mut current: Vec<Chunk> = Vec::new();
    let mut current_width = 0usize;
    let mut wrapped: Vec<Vec<Chunk>> = Vec::new();

    for chunk in chunks {
        for word in split_words(&chunk.text) {
            let word_width = UnicodeWidthStr::width(word);
            if current_width + word_width > usable && current_width > 0 {
                wrapped.push(std::mem::take(&mut current));
                current_width = 0;
                if word.trim().is_empty() {
                    // Never start a wrapped line with the separator space.
                    continue;
                }
            }
            push_word(&mut current, word, &chunk);
            current_width += word_width;
        }
    }
    wrapped.push(current);

    for line_chunks in wrapped {
        let line_idx = out.lines.len();
        let mut spans: Vec<Span<'static>> = Vec::new();
        let mut x = 0u16;
        if let Some(g) = &gutter {
            spans.push(Span::styled(g.text.clone(), g.style));
            x += UnicodeWidthStr::width(g.text.as_str()) as u16;
        }
        for chunk in line_chunks {
            let chunk_width = UnicodeWidthStr::width(chunk.text.as_str()) as u16;
            if let Some(command) = &chunk.command {
                out.commands.push(CommandSpanPos {
                    line: line_idx,
                    x_start: x,
                    x_end: x + chunk_width,
                    command: command.clone(),
                });
            }
            spans.push(Span::styled(chunk.text, chunk.style));
            x += chunk_width;
        }
        out.lines.push(Line::from(spans));
    }
}

fn push_word(current: &mut Vec<Chunk>, word: &str, source: &Chunk) {
    if let Some(last) = current.last_mut() {
        if last.style == source.style && last.command == source.command {
            last.text.push_str(word);
            return;
        }
    }
    current.push(Chunk {
        text: word.to_string(),
        style: source.style,
        command: source.command.clone(),
    });
}

/// Split into words and the whitespace runs between them, both kept.
fn split_words(text: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let split_at = match rest.find(' ') {
            Some(0) => rest.len() - rest.trim_start_matches(' ').len(),
            Some(idx) => idx,
            None => rest.len(),
        };
        let (word, tail) = rest.split_at(split_at);
        words.push(word);
        rest = tail;
    }
    words
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used)]
    use super::*;
    use pretty_assertions::assert_eq;

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn echo_and_response_render_in_order() {
        let blocks = vec![
            OutputBlock::echo("person Alice Thorn"),
            OutputBlock::response("Well met."),
        ];
        let rendered = render_transcript(&blocks, 80);
        let texts: Vec<String> = rendered.lines.iter().map(line_text).collect();
        assert_eq!(texts, ["› person Alice Thorn", "", "Well met."]);
    }

    #[test]
    fn long_paragraphs_wrap_at_the_given_width() {
        let blocks = vec![OutputBlock::response(
            "one two three four five six seven eight nine ten",
        )];
        let rendered = render_transcript(&blocks, 20);
        assert!(rendered.lines.len() > 1);
        for line in &rendered.lines {
            assert!(line_text(line).len() <= 20);
        }
    }

    #[test]
    fn command_spans_report_their_positions() {
        let blocks = vec![OutputBlock::response("Try ~~help~~ now.")];
        let rendered = render_transcript(&blocks, 80);
        assert_eq!(rendered.commands.len(), 1);
        let span = &rendered.commands[0];
        assert_eq!(span.command, "help");
        assert_eq!(span.line, 0);
        assert_eq!((span.x_start, span.x_end), (4, 8));
        let text = line_text(&rendered.lines[0]);
        assert_eq!(&text[4..8], "help");
    }

    #[test]
    fn changed_fields_render_highlighted() {
        let card = "<div class=\"record npc\" data-id=\"n1\">\n\nAge: 30\nHome: here\n\n</div>";
        let update = "<div class=\"record npc\" data-id=\"n1\">\n\nAge: 31\nHome: here\n\n</div>";
        let mut transcript = lorebook_core::Transcript::new();
        transcript.push(OutputBlock::response(card));
        transcript.push(OutputBlock::response(update));

        let rendered = render_transcript(transcript.blocks(), 80);
        let age_line = rendered
            .lines
            .iter()
            .find(|line| line_text(line).contains("Age: 31"))
            .expect("age line");
        let age_span = age_line
            .spans
            .iter()
            .find(|span| span.content.contains("Age"))
            .expect("age span");
        assert_eq!(age_span.style.fg, Some(Color::Yellow));

        let home_line = rendered
            .lines
            .iter()
            .find(|line| line_text(line).contains("Home: here"))
            .expect("home line");
        let home_span = home_line
            .spans
            .iter()
            .find(|span| span.content.contains("Home"))
            .expect("home span");
        assert_eq!(home_span.style.fg, None);
    }

    #[test]
    fn error_blocks_render_with_their_marker() {
        let blocks = vec![OutputBlock::response("! something went wrong")];
        let rendered = render_transcript(&blocks, 80);
        assert_eq!(line_text(&rendered.lines[0]), "! something went wrong");
        assert_eq!(
            rendered.lines[0].spans[0].style.fg,
            Some(Color::Red)
        );
    }
}
