//! Rich-text renderer for executor responses.
//!
//! Responses arrive as markdown with two extensions:
//!
//! 1. A block-level *error* extension: a block whose text begins with `"! "`
//!    renders as an error block.
//! 2. Strikethrough (`~~text~~`) renders as an inline *command span*, a
//!    pointer-activatable snippet that re-submits its text as a command.
//!
//! A response may also wrap its content in a *record card*, an HTML root
//! element carrying a record kind and id:
//!
//! ```text
//! <div class="record npc" data-id="5e7a...">
//!
//! # Cordelia Vane
//! ...
//!
//! </div>
//! ```
//!
//! The parser produces a [`Document`] decoupled from any rendering
//! technology; front ends turn it into styled lines, and the terminal's
//! reconciler diffs card fields without touching markup again.

use pulldown_cmark::Event;
use pulldown_cmark::HeadingLevel;
use pulldown_cmark::Options;
use pulldown_cmark::Parser;
use pulldown_cmark::Tag;
use pulldown_cmark::TagEnd;
use regex_lite::Regex;
use std::sync::OnceLock;

/// A parsed response, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Document {
    pub blocks: Vec<Block>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, inlines: Vec<Inline> },
    Paragraph(Vec<Inline>),
    /// Error extension: a block whose source text began with `"! "`.
    Error(Vec<Inline>),
    ListItem(Vec<Inline>),
    Rule,
    Card(Card),
}

/// A record card: the root element carried a kind and an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub kind: String,
    pub id: String,
    pub blocks: Vec<Block>,
}

/// A run of text with a single style. Adjacent runs with the same style are
/// merged; soft and hard breaks appear as `'\n'` inside runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inline {
    pub text: String,
    pub style: SpanStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpanStyle {
    Plain,
    Emphasis,
    Strong,
    Code,
    /// Pointer-activatable command snippet (`~~text~~` in source).
    Command,
    /// Hyperlink, annotated for external opening by the host.
    Link(String),
}

impl Block {
    /// Inline runs of this block, if it has any.
    pub fn inlines(&self) -> Option<&[Inline]> {
        match self {
            Block::Heading { inlines, .. }
            | Block::Paragraph(inlines)
            | Block::Error(inlines)
            | Block::ListItem(inlines) => Some(inlines),
            Block::Rule | Block::Card(_) => None,
        }
    }
}

/// Concatenated plain text of a run of inlines.
pub fn inline_text(inlines: &[Inline]) -> String {
    inlines.iter().map(|i| i.text.as_str()).collect()
}

fn card_open_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        Regex::new(r#"<div\s+class="([^"]*)"\s+data-id="([^"]*)"\s*>"#).unwrap()
    })
}

/// Marker class that identifies a card root; the remaining class names the
/// record kind.
const CARD_MARKER_CLASS: &str = "record";

fn parse_card_open(html: &str) -> Option<(String, String)> {
    let caps = card_open_regex().captures(html.trim())?;
    let classes = &caps[1];
    let id = caps[2].to_string();
    if id.is_empty() {
        return None;
    }
    let kind = classes
        .split_whitespace()
        .find(|class| *class != CARD_MARKER_CLASS)?
        .to_string();
    if classes.split_whitespace().all(|class| class != CARD_MARKER_CLASS) {
        return None;
    }
    Some((kind, id))
}

/// Parse response markup into a [`Document`].
pub fn parse(source: &str) -> Document {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(source, options);

    let mut builder = Builder::default();
    for event in parser {
        builder.on_event(event);
    }
    builder.finish()
}

#[derive(Default)]
struct Builder {
    blocks: Vec<Block>,
    /// Open card, if any; blocks are routed here until its closing tag.
    card: Option<Card>,
    inlines: Vec<Inline>,
    styles: Vec<StyleFrame>,
    heading_level: u8,
    in_list_item: bool,
}

enum StyleFrame {
    Emphasis,
    Strong,
    Command,
    Link(String),
}

impl Builder {
    fn on_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Paragraph) => {}
            Event::End(TagEnd::Paragraph) => {
                if self.in_list_item {
                    // Loose list items wrap their text in paragraphs; fold the
                    // text into the item instead of emitting a nested block.
                    return;
                }
                let inlines = std::mem::take(&mut self.inlines);
                self.push_text_block(inlines, None);
            }
            Event::Start(Tag::Heading { level, .. }) => {
                self.heading_level = heading_level_to_u8(level);
            }
            Event::End(TagEnd::Heading(_)) => {
                let inlines = std::mem::take(&mut self.inlines);
                let level = self.heading_level;
                self.push_text_block(inlines, Some(level));
            }
            Event::Start(Tag::List(_)) | Event::End(TagEnd::List(_)) => {}
            Event::Start(Tag::Item) => {
                self.in_list_item = true;
                self.inlines.clear();
            }
            Event::End(TagEnd::Item) => {
                self.in_list_item = false;
                let inlines = std::mem::take(&mut self.inlines);
                self.push_block(Block::ListItem(inlines));
            }
            Event::Start(Tag::Emphasis) => self.styles.push(StyleFrame::Emphasis),
            Event::End(TagEnd::Emphasis) => {
                self.styles.pop();
            }
            Event::Start(Tag::Strong) => self.styles.push(StyleFrame::Strong),
            Event::End(TagEnd::Strong) => {
                self.styles.pop();
            }
            Event::Start(Tag::Strikethrough) => self.styles.push(StyleFrame::Command),
            Event::End(TagEnd::Strikethrough) => {
                self.styles.pop();
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                self.styles.push(StyleFrame::Link(dest_url.into_string()));
            }
            Event::End(TagEnd::Link) => {
                self.styles.pop();
            }
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => {
                self.inlines.push(Inline {
                    text: code.into_string(),
                    style: SpanStyle::Code,
                });
            }
            Event::SoftBreak | Event::HardBreak => self.push_text("\n"),
            Event::Rule => self.push_block(Block::Rule),
            Event::Html(html) | Event::InlineHtml(html) => self.on_html(&html),
            // Tables, footnotes, task lists and embedded images are not part
            // of the response markup contract; drop them.
            _ => {}
        }
    }

    fn on_html(&mut self, html: &str) {
        for line in html.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if self.card.is_none() {
                if let Some((kind, id)) = parse_card_open(line) {
                    self.card = Some(Card {
                        kind,
                        id,
                        blocks: Vec::new(),
                    });
                    continue;
                }
            }
            if line == "</div>" {
                if let Some(card) = self.card.take() {
                    self.blocks.push(Block::Card(card));
                }
            }
            // Any other raw HTML is outside the contract; drop it.
        }
    }

    fn current_style(&self) -> SpanStyle {
        // Innermost wins, with command spans taking precedence over link
        // styling so nested markup still activates as a command.
        for frame in self.styles.iter().rev() {
            match frame {
                StyleFrame::Command => return SpanStyle::Command,
                StyleFrame::Link(href) => return SpanStyle::Link(href.clone()),
                StyleFrame::Strong => return SpanStyle::Strong,
                StyleFrame::Emphasis => return SpanStyle::Emphasis,
            }
        }
        SpanStyle::Plain
    }

    fn push_text(&mut self, text: &str) {
        let style = self.current_style();
        if let Some(last) = self.inlines.last_mut() {
            if last.style == style {
                last.text.push_str(text);
                return;
            }
        }
        self.inlines.push(Inline {
            text: text.to_string(),
            style,
        });
    }

    /// Finalize a paragraph or heading, applying the error-block extension.
    fn push_text_block(&mut self, mut inlines: Vec<Inline>, heading: Option<u8>) {
        if inlines.is_empty() {
            return;
        }
        if let Some(level) = heading {
            self.push_block(Block::Heading { level, inlines });
            return;
        }
        let stripped = inlines
            .first()
            .and_then(|first| first.text.strip_prefix("! ").map(str::to_string));
        if let Some(text) = stripped {
            if let Some(first) = inlines.first_mut() {
                first.text = text;
            }
            self.push_block(Block::Error(inlines));
        } else {
            self.push_block(Block::Paragraph(inlines));
        }
    }

    fn push_block(&mut self, block: Block) {
        match &mut self.card {
            Some(card) => card.blocks.push(block),
            None => self.blocks.push(block),
        }
    }

    fn finish(mut self) -> Document {
        if !self.inlines.is_empty() {
            let inlines = std::mem::take(&mut self.inlines);
            self.push_text_block(inlines, None);
        }
        // An unterminated card still renders; it just keeps its key.
        if let Some(card) = self.card.take() {
            self.blocks.push(Block::Card(card));
        }
        Document {
            blocks: self.blocks,
        }
    }
}

fn heading_level_to_u8(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}
