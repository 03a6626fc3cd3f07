//! The displayed output sequence and its reconciliation rule.
//!
//! Repeated lookups of the same logical record should update the displayed
//! card in place rather than stacking duplicates. The rule operates on the
//! parsed document's labelled fields, never on a rendering technology: when a
//! new response carries the same entity key as the most recent response
//! block, its fields are diffed by index against the old block's, changed
//! ones are marked, and the old block is replaced at its position.

use lorebook_markup::Block;
use lorebook_markup::Card;
use lorebook_markup::Document;
use lorebook_markup::inline_text;

/// Identifies the logical record a rendered card describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityKey {
    pub kind: String,
    pub id: String,
}

/// A labelled field extracted from a record card, e.g. `Age: 31`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRecord {
    pub label: String,
    /// The full field line, trimmed.
    pub text: String,
    /// Set by the reconciler when this field differs from the block it
    /// replaced.
    pub changed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputBlock {
    /// A submitted command echoed back to the transcript.
    Echo { command: String },
    /// A rendered executor response.
    Response {
        document: Document,
        entity: Option<EntityKey>,
        fields: Vec<FieldRecord>,
    },
}

impl OutputBlock {
    pub fn echo(command: &str) -> Self {
        OutputBlock::Echo {
            command: command.to_string(),
        }
    }

    /// Parse response markup and lift out the entity key and labelled fields
    /// of its root card, when it has one.
    pub fn response(markup: &str) -> Self {
        let document = lorebook_markup::parse(markup);
        let card = document.blocks.iter().find_map(|block| match block {
            Block::Card(card) => Some(card),
            _ => None,
        });
        let entity = card.map(|card| EntityKey {
            kind: card.kind.clone(),
            id: card.id.clone(),
        });
        let fields = card.map(extract_fields).unwrap_or_default();
        OutputBlock::Response {
            document,
            entity,
            fields,
        }
    }

    pub fn entity(&self) -> Option<&EntityKey> {
        match self {
            OutputBlock::Echo { .. } => None,
            OutputBlock::Response { entity, .. } => entity.as_ref(),
        }
    }

    pub fn fields(&self) -> &[FieldRecord] {
        match self {
            OutputBlock::Echo { .. } => &[],
            OutputBlock::Response { fields, .. } => fields,
        }
    }

    fn is_response(&self) -> bool {
        matches!(self, OutputBlock::Response { .. })
    }
}

fn extract_fields(card: &Card) -> Vec<FieldRecord> {
    let mut fields = Vec::new();
    for block in &card.blocks {
        let Block::Paragraph(inlines) = block else {
            continue;
        };
        for line in inline_text(inlines).lines() {
            if let Some(label) = field_label(line) {
                fields.push(FieldRecord {
                    label,
                    text: line.trim().to_string(),
                    changed: false,
                });
            }
        }
    }
    fields
}

/// A field line looks like `Label: value` where the label is a short run of
/// word characters, spaces, or dashes starting with a letter, and the colon
/// is followed by a space (or ends the line). Rules out URLs and clock times.
fn field_label(line: &str) -> Option<String> {
    let (label, rest) = line.trim().split_once(':')?;
    if !(rest.is_empty() || rest.starts_with(' ')) {
        return None;
    }
    let label = label.trim();
    let mut chars = label.chars();
    if !chars.next()?.is_alphabetic() {
        return None;
    }
    if !chars.all(|ch| ch.is_alphanumeric() || ch == ' ' || ch == '-') {
        return None;
    }
    Some(label.to_string())
}

/// Outcome of pushing a block into the transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Appended,
    Replaced { index: usize },
}

/// The displayed sequence of output blocks.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    blocks: Vec<OutputBlock>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn blocks(&self) -> &[OutputBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Append `block`, or replace the most recent response block in place
    /// when both describe the same entity. Echo blocks are transparent to
    /// matching and are never replaced.
    pub fn push(&mut self, mut block: OutputBlock) -> Reconciliation {
        let target = match block.entity() {
            Some(_) => self
                .blocks
                .iter()
                .rposition(OutputBlock::is_response)
                .filter(|&idx| self.blocks[idx].entity() == block.entity()),
            None => None,
        };
        match target {
            Some(index) => {
                mark_changed_fields(&mut block, &self.blocks[index]);
                self.blocks[index] = block;
                Reconciliation::Replaced { index }
            }
            None => {
                self.blocks.push(block);
                Reconciliation::Appended
            }
        }
    }
}

fn mark_changed_fields(new: &mut OutputBlock, old: &OutputBlock) {
    let old_fields = old.fields();
    let OutputBlock::Response { fields, .. } = new else {
        return;
    };
    for (idx, field) in fields.iter_mut().enumerate() {
        field.changed = match old_fields.get(idx) {
            Some(old_field) => old_field.text.trim() != field.text.trim(),
            None => true,
        };
    }
}
