//! Prompt assembly: instruction template + rendered history + new message.
//!
//! A template names its inputs with `{identifier}` slots. Exactly two slots
//! are understood, `{chat_history}` and `{question}`, and both must be
//! present. Braces that do not enclose an identifier are plain text.

use parley_core::error::TemplateError;

/// Slot that receives the rendered history window.
pub const HISTORY_SLOT: &str = "chat_history";

/// Slot that receives the new user message.
pub const QUESTION_SLOT: &str = "question";

const REQUIRED_SLOTS: [&str; 2] = [HISTORY_SLOT, QUESTION_SLOT];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Segment<'a> {
    Literal(&'a str),
    Slot(&'a str),
}

/// A validated instruction template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
}

impl PromptTemplate {
    /// Validate `template` once, up front.
    pub fn parse(template: impl Into<String>) -> Result<Self, TemplateError> {
        let source = template.into();
        validate(&source)?;
        Ok(Self { source })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Fill the slots. Infallible because the template was validated.
    pub fn render(&self, history_text: &str, user_text: &str) -> String {
        substitute(&self.source, history_text, user_text)
    }
}

/// One-shot assembly from an unvalidated template.
pub fn build(
    instruction_template: &str,
    history_text: &str,
    user_text: &str,
) -> Result<String, TemplateError> {
    validate(instruction_template)?;
    Ok(substitute(instruction_template, history_text, user_text))
}

fn validate(template: &str) -> Result<(), TemplateError> {
    let slots: Vec<&str> = scan(template)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Slot(name) => Some(name),
            Segment::Literal(_) => None,
        })
        .collect();

    if let Some(unknown) = slots.iter().find(|name| !REQUIRED_SLOTS.contains(name)) {
        return Err(TemplateError::UnknownSlot((*unknown).to_string()));
    }
    if let Some(missing) = REQUIRED_SLOTS.iter().find(|req| !slots.contains(req)) {
        return Err(TemplateError::MissingSlot((*missing).to_string()));
    }
    Ok(())
}

/// Single left-to-right pass; inserted values are never rescanned.
fn substitute(template: &str, history_text: &str, user_text: &str) -> String {
    let mut out = String::with_capacity(template.len() + history_text.len() + user_text.len());
    for segment in scan(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Slot(HISTORY_SLOT) => out.push_str(history_text),
            Segment::Slot(QUESTION_SLOT) => out.push_str(user_text),
            Segment::Slot(other) => {
                out.push('{');
                out.push_str(other);
                out.push('}');
            }
        }
    }
    out
}

fn scan(template: &str) -> Vec<Segment<'_>> {
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut cursor = 0;

    while let Some(offset) = template[cursor..].find('{') {
        let open = cursor + offset;
        let Some(close_offset) = template[open + 1..].find('}') else {
            break;
        };
        let close = open + 1 + close_offset;
        let name = &template[open + 1..close];

        if is_slot_name(name) {
            if literal_start < open {
                segments.push(Segment::Literal(&template[literal_start..open]));
            }
            segments.push(Segment::Slot(name));
            cursor = close + 1;
            literal_start = cursor;
        } else {
            cursor = open + 1;
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }
    segments
}

fn is_slot_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
