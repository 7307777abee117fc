use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::span::LexicalSpan;

static NAME_SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[_/ ]+").unwrap());

/// Name given to sections without a header.
pub const UNKNOWN_SECTION_NAME: &str = "unknown";

/// A segment of a note, such as the history of present illness of a
/// discharge summary. Spans index into the owning note's text, which is
/// passed to the accessors that need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub id: usize,
    /// Id the section had before gap filling renumbered it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_id: Option<usize>,
    pub name: String,
    pub header_spans: Vec<LexicalSpan>,
    pub body_span: LexicalSpan,
}

impl Section {
    /// Create a section; without a `name` one is derived from the header text.
    pub fn new(
        id: usize,
        name: Option<&str>,
        header_spans: Vec<LexicalSpan>,
        body_span: LexicalSpan,
        note_text: &str,
    ) -> Self {
        let name = match name {
            Some(n) => n.to_string(),
            None if header_spans.is_empty() => UNKNOWN_SECTION_NAME.to_string(),
            None => {
                let header = header_spans
                    .iter()
                    .map(|s| s.slice(note_text))
                    .collect::<Vec<_>>()
                    .join(" ");
                NAME_SEPARATORS.replace_all(&header, "-").to_lowercase()
            }
        };
        Self {
            id,
            original_id: None,
            name,
            header_spans,
            body_span,
        }
    }

    pub fn headers<'a>(&self, note_text: &'a str) -> Vec<&'a str> {
        self.header_spans.iter().map(|s| s.slice(note_text)).collect()
    }

    /// Header text joined by a space; empty without headers.
    pub fn header(&self, note_text: &str) -> String {
        self.headers(note_text).join(" ")
    }

    pub fn body<'a>(&self, note_text: &'a str) -> &'a str {
        self.body_span.slice(note_text)
    }

    /// The widest extent of the section, headers included.
    pub fn lexspan(&self) -> LexicalSpan {
        LexicalSpan::widen(std::iter::once(self.body_span).chain(self.header_spans.iter().copied()))
            .unwrap_or(self.body_span)
    }

    /// Full section text including the headers.
    pub fn text<'a>(&self, note_text: &'a str) -> &'a str {
        self.lexspan().slice(note_text)
    }

    pub fn is_empty(&self, note_text: &str) -> bool {
        self.header_spans.is_empty() && self.body(note_text).trim().is_empty()
    }

    /// Characters in the body and headers.
    pub fn len(&self) -> usize {
        self.body_span.len() + self.header_spans.iter().map(LexicalSpan::len).sum::<usize>()
    }

    pub fn describe(&self, note_text: &str) -> String {
        format!("{} ({}): body_len={}", self.name, self.id, self.body(note_text).len())
    }

    /// `History of present illness` → `history-of-present-illness`
    pub fn header_to_name(header: &str) -> String {
        header.replace(' ', "-").to_lowercase()
    }

    /// Inverse of [`Section::header_to_name`]; only the first letter is
    /// capitalized so the result may not match the original header.
    pub fn name_to_header(name: &str) -> String {
        let spaced = name.replace('-', " ");
        let mut chars = spaced.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
            None => String::new(),
        }
    }
}
