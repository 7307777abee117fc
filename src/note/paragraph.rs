//! Paragraph factories: split a section into paragraphs of normalized text.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::mask::{is_separator, MaskAnnotator};
use super::section::Section;
use super::span::LexicalSpan;
use crate::config::{ParagraphConfig, ParagraphStrategy};

static WHITESPACE_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n[\s.]*\n").unwrap());

static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^(?:[0-9-+]+|[a-zA-Z]+:)[^\n]+$").unwrap());

/// Leading enumeration marker such as `1.`; decimals like `1.5` do not match.
static ENUM_MARKER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\.(?:\s+|$)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Extent in the note text.
    pub span: LexicalSpan,
    /// Note text under `span`.
    pub text: String,
    /// Kept lines (or list items) with masks normalized.
    pub sentences: Vec<String>,
    /// Sentences joined by a space.
    pub norm: String,
}

pub trait ParagraphFactory: Send + Sync {
    fn create(&self, note_text: &str, section: &Section) -> Vec<Paragraph>;
}

/// The paragraph factory selected by `config.factory`, chunking by default.
pub fn paragraph_factory(config: &ParagraphConfig) -> Box<dyn ParagraphFactory> {
    match config.factory.unwrap_or_default() {
        ParagraphStrategy::Whitespace => Box::new(WhitespaceParagraphFactory::new()),
        ParagraphStrategy::Chunking => Box::new(ChunkingParagraphFactory::from_config(config)),
    }
}

/// Line within a note: absolute span plus trimmed text.
struct Line<'a> {
    span: LexicalSpan,
    text: &'a str,
}

fn lines_in(note_text: &str, span: LexicalSpan) -> Vec<Line<'_>> {
    let text = span.slice(note_text);
    let mut lines = Vec::new();
    let mut offset = span.begin;
    for raw in text.split('\n') {
        let lead = raw.len() - raw.trim_start().len();
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            let begin = offset + lead;
            lines.push(Line {
                span: LexicalSpan::new(begin, begin + trimmed.len()),
                text: trimmed,
            });
        }
        offset += raw.len() + 1;
    }
    lines
}

/// Byte offset where the item of an enumerated line starts, or `None` when
/// the line is nothing but the marker. Chunking cuts before the `.` of a
/// marker standing on its own line, so a bare number followed by `.` in the
/// note counts as a marker too.
fn item_start(text: &str, followed_by_dot: bool) -> Option<usize> {
    if followed_by_dot && !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match ENUM_MARKER.find(text) {
        Some(m) if m.end() == text.len() => None,
        Some(m) => Some(m.end()),
        None => Some(0),
    }
}

fn paragraph_from(note_text: &str, span: LexicalSpan, sentences: Vec<String>) -> Paragraph {
    let norm = sentences.join(" ");
    Paragraph {
        span,
        text: span.slice(note_text).to_string(),
        sentences,
        norm,
    }
}

// ═══════════════════════════════════════════
// Whitespace
// ═══════════════════════════════════════════

/// Splits a section body on blank (or period only) lines.
#[derive(Default)]
pub struct WhitespaceParagraphFactory {
    masks: MaskAnnotator,
}

impl WhitespaceParagraphFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ParagraphFactory for WhitespaceParagraphFactory {
    fn create(&self, note_text: &str, section: &Section) -> Vec<Paragraph> {
        let body_span = section.body_span;
        let body = section.body(note_text);
        let mut marks = vec![body_span.begin];
        for m in WHITESPACE_SEPARATOR.find_iter(body) {
            marks.push(body_span.begin + m.start());
            marks.push(body_span.begin + m.end());
        }
        marks.push(body_span.end);

        marks
            .chunks(2)
            .filter_map(|pair| match pair {
                [begin, end] => Some(LexicalSpan::new(*begin, *end)),
                _ => None,
            })
            .filter_map(|span| {
                let lines = lines_in(note_text, span);
                let first = lines.first()?.span;
                let last = lines.last()?.span;
                let sentences = vec![self
                    .masks
                    .normalize(&lines.iter().map(|l| l.text).collect::<Vec<_>>().join(" "))];
                Some(paragraph_from(note_text, LexicalSpan::new(first.begin, last.end), sentences))
            })
            .collect()
    }
}

// ═══════════════════════════════════════════
// Chunking
// ═══════════════════════════════════════════

/// Splits at two consecutive newline or period characters, prunes separator
/// and short lines, and re-chunks paragraphs that read as item lists.
pub struct ChunkingParagraphFactory {
    /// Lines must have more tokens than this to be kept.
    pub min_sent_len: usize,
    /// A paragraph is re-chunked as a list when it has more list items than
    /// this; zero disables list chunking.
    pub min_list_norm_matches: usize,
    /// List chunking is skipped when an item is at least this long.
    pub max_sent_list_len: usize,
    pub include_section_headers: bool,
    /// Normalized lines to drop.
    pub filter_sent_text: BTreeSet<String>,
    /// Drop lines that hold only an enumeration marker.
    pub filter_enums: bool,
    masks: MaskAnnotator,
}

impl Default for ChunkingParagraphFactory {
    fn default() -> Self {
        Self {
            min_sent_len: 0,
            min_list_norm_matches: 2,
            max_sent_list_len: 200,
            include_section_headers: true,
            filter_sent_text: BTreeSet::from([".".to_string()]),
            filter_enums: true,
            masks: MaskAnnotator::new(),
        }
    }
}

impl ChunkingParagraphFactory {
    pub fn from_config(config: &ParagraphConfig) -> Self {
        let defaults = Self::default();
        Self {
            min_sent_len: config.min_sent_len.unwrap_or(defaults.min_sent_len),
            min_list_norm_matches: config.min_list_norm_matches.unwrap_or(defaults.min_list_norm_matches),
            max_sent_list_len: config.max_sent_list_len.unwrap_or(defaults.max_sent_list_len),
            include_section_headers: config
                .include_section_headers
                .unwrap_or(defaults.include_section_headers),
            filter_sent_text: config
                .filter_sent_text
                .clone()
                .unwrap_or(defaults.filter_sent_text),
            ..defaults
        }
    }

    /// Chunk boundaries: a chunk ends before the first position whose next
    /// two bytes are both `\n` or `.`, or at the end of the text.
    fn chunk_spans(text: &str) -> Vec<(usize, usize)> {
        let bytes = text.as_bytes();
        let is_sep = |b: u8| b == b'\n' || b == b'.';
        let mut spans = Vec::new();
        let mut start = 0;
        while start < bytes.len() {
            let mut end = start + 1;
            while end < bytes.len() && !(is_sep(bytes[end]) && bytes.get(end + 1).copied().map(is_sep).unwrap_or(false)) {
                end += 1;
            }
            spans.push((start, end));
            start = end;
        }
        spans
    }

    /// `line` without its enumeration marker, or `None` when only the marker
    /// is left.
    fn strip_enum<'a>(&self, note_text: &str, line: Line<'a>) -> Option<Line<'a>> {
        if !self.filter_enums {
            return Some(line);
        }
        let followed_by_dot = note_text.as_bytes().get(line.span.end) == Some(&b'.');
        let start = item_start(line.text, followed_by_dot)?;
        Some(Line {
            span: LexicalSpan::new(line.span.begin + start, line.span.end),
            text: line.text.get(start..)?,
        })
    }

    /// Lines of a chunk with enumeration markers and separator tokens
    /// removed, as (line span, norm).
    fn kept_lines(&self, note_text: &str, chunk: LexicalSpan) -> Vec<(LexicalSpan, String)> {
        lines_in(note_text, chunk)
            .into_iter()
            .filter_map(|line| {
                let span = line.span;
                let line = self.strip_enum(note_text, line)?;
                let tokens: Vec<&str> = line.text.split_whitespace().filter(|t| !is_separator(t)).collect();
                let norm = tokens.join(" ");
                (tokens.len() > self.min_sent_len && !self.filter_sent_text.contains(&norm))
                    .then(|| (span, self.masks.normalize(&norm)))
            })
            .collect()
    }

    /// List items of the chunk when it reads as a list.
    fn list_items(&self, note_text: &str, span: LexicalSpan) -> Option<Vec<(LexicalSpan, String)>> {
        if self.min_list_norm_matches == 0 {
            return None;
        }
        let text = span.slice(note_text);
        let items: Vec<(LexicalSpan, String)> = LIST_ITEM
            .find_iter(text)
            .map(|m| {
                let item = m.as_str().trim_end();
                Line {
                    span: LexicalSpan::new(m.start(), m.start() + item.len()).shift(span.begin),
                    text: item,
                }
            })
            .filter_map(|line| self.strip_enum(note_text, line))
            .map(|line| (line.span, self.masks.normalize(line.text)))
            .collect();
        let max_len = items.iter().map(|(_, s)| s.len()).max()?;
        (items.len() > self.min_list_norm_matches && max_len < self.max_sent_list_len).then_some(items)
    }
}

impl ParagraphFactory for ChunkingParagraphFactory {
    fn create(&self, note_text: &str, section: &Section) -> Vec<Paragraph> {
        let span = if self.include_section_headers {
            section.lexspan()
        } else {
            section.body_span
        };
        let text = span.slice(note_text);
        if text.trim().is_empty() {
            return Vec::new();
        }

        Self::chunk_spans(text)
            .into_iter()
            .filter_map(|(begin, end)| {
                let chunk = LexicalSpan::new(begin, end).shift(span.begin);
                let kept = self.kept_lines(note_text, chunk);
                let first = kept.first()?.0;
                let last = kept.last()?.0;
                let extent = LexicalSpan::new(first.begin, last.end);
                let sentences = match self.list_items(note_text, extent) {
                    Some(items) => items.into_iter().map(|(_, s)| s).collect(),
                    None => kept.into_iter().map(|(_, s)| s).collect(),
                };
                Some(paragraph_from(note_text, extent, sentences))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_section(text: &str) -> Section {
        Section::new(0, Some("default"), Vec::new(), LexicalSpan::new(0, text.len()), text)
    }

    #[test]
    fn whitespace_splits_on_blank_lines() {
        let text = "Patient stable.\nNo events.\n\nPlan:\ncontinue [**First Name 3**]\n.\nfollow up";
        let paras = WhitespaceParagraphFactory::new().create(text, &body_section(text));
        let norms: Vec<&str> = paras.iter().map(|p| p.norm.as_str()).collect();
        assert_eq!(norms, vec!["Patient stable. No events.", "Plan: continue FIRSTNAME", "follow up"]);
        assert_eq!(paras[0].text, "Patient stable.\nNo events.");
    }

    #[test]
    fn chunk_boundaries() {
        let spans = ChunkingParagraphFactory::chunk_spans("ab\n\ncd..e");
        assert_eq!(spans, vec![(0, 2), (2, 6), (6, 9)]);
    }

    #[test]
    fn chunking_drops_separators_and_filtered_lines() {
        let text = "First paragraph here\n__________\n\n.\n\nSecond [**2150-1-2**] paragraph";
        let factory = ChunkingParagraphFactory::default();
        let paras = factory.create(text, &body_section(text));
        let norms: Vec<&str> = paras.iter().map(|p| p.norm.as_str()).collect();
        assert_eq!(norms, vec!["First paragraph here", "Second DATE paragraph"]);
        assert_eq!(paras[1].text, "Second [**2150-1-2**] paragraph");
    }

    #[test]
    fn chunking_includes_headers() {
        let text = "Allergies:\nPenicillin";
        let sec = Section::new(0, None, vec![LexicalSpan::new(0, 9)], LexicalSpan::new(11, text.len()), text);
        let with = ChunkingParagraphFactory::default().create(text, &sec);
        assert_eq!(with[0].sentences, vec!["Allergies:", "Penicillin"]);
        let without = ChunkingParagraphFactory {
            include_section_headers: false,
            ..Default::default()
        }
        .create(text, &sec);
        assert_eq!(without[0].norm, "Penicillin");
    }

    #[test]
    fn min_sent_len_prunes_short_lines() {
        let text = "Penicillin\nshellfish and nuts";
        let factory = ChunkingParagraphFactory {
            min_sent_len: 1,
            ..Default::default()
        };
        let paras = factory.create(text, &body_section(text));
        assert_eq!(paras[0].sentences, vec!["shellfish and nuts"]);
    }

    #[test]
    fn list_chunked_when_enough_items() {
        let text = "Meds: see list\n- aspirin 81 mg\n- lasix 40 mg\n- lisinopril 10 mg\nend of list";
        let paras = ChunkingParagraphFactory::default().create(text, &body_section(text));
        assert_eq!(
            paras[0].sentences,
            vec!["Meds: see list", "- aspirin 81 mg", "- lasix 40 mg", "- lisinopril 10 mg"]
        );
    }

    #[test]
    fn list_not_chunked_at_threshold() {
        let text = "- aspirin 81 mg\n- lasix 40 mg\nnot an item";
        let paras = ChunkingParagraphFactory::default().create(text, &body_section(text));
        assert_eq!(paras[0].sentences.len(), 3);
        assert_eq!(paras[0].sentences[2], "not an item");
    }

    #[test]
    fn enumeration_only_lines_filtered() {
        let text = "1.\nVancomycin 125 mg\n2.\nLasix 40 mg";
        let factory = ChunkingParagraphFactory::default();
        let kept = factory.kept_lines(text, LexicalSpan::new(0, text.len()));
        let norms: Vec<&str> = kept.iter().map(|(_, s)| s.as_str()).collect();
        assert_eq!(norms, vec!["Vancomycin 125 mg", "Lasix 40 mg"]);
        assert_eq!(kept[0].0.slice(text), "Vancomycin 125 mg");
    }

    fn sentences(paras: &[Paragraph]) -> Vec<Vec<&str>> {
        paras
            .iter()
            .map(|p| p.sentences.iter().map(String::as_str).collect())
            .collect()
    }

    #[test]
    fn enumeration_markers_on_own_lines_dropped() {
        let text = "1.\nVancomycin 125 mg\n2.\nLasix 40 mg\n3.\nHeparin 5000 units\n4.\nAspirin 81 mg";
        let paras = ChunkingParagraphFactory::default().create(text, &body_section(text));
        assert_eq!(
            sentences(&paras),
            vec![
                vec!["Vancomycin 125 mg"],
                vec!["Lasix 40 mg"],
                vec!["Heparin 5000 units"],
                vec!["Aspirin 81 mg"],
            ]
        );
        assert_eq!(paras[0].text, "Vancomycin 125 mg");
    }

    #[test]
    fn inline_enumeration_markers_stripped() {
        let text = "1. Vancomycin 125 mg\n2. Lasix 40 mg\n3. Heparin 5000 units\n4. Aspirin 81 mg";
        let paras = ChunkingParagraphFactory::default().create(text, &body_section(text));
        assert_eq!(
            sentences(&paras),
            vec![vec!["Vancomycin 125 mg", "Lasix 40 mg", "Heparin 5000 units", "Aspirin 81 mg"]]
        );
        assert_eq!(paras[0].text, text);
    }

    #[test]
    fn enumerations_kept_when_not_filtered() {
        let text = "1. Vancomycin 125 mg\nthen taper";
        let factory = ChunkingParagraphFactory {
            filter_enums: false,
            ..Default::default()
        };
        let paras = factory.create(text, &body_section(text));
        assert_eq!(sentences(&paras), vec![vec!["1. Vancomycin 125 mg", "then taper"]]);
    }

    #[test]
    fn decimals_are_not_enumerations() {
        assert_eq!(item_start("1.5 mg daily", false), Some(0));
        assert_eq!(item_start("12", false), Some(0));
        assert_eq!(item_start("12", true), None);
        assert_eq!(item_start("3.", false), None);
        assert_eq!(item_start("3. Lasix", false), Some(3));
    }

    #[test]
    fn factory_selected_by_config() {
        let text = "Patient stable\nNo events";
        let config = ParagraphConfig {
            factory: Some(ParagraphStrategy::Whitespace),
            ..Default::default()
        };
        let whitespace = paragraph_factory(&config).create(text, &body_section(text));
        assert_eq!(whitespace[0].sentences, vec!["Patient stable No events"]);
        let chunking = paragraph_factory(&ParagraphConfig::default()).create(text, &body_section(text));
        assert_eq!(chunking[0].sentences, vec!["Patient stable", "No events"]);
    }

    #[test]
    fn blank_section_has_no_paragraphs() {
        let text = "   \n  ";
        assert!(ChunkingParagraphFactory::default().create(text, &body_section(text)).is_empty());
    }
}
