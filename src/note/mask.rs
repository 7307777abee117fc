//! MIMIC-III de-identification masks and text separators.
//!
//! De-identified values appear as `[**First Name (Titles) 123**]`. Masks are
//! normalized to a pseudo token (`FIRSTNAME`, `DATE`, ...) with an OntoNotes
//! entity label when the mask text is recognized, and `<UNKNOWN>` otherwise.
//! Separators are long runs of `_`, `*` or `-`.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::span::LexicalSpan;

static MASK_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\*\*([^\*]+)\*\*\]").unwrap());

static SEPARATOR_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(_{5,}|[*]{5,}|[-]{5,})").unwrap());

pub const UNKNOWN_ENTITY: &str = "<UNKNOWN>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaskKind {
    Mask,
    Separator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskAnnotation {
    pub span: LexicalSpan,
    pub kind: MaskKind,
    /// Normalized form; separators keep their text.
    pub norm: String,
    /// OntoNotes entity label of a recognized mask.
    pub onto: Option<String>,
}

struct MaskEntity {
    pattern: Regex,
    replacement: String,
    onto: Option<String>,
}

pub struct MaskAnnotator {
    entities: Vec<MaskEntity>,
}

impl MaskAnnotator {
    /// Annotator recognizing first names, last names and shifted dates.
    pub fn new() -> Self {
        let defaults = [
            (r"^First Name", "FIRSTNAME", Some("PERSON")),
            (r"^Last Name", "LASTNAME", Some("PERSON")),
            (r"^21\d{2}-\d{1,2}-\d{1,2}$", "DATE", Some("DATE")),
        ];
        let entities = defaults
            .into_iter()
            .filter_map(|(pat, repl, onto)| {
                Regex::new(pat).ok().map(|pattern| MaskEntity {
                    pattern,
                    replacement: repl.to_string(),
                    onto: onto.map(str::to_string),
                })
            })
            .collect();
        Self { entities }
    }

    /// Masks and separators of `text` in order of appearance.
    pub fn annotate(&self, text: &str) -> Vec<MaskAnnotation> {
        let mut anns: Vec<MaskAnnotation> = MASK_REGEX
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let value = caps.get(1)?.as_str();
                let (norm, onto) = match self.entities.iter().find(|e| e.pattern.is_match(value)) {
                    Some(e) => (e.replacement.clone(), e.onto.clone()),
                    None => (UNKNOWN_ENTITY.to_string(), None),
                };
                Some(MaskAnnotation {
                    span: LexicalSpan::new(whole.start(), whole.end()),
                    kind: MaskKind::Mask,
                    norm,
                    onto,
                })
            })
            .collect();
        anns.extend(SEPARATOR_REGEX.find_iter(text).map(|m| MaskAnnotation {
            span: LexicalSpan::new(m.start(), m.end()),
            kind: MaskKind::Separator,
            norm: m.as_str().to_string(),
            onto: None,
        }));
        anns.sort_by_key(|a| a.span);
        anns
    }

    /// `text` with masks replaced by their normalized form.
    pub fn normalize(&self, text: &str) -> String {
        self.rewrite(text, |ann| match ann.kind {
            MaskKind::Mask => Some(ann.norm.as_str()),
            MaskKind::Separator => None,
        })
    }

    fn rewrite<F>(&self, text: &str, mut replace: F) -> String
    where
        F: FnMut(&MaskAnnotation) -> Option<&str>,
    {
        let anns = self.annotate(text);
        let mut out = String::with_capacity(text.len());
        let mut pos = 0;
        for ann in &anns {
            if ann.span.begin < pos {
                continue;
            }
            if let Some(repl) = replace(ann) {
                out.push_str(&text[pos..ann.span.begin]);
                out.push_str(repl);
                pos = ann.span.end;
            }
        }
        out.push_str(&text[pos..]);
        out
    }
}

impl Default for MaskAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `token` is entirely a separator.
pub fn is_separator(token: &str) -> bool {
    SEPARATOR_REGEX
        .find(token)
        .map(|m| m.start() == 0 && m.end() == token.len())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "Seen by [**First Name (Titles) 8**] [**Last Name (Titles) **] on [**2150-3-4**]\n\
_____\nat [**Hospital1 18**].";

    #[test]
    fn annotates_masks_and_separators() {
        let anns = MaskAnnotator::new().annotate(TEXT);
        let norms: Vec<&str> = anns.iter().map(|a| a.norm.as_str()).collect();
        assert_eq!(norms, vec!["FIRSTNAME", "LASTNAME", "DATE", "_____", UNKNOWN_ENTITY]);
        assert_eq!(anns[0].onto.as_deref(), Some("PERSON"));
        assert_eq!(anns[2].onto.as_deref(), Some("DATE"));
        assert_eq!(anns[3].kind, MaskKind::Separator);
        assert_eq!(anns[4].onto, None);
        assert_eq!(anns[2].span.slice(TEXT), "[**2150-3-4**]");
    }

    #[test]
    fn normalize_replaces_masks() {
        let norm = MaskAnnotator::new().normalize(TEXT);
        assert_eq!(norm, "Seen by FIRSTNAME LASTNAME on DATE\n_____\nat <UNKNOWN>.");
    }

    #[test]
    fn date_must_be_shifted_year() {
        let anns = MaskAnnotator::new().annotate("[**2019-1-1**]");
        assert_eq!(anns[0].norm, UNKNOWN_ENTITY);
    }

    #[test]
    fn separator_tokens() {
        assert!(is_separator("*****"));
        assert!(is_separator("----------"));
        assert!(!is_separator("----"));
        assert!(!is_separator("a-----"));
    }
}
