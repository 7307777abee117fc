use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::section::Section;
use super::span::LexicalSpan;
use crate::models::enums::SectionAnnotatorType;
use crate::models::NoteEvent;

/// Name of the single section of a note that was not segmented.
pub const DEFAULT_SECTION_NAME: &str = "default";

/// A note event segmented into sections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub event: NoteEvent,
    pub annotator: SectionAnnotatorType,
    pub sections: BTreeMap<usize, Section>,
}

impl Note {
    pub fn new(event: NoteEvent, annotator: SectionAnnotatorType, sections: Vec<Section>) -> Self {
        let sections = sections.into_iter().map(|s| (s.id, s)).collect();
        Self {
            event,
            annotator,
            sections,
        }
    }

    /// A note with one section spanning all of its text.
    pub fn unsectioned(event: NoteEvent) -> Self {
        let sec = Section::new(
            0,
            Some(DEFAULT_SECTION_NAME),
            Vec::new(),
            LexicalSpan::new(0, event.text.len()),
            &event.text,
        );
        Self::new(event, SectionAnnotatorType::None, vec![sec])
    }

    pub fn text(&self) -> &str {
        &self.event.text
    }

    pub fn row_id(&self) -> i64 {
        self.event.row_id
    }

    pub fn category(&self) -> &str {
        &self.event.category
    }

    /// Category slug, see [`NoteEvent::id`].
    pub fn id(&self) -> String {
        self.event.id()
    }

    pub fn section(&self, id: usize) -> Option<&Section> {
        self.sections.get(&id)
    }

    /// Sections in id order.
    pub fn sections_ordered(&self) -> Vec<&Section> {
        self.sections.values().collect()
    }

    /// Sections grouped by name, each group in id order.
    pub fn sections_by_name(&self) -> BTreeMap<&str, Vec<&Section>> {
        let mut by_name: BTreeMap<&str, Vec<&Section>> = BTreeMap::new();
        for sec in self.sections.values() {
            by_name.entry(sec.name.as_str()).or_default().push(sec);
        }
        by_name
    }

    /// Sections in the order they appear in the text.
    pub fn iter(&self) -> impl Iterator<Item = &Section> {
        let mut secs: Vec<&Section> = self.sections.values().collect();
        secs.sort_by_key(|s| s.lexspan());
        secs.into_iter()
    }

    /// `Discharge summary` → `discharge-summary`
    pub fn category_to_id(category: &str) -> String {
        Section::header_to_name(category)
    }

    /// `discharge-summary` → `Discharge summary`
    pub fn id_to_category(id: &str) -> String {
        Section::name_to_header(id)
    }
}
