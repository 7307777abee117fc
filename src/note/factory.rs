//! Creates [`Note`]s from note events by dispatching on the category.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use super::container::Note;
use super::error::NoteError;
use super::extractors::{default_category_mapping, extractor_by_name, SectionExtractor};
use crate::models::enums::SectionAnnotatorType;
use crate::models::NoteEvent;

pub struct NoteFactory {
    extractors: HashMap<String, Arc<dyn SectionExtractor>>,
    default_only: bool,
}

impl NoteFactory {
    /// Factory over the built-in category mapping.
    pub fn new() -> Self {
        let extractors = default_category_mapping()
            .into_iter()
            .filter_map(|(cat, name)| extractor_by_name(&name).map(|e| (cat, e)))
            .collect();
        Self {
            extractors,
            default_only: false,
        }
    }

    /// Factory from a `category → extractor name` mapping. An empty mapping
    /// keeps the built-in one.
    pub fn from_mapping(mapping: &BTreeMap<String, String>) -> Result<Self, NoteError> {
        if mapping.is_empty() {
            return Ok(Self::new());
        }
        let mut extractors = HashMap::new();
        for (category, name) in mapping {
            let extractor = extractor_by_name(name).ok_or_else(|| NoteError::UnknownExtractor {
                category: category.clone(),
                name: name.clone(),
            })?;
            extractors.insert(category.trim().to_string(), extractor);
        }
        Ok(Self {
            extractors,
            default_only: false,
        })
    }

    /// Only create unsectioned notes.
    pub fn with_default_only(mut self, default_only: bool) -> Self {
        self.default_only = default_only;
        self
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut cats: Vec<&str> = self.extractors.keys().map(String::as_str).collect();
        cats.sort_unstable();
        cats
    }

    /// Segment the note with its category's extractor; unmapped categories
    /// and notes no pattern matches get the default section.
    pub fn create(&self, event: NoteEvent) -> Note {
        if self.default_only {
            return self.create_default(event);
        }
        let Some(extractor) = self.extractors.get(&event.category) else {
            tracing::trace!(row_id = event.row_id, category = %event.category, "No extractor for category");
            return self.create_default(event);
        };
        let sections = extractor.extract(&event.text);
        if sections.is_empty() {
            tracing::debug!(row_id = event.row_id, extractor = extractor.name(), "No sections matched");
            let mut note = Note::unsectioned(event);
            note.annotator = SectionAnnotatorType::RegularExpression;
            return note;
        }
        Note::new(event, SectionAnnotatorType::RegularExpression, sections)
    }

    pub fn create_default(&self, event: NoteEvent) -> Note {
        Note::unsectioned(event)
    }
}

impl Default for NoteFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{self, seeded_db};
    use crate::db::get_notes_by_hadm_id;

    #[test]
    fn dispatches_on_category() {
        let conn = seeded_db();
        let factory = NoteFactory::new();
        let notes: Vec<Note> = get_notes_by_hadm_id(&conn, 100)
            .unwrap()
            .into_iter()
            .map(|e| factory.create(e))
            .collect();
        let counts: Vec<(i64, usize)> = notes.iter().map(|n| (n.row_id(), n.sections.len())).collect();
        assert_eq!(counts, vec![(1, 3), (2, 3), (3, 3), (4, 2), (5, 2), (6, 2), (7, 3), (8, 1)]);
        assert_eq!(notes[4].annotator, SectionAnnotatorType::RegularExpression);
        assert_eq!(notes[7].annotator, SectionAnnotatorType::None);
        assert_eq!(notes[7].section(0).unwrap().name, "default");
    }

    #[test]
    fn default_only_skips_extractors() {
        let factory = NoteFactory::new().with_default_only(true);
        let event = NoteEvent::new(2, 1, Some(100), "Radiology", fixtures::RADIOLOGY).unwrap();
        let note = factory.create(event);
        assert_eq!(note.sections.len(), 1);
    }

    #[test]
    fn unmatched_text_falls_back_to_default() {
        let factory = NoteFactory::new();
        let event = NoteEvent::new(2, 1, Some(100), "Radiology", "no headers at all").unwrap();
        let note = factory.create(event);
        assert_eq!(note.section(0).unwrap().name, "default");
        assert_eq!(note.annotator, SectionAnnotatorType::RegularExpression);
    }

    #[test]
    fn custom_mapping() {
        let mapping = BTreeMap::from([("Social Work".to_string(), "nursing_other".to_string())]);
        let factory = NoteFactory::from_mapping(&mapping).unwrap();
        assert_eq!(factory.categories(), vec!["Social Work"]);
        let event = NoteEvent::new(2, 1, Some(100), "Social Work", fixtures::NURSING).unwrap();
        assert_eq!(factory.create(event).sections.len(), 2);
    }

    #[test]
    fn unknown_extractor_rejected() {
        let mapping = BTreeMap::from([("Echo".to_string(), "nope".to_string())]);
        assert!(matches!(
            NoteFactory::from_mapping(&mapping),
            Err(NoteError::UnknownExtractor { .. })
        ));
    }
}
