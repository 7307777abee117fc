use super::container::Note;
use super::section::Section;
use super::span::LexicalSpan;

/// Copy of `note` whose text not covered by any section becomes extra
/// `unknown` sections.
///
/// Sections are sorted by position and renumbered from zero; each keeps its
/// prior id in `original_id`. Gap sections have no original id. With
/// `filter_empty`, whitespace-only gaps are dropped.
pub fn fill_gaps(note: &Note, filter_empty: bool) -> Note {
    let text = note.text();
    let mut sections: Vec<Section> = note.sections.values().cloned().collect();
    if sections.is_empty() {
        return note.clone();
    }

    let gaps = LexicalSpan::gaps(sections.iter().map(Section::lexspan), text.len());
    let before = sections.len();
    for gap in gaps {
        let sec = Section::new(usize::MAX, None, Vec::new(), gap, text);
        if filter_empty && sec.is_empty(text) {
            continue;
        }
        sections.push(sec);
    }
    sections.sort_by_key(Section::lexspan);

    for (sid, sec) in sections.iter_mut().enumerate() {
        sec.original_id = (sec.id != usize::MAX).then_some(sec.id);
        sec.id = sid;
    }
    tracing::trace!(
        row_id = note.row_id(),
        added = sections.len() - before,
        "Filled section gaps"
    );
    Note::new(note.event.clone(), note.annotator, sections)
}
