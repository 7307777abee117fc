//! A hospital admission with its patient, ICD-9 codes and parsed notes.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::models::{Admission, Diagnosis, Patient, Procedure};
use crate::note::format::{write_full, FullWriteOptions};
use crate::note::{Note, NoteError};
use crate::write::{write_line, write_value};

/// Everything recorded over one hospital stay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalAdmission {
    pub admission: Admission,
    pub patient: Patient,
    pub diagnoses: Vec<Diagnosis>,
    pub procedures: Vec<Procedure>,
    pub notes: Vec<Note>,
}

/// Options for [`HospitalAdmission::write`].
#[derive(Debug, Clone)]
pub struct AdmissionWriteOptions {
    pub include_admission: bool,
    pub include_patient: bool,
    pub include_diagnoses: bool,
    pub include_procedures: bool,
    pub note_limit: Option<usize>,
    /// Only write notes of these categories.
    pub categories: Option<BTreeSet<String>>,
    pub include_note_id: bool,
    pub note: FullWriteOptions,
}

impl Default for AdmissionWriteOptions {
    /// Admission id and a one line listing per note.
    fn default() -> Self {
        Self {
            include_admission: false,
            include_patient: false,
            include_diagnoses: false,
            include_procedures: false,
            note_limit: None,
            categories: None,
            include_note_id: true,
            note: FullWriteOptions {
                note_line_limit: Some(0),
                section_line_limit: Some(0),
                include_section_header: false,
                sections: None,
                include_fields: false,
                include_note_divider: false,
                include_section_divider: false,
            },
        }
    }
}

impl AdmissionWriteOptions {
    /// Every record and the full text of every note.
    pub fn full() -> Self {
        Self {
            include_admission: true,
            include_patient: true,
            include_diagnoses: true,
            include_procedures: true,
            note_limit: None,
            categories: None,
            include_note_id: false,
            note: FullWriteOptions::default(),
        }
    }
}

impl HospitalAdmission {
    pub fn hadm_id(&self) -> i64 {
        self.admission.hadm_id
    }

    /// Notes grouped by category, each group in admission order.
    pub fn notes_by_category(&self) -> BTreeMap<&str, Vec<&Note>> {
        let mut by_cat: BTreeMap<&str, Vec<&Note>> = BTreeMap::new();
        for note in &self.notes {
            by_cat.entry(note.category()).or_default().push(note);
        }
        by_cat
    }

    pub fn notes_by_id(&self) -> BTreeMap<i64, &Note> {
        self.notes.iter().map(|n| (n.row_id(), n)).collect()
    }

    pub fn note(&self, row_id: i64) -> Option<&Note> {
        self.notes.iter().find(|n| n.row_id() == row_id)
    }

    pub fn contains(&self, row_id: i64) -> bool {
        self.note(row_id).is_some()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    /// Row ids of notes sharing the same text (or the same first
    /// `text_start` characters), one set per group of two or more.
    pub fn get_duplicate_notes(&self, text_start: Option<usize>) -> Vec<BTreeSet<i64>> {
        let mut groups: BTreeMap<String, BTreeSet<i64>> = BTreeMap::new();
        for note in &self.notes {
            let key: String = match text_start {
                Some(n) => note.text().chars().take(n).collect(),
                None => note.text().to_string(),
            };
            groups.entry(key).or_default().insert(note.row_id());
        }
        let mut dups: Vec<BTreeSet<i64>> = groups.into_values().filter(|s| s.len() > 1).collect();
        dups.sort();
        dups
    }

    /// Notes with duplicates collapsed: every note outside `dup_sets` paired
    /// with `false`, then one note per duplicate set paired with `true`.
    ///
    /// The representative is the first note of the set `filter` accepts, or
    /// the set's lowest row id when `filter` rejects them all.
    pub fn get_non_duplicate_notes<F>(&self, dup_sets: &[BTreeSet<i64>], filter: Option<F>) -> Vec<(&Note, bool)>
    where
        F: Fn(&Note) -> bool,
    {
        let all_dups: BTreeSet<i64> = dup_sets.iter().flatten().copied().collect();
        let mut non_dups: Vec<(&Note, bool)> = self
            .notes
            .iter()
            .filter(|n| !all_dups.contains(&n.row_id()))
            .map(|n| (n, false))
            .collect();
        for ds in dup_sets {
            let preferred = self
                .notes
                .iter()
                .find(|n| ds.contains(&n.row_id()) && filter.as_ref().map(|f| f(*n)).unwrap_or(true));
            let chosen = preferred.or_else(|| ds.iter().next().and_then(|id| self.note(*id)));
            if let Some(note) = chosen {
                non_dups.push((note, true));
            }
        }
        non_dups
    }

    /// Write the notes of the admission with `opts.note` per note.
    pub fn write_notes<W: Write + ?Sized>(
        &self,
        w: &mut W,
        depth: usize,
        opts: &AdmissionWriteOptions,
    ) -> Result<(), NoteError> {
        let notes = self
            .notes
            .iter()
            .filter(|n| opts.categories.as_ref().map(|c| c.contains(n.category())).unwrap_or(true))
            .take(opts.note_limit.unwrap_or(usize::MAX));
        for note in notes {
            if opts.include_note_id {
                write_line(w, depth, &format!("row_id: {} ({})", note.row_id(), note.category()))?;
            }
            write_full(note, w, depth, &opts.note)?;
        }
        Ok(())
    }

    pub fn write<W: Write + ?Sized>(&self, w: &mut W, depth: usize, opts: &AdmissionWriteOptions) -> Result<(), NoteError> {
        write_line(w, depth, &format!("hadm_id: {}", self.hadm_id()))?;
        if opts.include_admission {
            write_line(w, depth + 1, "admission:")?;
            write_value(w, depth + 2, &serde_json::to_value(&self.admission)?)?;
        }
        if opts.include_patient {
            write_line(w, depth + 1, "patient:")?;
            write_value(w, depth + 2, &serde_json::to_value(&self.patient)?)?;
        }
        if opts.include_diagnoses {
            write_line(w, depth + 1, "diagnoses:")?;
            write_value(w, depth + 2, &serde_json::to_value(&self.diagnoses)?)?;
        }
        if opts.include_procedures {
            write_line(w, depth + 1, "procedures:")?;
            write_value(w, depth + 2, &serde_json::to_value(&self.procedures)?)?;
        }
        if opts.note_limit != Some(0) {
            write_line(w, depth + 1, "notes:")?;
            self.write_notes(w, depth + 2, opts)?;
        }
        Ok(())
    }

    /// [`HospitalAdmission::write`] with [`AdmissionWriteOptions::full`].
    pub fn write_full<W: Write + ?Sized>(&self, w: &mut W, depth: usize) -> Result<(), NoteError> {
        self.write(w, depth, &AdmissionWriteOptions::full())
    }
}

impl<'a> IntoIterator for &'a HospitalAdmission {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}

impl fmt::Display for HospitalAdmission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "subject: {}, hadm: {}, num notes: {}",
            self.admission.subject_id,
            self.admission.hadm_id,
            self.notes.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::seeded_db;
    use crate::db::*;
    use crate::note::NoteFactory;

    fn admission_100() -> HospitalAdmission {
        let conn = seeded_db();
        let factory = NoteFactory::new();
        HospitalAdmission {
            admission: get_admission_by_hadm_id(&conn, 100).unwrap(),
            patient: get_patient_by_subject_id(&conn, 1).unwrap(),
            diagnoses: get_diagnoses_by_hadm_id(&conn, 100).unwrap(),
            procedures: get_procedures_by_hadm_id(&conn, 100).unwrap(),
            notes: get_notes_by_hadm_id(&conn, 100)
                .unwrap()
                .into_iter()
                .map(|e| factory.create(e))
                .collect(),
        }
    }

    #[test]
    fn lookups() {
        let adm = admission_100();
        assert_eq!(adm.hadm_id(), 100);
        assert!(adm.contains(3));
        assert!(!adm.contains(9));
        assert_eq!(adm.note(6).map(|n| n.category()), Some("Consult"));
        assert_eq!(adm.notes_by_id().len(), 8);
        assert_eq!(adm.notes_by_category()["Radiology"].len(), 2);
        assert_eq!(adm.iter().count(), 8);
        assert_eq!(adm.to_string(), "subject: 1, hadm: 100, num notes: 8");
    }

    #[test]
    fn duplicates_found() {
        let adm = admission_100();
        assert_eq!(adm.get_duplicate_notes(None), vec![BTreeSet::from([2, 7])]);
        let prefix = adm.get_duplicate_notes(Some(1));
        assert!(prefix.iter().any(|s| s.contains(&2) && s.contains(&7)));
    }

    #[test]
    fn non_duplicates_keep_one_per_set() {
        let adm = admission_100();
        let dups = adm.get_duplicate_notes(None);
        let kept = adm.get_non_duplicate_notes(&dups, None::<fn(&Note) -> bool>);
        assert_eq!(kept.len(), 7);
        assert_eq!(kept.iter().filter(|(_, d)| *d).count(), 1);
        assert_eq!(kept.last().map(|(n, _)| n.row_id()), Some(2));

        let prefer_late = adm.get_non_duplicate_notes(&dups, Some(|n: &Note| n.row_id() > 5));
        assert_eq!(prefer_late.last().map(|(n, _)| n.row_id()), Some(7));

        let reject_all = adm.get_non_duplicate_notes(&dups, Some(|_: &Note| false));
        assert_eq!(reject_all.last().map(|(n, _)| n.row_id()), Some(2));
    }

    #[test]
    fn write_brief_lists_notes() {
        let adm = admission_100();
        let mut buf = Vec::new();
        adm.write(&mut buf, 0, &AdmissionWriteOptions::default()).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.starts_with("hadm_id: 100\n    notes:\n        row_id: 1 (Discharge summary)\n"));
        assert!(out.contains("history-of-present-illness"));
        assert!(!out.contains("Patient presents with dyspnea"));
    }

    #[test]
    fn write_full_includes_records() {
        let adm = admission_100();
        let mut buf = Vec::new();
        adm.write_full(&mut buf, 0).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("    admission:\n"));
        assert!(out.contains("short_title: CHF NOS"));
        assert!(out.contains("Patient presents with dyspnea"));
    }

    #[test]
    fn note_limit_and_categories() {
        let adm = admission_100();
        let opts = AdmissionWriteOptions {
            categories: Some(BTreeSet::from(["Echo".to_string()])),
            ..Default::default()
        };
        let mut buf = Vec::new();
        adm.write(&mut buf, 0, &opts).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("row_id: 3 (Echo)"));
        assert!(!out.contains("(Radiology)"));

        let none = AdmissionWriteOptions {
            note_limit: Some(0),
            ..Default::default()
        };
        let mut buf = Vec::new();
        adm.write(&mut buf, 0, &none).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "hadm_id: 100\n");
    }
}
