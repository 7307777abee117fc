//! Read-only stashes that build admissions and notes from the database.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use rusqlite::Connection;

use super::{parse_id, Stash, StashError};
use crate::db::{self, DatabaseError};
use crate::hospital::HospitalAdmission;
use crate::note::{Note, NoteFactory};

/// Build the admission `hadm_id` with its patient, codes and parsed notes,
/// or `None` when there is no such admission.
pub fn load_admission(
    conn: &Connection,
    factory: &NoteFactory,
    hadm_id: i64,
) -> Result<Option<HospitalAdmission>, DatabaseError> {
    if !db::admission_exists(conn, hadm_id)? {
        return Ok(None);
    }
    let admission = db::get_admission_by_hadm_id(conn, hadm_id)?;
    let patient = db::get_patient_by_subject_id(conn, admission.subject_id)?;
    let diagnoses = db::get_diagnoses_by_hadm_id(conn, hadm_id)?;
    let procedures = db::get_procedures_by_hadm_id(conn, hadm_id)?;
    let notes: Vec<Note> = db::get_notes_by_hadm_id(conn, hadm_id)?
        .into_iter()
        .map(|event| factory.create(event))
        .collect();
    tracing::debug!(hadm_id, notes = notes.len(), "Built hospital admission");
    Ok(Some(HospitalAdmission {
        admission,
        patient,
        diagnoses,
        procedures,
        notes,
    }))
}

/// Parse the note `row_id`, or `None` when it does not exist or is not
/// attached to an admission.
pub fn load_note(conn: &Connection, factory: &NoteFactory, row_id: i64) -> Result<Option<Note>, DatabaseError> {
    if !db::note_exists(conn, row_id)? {
        return Ok(None);
    }
    let event = db::get_note_by_row_id(conn, row_id)?;
    Ok(Some(factory.create(event)))
}

fn lock(conn: &Mutex<Connection>) -> Result<MutexGuard<'_, Connection>, StashError> {
    conn.lock().map_err(|_| StashError::LockPoisoned)
}

fn id_keys(ids: Vec<i64>) -> Vec<String> {
    ids.into_iter().map(|id| id.to_string()).collect()
}

// ═══════════════════════════════════════════════════════════
// Admissions
// ═══════════════════════════════════════════════════════════

/// Admissions keyed by `hadm_id`.
pub struct HospitalAdmissionDbStash {
    conn: Arc<Mutex<Connection>>,
    factory: Arc<NoteFactory>,
    keys: OnceLock<Vec<String>>,
}

impl HospitalAdmissionDbStash {
    pub fn new(conn: Arc<Mutex<Connection>>, factory: Arc<NoteFactory>) -> Self {
        Self {
            conn,
            factory,
            keys: OnceLock::new(),
        }
    }
}

impl Stash for HospitalAdmissionDbStash {
    type Item = HospitalAdmission;

    fn load(&self, key: &str) -> Result<Option<HospitalAdmission>, StashError> {
        let hadm_id = parse_id(key)?;
        let conn = lock(&self.conn)?;
        Ok(load_admission(&conn, &self.factory, hadm_id)?)
    }

    fn keys(&self) -> Result<Vec<String>, StashError> {
        if let Some(keys) = self.keys.get() {
            return Ok(keys.clone());
        }
        let keys = id_keys(db::get_admission_keys(&*lock(&self.conn)?)?);
        Ok(self.keys.get_or_init(|| keys).clone())
    }

    fn exists(&self, key: &str) -> Result<bool, StashError> {
        let Ok(hadm_id) = parse_id(key) else {
            return Ok(false);
        };
        Ok(db::admission_exists(&*lock(&self.conn)?, hadm_id)?)
    }

    fn len(&self) -> Result<usize, StashError> {
        let count = db::count_admissions(&*lock(&self.conn)?)?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

// ═══════════════════════════════════════════════════════════
// Notes
// ═══════════════════════════════════════════════════════════

/// Notes keyed by `row_id`.
pub struct NoteDbStash {
    conn: Arc<Mutex<Connection>>,
    factory: Arc<NoteFactory>,
    keys: OnceLock<Vec<String>>,
}

impl NoteDbStash {
    pub fn new(conn: Arc<Mutex<Connection>>, factory: Arc<NoteFactory>) -> Self {
        Self {
            conn,
            factory,
            keys: OnceLock::new(),
        }
    }
}

impl Stash for NoteDbStash {
    type Item = Note;

    fn load(&self, key: &str) -> Result<Option<Note>, StashError> {
        let row_id = parse_id(key)?;
        let conn = lock(&self.conn)?;
        Ok(load_note(&conn, &self.factory, row_id)?)
    }

    fn keys(&self) -> Result<Vec<String>, StashError> {
        if let Some(keys) = self.keys.get() {
            return Ok(keys.clone());
        }
        let keys = id_keys(db::get_note_keys(&*lock(&self.conn)?)?);
        Ok(self.keys.get_or_init(|| keys).clone())
    }

    fn exists(&self, key: &str) -> Result<bool, StashError> {
        let Ok(row_id) = parse_id(key) else {
            return Ok(false);
        };
        Ok(db::note_exists(&*lock(&self.conn)?, row_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::seeded_db;
    use crate::models::enums::SectionAnnotatorType;

    fn shared() -> (Arc<Mutex<Connection>>, Arc<NoteFactory>) {
        (Arc::new(Mutex::new(seeded_db())), Arc::new(NoteFactory::new()))
    }

    #[test]
    fn builds_admission() {
        let (conn, factory) = shared();
        let stash = HospitalAdmissionDbStash::new(conn, factory);
        let adm = stash.get("100").unwrap();
        assert_eq!(adm.patient.subject_id, 1);
        assert_eq!(adm.diagnoses.len(), 2);
        assert_eq!(adm.procedures.len(), 1);
        assert_eq!(adm.notes.len(), 8);
        assert_eq!(adm.note(2).unwrap().annotator, SectionAnnotatorType::RegularExpression);
    }

    #[test]
    fn admission_without_notes() {
        let (conn, factory) = shared();
        let stash = HospitalAdmissionDbStash::new(conn, factory);
        let adm = stash.get("200").unwrap();
        assert!(adm.notes.is_empty());
        assert_eq!(adm.patient.gender.as_deref(), Some("M"));
    }

    #[test]
    fn admission_keys_and_misses() {
        let (conn, factory) = shared();
        let stash = HospitalAdmissionDbStash::new(conn, factory);
        assert_eq!(stash.keys().unwrap(), vec!["100", "101", "200"]);
        assert_eq!(stash.len().unwrap(), 3);
        assert!(stash.exists("101").unwrap());
        assert!(!stash.exists("999").unwrap());
        assert!(!stash.exists("abc").unwrap());
        assert!(stash.load("999").unwrap().is_none());
        assert!(matches!(stash.load("abc"), Err(StashError::InvalidKey(_))));
        assert!(matches!(stash.clear(), Err(StashError::ReadOnly(_))));
    }

    #[test]
    fn builds_note() {
        let (conn, factory) = shared();
        let stash = NoteDbStash::new(conn, factory);
        let note = stash.get("3").unwrap();
        assert_eq!(note.category(), "Echo");
        assert_eq!(note.sections.len(), 3);
        assert!(stash.load("10").unwrap().is_none());
        assert_eq!(stash.len().unwrap(), 9);
        assert!(stash.exists("9").unwrap());
        assert!(!stash.exists("10").unwrap());
    }
}
