//! Entry point tying configuration, database, note parsing and caches
//! together.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::MimicConfig;
use crate::db::{self, DatabaseError};
use crate::error::MimicError;
use crate::hospital::{AdmissionWriteOptions, HospitalAdmission};
use crate::models::enums::NoteFormat;
use crate::note::extractors::default_category_mapping;
use crate::note::format::{summary, write_by_format};
use crate::note::{fill_gaps, paragraph_factory, Note, NoteFactory, ParagraphFactory};
use crate::stash::{
    clear_selected, DirectoryStash, FactoryStash, HospitalAdmissionDbStash, NoteDbStash, PreemptReport,
    PreemptiveStash, Stash,
};
use crate::write::{thousands, write_line};

const ADMISSION_DIR: &str = "adm";
const NOTE_DIR: &str = "note";

type AdmissionStash = FactoryStash<DirectoryStash<HospitalAdmission>, HospitalAdmissionDbStash>;
type NoteStash = FactoryStash<DirectoryStash<Note>, NoteDbStash>;

pub struct Corpus {
    conn: Arc<Mutex<Connection>>,
    db_path: Option<PathBuf>,
    cache_dir: PathBuf,
    workers: usize,
    factory: Arc<NoteFactory>,
    paragraphs: Box<dyn ParagraphFactory>,
    admissions: AdmissionStash,
    notes: NoteStash,
}

/// The built-in category mapping with the configured entries applied.
fn note_factory(config: &MimicConfig) -> Result<NoteFactory, MimicError> {
    let mut mapping = default_category_mapping();
    mapping.extend(config.notes.categories.clone());
    let factory = NoteFactory::from_mapping(&mapping)?;
    Ok(factory.with_default_only(config.notes.default_only.unwrap_or(false)))
}

/// Remove cached admissions and/or notes under `cache_dir` without opening
/// the database.
pub fn clear_cache(cache_dir: &Path, include_admissions: bool, include_notes: bool) -> Result<(), MimicError> {
    clear_selected(
        &DirectoryStash::new(cache_dir.join(ADMISSION_DIR)),
        &DirectoryStash::new(cache_dir.join(NOTE_DIR)),
        include_admissions,
        include_notes,
    )?;
    tracing::info!(cache_dir = %cache_dir.display(), include_admissions, include_notes, "Cleared cache");
    Ok(())
}

impl Corpus {
    /// Open the configured database and caches.
    pub fn open(config: &MimicConfig) -> Result<Self, MimicError> {
        let db_path = config.db_path()?.to_path_buf();
        let conn = db::open_database(&db_path)?;
        let mut corpus = Self::with_connection(conn, config)?;
        corpus.db_path = Some(db_path);
        Ok(corpus)
    }

    /// Corpus over an already open connection. Pre-warming needs a database
    /// file and is not available on corpora created this way.
    pub fn with_connection(conn: Connection, config: &MimicConfig) -> Result<Self, MimicError> {
        let conn = Arc::new(Mutex::new(conn));
        let factory = Arc::new(note_factory(config)?);
        let cache_dir = config.cache_dir();
        let admissions = FactoryStash::new(
            DirectoryStash::new(cache_dir.join(ADMISSION_DIR)),
            HospitalAdmissionDbStash::new(Arc::clone(&conn), Arc::clone(&factory)),
        );
        let notes = FactoryStash::new(
            DirectoryStash::new(cache_dir.join(NOTE_DIR)),
            NoteDbStash::new(Arc::clone(&conn), Arc::clone(&factory)),
        );
        tracing::info!(cache_dir = %cache_dir.display(), categories = factory.categories().len(), "Corpus ready");
        Ok(Self {
            conn,
            db_path: None,
            cache_dir,
            workers: config.workers(),
            factory,
            paragraphs: paragraph_factory(&config.paragraph),
            admissions,
            notes,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, MimicError> {
        self.conn
            .lock()
            .map_err(|_| MimicError::Stash(crate::stash::StashError::LockPoisoned))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn note_factory(&self) -> &NoteFactory {
        &self.factory
    }

    // ── Lookups ──────────────────────────────────────────

    /// The admission through the cache, parsing it on a miss.
    pub fn admission(&self, hadm_id: i64) -> Result<HospitalAdmission, MimicError> {
        self.admissions
            .load(&hadm_id.to_string())?
            .ok_or(MimicError::AdmissionNotFound(hadm_id))
    }

    /// The note through the cache, parsing it on a miss.
    pub fn note(&self, row_id: i64) -> Result<Note, MimicError> {
        self.notes
            .load(&row_id.to_string())?
            .ok_or(MimicError::NoteNotFound(row_id))
    }

    pub fn categories(&self) -> Result<Vec<String>, MimicError> {
        Ok(db::get_note_categories(&*self.conn()?)?)
    }

    /// Admission ids drawn at random.
    pub fn sample(&self, limit: usize) -> Result<Vec<i64>, MimicError> {
        Ok(db::uniform_sample_hadm_ids(&*self.conn()?, limit)?)
    }

    pub fn admission_keys(&self) -> Result<Vec<i64>, MimicError> {
        Ok(db::get_admission_keys(&*self.conn()?)?)
    }

    // ── Writers ──────────────────────────────────────────

    /// Patient, admission and note counts.
    pub fn write_stats<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), MimicError> {
        let conn = self.conn()?;
        let patients = db::count_patients(&conn)?;
        let admissions = db::count_admissions(&conn)?;
        let notes = db::count_note_events(&conn)?;
        write_line(w, 0, &format!("patients: {}", thousands(patients)))?;
        write_line(w, 0, &format!("admissions: {}", thousands(admissions)))?;
        write_line(w, 0, &format!("notes: {}", thousands(notes)))?;
        Ok(())
    }

    /// Note counts of each admission of `subject_id`.
    pub fn write_note_counts<W: Write + ?Sized>(&self, subject_id: i64, w: &mut W) -> Result<(), MimicError> {
        let counts = db::get_note_counts_by_subject_id(&*self.conn()?, subject_id)?;
        for (hadm_id, count) in counts {
            write_line(w, 0, &format!("{hadm_id}: {}", thousands(count)))?;
        }
        Ok(())
    }

    /// Subjects with the most admissions.
    pub fn write_admission_counts<W: Write + ?Sized>(&self, limit: Option<usize>, w: &mut W) -> Result<(), MimicError> {
        let counts = db::get_admission_counts(&*self.conn()?, limit)?;
        for (subject_id, count) in counts {
            write_line(w, 0, &format!("{subject_id}: {count}"))?;
        }
        Ok(())
    }

    pub fn write_categories<W: Write + ?Sized>(&self, w: &mut W) -> Result<(), MimicError> {
        for category in self.categories()? {
            let mapped = self.factory.categories().contains(&category.as_str());
            let marker = if mapped { "*" } else { " " };
            write_line(w, 0, &format!("{marker} {category}"))?;
        }
        Ok(())
    }

    pub fn write_admission<W: Write + ?Sized>(
        &self,
        hadm_id: i64,
        w: &mut W,
        opts: &AdmissionWriteOptions,
    ) -> Result<(), MimicError> {
        self.admission(hadm_id)?.write(w, 0, opts)?;
        Ok(())
    }

    /// Write a note in `format`; with `normalize` section bodies are written
    /// as normalized paragraphs.
    pub fn write_note<W: Write + ?Sized>(
        &self,
        row_id: i64,
        format: NoteFormat,
        normalize: bool,
        w: &mut W,
    ) -> Result<(), MimicError> {
        let note = self.note(row_id)?;
        let paragraphs = normalize.then_some(self.paragraphs.as_ref());
        write_by_format(&note, w, 0, format, paragraphs)?;
        Ok(())
    }

    /// Section summary of a note with the uncovered text as `unknown`
    /// sections.
    pub fn write_sections<W: Write + ?Sized>(&self, row_id: i64, w: &mut W) -> Result<(), MimicError> {
        let note = fill_gaps(&self.note(row_id)?, true);
        write_line(w, 0, &format!("{} ({}): {}", note.category(), note.row_id(), note.event.truncated_text()))?;
        for line in summary(&note) {
            write_line(w, 1, &line)?;
        }
        Ok(())
    }

    /// Write each note of an admission to `out_dir/<hadm_id>/` as
    /// `<row_id>-<category id>.<ext>`.
    pub fn export_admission(
        &self,
        hadm_id: i64,
        format: NoteFormat,
        normalize: bool,
        out_dir: &Path,
    ) -> Result<Vec<PathBuf>, MimicError> {
        let adm = self.admission(hadm_id)?;
        let dir = out_dir.join(hadm_id.to_string());
        fs::create_dir_all(&dir)?;
        let paragraphs = normalize.then_some(self.paragraphs.as_ref());
        let mut paths = Vec::with_capacity(adm.notes.len());
        for note in &adm.notes {
            let path = dir.join(format!("{}-{}.{}", note.row_id(), note.id(), format.ext()));
            let mut file = std::io::BufWriter::new(fs::File::create(&path)?);
            write_by_format(note, &mut file, 0, format, paragraphs)?;
            file.flush()?;
            paths.push(path);
        }
        tracing::info!(hadm_id, notes = paths.len(), dir = %dir.display(), "Exported admission notes");
        Ok(paths)
    }

    // ── Cache ────────────────────────────────────────────

    fn preemptive(&self, workers: Option<usize>) -> Result<PreemptiveStash, MimicError> {
        let db_path = self
            .db_path
            .clone()
            .ok_or(crate::config::ConfigError::MissingDatabase)?;
        let open = move || -> Result<Connection, DatabaseError> { db::open_database(&db_path) };
        Ok(PreemptiveStash::new(
            open,
            Arc::clone(&self.factory),
            self.cache_dir.join(ADMISSION_DIR),
            self.cache_dir.join(NOTE_DIR),
        )
        .with_workers(workers.unwrap_or(self.workers)))
    }

    /// Parse and cache the admissions `hadm_ids` with worker threads.
    pub fn preempt(&self, hadm_ids: &[i64], workers: Option<usize>) -> Result<PreemptReport, MimicError> {
        Ok(self.preemptive(workers)?.prime(hadm_ids)?)
    }

}
