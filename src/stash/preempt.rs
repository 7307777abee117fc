//! Pre-warm the admission and note caches with worker threads.
//!
//! Each worker opens its own connection, so the opener must produce a fresh
//! connection per call (i.e. open a database file, not share one).

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use rusqlite::Connection;

use super::db::load_admission;
use super::{DirectoryStash, Stash, StashError};
use crate::db::DatabaseError;
use crate::hospital::HospitalAdmission;
use crate::note::{Note, NoteFactory};

type Opener = dyn Fn() -> Result<Connection, DatabaseError> + Send + Sync;

/// Outcome of [`PreemptiveStash::prime`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreemptReport {
    /// Distinct admission ids asked for.
    pub requested: usize,
    /// Already in the cache.
    pub cached: usize,
    pub processed: usize,
    /// Not in the database.
    pub missing: usize,
    pub failed: usize,
}

impl PreemptReport {
    fn add(&mut self, other: PreemptReport) {
        self.processed += other.processed;
        self.missing += other.missing;
        self.failed += other.failed;
    }
}

pub struct PreemptiveStash {
    open: Box<Opener>,
    factory: Arc<NoteFactory>,
    admissions: DirectoryStash<HospitalAdmission>,
    notes: DirectoryStash<Note>,
    workers: usize,
}

impl PreemptiveStash {
    pub fn new<O>(
        open: O,
        factory: Arc<NoteFactory>,
        admissions_dir: impl Into<PathBuf>,
        notes_dir: impl Into<PathBuf>,
    ) -> Self
    where
        O: Fn() -> Result<Connection, DatabaseError> + Send + Sync + 'static,
    {
        Self {
            open: Box::new(open),
            factory,
            admissions: DirectoryStash::new(admissions_dir),
            notes: DirectoryStash::new(notes_dir),
            workers: 1,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn admissions(&self) -> &DirectoryStash<HospitalAdmission> {
        &self.admissions
    }

    pub fn notes(&self) -> &DirectoryStash<Note> {
        &self.notes
    }

    /// The distinct ids of `hadm_ids` (in order) not yet cached.
    pub fn missing_keys(&self, hadm_ids: &[i64]) -> Result<Vec<i64>, StashError> {
        let cached: BTreeSet<String> = self.admissions.keys()?.into_iter().collect();
        let mut seen = BTreeSet::new();
        Ok(hadm_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id) && !cached.contains(&id.to_string()))
            .collect())
    }

    /// Parse and cache every admission of `hadm_ids` (and its notes) that is
    /// not cached yet.
    pub fn prime(&self, hadm_ids: &[i64]) -> Result<PreemptReport, StashError> {
        let requested = hadm_ids.iter().collect::<BTreeSet<_>>().len();
        let missing = self.missing_keys(hadm_ids)?;
        let mut report = PreemptReport {
            requested,
            cached: requested - missing.len(),
            ..Default::default()
        };
        if missing.is_empty() {
            tracing::info!(requested, "All admissions already cached");
            return Ok(report);
        }

        let workers = self.workers.min(missing.len());
        let chunk_size = missing.len().div_ceil(workers);
        tracing::info!(requested, missing = missing.len(), workers, "Pre-warming admission cache");
        let start = Instant::now();

        let results: Vec<PreemptReport> = std::thread::scope(|s| {
            let handles: Vec<_> = missing
                .chunks(chunk_size)
                .enumerate()
                .map(|(worker, chunk)| (chunk.len(), s.spawn(move || self.process_chunk(worker, chunk))))
                .collect();
            handles
                .into_iter()
                .map(|(len, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        tracing::error!(admissions = len, "Pre-warm worker panicked");
                        PreemptReport {
                            failed: len,
                            ..Default::default()
                        }
                    })
                })
                .collect()
        });
        for result in results {
            report.add(result);
        }

        tracing::info!(
            processed = report.processed,
            missing = report.missing,
            failed = report.failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Pre-warm complete"
        );
        Ok(report)
    }

    fn process_chunk(&self, worker: usize, hadm_ids: &[i64]) -> PreemptReport {
        let mut report = PreemptReport::default();
        let conn = match (self.open)() {
            Ok(conn) => conn,
            Err(e) => {
                tracing::warn!(worker, error = %e, "Worker could not open database");
                report.failed = hadm_ids.len();
                return report;
            }
        };
        for &hadm_id in hadm_ids {
            match self.process(&conn, hadm_id) {
                Ok(true) => report.processed += 1,
                Ok(false) => {
                    tracing::debug!(worker, hadm_id, "No such admission");
                    report.missing += 1;
                }
                Err(e) => {
                    tracing::warn!(worker, hadm_id, error = %e, "Could not cache admission");
                    report.failed += 1;
                }
            }
        }
        tracing::debug!(worker, processed = report.processed, "Worker finished");
        report
    }

    fn process(&self, conn: &Connection, hadm_id: i64) -> Result<bool, StashError> {
        let Some(adm) = load_admission(conn, &self.factory, hadm_id)? else {
            return Ok(false);
        };
        for note in &adm.notes {
            self.notes.dump(&note.row_id().to_string(), note)?;
        }
        self.admissions.dump(&hadm_id.to_string(), &adm)?;
        Ok(true)
    }

    /// Remove the cached admissions and/or notes.
    pub fn clear_all(&self, include_admissions: bool, include_notes: bool) -> Result<(), StashError> {
        clear_selected(&self.admissions, &self.notes, include_admissions, include_notes)
    }
}

/// Clear the admission and/or note caches.
pub fn clear_selected(
    admissions: &DirectoryStash<HospitalAdmission>,
    notes: &DirectoryStash<Note>,
    include_admissions: bool,
    include_notes: bool,
) -> Result<(), StashError> {
    if include_admissions {
        admissions.clear()?;
    }
    if include_notes {
        notes.clear()?;
    }
    Ok(())
}
