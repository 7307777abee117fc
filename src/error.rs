use thiserror::Error;

use crate::config::ConfigError;
use crate::db::DatabaseError;
use crate::note::NoteError;
use crate::stash::StashError;

/// Errors surfaced by [`crate::corpus::Corpus`].
#[derive(Error, Debug)]
pub enum MimicError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Note(#[from] NoteError),

    #[error(transparent)]
    Stash(#[from] StashError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No admission with hadm_id {0}")]
    AdmissionNotFound(i64),

    #[error("No note with row_id {0} attached to an admission")]
    NoteNotFound(i64),
}
