//! Key/value persistence for parsed admissions and notes.
//!
//! The chain used by the corpus is a [`FactoryStash`] whose delegate is a
//! [`DirectoryStash`] (the disk cache) and whose factory is a database backed
//! stash ([`HospitalAdmissionDbStash`], [`NoteDbStash`]) that parses on miss.
//! [`PreemptiveStash`] fills the disk cache ahead of time with worker threads.

pub mod db;
pub mod directory;
pub mod factory;
pub mod preempt;

pub use db::{load_admission, load_note, HospitalAdmissionDbStash, NoteDbStash};
pub use directory::DirectoryStash;
pub use factory::FactoryStash;
pub use preempt::{clear_selected, PreemptReport, PreemptiveStash};

use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum StashError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache entry {key} is corrupt: {message}")]
    Corrupt { key: String, message: String },

    #[error("Invalid stash key: '{0}'")]
    InvalidKey(String),

    #[error("No item for key '{0}'")]
    Missing(String),

    #[error("{0} is read-only")]
    ReadOnly(&'static str),

    #[error("Internal lock error")]
    LockPoisoned,
}

/// A key/value store. Only `load` and `keys` are required; stores that can
/// not be written to keep the default mutators, which fail with
/// [`StashError::ReadOnly`].
pub trait Stash {
    type Item;

    /// The item for `key`, or `None` when there is none.
    fn load(&self, key: &str) -> Result<Option<Self::Item>, StashError>;

    fn keys(&self) -> Result<Vec<String>, StashError>;

    /// Like `load`, but a missing item is an error.
    fn get(&self, key: &str) -> Result<Self::Item, StashError> {
        self.load(key)?.ok_or_else(|| StashError::Missing(key.to_string()))
    }

    fn exists(&self, key: &str) -> Result<bool, StashError> {
        Ok(self.keys()?.iter().any(|k| k == key))
    }

    fn dump(&self, _key: &str, _value: &Self::Item) -> Result<(), StashError> {
        Err(StashError::ReadOnly(std::any::type_name::<Self>()))
    }

    fn delete(&self, _key: &str) -> Result<(), StashError> {
        Err(StashError::ReadOnly(std::any::type_name::<Self>()))
    }

    fn clear(&self) -> Result<(), StashError> {
        Err(StashError::ReadOnly(std::any::type_name::<Self>()))
    }

    fn len(&self) -> Result<usize, StashError> {
        Ok(self.keys()?.len())
    }

    fn is_empty(&self) -> Result<bool, StashError> {
        Ok(self.len()? == 0)
    }
}

/// Parse an integer database key (`hadm_id`, `row_id`).
pub(crate) fn parse_id(key: &str) -> Result<i64, StashError> {
    key.trim()
        .parse::<i64>()
        .map_err(|_| StashError::InvalidKey(key.to_string()))
}
