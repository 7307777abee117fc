use thiserror::Error;

use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum NoteError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("No section extractor named '{name}' (category {category})")]
    UnknownExtractor { category: String, name: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for NoteError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for NoteError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
