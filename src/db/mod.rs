pub mod queries;
pub mod sqlite;
pub mod repository;

#[cfg(test)]
pub(crate) mod fixtures;

pub use sqlite::*;
pub use repository::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Could not find {entity_type} ID {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Found {count} > 1 record(s) for {entity_type} {id}")]
    MultipleRecords {
        entity_type: String,
        id: String,
        count: usize,
    },

    #[error("Record {entity_type} {id} is missing {field}")]
    MissingField {
        entity_type: String,
        id: String,
        field: String,
    },

    #[error("Invalid enum value for {field}: {value}")]
    InvalidEnum { field: String, value: String },

    #[error("No named query: {0}")]
    QueryNotFound(String),

    #[error("Schema creation failed: {0}")]
    SchemaFailed(String),
}
