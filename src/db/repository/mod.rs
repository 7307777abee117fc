//! Persisters: entity-scoped read operations over the MIMIC-III tables.
//!
//! Each function executes a named query from [`super::queries`] and hydrates
//! the rows into [`crate::models`] records.

mod admission;
mod diagnosis;
mod note_event;
mod patient;
mod procedure;

use chrono::{NaiveDate, NaiveDateTime};

use super::DatabaseError;

pub use admission::*;
pub use diagnosis::*;
pub use note_event::*;
pub use patient::*;
pub use procedure::*;

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a stored date-time; bare dates are read as midnight.
pub(crate) fn parse_datetime(value: Option<String>) -> Option<NaiveDateTime> {
    let value = value?;
    let value = value.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| parse_date_str(value).and_then(|d| d.and_hms_opt(0, 0, 0)))
}

pub(crate) fn parse_date(value: Option<String>) -> Option<NaiveDate> {
    let value = value?;
    parse_date_str(value.trim())
}

fn parse_date_str(value: &str) -> Option<NaiveDate> {
    // Date-times stored in a date column keep only the date part
    let date = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Require exactly one row from a lookup keyed by `id`.
pub(crate) fn exactly_one<T>(
    mut rows: Vec<T>,
    entity_type: &str,
    id: i64,
) -> Result<T, DatabaseError> {
    match rows.len() {
        0 => Err(DatabaseError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }),
        1 => Ok(rows.remove(0)),
        count => Err(DatabaseError::MultipleRecords {
            entity_type: entity_type.into(),
            id: id.to_string(),
            count,
        }),
    }
}
