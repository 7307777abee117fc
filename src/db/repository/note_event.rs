use rusqlite::{params, Connection, OptionalExtension};

use super::{exactly_one, parse_date, parse_datetime};
use crate::db::queries::{limit_param, named};
use crate::db::DatabaseError;
use crate::models::*;

type NoteEventRow = (
    i64,
    i64,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<String>,
    Option<i64>,
    i64,
    Option<String>,
);

fn map_note_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<NoteEventRow> {
    Ok((
        row.get::<_, i64>(0)?,
        row.get::<_, i64>(1)?,
        row.get::<_, Option<i64>>(2)?,
        row.get::<_, Option<String>>(3)?,
        row.get::<_, Option<String>>(4)?,
        row.get::<_, Option<String>>(5)?,
        row.get::<_, Option<String>>(6)?,
        row.get::<_, Option<String>>(7)?,
        row.get::<_, Option<i64>>(8)?,
        row.get::<_, i64>(9)?,
        row.get::<_, Option<String>>(10)?,
    ))
}

fn note_from_row(row: NoteEventRow) -> Result<NoteEvent, DatabaseError> {
    let (row_id, subject_id, hadm_id, chartdate, charttime, storetime, category, description, cgid, iserror, text) =
        row;
    let base = NoteEvent::new(
        row_id,
        subject_id,
        hadm_id,
        category.as_deref().unwrap_or_default(),
        text.as_deref().unwrap_or_default(),
    )?;
    Ok(NoteEvent {
        chartdate: parse_date(chartdate),
        charttime: parse_datetime(charttime),
        storetime: parse_datetime(storetime),
        description,
        cgid,
        iserror: iserror != 0,
        ..base
    })
}

fn query_notes<P: rusqlite::Params>(
    conn: &Connection,
    query: &str,
    params: P,
) -> Result<Vec<NoteEvent>, DatabaseError> {
    let mut stmt = conn.prepare(named(query)?)?;
    let rows = stmt.query_map(params, map_note_row)?;
    let mut notes = Vec::new();
    for row in rows {
        notes.push(note_from_row(row?)?);
    }
    Ok(notes)
}

fn query_ids<P: rusqlite::Params>(conn: &Connection, query: &str, params: P) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(named(query)?)?;
    let ids = stmt
        .query_map(params, |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

/// All distinct note categories, sorted.
pub fn get_note_categories(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(named("categories")?)?;
    let cats = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(cats)
}

/// Number of notes of an admission.
pub fn get_note_count(conn: &Connection, hadm_id: i64) -> Result<i64, DatabaseError> {
    let count = conn.query_row(named("select_note_count")?, params![hadm_id], |row| row.get(0))?;
    Ok(count)
}

/// `(hadm_id, note count)` pairs of a patient, most notes first.
pub fn get_note_counts_by_subject_id(
    conn: &Connection,
    subject_id: i64,
) -> Result<Vec<(i64, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_note_count_by_subject_id")?)?;
    let rows = stmt
        .query_map(params![subject_id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_note_row_ids_by_hadm_id(conn: &Connection, hadm_id: i64) -> Result<Vec<i64>, DatabaseError> {
    query_ids(conn, "select_row_ids_by_hadm_id", params![hadm_id])
}

pub fn get_notes_by_hadm_id(conn: &Connection, hadm_id: i64) -> Result<Vec<NoteEvent>, DatabaseError> {
    query_notes(conn, "select_notes_by_hadm_id", params![hadm_id])
}

/// The admission a note belongs to, if the note exists and has one.
pub fn get_note_hadm_id(conn: &Connection, row_id: i64) -> Result<Option<i64>, DatabaseError> {
    let hadm_id = conn
        .query_row(named("select_hadm_id_by_row_id")?, params![row_id], |row| row.get::<_, i64>(0))
        .optional()?;
    Ok(hadm_id)
}

/// Admission of each note in `row_ids`, position for position.
pub fn get_note_hadm_ids(conn: &Connection, row_ids: &[i64]) -> Result<Vec<Option<i64>>, DatabaseError> {
    row_ids.iter().map(|id| get_note_hadm_id(conn, *id)).collect()
}

/// Admission ids drawn uniformly at random.
pub fn uniform_sample_hadm_ids(conn: &Connection, limit: usize) -> Result<Vec<i64>, DatabaseError> {
    query_ids(conn, "random_hadm", params![limit_param(Some(limit))])
}

pub fn get_notes_by_category(
    conn: &Connection,
    category: &str,
    limit: Option<usize>,
) -> Result<Vec<NoteEvent>, DatabaseError> {
    query_notes(conn, "select_notes_by_category", params![category.trim(), limit_param(limit)])
}

/// Full discharge summaries (as opposed to addenda).
pub fn get_discharge_reports(conn: &Connection, limit: Option<usize>) -> Result<Vec<NoteEvent>, DatabaseError> {
    query_notes(conn, "select_discharge_reports", params![limit_param(limit)])
}

pub fn get_note_text(conn: &Connection, row_id: i64) -> Result<String, DatabaseError> {
    let text: Option<Option<String>> = conn
        .query_row(named("select_note_text_by_id")?, params![row_id], |row| row.get(0))
        .optional()?;
    match text {
        Some(text) => Ok(text.unwrap_or_default()),
        None => Err(DatabaseError::NotFound {
            entity_type: "note event".into(),
            id: row_id.to_string(),
        }),
    }
}

pub fn get_note_by_row_id(conn: &Connection, row_id: i64) -> Result<NoteEvent, DatabaseError> {
    let notes = query_notes(conn, "select_note_by_row_id", params![row_id])?;
    exactly_one(notes, "note event", row_id)
}

/// Row ids of every note attached to an admission.
pub fn get_note_keys(conn: &Connection) -> Result<Vec<i64>, DatabaseError> {
    query_ids(conn, "select_note_keys", params![])
}

pub fn note_exists(conn: &Connection, row_id: i64) -> Result<bool, DatabaseError> {
    Ok(get_note_hadm_id(conn, row_id)?.is_some())
}

pub fn count_note_events(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(named("select_note_event_count")?, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::{self, seeded_db};
    use chrono::NaiveDate;

    #[test]
    fn categories_distinct_sorted_trimmed() {
        let conn = seeded_db();
        assert_eq!(
            get_note_categories(&conn).unwrap(),
            vec!["Consult", "Discharge summary", "Echo", "Nursing/other", "Physician", "Radiology", "Social Work"]
        );
    }

    #[test]
    fn note_counts() {
        let conn = seeded_db();
        assert_eq!(get_note_count(&conn, 100).unwrap(), 8);
        assert_eq!(get_note_count(&conn, 200).unwrap(), 0);
        assert_eq!(get_note_counts_by_subject_id(&conn, 1).unwrap(), vec![(100, 8), (101, 1)]);
        assert!(get_note_counts_by_subject_id(&conn, 2).unwrap().is_empty());
        assert_eq!(count_note_events(&conn).unwrap(), 10);
    }

    #[test]
    fn notes_by_hadm_id_hydrated() {
        let conn = seeded_db();
        assert_eq!(get_note_row_ids_by_hadm_id(&conn, 101).unwrap(), vec![9]);
        let notes = get_notes_by_hadm_id(&conn, 100).unwrap();
        assert_eq!(notes.len(), 8);
        let phys = &notes[4];
        assert_eq!(phys.row_id, 5);
        assert_eq!(phys.category, "Physician");
        assert_eq!(phys.chartdate, NaiveDate::from_ymd_opt(2150, 3, 5));
        assert!(phys.charttime.is_some());
        assert!(phys.storetime.is_none());
        assert_eq!(phys.cgid, Some(17));
        assert!(!phys.iserror);
    }

    #[test]
    fn hadm_id_lookup() {
        let conn = seeded_db();
        assert_eq!(get_note_hadm_id(&conn, 9).unwrap(), Some(101));
        assert_eq!(get_note_hadm_id(&conn, 10).unwrap(), None);
        assert_eq!(get_note_hadm_id(&conn, 999).unwrap(), None);
        assert_eq!(get_note_hadm_ids(&conn, &[1, 999]).unwrap(), vec![Some(100), None]);
        assert!(note_exists(&conn, 1).unwrap());
        assert!(!note_exists(&conn, 10).unwrap());
    }

    #[test]
    fn category_and_discharge_queries() {
        let conn = seeded_db();
        let rads = get_notes_by_category(&conn, "Radiology", None).unwrap();
        assert_eq!(rads.iter().map(|n| n.row_id).collect::<Vec<_>>(), vec![2, 7]);
        assert_eq!(get_notes_by_category(&conn, "Radiology", Some(1)).unwrap().len(), 1);
        // null admission note is excluded
        assert_eq!(get_notes_by_category(&conn, "Nursing/other", None).unwrap().len(), 1);
        let ds = get_discharge_reports(&conn, None).unwrap();
        assert_eq!(ds.iter().map(|n| n.row_id).collect::<Vec<_>>(), vec![1, 9]);
    }

    #[test]
    fn note_text_and_row_lookup() {
        let conn = seeded_db();
        assert_eq!(get_note_text(&conn, 3).unwrap(), fixtures::ECHO);
        assert!(matches!(get_note_text(&conn, 404), Err(DatabaseError::NotFound { .. })));
        let note = get_note_by_row_id(&conn, 6).unwrap();
        assert_eq!(note.category, "Consult");
        // a note without an admission cannot be hydrated
        assert!(matches!(
            get_note_by_row_id(&conn, 10),
            Err(DatabaseError::MissingField { .. })
        ));
    }

    #[test]
    fn sample_and_keys() {
        let conn = seeded_db();
        let sample = uniform_sample_hadm_ids(&conn, 2).unwrap();
        assert_eq!(sample.len(), 2);
        assert!(sample.iter().all(|id| [100, 101, 200].contains(id)));
        assert_eq!(get_note_keys(&conn).unwrap(), (1..=9).collect::<Vec<_>>());
    }
}
