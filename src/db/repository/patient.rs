use rusqlite::{params, Connection};

use super::{exactly_one, parse_datetime};
use crate::db::queries::named;
use crate::db::DatabaseError;
use crate::models::*;

fn map_patient(row: &rusqlite::Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        row_id: row.get(0)?,
        subject_id: row.get(1)?,
        gender: row.get(2)?,
        dob: parse_datetime(row.get(3)?),
        dod: parse_datetime(row.get(4)?),
        dod_hosp: parse_datetime(row.get(5)?),
        dod_ssn: parse_datetime(row.get(6)?),
        expire_flag: row.get(7)?,
    })
}

/// The patient with `subject_id`; exactly one must exist.
pub fn get_patient_by_subject_id(conn: &Connection, subject_id: i64) -> Result<Patient, DatabaseError> {
    let mut stmt = conn.prepare(named("select_patient_by_subject_id")?)?;
    let rows = stmt
        .query_map(params![subject_id], map_patient)?
        .collect::<Result<Vec<_>, _>>()?;
    exactly_one(rows, "patient", subject_id)
}

pub fn count_patients(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(named("select_patient_count")?, [], |row| row.get(0))?;
    Ok(count)
}
