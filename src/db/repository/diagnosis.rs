use rusqlite::{params, Connection};

use crate::db::queries::named;
use crate::db::DatabaseError;
use crate::models::*;

/// Diagnoses of an admission in priority (`seq_num`) order.
pub fn get_diagnoses_by_hadm_id(conn: &Connection, hadm_id: i64) -> Result<Vec<Diagnosis>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_diagnosis_by_hadm_id")?)?;
    let rows = stmt.query_map(params![hadm_id], |row| {
        Ok(Diagnosis {
            row_id: row.get(0)?,
            hadm_id: row.get(1)?,
            icd9_code: row.get(2)?,
            short_title: row.get(3)?,
            long_title: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Admissions with any congestive heart failure (ICD-9 `428*`) diagnosis.
pub fn get_heart_failure_hadm_ids(conn: &Connection) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_heart_failure_hadm_id")?)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}
