use rusqlite::{params, Connection};

use super::{exactly_one, parse_datetime};
use crate::db::queries::{limit_param, named};
use crate::db::DatabaseError;
use crate::models::*;

fn map_admission(row: &rusqlite::Row<'_>) -> rusqlite::Result<Admission> {
    Ok(Admission {
        row_id: row.get(0)?,
        subject_id: row.get(1)?,
        hadm_id: row.get(2)?,
        admittime: parse_datetime(row.get(3)?),
        dischtime: parse_datetime(row.get(4)?),
        deathtime: parse_datetime(row.get(5)?),
        admission_type: row.get(6)?,
        admission_location: row.get(7)?,
        discharge_location: row.get(8)?,
        insurance: row.get(9)?,
        language: row.get(10)?,
        religion: row.get(11)?,
        marital_status: row.get(12)?,
        ethnicity: row.get(13)?,
        edregtime: parse_datetime(row.get(14)?),
        edouttime: parse_datetime(row.get(15)?),
        diagnosis: row.get(16)?,
        hospital_expire_flag: row.get(17)?,
        has_chartevents_data: row.get(18)?,
    })
}

/// The admission with `hadm_id`; exactly one must exist.
pub fn get_admission_by_hadm_id(conn: &Connection, hadm_id: i64) -> Result<Admission, DatabaseError> {
    let mut stmt = conn.prepare(named("select_admission_by_hadm_id")?)?;
    let rows = stmt
        .query_map(params![hadm_id], map_admission)?
        .collect::<Result<Vec<_>, _>>()?;
    exactly_one(rows, "admission", hadm_id)
}

/// Admission ids of a patient.
pub fn get_admission_hadm_ids(conn: &Connection, subject_id: i64) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_hadm_for_subject_id")?)?;
    let ids = stmt
        .query_map(params![subject_id], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn get_admissions_by_subject_id(
    conn: &Connection,
    subject_id: i64,
) -> Result<Vec<Admission>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_admission_by_subject_id")?)?;
    let rows = stmt
        .query_map(params![subject_id], map_admission)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// `(subject_id, admission count)` pairs, most admissions first.
pub fn get_admission_counts(
    conn: &Connection,
    limit: Option<usize>,
) -> Result<Vec<(i64, i64)>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_admission_counts")?)?;
    let rows = stmt
        .query_map(params![limit_param(limit)], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn get_admission_keys(conn: &Connection) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_admission_keys")?)?;
    let ids = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(ids)
}

pub fn admission_exists(conn: &Connection, hadm_id: i64) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(named("select_admission_exists")?, params![hadm_id], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn count_admissions(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(named("select_admission_count")?, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures::seeded_db;
    use chrono::NaiveDate;

    #[test]
    fn admission_by_hadm_id() {
        let conn = seeded_db();
        let adm = get_admission_by_hadm_id(&conn, 100).unwrap();
        assert_eq!(adm.subject_id, 1);
        assert_eq!(adm.admission_type.as_deref(), Some("EMERGENCY"));
        assert_eq!(
            adm.admittime,
            NaiveDate::from_ymd_opt(2150, 3, 4).unwrap().and_hms_opt(10, 20, 30)
        );
        assert!(adm.deathtime.is_none());
    }

    #[test]
    fn missing_admission_not_found() {
        let conn = seeded_db();
        assert!(matches!(
            get_admission_by_hadm_id(&conn, 999),
            Err(DatabaseError::NotFound { .. })
        ));
    }

    #[test]
    fn subject_admissions() {
        let conn = seeded_db();
        assert_eq!(get_admission_hadm_ids(&conn, 1).unwrap(), vec![100, 101]);
        let adms = get_admissions_by_subject_id(&conn, 1).unwrap();
        assert_eq!(adms.len(), 2);
        assert_eq!(adms[0].hadm_id, 100);
        assert!(get_admission_hadm_ids(&conn, 42).unwrap().is_empty());
    }

    #[test]
    fn admission_counts_descending() {
        let conn = seeded_db();
        assert_eq!(get_admission_counts(&conn, None).unwrap(), vec![(1, 2), (2, 1)]);
        assert_eq!(get_admission_counts(&conn, Some(1)).unwrap(), vec![(1, 2)]);
    }

    #[test]
    fn keys_exists_count() {
        let conn = seeded_db();
        assert_eq!(get_admission_keys(&conn).unwrap(), vec![100, 101, 200]);
        assert!(admission_exists(&conn, 101).unwrap());
        assert!(!admission_exists(&conn, 5).unwrap());
        assert_eq!(count_admissions(&conn).unwrap(), 3);
    }
}
