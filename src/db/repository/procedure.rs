use rusqlite::{params, Connection};

use crate::db::queries::named;
use crate::db::DatabaseError;
use crate::models::*;

pub fn get_procedures_by_hadm_id(conn: &Connection, hadm_id: i64) -> Result<Vec<Procedure>, DatabaseError> {
    let mut stmt = conn.prepare(named("select_procedure_by_hadm_id")?)?;
    let rows = stmt.query_map(params![hadm_id], |row| {
        Ok(Procedure {
            row_id: row.get(0)?,
            hadm_id: row.get(1)?,
            icd9_code: row.get(2)?,
            short_title: row.get(3)?,
            long_title: row.get(4)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
