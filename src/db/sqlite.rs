use std::path::Path;

use rusqlite::{Connection, OpenFlags};

use super::DatabaseError;

/// Open the MIMIC-III SQLite database at `path` for querying.
pub fn open_database(path: &Path) -> Result<Connection, DatabaseError> {
    if !path.exists() {
        return Err(DatabaseError::NotFound {
            entity_type: "database".into(),
            id: path.display().to_string(),
        });
    }
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    configure_pragmas(&conn)?;
    tracing::debug!(path = %path.display(), "Opened MIMIC-III database");
    Ok(conn)
}

/// Create (or open) a database file at `path` with the MIMIC-III subset schema.
pub fn create_database(path: &Path) -> Result<Connection, DatabaseError> {
    let conn = Connection::open(path)?;
    configure_pragmas(&conn)?;
    create_schema(&conn)?;
    Ok(conn)
}

/// Open an in-memory database with the MIMIC-III subset schema (for testing)
pub fn open_memory_database() -> Result<Connection, DatabaseError> {
    let conn = Connection::open_in_memory()?;
    configure_pragmas(&conn)?;
    create_schema(&conn)?;
    Ok(conn)
}

fn configure_pragmas(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute_batch(
        "PRAGMA temp_store=MEMORY;
         PRAGMA cache_size=-65536;"
    )?;
    Ok(())
}

/// Create the tables used by the persisters when they do not exist.
pub fn create_schema(conn: &Connection) -> Result<(), DatabaseError> {
    let sql = include_str!("../../resources/sql/schema.sql");
    conn.execute_batch(sql)
        .map_err(|e| DatabaseError::SchemaFailed(e.to_string()))?;
    tracing::debug!("MIMIC-III schema ready");
    Ok(())
}

/// Count tables in the database (for verification)
pub fn count_tables(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_initializes_all_tables() {
        let conn = open_memory_database().unwrap();
        // patients, admissions, noteevents + two ICD-9 tables and their dictionaries
        let count = count_tables(&conn).unwrap();
        assert_eq!(count, 7);
    }

    #[test]
    fn schema_idempotent() {
        let conn = open_memory_database().unwrap();
        assert!(create_schema(&conn).is_ok());
    }

    #[test]
    fn open_missing_file_is_not_found() {
        let result = open_database(Path::new("/nonexistent/mimic3.sqlite3"));
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[test]
    fn created_file_database_reopens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mimic3.sqlite3");
        create_database(&path).unwrap();
        let conn = open_database(&path).unwrap();
        assert_eq!(count_tables(&conn).unwrap(), 7);
    }
}
