//! Named SQL templates.
//!
//! Queries live in `resources/sql/mimic.sql` as blocks introduced by a
//! `-- name=<query name>` line. Everything up to the next name line (minus
//! comment lines) is the statement text.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::DatabaseError;

const MIMIC_SQL: &str = include_str!("../../resources/sql/mimic.sql");

static REGISTRY: LazyLock<QueryRegistry> = LazyLock::new(|| QueryRegistry::parse(MIMIC_SQL));

const NAME_PREFIX: &str = "-- name=";

/// Named queries parsed from a SQL resource.
#[derive(Debug, Default)]
pub struct QueryRegistry {
    queries: HashMap<String, String>,
}

impl QueryRegistry {
    pub fn parse(source: &str) -> Self {
        let mut queries = HashMap::new();
        let mut current: Option<(String, Vec<&str>)> = None;

        for line in source.lines() {
            let trimmed = line.trim();
            if let Some(name) = trimmed.strip_prefix(NAME_PREFIX) {
                if let Some((name, body)) = current.take() {
                    queries.insert(name, body.join("\n"));
                }
                current = Some((name.trim().to_string(), Vec::new()));
            } else if trimmed.starts_with("--") || trimmed.is_empty() {
                continue;
            } else if let Some((_, body)) = current.as_mut() {
                body.push(line);
            }
        }
        if let Some((name, body)) = current.take() {
            queries.insert(name, body.join("\n"));
        }

        Self { queries }
    }

    pub fn get(&self, name: &str) -> Result<&str, DatabaseError> {
        self.queries
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| DatabaseError::QueryNotFound(name.to_string()))
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.queries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

/// Look up a query from the bundled MIMIC-III resource.
pub fn named(name: &str) -> Result<&'static str, DatabaseError> {
    REGISTRY.get(name)
}

/// SQLite treats a negative `LIMIT` as unbounded.
pub fn limit_param(limit: Option<usize>) -> i64 {
    limit
        .map(|l| i64::try_from(l).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_named_blocks() {
        let reg = QueryRegistry::parse(
            "-- header comment\n\n-- name=one\nselect 1\n\n-- name=two\nselect *\n  from t\n  where a = ?\n",
        );
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("one").unwrap(), "select 1");
        assert_eq!(reg.get("two").unwrap(), "select *\n  from t\n  where a = ?");
    }

    #[test]
    fn unknown_name_is_error() {
        let reg = QueryRegistry::parse("-- name=one\nselect 1\n");
        assert!(matches!(reg.get("nope"), Err(DatabaseError::QueryNotFound(n)) if n == "nope"));
    }

    #[test]
    fn bundled_queries_prepare() {
        let conn = crate::db::open_memory_database().unwrap();
        for name in REGISTRY.names() {
            let sql = named(name).unwrap();
            assert!(conn.prepare(sql).is_ok(), "query {name} failed to prepare");
        }
        assert!(REGISTRY.len() >= 25);
    }

    #[test]
    fn limit_none_is_unbounded() {
        assert_eq!(limit_param(None), -1);
        assert_eq!(limit_param(Some(5)), 5);
    }
}
