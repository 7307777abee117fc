use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::db::DatabaseError;

static CATEGORY_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[/ ]+").unwrap());

const TRUNCATE_LEN: usize = 70;

/// A row of `noteevents`: one free-text clinical document of an admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    pub row_id: i64,
    pub subject_id: i64,
    pub hadm_id: i64,
    pub chartdate: Option<NaiveDate>,
    pub charttime: Option<NaiveDateTime>,
    pub storetime: Option<NaiveDateTime>,
    pub category: String,
    pub description: Option<String>,
    pub cgid: Option<i64>,
    pub iserror: bool,
    pub text: String,
}

impl NoteEvent {
    /// Create a note event, failing when it is not attached to an admission.
    ///
    /// The category is trimmed and trailing whitespace is removed from the
    /// text. Remaining fields are empty and can be set with struct update
    /// syntax.
    pub fn new(
        row_id: i64,
        subject_id: i64,
        hadm_id: Option<i64>,
        category: &str,
        text: &str,
    ) -> Result<Self, DatabaseError> {
        let hadm_id = hadm_id.ok_or_else(|| DatabaseError::MissingField {
            entity_type: "note event".into(),
            id: row_id.to_string(),
            field: "hadm_id".into(),
        })?;
        Ok(Self {
            row_id,
            subject_id,
            hadm_id,
            chartdate: None,
            charttime: None,
            storetime: None,
            category: category.trim().to_string(),
            description: None,
            cgid: None,
            iserror: false,
            text: text.trim_end().to_string(),
        })
    }

    /// Category slug such as `discharge-summary` or `nursing-other`.
    pub fn id(&self) -> String {
        CATEGORY_SLUG
            .replace_all(&self.category, "-")
            .to_lowercase()
    }

    /// Single line preview of the note text.
    pub fn truncated_text(&self) -> String {
        truncate(&self.text, TRUNCATE_LEN)
            .replace('\n', " ")
            .trim()
            .to_string()
    }
}

/// Cut `s` to `max_len` characters, ending in `...` when shortened.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() >= max_len {
        let keep = max_len.saturating_sub(3);
        let mut out: String = s.chars().take(keep).collect();
        out.push_str("...");
        out
    } else {
        s.to_string()
    }
}
