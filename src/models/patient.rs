use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub row_id: i64,
    pub subject_id: i64,
    pub gender: Option<String>,
    pub dob: Option<NaiveDateTime>,
    pub dod: Option<NaiveDateTime>,
    pub dod_hosp: Option<NaiveDateTime>,
    pub dod_ssn: Option<NaiveDateTime>,
    pub expire_flag: Option<i64>,
}
