use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One hospital stay (`admissions` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub row_id: i64,
    pub subject_id: i64,
    pub hadm_id: i64,
    pub admittime: Option<NaiveDateTime>,
    pub dischtime: Option<NaiveDateTime>,
    pub deathtime: Option<NaiveDateTime>,
    pub admission_type: Option<String>,
    pub admission_location: Option<String>,
    pub discharge_location: Option<String>,
    pub insurance: Option<String>,
    pub language: Option<String>,
    pub religion: Option<String>,
    pub marital_status: Option<String>,
    pub ethnicity: Option<String>,
    pub edregtime: Option<NaiveDateTime>,
    pub edouttime: Option<NaiveDateTime>,
    pub diagnosis: Option<String>,
    pub hospital_expire_flag: Option<i64>,
    pub has_chartevents_data: Option<i64>,
}
