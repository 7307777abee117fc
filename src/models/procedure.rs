use serde::{Deserialize, Serialize};

/// ICD-9 coded procedure joined with its dictionary titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub row_id: i64,
    pub hadm_id: i64,
    pub icd9_code: Option<String>,
    pub short_title: Option<String>,
    pub long_title: Option<String>,
}
