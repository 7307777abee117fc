use serde::{Deserialize, Serialize};

/// ICD-9 coded diagnosis joined with its dictionary titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnosis {
    pub row_id: i64,
    pub hadm_id: i64,
    pub icd9_code: Option<String>,
    pub short_title: Option<String>,
    pub long_title: Option<String>,
}

impl Diagnosis {
    /// Congestive heart failure codes all fall under ICD-9 `428`.
    pub fn is_heart_failure(&self) -> bool {
        self.icd9_code
            .as_deref()
            .map(|c| c.starts_with("428"))
            .unwrap_or(false)
    }
}
