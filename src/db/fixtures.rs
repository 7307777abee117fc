//! Small MIMIC-III sample used by tests across the crate.
//!
//! Subject 1 has admissions 100 and 101; subject 2 has admission 200 with no
//! notes. Admission 100 carries one note per category, a duplicate radiology
//! report and a note of an unmapped category.

use rusqlite::{params, Connection};

use super::sqlite::open_memory_database;

pub const DISCHARGE_HPI: &str = "Admission Date:  [**2150-3-4**]\n\n\
HISTORY OF PRESENT ILLNESS:  Patient presents with dyspnea.\n\n\
PAST MEDICAL HISTORY:  CHF, diabetes.\n\n\
DISCHARGE MEDICATIONS:  Aspirin 81 mg daily.";

pub const DISCHARGE_HEADERS: &str = "Allergies:\nPenicillin\n\n\
Chief Complaint:\nShortness of breath\n\n\
History of Present Illness:\nDyspnea on exertion.";

pub const RADIOLOGY: &str = "INDICATION:  Dyspnea.\n\n\
FINDINGS:  Cardiomegaly with effusion.\n\n\
IMPRESSION:  Mild CHF.";

pub const ECHO: &str = "PATIENT/TEST INFORMATION:\nIndication: Heart failure.\n\n\
Findings:\nLEFT ATRIUM: Mild LA enlargement.\n\n\
Conclusions:\nThe left atrium is mildly dilated.";

pub const NURSING: &str = "Neuro: Alert and oriented.\n\nResp: Lungs clear bilaterally.";

pub const PHYSICIAN: &str = concat!(
    "   HPI:\n   Worsening dyspnea.\n   Allergies:\n   None\n",
    "   Assessment and Plan:\n   CHF exacerbation, diurese.\n   Code status:\n   Full code",
);

pub const CONSULT: &str = "Reason for consult:\nChest pain\n\nRecommendations:\nStart aspirin";

pub const SOCIAL_WORK: &str = "Met with family at bedside.";

/// In-memory database seeded with the sample.
pub fn seeded_db() -> Connection {
    let conn = open_memory_database().unwrap();
    seed(&conn);
    conn
}

pub fn seed(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO patients (row_id, subject_id, gender, dob, dod, expire_flag) VALUES
             (1, 1, 'F', '2080-01-02 00:00:00', NULL, 0),
             (2, 2, 'M', '2090-05-06 00:00:00', '2160-01-01 00:00:00', 1);
         INSERT INTO admissions (row_id, subject_id, hadm_id, admittime, dischtime,
             admission_type, insurance, diagnosis, hospital_expire_flag, has_chartevents_data) VALUES
             (1, 1, 100, '2150-03-04 10:20:30', '2150-03-10 12:00:00', 'EMERGENCY', 'Medicare', 'CHF', 0, 1),
             (2, 1, 101, '2151-01-01 08:00:00', '2151-01-03 09:00:00', 'ELECTIVE', 'Medicare', 'CABG', 0, 1),
             (3, 2, 200, '2159-12-01 00:00:00', '2160-01-01 00:00:00', 'URGENT', 'Private', 'SEPSIS', 1, 0);
         INSERT INTO d_icd_diagnoses (row_id, icd9_code, short_title, long_title) VALUES
             (1, '4280', 'CHF NOS', 'Congestive heart failure, unspecified'),
             (2, '25000', 'DMII wo cmp nt st uncntr', 'Diabetes mellitus without complication');
         INSERT INTO diagnoses_icd (row_id, subject_id, hadm_id, seq_num, icd9_code) VALUES
             (1, 1, 100, 2, '25000'),
             (2, 1, 100, 1, '4280'),
             (3, 2, 200, 1, '25000');
         INSERT INTO d_icd_procedures (row_id, icd9_code, short_title, long_title) VALUES
             (1, '3893', 'Venous cath NEC', 'Other venous catheterization, not elsewhere classified');
         INSERT INTO procedures_icd (row_id, subject_id, hadm_id, seq_num, icd9_code) VALUES
             (1, 1, 100, 1, '3893');",
    )
    .unwrap();

    let notes: [(i64, i64, Option<i64>, &str, &str, &str); 10] = [
        (1, 1, Some(100), "Discharge summary", "Report", DISCHARGE_HPI),
        (2, 1, Some(100), "Radiology", "CHEST (PA & LAT)", RADIOLOGY),
        (3, 1, Some(100), "Echo", "Report", ECHO),
        (4, 1, Some(100), "Nursing/other", "Report", NURSING),
        (5, 1, Some(100), "Physician ", "Physician Resident Progress Note", PHYSICIAN),
        (6, 1, Some(100), "Consult", "Cardiology", CONSULT),
        (7, 1, Some(100), "Radiology", "CHEST (PA & LAT)", RADIOLOGY),
        (8, 1, Some(100), "Social Work", "Social Work Note", SOCIAL_WORK),
        (9, 1, Some(101), "Discharge summary", "Report", DISCHARGE_HEADERS),
        (10, 2, None, "Nursing/other", "Report", NURSING),
    ];
    for (row_id, subject_id, hadm_id, category, description, text) in notes {
        conn.execute(
            "INSERT INTO noteevents (row_id, subject_id, hadm_id, chartdate, charttime,
                 category, description, cgid, iserror, text)
             VALUES (?1, ?2, ?3, '2150-03-05', '2150-03-05 11:00:00', ?4, ?5, 17, NULL, ?6)",
            params![row_id, subject_id, hadm_id, category, description, text],
        )
        .unwrap();
    }
}
