//! Regular expression section extractors, one per note category.
//!
//! Every extractor yields matches whose first group is the section header
//! and second group the section body. Matching runs over the note text with
//! two newlines appended so the final section terminates like the others.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;

use super::section::Section;
use super::span::LexicalSpan;

// ═══════════════════════════════════════════
// Patterns
// ═══════════════════════════════════════════

static DISCHARGE_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)([a-zA-Z ]+):\n+(.+?)\n{2,}").unwrap());

static DISCHARGE_PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)([A-Z ]+):[ ]{2,}(.+?)\n{2,}").unwrap());

static NURSING_OTHER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)([a-zA-Z ]+):[ ](.+?)\n{2,}").unwrap());

static ECHO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?is)(conclusions|findings|impression|indication|patient/test information|clinical implications):[\n ]+(.+?)\n{2,}",
    )
    .unwrap()
});

static PHYSICIAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?is)[ ]{3}(",
        "HPI|Current medications|24 Hour Events|Last dose of Antibiotics|Flowsheet Data",
        "|physical examination|labs / radiology|assessment and plan|code status|disposition",
        r"):?\n(.+?)\n[ ]{3}[a-zA-Z0-9/ ]+:",
    ))
    .unwrap()
});

static RADIOLOGY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*([A-Z ]+):[\n ]{2,}(.+?)\n{2,}").unwrap());

static CONSULT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\s*([a-zA-Z/ ]+):\n+(.+?)(?:[\n]{2,}|\s+\.\n)").unwrap());

/// Discharge summaries written in the paragraph style carry this header.
const HPI_MARKER: &str = "HISTORY OF PRESENT ILLNESS:";

// ═══════════════════════════════════════════
// Extractors
// ═══════════════════════════════════════════

/// Splits the text of one note category into sections.
pub trait SectionExtractor: Send + Sync {
    /// Name used to reference the extractor from configuration.
    fn name(&self) -> &'static str;

    /// The note category the extractor was written for.
    fn category(&self) -> &'static str;

    /// Pattern to run over `text`.
    fn regex(&self, text: &str) -> &'static Regex;

    /// Sections found in `text`, numbered in match order; empty when none match.
    fn extract(&self, text: &str) -> Vec<Section> {
        let extended = format!("{text}\n\n");
        let limit = text.len();
        let clamp = |m: regex::Match<'_>| LexicalSpan::new(m.start().min(limit), m.end().min(limit));

        self.regex(text)
            .captures_iter(&extended)
            .filter(|caps| caps.get(0).map(|m| !m.is_empty()).unwrap_or(false))
            .filter_map(|caps| Some((caps.get(1)?, caps.get(2)?)))
            .enumerate()
            .map(|(id, (header, body))| Section::new(id, None, vec![clamp(header)], clamp(body), text))
            .collect()
    }
}

macro_rules! regex_extractor {
    ($name:ident, $id:literal, $category:literal, $regex:ident) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $name;

        impl SectionExtractor for $name {
            fn name(&self) -> &'static str {
                $id
            }

            fn category(&self) -> &'static str {
                $category
            }

            fn regex(&self, _text: &str) -> &'static Regex {
                &$regex
            }
        }
    };
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DischargeSummaryExtractor;

impl SectionExtractor for DischargeSummaryExtractor {
    fn name(&self) -> &'static str {
        "discharge_summary"
    }

    fn category(&self) -> &'static str {
        "Discharge summary"
    }

    fn regex(&self, text: &str) -> &'static Regex {
        if text.contains(HPI_MARKER) {
            &DISCHARGE_PARAGRAPH
        } else {
            &DISCHARGE_HEADER
        }
    }
}

regex_extractor!(NursingOtherExtractor, "nursing_other", "Nursing/other", NURSING_OTHER);
regex_extractor!(EchoExtractor, "echo", "Echo", ECHO);
regex_extractor!(PhysicianExtractor, "physician", "Physician", PHYSICIAN);
regex_extractor!(RadiologyExtractor, "radiology", "Radiology", RADIOLOGY);
regex_extractor!(ConsultExtractor, "consult", "Consult", CONSULT);

/// Every built-in extractor.
pub fn all_extractors() -> Vec<Arc<dyn SectionExtractor>> {
    vec![
        Arc::new(DischargeSummaryExtractor),
        Arc::new(NursingOtherExtractor),
        Arc::new(EchoExtractor),
        Arc::new(PhysicianExtractor),
        Arc::new(RadiologyExtractor),
        Arc::new(ConsultExtractor),
    ]
}

pub fn extractor_by_name(name: &str) -> Option<Arc<dyn SectionExtractor>> {
    all_extractors().into_iter().find(|e| e.name() == name)
}

/// Category → extractor name for the built-in extractors.
pub fn default_category_mapping() -> BTreeMap<String, String> {
    all_extractors()
        .iter()
        .map(|e| (e.category().to_string(), e.name().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;

    fn names(secs: &[Section]) -> Vec<&str> {
        secs.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn discharge_paragraph_style() {
        let secs = DischargeSummaryExtractor.extract(fixtures::DISCHARGE_HPI);
        assert_eq!(
            names(&secs),
            vec!["history-of-present-illness", "past-medical-history", "discharge-medications"]
        );
        assert_eq!(secs[0].body(fixtures::DISCHARGE_HPI), "Patient presents with dyspnea.");
        assert_eq!(secs[2].body(fixtures::DISCHARGE_HPI), "Aspirin 81 mg daily.");
        assert_eq!(secs.iter().map(|s| s.id).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn discharge_header_style() {
        let secs = DischargeSummaryExtractor.extract(fixtures::DISCHARGE_HEADERS);
        assert_eq!(names(&secs), vec!["allergies", "chief-complaint", "history-of-present-illness"]);
        assert_eq!(secs[1].body(fixtures::DISCHARGE_HEADERS), "Shortness of breath");
    }

    #[test]
    fn radiology_sections() {
        let secs = RadiologyExtractor.extract(fixtures::RADIOLOGY);
        assert_eq!(names(&secs), vec!["indication", "findings", "impression"]);
        assert_eq!(secs[2].body(fixtures::RADIOLOGY), "Mild CHF.");
        assert_eq!(secs[1].headers(fixtures::RADIOLOGY), vec!["FINDINGS"]);
    }

    #[test]
    fn echo_sections() {
        let secs = EchoExtractor.extract(fixtures::ECHO);
        assert_eq!(names(&secs), vec!["patient-test-information", "findings", "conclusions"]);
        assert!(secs[1].body(fixtures::ECHO).starts_with("LEFT ATRIUM: Mild LA enlargement"));
    }

    #[test]
    fn nursing_sections() {
        let secs = NursingOtherExtractor.extract(fixtures::NURSING);
        assert_eq!(names(&secs), vec!["neuro", "resp"]);
        assert_eq!(secs[1].body(fixtures::NURSING), "Lungs clear bilaterally.");
    }

    #[test]
    fn physician_sections() {
        let secs = PhysicianExtractor.extract(fixtures::PHYSICIAN);
        assert_eq!(names(&secs), vec!["hpi", "assessment-and-plan"]);
        assert_eq!(secs[1].body(fixtures::PHYSICIAN).trim(), "CHF exacerbation, diurese.");
    }

    #[test]
    fn consult_sections() {
        let secs = ConsultExtractor.extract(fixtures::CONSULT);
        assert_eq!(names(&secs), vec!["reason-for-consult", "recommendations"]);
        assert_eq!(secs[1].body(fixtures::CONSULT), "Start aspirin");
    }

    #[test]
    fn no_match_is_empty() {
        assert!(RadiologyExtractor.extract("nothing to see here").is_empty());
        assert!(RadiologyExtractor.extract("").is_empty());
    }

    #[test]
    fn lookup_and_mapping() {
        assert_eq!(extractor_by_name("echo").map(|e| e.category()), Some("Echo"));
        assert!(extractor_by_name("ecg").is_none());
        let mapping = default_category_mapping();
        assert_eq!(mapping.get("Nursing/other").map(String::as_str), Some("nursing_other"));
        assert_eq!(mapping.len(), 6);
    }
}
