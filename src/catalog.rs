//! The fixed catalog of regulatory questions.
//!
//! The questions target HKMA's Banking (Capital) Rules and the IRB approach
//! for credit risk. The set is compiled in: ids run 1..=20 and never change
//! at runtime.

/// One catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Question {
    pub qid: u32,
    pub text: &'static str,
}

/// Number of questions in the catalog.
pub const QUESTION_COUNT: usize = 20;

/// Lowest and highest valid question id.
pub const MIN_QID: u32 = 1;
pub const MAX_QID: u32 = QUESTION_COUNT as u32;

/// The catalog, ordered by id.
pub const QUESTIONS: [Question; QUESTION_COUNT] = [
    Question {
        qid: 1,
        text: "Does the documentation consistently adopt terminology defined in the Banking (Capital) Rules (BCR) and ensure all statements are unambiguous?",
    },
    Question {
        qid: 2,
        text: "Does it clearly specify the IRB adoption category to which the model applies and demonstrate compliance with the minimum usage requirements set out in Part 6 and Schedule 2 of the BCR?",
    },
    Question {
        qid: 3,
        text: "Is the model development logic economically sound, ensuring that identified risk factors are not driven by spurious or purely data-based correlations?",
    },
    Question {
        qid: 4,
        text: "Is the model type clearly defined, and are judgmental components governed by written guidelines specifying the rationale and weight allocation of risk factors?",
    },
    Question {
        qid: 5,
        text: "Does the development process incorporate relevant lending practices, recovery processes, and any recent changes in AI-driven credit decisioning?",
    },
    Question {
        qid: 6,
        text: "Does the development dataset include representative samples from both favourable and adverse economic periods, consistent with the cyclical requirements of the BCR?",
    },
    Question {
        qid: 7,
        text: "Are the control measures for the entire data lifecycle—covering collection, storage, retrieval, and deletion—clearly documented?",
    },
    Question {
        qid: 8,
        text: "Does the data quality assessment include quantitative indicators, and is it performed at least annually?",
    },
    Question {
        qid: 9,
        text: "Is the consistency of external or pooled data validated, and is its suitability reviewed at least once every 12 months?",
    },
    Question {
        qid: 10,
        text: "Are statistical treatments for missing values and outliers properly explained and methodologically sound?",
    },
    Question {
        qid: 11,
        text: "Is the Probability of Default (PD) estimation based on approved methodologies, with validated discriminatory power and calibration accuracy?",
    },
    Question {
        qid: 12,
        text: "Does the Loss Given Default (LGD) estimation incorporate downturn adjustments, employ compliant methodologies, and maintain appropriate conservatism?",
    },
    Question {
        qid: 13,
        text: "Does the Exposure at Default (EAD) estimation reflect current credit management practices, and is the chosen methodology well justified?",
    },
    Question {
        qid: 14,
        text: "For Low Default Portfolios (LDPs), are data augmentation techniques or benchmarking tools appropriately applied?",
    },
    Question {
        qid: 15,
        text: "Does model validation cover both quantitative and qualitative dimensions, and is it conducted at least annually?",
    },
    Question {
        qid: 16,
        text: "Are out-of-sample and out-of-time validations performed, with alternative approaches documented in cases of data limitations?",
    },
    Question {
        qid: 17,
        text: "Are internal tolerance thresholds defined for validation results, and are clear remediation actions specified for threshold breaches?",
    },
    Question {
        qid: 18,
        text: "Do the Board and senior management approve key model components and material changes, and do they receive regular performance reports?",
    },
    Question {
        qid: 19,
        text: "Are model validation and rating approval functions independent, and is the compliance of these processes reviewed annually by internal audit?",
    },
    Question {
        qid: 20,
        text: "Have third-party or group-level models undergone sufficient validation, with documentation disclosing methodological details and applicable boundaries?",
    },
];

/// Look up a question by id.
pub fn get(qid: u32) -> Option<&'static Question> {
    QUESTIONS.iter().find(|q| q.qid == qid)
}

/// Whether `qid` names a catalog question.
pub fn contains(qid: u32) -> bool {
    get(qid).is_some()
}

/// All catalog ids in ascending order.
pub fn all_ids() -> Vec<u32> {
    QUESTIONS.iter().map(|q| q.qid).collect()
}

/// Whether a raw (possibly negative) client-supplied id is inside 1..=20.
pub fn in_range(qid: i64) -> bool {
    (i64::from(MIN_QID)..=i64::from(MAX_QID)).contains(&qid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_contiguous_and_ordered() {
        let ids = all_ids();
        assert_eq!(ids, (1..=20).collect::<Vec<u32>>());
    }

    #[test]
    fn texts_are_non_empty() {
        assert!(QUESTIONS.iter().all(|q| !q.text.trim().is_empty()));
    }

    #[test]
    fn lookup_outside_catalog() {
        assert!(get(0).is_none());
        assert!(get(21).is_none());
        assert!(contains(20));
    }

    #[test]
    fn range_check_rejects_negative() {
        assert!(!in_range(-1));
        assert!(!in_range(0));
        assert!(in_range(1));
        assert!(in_range(20));
        assert!(!in_range(21));
    }
}
