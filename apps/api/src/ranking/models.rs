use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::ranking::ErrorKind;

/// Placeholder used when the model cannot find a candidate name.
pub const UNKNOWN_CANDIDATE: &str = "Unknown";

/// Ordered ranking criteria. Order defines report column order; duplicates are allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriteriaSet(Vec<String>);

impl CriteriaSet {
    /// Trims every criterion and drops blank ones.
    pub fn new<I, S>(criteria: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            criteria
                .into_iter()
                .map(|c| c.as_ref().trim().to_string())
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// One criterion's score for one candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionScore {
    pub criterion: String,
    pub score: u8, // 0 – 5
    pub explanation: String,
}

/// One resume's result across the whole criteria set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Upload filename; set by the batch orchestrator.
    pub filename: Option<String>,
    pub name: String,
    pub scores: Vec<CriterionScore>,
    pub total: u32,
    pub average: f64,
}

impl CandidateScore {
    /// Builds a candidate result and derives total and average from `scores`.
    pub fn new(name: String, scores: Vec<CriterionScore>) -> Self {
        let total: u32 = scores.iter().map(|s| s.score as u32).sum();
        let average = if scores.is_empty() {
            0.0
        } else {
            total as f64 / scores.len() as f64
        };
        Self {
            filename: None,
            name,
            scores,
            total,
            average,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// An uploaded resume awaiting extraction and scoring.
#[derive(Debug, Clone)]
pub struct ResumeFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// A resume that failed outright, keyed by its position in the upload.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileError {
    pub index: usize,
    pub filename: String,
    pub kind: ErrorKind,
    pub code: String,
    pub message: String,
}

/// Outcome of one batch-scoring request. Both lists preserve upload order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchResult {
    pub candidates: Vec<CandidateScore>,
    pub errors: Vec<FileError>,
}

impl BatchResult {
    pub fn scored_count(&self) -> usize {
        self.candidates.len()
    }

    pub fn failed_count(&self) -> usize {
        self.errors.len()
    }

    pub fn all_failed(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(criterion: &str, score: u8) -> CriterionScore {
        CriterionScore {
            criterion: criterion.to_string(),
            score,
            explanation: String::new(),
        }
    }

    #[test]
    fn test_criteria_set_trims_and_drops_blank_entries() {
        let set = CriteriaSet::new(["  Go  ", "", "   ", "Kubernetes"]);
        assert_eq!(set.as_slice(), &["Go".to_string(), "Kubernetes".to_string()]);
    }

    #[test]
    fn test_criteria_set_keeps_duplicates_and_order() {
        let set = CriteriaSet::new(["B", "A", "B"]);
        assert_eq!(set.len(), 3);
        assert_eq!(set.as_slice()[0], "B");
        assert_eq!(set.as_slice()[2], "B");
    }

    #[test]
    fn test_criteria_set_serializes_as_plain_array() {
        let set = CriteriaSet::new(["Go", "CKA"]);
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["Go","CKA"]"#);
    }

    #[test]
    fn test_candidate_totals_are_derived() {
        let candidate = CandidateScore::new(
            "Jane Doe".to_string(),
            vec![entry("Go", 4), entry("CKA", 0), entry("SQL", 3)],
        );
        assert_eq!(candidate.total, 7);
        assert!((candidate.average - 7.0 / 3.0).abs() < f64::EPSILON);
        assert!(candidate.filename.is_none());
    }

    #[test]
    fn test_with_filename_sets_source() {
        let candidate = CandidateScore::new("A".to_string(), vec![entry("Go", 5)])
            .with_filename("a.pdf");
        assert_eq!(candidate.filename.as_deref(), Some("a.pdf"));
    }
}
