// Ranking pipeline: criteria extraction, per-resume scoring, batch orchestration.
// All model calls go through `CompletionService`; nothing here talks HTTP to the model directly.

use serde::Serialize;
use thiserror::Error;

use crate::documents::ExtractError;
use crate::llm_client::LlmError;

pub mod batch;
pub mod criteria;
pub mod handlers;
pub mod models;
pub mod prompts;
pub mod scorer;

/// Machine-distinguishable error category shared by request errors and per-file errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Parse,
    Service,
    Internal,
}

#[derive(Debug, Error)]
pub enum RankingError {
    #[error(transparent)]
    Extract(#[from] ExtractError),

    #[error("Criteria payload is invalid: {0}")]
    InvalidCriteriaPayload(String),

    #[error("At least one criterion is required")]
    NoCriteria,

    #[error("At least one resume file is required")]
    NoFiles,

    #[error("The document contains no extractable text")]
    EmptyDocument,

    #[error("The job description yielded no ranking criteria")]
    EmptyCriteria,

    #[error("Model returned criteria in an unexpected format: {0}")]
    CriteriaParse(String),

    #[error("Model returned scores in an unexpected format: {0}")]
    ScoreParse(String),

    #[error("Model service call failed: {0}")]
    ModelService(#[from] LlmError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RankingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RankingError::Extract(ExtractError::UnsupportedFormat(_))
            | RankingError::InvalidCriteriaPayload(_)
            | RankingError::NoCriteria
            | RankingError::NoFiles
            | RankingError::EmptyDocument => ErrorKind::Validation,
            RankingError::Extract(ExtractError::CorruptDocument { .. })
            | RankingError::EmptyCriteria
            | RankingError::CriteriaParse(_)
            | RankingError::ScoreParse(_) => ErrorKind::Parse,
            RankingError::ModelService(_) => ErrorKind::Service,
            RankingError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RankingError::Extract(ExtractError::UnsupportedFormat(_)) => "UNSUPPORTED_FORMAT",
            RankingError::Extract(ExtractError::CorruptDocument { .. }) => "CORRUPT_DOCUMENT",
            RankingError::InvalidCriteriaPayload(_) => "INVALID_CRITERIA",
            RankingError::NoCriteria => "NO_CRITERIA",
            RankingError::NoFiles => "NO_FILES",
            RankingError::EmptyDocument => "EMPTY_DOCUMENT",
            RankingError::EmptyCriteria => "EMPTY_CRITERIA",
            RankingError::CriteriaParse(_) => "CRITERIA_PARSE_ERROR",
            RankingError::ScoreParse(_) => "SCORE_PARSE_ERROR",
            RankingError::ModelService(e) if e.is_timeout() => "MODEL_SERVICE_TIMEOUT",
            RankingError::ModelService(_) => "MODEL_SERVICE_ERROR",
            RankingError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Human-readable message for callers. Library and upstream error text stays in the logs.
    pub fn public_message(&self) -> String {
        match self {
            RankingError::Extract(e) => e.public_message(),
            RankingError::CriteriaParse(_) => {
                "The language model returned criteria in an unexpected format".to_string()
            }
            RankingError::ScoreParse(_) => {
                "The language model returned scores in an unexpected format".to_string()
            }
            RankingError::ModelService(e) => {
                let mut summary = e.summary().to_string();
                if let Some(first) = summary.get_mut(0..1) {
                    first.make_ascii_uppercase();
                }
                summary
            }
            RankingError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}
