//! Batch Orchestrator: extracts and scores every uploaded resume independently.
//!
//! Flow per file: detect format → extract text (blocking pool) → score_resume.
//! A failure at any step becomes a `FileError` for that file only. Files run concurrently
//! up to `concurrency`; results are reassembled in upload order.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::documents::{extract_text, DocumentFormat};
use crate::llm_client::CompletionService;
use crate::ranking::models::{BatchResult, CandidateScore, CriteriaSet, FileError, ResumeFile};
use crate::ranking::scorer::score_resume;
use crate::ranking::{ErrorKind, RankingError};

/// Scores every resume against `criteria`. Fails only on request-level validation.
pub async fn run_batch(
    llm: Arc<dyn CompletionService>,
    files: Vec<ResumeFile>,
    criteria: Arc<CriteriaSet>,
    concurrency: usize,
) -> Result<BatchResult, RankingError> {
    if criteria.is_empty() {
        return Err(RankingError::NoCriteria);
    }
    if files.is_empty() {
        return Err(RankingError::NoFiles);
    }

    let file_count = files.len();
    let filenames: Vec<String> = files.iter().map(|f| f.filename.clone()).collect();
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut set = JoinSet::new();

    info!(
        "Scoring {} resumes against {} criteria (concurrency {})",
        file_count,
        criteria.len(),
        concurrency.max(1)
    );

    for (index, file) in files.into_iter().enumerate() {
        let llm = Arc::clone(&llm);
        let criteria = Arc::clone(&criteria);
        let permits = Arc::clone(&permits);
        set.spawn(async move {
            let _permit = permits.acquire_owned().await;
            (index, process_file(llm.as_ref(), file, &criteria).await)
        });
    }

    let mut outcomes: Vec<Option<Result<CandidateScore, RankingError>>> =
        (0..file_count).map(|_| None).collect();

    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = Some(outcome),
            Err(e) => warn!("Resume scoring task failed to complete: {e}"),
        }
    }

    let mut result = BatchResult::default();
    for (index, (outcome, filename)) in outcomes.into_iter().zip(filenames).enumerate() {
        let outcome = outcome.unwrap_or_else(|| {
            Err(RankingError::Internal(
                "scoring task did not complete".to_string(),
            ))
        });
        match outcome {
            Ok(candidate) => result.candidates.push(candidate),
            Err(e) => {
                match e.kind() {
                    ErrorKind::Internal => warn!("Resume #{index} '{filename}' failed: {e:?}"),
                    _ => warn!("Resume #{index} '{filename}' failed: {e}"),
                }
                result.errors.push(FileError {
                    index,
                    filename,
                    kind: e.kind(),
                    code: e.code().to_string(),
                    message: e.public_message(),
                });
            }
        }
    }

    info!(
        "Batch complete: {} scored, {} failed",
        result.scored_count(),
        result.failed_count()
    );

    Ok(result)
}

async fn process_file(
    llm: &dyn CompletionService,
    file: ResumeFile,
    criteria: &CriteriaSet,
) -> Result<CandidateScore, RankingError> {
    let format = DocumentFormat::detect(&file.filename, file.content_type.as_deref())?;
    let text = extract_text_blocking(file.bytes.clone(), format).await?;

    if text.trim().is_empty() {
        return Err(RankingError::EmptyDocument);
    }

    let candidate = score_resume(llm, &text, criteria).await?;
    Ok(candidate.with_filename(file.filename))
}

/// Runs document parsing on the blocking pool.
pub async fn extract_text_blocking(
    bytes: bytes::Bytes,
    format: DocumentFormat,
) -> Result<String, RankingError> {
    tokio::task::spawn_blocking(move || extract_text(&bytes, format))
        .await
        .map_err(|e| RankingError::Internal(format!("text extraction task failed: {e}")))?
        .map_err(RankingError::from)
}
