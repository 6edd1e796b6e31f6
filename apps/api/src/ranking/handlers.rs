//! Axum route handlers for criteria extraction and resume scoring.

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, Multipart, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::documents::DocumentFormat;
use crate::errors::AppError;
use crate::ranking::batch::{extract_text_blocking, run_batch};
use crate::ranking::criteria::{extract_criteria, parse_criteria_payload};
use crate::ranking::models::{BatchResult, CriteriaSet, ResumeFile};
use crate::ranking::RankingError;
use crate::report::{build_report, XLSX_MIME};
use crate::state::AppState;

const SCORED_COUNT_HEADER: &str = "x-scored-count";
const FAILED_COUNT_HEADER: &str = "x-failed-count";
const FAILED_FILES_HEADER: &str = "x-failed-files";

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ExtractCriteriaResponse {
    pub criteria: CriteriaSet,
}

/// Files and fields pulled out of a multipart upload.
#[derive(Debug, Default)]
struct UploadForm {
    criteria: Option<String>,
    files: Vec<ResumeFile>,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /extract-criteria
///
/// Multipart field `file`: a job description (PDF or DOCX).
/// Returns `{"criteria": [...]}`.
pub async fn handle_extract_criteria(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<ExtractCriteriaResponse>, AppError> {
    let form = read_form(multipart, &["file"]).await?;
    let file = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| AppError::validation("A job description file is required in field 'file'"))?;

    info!("Extracting criteria from '{}'", file.filename);

    let format = DocumentFormat::detect(&file.filename, file.content_type.as_deref())
        .map_err(RankingError::from)?;
    let text = extract_text_blocking(file.bytes, format).await?;
    let criteria = extract_criteria(state.llm.as_ref(), &text).await?;

    Ok(Json(ExtractCriteriaResponse { criteria }))
}

/// POST /score-resumes
///
/// Multipart fields: `criteria` (JSON list or `{"criteria": [...]}`) and one or more `files`.
/// Returns an XLSX report. Partial failures are summarized in response headers;
/// a batch where every resume failed is an error.
pub async fn handle_score_resumes(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let form = read_form(multipart, &["files", "files[]", "file"]).await?;

    let raw_criteria = form
        .criteria
        .ok_or_else(|| AppError::validation("Field 'criteria' is required"))?;
    let criteria = parse_criteria_payload(&raw_criteria)?;

    if form.files.is_empty() {
        return Err(RankingError::NoFiles.into());
    }

    let criteria = Arc::new(criteria);
    let batch = run_batch(
        Arc::clone(&state.llm),
        form.files,
        Arc::clone(&criteria),
        state.config.scoring_concurrency,
    )
    .await?;

    if batch.all_failed() {
        return Err(AppError::UnprocessableEntity {
            code: "ALL_RESUMES_FAILED",
            message: format!(
                "No resumes could be processed successfully. Errors: {}",
                describe_failures(&batch)
            ),
        });
    }

    let report = build_report(&batch, &criteria)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    let filename = format!(
        "resume_scores_{}.xlsx",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(XLSX_MIME));
    if let Ok(value) = HeaderValue::from_str(&format!("attachment; filename={filename}")) {
        headers.insert(header::CONTENT_DISPOSITION, value);
    }
    insert_batch_headers(&mut headers, &batch);

    Ok((headers, report).into_response())
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Reads `criteria` text and any file parts whose field name is in `file_fields`.
/// Unknown fields are drained and ignored.
async fn read_form(mut multipart: Multipart, file_fields: &[&str]) -> Result<UploadForm, AppError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation(format!("Malformed multipart body: {}", e.body_text())))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name == "criteria" {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::validation(format!("Unreadable criteria field: {}", e.body_text())))?;
            form.criteria = Some(text);
        } else if file_fields.contains(&name.as_str()) {
            form.files.push(read_file(field).await?);
        } else {
            field.bytes().await.map_err(|e| {
                AppError::validation(format!("Unreadable field '{name}': {}", e.body_text()))
            })?;
        }
    }

    Ok(form)
}

async fn read_file(field: Field<'_>) -> Result<ResumeFile, AppError> {
    let filename = field.file_name().unwrap_or("unknown").to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(|e| {
        AppError::validation(format!("Could not read upload '{filename}': {}", e.body_text()))
    })?;
    Ok(ResumeFile {
        filename,
        content_type,
        bytes,
    })
}

fn describe_failures(batch: &BatchResult) -> String {
    batch
        .errors
        .iter()
        .map(|e| format!("{} ({}): {}", e.filename, e.code, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

fn insert_batch_headers(headers: &mut HeaderMap, batch: &BatchResult) {
    headers.insert(
        HeaderName::from_static(SCORED_COUNT_HEADER),
        HeaderValue::from(batch.scored_count()),
    );
    headers.insert(
        HeaderName::from_static(FAILED_COUNT_HEADER),
        HeaderValue::from(batch.failed_count()),
    );

    if batch.failed_count() > 0 {
        warn!(
            "Returning partial report: {} of {} resumes failed",
            batch.failed_count(),
            batch.failed_count() + batch.scored_count()
        );
        let failed = batch
            .errors
            .iter()
            .map(|e| header_safe(&e.filename))
            .collect::<Vec<_>>()
            .join(",");
        if let Ok(value) = HeaderValue::from_str(&failed) {
            headers.insert(HeaderName::from_static(FAILED_FILES_HEADER), value);
        }
    }
}

/// Replaces anything that is not printable ASCII (and the list separator) with `_`.
fn header_safe(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != ',' || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
