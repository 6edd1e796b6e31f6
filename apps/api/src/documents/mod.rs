//! Document text extraction for uploaded job descriptions and resumes.
//!
//! Only PDF and DOCX are accepted. Parse failures are always explicit errors;
//! an empty string means the document genuinely carries no text.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod docx;
mod pdf;

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file type '{0}'. Only PDF and DOCX files are accepted")]
    UnsupportedFormat(String),

    #[error("Could not parse {format} document: {reason}")]
    CorruptDocument {
        format: DocumentFormat,
        reason: String,
    },
}

impl ExtractError {
    /// Message safe to return to callers; parser internals stay in the logs.
    pub fn public_message(&self) -> String {
        match self {
            ExtractError::UnsupportedFormat(_) => self.to_string(),
            ExtractError::CorruptDocument { format, .. } => {
                format!("The file could not be read as a {format} document")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentFormat::Pdf => write!(f, "PDF"),
            DocumentFormat::Docx => write!(f, "DOCX"),
        }
    }
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            _ => None,
        }
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim();
        match essence.to_lowercase().as_str() {
            PDF_MIME => Some(Self::Pdf),
            DOCX_MIME => Some(Self::Docx),
            _ => None,
        }
    }

    /// Declares the format of an upload: filename extension first, content type second.
    pub fn detect(filename: &str, content_type: Option<&str>) -> Result<Self, ExtractError> {
        let extension = Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str());

        if let Some(format) = extension.and_then(Self::from_extension) {
            return Ok(format);
        }
        if let Some(format) = content_type.and_then(Self::from_mime) {
            return Ok(format);
        }

        let declared = extension
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .or_else(|| content_type.map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        Err(ExtractError::UnsupportedFormat(declared))
    }
}

/// Extracts plain text from document bytes of the declared format.
pub fn extract_text(bytes: &[u8], format: DocumentFormat) -> Result<String, ExtractError> {
    match format {
        DocumentFormat::Pdf => pdf::pdf_to_text(bytes),
        DocumentFormat::Docx => docx::docx_to_text(bytes),
    }
}
