use std::panic::{self, AssertUnwindSafe};

use tracing::warn;

use super::{DocumentFormat, ExtractError};

/// Concatenates the text of every page in document order.
///
/// The PDF parser can panic on malformed input; a panic is reported as a corrupt document.
pub(super) fn pdf_to_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if bytes.is_empty() {
        return Err(corrupt("empty file"));
    }

    let extracted = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem(bytes)
    }));

    match extracted {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(corrupt(&e.to_string())),
        Err(_) => {
            warn!("PDF parser panicked on a {} byte upload", bytes.len());
            Err(corrupt("parser aborted on malformed content"))
        }
    }
}

fn corrupt(reason: &str) -> ExtractError {
    ExtractError::CorruptDocument {
        format: DocumentFormat::Pdf,
        reason: reason.to_string(),
    }
}
