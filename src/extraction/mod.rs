//! PDF text extraction.
//!
//! Text is pulled page by page with `pdf-extract` and concatenated in page order. The library can
//! panic on malformed input instead of returning an error, so every call runs behind
//! [`std::panic::catch_unwind`] and panics surface as [`ExtractionError::Malformed`].

use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

const PDF_MAGIC: &[u8] = b"%PDF-";
const TRUNCATION_MARKER: &str = "...";

/// Errors raised while turning PDF bytes into text.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// Input does not start with a PDF header.
    #[error("Input is not a PDF document")]
    NotPdf,
    /// The PDF could not be parsed.
    #[error("Failed to read PDF: {0}")]
    Malformed(String),
    /// The PDF parsed but contained no extractable text (scanned or image-only pages).
    #[error("PDF contains no extractable text")]
    Empty,
}

/// Plain text extracted from a PDF document.
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    /// Concatenated page text, in page order.
    pub text: String,
    /// Number of pages reported by the parser.
    pub page_count: usize,
}

/// Leading slice of a document's text suitable for display.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TextPreview {
    /// Preview text, suffixed with `...` when truncated.
    pub text: String,
    /// Whether the source text was longer than the preview budget.
    pub truncated: bool,
    /// Character count of the full source text.
    pub total_chars: usize,
}

/// Extract the text of a PDF held in memory.
pub fn extract_text_from_pdf(bytes: &[u8]) -> Result<ExtractedDocument, ExtractionError> {
    if !looks_like_pdf(bytes) {
        return Err(ExtractionError::NotPdf);
    }

    let pages = extract_pages(bytes)?;
    let page_count = pages.len();
    let text = pages.concat();

    if text.trim().is_empty() {
        tracing::warn!(page_count, "PDF has no extractable text");
        return Err(ExtractionError::Empty);
    }

    tracing::debug!(page_count, chars = text.chars().count(), "Extracted PDF text");
    Ok(ExtractedDocument { text, page_count })
}

/// Return whether the buffer begins with a PDF header, ignoring leading whitespace.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    let start = bytes
        .iter()
        .position(|byte| !byte.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    bytes[start..].starts_with(PDF_MAGIC)
}

fn extract_pages(bytes: &[u8]) -> Result<Vec<String>, ExtractionError> {
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }));
    match result {
        Ok(Ok(pages)) => Ok(pages),
        Ok(Err(error)) => Err(ExtractionError::Malformed(error.to_string())),
        Err(_) => Err(ExtractionError::Malformed(
            "parser panicked on malformed document".into(),
        )),
    }
}

/// Build a display preview holding at most `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> TextPreview {
    let total_chars = text.chars().count();
    if total_chars <= max_chars {
        return TextPreview {
            text: text.to_string(),
            truncated: false,
            total_chars,
        };
    }

    let mut head: String = text.chars().take(max_chars).collect();
    head.push_str(TRUNCATION_MARKER);
    TextPreview {
        text: head,
        truncated: true,
        total_chars,
    }
}
