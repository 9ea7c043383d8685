//! PDF extraction via `pdf-extract`.

use std::panic;

use crate::{traits::DocumentParser, DocumentKind, ParseError, Result};

pub struct PdfParser;

impl PdfParser {
    pub fn new() -> Self { Self }
}

impl DocumentParser for PdfParser {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Pdf
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        // pdf-extract panics on some malformed inputs instead of returning Err.
        let outcome = panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes));
        match outcome {
            Ok(Ok(text)) => Ok(text),
            Ok(Err(e)) => Err(ParseError::failed(DocumentKind::Pdf, e.to_string())),
            Err(payload) => {
                let message = payload
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
                    .unwrap_or_else(|| "PDF parser panicked".to_string());
                tracing::warn!(%message, "pdf extraction panicked");
                Err(ParseError::failed(DocumentKind::Pdf, message))
            }
        }
    }
}

impl Default for PdfParser {
    fn default() -> Self { Self::new() }
}
