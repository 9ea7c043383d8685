use crate::{DocumentKind, Result};

/// Trait for document text extractors.
pub trait DocumentParser: Send + Sync {
    /// Format handled by this parser.
    fn kind(&self) -> DocumentKind;

    /// Extract raw text from the file bytes.
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}
