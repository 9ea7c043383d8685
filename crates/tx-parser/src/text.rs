//! Plain text extraction.

use crate::{traits::DocumentParser, DocumentKind, Result};

const UTF8_BOM: char = '\u{feff}';

/// Decodes bytes as UTF-8, replacing invalid sequences.
pub struct TextParser;

impl TextParser {
    pub fn new() -> Self { Self }
}

impl DocumentParser for TextParser {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Txt
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let decoded = String::from_utf8_lossy(bytes);
        Ok(decoded.strip_prefix(UTF8_BOM).unwrap_or(&decoded).to_string())
    }
}

impl Default for TextParser {
    fn default() -> Self { Self::new() }
}
