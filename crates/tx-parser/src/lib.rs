//! Text extraction for uploaded documents (PDF, DOCX, TXT).

pub mod docx;
pub mod error;
pub mod normalize;
pub mod pdf;
pub mod text;
pub mod traits;

pub use docx::DocxParser;
pub use error::{ParseError, Result};
pub use normalize::normalize_whitespace;
pub use pdf::PdfParser;
pub use text::TextParser;

use traits::DocumentParser;

/// Supported upload formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Txt,
}

impl DocumentKind {
    /// Kind from the lowercase extension after the last dot of `file_name`.
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let (_, ext) = file_name.rsplit_once('.')?;
        [DocumentKind::Pdf, DocumentKind::Docx, DocumentKind::Txt]
            .into_iter()
            .find(|kind| ext.eq_ignore_ascii_case(kind.extension()))
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "pdf",
            DocumentKind::Docx => "docx",
            DocumentKind::Txt => "txt",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => "PDF",
            DocumentKind::Docx => "DOCX",
            DocumentKind::Txt => "TXT",
        }
    }
}

/// Normalised text pulled out of an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub kind: DocumentKind,
    pub text: String,
}

/// Dispatches uploads to the parser registered for their extension.
pub struct Extractor {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(PdfParser::new()),
                Box::new(DocxParser::new()),
                Box::new(TextParser::new()),
            ],
        }
    }

    fn parser_for(&self, kind: DocumentKind) -> Option<&dyn DocumentParser> {
        self.parsers.iter().find(|p| p.kind() == kind).map(|p| p.as_ref())
    }

    /// Extract and normalise the text of an uploaded file.
    pub fn extract_upload(&self, file_name: &str, bytes: &[u8]) -> Result<Extraction> {
        let unsupported = || ParseError::Unsupported { file_name: file_name.to_string() };
        let kind = DocumentKind::from_file_name(file_name).ok_or_else(unsupported)?;
        let parser = self.parser_for(kind).ok_or_else(unsupported)?;

        tracing::debug!(file_name, kind = kind.label(), bytes = bytes.len(), "extracting upload");
        let raw = parser.extract(bytes)?;
        if raw.is_empty() {
            return Err(ParseError::Empty);
        }

        let text = normalize_whitespace(&raw);
        if text.is_empty() {
            return Err(ParseError::Empty);
        }
        Ok(Extraction { kind, text })
    }

    /// Extract a file from disk, dispatching on its name.
    pub fn extract_path(&self, path: &std::path::Path) -> Result<Extraction> {
        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        self.extract_upload(name, &bytes)
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}
