use thiserror::Error;

use crate::DocumentKind;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Unsupported file type. Please upload a PDF, DOCX, or TXT file.")]
    Unsupported { file_name: String },
    #[error("Failed to parse {} file", .kind.label())]
    Failed { kind: DocumentKind, message: String },
    #[error("No text could be extracted from the file")]
    Empty,
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    pub fn failed(kind: DocumentKind, message: impl Into<String>) -> Self {
        ParseError::Failed { kind, message: message.into() }
    }

    /// Underlying detail, when there is one beyond the headline.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ParseError::Failed { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParseError>;
