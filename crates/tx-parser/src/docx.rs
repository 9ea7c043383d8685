//! DOCX body text extraction.
//!
//! A DOCX file is a ZIP archive; the body lives in `word/document.xml`. Text
//! runs (`w:t`) are concatenated, `w:tab` and `w:br` inside runs become tab
//! and newline, and every paragraph ends with a newline.

use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::reader::Reader;
use zip::ZipArchive;

use crate::{traits::DocumentParser, DocumentKind, ParseError, Result};

const DOCUMENT_PART: &str = "word/document.xml";

pub struct DocxParser;

impl DocxParser {
    pub fn new() -> Self { Self }

    /// Read the main document part out of the archive.
    fn document_xml(bytes: &[u8]) -> Result<String> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ParseError::failed(DocumentKind::Docx, format!("not a DOCX archive: {e}")))?;
        let mut part = archive.by_name(DOCUMENT_PART).map_err(|_| {
            ParseError::failed(DocumentKind::Docx, format!("Invalid DOCX file: {DOCUMENT_PART} not found"))
        })?;
        let mut xml = String::new();
        part.read_to_string(&mut xml)
            .map_err(|e| ParseError::failed(DocumentKind::Docx, e.to_string()))?;
        Ok(xml)
    }

    /// Body text of a WordprocessingML document.
    pub fn body_text(xml: &str) -> Result<String> {
        let mut reader = Reader::from_str(xml);
        let mut out = String::new();
        let mut in_run = false;
        let mut in_text = false;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| ParseError::failed(DocumentKind::Docx, e.to_string()))?;
            match event {
                Event::Start(e) => match e.local_name().as_ref() {
                    b"r" => in_run = true,
                    b"t" => in_text = true,
                    _ => {}
                },
                Event::Empty(e) => match e.local_name().as_ref() {
                    b"tab" if in_run => out.push('\t'),
                    b"br" | b"cr" if in_run => out.push('\n'),
                    b"p" => out.push('\n'),
                    _ => {}
                },
                Event::End(e) => match e.local_name().as_ref() {
                    b"r" => in_run = false,
                    b"t" => in_text = false,
                    b"p" => out.push('\n'),
                    _ => {}
                },
                Event::Text(t) if in_text => {
                    let text = t
                        .unescape()
                        .map_err(|e| ParseError::failed(DocumentKind::Docx, e.to_string()))?;
                    out.push_str(&text);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(out)
    }
}

impl DocumentParser for DocxParser {
    fn kind(&self) -> DocumentKind {
        DocumentKind::Docx
    }

    fn extract(&self, bytes: &[u8]) -> Result<String> {
        let xml = Self::document_xml(bytes)?;
        let body = Self::body_text(&xml)?;
        if body.trim().is_empty() {
            return Err(ParseError::failed(DocumentKind::Docx, "No text content found in DOCX file"));
        }
        Ok(body)
    }
}

impl Default for DocxParser {
    fn default() -> Self { Self::new() }
}
