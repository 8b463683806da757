// 📄 Document Sources - "document → text" collaborators
// The core only ever sees the text; decoding lives behind DocumentSource

use lopdf::Document;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// DecodeError - A document could not be turned into text
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Failed to read {name}: {reason}")]
    Io { name: String, reason: String },

    #[error("Failed to parse PDF {name}: {reason}")]
    Pdf { name: String, reason: String },

    #[error("{name} is not valid UTF-8 text")]
    InvalidUtf8 { name: String },

    #[error("Unsupported document type: {name}")]
    Unsupported { name: String },

    #[error("{name} is empty")]
    Empty { name: String },
}

impl DecodeError {
    /// Name of the document that failed
    pub fn document(&self) -> &str {
        match self {
            DecodeError::Io { name, .. }
            | DecodeError::Pdf { name, .. }
            | DecodeError::InvalidUtf8 { name }
            | DecodeError::Unsupported { name }
            | DecodeError::Empty { name } => name,
        }
    }
}

// ============================================================================
// DOCUMENT KIND
// ============================================================================

/// DocumentKind - Which decoder a document needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentKind {
    Pdf,
    PlainText,
}

impl DocumentKind {
    /// Detect kind from the file name extension
    ///
    /// Files without an extension are treated as plain text.
    pub fn detect(name: &str) -> Option<DocumentKind> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Some(DocumentKind::Pdf),
            Some("txt") | Some("text") | Some("md") | None => Some(DocumentKind::PlainText),
            Some(_) => None,
        }
    }
}

// ============================================================================
// DOCUMENT SOURCE TRAIT
// ============================================================================

/// DocumentSource - Turns raw document bytes into plain text
///
/// Implementations must not interpret the text; whatever they return is
/// handed to the classifier as-is.
pub trait DocumentSource: Send + Sync {
    /// Decode a document into text
    fn read_text(&self, name: &str, bytes: &[u8]) -> Result<String, DecodeError>;

    /// Whether this source handles documents with this name
    fn can_read(&self, name: &str) -> bool;
}

fn reject_empty(name: &str, bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.is_empty() {
        return Err(DecodeError::Empty {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Plain UTF-8 text files
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextSource;

impl DocumentSource for PlainTextSource {
    fn read_text(&self, name: &str, bytes: &[u8]) -> Result<String, DecodeError> {
        reject_empty(name, bytes)?;

        String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8 {
            name: name.to_string(),
        })
    }

    fn can_read(&self, name: &str) -> bool {
        DocumentKind::detect(name) == Some(DocumentKind::PlainText)
    }
}

/// PDF text layer, every page concatenated in page order
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfTextSource;

impl DocumentSource for PdfTextSource {
    fn read_text(&self, name: &str, bytes: &[u8]) -> Result<String, DecodeError> {
        reject_empty(name, bytes)?;

        let pdf_error = |e: lopdf::Error| DecodeError::Pdf {
            name: name.to_string(),
            reason: e.to_string(),
        };

        let document = Document::load_mem(bytes).map_err(pdf_error)?;
        let pages: Vec<u32> = document.get_pages().keys().copied().collect();

        let mut text = String::new();
        for page in &pages {
            text.push_str(&document.extract_text(&[*page]).map_err(pdf_error)?);
        }

        tracing::debug!(document = name, pages = pages.len(), chars = text.len(), "Extracted PDF text");
        Ok(text)
    }

    fn can_read(&self, name: &str) -> bool {
        DocumentKind::detect(name) == Some(DocumentKind::Pdf)
    }
}

/// Dispatches to the right source by file extension
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoSource;

impl DocumentSource for AutoSource {
    fn read_text(&self, name: &str, bytes: &[u8]) -> Result<String, DecodeError> {
        get_source(name)?.read_text(name, bytes)
    }

    fn can_read(&self, name: &str) -> bool {
        DocumentKind::detect(name).is_some()
    }
}

/// Get the source for a document name
pub fn get_source(name: &str) -> Result<Box<dyn DocumentSource>, DecodeError> {
    match DocumentKind::detect(name) {
        Some(DocumentKind::Pdf) => Ok(Box::new(PdfTextSource)),
        Some(DocumentKind::PlainText) => Ok(Box::new(PlainTextSource)),
        None => Err(DecodeError::Unsupported {
            name: name.to_string(),
        }),
    }
}

// ============================================================================
// LOADING
// ============================================================================

/// RawDocument - Name plus undecoded bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl RawDocument {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        RawDocument {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Read a document from disk; its name is the file name
pub fn load_document(path: &Path) -> Result<RawDocument, DecodeError> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();

    let bytes = std::fs::read(path).map_err(|e| DecodeError::Io {
        name: name.clone(),
        reason: e.to_string(),
    })?;

    Ok(RawDocument { name, bytes })
}

// ============================================================================
// TESTS
// ============================================================================
