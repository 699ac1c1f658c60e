//! PDF loading: one [`Document`] per page.
//!
//! Text extraction is delegated to [`lopdf`]. This module is only available
//! when the `pdf` feature is enabled.

use std::path::Path;

use lopdf::{Dictionary, Object};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::document::{Document, Metadata};
use crate::error::{RagError, Result};

/// Loads PDF files page by page.
///
/// Every page becomes a [`Document`] with metadata `source`, `page`
/// (0-based), `total_pages`, and the lowercased entries of the PDF's
/// document-information dictionary (`title`, `author`, `producer`, …).
/// Those entries are frequently empty and are pruned later by the chunker.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfLoader;

impl PdfLoader {
    /// Load the PDF at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Document`] if the file cannot be read or parsed.
    /// A page whose text cannot be extracted is logged and yields empty content.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Document>> {
        let path = path.as_ref();
        let pdf = lopdf::Document::load(path)
            .map_err(|e| RagError::Document(format!("failed to load '{}': {e}", path.display())))?;
        let documents = self.pages(&pdf, &path.display().to_string());
        info!(source = %path.display(), pages = documents.len(), "loaded PDF");
        Ok(documents)
    }

    /// Load a PDF held in memory; `source` is recorded as metadata.
    pub fn load_bytes(&self, bytes: &[u8], source: &str) -> Result<Vec<Document>> {
        let pdf = lopdf::Document::load_mem(bytes)
            .map_err(|e| RagError::Document(format!("failed to parse '{source}': {e}")))?;
        Ok(self.pages(&pdf, source))
    }

    fn pages(&self, pdf: &lopdf::Document, source: &str) -> Vec<Document> {
        let pages = pdf.get_pages();
        let total_pages = pages.len();
        let info = info_metadata(pdf);

        pages
            .keys()
            .enumerate()
            .map(|(index, &number)| {
                let content = pdf.extract_text(&[number]).unwrap_or_else(|e| {
                    warn!(source, page = number, error = %e, "failed to extract page text");
                    String::new()
                });
                debug!(source, page = index, chars = content.len(), "extracted page");
                Document { content, metadata: page_metadata(&info, source, index, total_pages) }
            })
            .collect()
    }
}

fn page_metadata(info: &Metadata, source: &str, page: usize, total_pages: usize) -> Metadata {
    let mut metadata = info.clone();
    metadata.insert("source".into(), Value::from(source));
    metadata.insert("page".into(), Value::from(page));
    metadata.insert("total_pages".into(), Value::from(total_pages));
    metadata
}

/// Read the trailer's `/Info` dictionary, direct or by reference.
fn info_metadata(pdf: &lopdf::Document) -> Metadata {
    let info: Option<&Dictionary> = pdf.trailer.get(b"Info").ok().and_then(|obj| match obj {
        Object::Reference(id) => pdf.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    });

    info.map(|dict| {
        dict.iter()
            .filter_map(|(key, value)| {
                let key = String::from_utf8_lossy(key).to_lowercase();
                match value {
                    Object::String(bytes, _) => Some((key, Value::from(decode_pdf_string(bytes)))),
                    Object::Name(name) => {
                        Some((key, Value::from(String::from_utf8_lossy(name).into_owned())))
                    }
                    Object::Integer(i) => Some((key, Value::from(*i))),
                    Object::Boolean(b) => Some((key, Value::from(*b))),
                    _ => None,
                }
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Decode a PDF text string: UTF-16BE when it starts with a BOM, else bytes as Latin-1.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> =
            rest.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| char::from(b)).collect()
}
