//! Turning uploaded bytes into ordered [`TextUnit`]s.
//!
//! The format is picked from the source id's extension (or the `%PDF-` magic
//! bytes): PDFs are read page by page with `lopdf`, anything else must be
//! UTF-8 text whose pages are separated by form feeds. Pages longer than the
//! chunker's size are split further; positions are numbered 1..n over the
//! whole document.

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use crate::chunking::{Chunker, RecursiveChunker};
use crate::config::RagConfig;
use crate::document::TextUnit;
use crate::error::{RagError, Result};

const PAGE_BREAK: char = '\u{000C}';

/// Document formats the loader understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Text,
}

impl DocumentFormat {
    /// Pick the format from the file extension, falling back to magic bytes.
    pub fn detect(source_id: &str, bytes: &[u8]) -> Self {
        let is_pdf_name = Path::new(source_id)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
        if is_pdf_name || bytes.starts_with(b"%PDF-") { Self::Pdf } else { Self::Text }
    }
}

/// Loads one document into size-bounded text units.
#[derive(Clone)]
pub struct DocumentLoader {
    chunker: Arc<dyn Chunker>,
}

impl std::fmt::Debug for DocumentLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentLoader").field("chunk_size", &self.chunker.chunk_size()).finish()
    }
}

impl Default for DocumentLoader {
    fn default() -> Self {
        Self::from_config(&RagConfig::default())
    }
}

impl DocumentLoader {
    pub fn new(chunker: Arc<dyn Chunker>) -> Self {
        Self { chunker }
    }

    /// A loader using a [`RecursiveChunker`] sized from the config.
    pub fn from_config(config: &RagConfig) -> Self {
        Self::new(Arc::new(RecursiveChunker::new(config.chunk_size, config.chunk_overlap)))
    }

    /// Load a document.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::UnreadableDocument`] if the bytes cannot be parsed
    /// as the detected format.
    pub fn load(&self, bytes: &[u8], source_id: &str) -> Result<Vec<TextUnit>> {
        let format = DocumentFormat::detect(source_id, bytes);
        let pages = match format {
            DocumentFormat::Pdf => pdf_pages(bytes, source_id)?,
            DocumentFormat::Text => text_pages(bytes, source_id)?,
        };

        let units = self.units_from_pages(source_id, &pages);
        debug!(source_id, ?format, pages = pages.len(), units = units.len(), "loaded document");
        Ok(units)
    }

    fn units_from_pages(&self, source_id: &str, pages: &[String]) -> Vec<TextUnit> {
        let mut units = Vec::new();
        for (index, page) in pages.iter().enumerate() {
            let page_number = index + 1;
            let text = page.trim();
            if text.is_empty() {
                continue;
            }
            let pieces = if text.chars().count() <= self.chunker.chunk_size() {
                vec![text.to_string()]
            } else {
                self.chunker.split(text)
            };
            for piece in pieces {
                let position = units.len() + 1;
                units.push(TextUnit::new(piece, source_id, position).on_page(page_number));
            }
        }
        units
    }
}

fn pdf_pages(bytes: &[u8], source_id: &str) -> Result<Vec<String>> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| RagError::unreadable(source_id, e))?;

    let mut pages = Vec::new();
    for page_number in document.get_pages().keys() {
        let text = document
            .extract_text(&[*page_number])
            .map_err(|e| RagError::unreadable(source_id, format!("page {page_number}: {e}")))?;
        pages.push(text);
    }
    Ok(pages)
}

fn text_pages(bytes: &[u8], source_id: &str) -> Result<Vec<String>> {
    let text = std::str::from_utf8(bytes).map_err(|e| RagError::unreadable(source_id, e))?;
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    Ok(text.split(PAGE_BREAK).map(str::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_format_from_extension_and_magic() {
        assert_eq!(DocumentFormat::detect("lease.PDF", b""), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::detect("upload", b"%PDF-1.7 ..."), DocumentFormat::Pdf);
        assert_eq!(DocumentFormat::detect("notes.txt", b"hello"), DocumentFormat::Text);
    }

    #[test]
    fn text_pages_split_on_form_feed_with_monotonic_positions() {
        let loader = DocumentLoader::default();
        let units = loader.load(b"first page\x0c\x0c  third page  ", "notes.txt").unwrap();

        assert_eq!(units.len(), 2);
        assert_eq!(units[0], TextUnit::new("first page", "notes.txt", 1));
        assert_eq!(units[1].content, "third page");
        assert_eq!(units[1].position, 2);
        assert_eq!(units[1].page, 3);
    }

    #[test]
    fn long_pages_are_split_into_several_units() {
        let loader = DocumentLoader::new(Arc::new(RecursiveChunker::new(20, 0)));
        let units = loader.load(b"Clause one applies. Clause two applies.\x0cShort.", "c.txt").unwrap();

        let positions: Vec<usize> = units.iter().map(|u| u.position).collect();
        let pages: Vec<usize> = units.iter().map(|u| u.page).collect();
        assert_eq!(positions, vec![1, 2, 3]);
        assert_eq!(pages, vec![1, 1, 2]);
        assert!(units.iter().all(|u| u.content.chars().count() <= 20));
    }

    #[test]
    fn invalid_utf8_is_unreadable() {
        let loader = DocumentLoader::default();
        let err = loader.load(&[0xff, 0xfe, 0x00, 0xd8], "broken.txt").unwrap_err();
        assert!(matches!(err, RagError::UnreadableDocument { ref source_id, .. } if source_id == "broken.txt"));
    }

    #[test]
    fn corrupt_pdf_is_unreadable() {
        let loader = DocumentLoader::default();
        let err = loader.load(b"definitely not a pdf", "contract.pdf").unwrap_err();
        assert!(matches!(err, RagError::UnreadableDocument { .. }));
    }
}
