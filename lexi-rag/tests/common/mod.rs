#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lexi_rag::{EmbeddingProvider, HashingEmbedder, RagError};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};

/// Hashing embedder that counts calls and can fail on demand.
pub struct CountingEmbedder {
    inner: HashingEmbedder,
    batch_calls: AtomicUsize,
    embedded_texts: AtomicUsize,
    failing_batches: AtomicUsize,
    fail_queries: bool,
}

impl CountingEmbedder {
    pub fn new() -> Self {
        Self {
            inner: HashingEmbedder::default(),
            batch_calls: AtomicUsize::new(0),
            embedded_texts: AtomicUsize::new(0),
            failing_batches: AtomicUsize::new(0),
            fail_queries: false,
        }
    }

    /// Fail the next `n` batch calls.
    pub fn failing_batches(self, n: usize) -> Self {
        self.fail_next_batches(n);
        self
    }

    pub fn fail_next_batches(&self, n: usize) {
        self.failing_batches.store(n, Ordering::SeqCst);
    }

    /// Fail every single-text (query) embedding.
    pub fn failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }

    pub fn batch_calls(&self) -> usize {
        self.batch_calls.load(Ordering::SeqCst)
    }

    pub fn embedded_texts(&self) -> usize {
        self.embedded_texts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for CountingEmbedder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn embed(&self, text: &str) -> lexi_rag::Result<Vec<f32>> {
        if self.fail_queries {
            return Err(RagError::embedding("counting", "query embedding unavailable"));
        }
        self.inner.embed_text(text)
    }

    async fn embed_batch(&self, texts: &[&str]) -> lexi_rag::Result<Vec<Vec<f32>>> {
        self.batch_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.failing_batches.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failing_batches.store(remaining - 1, Ordering::SeqCst);
            return Err(RagError::embedding("counting", "rate limited"));
        }
        self.embedded_texts.fetch_add(texts.len(), Ordering::SeqCst);
        texts.iter().map(|t| self.inner.embed_text(t)).collect()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// Embedder whose vectors are one entry short.
pub struct ShortVectorEmbedder;

#[async_trait]
impl EmbeddingProvider for ShortVectorEmbedder {
    fn name(&self) -> &str {
        "short"
    }

    async fn embed(&self, _text: &str) -> lexi_rag::Result<Vec<f32>> {
        Ok(vec![1.0; 3])
    }

    fn dimensions(&self) -> usize {
        4
    }
}

/// Answers queries with NaN vectors under the default hashing embedder's name.
pub struct NanQueryEmbedder {
    inner: HashingEmbedder,
}

impl NanQueryEmbedder {
    pub fn new() -> Self {
        Self { inner: HashingEmbedder::default() }
    }
}

#[async_trait]
impl EmbeddingProvider for NanQueryEmbedder {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn embed(&self, _text: &str) -> lexi_rag::Result<Vec<f32>> {
        Ok(vec![f32::NAN; self.inner.dimensions()])
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }
}

/// A PDF with one line of Courier text per page.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

/// Plain-text document with form-feed separated pages.
pub fn text_with_pages(pages: &[&str]) -> Vec<u8> {
    pages.join("\u{000C}").into_bytes()
}
