//! Page splitting strategies.
//!
//! Loaders emit one string per page. Pages that exceed the configured size are
//! handed to a [`Chunker`], by default a [`RecursiveChunker`] that splits by
//! paragraphs, sentences, then words.
//!
//! All sizes are counted in characters, and every split lands on a character
//! boundary.

/// A strategy for splitting a page of text into size-bounded pieces.
pub trait Chunker: Send + Sync {
    /// Split `text` into pieces, in reading order.
    ///
    /// Returns an empty `Vec` for blank input. Pieces are trimmed and never empty.
    fn split(&self, text: &str) -> Vec<String>;

    /// Largest piece this chunker produces, in characters.
    fn chunk_size(&self) -> usize;
}

/// Splits text hierarchically: paragraphs → sentences → words → characters.
///
/// First splits by paragraph separators (`\n\n`). If a paragraph exceeds
/// `chunk_size`, splits by sentence boundaries (`. `, `! `, `? `), then by
/// lines and words. Only a single word longer than `chunk_size` falls back to
/// a hard character split, which is where `chunk_overlap` applies.
///
/// # Example
///
/// ```rust,ignore
/// use lexi_rag::RecursiveChunker;
///
/// let chunker = RecursiveChunker::new(1500, 150);
/// let pieces = chunker.split(&page_text);
/// ```
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

const SEPARATORS: [&str; 6] = ["\n\n", ". ", "! ", "? ", "\n", " "];

impl RecursiveChunker {
    /// Create a new `RecursiveChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - maximum number of characters per piece
    /// * `chunk_overlap` - overlap used when a single word must be cut
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }
}

impl Chunker for RecursiveChunker {
    fn split(&self, text: &str) -> Vec<String> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }
        split_and_merge(text, self.chunk_size, self.chunk_overlap, &SEPARATORS)
            .into_iter()
            .map(|piece| piece.trim().to_string())
            .filter(|piece| !piece.is_empty())
            .collect()
    }

    fn chunk_size(&self) -> usize {
        self.chunk_size
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split text by a separator, then merge segments into pieces that respect
/// `chunk_size`. If a segment exceeds `chunk_size`, it is split further
/// using the next-level separator.
fn split_and_merge(
    text: &str,
    chunk_size: usize,
    chunk_overlap: usize,
    separators: &[&str],
) -> Vec<String> {
    if char_len(text) <= chunk_size {
        return vec![text.to_string()];
    }
    let Some((separator, remaining_separators)) = separators.split_first() else {
        return split_by_size(text, chunk_size, chunk_overlap);
    };

    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for segment in split_keeping_separator(text, separator) {
        let segment_len = char_len(segment);
        if current.is_empty() || current_len + segment_len <= chunk_size {
            current.push_str(segment);
            current_len += segment_len;
            continue;
        }
        flush(&mut pieces, &current, current_len, chunk_size, chunk_overlap, remaining_separators);
        current = segment.to_string();
        current_len = segment_len;
    }

    if !current.is_empty() {
        flush(&mut pieces, &current, current_len, chunk_size, chunk_overlap, remaining_separators);
    }

    pieces
}

fn flush(
    pieces: &mut Vec<String>,
    current: &str,
    current_len: usize,
    chunk_size: usize,
    chunk_overlap: usize,
    remaining_separators: &[&str],
) {
    if current_len > chunk_size {
        pieces.extend(split_and_merge(current, chunk_size, chunk_overlap, remaining_separators));
    } else {
        pieces.push(current.to_string());
    }
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Character-based splitting with overlap.
fn split_by_size(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() || chunk_size == 0 {
        return Vec::new();
    }

    let step = chunk_size.saturating_sub(chunk_overlap).max(1);
    let mut pieces = Vec::new();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        pieces.push(chars[start..end].iter().collect());
        if end == chars.len() {
            break;
        }
        start += step;
    }

    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_a_single_piece() {
        let chunker = RecursiveChunker::new(100, 10);
        assert_eq!(chunker.split("  A short clause.  "), vec!["A short clause."]);
        assert!(chunker.split("   \n ").is_empty());
    }

    #[test]
    fn recursive_prefers_paragraph_then_sentence_boundaries() {
        let chunker = RecursiveChunker::new(40, 5);
        let text = "The tenant pays rent monthly.\n\nThe landlord repairs the roof. Either party may terminate.";
        let pieces = chunker.split(text);

        assert_eq!(
            pieces,
            vec![
                "The tenant pays rent monthly.",
                "The landlord repairs the roof.",
                "Either party may terminate.",
            ]
        );
        assert!(pieces.iter().all(|p| p.chars().count() <= 40));
    }

    #[test]
    fn words_are_kept_whole_with_spaces() {
        let chunker = RecursiveChunker::new(12, 0);
        let pieces = chunker.split("alpha beta gamma delta");
        assert_eq!(pieces, vec!["alpha beta", "gamma delta"]);
    }

    #[test]
    fn hard_split_handles_multibyte_characters() {
        let chunker = RecursiveChunker::new(4, 1);
        let pieces = chunker.split("ééééééé");
        assert_eq!(pieces, vec!["éééé", "éééé"]);
        assert!(pieces.iter().all(|p| p.chars().count() <= 4));
    }

    #[test]
    fn oversized_word_falls_back_to_character_split() {
        let chunker = RecursiveChunker::new(5, 2);
        let pieces = chunker.split("abcdefghij");
        assert_eq!(pieces, vec!["abcde", "defgh", "ghij"]);
    }
}
