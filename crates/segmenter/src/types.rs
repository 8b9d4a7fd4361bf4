use serde::{Deserialize, Serialize};

/// Half-open range `[start, end)` over token indices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of tokens covered
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Shift a span relative to a parent window into the parent's coordinates
    #[must_use]
    pub const fn offset(&self, base: usize) -> Self {
        Self {
            start: self.start + base,
            end: self.end + base,
        }
    }
}

/// Half-open range `[start, end)` over character offsets of one text buffer
///
/// Offsets count Unicode scalar values, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CharSpan {
    pub start: usize,
    pub end: usize,
}

impl CharSpan {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Build from an inclusive-inclusive pair `[start, end_incl]`
    #[must_use]
    pub const fn from_inclusive(start: usize, end_incl: usize) -> Self {
        Self {
            start,
            end: end_incl + 1,
        }
    }

    /// Last covered offset, or `None` for an empty span
    #[must_use]
    pub const fn end_inclusive(&self) -> Option<usize> {
        if self.end > self.start {
            Some(self.end - 1)
        } else {
            None
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Check if the span covers a char offset
    #[must_use]
    pub const fn contains(&self, offset: usize) -> bool {
        offset >= self.start && offset < self.end
    }
}

/// Largest fixed-size token window of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Hierarchical id (`chunk_000001`)
    pub id: String,

    /// Absolute 1-based ordinal across the corpus
    pub order_idx: usize,

    /// Source label (usually the file name)
    pub source: String,

    /// Token span within the document
    pub token_span: Span,

    /// Decoded chunk text
    pub text: String,
}

impl Chunk {
    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_span.len()
    }

    /// Length of the chunk text in chars
    #[must_use]
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Fixed-size token window nested in a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubChunk {
    /// Hierarchical id (`sc_000001_001`)
    pub id: String,

    pub chunk_id: String,

    /// 1-based ordinal within the chunk
    pub order_idx: usize,

    /// Token span relative to the chunk start
    pub token_span: Span,

    /// Token span within the document
    pub absolute_token_span: Span,

    /// Reconstructed char span within the chunk text
    pub char_span: CharSpan,

    /// Decoded sub-chunk text
    pub text: String,
}

impl SubChunk {
    #[must_use]
    pub const fn token_count(&self) -> usize {
        self.token_span.len()
    }
}

/// Sentence produced by the boundary scan over a chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    /// Hierarchical id (`s_000001_002_017`, `000` in the middle when unanchored)
    pub id: String,

    pub chunk_id: String,

    /// Containing sub-chunk, `None` when unanchored
    pub sub_chunk_id: Option<String>,

    /// 1-based ordinal within the chunk
    pub order_idx: usize,

    /// Span of the trimmed sentence within the chunk text
    pub char_span: CharSpan,

    pub text: String,
}

impl Sentence {
    #[must_use]
    pub const fn is_anchored(&self) -> bool {
        self.sub_chunk_id.is_some()
    }
}

/// Every record emitted for one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedChunk {
    pub chunk: Chunk,
    pub sub_chunks: Vec<SubChunk>,
    pub sentences: Vec<Sentence>,
}

impl SegmentedChunk {
    /// Number of sentences resolved to a sub-chunk
    #[must_use]
    pub fn anchored_count(&self) -> usize {
        self.sentences.iter().filter(|s| s.is_anchored()).count()
    }

    /// Sum of the sub-chunk token counts
    #[must_use]
    pub fn subchunk_token_sum(&self) -> usize {
        self.sub_chunks.iter().map(SubChunk::token_count).sum()
    }
}

/// Result of segmenting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SegmentedDocument {
    pub source: String,

    /// Token count of the whole document
    pub total_tokens: usize,

    pub chunks: Vec<SegmentedChunk>,

    /// Chunk-ordinal base to pass for the next document
    pub next_base: usize,
}

impl SegmentedDocument {
    #[must_use]
    pub fn sentence_count(&self) -> usize {
        self.chunks.iter().map(|c| c.sentences.len()).sum()
    }

    #[must_use]
    pub fn subchunk_count(&self) -> usize {
        self.chunks.iter().map(|c| c.sub_chunks.len()).sum()
    }

    #[must_use]
    pub fn anchored_count(&self) -> usize {
        self.chunks.iter().map(SegmentedChunk::anchored_count).sum()
    }

    /// Share of anchored sentences, 1.0 when there are none
    #[must_use]
    pub fn anchoring_ratio(&self) -> f64 {
        ratio(self.anchored_count(), self.sentence_count())
    }
}

/// Rolling window of consecutive sentences within one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceWindow {
    /// Hierarchical id (`w2_000001_001`)
    pub id: String,

    pub chunk_id: String,

    /// Number of sentences joined
    pub size: usize,

    /// 1-based position of the first sentence
    pub order_idx: usize,

    pub first_sentence_id: String,

    pub last_sentence_id: String,

    pub text: String,
}

pub(crate) fn ratio(part: usize, total: usize) -> f64 {
    if total == 0 {
        1.0
    } else {
        part as f64 / total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_len_and_offset() {
        let span = Span::new(200, 400);
        assert_eq!(span.len(), 200);
        assert!(!span.is_empty());
        assert_eq!(span.offset(8000), Span::new(8200, 8400));
        assert!(Span::new(3, 3).is_empty());
    }

    #[test]
    fn test_char_span_inclusive_conversion() {
        let span = CharSpan::from_inclusive(0, 9);
        assert_eq!(span, CharSpan::new(0, 10));
        assert_eq!(span.end_inclusive(), Some(9));
        assert_eq!(CharSpan::new(4, 4).end_inclusive(), None);
    }

    #[test]
    fn test_char_span_contains() {
        let span = CharSpan::new(10, 20);
        assert!(span.contains(10));
        assert!(span.contains(19));
        assert!(!span.contains(20));
        assert!(!span.contains(9));
    }

    #[test]
    fn test_ratio_of_empty_set_is_one() {
        assert_eq!(ratio(0, 0), 1.0);
        assert_eq!(ratio(1, 4), 0.25);
    }
}
