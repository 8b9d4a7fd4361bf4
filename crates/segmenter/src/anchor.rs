use crate::error::Result;
use crate::tokenizer::Tokenizer;
use crate::types::{CharSpan, Span};

/// Char range of one sub-chunk inside its chunk text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubChunkRange<K> {
    /// Identifies the sub-chunk (ordinal or id)
    pub key: K,
    pub span: CharSpan,
}

impl<K> SubChunkRange<K> {
    pub const fn new(key: K, span: CharSpan) -> Self {
        Self { key, span }
    }
}

/// Outcome of anchoring a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor<K> {
    /// The sentence starts inside this sub-chunk
    Anchored(K),
    /// No sub-chunk range contains the sentence start
    Unanchored,
}

impl<K> Anchor<K> {
    pub fn into_option(self) -> Option<K> {
        match self {
            Self::Anchored(key) => Some(key),
            Self::Unanchored => None,
        }
    }

    pub const fn is_anchored(&self) -> bool {
        matches!(self, Self::Anchored(_))
    }
}

/// Find the sub-chunk whose range contains `char_start`.
///
/// `ranges` must be ordered and disjoint, which holds for anything built by
/// [`reconstruct_char_spans`].
pub fn resolve<K: Clone>(char_start: usize, ranges: &[SubChunkRange<K>]) -> Anchor<K> {
    let idx = ranges.partition_point(|range| range.span.end <= char_start);
    match ranges.get(idx) {
        Some(range) if range.span.contains(char_start) => Anchor::Anchored(range.key.clone()),
        _ => Anchor::Unanchored,
    }
}

/// Rebuild the char range of each token window inside the decoded chunk text.
///
/// `windows` must partition `tokens` in order. The range of window `k` ends at
/// the char length of `decode(tokens[..end_k])`; boundaries are kept monotone
/// and clamped to `chunk_char_len`, so the ranges tile `[0, chunk_char_len)`.
/// A separator between two windows lands at the start of the later range.
pub fn reconstruct_char_spans<T: Tokenizer>(
    tokenizer: &T,
    tokens: &[T::Token],
    windows: &[Span],
    chunk_char_len: usize,
) -> Result<Vec<CharSpan>> {
    let mut spans = Vec::with_capacity(windows.len());
    let mut boundary = 0;

    for window in windows {
        let end = if window.end >= tokens.len() {
            chunk_char_len
        } else {
            tokenizer.decode(&tokens[..window.end])?.chars().count()
        };
        let end = end.clamp(boundary, chunk_char_len.max(boundary));
        spans.push(CharSpan::new(boundary, end));
        boundary = end;
    }

    Ok(spans)
}
