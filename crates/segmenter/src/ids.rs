//! Hierarchical identifiers.
//!
//! Ids are pure formatting of ordinals:
//!
//! ```text
//! chunk_000042            chunk 42
//! sc_000042_003           sub-chunk 3 of chunk 42
//! s_000042_003_017        sentence 17 of chunk 42, anchored in sub-chunk 3
//! s_000042_000_018        sentence 18 of chunk 42, unanchored
//! w2_000042_005           2-sentence window starting at sentence 5
//! ```
//!
//! Widths are minimums: larger ordinals print in full, and the `_`
//! separators keep every field unambiguous.

use serde::{Deserialize, Serialize};

pub const CHUNK_PREFIX: &str = "chunk_";
pub const SUBCHUNK_PREFIX: &str = "sc_";
pub const SENTENCE_PREFIX: &str = "s_";
pub const WINDOW_PREFIX: &str = "w";

pub const CHUNK_PAD: usize = 6;
pub const SUBCHUNK_PAD: usize = 3;
pub const SENTENCE_PAD: usize = 3;

/// Sub-chunk ordinal written into ids of unanchored sentences
pub const UNANCHORED_ORDINAL: usize = 0;

/// Ids of one sentence and its ancestors
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HierarchicalIds {
    pub chunk_id: String,
    /// `None` when the sentence is unanchored
    pub subchunk_id: Option<String>,
    pub sentence_id: String,
}

/// Absolute chunk ordinal for the `chunk_in_file`-th (1-based) chunk of a
/// document whose caller-owned base is `base`
#[must_use]
pub const fn absolute_ordinal(base: usize, chunk_in_file: usize) -> usize {
    base + chunk_in_file
}

#[must_use]
pub fn chunk_id(chunk: usize) -> String {
    format!("{CHUNK_PREFIX}{chunk:0width$}", width = CHUNK_PAD)
}

#[must_use]
pub fn subchunk_id(chunk: usize, sub: usize) -> String {
    format!(
        "{SUBCHUNK_PREFIX}{chunk:0cw$}_{sub:0sw$}",
        cw = CHUNK_PAD,
        sw = SUBCHUNK_PAD
    )
}

/// Sentence id; `sub = None` writes the unanchored sentinel
#[must_use]
pub fn sentence_id(chunk: usize, sub: Option<usize>, sentence: usize) -> String {
    let sub = sub.unwrap_or(UNANCHORED_ORDINAL);
    format!(
        "{SENTENCE_PREFIX}{chunk:0cw$}_{sub:0sw$}_{sentence:0nw$}",
        cw = CHUNK_PAD,
        sw = SUBCHUNK_PAD,
        nw = SENTENCE_PAD
    )
}

#[must_use]
pub fn window_id(size: usize, chunk: usize, order: usize) -> String {
    format!(
        "{WINDOW_PREFIX}{size}_{chunk:0cw$}_{order:0nw$}",
        cw = CHUNK_PAD,
        nw = SENTENCE_PAD
    )
}

/// Derive the ids of one sentence from its ordinal tuple
#[must_use]
pub fn assign(
    base: usize,
    chunk_in_file: usize,
    sub: usize,
    sentence: usize,
    anchored: bool,
) -> HierarchicalIds {
    let chunk = absolute_ordinal(base, chunk_in_file);
    let sub = anchored.then_some(sub);
    HierarchicalIds {
        chunk_id: chunk_id(chunk),
        subchunk_id: sub.map(|sub| subchunk_id(chunk, sub)),
        sentence_id: sentence_id(chunk, sub, sentence),
    }
}

/// Ordinals recovered from a sentence id
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SentenceKey {
    pub chunk: usize,
    /// `None` for the unanchored sentinel
    pub sub: Option<usize>,
    pub sentence: usize,
}

impl SentenceKey {
    /// Parse `s_CCCCCC_SSS_NNN`
    #[must_use]
    pub fn parse(id: &str) -> Option<Self> {
        let rest = id.strip_prefix(SENTENCE_PREFIX)?;
        let mut parts = rest.split('_');
        let chunk = parse_ordinal(parts.next()?)?;
        let sub = parse_ordinal(parts.next()?)?;
        let sentence = parse_ordinal(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            chunk,
            sub: (sub != UNANCHORED_ORDINAL).then_some(sub),
            sentence,
        })
    }
}

fn parse_ordinal(field: &str) -> Option<usize> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
