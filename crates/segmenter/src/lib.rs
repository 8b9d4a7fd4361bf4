//! # Corpus Segmenter
//!
//! Deterministic three-level segmentation of long texts for indexing.
//!
//! ## Philosophy
//!
//! The segmenter produces records whose lineage can be checked mechanically:
//! - Token windows partition the document exactly (no gaps, no overlaps)
//! - Sub-chunk token counts always sum to their chunk's count
//! - Sentence spans are emitted by the scan itself, never searched for
//! - Ids are a pure function of ordinals and a caller-owned base
//!
//! ## Architecture
//!
//! ```text
//! Raw Text
//!     │
//!     ├──> Tokenizer::encode → tokens
//!     │
//!     ├──> Window Slicer (chunk_window) → chunk spans
//!     │
//!     ├──> Per chunk (parallel, no shared state)
//!     │    ├─> decode chunk text
//!     │    ├─> Window Slicer (subchunk_window) → sub-chunk spans
//!     │    ├─> reconstruct sub-chunk char ranges
//!     │    ├─> Sentence Splitter (simple | strict)
//!     │    └─> Anchor Resolver: sentence start → sub-chunk
//!     │
//!     ├──> ID Assigner (ordered pass, base + ordinal)
//!     │
//!     └──> Invariant Verifier (advisory report)
//! ```
//!
//! ## Example
//!
//! ```rust
//! use corpus_segmenter::{Segmenter, SegmenterConfig, WhitespaceTokenizer};
//!
//! let config = SegmenterConfig::default().with_windows(8, 4);
//! let segmenter = Segmenter::new(config, WhitespaceTokenizer).unwrap();
//!
//! let doc = segmenter
//!     .segment("intro.txt", "Evaṃ me sutaṃ. Ekaṃ samayaṃ bhagavā sāvatthiyaṃ viharati.", 0)
//!     .unwrap();
//!
//! for chunk in &doc.chunks {
//!     for sentence in &chunk.sentences {
//!         println!("{} [{:?}] {}", sentence.id, sentence.sub_chunk_id, sentence.text);
//!     }
//! }
//! assert!(segmenter.verify(&doc).is_healthy());
//! ```

pub mod anchor;
mod config;
mod engine;
mod error;
pub mod ids;
pub mod slicer;
pub mod splitter;
mod tokenizer;
mod types;
pub mod verify;
pub mod windows;

pub use anchor::{resolve, Anchor, SubChunkRange};
pub use config::{
    SegmenterConfig, SentencePolicy, DEFAULT_ANCHORING_THRESHOLD, DEFAULT_CHUNK_WINDOW,
    DEFAULT_SUBCHUNK_WINDOW,
};
pub use engine::Segmenter;
pub use error::{Result, SegmenterError};
pub use ids::HierarchicalIds;
pub use slicer::slice;
pub use splitter::{split, SentenceSplitter, SplitSentence};
pub use tokenizer::{Tokenizer, WhitespaceTokenizer};
pub use types::{
    CharSpan, Chunk, SegmentedChunk, SegmentedDocument, Sentence, SentenceWindow, Span, SubChunk,
};
pub use verify::{verify, VerificationReport};
pub use windows::{sentence_windows, DEFAULT_WINDOW_SIZES};
