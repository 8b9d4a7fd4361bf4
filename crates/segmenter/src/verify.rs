//! Post-hoc invariant diagnostics.
//!
//! Verification reports problems and never fails: it is tooling for tests and
//! monitoring, not a gate in front of emission.

use crate::ids;
use crate::types::{ratio, Chunk, SegmentedChunk, Sentence};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Diagnostics for a set of emitted chunks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Anchoring ratio under which a chunk or the whole set is flagged
    pub threshold: f64,
    pub chunk_count: usize,
    pub subchunk_count: usize,
    pub sentence_count: usize,
    pub anchored_count: usize,
    pub anchoring_ratio: f64,
    pub below_threshold: bool,
    pub chunks: Vec<ChunkDiagnostics>,
    pub sentence_violations: Vec<SentenceViolation>,
    pub partition_violations: Vec<PartitionViolation>,
}

impl VerificationReport {
    /// Chunks whose sub-chunk token sum differs from their own count
    pub fn token_sum_failures(&self) -> impl Iterator<Item = &ChunkDiagnostics> {
        self.chunks.iter().filter(|c| !c.token_sum_ok)
    }

    /// Chunks flagged for a low anchoring ratio
    pub fn flagged_chunks(&self) -> impl Iterator<Item = &ChunkDiagnostics> {
        self.chunks.iter().filter(|c| c.below_threshold)
    }

    /// True when every check passed and anchoring meets the threshold
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        !self.below_threshold
            && self.sentence_violations.is_empty()
            && self.partition_violations.is_empty()
            && self.chunks.iter().all(|c| c.token_sum_ok && c.token_span_ok)
    }
}

/// Per-chunk diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkDiagnostics {
    pub chunk_id: String,
    pub token_count: usize,
    pub subchunk_token_sum: usize,
    pub token_sum_ok: bool,
    /// Chunk covers at least one token
    pub token_span_ok: bool,
    pub sentence_count: usize,
    pub anchored_count: usize,
    pub anchoring_ratio: f64,
    pub below_threshold: bool,
}

/// Kind of per-sentence violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentenceViolationKind {
    /// Span is empty or reaches past the chunk text
    CharBounds,
    /// Span starts before the previous sentence ended
    Ordering,
    /// `sub_chunk_id` names no sub-chunk of the chunk
    DanglingAnchor,
    /// Anchored sub-chunk does not contain the sentence start
    AnchorMismatch,
    /// Sentence id disagrees with its ordinals
    IdMismatch,
}

impl SentenceViolationKind {
    /// Name matching the serialized form
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CharBounds => "char_bounds",
            Self::Ordering => "ordering",
            Self::DanglingAnchor => "dangling_anchor",
            Self::AnchorMismatch => "anchor_mismatch",
            Self::IdMismatch => "id_mismatch",
        }
    }
}

impl fmt::Display for SentenceViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceViolation {
    pub sentence_id: String,
    pub chunk_id: String,
    pub kind: SentenceViolationKind,
    pub detail: String,
}

/// Kind of partition violation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartitionViolationKind {
    /// Chunk token spans of one source leave a gap or overlap
    ChunkTokens,
    /// Sub-chunk token spans do not tile their chunk
    SubChunkTokens,
    /// Sub-chunk char span reaches past the chunk text
    SubChunkChars,
}

impl PartitionViolationKind {
    /// Name matching the serialized form
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChunkTokens => "chunk_tokens",
            Self::SubChunkTokens => "sub_chunk_tokens",
            Self::SubChunkChars => "sub_chunk_chars",
        }
    }
}

impl fmt::Display for PartitionViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionViolation {
    /// Chunk or sub-chunk id
    pub id: String,
    pub kind: PartitionViolationKind,
    pub detail: String,
}

/// Run every check over `chunks`, given in emission order
#[must_use]
pub fn verify(chunks: &[SegmentedChunk], threshold: f64) -> VerificationReport {
    let mut report = VerificationReport {
        threshold,
        chunk_count: chunks.len(),
        subchunk_count: 0,
        sentence_count: 0,
        anchored_count: 0,
        anchoring_ratio: 1.0,
        below_threshold: false,
        chunks: Vec::with_capacity(chunks.len()),
        sentence_violations: Vec::new(),
        partition_violations: Vec::new(),
    };

    check_chunk_partition(chunks, &mut report.partition_violations);

    for segmented in chunks {
        let diagnostics = chunk_diagnostics(segmented, threshold);
        report.subchunk_count += segmented.sub_chunks.len();
        report.sentence_count += diagnostics.sentence_count;
        report.anchored_count += diagnostics.anchored_count;
        report.chunks.push(diagnostics);

        check_subchunk_partition(segmented, &mut report.partition_violations);
        check_sentences(segmented, &mut report.sentence_violations);
    }

    report.anchoring_ratio = ratio(report.anchored_count, report.sentence_count);
    report.below_threshold = report.anchoring_ratio < threshold;

    if report.below_threshold {
        log::warn!(
            "Anchoring ratio {:.4} is below threshold {:.4} ({} of {} sentences anchored)",
            report.anchoring_ratio,
            threshold,
            report.anchored_count,
            report.sentence_count
        );
    }

    report
}

fn chunk_diagnostics(segmented: &SegmentedChunk, threshold: f64) -> ChunkDiagnostics {
    let chunk = &segmented.chunk;
    let token_count = chunk.token_count();
    let subchunk_token_sum = segmented.subchunk_token_sum();
    let sentence_count = segmented.sentences.len();
    let anchored_count = segmented.anchored_count();
    let anchoring_ratio = ratio(anchored_count, sentence_count);

    ChunkDiagnostics {
        chunk_id: chunk.id.clone(),
        token_count,
        subchunk_token_sum,
        token_sum_ok: subchunk_token_sum == token_count,
        token_span_ok: !chunk.token_span.is_empty(),
        sentence_count,
        anchored_count,
        anchoring_ratio,
        below_threshold: anchoring_ratio < threshold,
    }
}

fn check_chunk_partition(chunks: &[SegmentedChunk], out: &mut Vec<PartitionViolation>) {
    let mut previous: Option<&Chunk> = None;

    for segmented in chunks {
        let chunk = &segmented.chunk;
        // A chunk starting at token 0 opens a new document, even when two
        // documents share a source name.
        let detail = match previous {
            _ if chunk.token_span.start == 0 => None,
            None => Some(format!(
                "first chunk starts at token {} instead of 0",
                chunk.token_span.start
            )),
            Some(prev) if prev.source != chunk.source => Some(format!(
                "chunk starts at token {} but opens '{}' after '{}'",
                chunk.token_span.start, chunk.source, prev.source
            )),
            Some(prev) if prev.token_span.end != chunk.token_span.start => Some(format!(
                "chunk starts at token {} but previous chunk of '{}' ended at {}",
                chunk.token_span.start, chunk.source, prev.token_span.end
            )),
            Some(_) => None,
        };

        if let Some(detail) = detail {
            out.push(PartitionViolation {
                id: chunk.id.clone(),
                kind: PartitionViolationKind::ChunkTokens,
                detail,
            });
        }
        previous = Some(chunk);
    }
}

fn check_subchunk_partition(segmented: &SegmentedChunk, out: &mut Vec<PartitionViolation>) {
    let chunk = &segmented.chunk;
    let char_len = chunk.char_len();
    let mut expected = 0;

    for sub in &segmented.sub_chunks {
        if sub.token_span.start != expected || sub.token_span.is_empty() {
            out.push(PartitionViolation {
                id: sub.id.clone(),
                kind: PartitionViolationKind::SubChunkTokens,
                detail: format!(
                    "relative span {}..{} does not continue at token {}",
                    sub.token_span.start, sub.token_span.end, expected
                ),
            });
        }
        if sub.absolute_token_span != sub.token_span.offset(chunk.token_span.start) {
            out.push(PartitionViolation {
                id: sub.id.clone(),
                kind: PartitionViolationKind::SubChunkTokens,
                detail: format!(
                    "absolute span {}..{} disagrees with chunk start {}",
                    sub.absolute_token_span.start,
                    sub.absolute_token_span.end,
                    chunk.token_span.start
                ),
            });
        }
        if sub.char_span.end > char_len || sub.char_span.start > sub.char_span.end {
            out.push(PartitionViolation {
                id: sub.id.clone(),
                kind: PartitionViolationKind::SubChunkChars,
                detail: format!(
                    "char span {}..{} outside chunk text of {} chars",
                    sub.char_span.start, sub.char_span.end, char_len
                ),
            });
        }
        expected = sub.token_span.end;
    }

    if expected != chunk.token_count() {
        out.push(PartitionViolation {
            id: chunk.id.clone(),
            kind: PartitionViolationKind::SubChunkTokens,
            detail: format!(
                "sub-chunks end at token {expected}, chunk has {}",
                chunk.token_count()
            ),
        });
    }
}

fn check_sentences(segmented: &SegmentedChunk, out: &mut Vec<SentenceViolation>) {
    let chunk = &segmented.chunk;
    let char_len = chunk.char_len();
    let mut previous_end = 0;

    let violation = |sentence: &Sentence, kind, detail: String| SentenceViolation {
        sentence_id: sentence.id.clone(),
        chunk_id: chunk.id.clone(),
        kind,
        detail,
    };

    for sentence in &segmented.sentences {
        let span = sentence.char_span;
        if span.is_empty() || span.end > char_len {
            out.push(violation(
                sentence,
                SentenceViolationKind::CharBounds,
                format!("span {}..{} outside [0, {char_len})", span.start, span.end),
            ));
        }
        if span.start < previous_end {
            out.push(violation(
                sentence,
                SentenceViolationKind::Ordering,
                format!("starts at {} before previous end {previous_end}", span.start),
            ));
        }
        previous_end = previous_end.max(span.end);

        let sub_ordinal = match &sentence.sub_chunk_id {
            None => None,
            Some(sub_id) => match segmented.sub_chunks.iter().find(|s| &s.id == sub_id) {
                None => {
                    out.push(violation(
                        sentence,
                        SentenceViolationKind::DanglingAnchor,
                        format!("no sub-chunk '{sub_id}' in chunk"),
                    ));
                    continue;
                }
                Some(sub) => {
                    if !sub.char_span.contains(span.start) {
                        out.push(violation(
                            sentence,
                            SentenceViolationKind::AnchorMismatch,
                            format!(
                                "start {} outside {} range {}..{}",
                                span.start, sub.id, sub.char_span.start, sub.char_span.end
                            ),
                        ));
                    }
                    Some(sub.order_idx)
                }
            },
        };

        let expected_id = ids::sentence_id(chunk.order_idx, sub_ordinal, sentence.order_idx);
        if sentence.id != expected_id {
            out.push(violation(
                sentence,
                SentenceViolationKind::IdMismatch,
                format!("expected id {expected_id}"),
            ));
        }
    }
}
