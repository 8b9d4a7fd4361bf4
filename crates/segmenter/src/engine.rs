use crate::anchor::{reconstruct_char_spans, resolve, SubChunkRange};
use crate::config::SegmenterConfig;
use crate::error::Result;
use crate::ids;
use crate::slicer::slice;
use crate::splitter::SentenceSplitter;
use crate::tokenizer::Tokenizer;
use crate::types::{
    CharSpan, Chunk, SegmentedChunk, SegmentedDocument, Sentence, Span, SubChunk,
};
use crate::verify::{verify, VerificationReport};
use rayon::prelude::*;

/// Main segmentation interface
///
/// Holds only immutable configuration and the tokenizer capability. The
/// running chunk-ordinal base is passed per call and reported back through
/// [`SegmentedDocument::next_base`].
#[derive(Debug, Clone)]
pub struct Segmenter<T> {
    config: SegmenterConfig,
    splitter: SentenceSplitter,
    tokenizer: T,
}

/// Per-chunk result before ids are assigned
struct ChunkDraft {
    token_span: Span,
    text: String,
    sub_chunks: Vec<SubChunkDraft>,
    sentences: Vec<SentenceDraft>,
}

struct SubChunkDraft {
    token_span: Span,
    char_span: CharSpan,
    text: String,
}

struct SentenceDraft {
    char_span: CharSpan,
    text: String,
    /// 1-based sub-chunk ordinal, `None` when unanchored
    anchor: Option<usize>,
}

impl<T: Tokenizer> Segmenter<T> {
    /// Create a segmenter, rejecting invalid configuration
    pub fn new(config: SegmenterConfig, tokenizer: T) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            splitter: SentenceSplitter::new(config.policy),
            config,
            tokenizer,
        })
    }

    pub const fn config(&self) -> &SegmenterConfig {
        &self.config
    }

    pub const fn tokenizer(&self) -> &T {
        &self.tokenizer
    }

    /// Segment one document.
    ///
    /// `base` is the number of chunks already emitted for earlier documents of
    /// the corpus; the first chunk of this document gets ordinal `base + 1`.
    pub fn segment(&self, source: &str, text: &str, base: usize) -> Result<SegmentedDocument> {
        let tokens = self.tokenizer.encode(text)?;
        self.segment_tokens(source, &tokens, base)
    }

    /// Segment an already tokenized document
    pub fn segment_tokens(
        &self,
        source: &str,
        tokens: &[T::Token],
        base: usize,
    ) -> Result<SegmentedDocument> {
        let spans = slice(tokens.len(), self.config.chunk_window)?;

        let drafts: Vec<ChunkDraft> = if self.config.parallel && spans.len() > 1 {
            spans
                .par_iter()
                .map(|span| self.draft_chunk(&tokens[span.start..span.end], *span))
                .collect::<Result<_>>()?
        } else {
            spans
                .iter()
                .map(|span| self.draft_chunk(&tokens[span.start..span.end], *span))
                .collect::<Result<_>>()?
        };

        // Numbering is a running sequence, so it stays a single ordered pass.
        let chunks: Vec<SegmentedChunk> = drafts
            .into_iter()
            .enumerate()
            .map(|(idx, draft)| draft.into_records(source, base, idx + 1))
            .collect();

        let document = SegmentedDocument {
            source: source.to_string(),
            total_tokens: tokens.len(),
            next_base: base + chunks.len(),
            chunks,
        };

        log::debug!(
            "Segmented '{}': {} tokens, {} chunks, {} sub-chunks, {} sentences ({} anchored)",
            source,
            document.total_tokens,
            document.chunks.len(),
            document.subchunk_count(),
            document.sentence_count(),
            document.anchored_count()
        );

        let ratio = document.anchoring_ratio();
        if ratio < self.config.anchoring_threshold {
            log::warn!(
                "Anchoring ratio for '{}' is {:.4}, below {:.4}",
                source,
                ratio,
                self.config.anchoring_threshold
            );
        }

        Ok(document)
    }

    /// Segment several documents in order, threading the chunk base
    pub fn segment_corpus<'a, I>(&self, documents: I, base: usize) -> Result<Vec<SegmentedDocument>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut next_base = base;
        let mut out = Vec::new();
        for (source, text) in documents {
            let document = self.segment(source, text, next_base)?;
            next_base = document.next_base;
            out.push(document);
        }
        Ok(out)
    }

    /// Run the invariant verifier with the configured threshold
    pub fn verify(&self, document: &SegmentedDocument) -> VerificationReport {
        verify(&document.chunks, self.config.anchoring_threshold)
    }

    fn draft_chunk(&self, tokens: &[T::Token], token_span: Span) -> Result<ChunkDraft> {
        let text = self.tokenizer.decode(tokens)?;
        let char_len = text.chars().count();

        let windows = slice(tokens.len(), self.config.subchunk_window)?;
        let char_spans = reconstruct_char_spans(&self.tokenizer, tokens, &windows, char_len)?;

        let mut sub_chunks = Vec::with_capacity(windows.len());
        let mut ranges = Vec::with_capacity(windows.len());
        for (idx, (window, char_span)) in windows.iter().zip(char_spans).enumerate() {
            ranges.push(SubChunkRange::new(idx + 1, char_span));
            sub_chunks.push(SubChunkDraft {
                token_span: *window,
                char_span,
                text: self.tokenizer.decode(&tokens[window.start..window.end])?,
            });
        }

        let sentences = self
            .splitter
            .split(&text)
            .into_iter()
            .map(|sentence| SentenceDraft {
                anchor: resolve(sentence.span.start, &ranges).into_option(),
                char_span: sentence.span,
                text: sentence.text,
            })
            .collect();

        Ok(ChunkDraft {
            token_span,
            text,
            sub_chunks,
            sentences,
        })
    }
}

impl ChunkDraft {
    fn into_records(self, source: &str, base: usize, chunk_in_file: usize) -> SegmentedChunk {
        let ordinal = ids::absolute_ordinal(base, chunk_in_file);
        let chunk_id = ids::chunk_id(ordinal);
        let chunk_start = self.token_span.start;

        let sub_chunks = self
            .sub_chunks
            .into_iter()
            .enumerate()
            .map(|(idx, sub)| SubChunk {
                id: ids::subchunk_id(ordinal, idx + 1),
                chunk_id: chunk_id.clone(),
                order_idx: idx + 1,
                token_span: sub.token_span,
                absolute_token_span: sub.token_span.offset(chunk_start),
                char_span: sub.char_span,
                text: sub.text,
            })
            .collect();

        let sentences = self
            .sentences
            .into_iter()
            .enumerate()
            .map(|(idx, sentence)| {
                let assigned = ids::assign(
                    base,
                    chunk_in_file,
                    sentence.anchor.unwrap_or(ids::UNANCHORED_ORDINAL),
                    idx + 1,
                    sentence.anchor.is_some(),
                );
                Sentence {
                    id: assigned.sentence_id,
                    chunk_id: chunk_id.clone(),
                    sub_chunk_id: assigned.subchunk_id,
                    order_idx: idx + 1,
                    char_span: sentence.char_span,
                    text: sentence.text,
                }
            })
            .collect();

        SegmentedChunk {
            chunk: Chunk {
                id: chunk_id,
                order_idx: ordinal,
                source: source.to_string(),
                token_span: self.token_span,
                text: self.text,
            },
            sub_chunks,
            sentences,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SentencePolicy;
    use crate::error::SegmenterError;
    use crate::tokenizer::WhitespaceTokenizer;

    #[derive(Debug)]
    struct BrokenTokenizer;

    impl Tokenizer for BrokenTokenizer {
        type Token = u32;

        fn encode(&self, _text: &str) -> Result<Vec<u32>> {
            Err(SegmenterError::tokenizer("model not loaded"))
        }

        fn decode(&self, _tokens: &[u32]) -> Result<String> {
            Err(SegmenterError::tokenizer("model not loaded"))
        }
    }

    fn segmenter(chunk: usize, sub: usize) -> Segmenter<WhitespaceTokenizer> {
        let config = SegmenterConfig::default().with_windows(chunk, sub);
        Segmenter::new(config, WhitespaceTokenizer).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = SegmenterConfig::default().with_windows(10, 0);
        assert!(matches!(
            Segmenter::new(config, WhitespaceTokenizer),
            Err(SegmenterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_wide_subchunk_window_gives_one_subchunk_per_chunk() {
        let doc = segmenter(4, 10)
            .segment("doc.txt", "Alpha beta gamma delta. Epsilon zeta.", 0)
            .unwrap();
        assert_eq!(doc.chunks.len(), 2);
        for chunk in &doc.chunks {
            assert_eq!(chunk.sub_chunks.len(), 1);
            assert_eq!(chunk.sub_chunks[0].token_span, Span::new(0, chunk.chunk.token_count()));
        }
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let doc = segmenter(10, 5).segment("empty.txt", "   \n ", 7).unwrap();
        assert!(doc.chunks.is_empty());
        assert_eq!(doc.total_tokens, 0);
        assert_eq!(doc.next_base, 7);
    }

    #[test]
    fn test_small_document_structure() {
        let text = "Alpha beta gamma. Delta epsilon zeta eta. Theta iota.";
        let doc = segmenter(6, 3).segment("doc.txt", text, 0).unwrap();

        assert_eq!(doc.total_tokens, 9);
        assert_eq!(doc.chunks.len(), 2);
        assert_eq!(doc.next_base, 2);

        let first = &doc.chunks[0];
        assert_eq!(first.chunk.id, "chunk_000001");
        assert_eq!(first.chunk.text, "Alpha beta gamma. Delta epsilon zeta");
        assert_eq!(first.sub_chunks.len(), 2);
        assert_eq!(first.sub_chunks[1].text, "Delta epsilon zeta");
        assert_eq!(first.sub_chunks[1].char_span, CharSpan::new(17, 36));

        let sentences: Vec<_> = first.sentences.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(sentences, vec!["Alpha beta gamma.", "Delta epsilon zeta"]);
        assert_eq!(first.sentences[0].id, "s_000001_001_001");
        assert_eq!(first.sentences[1].id, "s_000001_002_002");
        assert_eq!(
            first.sentences[1].sub_chunk_id.as_deref(),
            Some("sc_000001_002")
        );

        let second = &doc.chunks[1];
        assert_eq!(second.chunk.token_span, Span::new(6, 9));
        assert_eq!(second.sub_chunks[0].absolute_token_span, Span::new(6, 9));
        assert_eq!(second.sentences.len(), 2);
    }

    #[test]
    fn test_base_offset_shifts_ids() {
        let doc = segmenter(4, 2).segment("b.txt", "One two. Three four.", 41).unwrap();
        assert_eq!(doc.chunks[0].chunk.id, "chunk_000042");
        assert_eq!(doc.chunks[0].chunk.order_idx, 42);
        assert_eq!(doc.chunks[0].sub_chunks[1].id, "sc_000042_002");
        assert_eq!(doc.next_base, 42);
    }

    #[test]
    fn test_tokenizer_failure_propagates() {
        let segmenter = Segmenter::new(SegmenterConfig::default(), BrokenTokenizer).unwrap();
        let err = segmenter.segment("x.txt", "text", 0).unwrap_err();
        assert_eq!(err, SegmenterError::TokenizerFailure("model not loaded".into()));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let text = (0..500)
            .map(|i| format!("Word{i} filler text (aside. more) here."))
            .collect::<Vec<_>>()
            .join(" ");
        let parallel = segmenter(300, 40).segment("p.txt", &text, 3).unwrap();
        let config = SegmenterConfig::default().with_windows(300, 40).sequential();
        let sequential = Segmenter::new(config, WhitespaceTokenizer)
            .unwrap()
            .segment("p.txt", &text, 3)
            .unwrap();
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_policy_is_selected_by_config() {
        let text = "one. two. Three four.";
        let simple = Segmenter::new(
            SegmenterConfig::default()
                .with_windows(10, 5)
                .with_policy(SentencePolicy::Simple),
            WhitespaceTokenizer,
        )
        .unwrap()
        .segment("s.txt", text, 0)
        .unwrap();
        let strict = segmenter(10, 5).segment("s.txt", text, 0).unwrap();

        assert_eq!(simple.sentence_count(), 3);
        assert_eq!(strict.sentence_count(), 2);
    }

    #[test]
    fn test_corpus_threads_base() {
        let docs = [("a.txt", "a b c d e"), ("b.txt", "f g"), ("c.txt", "")];
        let out = segmenter(2, 1).segment_corpus(docs, 0).unwrap();
        assert_eq!(out[0].chunks.len(), 3);
        assert_eq!(out[1].chunks[0].chunk.id, "chunk_000004");
        assert_eq!(out[2].next_base, 4);
    }

    #[test]
    fn test_verify_uses_configured_threshold() {
        let segmenter = segmenter(20, 4);
        let doc = segmenter
            .segment("v.txt", "First one here. Second one there. Third.", 0)
            .unwrap();
        let report = segmenter.verify(&doc);
        assert!(report.is_healthy(), "{report:#?}");
        assert_eq!(report.threshold, 0.99);
    }
}
