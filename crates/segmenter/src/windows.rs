use crate::ids;
use crate::types::{SegmentedChunk, SentenceWindow};

/// Window sizes emitted by default
pub const DEFAULT_WINDOW_SIZES: [usize; 2] = [2, 3];

/// Rolling windows of consecutive sentences of one chunk.
///
/// Windows never cross a chunk boundary. Sizes are processed in the given
/// order; a size of zero, or one larger than the sentence count, yields
/// nothing.
#[must_use]
pub fn sentence_windows(chunk: &SegmentedChunk, sizes: &[usize]) -> Vec<SentenceWindow> {
    let sentences = &chunk.sentences;
    let mut windows = Vec::new();

    for &size in sizes {
        if size == 0 || size > sentences.len() {
            continue;
        }

        for (idx, group) in sentences.windows(size).enumerate() {
            let order_idx = idx + 1;
            let text = group
                .iter()
                .map(|s| s.text.as_str())
                .collect::<Vec<_>>()
                .join(" ");

            windows.push(SentenceWindow {
                id: ids::window_id(size, chunk.chunk.order_idx, order_idx),
                chunk_id: chunk.chunk.id.clone(),
                size,
                order_idx,
                first_sentence_id: group[0].id.clone(),
                last_sentence_id: group[size - 1].id.clone(),
                text: text.trim().to_string(),
            });
        }
    }

    windows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CharSpan, Chunk, Sentence, Span};

    fn chunk_with(texts: &[&str]) -> SegmentedChunk {
        let sentences = texts
            .iter()
            .enumerate()
            .map(|(idx, text)| Sentence {
                id: ids::sentence_id(3, Some(1), idx + 1),
                chunk_id: ids::chunk_id(3),
                sub_chunk_id: Some(ids::subchunk_id(3, 1)),
                order_idx: idx + 1,
                char_span: CharSpan::new(0, 1),
                text: (*text).to_string(),
            })
            .collect();

        SegmentedChunk {
            chunk: Chunk {
                id: ids::chunk_id(3),
                order_idx: 3,
                source: "doc.txt".to_string(),
                token_span: Span::new(0, 1),
                text: String::new(),
            },
            sub_chunks: Vec::new(),
            sentences,
        }
    }

    #[test]
    fn test_rolling_pairs_and_triples() {
        let chunk = chunk_with(&["A.", "B.", "C.", "D."]);
        let windows = sentence_windows(&chunk, &DEFAULT_WINDOW_SIZES);

        let pairs: Vec<_> = windows.iter().filter(|w| w.size == 2).collect();
        let triples: Vec<_> = windows.iter().filter(|w| w.size == 3).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(triples.len(), 2);

        assert_eq!(pairs[0].id, "w2_000003_001");
        assert_eq!(pairs[0].text, "A. B.");
        assert_eq!(pairs[2].first_sentence_id, "s_000003_001_003");
        assert_eq!(pairs[2].last_sentence_id, "s_000003_001_004");

        assert_eq!(triples[1].id, "w3_000003_002");
        assert_eq!(triples[1].text, "B. C. D.");
    }

    #[test]
    fn test_too_few_sentences_yield_nothing() {
        let chunk = chunk_with(&["Only one."]);
        assert!(sentence_windows(&chunk, &DEFAULT_WINDOW_SIZES).is_empty());
        assert!(sentence_windows(&chunk, &[0]).is_empty());
    }
}
