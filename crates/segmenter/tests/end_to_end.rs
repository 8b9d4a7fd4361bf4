use corpus_segmenter::{
    sentence_windows, CharSpan, Segmenter, SegmenterConfig, SentencePolicy, Span,
    WhitespaceTokenizer, DEFAULT_WINDOW_SIZES,
};
use pretty_assertions::assert_eq;

/// `words` whitespace tokens forming sentences of `per_sentence` words each
fn corpus(words: usize, per_sentence: usize) -> String {
    (0..words)
        .map(|i| {
            let word = if i % per_sentence == 0 {
                format!("Word{i}")
            } else {
                format!("word{i}")
            };
            if i % per_sentence == per_sentence - 1 {
                format!("{word}.")
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn segmenter(policy: SentencePolicy) -> Segmenter<WhitespaceTokenizer> {
    let config = SegmenterConfig::default().with_policy(policy);
    Segmenter::new(config, WhitespaceTokenizer).expect("valid config")
}

#[test]
fn splits_8500_tokens_into_8000_and_500() {
    let text = corpus(8500, 17);
    let doc = segmenter(SentencePolicy::Strict)
        .segment("long.txt", &text, 0)
        .expect("segmentation failed");

    assert_eq!(doc.total_tokens, 8500);
    let spans: Vec<Span> = doc.chunks.iter().map(|c| c.chunk.token_span).collect();
    assert_eq!(spans, vec![Span::new(0, 8000), Span::new(8000, 8500)]);

    let second = &doc.chunks[1];
    let sub_counts: Vec<usize> = second.sub_chunks.iter().map(|s| s.token_count()).collect();
    assert_eq!(sub_counts, vec![200, 200, 100]);
    assert_eq!(second.subchunk_token_sum(), 500);
    assert_eq!(second.sub_chunks[2].absolute_token_span, Span::new(8400, 8500));

    for chunk in &doc.chunks {
        assert_eq!(chunk.subchunk_token_sum(), chunk.chunk.token_count());
    }

    let report = segmenter(SentencePolicy::Strict).verify(&doc);
    assert!(report.is_healthy(), "{report:#?}");
    assert_eq!(report.anchoring_ratio, 1.0);
}

#[test]
fn exact_multiple_yields_equal_chunks() {
    let text = corpus(16000, 20);
    let doc = segmenter(SentencePolicy::Simple)
        .segment("even.txt", &text, 0)
        .expect("segmentation failed");
    let counts: Vec<usize> = doc.chunks.iter().map(|c| c.chunk.token_count()).collect();
    assert_eq!(counts, vec![8000, 8000]);
    assert_eq!(doc.chunks[1].sub_chunks.len(), 40);
}

#[test]
fn rerun_reproduces_identical_ids() {
    let text = corpus(9000, 13);
    let run = || {
        segmenter(SentencePolicy::Strict)
            .segment("again.txt", &text, 5)
            .expect("segmentation failed")
    };
    let first = run();
    let second = run();

    let ids = |doc: &corpus_segmenter::SegmentedDocument| {
        doc.chunks
            .iter()
            .flat_map(|c| {
                std::iter::once(c.chunk.id.clone())
                    .chain(c.sub_chunks.iter().map(|s| s.id.clone()))
                    .chain(c.sentences.iter().map(|s| s.id.clone()))
            })
            .collect::<Vec<_>>()
    };
    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first, second);
    assert_eq!(first.chunks[0].chunk.id, "chunk_000006");
}

#[test]
fn sentence_spans_index_chunk_text() {
    let text = "Bhikkhave (iti. hi. so) bhagavā.\nAyaṃ dhammo? Evaṃ! [sutta. x] Idaṃ vuttaṃ.";
    let config = SegmenterConfig::default().with_windows(64, 4);
    let segmenter = Segmenter::new(config, WhitespaceTokenizer).expect("valid config");
    let doc = segmenter.segment("pali.txt", text, 0).expect("segmentation failed");
    let chunk = &doc.chunks[0];

    let chars: Vec<char> = chunk.chunk.text.chars().collect();
    let mut previous_end = 0;
    for sentence in &chunk.sentences {
        assert!(sentence.char_span.start >= previous_end);
        let slice: String = chars[sentence.char_span.start..sentence.char_span.end]
            .iter()
            .collect();
        assert_eq!(slice, sentence.text);
        previous_end = sentence.char_span.end;
    }

    let texts: Vec<&str> = chunk.sentences.iter().map(|s| s.text.as_str()).collect();
    assert_eq!(
        texts,
        vec![
            "Bhikkhave (iti. hi. so) bhagavā.",
            "Ayaṃ dhammo?",
            "Evaṃ! [sutta. x] Idaṃ vuttaṃ."
        ]
    );
}

#[test]
fn sentences_anchor_to_subchunk_containing_start() {
    let text = "Aa bb cc. Dd ee ff gg hh. Ii jj.";
    let config = SegmenterConfig::default().with_windows(100, 3);
    let segmenter = Segmenter::new(config, WhitespaceTokenizer).expect("valid config");
    let doc = segmenter.segment("anchor.txt", text, 0).expect("segmentation failed");
    let chunk = &doc.chunks[0];

    let ranges: Vec<CharSpan> = chunk.sub_chunks.iter().map(|s| s.char_span).collect();
    assert_eq!(
        ranges,
        vec![
            CharSpan::new(0, 9),
            CharSpan::new(9, 18),
            CharSpan::new(18, 28),
            CharSpan::new(28, 32)
        ]
    );

    let anchors: Vec<Option<&str>> = chunk
        .sentences
        .iter()
        .map(|s| s.sub_chunk_id.as_deref())
        .collect();
    // The second sentence straddles sub-chunks 2 and 3 and belongs to the one it starts in.
    assert_eq!(
        anchors,
        vec![
            Some("sc_000001_001"),
            Some("sc_000001_002"),
            Some("sc_000001_003")
        ]
    );
    assert_eq!(chunk.sentences[1].id, "s_000001_002_002");
}

#[test]
fn windows_follow_sentence_ids() {
    let text = "One a. Two b. Three c.";
    let config = SegmenterConfig::default().with_windows(50, 10);
    let segmenter = Segmenter::new(config, WhitespaceTokenizer).expect("valid config");
    let doc = segmenter.segment("w.txt", text, 0).expect("segmentation failed");
    let windows = sentence_windows(&doc.chunks[0], &DEFAULT_WINDOW_SIZES);

    let ids: Vec<&str> = windows.iter().map(|w| w.id.as_str()).collect();
    assert_eq!(ids, vec!["w2_000001_001", "w2_000001_002", "w3_000001_001"]);
    assert_eq!(windows[2].text, "One a. Two b. Three c.");
    assert_eq!(windows[2].last_sentence_id, "s_000001_001_003");
}

#[test]
fn documents_sharing_a_source_name_verify_cleanly() {
    let config = SegmenterConfig::default().with_windows(4, 2);
    let segmenter = Segmenter::new(config, WhitespaceTokenizer).expect("valid config");
    let docs = segmenter
        .segment_corpus(
            [("a.txt", "One two three four five."), ("a.txt", "Six seven.")],
            0,
        )
        .expect("segmentation failed");

    let chunks: Vec<_> = docs.into_iter().flat_map(|d| d.chunks).collect();
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[2].chunk.id, "chunk_000003");

    let report = corpus_segmenter::verify(&chunks, 0.99);
    assert!(report.partition_violations.is_empty(), "{report:#?}");
    assert!(report.is_healthy());
}

#[test]
fn subchunk_window_larger_than_chunk_window_yields_one_subchunk_per_chunk() {
    let config = SegmenterConfig::default().with_windows(4, 10);
    let segmenter = Segmenter::new(config, WhitespaceTokenizer).expect("valid config");
    let doc = segmenter
        .segment("wide.txt", "One two three four. Five six seven eight. Nine ten.", 0)
        .expect("segmentation failed");

    let counts: Vec<usize> = doc.chunks.iter().map(|c| c.sub_chunks.len()).collect();
    assert_eq!(counts, vec![1, 1, 1]);
    for chunk in &doc.chunks {
        assert_eq!(chunk.subchunk_token_sum(), chunk.chunk.token_count());
    }
    assert!(segmenter.verify(&doc).is_healthy());
}
