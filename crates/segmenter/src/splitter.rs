use crate::config::SentencePolicy;
use crate::types::CharSpan;
use serde::{Deserialize, Serialize};

/// Sentence emitted by the scan, with its span in the scanned text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitSentence {
    pub span: CharSpan,
    pub text: String,
}

/// Scan state threaded through the boundary loop
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct ScanState {
    /// Char index where the current sentence starts
    cursor: usize,
    /// Unmatched opening brackets seen since the last boundary
    depth: usize,
}

/// Bracket-aware sentence splitter for one policy
#[derive(Debug, Clone, Copy)]
pub struct SentenceSplitter {
    policy: SentencePolicy,
}

impl SentenceSplitter {
    #[must_use]
    pub const fn new(policy: SentencePolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> SentencePolicy {
        self.policy
    }

    /// Split `text` into trimmed sentences.
    ///
    /// Newlines are replaced by spaces char-for-char before scanning, so the
    /// returned spans index `text` directly.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<SplitSentence> {
        let chars: Vec<char> = text.chars().map(normalize_newline).collect();
        let mut sentences = Vec::new();
        let mut state = ScanState::default();
        let mut i = 0;

        while i < chars.len() {
            let ch = chars[i];
            if self.policy.openers().contains(&ch) {
                state.depth += 1;
            } else if self.policy.closers().contains(&ch) {
                state.depth = state.depth.saturating_sub(1);
            } else if state.depth == 0 && self.policy.terminators().contains(&ch) {
                if let Some(next_start) = self.boundary_after(&chars, i) {
                    push_trimmed(&chars, state.cursor, i + 1, &mut sentences);
                    state.cursor = next_start;
                    i = next_start;
                    continue;
                }
            }
            i += 1;
        }

        push_trimmed(&chars, state.cursor, chars.len(), &mut sentences);
        sentences
    }

    /// Where the next sentence starts if the terminator at `idx` is a boundary
    fn boundary_after(&self, chars: &[char], idx: usize) -> Option<usize> {
        match self.policy {
            SentencePolicy::Simple => Some(skip_whitespace(chars, idx + 1)),
            SentencePolicy::Strict => {
                if !chars.get(idx + 1).is_some_and(|c| c.is_whitespace()) {
                    return None;
                }
                let next = skip_whitespace(chars, idx + 2);
                chars
                    .get(next)
                    .is_some_and(|c| c.is_uppercase())
                    .then_some(next)
            }
        }
    }
}

/// Split `text` under `policy`
#[must_use]
pub fn split(text: &str, policy: SentencePolicy) -> Vec<SplitSentence> {
    SentenceSplitter::new(policy).split(text)
}

const fn normalize_newline(ch: char) -> char {
    match ch {
        '\n' | '\r' => ' ',
        other => other,
    }
}

fn skip_whitespace(chars: &[char], mut idx: usize) -> usize {
    while idx < chars.len() && chars[idx].is_whitespace() {
        idx += 1;
    }
    idx
}

fn push_trimmed(chars: &[char], start: usize, end: usize, out: &mut Vec<SplitSentence>) {
    let start = skip_whitespace(&chars[..end], start);
    let mut end = end;
    while end > start && chars[end - 1].is_whitespace() {
        end -= 1;
    }
    if start < end {
        out.push(SplitSentence {
            span: CharSpan::new(start, end),
            text: chars[start..end].iter().collect(),
        });
    }
}
