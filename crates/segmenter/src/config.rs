use crate::error::SegmenterError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default chunk window in tokens
pub const DEFAULT_CHUNK_WINDOW: usize = 8000;

/// Default sub-chunk window in tokens
pub const DEFAULT_SUBCHUNK_WINDOW: usize = 200;

/// Default minimum share of sentences that must resolve to a sub-chunk
pub const DEFAULT_ANCHORING_THRESHOLD: f64 = 0.99;

/// Configuration for segmentation behavior
///
/// The running chunk-ordinal base is deliberately not part of the config: it
/// belongs to the caller and is passed per document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmenterConfig {
    /// Chunk window size in tokens
    pub chunk_window: usize,

    /// Sub-chunk window size in tokens
    pub subchunk_window: usize,

    /// Sentence boundary policy
    pub policy: SentencePolicy,

    /// Anchoring ratio below which the verifier flags a chunk or document
    pub anchoring_threshold: f64,

    /// Segment chunks of one document concurrently
    pub parallel: bool,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            chunk_window: DEFAULT_CHUNK_WINDOW,
            subchunk_window: DEFAULT_SUBCHUNK_WINDOW,
            policy: SentencePolicy::Strict,
            anchoring_threshold: DEFAULT_ANCHORING_THRESHOLD,
            parallel: true,
        }
    }
}

impl SegmenterConfig {
    /// Preset that ends sentences on `.` only
    pub fn simple() -> Self {
        Self {
            policy: SentencePolicy::Simple,
            ..Default::default()
        }
    }

    /// Builder: set both window sizes
    #[must_use]
    pub const fn with_windows(mut self, chunk_window: usize, subchunk_window: usize) -> Self {
        self.chunk_window = chunk_window;
        self.subchunk_window = subchunk_window;
        self
    }

    /// Builder: set sentence policy
    #[must_use]
    pub const fn with_policy(mut self, policy: SentencePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Builder: run sequentially
    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), SegmenterError> {
        if self.chunk_window == 0 {
            return Err(SegmenterError::invalid_config("chunk_window must be > 0"));
        }

        if self.subchunk_window == 0 {
            return Err(SegmenterError::invalid_config(
                "subchunk_window must be > 0",
            ));
        }

        if !(0.0..=1.0).contains(&self.anchoring_threshold) {
            return Err(SegmenterError::invalid_config(format!(
                "anchoring_threshold ({}) must be within [0, 1]",
                self.anchoring_threshold
            )));
        }

        Ok(())
    }
}

/// Sentence boundary policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentencePolicy {
    /// `.` ends a sentence outside `( )`; nothing else is checked
    Simple,

    /// `.`, `?` or `!` outside `()[]{}`, followed by whitespace and an
    /// uppercase letter
    Strict,
}

impl SentencePolicy {
    /// Characters that may end a sentence
    pub const fn terminators(self) -> &'static [char] {
        match self {
            Self::Simple => &['.'],
            Self::Strict => &['.', '?', '!'],
        }
    }

    /// Characters that open a bracketed run
    pub const fn openers(self) -> &'static [char] {
        match self {
            Self::Simple => &['('],
            Self::Strict => &['(', '[', '{'],
        }
    }

    /// Characters that close a bracketed run
    pub const fn closers(self) -> &'static [char] {
        match self {
            Self::Simple => &[')'],
            Self::Strict => &[')', ']', '}'],
        }
    }

    /// Get policy name as string
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Strict => "strict",
        }
    }
}

impl Default for SentencePolicy {
    fn default() -> Self {
        Self::Strict
    }
}

impl fmt::Display for SentencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SentencePolicy {
    type Err = SegmenterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "simple" => Ok(Self::Simple),
            "strict" => Ok(Self::Strict),
            other => Err(SegmenterError::invalid_config(format!(
                "unknown sentence policy '{other}' (expected simple|strict)"
            ))),
        }
    }
}
