use thiserror::Error;

/// Result type for segmenter operations
pub type Result<T> = std::result::Result<T, SegmenterError>;

/// Errors that can occur during segmentation
///
/// An unanchored sentence is not an error: it is recorded on the sentence
/// itself. Empty input is not an error either and yields zero chunks.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmenterError {
    /// Invalid configuration (zero window, unknown policy, bad threshold)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The tokenizer capability failed while encoding or decoding
    #[error("Tokenizer failure: {0}")]
    TokenizerFailure(String),
}

impl SegmenterError {
    /// Create an invalid config error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create a tokenizer failure
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::TokenizerFailure(msg.into())
    }
}
