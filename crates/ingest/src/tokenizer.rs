use corpus_segmenter::{SegmenterError, Tokenizer};
use std::fmt;
use std::path::{Path, PathBuf};

/// Tokenizer requested on the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenizerChoice {
    Whitespace,
    /// Hugging Face `tokenizer.json`
    Pretrained(PathBuf),
}

impl TokenizerChoice {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("whitespace") {
            Self::Whitespace
        } else {
            Self::Pretrained(PathBuf::from(trimmed))
        }
    }
}

/// Subword tokenizer loaded from a `tokenizer.json`
pub struct PretrainedTokenizer {
    inner: tokenizers::Tokenizer,
    name: String,
}

impl PretrainedTokenizer {
    pub fn from_file(path: &Path) -> Result<Self, SegmenterError> {
        // Chunks are already fanned out over rayon; keep the tokenizer itself single-threaded
        // unless the user opted in through the environment.
        if !tokenizers::utils::parallelism::is_parallelism_configured() {
            tokenizers::utils::parallelism::set_parallelism(false);
        }

        let inner = tokenizers::Tokenizer::from_file(path).map_err(|e| {
            SegmenterError::tokenizer(format!(
                "failed to load tokenizer from {}: {e}",
                path.display()
            ))
        })?;
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map_or_else(|| "pretrained".to_string(), str::to_string);

        Ok(Self { inner, name })
    }
}

impl fmt::Debug for PretrainedTokenizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PretrainedTokenizer")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Tokenizer for PretrainedTokenizer {
    type Token = u32;

    fn encode(&self, text: &str) -> corpus_segmenter::Result<Vec<u32>> {
        let encoding = self
            .inner
            .encode(text, false)
            .map_err(|e| SegmenterError::tokenizer(format!("encode failed: {e}")))?;
        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, tokens: &[u32]) -> corpus_segmenter::Result<String> {
        self.inner
            .decode(tokens, false)
            .map_err(|e| SegmenterError::tokenizer(format!("decode failed: {e}")))
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace_is_the_default_choice() {
        assert_eq!(TokenizerChoice::parse("whitespace"), TokenizerChoice::Whitespace);
        assert_eq!(TokenizerChoice::parse(" Whitespace "), TokenizerChoice::Whitespace);
        assert_eq!(TokenizerChoice::parse(""), TokenizerChoice::Whitespace);
    }

    #[test]
    fn other_values_are_tokenizer_paths() {
        assert_eq!(
            TokenizerChoice::parse("models/cl100k/tokenizer.json"),
            TokenizerChoice::Pretrained(PathBuf::from("models/cl100k/tokenizer.json"))
        );
    }

    #[test]
    fn missing_tokenizer_file_is_a_tokenizer_failure() {
        let err = PretrainedTokenizer::from_file(Path::new("/nonexistent/tokenizer.json"))
            .expect_err("load must fail");
        assert!(matches!(err, SegmenterError::TokenizerFailure(_)));
    }
}
