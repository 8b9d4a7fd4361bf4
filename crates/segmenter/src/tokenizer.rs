//! Tokenizer capability supplied by the caller.
//!
//! The engine only relies on two properties: encoding the same text twice
//! yields the same tokens, and decoding a token prefix approximates the
//! matching prefix of the decoded whole closely enough to measure char
//! offsets against it.

use crate::error::Result;

/// Encode/decode capability used to count and materialize tokens
pub trait Tokenizer: Send + Sync {
    /// Opaque token unit
    type Token: Clone + Send + Sync;

    /// Encode text into tokens
    fn encode(&self, text: &str) -> Result<Vec<Self::Token>>;

    /// Decode a token sequence back into text
    fn decode(&self, tokens: &[Self::Token]) -> Result<String>;

    /// Short name used in logs and reports
    fn name(&self) -> &str {
        "custom"
    }
}

impl<T: Tokenizer + ?Sized> Tokenizer for &T {
    type Token = T::Token;

    fn encode(&self, text: &str) -> Result<Vec<Self::Token>> {
        (**self).encode(text)
    }

    fn decode(&self, tokens: &[Self::Token]) -> Result<String> {
        (**self).decode(tokens)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Word tokenizer: splits on Unicode whitespace, joins with one space
///
/// Decoding is exact with respect to the joined text, so sub-chunk char
/// ranges reconstructed from it never drift.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    type Token = String;

    fn encode(&self, text: &str) -> Result<Vec<String>> {
        Ok(text.split_whitespace().map(str::to_string).collect())
    }

    fn decode(&self, tokens: &[String]) -> Result<String> {
        Ok(tokens.join(" "))
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_encode_collapses_runs() {
        let tokens = WhitespaceTokenizer.encode("  alpha\tbeta\n\ngamma ").unwrap();
        assert_eq!(tokens, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_whitespace_decode_joins_with_single_space() {
        let tokens = WhitespaceTokenizer.encode("a  b\nc").unwrap();
        assert_eq!(WhitespaceTokenizer.decode(&tokens).unwrap(), "a b c");
        assert_eq!(WhitespaceTokenizer.decode(&[]).unwrap(), "");
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let text = "Evaṃ me sutaṃ. Ekaṃ samayaṃ bhagavā.";
        let first = WhitespaceTokenizer.encode(text).unwrap();
        let second = WhitespaceTokenizer.encode(text).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_reference_forwards() {
        let tokenizer = &WhitespaceTokenizer;
        assert_eq!(tokenizer.name(), "whitespace");
        assert_eq!(tokenizer.encode("x y").unwrap().len(), 2);
    }
}
