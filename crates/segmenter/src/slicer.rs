use crate::error::{Result, SegmenterError};
use crate::types::Span;

/// Partition `[0, n)` into consecutive windows of `size` tokens.
///
/// Every span has length `size` except possibly the last one. `n == 0` yields
/// no spans.
pub fn slice(n: usize, size: usize) -> Result<Vec<Span>> {
    if size == 0 {
        return Err(SegmenterError::invalid_config("window size must be > 0"));
    }

    let mut spans = Vec::with_capacity(n.div_ceil(size));
    let mut start = 0;
    while start < n {
        let end = n.min(start.saturating_add(size));
        spans.push(Span::new(start, end));
        start = end;
    }

    Ok(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_yields_no_spans() {
        assert!(slice(0, 8000).unwrap().is_empty());
    }

    #[test]
    fn test_zero_size_is_invalid_config() {
        assert!(matches!(
            slice(10, 0),
            Err(SegmenterError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_short_last_span() {
        let spans = slice(8500, 8000).unwrap();
        assert_eq!(spans, vec![Span::new(0, 8000), Span::new(8000, 8500)]);

        let spans = slice(500, 200).unwrap();
        let lens: Vec<usize> = spans.iter().map(Span::len).collect();
        assert_eq!(lens, vec![200, 200, 100]);
    }

    #[test]
    fn test_exact_multiple_has_no_short_tail() {
        let spans = slice(16000, 8000).unwrap();
        assert_eq!(spans, vec![Span::new(0, 8000), Span::new(8000, 16000)]);
    }

    #[test]
    fn test_window_larger_than_input() {
        assert_eq!(slice(7, 200).unwrap(), vec![Span::new(0, 7)]);
    }

    proptest! {
        #[test]
        fn proptest_spans_partition_range(n in 0usize..50_000, size in 1usize..10_000) {
            let spans = slice(n, size).unwrap();
            prop_assert_eq!(spans.len(), n.div_ceil(size));

            let mut expected_start = 0;
            for (idx, span) in spans.iter().enumerate() {
                prop_assert_eq!(span.start, expected_start);
                prop_assert!(span.end > span.start);
                if idx + 1 < spans.len() {
                    prop_assert_eq!(span.len(), size);
                }
                expected_start = span.end;
            }
            prop_assert_eq!(expected_start, n);
        }
    }
}
