//! Match result types.

use crate::trie::PatternId;

/// A single pattern hit inside one input string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    /// Dense id of the matched pattern.
    pub pattern_id: PatternId,
    /// The pattern's opaque cross-reference, verbatim.
    pub xref: String,
    /// The pattern's canonical text.
    pub text: String,
    /// The literal substring of the (trimmed) input that realized the
    /// match. Empty when substring extraction is off.
    pub matched: String,
    /// Byte offset of the match start in the trimmed input.
    pub start: usize,
    /// Byte offset one past the match end in the trimmed input.
    pub end: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_fields() {
        let result = MatchResult {
            pattern_id: 3,
            xref: "X3\tcategory".to_string(),
            text: "hello world".to_string(),
            matched: "Hello, world".to_string(),
            start: 4,
            end: 16,
        };

        assert_eq!(result.pattern_id, 3);
        assert_eq!(result.xref, "X3\tcategory");
        assert_eq!(result.end - result.start, 12);
    }
}
