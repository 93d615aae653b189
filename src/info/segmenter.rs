//! Bracket-aware segmentation
//!
//! An info cell holds several paragraphs separated by `;`, each holding several messages
//! separated by `,`. Separators inside brackets ("selbst. (v, w)") are not structural, so
//! the splitter tracks a stack of expected closing brackets and only splits while it is
//! empty.
//!
//! Splitting is lossless: joining the returned pieces with the separator gives back the
//! input. Unbalanced brackets are tolerated: an unmatched closer is an ordinary character,
//! and an unclosed opener simply keeps the rest of the text in one piece.

use serde::Deserialize;

/// Separator between paragraphs of an info cell.
pub const PARAGRAPH_SEPARATOR: char = ';';
/// Separator between messages of a paragraph.
pub const MESSAGE_SEPARATOR: char = ',';

/// One opening/closing bracket pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BracketPair {
    pub open: char,
    pub close: char,
}

/// The set of bracket pairs the splitter respects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BracketPairs {
    pairs: Vec<BracketPair>,
}

impl BracketPairs {
    pub fn new(pairs: impl IntoIterator<Item = BracketPair>) -> Self {
        Self {
            pairs: pairs.into_iter().collect(),
        }
    }

    fn closer_for(&self, open: char) -> Option<char> {
        self.pairs
            .iter()
            .find(|pair| pair.open == open)
            .map(|pair| pair.close)
    }
}

impl Default for BracketPairs {
    fn default() -> Self {
        Self::new([BracketPair {
            open: '(',
            close: ')',
        }])
    }
}

/// Split `text` at every `separator` that is not enclosed in brackets.
///
/// Always returns at least one piece; a trailing separator yields a trailing empty piece.
pub fn split_bracket_aware<'a>(
    text: &'a str,
    separator: char,
    brackets: &BracketPairs,
) -> Vec<&'a str> {
    let mut expected_closers: Vec<char> = Vec::new();
    let mut pieces = Vec::new();
    let mut start = 0;

    for (i, ch) in text.char_indices() {
        if let Some(close) = brackets.closer_for(ch) {
            expected_closers.push(close);
        } else if expected_closers.last() == Some(&ch) {
            expected_closers.pop();
        } else if ch == separator && expected_closers.is_empty() {
            pieces.push(&text[start..i]);
            start = i + ch.len_utf8();
        }
    }

    pieces.push(&text[start..]);
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(text: &str, separator: char) -> Vec<&str> {
        split_bracket_aware(text, separator, &BracketPairs::default())
    }

    #[test]
    fn test_splits_outside_brackets_only() {
        assert_eq!(split("Text (a, b) weiter", ','), vec!["Text (a, b) weiter"]);
        assert_eq!(
            split("selbst. (v), Aufgaben stehen im LernSax", ','),
            vec!["selbst. (v)", " Aufgaben stehen im LernSax"]
        );
    }

    #[test]
    fn test_nested_brackets() {
        assert_eq!(
            split("a (b (c, d), e), f", ','),
            vec!["a (b (c, d), e)", " f"]
        );
    }

    #[test]
    fn test_trailing_separator_keeps_empty_piece() {
        assert_eq!(split("a;b;", ';'), vec!["a", "b", ""]);
        assert_eq!(split("", ';'), vec![""]);
    }

    #[test]
    fn test_unmatched_closer_is_literal() {
        assert_eq!(split("a), b", ','), vec!["a)", " b"]);
    }

    #[test]
    fn test_unclosed_opener_swallows_rest() {
        assert_eq!(split("a (b, c", ','), vec!["a (b, c"]);
    }

    #[test]
    fn test_custom_brackets() {
        let brackets = BracketPairs::new([
            BracketPair {
                open: '(',
                close: ')',
            },
            BracketPair {
                open: '[',
                close: ']',
            },
        ]);
        assert_eq!(
            split_bracket_aware("x [1, 2], y (3, 4)", ',', &brackets),
            vec!["x [1, 2]", " y (3, 4)"]
        );
    }

    #[test]
    fn test_rejoin_is_lossless() {
        let text = "für MA Frau A, Herr B; verlegt (St.3, 4); ";
        let pieces = split(text, ';');
        assert_eq!(pieces.join(";"), text);
    }
}
