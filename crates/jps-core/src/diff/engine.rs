//! Word-level diff computation.
//!
//! The core entry point is [`generate_diff`]: whitespace-preserving
//! tokenisation, an O(m·n) LCS table, a backtrack that prefers additions on
//! ties, and a merge pass that yields canonical form.

use std::collections::VecDeque;

use crate::diff::model::{DiffItem, DiffKind};

/// Whitespace as a JavaScript `\s` sees it: Unicode `White_Space` without
/// U+0085, plus the byte-order mark U+FEFF.
pub fn is_token_space(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

/// Split `text` into alternating word / whitespace-run tokens.
///
/// Whitespace runs are kept as their own tokens so that concatenating the
/// tokens gives back `text` exactly. The token list always starts and ends
/// with a (possibly empty) word token: `" a"` is `["", " ", "a"]`.
pub fn tokenize(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut word_start = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if !is_token_space(c) {
            continue;
        }
        tokens.push(&text[word_start..i]);

        let mut run_end = i + c.len_utf8();
        while let Some(&(j, d)) = chars.peek() {
            if !is_token_space(d) {
                break;
            }
            run_end = j + d.len_utf8();
            chars.next();
        }
        tokens.push(&text[i..run_end]);
        word_start = run_end;
    }
    tokens.push(&text[word_start..]);

    tokens
}

/// Compute the diff between an original and an improved text.
///
/// If either side is empty the result is a single `equal` item holding
/// whichever side is non-empty (or `""`).
///
/// # Example
///
/// ```
/// use jps_core::diff::{generate_diff, DiffItem};
///
/// let diff = generate_diff("Must be a team player", "Must be collaborative");
/// assert_eq!(
///     diff,
///     vec![
///         DiffItem::equal("Must be"),
///         DiffItem::deletion(" a team"),
///         DiffItem::equal(" "),
///         DiffItem::deletion("player"),
///         DiffItem::addition("collaborative"),
///     ]
/// );
/// ```
pub fn generate_diff(original: &str, improved: &str) -> Vec<DiffItem> {
    if original.is_empty() || improved.is_empty() {
        let value = if improved.is_empty() { original } else { improved };
        return vec![DiffItem::equal(value)];
    }

    let original_tokens = tokenize(original);
    let improved_tokens = tokenize(improved);

    let diff = compute_diff(&original_tokens, &improved_tokens);

    tracing::debug!(
        original_tokens = original_tokens.len(),
        improved_tokens = improved_tokens.len(),
        diff_len = diff.len(),
        "generated diff"
    );

    diff
}

/// Row-major LCS length table of size (m+1)·(n+1).
struct LcsTable {
    cols: usize,
    cells: Vec<u32>,
}

impl LcsTable {
    fn build(original: &[&str], improved: &[&str]) -> Self {
        let cols = improved.len() + 1;
        let mut table = Self {
            cols,
            cells: vec![0; (original.len() + 1) * cols],
        };

        for i in 1..=original.len() {
            for j in 1..=improved.len() {
                let value = if original[i - 1] == improved[j - 1] {
                    table.at(i - 1, j - 1) + 1
                } else {
                    table.at(i - 1, j).max(table.at(i, j - 1))
                };
                table.cells[i * cols + j] = value;
            }
        }

        table
    }

    fn at(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.cols + j]
    }
}

/// Backtrack the LCS table from (m, n) to (0, 0).
///
/// On a tie between moving along the improved side and the original side,
/// the improved side wins, so ambiguous differences surface as additions.
/// Empty tokens (leading/trailing word slots of whitespace-bounded text)
/// carry no text and are not emitted.
fn compute_diff(original: &[&str], improved: &[&str]) -> Vec<DiffItem> {
    let table = LcsTable::build(original, improved);
    let mut items: VecDeque<DiffItem> = VecDeque::new();
    let (mut i, mut j) = (original.len(), improved.len());

    while i > 0 || j > 0 {
        let (kind, token) = if i > 0 && j > 0 && original[i - 1] == improved[j - 1] {
            i -= 1;
            j -= 1;
            (DiffKind::Equal, original[i])
        } else if j > 0 && (i == 0 || table.at(i, j - 1) >= table.at(i - 1, j)) {
            j -= 1;
            (DiffKind::Addition, improved[j])
        } else {
            i -= 1;
            (DiffKind::Deletion, original[i])
        };

        if !token.is_empty() {
            items.push_front(DiffItem::new(kind, token));
        }
    }

    merge_runs(items)
}

/// Concatenate every run of same-kind items into one item.
pub fn merge_runs(items: impl IntoIterator<Item = DiffItem>) -> Vec<DiffItem> {
    let mut merged: Vec<DiffItem> = Vec::new();
    for item in items {
        match merged.last_mut() {
            Some(last) if last.kind == item.kind => last.value.push_str(&item.value),
            _ => merged.push(item),
        }
    }
    if merged.is_empty() {
        merged.push(DiffItem::equal(""));
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_keeps_whitespace_runs() {
        assert_eq!(tokenize("a  b\tc"), vec!["a", "  ", "b", "\t", "c"]);
    }

    #[test]
    fn test_tokenize_edges() {
        assert_eq!(tokenize(" a"), vec!["", " ", "a"]);
        assert_eq!(tokenize("a "), vec!["a", " ", ""]);
        assert_eq!(tokenize("word"), vec!["word"]);
        assert_eq!(tokenize(""), vec![""]);
    }

    #[test]
    fn test_tokenize_unicode_whitespace() {
        assert_eq!(tokenize("né\u{a0}ça"), vec!["né", "\u{a0}", "ça"]);
        assert_eq!(tokenize("a\r\n\r\nb").concat(), "a\r\n\r\nb");
    }

    #[test]
    fn test_tokenize_matches_js_space_class() {
        assert_eq!(tokenize("a\u{feff}b"), vec!["a", "\u{feff}", "b"]);
        assert_eq!(tokenize("a\u{85}b"), vec!["a\u{85}b"]);
        assert_eq!(tokenize("a\u{3000}\u{2028}b"), vec!["a", "\u{3000}\u{2028}", "b"]);
    }

    #[test]
    fn test_lcs_table_length() {
        let a = tokenize("the quick fox");
        let b = tokenize("the slow fox");
        let table = LcsTable::build(&a, &b);
        // "the", " ", " ", "fox"
        assert_eq!(table.at(a.len(), b.len()), 4);
    }

    #[test]
    fn test_tie_prefers_addition_first_in_backtrack() {
        // Single differing word: backtrack meets the tie at (1, 1) and emits
        // the addition first, so the deletion ends up in front of it.
        let diff = generate_diff("old", "new");
        assert_eq!(
            diff,
            vec![DiffItem::deletion("old"), DiffItem::addition("new")]
        );
    }

    #[test]
    fn test_merge_runs_concatenates_in_order() {
        let merged = merge_runs(vec![
            DiffItem::equal("a"),
            DiffItem::equal(" "),
            DiffItem::addition("b"),
            DiffItem::addition("c"),
            DiffItem::equal("d"),
        ]);
        assert_eq!(
            merged,
            vec![
                DiffItem::equal("a "),
                DiffItem::addition("bc"),
                DiffItem::equal("d"),
            ]
        );
    }

    #[test]
    fn test_merge_runs_empty_input() {
        assert_eq!(merge_runs(Vec::new()), vec![DiffItem::equal("")]);
    }

    #[test]
    fn test_leading_whitespace_emits_no_empty_items() {
        let diff = generate_diff("a b", " b");
        assert!(diff.iter().all(|item| !item.value.is_empty()));
        assert_eq!(
            diff,
            vec![DiffItem::deletion("a"), DiffItem::equal(" b")]
        );
    }
}
