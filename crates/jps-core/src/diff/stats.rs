use crate::diff::engine::is_token_space;
use crate::diff::model::{DiffItem, DiffKind, DiffStats};

/// Words in `value`, split on the tokenizer's whitespace; whitespace-only and
/// empty values count 0.
fn word_count(value: &str) -> usize {
    value
        .split(is_token_space)
        .filter(|word| !word.is_empty())
        .count()
}

/// Word counts per item kind plus the number of change items.
pub fn get_diff_stats(diff: &[DiffItem]) -> DiffStats {
    diff.iter().fold(DiffStats::default(), |mut stats, item| {
        let words = word_count(&item.value);
        match item.kind {
            DiffKind::Addition => stats.additions += words,
            DiffKind::Deletion => stats.deletions += words,
            DiffKind::Equal => stats.unchanged += words,
        }
        if item.is_change() {
            stats.total_changes += 1;
        }
        stats
    })
}
