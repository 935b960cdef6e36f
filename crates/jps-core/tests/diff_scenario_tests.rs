#![allow(clippy::unwrap_used, clippy::expect_used)]

use jps_core::diff::{
    accept_all, apply_change, apply_decisions, changes, diff_to_text, generate_diff,
    get_diff_stats, original_text, reject_all, resolve, ChangeId, Decisions, DiffAction,
    DiffItem, DiffKind,
};

#[test]
fn test_team_player_example() {
    // GIVEN the original and optimized requirement line
    let diff = generate_diff("Must be a team player", "Must be collaborative");

    // THEN the shared prefix is equal, the old words deleted, the new one added
    assert_eq!(
        diff,
        vec![
            DiffItem::equal("Must be"),
            DiffItem::deletion(" a team"),
            DiffItem::equal(" "),
            DiffItem::deletion("player"),
            DiffItem::addition("collaborative"),
        ]
    );

    // AND accepting the addition reconstructs the optimized text
    assert_eq!(
        apply_change(&diff, 4, DiffAction::Accept),
        "Must be collaborative"
    );

    // AND accepting every deletion together with the addition does too
    let mut decisions = Decisions::new();
    for (id, item) in changes(&diff) {
        let action = match item.kind {
            DiffKind::Addition | DiffKind::Deletion => DiffAction::Accept,
            DiffKind::Equal => unreachable!(),
        };
        decisions.insert(id, action);
    }
    assert_eq!(apply_decisions(&diff, &decisions), "Must be collaborative");
}

#[test]
fn test_degenerate_inputs() {
    assert_eq!(generate_diff("", ""), vec![DiffItem::equal("")]);
    assert_eq!(generate_diff("", "new text"), vec![DiffItem::equal("new text")]);
    assert_eq!(generate_diff("old text", ""), vec![DiffItem::equal("old text")]);
}

#[test]
fn test_identical_texts_are_one_equal_item() {
    let text = "Senior engineer,  remote\n\nBenefits: lots";
    assert_eq!(generate_diff(text, text), vec![DiffItem::equal(text)]);
}

#[test]
fn test_whitespace_changes_are_visible() {
    let diff = generate_diff("a b", "a  b");
    assert_eq!(diff_to_text(&diff), "a  b");
    assert_eq!(original_text(&diff), "a b");
    assert!(diff.iter().any(|item| item.is_change()));
}

#[test]
fn test_batch_decisions_are_positionally_stable() {
    // GIVEN a diff with several changes
    let diff = generate_diff(
        "We need a rockstar ninja developer",
        "We need an experienced developer",
    );
    let ids: Vec<ChangeId> = changes(&diff).map(|(id, _)| id).collect();
    assert!(ids.len() >= 2);

    // WHEN rejecting every change in one batch
    let decisions: Decisions = ids.iter().map(|id| (*id, DiffAction::Reject)).collect();

    // THEN the original comes back, regardless of item removal order
    assert_eq!(
        apply_decisions(&diff, &decisions),
        "We need a rockstar ninja developer"
    );
}

#[test]
fn test_partial_review_keeps_pending_changes() {
    let diff = generate_diff("Must be a team player", "Must be collaborative");
    let first = changes(&diff).map(|(id, _)| id).next().unwrap();

    let mut decisions = Decisions::new();
    decisions.insert(first, DiffAction::Reject);
    let next = resolve(&diff, &decisions);

    // The rejected deletion is plain text now; the rest is still reviewable
    assert_eq!(changes(&next).count(), 2);
    assert_eq!(accept_all(&next), "Must be a team collaborative");
    assert_eq!(reject_all(&next), "Must be a team player");
}

#[test]
fn test_stats_for_example() {
    let diff = generate_diff("Must be a team player", "Must be collaborative");
    let stats = get_diff_stats(&diff);
    assert_eq!(stats.additions, 1);
    assert_eq!(stats.deletions, 3);
    assert_eq!(stats.unchanged, 2);
    assert_eq!(stats.total_changes, 3);
}

#[test]
fn test_diff_json_shape() {
    let diff = generate_diff("old", "new");
    let json = serde_json::to_value(&diff).unwrap();
    assert_eq!(
        json,
        serde_json::json!([
            {"type": "deletion", "value": "old"},
            {"type": "addition", "value": "new"},
        ])
    );
}
