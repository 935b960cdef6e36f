//! Folding reviewer decisions back into text.
//!
//! Two entry points:
//! - [`apply_change`]: one decision by position, returns text. Removing an
//!   item shifts later positions; callers batching decisions through it
//!   must account for that themselves.
//! - [`apply_decisions`] / [`resolve`]: any number of decisions keyed by
//!   [`ChangeId`], folded in a single pass over the unmodified diff.

use crate::diff::engine::merge_runs;
use crate::diff::model::{ChangeId, Decisions, DiffAction, DiffItem, DiffKind};

/// Current text of a diff: every item except deletions.
pub fn diff_to_text(diff: &[DiffItem]) -> String {
    diff.iter()
        .filter(|item| item.kind != DiffKind::Deletion)
        .map(|item| item.value.as_str())
        .collect()
}

/// Original-side text of a diff: every item except additions.
pub fn original_text(diff: &[DiffItem]) -> String {
    diff.iter()
        .filter(|item| item.kind != DiffKind::Addition)
        .map(|item| item.value.as_str())
        .collect()
}

/// Apply one accept/reject decision by position and return the resulting text.
///
/// | action | addition | deletion |
/// |---|---|---|
/// | accept | becomes equal | removed |
/// | reject | removed | becomes equal |
///
/// Equal items and out-of-range indices are no-ops; the text of the
/// unmodified diff is returned.
pub fn apply_change(diff: &[DiffItem], change_index: usize, action: DiffAction) -> String {
    let mut updated: Vec<DiffItem> = diff.to_vec();

    let Some(change) = updated.get(change_index) else {
        return diff_to_text(&updated);
    };

    match (action, change.kind) {
        (DiffAction::Accept, DiffKind::Addition) | (DiffAction::Reject, DiffKind::Deletion) => {
            updated[change_index].kind = DiffKind::Equal;
        }
        (DiffAction::Accept, DiffKind::Deletion) | (DiffAction::Reject, DiffKind::Addition) => {
            updated.remove(change_index);
        }
        (_, DiffKind::Equal) => {}
    }

    diff_to_text(&updated)
}

/// Every change item of a diff with its stable id.
pub fn changes(diff: &[DiffItem]) -> impl Iterator<Item = (ChangeId, &DiffItem)> {
    diff.iter()
        .enumerate()
        .filter(|(_, item)| item.is_change())
        .map(|(index, item)| (ChangeId(index), item))
}

/// Fold a set of decisions into a new canonical diff.
///
/// Decided changes become `equal` or disappear; undecided changes stay
/// pending so the reviewer can keep working on the result. Decisions that
/// name an equal item or an id outside the diff are ignored.
pub fn resolve(diff: &[DiffItem], decisions: &Decisions) -> Vec<DiffItem> {
    let resolved = diff.iter().enumerate().filter_map(|(index, item)| {
        match (decisions.get(&ChangeId(index)), item.kind) {
            (_, DiffKind::Equal) | (None, _) => Some(item.clone()),
            (Some(DiffAction::Accept), DiffKind::Addition)
            | (Some(DiffAction::Reject), DiffKind::Deletion) => {
                Some(DiffItem::equal(item.value.clone()))
            }
            (Some(DiffAction::Accept), DiffKind::Deletion)
            | (Some(DiffAction::Reject), DiffKind::Addition) => None,
        }
    });

    let ignored = decisions
        .keys()
        .filter(|id| diff.get(id.0).map_or(true, |item| !item.is_change()))
        .count();
    if ignored > 0 {
        tracing::debug!(ignored, "decisions referencing no change were ignored");
    }

    merge_runs(resolved)
}

/// Fold a set of decisions and return the resulting text.
///
/// Undecided changes keep the optimizer's proposal, so an empty decision set
/// yields the improved text.
pub fn apply_decisions(diff: &[DiffItem], decisions: &Decisions) -> String {
    diff_to_text(&resolve(diff, decisions))
}

/// Same action on every change.
pub fn decide_all(diff: &[DiffItem], action: DiffAction) -> Decisions {
    changes(diff).map(|(id, _)| (id, action)).collect()
}

/// Text with every change accepted (the improved text).
pub fn accept_all(diff: &[DiffItem]) -> String {
    apply_decisions(diff, &decide_all(diff, DiffAction::Accept))
}

/// Text with every change rejected (the original text).
pub fn reject_all(diff: &[DiffItem]) -> String {
    apply_decisions(diff, &decide_all(diff, DiffAction::Reject))
}
