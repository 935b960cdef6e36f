//! Diff data types.
//!
//! The JSON shape (`{"type": "addition", "value": "..."}`) is the one the web
//! client renders inline accept/reject controls from, so field names are
//! fixed by serde attributes rather than Rust naming.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Classification of one diff item.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DiffKind {
    /// Present in both texts
    Equal,
    /// Introduced by the optimized text
    Addition,
    /// Present only in the original text
    Deletion,
}

/// One run of text with its classification.
///
/// A diff is an ordered `Vec<DiffItem>` in canonical form: no two adjacent
/// items share a kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffItem {
    #[serde(rename = "type")]
    pub kind: DiffKind,
    pub value: String,
}

impl DiffItem {
    pub fn new(kind: DiffKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    pub fn equal(value: impl Into<String>) -> Self {
        Self::new(DiffKind::Equal, value)
    }

    pub fn addition(value: impl Into<String>) -> Self {
        Self::new(DiffKind::Addition, value)
    }

    pub fn deletion(value: impl Into<String>) -> Self {
        Self::new(DiffKind::Deletion, value)
    }

    /// True for additions and deletions
    pub fn is_change(&self) -> bool {
        self.kind != DiffKind::Equal
    }
}

/// A reviewer's decision on one change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DiffAction {
    /// Take the optimizer's side (keep an addition, drop a deletion)
    Accept,
    /// Take the original's side (drop an addition, restore a deletion)
    Reject,
}

impl FromStr for DiffAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accept" => Ok(DiffAction::Accept),
            "reject" => Ok(DiffAction::Reject),
            other => Err(format!("unknown diff action `{}`", other)),
        }
    }
}

/// Stable identifier of a change within the diff it was produced from.
///
/// It is the item's position in that (immutable) diff. Decisions keyed by
/// `ChangeId` are folded in one pass, so removing one item can never shift
/// the target of another decision.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(transparent)]
pub struct ChangeId(pub usize);

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A set of accept/reject decisions, at most one per change.
pub type Decisions = BTreeMap<ChangeId, DiffAction>;

/// Word-count summary of a diff.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffStats {
    /// Words inside addition items
    pub additions: usize,
    /// Words inside deletion items
    pub deletions: usize,
    /// Words inside equal items
    pub unchanged: usize,
    /// Number of non-equal items (not words)
    #[serde(rename = "totalChanges")]
    pub total_changes: usize,
}
