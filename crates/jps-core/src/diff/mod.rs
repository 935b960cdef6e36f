//! Word-level diff between an original and an optimized text.
//!
//! [`generate_diff`] produces a canonical sequence of [`DiffItem`]s; the
//! reviewer's accept/reject decisions are folded back into text with
//! [`apply_decisions`] (or the single-index [`apply_change`]).
//!
//! Everything here is pure: no I/O, no shared state.

pub mod apply;
pub mod engine;
pub mod model;
pub mod stats;

pub use apply::{
    accept_all, apply_change, apply_decisions, changes, decide_all, diff_to_text, original_text,
    reject_all, resolve,
};
pub use engine::{generate_diff, merge_runs, tokenize};
pub use model::{ChangeId, Decisions, DiffAction, DiffItem, DiffKind, DiffStats};
pub use stats::get_diff_stats;
