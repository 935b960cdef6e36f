//! Diff command

use std::path::PathBuf;

use clap::Args;
use jps_core::diff::{
    apply_decisions, changes, generate_diff, get_diff_stats, resolve, ChangeId, Decisions,
    DiffAction, DiffItem, DiffKind, DiffStats,
};
use serde::Serialize;

#[derive(Debug, Args)]
pub struct DiffArgs {
    /// File with the original posting text
    pub original: PathBuf,

    /// File with the optimized posting text
    pub improved: PathBuf,

    /// Print JSON instead of an inline rendering
    #[arg(long)]
    pub json: bool,

    /// Also print word statistics
    #[arg(long)]
    pub stats: bool,

    /// Accept these change ids
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub accept: Vec<usize>,

    /// Reject these change ids
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    pub reject: Vec<usize>,
}

#[derive(Debug, Serialize)]
struct DiffOutput {
    diff: Vec<DiffItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stats: Option<DiffStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

pub fn execute(args: DiffArgs) -> Result<(), Box<dyn std::error::Error>> {
    let original = std::fs::read_to_string(&args.original)
        .map_err(|e| format!("cannot read {}: {}", args.original.display(), e))?;
    let improved = std::fs::read_to_string(&args.improved)
        .map_err(|e| format!("cannot read {}: {}", args.improved.display(), e))?;

    let diff = generate_diff(&original, &improved);
    let decisions = collect_decisions(&diff, &args.accept, &args.reject)?;

    let (shown, text) = if decisions.is_empty() {
        (diff, None)
    } else {
        let text = apply_decisions(&diff, &decisions);
        (resolve(&diff, &decisions), Some(text))
    };
    let stats = args.stats.then(|| get_diff_stats(&shown));

    if args.json {
        let output = DiffOutput {
            diff: shown,
            stats,
            text,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    match text {
        Some(text) => println!("{}", text),
        None => println!("{}", render_inline(&shown)),
    }

    let pending: Vec<String> = changes(&shown)
        .map(|(id, item)| format!("  [{}] {} {:?}", id, sign(item.kind), item.value))
        .collect();
    if !pending.is_empty() {
        println!("Pending changes:");
        for line in pending {
            println!("{}", line);
        }
    }

    if let Some(stats) = stats {
        println!("Stats:");
        println!("  additions: {}", stats.additions);
        println!("  deletions: {}", stats.deletions);
        println!("  unchanged: {}", stats.unchanged);
        println!("  total_changes: {}", stats.total_changes);
    }

    Ok(())
}

fn collect_decisions(
    diff: &[DiffItem],
    accept: &[usize],
    reject: &[usize],
) -> Result<Decisions, String> {
    let mut decisions = Decisions::new();
    let tagged = accept
        .iter()
        .map(|id| (*id, DiffAction::Accept))
        .chain(reject.iter().map(|id| (*id, DiffAction::Reject)));

    for (index, action) in tagged {
        let id = ChangeId(index);
        if !changes(diff).any(|(change, _)| change == id) {
            return Err(format!("no change with id {}", id));
        }
        if decisions.insert(id, action).is_some_and(|prev| prev != action) {
            return Err(format!("change {} is both accepted and rejected", id));
        }
    }
    Ok(decisions)
}

fn sign(kind: DiffKind) -> &'static str {
    match kind {
        DiffKind::Addition => "+",
        DiffKind::Deletion => "-",
        DiffKind::Equal => " ",
    }
}

/// `[-deleted-]` / `{+added+}` markup in the style of wdiff
fn render_inline(diff: &[DiffItem]) -> String {
    diff.iter()
        .map(|item| match item.kind {
            DiffKind::Equal => item.value.clone(),
            DiffKind::Deletion => format!("[-{}-]", item.value),
            DiffKind::Addition => format!("{{+{}+}}", item.value),
        })
        .collect()
}
