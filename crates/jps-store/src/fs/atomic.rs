//! Atomic write primitives
//!
//! temp→rename: readers see either the old or the new content

use crate::errors::{io_error, Result};
use std::fs;
use std::path::Path;

/// Atomically replace `target_path` with `content`
///
/// `key` is only used to label errors.
pub fn atomic_write(target_path: &Path, content: &[u8], key: &str) -> Result<()> {
    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|e| io_error("fs_create_dir", key, e))?;
    }

    let temp_path = target_path.with_extension("tmp");

    fs::write(&temp_path, content).map_err(|e| io_error("fs_write_temp", key, e))?;

    if let Err(e) = fs::rename(&temp_path, target_path) {
        let _ = fs::remove_file(&temp_path);
        return Err(io_error("fs_rename_temp", key, e));
    }

    Ok(())
}
