use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use jps_core::errors::Result;
use jps_core::KeyValueStore;

use crate::errors::io_error;
use crate::fs::atomic::atomic_write;

/// File name that stores `key`
///
/// ASCII letters, digits, `-` and `_` pass through; every other byte is
/// written as `%XX`, so distinct keys never share a file and no key can
/// escape the root directory.
pub fn file_name_for_key(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 5);
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'-' || byte == b'_' {
            name.push(byte as char);
        } else {
            name.push_str(&format!("%{:02X}", byte));
        }
    }
    name.push_str(".json");
    name
}

/// Key-value store over a directory of JSON files
#[derive(Debug, Clone)]
pub struct FsKvStore {
    root: PathBuf,
}

impl FsKvStore {
    /// Store rooted at `root`; the directory is created on first write
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(file_name_for_key(key))
    }
}

impl KeyValueStore for FsKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error("fs_get", key, e)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        atomic_write(&self.path_for(key), value.as_bytes(), key)
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error("fs_remove", key, e)),
        }
    }
}
