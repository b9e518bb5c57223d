//! File system access for the scanner and resolver.
//!
//! Lookups are synchronous and keyed by module path (see [`crate::paths`]).

use rustc_hash::FxHashMap;
use std::path::Path;

/// Synchronous path → content lookup.
pub trait FileSystem: Send + Sync {
    /// Contents of the file at `path`, or `None` if it cannot be read.
    fn read(&self, path: &str) -> Option<String>;

    /// Whether `path` names an existing regular file.
    fn is_file(&self, path: &str) -> bool;
}

/// In-memory file system keyed by absolute path.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: FxHashMap<String, String>,
}

impl MockFs {
    /// Create a file system holding `files` (path, contents).
    pub fn new<P, C>(files: impl IntoIterator<Item = (P, C)>) -> Self
    where
        P: Into<String>,
        C: Into<String>,
    {
        Self {
            files: files
                .into_iter()
                .map(|(path, contents)| (path.into(), contents.into()))
                .collect(),
        }
    }

    /// Add or replace a file.
    pub fn insert(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.files.insert(path.into(), contents.into());
    }
}

impl FileSystem for MockFs {
    fn read(&self, path: &str) -> Option<String> {
        self.files.get(path).cloned()
    }

    fn is_file(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }
}

/// The real disk. Invalid UTF-8 is replaced rather than rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealFs;

impl FileSystem for RealFs {
    fn read(&self, path: &str) -> Option<String> {
        tsbundle_util::fs::read_to_string_lossy(Path::new(path)).ok()
    }

    fn is_file(&self, path: &str) -> bool {
        Path::new(path).is_file()
    }
}
