//! Module paths.
//!
//! Modules are identified by absolute paths with `/` separators, so the same
//! logic serves the in-memory file system used by tests and the real disk.

use std::path::{Path, PathBuf};

/// Whether `path` is absolute (`/x`, or `C:/x` on Windows-style input).
#[must_use]
pub fn is_absolute(path: &str) -> bool {
    path.starts_with('/') || has_drive_prefix(path)
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'/'
}

/// Lexically normalize a path: collapse `.`, `..` and repeated separators.
///
/// `..` never climbs above the root of an absolute path.
#[must_use]
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let (root, rest) = if let Some(rest) = path.strip_prefix('/') {
        ("/".to_string(), rest)
    } else if has_drive_prefix(&path) {
        (path[..3].to_string(), &path[3..])
    } else {
        (String::new(), path.as_str())
    };

    let mut parts: Vec<&str> = Vec::new();
    for part in rest.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if root.is_empty() {
                    parts.push("..");
                }
            }
            _ => parts.push(part),
        }
    }

    let joined = parts.join("/");
    if root.is_empty() && joined.is_empty() {
        ".".to_string()
    } else {
        root + &joined
    }
}

/// Join `rel` onto `base` and normalize. An absolute `rel` wins.
#[must_use]
pub fn join(base: &str, rel: &str) -> String {
    if is_absolute(rel) {
        normalize(rel)
    } else {
        normalize(&format!("{base}/{rel}"))
    }
}

/// Parent directory of a normalized path; `None` at the root.
#[must_use]
pub fn dirname(path: &str) -> Option<&str> {
    let idx = path.rfind('/')?;
    if idx + 1 == path.len() {
        // The root itself
        return None;
    }
    let root_len = if has_drive_prefix(path) { 3 } else { 1 };
    if idx < root_len {
        Some(&path[..root_len])
    } else {
        Some(&path[..idx])
    }
}

/// Final path component without its extension.
#[must_use]
pub fn file_stem(path: &str) -> &str {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(idx) => &name[..idx],
    }
}

/// Extension of the final component, including the dot.
#[must_use]
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(idx) => Some(&name[idx..]),
    }
}

/// Convert an OS path into module path form.
///
/// The path is canonicalized when it exists (without the `\\?\` prefix on
/// Windows) and made absolute against `cwd` otherwise.
#[must_use]
pub fn module_path(path: &Path, cwd: &Path) -> String {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    };
    let resolved = dunce::canonicalize(&absolute).unwrap_or(absolute);
    normalize(&resolved.to_string_lossy())
}

/// Find the project root by walking up from `cwd` looking for
/// `tsbundle.json`, `package.json` or `.git`.
#[must_use]
pub fn project_root(cwd: &Path) -> Option<PathBuf> {
    let mut current = cwd.to_path_buf();

    loop {
        if current.join(crate::config::CONFIG_FILE_NAME).exists()
            || current.join("package.json").exists()
            || current.join(".git").exists()
        {
            return Some(current);
        }

        if !current.pop() {
            return None;
        }
    }
}
