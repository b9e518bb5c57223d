//! File helpers for reading sources and persisting outputs.

use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Read a source file, replacing invalid UTF-8 with U+FFFD.
///
/// Valid files are returned without an extra copy.
///
/// # Errors
/// Returns an error if the file cannot be read.
pub fn read_to_string_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    })
}

/// Replace the contents of `path` so readers never observe a partial file.
///
/// Missing parent directories are created. The data goes to a temporary file
/// next to the target, is flushed to disk, then renamed over it.
///
/// # Errors
/// Returns an error if a directory cannot be created or the write or rename
/// fails. The temporary file is removed on failure.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_read_valid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry.ts");
        fs::write(&path, "let foo;").unwrap();

        assert_eq!(read_to_string_lossy(&path).unwrap(), "let foo;");
    }

    #[test]
    fn test_read_replaces_invalid_utf8() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("entry.js");
        fs::write(&path, [b'l', b'e', b't', b' ', 0xff, b';']).unwrap();

        assert_eq!(read_to_string_lossy(&path).unwrap(), "let \u{FFFD};");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempdir().unwrap();
        let err = read_to_string_lossy(&dir.path().join("nope.ts")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_atomic_write_replaces_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.js");

        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "second");

        // Only the target is left behind
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("out.js")]);
    }

    #[test]
    fn test_atomic_write_creates_parent_dirs() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dist").join("nested").join("out.js");

        atomic_write(&path, b"bootstrap({}, 0);\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "bootstrap({}, 0);\n");
    }
}
