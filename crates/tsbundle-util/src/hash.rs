//! Content hashes for output files.

use std::fs::File;
use std::io;
use std::path::Path;

/// BLAKE3 digest of a file, hex-encoded. Streams the content.
///
/// # Errors
/// Returns an error if the file cannot be opened or read.
pub fn blake3_file(path: &Path) -> io::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_reader(File::open(path)?)?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// BLAKE3 digest of a byte slice, hex-encoded.
#[must_use]
pub fn blake3_bytes(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Whether the file at `path` already holds exactly `bytes`.
///
/// A missing or unreadable file never matches.
#[must_use]
pub fn file_matches(path: &Path, bytes: &[u8]) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() == bytes.len() as u64 => {
            blake3_file(path).is_ok_and(|digest| digest == blake3_bytes(bytes))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HELLO_WORLD: &str = "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24";

    #[test]
    fn test_blake3_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"hello world").unwrap();
        file.flush().unwrap();

        assert_eq!(blake3_file(file.path()).unwrap(), HELLO_WORLD);
    }

    #[test]
    fn test_blake3_bytes() {
        assert_eq!(blake3_bytes(b"hello world"), HELLO_WORLD);
    }

    #[test]
    fn test_file_matches() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"bootstrap({}, 0);\n").unwrap();
        file.flush().unwrap();

        assert!(file_matches(file.path(), b"bootstrap({}, 0);\n"));
        assert!(!file_matches(file.path(), b"bootstrap({}, 1);\n"));
        assert!(!file_matches(file.path(), b"short"));
        assert!(!file_matches(Path::new("/nonexistent/out.js"), b""));
    }
}
