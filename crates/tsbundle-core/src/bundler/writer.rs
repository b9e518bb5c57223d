//! Persisting compile results.

use super::CompileResult;
use crate::error::Error;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tsbundle_util::{fs::atomic_write, hash};

/// Whether a result had to touch the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteStatus {
    Written,
    /// The file already held these exact bytes; it was left alone.
    Unchanged,
}

/// A result that is now on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub bytes: usize,
    /// BLAKE3 of the contents, hex-encoded.
    pub hash: String,
    pub status: WriteStatus,
}

/// Write every result atomically, creating parent directories.
///
/// Stops at the first failure.
pub fn write_results(results: &[CompileResult]) -> Result<Vec<WrittenFile>, Error> {
    results.iter().map(write_result).collect()
}

fn write_result(result: &CompileResult) -> Result<WrittenFile, Error> {
    let path = Path::new(&result.abs_path);
    let bytes = result.contents.as_bytes();

    let status = if hash::file_matches(path, bytes) {
        WriteStatus::Unchanged
    } else {
        atomic_write(path, bytes).map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })?;
        WriteStatus::Written
    };

    Ok(WrittenFile {
        path: path.to_path_buf(),
        bytes: bytes.len(),
        hash: hash::blake3_bytes(bytes),
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn result(path: &Path, contents: &str) -> CompileResult {
        CompileResult {
            abs_path: path.to_string_lossy().into_owned(),
            contents: contents.to_string(),
        }
    }

    #[test]
    fn test_write_results() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("dist").join("out.js");

        let written = write_results(&[result(&out, "bootstrap({}, 0);\n")]).unwrap();
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].status, WriteStatus::Written);
        assert_eq!(written[0].bytes, 18);
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "bootstrap({}, 0);\n");

        let again = write_results(&[result(&out, "bootstrap({}, 0);\n")]).unwrap();
        assert_eq!(again[0].status, WriteStatus::Unchanged);
        assert_eq!(again[0].hash, written[0].hash);

        let changed = write_results(&[result(&out, "bootstrap({}, 1);\n")]).unwrap();
        assert_eq!(changed[0].status, WriteStatus::Written);
        assert_ne!(changed[0].hash, written[0].hash);
    }

    #[test]
    fn test_write_failure_names_the_path() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let out = blocker.join("out.js");

        let err = write_results(&[result(&out, "x")]).unwrap_err();
        assert!(matches!(err, Error::Write { ref path, .. } if path == &out));
    }
}
