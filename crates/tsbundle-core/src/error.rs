use std::path::PathBuf;
use thiserror::Error;

/// Core error type for tsbundle operations.
///
/// Problems in the code being bundled are not errors of this kind; they are
/// collected as diagnostics in a [`Log`](crate::log::Log).
#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read config at {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot use an output file when there are multiple entry points")]
    OutputFileWithMultipleEntries,

    #[error("Refusing to overwrite input file \"{path}\"")]
    OverwriteInput { path: String },

    #[error("Two output files share the same path \"{path}\"")]
    OutputCollision { path: String },
}
