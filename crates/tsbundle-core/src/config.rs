use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory when no `--config` is given.
pub const CONFIG_FILE_NAME: &str = "tsbundle.json";

/// Extensions tried, in order, when an import specifier has none.
pub const DEFAULT_RESOLVE_EXTENSIONS: &[&str] = &[".tsx", ".ts", ".jsx", ".js", ".mjs", ".cjs"];

/// Runtime configuration for the tsbundle CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Current working directory.
    pub cwd: PathBuf,

    /// Whether to emit JSON logs.
    pub json_logs: bool,

    /// Verbosity level (0 = INFO, 1 = DEBUG, 2+ = TRACE).
    pub verbosity: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            json_logs: false,
            verbosity: 0,
        }
    }
}

impl Config {
    /// Create a new config with the given working directory.
    #[must_use]
    pub fn new(cwd: PathBuf) -> Self {
        Self {
            cwd,
            ..Default::default()
        }
    }

    /// Set verbosity level.
    #[must_use]
    pub fn with_verbosity(mut self, verbosity: u8) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set JSON log output.
    #[must_use]
    pub fn with_json_logs(mut self, json: bool) -> Self {
        self.json_logs = json;
        self
    }
}

/// Bundle settings read from `tsbundle.json`.
///
/// Relative paths are interpreted against the directory holding the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct BundleConfig {
    pub entry_points: Vec<PathBuf>,
    pub outfile: Option<PathBuf>,
    pub outdir: Option<PathBuf>,
    /// Link modules into one loader call (false: per-file transform only).
    pub bundle: bool,
    pub resolve_extensions: Vec<String>,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            entry_points: Vec::new(),
            outfile: None,
            outdir: None,
            bundle: true,
            resolve_extensions: DEFAULT_RESOLVE_EXTENSIONS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl BundleConfig {
    /// Read and parse a config file, making its paths absolute.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        let base = path.parent().unwrap_or(Path::new("."));
        Ok(config.relative_to(base))
    }

    /// Load `tsbundle.json` from `dir` if it exists.
    pub fn discover(dir: &Path) -> Result<Option<Self>, Error> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path).map(Some)
        } else {
            Ok(None)
        }
    }

    fn relative_to(mut self, base: &Path) -> Self {
        let absolute = |p: PathBuf| if p.is_absolute() { p } else { base.join(p) };
        self.entry_points = self.entry_points.into_iter().map(absolute).collect();
        self.outfile = self.outfile.map(absolute);
        self.outdir = self.outdir.map(absolute);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_bundle_config_defaults() {
        let config = BundleConfig::default();
        assert!(config.bundle);
        assert_eq!(config.resolve_extensions[0], ".tsx");
        assert_eq!(config.resolve_extensions[1], ".ts");
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{ "entryPoints": ["src/main.ts"], "outfile": "dist/out.js", "resolveExtensions": [".ts"] }"#,
        )
        .unwrap();

        let config = BundleConfig::load(&path).unwrap();
        assert_eq!(config.entry_points, vec![dir.path().join("src/main.ts")]);
        assert_eq!(config.outfile, Some(dir.path().join("dist/out.js")));
        assert_eq!(config.outdir, None);
        assert!(config.bundle);
        assert_eq!(config.resolve_extensions, vec![".ts".to_string()]);
    }

    #[test]
    fn test_load_reports_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, r#"{ "entryPoint": "typo.ts" }"#).unwrap();

        assert!(matches!(
            BundleConfig::load(&path),
            Err(Error::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = BundleConfig::load(&dir.path().join("nope.json")).unwrap_err();
        assert!(matches!(err, Error::ConfigRead { .. }));
    }

    #[test]
    fn test_discover() {
        let dir = tempdir().unwrap();
        assert!(BundleConfig::discover(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), r#"{ "bundle": false }"#).unwrap();
        let config = BundleConfig::discover(dir.path()).unwrap().unwrap();
        assert!(!config.bundle);
    }

    #[test]
    fn test_config_builder() {
        let config = Config::new(PathBuf::from("/project"))
            .with_verbosity(2)
            .with_json_logs(true);
        assert_eq!(config.cwd, PathBuf::from("/project"));
        assert_eq!(config.verbosity, 2);
        assert!(config.json_logs);
    }
}
