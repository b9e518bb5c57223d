//! Build identification for `tsbundle version` and the `--json` summaries.

use serde::Serialize;
use std::fmt;

/// The current version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version of the `--json` summary format.
/// Bump this when changing fields in a way that breaks consumers.
pub const SCHEMA_VERSION: u32 = 1;

/// What this binary is, as printed by `tsbundle version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BuildInfo {
    pub name: &'static str,
    pub version: &'static str,
    /// Set through `TSBUNDLE_BUILD_GIT_HASH` at build time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub git_hash: Option<&'static str>,
    pub schema_version: u32,
}

impl BuildInfo {
    #[must_use]
    pub const fn current() -> Self {
        Self {
            name: "tsbundle",
            version: VERSION,
            git_hash: option_env!("TSBUNDLE_BUILD_GIT_HASH"),
            schema_version: SCHEMA_VERSION,
        }
    }
}

impl fmt::Display for BuildInfo {
    /// `tsbundle 0.2.0`, or `tsbundle 0.2.0 (abc1234)` with a git hash.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)?;
        if let Some(hash) = self.git_hash {
            write!(f, " ({hash})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_starts_with_name_and_version() {
        let info = BuildInfo::current();
        assert!(info.to_string().starts_with(&format!("tsbundle {VERSION}")));
    }

    #[test]
    fn test_display_with_git_hash() {
        let info = BuildInfo {
            git_hash: Some("abc1234"),
            ..BuildInfo::current()
        };
        assert_eq!(info.to_string(), format!("tsbundle {VERSION} (abc1234)"));
    }

    #[test]
    fn test_json_omits_missing_hash() {
        let info = BuildInfo {
            git_hash: None,
            ..BuildInfo::current()
        };
        let json = serde_json::to_value(info).unwrap();
        assert_eq!(json["name"], "tsbundle");
        assert_eq!(json["schema_version"], SCHEMA_VERSION);
        assert!(json.get("git_hash").is_none());
    }
}
