//! Import specifier resolution.
//!
//! Resolves import specifiers to absolute module paths.
//!
//! ## Specifier Types
//!
//! - Relative: `./utils`, `../lib/foo`, `.`
//! - Absolute: `/abs/path/to/module`
//! - Bare: `lodash`, `@scope/pkg`, `pkg/sub/path`
//! - Built-in: `node:fs` (never resolved, never bundled)

use crate::fs::FileSystem;
use crate::paths;
use rustc_hash::FxHashMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Maps specifiers to files, trying candidate extensions in list order.
pub struct Resolver {
    fs: Arc<dyn FileSystem>,
    extensions: Vec<String>,
    /// (importer dir, specifier) -> result
    cache: RwLock<FxHashMap<(String, String), Option<String>>>,
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("extensions", &self.extensions)
            .finish_non_exhaustive()
    }
}

impl Resolver {
    /// Create a resolver over `fs`. The first matching extension wins.
    pub fn new<E: Into<String>>(fs: Arc<dyn FileSystem>, extensions: impl IntoIterator<Item = E>) -> Self {
        Self {
            fs,
            extensions: extensions.into_iter().map(Into::into).collect(),
            cache: RwLock::default(),
        }
    }

    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Resolve `specifier` as imported from a file in `importer_dir`.
    ///
    /// `None` means no candidate exists; deciding whether that matters is
    /// left to the caller.
    pub fn resolve(&self, importer_dir: &str, specifier: &str) -> Option<String> {
        let key = (importer_dir.to_string(), specifier.to_string());
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return hit.clone();
        }

        let result = self.resolve_uncached(importer_dir, specifier);
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, result.clone());
        result
    }

    /// Resolve an entry point given as an absolute path, with or without
    /// extension.
    pub fn resolve_entry(&self, path: &str) -> Option<String> {
        self.load_file_or_directory(&paths::normalize(path))
    }

    fn resolve_uncached(&self, importer_dir: &str, specifier: &str) -> Option<String> {
        if specifier.starts_with("node:") {
            return None;
        }
        if is_relative(specifier) || paths::is_absolute(specifier) {
            let target = paths::join(importer_dir, specifier);
            return self.load_file_or_directory(&target);
        }
        self.resolve_bare(importer_dir, specifier)
    }

    /// Literal path, then each extension, then `index` + each extension.
    fn load_file_or_directory(&self, target: &str) -> Option<String> {
        self.load_as_file(target)
            .or_else(|| self.load_index(target))
    }

    fn load_as_file(&self, target: &str) -> Option<String> {
        if self.fs.is_file(target) {
            return Some(target.to_string());
        }
        self.extensions
            .iter()
            .map(|ext| format!("{target}{ext}"))
            .find(|candidate| self.fs.is_file(candidate))
    }

    fn load_index(&self, dir: &str) -> Option<String> {
        let index = paths::join(dir, "index");
        self.extensions
            .iter()
            .map(|ext| format!("{index}{ext}"))
            .find(|candidate| self.fs.is_file(candidate))
    }

    /// Walk up from `importer_dir` through `node_modules/<pkg>`.
    fn resolve_bare(&self, importer_dir: &str, specifier: &str) -> Option<String> {
        let (pkg_name, subpath) = parse_bare_specifier(specifier)?;

        let mut current = Some(importer_dir);
        while let Some(dir) = current {
            let pkg_dir = paths::join(dir, &format!("node_modules/{pkg_name}"));
            let found = match subpath {
                Some(sub) => self.load_file_or_directory(&paths::join(&pkg_dir, sub)),
                None => self.load_package_entry(&pkg_dir),
            };
            if found.is_some() {
                return found;
            }
            current = paths::dirname(dir);
        }
        None
    }

    /// `module`, then `main` from package.json, then the package's index file.
    fn load_package_entry(&self, pkg_dir: &str) -> Option<String> {
        if let Some(text) = self.fs.read(&paths::join(pkg_dir, "package.json")) {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                for field in ["module", "main"] {
                    let Some(entry) = json.get(field).and_then(serde_json::Value::as_str) else {
                        continue;
                    };
                    if let Some(found) = self.load_file_or_directory(&paths::join(pkg_dir, entry)) {
                        return Some(found);
                    }
                }
            }
        }
        self.load_index(pkg_dir)
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}

/// Split a bare specifier into package name and subpath.
fn parse_bare_specifier(specifier: &str) -> Option<(&str, Option<&str>)> {
    if specifier.is_empty() {
        return None;
    }
    let name_end = if specifier.starts_with('@') {
        // @scope/pkg[/subpath]
        let scope_end = specifier.find('/')?;
        specifier[scope_end + 1..]
            .find('/')
            .map(|i| scope_end + 1 + i)
    } else {
        specifier.find('/')
    };
    Some(match name_end {
        Some(end) => (&specifier[..end], Some(&specifier[end + 1..]).filter(|s| !s.is_empty())),
        None => (specifier, None),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{MockFs, RealFs};
    use tempfile::tempdir;

    fn resolver(files: &[(&str, &str)], extensions: &[&str]) -> Resolver {
        let fs = MockFs::new(files.iter().copied());
        Resolver::new(Arc::new(fs), extensions.iter().copied())
    }

    #[test]
    fn test_parse_bare_specifier() {
        assert_eq!(parse_bare_specifier("lodash"), Some(("lodash", None)));
        assert_eq!(parse_bare_specifier("lodash/get"), Some(("lodash", Some("get"))));
        assert_eq!(parse_bare_specifier("@types/node"), Some(("@types/node", None)));
        assert_eq!(
            parse_bare_specifier("@babel/core/lib/parse"),
            Some(("@babel/core", Some("lib/parse")))
        );
        assert_eq!(parse_bare_specifier("@scope"), None);
    }

    #[test]
    fn test_extension_list_order_breaks_ties() {
        let files = [("/x.ts", ""), ("/x.tsx", "")];
        assert_eq!(
            resolver(&files, &[".tsx", ".ts"]).resolve("/", "./x").as_deref(),
            Some("/x.tsx")
        );
        assert_eq!(
            resolver(&files, &[".ts", ".tsx"]).resolve("/", "./x").as_deref(),
            Some("/x.ts")
        );
    }

    #[test]
    fn test_literal_path_wins_over_extensions() {
        let r = resolver(&[("/a.js", ""), ("/a.js.ts", "")], &[".ts"]);
        assert_eq!(r.resolve("/", "./a.js").as_deref(), Some("/a.js"));
    }

    #[test]
    fn test_relative_and_absolute() {
        let r = resolver(&[("/src/lib/util.ts", ""), ("/src/main.ts", "")], &[".ts"]);
        assert_eq!(r.resolve("/src/lib", "../main").as_deref(), Some("/src/main.ts"));
        assert_eq!(r.resolve("/src", "./lib/util").as_deref(), Some("/src/lib/util.ts"));
        assert_eq!(r.resolve("/other", "/src/main").as_deref(), Some("/src/main.ts"));
        assert_eq!(r.resolve("/src", "./nope"), None);
    }

    #[test]
    fn test_directory_index() {
        let r = resolver(&[("/src/lib/index.tsx", "")], &[".ts", ".tsx"]);
        assert_eq!(r.resolve("/src", "./lib").as_deref(), Some("/src/lib/index.tsx"));
        assert_eq!(r.resolve("/src/lib/deep", "..").as_deref(), Some("/src/lib/index.tsx"));
    }

    #[test]
    fn test_bare_package_fields() {
        let r = resolver(
            &[
                ("/node_modules/esm/package.json", r#"{ "main": "cjs.js", "module": "esm.js" }"#),
                ("/node_modules/esm/esm.js", ""),
                ("/node_modules/esm/cjs.js", ""),
                ("/node_modules/plain/package.json", r#"{ "main": "./lib/entry" }"#),
                ("/node_modules/plain/lib/entry.js", ""),
                ("/node_modules/bare/index.js", ""),
                ("/node_modules/@scope/pkg/sub/file.ts", ""),
            ],
            &[".ts", ".js"],
        );
        assert_eq!(r.resolve("/src/app", "esm").as_deref(), Some("/node_modules/esm/esm.js"));
        assert_eq!(r.resolve("/", "plain").as_deref(), Some("/node_modules/plain/lib/entry.js"));
        assert_eq!(r.resolve("/a", "bare").as_deref(), Some("/node_modules/bare/index.js"));
        assert_eq!(
            r.resolve("/a/b", "@scope/pkg/sub/file").as_deref(),
            Some("/node_modules/@scope/pkg/sub/file.ts")
        );
        assert_eq!(r.resolve("/", "missing"), None);
    }

    #[test]
    fn test_nearest_node_modules_wins() {
        let r = resolver(
            &[("/node_modules/dep/index.js", "outer"), ("/app/node_modules/dep/index.js", "inner")],
            &[".js"],
        );
        assert_eq!(r.resolve("/app/src", "dep").as_deref(), Some("/app/node_modules/dep/index.js"));
    }

    #[test]
    fn test_node_builtins_never_resolve() {
        let r = resolver(&[("/node_modules/node:fs/index.js", "")], &[".js"]);
        assert_eq!(r.resolve("/", "node:fs"), None);
    }

    #[test]
    fn test_results_are_cached() {
        let r = resolver(&[("/a.ts", "")], &[".ts"]);
        assert_eq!(r.resolve("/", "./a").as_deref(), Some("/a.ts"));
        assert_eq!(r.resolve("/", "./a").as_deref(), Some("/a.ts"));
        assert_eq!(r.cache.read().unwrap().len(), 1);
    }

    #[test]
    fn test_resolve_entry_without_extension() {
        let r = resolver(&[("/entry.ts", "")], &[".tsx", ".ts"]);
        assert_eq!(r.resolve_entry("/entry").as_deref(), Some("/entry.ts"));
        assert_eq!(r.resolve_entry("/./entry.ts").as_deref(), Some("/entry.ts"));
    }

    #[test]
    fn test_resolve_on_disk() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        std::fs::create_dir(&src).unwrap();
        std::fs::write(src.join("index.ts"), "import './utils';").unwrap();
        std::fs::write(src.join("utils.ts"), "export const x = 1;").unwrap();

        let r = Resolver::new(Arc::new(RealFs), [".ts"]);
        let src_dir = paths::module_path(&src, dir.path());
        let found = r.resolve(&src_dir, "./utils").unwrap();
        assert!(found.ends_with("/src/utils.ts"));
    }
}
