//! Where compiled output goes.
//!
//! The compiler renders one result per [`OutputTarget`]; deciding the targets
//! (and rejecting layouts that cannot work) happens here.

use super::graph::{ModuleGraph, ModuleId};
use super::CompileOptions;
use crate::error::Error;
use crate::paths;

/// One output file and the entry module it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub entry: ModuleId,
    pub abs_path: String,
}

/// Output files for a compile, in entry order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputPlan {
    targets: Vec<OutputTarget>,
}

impl OutputPlan {
    /// Derive the targets from the graph's entries and the output options.
    ///
    /// With an output file there must be at most one entry. Otherwise every
    /// entry maps to `<outdir or entry dir>/<entry stem>.js`.
    pub fn derive(graph: &ModuleGraph, options: &CompileOptions) -> Result<Self, Error> {
        let entries = graph.entries();

        if let Some(file) = &options.abs_output_file {
            if entries.len() > 1 {
                return Err(Error::OutputFileWithMultipleEntries);
            }
            let targets = entries
                .iter()
                .map(|&entry| OutputTarget {
                    entry,
                    abs_path: paths::normalize(file),
                })
                .collect();
            return Ok(Self { targets });
        }

        let mut targets: Vec<OutputTarget> = Vec::with_capacity(entries.len());
        for &entry in entries {
            let Some(module) = graph.get(entry) else {
                continue;
            };
            let dir = match &options.abs_output_dir {
                Some(dir) => dir.as_str(),
                None => paths::dirname(&module.path).unwrap_or("/"),
            };
            let abs_path = paths::join(dir, &format!("{}.js", paths::file_stem(&module.path)));

            if abs_path == module.path {
                return Err(Error::OverwriteInput { path: abs_path });
            }
            if targets.iter().any(|t| t.abs_path == abs_path) {
                return Err(Error::OutputCollision { path: abs_path });
            }
            targets.push(OutputTarget { entry, abs_path });
        }
        Ok(Self { targets })
    }

    #[must_use]
    pub fn targets(&self) -> &[OutputTarget] {
        &self.targets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::graph::{ModuleRecord, ModuleTable};

    fn graph(paths: &[&str]) -> ModuleGraph {
        let mut table = ModuleTable::new();
        let modules = paths
            .iter()
            .map(|p| ModuleRecord::failed(table.insert(p).id(), p))
            .collect();
        ModuleGraph::new(table, modules, (0..paths.len()).collect())
    }

    fn options(file: Option<&str>, dir: Option<&str>) -> CompileOptions {
        CompileOptions {
            bundle: true,
            abs_output_file: file.map(str::to_string),
            abs_output_dir: dir.map(str::to_string),
            omit_bootstrap_for_tests: false,
        }
    }

    #[test]
    fn test_output_file_is_the_sole_target() {
        let plan = OutputPlan::derive(&graph(&["/src/entry.ts"]), &options(Some("/out.js"), Some("/"))).unwrap();
        assert_eq!(
            plan.targets(),
            &[OutputTarget {
                entry: 0,
                abs_path: "/out.js".to_string()
            }]
        );
    }

    #[test]
    fn test_output_file_with_multiple_entries() {
        let err = OutputPlan::derive(&graph(&["/a.ts", "/b.ts"]), &options(Some("/out.js"), None)).unwrap_err();
        assert!(matches!(err, Error::OutputFileWithMultipleEntries));
        assert_eq!(
            err.to_string(),
            "Cannot use an output file when there are multiple entry points"
        );
    }

    #[test]
    fn test_outdir_uses_entry_stems() {
        let plan = OutputPlan::derive(&graph(&["/src/a.ts", "/src/lib/b.tsx"]), &options(None, Some("/dist"))).unwrap();
        let paths: Vec<&str> = plan.targets().iter().map(|t| t.abs_path.as_str()).collect();
        assert_eq!(paths, vec!["/dist/a.js", "/dist/b.js"]);
    }

    #[test]
    fn test_defaults_to_entry_directory() {
        let plan = OutputPlan::derive(&graph(&["/src/a.ts"]), &options(None, None)).unwrap();
        assert_eq!(plan.targets()[0].abs_path, "/src/a.js");
    }

    #[test]
    fn test_rejects_collisions_and_overwrites() {
        let err = OutputPlan::derive(&graph(&["/x/a.ts", "/y/a.ts"]), &options(None, Some("/dist"))).unwrap_err();
        assert!(matches!(err, Error::OutputCollision { ref path } if path == "/dist/a.js"));

        let err = OutputPlan::derive(&graph(&["/src/a.js"]), &options(None, None)).unwrap_err();
        assert!(matches!(err, Error::OverwriteInput { ref path } if path == "/src/a.js"));
        assert_eq!(err.to_string(), "Refusing to overwrite input file \"/src/a.js\"");
    }
}
