//! JavaScript/TypeScript bundler.
//!
//! ## Usage
//!
//! ```
//! use std::sync::Arc;
//! use tsbundle_core::bundler::{scan_bundle, CompileOptions, OutputPlan, ParseOptions, Resolver};
//! use tsbundle_core::fs::MockFs;
//! use tsbundle_core::log::Log;
//!
//! let fs = Arc::new(MockFs::new([("/entry.ts", "declare let x: number\nlet foo")]));
//! let resolver = Resolver::new(fs.clone(), [".tsx", ".ts"]);
//!
//! let log = Log::new();
//! let entries = vec!["/entry.ts".to_string()];
//! let graph = scan_bundle(&log, fs.as_ref(), &resolver, &entries, ParseOptions { is_bundling: true });
//! assert!(log.join().is_empty());
//!
//! let options = CompileOptions {
//!     bundle: true,
//!     abs_output_file: Some("/out.js".to_string()),
//!     abs_output_dir: None,
//!     omit_bootstrap_for_tests: true,
//! };
//! let plan = OutputPlan::derive(&graph, &options)?;
//! let results = graph.compile(&Log::new(), &plan, &options);
//! assert!(results[0].contents.contains("    let foo;\n"));
//! # Ok::<(), tsbundle_core::Error>(())
//! ```
//!
//! ## Architecture
//!
//! 1. **Scan** - Resolve, read and parse every reachable module, assigning ids
//! 2. **Plan** - Decide output files from the entries and options
//! 3. **Link** - Render each module as a function, wrap them in the loader call
//! 4. **Write** - Persist results (separate from compiling)

mod graph;
mod link;
mod output;
mod resolve;
pub mod runtime;
mod scan;
mod writer;

pub use graph::{Discovery, ModuleGraph, ModuleId, ModuleRecord, ModuleTable};
pub use output::{OutputPlan, OutputTarget};
pub use resolve::Resolver;
pub use scan::{scan_bundle, ParseOptions};
pub use writer::{write_results, WriteStatus, WrittenFile};

/// Compile configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Link modules into a loader call; otherwise each entry is emitted alone.
    pub bundle: bool,
    /// Sole output path; requires a single entry point.
    pub abs_output_file: Option<String>,
    /// Directory for per-entry outputs when there is no output file.
    pub abs_output_dir: Option<String>,
    /// Emit only the loader call, without the loader definition.
    pub omit_bootstrap_for_tests: bool,
}

/// One output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileResult {
    pub abs_path: String,
    pub contents: String,
}
