//! Module graph construction.
//!
//! Traversal is breadth-first by waves:
//!
//! 1. Entry points are resolved and registered in the order given (ids `0..`).
//! 2. Every module of the current wave is read and parsed in parallel.
//! 3. Results are visited in ascending id order, each module's import records
//!    in source order; newly seen paths get the next id and form the next wave.
//!
//! Only the coordinating thread touches the [`ModuleTable`] and the log, so
//! ids and diagnostics come out the same on every run.

use super::graph::{Discovery, ModuleGraph, ModuleId, ModuleRecord, ModuleTable};
use super::resolve::Resolver;
use crate::fs::FileSystem;
use crate::log::{Location, Log, MsgCode};
use crate::paths;
use rayon::prelude::*;
use tsbundle_parser::{LineIndex, ParseError, ParsedModule, Parser, ParserOptions};

/// Parse configuration shared by every module of a scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Lower module syntax onto the loader runtime and record imports.
    pub is_bundling: bool,
}

/// Extensions parsed with TypeScript syntax enabled.
const TYPESCRIPT_EXTENSIONS: &[&str] = &[".ts", ".tsx", ".mts", ".cts"];

/// What happened to one module of a wave.
enum Loaded {
    Parsed {
        module: ParsedModule,
        source: String,
        lines: LineIndex,
    },
    Unreadable,
    Failed {
        error: ParseError,
        source: String,
        lines: LineIndex,
    },
}

/// Discover and parse every module reachable from `entry_paths`.
///
/// Problems are appended to `log` and never stop the scan; check the log
/// before compiling.
pub fn scan_bundle(
    log: &Log,
    fs: &dyn FileSystem,
    resolver: &Resolver,
    entry_paths: &[String],
    options: ParseOptions,
) -> ModuleGraph {
    let mut table = ModuleTable::new();
    let mut entries: Vec<ModuleId> = Vec::new();
    let mut wave: Vec<ModuleId> = Vec::new();

    for entry in entry_paths {
        let Some(path) = resolver.resolve_entry(entry) else {
            log.add_error(
                MsgCode::ResolveError,
                None,
                format!("Could not resolve entry point \"{entry}\""),
            );
            continue;
        };
        let discovery = table.insert(&path);
        if let Discovery::New(id) = discovery {
            wave.push(id);
        }
        if !entries.contains(&discovery.id()) {
            entries.push(discovery.id());
        }
    }

    let mut modules: Vec<Option<ModuleRecord>> = Vec::new();
    while !wave.is_empty() {
        let jobs: Vec<(ModuleId, &str)> = wave
            .iter()
            .filter_map(|&id| table.path(id).map(|path| (id, path)))
            .collect();
        let loaded: Vec<(ModuleId, String, Loaded)> = jobs
            .par_iter()
            .map(|&(id, path)| (id, path.to_string(), load_module(fs, path, options)))
            .collect();

        let mut next = Vec::new();
        for (id, path, outcome) in loaded {
            let record = match outcome {
                Loaded::Parsed {
                    module,
                    source,
                    lines,
                } => link_imports(
                    log,
                    resolver,
                    &mut table,
                    &mut next,
                    id,
                    &path,
                    module,
                    &source,
                    lines,
                ),
                Loaded::Unreadable => {
                    log.add_error(
                        MsgCode::ReadError,
                        None,
                        format!("Could not read \"{path}\""),
                    );
                    ModuleRecord::failed(id, &path)
                }
                Loaded::Failed {
                    error,
                    source,
                    lines,
                } => {
                    let location = Location::from_source(&path, &source, &lines, error.span);
                    log.add_error(MsgCode::ParseError, Some(location), error.message);
                    ModuleRecord::failed(id, &path)
                }
            };
            if modules.len() <= id {
                modules.resize_with(id + 1, || None);
            }
            modules[id] = Some(record);
        }
        wave = next;
    }

    let modules = (0..table.len())
        .map(|id| {
            modules
                .get_mut(id)
                .and_then(Option::take)
                .unwrap_or_else(|| ModuleRecord::failed(id, table.path(id).unwrap_or_default()))
        })
        .collect();
    ModuleGraph::new(table, modules, entries)
}

/// Read and parse one file. Runs on a worker thread.
fn load_module(fs: &dyn FileSystem, path: &str, options: ParseOptions) -> Loaded {
    let Some(source) = fs.read(path) else {
        return Loaded::Unreadable;
    };
    let parser_options = ParserOptions {
        is_bundling: options.is_bundling,
        typescript: is_typescript(path),
    };
    let lines = LineIndex::new(&source);
    match Parser::new(&source, parser_options).parse() {
        Ok(module) => Loaded::Parsed {
            module,
            source,
            lines,
        },
        Err(error) => Loaded::Failed {
            error,
            source,
            lines,
        },
    }
}

fn is_typescript(path: &str) -> bool {
    paths::extension(path).is_some_and(|ext| TYPESCRIPT_EXTENSIONS.contains(&ext))
}

/// Resolve a parsed module's imports, registering newly found modules.
#[allow(clippy::too_many_arguments)]
fn link_imports(
    log: &Log,
    resolver: &Resolver,
    table: &mut ModuleTable,
    next: &mut Vec<ModuleId>,
    id: ModuleId,
    path: &str,
    module: ParsedModule,
    source: &str,
    lines: LineIndex,
) -> ModuleRecord {
    let ParsedModule {
        stmts,
        mut import_records,
    } = module;
    let importer_dir = paths::dirname(path).unwrap_or("/");
    let mut dependencies = Vec::new();

    for record in &mut import_records {
        let Some(target) = resolver.resolve(importer_dir, &record.specifier) else {
            let location = Location::from_source(path, source, &lines, record.span);
            log.add_error(
                MsgCode::ResolveError,
                Some(location),
                format!("Could not resolve \"{}\"", record.specifier),
            );
            continue;
        };
        let discovery = table.insert(&target);
        if let Discovery::New(dep) = discovery {
            next.push(dep);
        }
        let dep = discovery.id();
        record.resolved = Some(dep);
        if !dependencies.contains(&dep) {
            dependencies.push(dep);
        }
    }

    ModuleRecord {
        id,
        path: path.to_string(),
        stmts,
        import_records,
        dependencies,
        lines,
        failed: false,
    }
}
