//! `tsbundle bundle` command implementation.
//!
//! Scans the entry points, compiles the module graph and writes (or prints)
//! the results. Each phase reports all of its diagnostics before stopping.

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use tsbundle_core::bundler::{
    scan_bundle, write_results, CompileOptions, OutputPlan, ParseOptions, Resolver, WriteStatus,
    WrittenFile,
};
use tsbundle_core::fs::RealFs;
use tsbundle_core::log::{Log, Msg, MsgCode};
use tsbundle_core::version::SCHEMA_VERSION;
use tsbundle_core::{paths, BundleConfig, Config};

/// Output path of a result that is printed instead of written.
const STDOUT_PATH: &str = "<stdout>";

/// Bundle command action.
#[derive(Debug, Clone)]
pub struct BundleAction {
    /// Entry point files. Empty means "use the config file".
    pub entries: Vec<PathBuf>,
    pub outfile: Option<PathBuf>,
    pub outdir: Option<PathBuf>,
    /// Link imports into one loader call.
    pub bundle: bool,
    /// Empty means "use the config file".
    pub resolve_extensions: Vec<String>,
    /// Explicit config file instead of discovering `tsbundle.json`.
    pub config: Option<PathBuf>,
}

/// Flags merged over the config file, paths in module form.
#[derive(Debug)]
struct Settings {
    entry_paths: Vec<String>,
    outfile: Option<String>,
    outdir: Option<String>,
    bundle: bool,
    resolve_extensions: Vec<String>,
}

impl Settings {
    fn to_stdout(&self) -> bool {
        self.outfile.is_none() && self.outdir.is_none()
    }
}

/// JSON output for bundle command.
#[derive(Serialize)]
struct BundleSummaryJson {
    schema_version: u32,
    ok: bool,
    outputs: Vec<WrittenFile>,
    /// Every scanned module, in id order.
    modules: Vec<String>,
    errors: Vec<Msg>,
    duration_ms: u64,
    /// The bundle itself when there is no output location.
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<String>,
}

impl BundleSummaryJson {
    fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            ok: false,
            outputs: Vec::new(),
            modules: Vec::new(),
            errors: Vec::new(),
            duration_ms: 0,
            code: None,
        }
    }
}

/// Run the bundle command. Exits with status 1 when any error is reported.
pub fn run(config: &Config, action: BundleAction) -> Result<()> {
    let start = Instant::now();
    let mut summary = BundleSummaryJson::new();

    let settings = match settings(&config.cwd, action) {
        Ok(settings) => settings,
        Err(msg) => {
            summary.errors.push(msg);
            return finish(config, summary, start);
        }
    };
    debug!(?settings, "bundle settings");

    let fs = Arc::new(RealFs);
    let resolver = Resolver::new(fs.clone(), settings.resolve_extensions.clone());

    let log = Log::new();
    let graph = scan_bundle(
        &log,
        fs.as_ref(),
        &resolver,
        &settings.entry_paths,
        ParseOptions {
            is_bundling: settings.bundle,
        },
    );
    summary.modules = graph.iter().map(|module| module.path.clone()).collect();
    summary.errors = log.join();
    debug!(
        modules = graph.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "scan finished"
    );
    if !summary.errors.is_empty() {
        return finish(config, summary, start);
    }

    if settings.to_stdout() && graph.entries().len() > 1 {
        summary.errors.push(Msg::error(
            MsgCode::ConfigError,
            None,
            "Multiple entry points need --outdir",
        ));
        return finish(config, summary, start);
    }

    let options = CompileOptions {
        bundle: settings.bundle,
        abs_output_file: if settings.to_stdout() {
            Some(STDOUT_PATH.to_string())
        } else {
            settings.outfile.clone()
        },
        abs_output_dir: settings.outdir.clone(),
        omit_bootstrap_for_tests: false,
    };
    let plan = match OutputPlan::derive(&graph, &options) {
        Ok(plan) => plan,
        Err(err) => {
            summary
                .errors
                .push(Msg::error(MsgCode::CompileError, None, err.to_string()));
            return finish(config, summary, start);
        }
    };
    debug!(targets = plan.targets().len(), "output plan");

    let log = Log::new();
    let results = graph.compile(&log, &plan, &options);
    summary.errors = log.join();
    debug!(
        outputs = results.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "compile finished"
    );
    if !summary.errors.is_empty() {
        return finish(config, summary, start);
    }

    if settings.to_stdout() {
        let code: String = results.into_iter().map(|result| result.contents).collect();
        if config.json_logs {
            summary.code = Some(code);
        } else {
            print!("{code}");
        }
    } else {
        summary.outputs = write_results(&results).into_diagnostic()?;
    }

    summary.ok = true;
    info!(
        modules = summary.modules.len(),
        outputs = summary.outputs.len(),
        "bundle complete"
    );
    finish(config, summary, start)
}

/// Merge the flags over the config file.
fn settings(cwd: &Path, action: BundleAction) -> Result<Settings, Msg> {
    let file = match &action.config {
        Some(path) => BundleConfig::load(&cwd.join(path)).map(Some),
        None => paths::project_root(cwd).map_or(Ok(None), |root| BundleConfig::discover(&root)),
    }
    .map_err(|err| Msg::error(MsgCode::ConfigError, None, err.to_string()))?
    .unwrap_or_default();

    let entries = if action.entries.is_empty() {
        file.entry_points
    } else {
        action.entries
    };
    if entries.is_empty() {
        return Err(Msg::error(
            MsgCode::ConfigError,
            None,
            "No entry points given (pass files or set \"entryPoints\" in tsbundle.json)",
        ));
    }

    // An output location on the command line replaces the file's entirely
    let (outfile, outdir) = if action.outfile.is_some() || action.outdir.is_some() {
        (action.outfile, action.outdir)
    } else {
        (file.outfile, file.outdir)
    };

    let module_path = |path: &Path| paths::module_path(path, cwd);
    Ok(Settings {
        entry_paths: entries.iter().map(|entry| module_path(entry.as_path())).collect(),
        outfile: outfile.as_deref().map(module_path),
        outdir: outdir.as_deref().map(module_path),
        bundle: action.bundle && file.bundle,
        resolve_extensions: if action.resolve_extensions.is_empty() {
            file.resolve_extensions
        } else {
            action.resolve_extensions
        },
    })
}

/// Report the outcome, exiting with status 1 on failure.
fn finish(config: &Config, mut summary: BundleSummaryJson, start: Instant) -> Result<()> {
    summary.duration_ms = start.elapsed().as_millis() as u64;

    if config.json_logs {
        println!("{}", serde_json::to_string(&summary).into_diagnostic()?);
    } else {
        for msg in &summary.errors {
            eprintln!("{msg}");
        }
        for output in &summary.outputs {
            let size_kb = output.bytes as f64 / 1024.0;
            let note = match output.status {
                WriteStatus::Written => "",
                WriteStatus::Unchanged => ", unchanged",
            };
            println!(
                "  {} ({} modules, {:.1}KB{}, {}ms)",
                output.path.display(),
                summary.modules.len(),
                size_kb,
                note,
                summary.duration_ms
            );
        }
        if !summary.ok {
            let count = summary.errors.len();
            eprintln!("{count} error{}", if count == 1 { "" } else { "s" });
        }
    }

    if !summary.ok {
        std::process::exit(1);
    }
    Ok(())
}
