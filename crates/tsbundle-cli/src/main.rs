#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]

mod commands;
mod logging;

use clap::Parser;
use miette::Result;
use std::path::PathBuf;
use tsbundle_core::Config;

#[derive(Parser, Debug)]
#[command(name = "tsbundle")]
#[command(author, version, about = "Bundle TypeScript/JavaScript modules into one loader call", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// Bundle JavaScript/TypeScript modules
    Bundle {
        /// Entry point files (default: `entryPoints` from tsbundle.json)
        entries: Vec<PathBuf>,

        /// Output file for a single entry point (if no output is given, prints to stdout)
        #[arg(long, short = 'o')]
        outfile: Option<PathBuf>,

        /// Output directory, one `<name>.js` per entry point
        #[arg(long, conflicts_with = "outfile")]
        outdir: Option<PathBuf>,

        /// Transform each entry point on its own instead of linking its imports
        #[arg(long)]
        no_bundle: bool,

        /// Extensions tried, in order, for imports without one (e.g. .tsx,.ts)
        #[arg(long, value_delimiter = ',')]
        resolve_extensions: Vec<String>,

        /// Read bundle settings from this file instead of tsbundle.json
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Determine working directory
    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::new(cwd.clone())
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(config.json_logs),
        Some(Commands::Bundle {
            entries,
            outfile,
            outdir,
            no_bundle,
            resolve_extensions,
            config: config_file,
        }) => {
            let span = tracing::info_span!("bundle", cmd = "bundle", cwd = %cwd.display());
            let _guard = span.enter();
            let action = commands::bundle::BundleAction {
                entries,
                outfile,
                outdir,
                bundle: !no_bundle,
                resolve_extensions,
                config: config_file,
            };
            commands::bundle::run(&config, action)
        }
    }
}
