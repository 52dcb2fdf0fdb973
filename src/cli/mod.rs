//! Command-line front-end for pipeline-model
//!
//! - `lint`: Validate a serialized pipeline tree and report every diagnostic
//! - `list`: Show the registered extensions of one kind
//! - `completions`: Generate shell completions

pub mod completions;
pub mod lint;
pub mod list;

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use pipeline_model::extensions::ExtensionKind;
use pipeline_model::infrastructure::{Config, init_logging};
use std::path::PathBuf;
use std::process::ExitCode;

/// CLI arguments for pipeline-model
#[derive(Parser, Debug)]
#[command(name = "pipeline-model")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log level (overrides the configuration file; `RUST_LOG` wins over both)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a pipeline tree (JSON or YAML)
    Lint {
        /// Pipeline file to validate
        file: PathBuf,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
        /// YAML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List registered extensions
    List {
        /// Extension kind
        #[arg(value_enum)]
        kind: ExtensionKind,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: ShellArg,
        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Report rendering
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One line per entry
    #[default]
    Text,
    /// Pretty printed JSON
    Json,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum ShellArg {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

/// Build the CLI command for completion generation
pub fn build_cli() -> clap::Command {
    Args::command()
}

/// Picks the log level: `--log-level`, then `PIPELINE_MODEL_DEBUG`, then the configured level
fn resolve_log_level<'a>(flag: Option<&'a str>, debug: bool, configured: &'a str) -> &'a str {
    match flag {
        Some(level) => level,
        None if debug => "debug",
        None => configured,
    }
}

/// Parse and execute CLI arguments
pub fn run() -> Result<ExitCode> {
    let args = Args::parse();
    let debug = std::env::var_os("PIPELINE_MODEL_DEBUG").is_some();

    match args.command {
        Command::Lint {
            file,
            format,
            config,
        } => {
            let config = match config {
                Some(path) => Config::load(&path)
                    .with_context(|| format!("Failed to load config: {}", path.display()))?,
                None => Config::default(),
            };
            init_logging(resolve_log_level(
                args.log_level.as_deref(),
                debug,
                &config.log_level,
            ));

            let report = lint::lint_file(&file, &config)?;
            println!("{}", lint::format_report(&report, format.unwrap_or_default())?);
            Ok(ExitCode::from(report.exit_code()))
        }
        Command::List { kind, format } => {
            init_logging(resolve_log_level(args.log_level.as_deref(), debug, "warn"));
            println!("{}", list::format_listing(kind, format.unwrap_or_default())?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Completions { shell, output } => {
            use clap_complete::Shell;

            init_logging(resolve_log_level(args.log_level.as_deref(), debug, "warn"));

            let shell_enum = match shell {
                ShellArg::Bash => Shell::Bash,
                ShellArg::Zsh => Shell::Zsh,
                ShellArg::Fish => Shell::Fish,
                ShellArg::PowerShell => Shell::PowerShell,
                ShellArg::Elvish => Shell::Elvish,
            };

            let completions = completions::generate_completions(shell_enum)?;

            if let Some(output_path) = output {
                completions::save_completions(&completions, &output_path)?;
            } else {
                println!("{completions}");
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
