//! pipeline-model - lint declarative pipeline trees from the command line
//!
//! ## Commands
//!
//! - `pipeline-model lint <file>` - Validate a JSON or YAML pipeline tree
//! - `pipeline-model list <kind>` - List registered options, conditionals, agents,
//!   triggers or comparators
//! - `pipeline-model completions <shell>` - Generate shell completions
//!
//! ## Exit codes
//!
//! `0` when the pipeline is valid, `1` when diagnostics were reported and `2`
//! when the command itself failed (unreadable file, bad configuration).
//!
//! ## Logging
//!
//! `--log-level` wins, then `PIPELINE_MODEL_DEBUG` (debug level), then the
//! configuration file. `RUST_LOG` overrides all of them.
//!
//! ## Quick Start
//!
//! ```bash
//! pipeline-model lint pipeline.yaml
//! pipeline-model lint pipeline.json --format json --config lint.yaml
//! pipeline-model list conditionals
//! pipeline-model completions bash > /etc/bash_completion.d/pipeline-model
//! ```

use std::process::ExitCode;

mod cli;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            if std::env::var("PIPELINE_MODEL_VERBOSE").is_ok() {
                eprintln!("{e:?}");
            }
            ExitCode::from(2)
        }
    }
}
