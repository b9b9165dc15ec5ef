//! sandprobe - run sandbox compliance probes from inside the sandbox

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use sandprobe_core::report::{JsonReporter, Reporter, TextReporter};
use sandprobe_core::{JailConfig, Registry};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Exit status when the harness itself could not produce a report
const HARNESS_FAILURE: u8 = 2;

#[derive(Parser)]
#[command(name = "sandprobe")]
#[command(
    author,
    version,
    about = "Check that the surrounding sandbox enforces its isolation guarantees"
)]
struct Cli {
    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    layout: LayoutArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the probes (default)
    Run {
        /// Also run the wider environment checks
        #[arg(long)]
        extended: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Text)]
        format: Format,
    },

    /// List probes in execution order
    List {
        /// Include the wider environment checks
        #[arg(long)]
        extended: bool,
    },

    /// Print the expected sandbox layout as JSON
    Layout,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Text,
    Json,
}

/// Overrides for the expected layout; unset flags keep the reference values
#[derive(Args, Debug)]
struct LayoutArgs {
    /// Virtual root expected inside the sandbox
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Top-level entry that must not be visible (repeatable)
    #[arg(long = "forbid", global = true)]
    forbid: Vec<String>,

    /// Shared library to load by absolute path
    #[arg(long, global = true)]
    library_path: Option<PathBuf>,

    /// Shared library to load through the search path
    #[arg(long, global = true)]
    library_name: Option<String>,

    /// Top-level entry the extended listing check requires (repeatable)
    #[arg(long = "require-entry", global = true)]
    require_entry: Vec<String>,

    /// Top-level entry the extended listing check rejects (repeatable)
    #[arg(long = "hide-entry", global = true)]
    hide_entry: Vec<String>,

    /// Path the unmount probe targets (defaults to <root>/bin)
    #[arg(long, global = true)]
    unmount_target: Option<PathBuf>,

    /// Path the permission-change probe targets (defaults to <root>/bin)
    #[arg(long, global = true)]
    chmod_target: Option<PathBuf>,
}

impl LayoutArgs {
    fn into_config(self) -> JailConfig {
        let mut builder = JailConfig::builder();

        if !self.require_entry.is_empty() {
            builder = builder.root_entries(self.require_entry);
        }
        if !self.hide_entry.is_empty() {
            builder = builder.hidden_root_entries(self.hide_entry);
        }
        if let Some(root) = self.root {
            builder = builder.rooted_at(root);
        }
        if !self.forbid.is_empty() {
            builder = builder.forbidden_entries(self.forbid);
        }
        if let Some(path) = self.library_path {
            builder = builder.library_path(path);
        }
        if let Some(name) = self.library_name {
            builder = builder.library_name(name);
        }
        if let Some(path) = self.unmount_target {
            builder = builder.unmount_target(path);
        }
        if let Some(path) = self.chmod_target {
            builder = builder.chmod_target(path);
        }

        builder.build()
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose) {
        eprintln!("sandprobe: logging disabled: {e}");
    }

    match execute(cli) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "harness failure");
            eprintln!("sandprobe: {e}");
            ExitCode::from(HARNESS_FAILURE)
        }
    }
}

fn init_logging(verbose: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    // stdout belongs to the probe protocol
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("sandprobe={level}").parse()?),
        )
        .try_init()?;

    Ok(())
}

fn execute(cli: Cli) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = cli.layout.into_config();
    config.validate()?;

    let command = cli.command.unwrap_or(Commands::Run {
        extended: false,
        format: Format::Text,
    });

    match command {
        Commands::Run { extended, format } => {
            let registry = registry(&config, extended);
            let stdout = io::stdout().lock();
            let mut reporter: Box<dyn Reporter> = match format {
                Format::Text => Box::new(TextReporter::new(stdout)),
                Format::Json => Box::new(JsonReporter::new(stdout)),
            };

            let summary = sandprobe_core::run(&registry, &config, reporter.as_mut())?;
            Ok(ExitCode::from(summary.exit_code()))
        }

        Commands::List { extended } => {
            let mut stdout = io::stdout().lock();
            for name in registry(&config, extended).names() {
                writeln!(stdout, "{name}")?;
            }
            Ok(ExitCode::SUCCESS)
        }

        Commands::Layout => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &config)?;
            writeln!(stdout)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn registry(config: &JailConfig, extended: bool) -> Registry {
    if extended {
        Registry::extended(config)
    } else {
        Registry::reference(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_logging_init_reports_instead_of_panicking() {
        let _ = init_logging(0);
        assert!(init_logging(2).is_err());
    }

    #[test]
    fn root_flag_rewrites_listing_entry() {
        let cli = Cli::parse_from(["sandprobe", "--root", "/opt/jail", "layout"]);
        let config = cli.layout.into_config();
        assert_eq!(config.root_entries, ["lib", "opt"]);
        assert_eq!(config.unmount_target, PathBuf::from("/opt/jail/bin"));
    }
}
