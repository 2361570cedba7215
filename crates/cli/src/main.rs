mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use batchmake_lib::process::INTERRUPTED_EXIT_CODE;
use batchmake_lib::runner::RunError;

use cmd::{Context, cmd_diff, cmd_each, cmd_list, cmd_make, cmd_publish};
use output::{OutputFormat, print_error};

/// batchmake - build every project in a tree, stopping at the first failure
#[derive(Parser)]
#[command(name = "batchmake")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Directory searched for build targets
  #[arg(long, global = true, default_value = ".")]
  root: PathBuf,

  /// Config file (default: <root>/batchmake.toml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Output format
  #[arg(short, long, global = true, value_enum, default_value_t)]
  output: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build every target with the build parameter exported (BSP by default)
  Make {
    /// Build parameter, e.g. a board name (default: rpi3)
    param: Option<String>,

    /// Build all targets and report every failure instead of stopping at the first
    #[arg(long)]
    keep_going: bool,
  },

  /// Run a command in every target
  Each {
    /// Build parameter exported to the command
    #[arg(long)]
    param: Option<String>,

    /// Run in all targets and report every failure instead of stopping at the first
    #[arg(long)]
    keep_going: bool,

    /// Command and arguments
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
  },

  /// List discovered build targets
  List,

  /// Compare two directory trees
  Diff { left: PathBuf, right: PathBuf },

  /// Run the publish checklist, stopping at the first failed step
  Publish {
    /// Build parameter, e.g. a board name (default: rpi3)
    param: Option<String>,

    /// Keep going inside each step instead of stopping at the first failing target
    #[arg(long)]
    keep_going: bool,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match run(cli) {
    Ok(code) => code,
    Err(err) => {
      print_error(&format!("{:#}", err));
      if is_interrupted(&err) {
        ExitCode::from(INTERRUPTED_EXIT_CODE as u8)
      } else {
        ExitCode::FAILURE
      }
    }
  }
}

fn run(cli: Cli) -> Result<ExitCode> {
  let ctx = Context::load(&cli.root, cli.config.as_deref(), cli.output)?;

  match cli.command {
    Commands::Make { param, keep_going } => cmd_make(&ctx, param, keep_going),
    Commands::Each {
      param,
      keep_going,
      command,
    } => cmd_each(&ctx, command, param, keep_going),
    Commands::List => cmd_list(&ctx),
    Commands::Diff { left, right } => cmd_diff(&ctx, &left, &right),
    Commands::Publish { param, keep_going } => cmd_publish(&ctx, param, keep_going),
  }
}

fn is_interrupted(err: &anyhow::Error) -> bool {
  err
    .chain()
    .any(|cause| matches!(cause.downcast_ref::<RunError>(), Some(RunError::Interrupted { .. })))
}
