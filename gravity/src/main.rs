//! Command-line interface for the gravity binary.
//!
//! A single invocation runs the selected pipeline phases against the cache
//! directory and exits with the status of the first fatal error.

use std::{path::PathBuf, process};

use clap::{ArgAction, Parser};
use gravity::{Error, Phase, RunOptions, Settings, ShellRunner, run};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line interface for repackaging releases into collections.
#[derive(Debug, Parser,)]
#[command(
    name = "gravity",
    version,
    about = "Split Ansible releases into collections and package them"
)]
struct Cli
{
    /// Phases to run.
    #[arg(long = "phase", value_enum, default_value = "all")]
    phase: Phase,

    /// Rebuild cached metadata, layouts and packages.
    #[arg(long = "refresh", action = ArgAction::SetTrue)]
    refresh: bool,

    /// Only use the development checkout.
    #[arg(long = "devel-only", visible_alias = "devel", action = ArgAction::SetTrue)]
    devel_only: bool,

    /// Reuse the existing engine build copy.
    #[arg(long = "noclean", action = ArgAction::SetTrue)]
    noclean: bool,

    /// Only process directory keys containing this substring. Repeatable.
    #[arg(long = "filter", value_name = "SUBSTRING")]
    filters: Vec<String,>,

    /// Optional YAML settings document.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Cache root; overrides the settings document.
    #[arg(long = "var-dir", value_name = "DIR", env = "GRAVITY_VAR_DIR")]
    var_dir: Option<PathBuf,>,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long = "verbose", short = 'v', action = ArgAction::SetTrue)]
    verbose: bool,
}

impl Cli
{
    fn run_options(&self,) -> RunOptions
    {
        RunOptions {
            phase:      self.phase,
            refresh:    self.refresh,
            devel_only: self.devel_only,
            noclean:    self.noclean,
            filters:    self.filters.clone(),
        }
    }
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    let cli = Cli::parse();
    init_tracing(cli.verbose,);

    if let Err(error,) = execute(&cli,) {
        eprintln!("{}", error.to_display_string());
        process::exit(error.exit_code(),);
    }
}

fn init_tracing(verbose: bool,)
{
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default,),),)
        .with_writer(std::io::stderr,)
        .init();
}

/// Executes the pipeline using parsed arguments.
///
/// # Errors
///
/// Propagates settings loading failures and the first fatal pipeline error.
fn execute(cli: &Cli,) -> Result<(), Error,>
{
    let settings = load_settings(cli,)?;
    let summary = run(&settings, &ShellRunner, &cli.run_options(),)?;
    info!(
        "indexed {}, assembled {}, packaged {}",
        summary.indexed.len(),
        summary.assembly.materialized.len(),
        summary.packages.built.len()
    );
    Ok((),)
}

fn load_settings(cli: &Cli,) -> Result<Settings, Error,>
{
    let mut settings = match &cli.config {
        Some(path,) => Settings::load(path,)?,
        None => Settings::default(),
    };
    if let Some(var_dir,) = &cli.var_dir {
        settings.var_dir = var_dir.clone();
    }
    Ok(settings,)
}
