//! The command line interface for the toolkit.
use crate::analysis::{CAPACITY_FILE_NAME, H2_CAPACITY_FILE_NAME, run_batch, run_single};
use crate::category::{Sector, classify, is_known_category};
use crate::log;
use crate::results::{find_latest_results_dir, results_file_path};
use crate::settings::Settings;
use crate::table::WideTable;
use ::log::{info, warn};
use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

/// The command line interface for the toolkit.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// The available commands.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by the plotting commands
#[derive(Args)]
pub struct PlotOpts {
    /// Directory for output files (default: alongside the input)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

/// The available commands.
#[derive(Subcommand)]
enum Commands {
    /// Plot the results of a single model run.
    Plot {
        /// Path to the run directory.
        run_dir: PathBuf,
        /// Other plot options
        #[command(flatten)]
        opts: PlotOpts,
    },
    /// Plot and compare the results of every run in a directory.
    Batch {
        /// Path to the directory containing run directories.
        runs_dir: PathBuf,
        /// Other plot options
        #[command(flatten)]
        opts: PlotOpts,
    },
    /// Check that a run's resource names map to known categories.
    Check {
        /// Path to the run directory.
        run_dir: PathBuf,
    },
}

impl Commands {
    /// Execute the supplied CLI command
    fn execute(self) -> Result<()> {
        match self {
            Self::Plot { run_dir, opts } => handle_plot_command(&run_dir, &opts, None),
            Self::Batch { runs_dir, opts } => handle_batch_command(&runs_dir, &opts, None),
            Self::Check { run_dir } => handle_check_command(&run_dir, None),
        }
    }
}

/// Parse CLI arguments and dispatch to the selected command
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        let help_str = Cli::command().render_long_help().to_string();
        println!("{help_str}");
        return Ok(());
    };

    command.execute()
}

/// Load settings from a directory and initialise logging, unless settings
/// were already supplied by the caller
fn init_program(dir: &Path, settings: Option<Settings>) -> Result<()> {
    let settings = if let Some(settings) = settings {
        settings
    } else {
        Settings::load_from_dir(dir).context("Failed to load settings.")?
    };
    log::init(Some(&settings.log_level)).context("Failed to initialise logging.")?;

    Ok(())
}

/// Handle the `plot` command.
pub fn handle_plot_command(
    run_dir: &Path,
    opts: &PlotOpts,
    settings: Option<Settings>,
) -> Result<()> {
    init_program(run_dir, settings)?;
    run_single(run_dir, opts.output_dir.as_deref())?;
    info!("Plotting complete!");

    Ok(())
}

/// Handle the `batch` command.
pub fn handle_batch_command(
    runs_dir: &Path,
    opts: &PlotOpts,
    settings: Option<Settings>,
) -> Result<()> {
    init_program(runs_dir, settings)?;
    run_batch(runs_dir, opts.output_dir.as_deref())?;
    info!("Batch plotting complete!");

    Ok(())
}

/// Handle the `check` command.
///
/// Reports every resource name that falls back to a singleton category, so
/// typos and new technologies can be spotted before they reach a chart
/// legend.
pub fn handle_check_command(run_dir: &Path, settings: Option<Settings>) -> Result<()> {
    init_program(run_dir, settings)?;

    let results_dir = find_latest_results_dir(run_dir)?;
    info!("Checking resource names in {}", results_dir.display());

    let mut unknown =
        check_resource_names(&results_file_path(&results_dir, CAPACITY_FILE_NAME), Sector::Electricity)?;
    let h2_path = results_file_path(&results_dir, H2_CAPACITY_FILE_NAME);
    if h2_path.exists() {
        unknown += check_resource_names(&h2_path, Sector::Hydrogen)?;
    }

    if unknown == 0 {
        info!("All resource names map to known categories");
    } else {
        warn!("{unknown} resource name(s) fall back to singleton categories");
    }

    Ok(())
}

/// Classify every resource in a capacity table, returning the number of names
/// with no known category
fn check_resource_names(path: &Path, sector: Sector) -> Result<usize> {
    let table = WideTable::from_csv(path, &[])
        .with_context(|| format!("could not load {}", path.display()))?;

    let mut unknown = 0;
    for row in &table.rows {
        let category = classify(&row.resource, sector);
        if is_known_category(&category, sector) {
            info!("'{}' -> {category}", row.resource);
        } else {
            warn!("'{}' has no known {sector} category", row.resource);
            unknown += 1;
        }
    }

    Ok(unknown)
}
