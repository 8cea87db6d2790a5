//! Locating results directories and files within a model run directory.
//!
//! The model writes each solve into a numbered `Results_<n>` folder next to
//! its inputs (a bare `Results` folder counts as number 0), with hydrogen
//! supply chain outputs nested in a `Results_HSC` subfolder. All paths are
//! passed explicitly; nothing here touches the process working directory.
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Prefix shared by all results directory names.
const RESULTS_PREFIX: &str = "Results";

/// An example-results directory that takes precedence over numbered ones.
const EXAMPLE_RESULTS_DIR_NAME: &str = "Results_Example";

/// Subfolder holding hydrogen supply chain outputs.
const HSC_SUBDIR_NAME: &str = "Results_HSC";

/// Errors raised while locating a results directory.
#[derive(Error, Debug)]
pub enum LocateError {
    /// The run directory contains no results at all
    #[error("no '{RESULTS_PREFIX}*' directory found in {}", .0.display())]
    NoResultsFound(PathBuf),
    /// The run directory could not be listed
    #[error("could not read run directory {}: {source}", path.display())]
    Io {
        /// The directory being listed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Find the most recent results directory within a run directory.
///
/// `Results_Example` takes precedence when present. Otherwise the candidate
/// with the highest numeric suffix wins, a literal `Results` folder counting
/// as suffix 0; candidates with a non-numeric suffix are ignored. A run
/// directory with no usable `Results*` folder at all is a fatal input error.
pub fn find_latest_results_dir(run_dir: &Path) -> Result<PathBuf, LocateError> {
    let entries = fs::read_dir(run_dir).map_err(|source| LocateError::Io {
        path: run_dir.to_path_buf(),
        source,
    })?;

    let mut latest: Option<u32> = None;
    for entry in entries {
        let entry = entry.map_err(|source| LocateError::Io {
            path: run_dir.to_path_buf(),
            source,
        })?;
        if !entry.path().is_dir() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if !name.starts_with(RESULTS_PREFIX) {
            continue;
        }
        if name == EXAMPLE_RESULTS_DIR_NAME {
            return Ok(run_dir.join(EXAMPLE_RESULTS_DIR_NAME));
        }

        let number = if name == RESULTS_PREFIX {
            0
        } else {
            // Only numbered folders count; the returned path must exist
            match name.rsplit_once('_').and_then(|(_, suffix)| suffix.parse().ok()) {
                Some(number) => number,
                None => continue,
            }
        };
        latest = Some(latest.map_or(number, |current| current.max(number)));
    }

    match latest {
        None => Err(LocateError::NoResultsFound(run_dir.to_path_buf())),
        Some(0) => Ok(run_dir.join(RESULTS_PREFIX)),
        Some(number) => Ok(run_dir.join(format!("{RESULTS_PREFIX}_{number}"))),
    }
}

/// The path of a results file within a results directory.
///
/// Hydrogen supply chain files (named `HSC*`) live in the `Results_HSC`
/// subfolder.
pub fn results_file_path(results_dir: &Path, file_name: &str) -> PathBuf {
    if file_name.starts_with("HSC") {
        results_dir.join(HSC_SUBDIR_NAME).join(file_name)
    } else {
        results_dir.join(file_name)
    }
}
