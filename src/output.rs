//! Writing analysis output to CSV files.
use crate::reshape::{LongRecord, MetricType};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// The output directory for figures and long-format data.
pub const FIGURES_DIR_NAME: &str = "Figures";

/// The file name for the long-format data CSV.
pub const LONG_DATA_FILE_NAME: &str = "long_data.csv";

/// The file name for the system cost breakdown CSV.
pub const COST_DATA_FILE_NAME: &str = "cost_breakdown.csv";

/// One row of the long-format data CSV.
///
/// The `run` column tags which model run a row came from, so batch output for
/// several runs can share one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongDataRow {
    /// Name of the run directory the row was derived from
    pub run: String,
    /// Grid zone
    pub zone: String,
    /// Technology category
    pub resource_category: String,
    /// Which metric the value belongs to
    pub metric_type: MetricType,
    /// The metric value
    pub value: f64,
}

/// Create the figures directory under `base`, if it doesn't already exist.
pub fn create_figures_dir(base: &Path) -> Result<PathBuf> {
    let dir = base.join(FIGURES_DIR_NAME);
    fs::create_dir_all(&dir)
        .with_context(|| format!("could not create output directory {}", dir.display()))?;
    Ok(dir)
}

/// Write run-tagged long records to a CSV file.
pub fn write_long_records<'a, I>(path: &Path, records: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a LongRecord)>,
{
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("could not create {}", path.display()))?;
    for (run, record) in records {
        writer.serialize(LongDataRow {
            run: run.to_string(),
            zone: record.zone.clone(),
            resource_category: record.resource_category.clone(),
            metric_type: record.metric_type,
            value: record.value,
        })?;
    }
    writer.flush()?;

    Ok(())
}

/// One row of the system cost breakdown CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostDataRow {
    /// Name of the run directory the row was derived from
    pub run: String,
    /// Cost component label, as it appears in the cost table
    pub component: String,
    /// The component's cost
    pub value: f64,
}

/// Write run-tagged cost components to a CSV file.
pub fn write_cost_breakdown<'a, I>(path: &Path, components: I) -> Result<()>
where
    I: IntoIterator<Item = (&'a str, &'a str, f64)>,
{
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("could not create {}", path.display()))?;
    for (run, component, value) in components {
        writer.serialize(CostDataRow {
            run: run.to_string(),
            component: component.to_string(),
            value,
        })?;
    }
    writer.flush()?;

    Ok(())
}
