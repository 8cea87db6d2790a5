//! Per-run and batch analysis drivers.
//!
//! Each analysis loads one or two results tables, runs them through the
//! reshaping pipeline and yields long-format records. The drivers tie the
//! analyses to the filesystem: locate the results directory, run every
//! applicable analysis, then write the long CSV and one chart per metric.
use crate::category::Sector;
use crate::output::{
    COST_DATA_FILE_NAME, LONG_DATA_FILE_NAME, create_figures_dir, write_cost_breakdown,
    write_long_records,
};
use crate::plot::{cost_breakdown_chart, cost_comparison_chart, figure_name, stacked_bar_chart};
use crate::reshape::{
    LongRecord, MetricRenameMap, MetricType, aggregate, categorize, melt, reshape,
};
use crate::results::{find_latest_results_dir, results_file_path};
use crate::table::{
    ANNUAL_GENERATION_COLUMN, TableError, WideTable, read_annual_generation,
};
use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Power sector capacity table.
pub const CAPACITY_FILE_NAME: &str = "capacity.csv";

/// Power sector generation table (transposed).
pub const POWER_FILE_NAME: &str = "power.csv";

/// Hydrogen sector capacity table.
pub const H2_CAPACITY_FILE_NAME: &str = "HSC_generation_storage_capacity.csv";

/// Hydrogen sector generation table (transposed).
pub const H2_GENERATION_FILE_NAME: &str = "HSC_h2_generation_discharge.csv";

/// System cost summary table.
pub const COSTS_FILE_NAME: &str = "costs_system.csv";

const START_CAPACITY_COLUMN: &str = "StartCap";
const END_CAPACITY_COLUMN: &str = "EndCap";
const END_ENERGY_CAPACITY_COLUMN: &str = "EndEnergyCap";
const CAPACITY_DELTA_COLUMN: &str = "CapacityDelta";

const COSTS_LABEL_COLUMN: &str = "Costs";
const COSTS_VALUE_COLUMN: &str = "Total";
const TOTAL_COST_ROW: &str = "cTotal";

/// Sector-level rollup rows in the cost table; these duplicate their
/// components and are excluded from the breakdown.
const COST_ROLLUP_ROWS: &[&str] = &["cTotal", "cPower_Total", "cHSC_Total", "cCSC_Total"];

/// Every metric a run analysis can produce, in output order.
const ALL_METRICS: [MetricType; 6] = [
    MetricType::ElectricityCapacityMw,
    MetricType::ElectricityGenerationMwh,
    MetricType::H2CapacityTonneHr,
    MetricType::H2GenerationTonne,
    MetricType::CapacityDeltaMw,
    MetricType::H2StorageCapacityTonne,
];

/// The system cost summary for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemCosts {
    /// Cost components by label, rollup rows excluded
    pub components: IndexMap<String, f64>,
    /// The grand total, when the table carries a `cTotal` row
    pub total: Option<f64>,
}

fn electricity_rename() -> MetricRenameMap {
    MetricRenameMap::from([
        (
            END_CAPACITY_COLUMN.to_string(),
            MetricType::ElectricityCapacityMw,
        ),
        (
            ANNUAL_GENERATION_COLUMN.to_string(),
            MetricType::ElectricityGenerationMwh,
        ),
    ])
}

fn hydrogen_rename() -> MetricRenameMap {
    MetricRenameMap::from([
        (
            END_CAPACITY_COLUMN.to_string(),
            MetricType::H2CapacityTonneHr,
        ),
        (
            ANNUAL_GENERATION_COLUMN.to_string(),
            MetricType::H2GenerationTonne,
        ),
    ])
}

/// Electricity capacity and generation by zone and category.
pub fn electricity_analysis(results_dir: &Path) -> Result<Vec<LongRecord>> {
    let capacity_path = results_file_path(results_dir, CAPACITY_FILE_NAME);
    let capacity = WideTable::from_csv(&capacity_path, &[END_CAPACITY_COLUMN])
        .with_context(|| format!("could not load {}", capacity_path.display()))?;

    let power_path = results_file_path(results_dir, POWER_FILE_NAME);
    let generation = read_annual_generation(&power_path)
        .with_context(|| format!("could not load {}", power_path.display()))?;

    Ok(reshape(
        capacity,
        &generation,
        Sector::Electricity,
        &electricity_rename(),
    )?)
}

/// Hydrogen production capacity and generation by zone and category.
pub fn h2_analysis(results_dir: &Path) -> Result<Vec<LongRecord>> {
    let capacity_path = results_file_path(results_dir, H2_CAPACITY_FILE_NAME);
    let capacity = WideTable::from_csv(&capacity_path, &[END_CAPACITY_COLUMN])
        .with_context(|| format!("could not load {}", capacity_path.display()))?;

    let generation_path = results_file_path(results_dir, H2_GENERATION_FILE_NAME);
    let generation = read_annual_generation(&generation_path)
        .with_context(|| format!("could not load {}", generation_path.display()))?;

    Ok(reshape(
        capacity,
        &generation,
        Sector::Hydrogen,
        &hydrogen_rename(),
    )?)
}

/// Power capacity built or retired over the horizon, by zone and category.
pub fn capacity_delta_analysis(results_dir: &Path) -> Result<Vec<LongRecord>> {
    let path = results_file_path(results_dir, CAPACITY_FILE_NAME);
    let table = WideTable::from_csv(&path, &[START_CAPACITY_COLUMN, END_CAPACITY_COLUMN])
        .with_context(|| format!("could not load {}", path.display()))?;

    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            row.values = vec![row.values[1] - row.values[0]];
            row
        })
        .collect();
    let deltas = WideTable {
        metrics: vec![CAPACITY_DELTA_COLUMN.to_string()],
        rows,
    };

    let aggregated = aggregate(&categorize(deltas, Sector::Electricity));
    let rename = MetricRenameMap::from([(
        CAPACITY_DELTA_COLUMN.to_string(),
        MetricType::CapacityDeltaMw,
    )]);
    Ok(melt(&aggregated, &rename)?)
}

/// Installed hydrogen storage energy capacity by zone and category.
///
/// Resources with no storage component report zero energy capacity; those
/// rows are dropped so the chart only shows actual storage.
pub fn h2_storage_analysis(results_dir: &Path) -> Result<Vec<LongRecord>> {
    let path = results_file_path(results_dir, H2_CAPACITY_FILE_NAME);
    let table = WideTable::from_csv(&path, &[END_ENERGY_CAPACITY_COLUMN])
        .with_context(|| format!("could not load {}", path.display()))?;

    let aggregated = aggregate(&categorize(table, Sector::Hydrogen));
    let rename = MetricRenameMap::from([(
        END_ENERGY_CAPACITY_COLUMN.to_string(),
        MetricType::H2StorageCapacityTonne,
    )]);
    let records = melt(&aggregated, &rename)?;
    Ok(records.into_iter().filter(|r| r.value != 0.0).collect())
}

/// Read the system cost summary table.
pub fn system_costs(path: &Path) -> Result<SystemCosts, TableError> {
    let mut reader = csv::Reader::from_path(path).map_err(|source| TableError::Csv {
        path: path.to_path_buf(),
        source,
    })?;
    let headers = reader
        .headers()
        .map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let column_index = |column: &str| {
        headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| TableError::MissingColumn {
                column: column.to_string(),
                path: path.to_path_buf(),
            })
    };
    let label_index = column_index(COSTS_LABEL_COLUMN)?;
    let value_index = column_index(COSTS_VALUE_COLUMN)?;

    let mut costs = SystemCosts {
        components: IndexMap::new(),
        total: None,
    };
    for record in reader.records() {
        let record = record.map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let label = record.get(label_index).unwrap_or_default();
        let field = record.get(value_index).unwrap_or_default().trim();
        if field.is_empty() {
            continue;
        }
        let value: f64 = field.parse().map_err(|_| TableError::InvalidValue {
            value: field.to_string(),
            column: COSTS_VALUE_COLUMN.to_string(),
            path: path.to_path_buf(),
        })?;

        if label == TOTAL_COST_ROW {
            costs.total = Some(value);
        }
        if !COST_ROLLUP_ROWS.contains(&label) {
            costs.components.insert(label.to_string(), value);
        }
    }

    Ok(costs)
}

/// Run every applicable analysis against one results directory.
///
/// The electricity tables are mandatory. Hydrogen supply chain tables are
/// analysed only when present, since power-only model configurations don't
/// write them.
pub fn analyse_results_dir(results_dir: &Path) -> Result<Vec<LongRecord>> {
    let mut records = electricity_analysis(results_dir)?;
    records.extend(capacity_delta_analysis(results_dir)?);

    if results_file_path(results_dir, H2_CAPACITY_FILE_NAME).exists() {
        records.extend(h2_analysis(results_dir)?);
        records.extend(h2_storage_analysis(results_dir)?);
    } else {
        info!(
            "no hydrogen supply chain outputs in {}; skipping H2 analyses",
            results_dir.display()
        );
    }

    Ok(records)
}

/// Analyse a single run directory and write its figures and long CSV, plus a
/// system cost breakdown when the cost table is present.
///
/// Output goes to a `Figures` folder under `output_dir`, or under the run
/// directory itself when no output directory is given.
pub fn run_single(run_dir: &Path, output_dir: Option<&Path>) -> Result<()> {
    let results_dir = find_latest_results_dir(run_dir)?;
    info!("Analysing results in {}", results_dir.display());
    let records = analyse_results_dir(&results_dir)?;

    let figures_dir = create_figures_dir(output_dir.unwrap_or(run_dir))?;
    let run = run_name(run_dir);
    write_long_records(
        &figures_dir.join(LONG_DATA_FILE_NAME),
        records.iter().map(|r| (run.as_str(), r)),
    )?;

    for metric in ALL_METRICS {
        let path = figures_dir.join(format!("{}.png", figure_name(metric)));
        stacked_bar_chart(&records, metric, &path)?;
    }

    match system_costs(&results_file_path(&results_dir, COSTS_FILE_NAME)) {
        Ok(costs) => {
            if let Some(total) = costs.total {
                info!("Total system cost: {total}");
            }
            write_system_costs(&figures_dir, [(run, costs)].into())?;
        }
        Err(err) => warn!("system costs unavailable: {err}"),
    }

    Ok(())
}

/// Write the cost breakdown CSV and its stacked chart for one or more runs
fn write_system_costs(figures_dir: &Path, costs: IndexMap<String, SystemCosts>) -> Result<()> {
    write_cost_breakdown(
        &figures_dir.join(COST_DATA_FILE_NAME),
        costs.iter().flat_map(|(run, costs)| {
            costs
                .components
                .iter()
                .map(move |(component, &value)| (run.as_str(), component.as_str(), value))
        }),
    )?;

    let breakdowns = costs
        .into_iter()
        .map(|(run, costs)| (run, costs.components))
        .collect();
    cost_breakdown_chart(&breakdowns, &figures_dir.join("system_cost_breakdown.png"))
}

/// Analyse every run directory under `runs_dir` and write combined output.
///
/// Each subdirectory is treated as one run. Runs that fail to analyse are
/// logged and skipped; the batch fails only when no run succeeds. Output is a
/// single run-tagged long CSV plus cross-run cost charts (total comparison
/// and per-component breakdown), written under `output_dir` (default:
/// `runs_dir`).
pub fn run_batch(runs_dir: &Path, output_dir: Option<&Path>) -> Result<()> {
    let mut run_dirs: Vec<PathBuf> = fs::read_dir(runs_dir)
        .with_context(|| format!("could not read runs directory {}", runs_dir.display()))?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            path.is_dir().then_some(path)
        })
        .collect();
    run_dirs.sort();

    let mut all_records: Vec<(String, Vec<LongRecord>)> = Vec::new();
    let mut run_costs: IndexMap<String, SystemCosts> = IndexMap::new();
    for run_dir in run_dirs {
        let run = run_name(&run_dir);
        let analysed = find_latest_results_dir(&run_dir)
            .map_err(anyhow::Error::from)
            .and_then(|results_dir| {
                let records = analyse_results_dir(&results_dir)?;
                let costs = system_costs(&results_file_path(&results_dir, COSTS_FILE_NAME)).ok();
                Ok((records, costs))
            });
        match analysed {
            Ok((records, costs)) => {
                info!("Analysed run '{run}'");
                if let Some(costs) = costs {
                    run_costs.insert(run.clone(), costs);
                }
                all_records.push((run, records));
            }
            Err(err) => warn!("skipping run '{run}': {err:#}"),
        }
    }

    if all_records.is_empty() {
        bail!("no runs could be analysed in {}", runs_dir.display());
    }

    let figures_dir = create_figures_dir(output_dir.unwrap_or(runs_dir))?;
    write_long_records(
        &figures_dir.join(LONG_DATA_FILE_NAME),
        all_records
            .iter()
            .flat_map(|(run, records)| records.iter().map(move |r| (run.as_str(), r))),
    )?;
    let cost_totals: IndexMap<String, f64> = run_costs
        .iter()
        .filter_map(|(run, costs)| Some((run.clone(), costs.total?)))
        .collect();
    cost_comparison_chart(&cost_totals, &figures_dir.join("system_cost_comparison.png"))?;
    write_system_costs(&figures_dir, run_costs)?;

    Ok(())
}

/// The display name of a run, from its directory name
fn run_name(run_dir: &Path) -> String {
    run_dir
        .file_name()
        .map_or_else(|| run_dir.display().to_string(), |name| {
            name.to_string_lossy().into_owned()
        })
}
