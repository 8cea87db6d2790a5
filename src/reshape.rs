//! Reshaping wide results tables into tidy long-format records.
//!
//! The pipeline classifies each resource row, aggregates by (zone, category)
//! and melts the wide metric columns into one [`LongRecord`] per metric, which
//! is the shape the chart renderer and CSV writer consume.
use crate::category::{Sector, classify, is_known_category};
use crate::table::{ResourceRecord, TableError, WideTable};
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};

/// The externally visible vocabulary for melted metric columns.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
pub enum MetricType {
    /// End-of-horizon installed power capacity [MW]
    #[serde(rename = "electricity_capacity_MW")]
    #[strum(serialize = "electricity_capacity_MW")]
    ElectricityCapacityMw,
    /// Annual electricity generation [MWh]
    #[serde(rename = "electricity_generation_MWh")]
    #[strum(serialize = "electricity_generation_MWh")]
    ElectricityGenerationMwh,
    /// End-of-horizon hydrogen production capacity [tonne/hr]
    #[serde(rename = "h2_capacity_tonne_hr")]
    #[strum(serialize = "h2_capacity_tonne_hr")]
    H2CapacityTonneHr,
    /// Annual hydrogen production [tonne]
    #[serde(rename = "h2_generation_tonne")]
    #[strum(serialize = "h2_generation_tonne")]
    H2GenerationTonne,
    /// Capacity expansion (positive) or retirement (negative) over the
    /// modelling horizon [MW]
    #[serde(rename = "capacity_delta_MW")]
    #[strum(serialize = "capacity_delta_MW")]
    CapacityDeltaMw,
    /// Installed hydrogen storage energy capacity [tonne]
    #[serde(rename = "h2_storage_capacity_tonne")]
    #[strum(serialize = "h2_storage_capacity_tonne")]
    H2StorageCapacityTonne,
}

/// An ordered map from wide-table metric names to their melted metric types.
pub type MetricRenameMap = IndexMap<String, MetricType>;

/// One melted row: a single metric value for a (zone, category) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRecord {
    /// Grid zone
    pub zone: String,
    /// Canonical technology category (or a singleton fallback category)
    pub resource_category: String,
    /// Which metric this value belongs to
    pub metric_type: MetricType,
    /// The metric value, units per [`MetricType`]
    pub value: f64,
}

/// Replace every row's resource name with its technology category.
///
/// Names that match no bin keep themselves as a singleton category; each one
/// is logged so operators can spot data-entry typos before they become chart
/// legends.
pub fn categorize(table: WideTable, sector: Sector) -> WideTable {
    let rows = table
        .rows
        .into_iter()
        .map(|mut row| {
            let category = classify(&row.resource, sector);
            if !is_known_category(&category, sector) {
                warn!(
                    "resource '{}' matched no {sector} category; keeping it as its own category",
                    row.resource
                );
            }
            row.resource = category;
            row
        })
        .collect();

    WideTable {
        metrics: table.metrics,
        rows,
    }
}

/// Group rows by (zone, category) and sum every metric column.
///
/// Group order is the order groups are first seen, so output is deterministic
/// for a given input. Per-zone metric totals are preserved exactly: aggregation
/// neither loses nor double-counts values.
pub fn aggregate(table: &WideTable) -> WideTable {
    let width = table.metrics.len();
    let mut groups: IndexMap<(String, String), Vec<f64>> = IndexMap::new();
    for row in &table.rows {
        let totals = groups
            .entry((row.zone.clone(), row.resource.clone()))
            .or_insert_with(|| vec![0.0; width]);
        for (total, value) in totals.iter_mut().zip(&row.values) {
            *total += value;
        }
    }

    WideTable {
        metrics: table.metrics.clone(),
        rows: groups
            .into_iter()
            .map(|((zone, resource), values)| ResourceRecord {
                zone,
                resource,
                values,
            })
            .collect(),
    }
}

/// Melt the renamed metric columns into long-format records.
///
/// Produces one record per (row, metric) in metric-major order (all rows for
/// the first metric, then all rows for the next), mirroring the stacking order
/// of a dataframe melt. Storage and battery "generation" rows are discharge of
/// energy that some other resource already generated, so they are dropped to
/// avoid double counting.
pub fn melt(table: &WideTable, rename: &MetricRenameMap) -> Result<Vec<LongRecord>, TableError> {
    let mut columns = Vec::with_capacity(rename.len());
    for (name, &metric) in rename {
        let index = table
            .metric_index(name)
            .ok_or_else(|| TableError::UnknownMetric(name.clone()))?;
        columns.push((index, metric));
    }

    let mut records = Vec::new();
    for (index, metric) in columns {
        for row in &table.rows {
            if is_discharge_double_count(&row.resource, metric) {
                continue;
            }
            records.push(LongRecord {
                zone: row.zone.clone(),
                resource_category: row.resource.clone(),
                metric_type: metric,
                value: row.values[index],
            });
        }
    }

    Ok(records)
}

/// The full reshaping pipeline: join, classify, aggregate and melt.
///
/// `capacity` has already had its `Total` summary rows dropped at load;
/// `generation` maps resource name to annual sum (the transposed generation
/// table reduced to its `AnnualSum` row).
pub fn reshape(
    capacity: WideTable,
    generation: &IndexMap<String, f64>,
    sector: Sector,
    rename: &MetricRenameMap,
) -> Result<Vec<LongRecord>, TableError> {
    let joined = capacity.join_annual_generation(generation);
    let aggregated = aggregate(&categorize(joined, sector));
    melt(&aggregated, rename)
}

/// Whether a melted row is storage/battery discharge masquerading as
/// generation
fn is_discharge_double_count(category: &str, metric: MetricType) -> bool {
    let category = category.to_lowercase();
    (category.contains("storage") || category.contains("battery"))
        && metric.to_string().to_lowercase().contains("generation")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{elec_rename, joined_table};
    use float_cmp::assert_approx_eq;
    use itertools::Itertools;
    use rstest::rstest;

    fn wide_row(zone: &str, resource: &str, values: &[f64]) -> ResourceRecord {
        ResourceRecord {
            zone: zone.to_string(),
            resource: resource.to_string(),
            values: values.to_vec(),
        }
    }

    #[rstest]
    fn test_categorize(joined_table: WideTable) {
        let categorized = categorize(joined_table, Sector::Electricity);
        let categories: Vec<_> = categorized
            .rows
            .iter()
            .map(|row| row.resource.as_str())
            .collect();
        assert_eq!(
            categories,
            vec!["solar", "solar", "battery", "wind", "H2"]
        );
    }

    /// Summing a metric over all aggregated rows gives the same total as over
    /// all input rows
    #[rstest]
    fn test_aggregate_conserves_totals(joined_table: WideTable) {
        let categorized = categorize(joined_table, Sector::Electricity);
        let aggregated = aggregate(&categorized);

        for index in 0..categorized.metrics.len() {
            let before: f64 = categorized.rows.iter().map(|row| row.values[index]).sum();
            let after: f64 = aggregated.rows.iter().map(|row| row.values[index]).sum();
            assert_approx_eq!(f64, before, after);
        }

        // The two Z1 solar resources collapse into one group
        let solar = aggregated
            .rows
            .iter()
            .filter(|row| row.zone == "Z1" && row.resource == "solar")
            .exactly_one()
            .unwrap();
        assert_approx_eq!(f64, solar.values[0], 140.0);
    }

    #[rstest]
    fn test_melt_order_and_rename(joined_table: WideTable, elec_rename: MetricRenameMap) {
        let aggregated = aggregate(&categorize(joined_table, Sector::Electricity));
        let records = melt(&aggregated, &elec_rename).unwrap();

        // Metric-major order: all capacity rows first, then generation
        let metrics: Vec<_> = records.iter().map(|r| r.metric_type).dedup().collect();
        assert_eq!(
            metrics,
            vec![
                MetricType::ElectricityCapacityMw,
                MetricType::ElectricityGenerationMwh
            ]
        );
    }

    /// Battery rows survive for capacity metrics but are dropped for
    /// generation metrics
    #[rstest]
    fn test_melt_drops_storage_discharge(joined_table: WideTable, elec_rename: MetricRenameMap) {
        let aggregated = aggregate(&categorize(joined_table, Sector::Electricity));
        let records = melt(&aggregated, &elec_rename).unwrap();

        assert!(records.iter().any(|r| {
            r.resource_category == "battery" && r.metric_type == MetricType::ElectricityCapacityMw
        }));
        assert!(!records.iter().any(|r| {
            r.resource_category == "battery"
                && r.metric_type == MetricType::ElectricityGenerationMwh
        }));
    }

    #[rstest]
    fn test_melt_unknown_metric(joined_table: WideTable) {
        let rename =
            MetricRenameMap::from([("NoSuchMetric".to_string(), MetricType::CapacityDeltaMw)]);
        let err = melt(&joined_table, &rename).unwrap_err();
        assert!(matches!(err, TableError::UnknownMetric(name) if name == "NoSuchMetric"));
    }

    /// Pivoting the melted records back to wide form reproduces the aggregated
    /// values exactly
    #[rstest]
    fn test_melt_round_trip(joined_table: WideTable, elec_rename: MetricRenameMap) {
        let aggregated = aggregate(&categorize(joined_table, Sector::Electricity));
        let records = melt(&aggregated, &elec_rename).unwrap();

        for (index, metric) in elec_rename.values().enumerate() {
            for row in &aggregated.rows {
                if is_discharge_double_count(&row.resource, *metric) {
                    continue;
                }
                let melted = records
                    .iter()
                    .filter(|r| {
                        r.zone == row.zone
                            && r.resource_category == row.resource
                            && r.metric_type == *metric
                    })
                    .exactly_one()
                    .unwrap();
                assert_approx_eq!(f64, melted.value, row.values[index]);
            }
        }
    }

    /// The end-to-end scenario: capacity + generation for solar and battery in
    /// one zone. Battery generation (discharge) must not appear.
    #[rstest]
    fn test_reshape_end_to_end(elec_rename: MetricRenameMap) {
        let capacity = WideTable {
            metrics: vec!["EndCap".to_string()],
            rows: vec![
                wide_row("Z1", "Z1_solar_photovoltaic", &[100.0]),
                wide_row("Z1", "Z1_battery", &[50.0]),
            ],
        };
        let generation = IndexMap::from([
            ("Z1_solar_photovoltaic".to_string(), 200000.0),
            ("Z1_battery".to_string(), 30000.0),
        ]);

        let records = reshape(capacity, &generation, Sector::Electricity, &elec_rename).unwrap();
        let expected = vec![
            LongRecord {
                zone: "Z1".to_string(),
                resource_category: "solar".to_string(),
                metric_type: MetricType::ElectricityCapacityMw,
                value: 100.0,
            },
            LongRecord {
                zone: "Z1".to_string(),
                resource_category: "battery".to_string(),
                metric_type: MetricType::ElectricityCapacityMw,
                value: 50.0,
            },
            LongRecord {
                zone: "Z1".to_string(),
                resource_category: "solar".to_string(),
                metric_type: MetricType::ElectricityGenerationMwh,
                value: 200000.0,
            },
        ];
        assert_eq!(records, expected);
    }

    /// Fallback categories containing "storage" are also subject to the
    /// de-duplication rule
    #[test]
    fn test_discharge_check_on_fallback_category() {
        assert!(is_discharge_double_count(
            "thermal_storage_experimental",
            MetricType::ElectricityGenerationMwh
        ));
        assert!(!is_discharge_double_count(
            "thermal_storage_experimental",
            MetricType::ElectricityCapacityMw
        ));
    }

    #[test]
    fn test_metric_type_display() {
        assert_eq!(
            MetricType::ElectricityCapacityMw.to_string(),
            "electricity_capacity_MW"
        );
        assert_eq!(
            MetricType::H2GenerationTonne.to_string(),
            "h2_generation_tonne"
        );
    }
}
