//! Typed wide results tables read from CSV files.
//!
//! Model output arrives as wide CSV tables: one row per resource for capacity
//! tables, and a transposed layout (resources as column headers) for
//! generation tables. Columns are selected by name up front, so a missing
//! column fails early with an error naming both the column and the file.
use indexmap::IndexMap;
use log::warn;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Column containing resource names.
pub const RESOURCE_COLUMN: &str = "Resource";

/// Column containing zone identifiers.
pub const ZONE_COLUMN: &str = "Zone";

/// Canonical name for the annual-generation metric after joining.
pub const ANNUAL_GENERATION_COLUMN: &str = "AnnualGeneration";

/// Row label for the annual sum in transposed generation tables.
pub const ANNUAL_SUM_ROW: &str = "AnnualSum";

/// Sentinel resource name for source-provided summary rows, which are dropped
/// rather than reclassified.
const TOTAL_SENTINEL: &str = "Total";

/// Errors raised while loading or reshaping results tables.
#[derive(Error, Debug)]
pub enum TableError {
    /// An expected column (or row label) was absent from an input table
    #[error("missing column '{column}' in {}", path.display())]
    MissingColumn {
        /// The absent column or row label
        column: String,
        /// The file it was expected in
        path: PathBuf,
    },
    /// A metric column was requested that the in-memory table does not carry
    #[error("metric column '{0}' not present in table")]
    UnknownMetric(String),
    /// A value failed to parse as a number
    #[error("invalid value '{value}' for column '{column}' in {}", path.display())]
    InvalidValue {
        /// The offending raw field
        value: String,
        /// The column it appeared in
        column: String,
        /// The file it came from
        path: PathBuf,
    },
    /// The CSV file could not be read or parsed
    #[error("error reading {}: {source}", path.display())]
    Csv {
        /// The file being read
        path: PathBuf,
        /// The underlying CSV error
        #[source]
        source: csv::Error,
    },
}

/// One row of a wide results table.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRecord {
    /// Grid zone the resource belongs to
    pub zone: String,
    /// Raw resource name, or its technology category once classified
    pub resource: String,
    /// Metric values, parallel to the owning table's metric names
    pub values: Vec<f64>,
}

/// A wide results table: one row per resource, one value per metric column.
#[derive(Debug, Clone, PartialEq)]
pub struct WideTable {
    /// Names of the numeric metric columns, in declaration order
    pub metrics: Vec<String>,
    /// One record per resource
    pub rows: Vec<ResourceRecord>,
}

impl WideTable {
    /// Read a wide table from a CSV file, keeping only the requested metrics.
    ///
    /// The file must have `Resource` and `Zone` columns plus every requested
    /// metric column; anything absent is reported as
    /// [`TableError::MissingColumn`]. Rows whose resource is the `"Total"`
    /// sentinel are summary rows from the model and are dropped here.
    pub fn from_csv(path: &Path, metrics: &[&str]) -> Result<Self, TableError> {
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
        let resource_index = column_index(RESOURCE_COLUMN)?;
        let zone_index = column_index(ZONE_COLUMN)?;
        let metric_indices = metrics
            .iter()
            .map(|metric| column_index(metric))
            .collect::<Result<Vec<_>, _>>()?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|source| TableError::Csv {
                path: path.to_path_buf(),
                source,
            })?;
            let resource = record.get(resource_index).unwrap_or_default();
            if resource == TOTAL_SENTINEL {
                continue;
            }

            let values = metric_indices
                .iter()
                .zip(metrics)
                .map(|(&index, metric)| {
                    parse_value(record.get(index).unwrap_or_default(), metric, path)
                })
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(ResourceRecord {
                zone: record.get(zone_index).unwrap_or_default().to_string(),
                resource: resource.to_string(),
                values,
            });
        }

        Ok(Self {
            metrics: metrics.iter().map(ToString::to_string).collect(),
            rows,
        })
    }

    /// Inner-join annual generation values onto this table by resource.
    ///
    /// Appends an `AnnualGeneration` metric column. Resources present in only
    /// one of the two inputs are silently dropped; an empty intersection
    /// yields an empty table and a warning, not an error, since callers may
    /// legitimately want to report it and carry on.
    pub fn join_annual_generation(mut self, generation: &IndexMap<String, f64>) -> WideTable {
        let had_rows = !self.rows.is_empty() || !generation.is_empty();
        self.metrics.push(ANNUAL_GENERATION_COLUMN.to_string());

        let rows: Vec<_> = self
            .rows
            .into_iter()
            .filter_map(|mut row| {
                let value = *generation.get(&row.resource)?;
                row.values.push(value);
                Some(row)
            })
            .collect();

        if rows.is_empty() && had_rows {
            warn!("capacity and generation tables share no resources; result is empty");
        }

        WideTable {
            metrics: self.metrics,
            rows,
        }
    }

    /// The position of a metric column, if present
    pub fn metric_index(&self, metric: &str) -> Option<usize> {
        self.metrics.iter().position(|name| name == metric)
    }
}

/// Read the transposed generation table, keeping only the `AnnualSum` row.
///
/// Generation tables arrive with resources as column headers and metrics as
/// row labels in the `Resource` column. The returned map pairs each resource
/// with its annual sum, in column order; a pre-computed `Total` column is
/// dropped. A missing `Resource` label column or `AnnualSum` row is reported
/// as [`TableError::MissingColumn`].
pub fn read_annual_generation(path: &Path) -> Result<IndexMap<String, f64>, TableError> {
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

    if headers.get(0) != Some(RESOURCE_COLUMN) {
        return Err(TableError::MissingColumn {
            column: RESOURCE_COLUMN.to_string(),
            path: path.to_path_buf(),
        });
    }

    for record in reader.records() {
        let record = record.map_err(|source| TableError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if record.get(0) != Some(ANNUAL_SUM_ROW) {
            continue;
        }

        let mut generation = IndexMap::new();
        for (resource, field) in headers.iter().skip(1).zip(record.iter().skip(1)) {
            if resource == TOTAL_SENTINEL {
                continue;
            }
            generation.insert(resource.to_string(), parse_value(field, resource, path)?);
        }
        return Ok(generation);
    }

    Err(TableError::MissingColumn {
        column: ANNUAL_SUM_ROW.to_string(),
        path: path.to_path_buf(),
    })
}

/// Parse a numeric CSV field, treating an empty field as zero
fn parse_value(field: &str, column: &str, path: &Path) -> Result<f64, TableError> {
    let field = field.trim();
    if field.is_empty() {
        return Ok(0.0);
    }

    field.parse().map_err(|_| TableError::InvalidValue {
        value: field.to_string(),
        column: column.to_string(),
        path: path.to_path_buf(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    /// Create a small capacity file in dir_path
    fn create_capacity_file(dir_path: &Path) -> PathBuf {
        let file_path = dir_path.join("capacity.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "Resource,Zone,StartCap,EndCap
Z1_solar_photovoltaic,Z1,20.0,100.0
Z1_battery,Z1,0.0,50.0
Z2_onshore_wind_turbine,Z2,10.0,30.0
Total,n/a,30.0,180.0"
        )
        .unwrap();
        file_path
    }

    fn create_power_file(dir_path: &Path) -> PathBuf {
        let file_path = dir_path.join("power.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(
            file,
            "Resource,Z1_solar_photovoltaic,Z1_battery,Z2_onshore_wind_turbine,Total
Zone,1,1,2,
AnnualSum,200000.0,30000.0,90000.0,320000.0
t1,22.0,3.5,10.0,35.5"
        )
        .unwrap();
        file_path
    }

    #[test]
    fn test_from_csv() {
        let dir = tempdir().unwrap();
        let path = create_capacity_file(dir.path());
        let table = WideTable::from_csv(&path, &["EndCap"]).unwrap();

        assert_eq!(table.metrics, vec!["EndCap".to_string()]);
        // The Total summary row is dropped
        assert_eq!(table.rows.len(), 3);
        assert_eq!(
            table.rows[0],
            ResourceRecord {
                zone: "Z1".to_string(),
                resource: "Z1_solar_photovoltaic".to_string(),
                values: vec![100.0],
            }
        );
    }

    #[test]
    fn test_from_csv_missing_column() {
        let dir = tempdir().unwrap();
        let path = create_capacity_file(dir.path());
        let err = WideTable::from_csv(&path, &["EndEnergyCap"]).unwrap_err();
        assert!(matches!(
            err,
            TableError::MissingColumn { ref column, .. } if column == "EndEnergyCap"
        ));
        // The message names both the column and the file
        let message = err.to_string();
        assert!(message.contains("EndEnergyCap"));
        assert!(message.contains("capacity.csv"));
    }

    #[test]
    fn test_read_annual_generation() {
        let dir = tempdir().unwrap();
        let path = create_power_file(dir.path());
        let generation = read_annual_generation(&path).unwrap();

        // The Total column is dropped; order follows the file
        assert_eq!(
            generation,
            IndexMap::from([
                ("Z1_solar_photovoltaic".to_string(), 200000.0),
                ("Z1_battery".to_string(), 30000.0),
                ("Z2_onshore_wind_turbine".to_string(), 90000.0),
            ])
        );
    }

    #[test]
    fn test_read_annual_generation_missing_row() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("power.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "Resource,res1\nZone,1\nt1,2.0").unwrap();

        let err = read_annual_generation(&file_path).unwrap_err();
        assert!(matches!(
            err,
            TableError::MissingColumn { ref column, .. } if column == ANNUAL_SUM_ROW
        ));
    }

    #[test]
    fn test_join_annual_generation() {
        let dir = tempdir().unwrap();
        let capacity = WideTable::from_csv(&create_capacity_file(dir.path()), &["EndCap"]).unwrap();
        let generation = read_annual_generation(&create_power_file(dir.path())).unwrap();

        let joined = capacity.join_annual_generation(&generation);
        assert_eq!(
            joined.metrics,
            vec!["EndCap".to_string(), ANNUAL_GENERATION_COLUMN.to_string()]
        );
        assert_eq!(joined.rows.len(), 3);
        assert_eq!(joined.rows[0].values, vec![100.0, 200000.0]);
    }

    /// Resources present in only one table are dropped by the join
    #[test]
    fn test_join_is_inner() {
        let dir = tempdir().unwrap();
        let capacity = WideTable::from_csv(&create_capacity_file(dir.path()), &["EndCap"]).unwrap();
        let generation = IndexMap::from([
            ("Z1_battery".to_string(), 30000.0),
            ("not_in_capacity".to_string(), 1.0),
        ]);

        let joined = capacity.join_annual_generation(&generation);
        assert_eq!(joined.rows.len(), 1);
        assert_eq!(joined.rows[0].resource, "Z1_battery");
    }

    /// An empty intersection yields an empty table, not an error
    #[test]
    fn test_join_empty_intersection() {
        let dir = tempdir().unwrap();
        let capacity = WideTable::from_csv(&create_capacity_file(dir.path()), &["EndCap"]).unwrap();
        let generation = IndexMap::from([("unrelated".to_string(), 1.0)]);

        let joined = capacity.join_annual_generation(&generation);
        assert!(joined.rows.is_empty());
    }

    #[test]
    fn test_invalid_value() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("capacity.csv");
        let mut file = File::create(&file_path).unwrap();
        writeln!(file, "Resource,Zone,EndCap\nres1,Z1,not_a_number").unwrap();

        let err = WideTable::from_csv(&file_path, &["EndCap"]).unwrap_err();
        assert!(matches!(
            err,
            TableError::InvalidValue { ref value, .. } if value == "not_a_number"
        ));
    }
}
