//! Fixtures for tests
use crate::reshape::{LongRecord, MetricRenameMap, MetricType};
use crate::table::{ANNUAL_GENERATION_COLUMN, ResourceRecord, WideTable};
use rstest::fixture;

fn row(zone: &str, resource: &str, values: &[f64]) -> ResourceRecord {
    ResourceRecord {
        zone: zone.to_string(),
        resource: resource.to_string(),
        values: values.to_vec(),
    }
}

/// A joined capacity+generation table spanning two zones, with two resources
/// that collapse into the same category and a hydrogen-fuelled turbine
#[fixture]
pub fn joined_table() -> WideTable {
    WideTable {
        metrics: vec!["EndCap".to_string(), ANNUAL_GENERATION_COLUMN.to_string()],
        rows: vec![
            row("Z1", "Z1_solar_photovoltaic", &[100.0, 200000.0]),
            row("Z1", "Z1_utilitypv", &[40.0, 80000.0]),
            row("Z1", "Z1_battery", &[50.0, 30000.0]),
            row("Z2", "Z2_onshore_wind_turbine", &[30.0, 90000.0]),
            row("Z2", "Z2_CCGT-H2", &[25.0, 60000.0]),
        ],
    }
}

#[fixture]
pub fn elec_rename() -> MetricRenameMap {
    MetricRenameMap::from([
        ("EndCap".to_string(), MetricType::ElectricityCapacityMw),
        (
            ANNUAL_GENERATION_COLUMN.to_string(),
            MetricType::ElectricityGenerationMwh,
        ),
    ])
}

#[fixture]
pub fn long_records() -> Vec<LongRecord> {
    vec![
        LongRecord {
            zone: "Z1".to_string(),
            resource_category: "solar".to_string(),
            metric_type: MetricType::ElectricityCapacityMw,
            value: 140.0,
        },
        LongRecord {
            zone: "Z1".to_string(),
            resource_category: "battery".to_string(),
            metric_type: MetricType::ElectricityCapacityMw,
            value: 50.0,
        },
        LongRecord {
            zone: "Z2".to_string(),
            resource_category: "wind".to_string(),
            metric_type: MetricType::ElectricityCapacityMw,
            value: 30.0,
        },
        LongRecord {
            zone: "Z1".to_string(),
            resource_category: "solar".to_string(),
            metric_type: MetricType::ElectricityGenerationMwh,
            value: 280000.0,
        },
    ]
}
