//! Stacked bar chart rendering.
//!
//! The renderer's only contract with the rest of the crate is the long-table
//! shape: it pivots [`LongRecord`]s to zone x category and stacks one bar
//! segment per category. Negative values (capacity retirements) stack
//! downward from zero.
use crate::reshape::{LongRecord, MetricType};
use anyhow::Result;
use indexmap::{IndexMap, IndexSet};
use log::{info, warn};
use plotters::prelude::*;
use plotters::style::Palette;
use std::path::Path;

/// Colours for the canonical technology categories, both sectors.
const CATEGORY_COLOURS: &[(&str, RGBColor)] = &[
    ("natural_gas", RGBColor(0x80, 0x80, 0x80)),
    ("natural_gas_ccs", RGBColor(0xd3, 0xd3, 0xd3)),
    ("hydroelectric", RGBColor(0x00, 0x00, 0xff)),
    ("coal", RGBColor(0x00, 0x00, 0x00)),
    ("solar", RGBColor(0xff, 0xdb, 0x58)),
    ("wind", RGBColor(0x00, 0x80, 0x00)),
    ("nuclear", RGBColor(0x94, 0x00, 0xd3)),
    ("battery", RGBColor(0xff, 0x45, 0x00)),
    ("phs", RGBColor(0x46, 0x82, 0xb4)),
    ("oil", RGBColor(0x8b, 0x45, 0x13)),
    ("biomass", RGBColor(0x22, 0x8b, 0x22)),
    ("H2", RGBColor(0x89, 0xcf, 0xf0)),
    ("smr", RGBColor(0x2f, 0x4f, 0x4f)),
    ("atr", RGBColor(0x80, 0x00, 0x00)),
    ("electrolyzer", RGBColor(0x00, 0xff, 0xff)),
    ("h2_storage", RGBColor(0xff, 0xc0, 0xcb)),
];

/// The file stem used for a metric's figure.
pub fn figure_name(metric: MetricType) -> &'static str {
    match metric {
        MetricType::ElectricityCapacityMw => "elec_capacity",
        MetricType::ElectricityGenerationMwh => "elec_generation",
        MetricType::H2CapacityTonneHr => "h2_capacity",
        MetricType::H2GenerationTonne => "h2_generation",
        MetricType::CapacityDeltaMw => "capacity_delta",
        MetricType::H2StorageCapacityTonne => "h2_storage_capacity",
    }
}

fn chart_title(metric: MetricType) -> &'static str {
    match metric {
        MetricType::ElectricityCapacityMw => "Power Generation Capacity by Zone",
        MetricType::ElectricityGenerationMwh => "Power Generation by Zone",
        MetricType::H2CapacityTonneHr => "H2 Generation Capacity by Zone",
        MetricType::H2GenerationTonne => "H2 Generation by Zone",
        MetricType::CapacityDeltaMw => "Capacity Expansion and Retirement by Zone",
        MetricType::H2StorageCapacityTonne => "H2 Storage Capacity by Zone",
    }
}

fn axis_label(metric: MetricType) -> &'static str {
    match metric {
        MetricType::ElectricityCapacityMw => "Power Capacity (MW)",
        MetricType::ElectricityGenerationMwh => "Power Generation (MWh)",
        MetricType::H2CapacityTonneHr => "H2 Generation Capacity (Tonne/hr)",
        MetricType::H2GenerationTonne => "H2 Generation (Tonne)",
        MetricType::CapacityDeltaMw => "Capacity Delta (MW)",
        MetricType::H2StorageCapacityTonne => "H2 Storage Capacity (Tonne)",
    }
}

/// The colour for a category, with a deterministic fallback palette for
/// categories outside the known vocabulary.
///
/// `fallback_index` keeps fallback colours stable across charts drawn from the
/// same category ordering; each fallback use is logged once per chart.
fn category_colour(category: &str, fallback_index: usize) -> RGBColor {
    if let Some((_, colour)) = CATEGORY_COLOURS.iter().find(|(name, _)| *name == category) {
        return *colour;
    }

    warn!("no colour mapped for category '{category}'; using fallback palette");
    let (r, g, b) = Palette99::COLORS[fallback_index % Palette99::COLORS.len()];
    RGBColor(r, g, b)
}

/// Render a stacked bar chart of one metric to a PNG file.
///
/// Records for other metrics are ignored. With no matching records at all the
/// chart is skipped rather than drawn empty.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn stacked_bar_chart(records: &[LongRecord], metric: MetricType, path: &Path) -> Result<()> {
    // Pivot to zone x category, summing duplicates
    let mut pivot: IndexMap<&str, IndexMap<&str, f64>> = IndexMap::new();
    let mut categories: IndexSet<&str> = IndexSet::new();
    for record in records.iter().filter(|r| r.metric_type == metric) {
        *pivot
            .entry(record.zone.as_str())
            .or_default()
            .entry(record.resource_category.as_str())
            .or_insert(0.0) += record.value;
        categories.insert(record.resource_category.as_str());
    }

    if pivot.is_empty() {
        info!("no rows for metric '{metric}'; skipping chart");
        return Ok(());
    }

    // Axis range from the stacked totals: positives stack up, negatives down
    let mut y_max = f64::MIN;
    let mut y_min: f64 = 0.0;
    for columns in pivot.values() {
        let positive: f64 = columns.values().filter(|v| **v > 0.0).sum();
        let negative: f64 = columns.values().filter(|v| **v < 0.0).sum();
        y_max = y_max.max(positive);
        y_min = y_min.min(negative);
    }
    let y_max = if y_max <= 0.0 { 1.0 } else { y_max * 1.1 };
    let y_min = if y_min < 0.0 { y_min * 1.1 } else { 0.0 };

    let zones: Vec<&str> = pivot.keys().copied().collect();
    let num_zones = zones.len();
    let width = u32::try_from(num_zones).unwrap_or(u32::MAX).saturating_mul(160).max(800);

    let root = BitMapBackend::new(path, (width, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(chart_title(metric), ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(80)
        .build_cartesian_2d(-0.5f64..(num_zones as f64 - 0.5), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Zone")
        .y_desc(axis_label(metric))
        .x_labels(num_zones)
        .x_label_formatter(&|x| {
            // Label only the integer positions, which carry the bars
            let index = x.round();
            if (x - index).abs() > 0.3 || index < 0.0 {
                return String::new();
            }
            zones
                .get(index as usize)
                .map_or_else(String::new, ToString::to_string)
        })
        .draw()?;

    // One series per category so each gets a legend entry; running offsets
    // track the top of each zone's stack
    let mut positive_base = vec![0.0; num_zones];
    let mut negative_base = vec![0.0; num_zones];
    for (fallback_index, &category) in categories.iter().enumerate() {
        let colour = category_colour(category, fallback_index);
        let mut bars = Vec::new();
        for (zone_index, columns) in pivot.values().enumerate() {
            let Some(&value) = columns.get(category) else {
                continue;
            };
            if value == 0.0 {
                continue;
            }

            let base = if value > 0.0 {
                let base = positive_base[zone_index];
                positive_base[zone_index] += value;
                base
            } else {
                let base = negative_base[zone_index];
                negative_base[zone_index] += value;
                base
            };
            let x = zone_index as f64;
            bars.push(Rectangle::new(
                [(x - 0.35, base), (x + 0.35, base + value)],
                colour.filled(),
            ));
        }

        chart
            .draw_series(bars)?
            .label(category)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], colour.filled())
            });
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    root.present()?;
    info!("Saved chart to {}", path.display());

    Ok(())
}

/// Render per-component system costs as one stacked bar per run.
///
/// `breakdowns` maps run name to its component costs, rollup rows already
/// excluded. Cost components sit outside the technology colour vocabulary, so
/// each component gets a palette colour by its first-seen index.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn cost_breakdown_chart(
    breakdowns: &IndexMap<String, IndexMap<String, f64>>,
    path: &Path,
) -> Result<()> {
    let mut components: IndexSet<&str> = IndexSet::new();
    for costs in breakdowns.values() {
        components.extend(costs.keys().map(String::as_str));
    }
    if components.is_empty() {
        info!("no cost components available; skipping chart");
        return Ok(());
    }

    // Negative components (e.g. revenues) stack downward from zero
    let mut y_max = f64::MIN;
    let mut y_min: f64 = 0.0;
    for costs in breakdowns.values() {
        let positive: f64 = costs.values().filter(|v| **v > 0.0).sum();
        let negative: f64 = costs.values().filter(|v| **v < 0.0).sum();
        y_max = y_max.max(positive);
        y_min = y_min.min(negative);
    }
    let y_max = if y_max <= 0.0 { 1.0 } else { y_max * 1.1 };
    let y_min = if y_min < 0.0 { y_min * 1.1 } else { 0.0 };

    let runs: Vec<&str> = breakdowns.keys().map(String::as_str).collect();
    let num_runs = runs.len();
    let width = u32::try_from(num_runs).unwrap_or(u32::MAX).saturating_mul(160).max(800);

    let root = BitMapBackend::new(path, (width, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("System Cost Breakdown by Run", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(-0.5f64..(num_runs as f64 - 0.5), y_min..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Run")
        .y_desc("System cost")
        .x_labels(num_runs)
        .x_label_formatter(&|x| {
            let index = x.round();
            if (x - index).abs() > 0.3 || index < 0.0 {
                return String::new();
            }
            runs.get(index as usize)
                .map_or_else(String::new, ToString::to_string)
        })
        .draw()?;

    let mut positive_base = vec![0.0; num_runs];
    let mut negative_base = vec![0.0; num_runs];
    for (component_index, &component) in components.iter().enumerate() {
        let (r, g, b) = Palette99::COLORS[component_index % Palette99::COLORS.len()];
        let colour = RGBColor(r, g, b);
        let mut bars = Vec::new();
        for (run_index, costs) in breakdowns.values().enumerate() {
            let Some(&value) = costs.get(component) else {
                continue;
            };
            if value == 0.0 {
                continue;
            }

            let base = if value > 0.0 {
                let base = positive_base[run_index];
                positive_base[run_index] += value;
                base
            } else {
                let base = negative_base[run_index];
                negative_base[run_index] += value;
                base
            };
            let x = run_index as f64;
            bars.push(Rectangle::new(
                [(x - 0.35, base), (x + 0.35, base + value)],
                colour.filled(),
            ));
        }

        chart
            .draw_series(bars)?
            .label(component)
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 5), (x + 10, y + 5)], colour.filled())
            });
    }

    chart
        .configure_series_labels()
        .border_style(&BLACK)
        .background_style(&WHITE.mix(0.8))
        .draw()?;
    root.present()?;
    info!("Saved chart to {}", path.display());

    Ok(())
}

/// Render total system cost per run as a simple bar chart.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn cost_comparison_chart(totals: &IndexMap<String, f64>, path: &Path) -> Result<()> {
    if totals.is_empty() {
        info!("no system cost totals available; skipping chart");
        return Ok(());
    }

    let y_max = totals.values().fold(0.0f64, |max, &v| max.max(v)) * 1.1;
    let y_max = if y_max <= 0.0 { 1.0 } else { y_max };
    let runs: Vec<&str> = totals.keys().map(String::as_str).collect();
    let num_runs = runs.len();
    let width = u32::try_from(num_runs).unwrap_or(u32::MAX).saturating_mul(160).max(800);

    let root = BitMapBackend::new(path, (width, 600)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Total System Cost by Run", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(100)
        .build_cartesian_2d(-0.5f64..(num_runs as f64 - 0.5), 0.0..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Run")
        .y_desc("Total system cost")
        .x_labels(num_runs)
        .x_label_formatter(&|x| {
            let index = x.round();
            if (x - index).abs() > 0.3 || index < 0.0 {
                return String::new();
            }
            runs.get(index as usize)
                .map_or_else(String::new, ToString::to_string)
        })
        .draw()?;

    chart.draw_series(totals.values().enumerate().map(|(index, &value)| {
        let x = index as f64;
        Rectangle::new(
            [(x - 0.35, 0.0), (x + 0.35, value)],
            RGBColor(0x46, 0x82, 0xb4).filled(),
        )
    }))?;

    root.present()?;
    info!("Saved chart to {}", path.display());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_category_colours() {
        assert_eq!(category_colour("solar", 0), RGBColor(0xff, 0xdb, 0x58));
        assert_eq!(category_colour("h2_storage", 3), RGBColor(0xff, 0xc0, 0xcb));
    }

    /// Fallback colours are deterministic in the fallback index, not the name
    #[test]
    fn test_fallback_colour_deterministic() {
        let first = category_colour("mystery_tech", 2);
        assert_eq!(category_colour("other_mystery", 2), first);
        assert_ne!(category_colour("mystery_tech", 3), first);
    }

    #[test]
    fn test_figure_names_are_unique() {
        let names = [
            MetricType::ElectricityCapacityMw,
            MetricType::ElectricityGenerationMwh,
            MetricType::H2CapacityTonneHr,
            MetricType::H2GenerationTonne,
            MetricType::CapacityDeltaMw,
            MetricType::H2StorageCapacityTonne,
        ]
        .map(figure_name);
        let unique: std::collections::HashSet<_> = names.iter().collect();
        assert_eq!(unique.len(), names.len());
    }
}
