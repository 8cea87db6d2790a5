//! Classification of raw resource names into canonical technology categories.
//!
//! Capacity-expansion outputs identify resources with free-form, model-specific
//! strings (e.g. `"PJM_West_naturalgas_ccccsavgcf_conservative"`). Charts need a
//! small set of technology categories, so names are bucketed by ordered
//! substring matching against per-sector bin tables.
use std::fmt::Display;

/// An ordered table of (category, patterns) pairs.
///
/// Declaration order is significant: when a name matches patterns from more
/// than one category, the category declared first wins.
pub type BinTable = &'static [(&'static str, &'static [&'static str])];

/// Category bins for electricity-sector resources.
pub const ELECTRICITY_BINS: BinTable = &[
    (
        "natural_gas",
        &[
            "natural_gas",
            "naturalgas",
            "ng",
            "combined_cycle",
            "ocgt",
            "ccgt",
        ],
    ),
    ("hydroelectric", &["hydro", "hydroelectric", "ror"]),
    ("coal", &["coal", "lignite"]),
    ("solar", &["solar", "pv"]),
    ("wind", &["wind"]),
    ("nuclear", &["nuclear"]),
    ("battery", &["battery", "lithium", "storage"]),
    ("phs", &["phs", "pumped"]),
    ("oil", &["oil"]),
    ("biomass", &["biomass"]),
    // Hydrogen-fuelled turbines are caught by the priority check in
    // `classify_with` before the bin tables are consulted
    ("H2", &["h2"]),
];

/// Category bins for hydrogen-sector resources.
pub const HYDROGEN_BINS: BinTable = &[
    ("smr", &["smr"]),
    ("atr", &["atr"]),
    ("electrolyzer", &["electrolyzer", "electrolyzers"]),
    ("h2_storage", &["storage"]),
    ("flex_demand", &["flex_demand"]),
];

/// The sector whose bin table is used for classification.
///
/// The selector is an enum, so requesting an unknown bin set is impossible by
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Sector {
    /// Electricity-sector resources (generation and storage)
    Electricity,
    /// Hydrogen-supply-chain resources
    Hydrogen,
}

impl Sector {
    /// The ordered bin table for this sector
    pub fn bins(&self) -> BinTable {
        match self {
            Sector::Electricity => ELECTRICITY_BINS,
            Sector::Hydrogen => HYDROGEN_BINS,
        }
    }
}

/// Classify a raw resource name into a technology category.
///
/// Classification never fails: a name that matches no pattern becomes its own
/// singleton category (the lower-cased name, returned verbatim). Callers can
/// detect such fallbacks with [`is_known_category`].
pub fn classify(resource_name: &str, sector: Sector) -> String {
    classify_with(sector.bins(), resource_name)
}

/// Classify a resource name against an explicit bin table.
///
/// The algorithm, in order:
///
/// 1. Lower-case the name.
/// 2. If `"h2"` occurs anywhere in the name, return `"H2"` immediately. This
///    keeps hydrogen-fuelled combustion turbines (e.g. `"CCGT-H2"`), whose
///    names also match the natural-gas patterns, out of the gas bin.
/// 3. Return the first category any of whose patterns is a substring of the
///    name, iterating categories and patterns in declaration order.
/// 4. If `"ccs"` also appears in the name, the matched category becomes its
///    carbon-capture variant `"<category>_ccs"` instead. Only fires after a
///    match, so a name that merely contains `"ccs"` still falls through.
/// 5. With no match at all, the lower-cased name is returned unchanged.
pub fn classify_with(bins: BinTable, resource_name: &str) -> String {
    let name = resource_name.to_lowercase();

    if name.contains("h2") {
        return "H2".to_string();
    }

    for (category, patterns) in bins {
        for pattern in *patterns {
            if name.contains(pattern) {
                if name.contains("ccs") {
                    return format!("{category}_ccs");
                }
                return (*category).to_string();
            }
        }
    }

    name
}

/// Whether `category` belongs to the sector's bin vocabulary.
///
/// Accepts bin names, their `_ccs` variants and the `H2` override category.
/// Returns false for singleton fallback categories produced by [`classify`]
/// for unmatched names.
pub fn is_known_category(category: &str, sector: Sector) -> bool {
    if category == "H2" {
        return true;
    }

    let base = category.strip_suffix("_ccs").unwrap_or(category);
    sector.bins().iter().any(|(name, _)| *name == base)
}

/// Strip a known zone prefix (`"<zone>_"`) from a resource name.
///
/// Used when resource names are zone-qualified at the source; names without a
/// recognised prefix are returned unchanged.
pub fn strip_zone_prefix<'a, Z>(resource_name: &'a str, zones: &[Z]) -> &'a str
where
    Z: Display,
{
    for zone in zones {
        let prefix = format!("{zone}_");
        if let Some(rest) = resource_name.strip_prefix(&prefix) {
            return rest;
        }
    }

    resource_name
}
