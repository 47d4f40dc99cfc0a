// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of GridPulse.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use serde_json::Value;
use std::collections::BTreeMap;
use tracing::{debug, warn};

use super::{at_path, entries, first_field, number};
use crate::types::FuelCategory;

/// Paths to the per-fuel list, tried in order
pub const FUEL_MIX_CONTAINERS: &[&[&str]] = &[
    &["GenFuelMixes", "GenFuelMix"],
    &["GenFuelMixes"],
    &["FuelMixes", "FuelMix"],
    &["CurrentMixes"],
];

const LABEL_FIELDS: &[&str] = &["FuelCategory", "Fuel"];
const MEGAWATT_FIELDS: &[&str] = &["GenMw", "GenMW", "Mw"];

/// Labels ISO-NE publishes verbatim
const EXACT_LABELS: &[(&str, FuelCategory)] = &[
    ("Natural Gas", FuelCategory::NaturalGas),
    ("Nuclear", FuelCategory::Nuclear),
    ("Coal", FuelCategory::Coal),
    ("Oil", FuelCategory::Oil),
    ("Hydro", FuelCategory::Hydro),
    ("Solar", FuelCategory::Solar),
    ("Wind", FuelCategory::Wind),
    ("Wood", FuelCategory::Biomass),
    ("Refuse", FuelCategory::Biomass),
    ("Landfill Gas", FuelCategory::Biomass),
    ("Imports", FuelCategory::Imports),
    ("Other", FuelCategory::Other),
];

/// Lowercase fragments for composite labels such as "Hydro (Pumped Storage)".
/// Order matters.
const LABEL_FRAGMENTS: &[(&str, FuelCategory)] = &[
    ("natural gas", FuelCategory::NaturalGas),
    ("nuclear", FuelCategory::Nuclear),
    ("coal", FuelCategory::Coal),
    ("oil", FuelCategory::Oil),
    ("hydro", FuelCategory::Hydro),
    ("solar", FuelCategory::Solar),
    ("wind", FuelCategory::Wind),
    ("wood", FuelCategory::Biomass),
    ("refuse", FuelCategory::Biomass),
    ("landfill", FuelCategory::Biomass),
    ("biomass", FuelCategory::Biomass),
    ("import", FuelCategory::Imports),
];

/// Map an upstream fuel label onto a canonical category
pub fn categorize_fuel_label(label: &str) -> FuelCategory {
    let label = label.trim();
    if let Some((_, category)) = EXACT_LABELS.iter().find(|(name, _)| *name == label) {
        return *category;
    }

    let lowered = label.to_lowercase();
    LABEL_FRAGMENTS
        .iter()
        .find(|(fragment, _)| lowered.contains(fragment))
        .map_or(FuelCategory::Other, |(_, category)| *category)
}

/// Accumulated megawatts per category.
///
/// Returns `None` when no known container holds a list, or when the summed generation is
/// below `min_total_mw`.
pub fn extract_fuel_mix(payload: &Value, min_total_mw: f64) -> Option<BTreeMap<FuelCategory, f64>> {
    let (path, list) = FUEL_MIX_CONTAINERS.iter().find_map(|path| {
        let list = entries(at_path(payload, path)?);
        // A bare GenFuelMixes object is the wrapper, not a single entry
        let usable = list
            .iter()
            .any(|entry| first_field(entry, LABEL_FIELDS).is_some());
        usable.then_some((path, list))
    })?;

    let mut megawatts: BTreeMap<FuelCategory, f64> = BTreeMap::new();
    let mut skipped = 0_usize;

    for entry in list {
        let label = first_field(entry, LABEL_FIELDS).and_then(Value::as_str);
        let mw = first_field(entry, MEGAWATT_FIELDS).and_then(number);

        match (label, mw) {
            (Some(label), Some(mw)) => {
                *megawatts.entry(categorize_fuel_label(label)).or_insert(0.0) += mw;
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!("Skipped {} fuel mix entries without label or MW", skipped);
    }

    let total: f64 = megawatts.values().sum();
    if total < min_total_mw {
        warn!(
            "Fuel mix at {} totals {:.2} MW, below the {:.2} MW threshold",
            path.join("."),
            total,
            min_total_mw
        );
        return None;
    }

    debug!(
        "Extracted {} fuel categories ({:.2} MW) from {}",
        megawatts.len(),
        total,
        path.join(".")
    );
    Some(megawatts)
}
