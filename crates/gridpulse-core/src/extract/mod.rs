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

//! Field extractors for ISO-NE payloads.
//!
//! Every extractor is a pure function over a decoded JSON value. Each one walks a fixed,
//! ordered list of response shapes seen across API versions and returns the first usable
//! match, or `None` when nothing recognizable is present. Callers decide what "not found"
//! means; extractors never substitute a number.

mod fuel_mix;
mod price;
mod system_load;

pub use fuel_mix::{FUEL_MIX_CONTAINERS, categorize_fuel_label, extract_fuel_mix};
pub use price::{PRICE_SHAPES, PriceReading, PriceShape, extract_price};
pub use system_load::extract_system_load;

use serde_json::Value;
use std::slice;

/// Read a finite number from a JSON number or a numeric string
pub(crate) fn number(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

/// Follow a chain of object keys
pub(crate) fn at_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| current.get(*key))
}

/// Records held by a list field.
///
/// ISO-NE collapses single-record lists into a bare object, so an object is treated as a
/// one-entry list. Anything else yields nothing.
pub(crate) fn entries(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        Value::Object(_) => slice::from_ref(value),
        _ => &[],
    }
}

/// First present field among aliases
pub(crate) fn first_field<'a>(entry: &'a Value, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|key| entry.get(*key))
}
