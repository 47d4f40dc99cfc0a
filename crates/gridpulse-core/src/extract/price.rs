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
use std::fmt;
use tracing::{debug, trace};

use super::{at_path, entries, number};

/// A known LMP response layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceShape {
    /// `FiveMinLmp.LmpTotal`, the current API format
    FiveMinLmp,
    /// `FiveMinLmp.Location.LmpTotal`
    FiveMinLmpLocation,
    /// `<array>[0].<field>`
    FirstEntry {
        array: &'static str,
        field: &'static str,
    },
    /// `<array>[0].Location.LmpTotal`
    FirstEntryLocation { array: &'static str },
    /// Top-level scalar
    TopLevel { field: &'static str },
}

/// Shapes in the order they are tried
pub const PRICE_SHAPES: &[PriceShape] = &[
    PriceShape::FiveMinLmp,
    PriceShape::FiveMinLmpLocation,
    PriceShape::FirstEntry {
        array: "HourlyLmps",
        field: "LmpTotal",
    },
    PriceShape::FirstEntry {
        array: "HourlyLmp",
        field: "LmpTotal",
    },
    PriceShape::FirstEntry {
        array: "DaLmps",
        field: "LmpTotal",
    },
    PriceShape::FirstEntry {
        array: "LmpData",
        field: "LmpTotal",
    },
    PriceShape::FirstEntry {
        array: "Prices",
        field: "Price",
    },
    PriceShape::FirstEntry {
        array: "FiveMinPrices",
        field: "Price",
    },
    PriceShape::FirstEntryLocation {
        array: "FiveMinuteLmps",
    },
    PriceShape::TopLevel { field: "Price" },
    PriceShape::TopLevel {
        field: "SystemPrice",
    },
];

impl PriceShape {
    /// Only the current format may report exactly zero. Older layouts used 0 as a
    /// placeholder for "no price".
    pub fn accepts_zero(self) -> bool {
        matches!(self, PriceShape::FiveMinLmp)
    }

    fn locate(self, payload: &Value) -> Option<&Value> {
        match self {
            PriceShape::FiveMinLmp => at_path(payload, &["FiveMinLmp", "LmpTotal"]),
            PriceShape::FiveMinLmpLocation => {
                at_path(payload, &["FiveMinLmp", "Location", "LmpTotal"])
            }
            PriceShape::FirstEntry { array, field } => {
                entries(payload.get(array)?).first()?.get(field)
            }
            PriceShape::FirstEntryLocation { array } => at_path(
                entries(payload.get(array)?).first()?,
                &["Location", "LmpTotal"],
            ),
            PriceShape::TopLevel { field } => payload.get(field),
        }
    }

    /// Usable price at this shape, if any
    pub fn extract(self, payload: &Value) -> Option<f64> {
        let raw = self.locate(payload)?;
        let Some(value) = number(raw) else {
            trace!("Non-numeric price at {}: {}", self, raw);
            return None;
        };
        if !self.accepts_zero() && value.abs() < f64::EPSILON {
            trace!("Ignoring zero placeholder at {}", self);
            return None;
        }
        Some(value)
    }
}

impl fmt::Display for PriceShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceShape::FiveMinLmp => f.write_str("FiveMinLmp.LmpTotal"),
            PriceShape::FiveMinLmpLocation => f.write_str("FiveMinLmp.Location.LmpTotal"),
            PriceShape::FirstEntry { array, field } => write!(f, "{array}[0].{field}"),
            PriceShape::FirstEntryLocation { array } => {
                write!(f, "{array}[0].Location.LmpTotal")
            }
            PriceShape::TopLevel { field } => f.write_str(field),
        }
    }
}

/// Price found in a payload, with the layout it came from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceReading {
    /// $/MWh, may be negative
    pub value: f64,
    pub shape: PriceShape,
}

/// Extract the current LMP from any known price payload
pub fn extract_price(payload: &Value) -> Option<PriceReading> {
    let reading = PRICE_SHAPES.iter().find_map(|shape| {
        shape
            .extract(payload)
            .map(|value| PriceReading { value, shape: *shape })
    });

    match &reading {
        Some(r) => debug!("Found price {} at {}", r.value, r.shape),
        None => debug!("No recognized price format in payload"),
    }
    reading
}
