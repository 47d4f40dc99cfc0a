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

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::calc::carbon_intensity;
use crate::config::GridConfig;

pub const PRICE_UNIT: &str = "$/MWh";
pub const CARBON_INTENSITY_UNIT: &str = "kg CO₂eq/MWh";

/// Canonical fuel categories every upstream label is folded into
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum FuelCategory {
    NaturalGas,
    Nuclear,
    Hydro,
    Solar,
    Wind,
    Coal,
    Oil,
    Biomass,
    Imports,
    Other,
}

impl FuelCategory {
    pub const ALL: [FuelCategory; 10] = [
        FuelCategory::NaturalGas,
        FuelCategory::Nuclear,
        FuelCategory::Hydro,
        FuelCategory::Solar,
        FuelCategory::Wind,
        FuelCategory::Coal,
        FuelCategory::Oil,
        FuelCategory::Biomass,
        FuelCategory::Imports,
        FuelCategory::Other,
    ];

    /// Key used in JSON output and configuration tables
    pub fn as_str(self) -> &'static str {
        match self {
            FuelCategory::NaturalGas => "natural_gas",
            FuelCategory::Nuclear => "nuclear",
            FuelCategory::Hydro => "hydro",
            FuelCategory::Solar => "solar",
            FuelCategory::Wind => "wind",
            FuelCategory::Coal => "coal",
            FuelCategory::Oil => "oil",
            FuelCategory::Biomass => "biomass",
            FuelCategory::Imports => "imports",
            FuelCategory::Other => "other",
        }
    }
}

impl FromStr for FuelCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown fuel category '{s}'"))
    }
}

impl TryFrom<String> for FuelCategory {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for FuelCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fuel breakdown in two parallel forms.
///
/// For live data both maps hold exactly the categories with non-zero generation and
/// `percentages` is derived from `megawatts`. The default mix instead carries the
/// configured percentages with every key at 0 MW.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelMix {
    pub percentages: BTreeMap<FuelCategory, f64>,
    pub megawatts: BTreeMap<FuelCategory, f64>,
}

impl FuelMix {
    /// Build the static fallback mix from configured percentages
    pub fn from_default(default_mix: &BTreeMap<FuelCategory, f64>) -> Self {
        Self {
            percentages: default_mix.clone(),
            megawatts: default_mix.keys().map(|k| (*k, 0.0)).collect(),
        }
    }

    pub fn total_megawatts(&self) -> f64 {
        self.megawatts.values().sum()
    }
}

/// Generation-side and delivered-resource-side mixes, kept side by side
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FuelMixes {
    pub generation_mix: FuelMix,
    pub resource_mix: FuelMix,
}

/// One parsed system-load interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub actual_mw: f64,
    pub forecast_mw: f64,
}

/// Actual vs forecast system load as three parallel series.
///
/// The fields are only reachable through [`SystemLoadSeries::from_points`], which
/// keeps the three sequences the same length and in ascending time order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SystemLoadSeries {
    timestamps: Vec<DateTime<FixedOffset>>,
    actual: Vec<f64>,
    forecast: Vec<f64>,
}

impl SystemLoadSeries {
    /// Returns `None` for an empty input
    pub fn from_points(mut points: Vec<LoadPoint>) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        // Stable: equal timestamps keep their upstream order
        points.sort_by_key(|p| p.timestamp);

        let mut series = Self {
            timestamps: Vec::with_capacity(points.len()),
            actual: Vec::with_capacity(points.len()),
            forecast: Vec::with_capacity(points.len()),
        };
        for point in points {
            series.timestamps.push(point.timestamp);
            series.actual.push(point.actual_mw);
            series.forecast.push(point.forecast_mw);
        }
        Some(series)
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[DateTime<FixedOffset>] {
        &self.timestamps
    }

    pub fn actual(&self) -> &[f64] {
        &self.actual
    }

    pub fn forecast(&self) -> &[f64] {
        &self.forecast
    }
}

/// Where a dashboard value came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Extracted from a live upstream response during this request
    Api,
    /// Last-known-good or static default
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Api => f.write_str("api"),
            Provenance::Fallback => f.write_str("fallback"),
        }
    }
}

/// A value paired with its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Provenance,
}

impl<T> Resolved<T> {
    pub fn live(value: T) -> Self {
        Self {
            value,
            source: Provenance::Api,
        }
    }

    pub fn fallback(value: T) -> Self {
        Self {
            value,
            source: Provenance::Fallback,
        }
    }

    pub fn is_live(&self) -> bool {
        self.source == Provenance::Api
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceField {
    pub current: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CarbonIntensityField {
    pub current: f64,
    pub unit: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ApiInfo {
    pub price_data_source: Provenance,
    pub fuel_mix_source: Provenance,
    pub system_load_source: Provenance,
}

impl ApiInfo {
    pub fn all_fallback() -> Self {
        Self {
            price_data_source: Provenance::Fallback,
            fuel_mix_source: Provenance::Fallback,
            system_load_source: Provenance::Fallback,
        }
    }
}

/// Consolidated response served to the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub price: PriceField,
    pub generation_mix: FuelMix,
    pub resource_mix: FuelMix,
    pub carbon_intensity: CarbonIntensityField,
    pub system_load: Option<SystemLoadSeries>,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "api_info")]
    pub api_info: ApiInfo,
}

impl DashboardSnapshot {
    /// Snapshot built purely from configured defaults
    pub fn fallback(config: &GridConfig) -> Self {
        let default_mix = FuelMix::from_default(&config.defaults.fuel_mix);
        let intensity = carbon_intensity(&config.defaults.fuel_mix, &config.emission_factors);

        Self {
            price: PriceField {
                current: config.defaults.price,
                unit: PRICE_UNIT,
            },
            generation_mix: default_mix.clone(),
            resource_mix: default_mix,
            carbon_intensity: CarbonIntensityField {
                current: intensity,
                unit: CARBON_INTENSITY_UNIT,
            },
            system_load: None,
            timestamp: Utc::now(),
            api_info: ApiInfo::all_fallback(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn point(hour: u32, actual: f64) -> LoadPoint {
        LoadPoint {
            timestamp: FixedOffset::west_opt(5 * 3600)
                .unwrap()
                .with_ymd_and_hms(2025, 1, 15, hour, 0, 0)
                .unwrap(),
            actual_mw: actual,
            forecast_mw: actual + 100.0,
        }
    }

    #[test]
    fn test_fuel_category_serializes_snake_case() {
        let json = serde_json::to_string(&FuelCategory::NaturalGas).unwrap();
        assert_eq!(json, "\"natural_gas\"");

        let mut map = BTreeMap::new();
        map.insert(FuelCategory::Imports, 8.0);
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json["imports"], 8.0);
    }

    #[test]
    fn test_fuel_category_parses_config_keys() {
        assert_eq!("wind".parse::<FuelCategory>(), Ok(FuelCategory::Wind));
        assert!("renewables".parse::<FuelCategory>().is_err());

        let map: BTreeMap<FuelCategory, f64> =
            serde_json::from_str(r#"{"natural_gas": 400.0, "coal": 820.0}"#).unwrap();
        assert_eq!(map[&FuelCategory::Coal], 820.0);
    }

    #[test]
    fn test_default_mix_has_zero_megawatts() {
        let mut defaults = BTreeMap::new();
        defaults.insert(FuelCategory::NaturalGas, 60.0);
        defaults.insert(FuelCategory::Nuclear, 40.0);

        let mix = FuelMix::from_default(&defaults);
        assert_eq!(mix.percentages, defaults);
        assert_eq!(mix.megawatts.len(), 2);
        assert!(mix.megawatts.values().all(|v| *v == 0.0));
    }

    #[test]
    fn test_load_series_sorted_and_parallel() {
        let series =
            SystemLoadSeries::from_points(vec![point(3, 300.0), point(1, 100.0), point(2, 200.0)])
                .unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series.actual(), &[100.0, 200.0, 300.0]);
        assert_eq!(series.forecast(), &[200.0, 300.0, 400.0]);
        assert!(series.timestamps().windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_load_series_empty_is_none() {
        assert!(SystemLoadSeries::from_points(Vec::new()).is_none());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot = DashboardSnapshot::fallback(&GridConfig::default());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["price"]["unit"], "$/MWh");
        assert_eq!(json["carbonIntensity"]["unit"], "kg CO₂eq/MWh");
        assert!(json["generationMix"]["percentages"].is_object());
        assert!(json["resourceMix"]["megawatts"].is_object());
        assert!(json["systemLoad"].is_null());
        assert_eq!(json["api_info"]["price_data_source"], "fallback");
        assert_eq!(json["api_info"]["fuel_mix_source"], "fallback");
        assert_eq!(json["api_info"]["system_load_source"], "fallback");
    }
}
