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

use anyhow::{Result, bail};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

use crate::types::FuelCategory;

/// Everything the normalization layer needs: upstream access, defaults and factors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default)]
    pub upstream: UpstreamConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Emission intensity per fuel (kg CO2eq/MWh). Entries override the built-in table
    #[serde(
        default = "default_emission_factors",
        deserialize_with = "merge_emission_factors"
    )]
    pub emission_factors: BTreeMap<FuelCategory, f64>,

    #[serde(default)]
    pub extraction: ExtractionConfig,
}

/// ISO-NE web services connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub password: String,

    /// Pricing node queried for LMP (4000 = internal hub)
    #[serde(default = "default_location_id")]
    pub location_id: u32,

    /// Retries after the first attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before retry n is `backoff_factor * 2^n` seconds
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    #[serde(default = "default_retry_status_codes")]
    pub retry_status_codes: Vec<u16>,

    /// Per-attempt timeout
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

/// Static values served when neither live nor last-known-good data exist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// $/MWh
    #[serde(default = "default_price")]
    pub price: f64,

    /// Percentages per fuel. Entries override the built-in mix
    #[serde(default = "default_fuel_mix", deserialize_with = "merge_fuel_mix")]
    pub fuel_mix: BTreeMap<FuelCategory, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Fuel mixes totalling fewer megawatts than this are rejected as bogus
    #[serde(default = "default_min_total_mw")]
    pub min_total_mw: f64,
}

fn default_base_url() -> String {
    "https://webservices.iso-ne.com/api/v1.1".to_owned()
}

fn default_location_id() -> u32 {
    4000
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_factor() -> f64 {
    0.5
}

fn default_retry_status_codes() -> Vec<u16> {
    vec![500, 502, 503, 504]
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_price() -> f64 {
    55.0
}

fn default_min_total_mw() -> f64 {
    10.0
}

pub fn default_fuel_mix() -> BTreeMap<FuelCategory, f64> {
    BTreeMap::from([
        (FuelCategory::NaturalGas, 35.0),
        (FuelCategory::Nuclear, 25.0),
        (FuelCategory::Hydro, 8.0),
        (FuelCategory::Solar, 5.0),
        (FuelCategory::Wind, 5.0),
        (FuelCategory::Coal, 5.0),
        (FuelCategory::Oil, 2.0),
        (FuelCategory::Biomass, 5.0),
        (FuelCategory::Imports, 8.0),
        (FuelCategory::Other, 2.0),
    ])
}

pub fn default_emission_factors() -> BTreeMap<FuelCategory, f64> {
    BTreeMap::from([
        (FuelCategory::NaturalGas, 400.0),
        (FuelCategory::Nuclear, 12.0),
        (FuelCategory::Hydro, 24.0),
        (FuelCategory::Solar, 45.0),
        (FuelCategory::Wind, 11.0),
        (FuelCategory::Coal, 820.0),
        (FuelCategory::Oil, 650.0),
        // Wood, refuse and landfill gas averaged
        (FuelCategory::Biomass, 230.0),
        // Regional average of neighbouring areas
        (FuelCategory::Imports, 350.0),
        (FuelCategory::Other, 400.0),
    ])
}

fn merge_emission_factors<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<FuelCategory, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut factors = default_emission_factors();
    factors.extend(BTreeMap::<FuelCategory, f64>::deserialize(deserializer)?);
    Ok(factors)
}

fn merge_fuel_mix<'de, D>(
    deserializer: D,
) -> std::result::Result<BTreeMap<FuelCategory, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut mix = default_fuel_mix();
    mix.extend(BTreeMap::<FuelCategory, f64>::deserialize(deserializer)?);
    Ok(mix)
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            upstream: UpstreamConfig::default(),
            defaults: DefaultsConfig::default(),
            emission_factors: default_emission_factors(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            username: String::new(),
            password: String::new(),
            location_id: default_location_id(),
            max_retries: default_max_retries(),
            backoff_factor: default_backoff_factor(),
            retry_status_codes: default_retry_status_codes(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            price: default_price(),
            fuel_mix: default_fuel_mix(),
        }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_total_mw: default_min_total_mw(),
        }
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Sleep before the retry with the given 0-based index, saturating at [`Duration::MAX`]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let secs = self.backoff_factor * 2_f64.powi(i32::try_from(retry).unwrap_or(i32::MAX));
        if secs.is_nan() || secs <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }

    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }
}

impl GridConfig {
    pub fn validate(&self) -> Result<()> {
        let upstream = &self.upstream;

        if upstream.base_url.trim().is_empty() {
            bail!("upstream.base_url cannot be empty");
        }
        if !upstream.backoff_factor.is_finite() || upstream.backoff_factor < 0.0 {
            bail!("upstream.backoff_factor must be a non-negative number");
        }
        if upstream.request_timeout_ms == 0 {
            bail!("upstream.request_timeout_ms must be positive");
        }
        if let Some(code) = upstream
            .retry_status_codes
            .iter()
            .find(|c| !(100..=599).contains(*c))
        {
            bail!("upstream.retry_status_codes contains invalid HTTP status {code}");
        }
        if upstream.username.is_empty() || upstream.password.is_empty() {
            warn!("ISO-NE credentials are not configured, live requests will be rejected");
        }

        if !self.defaults.price.is_finite() {
            bail!("defaults.price must be a finite number");
        }
        if self.defaults.fuel_mix.is_empty() {
            bail!("defaults.fuel_mix must contain at least one fuel");
        }
        if let Some((fuel, value)) = self
            .defaults
            .fuel_mix
            .iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            bail!("defaults.fuel_mix.{fuel} must be non-negative, got {value}");
        }
        let mix_total: f64 = self.defaults.fuel_mix.values().sum();
        if (mix_total - 100.0).abs() > 0.5 {
            warn!("defaults.fuel_mix adds up to {mix_total:.1}%, not 100%");
        }

        if let Some((fuel, value)) = self
            .emission_factors
            .iter()
            .find(|(_, v)| !v.is_finite() || **v < 0.0)
        {
            bail!("emission_factors.{fuel} must be non-negative, got {value}");
        }
        for fuel in FuelCategory::ALL {
            if !self.emission_factors.contains_key(&fuel) {
                warn!("No emission factor for {fuel}, it will count as zero-carbon");
            }
        }

        if !self.extraction.min_total_mw.is_finite() || self.extraction.min_total_mw < 0.0 {
            bail!("extraction.min_total_mw must be non-negative");
        }

        Ok(())
    }
}
