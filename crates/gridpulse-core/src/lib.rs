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

pub mod cache;
pub mod calc;
pub mod config;
pub mod extract;
pub mod service;
pub mod traits;
pub mod types;

pub use cache::{LastKnownGood, LastKnownGoodCache};
pub use calc::{carbon_intensity, derive_fuel_mix, round2};
pub use config::{DefaultsConfig, ExtractionConfig, GridConfig, UpstreamConfig};
pub use extract::{PriceReading, PriceShape, extract_fuel_mix, extract_price, extract_system_load};
pub use service::GridService;
pub use traits::{Endpoint, GridDataSource};
pub use types::{
    ApiInfo, DashboardSnapshot, FuelCategory, FuelMix, FuelMixes, LoadPoint, PRICE_UNIT,
    Provenance, Resolved, SystemLoadSeries,
};
