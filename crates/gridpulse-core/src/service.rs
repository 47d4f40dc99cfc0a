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

//! Dashboard aggregator.
//!
//! Every public operation is total: upstream failures, unknown payload shapes and bad
//! values all resolve through live data, then the last-known-good value, then the
//! configured default. Nothing here returns an error to the caller.

use anyhow::Result;
use chrono::Utc;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::cache::{LastKnownGood, LastKnownGoodCache};
use crate::calc::{carbon_intensity, derive_fuel_mix};
use crate::config::GridConfig;
use crate::extract::{extract_fuel_mix, extract_price, extract_system_load};
use crate::traits::{Endpoint, GridDataSource};
use crate::types::{
    ApiInfo, CARBON_INTENSITY_UNIT, CarbonIntensityField, DashboardSnapshot, FuelMix, FuelMixes,
    PRICE_UNIT, PriceField, Provenance, Resolved, SystemLoadSeries,
};

/// Price endpoints in the order they are tried
const PRICE_ENDPOINTS: [Endpoint; 2] = [Endpoint::FiveMinuteLmp, Endpoint::HourlyLmp];

#[derive(Clone)]
pub struct GridService {
    source: Arc<dyn GridDataSource>,
    config: Arc<GridConfig>,
    cache: Arc<LastKnownGoodCache>,
}

impl fmt::Debug for GridService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridService")
            .field("source", &self.source.name())
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl GridService {
    /// Create a service with an empty last-known-good cache
    pub fn new(source: Arc<dyn GridDataSource>, config: GridConfig) -> Self {
        Self::with_cache(source, config, Arc::new(LastKnownGoodCache::new()))
    }

    pub fn with_cache(
        source: Arc<dyn GridDataSource>,
        config: GridConfig,
        cache: Arc<LastKnownGoodCache>,
    ) -> Self {
        Self {
            source,
            config: Arc::new(config),
            cache,
        }
    }

    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Probe the upstream without touching any cached value
    pub async fn check_connection(&self) -> Result<bool> {
        self.source.health_check().await
    }

    /// Generation and resource mixes, fetched concurrently
    pub async fn get_fuel_mix(&self) -> FuelMixes {
        self.isolated(
            "Fuel mix lookup",
            |service| async move {
                let (generation, resource) = tokio::join!(
                    service.resolve_mix(Endpoint::GenerationMix, &service.cache.generation_mix),
                    service.resolve_mix(Endpoint::ResourceMix, &service.cache.resource_mix),
                );
                FuelMixes {
                    generation_mix: generation.value,
                    resource_mix: resource.value,
                }
            },
            Self::fallback_mixes,
        )
        .await
    }

    /// Current LMP in $/MWh
    pub async fn get_price(&self) -> f64 {
        self.isolated(
            "Price lookup",
            |service| async move { service.resolve_price().await.value },
            Self::fallback_price,
        )
        .await
    }

    pub async fn get_system_load(&self) -> Option<SystemLoadSeries> {
        self.isolated(
            "System load lookup",
            |service| async move { service.resolve_system_load().await.value },
            |_| None,
        )
        .await
    }

    /// Full dashboard snapshot.
    ///
    /// If assembly panics the snapshot is rebuilt from configured defaults with every
    /// provenance tag set to fallback.
    pub async fn get_dashboard_data(&self) -> DashboardSnapshot {
        self.isolated(
            "Dashboard assembly",
            |service| async move { service.assemble_snapshot().await },
            |service| DashboardSnapshot::fallback(&service.config),
        )
        .await
    }

    /// Run `op` on its own task; a panic inside it is logged and replaced by `recover`
    async fn isolated<T, F, Fut>(&self, what: &str, op: F, recover: impl FnOnce(&Self) -> T) -> T
    where
        T: Send + 'static,
        F: FnOnce(Self) -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        match tokio::spawn(op(self.clone())).await {
            Ok(value) => value,
            Err(e) => {
                error!("{} failed, serving fallback: {}", what, e);
                recover(self)
            }
        }
    }

    fn fallback_price(&self) -> f64 {
        self.cache.price.get().unwrap_or(self.config.defaults.price)
    }

    fn fallback_mixes(&self) -> FuelMixes {
        let default_mix = || FuelMix::from_default(&self.config.defaults.fuel_mix);
        FuelMixes {
            generation_mix: self.cache.generation_mix.get().unwrap_or_else(default_mix),
            resource_mix: self.cache.resource_mix.get().unwrap_or_else(default_mix),
        }
    }

    async fn assemble_snapshot(&self) -> DashboardSnapshot {
        let (generation, resource, price, system_load) = tokio::join!(
            self.resolve_mix(Endpoint::GenerationMix, &self.cache.generation_mix),
            self.resolve_mix(Endpoint::ResourceMix, &self.cache.resource_mix),
            self.resolve_price(),
            self.resolve_system_load(),
        );

        let intensity = carbon_intensity(&resource.value.percentages, &self.config.emission_factors);

        let fuel_mix_source = if generation.is_live() && resource.is_live() {
            Provenance::Api
        } else {
            Provenance::Fallback
        };

        let api_info = ApiInfo {
            price_data_source: price.source,
            fuel_mix_source,
            system_load_source: system_load.source,
        };

        info!(
            "Dashboard snapshot: price {:.2} $/MWh ({}), carbon {:.1} kg/MWh, fuel mix {}, load {}",
            price.value, price.source, intensity, fuel_mix_source, system_load.source
        );

        DashboardSnapshot {
            price: PriceField {
                current: price.value,
                unit: PRICE_UNIT,
            },
            generation_mix: generation.value,
            resource_mix: resource.value,
            carbon_intensity: CarbonIntensityField {
                current: intensity,
                unit: CARBON_INTENSITY_UNIT,
            },
            system_load: system_load.value,
            timestamp: Utc::now(),
            api_info,
        }
    }

    /// Upstream payload, or `None` on any fetch failure
    async fn fetch_payload(&self, endpoint: Endpoint) -> Option<Value> {
        match self.source.fetch(endpoint).await {
            Ok(payload) => Some(payload),
            Err(e) => {
                error!(
                    "Failed to fetch {} from {}: {:#}",
                    endpoint,
                    self.source.name(),
                    e
                );
                None
            }
        }
    }

    async fn live_mix(&self, endpoint: Endpoint) -> Option<FuelMix> {
        let payload = self.fetch_payload(endpoint).await?;
        let megawatts = extract_fuel_mix(&payload, self.config.extraction.min_total_mw)?;
        let mix = derive_fuel_mix(&megawatts, &self.config.defaults.fuel_mix);

        // A mix with no positive generation is the default mix, not live data
        (mix.total_megawatts() > 0.0).then_some(mix)
    }

    async fn resolve_mix(
        &self,
        endpoint: Endpoint,
        last_known: &LastKnownGood<FuelMix>,
    ) -> Resolved<FuelMix> {
        if let Some(mix) = self.live_mix(endpoint).await {
            info!(
                "Live {}: {:.2} MW across {} fuels",
                endpoint,
                mix.total_megawatts(),
                mix.megawatts.len()
            );
            last_known.set(mix.clone());
            return Resolved::live(mix);
        }

        if let Some(mix) = last_known.get() {
            warn!("Using last known good {}", endpoint);
            return Resolved::fallback(mix);
        }

        warn!("No {} available, using default mix", endpoint);
        Resolved::fallback(FuelMix::from_default(&self.config.defaults.fuel_mix))
    }

    async fn resolve_price(&self) -> Resolved<f64> {
        for endpoint in PRICE_ENDPOINTS {
            let Some(payload) = self.fetch_payload(endpoint).await else {
                continue;
            };
            if let Some(reading) = extract_price(&payload) {
                info!(
                    "Live price {:.2} $/MWh from {} ({})",
                    reading.value, endpoint, reading.shape
                );
                self.cache.price.set(reading.value);
                return Resolved::live(reading.value);
            }
            debug!("No price in {} payload", endpoint);
        }

        if let Some(price) = self.cache.price.get() {
            warn!("Using last known good price: {:.2} $/MWh", price);
            return Resolved::fallback(price);
        }

        warn!(
            "No price available, using default: {:.2} $/MWh",
            self.config.defaults.price
        );
        Resolved::fallback(self.config.defaults.price)
    }

    async fn resolve_system_load(&self) -> Resolved<Option<SystemLoadSeries>> {
        let series = self
            .fetch_payload(Endpoint::SystemLoad)
            .await
            .and_then(|payload| extract_system_load(&payload));

        match series {
            Some(series) => Resolved::live(Some(series)),
            None => {
                warn!("No system load available");
                Resolved::fallback(None)
            }
        }
    }
}
