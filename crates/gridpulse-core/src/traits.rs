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

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// Upstream datasets the dashboard reads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Generation by fuel inside the control area
    GenerationMix,
    /// Delivered resource mix, may include imports
    ResourceMix,
    FiveMinuteLmp,
    /// Secondary price source
    HourlyLmp,
    SystemLoad,
}

impl Endpoint {
    /// Path relative to the API base URL
    pub fn path(self, location_id: u32) -> String {
        match self {
            Endpoint::GenerationMix => "/genfuelmix/current".to_owned(),
            Endpoint::ResourceMix => "/fuelmix/current".to_owned(),
            Endpoint::FiveMinuteLmp => format!("/fiveminutelmp/current/location/{location_id}"),
            Endpoint::HourlyLmp => format!("/hourlylmp/current/location/{location_id}"),
            Endpoint::SystemLoad => "/fiveminutesystemload".to_owned(),
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Endpoint::GenerationMix => "generation mix",
            Endpoint::ResourceMix => "resource mix",
            Endpoint::FiveMinuteLmp => "five-minute LMP",
            Endpoint::HourlyLmp => "hourly LMP",
            Endpoint::SystemLoad => "system load",
        };
        f.write_str(name)
    }
}

/// Source of raw grid payloads.
/// The service only sees decoded JSON, never transport details.
#[async_trait]
pub trait GridDataSource: Send + Sync {
    /// Fetch and decode one dataset
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value>;

    /// Check if the upstream is reachable and accepts our credentials
    async fn health_check(&self) -> Result<bool>;

    /// Get data source name for logging
    fn name(&self) -> &str;
}
