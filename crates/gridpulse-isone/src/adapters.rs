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

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::client::IsoNeClient;
use gridpulse_core::{Endpoint, GridDataSource};

/// ISO-NE web services as a [`GridDataSource`]
#[derive(Debug, Clone)]
pub struct IsoNeDataSource {
    client: Arc<IsoNeClient>,
}

impl IsoNeDataSource {
    pub fn new(client: Arc<IsoNeClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl GridDataSource for IsoNeDataSource {
    async fn fetch(&self, endpoint: Endpoint) -> Result<Value> {
        debug!("📡 [ADAPTER] Fetching {}", endpoint);

        match self.client.fetch(endpoint).await {
            Ok(payload) => Ok(payload),
            Err(e) => {
                if e.is_transient() {
                    warn!("⚠️ [ADAPTER] ISO-NE unavailable for {}: {}", endpoint, e);
                }
                Err(e).with_context(|| format!("Failed to fetch {endpoint} from ISO-NE"))
            }
        }
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.client.ping().await?)
    }

    fn name(&self) -> &str {
        "ISO-NE"
    }
}
