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

use crate::errors::{IsoNeError, IsoNeResult};
use gridpulse_core::{Endpoint, UpstreamConfig};
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::{debug, error, trace, warn};

/// ISO New England web services client
#[derive(Clone)]
pub struct IsoNeClient {
    /// Connection and retry settings, base URL without a trailing slash
    upstream: UpstreamConfig,
    client: Client,
}

impl fmt::Debug for IsoNeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IsoNeClient")
            .field("base_url", &self.upstream.base_url)
            .field("username", &self.upstream.username)
            .field("location_id", &self.upstream.location_id)
            .field("max_retries", &self.upstream.max_retries)
            .field("backoff_factor", &self.upstream.backoff_factor)
            .finish_non_exhaustive()
    }
}

impl IsoNeClient {
    /// Create a client from upstream settings
    pub fn new(config: &UpstreamConfig) -> IsoNeResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| IsoNeError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        let upstream = UpstreamConfig {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            ..config.clone()
        };

        Ok(Self { upstream, client })
    }

    pub fn base_url(&self) -> &str {
        &self.upstream.base_url
    }

    /// Fetch one dataset as decoded JSON
    pub async fn fetch(&self, endpoint: Endpoint) -> IsoNeResult<Value> {
        self.get_json(&endpoint.path(self.upstream.location_id)).await
    }

    /// GET a path relative to the base URL and decode the body
    pub async fn get_json(&self, path: &str) -> IsoNeResult<Value> {
        let url = format!("{}{}", self.upstream.base_url, path);
        debug!("🔍 [ISO-NE] GET {}", url);

        let response = self.retry_request(&url).await?;

        match response.status() {
            StatusCode::OK => {
                let body = response.text().await?;
                trace!("   Body: {}", body);
                serde_json::from_str(&body).map_err(|e| {
                    error!("❌ [ISO-NE] Non-JSON body from {}: {}", path, e);
                    IsoNeError::InvalidResponse(format!("{path}: {e}"))
                })
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [ISO-NE] Authentication failed for {}", path);
                Err(IsoNeError::AuthenticationFailed)
            }
            status => {
                let error_text = response.text().await.unwrap_or_default();
                error!("❌ [ISO-NE] Status {} for {}: {}", status, path, error_text);
                Err(IsoNeError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                })
            }
        }
    }

    /// Health check: one unretried request against the generation mix endpoint
    pub async fn ping(&self) -> IsoNeResult<bool> {
        let url = format!(
            "{}{}",
            self.upstream.base_url,
            Endpoint::GenerationMix.path(self.upstream.location_id)
        );
        debug!("Performing health check");

        match self.send(&url).await {
            Ok(response) => {
                let is_ok = response.status().is_success();
                if is_ok {
                    debug!("Health check passed");
                } else {
                    warn!("Health check failed: status {}", response.status());
                }
                Ok(is_ok)
            }
            Err(e) => {
                warn!("Health check failed: {}", e);
                Ok(false)
            }
        }
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .get(url)
            .basic_auth(&self.upstream.username, Some(&self.upstream.password))
            .header(ACCEPT, "application/json")
            .send()
            .await
    }

    /// Send with bounded retries and exponential backoff.
    ///
    /// Transport failures and configured statuses are retried, waiting
    /// `backoff_factor * 2^n` before retry n. Any other response is returned for the
    /// caller to interpret.
    async fn retry_request(&self, url: &str) -> IsoNeResult<reqwest::Response> {
        let attempts = self.upstream.max_retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.send(url).await {
                Ok(response) if self.upstream.is_retryable_status(response.status().as_u16()) => {
                    last_error = format!("HTTP {}", response.status());
                }
                Ok(response) => return Ok(response),
                Err(e) if e.is_connect() || e.is_timeout() || e.is_request() => {
                    last_error = e.to_string();
                }
                Err(e) => return Err(IsoNeError::HttpError(e)),
            }

            if attempt < attempts {
                let delay = self.upstream.backoff_delay(attempt - 1);
                warn!(
                    "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                    attempt, attempts, last_error, delay
                );
                tokio::time::sleep(delay).await;
            }
        }

        error!("Request failed after {} attempts: {}", attempts, last_error);
        Err(IsoNeError::RetriesExhausted {
            attempts,
            last_error,
        })
    }

    /// Set custom retry configuration; `retry_delay` is the wait before the first retry
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.upstream.max_retries = max_retries;
        self.upstream.backoff_factor = retry_delay.as_secs_f64();
        self
    }
}
