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

//! HTTP routes. Handlers only call into [`GridService`] and serialize the result.

use std::path::Path;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

use gridpulse_core::{DashboardSnapshot, FuelMixes, GridService, PRICE_UNIT};

#[derive(Debug, Clone)]
pub struct AppState {
    pub service: GridService,
}

#[derive(Debug, Serialize)]
pub struct PriceResponse {
    pub price: f64,
    pub unit: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Success,
    Error,
}

#[derive(Debug, Serialize)]
pub struct ConnectionReport {
    pub status: ConnectionStatus,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// API routes plus the static dashboard assets as fallback
pub fn router(state: AppState, static_dir: &Path) -> Router {
    Router::new()
        .route("/api/fuel-mix", get(fuel_mix_handler))
        .route("/api/price", get(price_handler))
        .route("/api/dashboard-data", get(dashboard_handler))
        .route("/api/test-connection", get(test_connection_handler))
        .route("/health", get(health_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn fuel_mix_handler(State(state): State<AppState>) -> Json<FuelMixes> {
    Json(state.service.get_fuel_mix().await)
}

pub async fn price_handler(State(state): State<AppState>) -> Json<PriceResponse> {
    let price = state.service.get_price().await;
    Json(PriceResponse {
        price,
        unit: PRICE_UNIT,
    })
}

pub async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardSnapshot> {
    Json(state.service.get_dashboard_data().await)
}

pub async fn test_connection_handler(State(state): State<AppState>) -> Json<ConnectionReport> {
    let source = state.service.source_name().to_owned();

    let (status, message) = match state.service.check_connection().await {
        Ok(true) => {
            info!("Connection test to {} passed", source);
            (
                ConnectionStatus::Success,
                format!("Successfully connected to {source} API"),
            )
        }
        Ok(false) => {
            warn!("Connection test to {} failed", source);
            (
                ConnectionStatus::Error,
                format!("Failed to connect to {source} API: request was not accepted"),
            )
        }
        Err(e) => {
            warn!("Connection test to {} failed: {:#}", source, e);
            (
                ConnectionStatus::Error,
                format!("Failed to connect to {source} API: {e:#}"),
            )
        }
    };

    Json(ConnectionReport {
        status,
        message,
        timestamp: Utc::now(),
    })
}

#[expect(clippy::unused_async, reason = "axum handler must be async")]
pub async fn health_handler() -> &'static str {
    "ok"
}
