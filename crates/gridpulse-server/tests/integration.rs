#![allow(clippy::float_cmp)]
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

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use serde_json::{Value, json};

use gridpulse_core::{Endpoint, GridConfig, GridDataSource, GridService, UpstreamConfig};
use gridpulse_isone::{IsoNeClient, IsoNeDataSource};
use gridpulse_server::routes::{self, AppState};

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

struct CannedSource {
    payloads: HashMap<Endpoint, Value>,
}

#[async_trait]
impl GridDataSource for CannedSource {
    async fn fetch(&self, endpoint: Endpoint) -> anyhow::Result<Value> {
        self.payloads
            .get(&endpoint)
            .cloned()
            .ok_or_else(|| anyhow!("upstream unavailable"))
    }

    async fn health_check(&self) -> anyhow::Result<bool> {
        Ok(!self.payloads.is_empty())
    }

    fn name(&self) -> &str {
        "canned"
    }
}

fn live_payloads() -> HashMap<Endpoint, Value> {
    HashMap::from([
        (
            Endpoint::GenerationMix,
            json!({"GenFuelMixes": {"GenFuelMix": [
                {"FuelCategory": "Natural Gas", "GenMw": 7500},
                {"FuelCategory": "Nuclear", "GenMw": 2500}
            ]}}),
        ),
        (
            Endpoint::ResourceMix,
            json!({"GenFuelMixes": {"GenFuelMix": [
                {"FuelCategory": "Natural Gas", "GenMw": 5000},
                {"FuelCategory": "Hydro", "GenMw": 2500},
                {"FuelCategory": "Imports", "GenMw": 2500}
            ]}}),
        ),
        (
            Endpoint::FiveMinuteLmp,
            json!({"FiveMinLmp": {"LmpTotal": -3.75}}),
        ),
        (
            Endpoint::SystemLoad,
            json!({"SystemLoads": {"SystemLoad": [
                {"BeginDate": "2025-01-15T10:05:00-05:00", "LoadMw": 14100, "LoadMwForecasted": 14150},
                {"BeginDate": "2025-01-15T10:00:00-05:00", "LoadMw": 14000, "LoadMwForecasted": 14120}
            ]}}),
        ),
    ])
}

struct TestServer {
    port: u16,
    client: reqwest::Client,
}

impl TestServer {
    async fn start(source: Arc<dyn GridDataSource>, static_dir: &Path) -> Self {
        let service = GridService::new(source, GridConfig::default());
        let app = routes::router(AppState { service }, static_dir);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let port = listener.local_addr().expect("No local addr").port();

        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Test server error");
        });

        Self {
            port,
            client: reqwest::Client::new(),
        }
    }

    async fn with_payloads(payloads: HashMap<Endpoint, Value>) -> Self {
        Self::start(
            Arc::new(CannedSource { payloads }),
            Path::new("./does-not-exist"),
        )
        .await
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{path}", self.port)
    }

    async fn get_json(&self, path: &str) -> Value {
        let response = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Request failed");
        assert_eq!(response.status(), 200, "GET {path}");
        response.json().await.expect("Body is not JSON")
    }
}

// ---------------------------------------------------------------------------
// Live data
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_dashboard_data_live() {
    let server = TestServer::with_payloads(live_payloads()).await;
    let body = server.get_json("/api/dashboard-data").await;

    assert_eq!(body["price"]["current"], -3.75);
    assert_eq!(body["price"]["unit"], "$/MWh");
    assert_eq!(body["generationMix"]["percentages"]["natural_gas"], 75.0);
    assert_eq!(body["generationMix"]["megawatts"]["nuclear"], 2500.0);
    assert_eq!(body["resourceMix"]["percentages"]["imports"], 25.0);
    assert_eq!(body["carbonIntensity"]["unit"], "kg CO₂eq/MWh");

    let expected_carbon = (50.0 * 400.0 + 25.0 * 24.0 + 25.0 * 350.0) / 100.0;
    let carbon = body["carbonIntensity"]["current"].as_f64().unwrap();
    assert!((carbon - expected_carbon).abs() < 1e-9);

    // sorted ascending regardless of upstream order
    assert_eq!(body["systemLoad"]["actual"], json!([14000.0, 14100.0]));
    assert_eq!(body["systemLoad"]["timestamps"].as_array().unwrap().len(), 2);

    assert_eq!(body["api_info"]["price_data_source"], "api");
    assert_eq!(body["api_info"]["fuel_mix_source"], "api");
    assert_eq!(body["api_info"]["system_load_source"], "api");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_fuel_mix_endpoint() {
    let server = TestServer::with_payloads(live_payloads()).await;
    let body = server.get_json("/api/fuel-mix").await;

    assert_eq!(body["generationMix"]["percentages"]["nuclear"], 25.0);
    assert_eq!(body["resourceMix"]["megawatts"]["hydro"], 2500.0);
}

#[tokio::test]
async fn test_price_endpoint() {
    let server = TestServer::with_payloads(live_payloads()).await;
    let body = server.get_json("/api/price").await;

    assert_eq!(body, json!({"price": -3.75, "unit": "$/MWh"}));
}

// ---------------------------------------------------------------------------
// Fallbacks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_dashboard_data_upstream_down() {
    let server = TestServer::with_payloads(HashMap::new()).await;
    let body = server.get_json("/api/dashboard-data").await;

    assert_eq!(body["price"]["current"], 55.0);
    assert_eq!(body["generationMix"]["percentages"]["natural_gas"], 35.0);
    assert_eq!(body["generationMix"]["megawatts"]["natural_gas"], 0.0);
    assert_eq!(body["resourceMix"]["percentages"]["imports"], 8.0);
    assert!(body["systemLoad"].is_null());
    assert_eq!(body["api_info"]["price_data_source"], "fallback");
    assert_eq!(body["api_info"]["fuel_mix_source"], "fallback");
    assert_eq!(body["api_info"]["system_load_source"], "fallback");
}

#[tokio::test]
async fn test_upstream_503_through_real_client() {
    let mut upstream = mockito::Server::new_async().await;
    let mock = upstream
        .mock("GET", mockito::Matcher::Any)
        .with_status(503)
        .expect_at_least(4)
        .create_async()
        .await;

    let config = UpstreamConfig {
        base_url: upstream.url(),
        username: "iso".to_owned(),
        password: "secret".to_owned(),
        max_retries: 1,
        ..Default::default()
    };
    let client = IsoNeClient::new(&config)
        .unwrap()
        .with_retry_config(1, Duration::from_millis(1));
    let source = Arc::new(IsoNeDataSource::new(Arc::new(client)));
    let server = TestServer::start(source, Path::new("./does-not-exist")).await;

    let body = server.get_json("/api/dashboard-data").await;

    assert_eq!(body["price"]["current"], 55.0);
    assert_eq!(body["api_info"]["fuel_mix_source"], "fallback");
    assert_eq!(body["api_info"]["price_data_source"], "fallback");
    mock.assert_async().await;
}

// ---------------------------------------------------------------------------
// Connection test, health, static assets
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_connection_success() {
    let server = TestServer::with_payloads(live_payloads()).await;
    let body = server.get_json("/api/test-connection").await;

    assert_eq!(body["status"], "success");
    assert!(body["message"].as_str().unwrap().contains("canned"));
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_connection_failure() {
    let server = TestServer::with_payloads(HashMap::new()).await;
    let body = server.get_json("/api/test-connection").await;

    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn test_health() {
    let server = TestServer::with_payloads(HashMap::new()).await;
    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_static_assets_served() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("script.js"), "console.log('grid');").unwrap();

    let source = Arc::new(CannedSource {
        payloads: HashMap::new(),
    });
    let server = TestServer::start(source, dir.path()).await;

    let response = server
        .client
        .get(server.url("/script.js"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "console.log('grid');");

    let missing = server
        .client
        .get(server.url("/nope.css"))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), 404);
}

#[tokio::test]
async fn test_cors_headers_present() {
    let server = TestServer::with_payloads(live_payloads()).await;
    let response = server
        .client
        .get(server.url("/api/price"))
        .header("Origin", "http://dashboard.example")
        .send()
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get("access-control-allow-origin")
            .unwrap(),
        "*"
    );
}
