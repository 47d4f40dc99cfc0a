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

use chrono::DateTime;
use serde_json::Value;
use tracing::{debug, warn};

use super::{at_path, entries, number};
use crate::types::{LoadPoint, SystemLoadSeries};

fn parse_entry(entry: &Value) -> Result<LoadPoint, String> {
    let begin = entry
        .get("BeginDate")
        .and_then(Value::as_str)
        .ok_or("missing BeginDate")?;
    let timestamp =
        DateTime::parse_from_rfc3339(begin).map_err(|e| format!("bad BeginDate '{begin}': {e}"))?;
    let actual_mw = entry
        .get("LoadMw")
        .and_then(number)
        .ok_or("missing or non-numeric LoadMw")?;
    let forecast_mw = entry
        .get("LoadMwForecasted")
        .and_then(number)
        .ok_or("missing or non-numeric LoadMwForecasted")?;

    Ok(LoadPoint {
        timestamp,
        actual_mw,
        forecast_mw,
    })
}

/// Actual vs forecast load series from a `fiveminutesystemload` payload
pub fn extract_system_load(payload: &Value) -> Option<SystemLoadSeries> {
    let list = entries(at_path(payload, &["SystemLoads", "SystemLoad"])?);

    let points: Vec<LoadPoint> = list
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| match parse_entry(entry) {
            Ok(point) => Some(point),
            Err(reason) => {
                warn!("Dropping system load entry {}: {}", index, reason);
                None
            }
        })
        .collect();

    let series = SystemLoadSeries::from_points(points);
    match &series {
        Some(s) => debug!("Extracted {} system load points", s.len()),
        None => debug!("No usable system load entries"),
    }
    series
}
