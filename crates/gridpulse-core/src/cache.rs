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

use parking_lot::Mutex;

use crate::types::FuelMix;

/// Most recent live value of one metric.
///
/// Starts empty and only ever holds values extracted from a live response.
/// Concurrent writers are last-write-wins.
#[derive(Debug)]
pub struct LastKnownGood<T> {
    value: Mutex<Option<T>>,
}

impl<T: Clone> LastKnownGood<T> {
    pub fn new() -> Self {
        Self {
            value: Mutex::new(None),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.value.lock().clone()
    }

    pub fn set(&self, value: T) {
        *self.value.lock() = Some(value);
    }
}

impl<T: Clone> Default for LastKnownGood<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-metric last-known-good values owned by one service instance
#[derive(Debug, Default)]
pub struct LastKnownGoodCache {
    pub price: LastKnownGood<f64>,
    pub generation_mix: LastKnownGood<FuelMix>,
    pub resource_mix: LastKnownGood<FuelMix>,
}

impl LastKnownGoodCache {
    pub fn new() -> Self {
        Self::default()
    }
}
