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

//! Derived metrics computed from normalized fuel data

use std::collections::BTreeMap;
use tracing::debug;

use crate::types::{FuelCategory, FuelMix};

/// Round half away from zero to two decimals
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Build a [`FuelMix`] from accumulated megawatts per category.
///
/// Only categories with positive generation survive. Megawatts are rounded first and
/// percentages are computed from the rounded values, so both maps always agree. When
/// nothing positive remains the configured default mix is returned unchanged.
pub fn derive_fuel_mix(
    megawatts: &BTreeMap<FuelCategory, f64>,
    default_mix: &BTreeMap<FuelCategory, f64>,
) -> FuelMix {
    let positive: BTreeMap<FuelCategory, f64> = megawatts
        .iter()
        .filter(|(_, mw)| **mw > 0.0)
        .map(|(fuel, mw)| (*fuel, round2(*mw)))
        .filter(|(_, mw)| *mw > 0.0)
        .collect();

    let total: f64 = positive.values().sum();
    if total <= 0.0 {
        debug!("Fuel mix total is zero, using default mix");
        return FuelMix::from_default(default_mix);
    }

    let percentages = positive
        .iter()
        .map(|(fuel, mw)| (*fuel, round2(mw / total * 100.0)))
        .collect();

    FuelMix {
        percentages,
        megawatts: positive,
    }
}

/// Weighted carbon intensity (kg CO2eq/MWh) of a percentage mix.
///
/// Fuels missing from `factors` contribute zero emissions. Returns 0 for an empty or
/// all-zero mix.
pub fn carbon_intensity(
    percentages: &BTreeMap<FuelCategory, f64>,
    factors: &BTreeMap<FuelCategory, f64>,
) -> f64 {
    let total_percentage: f64 = percentages.values().sum();
    if total_percentage <= 0.0 {
        return 0.0;
    }

    let total_emissions: f64 = percentages
        .iter()
        .map(|(fuel, pct)| {
            let factor = factors.get(fuel).copied().unwrap_or_else(|| {
                debug!("No emission factor for {fuel}, counting as zero");
                0.0
            });
            pct * factor
        })
        .sum();

    total_emissions / total_percentage
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{default_emission_factors, default_fuel_mix};

    fn mw(entries: &[(FuelCategory, f64)]) -> BTreeMap<FuelCategory, f64> {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(33.333_333), 33.33);
        assert_eq!(round2(66.666_666), 66.67);
        assert_eq!(round2(-12.504), -12.5);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn test_percentages_match_megawatts() {
        let input = mw(&[
            (FuelCategory::NaturalGas, 6123.456),
            (FuelCategory::Nuclear, 3345.0),
            (FuelCategory::Hydro, 812.25),
            (FuelCategory::Wind, 0.0),
            (FuelCategory::Solar, 1044.0),
        ]);

        let mix = derive_fuel_mix(&input, &default_fuel_mix());

        // zero-valued wind is dropped from both maps
        assert!(!mix.megawatts.contains_key(&FuelCategory::Wind));
        assert!(mix.percentages.keys().all(|k| mix.megawatts.contains_key(k)));

        let total: f64 = mix.megawatts.values().sum();
        for (fuel, pct) in &mix.percentages {
            let expected = round2(mix.megawatts[fuel] / total * 100.0);
            assert!((pct - expected).abs() < 1e-9, "{fuel}: {pct} vs {expected}");
        }
        assert_eq!(mix.megawatts[&FuelCategory::NaturalGas], 6123.46);

        let pct_sum: f64 = mix.percentages.values().sum();
        assert!((pct_sum - 100.0).abs() < 0.05);
    }

    #[test]
    fn test_zero_total_returns_default_mix() {
        let input = mw(&[(FuelCategory::Coal, 0.0), (FuelCategory::Oil, 0.0)]);
        let defaults = default_fuel_mix();

        let mix = derive_fuel_mix(&input, &defaults);
        assert_eq!(mix.percentages, defaults);
        assert!(mix.megawatts.values().all(|v| *v == 0.0));
    }

    #[test]
    fn test_empty_input_returns_default_mix() {
        let defaults = default_fuel_mix();
        let mix = derive_fuel_mix(&BTreeMap::new(), &defaults);
        assert_eq!(mix, FuelMix::from_default(&defaults));
    }

    #[test]
    fn test_negative_generation_ignored() {
        // pumped storage can report negative output while pumping
        let input = mw(&[(FuelCategory::Hydro, -150.0), (FuelCategory::Nuclear, 3000.0)]);
        let mix = derive_fuel_mix(&input, &default_fuel_mix());

        assert_eq!(mix.percentages.len(), 1);
        assert_eq!(mix.percentages[&FuelCategory::Nuclear], 100.0);
    }

    #[test]
    fn test_carbon_intensity_single_fuel() {
        let factors = default_emission_factors();
        let pct = mw(&[(FuelCategory::NaturalGas, 100.0)]);

        assert_eq!(
            carbon_intensity(&pct, &factors),
            factors[&FuelCategory::NaturalGas]
        );
    }

    #[test]
    fn test_carbon_intensity_weighted() {
        let factors = default_emission_factors();
        let pct = mw(&[(FuelCategory::Coal, 50.0), (FuelCategory::Wind, 50.0)]);

        let expected = (50.0 * 820.0 + 50.0 * 11.0) / 100.0;
        assert!((carbon_intensity(&pct, &factors) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_carbon_intensity_not_normalized_input() {
        // weights are relative, so a mix summing to 50 gives the same answer
        let factors = default_emission_factors();
        let pct = mw(&[(FuelCategory::Nuclear, 25.0), (FuelCategory::Oil, 25.0)]);

        let expected = (12.0 + 650.0) / 2.0;
        assert!((carbon_intensity(&pct, &factors) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_carbon_intensity_missing_factor_counts_zero() {
        let mut factors = default_emission_factors();
        factors.remove(&FuelCategory::Imports);
        let pct = mw(&[(FuelCategory::Imports, 50.0), (FuelCategory::Coal, 50.0)]);

        assert!((carbon_intensity(&pct, &factors) - 410.0).abs() < 1e-9);
    }

    #[test]
    fn test_carbon_intensity_empty_mix() {
        assert_eq!(
            carbon_intensity(&BTreeMap::new(), &default_emission_factors()),
            0.0
        );
    }
}
