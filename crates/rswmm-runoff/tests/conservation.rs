//! Conservation tests for the runoff kernel.
//!
//! These tests verify that water and pollutant mass are accounted for:
//! - Rainfall equals losses plus outflow plus the change in surface storage
//! - Pollutant buildup equals the mass swept, washed off and left on the land

mod common;

use approx::assert_relative_eq;
use common::{Environment, IN_PER_HR};
use rswmm_core::ledger::LoadCategory;
use rswmm_runoff::collaborators::NoLid;
use rswmm_runoff::landuse::StandardLanduse;
use rswmm_runoff::Catchment;

/// One acre, half impervious, with no routing delay or depression storage.
const UNROUTED_ACRE: &str = r#"
    nodes = ["J1"]
    gages = ["RG1"]

    [[subcatchments]]
    name = "S1"
    gage = "RG1"
    outlet_node = "J1"
    area = 43560.0
    percent_impervious = 50.0
    width = 100.0
    percent_slope = 1.0

    [subcatchments.subareas]
    percent_zero_storage = 25.0
"#;

const ROUTED_ACRE: &str = r#"
    nodes = ["J1"]
    gages = ["RG1"]

    [[subcatchments]]
    name = "S1"
    gage = "RG1"
    outlet_node = "J1"
    area = 43560.0
    percent_impervious = 50.0
    width = 100.0
    percent_slope = 1.0

    [subcatchments.subareas]
    n_impervious = 0.015
    n_pervious = 0.1
    storage_impervious = 0.004166667
    storage_pervious = 0.008333333
    percent_zero_storage = 25.0
"#;

mod water_conservation {
    use super::*;

    /// One hour of 1 in/hr rain followed by a dry step.
    ///
    /// Without routing the impervious half drains within each step and the
    /// pervious half infiltrates everything it receives.
    #[test]
    fn test_unrouted_acre_volumes() {
        let mut catchment = Catchment::from_toml_str(UNROUTED_ACRE).unwrap();
        let landuse = StandardLanduse::default();
        catchment.init_state(0.0, &landuse);
        let mut env = Environment::new(&catchment, 1.0);

        for _ in 0..12 {
            env.step(&mut catchment, &landuse, IN_PER_HR, 300.0);
        }
        let peak = catchment.subcatchments[0].new.runoff;
        env.step(&mut catchment, &landuse, 0.0, 300.0);

        let totals = env.ledger.runoff_totals();
        assert_relative_eq!(totals.rainfall, 3630.0, max_relative = 1e-9);
        assert_relative_eq!(totals.infiltration, 1815.0, max_relative = 1e-9);
        assert_relative_eq!(totals.runoff, 1815.0, max_relative = 1e-9);
        assert_eq!(totals.evaporation, 0.0);

        assert_relative_eq!(peak, IN_PER_HR * 21780.0, max_relative = 1e-9);
        assert_eq!(catchment.subcatchments[0].new.runoff, 0.0);
        assert_eq!(catchment.storage_volume(&NoLid), 0.0);
        assert!(env.ledger.runoff_continuity_error(0.0, 0.0).abs() < 1e-9);

        let stats = env.statistics.subcatchment(0).unwrap();
        assert_relative_eq!(stats.precipitation, 3630.0, max_relative = 1e-9);
        assert_relative_eq!(stats.peak_flow, peak, max_relative = 1e-9);
    }

    /// A storm on a routed subcatchment drained for six hours.
    #[test]
    fn test_routed_acre_continuity() {
        let mut catchment = Catchment::from_toml_str(ROUTED_ACRE).unwrap();
        let landuse = StandardLanduse::default();
        catchment.init_state(0.0, &landuse);
        let mut env = Environment::new(&catchment, 0.5 * IN_PER_HR);

        for _ in 0..60 {
            env.step(&mut catchment, &landuse, 2.0 * IN_PER_HR, 60.0);
        }
        let mut previous = catchment.subcatchments[0].new.runoff;
        for _ in 0..360 {
            env.step(&mut catchment, &landuse, 0.0, 60.0);
            let runoff = catchment.subcatchments[0].new.runoff;
            assert!(runoff <= previous + 1e-12, "recession must not rise");
            previous = runoff;
        }

        let totals = env.ledger.runoff_totals();
        assert_relative_eq!(totals.rainfall, 7260.0, max_relative = 1e-9);
        assert!(totals.runoff > 0.0);
        assert!(totals.infiltration > 0.0);

        let storage = catchment.storage_volume(&NoLid);
        assert!(storage > 0.0, "depression storage stays filled");
        let error = env.ledger.runoff_continuity_error(0.0, storage);
        assert!(error.abs() < 0.01, "continuity error {error}");
    }

    #[test]
    fn test_subareas_never_hold_negative_depth() {
        let mut catchment = Catchment::from_toml_str(ROUTED_ACRE).unwrap();
        let landuse = StandardLanduse::default();
        catchment.init_state(0.0, &landuse);
        let mut env = Environment::new(&catchment, 5.0 * IN_PER_HR);
        env.evaporation.rate = 0.2 * IN_PER_HR;

        for step in 0..120 {
            let rain = if step % 20 < 5 { 3.0 * IN_PER_HR } else { 0.0 };
            env.step(&mut catchment, &landuse, rain, 60.0);
            for sa in catchment.subcatchments[0].subareas.iter() {
                assert!(sa.depth >= 0.0);
                assert!(sa.runoff >= 0.0);
            }
        }
    }
}

mod pollutant_conservation {
    use super::*;
    use rswmm_runoff::parameters::CatchmentParameters;

    fn with_quality(landuse_toml: &str) -> (Catchment, StandardLanduse) {
        let (subcatchment, subareas) = ROUTED_ACRE
            .split_once("[subcatchments.subareas]")
            .unwrap();
        let source = format!(
            r#"{subcatchment}
            landuses = [{{ landuse = "Residential", percent = 100.0 }}]
            initial_buildup = [{{ pollutant = "TSS", load = 10.0 }}]

            [subcatchments.subareas]
            {subareas}

            [[pollutants]]
            name = "TSS"

            {landuse_toml}
            "#
        );
        let parameters = CatchmentParameters::from_toml_str(&source).unwrap();
        let landuse =
            StandardLanduse::from_parameters(&parameters.quality, parameters.settings.units)
                .unwrap();
        let mut catchment = Catchment::from_parameters(&parameters).unwrap();
        catchment.init_state(0.0, &landuse);
        (catchment, landuse)
    }

    #[test]
    fn test_washoff_removes_only_existing_buildup() {
        let (mut catchment, landuse) = with_quality(
            r#"
            [[landuses]]
            name = "Residential"
            washoff = [{ kind = "Exponential", coefficient = 2.0, exponent = 1.0 }]
            "#,
        );
        let initial = catchment.subcatchments[0].land_factors[0].buildup[0];
        assert_relative_eq!(initial, 10.0, max_relative = 1e-9);

        let mut env = Environment::new(&catchment, 0.5 * IN_PER_HR);
        let mut washed = false;
        for step in 0..180 {
            let rain = if step < 60 { 2.0 * IN_PER_HR } else { 0.0 };
            env.step(&mut catchment, &landuse, rain, 60.0);
            washed |= catchment.subcatchments[0].new.quality[0] > 0.0;
        }
        assert!(washed);

        let s = &catchment.subcatchments[0];
        let remaining = s.land_factors[0].buildup[0];
        let runoff_load = env.ledger.loading(LoadCategory::Runoff, 0);
        assert!(remaining < initial);
        assert!(remaining >= 0.0);
        assert_relative_eq!(remaining + runoff_load, initial, max_relative = 1e-9);
        assert_relative_eq!(s.total_load[0], runoff_load, max_relative = 1e-12);
    }

    #[test]
    fn test_dry_weather_buildup_and_sweeping() {
        let (mut catchment, landuse) = with_quality(
            r#"
            [[landuses]]
            name = "Residential"
            sweep_interval = 7.0
            sweep_removal = 0.5
            days_since_swept = 0.0
            buildup = [{ kind = "Power", coefficients = [100.0, 10.0, 0.5] }]

            [[landuses.washoff]]
            kind = "Exponential"
            coefficient = 1.0
            exponent = 1.0
            sweep_efficiency = 0.8
            "#,
        );
        let initial = catchment.subcatchments[0].land_factors[0].buildup[0];
        let mut env = Environment::new(&catchment, 0.0);

        let mut previous = initial;
        let mut swept = false;
        // Ten dry days in hourly steps
        for _ in 0..240 {
            env.step(&mut catchment, &landuse, 0.0, 3600.0);
            let buildup = catchment.subcatchments[0].land_factors[0].buildup[0];
            if buildup < previous {
                swept = true;
                assert!(buildup >= 0.0);
            }
            assert!(buildup <= 100.0 + 1e-9, "buildup limited by its maximum");
            previous = buildup;
        }
        assert!(swept, "sweeping after seven days");

        let final_buildup = catchment.subcatchments[0].land_factors[0].buildup[0];
        let built = env.ledger.loading(LoadCategory::Buildup, 0);
        let swept = env.ledger.loading(LoadCategory::Sweeping, 0);
        assert!(built > 0.0);
        assert!(swept > 0.0);
        assert_relative_eq!(initial + built - swept, final_buildup, max_relative = 1e-9);
        assert_eq!(env.ledger.loading(LoadCategory::Runoff, 0), 0.0);
    }
}
