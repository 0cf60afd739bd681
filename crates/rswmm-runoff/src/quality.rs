//! Pollutant buildup, sweeping and washoff
//!
//! Pollutants accumulate on each land use between storms, are removed by
//! street sweeping and wash off during runoff. Two streams leave the
//! subcatchment during a step:
//!
//! 1. pollutant mass in ponded water, from rainfall deposition and runon,
//!    treated as a completely mixed volume:
//!    $$ c = \frac{W_{ponded} + W_{rain} + W_{runon}}{V_{ponded} + V_{rain} + V_{runon}} $$
//!    from which infiltration, outflow and BMP removal are subtracted
//! 2. washoff of buildup computed by the land-use functions
//!
//! Pollutant mass is held in concentration units × litres. Loads posted to
//! the ledger are converted to reporting mass with each pollutant's mass factor.

use rswmm_core::ledger::LoadCategory;
use rswmm_core::units::{DateTime, FloatValue, Time, LITERS_PER_FT3};

use crate::collaborators::Externals;
use crate::constants::{MIN_RUNOFF, MIN_SNOW_ONLY_DEPTH, MIN_TOTAL_DEPTH};
use crate::parameters::{QualityParameters, RunoffSettings};
use crate::subcatchment::Subcatchment;
use crate::water_balance::{RunoffStep, WaterVolumes};

impl Subcatchment {
    /// Add the buildup accumulated over a step to each land use.
    ///
    /// Buildup never decreases. Snow-only pollutants only build up while
    /// snow is on the ground.
    pub fn compute_buildup(
        &mut self,
        t_step: Time,
        quality: &QualityParameters,
        settings: &RunoffSettings,
        ext: &mut Externals,
    ) {
        let land_area = self.area * settings.units.land_area_factor();
        let curb_length = self.curb_length;
        let snow_depth = self.new.snow_depth;

        for (i, factor) in self.land_factors.iter_mut().enumerate() {
            let f = factor.fraction;
            if f == 0.0 {
                continue;
            }
            let area = f * land_area;
            let curb = f * curb_length;

            for (p, (pollutant, buildup)) in quality
                .pollutants
                .iter()
                .zip(factor.buildup.iter_mut())
                .enumerate()
            {
                if pollutant.snow_only && snow_depth < MIN_SNOW_ONLY_DEPTH {
                    continue;
                }
                let old = *buildup;
                let new = ext
                    .landuse
                    .buildup(i, p, area, curb, old, t_step)
                    .max(old);
                *buildup = new;
                ext.ledger.post_loading(LoadCategory::Buildup, p, new - old);
            }
        }
    }

    /// Sweep the land uses whose sweeping interval has elapsed by `date` (days).
    pub fn apply_sweeping(
        &mut self,
        date: DateTime,
        quality: &QualityParameters,
        ext: &mut Externals,
    ) {
        if self.snowpack && ext.snow.plowable_snow_depth(self.index) > MIN_TOTAL_DEPTH {
            return;
        }

        for (factor, landuse) in self.land_factors.iter_mut().zip(&quality.landuses) {
            if factor.fraction == 0.0 || landuse.sweep_interval == 0.0 {
                continue;
            }
            if date - factor.last_swept < landuse.sweep_interval {
                continue;
            }
            factor.last_swept = date;

            for (p, buildup) in factor.buildup.iter_mut().enumerate() {
                let old = *buildup;
                let removal = landuse.sweep_removal * landuse.sweep_efficiency(p);
                let new = (old * (1.0 - removal)).min(old).max(0.0);
                *buildup = new;
                ext.ledger.post_loading(LoadCategory::Sweeping, p, old - new);
            }
        }
    }

    /// Compute the pollutant concentrations of the step's outflow.
    ///
    /// `step` is the result of [`Subcatchment::compute_runoff`] for the same
    /// step. Its surface runoff drives land-use washoff while the outlet flow
    /// converts loads into concentrations.
    pub fn compute_washoff(
        &mut self,
        step: &RunoffStep,
        t_step: Time,
        quality: &QualityParameters,
        ext: &mut Externals,
    ) {
        let n_pollutants = quality.n_pollutants();
        if n_pollutants == 0 || self.area == 0.0 {
            return;
        }

        // Mass routed in from upstream (mass/s) before it is replaced by concentrations
        let runon_mass = std::mem::take(&mut self.new.quality);
        let mut outflow_load =
            self.update_ponded_quality(&step.volumes, &runon_mass, t_step, quality, ext);

        if step.runoff >= MIN_RUNOFF {
            let mut washoff = vec![0.0; n_pollutants];
            let area = self.area;
            for (i, factor) in self.land_factors.iter_mut().enumerate() {
                if factor.fraction > 0.0 {
                    ext.landuse
                        .washoff(i, area, factor, step.runoff, t_step, &mut washoff);
                }
            }
            // Co-pollutant loads see earlier pollutants' augmented washoff
            for p in 0..n_pollutants {
                washoff[p] += ext.landuse.co_pollutant_load(p, &washoff);
                outflow_load[p] += washoff[p];
            }
        }

        let outflow = self.new.runoff;
        let to_network = self.discharges_to_network();
        self.new.quality = vec![0.0; n_pollutants];
        for (p, (load, pollutant)) in outflow_load.iter().zip(&quality.pollutants).enumerate() {
            let mass = load * pollutant.mass_factor;
            if let Some(total) = self.total_load.get_mut(p) {
                *total += mass;
            }
            if to_network {
                ext.ledger.post_loading(LoadCategory::Runoff, p, mass);
            }
            if outflow > MIN_RUNOFF {
                self.new.quality[p] = load / (outflow * t_step * LITERS_PER_FT3);
            }
        }
    }

    /// Complete-mix mass balance of the pollutants in ponded water.
    ///
    /// Returns the mass of each pollutant leaving with the outflow.
    fn update_ponded_quality(
        &mut self,
        volumes: &WaterVolumes,
        runon_mass: &[FloatValue],
        t_step: Time,
        quality: &QualityParameters,
        ext: &mut Externals,
    ) -> Vec<FloatValue> {
        let inflow_vol = volumes.rain + volumes.runon;
        let is_dry = volumes.ponded + inflow_vol == 0.0;
        let ponded_after = self.average_depth(&*ext.lid) * self.area;
        let mut outflow_load = vec![0.0; quality.n_pollutants()];

        for (p, pollutant) in quality.pollutants.iter().enumerate() {
            let mcf = pollutant.mass_factor;
            let w_rain = pollutant.rain_concentration * LITERS_PER_FT3 * volumes.rain;
            ext.ledger
                .post_loading(LoadCategory::Deposition, p, w_rain * mcf);

            let Some(ponded) = self.ponded_quality.get_mut(p) else {
                continue;
            };

            if is_dry {
                ext.ledger
                    .post_loading(LoadCategory::FinalResidual, p, *ponded * mcf);
                *ponded = 0.0;
                continue;
            }

            let mut w = *ponded + w_rain + runon_mass.get(p).copied().unwrap_or(0.0) * t_step;
            let c = w / (volumes.ponded + inflow_vol);

            let w_infil = (c * volumes.infil).min(w);
            ext.ledger
                .post_loading(LoadCategory::Infiltration, p, w_infil * mcf);
            w -= w_infil;

            let mut load = w.min(c * volumes.outflow);
            let bmp_removal = ext
                .landuse
                .average_bmp_efficiency(&self.land_factors, p)
                * load;
            ext.ledger
                .post_loading(LoadCategory::BmpRemoval, p, bmp_removal * mcf);
            load -= bmp_removal;

            outflow_load[p] = load;
            *ponded = c * ponded_after;
        }
        outflow_load
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{LanduseModel, SnowModel, Snowmelt};
    use crate::parameters::{LanduseParameters, PollutantParameters};
    use crate::subcatchment::tests::one_acre;
    use crate::subcatchment::LandFactor;
    use crate::test_utils::{ConstantGage, Harness};
    use approx::assert_relative_eq;
    use is_close::is_close;

    /// Land use whose buildup moves towards a target and whose washoff is a fixed load.
    struct Fixed {
        target: FloatValue,
        washoff: FloatValue,
        bmp: FloatValue,
    }

    impl LanduseModel for Fixed {
        fn buildup(
            &self,
            _: usize,
            _: usize,
            _: FloatValue,
            _: FloatValue,
            _: FloatValue,
            _: Time,
        ) -> FloatValue {
            self.target
        }

        fn washoff(
            &self,
            _: usize,
            _: FloatValue,
            _: &mut LandFactor,
            _: FloatValue,
            _: Time,
            loads: &mut [FloatValue],
        ) {
            loads.iter_mut().for_each(|l| *l += self.washoff);
        }

        fn co_pollutant_load(&self, _: usize, _: &[FloatValue]) -> FloatValue {
            0.0
        }

        fn average_bmp_efficiency(&self, _: &[LandFactor], _: usize) -> FloatValue {
            self.bmp
        }
    }

    struct DeepSnow;

    impl SnowModel for DeepSnow {
        fn snowmelt(&mut self, _: usize, _: FloatValue, _: FloatValue, _: Time) -> Snowmelt {
            Snowmelt::default()
        }

        fn plowable_snow_depth(&self, _: usize) -> FloatValue {
            1.0
        }
    }

    fn quality(n_pollutants: usize) -> QualityParameters {
        QualityParameters {
            pollutants: (0..n_pollutants)
                .map(|i| PollutantParameters {
                    name: format!("P{}", i),
                    mass_factor: 1.0,
                    ..Default::default()
                })
                .collect(),
            landuses: vec![LanduseParameters {
                name: "Streets".to_string(),
                sweep_interval: 7.0,
                sweep_removal: 0.5,
                washoff: vec![
                    crate::parameters::WashoffFunction {
                        sweep_efficiency: 0.8,
                        ..Default::default()
                    };
                    n_pollutants
                ],
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_buildup_never_decreases() {
        let mut s = one_acre(1);
        s.land_factors[0].buildup[0] = 10.0;
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 4.0,
            washoff: 0.0,
            bmp: 0.0,
        };
        let mut harness = Harness::new(1);
        {
            let mut ext = harness.externals(&gage, &landuse);
            s.compute_buildup(3600.0, &quality(1), &RunoffSettings::default(), &mut ext);
        }
        assert_eq!(s.land_factors[0].buildup[0], 10.0);
        assert_eq!(harness.ledger.loading(LoadCategory::Buildup, 0), 0.0);

        let landuse = Fixed {
            target: 12.5,
            ..landuse
        };
        {
            let mut ext = harness.externals(&gage, &landuse);
            s.compute_buildup(3600.0, &quality(1), &RunoffSettings::default(), &mut ext);
        }
        assert_eq!(s.land_factors[0].buildup[0], 12.5);
        assert_eq!(harness.ledger.loading(LoadCategory::Buildup, 0), 2.5);
    }

    #[test]
    fn test_snow_only_pollutant_needs_snow() {
        let mut s = one_acre(1);
        let mut quality = quality(1);
        quality.pollutants[0].snow_only = true;
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 4.0,
            washoff: 0.0,
            bmp: 0.0,
        };
        let mut harness = Harness::new(1);
        let mut ext = harness.externals(&gage, &landuse);

        s.compute_buildup(3600.0, &quality, &RunoffSettings::default(), &mut ext);
        assert_eq!(s.land_factors[0].buildup[0], 0.0);

        s.new.snow_depth = 0.01;
        s.compute_buildup(3600.0, &quality, &RunoffSettings::default(), &mut ext);
        assert_eq!(s.land_factors[0].buildup[0], 4.0);
    }

    #[test]
    fn test_sweeping_after_interval() {
        let mut s = one_acre(2);
        s.land_factors[0].buildup = vec![10.0, 0.0];
        s.land_factors[0].last_swept = 0.0;
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 0.0,
            washoff: 0.0,
            bmp: 0.0,
        };
        let mut harness = Harness::new(2);
        {
            let mut ext = harness.externals(&gage, &landuse);

            s.apply_sweeping(6.5, &quality(2), &mut ext);
            assert_eq!(s.land_factors[0].buildup[0], 10.0);

            s.apply_sweeping(7.0, &quality(2), &mut ext);
        }
        // Removal 0.5 * efficiency 0.8
        assert!(is_close!(s.land_factors[0].buildup[0], 6.0));
        assert_eq!(s.land_factors[0].buildup[1], 0.0);
        assert_eq!(s.land_factors[0].last_swept, 7.0);
        assert!(is_close!(harness.ledger.loading(LoadCategory::Sweeping, 0), 4.0));
    }

    #[test]
    fn test_sweeping_never_goes_negative() {
        let mut s = one_acre(1);
        s.land_factors[0].buildup = vec![10.0];
        let mut quality = quality(1);
        quality.landuses[0].sweep_removal = 2.0;
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 0.0,
            washoff: 0.0,
            bmp: 0.0,
        };
        let mut harness = Harness::new(1);
        let mut ext = harness.externals(&gage, &landuse);

        s.apply_sweeping(30.0, &quality, &mut ext);

        assert_eq!(s.land_factors[0].buildup[0], 0.0);
    }

    #[test]
    fn test_snow_blocks_sweeping() {
        let mut s = one_acre(1);
        s.snowpack = true;
        s.land_factors[0].buildup = vec![10.0];
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 0.0,
            washoff: 0.0,
            bmp: 0.0,
        };
        let mut harness = Harness::new(1);
        let mut snow = DeepSnow;
        let mut ext = harness.externals(&gage, &landuse);
        ext.snow = &mut snow;

        s.apply_sweeping(30.0, &quality(1), &mut ext);

        assert_eq!(s.land_factors[0].buildup[0], 10.0);
        assert_eq!(s.land_factors[0].last_swept, 0.0);
    }

    #[test]
    fn test_dry_surface_flushes_ponded_mass() {
        let mut s = one_acre(1);
        s.ponded_quality[0] = 5.0;
        let mut quality = quality(1);
        quality.pollutants[0].mass_factor = 0.5;
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 0.0,
            washoff: 0.0,
            bmp: 0.0,
        };
        let mut harness = Harness::new(1);
        {
            let mut ext = harness.externals(&gage, &landuse);
            s.compute_washoff(&RunoffStep::default(), 60.0, &quality, &mut ext);
        }

        assert_eq!(s.ponded_quality[0], 0.0);
        assert_eq!(s.new.quality[0], 0.0);
        assert_eq!(harness.ledger.loading(LoadCategory::FinalResidual, 0), 2.5);
    }

    #[test]
    fn test_runon_mass_mixes_with_ponded_water() {
        let mut s = one_acre(1);
        let t_step = 60.0;
        let outflow = 0.5;
        s.new.runoff = outflow;
        // Mass flux routed in from upstream (mass/s)
        s.new.quality[0] = 100.0;
        let step = RunoffStep {
            runoff: 0.0,
            outflow,
            volumes: WaterVolumes {
                runon: 60.0,
                outflow: outflow * t_step,
                ..Default::default()
            },
        };
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 0.0,
            washoff: 1.0e6,
            bmp: 0.0,
        };
        let mut harness = Harness::new(1);
        {
            let mut ext = harness.externals(&gage, &landuse);
            s.compute_washoff(&step, t_step, &quality(1), &mut ext);
        }

        // All mixed water leaves: c = 6000 / 60 and load = c * 30
        let load = 100.0 * 30.0;
        assert_relative_eq!(
            s.new.quality[0],
            load / (outflow * t_step * LITERS_PER_FT3),
            max_relative = 1e-12
        );
        assert_relative_eq!(s.total_load[0], load, max_relative = 1e-12);
        assert_relative_eq!(
            harness.ledger.loading(LoadCategory::Runoff, 0),
            load,
            max_relative = 1e-12
        );
        // Surface is empty, so nothing stays ponded
        assert_eq!(s.ponded_quality[0], 0.0);
    }

    #[test]
    fn test_washoff_and_bmp_removal() {
        let mut s = one_acre(1);
        let t_step = 60.0;
        s.new.runoff = 1.0;
        s.subareas[2].depth = 0.01;
        let step = RunoffStep {
            runoff: 1.0e-5,
            outflow: 1.0,
            volumes: WaterVolumes {
                ponded: 100.0,
                outflow: 60.0,
                infil: 40.0,
                ..Default::default()
            },
        };
        s.ponded_quality[0] = 200.0;
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 0.0,
            washoff: 7.0,
            bmp: 0.25,
        };
        let mut harness = Harness::new(1);
        {
            let mut ext = harness.externals(&gage, &landuse);
            s.compute_washoff(&step, t_step, &quality(1), &mut ext);
        }

        // c = 2; infiltration takes 80, outflow min(120, 120) = 120 less 25% BMP
        let ledger = &harness.ledger;
        assert_relative_eq!(ledger.loading(LoadCategory::Infiltration, 0), 80.0);
        assert_relative_eq!(ledger.loading(LoadCategory::BmpRemoval, 0), 30.0);
        assert_relative_eq!(ledger.loading(LoadCategory::Runoff, 0), 90.0 + 7.0);
        assert_relative_eq!(s.ponded_quality[0], 2.0 * 0.005 * 43560.0, max_relative = 1e-12);
    }

    #[test]
    fn test_no_washoff_below_minimum_runoff() {
        let mut s = one_acre(1);
        s.new.runoff = 1.0;
        let step = RunoffStep {
            runoff: 0.5 * MIN_RUNOFF,
            outflow: 1.0,
            volumes: WaterVolumes {
                rain: 10.0,
                outflow: 10.0,
                ..Default::default()
            },
        };
        let gage = ConstantGage(0.0);
        let landuse = Fixed {
            target: 0.0,
            washoff: 7.0,
            bmp: 0.0,
        };
        let mut harness = Harness::new(1);
        {
            let mut ext = harness.externals(&gage, &landuse);
            s.compute_washoff(&step, 60.0, &quality(1), &mut ext);
        }
        assert_eq!(harness.ledger.loading(LoadCategory::Runoff, 0), 0.0);
        assert_eq!(s.new.quality[0], 0.0);
    }

    /// Washes off only the first pollutant; each later one is half of the one before.
    struct Chain {
        washoff: FloatValue,
    }

    impl LanduseModel for Chain {
        fn buildup(
            &self,
            _: usize,
            _: usize,
            _: FloatValue,
            _: FloatValue,
            buildup: FloatValue,
            _: Time,
        ) -> FloatValue {
            buildup
        }

        fn washoff(
            &self,
            _: usize,
            _: FloatValue,
            _: &mut LandFactor,
            _: FloatValue,
            _: Time,
            loads: &mut [FloatValue],
        ) {
            loads[0] += self.washoff;
        }

        fn co_pollutant_load(&self, pollutant: usize, washoff: &[FloatValue]) -> FloatValue {
            match pollutant {
                0 => 0.0,
                p => 0.5 * washoff[p - 1],
            }
        }

        fn average_bmp_efficiency(&self, _: &[LandFactor], _: usize) -> FloatValue {
            0.0
        }
    }

    #[test]
    fn test_co_pollutant_chain_uses_augmented_washoff() {
        let mut s = one_acre(3);
        s.new.runoff = 1.0;
        let step = RunoffStep {
            runoff: 1.0e-5,
            outflow: 1.0,
            volumes: WaterVolumes {
                outflow: 60.0,
                ..Default::default()
            },
        };
        let gage = ConstantGage(0.0);
        let landuse = Chain { washoff: 8.0 };
        let mut harness = Harness::new(3);
        {
            let mut ext = harness.externals(&gage, &landuse);
            s.compute_washoff(&step, 60.0, &quality(3), &mut ext);
        }

        let ledger = &harness.ledger;
        assert_relative_eq!(ledger.loading(LoadCategory::Runoff, 0), 8.0);
        assert_relative_eq!(ledger.loading(LoadCategory::Runoff, 1), 4.0);
        assert_relative_eq!(ledger.loading(LoadCategory::Runoff, 2), 2.0);
        assert_relative_eq!(s.new.quality[2], 0.25 * s.new.quality[0], max_relative = 1e-12);
    }
}
