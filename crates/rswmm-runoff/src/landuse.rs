//! Standard land-use buildup and washoff functions
//!
//! Buildup $B$ after $t$ days, per unit of normaliser (land area or curb length):
//!
//! | Function    | Buildup                                 |
//! |-------------|-----------------------------------------|
//! | Power       | $B = \min(C_1, C_2 t^{C_3})$            |
//! | Exponential | $B = C_1 (1 - e^{-C_2 t})$              |
//! | Saturation  | $B = C_1 t / (C_3 + t)$                 |
//!
//! A step of buildup finds the number of days needed to reach the current
//! buildup, adds the step length and evaluates the function again, so that
//! buildup follows the curve regardless of the step size.
//!
//! Washoff rate $W$ (mass/s):
//!
//! | Function     | Washoff                                     |
//! |--------------|---------------------------------------------|
//! | Exponential  | $W = C_1 q^{C_2} B$, $q$ in in/hr or mm/hr  |
//! | Rating curve | $W = C_1 Q^{C_2}$, $Q$ in user flow units   |
//! | Event mean   | $W = C_1 Q$, $C_1$ a concentration          |

use rswmm_core::errors::{RunoffError, RunoffResult};
use rswmm_core::units::{FloatValue, Time, UnitSystem, LITERS_PER_FT3, SECONDS_PER_DAY};

use crate::collaborators::LanduseModel;
use crate::parameters::{
    BuildupFunction, BuildupKind, LanduseParameters, Normalizer, PollutantParameters,
    QualityParameters, WashoffFunction, WashoffKind,
};
use crate::subcatchment::LandFactor;

impl BuildupFunction {
    /// Buildup per unit normaliser after `days` of accumulation.
    pub fn evaluate(&self, days: FloatValue) -> FloatValue {
        let [c1, c2, c3] = self.coefficients;
        match self.kind {
            BuildupKind::None => 0.0,
            BuildupKind::Power => (c2 * days.powf(c3)).min(c1),
            BuildupKind::Exponential => c1 * (1.0 - (-c2 * days).exp()),
            BuildupKind::Saturation => {
                if days.is_infinite() {
                    c1
                } else if c3 + days == 0.0 {
                    0.0
                } else {
                    c1 * days / (c3 + days)
                }
            }
        }
    }

    /// Days of accumulation needed to reach `buildup` per unit normaliser.
    pub fn days_to_reach(&self, buildup: FloatValue) -> FloatValue {
        if buildup <= 0.0 {
            return 0.0;
        }
        let [c1, c2, c3] = self.coefficients;
        match self.kind {
            BuildupKind::None => 0.0,
            BuildupKind::Power => {
                if c2 * c3 == 0.0 {
                    0.0
                } else {
                    (buildup / c2).powf(1.0 / c3)
                }
            }
            BuildupKind::Exponential => {
                if c1 * c2 == 0.0 {
                    0.0
                } else if buildup >= c1 {
                    FloatValue::INFINITY
                } else {
                    -(1.0 - buildup / c1).ln() / c2
                }
            }
            BuildupKind::Saturation => {
                if c1 == 0.0 {
                    0.0
                } else if buildup >= c1 {
                    FloatValue::INFINITY
                } else {
                    buildup * c3 / (c1 - buildup)
                }
            }
        }
    }
}

/// Land-use model driven by the configured buildup and washoff functions.
#[derive(Debug, Clone, Default)]
pub struct StandardLanduse {
    landuses: Vec<LanduseParameters>,
    pollutants: Vec<PollutantParameters>,
    /// Index of each pollutant's co-pollutant
    co_pollutants: Vec<Option<usize>>,
    units: UnitSystem,
    /// Dry days before the simulation used to build up pollutants without an initial load
    antecedent_dry_days: FloatValue,
}

impl StandardLanduse {
    pub fn from_parameters(quality: &QualityParameters, units: UnitSystem) -> RunoffResult<Self> {
        if let Some(p) = quality
            .pollutants
            .iter()
            .find(|p| !(p.mass_factor.is_finite() && p.mass_factor > 0.0))
        {
            return Err(RunoffError::InvalidNumber {
                object: p.name.clone(),
                field: "mass_factor".to_string(),
                value: p.mass_factor,
            });
        }

        let co_pollutants = quality
            .pollutants
            .iter()
            .map(|p| match &p.co_pollutant {
                None => Ok(None),
                Some(name) => quality.find_pollutant(name).map(Some).ok_or_else(|| {
                    RunoffError::MissingObject {
                        kind: "pollutant".to_string(),
                        name: name.clone(),
                        referenced_by: p.name.clone(),
                    }
                }),
            })
            .collect::<RunoffResult<Vec<_>>>()?;

        Ok(Self {
            landuses: quality.landuses.clone(),
            pollutants: quality.pollutants.clone(),
            co_pollutants,
            units,
            antecedent_dry_days: 0.0,
        })
    }

    pub fn with_antecedent_dry_days(mut self, days: FloatValue) -> Self {
        self.antecedent_dry_days = days.max(0.0);
        self
    }

    fn buildup_function(&self, landuse: usize, pollutant: usize) -> Option<&BuildupFunction> {
        self.landuses.get(landuse)?.buildup.get(pollutant)
    }

    fn mass_factor(&self, pollutant: usize) -> FloatValue {
        self.pollutants
            .get(pollutant)
            .map(|p| p.mass_factor)
            .unwrap_or(1.0)
    }

    /// Washoff rate (internal mass/s) of one pollutant from one land use.
    ///
    /// `land_area` is in ft² and `runoff` in ft/s; `buildup` is in reporting mass.
    fn washoff_rate(
        &self,
        func: &WashoffFunction,
        mass_factor: FloatValue,
        buildup: FloatValue,
        runoff: FloatValue,
        land_area: FloatValue,
    ) -> FloatValue {
        match func.kind {
            WashoffKind::None => 0.0,
            WashoffKind::Exponential => {
                if buildup <= 0.0 {
                    return 0.0;
                }
                let intensity = runoff * self.units.rainfall_factor();
                func.coefficient * intensity.powf(func.exponent) * buildup / 3600.0 / mass_factor
            }
            WashoffKind::RatingCurve => {
                let flow = runoff * land_area * self.units.flow_factor();
                func.coefficient * flow.powf(func.exponent)
            }
            WashoffKind::EventMean => func.coefficient * runoff * land_area * LITERS_PER_FT3,
        }
    }
}

impl LanduseModel for StandardLanduse {
    fn buildup(
        &self,
        landuse: usize,
        pollutant: usize,
        area: FloatValue,
        curb: FloatValue,
        buildup: FloatValue,
        t_step: Time,
    ) -> FloatValue {
        let Some(func) = self.buildup_function(landuse, pollutant) else {
            return buildup;
        };
        if func.kind == BuildupKind::None {
            return buildup;
        }
        let normalizer = match func.normalizer {
            Normalizer::Area => area,
            Normalizer::CurbLength => curb,
        };
        if normalizer <= 0.0 {
            return buildup;
        }

        let mut days = func.days_to_reach(buildup / normalizer) + t_step / SECONDS_PER_DAY;
        if func.max_days > 0.0 {
            days = days.min(func.max_days);
        }
        func.evaluate(days) * normalizer
    }

    fn washoff(
        &self,
        landuse: usize,
        area: FloatValue,
        factor: &mut LandFactor,
        runoff: FloatValue,
        t_step: Time,
        loads: &mut [FloatValue],
    ) {
        let Some(params) = self.landuses.get(landuse) else {
            return;
        };
        let land_area = factor.fraction * area;

        for (p, (func, load)) in params.washoff.iter().zip(loads.iter_mut()).enumerate() {
            let mcf = self.mass_factor(p);
            let Some(buildup) = factor.buildup.get_mut(p) else {
                continue;
            };
            let mut mass = self.washoff_rate(func, mcf, *buildup, runoff, land_area) * t_step;

            let limited_by_buildup = match func.kind {
                WashoffKind::Exponential => true,
                WashoffKind::RatingCurve => self
                    .buildup_function(landuse, p)
                    .is_some_and(|b| b.kind != BuildupKind::None),
                WashoffKind::EventMean | WashoffKind::None => false,
            };
            if limited_by_buildup {
                let removed = (mass * mcf).min(*buildup);
                *buildup -= removed;
                mass = removed / mcf;
            }
            *load += mass;
        }
    }

    fn co_pollutant_load(&self, pollutant: usize, washoff: &[FloatValue]) -> FloatValue {
        let Some(Some(co)) = self.co_pollutants.get(pollutant) else {
            return 0.0;
        };
        let fraction = self
            .pollutants
            .get(pollutant)
            .map(|p| p.co_fraction)
            .unwrap_or(0.0);
        fraction * washoff.get(*co).copied().unwrap_or(0.0)
    }

    fn average_bmp_efficiency(&self, factors: &[LandFactor], pollutant: usize) -> FloatValue {
        factors
            .iter()
            .zip(&self.landuses)
            .map(|(factor, landuse)| {
                factor.fraction
                    * landuse
                        .washoff
                        .get(pollutant)
                        .map(|w| w.bmp_efficiency)
                        .unwrap_or(0.0)
            })
            .sum()
    }

    fn initial_buildup(
        &self,
        factors: &mut [LandFactor],
        initial: &[FloatValue],
        area: FloatValue,
        curb: FloatValue,
    ) {
        let dry_seconds = self.antecedent_dry_days * SECONDS_PER_DAY;
        for (i, factor) in factors.iter_mut().enumerate() {
            let f = factor.fraction;
            if f == 0.0 {
                continue;
            }
            for (p, buildup) in factor.buildup.iter_mut().enumerate() {
                let load = initial.get(p).copied().unwrap_or(0.0);
                *buildup = if load > 0.0 {
                    load * f * area
                } else if dry_seconds > 0.0 {
                    self.buildup(i, p, f * area, f * curb, 0.0, dry_seconds)
                } else {
                    0.0
                };
            }
        }
    }
}
