//! Interfaces to the models surrounding the runoff kernel.
//!
//! Rain gages, snowpacks, infiltration, groundwater, LID units, land-use
//! functions and the statistics sink all live outside the kernel. Each is
//! reached through a narrow trait keyed by subcatchment (or gage) index.
//! No-op implementations are provided for models that are not simulated.

use rswmm_core::ledger::MassBalance;
use rswmm_core::units::{FloatValue, Time};
use serde::{Deserialize, Serialize};

use crate::subcatchment::LandFactor;

/// Instantaneous precipitation reported by a gage (ft/s).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Precipitation {
    pub rain: FloatValue,
    pub snow: FloatValue,
}

pub trait RainGage {
    /// Current rainfall and snowfall rates of a gage.
    fn precipitation(&self, gage: usize) -> Precipitation;

    /// Rainfall rate supplied directly for a subcatchment, replacing the gage's rain.
    fn direct_rainfall(&self, _subcatchment: usize) -> Option<FloatValue> {
        None
    }

    /// Rainfall of the current reporting period in user units.
    fn report_rainfall(&self, gage: usize) -> FloatValue;
}

/// Output of a snowmelt computation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snowmelt {
    /// Snow depth after the step (ft)
    pub snow_depth: FloatValue,
    /// Rain plus melt reaching each sub-area kind (ft/s)
    pub net_precipitation: [FloatValue; 3],
}

pub trait SnowModel {
    fn snowmelt(
        &mut self,
        subcatchment: usize,
        rain: FloatValue,
        snow: FloatValue,
        t_step: Time,
    ) -> Snowmelt;

    /// Snow depth (ft) on the plowable impervious area.
    fn plowable_snow_depth(&self, subcatchment: usize) -> FloatValue;
}

pub trait InfiltrationModel {
    /// Infiltration rate (ft/s) of a subcatchment's pervious area.
    ///
    /// `inflow` excludes `precip`, which is passed separately.
    fn infiltration(
        &mut self,
        subcatchment: usize,
        t_step: Time,
        precip: FloatValue,
        inflow: FloatValue,
        depth: FloatValue,
    ) -> FloatValue;
}

/// Groundwater state reported for a subcatchment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundwaterReport {
    /// Lateral groundwater flow (user flow units)
    pub flow: FloatValue,
    /// Water table elevation (user length units)
    pub elevation: FloatValue,
    /// Moisture content of the unsaturated zone
    pub moisture: FloatValue,
}

pub trait GroundwaterModel {
    /// Void volume (ft) available in the unsaturated zone.
    fn available_infiltration_volume(&self, subcatchment: usize) -> FloatValue;

    /// Advance the aquifer given the surface's pervious evaporation and
    /// infiltration volumes (ft³).
    fn advance(
        &mut self,
        subcatchment: usize,
        perv_evap_vol: FloatValue,
        infil_vol: FloatValue,
        t_step: Time,
    );

    fn report(&self, subcatchment: usize) -> GroundwaterReport;
}

/// Contribution of a subcatchment's LID units to one step.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LidRunoff {
    /// Runoff generated over the LID area (cfs)
    pub runoff: FloatValue,
    /// Flow leaving through the subcatchment outlet (cfs)
    pub outflow: FloatValue,
    pub evap_vol: FloatValue,
    pub perv_evap_vol: FloatValue,
    pub infil_vol: FloatValue,
}

pub trait LidModel {
    fn runoff(&mut self, subcatchment: usize, t_step: Time) -> LidRunoff;

    /// Flow (cfs) returned from LID units onto the pervious area.
    fn return_flow_to_pervious(&self, subcatchment: usize) -> FloatValue;

    /// Water stored in LID units (ft³).
    fn stored_volume(&self, subcatchment: usize) -> FloatValue;

    /// Depth of water ponded on LID surfaces (ft).
    fn surface_depth(&self, subcatchment: usize) -> FloatValue;

    /// LID area (ft²) that behaves as pervious area.
    fn pervious_area(&self, subcatchment: usize) -> FloatValue;
}

/// Land-use specific buildup and washoff functions.
pub trait LanduseModel {
    /// Buildup after a step starting from `buildup`.
    ///
    /// `area` is in user land-area units and `curb` in user length units.
    fn buildup(
        &self,
        landuse: usize,
        pollutant: usize,
        area: FloatValue,
        curb: FloatValue,
        buildup: FloatValue,
        t_step: Time,
    ) -> FloatValue;

    /// Add the washoff of each pollutant over the step (internal mass) into `loads`.
    ///
    /// `area` is the subcatchment area (ft²) and `runoff` the area averaged runoff
    /// rate (ft/s). Buildup washed off is removed from `factor`.
    fn washoff(
        &self,
        landuse: usize,
        area: FloatValue,
        factor: &mut LandFactor,
        runoff: FloatValue,
        t_step: Time,
        loads: &mut [FloatValue],
    );

    /// Load of `pollutant` generated by the washoff of its co-pollutant.
    fn co_pollutant_load(&self, pollutant: usize, washoff: &[FloatValue]) -> FloatValue;

    /// Land-use area weighted BMP removal efficiency of a pollutant.
    fn average_bmp_efficiency(&self, factors: &[LandFactor], pollutant: usize) -> FloatValue;

    /// Populate the buildup of each land use at the start of a simulation.
    ///
    /// `initial` holds loads per unit land area; `area` is in user land-area units.
    fn initial_buildup(
        &self,
        factors: &mut [LandFactor],
        initial: &[FloatValue],
        area: FloatValue,
        _curb: FloatValue,
    ) {
        for factor in factors.iter_mut() {
            if factor.fraction == 0.0 {
                continue;
            }
            for (buildup, load) in factor.buildup.iter_mut().zip(initial) {
                if *load > 0.0 {
                    *buildup = load * factor.fraction * area;
                }
            }
        }
    }
}

/// Water volumes of one subcatchment step, as recorded by statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct StepStatistics {
    /// Precipitation volume (ft³)
    pub rain_vol: FloatValue,
    pub runon_vol: FloatValue,
    pub evap_vol: FloatValue,
    pub infil_vol: FloatValue,
    pub outflow_vol: FloatValue,
    /// Outflow rate (cfs)
    pub outflow_rate: FloatValue,
}

pub trait StatisticsSink {
    fn record_subcatchment_step(&mut self, subcatchment: usize, step: &StepStatistics);
}

/// Evaporation applied to ponded water during a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Evaporation {
    /// Potential evaporation rate (ft/s)
    pub rate: FloatValue,
    /// Evaporation only occurs in periods without rainfall
    pub dry_only: bool,
}

/// Collaborators used while advancing subcatchments.
pub struct Externals<'a> {
    pub gages: &'a dyn RainGage,
    pub snow: &'a mut dyn SnowModel,
    pub infiltration: &'a mut dyn InfiltrationModel,
    pub groundwater: &'a mut dyn GroundwaterModel,
    pub lid: &'a mut dyn LidModel,
    pub landuse: &'a dyn LanduseModel,
    pub ledger: &'a mut dyn MassBalance,
    pub statistics: &'a mut dyn StatisticsSink,
    pub evaporation: Evaporation,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoSnowpack;

impl SnowModel for NoSnowpack {
    fn snowmelt(&mut self, _: usize, rain: FloatValue, snow: FloatValue, _: Time) -> Snowmelt {
        Snowmelt {
            snow_depth: 0.0,
            net_precipitation: [rain + snow; 3],
        }
    }

    fn plowable_snow_depth(&self, _: usize) -> FloatValue {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoInfiltration;

impl InfiltrationModel for NoInfiltration {
    fn infiltration(
        &mut self,
        _: usize,
        _: Time,
        _: FloatValue,
        _: FloatValue,
        _: FloatValue,
    ) -> FloatValue {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoGroundwater;

impl GroundwaterModel for NoGroundwater {
    fn available_infiltration_volume(&self, _: usize) -> FloatValue {
        FloatValue::INFINITY
    }

    fn advance(&mut self, _: usize, _: FloatValue, _: FloatValue, _: Time) {}

    fn report(&self, _: usize) -> GroundwaterReport {
        GroundwaterReport::default()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoLid;

impl LidModel for NoLid {
    fn runoff(&mut self, _: usize, _: Time) -> LidRunoff {
        LidRunoff::default()
    }

    fn return_flow_to_pervious(&self, _: usize) -> FloatValue {
        0.0
    }

    fn stored_volume(&self, _: usize) -> FloatValue {
        0.0
    }

    fn surface_depth(&self, _: usize) -> FloatValue {
        0.0
    }

    fn pervious_area(&self, _: usize) -> FloatValue {
        0.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoStatistics;

impl StatisticsSink for NoStatistics {
    fn record_subcatchment_step(&mut self, _: usize, _: &StepStatistics) {}
}
