//! Collaborators shared by the integration tests.

#![allow(dead_code)]

use rswmm_core::ledger::MassBalanceLedger;
use rswmm_core::units::{DateTime, FloatValue, Time, SECONDS_PER_DAY};
use rswmm_runoff::collaborators::{
    Evaporation, Externals, InfiltrationModel, LanduseModel, NoGroundwater, NoLid, NoSnowpack,
    Precipitation, RainGage,
};
use rswmm_runoff::statistics::RunoffStatistics;
use rswmm_runoff::Catchment;

/// 1 in/hr expressed in ft/s.
pub const IN_PER_HR: FloatValue = 1.0 / 43200.0;

/// Every gage reports the same rainfall rate (ft/s).
pub struct ConstantGage(pub FloatValue);

impl RainGage for ConstantGage {
    fn precipitation(&self, _: usize) -> Precipitation {
        Precipitation {
            rain: self.0,
            snow: 0.0,
        }
    }

    fn report_rainfall(&self, _: usize) -> FloatValue {
        self.0 / IN_PER_HR
    }
}

/// Pervious areas infiltrate at a constant potential rate (ft/s).
pub struct ConstantInfiltration(pub FloatValue);

impl InfiltrationModel for ConstantInfiltration {
    fn infiltration(
        &mut self,
        _: usize,
        _: Time,
        _: FloatValue,
        _: FloatValue,
        _: FloatValue,
    ) -> FloatValue {
        self.0
    }
}

pub struct Environment {
    pub snow: NoSnowpack,
    pub infiltration: ConstantInfiltration,
    pub groundwater: NoGroundwater,
    pub lid: NoLid,
    pub ledger: MassBalanceLedger,
    pub statistics: RunoffStatistics,
    pub evaporation: Evaporation,
    /// Start of the next step (days)
    pub date: DateTime,
}

impl Environment {
    pub fn new(catchment: &Catchment, infiltration: FloatValue) -> Self {
        Self {
            snow: NoSnowpack,
            infiltration: ConstantInfiltration(infiltration),
            groundwater: NoGroundwater,
            lid: NoLid,
            ledger: MassBalanceLedger::new(catchment.quality.n_pollutants()),
            statistics: RunoffStatistics::new(catchment.n_subcatchments()),
            evaporation: Evaporation::default(),
            date: 0.0,
        }
    }

    /// Advance the catchment by one step with a uniform rainfall rate (ft/s).
    pub fn step(
        &mut self,
        catchment: &mut Catchment,
        landuse: &dyn LanduseModel,
        rain: FloatValue,
        t_step: Time,
    ) {
        let gage = ConstantGage(rain);
        self.date += t_step / SECONDS_PER_DAY;
        let mut ext = Externals {
            gages: &gage,
            snow: &mut self.snow,
            infiltration: &mut self.infiltration,
            groundwater: &mut self.groundwater,
            lid: &mut self.lid,
            landuse,
            ledger: &mut self.ledger,
            statistics: &mut self.statistics,
            evaporation: self.evaporation,
        };
        catchment.run_step(t_step, self.date, &mut ext).unwrap();
    }
}
