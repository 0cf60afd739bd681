//! Shared fixtures for unit tests.

use rswmm_core::ledger::MassBalanceLedger;
use rswmm_core::units::FloatValue;

use crate::collaborators::{
    Evaporation, Externals, LanduseModel, NoGroundwater, NoInfiltration, NoLid, NoSnowpack,
    NoStatistics, Precipitation, RainGage,
};

/// Rain gage with a constant rainfall rate (ft/s).
pub struct ConstantGage(pub FloatValue);

impl RainGage for ConstantGage {
    fn precipitation(&self, _: usize) -> Precipitation {
        Precipitation {
            rain: self.0,
            snow: 0.0,
        }
    }

    fn report_rainfall(&self, _: usize) -> FloatValue {
        self.0 * 43200.0
    }
}

/// Owns the no-op collaborators and a ledger.
pub struct Harness {
    pub snow: NoSnowpack,
    pub infiltration: NoInfiltration,
    pub groundwater: NoGroundwater,
    pub lid: NoLid,
    pub ledger: MassBalanceLedger,
    pub statistics: NoStatistics,
    pub evaporation: Evaporation,
}

impl Harness {
    pub fn new(n_pollutants: usize) -> Self {
        Self {
            snow: NoSnowpack,
            infiltration: NoInfiltration,
            groundwater: NoGroundwater,
            lid: NoLid,
            ledger: MassBalanceLedger::new(n_pollutants),
            statistics: NoStatistics,
            evaporation: Evaporation::default(),
        }
    }

    pub fn externals<'a>(
        &'a mut self,
        gages: &'a dyn RainGage,
        landuse: &'a dyn LanduseModel,
    ) -> Externals<'a> {
        Externals {
            gages,
            snow: &mut self.snow,
            infiltration: &mut self.infiltration,
            groundwater: &mut self.groundwater,
            lid: &mut self.lid,
            landuse,
            ledger: &mut self.ledger,
            statistics: &mut self.statistics,
            evaporation: self.evaporation,
        }
    }
}
