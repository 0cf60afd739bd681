//! Cumulative runoff statistics per subcatchment.

use rswmm_core::units::FloatValue;
use serde::{Deserialize, Serialize};

use crate::collaborators::{StatisticsSink, StepStatistics};

/// Totals (ft³) and peak flow (cfs) of one subcatchment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubcatchmentStatistics {
    pub precipitation: FloatValue,
    pub runon: FloatValue,
    pub evaporation: FloatValue,
    pub infiltration: FloatValue,
    pub runoff: FloatValue,
    pub peak_flow: FloatValue,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunoffStatistics {
    subcatchments: Vec<SubcatchmentStatistics>,
}

impl RunoffStatistics {
    pub fn new(n_subcatchments: usize) -> Self {
        Self {
            subcatchments: vec![SubcatchmentStatistics::default(); n_subcatchments],
        }
    }

    pub fn subcatchment(&self, index: usize) -> Option<&SubcatchmentStatistics> {
        self.subcatchments.get(index)
    }
}

impl StatisticsSink for RunoffStatistics {
    fn record_subcatchment_step(&mut self, subcatchment: usize, step: &StepStatistics) {
        if subcatchment >= self.subcatchments.len() {
            self.subcatchments
                .resize(subcatchment + 1, SubcatchmentStatistics::default());
        }
        let stats = &mut self.subcatchments[subcatchment];
        stats.precipitation += step.rain_vol;
        stats.runon += step.runon_vol;
        stats.evaporation += step.evap_vol;
        stats.infiltration += step.infil_vol;
        stats.runoff += step.outflow_vol;
        stats.peak_flow = stats.peak_flow.max(step.outflow_rate);
    }
}
