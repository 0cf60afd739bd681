//! Global conservation accounting.
//!
//! Every subcatchment posts the water volumes and pollutant loads it handles
//! during a step to a [`MassBalance`] implementation. The totals are later used
//! by the surrounding model to compute continuity errors.

use crate::units::FloatValue;
use serde::{Deserialize, Serialize};

/// Categories of pollutant mass tracked by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadCategory {
    /// Mass added to land surfaces by buildup
    Buildup,
    /// Mass removed from land surfaces by street sweeping
    Sweeping,
    /// Mass delivered by wet deposition in rainfall
    Deposition,
    /// Mass carried into the soil with infiltrating ponded water
    Infiltration,
    /// Mass removed from runoff by best management practices
    BmpRemoval,
    /// Mass leaving subcatchments in runoff
    Runoff,
    /// Mass left behind when ponded water disappears without outflow
    FinalResidual,
}

impl LoadCategory {
    pub const ALL: [LoadCategory; 7] = [
        LoadCategory::Buildup,
        LoadCategory::Sweeping,
        LoadCategory::Deposition,
        LoadCategory::Infiltration,
        LoadCategory::BmpRemoval,
        LoadCategory::Runoff,
        LoadCategory::FinalResidual,
    ];

    fn index(self) -> usize {
        match self {
            LoadCategory::Buildup => 0,
            LoadCategory::Sweeping => 1,
            LoadCategory::Deposition => 2,
            LoadCategory::Infiltration => 3,
            LoadCategory::BmpRemoval => 4,
            LoadCategory::Runoff => 5,
            LoadCategory::FinalResidual => 6,
        }
    }
}

/// Receiver of per-step water and pollutant totals.
pub trait MassBalance {
    /// Add the water volumes (ft³) of one subcatchment step.
    fn post_runoff_volumes(
        &mut self,
        rainfall: FloatValue,
        evaporation: FloatValue,
        infiltration: FloatValue,
        outflow: FloatValue,
    );

    /// Add `mass` (reporting mass units) of `pollutant` to a load category.
    fn post_loading(&mut self, category: LoadCategory, pollutant: usize, mass: FloatValue);
}

/// Cumulative runoff volumes (ft³).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunoffTotals {
    pub rainfall: FloatValue,
    pub evaporation: FloatValue,
    pub infiltration: FloatValue,
    pub runoff: FloatValue,
}

/// In-memory [`MassBalance`] keeping running totals.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MassBalanceLedger {
    runoff: RunoffTotals,
    loads: Vec<[FloatValue; 7]>,
}

impl MassBalanceLedger {
    pub fn new(n_pollutants: usize) -> Self {
        Self {
            runoff: RunoffTotals::default(),
            loads: vec![[0.0; 7]; n_pollutants],
        }
    }

    pub fn runoff_totals(&self) -> &RunoffTotals {
        &self.runoff
    }

    /// Total mass posted to `category` for `pollutant`.
    ///
    /// Pollutants outside the ledger's range report zero.
    pub fn loading(&self, category: LoadCategory, pollutant: usize) -> FloatValue {
        self.loads
            .get(pollutant)
            .map(|l| l[category.index()])
            .unwrap_or(0.0)
    }

    /// Relative error of the surface water balance.
    ///
    /// `initial_storage` and `final_storage` are the surface volumes (ft³) at
    /// the start and end of the accounting period.
    pub fn runoff_continuity_error(
        &self,
        initial_storage: FloatValue,
        final_storage: FloatValue,
    ) -> FloatValue {
        let inflow = self.runoff.rainfall + initial_storage;
        let outflow = self.runoff.evaporation
            + self.runoff.infiltration
            + self.runoff.runoff
            + final_storage;
        if inflow > 0.0 {
            (inflow - outflow) / inflow
        } else {
            0.0
        }
    }
}

impl MassBalance for MassBalanceLedger {
    fn post_runoff_volumes(
        &mut self,
        rainfall: FloatValue,
        evaporation: FloatValue,
        infiltration: FloatValue,
        outflow: FloatValue,
    ) {
        self.runoff.rainfall += rainfall;
        self.runoff.evaporation += evaporation;
        self.runoff.infiltration += infiltration;
        self.runoff.runoff += outflow;
    }

    fn post_loading(&mut self, category: LoadCategory, pollutant: usize, mass: FloatValue) {
        if pollutant >= self.loads.len() {
            self.loads.resize(pollutant + 1, [0.0; 7]);
        }
        self.loads[pollutant][category.index()] += mass;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use is_close::is_close;

    #[test]
    fn test_volumes_accumulate() {
        let mut ledger = MassBalanceLedger::new(0);
        ledger.post_runoff_volumes(10.0, 1.0, 2.0, 3.0);
        ledger.post_runoff_volumes(5.0, 0.5, 1.0, 1.5);

        let totals = ledger.runoff_totals();
        assert!(is_close!(totals.rainfall, 15.0));
        assert!(is_close!(totals.evaporation, 1.5));
        assert!(is_close!(totals.infiltration, 3.0));
        assert!(is_close!(totals.runoff, 4.5));
    }

    #[test]
    fn test_loadings_are_kept_per_category() {
        let mut ledger = MassBalanceLedger::new(2);
        ledger.post_loading(LoadCategory::Buildup, 1, 4.0);
        ledger.post_loading(LoadCategory::Buildup, 1, 1.0);
        ledger.post_loading(LoadCategory::Runoff, 1, 2.0);

        assert_eq!(ledger.loading(LoadCategory::Buildup, 1), 5.0);
        assert_eq!(ledger.loading(LoadCategory::Runoff, 1), 2.0);
        assert_eq!(ledger.loading(LoadCategory::Buildup, 0), 0.0);
        for category in LoadCategory::ALL {
            assert_eq!(ledger.loading(category, 7), 0.0);
        }
    }

    #[test]
    fn test_unknown_pollutant_grows_ledger() {
        let mut ledger = MassBalanceLedger::new(0);
        ledger.post_loading(LoadCategory::Deposition, 3, 1.5);
        assert_eq!(ledger.loading(LoadCategory::Deposition, 3), 1.5);
    }

    #[test]
    fn test_continuity_error_is_zero_when_balanced() {
        let mut ledger = MassBalanceLedger::new(0);
        ledger.post_runoff_volumes(100.0, 10.0, 30.0, 50.0);

        let error = ledger.runoff_continuity_error(5.0, 15.0);
        assert!(error.abs() < 1e-12, "continuity error {}", error);
    }
}
