//! Runon routing
//!
//! Before a step is solved, the runoff of the previous step is moved
//! between sub-areas of a subcatchment and from each subcatchment into the
//! subcatchment it drains to. Only previous-step values are read, so the
//! order in which subcatchments are routed does not matter.
//!
//! Pollutant mass only travels between subcatchments. It is held in the
//! receiving subcatchment's new quality (as mass per second) until washoff
//! mixes it with the ponded water.

use log::debug;
use rswmm_core::units::{FloatValue, LITERS_PER_FT3};

use crate::catchment::Catchment;
use crate::collaborators::LidModel;
use crate::subarea::{RouteTo, SubAreaKind};
use crate::subcatchment::Subcatchment;

impl Subcatchment {
    /// Route the previous step's runoff between this subcatchment's sub-areas.
    ///
    /// Adds any flow returned by LID units to the pervious sub-area.
    pub fn route_internal_runon(&mut self, lid: &dyn LidModel) {
        let imperv0 = self.subareas[SubAreaKind::ImperviousNoStorage.index()].clone();
        let imperv1 = self.subareas[SubAreaKind::ImperviousWithStorage.index()].clone();
        let perv = self.subareas[SubAreaKind::Pervious.index()].clone();

        if self.frac_imperv < 1.0 && imperv0.route_to == RouteTo::Pervious {
            let q = imperv0.runoff * imperv0.f_area + imperv1.runoff * imperv1.f_area;
            self.subarea_mut(SubAreaKind::Pervious).inflow +=
                q * (1.0 - imperv0.f_outlet) / perv.f_area;
        }

        if self.frac_imperv > 0.0 && perv.route_to == RouteTo::Impervious && imperv1.f_area > 0.0
        {
            self.subarea_mut(SubAreaKind::ImperviousWithStorage).inflow +=
                perv.runoff * (1.0 - perv.f_outlet) * perv.f_area / imperv1.f_area;
        }

        if self.lid_area > 0.0 && self.frac_imperv < 1.0 {
            let perv_area = perv.f_area * self.non_lid_area();
            if perv_area > 0.0 {
                self.subarea_mut(SubAreaKind::Pervious).inflow +=
                    lid.return_flow_to_pervious(self.index) / perv_area;
            }
        }
    }

    /// Receive runoff (cfs) and pollutant loads from an upstream subcatchment.
    ///
    /// `concentrations` are the upstream outflow concentrations (mass/L).
    fn receive_runon(&mut self, runoff: FloatValue, concentrations: &[FloatValue]) {
        let q = runoff / self.area;
        self.runon += q;
        for sa in self.subareas.iter_mut() {
            sa.inflow += q;
        }
        for (w, c) in self.new.quality.iter_mut().zip(concentrations) {
            *w += runoff * c * LITERS_PER_FT3;
        }
    }
}

impl Catchment {
    /// Route the previous step's runoff of subcatchment `j`.
    ///
    /// Each subcatchment is routed at most once between state commits.
    pub fn route_runon(&mut self, j: usize, lid: &dyn LidModel) {
        let Some(source) = self.subcatchments.get_mut(j) else {
            return;
        };
        if source.runon_routed {
            debug!("Runon of subcatchment '{}' already routed", source.name);
            return;
        }
        source.runon_routed = true;

        let outlet = source.outlet_subcatchment();
        let runoff = source.old.runoff;
        let concentrations = source.old.quality.clone();
        source.route_internal_runon(lid);

        if let Some(k) = outlet {
            if let Some(target) = self.subcatchments.get_mut(k) {
                if target.area > 0.0 {
                    target.receive_runon(runoff, &concentrations);
                }
            }
        }
    }

    /// Route the previous step's runoff of every subcatchment.
    pub fn route_all_runon(&mut self, lid: &dyn LidModel) {
        for j in 0..self.subcatchments.len() {
            self.route_runon(j, lid);
        }
    }
}
