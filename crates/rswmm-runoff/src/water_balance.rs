//! Water balance of a subcatchment over one step
//!
//! Drives the sub-area solver for every sub-area with area outside the LID
//! footprint, adds the LID units as a fourth flow path and feeds pervious
//! losses to the groundwater model. The area weighted volumes are returned
//! for the washoff computation rather than kept as shared state.
//!
//! Two runoff rates result from a step:
//! - the total runoff generated on the surface (ft/s), which drives washoff
//! - the outflow leaving through the outlet (cfs), which is smaller whenever
//!   runoff is re-routed between sub-areas or captured by LID units

use rswmm_core::errors::RunoffResult;
use rswmm_core::units::{FloatValue, Time};
use serde::{Deserialize, Serialize};

use crate::collaborators::{Externals, StepStatistics};
use crate::parameters::RunoffSettings;
use crate::subarea::SubAreaKind;
use crate::subcatchment::Subcatchment;

/// Water volumes (ft³) handled by a subcatchment during a step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WaterVolumes {
    /// Ponded water at the start of the step
    pub ponded: FloatValue,
    /// Net precipitation
    pub rain: FloatValue,
    pub evap: FloatValue,
    pub infil: FloatValue,
    /// Water leaving through the outlet
    pub outflow: FloatValue,
    /// Runon from upstream subcatchments
    pub runon: FloatValue,
}

/// Result of advancing a subcatchment's hydrology by one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RunoffStep {
    /// Area averaged runoff generated before internal re-routing (ft/s)
    pub runoff: FloatValue,
    /// Flow leaving through the outlet (cfs)
    pub outflow: FloatValue,
    pub volumes: WaterVolumes,
}

impl Subcatchment {
    /// Compute runoff and the new ponded depths over a step of `t_step` seconds.
    ///
    /// Stores the outlet flow in the new snapshot and posts the step's volumes
    /// to the statistics sink and the ledger. Outflow only reaches the ledger
    /// when it leaves the set of subcatchments.
    pub fn compute_runoff(
        &mut self,
        t_step: Time,
        settings: &RunoffSettings,
        ext: &mut Externals,
    ) -> RunoffResult<RunoffStep> {
        if self.area <= 0.0 {
            self.new.runoff = 0.0;
            return Ok(RunoffStep::default());
        }

        let ponded = self.average_depth(&*ext.lid) * self.area;
        let net_precip = self.net_precipitation(t_step, settings, ext);

        let evap_rate = if ext.evaporation.dry_only && self.rainfall > 0.0 {
            0.0
        } else {
            ext.evaporation.rate
        };
        let groundwater_active = self.groundwater && !settings.ignore_groundwater;
        let non_lid_area = self.non_lid_area();

        let mut runoff = 0.0;
        let mut outflow = 0.0;
        let mut rain_vol = 0.0;
        let mut evap_vol = 0.0;
        let mut infil_vol = 0.0;
        let mut perv_evap_vol = 0.0;

        for kind in SubAreaKind::ALL {
            let i = kind.index();
            let area = non_lid_area * self.subareas[i].f_area;
            if area <= 0.0 {
                continue;
            }

            let infil = if kind.is_impervious() {
                0.0
            } else {
                self.pervious_infiltration(net_precip[i], t_step, groundwater_active, ext)
            };
            let flux = self.subareas[i]
                .solve(net_precip[i], evap_rate, infil, t_step, &settings.solver)
                .map_err(|e| e.in_subcatchment(&self.name))?;

            runoff += self.subareas[i].runoff * area;
            rain_vol += net_precip[i] * t_step * area;
            outflow += flux.outflow * area;
            evap_vol += flux.evap_vol * area;
            infil_vol += flux.infil_vol * area;
            if kind == SubAreaKind::Pervious {
                perv_evap_vol += flux.evap_vol * area;
            }
        }

        if self.lid_area > 0.0 {
            let lid = ext.lid.runoff(self.index, t_step);
            runoff += lid.runoff;
            outflow += lid.outflow;
            evap_vol += lid.evap_vol;
            perv_evap_vol += lid.perv_evap_vol;
            infil_vol += lid.infil_vol;
        }

        if groundwater_active {
            ext.groundwater
                .advance(self.index, perv_evap_vol, infil_vol, t_step);
        }

        let area = self.area;
        self.new.runoff = outflow;
        self.evap_loss = evap_vol / t_step / area;
        self.infil_loss = infil_vol / t_step / area;

        let volumes = WaterVolumes {
            ponded,
            rain: rain_vol,
            evap: evap_vol,
            infil: infil_vol,
            outflow: outflow * t_step,
            runon: self.runon * t_step * area,
        };

        let precip_vol = self.rainfall * t_step * area;
        ext.statistics.record_subcatchment_step(
            self.index,
            &StepStatistics {
                rain_vol: precip_vol,
                runon_vol: volumes.runon,
                evap_vol,
                infil_vol,
                outflow_vol: volumes.outflow,
                outflow_rate: outflow,
            },
        );

        let system_outflow = if self.discharges_to_network() {
            volumes.outflow
        } else {
            0.0
        };
        ext.ledger
            .post_runoff_volumes(precip_vol, evap_vol, infil_vol, system_outflow);

        Ok(RunoffStep {
            runoff: runoff / area,
            outflow,
            volumes,
        })
    }

    /// Infiltration rate of the pervious sub-area, limited by groundwater storage.
    fn pervious_infiltration(
        &self,
        precip: FloatValue,
        t_step: Time,
        groundwater_active: bool,
        ext: &mut Externals,
    ) -> FloatValue {
        let perv = self.subarea(SubAreaKind::Pervious);
        let infil = ext
            .infiltration
            .infiltration(self.index, t_step, precip, perv.inflow, perv.depth);
        if groundwater_active {
            infil.min(ext.groundwater.available_infiltration_volume(self.index) / t_step)
        } else {
            infil
        }
    }
}
