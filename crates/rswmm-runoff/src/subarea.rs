//! Sub-area hydrology
//!
//! Each subcatchment is divided into three sub-areas: impervious area without
//! depression storage, impervious area with depression storage and pervious
//! area. Each is treated as a nonlinear reservoir whose outflow follows
//! Manning's equation once the ponded depth exceeds depression storage.
//!
//! The governing equation over the part of the step with ponded water above
//! storage is:
//! $$ \frac{dd}{dt} = i_x - \alpha (d - d_s)^{5/3} $$
//!
//! Where:
//! - $d$ is the ponded depth (ft)
//! - $d_s$ is the depression storage depth (ft)
//! - $i_x$ is inflow minus evaporation and infiltration losses (ft/s)
//! - $\alpha$ is the routing coefficient $1.49 W \sqrt{S} / (A n)$

use crate::constants::{MANNING_COEFF, MANNING_EXP, ZERO_DEPTH};
use log::trace;
use rswmm_core::errors::RunoffResult;
use rswmm_core::ivp::{solve_ivp, SolverOptions, IVP};
use rswmm_core::units::{FloatValue, Time};
use serde::{Deserialize, Serialize};

/// The three kinds of sub-area found in every subcatchment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubAreaKind {
    ImperviousNoStorage,
    ImperviousWithStorage,
    Pervious,
}

impl SubAreaKind {
    pub const ALL: [SubAreaKind; 3] = [
        SubAreaKind::ImperviousNoStorage,
        SubAreaKind::ImperviousWithStorage,
        SubAreaKind::Pervious,
    ];

    /// Position of the sub-area within a subcatchment's sub-area array.
    pub fn index(self) -> usize {
        match self {
            SubAreaKind::ImperviousNoStorage => 0,
            SubAreaKind::ImperviousWithStorage => 1,
            SubAreaKind::Pervious => 2,
        }
    }

    pub fn is_impervious(self) -> bool {
        !matches!(self, SubAreaKind::Pervious)
    }
}

/// Where a sub-area sends the part of its runoff not going to the outlet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RouteTo {
    #[default]
    Outlet,
    Impervious,
    Pervious,
}

/// Fluxes produced by one sub-area over one step.
///
/// Volumes are per unit area of the sub-area (ft); rates are in ft/s.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SubAreaFlux {
    /// Evaporation and infiltration loss rate
    pub losses: FloatValue,
    /// Runoff rate leaving through the subcatchment outlet
    pub outflow: FloatValue,
    pub evap_vol: FloatValue,
    pub infil_vol: FloatValue,
    /// Runoff depth leaving through the subcatchment outlet
    pub outflow_vol: FloatValue,
}

/// A homogeneous runoff-generating zone of a subcatchment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubArea {
    pub kind: SubAreaKind,
    /// Fraction of the subcatchment's non-LID area
    pub f_area: FloatValue,
    /// Manning's roughness; zero means runoff drains without routing
    pub n: FloatValue,
    /// Depression storage (ft)
    pub d_store: FloatValue,
    /// Routing coefficient (1/(ft^2/3 s))
    pub alpha: FloatValue,
    pub route_to: RouteTo,
    /// Fraction of runoff sent to the subcatchment outlet
    pub f_outlet: FloatValue,
    /// Ponded depth (ft)
    pub depth: FloatValue,
    /// Inflow rate from precipitation and runon (ft/s)
    pub inflow: FloatValue,
    /// Runoff rate (ft/s)
    pub runoff: FloatValue,
}

/// Ponded depth ODE for a sub-area with depth above depression storage.
#[derive(Debug, Clone, Copy)]
struct PondedDepthOde {
    alpha: FloatValue,
    d_store: FloatValue,
    excess_inflow: FloatValue,
}

impl IVP for PondedDepthOde {
    fn calculate_dy_dt(&self, _t: Time, depth: FloatValue) -> FloatValue {
        let excess_depth = depth - self.d_store;
        let outflow = if excess_depth < 0.0 {
            0.0
        } else {
            self.alpha * excess_depth.powf(MANNING_EXP)
        };
        self.excess_inflow - outflow
    }
}

impl SubArea {
    pub fn new(kind: SubAreaKind) -> Self {
        Self {
            kind,
            f_area: 0.0,
            n: 0.0,
            d_store: 0.0,
            alpha: 0.0,
            route_to: RouteTo::Outlet,
            f_outlet: 1.0,
            depth: 0.0,
            inflow: 0.0,
            runoff: 0.0,
        }
    }

    /// Recompute the routing coefficient.
    ///
    /// `contributing_area` (ft²) is the total impervious area for both impervious
    /// sub-areas and the pervious area for the pervious sub-area, excluding LIDs.
    pub fn update_alpha(
        &mut self,
        width: FloatValue,
        slope: FloatValue,
        contributing_area: FloatValue,
    ) {
        self.alpha = if contributing_area > 0.0 && self.n > 0.0 {
            MANNING_COEFF * width / contributing_area * slope.sqrt() / self.n
        } else {
            0.0
        };
    }

    pub fn reset_state(&mut self) {
        self.depth = 0.0;
        self.inflow = 0.0;
        self.runoff = 0.0;
    }

    /// Advance the ponded depth over one step and compute the new runoff rate.
    ///
    /// # Arguments
    ///
    /// * `precip` - Net precipitation falling on the sub-area (ft/s)
    /// * `evap` - Evaporation rate ceiling (ft/s)
    /// * `infil` - Potential infiltration rate (ft/s); ignored for impervious sub-areas
    /// * `t_step` - Step length (s)
    /// * `solver` - Tolerances for the ponded depth integration
    pub fn solve(
        &mut self,
        precip: FloatValue,
        evap: FloatValue,
        infil: FloatValue,
        t_step: Time,
        solver: &SolverOptions,
    ) -> RunoffResult<SubAreaFlux> {
        let old_runoff = self.runoff;
        self.runoff = 0.0;

        if self.f_area == 0.0 {
            return Ok(SubAreaFlux::default());
        }

        self.inflow += precip;
        let surf_moisture = self.depth / t_step + self.inflow;
        let surf_evap = evap.min(surf_moisture);
        let mut infil = if self.kind.is_impervious() {
            0.0
        } else {
            infil.max(0.0)
        };

        let mut losses = surf_evap + infil;
        let mut t_runoff = t_step;
        if losses >= surf_moisture {
            // All surface water is consumed
            infil = infil.min(surf_moisture - surf_evap);
            losses = surf_moisture;
            self.depth = 0.0;
        } else {
            t_runoff = self.update_ponded_depth(losses, t_step, solver)?;
        }

        self.find_runoff(t_runoff);

        let mut flux = SubAreaFlux {
            losses,
            evap_vol: surf_evap * t_step,
            infil_vol: infil * t_step,
            ..Default::default()
        };
        if self.f_outlet > 0.0 {
            flux.outflow_vol = 0.5 * (old_runoff + self.runoff) * t_runoff * self.f_outlet;
            flux.outflow = self.f_outlet * self.runoff;
        }

        trace!(
            "{:?}: depth={:.6e} runoff={:.6e} losses={:.6e}",
            self.kind,
            self.depth,
            self.runoff,
            losses
        );
        Ok(flux)
    }

    /// Update the ponded depth given a combined loss rate.
    ///
    /// Returns the part of the step during which depth exceeds depression storage.
    fn update_ponded_depth(
        &mut self,
        losses: FloatValue,
        t_step: Time,
        solver: &SolverOptions,
    ) -> RunoffResult<Time> {
        let excess_inflow = self.inflow - losses;
        let mut tx = t_step;

        if self.depth + excess_inflow * tx <= self.d_store {
            // Depression storage is not filled
            self.depth += excess_inflow * tx;
        } else {
            let unfilled = self.d_store - self.depth;
            if unfilled > 0.0 && excess_inflow > 0.0 {
                tx -= unfilled / excess_inflow;
                self.depth = self.d_store;
            }

            if self.alpha > 0.0 && tx > 0.0 {
                let ode = PondedDepthOde {
                    alpha: self.alpha,
                    d_store: self.d_store,
                    excess_inflow,
                };
                self.depth = solve_ivp(&ode, 0.0, tx, self.depth, solver)?;
            } else {
                tx = tx.max(0.0);
                self.depth += excess_inflow * tx;
            }
        }

        self.depth = self.depth.max(0.0);
        Ok(tx)
    }

    /// Compute the runoff rate from the depth at the end of the step.
    fn find_runoff(&mut self, t_runoff: Time) {
        let excess_depth = self.depth - self.d_store;
        if excess_depth <= ZERO_DEPTH {
            self.runoff = 0.0;
        } else if self.n > 0.0 {
            self.runoff = self.alpha * excess_depth.powf(MANNING_EXP);
        } else if t_runoff > 0.0 {
            // No routing: the excess drains within the step
            self.runoff = excess_depth / t_runoff;
            self.depth = self.d_store;
        }
    }
}
