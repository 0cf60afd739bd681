//! Subcatchment state
//!
//! A subcatchment holds its three sub-areas, the buildup on each of its land
//! uses and a pair of snapshots of its outlet state. The `old` snapshot is the
//! state at the start of the current step and is only read during the step;
//! the `new` snapshot is written by the step's computations. The pair is
//! swapped once per step by [`Subcatchment::commit_old_state`].
//!
//! The per-step computations are spread over the sibling modules:
//! [`crate::precipitation`], [`crate::runon`], [`crate::water_balance`],
//! [`crate::quality`] and [`crate::results`].

use log::debug;
use rswmm_core::units::{DateTime, FloatValue};
use serde::{Deserialize, Serialize};

use crate::collaborators::{LanduseModel, LidModel};
use crate::parameters::QualityParameters;
use crate::subarea::{SubArea, SubAreaKind};

/// Object receiving a subcatchment's runoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outlet {
    /// A node of the conveyance network
    Node(usize),
    /// Another subcatchment, or the subcatchment itself
    Subcatchment(usize),
}

/// Buildup state of one land use within a subcatchment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandFactor {
    /// Fraction of the subcatchment covered by the land use
    pub fraction: FloatValue,
    /// Buildup of each pollutant (reporting mass units)
    pub buildup: Vec<FloatValue>,
    /// Date the land use was last swept (days)
    pub last_swept: DateTime,
}

impl LandFactor {
    pub fn new(fraction: FloatValue, n_pollutants: usize) -> Self {
        Self {
            fraction,
            buildup: vec![0.0; n_pollutants],
            last_swept: 0.0,
        }
    }
}

/// Outlet state at one end of a time step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Runoff leaving through the outlet (cfs)
    pub runoff: FloatValue,
    /// Snow depth (ft)
    pub snow_depth: FloatValue,
    /// Concentration of each pollutant in the outflow (mass/L)
    pub quality: Vec<FloatValue>,
}

impl Snapshot {
    fn new(n_pollutants: usize) -> Self {
        Self {
            quality: vec![0.0; n_pollutants],
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subcatchment {
    pub name: String,
    /// Position within the owning catchment
    pub index: usize,
    pub gage: Option<usize>,
    pub outlet: Option<Outlet>,
    /// Area (ft²)
    pub area: FloatValue,
    pub frac_imperv: FloatValue,
    /// Overland flow width (ft)
    pub width: FloatValue,
    /// Slope (ft/ft)
    pub slope: FloatValue,
    /// Curb length (user units)
    pub curb_length: FloatValue,
    pub snowpack: bool,
    pub groundwater: bool,
    /// Area occupied by LID units (ft²)
    pub lid_area: FloatValue,
    pub subareas: [SubArea; 3],
    pub land_factors: Vec<LandFactor>,
    /// Initial buildup of each pollutant per unit land area
    pub initial_buildup: Vec<FloatValue>,
    /// Cumulative runoff load of each pollutant (reporting mass units)
    pub total_load: Vec<FloatValue>,

    pub old: Snapshot,
    pub new: Snapshot,
    /// Rain plus snowfall (ft/s)
    pub rainfall: FloatValue,
    /// Runon from upstream subcatchments (ft/s)
    pub runon: FloatValue,
    /// Evaporation loss rate (ft/s)
    pub evap_loss: FloatValue,
    /// Infiltration loss rate (ft/s)
    pub infil_loss: FloatValue,
    /// Pollutant mass held in ponded water (internal mass)
    pub ponded_quality: Vec<FloatValue>,
    pub(crate) runon_routed: bool,
}

impl Subcatchment {
    pub fn new(name: &str, index: usize, n_pollutants: usize, n_landuses: usize) -> Self {
        Self {
            name: name.to_string(),
            index,
            gage: None,
            outlet: None,
            area: 0.0,
            frac_imperv: 0.0,
            width: 0.0,
            slope: 0.0,
            curb_length: 0.0,
            snowpack: false,
            groundwater: false,
            lid_area: 0.0,
            subareas: SubAreaKind::ALL.map(SubArea::new),
            land_factors: vec![LandFactor::new(0.0, n_pollutants); n_landuses],
            initial_buildup: vec![0.0; n_pollutants],
            total_load: vec![0.0; n_pollutants],
            old: Snapshot::new(n_pollutants),
            new: Snapshot::new(n_pollutants),
            rainfall: 0.0,
            runon: 0.0,
            evap_loss: 0.0,
            infil_loss: 0.0,
            ponded_quality: vec![0.0; n_pollutants],
            runon_routed: false,
        }
    }

    pub fn n_pollutants(&self) -> usize {
        self.ponded_quality.len()
    }

    pub fn subarea(&self, kind: SubAreaKind) -> &SubArea {
        &self.subareas[kind.index()]
    }

    pub fn subarea_mut(&mut self, kind: SubAreaKind) -> &mut SubArea {
        &mut self.subareas[kind.index()]
    }

    /// Area not occupied by LID units (ft²).
    pub fn non_lid_area(&self) -> FloatValue {
        self.area - self.lid_area
    }

    /// Recompute each sub-area's routing coefficient.
    ///
    /// Both impervious sub-areas use the total impervious area.
    pub fn recompute_alpha(&mut self) {
        let non_lid_area = self.non_lid_area();
        let imperv_area = self.frac_imperv * non_lid_area;
        let perv_area = (1.0 - self.frac_imperv) * non_lid_area;
        let (width, slope) = (self.width, self.slope);
        for sa in self.subareas.iter_mut() {
            let contributing = if sa.kind.is_impervious() {
                imperv_area
            } else {
                perv_area
            };
            sa.update_alpha(width, slope, contributing);
        }
    }

    /// Change the area occupied by LID units and update the routing coefficients.
    pub fn set_lid_area(&mut self, lid_area: FloatValue) {
        debug!(
            "Subcatchment '{}': LID area {} -> {}",
            self.name, self.lid_area, lid_area
        );
        self.lid_area = lid_area.clamp(0.0, self.area);
        self.recompute_alpha();
    }

    /// Whether the outflow leaves the set of subcatchments.
    ///
    /// True for a node outlet and for a subcatchment draining to itself.
    pub fn discharges_to_network(&self) -> bool {
        match self.outlet {
            Some(Outlet::Node(_)) => true,
            Some(Outlet::Subcatchment(k)) => k == self.index,
            None => false,
        }
    }

    /// Index of a downstream subcatchment receiving runon, if any.
    pub fn outlet_subcatchment(&self) -> Option<usize> {
        match self.outlet {
            Some(Outlet::Subcatchment(k)) if k != self.index => Some(k),
            _ => None,
        }
    }

    /// Reset the state at the start of a simulation.
    ///
    /// Buildup is initialised from the subcatchment's initial loads and
    /// each land use's last-swept date from its days since sweeping.
    pub fn init_state(
        &mut self,
        start_date: DateTime,
        quality: &QualityParameters,
        land_area_factor: FloatValue,
        landuse: &dyn LanduseModel,
    ) {
        let n_pollutants = self.n_pollutants();
        self.rainfall = 0.0;
        self.runon = 0.0;
        self.evap_loss = 0.0;
        self.infil_loss = 0.0;
        self.old = Snapshot::new(n_pollutants);
        self.new = Snapshot::new(n_pollutants);
        self.ponded_quality = vec![0.0; n_pollutants];
        self.total_load = vec![0.0; n_pollutants];
        self.runon_routed = false;

        for sa in self.subareas.iter_mut() {
            sa.reset_state();
        }

        for (i, factor) in self.land_factors.iter_mut().enumerate() {
            factor.buildup = vec![0.0; n_pollutants];
            let days_since_swept = quality
                .landuses
                .get(i)
                .map(|l| l.days_since_swept)
                .unwrap_or(0.0);
            factor.last_swept = start_date - days_since_swept;
        }
        landuse.initial_buildup(
            &mut self.land_factors,
            &self.initial_buildup,
            self.area * land_area_factor,
            self.curb_length,
        );
    }

    /// Make the state computed during the last step the starting state of the next.
    ///
    /// The new quality becomes the accumulator for pollutant mass routed in
    /// from upstream subcatchments, and all inflows are cleared.
    pub fn commit_old_state(&mut self) {
        self.old.runoff = self.new.runoff;
        self.old.snow_depth = self.new.snow_depth;
        self.old.quality.clone_from(&self.new.quality);
        self.new.quality.iter_mut().for_each(|q| *q = 0.0);
        for sa in self.subareas.iter_mut() {
            sa.inflow = 0.0;
        }
        self.runon = 0.0;
        self.runon_routed = false;
    }

    /// Fraction of the total area, including LID units, that is pervious.
    pub fn pervious_fraction(&self, lid: &dyn LidModel) -> FloatValue {
        let frac_perv = 1.0 - self.frac_imperv;
        if self.lid_area > 0.0 {
            let perv = frac_perv * self.non_lid_area() + lid.pervious_area(self.index);
            (perv / self.area).min(1.0)
        } else {
            frac_perv
        }
    }

    /// Volume of water (ft³) stored on the surface and in LID units.
    pub fn storage_volume(&self, lid: &dyn LidModel) -> FloatValue {
        let depth: FloatValue = self.subareas.iter().map(|sa| sa.depth * sa.f_area).sum();
        depth * self.non_lid_area() + lid.stored_volume(self.index)
    }

    /// Average depth (ft) of ponded water over the whole subcatchment.
    pub fn average_depth(&self, lid: &dyn LidModel) -> FloatValue {
        let depth: FloatValue = self
            .subareas
            .iter()
            .filter(|sa| sa.f_area > 0.0)
            .map(|sa| sa.depth * sa.f_area)
            .sum();
        if self.lid_area > 0.0 {
            (depth * self.non_lid_area() + lid.surface_depth(self.index) * self.lid_area)
                / self.area
        } else {
            depth
        }
    }
}
