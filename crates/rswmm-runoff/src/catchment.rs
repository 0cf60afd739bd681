//! A set of subcatchments advanced together.
//!
//! The catchment is built from [`CatchmentParameters`], which resolves names
//! into indices and validates every numeric input. Subcatchments draining into
//! other subcatchments form a graph which determines the order in which they
//! are processed within a step.

use log::{info, warn};
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use rswmm_core::errors::{RunoffError, RunoffResult};
use rswmm_core::units::{DateTime, FloatValue, Time};

use crate::collaborators::{Externals, LanduseModel, LidModel};
use crate::parameters::{
    CatchmentParameters, QualityParameters, RunoffSettings, SubcatchmentParameters,
};
use crate::subarea::{RouteTo, SubAreaKind};
use crate::subcatchment::{Outlet, Subcatchment};

fn check_number(object: &str, field: &str, value: FloatValue) -> RunoffResult<FloatValue> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(RunoffError::InvalidNumber {
            object: object.to_string(),
            field: field.to_string(),
            value,
        })
    }
}

/// Convert a percentage into a fraction.
fn check_percent(object: &str, field: &str, value: FloatValue) -> RunoffResult<FloatValue> {
    if (0.0..=100.0).contains(&value) {
        Ok(value / 100.0)
    } else {
        Err(RunoffError::PercentOutOfRange {
            object: object.to_string(),
            field: field.to_string(),
            value,
        })
    }
}

fn find_name(
    names: &[String],
    kind: &str,
    name: &str,
    referenced_by: &str,
) -> RunoffResult<usize> {
    names
        .iter()
        .position(|n| n == name)
        .ok_or_else(|| RunoffError::MissingObject {
            kind: kind.to_string(),
            name: name.to_string(),
            referenced_by: referenced_by.to_string(),
        })
}

#[derive(Debug, Clone)]
pub struct Catchment {
    pub subcatchments: Vec<Subcatchment>,
    pub settings: RunoffSettings,
    pub quality: QualityParameters,
    /// Subcatchment to subcatchment drainage
    drainage: DiGraph<usize, ()>,
    /// Upstream subcatchments first
    order: Vec<usize>,
}

impl Catchment {
    pub fn from_parameters(parameters: &CatchmentParameters) -> RunoffResult<Self> {
        let quality = &parameters.quality;
        for pollutant in quality.pollutants.iter() {
            if !(pollutant.mass_factor.is_finite() && pollutant.mass_factor > 0.0) {
                return Err(RunoffError::InvalidNumber {
                    object: pollutant.name.clone(),
                    field: "mass_factor".to_string(),
                    value: pollutant.mass_factor,
                });
            }
            check_number(&pollutant.name, "rain_concentration", pollutant.rain_concentration)?;
        }

        let names: Vec<String> = parameters
            .subcatchments
            .iter()
            .map(|s| s.name.clone())
            .collect();

        let subcatchments = parameters
            .subcatchments
            .iter()
            .enumerate()
            .map(|(j, p)| Self::build_subcatchment(j, p, parameters, &names))
            .collect::<RunoffResult<Vec<_>>>()?;

        let mut drainage = DiGraph::new();
        let nodes: Vec<NodeIndex> = (0..subcatchments.len())
            .map(|j| drainage.add_node(j))
            .collect();
        for s in subcatchments.iter() {
            if let Some(k) = s.outlet_subcatchment() {
                drainage.add_edge(nodes[s.index], nodes[k], ());
            }
        }

        let order = match toposort(&drainage, None) {
            Ok(sorted) => sorted.into_iter().map(|n| drainage[n]).collect(),
            Err(cycle) => {
                warn!(
                    "Subcatchment drainage contains a cycle through '{}'; \
                     runon will be counted more than once",
                    subcatchments[drainage[cycle.node_id()]].name
                );
                (0..subcatchments.len()).collect()
            }
        };

        info!(
            "Built catchment with {} subcatchments, {} pollutants and {} land uses",
            subcatchments.len(),
            quality.n_pollutants(),
            quality.n_landuses()
        );

        Ok(Self {
            subcatchments,
            settings: parameters.settings.clone(),
            quality: quality.clone(),
            drainage,
            order,
        })
    }

    pub fn from_toml_str(source: &str) -> RunoffResult<Self> {
        Self::from_parameters(&CatchmentParameters::from_toml_str(source)?)
    }

    fn build_subcatchment(
        j: usize,
        p: &SubcatchmentParameters,
        parameters: &CatchmentParameters,
        names: &[String],
    ) -> RunoffResult<Subcatchment> {
        let name = p.name.as_str();
        let quality = &parameters.quality;
        let mut s = Subcatchment::new(name, j, quality.n_pollutants(), quality.n_landuses());

        s.gage = p
            .gage
            .as_deref()
            .map(|g| find_name(&parameters.gages, "rain gage", g, name))
            .transpose()?;
        s.outlet = match (&p.outlet_node, &p.outlet_subcatchment) {
            (Some(_), Some(_)) => return Err(RunoffError::AmbiguousOutlet(name.to_string())),
            (Some(node), None) => Some(Outlet::Node(find_name(
                &parameters.nodes,
                "node",
                node,
                name,
            )?)),
            (None, Some(outlet)) => Some(Outlet::Subcatchment(find_name(
                names,
                "subcatchment",
                outlet,
                name,
            )?)),
            (None, None) => None,
        };

        s.area = check_number(name, "area", p.area)?;
        s.frac_imperv = check_percent(name, "percent_impervious", p.percent_impervious)?;
        s.width = check_number(name, "width", p.width)?;
        s.slope = check_number(name, "percent_slope", p.percent_slope)? / 100.0;
        s.curb_length = check_number(name, "curb_length", p.curb_length)?;
        s.snowpack = p.snowpack;
        s.groundwater = p.groundwater;

        let lid_area = check_number(name, "lid_area", p.lid_area)?;
        if lid_area > s.area {
            return Err(RunoffError::LidAreaExceedsArea {
                subcatchment: name.to_string(),
                lid_area,
                area: s.area,
            });
        }
        s.lid_area = lid_area;

        let sp = &p.subareas;
        let n_imperv = check_number(name, "n_impervious", sp.n_impervious)?;
        let n_perv = check_number(name, "n_pervious", sp.n_pervious)?;
        let storage_imperv = check_number(name, "storage_impervious", sp.storage_impervious)?;
        let storage_perv = check_number(name, "storage_pervious", sp.storage_pervious)?;
        let frac_zero = check_percent(name, "percent_zero_storage", sp.percent_zero_storage)?;
        let frac_routed = check_percent(name, "percent_routed", sp.percent_routed)?;

        let frac_imperv = s.frac_imperv;
        for sa in s.subareas.iter_mut() {
            let (n, d_store, f_area) = match sa.kind {
                SubAreaKind::ImperviousNoStorage => (n_imperv, 0.0, frac_imperv * frac_zero),
                SubAreaKind::ImperviousWithStorage => {
                    (n_imperv, storage_imperv, frac_imperv * (1.0 - frac_zero))
                }
                SubAreaKind::Pervious => (n_perv, storage_perv, 1.0 - frac_imperv),
            };
            sa.n = n;
            sa.d_store = d_store;
            sa.f_area = f_area;
            sa.route_to = RouteTo::Outlet;
            sa.f_outlet = 1.0;
        }

        // Internal routing needs both pervious and impervious area
        let route_to = if frac_imperv == 0.0 || frac_imperv == 1.0 {
            RouteTo::Outlet
        } else {
            sp.route_to
        };
        match route_to {
            RouteTo::Outlet => {}
            RouteTo::Impervious => {
                let perv = s.subarea_mut(SubAreaKind::Pervious);
                perv.route_to = RouteTo::Impervious;
                perv.f_outlet = 1.0 - frac_routed;
            }
            RouteTo::Pervious => {
                for kind in [SubAreaKind::ImperviousNoStorage, SubAreaKind::ImperviousWithStorage] {
                    let sa = s.subarea_mut(kind);
                    sa.route_to = RouteTo::Pervious;
                    sa.f_outlet = 1.0 - frac_routed;
                }
            }
        }

        for assignment in p.landuses.iter() {
            let i = quality
                .find_landuse(&assignment.landuse)
                .ok_or_else(|| RunoffError::MissingObject {
                    kind: "land use".to_string(),
                    name: assignment.landuse.clone(),
                    referenced_by: name.to_string(),
                })?;
            s.land_factors[i].fraction =
                check_percent(name, "landuse percent", assignment.percent)?;
        }

        for initial in p.initial_buildup.iter() {
            let k = quality
                .find_pollutant(&initial.pollutant)
                .ok_or_else(|| RunoffError::MissingObject {
                    kind: "pollutant".to_string(),
                    name: initial.pollutant.clone(),
                    referenced_by: name.to_string(),
                })?;
            s.initial_buildup[k] = check_number(name, "initial buildup", initial.load)?;
        }

        s.recompute_alpha();
        Ok(s)
    }

    pub fn n_subcatchments(&self) -> usize {
        self.subcatchments.len()
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.subcatchments.iter().position(|s| s.name == name)
    }

    pub fn subcatchment(&self, name: &str) -> Option<&Subcatchment> {
        self.find(name).map(|j| &self.subcatchments[j])
    }

    /// Subcatchments ordered so that each comes before those it drains to.
    pub fn drainage_order(&self) -> &[usize] {
        &self.order
    }

    /// Subcatchments draining directly into subcatchment `j`.
    pub fn upstream_of(&self, j: usize) -> Vec<usize> {
        self.drainage
            .neighbors_directed(NodeIndex::new(j), petgraph::Direction::Incoming)
            .map(|n| self.drainage[n])
            .collect()
    }

    /// Reset every subcatchment at the start of a simulation.
    pub fn init_state(&mut self, start_date: DateTime, landuse: &dyn LanduseModel) {
        let land_area_factor = self.settings.units.land_area_factor();
        for s in self.subcatchments.iter_mut() {
            s.init_state(start_date, &self.quality, land_area_factor, landuse);
        }
    }

    pub fn commit_old_state(&mut self) {
        for s in self.subcatchments.iter_mut() {
            s.commit_old_state();
        }
    }

    /// Total water stored on subcatchment surfaces and in LID units (ft³).
    pub fn storage_volume(&self, lid: &dyn LidModel) -> FloatValue {
        self.subcatchments
            .iter()
            .map(|s| s.storage_volume(lid))
            .sum()
    }

    /// Advance every subcatchment by one step ending at `date` (days).
    pub fn run_step(
        &mut self,
        t_step: Time,
        date: DateTime,
        ext: &mut Externals,
    ) -> RunoffResult<()> {
        self.commit_old_state();
        self.route_all_runon(&*ext.lid);

        let with_quality = !self.settings.ignore_quality && self.quality.n_pollutants() > 0;
        for &j in self.order.iter() {
            let s = &mut self.subcatchments[j];
            let step = s.compute_runoff(t_step, &self.settings, ext)?;
            if with_quality {
                s.compute_buildup(t_step, &self.quality, &self.settings, ext);
                s.apply_sweeping(date, &self.quality, ext);
                s.compute_washoff(&step, t_step, &self.quality, ext);
            } else {
                // Discard routed mass so it is not carried as a concentration
                s.new.quality.iter_mut().for_each(|c| *c = 0.0);
            }
        }
        Ok(())
    }
}
