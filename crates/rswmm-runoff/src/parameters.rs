//! Runoff configuration
//!
//! Parameter structures describing subcatchments, land uses and pollutants.
//! They are deserialised from TOML and resolved into a [`crate::Catchment`]
//! which performs the validation.
//!
//! Lengths are in ft, areas in ft² and slopes and percentages are unitless.
//!
//! # Example
//!
//! ```toml
//! nodes = ["J1"]
//! gages = ["RG1"]
//!
//! [[subcatchments]]
//! name = "S1"
//! gage = "RG1"
//! outlet_node = "J1"
//! area = 43560.0
//! percent_impervious = 50.0
//! width = 100.0
//! percent_slope = 1.0
//!
//! [subcatchments.subareas]
//! n_impervious = 0.015
//! n_pervious = 0.1
//! storage_impervious = 0.005
//! storage_pervious = 0.01
//! percent_zero_storage = 25.0
//! ```

use rswmm_core::errors::RunoffResult;
use rswmm_core::ivp::SolverOptions;
use rswmm_core::units::{FloatValue, UnitSystem};
use serde::{Deserialize, Serialize};

use crate::subarea::RouteTo;

/// Global switches and numerical settings for the runoff kernel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunoffSettings {
    /// Treat snowpacks as absent
    pub ignore_snowmelt: bool,
    /// Treat groundwater objects as absent
    pub ignore_groundwater: bool,
    /// Skip reporting of pollutant concentrations
    pub ignore_quality: bool,
    /// Tolerances for the ponded depth integration
    pub solver: SolverOptions,
    /// Units of user-facing land-use coefficients
    pub units: UnitSystem,
}

/// Sub-area properties of a subcatchment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubareaParameters {
    /// Manning's n of the impervious area
    pub n_impervious: FloatValue,
    /// Manning's n of the pervious area
    pub n_pervious: FloatValue,
    /// Depression storage of the impervious area (ft)
    pub storage_impervious: FloatValue,
    /// Depression storage of the pervious area (ft)
    pub storage_pervious: FloatValue,
    /// Percent of impervious area without depression storage
    pub percent_zero_storage: FloatValue,
    /// Internal routing of runoff between sub-areas
    pub route_to: RouteTo,
    /// Percent of runoff routed between sub-areas
    pub percent_routed: FloatValue,
}

impl Default for SubareaParameters {
    fn default() -> Self {
        Self {
            n_impervious: 0.0,
            n_pervious: 0.0,
            storage_impervious: 0.0,
            storage_pervious: 0.0,
            percent_zero_storage: 0.0,
            route_to: RouteTo::Outlet,
            percent_routed: 100.0,
        }
    }
}

/// Share of a subcatchment covered by a land use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanduseAssignment {
    pub landuse: String,
    pub percent: FloatValue,
}

/// Initial buildup of a pollutant on a subcatchment (mass per unit land area).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialBuildup {
    pub pollutant: String,
    pub load: FloatValue,
}

/// A subcatchment as described in a configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubcatchmentParameters {
    pub name: String,
    /// Rain gage supplying precipitation
    pub gage: Option<String>,
    /// Conveyance node receiving runoff
    pub outlet_node: Option<String>,
    /// Subcatchment receiving runoff
    pub outlet_subcatchment: Option<String>,
    /// Area (ft²)
    pub area: FloatValue,
    pub percent_impervious: FloatValue,
    /// Characteristic width of overland flow (ft)
    pub width: FloatValue,
    pub percent_slope: FloatValue,
    /// Total curb length (user units)
    pub curb_length: FloatValue,
    pub snowpack: bool,
    pub groundwater: bool,
    /// Area occupied by LID units (ft²)
    pub lid_area: FloatValue,
    pub subareas: SubareaParameters,
    pub landuses: Vec<LanduseAssignment>,
    pub initial_buildup: Vec<InitialBuildup>,
}

impl Default for SubcatchmentParameters {
    fn default() -> Self {
        Self {
            name: String::new(),
            gage: None,
            outlet_node: None,
            outlet_subcatchment: None,
            area: 0.0,
            percent_impervious: 0.0,
            width: 0.0,
            percent_slope: 0.0,
            curb_length: 0.0,
            snowpack: false,
            groundwater: false,
            lid_area: 0.0,
            subareas: SubareaParameters::default(),
            landuses: vec![],
            initial_buildup: vec![],
        }
    }
}

/// A pollutant carried by runoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollutantParameters {
    pub name: String,
    /// Converts internal mass (concentration units × litres) into reporting mass
    pub mass_factor: FloatValue,
    /// Concentration in rainfall
    pub rain_concentration: FloatValue,
    /// Builds up only while snow is present
    pub snow_only: bool,
    /// Pollutant whose washoff generates this one
    pub co_pollutant: Option<String>,
    /// Fraction of the co-pollutant's washoff added to this pollutant
    pub co_fraction: FloatValue,
}

impl Default for PollutantParameters {
    fn default() -> Self {
        Self {
            name: String::new(),
            mass_factor: 1.0e-6,
            rain_concentration: 0.0,
            snow_only: false,
            co_pollutant: None,
            co_fraction: 0.0,
        }
    }
}

/// Buildup function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BuildupKind {
    #[default]
    None,
    /// `B = min(C1, C2 t^C3)`
    Power,
    /// `B = C1 (1 - exp(-C2 t))`
    Exponential,
    /// `B = C1 t / (C3 + t)`
    Saturation,
}

/// Quantity buildup is normalised by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Normalizer {
    #[default]
    Area,
    CurbLength,
}

/// Buildup of one pollutant on one land use.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildupFunction {
    pub kind: BuildupKind,
    pub normalizer: Normalizer,
    /// C1, C2, C3 of the buildup equation
    pub coefficients: [FloatValue; 3],
    /// Days after which buildup stops growing (0 = no limit)
    pub max_days: FloatValue,
}

/// Washoff function types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WashoffKind {
    #[default]
    None,
    /// Rate proportional to buildup and a power of runoff intensity
    Exponential,
    /// Rate as a power of runoff flow
    RatingCurve,
    /// Constant event mean concentration
    EventMean,
}

/// Washoff of one pollutant from one land use.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WashoffFunction {
    pub kind: WashoffKind,
    pub coefficient: FloatValue,
    pub exponent: FloatValue,
    /// Fraction of available buildup removed by sweeping
    pub sweep_efficiency: FloatValue,
    /// Fraction of outflow load removed by BMPs
    pub bmp_efficiency: FloatValue,
}

/// A land use with its sweeping schedule and per-pollutant functions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanduseParameters {
    pub name: String,
    /// Days between street sweepings (0 = never swept)
    pub sweep_interval: FloatValue,
    /// Fraction of buildup available for removal by sweeping
    pub sweep_removal: FloatValue,
    /// Days since last sweeping at the start of the simulation
    pub days_since_swept: FloatValue,
    /// Buildup functions indexed by pollutant
    pub buildup: Vec<BuildupFunction>,
    /// Washoff functions indexed by pollutant
    pub washoff: Vec<WashoffFunction>,
}

impl LanduseParameters {
    /// Sweeping efficiency for a pollutant, zero when not configured.
    pub fn sweep_efficiency(&self, pollutant: usize) -> FloatValue {
        self.washoff
            .get(pollutant)
            .map(|w| w.sweep_efficiency)
            .unwrap_or(0.0)
    }
}

/// Pollutants and land uses shared by all subcatchments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityParameters {
    pub pollutants: Vec<PollutantParameters>,
    pub landuses: Vec<LanduseParameters>,
}

impl QualityParameters {
    pub fn n_pollutants(&self) -> usize {
        self.pollutants.len()
    }

    pub fn n_landuses(&self) -> usize {
        self.landuses.len()
    }

    pub fn find_pollutant(&self, name: &str) -> Option<usize> {
        self.pollutants.iter().position(|p| p.name == name)
    }

    pub fn find_landuse(&self, name: &str) -> Option<usize> {
        self.landuses.iter().position(|l| l.name == name)
    }
}

/// Complete description of a set of subcatchments.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatchmentParameters {
    pub settings: RunoffSettings,
    /// Names of conveyance nodes subcatchments may drain to
    pub nodes: Vec<String>,
    /// Names of rain gages
    pub gages: Vec<String>,
    #[serde(flatten)]
    pub quality: QualityParameters,
    pub subcatchments: Vec<SubcatchmentParameters>,
}

impl CatchmentParameters {
    /// Parse parameters from a TOML document.
    pub fn from_toml_str(source: &str) -> RunoffResult<Self> {
        Ok(toml::from_str(source)?)
    }
}
