//! Subcatchment runoff and pollutant washoff for RSWMM
//!
//! This crate advances the surface state of a set of subcatchments over a
//! runoff time step. Rainfall and snowmelt pond on three sub-areas per
//! subcatchment, drain by nonlinear reservoir routing, and carry pollutants
//! washed off the land uses covering each subcatchment.
//!
//! # Module Organisation
//!
//! - `parameters`: configuration structures deserialised from TOML
//! - `catchment`: validation, drainage order and the per-step driver
//! - `subcatchment`, `subarea`: state and the ponded depth integration
//! - `precipitation`, `runon`, `water_balance`: the water side of a step
//! - `quality`, `landuse`: buildup, sweeping and washoff
//! - `results`, `statistics`: reporting
//!
//! Snowmelt, infiltration, groundwater, LID units and rain gages are supplied
//! by the caller through the traits in `collaborators`.

pub mod catchment;
pub mod collaborators;
pub mod constants;
pub mod landuse;
pub mod parameters;
pub mod precipitation;
pub mod quality;
pub mod results;
pub mod runon;
pub mod statistics;
pub mod subarea;
pub mod subcatchment;
pub mod water_balance;

#[cfg(test)]
mod test_utils;

pub use catchment::Catchment;
pub use collaborators::Externals;
pub use parameters::CatchmentParameters;
pub use subcatchment::Subcatchment;
