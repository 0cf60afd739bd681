//! Core types shared by the rswmm runoff components.
//!
//! - [`errors`]: the error type returned by configuration and runtime operations
//! - [`units`]: internal unit conventions and user-unit conversion factors
//! - [`ivp`]: adaptive integration of single-state initial value problems
//! - [`ledger`]: global water and pollutant conservation accounting

pub mod errors;
pub mod ivp;
pub mod ledger;
pub mod units;
