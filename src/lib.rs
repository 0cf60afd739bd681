//! RSWMM: the surface runoff kernel of a stormwater management model.
//!
//! Re-exports the workspace crates under a single name.

pub use rswmm_core;
pub use rswmm_runoff;
pub use rswmm_runoff::{Catchment, CatchmentParameters, Externals};
