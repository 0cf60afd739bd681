//! Internal unit conventions.
//!
//! All state inside the kernel is held in a single internal system:
//!
//! | Quantity       | Unit                        |
//! |----------------|-----------------------------|
//! | length, depth  | ft                          |
//! | area           | ft²                         |
//! | time step      | s                           |
//! | rates          | ft/s                        |
//! | flow           | cfs                         |
//! | dates          | decimal days                |
//! | pollutant mass | concentration units × litre |
//!
//! Converting inputs into this system and results out of it is the job of the
//! surrounding model. The only user-unit quantities that cross the boundary are
//! those consumed by land-use functions (land area, rainfall intensity, flow).

use serde::{Deserialize, Serialize};

/// Floating point type used throughout the kernel.
pub type FloatValue = f64;

/// Elapsed time in seconds.
pub type Time = FloatValue;

/// Calendar date expressed in decimal days.
pub type DateTime = FloatValue;

/// Litres per cubic foot.
pub const LITERS_PER_FT3: FloatValue = 28.317;

/// Seconds per day.
pub const SECONDS_PER_DAY: FloatValue = 86400.0;

/// Square feet per acre.
const FT2_PER_ACRE: FloatValue = 43560.0;

/// Square feet per hectare.
const FT2_PER_HECTARE: FloatValue = 107_639.104;

/// System of units in which user-facing land-use coefficients are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnitSystem {
    /// Acres, inches per hour, cfs.
    #[default]
    US,
    /// Hectares, millimetres per hour, cms.
    SI,
}

impl UnitSystem {
    /// Factor converting ft² into acres (US) or hectares (SI).
    pub fn land_area_factor(&self) -> FloatValue {
        match self {
            UnitSystem::US => 1.0 / FT2_PER_ACRE,
            UnitSystem::SI => 1.0 / FT2_PER_HECTARE,
        }
    }

    /// Factor converting ft/s into in/hr (US) or mm/hr (SI).
    pub fn rainfall_factor(&self) -> FloatValue {
        match self {
            UnitSystem::US => 43200.0,
            UnitSystem::SI => 1_097_280.0,
        }
    }

    /// Factor converting cfs into cfs (US) or cms (SI).
    pub fn flow_factor(&self) -> FloatValue {
        match self {
            UnitSystem::US => 1.0,
            UnitSystem::SI => 0.028_316_85,
        }
    }
}
