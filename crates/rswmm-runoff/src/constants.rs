//! Physical and numerical constants for overland flow and washoff.

use rswmm_core::units::FloatValue;

/// Constant in Manning's equation (US customary units)
pub const MANNING_COEFF: FloatValue = 1.49;

/// Exponent in Manning's equation
pub const MANNING_EXP: FloatValue = 1.6666667;

/// Depth (ft) below which an excess depth is treated as zero
pub const ZERO_DEPTH: FloatValue = 1.0e-10;

/// Minimum runoff rate (ft/s) that produces washoff
pub const MIN_RUNOFF: FloatValue = 2.31481e-8;

/// Minimum runoff flow (cfs) that is reported
pub const MIN_RUNOFF_FLOW: FloatValue = 0.001;

/// Snow depth (ft) above which the plowable area cannot be swept
pub const MIN_TOTAL_DEPTH: FloatValue = 0.004167;

/// Snow depth (ft) required for snow-only pollutants to build up
pub const MIN_SNOW_ONLY_DEPTH: FloatValue = 0.001 / 12.0;
