//! Parameters for the interpolation engine

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::InterpStrategy;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Interpolation engine parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Params {
    /// The interpolation strategy to use.
    pub strategy: InterpStrategy,

    /// Offset added to the interpolated shoulder angle.
    ///
    /// Units: degrees
    pub shoulder_offset_deg: i32,

    /// Offset added to the interpolated elbow angle.
    ///
    /// Units: degrees
    pub elbow_offset_deg: i32,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            strategy: InterpStrategy::SixPointLinear,
            shoulder_offset_deg: 0,
            elbow_offset_deg: 0,
        }
    }
}
