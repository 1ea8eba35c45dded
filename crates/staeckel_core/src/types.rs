//! Value objects and solver settings.

use serde::{Deserialize, Serialize};

use crate::error::{StaeckelError, StaeckelResult};

/// A phase-space point in cylindrical coordinates (meridional plane plus
/// azimuthal velocity).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhaseSpacePoint {
    pub r: f64,
    pub vr: f64,
    pub vt: f64,
    pub z: f64,
    pub vz: f64,
}

impl PhaseSpacePoint {
    pub fn new(r: f64, vr: f64, vt: f64, z: f64, vz: f64) -> Self {
        Self { r, vr, vt, z, vz }
    }

    pub fn validate(&self) -> StaeckelResult<()> {
        let fields = [self.r, self.vr, self.vt, self.z, self.vz];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(StaeckelError::invalid("point", "all coordinates must be finite"));
        }
        if self.r < 0.0 {
            return Err(StaeckelError::invalid("point", "R must be non-negative"));
        }
        if self.r == 0.0 && self.vt != 0.0 {
            return Err(StaeckelError::invalid(
                "point",
                "azimuthal velocity on the symmetry axis is undefined",
            ));
        }
        Ok(())
    }
}

/// An action together with the quadrature error estimate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub value: f64,
    pub error: f64,
}

impl Action {
    pub fn new(value: f64, error: f64) -> Self {
        Self { value, error }
    }

    /// An action known in closed form.
    pub fn exact(value: f64) -> Self {
        Self { value, error: 0.0 }
    }
}

/// (JR, Lz, Jz) for one phase-space point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActionSet {
    pub jr: Action,
    pub lz: f64,
    pub jz: Action,
}

/// Turning points of the u and v motion. The upper v bound is the mirror
/// `pi - v_min`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurningPoints {
    pub u_min: f64,
    pub u_max: f64,
    pub v_min: f64,
}

impl TurningPoints {
    pub fn v_max(&self) -> f64 {
        std::f64::consts::PI - self.v_min
    }
}

/// Settings for the bracketed root finder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RootSettings {
    pub max_iterations: usize,
    pub x_tolerance: f64,
    pub rel_tolerance: f64,
}

impl Default for RootSettings {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            x_tolerance: 2e-12,
            rel_tolerance: 4.0 * f64::EPSILON,
        }
    }
}

impl RootSettings {
    pub fn validate(&self) -> StaeckelResult<()> {
        if self.max_iterations == 0 {
            return Err(StaeckelError::invalid(
                "root.max_iterations",
                "must be greater than zero",
            ));
        }
        if !(self.x_tolerance > 0.0) {
            return Err(StaeckelError::invalid("root.x_tolerance", "must be positive"));
        }
        if !(self.rel_tolerance >= 0.0) {
            return Err(StaeckelError::invalid(
                "root.rel_tolerance",
                "must be non-negative",
            ));
        }
        Ok(())
    }
}

/// Settings for growing a bracket away from a known interior point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BracketSettings {
    /// Factor applied per step (divided by when searching inward).
    pub growth: f64,
    /// Inward searches that shrink below this return the coordinate boundary.
    pub floor: f64,
    /// Outward searches that pass this without a sign change are unbound.
    pub ceiling: f64,
}

impl Default for BracketSettings {
    fn default() -> Self {
        Self {
            growth: 2.0,
            floor: 1e-9,
            ceiling: 100.0,
        }
    }
}

impl BracketSettings {
    pub fn validate(&self) -> StaeckelResult<()> {
        if !(self.growth > 1.0) {
            return Err(StaeckelError::invalid("bracket.growth", "must exceed 1"));
        }
        if !(self.floor > 0.0) {
            return Err(StaeckelError::invalid("bracket.floor", "must be positive"));
        }
        if !(self.ceiling > self.floor) {
            return Err(StaeckelError::invalid(
                "bracket.ceiling",
                "must exceed bracket.floor",
            ));
        }
        Ok(())
    }
}

/// Settings for locating the turning points of one point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TurningPointSettings {
    /// Offset used to probe either side of the current coordinate.
    pub degeneracy_eps: f64,
    /// Probe values within this distance of zero are treated as zero when
    /// classifying a degenerate (circular or planar) coordinate.
    pub roundoff_band: f64,
    pub bracket: BracketSettings,
    pub root: RootSettings,
}

impl Default for TurningPointSettings {
    fn default() -> Self {
        Self {
            degeneracy_eps: 1e-8,
            roundoff_band: 1e-14,
            bracket: BracketSettings::default(),
            root: RootSettings::default(),
        }
    }
}

impl TurningPointSettings {
    pub fn validate(&self) -> StaeckelResult<()> {
        if !(self.degeneracy_eps > 0.0) {
            return Err(StaeckelError::invalid("degeneracy_eps", "must be positive"));
        }
        if !(self.roundoff_band >= 0.0) {
            return Err(StaeckelError::invalid("roundoff_band", "must be non-negative"));
        }
        self.bracket.validate()?;
        self.root.validate()
    }
}

/// Tolerances forwarded to the adaptive quadrature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadSettings {
    pub abs_tolerance: f64,
    pub rel_tolerance: f64,
    pub max_subdivisions: usize,
}

impl Default for QuadSettings {
    fn default() -> Self {
        Self {
            abs_tolerance: 1.49e-8,
            rel_tolerance: 1.49e-8,
            max_subdivisions: 100,
        }
    }
}

impl QuadSettings {
    pub fn validate(&self) -> StaeckelResult<()> {
        if self.max_subdivisions == 0 {
            return Err(StaeckelError::invalid(
                "quad.max_subdivisions",
                "must be greater than zero",
            ));
        }
        if !(self.abs_tolerance >= 0.0) || !(self.rel_tolerance >= 0.0) {
            return Err(StaeckelError::invalid(
                "quad.tolerance",
                "tolerances must be non-negative",
            ));
        }
        if self.abs_tolerance == 0.0 && self.rel_tolerance == 0.0 {
            return Err(StaeckelError::invalid(
                "quad.tolerance",
                "at least one tolerance must be positive",
            ));
        }
        Ok(())
    }
}
