//! Prolate confocal coordinates.
//!
//! R = delta sinh(u) sin(v), z = delta cosh(u) cos(v), with u >= 0 and
//! v in [0, pi]. The midplane z = 0 is v = pi/2.

use nalgebra::{Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use crate::error::{StaeckelError, StaeckelResult};

/// Converts cylindrical (R, z) to confocal (u, v).
pub fn rz_to_uv(r: f64, z: f64, delta: f64) -> (f64, f64) {
    let d1 = (z + delta).hypot(r);
    let d2 = (z - delta).hypot(r);
    let cosh_u = ((d1 + d2) / (2.0 * delta)).max(1.0);
    let cos_v = ((d1 - d2) / (2.0 * delta)).clamp(-1.0, 1.0);
    (cosh_u.acosh(), cos_v.acos())
}

/// Converts confocal (u, v) to cylindrical (R, z).
pub fn uv_to_rz(u: f64, v: f64, delta: f64) -> (f64, f64) {
    (delta * u.sinh() * v.sin(), delta * u.cosh() * v.cos())
}

/// A point in confocal coordinates with its hyperbolic and trigonometric
/// factors evaluated once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfocalPoint {
    pub u: f64,
    pub v: f64,
    pub sinh_u: f64,
    pub cosh_u: f64,
    pub sin_v: f64,
    pub cos_v: f64,
}

impl ConfocalPoint {
    pub fn new(u: f64, v: f64) -> Self {
        Self {
            u,
            v,
            sinh_u: u.sinh(),
            cosh_u: u.cosh(),
            sin_v: v.sin(),
            cos_v: v.cos(),
        }
    }

    pub fn from_cylindrical(r: f64, z: f64, delta: f64) -> Self {
        let (u, v) = rz_to_uv(r, z, delta);
        Self::new(u, v)
    }

    pub fn to_cylindrical(&self, delta: f64) -> (f64, f64) {
        (
            delta * self.sinh_u * self.sin_v,
            delta * self.cosh_u * self.cos_v,
        )
    }

    pub fn sinh2_u(&self) -> f64 {
        self.sinh_u * self.sinh_u
    }

    pub fn cosh2_u(&self) -> f64 {
        self.cosh_u * self.cosh_u
    }

    pub fn sin2_v(&self) -> f64 {
        self.sin_v * self.sin_v
    }

    /// Linear map (vR, vz) -> (p_u, p_v).
    fn momentum_map(&self, delta: f64) -> Matrix2<f64> {
        let a = self.cosh_u * self.sin_v;
        let b = self.sinh_u * self.cos_v;
        Matrix2::new(a, b, b, -a) * delta
    }

    /// Canonical momenta conjugate to (u, v) for meridional velocities.
    pub fn momenta(&self, vr: f64, vz: f64, delta: f64) -> (f64, f64) {
        let p = self.momentum_map(delta) * Vector2::new(vr, vz);
        (p[0], p[1])
    }

    /// Inverse of [`ConfocalPoint::momenta`]; singular on the focal points.
    pub fn velocities(&self, pu: f64, pv: f64, delta: f64) -> StaeckelResult<(f64, f64)> {
        let inverse = self.momentum_map(delta).try_inverse().ok_or_else(|| {
            StaeckelError::invalid("point", "momentum map is singular at a focus")
        })?;
        let w = inverse * Vector2::new(pu, pv);
        Ok((w[0], w[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn midplane_maps_to_half_pi() {
        let (u, v) = rz_to_uv(1.0, 0.0, 0.5);
        assert_eq!(v, FRAC_PI_2);
        assert!((u.sinh() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn cylindrical_round_trip() {
        for &delta in &[0.05, 0.5, 2.0] {
            for &(r, z) in &[(1.0, 0.0), (0.3, 0.7), (2.5, -1.1), (0.05, 3.0), (8.0, 0.01)] {
                let (u, v) = rz_to_uv(r, z, delta);
                assert!(u >= 0.0);
                assert!((0.0..=std::f64::consts::PI).contains(&v));
                let (r2, z2) = uv_to_rz(u, v, delta);
                assert!((r - r2).abs() < 1e-10 * (1.0 + r), "R: {r} vs {r2}");
                assert!((z - z2).abs() < 1e-10 * (1.0 + z.abs()), "z: {z} vs {z2}");
            }
        }
    }

    #[test]
    fn southern_hemisphere_has_v_above_half_pi() {
        let (_, v_north) = rz_to_uv(1.0, 0.4, 0.5);
        let (_, v_south) = rz_to_uv(1.0, -0.4, 0.5);
        assert!(v_north < FRAC_PI_2);
        assert!(v_south > FRAC_PI_2);
        assert!((v_north + v_south - std::f64::consts::PI).abs() < 1e-12);
    }

    #[test]
    fn momenta_invert_to_velocities() {
        let delta = 0.7;
        let point = ConfocalPoint::from_cylindrical(1.2, 0.4, delta);
        let (pu, pv) = point.momenta(0.1, -0.3, delta);
        let (vr, vz) = point.velocities(pu, pv, delta).expect("map should invert");
        assert!((vr - 0.1).abs() < 1e-12);
        assert!((vz + 0.3).abs() < 1e-12);
    }

    #[test]
    fn momenta_on_midplane_reduce_to_radial_motion() {
        let delta = 0.5;
        let point = ConfocalPoint::from_cylindrical(1.0, 0.0, delta);
        let (pu, pv) = point.momenta(0.2, 0.0, delta);
        assert!((pu - delta * point.cosh_u * 0.2).abs() < 1e-14);
        assert!(pv.abs() < 1e-15);
    }

    #[test]
    fn focus_momentum_map_is_singular() {
        let point = ConfocalPoint::new(0.0, 0.0);
        assert!(point.velocities(1.0, 1.0, 1.0).is_err());
    }
}
