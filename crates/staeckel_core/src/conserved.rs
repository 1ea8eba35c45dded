//! Integrals of motion of a phase-space point: energy, angular momentum and
//! the two halves of the approximate third integral.

use serde::{Deserialize, Serialize};
use std::f64::consts::FRAC_PI_2;

use crate::coords::ConfocalPoint;
use crate::error::StaeckelResult;
use crate::potentials::{potential_staeckel, radial_force_staeckel, vertical_force_staeckel};
use crate::roots::brent;
use crate::traits::Potential;
use crate::types::{PhaseSpacePoint, RootSettings};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConservedQuantities {
    pub energy: f64,
    pub lz: f64,
    /// Share of the third integral carried by the u motion.
    pub i3u: f64,
    /// Share of the third integral carried by the v motion.
    pub i3v: f64,
}

/// Potential samples the integrands are referenced to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotentialSamples {
    /// Phi(u0, v0) at the point itself.
    pub at_point: f64,
    /// Phi(u0, pi/2), on the midplane at the same u.
    pub at_midplane: f64,
}

/// Energy and z angular momentum.
pub fn calc_el<P: Potential + ?Sized>(point: &PhaseSpacePoint, pot: &P) -> (f64, f64) {
    let kinetic = 0.5 * (point.vr * point.vr + point.vt * point.vt + point.vz * point.vz);
    (pot.value(point.r, point.z) + kinetic, point.r * point.vt)
}

/// `Lz² / (2 delta² s)`, taken as zero when `Lz` vanishes so that the
/// coordinate axis (s = 0) stays finite.
pub(crate) fn centrifugal(lz: f64, delta: f64, s: f64) -> f64 {
    if lz == 0.0 {
        0.0
    } else {
        lz * lz / (2.0 * delta * delta * s)
    }
}

impl ConservedQuantities {
    /// Evaluates E, Lz and the I3 split at `coords`, with confocal momenta
    /// `(pu, pv)`.
    pub fn estimate<P: Potential + ?Sized>(
        point: &PhaseSpacePoint,
        coords: &ConfocalPoint,
        momenta: (f64, f64),
        pot: &P,
        delta: f64,
    ) -> (Self, PotentialSamples) {
        let (energy, lz) = calc_el(point, pot);
        let (pu, pv) = momenta;
        let two_delta2 = 2.0 * delta * delta;
        let sinh2_u = coords.sinh2_u();
        let sin2_v = coords.sin2_v();

        let samples = PotentialSamples {
            at_point: potential_staeckel(pot, coords.u, coords.v, delta),
            at_midplane: potential_staeckel(pot, coords.u, FRAC_PI_2, delta),
        };

        let i3u = energy * sinh2_u - pu * pu / two_delta2 - centrifugal(lz, delta, sinh2_u);

        let dv = coords.cosh2_u() * samples.at_midplane - (sinh2_u + sin2_v) * samples.at_point;
        let i3v = -energy * sin2_v + pv * pv / two_delta2 + centrifugal(lz, delta, sin2_v) - dv;

        (
            Self {
                energy,
                lz,
                i3u,
                i3v,
            },
            samples,
        )
    }
}

/// dU/du at fixed v0, where U(u) = (sinh²u + sin²v0) Phi(u, v0).
pub fn u0_equation<P: Potential + ?Sized>(u: f64, v0: f64, pot: &P, delta: f64) -> f64 {
    let (sinh_u, cosh_u) = (u.sinh(), u.cosh());
    let (sin_v, cos_v) = (v0.sin(), v0.cos());
    2.0 * sinh_u * cosh_u * potential_staeckel(pot, u, v0, delta)
        - delta
            * (sinh_u * sinh_u + sin_v * sin_v)
            * (radial_force_staeckel(pot, u, v0, delta) * cosh_u * sin_v
                + vertical_force_staeckel(pot, u, v0, delta) * sinh_u * cos_v)
}

/// Stationary point of U(u) at fixed v0, searched on `[lower, upper]`.
pub fn calc_u0<P: Potential + ?Sized>(
    v0: f64,
    pot: &P,
    delta: f64,
    lower: f64,
    upper: f64,
    settings: &RootSettings,
) -> StaeckelResult<f64> {
    let mut f = |u: f64| u0_equation(u, v0, pot, delta);
    let (fa, fb) = (f(lower), f(upper));
    brent(&mut f, lower, upper, fa, fb, settings)
}
