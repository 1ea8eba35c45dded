//! Squared-momentum functions of the separated u and v motions.
//!
//! Each function equals `p²/(2 delta²)` along its coordinate: non-negative
//! where the motion is allowed and zero at the turning points.

use crate::conserved::{centrifugal, ConservedQuantities, PotentialSamples};
use crate::coords::ConfocalPoint;
use crate::potentials::potential_staeckel;
use crate::traits::Potential;

/// u motion at fixed v0, referenced to the potential at (u0, v0).
pub struct RadialIntegrand<'a, P: Potential + ?Sized> {
    pot: &'a P,
    delta: f64,
    energy: f64,
    lz: f64,
    i3u: f64,
    sinh2_u0: f64,
    v0: f64,
    sin2_v0: f64,
    pot_u0v0: f64,
}

impl<'a, P: Potential + ?Sized> RadialIntegrand<'a, P> {
    pub fn new(
        pot: &'a P,
        delta: f64,
        quantities: &ConservedQuantities,
        origin: &ConfocalPoint,
        samples: &PotentialSamples,
    ) -> Self {
        Self {
            pot,
            delta,
            energy: quantities.energy,
            lz: quantities.lz,
            i3u: quantities.i3u,
            sinh2_u0: origin.sinh2_u(),
            v0: origin.v,
            sin2_v0: origin.sin2_v(),
            pot_u0v0: samples.at_point,
        }
    }

    pub fn squared(&self, u: f64) -> f64 {
        let sinh2_u = u.sinh().powi(2);
        let du = (sinh2_u + self.sin2_v0) * potential_staeckel(self.pot, u, self.v0, self.delta)
            - (self.sinh2_u0 + self.sin2_v0) * self.pot_u0v0;
        self.energy * sinh2_u - self.i3u - du - centrifugal(self.lz, self.delta, sinh2_u)
    }

    /// `sqrt(max(squared, 0))`, the quantity integrated for JR.
    pub fn momentum(&self, u: f64) -> f64 {
        self.squared(u).max(0.0).sqrt()
    }
}

/// v motion at fixed u0, referenced to the midplane potential at u0.
pub struct VerticalIntegrand<'a, P: Potential + ?Sized> {
    pot: &'a P,
    delta: f64,
    energy: f64,
    lz: f64,
    i3v: f64,
    u0: f64,
    cosh2_u0: f64,
    sinh2_u0: f64,
    pot_u0_midplane: f64,
}

impl<'a, P: Potential + ?Sized> VerticalIntegrand<'a, P> {
    pub fn new(
        pot: &'a P,
        delta: f64,
        quantities: &ConservedQuantities,
        origin: &ConfocalPoint,
        samples: &PotentialSamples,
    ) -> Self {
        Self {
            pot,
            delta,
            energy: quantities.energy,
            lz: quantities.lz,
            i3v: quantities.i3v,
            u0: origin.u,
            cosh2_u0: origin.cosh2_u(),
            sinh2_u0: origin.sinh2_u(),
            pot_u0_midplane: samples.at_midplane,
        }
    }

    pub fn squared(&self, v: f64) -> f64 {
        let sin2_v = v.sin().powi(2);
        let dv = self.cosh2_u0 * self.pot_u0_midplane
            - (self.sinh2_u0 + sin2_v) * potential_staeckel(self.pot, self.u0, v, self.delta);
        self.energy * sin2_v + self.i3v + dv - centrifugal(self.lz, self.delta, sin2_v)
    }

    /// `sqrt(max(squared, 0))`, the quantity integrated for Jz.
    pub fn momentum(&self, v: f64) -> f64 {
        self.squared(v).max(0.0).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::potentials::{KeplerPotential, MiyamotoNagaiPotential};
    use crate::types::PhaseSpacePoint;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn setup<P: Potential>(
        pot: &P,
        point: &PhaseSpacePoint,
        delta: f64,
    ) -> (ConservedQuantities, ConfocalPoint, PotentialSamples, (f64, f64)) {
        let coords = ConfocalPoint::from_cylindrical(point.r, point.z, delta);
        let momenta = coords.momenta(point.vr, point.vz, delta);
        let (q, samples) = ConservedQuantities::estimate(point, &coords, momenta, pot, delta);
        (q, coords, samples, momenta)
    }

    #[test]
    fn integrands_equal_momenta_at_the_point() {
        let pot = MiyamotoNagaiPotential::new(1.0, 0.5, 0.1);
        let delta = 0.4;
        let point = PhaseSpacePoint::new(1.1, 0.15, 0.8, 0.12, 0.07);
        let (q, coords, samples, (pu, pv)) = setup(&pot, &point, delta);
        let radial = RadialIntegrand::new(&pot, delta, &q, &coords, &samples);
        let vertical = VerticalIntegrand::new(&pot, delta, &q, &coords, &samples);
        let scale = 2.0 * delta * delta;
        assert!((radial.squared(coords.u) - pu * pu / scale).abs() < 1e-12);
        assert!((vertical.squared(coords.v) - pv * pv / scale).abs() < 1e-12);
        assert!((radial.momentum(coords.u) - pu.abs() / scale.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn vertical_integrand_is_mirror_symmetric_for_symmetric_potential() {
        let pot = KeplerPotential::default();
        let delta = 0.5;
        let point = PhaseSpacePoint::new(1.0, 0.1, 0.9, 0.2, 0.1);
        let (q, coords, samples, _) = setup(&pot, &point, delta);
        let vertical = VerticalIntegrand::new(&pot, delta, &q, &coords, &samples);
        for &v in &[0.3, 0.9, 1.4] {
            let a = vertical.squared(v);
            let b = vertical.squared(PI - v);
            assert!((a - b).abs() < 1e-12 * (1.0 + a.abs()), "{v}: {a} vs {b}");
        }
        assert!(vertical.squared(FRAC_PI_2).is_finite());
    }

    #[test]
    fn radial_integrand_negative_far_out_for_bound_orbit() {
        let pot = KeplerPotential::default();
        let delta = 0.5;
        let point = PhaseSpacePoint::new(1.0, 0.2, 1.0, 0.0, 0.0);
        let (q, coords, samples, _) = setup(&pot, &point, delta);
        assert!(q.energy < 0.0);
        let radial = RadialIntegrand::new(&pot, delta, &q, &coords, &samples);
        assert!(radial.squared(coords.u * 4.0) < 0.0);
        assert!(radial.squared(coords.u / 8.0) < 0.0);
        assert_eq!(radial.momentum(coords.u * 4.0), 0.0);
    }
}
