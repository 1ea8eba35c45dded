//! Reference axisymmetric potentials.
//!
//! Each potential implements [`Potential`] with closed-form forces and
//! [`ScalarPotential`] so it can also be driven through
//! [`AutodiffPotential`](crate::autodiff::AutodiffPotential).

use crate::traits::{Potential, Scalar, ScalarPotential};
use serde::{Deserialize, Serialize};

/// Point mass: Phi = -amp / sqrt(R² + z²).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KeplerPotential {
    pub amp: f64,
}

impl KeplerPotential {
    pub fn new(amp: f64) -> Self {
        Self { amp }
    }
}

impl Default for KeplerPotential {
    fn default() -> Self {
        Self { amp: 1.0 }
    }
}

impl Potential for KeplerPotential {
    fn value(&self, r: f64, z: f64) -> f64 {
        -self.amp / r.hypot(z)
    }

    fn radial_force(&self, r: f64, z: f64) -> f64 {
        -self.amp * r / r.hypot(z).powi(3)
    }

    fn vertical_force(&self, r: f64, z: f64) -> f64 {
        -self.amp * z / r.hypot(z).powi(3)
    }
}

impl ScalarPotential for KeplerPotential {
    fn phi<T: Scalar>(&self, r: T, z: T) -> T {
        let amp = T::from_f64(self.amp).unwrap();
        -amp / (r * r + z * z).sqrt()
    }
}

/// Miyamoto & Nagai (1975) disk.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MiyamotoNagaiPotential {
    pub amp: f64,
    /// Scale length.
    pub a: f64,
    /// Scale height.
    pub b: f64,
}

impl MiyamotoNagaiPotential {
    pub fn new(amp: f64, a: f64, b: f64) -> Self {
        Self { amp, a, b }
    }

    fn vertical_term(&self, z: f64) -> f64 {
        (z * z + self.b * self.b).sqrt()
    }
}

impl Potential for MiyamotoNagaiPotential {
    fn value(&self, r: f64, z: f64) -> f64 {
        let az = self.a + self.vertical_term(z);
        -self.amp / (r * r + az * az).sqrt()
    }

    fn radial_force(&self, r: f64, z: f64) -> f64 {
        let az = self.a + self.vertical_term(z);
        -self.amp * r / (r * r + az * az).powf(1.5)
    }

    fn vertical_force(&self, r: f64, z: f64) -> f64 {
        let zb = self.vertical_term(z);
        let az = self.a + zb;
        -self.amp * z * az / (zb * (r * r + az * az).powf(1.5))
    }
}

impl ScalarPotential for MiyamotoNagaiPotential {
    fn phi<T: Scalar>(&self, r: T, z: T) -> T {
        let amp = T::from_f64(self.amp).unwrap();
        let a = T::from_f64(self.a).unwrap();
        let b = T::from_f64(self.b).unwrap();
        let az = a + (z * z + b * b).sqrt();
        -amp / (r * r + az * az).sqrt()
    }
}

/// Cored logarithmic halo with vertical flattening `q`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LogarithmicHaloPotential {
    pub amp: f64,
    pub core: f64,
    pub q: f64,
}

impl LogarithmicHaloPotential {
    pub fn new(amp: f64, core: f64, q: f64) -> Self {
        Self { amp, core, q }
    }

    fn m2(&self, r: f64, z: f64) -> f64 {
        r * r + (z / self.q).powi(2) + self.core * self.core
    }
}

impl Potential for LogarithmicHaloPotential {
    fn value(&self, r: f64, z: f64) -> f64 {
        0.5 * self.amp * self.m2(r, z).ln()
    }

    fn radial_force(&self, r: f64, z: f64) -> f64 {
        -self.amp * r / self.m2(r, z)
    }

    fn vertical_force(&self, r: f64, z: f64) -> f64 {
        -self.amp * z / (self.q * self.q * self.m2(r, z))
    }
}

impl ScalarPotential for LogarithmicHaloPotential {
    fn phi<T: Scalar>(&self, r: T, z: T) -> T {
        let half_amp = T::from_f64(0.5 * self.amp).unwrap();
        let q = T::from_f64(self.q).unwrap();
        let core = T::from_f64(self.core).unwrap();
        let zq = z / q;
        half_amp * (r * r + zq * zq + core * core).ln()
    }
}

/// Sum of several potentials, evaluated term by term.
#[derive(Default)]
pub struct CompositePotential {
    terms: Vec<Box<dyn Potential + Send + Sync>>,
}

impl CompositePotential {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, term: impl Potential + Send + Sync + 'static) -> Self {
        self.terms.push(Box::new(term));
        self
    }

    pub fn push(&mut self, term: Box<dyn Potential + Send + Sync>) {
        self.terms.push(term);
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

impl Potential for CompositePotential {
    fn value(&self, r: f64, z: f64) -> f64 {
        self.terms.iter().map(|p| p.value(r, z)).sum()
    }

    fn radial_force(&self, r: f64, z: f64) -> f64 {
        self.terms.iter().map(|p| p.radial_force(r, z)).sum()
    }

    fn vertical_force(&self, r: f64, z: f64) -> f64 {
        self.terms.iter().map(|p| p.vertical_force(r, z)).sum()
    }
}

/// Potential evaluated at confocal coordinates (u, v).
pub fn potential_staeckel<P: Potential + ?Sized>(pot: &P, u: f64, v: f64, delta: f64) -> f64 {
    let (r, z) = crate::coords::uv_to_rz(u, v, delta);
    pot.value(r, z)
}

/// Radial force evaluated at confocal coordinates (u, v).
pub fn radial_force_staeckel<P: Potential + ?Sized>(pot: &P, u: f64, v: f64, delta: f64) -> f64 {
    let (r, z) = crate::coords::uv_to_rz(u, v, delta);
    pot.radial_force(r, z)
}

/// Vertical force evaluated at confocal coordinates (u, v).
pub fn vertical_force_staeckel<P: Potential + ?Sized>(
    pot: &P,
    u: f64,
    v: f64,
    delta: f64,
) -> f64 {
    let (r, z) = crate::coords::uv_to_rz(u, v, delta);
    pot.vertical_force(r, z)
}
