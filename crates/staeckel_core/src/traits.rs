use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A trait for types that can be used as scalars when evaluating a potential.
/// Must support basic arithmetic, debug printing, and conversion from f64.
pub trait Scalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> Scalar for T {}

/// An axisymmetric potential in cylindrical coordinates.
///
/// Implementations must be deterministic and free of side effects: the
/// solver samples them many times and caches derived quantities.
pub trait Potential {
    /// Potential Phi(R, z).
    fn value(&self, r: f64, z: f64) -> f64;

    /// Radial force F_R = -dPhi/dR.
    fn radial_force(&self, r: f64, z: f64) -> f64;

    /// Vertical force F_z = -dPhi/dz.
    fn vertical_force(&self, r: f64, z: f64) -> f64;
}

impl<P: Potential + ?Sized> Potential for &P {
    fn value(&self, r: f64, z: f64) -> f64 {
        (**self).value(r, z)
    }

    fn radial_force(&self, r: f64, z: f64) -> f64 {
        (**self).radial_force(r, z)
    }

    fn vertical_force(&self, r: f64, z: f64) -> f64 {
        (**self).vertical_force(r, z)
    }
}

impl<P: Potential + ?Sized> Potential for Box<P> {
    fn value(&self, r: f64, z: f64) -> f64 {
        (**self).value(r, z)
    }

    fn radial_force(&self, r: f64, z: f64) -> f64 {
        (**self).radial_force(r, z)
    }

    fn vertical_force(&self, r: f64, z: f64) -> f64 {
        (**self).vertical_force(r, z)
    }
}

/// A potential written once over any [`Scalar`], so that forces can be
/// obtained by differentiating it (see [`crate::autodiff::AutodiffPotential`]).
pub trait ScalarPotential {
    fn phi<T: Scalar>(&self, r: T, z: T) -> T;
}
