//! The `staeckel_core` crate estimates the actions (JR, Lz, Jz) of orbits in
//! axisymmetric potentials with the Staeckel approximation.
//!
//! Key components:
//! - **Traits**: `Potential` (value and forces at (R, z)), `ScalarPotential`
//!   (potential generic over `Scalar`, differentiated by `autodiff`).
//! - **Coordinates**: prolate confocal (u, v) coordinates and momenta.
//! - **Solver**: conserved quantities, turning points by bracketed root
//!   finding, and actions by adaptive Gauss-Kronrod quadrature.
//! - **Facade**: `StaeckelSingle` for one phase-space point and
//!   `StaeckelActionFinder` for many points in one potential.
pub mod autodiff;
pub mod conserved;
pub mod coords;
pub mod error;
pub mod integrands;
pub mod potentials;
pub mod quadrature;
pub mod roots;
pub mod staeckel;
pub mod traits;
pub mod turning_points;
pub mod types;

pub use error::{Coordinate, ErrorKind, StaeckelError, StaeckelResult};
pub use staeckel::{StaeckelActionFinder, StaeckelSingle, StaeckelSingleBuilder};
pub use traits::{Potential, Scalar, ScalarPotential};
pub use types::{
    Action, ActionSet, BracketSettings, PhaseSpacePoint, QuadSettings, RootSettings,
    TurningPointSettings, TurningPoints,
};
