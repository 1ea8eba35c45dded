//! Error type shared by every solver stage.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type StaeckelResult<T> = Result<T, StaeckelError>;

/// Which confocal coordinate a turning-point search was running on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Coordinate {
    U,
    V,
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Coordinate::U => write!(f, "u"),
            Coordinate::V => write!(f, "v"),
        }
    }
}

/// Coarse classification of [`StaeckelError`] for callers that only need to
/// decide how to react.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A construction parameter is missing or malformed.
    Configuration,
    /// The phase-space point is not bound in the potential.
    UnboundOrbit,
    /// A root finder or quadrature ran out of iterations.
    NumericalNonConvergence,
    /// The requested quantity has no implementation in this approximation.
    NotImplemented,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StaeckelError {
    #[error("missing required parameter `{0}`")]
    MissingParameter(&'static str),

    #[error("invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("orbit seems to be unbound: {coordinate} search passed {ceiling} without a sign change")]
    UnboundOrbit { coordinate: Coordinate, ceiling: f64 },

    #[error("root not bracketed: f({a}) = {fa}, f({b}) = {fb}")]
    RootNotBracketed { a: f64, b: f64, fa: f64, fb: f64 },

    #[error("root finder did not converge in {iterations} iterations (best estimate {estimate})")]
    RootNonConvergence { iterations: usize, estimate: f64 },

    /// Partial result of a quadrature that hit its subdivision limit.
    #[error(
        "quadrature did not converge after {subdivisions} subdivisions \
         (estimate {value}, abs. error {abs_error:e})"
    )]
    QuadratureNonConvergence {
        value: f64,
        abs_error: f64,
        subdivisions: usize,
    },

    #[error("`{0}` is not implemented for the Staeckel approximation")]
    NotImplemented(&'static str),
}

impl StaeckelError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StaeckelError::MissingParameter(_) | StaeckelError::InvalidParameter { .. } => {
                ErrorKind::Configuration
            }
            StaeckelError::UnboundOrbit { .. } => ErrorKind::UnboundOrbit,
            StaeckelError::RootNotBracketed { .. }
            | StaeckelError::RootNonConvergence { .. }
            | StaeckelError::QuadratureNonConvergence { .. } => {
                ErrorKind::NumericalNonConvergence
            }
            StaeckelError::NotImplemented(_) => ErrorKind::NotImplemented,
        }
    }

    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        StaeckelError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
