//! Bracket-then-refine root finding for one-dimensional "allowed region"
//! problems.
//!
//! The functions here know nothing about orbits: they take a scalar function
//! `f` and a point where `f >= 0`, and locate the edges of the surrounding
//! interval on which `f` stays non-negative.
//!
//! 1. [`classify`] probes `x ± eps` to decide whether `x` already sits on an
//!    edge, on a collapsed (single-point) region, or strictly inside.
//! 2. [`expand_bracket`] walks away from the seed by a constant factor until
//!    `f` turns negative.
//! 3. [`brent`] refines the bracketed sign change.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{StaeckelError, StaeckelResult};
use crate::types::{BracketSettings, RootSettings};

/// Outcome of probing `f` on either side of the current coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurningPointCase {
    /// Allowed only above `x`: `x` is the lower edge.
    AtLower,
    /// Allowed only below `x`: `x` is the upper edge.
    AtUpper,
    /// Forbidden on both sides: the region is the single point `x`.
    Collapsed,
    /// Allowed on both sides: search both ways.
    Interior,
}

/// Result of [`classify`], keeping the probe values for the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Probe {
    pub case: TurningPointCase,
    pub below: f64,
    pub above: f64,
}

pub fn classify<F>(f: &mut F, x: f64, eps: f64) -> Probe
where
    F: FnMut(f64) -> f64,
{
    let above = f(x + eps);
    let below = f(x - eps);
    let case = match (below >= 0.0, above >= 0.0) {
        (true, true) => TurningPointCase::Interior,
        (true, false) => TurningPointCase::AtUpper,
        (false, true) => TurningPointCase::AtLower,
        (false, false) => TurningPointCase::Collapsed,
    };
    Probe { case, below, above }
}

impl Probe {
    /// Reclassifies as [`TurningPointCase::Collapsed`] when both probe values
    /// lie within `band` of zero, so a sign change at roundoff level does not
    /// open a spurious one-sided search.
    pub fn settle(self, band: f64) -> Self {
        if self.below.abs() <= band && self.above.abs() <= band {
            Self {
                case: TurningPointCase::Collapsed,
                ..self
            }
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchDirection {
    /// Toward zero, dividing by the growth factor.
    Inward,
    /// Away from zero, multiplying by the growth factor.
    Outward,
}

/// Where a bracket search stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BracketEnd {
    /// `f(trial) < 0`; the sign change lies between the seed and `trial`.
    Found { trial: f64, value: f64 },
    /// Inward search reached the floor while still allowed.
    Boundary,
    /// Outward search passed the ceiling while still allowed.
    Unbounded { trial: f64 },
}

pub fn expand_bracket<F>(
    f: &mut F,
    seed: f64,
    direction: SearchDirection,
    settings: &BracketSettings,
) -> BracketEnd
where
    F: FnMut(f64) -> f64,
{
    let mut trial = match direction {
        SearchDirection::Inward => seed / settings.growth,
        SearchDirection::Outward => seed.max(settings.floor) * settings.growth,
    };
    loop {
        let value = f(trial);
        if value < 0.0 {
            return BracketEnd::Found { trial, value };
        }
        match direction {
            SearchDirection::Inward => {
                if trial <= settings.floor {
                    return BracketEnd::Boundary;
                }
                trial /= settings.growth;
            }
            SearchDirection::Outward => {
                if trial > settings.ceiling {
                    return BracketEnd::Unbounded { trial };
                }
                trial *= settings.growth;
            }
        }
    }
}

/// Brent's method on `[a, b]` with known endpoint values.
///
/// Converges when the bracket half-width drops below
/// `(x_tolerance + rel_tolerance * |x|) / 2`.
pub fn brent<F>(
    f: &mut F,
    a: f64,
    b: f64,
    fa: f64,
    fb: f64,
    settings: &RootSettings,
) -> StaeckelResult<f64>
where
    F: FnMut(f64) -> f64,
{
    if fa * fb > 0.0 || fa.is_nan() || fb.is_nan() {
        return Err(StaeckelError::RootNotBracketed { a, b, fa, fb });
    }
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }

    let (mut x_pre, mut x_cur) = (a, b);
    let (mut f_pre, mut f_cur) = (fa, fb);
    let (mut x_blk, mut f_blk) = (0.0, 0.0);
    let (mut s_pre, mut s_cur) = (0.0, 0.0);

    for _ in 0..settings.max_iterations {
        if f_pre != 0.0 && f_cur != 0.0 && (f_pre < 0.0) != (f_cur < 0.0) {
            x_blk = x_pre;
            f_blk = f_pre;
            s_pre = x_cur - x_pre;
            s_cur = s_pre;
        }
        if f_blk.abs() < f_cur.abs() {
            x_pre = x_cur;
            x_cur = x_blk;
            x_blk = x_pre;
            f_pre = f_cur;
            f_cur = f_blk;
            f_blk = f_pre;
        }

        let tol = 0.5 * (settings.x_tolerance + settings.rel_tolerance * x_cur.abs());
        let s_bis = 0.5 * (x_blk - x_cur);
        if f_cur == 0.0 || s_bis.abs() < tol {
            return Ok(x_cur);
        }

        if s_pre.abs() > tol && f_cur.abs() < f_pre.abs() {
            let s_try = if x_pre == x_blk {
                // secant
                -f_cur * (x_cur - x_pre) / (f_cur - f_pre)
            } else {
                // inverse quadratic
                let d_pre = (f_pre - f_cur) / (x_pre - x_cur);
                let d_blk = (f_blk - f_cur) / (x_blk - x_cur);
                -f_cur * (f_blk * d_blk - f_pre * d_pre) / (d_blk * d_pre * (f_blk - f_pre))
            };
            if 2.0 * s_try.abs() < s_pre.abs().min(3.0 * s_bis.abs() - tol) {
                s_pre = s_cur;
                s_cur = s_try;
            } else {
                s_pre = s_bis;
                s_cur = s_bis;
            }
        } else {
            s_pre = s_bis;
            s_cur = s_bis;
        }

        x_pre = x_cur;
        f_pre = f_cur;
        x_cur += if s_cur.abs() > tol {
            s_cur
        } else if s_bis > 0.0 {
            tol
        } else {
            -tol
        };
        f_cur = f(x_cur);
    }

    warn!(
        iterations = settings.max_iterations,
        estimate = x_cur,
        "bracketed root finder hit its iteration cap"
    );
    Err(StaeckelError::RootNonConvergence {
        iterations: settings.max_iterations,
        estimate: x_cur,
    })
}

/// How an edge of the allowed region was resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Edge {
    /// A sign change refined to a root.
    Root(f64),
    /// The inward search hit the floor; the edge is the coordinate origin.
    Boundary,
    /// The outward search never turned negative.
    Unbounded { trial: f64 },
}

/// Locates one edge of the region where `f >= 0`.
///
/// The bracket is grown from `seed`; the refined root lies between the
/// first negative trial and `inside`, whose value `f_inside` is treated as
/// non-negative (it is one by construction, up to roundoff).
pub fn find_edge<F>(
    f: &mut F,
    seed: f64,
    inside: f64,
    f_inside: f64,
    direction: SearchDirection,
    bracket: &BracketSettings,
    root: &RootSettings,
) -> StaeckelResult<Edge>
where
    F: FnMut(f64) -> f64,
{
    match expand_bracket(f, seed, direction, bracket) {
        BracketEnd::Found { trial, value } => {
            brent(f, trial, inside, value, f_inside.max(0.0), root).map(Edge::Root)
        }
        BracketEnd::Boundary => Ok(Edge::Boundary),
        BracketEnd::Unbounded { trial } => Ok(Edge::Unbounded { trial }),
    }
}
