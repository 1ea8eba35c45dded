//! Turning points of the u and v motion.
//!
//! Both searches start from the point's own coordinate, which lies in the
//! allowed region by construction, and resolve the bounds through the case
//! analysis in [`crate::roots`].

use std::f64::consts::{FRAC_PI_2, PI};
use tracing::{debug, warn};

use crate::error::{Coordinate, StaeckelError, StaeckelResult};
use crate::roots::{classify, find_edge, Edge, SearchDirection, TurningPointCase};
use crate::roots::SearchDirection::{Inward, Outward};
use crate::types::TurningPointSettings;

fn unbound(coordinate: Coordinate, trial: f64, settings: &TurningPointSettings) -> StaeckelError {
    warn!(%coordinate, trial, ceiling = settings.bracket.ceiling, "orbit classified as unbound");
    StaeckelError::UnboundOrbit {
        coordinate,
        ceiling: settings.bracket.ceiling,
    }
}

/// Resolves one edge of the allowed region, mapping the bracket outcome onto
/// the coordinate range.
fn edge<F>(
    f: &mut F,
    seed: f64,
    inside: (f64, f64),
    direction: SearchDirection,
    coordinate: Coordinate,
    settings: &TurningPointSettings,
) -> StaeckelResult<f64>
where
    F: FnMut(f64) -> f64,
{
    let (x_inside, f_inside) = inside;
    match find_edge(
        f,
        seed,
        x_inside,
        f_inside,
        direction,
        &settings.bracket,
        &settings.root,
    )? {
        Edge::Root(x) => Ok(x),
        // Only inward searches stop at the floor.
        Edge::Boundary => Ok(0.0),
        Edge::Unbounded { trial } => Err(unbound(coordinate, trial, settings)),
    }
}

/// `(u_min, u_max)` of the region around `u` where `f >= 0`.
pub fn solve_u_bounds<F>(
    mut f: F,
    u: f64,
    settings: &TurningPointSettings,
) -> StaeckelResult<(f64, f64)>
where
    F: FnMut(f64) -> f64,
{
    let eps = settings.degeneracy_eps;
    let probe = classify(&mut f, u, eps).settle(settings.roundoff_band);
    debug!(coordinate = "u", u, case = ?probe.case, "classified turning-point search");

    let bounds = match probe.case {
        TurningPointCase::Collapsed => (u, u),
        TurningPointCase::AtUpper => {
            let u_min = edge(&mut f, u, (u - eps, probe.below), Inward, Coordinate::U, settings)?;
            (u_min, u)
        }
        TurningPointCase::AtLower => {
            let u_max = edge(&mut f, u, (u + eps, probe.above), Outward, Coordinate::U, settings)?;
            (u, u_max)
        }
        TurningPointCase::Interior => {
            let f_u = f(u);
            let u_min = edge(&mut f, u, (u, f_u), Inward, Coordinate::U, settings)?;
            let u_max = edge(&mut f, u, (u, f_u), Outward, Coordinate::U, settings)?;
            (u_min, u_max)
        }
    };
    debug!(u_min = bounds.0, u_max = bounds.1, "u turning points");
    Ok(bounds)
}

/// Folds `v` onto `(0, pi/2]`, where the lower turning point is searched.
pub fn fold_v(v: f64) -> f64 {
    if v > FRAC_PI_2 {
        PI - v
    } else {
        v
    }
}

/// `v_min` of the region around `v` where `f >= 0`; the upper bound is the
/// mirror `pi - v_min`.
pub fn solve_v_min<F>(mut f: F, v: f64, settings: &TurningPointSettings) -> StaeckelResult<f64>
where
    F: FnMut(f64) -> f64,
{
    let v = fold_v(v);
    let eps = settings.degeneracy_eps;
    let probe = classify(&mut f, v, eps).settle(settings.roundoff_band);
    debug!(coordinate = "v", v, case = ?probe.case, "classified turning-point search");

    let v_min = match probe.case {
        // Already at v_min, or confined to the point itself (planar orbit).
        TurningPointCase::AtLower | TurningPointCase::Collapsed => v,
        TurningPointCase::AtUpper => {
            edge(&mut f, v, (v - eps, probe.below), Inward, Coordinate::V, settings)?
        }
        TurningPointCase::Interior => {
            let f_v = f(v);
            edge(&mut f, v, (v, f_v), Inward, Coordinate::V, settings)?
        }
    };
    debug!(v_min, "v turning point");
    Ok(v_min)
}
