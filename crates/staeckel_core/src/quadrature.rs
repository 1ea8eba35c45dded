//! Globally adaptive Gauss-Kronrod (7, 15) quadrature.
//!
//! The interval with the largest error estimate is bisected until the summed
//! estimate satisfies `max(abs_tolerance, rel_tolerance * |result|)` or the
//! subdivision budget is spent. Nodes are interior, so integrands with
//! integrable endpoint singularities (such as square roots vanishing at a
//! turning point) are handled without special casing.

use serde::{Deserialize, Serialize};

use crate::error::{StaeckelError, StaeckelResult};
use crate::types::QuadSettings;

/// Kronrod abscissae on [0, 1]; odd indices are the Gauss nodes.
const XGK: [f64; 8] = [
    0.991455371120812639206854697526329,
    0.949107912342758524526189684047851,
    0.864864423359769072789712788640926,
    0.741531185599394439863864773280788,
    0.586087235467691130294144845693013,
    0.405845151377397166906606412076961,
    0.207784955007898467600689403773245,
    0.000000000000000000000000000000000,
];

const WGK: [f64; 8] = [
    0.022935322010529224963732008058970,
    0.063092092629978553290700663189204,
    0.104790010322250183839876322541518,
    0.140653259715525918745189590510238,
    0.169004726639267902826583426598550,
    0.190350578064785409913256402421014,
    0.204432940075298892414161999234649,
    0.209482141084727828012999174891714,
];

const WG: [f64; 4] = [
    0.129484966168869693270611432679082,
    0.279705391489276667901467771423780,
    0.381830050505118944950369775488975,
    0.417959183673469387755102040816327,
];

/// Outcome of a converged quadrature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadResult {
    pub value: f64,
    pub abs_error: f64,
    pub subdivisions: usize,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

/// One 15-point Kronrod estimate with its 7-point Gauss error estimate.
fn kronrod15<F>(f: &mut F, a: f64, b: f64) -> Segment
where
    F: FnMut(f64) -> f64,
{
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);

    let fc = f(center);
    let mut res_g = fc * WG[3];
    let mut res_k = fc * WGK[7];
    let mut res_abs = res_k.abs();
    let mut left = [0.0; 7];
    let mut right = [0.0; 7];

    for j in 0..7 {
        let x = half * XGK[j];
        let f1 = f(center - x);
        let f2 = f(center + x);
        left[j] = f1;
        right[j] = f2;
        res_k += WGK[j] * (f1 + f2);
        res_abs += WGK[j] * (f1.abs() + f2.abs());
        if j % 2 == 1 {
            res_g += WG[j / 2] * (f1 + f2);
        }
    }

    let mean = 0.5 * res_k;
    let mut res_asc = WGK[7] * (fc - mean).abs();
    for j in 0..7 {
        res_asc += WGK[j] * ((left[j] - mean).abs() + (right[j] - mean).abs());
    }

    let scale = half.abs();
    let value = res_k * half;
    res_abs *= scale;
    res_asc *= scale;
    let mut error = ((res_k - res_g) * half).abs();
    if res_asc != 0.0 && error != 0.0 {
        error = res_asc * (200.0 * error / res_asc).powf(1.5).min(1.0);
    }
    if res_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * res_abs);
    }

    Segment { a, b, value, error }
}

/// Integrates `f` over `[a, b]`.
///
/// On subdivision exhaustion the partial estimate is returned inside
/// [`StaeckelError::QuadratureNonConvergence`].
pub fn integrate<F>(mut f: F, a: f64, b: f64, settings: &QuadSettings) -> StaeckelResult<QuadResult>
where
    F: FnMut(f64) -> f64,
{
    settings.validate()?;
    if a == b {
        return Ok(QuadResult {
            value: 0.0,
            abs_error: 0.0,
            subdivisions: 0,
        });
    }

    let first = kronrod15(&mut f, a, b);
    let mut segments = vec![first];
    let mut total = first.value;
    let mut total_error = first.error;

    loop {
        let tolerance = settings
            .abs_tolerance
            .max(settings.rel_tolerance * total.abs());
        if total_error <= tolerance {
            return Ok(QuadResult {
                value: total,
                abs_error: total_error,
                subdivisions: segments.len(),
            });
        }
        if !total.is_finite() || !total_error.is_finite() {
            return Err(StaeckelError::QuadratureNonConvergence {
                value: total,
                abs_error: total_error,
                subdivisions: segments.len(),
            });
        }
        if segments.len() >= settings.max_subdivisions {
            return Err(StaeckelError::QuadratureNonConvergence {
                value: total,
                abs_error: total_error,
                subdivisions: segments.len(),
            });
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let parent = segments.swap_remove(worst);
        let mid = 0.5 * (parent.a + parent.b);
        if mid <= parent.a.min(parent.b) || mid >= parent.a.max(parent.b) {
            // Interval exhausted at machine resolution.
            segments.push(parent);
            return Err(StaeckelError::QuadratureNonConvergence {
                value: total,
                abs_error: total_error,
                subdivisions: segments.len(),
            });
        }

        let left = kronrod15(&mut f, parent.a, mid);
        let right = kronrod15(&mut f, mid, parent.b);
        total += left.value + right.value - parent.value;
        total_error += left.error + right.error - parent.error;
        segments.push(left);
        segments.push(right);
    }
}
