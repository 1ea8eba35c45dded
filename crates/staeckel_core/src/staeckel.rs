//! Per-point action estimates in the Staeckel approximation, and a wrapper
//! that evaluates many points against one potential.
//!
//! Everything except the actions themselves is computed when a
//! [`StaeckelSingle`] is built, so an unbound point fails at construction.
//! JR and Jz are integrated on first request and cached per quadrature
//! setting.

use std::cell::Cell;
use std::f64::consts::{FRAC_PI_2, PI, SQRT_2};
use tracing::{debug, warn};

use crate::conserved::{self, ConservedQuantities, PotentialSamples};
use crate::coords::ConfocalPoint;
use crate::error::{StaeckelError, StaeckelResult};
use crate::integrands::{RadialIntegrand, VerticalIntegrand};
use crate::quadrature::{integrate, QuadResult};
use crate::traits::Potential;
use crate::turning_points::{solve_u_bounds, solve_v_min};
use crate::types::{
    Action, ActionSet, PhaseSpacePoint, QuadSettings, TurningPointSettings, TurningPoints,
};

fn validate_delta(delta: f64) -> StaeckelResult<()> {
    if !(delta.is_finite() && delta > 0.0) {
        return Err(StaeckelError::invalid(
            "delta",
            format!("focal length must be positive and finite, got {delta}"),
        ));
    }
    Ok(())
}

/// Converts a raw quadrature outcome into action units, keeping the partial
/// estimate of a non-converged integral in the same units.
fn scale_quadrature(
    name: &'static str,
    result: StaeckelResult<QuadResult>,
    scale: f64,
) -> StaeckelResult<Action> {
    match result {
        Ok(q) => {
            debug!(
                action = name,
                value = q.value * scale,
                abs_error = q.abs_error * scale,
                subdivisions = q.subdivisions,
                "action integrated"
            );
            Ok(Action::new(q.value * scale, q.abs_error * scale))
        }
        Err(StaeckelError::QuadratureNonConvergence {
            value,
            abs_error,
            subdivisions,
        }) => {
            warn!(action = name, subdivisions, "action quadrature did not converge");
            Err(StaeckelError::QuadratureNonConvergence {
                value: value * scale,
                abs_error: abs_error * scale,
                subdivisions,
            })
        }
        Err(e) => Err(e),
    }
}

/// Builder for [`StaeckelSingle`]. Both the potential and the focal length
/// are required.
pub struct StaeckelSingleBuilder<'a, P: Potential + ?Sized> {
    point: PhaseSpacePoint,
    potential: Option<&'a P>,
    delta: Option<f64>,
    settings: TurningPointSettings,
}

impl<'a, P: Potential + ?Sized> StaeckelSingleBuilder<'a, P> {
    pub fn potential(mut self, potential: &'a P) -> Self {
        self.potential = Some(potential);
        self
    }

    pub fn delta(mut self, delta: f64) -> Self {
        self.delta = Some(delta);
        self
    }

    pub fn settings(mut self, settings: TurningPointSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn build(self) -> StaeckelResult<StaeckelSingle<'a, P>> {
        let pot = self
            .potential
            .ok_or(StaeckelError::MissingParameter("potential"))?;
        let delta = self.delta.ok_or(StaeckelError::MissingParameter("delta"))?;
        StaeckelSingle::with_settings(self.point, pot, delta, self.settings)
    }
}

/// Staeckel-approximation solver for one phase-space point.
pub struct StaeckelSingle<'a, P: Potential + ?Sized> {
    pot: &'a P,
    delta: f64,
    point: PhaseSpacePoint,
    coords: ConfocalPoint,
    momenta: (f64, f64),
    quantities: ConservedQuantities,
    samples: PotentialSamples,
    turning_points: TurningPoints,
    radial: RadialIntegrand<'a, P>,
    vertical: VerticalIntegrand<'a, P>,
    jr_cache: Cell<Option<(QuadSettings, Action)>>,
    jz_cache: Cell<Option<(QuadSettings, Action)>>,
}

impl<'a, P: Potential + ?Sized> StaeckelSingle<'a, P> {
    pub fn builder(point: PhaseSpacePoint) -> StaeckelSingleBuilder<'a, P> {
        StaeckelSingleBuilder {
            point,
            potential: None,
            delta: None,
            settings: TurningPointSettings::default(),
        }
    }

    pub fn new(point: PhaseSpacePoint, pot: &'a P, delta: f64) -> StaeckelResult<Self> {
        Self::with_settings(point, pot, delta, TurningPointSettings::default())
    }

    pub fn with_settings(
        point: PhaseSpacePoint,
        pot: &'a P,
        delta: f64,
        settings: TurningPointSettings,
    ) -> StaeckelResult<Self> {
        point.validate()?;
        validate_delta(delta)?;
        settings.validate()?;

        let coords = ConfocalPoint::from_cylindrical(point.r, point.z, delta);
        let momenta = coords.momenta(point.vr, point.vz, delta);
        let (quantities, samples) =
            ConservedQuantities::estimate(&point, &coords, momenta, pot, delta);
        debug!(
            energy = quantities.energy,
            lz = quantities.lz,
            i3u = quantities.i3u,
            i3v = quantities.i3v,
            u = coords.u,
            v = coords.v,
            "conserved quantities"
        );

        let radial = RadialIntegrand::new(pot, delta, &quantities, &coords, &samples);
        let vertical = VerticalIntegrand::new(pot, delta, &quantities, &coords, &samples);
        let (u_min, u_max) = solve_u_bounds(|u| radial.squared(u), coords.u, &settings)?;
        let v_min = solve_v_min(|v| vertical.squared(v), coords.v, &settings)?;

        Ok(Self {
            pot,
            delta,
            point,
            coords,
            momenta,
            quantities,
            samples,
            turning_points: TurningPoints {
                u_min,
                u_max,
                v_min,
            },
            radial,
            vertical,
            jr_cache: Cell::new(None),
            jz_cache: Cell::new(None),
        })
    }

    pub fn point(&self) -> &PhaseSpacePoint {
        &self.point
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn coords(&self) -> &ConfocalPoint {
        &self.coords
    }

    /// Confocal momenta (p_u, p_v) of the point.
    pub fn momenta(&self) -> (f64, f64) {
        self.momenta
    }

    pub fn conserved(&self) -> &ConservedQuantities {
        &self.quantities
    }

    pub fn potential_samples(&self) -> &PotentialSamples {
        &self.samples
    }

    /// Energy and z angular momentum.
    pub fn calc_el(&self) -> (f64, f64) {
        (self.quantities.energy, self.quantities.lz)
    }

    pub fn turning_points(&self) -> &TurningPoints {
        &self.turning_points
    }

    pub fn u_bounds(&self) -> (f64, f64) {
        (self.turning_points.u_min, self.turning_points.u_max)
    }

    pub fn v_min(&self) -> f64 {
        self.turning_points.v_min
    }

    pub fn v_bounds(&self) -> (f64, f64) {
        (self.turning_points.v_min, self.turning_points.v_max())
    }

    pub fn radial_integrand(&self) -> &RadialIntegrand<'a, P> {
        &self.radial
    }

    pub fn vertical_integrand(&self) -> &VerticalIntegrand<'a, P> {
        &self.vertical
    }

    /// Stationary point of U(u) along the point's v, searched between the
    /// bracket floor and ceiling of `settings`.
    pub fn calc_u0(&self, settings: &TurningPointSettings) -> StaeckelResult<f64> {
        conserved::calc_u0(
            self.coords.v,
            self.pot,
            self.delta,
            settings.bracket.floor,
            settings.bracket.ceiling,
            &settings.root,
        )
    }

    /// Radial action.
    pub fn jr(&self, quad: &QuadSettings) -> StaeckelResult<Action> {
        if let Some((cached_for, action)) = self.jr_cache.get() {
            if cached_for == *quad {
                return Ok(action);
            }
        }
        let (u_min, u_max) = self.u_bounds();
        let action = if u_min == u_max {
            Action::exact(0.0)
        } else {
            let result = integrate(|u| self.radial.momentum(u), u_min, u_max, quad);
            scale_quadrature("jr", result, SQRT_2 * self.delta / PI)?
        };
        self.jr_cache.set(Some((*quad, action)));
        Ok(action)
    }

    /// Vertical action, integrated over the northern half of the v range.
    pub fn jz(&self, quad: &QuadSettings) -> StaeckelResult<Action> {
        if let Some((cached_for, action)) = self.jz_cache.get() {
            if cached_for == *quad {
                return Ok(action);
            }
        }
        let v_min = self.v_min();
        let action = if v_min >= FRAC_PI_2 {
            Action::exact(0.0)
        } else {
            let result = integrate(|v| self.vertical.momentum(v), v_min, FRAC_PI_2, quad);
            scale_quadrature("jz", result, 2.0 * SQRT_2 * self.delta / PI)?
        };
        self.jz_cache.set(Some((*quad, action)));
        Ok(action)
    }

    /// Azimuthal action, R vT.
    pub fn jphi(&self) -> Action {
        Action::exact(self.point.r * self.point.vt)
    }

    pub fn actions(&self, quad: &QuadSettings) -> StaeckelResult<ActionSet> {
        Ok(ActionSet {
            jr: self.jr(quad)?,
            lz: self.quantities.lz,
            jz: self.jz(quad)?,
        })
    }

    pub fn angle_r(&self) -> StaeckelResult<f64> {
        Err(StaeckelError::NotImplemented("angle_r"))
    }

    pub fn t_r(&self) -> StaeckelResult<f64> {
        Err(StaeckelError::NotImplemented("t_r"))
    }

    pub fn t_phi(&self) -> StaeckelResult<f64> {
        Err(StaeckelError::NotImplemented("t_phi"))
    }

    pub fn i_ratio(&self) -> StaeckelResult<f64> {
        Err(StaeckelError::NotImplemented("i_ratio"))
    }
}

/// Evaluates actions for any number of points in one potential.
pub struct StaeckelActionFinder<P: Potential> {
    potential: P,
    delta: f64,
    settings: TurningPointSettings,
}

impl<P: Potential> StaeckelActionFinder<P> {
    pub fn new(potential: P, delta: f64) -> StaeckelResult<Self> {
        validate_delta(delta)?;
        Ok(Self {
            potential,
            delta,
            settings: TurningPointSettings::default(),
        })
    }

    pub fn with_settings(mut self, settings: TurningPointSettings) -> StaeckelResult<Self> {
        settings.validate()?;
        self.settings = settings;
        Ok(self)
    }

    pub fn potential(&self) -> &P {
        &self.potential
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn single(&self, point: PhaseSpacePoint) -> StaeckelResult<StaeckelSingle<'_, P>> {
        StaeckelSingle::with_settings(point, &self.potential, self.delta, self.settings)
    }

    pub fn actions(&self, point: PhaseSpacePoint, quad: &QuadSettings) -> StaeckelResult<ActionSet> {
        self.single(point)?.actions(quad)
    }

    pub fn jr(&self, point: PhaseSpacePoint, quad: &QuadSettings) -> StaeckelResult<Action> {
        self.single(point)?.jr(quad)
    }

    pub fn jz(&self, point: PhaseSpacePoint, quad: &QuadSettings) -> StaeckelResult<Action> {
        self.single(point)?.jz(quad)
    }

    /// u0 along v = `v0`, using this finder's bracket and root settings.
    pub fn calc_u0(&self, v0: f64) -> StaeckelResult<f64> {
        conserved::calc_u0(
            v0,
            &self.potential,
            self.delta,
            self.settings.bracket.floor,
            self.settings.bracket.ceiling,
            &self.settings.root,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autodiff::AutodiffPotential;
    use crate::error::{Coordinate, ErrorKind};
    use crate::potentials::{KeplerPotential, MiyamotoNagaiPotential};
    use anyhow::{Context, Result};

    fn assert_err_contains<T>(result: StaeckelResult<T>, needle: &str) {
        match result {
            Ok(_) => panic!("expected error containing \"{needle}\""),
            Err(err) => {
                let message = format!("{err}");
                assert!(
                    message.contains(needle),
                    "expected error to contain \"{needle}\", got \"{message}\""
                );
            }
        }
    }

    struct CountingPotential {
        inner: KeplerPotential,
        calls: Cell<usize>,
    }

    impl Potential for CountingPotential {
        fn value(&self, r: f64, z: f64) -> f64 {
            self.calls.set(self.calls.get() + 1);
            self.inner.value(r, z)
        }

        fn radial_force(&self, r: f64, z: f64) -> f64 {
            self.inner.radial_force(r, z)
        }

        fn vertical_force(&self, r: f64, z: f64) -> f64 {
            self.inner.vertical_force(r, z)
        }
    }

    fn circular() -> PhaseSpacePoint {
        PhaseSpacePoint::new(1.0, 0.0, 1.0, 0.0, 0.0)
    }

    fn inclined() -> PhaseSpacePoint {
        PhaseSpacePoint::new(1.0, 0.3, 0.9, 0.1, 0.3)
    }

    #[test]
    fn circular_kepler_orbit_has_vanishing_jr_and_jz() -> Result<()> {
        let pot = KeplerPotential::default();
        let solver = StaeckelSingle::new(circular(), &pot, 0.5).context("build solver")?;
        let quad = QuadSettings::default();

        assert_eq!(solver.calc_el(), (-0.5, 1.0));
        let (u_min, u_max) = solver.u_bounds();
        assert!((u_max - u_min).abs() < 1e-6, "{u_min} .. {u_max}");
        assert!(u_min <= solver.coords().u && solver.coords().u <= u_max);
        assert!((solver.v_min() - FRAC_PI_2).abs() < 1e-6);

        assert!(solver.jr(&quad)?.value.abs() < 1e-8);
        assert!(solver.jz(&quad)?.value.abs() < 1e-8);
        assert_eq!(solver.jphi(), Action::exact(1.0));
        Ok(())
    }

    #[test]
    fn circular_orbit_bounds_collapse_exactly() -> Result<()> {
        let pot = KeplerPotential::default();
        let solver = StaeckelSingle::new(circular(), &pot, 1.0)?;
        let quad = QuadSettings::default();

        let u0 = solver.coords().u;
        assert_eq!(solver.u_bounds(), (u0, u0));
        assert_eq!(solver.v_min(), FRAC_PI_2);
        assert_eq!(solver.jr(&quad)?, Action::exact(0.0));
        assert_eq!(solver.jz(&quad)?, Action::exact(0.0));
        Ok(())
    }

    #[test]
    fn root_iteration_cap_fails_construction() {
        let pot = KeplerPotential::default();
        let mut settings = TurningPointSettings::default();
        settings.root.max_iterations = 1;
        match StaeckelSingle::with_settings(inclined(), &pot, 0.3, settings) {
            Err(err) => assert_eq!(err.kind(), ErrorKind::NumericalNonConvergence),
            Ok(_) => panic!("a single root-finder step must not converge"),
        }
    }

    #[test]
    fn planar_kepler_jr_matches_closed_form() -> Result<()> {
        let pot = KeplerPotential::default();
        let point = PhaseSpacePoint::new(1.0, 0.2, 1.0, 0.0, 0.0);
        let solver = StaeckelSingle::new(point, &pot, 0.5)?;
        let (energy, lz) = solver.calc_el();
        let expected = 1.0 / (-2.0 * energy).sqrt() - lz;

        let jr = solver.jr(&QuadSettings::default())?;
        assert!((jr.value - expected).abs() < 1e-6, "{} vs {expected}", jr.value);
        assert!(jr.error < 1e-6);
        assert!(solver.jz(&QuadSettings::default())?.value.abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn inclined_kepler_actions_approach_spherical_values() -> Result<()> {
        // Small delta makes the confocal frame nearly spherical, where
        // JR = 1/sqrt(-2E) - L and Jz = L - Lz.
        let pot = KeplerPotential::default();
        let point = inclined();
        let solver = StaeckelSingle::new(point, &pot, 0.01)?;
        let (energy, lz) = solver.calc_el();
        let l = {
            let (lx, ly) = (-point.z * point.vt, point.z * point.vr - point.r * point.vz);
            (lx * lx + ly * ly + lz * lz).sqrt()
        };

        let actions = solver.actions(&QuadSettings::default())?;
        assert!((actions.jr.value - (1.0 / (-2.0 * energy).sqrt() - l)).abs() < 1e-3);
        assert!((actions.jz.value - (l - lz)).abs() < 1e-3);
        assert_eq!(actions.lz, lz);
        Ok(())
    }

    #[test]
    fn unbound_point_fails_at_construction() {
        let pot = KeplerPotential::default();
        let point = PhaseSpacePoint::new(1.0, 0.0, 1.5, 0.0, 0.0);
        match StaeckelSingle::new(point, &pot, 0.5) {
            Err(err) => {
                assert_eq!(err.kind(), ErrorKind::UnboundOrbit);
                assert_eq!(
                    err,
                    StaeckelError::UnboundOrbit {
                        coordinate: Coordinate::U,
                        ceiling: 100.0
                    }
                );
            }
            Ok(_) => panic!("escaping point must not build"),
        }
    }

    #[test]
    fn builder_requires_potential_and_delta() {
        let pot = KeplerPotential::default();
        assert_err_contains(
            StaeckelSingle::<KeplerPotential>::builder(circular())
                .delta(0.5)
                .build(),
            "`potential`",
        );
        assert_err_contains(
            StaeckelSingle::builder(circular()).potential(&pot).build(),
            "`delta`",
        );
        assert_err_contains(
            StaeckelSingle::builder(circular())
                .potential(&pot)
                .delta(0.0)
                .build(),
            "focal length",
        );
        let built = StaeckelSingle::builder(circular())
            .potential(&pot)
            .delta(0.5)
            .settings(TurningPointSettings::default())
            .build();
        assert!(built.is_ok());
    }

    #[test]
    fn invalid_point_is_a_configuration_error() {
        let pot = KeplerPotential::default();
        let point = PhaseSpacePoint::new(f64::NAN, 0.0, 1.0, 0.0, 0.0);
        match StaeckelSingle::new(point, &pot, 0.5) {
            Err(err) => assert_eq!(err.kind(), ErrorKind::Configuration),
            Ok(_) => panic!("NaN point must not build"),
        }
    }

    #[test]
    fn v_bounds_mirror_about_the_midplane() -> Result<()> {
        let pot = MiyamotoNagaiPotential::new(1.0, 0.5, 0.1);
        for point in [
            PhaseSpacePoint::new(1.1, 0.15, 0.8, 0.12, 0.07),
            PhaseSpacePoint::new(1.1, 0.15, 0.8, -0.12, -0.07),
        ] {
            let solver = StaeckelSingle::new(point, &pot, 0.4)?;
            let (v_min, v_max) = solver.v_bounds();
            assert_eq!(v_max, PI - v_min);
            assert!(v_min < FRAC_PI_2);
        }
        Ok(())
    }

    #[test]
    fn u_bounds_enclose_the_allowed_region() -> Result<()> {
        let pot = MiyamotoNagaiPotential::new(1.0, 0.5, 0.1);
        let point = PhaseSpacePoint::new(1.1, 0.15, 0.8, 0.12, 0.07);
        let solver = StaeckelSingle::new(point, &pot, 0.4)?;
        let radial = solver.radial_integrand();
        let (u_min, u_max) = solver.u_bounds();
        assert!(u_min < solver.coords().u && solver.coords().u < u_max);

        for i in 0..=50 {
            let u = u_min + (u_max - u_min) * i as f64 / 50.0;
            assert!(radial.squared(u) >= -1e-9, "f({u}) = {}", radial.squared(u));
        }
        assert!(radial.squared(u_min - 1e-4) < 0.0);
        assert!(radial.squared(u_max + 1e-4) < 0.0);

        let vertical = solver.vertical_integrand();
        assert!(vertical.squared(solver.v_min() - 1e-4) < 0.0);
        Ok(())
    }

    #[test]
    fn actions_are_cached_per_quadrature_setting() -> Result<()> {
        let pot = CountingPotential {
            inner: KeplerPotential::default(),
            calls: Cell::new(0),
        };
        let solver = StaeckelSingle::new(inclined(), &pot, 0.3)?;
        let quad = QuadSettings::default();

        let first = solver.jr(&quad)?;
        let calls = pot.calls.get();
        let second = solver.jr(&quad)?;
        assert_eq!(first, second);
        assert_eq!(pot.calls.get(), calls);

        let loose = QuadSettings {
            abs_tolerance: 1e-4,
            rel_tolerance: 1e-4,
            ..quad
        };
        let third = solver.jr(&loose)?;
        assert!(pot.calls.get() > calls);
        assert!((third.value - first.value).abs() < 1e-3);

        let jz = solver.jz(&quad)?;
        let calls = pot.calls.get();
        assert_eq!(solver.jz(&quad)?, jz);
        assert_eq!(pot.calls.get(), calls);
        Ok(())
    }

    #[test]
    fn autodiff_forces_give_the_same_actions() -> Result<()> {
        let analytic = MiyamotoNagaiPotential::new(1.0, 0.5, 0.1);
        let dual = AutodiffPotential::new(MiyamotoNagaiPotential::new(1.0, 0.5, 0.1));
        let point = PhaseSpacePoint::new(1.1, 0.15, 0.8, 0.12, 0.07);
        let quad = QuadSettings::default();

        let a = StaeckelSingle::new(point, &analytic, 0.4)?.actions(&quad)?;
        let b = StaeckelSingle::new(point, &dual, 0.4)?.actions(&quad)?;
        assert!((a.jr.value - b.jr.value).abs() < 1e-7);
        assert!((a.jz.value - b.jz.value).abs() < 1e-7);
        assert!(a.jr.value > 0.0 && a.jz.value > 0.0);
        Ok(())
    }

    #[test]
    fn exhausted_quadrature_reports_partial_action() -> Result<()> {
        let pot = KeplerPotential::default();
        let solver = StaeckelSingle::new(inclined(), &pot, 0.3)?;
        let quad = QuadSettings {
            abs_tolerance: 1e-15,
            rel_tolerance: 1e-15,
            max_subdivisions: 1,
        };
        match solver.jr(&quad) {
            Err(StaeckelError::QuadratureNonConvergence {
                value,
                abs_error,
                subdivisions,
            }) => {
                assert!(value > 0.0 && value.is_finite());
                assert!(abs_error > 0.0);
                assert_eq!(subdivisions, 1);
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn angles_and_frequencies_are_not_implemented() -> Result<()> {
        let pot = KeplerPotential::default();
        let solver = StaeckelSingle::new(circular(), &pot, 0.5)?;
        for result in [
            solver.angle_r(),
            solver.t_r(),
            solver.t_phi(),
            solver.i_ratio(),
        ] {
            let err = result.err().context("expected NotImplemented")?;
            assert_eq!(err.kind(), ErrorKind::NotImplemented);
        }
        assert_err_contains(solver.t_phi(), "`t_phi`");
        Ok(())
    }

    #[test]
    fn finder_evaluates_points_independently() -> Result<()> {
        let finder = StaeckelActionFinder::new(KeplerPotential::default(), 0.5)?;
        let quad = QuadSettings::default();
        let first = finder.actions(circular(), &quad)?;
        assert_eq!(first.lz, 1.0);
        assert!(first.jr.value.abs() < 1e-8);
        assert!(matches!(
            finder.actions(PhaseSpacePoint::new(1.0, 0.0, 1.5, 0.0, 0.0), &quad),
            Err(StaeckelError::UnboundOrbit { .. })
        ));
        // A failed point leaves the finder usable.
        assert!(finder.jz(circular(), &quad)?.value.abs() < 1e-8);

        let jr = finder.jr(PhaseSpacePoint::new(1.0, 0.2, 1.0, 0.0, 0.0), &quad)?;
        assert!((jr.value - (1.0 / 0.96f64.sqrt() - 1.0)).abs() < 1e-6);
        assert!(StaeckelActionFinder::new(KeplerPotential::default(), -1.0).is_err());
        Ok(())
    }

    #[test]
    fn u0_on_the_midplane() -> Result<()> {
        let finder = StaeckelActionFinder::new(KeplerPotential::default(), 0.5)?;
        let u0 = finder.calc_u0(FRAC_PI_2)?;
        assert!((u0 - 1.0f64.asinh()).abs() < 1e-9);

        let pot = KeplerPotential::default();
        let solver = StaeckelSingle::new(circular(), &pot, 0.5)?;
        let from_solver = solver.calc_u0(&TurningPointSettings::default())?;
        assert!((from_solver - u0).abs() < 1e-12);
        Ok(())
    }
}
