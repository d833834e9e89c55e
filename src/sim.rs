use log::{debug, info, warn};
use nalgebra::Vector3;
use serde::Serialize;

use crate::algorithms::{Gravity, PairSet};
use crate::config::{SimConfig, SimMode};
use crate::error::SimError;
use crate::trail::{Trail, TrailBuffer, TRAIL_CAPACITY};
use crate::{Body, BodyConfig, Color, State};

/// Full information about one body at the current instant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodySnapshot {
    pub mass: f64,
    pub state: [f64; 6],
    pub radius: f64,
    pub color: Color,
    pub renders_trail: bool,
}

/// Time derivative of a whole system state.
pub trait DerivativeField {
    fn derivative(&self, states: &[State]) -> Result<Vec<State>, SimError>;
}

// Closures of the form Fn(states) -> Result<derivatives> work as fields.
impl<F> DerivativeField for F
where
    F: Fn(&[State]) -> Result<Vec<State>, SimError>,
{
    fn derivative(&self, states: &[State]) -> Result<Vec<State>, SimError> {
        (self)(states)
    }
}

/// One classic RK4 step over the whole system. Pure: `states` is a snapshot
/// and the advanced states are returned.
pub fn rk4_step<F>(states: &[State], dt: f64, field: &F) -> Result<Vec<State>, SimError>
where
    F: DerivativeField + ?Sized,
{
    let k1 = checked(states, field.derivative(states)?)?;
    let k2 = checked(states, field.derivative(&offset(states, &k1, 0.5 * dt))?)?;
    let k3 = checked(states, field.derivative(&offset(states, &k2, 0.5 * dt))?)?;
    let k4 = checked(states, field.derivative(&offset(states, &k3, dt))?)?;

    Ok((0..states.len())
        .map(|i| states[i] + (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]) * (dt / 6.0))
        .collect())
}

fn offset(states: &[State], k: &[State], h: f64) -> Vec<State> {
    states.iter().zip(k).map(|(s, k)| s + k * h).collect()
}

fn checked(states: &[State], k: Vec<State>) -> Result<Vec<State>, SimError> {
    if k.len() != states.len() {
        return Err(SimError::LengthMismatch {
            what: "derivative",
            expected: states.len(),
            actual: k.len(),
        });
    }
    Ok(k)
}

/// N-body gravitational simulator.
///
/// Owns the body store together with the state derived from it: the pair
/// set and the trail buffer are rebuilt or extended in the same call that
/// changes the body count, so neither can be observed stale.
#[derive(Debug, Clone)]
pub struct Simulator {
    bodies: Vec<Body>,
    gravity: Gravity,
    pairs: PairSet,
    trails: TrailBuffer,
    time: f64,
    frame: u64,
}

impl Simulator {
    pub fn new(configs: &[BodyConfig], g: f64) -> Result<Self, SimError> {
        Self::with_config(configs, &SimConfig::default().with_g(g))
    }

    pub fn with_config(configs: &[BodyConfig], config: &SimConfig) -> Result<Self, SimError> {
        if configs.is_empty() {
            return Err(SimError::EmptySystem);
        }
        let bodies = configs
            .iter()
            .enumerate()
            .map(|(i, c)| Body::from_config(i, c))
            .collect::<Result<Vec<_>, _>>()?;
        let gravity = Gravity::with_min_separation(config.g, config.min_separation)?;
        let n = bodies.len();

        info!("simulator created with {} bodies, G = {}", n, gravity.g());

        Ok(Self {
            bodies,
            gravity,
            pairs: PairSet::new(n),
            trails: TrailBuffer::new(n, TRAIL_CAPACITY),
            time: 0.0,
            frame: 0,
        })
    }

    /// Build from index-aligned collections: `states[i]` must hold
    /// `[x, y, z, vx, vy, vz]` and all four collections must have equal length.
    pub fn from_parallel(
        states: &[Vec<f64>],
        masses: &[f64],
        radii: &[f64],
        colors: &[Color],
        g: f64,
    ) -> Result<Self, SimError> {
        let n = states.len();
        for (what, actual) in [("masses", masses.len()), ("radii", radii.len()), ("colors", colors.len())] {
            if actual != n {
                return Err(SimError::LengthMismatch { what, expected: n, actual });
            }
        }
        let mut configs = Vec::with_capacity(n);
        for (index, s) in states.iter().enumerate() {
            let state: [f64; 6] = s
                .as_slice()
                .try_into()
                .map_err(|_| SimError::MalformedState { index, len: s.len() })?;
            configs.push(BodyConfig {
                mass: masses[index],
                state,
                radius: radii[index],
                color: colors[index],
            });
        }
        Self::new(&configs, g)
    }

    pub fn len(&self) -> usize { self.bodies.len() }
    pub fn is_empty(&self) -> bool { self.bodies.is_empty() }
    pub fn time(&self) -> f64 { self.time }
    pub fn frame(&self) -> u64 { self.frame }
    pub fn g(&self) -> f64 { self.gravity.g() }
    pub fn gravity(&self) -> &Gravity { &self.gravity }
    pub fn pairs(&self) -> &PairSet { &self.pairs }
    pub fn bodies(&self) -> &[Body] { &self.bodies }
    pub fn body(&self, i: usize) -> Option<&Body> { self.bodies.get(i) }
    pub fn trails(&self) -> &TrailBuffer { &self.trails }

    /// Trail of the i-th body, oldest position first.
    pub fn trail_of(&self, i: usize) -> Option<&Trail> { self.trails.get(i) }

    pub fn positions(&self) -> Vec<Vector3<f64>> {
        self.bodies.iter().map(Body::position).collect()
    }

    pub fn radii(&self) -> Vec<f64> {
        self.bodies.iter().map(Body::radius).collect()
    }

    pub fn colors(&self) -> Vec<Color> {
        self.bodies.iter().map(Body::color).collect()
    }

    pub fn masses(&self) -> Vec<f64> {
        self.bodies.iter().map(Body::mass).collect()
    }

    /// State matrix Nx6 (x, y, z, vx, vy, vz).
    pub fn state_matrix(&self) -> Vec<[f64; 6]> {
        self.bodies.iter().map(Body::state_array).collect()
    }

    pub fn body_snapshots(&self) -> Vec<BodySnapshot> {
        self.bodies
            .iter()
            .map(|b| BodySnapshot {
                mass: b.mass(),
                state: b.state_array(),
                radius: b.radius(),
                color: b.color(),
                renders_trail: b.renders_trail(),
            })
            .collect()
    }

    /// Time derivative of the current state.
    pub fn derivative(&self) -> Result<Vec<State>, SimError> {
        let states: Vec<State> = self.bodies.iter().map(|b| *b.state()).collect();
        self.gravity.derivative(&states, &self.masses(), &self.pairs)
    }

    /// Advance every body together by one RK4 step of `dt`.
    ///
    /// In planar mode z and vz are zeroed before integrating. The result is
    /// committed only if the whole step succeeds; on error the body store,
    /// clock and trails are left as they were.
    pub fn step(&mut self, dt: f64, mode: SimMode) -> Result<(), SimError> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(SimError::InvalidStep(dt));
        }

        let mut states: Vec<State> = self.bodies.iter().map(|b| *b.state()).collect();
        if mode == SimMode::Planar {
            for s in states.iter_mut() {
                s[2] = 0.0;
                s[5] = 0.0;
            }
        }
        let masses = self.masses();

        let next = {
            let gravity = &self.gravity;
            let pairs = &self.pairs;
            let field = |s: &[State]| gravity.derivative(s, &masses, pairs);
            rk4_step(&states, dt, &field)
        };
        let next = next.map_err(|e| {
            warn!("step at t = {} rejected: {}", self.time, e);
            e
        })?;

        if let Some(index) = next.iter().position(|s| s.iter().any(|c| !c.is_finite())) {
            let e = SimError::NonFinite { index };
            warn!("step at t = {} rejected: {}", self.time, e);
            return Err(e);
        }

        for (body, s) in self.bodies.iter_mut().zip(next) {
            body.set_state(s);
        }
        self.time += dt;
        self.frame += 1;
        self.trails.record(self.bodies.iter().map(Body::position));
        Ok(())
    }

    /// Append one body, then regenerate the pair set and give the body an
    /// empty trail. Returns the new body's index.
    pub fn add_body(&mut self, config: BodyConfig) -> Result<usize, SimError> {
        let index = self.bodies.len();
        let body = Body::from_config(index, &config)?;
        self.bodies.push(body);
        self.pairs.regenerate(self.bodies.len());
        self.trails.extend_one();
        debug!(
            "added body {} (m = {:.3}, r = {:.3}), {} pairs",
            index,
            config.mass,
            config.radius,
            self.pairs.len()
        );
        Ok(index)
    }

    pub fn total_mass(&self) -> f64 {
        self.bodies.iter().map(Body::mass).sum()
    }

    pub fn center_of_mass(&self) -> Vector3<f64> {
        let weighted = self
            .bodies
            .iter()
            .fold(Vector3::zeros(), |acc, b| acc + b.position() * b.mass());
        weighted / self.total_mass()
    }

    pub fn total_momentum(&self) -> Vector3<f64> {
        self.bodies
            .iter()
            .fold(Vector3::zeros(), |acc, b| acc + b.velocity() * b.mass())
    }

    /// Angular momentum about the origin.
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.bodies.iter().fold(Vector3::zeros(), |acc, b| {
            acc + b.position().cross(&(b.velocity() * b.mass()))
        })
    }

    pub fn kinetic_energy(&self) -> f64 {
        self.bodies
            .iter()
            .map(|b| 0.5 * b.mass() * b.velocity().norm_squared())
            .sum()
    }

    pub fn potential_energy(&self) -> f64 {
        self.pairs
            .iter()
            .map(|&(i, j)| {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                -self.gravity.g() * a.mass() * b.mass() / (b.position() - a.position()).norm()
            })
            .sum()
    }

    pub fn total_energy(&self) -> f64 {
        self.kinetic_energy() + self.potential_energy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(m: f64, x: f64, vy: f64) -> Vec<BodyConfig> {
        vec![
            BodyConfig::new(m, [-x, 0.0, 0.0, 0.0, -vy, 0.0]),
            BodyConfig::new(m, [x, 0.0, 0.0, 0.0, vy, 0.0]),
        ]
    }

    #[test]
    fn rk4_is_exact_for_constant_acceleration() {
        let field = |s: &[State]| -> Result<Vec<State>, SimError> {
            Ok(s.iter()
                .map(|s| State::from_row_slice(&[s[3], s[4], s[5], 0.0, -9.81, 0.0]))
                .collect())
        };
        let s0 = vec![State::from_row_slice(&[0.0, 0.0, 0.0, 1.0, 2.0, 0.0])];
        let s1 = rk4_step(&s0, 0.5, &field).unwrap();
        assert!((s1[0][0] - 0.5).abs() < 1e-12);
        assert!((s1[0][1] - (1.0 - 0.5 * 9.81 * 0.25)).abs() < 1e-12);
        assert!((s1[0][4] - (2.0 - 9.81 * 0.5)).abs() < 1e-12);
    }

    #[test]
    fn rk4_tracks_harmonic_oscillator() {
        let field = |s: &[State]| -> Result<Vec<State>, SimError> {
            Ok(s.iter()
                .map(|s| State::from_row_slice(&[s[3], 0.0, 0.0, -s[0], 0.0, 0.0]))
                .collect())
        };
        let mut s = vec![State::from_row_slice(&[1.0, 0.0, 0.0, 0.0, 0.0, 0.0])];
        let dt = 0.01;
        for _ in 0..100 {
            s = rk4_step(&s, dt, &field).unwrap();
        }
        // x(t) = cos(t), t = 1
        assert!((s[0][0] - 1.0_f64.cos()).abs() < 1e-9);
        assert!((s[0][3] + 1.0_f64.sin()).abs() < 1e-9);
    }

    #[test]
    fn rk4_rejects_wrong_derivative_length() {
        let field = |_: &[State]| -> Result<Vec<State>, SimError> { Ok(Vec::new()) };
        let s0 = vec![State::zeros()];
        assert!(matches!(
            rk4_step(&s0, 0.1, &field),
            Err(SimError::LengthMismatch { what: "derivative", .. })
        ));
    }

    #[test]
    fn construction_rejects_empty_system() {
        assert_eq!(Simulator::new(&[], 1.0).unwrap_err(), SimError::EmptySystem);
    }

    #[test]
    fn from_parallel_checks_lengths_and_state_shape() {
        let states = vec![vec![0.0; 6], vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]];
        let err = Simulator::from_parallel(&states, &[1.0], &[1.0, 1.0], &[Color::default(); 2], 1.0)
            .unwrap_err();
        assert_eq!(err, SimError::LengthMismatch { what: "masses", expected: 2, actual: 1 });

        let states = vec![vec![0.0; 6], vec![1.0, 0.0, 0.0, 0.0]];
        let err = Simulator::from_parallel(&states, &[1.0, 1.0], &[1.0, 1.0], &[Color::default(); 2], 1.0)
            .unwrap_err();
        assert_eq!(err, SimError::MalformedState { index: 1, len: 4 });

        let states = vec![vec![0.0; 6], vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]];
        let sim = Simulator::from_parallel(&states, &[1.0, 2.0], &[3.0, 4.0], &[crate::RED, crate::BLUE], 1.0)
            .unwrap();
        assert_eq!(sim.len(), 2);
        assert_eq!(sim.radii(), vec![3.0, 4.0]);
        assert_eq!(sim.colors(), vec![crate::RED, crate::BLUE]);
    }

    #[test]
    fn single_step_pulls_bodies_together_symmetrically() {
        let mut sim = Simulator::new(&pair(1.0e6, 10.0, 0.0), 1.0).unwrap();
        sim.step(0.1, SimMode::Spatial).unwrap();
        let p = sim.positions();
        assert!(p[0].x > -10.0);
        assert!(p[1].x < 10.0);
        assert!((p[0].x + p[1].x).abs() < 1e-9);
        assert_eq!(p[0].y, 0.0);
        assert_eq!(p[1].z, 0.0);
        assert_eq!(sim.frame(), 1);
        assert!((sim.time() - 0.1).abs() < 1e-15);
    }

    #[test]
    fn planar_mode_zeroes_z_before_integrating() {
        let configs = vec![
            BodyConfig::new(10.0, [0.0, 0.0, 5.0, 0.0, 0.0, 1.0]),
            BodyConfig::new(10.0, [3.0, 0.0, -2.0, 0.0, 0.0, -1.0]),
        ];
        let mut sim = Simulator::new(&configs, 1.0).unwrap();
        sim.step(0.1, SimMode::Planar).unwrap();
        for s in sim.state_matrix() {
            assert_eq!(s[2], 0.0);
            assert_eq!(s[5], 0.0);
        }

        let mut sim = Simulator::new(&configs, 1.0).unwrap();
        sim.step(0.1, SimMode::Spatial).unwrap();
        assert!(sim.state_matrix()[0][2] != 0.0);
    }

    #[test]
    fn failed_step_leaves_state_untouched() {
        let configs = vec![
            BodyConfig::new(1.0, [0.0; 6]),
            BodyConfig::new(1.0, [0.0; 6]),
        ];
        let mut sim = Simulator::new(&configs, 1.0).unwrap();
        let before = sim.state_matrix();
        let err = sim.step(0.1, SimMode::Spatial).unwrap_err();
        assert!(matches!(err, SimError::NumericFault { i: 0, j: 1, .. }));
        assert_eq!(sim.state_matrix(), before);
        assert_eq!(sim.frame(), 0);
        assert!(sim.trail_of(0).unwrap().is_empty());
    }

    #[test]
    fn invalid_dt_is_rejected() {
        let mut sim = Simulator::new(&pair(1.0, 1.0, 0.0), 1.0).unwrap();
        assert_eq!(sim.step(0.0, SimMode::Spatial), Err(SimError::InvalidStep(0.0)));
        assert!(sim.step(f64::NAN, SimMode::Spatial).is_err());
        assert!(sim.step(-0.1, SimMode::Spatial).is_err());
    }

    #[test]
    fn add_body_regenerates_pairs_and_trails() {
        let mut sim = Simulator::new(&pair(1.0, 1.0, 0.0), 1.0).unwrap();
        assert_eq!(sim.pairs().len(), 1);
        let index = sim.add_body(BodyConfig::new(2.0, [0.0, 5.0, 0.0, 0.0, 0.0, 0.0])).unwrap();
        assert_eq!(index, 2);
        assert_eq!(sim.len(), 3);
        assert_eq!(sim.pairs().len(), 3);
        assert!(sim.pairs().covers(3));
        assert_eq!(sim.trails().len(), 3);
        sim.step(0.1, SimMode::Spatial).unwrap();
        // the new body is pulled toward the other two
        assert!(sim.body(2).unwrap().velocity().y < 0.0);
    }

    #[test]
    fn add_body_rejects_invalid_config_without_growing() {
        let mut sim = Simulator::new(&pair(1.0, 1.0, 0.0), 1.0).unwrap();
        assert!(sim.add_body(BodyConfig::new(-1.0, [0.0; 6])).is_err());
        assert_eq!(sim.len(), 2);
        assert_eq!(sim.pairs().len(), 1);
        assert_eq!(sim.trails().len(), 2);
    }

    #[test]
    fn trails_hold_the_last_fifteen_positions_in_order() {
        let mut sim = Simulator::new(&pair(1.0, 10.0, 0.3), 1.0).unwrap();
        let mut expected = Vec::new();
        for _ in 0..15 {
            sim.step(0.1, SimMode::Spatial).unwrap();
            expected.push(sim.positions()[0]);
        }
        assert_eq!(sim.trail_of(0).unwrap().to_vec(), expected);

        for _ in 0..10 {
            sim.step(0.1, SimMode::Spatial).unwrap();
            assert_eq!(sim.trail_of(1).unwrap().len(), TRAIL_CAPACITY);
        }
    }

    #[test]
    fn config_cannot_change_trail_depth() {
        let config: SimConfig = serde_json::from_str(r#"{ "trail_capacity": 0 }"#).unwrap();
        let mut sim = Simulator::with_config(&pair(1.0, 10.0, 0.3), &config).unwrap();
        for _ in 0..TRAIL_CAPACITY + 5 {
            sim.step(0.1, SimMode::Spatial).unwrap();
        }
        assert_eq!(sim.trail_of(1).unwrap().capacity(), TRAIL_CAPACITY);
        assert_eq!(sim.trail_of(0).unwrap().len(), TRAIL_CAPACITY);
    }

    #[test]
    fn potential_energy_of_unit_pair() {
        let sim = Simulator::new(&pair(2.0, 0.5, 0.0), 3.0).unwrap();
        // -G m m / r = -3 * 4 / 1
        assert!((sim.potential_energy() + 12.0).abs() < 1e-12);
        assert_eq!(sim.kinetic_energy(), 0.0);
    }
}
