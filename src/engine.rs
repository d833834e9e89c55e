use log::{debug, info};
use nalgebra::Vector3;

use crate::config::{SimConfig, SimMode};
use crate::error::SimError;
use crate::models::scenarios::{build_scenario, configs_from_states, SCENARIO_FROM_STATES};
use crate::sim::Simulator;
use crate::spawner::Spawner;
use crate::trail::trail_sample_style;
use crate::BodyConfig;

/// Frames between energy drift reports in the debug log.
pub const ENERGY_LOG_INTERVAL: u64 = 600;

/// Drives a simulator once per rendered frame and carries the state a
/// front end toggles: the projection mode and the spawner behind clicks.
#[derive(Debug, Clone)]
pub struct Engine {
    scenario_id: &'static str,
    sim: Simulator,
    spawner: Spawner,
    dt: f64,
    mode: SimMode,
    initial_energy: f64,
}

impl Engine {
    /// Built-in scenario; its own G replaces `config.g`.
    pub fn new_builtin(scenario_id: &str, config: SimConfig) -> Result<Self, SimError> {
        let scenario = build_scenario(scenario_id)?;
        info!("loading scenario '{}' ({} bodies)", scenario.id, scenario.bodies.len());
        let config = SimConfig { g: scenario.g, ..config };
        Self::build(scenario.id, &scenario.bodies, config)
    }

    pub fn new_custom(configs: Vec<BodyConfig>, config: SimConfig) -> Result<Self, SimError> {
        Self::build(SCENARIO_FROM_STATES, &configs, config)
    }

    /// Packed `[x, y, z, vx, vy, vz]*` states, every body of unit mass.
    pub fn new_from_states(states: &[f64], config: SimConfig) -> Result<Self, SimError> {
        let configs = configs_from_states(states, 1.0)?;
        Self::build(SCENARIO_FROM_STATES, &configs, config)
    }

    fn build(scenario_id: &'static str, configs: &[BodyConfig], config: SimConfig) -> Result<Self, SimError> {
        if !(config.dt.is_finite() && config.dt > 0.0) {
            return Err(SimError::InvalidStep(config.dt));
        }
        config.spawn.validate()?;
        let sim = Simulator::with_config(configs, &config)?;
        let initial_energy = sim.total_energy();
        Ok(Self {
            scenario_id,
            sim,
            spawner: Spawner::from_seed(config.seed, config.spawn),
            dt: config.dt,
            mode: config.mode,
            initial_energy,
        })
    }

    pub fn scenario_id(&self) -> &'static str { self.scenario_id }
    pub fn simulator(&self) -> &Simulator { &self.sim }
    pub fn len(&self) -> usize { self.sim.len() }
    pub fn is_empty(&self) -> bool { self.sim.is_empty() }
    pub fn dt(&self) -> f64 { self.dt }
    pub fn mode(&self) -> SimMode { self.mode }
    pub fn set_mode(&mut self, mode: SimMode) { self.mode = mode; }

    pub fn toggle_mode(&mut self) -> SimMode {
        self.mode = self.mode.toggled();
        debug!("projection mode is now {:?}", self.mode);
        self.mode
    }

    /// Advance one frame: a single RK4 step of the fixed frame `dt`.
    pub fn tick(&mut self) -> Result<(), SimError> {
        self.sim.step(self.dt, self.mode)?;
        if self.sim.frame() % ENERGY_LOG_INTERVAL == 0 {
            let energy = self.sim.total_energy();
            debug!(
                "frame {}: t = {:.2}, energy = {:.6e}, drift = {:.3e}",
                self.sim.frame(),
                self.sim.time(),
                energy,
                energy - self.initial_energy
            );
        }
        Ok(())
    }

    /// Spawn a randomized body at a clicked point. Returns its index.
    pub fn spawn_at(&mut self, point: Vector3<f64>) -> Result<usize, SimError> {
        let config = self.spawner.sample(point);
        let index = self.sim.add_body(config)?;
        // Energy reference restarts with the new system.
        self.initial_energy = self.sim.total_energy();
        Ok(index)
    }

    pub fn positions_flat(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.sim.len() * 3);
        for p in self.sim.positions() {
            out.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        }
        out
    }

    pub fn state_matrix_flat(&self) -> Vec<f32> {
        self.sim
            .state_matrix()
            .iter()
            .flat_map(|row| row.iter().map(|&c| c as f32))
            .collect()
    }

    pub fn radii_flat(&self) -> Vec<f32> {
        self.sim.radii().into_iter().map(|r| r as f32).collect()
    }

    /// RGBA bytes, four per body.
    pub fn colors_flat(&self) -> Vec<u8> {
        self.sim.colors().into_iter().flat_map(|c| c.to_array()).collect()
    }

    /// Trail of body `i` as `[x, y, z, alpha, radius]` per sample, oldest
    /// first. Empty for stellar-mass bodies, which are not drawn with a trail.
    pub fn trail_flat(&self, i: usize) -> Vec<f32> {
        let (Some(body), Some(trail)) = (self.sim.body(i), self.sim.trail_of(i)) else {
            return Vec::new();
        };
        if !body.renders_trail() {
            return Vec::new();
        }
        let len = trail.len();
        let mut out = Vec::with_capacity(len * 5);
        for (k, p) in trail.iter().enumerate() {
            let style = trail_sample_style(k, len, body.radius());
            out.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32, style.alpha, style.radius as f32]);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::scenarios::{SCENARIO_BINARY, SCENARIO_STAR_SYSTEM};

    fn seeded() -> SimConfig {
        SimConfig::default().with_seed(9)
    }

    #[test]
    fn builtin_scenario_uses_its_own_constant() {
        let engine = Engine::new_builtin("five-body", SimConfig::default().with_g(3.0)).unwrap();
        assert_eq!(engine.simulator().g(), 100.0);
        assert_eq!(engine.len(), 5);
    }

    #[test]
    fn unknown_scenario_is_an_error() {
        assert!(matches!(
            Engine::new_builtin("missing", seeded()),
            Err(SimError::UnknownScenario(_))
        ));
    }

    #[test]
    fn tick_advances_one_fixed_step() {
        let mut engine = Engine::new_builtin(SCENARIO_BINARY, seeded()).unwrap();
        engine.tick().unwrap();
        engine.tick().unwrap();
        assert_eq!(engine.simulator().frame(), 2);
        assert!((engine.simulator().time() - 2.0 * engine.dt()).abs() < 1e-12);
    }

    #[test]
    fn spawn_grows_every_export() {
        let mut engine = Engine::new_builtin(SCENARIO_BINARY, seeded()).unwrap();
        let index = engine.spawn_at(Vector3::new(0.0, 40.0, 0.0)).unwrap();
        assert_eq!(index, 2);
        assert_eq!(engine.positions_flat().len(), 9);
        assert_eq!(engine.radii_flat().len(), 3);
        assert_eq!(engine.colors_flat().len(), 12);
        assert_eq!(engine.simulator().pairs().len(), 3);
        engine.tick().unwrap();
        assert_eq!(engine.trail_flat(2).len(), 5);
    }

    #[test]
    fn same_seed_spawns_identically() {
        let mut a = Engine::new_builtin(SCENARIO_BINARY, seeded()).unwrap();
        let mut b = Engine::new_builtin(SCENARIO_BINARY, seeded()).unwrap();
        a.spawn_at(Vector3::new(5.0, 30.0, 0.0)).unwrap();
        b.spawn_at(Vector3::new(5.0, 30.0, 0.0)).unwrap();
        assert_eq!(a.simulator().state_matrix(), b.simulator().state_matrix());
        assert_eq!(a.simulator().masses(), b.simulator().masses());
    }

    #[test]
    fn star_trail_is_recorded_but_not_exported() {
        let mut engine = Engine::new_builtin(SCENARIO_STAR_SYSTEM, seeded()).unwrap();
        for _ in 0..3 {
            engine.tick().unwrap();
        }
        assert_eq!(engine.simulator().trail_of(0).unwrap().len(), 3);
        assert!(engine.trail_flat(0).is_empty());
        assert_eq!(engine.trail_flat(1).len(), 15);
    }

    #[test]
    fn toggled_mode_flattens_on_next_tick() {
        let mut engine = Engine::new_custom(
            vec![
                BodyConfig::new(1.0, [0.0, 0.0, 1.0, 0.0, 0.0, 0.5]),
                BodyConfig::new(1.0, [5.0, 0.0, -1.0, 0.0, 0.0, 0.0]),
            ],
            seeded(),
        )
        .unwrap();
        assert_eq!(engine.toggle_mode(), SimMode::Planar);
        engine.tick().unwrap();
        assert!(engine.positions_flat().chunks(3).all(|p| p[2] == 0.0));
    }

    #[test]
    fn overflowing_spawn_ranges_fail_at_build() {
        let config: SimConfig = serde_json::from_str(r#"{ "seed": 1, "spawn": { "max_speed": 1e308 } }"#).unwrap();
        assert!(matches!(
            Engine::new_builtin(SCENARIO_BINARY, config),
            Err(SimError::InvalidSpawn { field: "max_speed", .. })
        ));
    }

    #[test]
    fn non_positive_frame_dt_is_rejected() {
        let config = SimConfig { dt: 0.0, ..seeded() };
        assert!(matches!(
            Engine::new_builtin(SCENARIO_BINARY, config),
            Err(SimError::InvalidStep(_))
        ));
    }
}
