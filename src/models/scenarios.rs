use nalgebra::Vector3;

use crate::error::SimError;
use crate::{BodyConfig, BLUE, BROWN, GREEN, RED, SKY_BLUE, VIOLET, YELLOW};

pub const SCENARIO_BINARY: &str = "binary";
pub const SCENARIO_STAR_SYSTEM: &str = "star-system";
pub const SCENARIO_FIVE_BODY: &str = "five-body";
pub const SCENARIO_FROM_STATES: &str = "from-states";

pub const STAR_MASS: f64 = 1.0e6;
pub const FIVE_BODY_G: f64 = 100.0;

pub struct ScenarioInfo {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

pub fn scenario_catalog() -> &'static [ScenarioInfo] {
    &[
        ScenarioInfo {
            id: SCENARIO_BINARY,
            name: "Binary",
            description: "Two equal masses on a shared circular orbit around the origin.",
        },
        ScenarioInfo {
            id: SCENARIO_STAR_SYSTEM,
            name: "Star system",
            description: "One star with three planets on circular orbits.",
        },
        ScenarioInfo {
            id: SCENARIO_FIVE_BODY,
            name: "Five bodies",
            description: "Five bodies released at rest on a 1920x1080 canvas, G = 100.",
        },
        ScenarioInfo {
            id: SCENARIO_FROM_STATES,
            name: "Custom",
            description: "Built from packed [x, y, z, vx, vy, vz] states.",
        },
    ]
}

/// A built-in scenario: initial bodies plus the gravitational constant they
/// were tuned for.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub id: &'static str,
    pub g: f64,
    pub bodies: Vec<BodyConfig>,
}

pub fn build_scenario(id: &str) -> Result<Scenario, SimError> {
    match id {
        SCENARIO_BINARY => Ok(Scenario { id: SCENARIO_BINARY, g: 1.0, bodies: binary_configs(1.0e3, 20.0) }),
        SCENARIO_STAR_SYSTEM => Ok(Scenario { id: SCENARIO_STAR_SYSTEM, g: 1.0, bodies: star_system_configs() }),
        SCENARIO_FIVE_BODY => Ok(Scenario { id: SCENARIO_FIVE_BODY, g: FIVE_BODY_G, bodies: five_body_configs() }),
        // from-states has no built-in bodies, see Engine::new_from_states
        other => Err(SimError::UnknownScenario(other.to_string())),
    }
}

/// Convert packed states [x,y,z,vx,vy,vz]* into BodyConfig list.
pub fn configs_from_states(states: &[f64], mass: f64) -> Result<Vec<BodyConfig>, SimError> {
    if states.len() % 6 != 0 {
        return Err(SimError::MalformedState {
            index: states.len() / 6,
            len: states.len() % 6,
        });
    }
    Ok(states
        .chunks_exact(6)
        .map(|s| BodyConfig::new(mass, [s[0], s[1], s[2], s[3], s[4], s[5]]))
        .collect())
}

/// Two bodies of `mass`, `separation` apart on the x axis, moving on the
/// circular orbit of the pair with G = 1.
pub fn binary_configs(mass: f64, separation: f64) -> Vec<BodyConfig> {
    let half = separation / 2.0;
    let v = (mass / (2.0 * separation)).sqrt();
    vec![
        BodyConfig::new(mass, [-half, 0.0, 0.0, 0.0, -v, 0.0])
            .with_radius(8.0)
            .with_color(RED),
        BodyConfig::new(mass, [half, 0.0, 0.0, 0.0, v, 0.0])
            .with_radius(8.0)
            .with_color(SKY_BLUE),
    ]
}

/// Star at the origin with planets on circular orbits in the xy plane (G = 1).
pub fn star_system_configs() -> Vec<BodyConfig> {
    let mut configs = vec![BodyConfig::new(STAR_MASS, [0.0; 6])
        .with_radius(30.0)
        .with_color(YELLOW)];

    let planets = [(100.0, 10.0, 6.0, BLUE), (160.0, 40.0, 9.0, GREEN), (240.0, 25.0, 7.0, VIOLET)];
    for (i, (r, mass, radius, color)) in planets.into_iter().enumerate() {
        let angle = i as f64 * 2.0 * std::f64::consts::PI / planets.len() as f64;
        let pos = Vector3::new(r * angle.cos(), r * angle.sin(), 0.0);
        let tangent = Vector3::new(-angle.sin(), angle.cos(), 0.0);
        let vel = tangent * (STAR_MASS / r).sqrt();
        configs.push(
            BodyConfig::new(mass, [pos.x, pos.y, pos.z, vel.x, vel.y, vel.z])
                .with_radius(radius)
                .with_color(color),
        );
    }
    configs
}

/// Five bodies at rest in screen coordinates.
pub fn five_body_configs() -> Vec<BodyConfig> {
    let layout = [
        ((960.0, 540.0), 1000.0, 30.0, RED),
        ((80.0, 60.0), 100.0, 15.0, BLUE),
        ((960.0, 360.0), 50.0, 12.0, BROWN),
        ((480.0, 540.0), 25.0, 10.0, GREEN),
        ((360.0, 120.0), 12.5, 5.0, VIOLET),
    ];
    layout
        .into_iter()
        .map(|((x, y), mass, radius, color)| {
            BodyConfig::at_rest(mass, Vector3::new(x, y, 0.0))
                .with_radius(radius)
                .with_color(color)
        })
        .collect()
}
