#![cfg(target_arch = "wasm32")]

use crate::config::{SimConfig, SimMode};
use crate::engine::Engine;
use crate::models::scenarios::{scenario_catalog, ScenarioInfo, SCENARIO_STAR_SYSTEM};
use crate::BodyConfig;
use nalgebra::Vector3;
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub fn available_scenarios() -> js_sys::Array {
    let out = js_sys::Array::new();
    for info in scenario_catalog() {
        out.push(&scenario_info_to_js(info));
    }
    out
}

#[wasm_bindgen]
pub fn config_defaults() -> JsValue {
    serde_wasm_bindgen::to_value(&SimConfig::default()).unwrap_or(JsValue::NULL)
}

fn scenario_info_to_js(info: &ScenarioInfo) -> JsValue {
    let obj = js_sys::Object::new();
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("id"), &JsValue::from_str(info.id));
    let _ = js_sys::Reflect::set(&obj, &JsValue::from_str("name"), &JsValue::from_str(info.name));
    let _ = js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("description"),
        &JsValue::from_str(info.description),
    );
    JsValue::from(obj)
}

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[wasm_bindgen]
pub struct WasmSim {
    engine: Engine,
}

#[wasm_bindgen]
impl WasmSim {
    #[wasm_bindgen(constructor)]
    pub fn new(states: Vec<f64>, dt: f64) -> Result<WasmSim, JsValue> {
        let config = SimConfig { dt, ..SimConfig::default() };
        let engine = Engine::new_from_states(&states, config).map_err(to_js_error)?;
        Ok(WasmSim { engine })
    }

    #[wasm_bindgen(js_name = "newWithId")]
    pub fn new_with_id(scenario_id: &str) -> Result<WasmSim, JsValue> {
        let engine = Engine::new_builtin(scenario_id, SimConfig::default()).map_err(to_js_error)?;
        Ok(WasmSim { engine })
    }

    pub fn new_demo() -> Result<WasmSim, JsValue> {
        Self::new_with_id(SCENARIO_STAR_SYSTEM)
    }

    /// Build simulation from a custom config object:
    /// {
    ///   scenario?: string,
    ///   config?: { g?, dt?, mode?: "planar" | "spatial", min_separation?, seed?, spawn? },
    ///   bodies?: [{ position: [f64;3], velocity?: [f64;3], mass: f64, radius?: f64, color?: [u8;4] }]
    /// }
    #[wasm_bindgen(js_name = "newFromConfig")]
    pub fn new_from_config(config: JsValue) -> Result<WasmSim, JsValue> {
        let cfg: CustomConfig = serde_wasm_bindgen::from_value(config)
            .map_err(|e| JsValue::from_str(&format!("invalid config: {}", e)))?;
        let sim_config = cfg.config.unwrap_or_default();
        let engine = match (cfg.scenario, cfg.bodies) {
            (Some(id), _) => Engine::new_builtin(&id, sim_config),
            (None, Some(bodies)) => {
                Engine::new_custom(bodies.into_iter().map(CustomBody::into_config).collect(), sim_config)
            }
            (None, None) => return Err(JsValue::from_str("config needs either 'scenario' or 'bodies'")),
        }
        .map_err(to_js_error)?;
        Ok(WasmSim { engine })
    }

    pub fn len(&self) -> usize { self.engine.len() }

    pub fn step(&mut self) -> Result<(), JsValue> {
        self.engine.tick().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = "addBody")]
    pub fn add_body(&mut self, x: f64, y: f64, z: f64) -> Result<usize, JsValue> {
        self.engine.spawn_at(Vector3::new(x, y, z)).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = "setPlanar")]
    pub fn set_planar(&mut self, enabled: bool) {
        let mode = if enabled { SimMode::Planar } else { SimMode::Spatial };
        self.engine.set_mode(mode);
    }

    #[wasm_bindgen(js_name = "toggleMode")]
    pub fn toggle_mode(&mut self) -> bool {
        self.engine.toggle_mode() == SimMode::Planar
    }

    pub fn positions(&self) -> Vec<f32> { self.engine.positions_flat() }

    pub fn states(&self) -> Vec<f32> { self.engine.state_matrix_flat() }

    pub fn radii(&self) -> Vec<f32> { self.engine.radii_flat() }

    pub fn colors(&self) -> Vec<u8> { self.engine.colors_flat() }

    pub fn trail(&self, index: usize) -> Vec<f32> { self.engine.trail_flat(index) }

    pub fn dt(&self) -> f64 { self.engine.dt() }

    pub fn time(&self) -> f64 { self.engine.simulator().time() }
}

#[derive(Debug, Deserialize)]
struct CustomConfig {
    #[serde(default)]
    scenario: Option<String>,
    #[serde(default)]
    config: Option<SimConfig>,
    #[serde(default)]
    bodies: Option<Vec<CustomBody>>,
}

#[derive(Debug, Deserialize)]
struct CustomBody {
    position: [f64; 3],
    #[serde(default)]
    velocity: Option<[f64; 3]>,
    mass: f64,
    #[serde(default)]
    radius: Option<f64>,
    #[serde(default)]
    color: Option<[u8; 4]>,
}

impl CustomBody {
    fn into_config(self) -> BodyConfig {
        let p = self.position;
        let v = self.velocity.unwrap_or([0.0, 0.0, 0.0]);
        let mut config = BodyConfig::new(self.mass, [p[0], p[1], p[2], v[0], v[1], v[2]])
            .with_radius(self.radius.unwrap_or(0.0));
        if let Some([r, g, b, a]) = self.color {
            config = config.with_color(crate::Color { r, g, b, a });
        }
        config
    }
}
