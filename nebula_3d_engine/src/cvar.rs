//! Console-variable store
//!
//! Named runtime-tunable values read by the render core once per frame
//! (clear color, ambient light, debug flags). The core only reads; writes
//! come from the console / tooling side through
//! [`EngineContext::with_cvars_mut`](crate::context::EngineContext::with_cvars_mut).

use glam::{Vec3, Vec4};
use rustc_hash::FxHashMap;

/// A typed console-variable value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CvarValue {
    Bool(bool),
    Int(i64),
    Float(f32),
    Vec3(Vec3),
    Vec4(Vec4),
}

/// Name-keyed store of console variables.
///
/// Readers use the `get_*_or` accessors with a default so a missing or
/// mistyped cvar never breaks the frame loop.
///
/// # Example
///
/// ```
/// use nebula_3d_engine::cvar::{CvarStore, CvarValue};
///
/// let mut cvars = CvarStore::new();
/// cvars.set("render.log_frame_stats", CvarValue::Bool(true));
/// assert!(cvars.get_bool_or("render.log_frame_stats", false));
/// ```
pub struct CvarStore {
    values: FxHashMap<String, CvarValue>,
}

impl CvarStore {
    /// Create a store seeded with the renderer's default tunables
    pub fn new() -> Self {
        let mut store = Self {
            values: FxHashMap::default(),
        };
        store.set("render.clear_color", CvarValue::Vec4(Vec4::new(0.01, 0.01, 0.03, 1.0)));
        store.set("render.ambient_light", CvarValue::Vec3(Vec3::splat(0.08)));
        store.set("render.log_frame_stats", CvarValue::Bool(false));
        store
    }

    /// Set or overwrite a cvar
    pub fn set(&mut self, name: &str, value: CvarValue) {
        self.values.insert(name.to_string(), value);
    }

    /// Raw lookup
    pub fn get(&self, name: &str) -> Option<&CvarValue> {
        self.values.get(name)
    }

    /// Number of defined cvars
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no cvars are defined
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Read a bool cvar, falling back to `default` on missing/mistyped
    pub fn get_bool_or(&self, name: &str, default: bool) -> bool {
        match self.values.get(name) {
            Some(CvarValue::Bool(v)) => *v,
            _ => default,
        }
    }

    /// Read an int cvar, falling back to `default` on missing/mistyped
    pub fn get_int_or(&self, name: &str, default: i64) -> i64 {
        match self.values.get(name) {
            Some(CvarValue::Int(v)) => *v,
            _ => default,
        }
    }

    /// Read a float cvar, falling back to `default` on missing/mistyped
    pub fn get_float_or(&self, name: &str, default: f32) -> f32 {
        match self.values.get(name) {
            Some(CvarValue::Float(v)) => *v,
            _ => default,
        }
    }

    /// Read a Vec3 cvar, falling back to `default` on missing/mistyped
    pub fn get_vec3_or(&self, name: &str, default: Vec3) -> Vec3 {
        match self.values.get(name) {
            Some(CvarValue::Vec3(v)) => *v,
            _ => default,
        }
    }

    /// Read a Vec4 cvar, falling back to `default` on missing/mistyped
    pub fn get_vec4_or(&self, name: &str, default: Vec4) -> Vec4 {
        match self.values.get(name) {
            Some(CvarValue::Vec4(v)) => *v,
            _ => default,
        }
    }
}

impl Default for CvarStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "cvar_tests.rs"]
mod tests;
