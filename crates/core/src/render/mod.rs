use std::collections::BTreeMap;

use crate::{
    camera::{CameraPose, CameraRig, OrbitControls},
    config::CameraConfig,
    highlight::{MaterialState, PaintableRegistry},
    scene::SceneDescriptor,
};

/// Rendering backend abstraction. This implementation keeps the paintable
/// structures and the orbit camera in memory so the lesson engine can run
/// headless; a GPU backend only needs to mirror this state each frame.
#[derive(Debug, Clone)]
pub struct SceneRenderer {
    structures: BTreeMap<String, MaterialState>,
    camera: CameraPose,
    orbit: OrbitControls,
}

impl SceneRenderer {
    pub fn new(config: &CameraConfig) -> Self {
        let orbit = OrbitControls::new(&config.limits);
        let mut camera = config.default_pose;
        orbit.clamp_distance(&mut camera);
        Self {
            structures: BTreeMap::new(),
            camera,
            orbit,
        }
    }

    /// Creates a renderer with every structure of `scene`, all starting from
    /// the same material definition.
    pub fn from_scene(scene: &SceneDescriptor, material: &MaterialState, config: &CameraConfig) -> Self {
        let mut renderer = Self::new(config);
        for name in &scene.structures {
            renderer.register_structure(name.clone(), material);
        }
        renderer
    }

    /// Adds a structure with its own copy of `material`.
    pub fn register_structure(&mut self, name: impl Into<String>, material: &MaterialState) {
        self.structures.insert(name.into(), *material);
    }

    pub fn material(&self, name: &str) -> Option<&MaterialState> {
        self.structures.get(name)
    }

    pub fn materials(&self) -> impl Iterator<Item = (&str, &MaterialState)> {
        self.structures
            .iter()
            .map(|(name, material)| (name.as_str(), material))
    }

    pub fn camera(&self) -> CameraPose {
        self.camera
    }

    pub fn orbit_enabled(&self) -> bool {
        self.orbit.enabled
    }

    /// User orbit input. Ignored while a camera transition runs.
    pub fn orbit(&mut self, delta_azimuth: f32, delta_elevation: f32) {
        self.orbit
            .orbit(&mut self.camera, delta_azimuth, delta_elevation);
    }

    /// User zoom input. Ignored while a camera transition runs.
    pub fn zoom(&mut self, factor: f32) {
        self.orbit.zoom(&mut self.camera, factor);
    }
}

impl CameraRig for SceneRenderer {
    fn pose(&self) -> CameraPose {
        self.camera
    }

    fn set_pose(&mut self, pose: CameraPose) {
        self.camera = pose;
    }

    fn set_orbit_enabled(&mut self, enabled: bool) {
        self.orbit.enabled = enabled;
    }

    fn distance_limits(&self) -> (f32, f32) {
        (self.orbit.min_distance, self.orbit.max_distance)
    }

    /// New bounds apply at once to an idle camera; a running transition keeps
    /// its destination until the next one starts.
    fn set_distance_limits(&mut self, min: f32, max: f32) {
        self.orbit.set_limits(min, max);
        if self.orbit.enabled {
            self.orbit.clamp_distance(&mut self.camera);
        }
    }
}

impl PaintableRegistry for SceneRenderer {
    fn structure_names(&self) -> Vec<String> {
        self.structures.keys().cloned().collect()
    }

    fn material_mut(&mut self, name: &str) -> Option<&mut MaterialState> {
        self.structures.get_mut(name)
    }
}
