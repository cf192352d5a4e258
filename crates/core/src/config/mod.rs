use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{
    camera::{CameraPose, Vec3, DEFAULT_ANIMATION_RATE},
    error::OpticalEkgError,
    highlight::{Color, MaterialState},
    Result,
};

/// Top-level configuration structure for the application.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub camera: CameraConfig,
    pub highlight: HighlightConfig,
    pub ekg: EkgConfig,
    /// Frames per second used by the command line frame driver.
    pub frame_rate: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            highlight: HighlightConfig::default(),
            ekg: EkgConfig::default(),
            frame_rate: 60,
        }
    }
}

impl AppConfig {
    /// Reads a JSON configuration file. Missing fields keep their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_json_str(&raw)?;
        tracing::info!(?path, "loaded configuration");
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the animator and the orbit controls cannot work with.
    pub fn validate(&self) -> Result<()> {
        let camera = &self.camera;
        let rate_ok = camera.rate.is_finite() && camera.rate > 0.0;
        if !rate_ok {
            return Err(OpticalEkgError::msg(format!(
                "camera rate must be positive, got {}",
                camera.rate
            )));
        }
        let limits = &camera.limits;
        let limits_ok = limits.min_distance > 0.0 && limits.min_distance <= limits.max_distance;
        if !limits_ok {
            return Err(OpticalEkgError::msg(format!(
                "camera distance limits must satisfy 0 < min <= max, got [{}, {}]",
                limits.min_distance, limits.max_distance
            )));
        }
        Ok(())
    }

    /// Seconds covered by a single frame of the frame driver.
    pub fn frame_interval(&self) -> f32 {
        1.0 / self.frame_rate.max(1) as f32
    }
}

/// Camera placement and animation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Pose used on startup and whenever the lesson module is deselected.
    pub default_pose: CameraPose,
    pub limits: CameraLimits,
    /// Animation progress units per second.
    pub rate: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            default_pose: CameraPose {
                position: Vec3::new(0.0, 0.0, 5.0),
                target: Vec3::new(0.0, 1.5, 0.0),
            },
            limits: CameraLimits::default(),
            rate: DEFAULT_ANIMATION_RATE,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraLimits {
    pub min_distance: f32,
    pub max_distance: f32,
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for CameraLimits {
    fn default() -> Self {
        Self {
            min_distance: 3.0,
            max_distance: 4.5,
            fov: 65.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

/// Material states the highlight projector switches between.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightConfig {
    pub default: MaterialState,
    pub highlighted: MaterialState,
}

impl Default for HighlightConfig {
    fn default() -> Self {
        let highlight = Color::rgb(0x42, 0x87, 0xf5);
        Self {
            default: MaterialState {
                color: Color::WHITE,
                emissive: Color::WHITE,
                emissive_intensity: 0.4,
                metalness: 0.4,
                roughness: 0.3,
                opacity: 1.0,
                transparent: true,
            },
            highlighted: MaterialState {
                color: highlight,
                emissive: highlight,
                emissive_intensity: 0.6,
                metalness: 0.7,
                roughness: 0.3,
                opacity: 1.0,
                transparent: true,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EkgConfig {
    /// Pattern selected when a session starts.
    pub default_pattern: String,
    /// Seconds the displayed trace takes to reach a new percentage.
    pub tween_seconds: f32,
}

impl Default for EkgConfig {
    fn default() -> Self {
        Self {
            default_pattern: "normal-sinus-rhythm".to_string(),
            tween_seconds: 0.5,
        }
    }
}
