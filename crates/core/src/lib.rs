//! Core library for the Optical EKG lesson engine.
//!
//! Lessons walk a learner through the cardiac conduction system one step at a
//! time. Each module owns one subsystem: the static lesson and EKG catalogs,
//! the single-writer lesson store, the camera animator, the highlight
//! projector and the headless renderer they drive. [`LessonSession`] wires
//! them together behind a frame tick.

pub mod camera;
pub mod config;
pub mod ekg;
pub mod error;
pub mod highlight;
pub mod lesson;
pub mod render;
pub mod scene;
pub mod session;
pub mod store;
pub mod timeline;

pub use camera::{
    clamp_pose_distance, ease_in_out_cubic, AnimatorState, CameraAnimator, CameraPose, CameraRig,
    OrbitControls, Vec3,
};
pub use config::{AppConfig, CameraConfig, CameraLimits, EkgConfig, HighlightConfig};
pub use ekg::{trace_progress, EkgCatalog, EkgPattern, EkgSegment, Point, TracePath, TraceTween};
pub use error::{OpticalEkgError, Result};
pub use highlight::{Color, HighlightProjector, MaterialState, PaintableRegistry};
pub use lesson::{LessonCatalog, LessonModule, LessonStep, StructureSet};
pub use render::SceneRenderer;
pub use scene::{validate_patterns, SceneDescriptor, HEART_STRUCTURES};
pub use session::{FrameReport, LessonSession};
pub use store::{LearningState, LessonStore, StoreEvent};
pub use timeline::FrameClock;
