//! Camera pose interpolation for lesson steps.
//!
//! The [`CameraAnimator`] is an explicit two-state machine. It never reads the
//! lesson store directly; the session hands it a destination pose and an
//! elapsed-time tick and it pushes interpolated poses into a [`CameraRig`].

use serde::{Deserialize, Serialize};

use crate::config::{CameraConfig, CameraLimits};

/// Progress units gained per second of animation.
pub const DEFAULT_ANIMATION_RATE: f32 = 1.5;

const MAX_ELEVATION: f32 = 1.4;
const MIN_RADIUS: f32 = 1e-6;

/// Point or direction in scene space. Serialised as a `[x, y, z]` array.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f32; 3]", into = "[f32; 3]")]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3::new(0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Linear interpolation
    pub fn lerp(&self, other: &Vec3, t: f32) -> Vec3 {
        Vec3 {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
            z: self.z + (other.z - self.z) * t,
        }
    }

    pub fn sub(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    pub fn add(&self, other: &Vec3) -> Vec3 {
        Vec3::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    pub fn scale(&self, factor: f32) -> Vec3 {
        Vec3::new(self.x * factor, self.y * factor, self.z * factor)
    }

    pub fn length(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    pub fn distance(&self, other: &Vec3) -> f32 {
        self.sub(other).length()
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(value: [f32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<Vec3> for [f32; 3] {
    fn from(value: Vec3) -> Self {
        [value.x, value.y, value.z]
    }
}

/// Camera eye position plus the point it orbits around.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CameraPose {
    pub position: Vec3,
    pub target: Vec3,
}

impl CameraPose {
    pub fn new(position: impl Into<Vec3>, target: impl Into<Vec3>) -> Self {
        Self {
            position: position.into(),
            target: target.into(),
        }
    }

    pub fn lerp(&self, other: &CameraPose, t: f32) -> CameraPose {
        CameraPose {
            position: self.position.lerp(&other.position, t),
            target: self.target.lerp(&other.target, t),
        }
    }

    /// Distance between the eye and its orbit target.
    pub fn distance(&self) -> f32 {
        self.position.distance(&self.target)
    }
}

/// Cubic ease-in-out over normalised time.
pub fn ease_in_out_cubic(x: f32) -> f32 {
    if x < 0.5 {
        4.0 * x * x * x
    } else {
        1.0 - (-2.0 * x + 2.0).powi(3) / 2.0
    }
}

/// Samples the eased transition between two poses.
///
/// Progress is clamped to `[0, 1]`; the end points return the exact input
/// poses rather than the result of the interpolation arithmetic.
pub fn interpolate(start: &CameraPose, destination: &CameraPose, progress: f32) -> CameraPose {
    let progress = progress.clamp(0.0, 1.0);
    if progress <= 0.0 {
        return *start;
    }
    if progress >= 1.0 {
        return *destination;
    }
    start.lerp(destination, ease_in_out_cubic(progress))
}

/// Renderer-side camera the animator drives.
pub trait CameraRig {
    /// Current eye position and orbit target, including any manual orbiting.
    fn pose(&self) -> CameraPose;
    /// Moves both the camera and the orbit target.
    fn set_pose(&mut self, pose: CameraPose);
    /// Enables or suspends user orbit input.
    fn set_orbit_enabled(&mut self, enabled: bool);
    /// Eye-to-target distance range `(min, max)` held while idle.
    fn distance_limits(&self) -> (f32, f32);
    fn set_distance_limits(&mut self, min: f32, max: f32);
}

/// Moves the eye along its view ray until its distance to the target lies in
/// `[min, max]`. Swapped bounds are reordered.
pub fn clamp_pose_distance(pose: CameraPose, min: f32, max: f32) -> CameraPose {
    let (min, max) = ordered(min, max);
    let rel = pose.position.sub(&pose.target);
    let radius = rel.length();
    if radius <= MIN_RADIUS {
        return pose;
    }
    let clamped = radius.max(min).min(max);
    if (clamped - radius).abs() <= f32::EPSILON {
        return pose;
    }
    CameraPose {
        position: pose.target.add(&rel.scale(clamped / radius)),
        target: pose.target,
    }
}

fn ordered(a: f32, b: f32) -> (f32, f32) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimatorState {
    /// Camera held at the last commanded pose; the user may orbit freely.
    Idle,
    /// Interpolating towards `destination`; user orbit is suspended.
    Animating {
        start: CameraPose,
        destination: CameraPose,
        progress: f32,
    },
}

/// Drives smooth camera transitions between lesson steps.
#[derive(Debug, Clone)]
pub struct CameraAnimator {
    state: AnimatorState,
    rate: f32,
    default_pose: CameraPose,
}

impl CameraAnimator {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            state: AnimatorState::Idle,
            rate: if config.rate.is_finite() && config.rate > 0.0 {
                config.rate
            } else {
                tracing::warn!(rate = config.rate, "invalid camera rate, using default");
                DEFAULT_ANIMATION_RATE
            },
            default_pose: config.default_pose,
        }
    }

    pub fn state(&self) -> &AnimatorState {
        &self.state
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.state, AnimatorState::Animating { .. })
    }

    pub fn default_pose(&self) -> CameraPose {
        self.default_pose
    }

    /// Starts a transition from wherever the camera currently is.
    ///
    /// A transition already in flight is redirected: its current interpolated
    /// pose becomes the new start, so there is no jump. The destination is
    /// pulled inside the rig's distance limits so the camera comes to rest
    /// where orbit input will not move it.
    pub fn animate_to<R: CameraRig + ?Sized>(&mut self, destination: CameraPose, rig: &mut R) {
        let (min, max) = rig.distance_limits();
        let destination = clamp_pose_distance(destination, min, max);
        let start = rig.pose();
        tracing::debug!(?start, ?destination, "camera transition started");
        rig.set_orbit_enabled(false);
        self.state = AnimatorState::Animating {
            start,
            destination,
            progress: 0.0,
        };
    }

    /// Starts a transition back to the configured default pose.
    pub fn return_to_default<R: CameraRig + ?Sized>(&mut self, rig: &mut R) {
        let destination = self.default_pose;
        self.animate_to(destination, rig);
    }

    /// Advances the transition by `elapsed` seconds.
    ///
    /// Returns the pose pushed to the rig, or `None` while idle.
    pub fn update<R: CameraRig + ?Sized>(&mut self, elapsed: f32, rig: &mut R) -> Option<CameraPose> {
        let AnimatorState::Animating {
            start,
            destination,
            progress,
        } = self.state
        else {
            return None;
        };

        let progress = (progress + elapsed.max(0.0) * self.rate).clamp(0.0, 1.0);
        let pose = interpolate(&start, &destination, progress);
        rig.set_pose(pose);

        if progress >= 1.0 {
            tracing::debug!(?destination, "camera transition finished");
            self.state = AnimatorState::Idle;
            rig.set_orbit_enabled(true);
        } else {
            self.state = AnimatorState::Animating {
                start,
                destination,
                progress,
            };
        }

        Some(pose)
    }
}

/// User orbit input constraints. There is no automatic rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitControls {
    pub enabled: bool,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl OrbitControls {
    pub fn new(limits: &CameraLimits) -> Self {
        let mut controls = Self {
            enabled: true,
            min_distance: 0.0,
            max_distance: 0.0,
        };
        controls.set_limits(limits.min_distance, limits.max_distance);
        controls
    }

    pub fn set_limits(&mut self, min: f32, max: f32) {
        let (min, max) = ordered(min, max);
        self.min_distance = min;
        self.max_distance = max;
    }

    /// Rotates the eye around the target. Y is up.
    pub fn orbit(&self, pose: &mut CameraPose, delta_azimuth: f32, delta_elevation: f32) {
        if !self.enabled {
            return;
        }
        let rel = pose.position.sub(&pose.target);
        let radius = rel.length();
        if radius <= MIN_RADIUS {
            return;
        }
        let theta = rel.x.atan2(rel.z) + delta_azimuth;
        let phi = ((rel.y / radius).clamp(-1.0, 1.0).asin() + delta_elevation)
            .clamp(-MAX_ELEVATION, MAX_ELEVATION);

        let offset = Vec3::new(
            radius * phi.cos() * theta.sin(),
            radius * phi.sin(),
            radius * phi.cos() * theta.cos(),
        );
        pose.position = pose.target.add(&offset);
        self.clamp_distance(pose);
    }

    /// Dollies the eye towards (`factor < 1`) or away from the target.
    pub fn zoom(&self, pose: &mut CameraPose, factor: f32) {
        if !self.enabled || factor <= 0.0 {
            return;
        }
        let rel = pose.position.sub(&pose.target).scale(factor);
        pose.position = pose.target.add(&rel);
        self.clamp_distance(pose);
    }

    /// Pulls the eye back inside `[min_distance, max_distance]`.
    pub fn clamp_distance(&self, pose: &mut CameraPose) {
        *pose = clamp_pose_distance(*pose, self.min_distance, self.max_distance);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct TestRig {
        pose: CameraPose,
        orbit_enabled: bool,
        limits: (f32, f32),
    }

    impl TestRig {
        fn at(pose: CameraPose) -> Self {
            Self {
                pose,
                orbit_enabled: true,
                limits: (0.0, f32::MAX),
            }
        }
    }

    impl CameraRig for TestRig {
        fn pose(&self) -> CameraPose {
            self.pose
        }

        fn set_pose(&mut self, pose: CameraPose) {
            self.pose = pose;
        }

        fn set_orbit_enabled(&mut self, enabled: bool) {
            self.orbit_enabled = enabled;
        }

        fn distance_limits(&self) -> (f32, f32) {
            self.limits
        }

        fn set_distance_limits(&mut self, min: f32, max: f32) {
            self.limits = (min, max);
        }
    }

    fn poses() -> (CameraPose, CameraPose) {
        (
            CameraPose::new([0.0, 0.0, 5.0], [0.0, 1.5, 0.0]),
            CameraPose::new([0.3, 1.0, 4.0], [0.1, 1.2, 0.2]),
        )
    }

    #[test]
    fn easing_hits_fixed_points() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(0.5), 0.5);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!(ease_in_out_cubic(0.25) < 0.25);
        assert!(ease_in_out_cubic(0.75) > 0.75);
    }

    #[test]
    fn interpolation_returns_exact_end_points() {
        let (start, end) = poses();
        assert_eq!(interpolate(&start, &end, 0.0), start);
        assert_eq!(interpolate(&start, &end, 1.0), end);
        assert_eq!(interpolate(&start, &end, 3.0), end);
        assert_eq!(interpolate(&start, &end, -1.0), start);

        let mid = interpolate(&start, &end, 0.5);
        assert_eq!(mid, start.lerp(&end, 0.5));
        let quarter = interpolate(&start, &end, 0.25);
        assert_ne!(quarter, start.lerp(&end, 0.25));
    }

    #[test]
    fn animation_captures_current_pose_and_snaps_at_end() {
        let (_, end) = poses();
        let manual = CameraPose::new([2.0, 2.0, 2.0], [0.0, 0.0, 0.0]);
        let mut rig = TestRig::at(manual);
        let mut animator = CameraAnimator::new(&CameraConfig::default());

        animator.animate_to(end, &mut rig);
        assert!(!rig.orbit_enabled);
        match animator.state() {
            AnimatorState::Animating {
                start, progress, ..
            } => {
                assert_eq!(*start, manual);
                assert_eq!(*progress, 0.0);
            }
            AnimatorState::Idle => panic!("expected animating"),
        }

        animator.update(0.2, &mut rig);
        assert!(animator.is_animating());
        assert_ne!(rig.pose, end);

        animator.update(1.0, &mut rig);
        assert!(!animator.is_animating());
        assert_eq!(rig.pose, end);
        assert!(rig.orbit_enabled);
        assert!(animator.update(0.1, &mut rig).is_none());
    }

    #[test]
    fn retrigger_redirects_from_interpolated_pose() {
        let (start, end) = poses();
        let mut rig = TestRig::at(start);
        let mut animator = CameraAnimator::new(&CameraConfig::default());
        animator.animate_to(end, &mut rig);
        animator.update(0.3, &mut rig);
        let midway = rig.pose;

        animator.return_to_default(&mut rig);
        match animator.state() {
            AnimatorState::Animating {
                start,
                destination,
                progress,
            } => {
                assert_eq!(*start, midway);
                assert_eq!(*destination, CameraConfig::default().default_pose);
                assert_eq!(*progress, 0.0);
            }
            AnimatorState::Idle => panic!("expected animating"),
        }
    }

    #[test]
    fn stalled_frames_do_not_advance() {
        let (start, end) = poses();
        let mut rig = TestRig::at(start);
        let mut animator = CameraAnimator::new(&CameraConfig::default());
        animator.animate_to(end, &mut rig);
        animator.update(0.0, &mut rig);
        animator.update(-5.0, &mut rig);
        assert_eq!(rig.pose, start);
        assert!(animator.is_animating());
    }

    #[test]
    fn orbit_keeps_distance_within_limits() {
        let controls = OrbitControls::new(&CameraLimits::default());
        let mut pose = CameraPose::new([0.0, 1.5, 4.0], [0.0, 1.5, 0.0]);

        controls.orbit(&mut pose, 0.7, 0.3);
        assert!((pose.distance() - 4.0).abs() < 1e-4);

        controls.zoom(&mut pose, 10.0);
        assert!((pose.distance() - controls.max_distance).abs() < 1e-4);

        controls.zoom(&mut pose, 0.01);
        assert!((pose.distance() - controls.min_distance).abs() < 1e-4);
    }

    #[test]
    fn disabled_controls_ignore_input() {
        let mut controls = OrbitControls::new(&CameraLimits::default());
        controls.enabled = false;
        let original = CameraPose::new([0.0, 1.5, 4.0], [0.0, 1.5, 0.0]);
        let mut pose = original;
        controls.orbit(&mut pose, 1.0, 1.0);
        controls.zoom(&mut pose, 0.5);
        assert_eq!(pose, original);
    }

    #[test]
    fn destination_is_pulled_inside_rig_limits() {
        let (start, _) = poses();
        let far = CameraPose::new([0.0, 1.5, 9.0], [0.0, 1.5, 0.0]);
        let mut rig = TestRig::at(start);
        rig.set_distance_limits(3.0, 4.5);
        let mut animator = CameraAnimator::new(&CameraConfig::default());

        animator.animate_to(far, &mut rig);
        animator.update(10.0, &mut rig);
        assert!(!animator.is_animating());
        assert!((rig.pose.distance() - 4.5).abs() < 1e-4);
        assert_eq!(rig.pose.target, far.target);

        let settled = rig.pose;
        let controls = OrbitControls::new(&CameraLimits::default());
        let mut orbited = settled;
        controls.orbit(&mut orbited, 0.0, 0.0);
        assert!(orbited.position.distance(&settled.position) < 1e-4);
    }

    #[test]
    fn clamping_tolerates_swapped_bounds() {
        let pose = CameraPose::new([0.0, 0.0, 10.0], [0.0, 0.0, 0.0]);
        let clamped = clamp_pose_distance(pose, 4.0, 2.0);
        assert!((clamped.distance() - 4.0).abs() < 1e-4);

        let inside = CameraPose::new([0.0, 0.0, 3.0], [0.0, 0.0, 0.0]);
        assert_eq!(clamp_pose_distance(inside, 2.0, 4.0), inside);
    }

    #[test]
    fn non_positive_rate_falls_back_to_default() {
        let (start, end) = poses();
        for rate in [0.0, -1.0, f32::NAN] {
            let config = CameraConfig {
                rate,
                ..CameraConfig::default()
            };
            let mut rig = TestRig::at(start);
            let mut animator = CameraAnimator::new(&config);
            animator.animate_to(end, &mut rig);
            animator.update(1.0, &mut rig);
            assert!(!animator.is_animating());
            assert!(rig.orbit_enabled);
        }
    }
}
