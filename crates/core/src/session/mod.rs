//! One interactive lesson session.
//!
//! The session subscribes to its [`LessonStore`] and forwards every event, in
//! order, to the camera animator, the highlight projector and the EKG tween.
//! Commands issued through the session are forwarded immediately; commands
//! issued through [`LessonSession::store_mut`] are picked up on the next
//! [`LessonSession::tick`].

use std::sync::mpsc::Receiver;

use crate::{
    camera::{CameraAnimator, CameraPose},
    config::AppConfig,
    ekg::{EkgCatalog, Point, TracePath, TraceTween},
    highlight::HighlightProjector,
    lesson::LessonCatalog,
    render::SceneRenderer,
    scene::SceneDescriptor,
    store::{LessonStore, StoreEvent},
    timeline::FrameClock,
    Result,
};

/// What a frame produced, for logging or for a presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub camera: CameraPose,
    pub animating: bool,
    /// Displayed EKG trace completion, in percent.
    pub trace_percent: f32,
    /// Tip of the drawn trace in view box units; `None` before anything is drawn.
    pub trace_end: Option<Point>,
}

#[derive(Debug)]
pub struct LessonSession {
    store: LessonStore,
    events: Receiver<StoreEvent>,
    animator: CameraAnimator,
    projector: HighlightProjector,
    renderer: SceneRenderer,
    clock: FrameClock,
    trace: TraceTween,
    trace_path: Option<(TracePath, f32)>,
}

impl LessonSession {
    pub fn new(
        config: &AppConfig,
        lessons: LessonCatalog,
        patterns: EkgCatalog,
        scene: &SceneDescriptor,
    ) -> Result<Self> {
        let mut store = LessonStore::new(lessons, patterns, &config.ekg.default_pattern)?;
        let events = store.subscribe();
        let mut renderer =
            SceneRenderer::from_scene(scene, &config.highlight.default, &config.camera);
        let mut projector = HighlightProjector::new(&config.highlight);
        projector.project(&store.state().highlighted_structures, &mut renderer);
        let trace_path = load_trace(&store);

        Ok(Self {
            store,
            events,
            animator: CameraAnimator::new(&config.camera),
            projector,
            renderer,
            clock: FrameClock::new(),
            trace: TraceTween::new(config.ekg.tween_seconds),
            trace_path,
        })
    }

    /// Session over the bundled lessons, EKG patterns and heart model.
    pub fn builtin(config: &AppConfig) -> Result<Self> {
        Self::new(
            config,
            LessonCatalog::builtin()?,
            EkgCatalog::builtin()?,
            &SceneDescriptor::heart(),
        )
    }

    pub fn store(&self) -> &LessonStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut LessonStore {
        &mut self.store
    }

    pub fn renderer(&self) -> &SceneRenderer {
        &self.renderer
    }

    /// Mutable renderer access for user camera input.
    pub fn renderer_mut(&mut self) -> &mut SceneRenderer {
        &mut self.renderer
    }

    pub fn animator(&self) -> &CameraAnimator {
        &self.animator
    }

    pub fn projector(&self) -> &HighlightProjector {
        &self.projector
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    pub fn trace_percent(&self) -> f32 {
        self.trace.current()
    }

    /// Polylines of the EKG trace drawn so far.
    pub fn drawn_trace(&self) -> Vec<Vec<Point>> {
        match &self.trace_path {
            Some((path, total)) => path.partial(self.trace.current() / total),
            None => Vec::new(),
        }
    }

    pub fn select_module(&mut self, module_id: Option<&str>) {
        self.store.select_module(module_id);
        self.dispatch();
    }

    pub fn try_select_module(&mut self, module_id: &str) -> Result<()> {
        self.store.try_select_module(module_id)?;
        self.dispatch();
        Ok(())
    }

    pub fn advance_step(&mut self) -> bool {
        let moved = self.store.advance_step();
        self.dispatch();
        moved
    }

    pub fn retreat_step(&mut self) -> bool {
        let moved = self.store.retreat_step();
        self.dispatch();
        moved
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.store.set_playing(playing);
        self.dispatch();
    }

    pub fn reset(&mut self) {
        self.store.reset();
        self.dispatch();
    }

    pub fn select_ekg_pattern(&mut self, pattern_id: &str) -> Result<()> {
        self.store.select_ekg_pattern(pattern_id)?;
        self.dispatch();
        Ok(())
    }

    /// Advances animations by `delta` seconds.
    pub fn tick(&mut self, delta: f32) -> FrameReport {
        self.dispatch();
        let delta = self.clock.advance(delta);
        self.animator.update(delta, &mut self.renderer);
        let trace_percent = self.trace.update(delta);
        let trace_end = self
            .drawn_trace()
            .last()
            .and_then(|points| points.last().copied());

        FrameReport {
            camera: self.renderer.camera(),
            animating: self.animator.is_animating(),
            trace_percent,
            trace_end,
        }
    }

    /// Applies every pending store event.
    pub fn dispatch(&mut self) {
        let mut retarget_trace = false;
        while let Ok(event) = self.events.try_recv() {
            match event {
                StoreEvent::HighlightsChanged(highlights) => {
                    self.projector.project(&highlights, &mut self.renderer);
                    retarget_trace = true;
                }
                StoreEvent::StepEntered { camera, .. } => {
                    if let Some(pose) = camera {
                        self.animator.animate_to(pose, &mut self.renderer);
                    }
                    retarget_trace = true;
                }
                StoreEvent::ViewReset => {
                    self.animator.return_to_default(&mut self.renderer);
                    retarget_trace = true;
                }
                StoreEvent::PatternChanged(_) => {
                    self.trace_path = load_trace(&self.store);
                    retarget_trace = true;
                }
                StoreEvent::PlaybackChanged(playing) => {
                    tracing::debug!(playing, "playback flag changed");
                }
            }
        }

        if retarget_trace {
            self.trace.retarget(self.store.trace_progress());
        }
    }
}

/// Geometry of the selected pattern plus the percentage its full length
/// stands for.
fn load_trace(store: &LessonStore) -> Option<(TracePath, f32)> {
    let pattern = store.ekg_pattern()?;
    if pattern.total_length <= 0.0 {
        tracing::warn!(pattern = %pattern.id, "EKG pattern has no length to draw");
        return None;
    }
    match pattern.trace() {
        Ok(path) => Some((path, pattern.total_length)),
        Err(err) => {
            tracing::warn!(pattern = %pattern.id, %err, "EKG trace geometry unusable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        camera::{clamp_pose_distance, AnimatorState, CameraRig},
        config::HighlightConfig,
    };

    const WALKTHROUGH: &str = "electrical-conduction-components";

    fn session() -> LessonSession {
        LessonSession::builtin(&AppConfig::default()).unwrap()
    }

    fn settle(session: &mut LessonSession) -> FrameReport {
        let mut report = session.tick(0.0);
        for _ in 0..100 {
            report = session.tick(0.05);
            if !report.animating && session.trace.is_settled() {
                break;
            }
        }
        report
    }

    #[test]
    fn selecting_a_module_paints_and_moves_camera() {
        let mut session = session();
        let highlight = HighlightConfig::default();
        session.select_module(Some(WALKTHROUGH));

        assert_eq!(session.renderer().material("sa-node"), Some(&highlight.highlighted));
        assert_eq!(session.renderer().material("av-node"), Some(&highlight.default));
        assert!(session.animator().is_animating());
        assert!(!session.renderer().orbit_enabled());

        let report = settle(&mut session);
        let expected = session.store().current_step().unwrap().camera_pose().unwrap();
        assert_eq!(report.camera, expected);
        assert!(session.renderer().orbit_enabled());
        assert_eq!(report.trace_percent, 18.0);
    }

    #[test]
    fn previous_highlight_never_survives_a_step_change() {
        let mut session = session();
        let highlight = HighlightConfig::default();
        session.select_module(Some(WALKTHROUGH));
        session.advance_step();

        assert_eq!(session.renderer().material("sa-node"), Some(&highlight.default));
        assert_eq!(
            session.renderer().material("bachman-pathway"),
            Some(&highlight.highlighted)
        );
    }

    #[test]
    fn step_without_pose_keeps_camera() {
        let mut session = session();
        session.select_module(Some(WALKTHROUGH));
        for _ in 0..6 {
            session.advance_step();
        }
        let before = settle(&mut session).camera;

        session.advance_step();
        assert_eq!(session.store().current_step().unwrap().id, "llb-posterior-fascicles");
        assert_eq!(*session.animator().state(), AnimatorState::Idle);
        assert_eq!(session.tick(0.1).camera, before);
    }

    #[test]
    fn deselecting_returns_to_default_view() {
        let mut session = session();
        session.select_module(Some(WALKTHROUGH));
        settle(&mut session);

        session.select_module(None);
        let report = settle(&mut session);
        let camera = AppConfig::default().camera;
        let expected = clamp_pose_distance(
            camera.default_pose,
            camera.limits.min_distance,
            camera.limits.max_distance,
        );
        assert_eq!(report.camera, expected);
        assert_eq!(report.trace_percent, 0.0);
        assert_eq!(report.trace_end, None);
        assert!(session.drawn_trace().is_empty());
        assert!(session.projector().applied().is_empty());
    }

    #[test]
    fn manual_orbit_is_the_start_of_the_next_transition() {
        let mut session = session();
        session.select_module(Some(WALKTHROUGH));
        settle(&mut session);

        session.renderer_mut().orbit(0.4, 0.1);
        let orbited = session.renderer().camera();
        session.advance_step();

        match session.animator().state() {
            AnimatorState::Animating { start, .. } => assert_eq!(*start, orbited),
            AnimatorState::Idle => panic!("expected a transition"),
        }
    }

    #[test]
    fn commands_through_the_store_apply_on_tick() {
        let mut session = session();
        session.store_mut().select_module(Some(WALKTHROUGH));
        assert!(session.projector().applied().is_empty());

        session.tick(0.0);
        assert!(session.projector().applied().contains("sa-node"));
    }

    #[test]
    fn playing_does_not_advance_steps() {
        let mut session = session();
        session.select_module(Some(WALKTHROUGH));
        session.set_playing(true);
        settle(&mut session);
        assert_eq!(session.store().state().current_step_index, 0);
        assert!(session.store().state().is_playing);
    }

    #[test]
    fn idle_camera_rests_inside_orbit_limits() {
        let mut session = session();
        let (min, max) = session.renderer().distance_limits();
        let module_ids: Vec<String> = session
            .store()
            .lessons()
            .modules()
            .iter()
            .map(|module| module.id.clone())
            .collect();

        let check = |session: &mut LessonSession, label: &str| {
            let settled = settle(session).camera;
            assert!(!session.animator().is_animating(), "{label}");
            let distance = settled.distance();
            assert!(
                distance >= min - 1e-4 && distance <= max + 1e-4,
                "{label}: distance {distance} outside [{min}, {max}]"
            );
            session.renderer_mut().orbit(0.001, 0.0);
            let nudged = session.renderer().camera().distance();
            assert!((nudged - distance).abs() < 1e-3, "{label}: orbit jumped");
            session.renderer_mut().orbit(-0.001, 0.0);
        };

        check(&mut session, "startup");
        for id in &module_ids {
            session.select_module(Some(id));
            loop {
                let label = session.store().current_step().unwrap().id.clone();
                check(&mut session, &label);
                if !session.advance_step() {
                    break;
                }
            }
        }
        session.select_module(None);
        check(&mut session, "default view");
    }

    #[test]
    fn drawn_trace_follows_displayed_progress() {
        let mut session = session();
        assert_eq!(session.tick(0.0).trace_end, None);

        session.select_module(Some(WALKTHROUGH));
        let partway = session.tick(0.1);
        let report = settle(&mut session);
        assert_eq!(report.trace_percent, 18.0);

        let tip = report.trace_end.unwrap();
        assert_ne!(partway.trace_end, Some(tip));
        let drawn = session.drawn_trace();
        let full = session.store().ekg_pattern().unwrap().trace().unwrap();
        let expected = full.partial(18.0 / session.store().ekg_pattern().unwrap().total_length);
        assert_eq!(drawn, expected);

        session.select_ekg_pattern("normal-sinus-rhythm").unwrap();
        assert_eq!(session.tick(0.0).trace_end, Some(tip));
    }
}
