//! Single-writer lesson state.
//!
//! All mutations go through the command methods on [`LessonStore`]. Each
//! command updates the state synchronously and then notifies subscribers with
//! [`StoreEvent`]s, in the order the changes happened.

use std::sync::mpsc::{self, Receiver, Sender};

use crate::{
    camera::CameraPose,
    ekg::{self, EkgCatalog, EkgPattern},
    lesson::{LessonCatalog, LessonModule, LessonStep, StructureSet},
    OpticalEkgError, Result,
};

/// Session record read by the camera, the highlight projector and the UI.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningState {
    pub current_module_id: Option<String>,
    /// Only meaningful while a module with steps is selected.
    pub current_step_index: usize,
    pub is_playing: bool,
    /// Always the highlight set of the current step, or empty.
    pub highlighted_structures: StructureSet,
    pub current_ekg_pattern: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    HighlightsChanged(StructureSet),
    /// A step became current. `camera` is `None` when the step keeps the
    /// camera where it is.
    StepEntered {
        module_id: String,
        step_index: usize,
        camera: Option<CameraPose>,
    },
    /// The module was deselected; the camera should go back to its default.
    ViewReset,
    PlaybackChanged(bool),
    PatternChanged(String),
}

#[derive(Debug)]
pub struct LessonStore {
    lessons: LessonCatalog,
    patterns: EkgCatalog,
    state: LearningState,
    subscribers: Vec<Sender<StoreEvent>>,
}

impl LessonStore {
    /// Creates a store with no module selected.
    pub fn new(lessons: LessonCatalog, patterns: EkgCatalog, default_pattern: &str) -> Result<Self> {
        if !patterns.contains(default_pattern) {
            return Err(OpticalEkgError::UnknownPattern(default_pattern.to_string()));
        }
        Ok(Self {
            lessons,
            patterns,
            state: LearningState {
                current_module_id: None,
                current_step_index: 0,
                is_playing: false,
                highlighted_structures: StructureSet::new(),
                current_ekg_pattern: default_pattern.to_string(),
            },
            subscribers: Vec::new(),
        })
    }

    /// Registers a new listener. Events are delivered synchronously during
    /// each command; dropped receivers are forgotten on the next event.
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        let (sender, receiver) = mpsc::channel();
        self.subscribers.push(sender);
        receiver
    }

    pub fn state(&self) -> &LearningState {
        &self.state
    }

    pub fn lessons(&self) -> &LessonCatalog {
        &self.lessons
    }

    pub fn patterns(&self) -> &EkgCatalog {
        &self.patterns
    }

    pub fn current_module(&self) -> Option<&LessonModule> {
        self.state
            .current_module_id
            .as_deref()
            .and_then(|id| self.lessons.module(id))
    }

    pub fn current_step(&self) -> Option<&LessonStep> {
        self.current_module()
            .and_then(|module| module.step(self.state.current_step_index))
    }

    pub fn ekg_pattern(&self) -> Option<&EkgPattern> {
        self.patterns.pattern(&self.state.current_ekg_pattern)
    }

    /// Percentage of the EKG trace to draw for the current step.
    pub fn trace_progress(&self) -> f32 {
        ekg::trace_progress(self.ekg_pattern(), self.current_step())
    }

    /// Fraction of the module completed, counting the current step.
    pub fn lesson_progress(&self) -> Option<f32> {
        let module = self.current_module()?;
        if module.steps.is_empty() {
            return None;
        }
        Some((self.state.current_step_index + 1) as f32 / module.steps.len() as f32)
    }

    pub fn can_advance(&self) -> bool {
        self.current_module()
            .map(|module| self.state.current_step_index + 1 < module.steps.len())
            .unwrap_or(false)
    }

    pub fn can_retreat(&self) -> bool {
        self.current_module().is_some() && self.state.current_step_index > 0
    }

    /// Selects a module, or deselects with `None`.
    ///
    /// Unknown ids are kept as the current module with no steps and no
    /// highlights. Use [`LessonStore::try_select_module`] to reject them.
    pub fn select_module(&mut self, module_id: Option<&str>) {
        tracing::debug!(?module_id, "select module");
        self.state.current_module_id = module_id.map(str::to_string);
        self.set_playing_flag(false);

        match module_id {
            Some(id) => {
                if self.lessons.module(id).is_none() {
                    tracing::warn!(module = id, "selected module is not in the catalog");
                }
                self.enter_step(0);
            }
            None => {
                self.state.current_step_index = 0;
                self.set_highlights(StructureSet::new());
                self.emit(StoreEvent::ViewReset);
            }
        }
    }

    /// Selects a module, failing if it is not in the catalog. The state is
    /// left untouched on error.
    pub fn try_select_module(&mut self, module_id: &str) -> Result<()> {
        if self.lessons.module(module_id).is_none() {
            return Err(OpticalEkgError::UnknownModule(module_id.to_string()));
        }
        self.select_module(Some(module_id));
        Ok(())
    }

    /// Moves to the next step. Returns `false` at the last step or with no
    /// module selected.
    pub fn advance_step(&mut self) -> bool {
        if !self.can_advance() {
            return false;
        }
        let index = self.state.current_step_index + 1;
        tracing::debug!(index, "advance step");
        self.enter_step(index);
        true
    }

    /// Moves to the previous step. Returns `false` at the first step or with
    /// no module selected.
    pub fn retreat_step(&mut self) -> bool {
        if !self.can_retreat() {
            return false;
        }
        let index = self.state.current_step_index - 1;
        tracing::debug!(index, "retreat step");
        self.enter_step(index);
        true
    }

    /// Stores the playback flag. Nothing in the core advances steps on its
    /// own while playing.
    pub fn set_playing(&mut self, playing: bool) {
        tracing::debug!(playing, "set playing");
        self.set_playing_flag(playing);
    }

    /// Returns to the first step of the selected module and stops playback.
    pub fn reset(&mut self) {
        tracing::debug!("reset lesson");
        self.set_playing_flag(false);
        if self.state.current_module_id.is_some() {
            self.enter_step(0);
        } else {
            self.state.current_step_index = 0;
            self.set_highlights(StructureSet::new());
        }
    }

    /// Switches the EKG pattern, failing on ids the catalog does not know.
    pub fn select_ekg_pattern(&mut self, pattern_id: &str) -> Result<()> {
        if !self.patterns.contains(pattern_id) {
            return Err(OpticalEkgError::UnknownPattern(pattern_id.to_string()));
        }
        tracing::debug!(pattern = pattern_id, "select ekg pattern");
        if self.state.current_ekg_pattern != pattern_id {
            self.state.current_ekg_pattern = pattern_id.to_string();
            self.emit(StoreEvent::PatternChanged(pattern_id.to_string()));
        }
        Ok(())
    }

    fn enter_step(&mut self, index: usize) {
        self.state.current_step_index = index;

        let entered = self.current_step().map(|step| {
            (step.highlighted_structures.clone(), step.camera_pose())
        });
        let Some((highlights, camera)) = entered else {
            self.set_highlights(StructureSet::new());
            return;
        };

        self.set_highlights(highlights);
        if let Some(module_id) = self.state.current_module_id.clone() {
            self.emit(StoreEvent::StepEntered {
                module_id,
                step_index: index,
                camera,
            });
        }
    }

    fn set_highlights(&mut self, highlights: StructureSet) {
        if self.state.highlighted_structures != highlights {
            self.state.highlighted_structures = highlights.clone();
            self.emit(StoreEvent::HighlightsChanged(highlights));
        }
    }

    fn set_playing_flag(&mut self, playing: bool) {
        if self.state.is_playing != playing {
            self.state.is_playing = playing;
            self.emit(StoreEvent::PlaybackChanged(playing));
        }
    }

    fn emit(&mut self, event: StoreEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
