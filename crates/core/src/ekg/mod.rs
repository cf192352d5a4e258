//! EKG trace catalog and the mapping from lesson steps to trace progress.

mod path;

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

pub use path::{PathCommand, Point, TracePath};

use crate::{camera::ease_in_out_cubic, highlight::Color, lesson::LessonStep, OpticalEkgError, Result};

const BUILTIN_PATTERNS: &str = include_str!("../../data/ekg_patterns.json");

/// Nominal trace length in percentage space.
pub const TRACE_LENGTH: f32 = 100.0;

/// Portion of a trace attributed to one conduction structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EkgSegment {
    /// Join key against [`LessonStep::id`]. Only unique within one pattern.
    pub id: String,
    pub percent_start: f32,
    pub percent_end: f32,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EkgPattern {
    pub id: String,
    pub title: String,
    pub description: String,
    /// Declarative trace geometry, see [`TracePath`].
    pub path: String,
    #[serde(default = "default_total_length")]
    pub total_length: f32,
    #[serde(default)]
    pub segments: Vec<EkgSegment>,
}

fn default_total_length() -> f32 {
    TRACE_LENGTH
}

impl EkgPattern {
    /// First segment whose id equals `step_id`, in authoring order.
    pub fn segment(&self, step_id: &str) -> Option<&EkgSegment> {
        self.segments.iter().find(|segment| segment.id == step_id)
    }

    /// Percentage of the trace drawn for a step.
    ///
    /// This is the matching segment's end, or 0 when nothing matches or no
    /// step is selected.
    pub fn progress_for(&self, step_id: Option<&str>) -> f32 {
        step_id
            .and_then(|id| self.segment(id))
            .map(|segment| segment.percent_end)
            .unwrap_or(0.0)
    }

    pub fn trace(&self) -> Result<TracePath> {
        TracePath::parse(&self.path)
    }
}

/// Displayed trace completion for the current step of the current pattern.
pub fn trace_progress(pattern: Option<&EkgPattern>, step: Option<&LessonStep>) -> f32 {
    pattern
        .map(|pattern| pattern.progress_for(step.map(|step| step.id.as_str())))
        .unwrap_or(0.0)
}

/// Immutable collection of EKG patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EkgCatalog {
    patterns: Vec<EkgPattern>,
}

impl EkgCatalog {
    /// Patterns shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let catalog = Self::from_json_str(BUILTIN_PATTERNS)?;
        tracing::info!(patterns = catalog.patterns.len(), "loaded builtin ekg patterns");
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let catalog: EkgCatalog = serde_json::from_str(raw)?;
        Self::new(catalog.patterns)
    }

    /// Builds a catalog, rejecting duplicate pattern ids and trace geometry
    /// that does not parse.
    pub fn new(patterns: Vec<EkgPattern>) -> Result<Self> {
        let mut ids = HashSet::new();
        for pattern in &patterns {
            if !ids.insert(pattern.id.as_str()) {
                return Err(OpticalEkgError::msg(format!(
                    "duplicate ekg pattern `{}`",
                    pattern.id
                )));
            }
            pattern.trace()?;
        }
        Ok(Self { patterns })
    }

    pub fn patterns(&self) -> &[EkgPattern] {
        &self.patterns
    }

    pub fn pattern(&self, id: &str) -> Option<&EkgPattern> {
        self.patterns.iter().find(|pattern| pattern.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.pattern(id).is_some()
    }
}

/// Eases the displayed percentage towards the latest mapped value.
#[derive(Debug, Clone)]
pub struct TraceTween {
    from: f32,
    to: f32,
    current: f32,
    elapsed: f32,
    duration: f32,
}

impl TraceTween {
    pub fn new(duration: f32) -> Self {
        Self {
            from: 0.0,
            to: 0.0,
            current: 0.0,
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    /// Percentage currently displayed.
    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.to
    }

    pub fn is_settled(&self) -> bool {
        self.current == self.to
    }

    /// Starts moving towards `percent` from the value shown right now.
    pub fn retarget(&mut self, percent: f32) {
        if percent == self.to {
            return;
        }
        self.from = self.current;
        self.to = percent;
        self.elapsed = 0.0;
        if self.duration <= 0.0 {
            self.current = percent;
        }
    }

    pub fn update(&mut self, elapsed: f32) -> f32 {
        if self.is_settled() {
            return self.current;
        }
        self.elapsed += elapsed.max(0.0);
        let t = if self.duration > 0.0 {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.current = if t >= 1.0 {
            self.to
        } else {
            self.from + (self.to - self.from) * ease_in_out_cubic(t)
        };
        self.current
    }
}
