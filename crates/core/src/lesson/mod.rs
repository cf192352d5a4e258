//! Static lesson content: modules made of ordered steps.

use std::collections::{BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::{
    camera::{CameraPose, Vec3},
    OpticalEkgError, Result,
};

const BUILTIN_LESSONS: &str = include_str!("../../data/lessons.json");

/// Structure identifiers a step asks the renderer to highlight.
pub type StructureSet = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonStep {
    /// Unique within its module only. Doubles as the EKG segment join key.
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub highlighted_structures: StructureSet,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_position: Option<Vec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_target: Option<Vec3>,
}

impl LessonStep {
    /// Pose the camera should travel to when this step is entered.
    ///
    /// Steps without a position keep the camera where it is. A position
    /// without a target looks at the origin.
    pub fn camera_pose(&self) -> Option<CameraPose> {
        self.camera_position.map(|position| CameraPose {
            position,
            target: self.camera_target.unwrap_or(Vec3::ZERO),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonModule {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub steps: Vec<LessonStep>,
}

impl LessonModule {
    pub fn step(&self, index: usize) -> Option<&LessonStep> {
        self.steps.get(index)
    }

    pub fn step_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|step| step.id.as_str())
    }
}

/// Immutable collection of lesson modules, in display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LessonCatalog {
    modules: Vec<LessonModule>,
}

impl LessonCatalog {
    /// Lessons shipped with the crate.
    pub fn builtin() -> Result<Self> {
        let catalog = Self::from_json_str(BUILTIN_LESSONS)?;
        tracing::info!(modules = catalog.modules.len(), "loaded builtin lessons");
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let catalog: LessonCatalog = serde_json::from_str(raw)?;
        Self::new(catalog.modules)
    }

    /// Builds a catalog, rejecting duplicate module ids and duplicate step ids
    /// inside one module.
    pub fn new(modules: Vec<LessonModule>) -> Result<Self> {
        let mut module_ids = HashSet::new();
        for module in &modules {
            if !module_ids.insert(module.id.as_str()) {
                return Err(OpticalEkgError::msg(format!(
                    "duplicate lesson module `{}`",
                    module.id
                )));
            }

            let mut step_ids = HashSet::new();
            for step in &module.steps {
                if !step_ids.insert(step.id.as_str()) {
                    return Err(OpticalEkgError::msg(format!(
                        "duplicate step `{}` in module `{}`",
                        step.id, module.id
                    )));
                }
            }
        }

        Ok(Self { modules })
    }

    pub fn modules(&self) -> &[LessonModule] {
        &self.modules
    }

    pub fn module(&self, id: &str) -> Option<&LessonModule> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
