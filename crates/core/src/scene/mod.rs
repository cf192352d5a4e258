//! Heart model description and catalog cross-reference checks.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{ekg::EkgCatalog, lesson::LessonCatalog, OpticalEkgError, Result};

/// Paintable meshes of the bundled heart model.
pub const HEART_STRUCTURES: &[&str] = &[
    "sa-node",
    "av-node",
    "bundle-of-his",
    "anterior-internodal",
    "middle-internodal",
    "posterior-internodal",
    "bachman-pathway",
    "left-bundle-branch",
    "right-bundle-branch",
    "llb-post-fascicle",
    "llb-post-fascicle-sup",
    "heart-muscle",
    "right-atrium",
    "purkinje-fiber-l",
    "purkinje-fiber-r",
    "tail-l-1",
    "tail-l-2",
    "tail-l-3",
    "tail-l-4",
    "tail-r",
    "tail-r-1",
    "tail-r-2",
    "tail-r-3",
    "tail-r-3b",
];

/// Model asset plus the structure names the renderer can paint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneDescriptor {
    pub name: String,
    pub model: String,
    pub structures: Vec<String>,
}

impl SceneDescriptor {
    pub fn heart() -> Self {
        Self {
            name: "Heart Cross Section".to_string(),
            model: "3d-models/heart-cross-full-mesh.glb".to_string(),
            structures: HEART_STRUCTURES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn has_structure(&self, name: &str) -> bool {
        self.structures.iter().any(|structure| structure == name)
    }

    /// Fails on the first lesson step that highlights a structure this scene
    /// does not have.
    pub fn validate_lessons(&self, lessons: &LessonCatalog) -> Result<()> {
        for module in lessons.modules() {
            for step in &module.steps {
                if let Some(missing) = step
                    .highlighted_structures
                    .iter()
                    .find(|name| !self.has_structure(name))
                {
                    return Err(OpticalEkgError::dangling(
                        format!("{}/{}", module.id, step.id),
                        missing.as_str(),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Fails on the first EKG segment whose id matches no lesson step.
pub fn validate_patterns(patterns: &EkgCatalog, lessons: &LessonCatalog) -> Result<()> {
    let step_ids: HashSet<&str> = lessons
        .modules()
        .iter()
        .flat_map(|module| module.step_ids())
        .collect();

    for pattern in patterns.patterns() {
        if let Some(segment) = pattern
            .segments
            .iter()
            .find(|segment| !step_ids.contains(segment.id.as_str()))
        {
            return Err(OpticalEkgError::dangling(
                pattern.id.as_str(),
                segment.id.as_str(),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::{LessonModule, LessonStep};

    fn lessons_highlighting(structure: &str) -> LessonCatalog {
        LessonCatalog::new(vec![LessonModule {
            id: "m".to_string(),
            title: "M".to_string(),
            description: String::new(),
            steps: vec![LessonStep {
                id: "s".to_string(),
                title: "S".to_string(),
                description: String::new(),
                highlighted_structures: [structure.to_string()].into_iter().collect(),
                camera_position: None,
                camera_target: None,
            }],
        }])
        .unwrap()
    }

    #[test]
    fn builtin_catalogs_are_consistent() {
        let lessons = LessonCatalog::builtin().unwrap();
        let patterns = EkgCatalog::builtin().unwrap();

        assert!(SceneDescriptor::heart().validate_lessons(&lessons).is_ok());
        assert!(validate_patterns(&patterns, &lessons).is_ok());
    }

    #[test]
    fn reports_dangling_structure() {
        let err = SceneDescriptor::heart()
            .validate_lessons(&lessons_highlighting("left-atrium"))
            .unwrap_err();

        match err {
            OpticalEkgError::DanglingReference { owner, reference } => {
                assert_eq!(owner, "m/s");
                assert_eq!(reference, "left-atrium");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn reports_dangling_segment() {
        let lessons = lessons_highlighting("sa-node");
        let patterns = EkgCatalog::builtin().unwrap();

        let err = validate_patterns(&patterns, &lessons).unwrap_err();
        assert!(err.to_string().contains("normal-sinus-rhythm"));
    }
}
