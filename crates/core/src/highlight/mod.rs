//! Projects the lesson's highlighted structures onto paintable meshes.

use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{config::HighlightConfig, OpticalEkgError};

/// 8-bit RGB color, serialised as a `#rrggbb` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(0xff, 0xff, 0xff);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl FromStr for Color {
    type Err = OpticalEkgError;

    /// Accepts `#rrggbb` and the short `#rgb` form.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || OpticalEkgError::msg(format!("invalid color `{value}`"));
        let hex = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());

        match hex.len() {
            6 => Ok(Color::rgb(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let r = channel(&hex[0..1])?;
                let g = channel(&hex[1..2])?;
                let b = channel(&hex[2..3])?;
                Ok(Color::rgb(r * 17, g * 17, b * 17))
            }
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for Color {
    type Error = OpticalEkgError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(value: Color) -> Self {
        value.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Settable surface properties of a single paintable structure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialState {
    pub color: Color,
    pub emissive: Color,
    pub emissive_intensity: f32,
    pub metalness: f32,
    pub roughness: f32,
    pub opacity: f32,
    pub transparent: bool,
}

impl Default for MaterialState {
    fn default() -> Self {
        HighlightConfig::default().default
    }
}

/// Renderer-owned set of named structures with independently mutable
/// materials.
pub trait PaintableRegistry {
    /// Names of every paintable structure.
    fn structure_names(&self) -> Vec<String>;
    /// Material owned by the named structure, if it exists.
    fn material_mut(&mut self, name: &str) -> Option<&mut MaterialState>;
}

/// Applies the highlighted / default material states.
#[derive(Debug, Clone)]
pub struct HighlightProjector {
    default: MaterialState,
    highlighted: MaterialState,
    applied: BTreeSet<String>,
}

impl HighlightProjector {
    pub fn new(config: &HighlightConfig) -> Self {
        Self {
            default: config.default,
            highlighted: config.highlighted,
            applied: BTreeSet::new(),
        }
    }

    /// Structures that received the highlighted material on the last
    /// projection.
    pub fn applied(&self) -> &BTreeSet<String> {
        &self.applied
    }

    /// Repaints the registry for a new highlight set.
    ///
    /// Every structure is reset to the default material before any highlight
    /// is applied, so nothing stays lit when the set shrinks. Names without a
    /// matching structure are skipped.
    pub fn project<R: PaintableRegistry + ?Sized>(
        &mut self,
        highlighted: &BTreeSet<String>,
        registry: &mut R,
    ) {
        for name in registry.structure_names() {
            if let Some(material) = registry.material_mut(&name) {
                *material = self.default;
            }
        }

        self.applied.clear();
        for name in highlighted {
            match registry.material_mut(name) {
                Some(material) => {
                    *material = self.highlighted;
                    self.applied.insert(name.clone());
                }
                None => tracing::warn!(structure = %name, "no paintable structure to highlight"),
            }
        }
        tracing::debug!(applied = ?self.applied, "highlights projected");
    }
}
