//! Scene-description files.
//!
//! A scene file is a JSON list of primitive descriptions. This is the only
//! loading path besides the built-in test model; geometry sources with their
//! own formats convert to this description first.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Primitive, Scene};
use lumen_math::Vec3;

/// Errors that can occur while loading a scene description.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("sphere with non-positive radius {0}")]
    InvalidRadius(f32),
}

/// One primitive in a scene file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrimitiveDesc {
    Sphere {
        center: [f32; 3],
        radius: f32,
        color: [f32; 3],
        #[serde(default)]
        emission: [f32; 3],
    },
    Triangle {
        v0: [f32; 3],
        v1: [f32; 3],
        v2: [f32; 3],
        color: [f32; 3],
        #[serde(default)]
        emission: [f32; 3],
    },
}

/// Top-level scene file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneFile {
    pub primitives: Vec<PrimitiveDesc>,
}

impl SceneFile {
    /// Convert the description into a renderable scene.
    pub fn into_scene(self) -> Result<Scene, SceneError> {
        let mut primitives = Vec::with_capacity(self.primitives.len());
        for desc in self.primitives {
            primitives.push(match desc {
                PrimitiveDesc::Sphere {
                    center,
                    radius,
                    color,
                    emission,
                } => {
                    if radius <= 0.0 {
                        return Err(SceneError::InvalidRadius(radius));
                    }
                    Primitive::sphere_emissive(
                        Vec3::from(center),
                        radius,
                        Vec3::from(color),
                        Vec3::from(emission),
                    )
                }
                PrimitiveDesc::Triangle {
                    v0,
                    v1,
                    v2,
                    color,
                    emission,
                } => Primitive::triangle_emissive(
                    Vec3::from(v0),
                    Vec3::from(v1),
                    Vec3::from(v2),
                    Vec3::from(color),
                    Vec3::from(emission),
                ),
            });
        }
        Ok(Scene::new(primitives))
    }
}

/// Load a scene from a JSON file.
pub fn load_scene(path: impl AsRef<Path>) -> Result<Scene, SceneError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    load_scene_from_str(&text)
}

/// Load a scene from JSON text.
pub fn load_scene_from_str(text: &str) -> Result<Scene, SceneError> {
    let file: SceneFile = serde_json::from_str(text)?;
    file.into_scene()
}
