//! Lumen core - scene model for the bidirectional path tracer.
//!
//! This crate provides:
//!
//! - **Primitives**: the closed [`Primitive`] variant type (triangles and
//!   spheres with reflectance and emission)
//! - **Scene**: the read-only primitive list, derived light list, and the
//!   brute-force nearest-hit query
//! - **Loading**: the JSON scene description and the built-in Cornell box

pub mod loader;
pub mod primitive;
pub mod scene;

pub use loader::{load_scene, load_scene_from_str, PrimitiveDesc, SceneError, SceneFile};
pub use primitive::Primitive;
pub use scene::{Intersection, Scene};
