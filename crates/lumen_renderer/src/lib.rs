//! Bidirectional path tracing renderer.
//!
//! The renderer traces a subpath from the camera and a subpath from a light,
//! deterministically connects every prefix pair, and combines the resulting
//! strategies with the balance heuristic so each path length is weighted by
//! how likely each strategy was to produce it.

pub mod camera;
pub mod connect;
pub mod integrator;
pub mod sampling;
pub mod transport;
pub mod vertex;
pub mod walk;

pub use camera::Camera;
pub use connect::{connect_paths, mis_weight};
pub use integrator::{
    render, render_parallel, render_progressive, render_sample, FrameBuffer, RenderConfig,
    RenderError,
};
pub use vertex::{Subpath, Vertex};
pub use walk::{generate_camera_subpath, generate_light_subpath};

pub use lumen_math::{Color, Ray, Vec2, Vec3};
