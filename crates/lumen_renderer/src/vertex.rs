//! The path-vertex model.
//!
//! A subpath is an append-only vertex sequence grown from either the camera
//! or a light. Subpaths are built once per sample and discarded after
//! connection; nothing is shared across pixels or samples.

use lumen_math::{Color, Ray, Vec3};

/// One bounce point on a subpath.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    /// World-space position.
    pub position: Vec3,
    /// Shading normal, oriented toward the side the generating ray arrived
    /// from. For the camera origin this is the primary ray direction.
    pub normal: Vec3,
    /// Direction used to reach the next vertex of the walk (zero on a
    /// terminal vertex).
    pub dir_out: Vec3,
    /// Accumulated path contribution up to and including this vertex,
    /// already divided by the sampling densities along the walk.
    pub throughput: Color,
    /// Area-measure density of having generated this vertex in the walk's
    /// forward direction.
    pub pdf_fwd: f32,
    /// Area-measure density of re-generating this vertex from its successor,
    /// filled in once the successor exists.
    pub pdf_rev: f32,
    /// Owning primitive index; `None` only for the camera origin.
    pub primitive: Option<usize>,
}

/// An ordered vertex sequence grown from one end of the transport path.
pub type Subpath = Vec<Vertex>;

impl Vertex {
    /// Origin vertex of a camera subpath.
    ///
    /// The camera sample is deterministic given the film coordinate, so the
    /// forward density is 1 by convention.
    pub fn camera_origin(ray: &Ray, importance: f32) -> Self {
        let dir = ray.direction.normalize_or_zero();
        Self {
            position: ray.origin,
            normal: dir,
            dir_out: ray.direction,
            throughput: Color::splat(importance),
            pdf_fwd: 1.0,
            pdf_rev: 0.0,
            primitive: None,
        }
    }

    /// Origin vertex of a light subpath.
    ///
    /// `pdf_fwd` is the combined light-choice x surface-position x direction
    /// density; `throughput` is `emission * |cos| / pdf_fwd`, the standard
    /// Monte-Carlo start of the importance-transport walk.
    pub fn light_origin(
        position: Vec3,
        normal: Vec3,
        dir_out: Vec3,
        throughput: Color,
        pdf_fwd: f32,
        primitive: usize,
    ) -> Self {
        Self {
            position,
            normal,
            dir_out,
            throughput,
            pdf_fwd,
            pdf_rev: 0.0,
            primitive: Some(primitive),
        }
    }

    /// Whether this vertex sits on a surface (anything but the camera
    /// origin).
    pub fn on_surface(&self) -> bool {
        self.primitive.is_some()
    }
}
