//! Scene primitives.
//!
//! The primitive set is fixed and small, so primitives are a closed enum
//! dispatched with `match` rather than a trait-object hierarchy. This also
//! lets the light-subpath generator identify an emitter by its index in the
//! scene's primitive list without any downcasting.

use lumen_math::{Color, Mat3, Vec3};
use std::f32::consts::PI;

/// Determinant threshold below which a ray/triangle system counts as
/// parallel and the triangle is skipped.
const DEGENERATE_DET: f32 = 1e-12;

/// A renderable primitive: a triangle or a sphere.
///
/// Every primitive carries a reflectance color and an emitted radiance
/// (zero for non-emitters).
#[derive(Debug, Clone)]
pub enum Primitive {
    Triangle {
        v0: Vec3,
        v1: Vec3,
        v2: Vec3,
        /// Pre-computed unit face normal.
        normal: Vec3,
        color: Color,
        emission: Color,
    },
    Sphere {
        center: Vec3,
        radius: f32,
        color: Color,
        emission: Color,
    },
}

impl Primitive {
    /// Create a triangle from three vertices.
    pub fn triangle(v0: Vec3, v1: Vec3, v2: Vec3, color: Color) -> Self {
        Self::triangle_emissive(v0, v1, v2, color, Color::ZERO)
    }

    /// Create an emissive triangle.
    pub fn triangle_emissive(v0: Vec3, v1: Vec3, v2: Vec3, color: Color, emission: Color) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self::Triangle {
            v0,
            v1,
            v2,
            normal,
            color,
            emission,
        }
    }

    /// Create a sphere.
    pub fn sphere(center: Vec3, radius: f32, color: Color) -> Self {
        Self::sphere_emissive(center, radius, color, Color::ZERO)
    }

    /// Create an emissive sphere.
    pub fn sphere_emissive(center: Vec3, radius: f32, color: Color, emission: Color) -> Self {
        Self::Sphere {
            center,
            radius: radius.max(0.0),
            color,
            emission,
        }
    }

    /// Intersect a ray with this primitive.
    ///
    /// `direction` must be unit length; the returned parameter is then the
    /// hit distance. Returns `None` for misses and for degenerate systems
    /// (ray parallel to the triangle plane).
    pub fn intersect(&self, origin: Vec3, direction: Vec3) -> Option<f32> {
        match self {
            Self::Triangle { v0, v1, v2, .. } => {
                // Solve origin + t*d = v0 + u*e1 + v*e2 as a 3x3 system.
                let e1 = *v1 - *v0;
                let e2 = *v2 - *v0;
                let a = Mat3::from_cols(-direction, e1, e2);
                if a.determinant().abs() < DEGENERATE_DET {
                    return None;
                }
                let x = a.inverse() * (origin - *v0);
                let (t, u, v) = (x.x, x.y, x.z);
                let inside = u >= 0.0 && v >= 0.0 && u <= 1.0 && v <= 1.0 && u + v <= 1.0;
                (t > 0.0 && inside).then_some(t)
            }
            Self::Sphere { center, radius, .. } => {
                let oc = origin - *center;
                let h = oc.dot(direction);
                let c = oc.length_squared() - radius * radius;
                let discriminant = h * h - c;
                if discriminant < 0.0 {
                    return None;
                }
                let sqrtd = discriminant.sqrt();
                // Nearest positive root.
                let t = -h - sqrtd;
                if t > 0.0 {
                    return Some(t);
                }
                let t = -h + sqrtd;
                (t > 0.0).then_some(t)
            }
        }
    }

    /// Geometric unit normal at a point on the surface.
    pub fn normal_at(&self, point: Vec3) -> Vec3 {
        match self {
            Self::Triangle { normal, .. } => *normal,
            Self::Sphere { center, radius, .. } => (point - *center) / *radius,
        }
    }

    /// Reflectance color.
    pub fn color(&self) -> Color {
        match self {
            Self::Triangle { color, .. } | Self::Sphere { color, .. } => *color,
        }
    }

    /// Emitted radiance (zero for non-emitters).
    pub fn emission(&self) -> Color {
        match self {
            Self::Triangle { emission, .. } | Self::Sphere { emission, .. } => *emission,
        }
    }

    /// Whether this primitive emits light.
    pub fn is_emissive(&self) -> bool {
        self.emission().length_squared() > 0.0
    }

    /// Surface area. The reciprocal is the density of a uniformly sampled
    /// surface point.
    pub fn area(&self) -> f32 {
        match self {
            Self::Triangle { v0, v1, v2, .. } => {
                0.5 * (*v1 - *v0).cross(*v2 - *v0).length()
            }
            Self::Sphere { radius, .. } => 4.0 * PI * radius * radius,
        }
    }
}
