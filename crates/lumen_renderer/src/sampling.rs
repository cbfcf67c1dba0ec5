//! Direction sampling utilities.
//!
//! All distributions here are uniform, not cosine-weighted; callers divide by
//! cosine terms explicitly wherever the rendering equation requires it.

use lumen_core::Primitive;
use lumen_math::Vec3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

/// Uniform sample on the sphere of the given radius, centered at the origin.
pub fn uniform_sphere<R: Rng + ?Sized>(rng: &mut R, radius: f32) -> Vec3 {
    let theta0 = TAU * rng.gen::<f32>();
    let theta1 = (1.0 - 2.0 * rng.gen::<f32>()).acos();
    radius
        * Vec3::new(
            theta1.sin() * theta0.sin(),
            theta1.sin() * theta0.cos(),
            theta1.cos(),
        )
}

/// Density of [`uniform_sphere`] over the sphere surface.
pub fn uniform_sphere_pdf(radius: f32) -> f32 {
    1.0 / (4.0 * PI * radius * radius)
}

/// Uniform sample on the hemisphere of the given radius around `axis`.
///
/// A full-sphere direction is drawn and reflected onto the side of `axis`
/// when it falls in the opposite hemisphere.
pub fn uniform_hemisphere<R: Rng + ?Sized>(rng: &mut R, axis: Vec3, radius: f32) -> Vec3 {
    let dir = uniform_sphere(rng, 1.0);
    let dir = if dir.dot(axis) < 0.0 { -dir } else { dir };
    radius * dir
}

/// Density of [`uniform_hemisphere`] over the hemisphere surface.
pub fn uniform_hemisphere_pdf(radius: f32) -> f32 {
    1.0 / (2.0 * PI * radius * radius)
}

/// Orthogonal projection of `a` onto `b`.
///
/// Used to derive a shading normal lying in the same hemisphere as an
/// incoming direction. Returns zero when `b` is zero.
pub fn project_onto(a: Vec3, b: Vec3) -> Vec3 {
    let denom = b.length_squared();
    if denom <= 0.0 {
        return Vec3::ZERO;
    }
    b * (a.dot(b) / denom)
}

/// Uniform point on a primitive's surface, with its geometric normal there.
///
/// The density of the returned point is `1 / primitive.area()`.
pub fn sample_on_primitive<R: Rng + ?Sized>(rng: &mut R, primitive: &Primitive) -> (Vec3, Vec3) {
    match primitive {
        Primitive::Sphere { center, radius, .. } => {
            let offset = uniform_sphere(rng, *radius);
            (*center + offset, offset / *radius)
        }
        Primitive::Triangle {
            v0,
            v1,
            v2,
            normal,
            ..
        } => {
            // sqrt warp for uniform barycentrics
            let su = rng.gen::<f32>().sqrt();
            let b1 = 1.0 - su;
            let b2 = rng.gen::<f32>() * su;
            let point = *v0 + b1 * (*v1 - *v0) + b2 * (*v2 - *v0);
            (point, *normal)
        }
    }
}
