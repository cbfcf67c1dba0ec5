//! Scene container and the brute-force nearest-hit query.
//!
//! The primitive list is loaded once and read-only for the whole render;
//! indices are stable for the session. No acceleration structure: a linear
//! scan is the baseline and can be replaced by a spatial index later without
//! changing the query contract.

use crate::Primitive;
use lumen_math::{Color, Vec3};

/// Result of a nearest-hit query.
#[derive(Debug, Clone, Copy)]
pub struct Intersection {
    /// World-space hit point.
    pub position: Vec3,
    /// Geometric unit normal at the hit point.
    pub normal: Vec3,
    /// Distance from the (normalized) ray origin.
    pub distance: f32,
    /// Index of the primitive struck.
    pub index: usize,
}

/// An immutable scene: primitives plus the derived list of emitters.
#[derive(Debug, Clone)]
pub struct Scene {
    primitives: Vec<Primitive>,
    lights: Vec<usize>,
}

impl Scene {
    /// Build a scene from a primitive list, deriving the emitter indices.
    pub fn new(primitives: Vec<Primitive>) -> Self {
        let lights: Vec<usize> = primitives
            .iter()
            .enumerate()
            .filter(|(_, p)| p.is_emissive())
            .map(|(i, _)| i)
            .collect();
        log::debug!(
            "scene: {} primitives, {} lights",
            primitives.len(),
            lights.len()
        );
        Self { primitives, lights }
    }

    /// All primitives, in index order.
    pub fn primitives(&self) -> &[Primitive] {
        &self.primitives
    }

    /// Indices of emissive primitives.
    pub fn lights(&self) -> &[usize] {
        &self.lights
    }

    /// Primitive by index.
    pub fn primitive(&self, index: usize) -> &Primitive {
        &self.primitives[index]
    }

    /// Find the nearest hit along a ray.
    ///
    /// The direction is normalized internally, so the returned distance is
    /// metric. `exclude` skips one primitive index; walks use this instead of
    /// an epsilon offset to suppress self-intersection at the ray origin.
    /// A zero-length direction is a miss.
    pub fn closest_hit(
        &self,
        origin: Vec3,
        direction: Vec3,
        exclude: Option<usize>,
    ) -> Option<Intersection> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }

        let mut nearest: Option<Intersection> = None;
        for (index, primitive) in self.primitives.iter().enumerate() {
            if exclude == Some(index) {
                continue;
            }
            let Some(t) = primitive.intersect(origin, dir) else {
                continue;
            };
            if nearest.map_or(true, |n| t < n.distance) {
                let position = origin + t * dir;
                nearest = Some(Intersection {
                    position,
                    normal: primitive.normal_at(position),
                    distance: t,
                    index,
                });
            }
        }
        nearest
    }
}

/// Two triangles covering the quad `a b c d` (counter-clockwise).
fn quad(a: Vec3, b: Vec3, c: Vec3, d: Vec3, color: Color) -> [Primitive; 2] {
    [
        Primitive::triangle(a, b, c, color),
        Primitive::triangle(a, c, d, color),
    ]
}

impl Scene {
    /// The built-in Cornell-box test model.
    ///
    /// A [-1, 1]^3 room with a red left wall, a green right wall, white
    /// floor/ceiling/back wall, one diffuse sphere and one emissive sphere
    /// light. The camera convention looks down +z from around z = -3.
    pub fn cornell_box() -> Self {
        let white = Color::new(0.75, 0.75, 0.75);
        let red = Color::new(0.75, 0.15, 0.15);
        let green = Color::new(0.15, 0.75, 0.15);

        // Room corners: l/r = x, b/t = y, n/f = z.
        let lbn = Vec3::new(-1.0, -1.0, -1.0);
        let rbn = Vec3::new(1.0, -1.0, -1.0);
        let ltn = Vec3::new(-1.0, 1.0, -1.0);
        let rtn = Vec3::new(1.0, 1.0, -1.0);
        let lbf = Vec3::new(-1.0, -1.0, 1.0);
        let rbf = Vec3::new(1.0, -1.0, 1.0);
        let ltf = Vec3::new(-1.0, 1.0, 1.0);
        let rtf = Vec3::new(1.0, 1.0, 1.0);

        let mut primitives = Vec::new();
        primitives.extend(quad(lbn, rbn, rbf, lbf, white)); // floor
        primitives.extend(quad(ltn, ltf, rtf, rtn, white)); // ceiling
        primitives.extend(quad(lbf, rbf, rtf, ltf, white)); // back wall
        primitives.extend(quad(lbn, lbf, ltf, ltn, red)); // left wall
        primitives.extend(quad(rbn, rtn, rtf, rbf, green)); // right wall

        primitives.push(Primitive::sphere(
            Vec3::new(0.45, 0.6, 0.2),
            0.35,
            Color::new(0.7, 0.7, 0.9),
        ));
        primitives.push(Primitive::sphere_emissive(
            Vec3::new(0.0, -0.5, -0.7),
            0.15,
            Color::ONE,
            Color::splat(14.0),
        ));

        Self::new(primitives)
    }
}
