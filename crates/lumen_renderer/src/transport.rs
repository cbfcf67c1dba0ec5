//! Density conversion, surface response, and geometric coupling.
//!
//! Vertex densities are stored in area measure so that MIS weight ratios are
//! well-defined regardless of which end of the path generated a vertex. The
//! conversion happens here, at the moment a density is recorded.

use lumen_math::{Color, Vec3};
use std::f32::consts::PI;

/// Convert a solid-angle density at `from` into an area density at `to`.
///
/// The factor is `|cos theta_to| / distance^2`, with the cosine measured
/// between the `from -> to` direction and `to`'s normal. Coincident points
/// produce a zero density rather than a division by zero.
pub fn solid_angle_to_area(pdf_dir: f32, from: Vec3, to: Vec3, normal_to: Vec3) -> f32 {
    let delta = to - from;
    let dist2 = delta.length_squared();
    if dist2 <= 0.0 {
        return 0.0;
    }
    let cos_to = delta.normalize().dot(normal_to).abs();
    pdf_dir * cos_to / dist2
}

/// Lambertian surface response: `color / pi`, independent of directions.
///
/// The directions and the adjoint flag are part of the contract for
/// non-symmetric BSDFs; the diffuse model ignores them.
pub fn lambertian_brdf(color: Color, _incoming: Vec3, _outgoing: Vec3, _adjoint: bool) -> Color {
    color / PI
}

/// Geometric coupling between two surface points:
/// `|cos theta_1 * cos theta_2| / distance^2`.
pub fn geometric_term(p1: Vec3, n1: Vec3, p2: Vec3, n2: Vec3) -> f32 {
    let delta = p2 - p1;
    let dist2 = delta.length_squared();
    if dist2 <= 0.0 {
        return 0.0;
    }
    let dir = delta / dist2.sqrt();
    (dir.dot(n1) * dir.dot(n2)).abs() / dist2
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solid_angle_to_area_matches_formula() {
        let from = Vec3::ZERO;
        let to = Vec3::new(0.0, 0.0, 2.0);
        let normal = Vec3::new(0.0, 0.0, -1.0);
        // cos = 1, dist^2 = 4
        let got = solid_angle_to_area(0.5, from, to, normal);
        assert!((got - 0.5 * 1.0 / 4.0).abs() < 1e-6);

        let tilted = Vec3::new(0.0, 1.0, -1.0).normalize();
        let got = solid_angle_to_area(1.0, from, to, tilted);
        let expected = (2.0_f32).sqrt().recip() / 4.0;
        assert!((got - expected).abs() < 1e-5);
    }

    #[test]
    fn test_solid_angle_to_area_coincident_points() {
        assert_eq!(solid_angle_to_area(1.0, Vec3::ONE, Vec3::ONE, Vec3::Z), 0.0);
    }

    #[test]
    fn test_lambertian_brdf_is_direction_independent() {
        let color = Color::new(0.6, 0.3, 0.1);
        let a = lambertian_brdf(color, Vec3::X, Vec3::Y, false);
        let b = lambertian_brdf(color, Vec3::Z, -Vec3::X, true);
        assert_eq!(a, b);
        assert!((a.x - 0.6 / PI).abs() < 1e-6);
    }

    #[test]
    fn test_geometric_term_facing_planes() {
        // Two points one unit apart with normals facing each other.
        let g = geometric_term(Vec3::ZERO, Vec3::Z, Vec3::Z, -Vec3::Z);
        assert!((g - 1.0).abs() < 1e-6);

        // Doubling the distance quarters the coupling.
        let g2 = geometric_term(Vec3::ZERO, Vec3::Z, 2.0 * Vec3::Z, -Vec3::Z);
        assert!((g2 - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_geometric_term_orthogonal_normal() {
        let g = geometric_term(Vec3::ZERO, Vec3::X, Vec3::Z, -Vec3::Z);
        assert!(g.abs() < 1e-6);
    }
}
