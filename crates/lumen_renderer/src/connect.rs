//! Connection strategies and multiple importance sampling.
//!
//! Given one light subpath and one camera subpath, every admissible pair of
//! prefix lengths `(s, t)` (s light vertices, t camera vertices) is a
//! strategy for building the same family of transport paths. Each strategy's
//! contribution is weighted with the balance heuristic so the sum over all
//! strategies stays unbiased while the variance drops.

use lumen_core::Scene;
use lumen_math::Color;

use crate::sampling::uniform_hemisphere_pdf;
use crate::transport::{geometric_term, lambertian_brdf, solid_angle_to_area};
use crate::vertex::Vertex;

/// Offset along the surface normal for connection (shadow) ray origins.
const SHADOW_EPS: f32 = 1e-4;

/// Slack when comparing a visibility hit distance against the target
/// distance; a hit essentially at the target does not occlude it.
const VISIBILITY_SLACK: f32 = 1e-3;

/// Combine the two subpaths into a single radiance estimate.
pub fn connect_paths(scene: &Scene, light_path: &[Vertex], camera_path: &[Vertex]) -> Color {
    let mut radiance = Color::ZERO;

    // s = 0 family: the camera walk reached an emitter on its own.
    for t in 2..=camera_path.len() {
        let terminal = &camera_path[t - 1];
        let Some(index) = terminal.primitive else {
            continue;
        };
        let primitive = scene.primitive(index);
        if !primitive.is_emissive() {
            continue;
        }
        let weight = mis_weight(scene, light_path, camera_path, 0, t);
        radiance += primitive.emission() * terminal.throughput * weight;
    }

    // s >= 1: join a light vertex to a camera vertex with a visibility ray.
    for s in 1..=light_path.len() {
        for t in 2..=camera_path.len() {
            radiance += connect_strategy(scene, light_path, camera_path, s, t);
        }
    }

    radiance
}

/// Contribution of strategy `(s, t)`; zero when occluded or degenerate.
fn connect_strategy(
    scene: &Scene,
    light_path: &[Vertex],
    camera_path: &[Vertex],
    s: usize,
    t: usize,
) -> Color {
    let light_vertex = &light_path[s - 1];
    let camera_vertex = &camera_path[t - 1];
    let (Some(light_index), Some(camera_index)) = (light_vertex.primitive, camera_vertex.primitive)
    else {
        return Color::ZERO;
    };

    let g = geometric_term(
        light_vertex.position,
        light_vertex.normal,
        camera_vertex.position,
        camera_vertex.normal,
    );
    if g <= 0.0 {
        return Color::ZERO;
    }
    if !visible(scene, light_vertex, camera_vertex) {
        // Occlusion is an expected outcome, not an error.
        return Color::ZERO;
    }

    let toward_camera = (camera_vertex.position - light_vertex.position).normalize_or_zero();

    // At s = 1 the connection leaves the light's emission point, where no
    // incoming direction exists. The factor is the area-measure emission
    // term: radiance over the light-choice and surface-position densities.
    // (Derived from first principles; the walk's folded origin throughput is
    // only valid along its own sampled departure direction.)
    let light_factor = if s == 1 {
        let origin_pdf = light_origin_area_pdf(scene, light_index);
        if origin_pdf <= 0.0 || !origin_pdf.is_finite() {
            return Color::ZERO;
        }
        scene.primitive(light_index).emission() / origin_pdf
    } else {
        let incoming = (light_vertex.position - light_path[s - 2].position).normalize_or_zero();
        light_vertex.throughput
            * lambertian_brdf(
                scene.primitive(light_index).color(),
                incoming,
                toward_camera,
                true,
            )
    };

    let camera_incoming =
        (camera_vertex.position - camera_path[t - 2].position).normalize_or_zero();
    let camera_factor = camera_vertex.throughput
        * lambertian_brdf(
            scene.primitive(camera_index).color(),
            camera_incoming,
            -toward_camera,
            false,
        );

    let weight = mis_weight(scene, light_path, camera_path, s, t);
    light_factor * g * camera_factor * weight
}

/// Visibility between two path vertices.
///
/// The connection is accepted when the nearest hit along the segment is the
/// target's own primitive (compared by index) or lands essentially at the
/// target distance. The shadow ray starts a small step off the surface and
/// excludes the source primitive.
fn visible(scene: &Scene, from: &Vertex, to: &Vertex) -> bool {
    let Some(target) = to.primitive else {
        return false;
    };
    let delta = to.position - from.position;
    let distance = delta.length();
    if distance <= SHADOW_EPS {
        return false;
    }
    let origin = from.position + from.normal * SHADOW_EPS;
    match scene.closest_hit(origin, delta, from.primitive) {
        None => true,
        Some(hit) => hit.index == target || hit.distance >= distance - VISIBILITY_SLACK,
    }
}

/// Area density of the light subpath origin: light choice times uniform
/// surface position. The departure direction is not included; it belongs to
/// the first edge of the walk.
pub fn light_origin_area_pdf(scene: &Scene, index: usize) -> f32 {
    let count = scene.lights().len().max(1) as f32;
    1.0 / (count * scene.primitive(index).area())
}

/// Balance-heuristic weight of strategy `(s, t)`.
///
/// The full path is laid out from the light end; for every alternative split
/// `k` the generation density is the product of light-side area densities up
/// to `k` and camera-side area densities beyond it. Densities inside either
/// subpath come from the stored `pdf_fwd`/`pdf_rev`; only the densities
/// across the connection edge are evaluated here. Degenerate strategies
/// (zero or non-finite density) drop out of the sum.
pub fn mis_weight(
    scene: &Scene,
    light_path: &[Vertex],
    camera_path: &[Vertex],
    s: usize,
    t: usize,
) -> f32 {
    let n = s + t;
    if n == 2 {
        // A two-vertex path has a single admissible strategy.
        return 1.0;
    }

    let hemisphere_pdf = uniform_hemisphere_pdf(1.0);
    let mut vertices: Vec<&Vertex> = Vec::with_capacity(n);
    vertices.extend(light_path[..s].iter());
    vertices.extend(camera_path[..t].iter().rev());

    // Every strategy for this path starts its light side on x0's primitive.
    let Some(light_index) = vertices[0].primitive else {
        return 0.0;
    };
    let origin_pdf = light_origin_area_pdf(scene, light_index) as f64;

    let area_pdf = |from: &Vertex, to: &Vertex| -> f64 {
        solid_angle_to_area(hemisphere_pdf, from.position, to.position, to.normal) as f64
    };

    // forward[m]: area density of generating x_m from the light side.
    let forward: Vec<f64> = (0..n)
        .map(|m| {
            if m == 0 {
                origin_pdf
            } else if m < s {
                vertices[m].pdf_fwd as f64
            } else if m == s {
                // Connection edge, never sampled by either walk.
                area_pdf(vertices[m - 1], vertices[m])
            } else {
                // Camera vertex re-generated from its camera-side successor.
                vertices[m].pdf_rev as f64
            }
        })
        .collect();

    // reverse[m]: area density of generating x_m from the camera side.
    let reverse: Vec<f64> = (0..n)
        .map(|m| {
            if m == n - 1 {
                // The camera origin is deterministic given the film sample.
                1.0
            } else if m >= s {
                vertices[m].pdf_fwd as f64
            } else if m + 1 == s {
                area_pdf(vertices[s], vertices[s - 1])
            } else {
                vertices[m].pdf_rev as f64
            }
        })
        .collect();

    // Density of every admissible split; the camera side keeps >= 2 vertices.
    let mut total = 0.0f64;
    let mut chosen = 0.0f64;
    for k in 0..=n - 2 {
        let mut density = 1.0f64;
        for m in 0..k {
            density *= forward[m];
        }
        for m in k..n {
            density *= reverse[m];
        }
        if !density.is_finite() || density <= 0.0 {
            continue;
        }
        total += density;
        if k == s {
            chosen = density;
        }
    }

    if total <= 0.0 {
        return 0.0;
    }
    let weight = chosen / total;
    if weight.is_finite() {
        weight as f32
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::solid_angle_to_area;
    use lumen_core::Primitive;
    use lumen_math::{Ray, Vec3};

    /// Quad at z = 1 facing -z, an emissive sphere, and optionally a blocker
    /// quad between them.
    fn connection_scene(with_blocker: bool) -> Scene {
        let mut primitives = vec![
            Primitive::triangle(
                Vec3::new(-1.0, -1.0, 1.0),
                Vec3::new(1.0, -1.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Color::splat(0.8),
            ),
            Primitive::sphere_emissive(
                Vec3::new(0.0, 0.0, -2.0),
                0.2,
                Color::ONE,
                Color::splat(14.0),
            ),
        ];
        if with_blocker {
            // Large quad halfway between the light and the triangle.
            primitives.extend([
                Primitive::triangle(
                    Vec3::new(-5.0, -5.0, -0.5),
                    Vec3::new(5.0, -5.0, -0.5),
                    Vec3::new(0.0, 8.0, -0.5),
                    Color::splat(0.5),
                ),
                Primitive::triangle(
                    Vec3::new(-5.0, -5.0, -0.5),
                    Vec3::new(0.0, 8.0, -0.5),
                    Vec3::new(-5.0, 8.0, -0.5),
                    Color::splat(0.5),
                ),
            ]);
        }
        Scene::new(primitives)
    }

    fn surface_vertex(scene: &Scene, index: usize, position: Vec3, toward: Vec3) -> Vertex {
        let normal = {
            let n = scene.primitive(index).normal_at(position);
            if n.dot(toward) < 0.0 {
                -n
            } else {
                n
            }
        };
        Vertex {
            position,
            normal,
            dir_out: Vec3::ZERO,
            throughput: Color::ONE,
            pdf_fwd: 1.0,
            pdf_rev: 0.0,
            primitive: Some(index),
        }
    }

    #[test]
    fn test_occluded_connection_is_exactly_zero() {
        let scene = connection_scene(true);
        let light_origin = Vec3::new(0.0, 0.0, -1.8);
        let light = Vertex::light_origin(
            light_origin,
            Vec3::Z,
            Vec3::Z,
            Color::ONE,
            1.0,
            1,
        );
        let camera = Vertex::camera_origin(
            &Ray::new_simple(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z),
            1.0,
        );
        let hit = surface_vertex(&scene, 0, Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        let contribution = connect_strategy(&scene, &[light], &[camera, hit], 1, 2);
        assert_eq!(contribution, Color::ZERO);
    }

    #[test]
    fn test_unoccluded_connection_contributes() {
        let scene = connection_scene(false);
        let light_origin = Vec3::new(0.0, 0.0, -1.8);
        let light = Vertex::light_origin(
            light_origin,
            Vec3::Z,
            Vec3::Z,
            Color::ONE,
            1.0,
            1,
        );
        let camera = Vertex::camera_origin(
            &Ray::new_simple(Vec3::new(0.0, 0.0, 3.0), -Vec3::Z),
            1.0,
        );
        let hit = surface_vertex(&scene, 0, Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        let contribution = connect_strategy(&scene, &[light], &[camera, hit], 1, 2);
        assert!(contribution.length() > 0.0);
    }

    #[test]
    fn test_visibility_accepts_hit_on_target_primitive() {
        let scene = connection_scene(false);
        let light = surface_vertex(&scene, 1, Vec3::new(0.0, 0.0, -1.8), Vec3::Z);
        let target = surface_vertex(&scene, 0, Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        assert!(visible(&scene, &light, &target));
    }

    #[test]
    fn test_visibility_rejects_blocked_segment() {
        let scene = connection_scene(true);
        let light = surface_vertex(&scene, 1, Vec3::new(0.0, 0.0, -1.8), Vec3::Z);
        let target = surface_vertex(&scene, 0, Vec3::new(0.0, 0.0, 1.0), -Vec3::Z);
        assert!(!visible(&scene, &light, &target));
    }

    #[test]
    fn test_two_vertex_path_weight_is_one() {
        let scene = connection_scene(false);
        let camera = Vertex::camera_origin(
            &Ray::new_simple(Vec3::new(0.0, 0.0, -4.0), Vec3::Z),
            1.0,
        );
        let hit = surface_vertex(&scene, 1, Vec3::new(0.0, 0.0, -2.2), -Vec3::Z);
        assert_eq!(mis_weight(&scene, &[], &[camera, hit], 0, 2), 1.0);
    }

    /// The same three-vertex path described once as a pure camera path
    /// (s=0, t=3) and once as a one-vertex light connection (s=1, t=2) must
    /// have balance weights that sum to one.
    #[test]
    fn test_balance_weights_sum_to_one_over_strategies() {
        let scene = connection_scene(false);
        let hemisphere_pdf = uniform_hemisphere_pdf(1.0);

        let camera_pos = Vec3::new(0.0, 0.0, 3.0);
        let surface_pos = Vec3::new(0.0, 0.0, 1.0);
        let light_pos = Vec3::new(0.0, 0.0, -1.8);

        let camera = Vertex::camera_origin(&Ray::new_simple(camera_pos, -Vec3::Z), 1.0);
        let mut surface = surface_vertex(&scene, 0, surface_pos, -Vec3::Z);
        let mut light_terminal = surface_vertex(&scene, 1, light_pos, Vec3::Z);

        // Stored densities exactly as the camera walk would record them.
        surface.pdf_fwd = solid_angle_to_area(1.0, camera_pos, surface_pos, surface.normal);
        surface.pdf_rev =
            solid_angle_to_area(hemisphere_pdf, light_pos, surface_pos, surface.normal);
        light_terminal.pdf_fwd = solid_angle_to_area(
            hemisphere_pdf,
            surface_pos,
            light_pos,
            light_terminal.normal,
        );

        let camera_path = [camera, surface, light_terminal];

        // Light subpath view of the same path.
        let light_origin = Vertex::light_origin(
            light_pos,
            light_terminal.normal,
            Vec3::Z,
            Color::ONE,
            light_origin_area_pdf(&scene, 1) * hemisphere_pdf,
            1,
        );

        let w_terminal = mis_weight(&scene, &[], &camera_path, 0, 3);
        let w_connect = mis_weight(&scene, &[light_origin], &camera_path[..2], 1, 2);

        assert!(w_terminal > 0.0 && w_connect > 0.0);
        assert!(
            (w_terminal + w_connect - 1.0).abs() < 1e-4,
            "weights {w_terminal} + {w_connect} should sum to 1"
        );
    }

    #[test]
    fn test_connect_paths_empty_light_subpath_still_counts_terminal_hits() {
        let scene = connection_scene(false);
        let camera = Vertex::camera_origin(
            &Ray::new_simple(Vec3::new(0.0, 0.0, -4.0), Vec3::Z),
            1.0,
        );
        let mut hit = surface_vertex(&scene, 1, Vec3::new(0.0, 0.0, -2.2), -Vec3::Z);
        hit.throughput = Color::ONE;
        let radiance = connect_paths(&scene, &[], &[camera, hit]);
        assert!((radiance - Color::splat(14.0)).length() < 1e-3);
    }

    #[test]
    fn test_balance_weights_partition_generated_walks() {
        use crate::camera::Camera;
        use crate::walk::generate_camera_subpath;
        use lumen_math::Vec2;
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let scene = Scene::cornell_box();
        let mut camera = Camera::new()
            .with_resolution(32, 32)
            .with_pose(Vec3::new(0.0, 0.0, -3.0), 0.0, 0.0);
        camera.initialize();

        // Walks that reach the light on their own are complete paths; read
        // from the light end they are the same path split at every (s, t),
        // so the balance weights over all splits must sum to one.
        let mut rng = StdRng::seed_from_u64(42);
        let mut checked = 0;
        for _ in 0..1000 {
            let film = Vec2::new(rng.gen::<f32>() * 32.0, rng.gen::<f32>() * 32.0);
            let path =
                generate_camera_subpath(&scene, &camera, film, Vec2::ZERO, 0.0, 8, &mut rng);
            let n = path.len();
            let ends_on_light = path
                .last()
                .and_then(|v| v.primitive)
                .map(|i| scene.primitive(i).is_emissive())
                .unwrap_or(false);
            if n < 4 || !ends_on_light {
                continue;
            }

            // The same vertices in light-first order; each vertex's stored
            // densities swap roles when the walk direction flips.
            let light_path: Vec<Vertex> = (0..n)
                .map(|m| {
                    let mut v = path[n - 1 - m];
                    std::mem::swap(&mut v.pdf_fwd, &mut v.pdf_rev);
                    v
                })
                .collect();

            let mut total = 0.0f32;
            for s in 0..=n - 2 {
                total += mis_weight(&scene, &light_path, &path, s, n - s);
            }
            assert!(
                (total - 1.0).abs() < 1e-3,
                "weights of an {n}-vertex path must partition unity, got {total}"
            );
            checked += 1;
            if checked >= 10 {
                break;
            }
        }
        assert!(checked >= 5, "only {checked} light-terminated walks found");
    }
}
