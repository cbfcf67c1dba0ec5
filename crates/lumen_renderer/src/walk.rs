//! Subpath generation.
//!
//! Both subpaths share one iterative random walk. A walk terminates when the
//! depth cap is reached, when the ray leaves the scene, or when it strikes an
//! emitter (lights do not forward-scatter). Self-intersection is suppressed
//! by excluding the previous vertex's primitive from the next query instead
//! of offsetting the ray origin.

use lumen_core::Scene;
use lumen_math::{Vec2, Vec3};
use rand::Rng;

use crate::camera::Camera;
use crate::sampling::{
    project_onto, sample_on_primitive, uniform_hemisphere, uniform_hemisphere_pdf,
};
use crate::transport::{lambertian_brdf, solid_angle_to_area};
use crate::vertex::{Subpath, Vertex};

/// Generate the camera subpath for one film sample.
///
/// Index 0 is the camera origin built from the primary ray and its
/// importance weight; the walk then bounces up to `max_depth` times, so the
/// subpath holds at most `max_depth + 1` vertices.
pub fn generate_camera_subpath<R: Rng + ?Sized>(
    scene: &Scene,
    camera: &Camera,
    film_sample: Vec2,
    lens_sample: Vec2,
    time: f32,
    max_depth: u32,
    rng: &mut R,
) -> Subpath {
    let (ray, importance) = camera.generate_ray(film_sample, lens_sample, time);
    let origin = Vertex::camera_origin(&ray, importance);
    random_walk(scene, origin, max_depth, false, rng)
}

/// Generate the light subpath for one sample.
///
/// A light is chosen uniformly among the emitters, an origin point uniformly
/// on its surface, and a departure direction uniformly on the hemisphere
/// around the local outward normal. Returns an empty subpath when the scene
/// has no emitters (the integrator rejects such scenes before rendering).
pub fn generate_light_subpath<R: Rng + ?Sized>(
    scene: &Scene,
    max_depth: u32,
    rng: &mut R,
) -> Subpath {
    let lights = scene.lights();
    if lights.is_empty() {
        return Vec::new();
    }
    let chosen = lights[rng.gen_range(0..lights.len())];
    let primitive = scene.primitive(chosen);

    let (position, normal) = sample_on_primitive(rng, primitive);
    let dir_out = uniform_hemisphere(rng, normal, 1.0);

    let choice_pdf = 1.0 / lights.len() as f32;
    let position_pdf = 1.0 / primitive.area();
    let pdf_fwd = choice_pdf * position_pdf * uniform_hemisphere_pdf(1.0);
    if pdf_fwd <= 0.0 || !pdf_fwd.is_finite() {
        return Vec::new();
    }

    let cos_theta = dir_out.dot(normal).abs();
    let throughput = primitive.emission() * cos_theta / pdf_fwd;

    let origin = Vertex::light_origin(position, normal, dir_out, throughput, pdf_fwd, chosen);
    random_walk(scene, origin, max_depth, true, rng)
}

/// The shared bounce loop.
///
/// Every stored density is in area measure: the forward density of a new
/// vertex converts the directional density at its predecessor, and the
/// predecessor's reverse density is filled in as soon as the new vertex
/// exists. Throughput is updated with `brdf * |cos| / pdf_dir` using the
/// solid-angle density; the area conversion factors cancel against the
/// geometric term applied at connection time and must not be applied twice.
fn random_walk<R: Rng + ?Sized>(
    scene: &Scene,
    origin: Vertex,
    max_depth: u32,
    adjoint: bool,
    rng: &mut R,
) -> Subpath {
    let hemisphere_pdf = uniform_hemisphere_pdf(1.0);
    let mut path: Subpath = Vec::with_capacity(max_depth as usize + 1);
    let mut beta = origin.throughput;
    path.push(origin);

    while path.len() <= max_depth as usize {
        let prev = path[path.len() - 1];
        let Some(hit) = scene.closest_hit(prev.position, prev.dir_out, prev.primitive) else {
            break;
        };
        let primitive = scene.primitive(hit.index);
        let incoming = prev.dir_out.normalize_or_zero();

        // Shading normal on the hemisphere the ray arrived from.
        let shading_normal = {
            let projected = project_onto(-incoming, hit.normal).normalize_or_zero();
            if projected == Vec3::ZERO {
                hit.normal
            } else {
                projected
            }
        };

        // The camera origin emits a deterministic direction; every other
        // vertex scatters with the uniform hemisphere density.
        let prev_dir_pdf = if prev.on_surface() { hemisphere_pdf } else { 1.0 };
        let mut vertex = Vertex {
            position: hit.position,
            normal: shading_normal,
            dir_out: Vec3::ZERO,
            throughput: beta,
            pdf_fwd: solid_angle_to_area(prev_dir_pdf, prev.position, hit.position, shading_normal),
            pdf_rev: 0.0,
            primitive: Some(hit.index),
        };

        // Reverse density of the predecessor, now that its successor exists.
        let last = path.len() - 1;
        path[last].pdf_rev =
            solid_angle_to_area(hemisphere_pdf, hit.position, prev.position, prev.normal);

        if primitive.is_emissive() {
            // Lights do not forward-scatter.
            path.push(vertex);
            break;
        }

        let dir_out = uniform_hemisphere(rng, shading_normal, 1.0);
        let cos_theta = dir_out.dot(shading_normal).abs();
        beta *= lambertian_brdf(primitive.color(), incoming, dir_out, adjoint) * cos_theta
            / hemisphere_pdf;
        vertex.dir_out = dir_out;
        path.push(vertex);
    }

    path
}
