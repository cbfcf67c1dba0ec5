//! Perspective thin-lens camera.
//!
//! Maps a film sample through the screen window onto the image plane, then
//! through the lens, and returns a world-space primary ray together with its
//! importance weight. The subpath generator consumes this as a black box.

use lumen_math::{Mat3, Ray, Vec2, Vec3};
use std::f32::consts::TAU;

/// Camera for generating primary rays.
#[derive(Debug, Clone)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Pose
    position: Vec3,
    pitch: f32,
    yaw: f32,

    // Lens settings
    vfov: f32,           // Vertical field of view in degrees
    lens_radius: f32,    // 0 disables depth of field
    focal_distance: f32, // Distance to the plane of perfect focus

    // Cached computed values (set by initialize())
    rotation: Mat3,
    tan_half_fov: f32,
    aspect: f32,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 480,
            image_height: 270,
            position: Vec3::ZERO,
            pitch: 0.0,
            yaw: 0.0,
            vfov: 50.0,
            lens_radius: 0.0,
            focal_distance: 1.0,
            rotation: Mat3::IDENTITY,
            tan_half_fov: 0.0,
            aspect: 1.0,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera pose: world position plus pitch and yaw in radians.
    pub fn with_pose(mut self, position: Vec3, pitch: f32, yaw: f32) -> Self {
        self.position = position;
        self.pitch = pitch;
        self.yaw = yaw;
        self
    }

    /// Set lens settings. A zero lens radius gives a pinhole camera.
    pub fn with_lens(mut self, vfov: f32, lens_radius: f32, focal_distance: f32) -> Self {
        self.vfov = vfov;
        self.lens_radius = lens_radius;
        self.focal_distance = focal_distance;
        self
    }

    /// Initialize cached values (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.rotation = Mat3::from_rotation_y(self.yaw) * Mat3::from_rotation_x(self.pitch);
        self.tan_half_fov = (self.vfov.to_radians() / 2.0).tan();
        self.aspect = self.image_width as f32 / self.image_height as f32;
    }

    /// Generate the primary ray for a film sample, with its importance.
    ///
    /// `film_sample` is in raster coordinates (pixel position plus jitter);
    /// `lens_sample` is a point in the unit square driving depth of field.
    /// The returned direction looks down +z in camera space before the pose
    /// rotation and is not normalized.
    pub fn generate_ray(&self, film_sample: Vec2, lens_sample: Vec2, time: f32) -> (Ray, f32) {
        // Raster -> screen window [-aspect, aspect] x [-1, 1] -> camera space.
        let screen_x = film_sample.x / self.image_width as f32 * 2.0 - 1.0;
        let screen_y = film_sample.y / self.image_height as f32 * 2.0 - 1.0;
        let direction = Vec3::new(
            screen_x * self.aspect * self.tan_half_fov,
            screen_y * self.tan_half_fov,
            1.0,
        );

        let (origin, direction) = if self.lens_radius > 0.0 {
            let lens = self.lens_radius * sample_disk(lens_sample);
            let origin = Vec3::new(lens.x, lens.y, 0.0);
            // Rays through the lens converge on the focal plane.
            let focus = direction * (self.focal_distance / direction.z);
            (origin, focus - origin)
        } else {
            (Vec3::ZERO, direction)
        };

        let ray = Ray::new(
            self.position + self.rotation * origin,
            self.rotation * direction,
            time,
        );
        (ray, 1.0)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a unit-square sample to the unit disk.
fn sample_disk(u: Vec2) -> Vec2 {
    let r = u.x.sqrt();
    let theta = TAU * u.y;
    Vec2::new(r * theta.cos(), r * theta.sin())
}
