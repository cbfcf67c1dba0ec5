//! The per-pixel, per-sample render driver.
//!
//! Each sample builds one camera subpath and one light subpath, connects
//! them, and folds the estimate into a running per-pixel mean. Rendering is
//! organized in whole-frame passes so a progressive caller can display (or
//! abandon) the partial image between passes without corrupting the means.

use lumen_core::Scene;
use lumen_math::{Color, Vec2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use thiserror::Error;

use crate::camera::Camera;
use crate::connect::connect_paths;
use crate::walk::{generate_camera_subpath, generate_light_subpath};

/// Render configuration.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Samples per pixel.
    pub samples_per_pixel: u32,
    /// Maximum bounces per subpath.
    pub max_depth: u32,
    /// Base seed for the sample streams.
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 16,
            max_depth: 5,
            seed: 0,
        }
    }
}

/// Errors that prevent rendering from starting.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RenderError {
    #[error("scene has no emissive primitives")]
    NoLights,
}

/// Per-pixel running means of the radiance estimates.
#[derive(Debug)]
pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Color>,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Fold one more sample into the running mean at (x, y).
    ///
    /// `pass` is the number of samples already folded in.
    pub fn accumulate(&mut self, x: u32, y: u32, pass: u32, sample: Color) {
        let slot = &mut self.pixels[(y * self.width + x) as usize];
        *slot = (*slot * pass as f32 + sample) / (pass + 1) as f32;
    }

    /// Convert to 8-bit RGB, scaling to [0, 255] and clamping.
    pub fn to_rgb8(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.pixels.len() * 3);
        for color in &self.pixels {
            let c = (255.0 * *color).clamp(Color::ZERO, Color::splat(255.0));
            bytes.extend_from_slice(&[c.x as u8, c.y as u8, c.z as u8]);
        }
        bytes
    }
}

/// One bidirectional estimate for the pixel at (x, y).
pub fn render_sample<R: Rng + ?Sized>(
    scene: &Scene,
    camera: &Camera,
    max_depth: u32,
    x: u32,
    y: u32,
    rng: &mut R,
) -> Color {
    let film_sample = Vec2::new(x as f32 + rng.gen::<f32>(), y as f32 + rng.gen::<f32>());
    let lens_sample = Vec2::new(rng.gen(), rng.gen());

    let camera_path =
        generate_camera_subpath(scene, camera, film_sample, lens_sample, 0.0, max_depth, rng);
    let light_path = generate_light_subpath(scene, max_depth, rng);

    connect_paths(scene, &light_path, &camera_path)
}

/// Progressive single-threaded render.
///
/// `keep_going` is consulted between whole-frame passes; returning false
/// stops the render cooperatively, leaving the accumulated means valid.
pub fn render_progressive(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
    frame: &mut FrameBuffer,
    mut keep_going: impl FnMut(u32) -> bool,
) -> Result<(), RenderError> {
    if scene.lights().is_empty() {
        return Err(RenderError::NoLights);
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    for pass in 0..config.samples_per_pixel {
        if !keep_going(pass) {
            log::info!("render stopped after {pass} passes");
            break;
        }
        for y in 0..frame.height {
            for x in 0..frame.width {
                let sample = render_sample(scene, camera, config.max_depth, x, y, &mut rng);
                frame.accumulate(x, y, pass, sample);
            }
        }
        log::info!("sample pass {}/{}", pass + 1, config.samples_per_pixel);
    }
    Ok(())
}

/// Render the whole frame single-threaded.
pub fn render(scene: &Scene, camera: &Camera, config: &RenderConfig) -> Result<FrameBuffer, RenderError> {
    let mut frame = FrameBuffer::new(camera.image_width, camera.image_height);
    render_progressive(scene, camera, config, &mut frame, |_| true)?;
    Ok(frame)
}

/// Render with rayon over disjoint rows.
///
/// Each row owns its slice of the frame buffer and a deterministic RNG
/// stream derived from the base seed, so no synchronization is needed and
/// the result is reproducible for a given seed and thread-independent.
pub fn render_parallel(
    scene: &Scene,
    camera: &Camera,
    config: &RenderConfig,
) -> Result<FrameBuffer, RenderError> {
    if scene.lights().is_empty() {
        return Err(RenderError::NoLights);
    }

    let mut frame = FrameBuffer::new(camera.image_width, camera.image_height);
    let width = frame.width;
    frame
        .pixels
        .par_chunks_mut(width as usize)
        .enumerate()
        .for_each(|(y, row)| {
            let mut rng = StdRng::seed_from_u64(row_seed(config.seed, y as u32));
            for (x, slot) in row.iter_mut().enumerate() {
                let mut mean = Color::ZERO;
                for pass in 0..config.samples_per_pixel {
                    let sample = render_sample(
                        scene,
                        camera,
                        config.max_depth,
                        x as u32,
                        y as u32,
                        &mut rng,
                    );
                    mean = (mean * pass as f32 + sample) / (pass + 1) as f32;
                }
                *slot = mean;
            }
        });
    Ok(frame)
}

/// Per-row RNG stream seed.
fn row_seed(seed: u64, row: u32) -> u64 {
    seed ^ (u64::from(row) + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15)
}
