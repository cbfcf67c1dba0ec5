use anyhow::{Context, Result};
use clap::Parser;
use lumen_core::{load_scene, Scene};
use lumen_math::Vec3;
use lumen_renderer::{render_parallel, render_progressive, Camera, FrameBuffer, RenderConfig};
use std::path::PathBuf;

/// Bidirectional path tracer.
#[derive(Parser, Debug)]
#[command(name = "lumen", version, about)]
struct Args {
    /// Scene description (JSON). Renders the built-in Cornell box if omitted.
    #[arg(long)]
    scene: Option<PathBuf>,

    /// Output image path.
    #[arg(short, long, default_value = "output.png")]
    output: PathBuf,

    /// Image width in pixels.
    #[arg(long, default_value_t = 480)]
    width: u32,

    /// Image height in pixels.
    #[arg(long, default_value_t = 270)]
    height: u32,

    /// Samples per pixel.
    #[arg(short, long, default_value_t = 64)]
    samples: u32,

    /// Maximum bounces per subpath.
    #[arg(long, default_value_t = 5)]
    max_depth: u32,

    /// Camera position, world space.
    #[arg(long, num_args = 3, value_names = ["X", "Y", "Z"], default_values_t = [0.0, 0.0, -3.0], allow_negative_numbers = true)]
    position: Vec<f32>,

    /// Camera pitch in radians.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pitch: f32,

    /// Camera yaw in radians.
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    yaw: f32,

    /// Vertical field of view in degrees.
    #[arg(long, default_value_t = 50.0)]
    fov: f32,

    /// Thin-lens aperture radius; 0 is a pinhole.
    #[arg(long, default_value_t = 0.0)]
    lens_radius: f32,

    /// Focal plane distance along the view axis.
    #[arg(long, default_value_t = 1.0)]
    focal_distance: f32,

    /// Base RNG seed.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Render single-threaded, one pass at a time.
    #[arg(long)]
    progressive: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let scene = match &args.scene {
        Some(path) => load_scene(path)
            .with_context(|| format!("failed to load scene {}", path.display()))?,
        None => Scene::cornell_box(),
    };
    log::info!(
        "scene: {} primitives, {} lights",
        scene.primitives().len(),
        scene.lights().len()
    );

    let mut camera = Camera::new()
        .with_resolution(args.width, args.height)
        .with_pose(
            Vec3::new(args.position[0], args.position[1], args.position[2]),
            args.pitch,
            args.yaw,
        )
        .with_lens(args.fov, args.lens_radius, args.focal_distance);
    camera.initialize();

    let config = RenderConfig {
        samples_per_pixel: args.samples,
        max_depth: args.max_depth,
        seed: args.seed,
    };

    let frame = if args.progressive {
        let mut frame = FrameBuffer::new(args.width, args.height);
        render_progressive(&scene, &camera, &config, &mut frame, |_| true)?;
        frame
    } else {
        render_parallel(&scene, &camera, &config)?
    };

    let image = image::RgbImage::from_raw(frame.width, frame.height, frame.to_rgb8())
        .context("frame buffer size mismatch")?;
    image
        .save(&args.output)
        .with_context(|| format!("failed to write {}", args.output.display()))?;
    log::info!("wrote {}", args.output.display());

    Ok(())
}
