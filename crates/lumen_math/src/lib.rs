// Re-export glam for convenience
pub use glam::*;

mod ray;
pub use ray::Ray;

/// Color is plain linear RGB.
pub type Color = Vec3;
