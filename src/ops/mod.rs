//! Pixel-level drawing operations on a single surface.

pub mod fill;
pub mod shapes;
