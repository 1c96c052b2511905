use std::fmt;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "canvas_test.rs"]
mod canvas_test;

// ============================================================================
// COORDINATES
// ============================================================================

/// Integer canvas coordinate. Signed so that geometry computed around a
/// point (circle octants, triangle vertices) may fall off the canvas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// SURFACE – sparse 64×64 chunk storage (Vec-indexed for speed)
// ============================================================================

pub const CHUNK_SIZE: u32 = 64;

static TRANSPARENT_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Fixed-size RGBA raster backed by a flat `Vec<Option<Arc<RgbaImage>>>`.
/// Chunk coordinates are mapped to a flat index via `cy * chunks_per_row + cx`.
///
/// Missing chunks read as fully transparent, so a freshly created or cleared
/// surface costs one `None` per chunk. Chunks are `Arc`-wrapped: cloning a
/// surface is cheap and writes copy only the touched chunk.
#[derive(Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    chunks_per_row: u32,
    chunks: Vec<Option<Arc<RgbaImage>>>,
}

impl Surface {
    // ---- construction -------------------------------------------------------

    /// Create a fully transparent surface. Both dimensions must be non-zero;
    /// the engine rejects zero sizes before any surface is built.
    pub fn new(width: u32, height: u32) -> Self {
        debug_assert!(width > 0 && height > 0, "surface dimensions must be positive");
        let chunks_per_row = width.div_ceil(CHUNK_SIZE);
        let chunks_per_col = height.div_ceil(CHUNK_SIZE);
        Self {
            width,
            height,
            chunks_per_row,
            chunks: vec![None; chunks_per_row as usize * chunks_per_col as usize],
        }
    }

    pub fn new_filled(width: u32, height: u32, color: Rgba<u8>) -> Self {
        let mut surface = Self::new(width, height);
        surface.fill(color);
        surface
    }

    // ---- indexing helpers ----------------------------------------------------

    #[inline(always)]
    fn flat_index(&self, cx: u32, cy: u32) -> usize {
        (cy * self.chunks_per_row + cx) as usize
    }

    #[inline(always)]
    fn chunk_coord(x: u32, y: u32) -> (u32, u32) {
        (x / CHUNK_SIZE, y / CHUNK_SIZE)
    }

    #[inline(always)]
    fn local(x: u32, y: u32) -> (u32, u32) {
        (x % CHUNK_SIZE, y % CHUNK_SIZE)
    }

    // ---- pixel access -------------------------------------------------------

    /// True when `(x, y)` addresses an existing pixel.
    #[inline]
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }

    /// Read a pixel. Coordinates outside the surface read as transparent.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        if x >= self.width || y >= self.height {
            return TRANSPARENT_PIXEL;
        }
        let (cx, cy) = Self::chunk_coord(x, y);
        let (lx, ly) = Self::local(x, y);
        self.chunks[self.flat_index(cx, cy)]
            .as_ref()
            .map(|c| *c.get_pixel(lx, ly))
            .unwrap_or(TRANSPARENT_PIXEL)
    }

    /// Write a pixel. Returns `false`, leaving the surface untouched, when the
    /// coordinate is outside the surface.
    #[inline]
    pub fn put_pixel(&mut self, x: u32, y: u32, pixel: Rgba<u8>) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let (cx, cy) = Self::chunk_coord(x, y);
        let (lx, ly) = Self::local(x, y);
        let idx = self.flat_index(cx, cy);
        let arc = self.chunks[idx]
            .get_or_insert_with(|| Arc::new(RgbaImage::new(CHUNK_SIZE, CHUNK_SIZE)));
        Arc::make_mut(arc).put_pixel(lx, ly, pixel);
        true
    }

    /// Read-only access to a chunk (if it has ever been written).
    pub fn get_chunk(&self, cx: u32, cy: u32) -> Option<&RgbaImage> {
        if cx >= self.chunks_per_row {
            return None;
        }
        self.chunks.get(self.flat_index(cx, cy)).and_then(|c| c.as_deref())
    }

    // ---- bulk operations ----------------------------------------------------

    /// Fill every pixel with `color`. A transparent fill just drops the chunks.
    pub fn fill(&mut self, color: Rgba<u8>) {
        if color == TRANSPARENT_PIXEL {
            self.clear();
            return;
        }
        let tile = Arc::new(RgbaImage::from_pixel(CHUNK_SIZE, CHUNK_SIZE, color));
        for slot in &mut self.chunks {
            *slot = Some(Arc::clone(&tile));
        }
    }

    /// Drop all chunks (make the surface fully transparent).
    pub fn clear(&mut self) {
        for slot in &mut self.chunks {
            *slot = None;
        }
    }

    /// Flatten into a contiguous `RgbaImage`.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut out = RgbaImage::new(self.width, self.height);
        for (i, slot) in self.chunks.iter().enumerate() {
            let Some(chunk) = slot else { continue };
            let base_x = (i as u32 % self.chunks_per_row) * CHUNK_SIZE;
            let base_y = (i as u32 / self.chunks_per_row) * CHUNK_SIZE;
            let cw = CHUNK_SIZE.min(self.width - base_x);
            let ch = CHUNK_SIZE.min(self.height - base_y);
            for ly in 0..ch {
                for lx in 0..cw {
                    out.put_pixel(base_x + lx, base_y + ly, *chunk.get_pixel(lx, ly));
                }
            }
        }
        out
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("populated_chunks", &self.chunks.iter().filter(|c| c.is_some()).count())
            .finish()
    }
}

// ============================================================================
// LAYER
// ============================================================================

#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub visible: bool,
    /// Multiplier applied to every pixel's alpha when compositing, in `[0, 1]`.
    pub opacity: f32,
    pub pixels: Surface,
}

impl Layer {
    pub fn new(name: impl Into<String>, width: u32, height: u32, fill_color: Rgba<u8>) -> Self {
        Self {
            name: name.into(),
            visible: true,
            opacity: 1.0,
            pixels: Surface::new_filled(width, height, fill_color),
        }
    }
}

// ============================================================================
// COMPOSITING
// ============================================================================

/// Merge `layers` bottom-to-top over a solid `backdrop`.
///
/// The caller decides which layers take part; every layer passed in is
/// blended with its own opacity. Chunks are composited in parallel.
pub fn composite(width: u32, height: u32, backdrop: Rgba<u8>, layers: &[&Layer]) -> RgbaImage {
    let chunks_per_row = width.div_ceil(CHUNK_SIZE);
    let total_chunks = chunks_per_row as usize * height.div_ceil(CHUNK_SIZE) as usize;

    let chunk_results: Vec<_> = (0..total_chunks)
        .into_par_iter()
        .map(|i| {
            let cx = i as u32 % chunks_per_row;
            let cy = i as u32 / chunks_per_row;
            let base_x = cx * CHUNK_SIZE;
            let base_y = cy * CHUNK_SIZE;
            let cw = CHUNK_SIZE.min(width - base_x);
            let ch = CHUNK_SIZE.min(height - base_y);

            let mut pixels = vec![backdrop; (cw * ch) as usize];
            for layer in layers {
                if layer.opacity <= 0.0 {
                    continue;
                }
                let Some(chunk) = layer.pixels.get_chunk(cx, cy) else {
                    continue;
                };
                for ly in 0..ch {
                    for lx in 0..cw {
                        let idx = (ly * cw + lx) as usize;
                        pixels[idx] = blend_pixel(pixels[idx], *chunk.get_pixel(lx, ly), layer.opacity);
                    }
                }
            }
            (base_x, base_y, cw, ch, pixels)
        })
        .collect();

    let mut result = RgbaImage::new(width, height);
    for (base_x, base_y, cw, ch, pixels) in chunk_results {
        for ly in 0..ch {
            for lx in 0..cw {
                result.put_pixel(base_x + lx, base_y + ly, pixels[(ly * cw + lx) as usize]);
            }
        }
    }
    result
}

/// Straight-alpha "over" of `top` onto `base`, with `top`'s alpha scaled by
/// `opacity`.
pub fn blend_pixel(base: Rgba<u8>, top: Rgba<u8>, opacity: f32) -> Rgba<u8> {
    let opacity = opacity.clamp(0.0, 1.0);

    // Fast path: nothing to blend
    if top[3] == 0 || opacity == 0.0 {
        return base;
    }
    // Fast path: fully opaque top at full opacity, just overwrite
    if opacity >= 1.0 && top[3] == 255 {
        return top;
    }

    let base_a = f32::from(base[3]) / 255.0;
    let top_a = (f32::from(top[3]) / 255.0) * opacity;

    let out_a = top_a + base_a * (1.0 - top_a);
    if out_a == 0.0 {
        return TRANSPARENT_PIXEL;
    }

    let channel = |i: usize| {
        let b = f32::from(base[i]) / 255.0;
        let t = f32::from(top[i]) / 255.0;
        let v = (t * top_a + b * base_a * (1.0 - top_a)) / out_a;
        (v * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        channel(0),
        channel(1),
        channel(2),
        (out_a * 255.0).round().clamp(0.0, 255.0) as u8,
    ])
}
