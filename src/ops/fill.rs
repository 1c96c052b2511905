use image::Rgba;

use crate::canvas::Surface;

#[cfg(test)]
#[path = "fill_test.rs"]
mod fill_test;

/// What a bucket fill did to the surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FillResult {
    /// `pixels` were recolored.
    Filled { pixels: usize },
    /// The start pixel already had the fill color; nothing changed.
    AlreadyFilled,
    /// The start point is not a pixel of the surface.
    Outside,
}

/// Replace the 4-connected region of pixels exactly equal to the color at
/// `(x, y)` with `color`.
///
/// Iterative: an explicit stack of packed flat indices with a visited mask,
/// and neighbours are marked when pushed so no pixel enters the stack twice.
pub fn flood_fill(surface: &mut Surface, x: u32, y: u32, color: Rgba<u8>) -> FillResult {
    if !surface.contains(i64::from(x), i64::from(y)) {
        return FillResult::Outside;
    }
    let (w, h) = (surface.width(), surface.height());

    let target = surface.get_pixel(x, y);
    if target == color {
        return FillResult::AlreadyFilled;
    }

    let wu = w as usize;
    let mut visited = vec![false; wu * h as usize];
    let mut stack: Vec<usize> = Vec::with_capacity(4096);
    let mut filled = 0usize;

    let seed = y as usize * wu + x as usize;
    visited[seed] = true;
    stack.push(seed);

    while let Some(idx) = stack.pop() {
        let px = (idx % wu) as u32;
        let py = (idx / wu) as u32;
        surface.put_pixel(px, py, color);
        filled += 1;

        let mut visit = |nx: u32, ny: u32, ni: usize| {
            if !visited[ni] && surface.get_pixel(nx, ny) == target {
                visited[ni] = true;
                stack.push(ni);
            }
        };

        // Left
        if px > 0 {
            visit(px - 1, py, idx - 1);
        }
        // Right
        if px + 1 < w {
            visit(px + 1, py, idx + 1);
        }
        // Up
        if py > 0 {
            visit(px, py - 1, idx - wu);
        }
        // Down
        if py + 1 < h {
            visit(px, py + 1, idx + wu);
        }
    }

    FillResult::Filled { pixels: filled }
}
