//! Primitive rasterization onto a single [`Surface`].
//!
//! Pixels are written, not blended: a stroke replaces whatever the layer held
//! at that position. Geometry may extend past the surface edge; anything that
//! falls outside is dropped pixel by pixel, never wrapped or clamped.

use image::Rgba;

use crate::canvas::{Point, Surface};
use crate::components::colors::Brush;

#[cfg(test)]
#[path = "shapes_test.rs"]
mod shapes_test;

/// Samples per interval when interpolating a curve.
pub const CURVE_SUBDIVISIONS: u32 = 4;

/// Vertex angles (degrees) of an unrotated equilateral triangle, apex up.
const TRIANGLE_BASE_ANGLES: [f64; 3] = [-90.0, 30.0, 150.0];

// ============================================================================
// Pixel helpers
// ============================================================================

/// Set one pixel if it lies on the surface.
#[inline]
pub fn plot(surface: &mut Surface, x: i64, y: i64, color: Rgba<u8>) {
    if surface.contains(x, y) {
        surface.put_pixel(x as u32, y as u32, color);
    }
}

/// Paint a `width`×`width` square centred on `(x, y)`, clipped to the surface.
fn stamp(surface: &mut Surface, x: i64, y: i64, brush: &Brush) {
    if brush.width <= 1 {
        plot(surface, x, y, brush.color);
        return;
    }
    let w = i64::from(brush.width);
    let x0 = (x - (w - 1) / 2).max(0);
    let y0 = (y - (w - 1) / 2).max(0);
    let x1 = (x + w / 2).min(i64::from(surface.width()) - 1);
    let y1 = (y + w / 2).min(i64::from(surface.height()) - 1);
    for py in y0..=y1 {
        for px in x0..=x1 {
            surface.put_pixel(px as u32, py as u32, brush.color);
        }
    }
}

// ============================================================================
// Lines
// ============================================================================

/// Straight segment using Bresenham's algorithm, stamped at brush width.
/// Stepping runs in `i64` so endpoints anywhere in `i32` range are safe.
pub fn draw_line(surface: &mut Surface, brush: &Brush, start: Point, end: Point) {
    let (mut x0, mut y0) = (i64::from(start.x), i64::from(start.y));
    let (x1, y1) = (i64::from(end.x), i64::from(end.y));

    let dx = (x1 - x0).abs();
    let dy = (y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx - dy;

    loop {
        stamp(surface, x0, y0, brush);

        if x0 == x1 && y0 == y1 {
            break;
        }

        let e2 = 2 * err;
        if e2 > -dy {
            err -= dy;
            x0 += sx;
        }
        if e2 < dx {
            err += dx;
            y0 += sy;
        }
    }
}

/// Connect `points` in order. `closed` adds the segment from last back to first.
pub fn draw_polyline(surface: &mut Surface, brush: &Brush, points: &[Point], closed: bool) {
    match points {
        [] => {}
        [only] => stamp(surface, i64::from(only.x), i64::from(only.y), brush),
        _ => {
            for pair in points.windows(2) {
                draw_line(surface, brush, pair[0], pair[1]);
            }
            if closed {
                if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
                    draw_line(surface, brush, last, first);
                }
            }
        }
    }
}

// ============================================================================
// Curves
// ============================================================================

/// Catmull-Rom position for parameter `t` in `[0, 1]` between `p1` and `p2`.
fn catmull_rom(p0: Point, p1: Point, p2: Point, p3: Point, t: f64) -> (f64, f64) {
    let t2 = t * t;
    let t3 = t2 * t;
    let axis = |a: i32, b: i32, c: i32, d: i32| {
        let (a, b, c, d) = (f64::from(a), f64::from(b), f64::from(c), f64::from(d));
        0.5 * (2.0 * b
            + (c - a) * t
            + (2.0 * a - 5.0 * b + 4.0 * c - d) * t2
            + (3.0 * b - a - 3.0 * c + d) * t3)
    };
    (axis(p0.x, p1.x, p2.x, p3.x), axis(p0.y, p1.y, p2.y, p3.y))
}

/// Polyline approximating a smooth curve through every control point.
///
/// Each interval contributes [`CURVE_SUBDIVISIONS`] samples; the end points of
/// the stack are duplicated so the spline starts and ends on them. Every
/// control point appears verbatim in the output.
pub fn curve_points(control: &[Point]) -> Vec<Point> {
    if control.len() < 2 {
        return control.to_vec();
    }
    let last = control.len() - 1;
    let mut out = Vec::with_capacity(last * CURVE_SUBDIVISIONS as usize + 1);

    for i in 0..last {
        let p0 = control[i.saturating_sub(1)];
        let p1 = control[i];
        let p2 = control[i + 1];
        let p3 = control[(i + 2).min(last)];

        out.push(p1);
        for step in 1..CURVE_SUBDIVISIONS {
            let t = f64::from(step) / f64::from(CURVE_SUBDIVISIONS);
            let (x, y) = catmull_rom(p0, p1, p2, p3, t);
            out.push(Point::new(x.round() as i32, y.round() as i32));
        }
    }
    out.push(control[last]);
    out
}

pub fn draw_curve(surface: &mut Surface, brush: &Brush, control: &[Point]) {
    draw_polyline(surface, brush, &curve_points(control), false);
}

// ============================================================================
// Outlines
// ============================================================================

/// 1px circle outline (midpoint algorithm).
pub fn draw_circle(surface: &mut Surface, color: Rgba<u8>, center: Point, radius: u32) {
    let (cx, cy) = (i64::from(center.x), i64::from(center.y));
    let r = i64::from(radius);
    if r == 0 {
        plot(surface, cx, cy, color);
        return;
    }

    let mut x = r;
    let mut y = 0;
    let mut err = 1 - r;

    while x >= y {
        for (ox, oy) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
            plot(surface, cx + ox, cy + oy, color);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

/// 1px axis-aligned outline covering `width`×`height` pixels from `left_top`.
/// A zero width or height paints nothing.
pub fn draw_rectangle(surface: &mut Surface, color: Rgba<u8>, left_top: Point, width: u32, height: u32) {
    if width == 0 || height == 0 {
        return;
    }
    let left = i64::from(left_top.x);
    let top = i64::from(left_top.y);
    let right = left + i64::from(width) - 1;
    let bottom = top + i64::from(height) - 1;

    // Only walk the part of each edge that can land on the surface
    let (max_x, max_y) = (i64::from(surface.width()) - 1, i64::from(surface.height()) - 1);
    for x in left.max(0)..=right.min(max_x) {
        plot(surface, x, top, color);
        plot(surface, x, bottom, color);
    }
    for y in top.max(0)..=bottom.min(max_y) {
        plot(surface, left, y, color);
        plot(surface, right, y, color);
    }
}

// ============================================================================
// Triangle
// ============================================================================

/// Vertices of an equilateral triangle with the given side length, rotated
/// clockwise by `rotation` degrees around `center`. Coordinates truncate
/// toward zero.
pub fn triangle_vertices(center: Point, side_length: u32, rotation: f32) -> [Point; 3] {
    let circumradius = f64::from(side_length) / 3f64.sqrt();
    let rotation = f64::from(rotation);
    TRIANGLE_BASE_ANGLES.map(|base| {
        let theta = (base + rotation).to_radians();
        Point::new(
            (f64::from(center.x) + circumradius * theta.cos()) as i32,
            (f64::from(center.y) + circumradius * theta.sin()) as i32,
        )
    })
}

pub fn draw_triangle(surface: &mut Surface, brush: &Brush, center: Point, side_length: u32, rotation: f32) {
    let vertices = triangle_vertices(center, side_length, rotation);
    draw_polyline(surface, brush, &vertices, true);
}
