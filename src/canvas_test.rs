use image::Rgba;

use super::*;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

// =============================================================
// Surface
// =============================================================

#[test]
fn new_surface_is_transparent() {
    let s = Surface::new(100, 70);
    assert_eq!(s.width(), 100);
    assert_eq!(s.height(), 70);
    assert_eq!(s.get_pixel(0, 0), CLEAR);
    assert_eq!(s.get_pixel(99, 69), CLEAR);
}

#[test]
fn put_and_get_across_chunk_boundaries() {
    let mut s = Surface::new(130, 130);
    for &(x, y) in &[(0, 0), (63, 63), (64, 64), (129, 0), (0, 129), (129, 129)] {
        assert!(s.put_pixel(x, y, RED));
        assert_eq!(s.get_pixel(x, y), RED, "pixel ({x}, {y})");
    }
    assert_eq!(s.get_pixel(65, 64), CLEAR);
}

#[test]
fn put_pixel_out_of_bounds_is_rejected_without_mutation() {
    let mut s = Surface::new(10, 10);
    let before = s.to_rgba_image();
    assert!(!s.put_pixel(10, 0, RED));
    assert!(!s.put_pixel(0, 10, RED));
    assert!(!s.put_pixel(u32::MAX, u32::MAX, RED));
    assert_eq!(s.to_rgba_image(), before);
}

#[test]
fn get_pixel_out_of_bounds_reads_transparent() {
    let s = Surface::new_filled(10, 10, RED);
    assert_eq!(s.get_pixel(10, 10), CLEAR);
}

#[test]
fn contains_matches_exclusive_bounds() {
    let s = Surface::new(10, 20);
    assert!(s.contains(0, 0));
    assert!(s.contains(9, 19));
    assert!(!s.contains(10, 0));
    assert!(!s.contains(0, 20));
    assert!(!s.contains(-1, 5));
}

#[test]
fn fill_then_clear() {
    let mut s = Surface::new(100, 100);
    s.fill(WHITE);
    assert_eq!(s.get_pixel(99, 99), WHITE);
    s.clear();
    assert_eq!(s.get_pixel(99, 99), CLEAR);
}

#[test]
fn writes_after_fill_do_not_leak_into_other_chunks() {
    let mut s = Surface::new_filled(128, 128, WHITE);
    s.put_pixel(0, 0, RED);
    // the shared fill tile must have been copied, not written through
    assert_eq!(s.get_pixel(64, 64), WHITE);
    assert_eq!(s.get_pixel(64, 0), WHITE);
    assert_eq!(s.get_pixel(0, 0), RED);
}

#[test]
fn clone_is_independent() {
    let mut a = Surface::new_filled(20, 20, WHITE);
    let b = a.clone();
    a.put_pixel(5, 5, RED);
    assert_eq!(b.get_pixel(5, 5), WHITE);
}

#[test]
fn to_rgba_image_matches_pixels() {
    let mut s = Surface::new(70, 3);
    s.put_pixel(69, 2, RED);
    let img = s.to_rgba_image();
    assert_eq!(img.dimensions(), (70, 3));
    assert_eq!(*img.get_pixel(69, 2), RED);
    assert_eq!(*img.get_pixel(0, 0), CLEAR);
}

// =============================================================
// Blending
// =============================================================

#[test]
fn blend_transparent_top_keeps_base() {
    assert_eq!(blend_pixel(RED, CLEAR, 1.0), RED);
}

#[test]
fn blend_opaque_top_replaces_base() {
    assert_eq!(blend_pixel(WHITE, RED, 1.0), RED);
}

#[test]
fn blend_zero_opacity_keeps_base() {
    assert_eq!(blend_pixel(WHITE, RED, 0.0), WHITE);
}

#[test]
fn blend_half_opacity_mixes() {
    let out = blend_pixel(WHITE, Rgba([0, 0, 0, 255]), 0.5);
    assert_eq!(out[3], 255);
    assert!((126..=129).contains(&out[0]), "got {out:?}");
    assert_eq!(out[0], out[1]);
    assert_eq!(out[1], out[2]);
}

#[test]
fn blend_onto_transparent_keeps_top_color() {
    let out = blend_pixel(CLEAR, Rgba([10, 20, 30, 128]), 1.0);
    assert_eq!(out, Rgba([10, 20, 30, 128]));
}

// =============================================================
// Compositing
// =============================================================

#[test]
fn composite_without_layers_is_backdrop() {
    let img = composite(90, 90, WHITE, &[]);
    assert!(img.pixels().all(|p| *p == WHITE));
}

#[test]
fn composite_stacks_bottom_to_top() {
    let bottom = Layer::new("bottom", 80, 80, WHITE);
    let mut top = Layer::new("top", 80, 80, CLEAR);
    top.pixels.put_pixel(70, 70, RED);

    let img = composite(80, 80, CLEAR, &[&bottom, &top]);
    assert_eq!(*img.get_pixel(70, 70), RED);
    assert_eq!(*img.get_pixel(0, 0), WHITE);

    // reversed order: the opaque layer covers everything
    let img = composite(80, 80, CLEAR, &[&top, &bottom]);
    assert_eq!(*img.get_pixel(70, 70), WHITE);
}

#[test]
fn composite_respects_layer_opacity() {
    let mut top = Layer::new("top", 10, 10, RED);
    top.opacity = 0.0;
    let img = composite(10, 10, WHITE, &[&top]);
    assert_eq!(*img.get_pixel(3, 3), WHITE);

    top.opacity = 1.0;
    let img = composite(10, 10, WHITE, &[&top]);
    assert_eq!(*img.get_pixel(3, 3), RED);
}
