use super::*;
use crate::components::layers::{BACKGROUND_LAYER, BASE_LAYER};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

fn engine() -> CanvasEngine {
    CanvasEngine::new(EngineSettings { width: 64, height: 48, ..Default::default() }).unwrap()
}

fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

// =============================================================
// Construction
// =============================================================

#[test]
fn fresh_engine_is_white_with_base_active() {
    let e = engine();
    assert_eq!(e.output().dimensions(), (64, 48));
    assert!(e.output().pixels().all(|px| *px == WHITE));
    assert_eq!(e.active_layer(), BASE_LAYER);
    assert_eq!(e.brush(), Brush::default());
}

#[test]
fn fresh_engine_has_nothing_to_undo() {
    let mut e = engine();
    assert!(!e.history().can_undo());
    let err = e.undo().unwrap_err();
    assert!(matches!(err, CanvasError::NothingToUndo));
    assert_eq!(err.to_string(), "There is nothing to undo.");
}

#[test]
fn zero_sized_canvas_is_rejected() {
    let settings = EngineSettings { width: 0, ..Default::default() };
    assert!(matches!(CanvasEngine::new(settings), Err(CanvasError::InvalidArgument(_))));
}

#[test]
fn oversized_canvas_is_rejected() {
    let settings = EngineSettings { width: u32::MAX, height: u32::MAX, ..Default::default() };
    let err = CanvasEngine::new(settings).unwrap_err();
    assert!(matches!(err, CanvasError::InvalidArgument(_)));
    assert!(err.to_string().contains("exceeds"), "{err}");

    let settings = EngineSettings { width: 16_000, height: 16_001, ..Default::default() };
    assert!(matches!(CanvasEngine::new(settings), Err(CanvasError::InvalidArgument(_))));
}

#[test]
fn default_settings_are_500_square() {
    let s = EngineSettings::default();
    assert_eq!((s.width, s.height), (500, 500));
    assert_eq!(s.background, WHITE);
}

// =============================================================
// Drawing
// =============================================================

#[test]
fn draw_line_reports_and_paints() {
    let mut e = engine();
    let msg = e.draw_line(p(0, 0), p(10, 10)).unwrap();
    assert_eq!(msg, "Drew line from (0, 0) to (10, 10)");
    assert_eq!(*e.output().get_pixel(5, 5), BLACK);
    assert_eq!(e.history().undo_count(), 1);
}

#[test]
fn drawing_at_the_far_edge_succeeds() {
    let mut e = engine();
    e.draw_line(p(64, 48), p(64, 0)).unwrap();
    e.draw_circle(p(64, 48), 3).unwrap();
    e.draw_rectangle(p(64, 48), 64, 48).unwrap();
    e.draw_triangle(p(64, 48), 10, 0.0).unwrap();
    e.draw_lines(&[p(0, 48), p(64, 48), p(64, 0)], true).unwrap();
    e.draw_curve(&[p(0, 0), p(32, 48), p(64, 0)]).unwrap();
}

#[test]
fn out_of_bounds_point_is_rejected_without_recording() {
    let mut e = engine();
    let err = e.draw_line(p(0, 0), p(65, 10)).unwrap_err();
    assert!(matches!(err, CanvasError::OutOfBounds { x: 65, y: 10, .. }));
    assert!(err.to_string().contains("(65, 10)"));
    assert!(matches!(e.draw_circle(p(-1, 0), 3), Err(CanvasError::OutOfBounds { .. })));
    assert!(!e.history().can_undo());
}

#[test]
fn degenerate_arguments_are_rejected() {
    let mut e = engine();
    assert!(matches!(e.draw_circle(p(5, 5), 0), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.draw_triangle(p(5, 5), 0, 0.0), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.draw_lines(&[p(0, 0), p(1, 1)], false), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.set_brush_width(0), Err(CanvasError::InvalidArgument(_))));
    assert!(!e.history().can_undo());
}

#[test]
fn sizes_beyond_the_longest_side_are_rejected() {
    let mut e = engine();
    let before = e.output().clone();

    assert!(matches!(e.draw_triangle(p(32, 24), u32::MAX, 0.0), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.draw_triangle(p(32, 24), 65, 0.0), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.draw_circle(p(32, 24), u32::MAX), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.draw_rectangle(p(0, 0), u32::MAX, 10), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.draw_rectangle(p(0, 0), 10, 49), Err(CanvasError::InvalidArgument(_))));
    assert!(matches!(e.set_brush_width(u32::MAX), Err(CanvasError::InvalidArgument(_))));
    assert!(!e.history().can_undo());
    assert_eq!(*e.output(), before);

    e.draw_triangle(p(32, 24), 64, 0.0).unwrap();
    e.draw_circle(p(32, 24), 64).unwrap();
    e.set_brush_width(64).unwrap();
}

#[test]
fn brush_color_and_width_affect_later_strokes_only() {
    let mut e = engine();
    e.draw_line(p(0, 5), p(20, 5)).unwrap();
    e.set_brush_color(RED).unwrap();
    e.set_brush_width(3).unwrap();
    e.draw_line(p(0, 20), p(20, 20)).unwrap();

    assert_eq!(*e.output().get_pixel(10, 5), BLACK);
    assert_eq!(*e.output().get_pixel(10, 20), RED);
    assert_eq!(*e.output().get_pixel(10, 21), RED);
    assert_eq!(*e.output().get_pixel(10, 6), WHITE);
}

#[test]
fn background_targets_background_layer_regardless_of_active() {
    let mut e = engine();
    e.add_layer("top").unwrap();
    e.switch_active_layer("top").unwrap();
    e.set_background(BLUE).unwrap();

    assert_eq!(e.layers().get(BACKGROUND_LAYER).unwrap().pixels.get_pixel(1, 1), BLUE);
    assert_eq!(e.layers().get("top").unwrap().pixels.get_pixel(1, 1), Rgba([0, 0, 0, 0]));
    assert_eq!(*e.output().get_pixel(1, 1), BLUE);
}

#[test]
fn clear_canvas_is_undoable() {
    let mut e = engine();
    e.draw_line(p(0, 0), p(10, 0)).unwrap();
    e.set_background(RED).unwrap();
    e.clear_canvas().unwrap();
    assert!(e.output().pixels().all(|px| *px == WHITE));

    e.undo().unwrap();
    assert_eq!(*e.output().get_pixel(5, 0), BLACK);
    assert_eq!(*e.output().get_pixel(5, 5), RED);
}

// =============================================================
// Bucket fill
// =============================================================

#[test]
fn fill_inside_rectangle_is_region_bounded() {
    let mut e = engine();
    e.draw_rectangle(p(10, 10), 20, 20).unwrap();
    e.set_brush_color(RED).unwrap();
    e.bucket_fill(p(15, 15)).unwrap();

    assert_eq!(*e.output().get_pixel(20, 20), RED);
    assert_eq!(*e.output().get_pixel(10, 10), BLACK);
    assert_eq!(*e.output().get_pixel(5, 5), WHITE);
    assert_eq!(*e.output().get_pixel(40, 40), WHITE);
}

#[test]
fn repeated_fill_is_a_reported_noop() {
    let mut e = engine();
    e.set_brush_color(RED).unwrap();
    assert_eq!(e.bucket_fill(p(1, 1)).unwrap(), "Bucket filled at (1, 1)");
    let count = e.history().undo_count();
    let before = e.output().clone();

    let msg = e.bucket_fill(p(30, 30)).unwrap();
    assert!(msg.contains("already"), "{msg}");
    assert_eq!(e.history().undo_count(), count);
    assert_eq!(*e.output(), before);
}

#[test]
fn fill_requires_an_existing_pixel() {
    let mut e = engine();
    assert!(matches!(e.bucket_fill(p(64, 0)), Err(CanvasError::OutOfBounds { .. })));
    assert!(matches!(e.bucket_fill(p(0, 48)), Err(CanvasError::OutOfBounds { .. })));
    e.bucket_fill(p(63, 47)).unwrap();
}

// =============================================================
// Undo
// =============================================================

#[test]
fn undo_of_single_draw_restores_exact_pixels() {
    let mut e = engine();
    let pristine = e.output().clone();
    e.draw_line(p(3, 3), p(40, 30)).unwrap();
    assert_ne!(*e.output(), pristine);
    e.undo().unwrap();
    assert_eq!(*e.output(), pristine);
}

#[test]
fn n_undos_return_to_baseline_then_fail() {
    let mut e = engine();
    let pristine = e.output().clone();
    e.draw_line(p(0, 0), p(10, 10)).unwrap();
    e.set_brush_color(RED).unwrap();
    e.draw_circle(p(30, 30), 8).unwrap();
    e.bucket_fill(p(30, 30)).unwrap();
    e.set_background(BLUE).unwrap();

    for _ in 0..5 {
        e.undo().unwrap();
    }
    assert_eq!(*e.output(), pristine);
    assert_eq!(e.brush(), Brush::default());
    assert!(matches!(e.undo(), Err(CanvasError::NothingToUndo)));
}

#[test]
fn undo_rolls_back_brush_changes() {
    let mut e = engine();
    e.set_brush_color(RED).unwrap();
    e.set_brush_width(5).unwrap();
    e.undo().unwrap();
    assert_eq!(e.brush(), Brush::new(RED, 1));
    e.undo().unwrap();
    assert_eq!(e.brush(), Brush::default());
}

#[test]
fn undo_message_names_the_undone_action() {
    let mut e = engine();
    e.draw_circle(p(10, 10), 4).unwrap();
    assert_eq!(e.undo().unwrap(), "Performed undo: Drew circle at (10, 10) with radius 4");
}

#[test]
fn structural_operations_are_not_undone() {
    let mut e = engine();
    e.draw_line(p(0, 0), p(10, 10)).unwrap();
    e.add_layer("sketch").unwrap();
    e.switch_active_layer("sketch").unwrap();
    e.set_layer_visibility("sketch", 0.5).unwrap();

    e.undo().unwrap();
    assert!(e.layer_exists("sketch"));
    assert_eq!(e.active_layer(), "sketch");
    assert_eq!(e.layers().get("sketch").unwrap().opacity, 0.5);
    assert!(e.output().pixels().all(|px| *px == WHITE));
}

#[test]
fn replay_paints_each_stroke_on_its_own_layer() {
    let mut e = engine();
    e.add_layer("upper").unwrap();
    e.draw_line(p(0, 1), p(20, 1)).unwrap();
    e.switch_active_layer("upper").unwrap();
    e.draw_line(p(0, 2), p(20, 2)).unwrap();
    e.draw_line(p(0, 3), p(20, 3)).unwrap();

    e.undo().unwrap();
    let base = &e.layers().get(BASE_LAYER).unwrap().pixels;
    let upper = &e.layers().get("upper").unwrap().pixels;
    assert_eq!(base.get_pixel(5, 1), BLACK);
    assert_eq!(base.get_pixel(5, 2), Rgba([0, 0, 0, 0]));
    assert_eq!(upper.get_pixel(5, 2), BLACK);
    assert_eq!(upper.get_pixel(5, 3), Rgba([0, 0, 0, 0]));
}

#[test]
fn removing_a_layer_takes_its_strokes_out_of_history() {
    let mut e = engine();
    e.draw_line(p(0, 1), p(20, 1)).unwrap();
    e.add_layer("tmp").unwrap();
    e.switch_active_layer("tmp").unwrap();
    e.draw_line(p(0, 5), p(20, 5)).unwrap();
    e.remove_layer("tmp").unwrap();

    assert_eq!(e.history().undo_count(), 1);
    assert_eq!(e.active_layer(), BASE_LAYER);

    // a new layer reusing the name starts clean after replay
    e.add_layer("tmp").unwrap();
    e.set_brush_color(RED).unwrap();
    e.undo().unwrap();
    assert_eq!(e.layers().get("tmp").unwrap().pixels.get_pixel(5, 5), Rgba([0, 0, 0, 0]));
    assert_eq!(*e.output().get_pixel(5, 1), BLACK);
}

// =============================================================
// Layers
// =============================================================

#[test]
fn layer_messages() {
    let mut e = engine();
    assert_eq!(e.add_layer("sketch").unwrap(), "Added layer: sketch");
    assert_eq!(e.switch_active_layer("sketch").unwrap(), "Switched active layer to: sketch");
    assert_eq!(
        e.set_layer_visibility("sketch", 0.5).unwrap(),
        "Set visibility of layer 'sketch' to 0.5"
    );
    assert_eq!(e.remove_layer("sketch").unwrap(), "Removed layer: sketch");
}

#[test]
fn layer_failures_leave_state_alone() {
    let mut e = engine();
    e.add_layer("x").unwrap();
    assert!(matches!(e.add_layer("x"), Err(CanvasError::LayerExists(_))));
    assert!(matches!(e.remove_layer("base"), Err(CanvasError::ProtectedLayer(_))));
    assert!(matches!(e.remove_layer("background"), Err(CanvasError::ProtectedLayer(_))));
    assert!(matches!(e.set_layer_visibility("background", 0.0), Err(CanvasError::BackgroundVisibility)));
    let err = e.set_layer_visibility("nonexistent", 0.5).unwrap_err();
    assert!(err.to_string().contains("does not exist"));
    assert!(matches!(
        e.switch_active_layer("background"),
        Err(CanvasError::BackgroundNotActivatable(_))
    ));
    assert_eq!(e.layers().len(), 3);
    assert_eq!(e.active_layer(), BASE_LAYER);
}

#[test]
fn hidden_layer_is_absent_from_output() {
    let mut e = engine();
    e.add_layer("ink").unwrap();
    e.switch_active_layer("ink").unwrap();
    e.draw_line(p(0, 0), p(30, 0)).unwrap();
    assert_eq!(*e.output().get_pixel(10, 0), BLACK);

    e.set_layer_visibility("ink", 0.0).unwrap();
    assert_eq!(*e.output().get_pixel(10, 0), WHITE);

    e.set_layer_visibility("ink", 1.0).unwrap();
    assert_eq!(*e.output().get_pixel(10, 0), BLACK);
}

// =============================================================
// Export
// =============================================================

#[test]
fn export_writes_composite() {
    let dir = tempfile::tempdir().unwrap();
    let mut e = engine();
    e.set_brush_color(RED).unwrap();
    e.draw_line(p(0, 0), p(63, 0)).unwrap();

    let msg = e.export("art", SaveFormat::Png, Some(dir.path())).unwrap();
    assert_eq!(msg, "Drawing saved as art.png");

    let back = image::open(dir.path().join("art.png")).unwrap().to_rgba8();
    assert_eq!(back, *e.output());
}

#[test]
fn export_failure_is_reported() {
    let mut e = engine();
    let err = e.export("", SaveFormat::Png, None).unwrap_err();
    assert!(matches!(err, CanvasError::Export(_)));
    assert!(!err.to_string().is_empty());
    // canvas still usable
    e.draw_line(p(0, 0), p(1, 1)).unwrap();
}
