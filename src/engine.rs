//! The canvas engine: owns the layer stack, the action log and the brush, and
//! recomposites the output after every mutation.
//!
//! Every operation returns `Ok(confirmation)` or `Err(reason)`; a failed call
//! leaves the engine exactly as it was.

use std::path::Path;

use image::{Rgba, RgbaImage};
use tracing::{debug, info};

use crate::canvas::Point;
use crate::components::colors::{self, Brush};
use crate::components::history::{Action, ActionLog, Applied};
use crate::components::layers::LayerStack;
use crate::error::CanvasError;
use crate::io::{self, SaveFormat};

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

// ============================================================================
// Settings
// ============================================================================

/// Construction parameters. `background` and `brush` are also the pristine
/// state undo replays from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EngineSettings {
    pub width: u32,
    pub height: u32,
    pub background: Rgba<u8>,
    pub brush: Brush,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            background: colors::WHITE,
            brush: Brush::default(),
        }
    }
}

// ============================================================================
// Argument checks (shared with the command boundary)
// ============================================================================

/// Largest canvas the engine will allocate, in pixels.
pub const MAX_CANVAS_PIXELS: u64 = 256_000_000;

/// Drawing coordinates may sit on the far edge: `0..=width`, `0..=height`.
pub(crate) fn check_point(p: Point, width: u32, height: u32) -> Result<(), CanvasError> {
    let inside = p.x >= 0 && p.y >= 0 && p.x as u32 <= width && p.y as u32 <= height;
    if inside {
        Ok(())
    } else {
        Err(CanvasError::OutOfBounds { x: i64::from(p.x), y: i64::from(p.y), width, height })
    }
}

pub(crate) fn check_points(points: &[Point], width: u32, height: u32) -> Result<(), CanvasError> {
    if points.len() < 3 {
        return Err(CanvasError::invalid(format!(
            "At least 3 points are required, got {}.",
            points.len()
        )));
    }
    points.iter().try_for_each(|p| check_point(*p, width, height))
}

/// A fill target must be an existing pixel: `0..width`, `0..height`.
pub(crate) fn check_pixel(p: Point, width: u32, height: u32) -> Result<(), CanvasError> {
    let inside = p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height;
    if inside {
        Ok(())
    } else {
        Err(CanvasError::OutOfBounds {
            x: i64::from(p.x),
            y: i64::from(p.y),
            width: width.saturating_sub(1),
            height: height.saturating_sub(1),
        })
    }
}

/// `value` in `1..=max`.
pub(crate) fn check_length(what: &str, value: u32, max: u32) -> Result<(), CanvasError> {
    if value == 0 || value > max {
        return Err(CanvasError::invalid(format!(
            "{what} must be greater than 0 and at most {max}, got {value}."
        )));
    }
    Ok(())
}

pub(crate) fn check_rect_size(w: u32, h: u32, width: u32, height: u32) -> Result<(), CanvasError> {
    if w > width || h > height {
        return Err(CanvasError::invalid(format!(
            "Rectangle size must be within {width}x{height}, got {w}x{h}."
        )));
    }
    Ok(())
}

// ============================================================================
// Engine
// ============================================================================

#[derive(Debug)]
pub struct CanvasEngine {
    settings: EngineSettings,
    layers: LayerStack,
    history: ActionLog,
    brush: Brush,
    output: RgbaImage,
}

impl CanvasEngine {
    /// Build the `background` and `base` layers, then record the baseline
    /// (brush color, brush width, clear) that undo can never go below.
    pub fn new(settings: EngineSettings) -> Result<Self, CanvasError> {
        if settings.width == 0 || settings.height == 0 {
            return Err(CanvasError::invalid(format!(
                "Canvas size must be positive, got {}x{}.",
                settings.width, settings.height
            )));
        }
        let pixels = u64::from(settings.width) * u64::from(settings.height);
        if pixels > MAX_CANVAS_PIXELS {
            return Err(CanvasError::invalid(format!(
                "Canvas size {}x{} exceeds {MAX_CANVAS_PIXELS} pixels.",
                settings.width, settings.height
            )));
        }

        let mut engine = Self {
            settings,
            layers: LayerStack::new(settings.width, settings.height, settings.background),
            history: ActionLog::new(),
            brush: settings.brush,
            output: RgbaImage::new(settings.width, settings.height),
        };
        engine.perform(Action::SetBrushColor { color: settings.brush.color })?;
        engine.perform(Action::SetBrushWidth { width: settings.brush.width })?;
        engine.perform(Action::ClearCanvas)?;
        engine.history.seal_baseline();

        info!(width = settings.width, height = settings.height, "canvas engine ready");
        Ok(engine)
    }

    // ---- accessors ----------------------------------------------------------

    /// The composited image. Recomputed after every mutation and undo.
    pub fn output(&self) -> &RgbaImage {
        &self.output
    }

    pub fn brush(&self) -> Brush {
        self.brush
    }

    pub fn layers(&self) -> &LayerStack {
        &self.layers
    }

    pub fn history(&self) -> &ActionLog {
        &self.history
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn width(&self) -> u32 {
        self.settings.width
    }

    pub fn height(&self) -> u32 {
        self.settings.height
    }

    pub fn active_layer(&self) -> &str {
        self.layers.active_name()
    }

    pub fn layer_exists(&self, name: &str) -> bool {
        self.layers.exists(name)
    }

    // ---- core mutation path -------------------------------------------------

    fn recomposite(&mut self) {
        self.output = self.layers.composite(self.settings.background);
    }

    /// Apply, record if anything changed, recomposite.
    fn perform(&mut self, action: Action) -> Result<String, CanvasError> {
        let message = action.description();
        match action.apply(&mut self.layers, &mut self.brush, self.settings.background) {
            Applied::Changed => {
                debug!(action = %message, entries = self.history.len() + 1, "action recorded");
                self.history.record(action);
            }
            Applied::NoOp => {
                debug!(action = %message, "action changed nothing, not recorded");
            }
            Applied::MissingLayer => {
                let name = action.layer().unwrap_or_default().to_string();
                return Err(CanvasError::LayerNotFound(name));
            }
        }
        self.recomposite();
        Ok(message)
    }

    /// Reset to pristine pixels and brush, then re-run every logged action.
    fn replay(&mut self) {
        self.layers.reset_pixels(self.settings.background);
        self.brush = self.settings.brush;
        for action in self.history.iter() {
            if action.apply(&mut self.layers, &mut self.brush, self.settings.background)
                == Applied::MissingLayer
            {
                debug!(action = %action.description(), "skipped during replay, layer is gone");
            }
        }
        debug!(entries = self.history.len(), "history replayed");
        self.recomposite();
    }

    fn active(&self) -> String {
        self.layers.active_name().to_string()
    }

    fn longest_side(&self) -> u32 {
        self.settings.width.max(self.settings.height)
    }

    // ---- drawing ------------------------------------------------------------

    pub fn draw_line(&mut self, start: Point, end: Point) -> Result<String, CanvasError> {
        check_point(start, self.width(), self.height())?;
        check_point(end, self.width(), self.height())?;
        self.perform(Action::DrawLine { layer: self.active(), start, end })
    }

    pub fn draw_lines(&mut self, points: &[Point], closed: bool) -> Result<String, CanvasError> {
        check_points(points, self.width(), self.height())?;
        self.perform(Action::DrawLines { layer: self.active(), points: points.to_vec(), closed })
    }

    pub fn draw_curve(&mut self, points: &[Point]) -> Result<String, CanvasError> {
        check_points(points, self.width(), self.height())?;
        self.perform(Action::DrawCurve { layer: self.active(), points: points.to_vec() })
    }

    pub fn draw_circle(&mut self, center: Point, radius: u32) -> Result<String, CanvasError> {
        check_point(center, self.width(), self.height())?;
        check_length("Radius", radius, self.longest_side())?;
        self.perform(Action::DrawCircle { layer: self.active(), center, radius })
    }

    pub fn draw_rectangle(&mut self, left_top: Point, width: u32, height: u32) -> Result<String, CanvasError> {
        check_point(left_top, self.width(), self.height())?;
        check_rect_size(width, height, self.width(), self.height())?;
        self.perform(Action::DrawRectangle { layer: self.active(), left_top, width, height })
    }

    pub fn draw_triangle(&mut self, center: Point, side_length: u32, rotation: f32) -> Result<String, CanvasError> {
        check_point(center, self.width(), self.height())?;
        check_length("Side length", side_length, self.longest_side())?;
        if !rotation.is_finite() {
            return Err(CanvasError::invalid("Rotation must be a finite number of degrees."));
        }
        self.perform(Action::DrawTriangle { layer: self.active(), center, side_length, rotation })
    }

    /// Fill the region under `point` on the active layer with the brush
    /// color. Filling a region that already has the brush color succeeds
    /// without touching the history.
    pub fn bucket_fill(&mut self, point: Point) -> Result<String, CanvasError> {
        check_pixel(point, self.width(), self.height())?;
        let before = self.history.len();
        let message = self.perform(Action::BucketFill { layer: self.active(), point })?;
        if self.history.len() == before {
            return Ok(format!("Nothing to fill at {point}: the area already has the brush color"));
        }
        Ok(message)
    }

    // ---- brush and background -----------------------------------------------

    pub fn set_brush_color(&mut self, color: Rgba<u8>) -> Result<String, CanvasError> {
        self.perform(Action::SetBrushColor { color })
    }

    pub fn set_brush_width(&mut self, width: u32) -> Result<String, CanvasError> {
        check_length("Brush width", width, self.longest_side())?;
        self.perform(Action::SetBrushWidth { width })
    }

    /// Fill the `background` layer, whichever layer is active.
    pub fn set_background(&mut self, color: Rgba<u8>) -> Result<String, CanvasError> {
        self.perform(Action::SetBackground { color })
    }

    pub fn clear_canvas(&mut self) -> Result<String, CanvasError> {
        self.perform(Action::ClearCanvas)
    }

    // ---- history ------------------------------------------------------------

    /// Drop the most recent recorded action and rebuild from the baseline.
    pub fn undo(&mut self) -> Result<String, CanvasError> {
        let undone = self.history.pop().ok_or(CanvasError::NothingToUndo)?;
        self.replay();
        info!(undone = %undone.description(), remaining = self.history.undo_count(), "undo");
        Ok(format!("Performed undo: {}", undone.description()))
    }

    // ---- layers (not recorded) ----------------------------------------------

    pub fn add_layer(&mut self, name: &str) -> Result<String, CanvasError> {
        self.layers.add(name)?;
        self.recomposite();
        Ok(format!("Added layer: {name}"))
    }

    /// Remove a layer. Its strokes leave the history with it.
    pub fn remove_layer(&mut self, name: &str) -> Result<String, CanvasError> {
        self.layers.remove(name)?;
        let forgotten = self.history.forget_layer(name);
        if forgotten > 0 {
            debug!(layer = name, forgotten, "history entries dropped with layer");
        }
        self.recomposite();
        Ok(format!("Removed layer: {name}"))
    }

    pub fn set_layer_visibility(&mut self, name: &str, visibility: f32) -> Result<String, CanvasError> {
        self.layers.set_visibility(name, visibility)?;
        self.recomposite();
        Ok(format!("Set visibility of layer '{name}' to {visibility}"))
    }

    pub fn switch_active_layer(&mut self, name: &str) -> Result<String, CanvasError> {
        self.layers.switch_active(name)?;
        Ok(format!("Switched active layer to: {name}"))
    }

    // ---- export -------------------------------------------------------------

    /// Encode the composited output to `<dir>/<filename>.<ext>`.
    pub fn export(&self, filename: &str, format: SaveFormat, dir: Option<&Path>) -> Result<String, CanvasError> {
        let path = io::export_image(&self.output, filename, format, dir)?;
        info!(path = %path.display(), %format, "canvas exported");
        Ok(format!("Drawing saved as {}.{}", filename.trim(), format.extension()))
    }
}
