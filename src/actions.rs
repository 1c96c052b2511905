//! Agent-facing command boundary.
//!
//! A command arrives as `{"action": "<name>", "data": {...}}`. It is parsed,
//! checked against the permission switches, range-validated against the
//! canvas size and only then handed to the engine. Every path ends in an
//! [`Outcome`] with a non-empty message.

use image::Rgba;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::canvas::Point;
use crate::components::colors;
use crate::config::Config;
use crate::engine::{
    CanvasEngine, check_length, check_pixel, check_point, check_points, check_rect_size,
};
use crate::error::CanvasError;
use crate::io::{ExportError, SaveFormat};

#[cfg(test)]
#[path = "actions_test.rs"]
mod actions_test;

/// Upper bound (exclusive) for triangle rotation in degrees. An equilateral
/// triangle repeats every 120°.
pub const MAX_ROTATION: f32 = 120.0;

// ============================================================================
// Commands
// ============================================================================

/// RGB(A) color given component by component. Alpha defaults to opaque.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub a: Option<u8>,
}

impl CustomColor {
    pub fn to_rgba(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, self.a.unwrap_or(255)])
    }

    /// Same color with alpha forced to opaque.
    pub fn to_opaque(self) -> Rgba<u8> {
        Rgba([self.r, self.g, self.b, 255])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum Command {
    DrawLine { start: Point, end: Point },
    DrawLines { points: Vec<Point>, closed: bool },
    DrawCurve { points: Vec<Point> },
    DrawCircle { center: Point, radius: u32 },
    DrawTriangle { center: Point, side_length: u32, rotation: f32 },
    DrawRectangle { left: i32, top: i32, width: u32, height: u32 },
    SetBrushColor { color: String },
    SetCustomBrushColor { color: CustomColor },
    SetBrushWidth { width: u32 },
    SetBackgroundColor { color: String },
    SetCustomBackgroundColor { color: CustomColor },
    BucketFill { x: i32, y: i32 },
    ClearCanvas,
    Undo,
    Export {
        filename: String,
        #[serde(default)]
        filetype: Option<SaveFormat>,
    },
    AddLayer { name: String },
    RemoveLayer { name: String },
    SetLayerVisibility { name: String, visibility: f32 },
    SwitchActiveLayer { name: String },
}

fn check_named_color(name: &str) -> Result<Rgba<u8>, CanvasError> {
    colors::named_color(name).ok_or_else(|| CanvasError::UnknownColor(name.to_string()))
}

fn check_layer_name(name: &str) -> Result<(), CanvasError> {
    if name.trim().is_empty() {
        return Err(CanvasError::invalid("Layer name must not be empty."));
    }
    Ok(())
}

impl Command {
    /// Parse one JSON command. Malformed JSON, unknown actions and missing or
    /// mistyped fields all become [`CanvasError::InvalidCommand`].
    pub fn parse(json: &str) -> Result<Self, CanvasError> {
        serde_json::from_str(json).map_err(|e| CanvasError::InvalidCommand(e.to_string()))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Command::DrawLine { .. } => "draw_line",
            Command::DrawLines { .. } => "draw_lines",
            Command::DrawCurve { .. } => "draw_curve",
            Command::DrawCircle { .. } => "draw_circle",
            Command::DrawTriangle { .. } => "draw_triangle",
            Command::DrawRectangle { .. } => "draw_rectangle",
            Command::SetBrushColor { .. } => "set_brush_color",
            Command::SetCustomBrushColor { .. } => "set_custom_brush_color",
            Command::SetBrushWidth { .. } => "set_brush_width",
            Command::SetBackgroundColor { .. } => "set_background_color",
            Command::SetCustomBackgroundColor { .. } => "set_custom_background_color",
            Command::BucketFill { .. } => "bucket_fill",
            Command::ClearCanvas => "clear_canvas",
            Command::Undo => "undo",
            Command::Export { .. } => "export",
            Command::AddLayer { .. } => "add_layer",
            Command::RemoveLayer { .. } => "remove_layer",
            Command::SetLayerVisibility { .. } => "set_layer_visibility",
            Command::SwitchActiveLayer { .. } => "switch_active_layer",
        }
    }

    /// Permission key consulted before the command runs.
    pub fn permission(&self) -> &'static str {
        match self {
            Command::DrawLine { .. } => "draw.line",
            Command::DrawLines { .. } => "draw.line_sequence",
            Command::DrawCurve { .. } => "draw.curve",
            Command::DrawCircle { .. } => "draw.circle",
            Command::DrawTriangle { .. } => "draw.triangle",
            Command::DrawRectangle { .. } => "draw.rectangle",
            Command::SetBrushColor { .. }
            | Command::SetCustomBrushColor { .. }
            | Command::SetBrushWidth { .. } => "colour",
            Command::SetBackgroundColor { .. }
            | Command::SetCustomBackgroundColor { .. }
            | Command::ClearCanvas
            | Command::AddLayer { .. }
            | Command::RemoveLayer { .. }
            | Command::SetLayerVisibility { .. }
            | Command::SwitchActiveLayer { .. } => "layers",
            Command::BucketFill { .. } => "misc.bucket",
            Command::Undo => "misc.undo",
            Command::Export { .. } => "misc.export",
        }
    }

    /// Range checks for a `width`×`height` canvas. Coordinates are inclusive
    /// of the far edge except for bucket fill, which needs a real pixel.
    pub fn validate(&self, width: u32, height: u32) -> Result<(), CanvasError> {
        let longest = width.max(height);
        match self {
            Command::DrawLine { start, end } => {
                check_point(*start, width, height)?;
                check_point(*end, width, height)
            }
            Command::DrawLines { points, .. } | Command::DrawCurve { points } => {
                check_points(points, width, height)
            }
            Command::DrawCircle { center, radius } => {
                check_point(*center, width, height)?;
                check_length("Radius", *radius, longest)
            }
            Command::DrawTriangle { center, side_length, rotation } => {
                check_point(*center, width, height)?;
                check_length("Side length", *side_length, longest)?;
                if !rotation.is_finite() || *rotation < 0.0 || *rotation >= MAX_ROTATION {
                    return Err(CanvasError::invalid(format!(
                        "Rotation must be at least 0 and less than {MAX_ROTATION}, got {rotation}."
                    )));
                }
                Ok(())
            }
            Command::DrawRectangle { left, top, width: w, height: h } => {
                check_point(Point::new(*left, *top), width, height)?;
                check_rect_size(*w, *h, width, height)
            }
            Command::SetBrushColor { color } | Command::SetBackgroundColor { color } => {
                check_named_color(color).map(|_| ())
            }
            Command::SetBrushWidth { width: w } => check_length("Brush width", *w, longest),
            Command::BucketFill { x, y } => check_pixel(Point::new(*x, *y), width, height),
            Command::SetLayerVisibility { name, visibility } => {
                check_layer_name(name)?;
                if !visibility.is_finite() || !(0.0..=1.0).contains(visibility) {
                    return Err(CanvasError::invalid(format!(
                        "Visibility must be between 0 and 1, got {visibility}."
                    )));
                }
                Ok(())
            }
            Command::AddLayer { name } | Command::RemoveLayer { name } | Command::SwitchActiveLayer { name } => {
                check_layer_name(name)
            }
            Command::SetCustomBrushColor { .. }
            | Command::SetCustomBackgroundColor { .. }
            | Command::ClearCanvas
            | Command::Undo
            | Command::Export { .. } => Ok(()),
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// `(success, message)` pair returned to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    pub success: bool,
    pub message: String,
}

impl Outcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self::new(true, message.into())
    }

    pub fn err(reason: impl Into<String>) -> Self {
        Self::new(false, reason.into())
    }

    fn new(success: bool, message: String) -> Self {
        let message = if message.trim().is_empty() {
            if success { "Done.".to_string() } else { "Failed.".to_string() }
        } else {
            message
        };
        Self { success, message }
    }
}

impl From<Result<String, CanvasError>> for Outcome {
    fn from(result: Result<String, CanvasError>) -> Self {
        match result {
            Ok(message) => Outcome::ok(message),
            Err(e) => Outcome::err(e.to_string()),
        }
    }
}

// ============================================================================
// Dispatch
// ============================================================================

/// Permission gate, validation, then the engine call.
pub fn dispatch(engine: &mut CanvasEngine, config: &Config, command: &Command) -> Outcome {
    let result = run(engine, config, command);
    match &result {
        Ok(message) => debug!(action = command.name(), %message, "command succeeded"),
        Err(reason) => warn!(action = command.name(), %reason, "command rejected"),
    }
    Outcome::from(result)
}

/// Parse a raw JSON command and dispatch it.
pub fn dispatch_json(engine: &mut CanvasEngine, config: &Config, json: &str) -> Outcome {
    match Command::parse(json) {
        Ok(command) => dispatch(engine, config, &command),
        Err(reason) => {
            warn!(%reason, "received invalid command");
            Outcome::err(reason.to_string())
        }
    }
}

fn run(engine: &mut CanvasEngine, config: &Config, command: &Command) -> Result<String, CanvasError> {
    let key = command.permission();
    if !config.permissions.allows(key) {
        return Err(CanvasError::PermissionDenied(key.to_string()));
    }
    command.validate(engine.width(), engine.height())?;

    match command {
        Command::DrawLine { start, end } => engine.draw_line(*start, *end),
        Command::DrawLines { points, closed } => engine.draw_lines(points, *closed),
        Command::DrawCurve { points } => engine.draw_curve(points),
        Command::DrawCircle { center, radius } => engine.draw_circle(*center, *radius),
        Command::DrawTriangle { center, side_length, rotation } => {
            engine.draw_triangle(*center, *side_length, *rotation)
        }
        Command::DrawRectangle { left, top, width, height } => {
            engine.draw_rectangle(Point::new(*left, *top), *width, *height)
        }
        Command::SetBrushColor { color } => engine.set_brush_color(check_named_color(color)?),
        Command::SetCustomBrushColor { color } => engine.set_brush_color(color.to_rgba()),
        Command::SetBrushWidth { width } => engine.set_brush_width(*width),
        Command::SetBackgroundColor { color } => engine.set_background(check_named_color(color)?),
        Command::SetCustomBackgroundColor { color } => engine.set_background(color.to_opaque()),
        Command::BucketFill { x, y } => engine.bucket_fill(Point::new(*x, *y)),
        Command::ClearCanvas => engine.clear_canvas(),
        Command::Undo => engine.undo(),
        Command::Export { filename, filetype } => {
            let format = filetype.unwrap_or_default();
            if !config.allows_format(format) {
                return Err(ExportError::FormatNotAllowed(format).into());
            }
            engine.export(filename, format, config.settings.export_dir.as_deref())
        }
        Command::AddLayer { name } => engine.add_layer(name),
        Command::RemoveLayer { name } => engine.remove_layer(name),
        Command::SetLayerVisibility { name, visibility } => engine.set_layer_visibility(name, *visibility),
        Command::SwitchActiveLayer { name } => engine.switch_active_layer(name),
    }
}
