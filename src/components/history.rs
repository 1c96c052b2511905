use image::Rgba;

use crate::canvas::Point;
use crate::components::colors::{self, Brush};
use crate::components::layers::{BACKGROUND_LAYER, LayerStack};
use crate::ops::fill::{self, FillResult};
use crate::ops::shapes;

#[cfg(test)]
#[path = "history_test.rs"]
mod history_test;

// ============================================================================
// ACTION - one replayable mutation
// ============================================================================

/// A recorded mutation: the operation kind plus every argument needed to
/// repeat it against a freshly reset canvas. Drawing actions remember the
/// layer they painted on, since the active layer may change afterwards.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    ClearCanvas,
    SetBackground { color: Rgba<u8> },
    SetBrushColor { color: Rgba<u8> },
    SetBrushWidth { width: u32 },
    DrawLine { layer: String, start: Point, end: Point },
    DrawLines { layer: String, points: Vec<Point>, closed: bool },
    DrawCurve { layer: String, points: Vec<Point> },
    DrawCircle { layer: String, center: Point, radius: u32 },
    DrawRectangle { layer: String, left_top: Point, width: u32, height: u32 },
    DrawTriangle { layer: String, center: Point, side_length: u32, rotation: f32 },
    BucketFill { layer: String, point: Point },
}

/// Effect of applying an [`Action`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    Changed,
    /// Nothing to do (a fill onto its own color).
    NoOp,
    /// The target layer no longer exists.
    MissingLayer,
}

fn format_points(points: &[Point]) -> String {
    let inner: Vec<String> = points.iter().map(Point::to_string).collect();
    format!("[{}]", inner.join(", "))
}

impl Action {
    /// Confirmation sentence reported back to the caller.
    pub fn description(&self) -> String {
        match self {
            Action::ClearCanvas => "Cleared canvas".to_string(),
            Action::SetBackground { color } => {
                format!("Set background color to {}", colors::describe(*color))
            }
            Action::SetBrushColor { color } => {
                format!("Set brush color to {}", colors::describe(*color))
            }
            Action::SetBrushWidth { width } => format!("Set brush width to {width}"),
            Action::DrawLine { start, end, .. } => format!("Drew line from {start} to {end}"),
            Action::DrawLines { points, closed, .. } => format!(
                "Drew a {}closed set of lines through {}",
                if *closed { "" } else { "non-" },
                format_points(points)
            ),
            Action::DrawCurve { points, .. } => {
                format!("Drew a curve through {}", format_points(points))
            }
            Action::DrawCircle { center, radius, .. } => {
                format!("Drew circle at {center} with radius {radius}")
            }
            Action::DrawRectangle { left_top, width, height, .. } => {
                format!("Drew rectangle at {left_top} with dimensions ({width}, {height})")
            }
            Action::DrawTriangle { center, side_length, rotation, .. } => format!(
                "Drew triangle with center {center}, with side length {side_length}, and rotated {rotation} degrees."
            ),
            Action::BucketFill { point, .. } => format!("Bucket filled at {point}"),
        }
    }

    /// The layer a drawing action targets, if any.
    pub fn layer(&self) -> Option<&str> {
        match self {
            Action::DrawLine { layer, .. }
            | Action::DrawLines { layer, .. }
            | Action::DrawCurve { layer, .. }
            | Action::DrawCircle { layer, .. }
            | Action::DrawRectangle { layer, .. }
            | Action::DrawTriangle { layer, .. }
            | Action::BucketFill { layer, .. } => Some(layer),
            _ => None,
        }
    }

    /// Execute against live state. `clear_color` is what the background
    /// layer returns to on [`Action::ClearCanvas`].
    pub fn apply(&self, layers: &mut LayerStack, brush: &mut Brush, clear_color: Rgba<u8>) -> Applied {
        match self {
            Action::ClearCanvas => {
                layers.reset_pixels(clear_color);
                return Applied::Changed;
            }
            Action::SetBackground { color } => {
                return match layers.surface_mut(BACKGROUND_LAYER) {
                    Some(surface) => {
                        surface.fill(*color);
                        Applied::Changed
                    }
                    None => Applied::MissingLayer,
                };
            }
            Action::SetBrushColor { color } => {
                brush.color = *color;
                return Applied::Changed;
            }
            Action::SetBrushWidth { width } => {
                *brush = Brush::new(brush.color, *width);
                return Applied::Changed;
            }
            _ => {}
        }

        let target = match self.layer() {
            Some(name) => layers.surface_mut(name),
            None => None,
        };
        let Some(surface) = target else {
            return Applied::MissingLayer;
        };

        match self {
            Action::DrawLine { start, end, .. } => shapes::draw_line(surface, brush, *start, *end),
            Action::DrawLines { points, closed, .. } => {
                shapes::draw_polyline(surface, brush, points, *closed)
            }
            Action::DrawCurve { points, .. } => shapes::draw_curve(surface, brush, points),
            Action::DrawCircle { center, radius, .. } => {
                shapes::draw_circle(surface, brush.color, *center, *radius)
            }
            Action::DrawRectangle { left_top, width, height, .. } => {
                shapes::draw_rectangle(surface, brush.color, *left_top, *width, *height)
            }
            Action::DrawTriangle { center, side_length, rotation, .. } => {
                shapes::draw_triangle(surface, brush, *center, *side_length, *rotation)
            }
            Action::BucketFill { point, .. } => {
                if point.x < 0 || point.y < 0 {
                    return Applied::NoOp;
                }
                return match fill::flood_fill(surface, point.x as u32, point.y as u32, brush.color) {
                    FillResult::Filled { .. } => Applied::Changed,
                    FillResult::AlreadyFilled | FillResult::Outside => Applied::NoOp,
                };
            }
            _ => {}
        }
        Applied::Changed
    }
}

// ============================================================================
// ACTION LOG - replay-based undo
// ============================================================================

/// Append-only record of applied actions.
///
/// Entries before `baseline` form the construction state and can never be
/// undone. Besides [`pop`](Self::pop), the only other removal is
/// [`forget_layer`](Self::forget_layer) when a layer is removed.
#[derive(Clone, Debug, Default)]
pub struct ActionLog {
    entries: Vec<Action>,
    baseline: usize,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, action: Action) {
        self.entries.push(action);
    }

    /// Freeze everything recorded so far as the floor for [`pop`](Self::pop).
    pub fn seal_baseline(&mut self) {
        self.baseline = self.entries.len();
    }

    /// Remove the most recent undoable entry.
    pub fn pop(&mut self) -> Option<Action> {
        if self.entries.len() > self.baseline {
            self.entries.pop()
        } else {
            None
        }
    }

    /// Drop every entry that painted on `layer`. Baseline entries never
    /// target a layer, so the floor stays put. Returns how many were removed.
    pub fn forget_layer(&mut self, layer: &str) -> usize {
        let before = self.entries.len();
        self.entries.retain(|action| action.layer() != Some(layer));
        before - self.entries.len()
    }

    /// All entries, oldest first, baseline included.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.entries.len() - self.baseline
    }

    pub fn can_undo(&self) -> bool {
        self.undo_count() > 0
    }

    /// Descriptions of undoable entries (most recent first).
    pub fn undo_history(&self) -> Vec<String> {
        self.entries[self.baseline..].iter().rev().map(Action::description).collect()
    }
}
