use std::collections::HashMap;

use image::{Rgba, RgbaImage};
use tracing::info;

use crate::canvas::{self, Layer, Surface};
use crate::components::colors;
use crate::error::CanvasError;

#[cfg(test)]
#[path = "layers_test.rs"]
mod layers_test;

/// Bottom layer. Always composited, never removed, never active.
pub const BACKGROUND_LAYER: &str = "background";
/// Default drawing target. Never removed.
pub const BASE_LAYER: &str = "base";

// ============================================================================
// LayerStack
// ============================================================================

/// Ordered, uniquely named layers plus the active-layer cursor.
///
/// `order` is paint order, bottom first. `active` always names an existing
/// layer other than [`BACKGROUND_LAYER`].
#[derive(Clone, Debug)]
pub struct LayerStack {
    width: u32,
    height: u32,
    order: Vec<String>,
    layers: HashMap<String, Layer>,
    active: String,
}

impl LayerStack {
    /// Build the two privileged layers: `background` filled with
    /// `background`, `base` transparent and active.
    pub fn new(width: u32, height: u32, background: Rgba<u8>) -> Self {
        let mut stack = Self {
            width,
            height,
            order: Vec::new(),
            layers: HashMap::new(),
            active: BASE_LAYER.to_string(),
        };
        stack.insert(Layer::new(BACKGROUND_LAYER, width, height, background));
        stack.insert(Layer::new(BASE_LAYER, width, height, colors::TRANSPARENT));
        stack
    }

    fn insert(&mut self, layer: Layer) {
        self.order.push(layer.name.clone());
        self.layers.insert(layer.name.clone(), layer);
    }

    fn is_protected(name: &str) -> bool {
        name == BACKGROUND_LAYER || name == BASE_LAYER
    }

    // ---- lifecycle ----------------------------------------------------------

    /// Append a transparent, fully visible layer on top of the stack.
    pub fn add(&mut self, name: &str) -> Result<(), CanvasError> {
        if name.trim().is_empty() {
            return Err(CanvasError::invalid("Layer name must not be empty."));
        }
        if self.exists(name) {
            return Err(CanvasError::LayerExists(name.to_string()));
        }
        self.insert(Layer::new(name, self.width, self.height, colors::TRANSPARENT));
        info!(layer = name, count = self.order.len(), "layer added");
        Ok(())
    }

    /// Drop a layer and its pixels. Removing the active layer makes `base`
    /// active again.
    pub fn remove(&mut self, name: &str) -> Result<(), CanvasError> {
        if Self::is_protected(name) {
            return Err(CanvasError::ProtectedLayer(name.to_string()));
        }
        if self.layers.remove(name).is_none() {
            return Err(CanvasError::LayerNotFound(name.to_string()));
        }
        self.order.retain(|n| n != name);
        if self.active == name {
            self.active = BASE_LAYER.to_string();
        }
        info!(layer = name, active = %self.active, "layer removed");
        Ok(())
    }

    /// `visibility` in `[0, 1]` becomes the layer opacity; zero hides it.
    pub fn set_visibility(&mut self, name: &str, visibility: f32) -> Result<(), CanvasError> {
        if name == BACKGROUND_LAYER {
            return Err(CanvasError::BackgroundVisibility);
        }
        if !visibility.is_finite() || !(0.0..=1.0).contains(&visibility) {
            return Err(CanvasError::invalid(format!(
                "Visibility must be between 0 and 1, got {visibility}."
            )));
        }
        let layer = self
            .layers
            .get_mut(name)
            .ok_or_else(|| CanvasError::LayerNotFound(name.to_string()))?;
        layer.visible = visibility > 0.0;
        layer.opacity = visibility;
        info!(layer = name, visibility, "layer visibility changed");
        Ok(())
    }

    pub fn switch_active(&mut self, name: &str) -> Result<(), CanvasError> {
        if !self.exists(name) {
            return Err(CanvasError::LayerNotFound(name.to_string()));
        }
        if name == BACKGROUND_LAYER {
            return Err(CanvasError::BackgroundNotActivatable(name.to_string()));
        }
        self.active = name.to_string();
        info!(layer = name, "active layer switched");
        Ok(())
    }

    // ---- queries ------------------------------------------------------------

    pub fn exists(&self, name: &str) -> bool {
        self.layers.contains_key(name)
    }

    pub fn active_name(&self) -> &str {
        &self.active
    }

    pub fn get(&self, name: &str) -> Option<&Layer> {
        self.layers.get(name)
    }

    /// Layer names bottom to top.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    // ---- pixel access -------------------------------------------------------

    pub fn active_surface_mut(&mut self) -> Option<&mut Surface> {
        self.layers.get_mut(&self.active).map(|l| &mut l.pixels)
    }

    pub fn surface_mut(&mut self, name: &str) -> Option<&mut Surface> {
        self.layers.get_mut(name).map(|l| &mut l.pixels)
    }

    /// Put every layer back to its pristine pixels: the background filled
    /// with `background`, everything else transparent. Visibility and the
    /// active layer are left alone.
    pub fn reset_pixels(&mut self, background: Rgba<u8>) {
        for layer in self.layers.values_mut() {
            if layer.name == BACKGROUND_LAYER {
                layer.pixels.fill(background);
            } else {
                layer.pixels.clear();
            }
        }
    }

    // ---- compositing --------------------------------------------------------

    /// Flatten the stack over `backdrop`. The background layer always takes
    /// part (its flags cannot change); other layers only while visible.
    pub fn composite(&self, backdrop: Rgba<u8>) -> RgbaImage {
        let shown: Vec<&Layer> = self
            .order
            .iter()
            .filter_map(|name| self.layers.get(name))
            .filter(|layer| layer.name == BACKGROUND_LAYER || layer.visible)
            .collect();
        canvas::composite(self.width, self.height, backdrop, &shown)
    }
}
