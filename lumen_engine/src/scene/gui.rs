//! GUI element component data.

use glam::Vec2;

/// Screen-space quad drawn by the presentation overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct GuiElement {
    /// Top-left corner in pixels
    pub position: Vec2,
    /// Size in pixels
    pub size: Vec2,
    pub color: [f32; 4],
    /// Draw order within the overlay; lower first, ties keep traversal order
    pub layer: i32,
}

impl GuiElement {
    pub fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size, color: [1.0; 4], layer: 0 }
    }

    pub fn with_color(mut self, color: [f32; 4]) -> Self {
        self.color = color;
        self
    }

    pub fn with_layer(mut self, layer: i32) -> Self {
        self.layer = layer;
        self
    }
}
