//! Interfaces of the external collaborators the frame loop talks to.
//!
//! None of these are globals: the application owns the implementations and
//! lends them to `FrameLoop::run_frame` through a `Services` context.

use std::sync::Arc;

use glam::{Quat, Vec2, Vec3};
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::graphics_device::{CommandList, Viewport};
use crate::resource::{Material, Mesh};
use crate::scene::SceneGraph;

// ===== ASSETS =====

/// Read-only access to imported meshes and materials.
///
/// A `None` result is not an error: the renderer referencing the id skips
/// the affected draw.
pub trait AssetSource {
    fn load_mesh(&self, id: &str) -> Option<Arc<Mesh>>;
    fn load_material(&self, id: &str) -> Option<Arc<Material>>;
}

/// Asset source backed by two hash maps.
#[derive(Default)]
pub struct MemoryAssets {
    meshes: FxHashMap<String, Arc<Mesh>>,
    materials: FxHashMap<String, Arc<Material>>,
}

impl MemoryAssets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_mesh(&mut self, id: impl Into<String>, mesh: Arc<Mesh>) {
        self.meshes.insert(id.into(), mesh);
    }

    pub fn insert_material(&mut self, id: impl Into<String>, material: Arc<Material>) {
        self.materials.insert(id.into(), material);
    }
}

impl AssetSource for MemoryAssets {
    fn load_mesh(&self, id: &str) -> Option<Arc<Mesh>> {
        self.meshes.get(id).cloned()
    }

    fn load_material(&self, id: &str) -> Option<Arc<Material>> {
        self.materials.get(id).cloned()
    }
}

// ===== INPUT =====

/// Platform key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyCode(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Left,
    Right,
    Middle,
}

/// Polled input state, read by behaviours during update.
pub trait InputState {
    fn is_key_down(&self, key: KeyCode) -> bool;
    fn pointer_position(&self) -> Vec2;
    fn is_pointer_button_down(&self, button: PointerButton) -> bool;
}

/// Input source with nothing pressed.
pub struct NoInput;

impl InputState for NoInput {
    fn is_key_down(&self, _key: KeyCode) -> bool {
        false
    }

    fn pointer_position(&self) -> Vec2 {
        Vec2::ZERO
    }

    fn is_pointer_button_down(&self, _button: PointerButton) -> bool {
        false
    }
}

// ===== AUDIO =====

/// Receives the active camera's placement once per frame.
pub trait AudioListener {
    fn update_listener(&mut self, position: Vec3, orientation: Quat);
}

/// Audio listener that ignores updates.
pub struct NoAudio;

impl AudioListener for NoAudio {
    fn update_listener(&mut self, _position: Vec3, _orientation: Quat) {}
}

// ===== OVERLAY =====

/// Debug/HUD drawing on top of the presented image.
///
/// Called inside the overlay render pass with the presentable image bound
/// as the only color target.
pub trait Overlay {
    fn record(&mut self, cmd: &mut dyn CommandList, viewport: Viewport, scene: &SceneGraph) -> Result<()>;
}

// ===== MESSAGE PUMP =====

/// What the window/message loop wants from the frame loop this iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopMessage {
    Continue,
    Resize { width: u32, height: u32 },
    ReloadPipelines,
    Quit,
}

/// Polled once per iteration of `FrameLoop::run`, between frames.
pub trait MessagePump {
    fn poll(&mut self) -> LoopMessage;
}

// ===== CONTEXT =====

/// Collaborators lent to one frame.
pub struct Services<'a> {
    pub input: &'a dyn InputState,
    pub audio: &'a mut dyn AudioListener,
    pub overlay: Option<&'a mut dyn Overlay>,
}

impl<'a> Services<'a> {
    pub fn new(input: &'a dyn InputState, audio: &'a mut dyn AudioListener) -> Self {
        Self { input, audio, overlay: None }
    }

    pub fn with_overlay(mut self, overlay: &'a mut dyn Overlay) -> Self {
        self.overlay = Some(overlay);
        self
    }
}

#[cfg(test)]
#[path = "services_tests.rs"]
mod tests;
