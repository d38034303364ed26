/// Camera culling strategies.
///
/// A CameraCuller decides which drawables of the frame's queues are
/// visible from a resolved view. The G-buffer and forward passes ask it
/// once per frame before recording.

use crate::camera::RenderView;
use super::render_queue::Drawable;

/// Strategy for determining visible drawables from a view.
///
/// `&mut self` allows stateful implementations (e.g. caching)
/// to maintain state across frames.
pub trait CameraCuller: Send {
    /// Set `visible[i]` for every drawable `i` the view can see.
    /// `visible` is resized to `drawables.len()`.
    fn cull(&mut self, view: &RenderView, drawables: &[Drawable], visible: &mut Vec<bool>);
}

/// Brute-force culler: everything is visible.
///
/// Baseline for comparison, and for views whose frustum is meaningless
/// (debug captures).
#[derive(Debug, Default)]
pub struct BruteForceCuller;

impl BruteForceCuller {
    pub fn new() -> Self {
        Self
    }
}

impl CameraCuller for BruteForceCuller {
    fn cull(&mut self, _view: &RenderView, drawables: &[Drawable], visible: &mut Vec<bool>) {
        visible.clear();
        visible.resize(drawables.len(), true);
    }
}

/// Frustum culler: tests world-space bounds against the view frustum.
#[derive(Debug, Default)]
pub struct FrustumCuller;

impl FrustumCuller {
    pub fn new() -> Self {
        Self
    }
}

impl CameraCuller for FrustumCuller {
    fn cull(&mut self, view: &RenderView, drawables: &[Drawable], visible: &mut Vec<bool>) {
        let frustum = view.frustum();
        visible.clear();
        visible.extend(drawables.iter().map(|d| frustum.intersects_aabb(&d.world_bounds)));
    }
}
