/// Camera component: projection parameters attached to a scene object.
///
/// The object's world matrix places the camera. Each frame the render queue
/// builder resolves every active camera into a `RenderView`.

use glam::Mat4;
use crate::graphics_device::Viewport;
use super::frustum::Frustum;
use super::render_view::RenderView;

/// Projection model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Projection {
    /// Vertical field of view in radians
    Perspective { fov_y: f32, near: f32, far: f32 },
    /// Vertical extent in world units
    Orthographic { height: f32, near: f32, far: f32 },
}

impl Projection {
    pub fn near(&self) -> f32 {
        match *self {
            Projection::Perspective { near, .. } | Projection::Orthographic { near, .. } => near,
        }
    }

    pub fn far(&self) -> f32 {
        match *self {
            Projection::Perspective { far, .. } | Projection::Orthographic { far, .. } => far,
        }
    }

    /// Same projection restricted to `[near, far]`.
    pub fn with_depth_range(&self, near: f32, far: f32) -> Projection {
        match *self {
            Projection::Perspective { fov_y, .. } => Projection::Perspective { fov_y, near, far },
            Projection::Orthographic { height, .. } => Projection::Orthographic { height, near, far },
        }
    }

    /// Right-handed projection matrix with [0, 1] depth.
    pub fn matrix(&self, aspect: f32) -> Mat4 {
        match *self {
            Projection::Perspective { fov_y, near, far } => Mat4::perspective_rh(fov_y, aspect, near, far),
            Projection::Orthographic { height, near, far } => {
                let half_h = height * 0.5;
                let half_w = half_h * aspect;
                Mat4::orthographic_rh(-half_w, half_w, -half_h, half_h, near, far)
            }
        }
    }
}

/// Camera component data.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    projection: Projection,
    priority: i32,
    clear_color: [f32; 4],
}

impl Camera {
    pub fn perspective(fov_y: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Perspective { fov_y, near, far },
            priority: 0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    pub fn orthographic(height: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Projection::Orthographic { height, near, far },
            priority: 0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }

    /// Higher priority wins when several cameras are active.
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    // ===== GETTERS =====

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    // ===== SETTERS =====

    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = projection;
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    /// Snapshot this camera placed at `world` for a `width` x `height` target.
    pub fn resolve(&self, world: &Mat4, width: u32, height: u32) -> RenderView {
        let aspect = if height == 0 { 1.0 } else { width as f32 / height as f32 };
        let view = world.inverse();
        let projection = self.projection.matrix(aspect);
        let frustum = Frustum::from_view_projection(&(projection * view));
        RenderView::new(
            *world,
            view,
            projection,
            self.projection,
            aspect,
            frustum,
            Viewport::full(width, height),
            self.clear_color,
        )
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
