/// RenderView: a camera resolved for one frame.
///
/// Ephemeral: rebuilt by the render queue builder every frame. Holds
/// everything the passes need (matrices, frustum, viewport) so nothing
/// downstream touches the scene graph.

use glam::{Mat4, Vec3};
use crate::graphics_device::Viewport;
use super::camera::Projection;
use super::frustum::Frustum;

#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    world_matrix: Mat4,
    view_matrix: Mat4,
    projection_matrix: Mat4,
    projection: Projection,
    aspect: f32,
    frustum: Frustum,
    viewport: Viewport,
    clear_color: [f32; 4],
}

impl RenderView {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        world_matrix: Mat4,
        view_matrix: Mat4,
        projection_matrix: Mat4,
        projection: Projection,
        aspect: f32,
        frustum: Frustum,
        viewport: Viewport,
        clear_color: [f32; 4],
    ) -> Self {
        Self {
            world_matrix,
            view_matrix,
            projection_matrix,
            projection,
            aspect,
            frustum,
            viewport,
            clear_color,
        }
    }

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn near(&self) -> f32 {
        self.projection.near()
    }

    pub fn far(&self) -> f32 {
        self.projection.far()
    }

    pub fn position(&self) -> Vec3 {
        self.world_matrix.col(3).truncate()
    }

    /// Camera looks down its local -Z.
    pub fn forward(&self) -> Vec3 {
        (-self.world_matrix.col(2).truncate()).normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.world_matrix.col(1).truncate().normalize_or_zero()
    }

    /// World-space corners of the slice of this view between `near` and `far`.
    pub fn slice_corners(&self, near: f32, far: f32) -> [Vec3; 8] {
        let projection = self.projection.with_depth_range(near, far).matrix(self.aspect);
        Frustum::corners(&(projection * self.view_matrix))
    }
}

#[cfg(test)]
#[path = "render_view_tests.rs"]
mod tests;
