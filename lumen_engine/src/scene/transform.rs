//! Transform: local TRS with cached local and world matrices.
//!
//! The hierarchy links live on `SceneObject`; this type only holds values
//! and dirty state. `SceneGraph` drives validation because computing a
//! world matrix needs the parent's.

use glam::{Mat4, Quat, Vec3};

#[derive(Debug, Clone)]
pub struct Transform {
    position: Vec3,
    rotation: Quat,
    scale: Vec3,
    local_matrix: Mat4,
    world_matrix: Mat4,
    local_dirty: bool,
    world_dirty: bool,
    local_recomputes: u64,
    world_recomputes: u64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }
}

impl Transform {
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            local_matrix: Mat4::IDENTITY,
            world_matrix: Mat4::IDENTITY,
            local_dirty: true,
            world_dirty: true,
            local_recomputes: 0,
            world_recomputes: 0,
        }
    }

    // ===== LOCAL VALUES =====

    pub fn local_position(&self) -> Vec3 {
        self.position
    }

    pub fn local_rotation(&self) -> Quat {
        self.rotation
    }

    pub fn local_scale(&self) -> Vec3 {
        self.scale
    }

    pub(crate) fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.local_dirty = true;
    }

    pub(crate) fn set_rotation(&mut self, rotation: Quat) {
        self.rotation = rotation.normalize();
        self.local_dirty = true;
    }

    pub(crate) fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.local_dirty = true;
    }

    // ===== CACHED MATRICES =====

    /// Cached local matrix; stale while `is_local_dirty()`.
    pub fn local_matrix(&self) -> &Mat4 {
        &self.local_matrix
    }

    /// Cached world matrix; stale while `is_world_dirty()`.
    pub fn world_matrix(&self) -> &Mat4 {
        &self.world_matrix
    }

    pub fn is_local_dirty(&self) -> bool {
        self.local_dirty
    }

    pub fn is_world_dirty(&self) -> bool {
        self.world_dirty
    }

    /// Times the local matrix was rebuilt.
    pub fn local_recompute_count(&self) -> u64 {
        self.local_recomputes
    }

    /// Times the world matrix was rebuilt.
    pub fn world_recompute_count(&self) -> u64 {
        self.world_recomputes
    }

    // ===== DERIVED (from the cached world matrix) =====

    pub fn world_position(&self) -> Vec3 {
        self.world_matrix.col(3).truncate()
    }

    pub fn world_rotation(&self) -> Quat {
        let (_, rotation, _) = self.world_matrix.to_scale_rotation_translation();
        rotation
    }

    /// Local -Z in world space.
    pub fn forward(&self) -> Vec3 {
        (-self.world_matrix.col(2).truncate()).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.world_matrix.col(0).truncate().normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.world_matrix.col(1).truncate().normalize_or_zero()
    }

    // ===== VALIDATION =====

    pub(crate) fn mark_world_dirty(&mut self) {
        self.world_dirty = true;
    }

    fn validate_local(&mut self) {
        if self.local_dirty {
            self.local_matrix = Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position);
            self.local_dirty = false;
            self.local_recomputes += 1;
        }
    }

    /// Rebuild what is dirty given the parent's (already valid) world matrix.
    /// A transform without parent is its own root: world == local.
    pub(crate) fn validate(&mut self, parent_world: Option<&Mat4>) {
        self.validate_local();
        if self.world_dirty {
            self.world_matrix = match parent_world {
                Some(parent) => *parent * self.local_matrix,
                None => self.local_matrix,
            };
            self.world_dirty = false;
            self.world_recomputes += 1;
        }
    }
}

#[cfg(test)]
#[path = "transform_tests.rs"]
mod tests;
