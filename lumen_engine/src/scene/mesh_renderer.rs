//! Renderer component data.

use std::sync::Arc;
use crate::resource::{Material, Mesh};
use crate::services::AssetSource;

/// Flavour of drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererKind {
    /// Static mesh
    Mesh,
    /// Skinned mesh; its animation clock advances during update
    RiggedMesh,
    /// Scenery; casts no shadow unless asked to
    Prop,
}

/// Mesh plus one material slot per submesh.
///
/// Missing resources are `None`; the render queue skips the affected
/// submeshes and logs at debug level.
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    kind: RendererKind,
    mesh: Option<Arc<Mesh>>,
    materials: Vec<Option<Arc<Material>>>,
    cast_shadows: bool,
    animation_time: f32,
    animation_speed: f32,
}

impl MeshRenderer {
    pub fn new(kind: RendererKind, mesh: Option<Arc<Mesh>>, materials: Vec<Option<Arc<Material>>>) -> Self {
        Self {
            kind,
            mesh,
            materials,
            cast_shadows: kind != RendererKind::Prop,
            animation_time: 0.0,
            animation_speed: 1.0,
        }
    }

    /// Resolve ids through the asset source.
    pub fn from_assets(kind: RendererKind, assets: &dyn AssetSource, mesh: &str, materials: &[&str]) -> Self {
        Self::new(
            kind,
            assets.load_mesh(mesh),
            materials.iter().map(|id| assets.load_material(id)).collect(),
        )
    }

    pub fn with_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    pub fn with_animation_speed(mut self, speed: f32) -> Self {
        self.animation_speed = speed;
        self
    }

    pub fn kind(&self) -> RendererKind {
        self.kind
    }

    pub fn mesh(&self) -> Option<&Arc<Mesh>> {
        self.mesh.as_ref()
    }

    pub fn set_mesh(&mut self, mesh: Option<Arc<Mesh>>) {
        self.mesh = mesh;
    }

    pub fn materials(&self) -> &[Option<Arc<Material>>] {
        &self.materials
    }

    /// Material of submesh `index`, if present.
    pub fn material(&self, index: usize) -> Option<&Arc<Material>> {
        self.materials.get(index).and_then(Option::as_ref)
    }

    pub fn set_material(&mut self, index: usize, material: Option<Arc<Material>>) {
        if index >= self.materials.len() {
            self.materials.resize(index + 1, None);
        }
        self.materials[index] = material;
    }

    pub fn casts_shadows(&self) -> bool {
        self.cast_shadows
    }

    pub fn animation_time(&self) -> f32 {
        self.animation_time
    }

    /// Per-frame update step. Only rigged meshes animate.
    pub(crate) fn advance(&mut self, delta: f32) {
        if self.kind == RendererKind::RiggedMesh {
            self.animation_time += delta * self.animation_speed;
        }
    }
}

#[cfg(test)]
#[path = "mesh_renderer_tests.rs"]
mod tests;
