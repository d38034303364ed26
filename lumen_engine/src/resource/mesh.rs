//! Resource-level mesh type.
//!
//! A `Mesh` is immutable once built: shared vertex/index buffers, one or
//! more submeshes (each drawn with its own material slot) and local bounds.

use std::sync::Arc;
use crate::error::{Error, Result};
use crate::graphics_device::{Buffer, IndexType};
use crate::resource::Aabb;

/// A drawable index range within the shared buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubMesh {
    /// First index in the index buffer
    pub first_index: u32,
    /// Number of indices
    pub index_count: u32,
    /// Value added to each index before vertex fetch
    pub vertex_offset: i32,
}

/// Descriptor for creating a mesh
pub struct MeshDesc {
    pub name: String,
    pub vertex_buffer: Arc<dyn Buffer>,
    pub index_buffer: Arc<dyn Buffer>,
    pub index_type: IndexType,
    pub submeshes: Vec<SubMesh>,
    /// Local-space bounds
    pub bounds: Aabb,
}

/// Immutable mesh shared between renderers.
pub struct Mesh {
    name: String,
    vertex_buffer: Arc<dyn Buffer>,
    index_buffer: Arc<dyn Buffer>,
    index_type: IndexType,
    submeshes: Vec<SubMesh>,
    bounds: Aabb,
}

impl Mesh {
    pub fn new(desc: MeshDesc) -> Result<Self> {
        if desc.submeshes.is_empty() {
            return Err(Error::InvalidResource(format!("mesh '{}' has no submesh", desc.name)));
        }
        if desc.bounds.min.cmpgt(desc.bounds.max).any() {
            return Err(Error::InvalidResource(format!(
                "mesh '{}' has inverted bounds {:?}", desc.name, desc.bounds)));
        }
        Ok(Self {
            name: desc.name,
            vertex_buffer: desc.vertex_buffer,
            index_buffer: desc.index_buffer,
            index_type: desc.index_type,
            submeshes: desc.submeshes,
            bounds: desc.bounds,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }

    pub fn index_buffer(&self) -> &Arc<dyn Buffer> {
        &self.index_buffer
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn submeshes(&self) -> &[SubMesh] {
        &self.submeshes
    }

    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Local-space bounds
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("name", &self.name)
            .field("submeshes", &self.submeshes.len())
            .field("bounds", &self.bounds)
            .finish()
    }
}

#[cfg(test)]
#[path = "mesh_tests.rs"]
mod tests;
