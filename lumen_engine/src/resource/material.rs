/// Resource-level material type.
///
/// A Material names the pipeline state its surfaces draw with, the render
/// group that pipeline belongs to and the textures it samples. Materials
/// are immutable and shared through `Arc`.

use std::sync::Arc;
use crate::graphics_device::{PipelineStateId, Texture};

/// Which part of the frame draws a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderGroup {
    /// Opaque surfaces written to the G-buffer and lit by the composite
    Deferred,
    /// Surfaces shaded directly after the composite (transparent, unlit)
    Forward,
}

impl RenderGroup {
    pub const ALL: [RenderGroup; 2] = [RenderGroup::Deferred, RenderGroup::Forward];

    pub fn index(self) -> usize {
        match self {
            RenderGroup::Deferred => 0,
            RenderGroup::Forward => 1,
        }
    }
}

/// Surface description.
pub struct Material {
    name: String,
    group: RenderGroup,
    pipeline: PipelineStateId,
    shadow_pipeline: Option<PipelineStateId>,
    textures: Vec<Arc<dyn Texture>>,
}

impl Material {
    pub fn new(name: impl Into<String>, group: RenderGroup, pipeline: PipelineStateId) -> Self {
        Self {
            name: name.into(),
            group,
            pipeline,
            shadow_pipeline: None,
            textures: Vec::new(),
        }
    }

    /// Depth-only pipeline for the shadow pass. Without one the surface
    /// casts no shadow.
    pub fn with_shadow_pipeline(mut self, pipeline: PipelineStateId) -> Self {
        self.shadow_pipeline = Some(pipeline);
        self
    }

    pub fn with_textures(mut self, textures: Vec<Arc<dyn Texture>>) -> Self {
        self.textures = textures;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group(&self) -> RenderGroup {
        self.group
    }

    pub fn pipeline(&self) -> PipelineStateId {
        self.pipeline
    }

    pub fn shadow_pipeline(&self) -> Option<PipelineStateId> {
        self.shadow_pipeline
    }

    pub fn textures(&self) -> &[Arc<dyn Texture>] {
        &self.textures
    }
}

impl std::fmt::Debug for Material {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Material")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("pipeline", &self.pipeline)
            .field("shadow_pipeline", &self.shadow_pipeline)
            .finish()
    }
}

#[cfg(test)]
#[path = "material_tests.rs"]
mod tests;
