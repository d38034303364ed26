/// Render step node in the pass graph.
///
/// High-level description of one rendering step (shadow, G-buffer, one
/// post-process stage...). Not to be confused with the low-level GPU
/// render pass a step opens on the command list.
///
/// Each step declares the resources it reads and writes together with the
/// state it needs them in. The graph derives transitions from these
/// declarations.

use crate::graphics_device::ResourceState;
use super::render_target::ResourceId;

/// What a step does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Shadow,
    GBuffer,
    Ssao,
    AoBlurHorizontal,
    AoBlurVertical,
    Lighting,
    Forward,
    BloomExtract,
    BloomComposite,
    MotionBlur,
    AntiAliasing,
    Outline,
    /// Copy the final color into the backbuffer
    PresentCopy,
    /// GUI quads and the overlay callback on the backbuffer
    Overlay,
    /// Hand the backbuffer to presentation
    Present,
}

impl StepKind {
    pub fn name(self) -> &'static str {
        match self {
            StepKind::Shadow => "shadow",
            StepKind::GBuffer => "gbuffer",
            StepKind::Ssao => "ssao",
            StepKind::AoBlurHorizontal => "ao_blur_h",
            StepKind::AoBlurVertical => "ao_blur_v",
            StepKind::Lighting => "lighting",
            StepKind::Forward => "forward",
            StepKind::BloomExtract => "bloom_extract",
            StepKind::BloomComposite => "bloom_composite",
            StepKind::MotionBlur => "motion_blur",
            StepKind::AntiAliasing => "anti_aliasing",
            StepKind::Outline => "outline",
            StepKind::PresentCopy => "present_copy",
            StepKind::Overlay => "overlay",
            StepKind::Present => "present",
        }
    }

    /// Steps that record inside a GPU render pass.
    pub fn is_render_pass(self) -> bool {
        !matches!(self, StepKind::PresentCopy | StepKind::Present)
    }
}

/// One declared access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceUse {
    pub resource: ResourceId,
    pub state: ResourceState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderStep {
    kind: StepKind,
    /// Resources this step reads, in binding order
    reads: Vec<ResourceUse>,
    /// Resources this step writes
    writes: Vec<ResourceUse>,
}

impl RenderStep {
    pub(crate) fn new(kind: StepKind) -> Self {
        Self {
            kind,
            reads: Vec::new(),
            writes: Vec::new(),
        }
    }

    pub(crate) fn read(mut self, resource: ResourceId, state: ResourceState) -> Self {
        self.reads.push(ResourceUse { resource, state });
        self
    }

    pub(crate) fn write(mut self, resource: ResourceId, state: ResourceState) -> Self {
        self.writes.push(ResourceUse { resource, state });
        self
    }

    pub fn kind(&self) -> StepKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    pub fn reads(&self) -> &[ResourceUse] {
        &self.reads
    }

    pub fn writes(&self) -> &[ResourceUse] {
        &self.writes
    }

    /// Whether the step touches `resource` at all.
    pub fn uses(&self, resource: ResourceId) -> bool {
        self.reads.iter().chain(&self.writes).any(|u| u.resource == resource)
    }
}
