/// Pipeline state identity and descriptor

use crate::graphics_device::TextureFormat;

/// Opaque identity of a compiled pipeline state object.
///
/// Render queues bucket draws by this value, so two materials sharing a
/// pipeline land in the same bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PipelineStateId(pub u64);

/// What a pipeline draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    /// Mesh geometry into the G-buffer
    Deferred,
    /// Mesh geometry shaded directly into the scene color
    Forward,
    /// Depth-only mesh geometry into the shadow atlas
    ShadowDepth,
    /// Full-screen triangle
    Fullscreen,
    /// Screen-space GUI quads
    Overlay,
}

/// Descriptor for creating a pipeline
#[derive(Debug, Clone)]
pub struct PipelineDesc {
    /// Debug name (also the shader entry lookup key)
    pub name: String,
    /// Geometry class
    pub kind: PipelineKind,
    /// Color attachment formats
    pub color_formats: Vec<TextureFormat>,
    /// Depth attachment format, if any
    pub depth_format: Option<TextureFormat>,
}
