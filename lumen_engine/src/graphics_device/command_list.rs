/// CommandList trait - for recording rendering commands

use std::any::Any;
use crate::error::Result;
use crate::graphics_device::{
    Buffer, IndexType, PipelineStateId, Texture, TextureBarrier,
};

/// Command list for recording rendering commands
///
/// One command list belongs to each frame slot. It is reset when the slot
/// is reacquired and submitted via `GraphicsDevice::submit()`.
pub trait CommandList: Send {
    /// Release recorded commands and allocator memory.
    ///
    /// Only legal once the GPU has finished executing the previous
    /// submission of this list.
    fn reset(&mut self) -> Result<()>;

    /// Begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Record a texture state transition. Must be outside a render pass.
    fn transition(&mut self, barrier: &TextureBarrier) -> Result<()>;

    /// Begin a render pass
    fn begin_render_pass(&mut self, desc: &RenderPassBegin) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Bind a pipeline state object
    fn bind_pipeline(&mut self, pipeline: PipelineStateId) -> Result<()>;

    /// Bind the shader inputs of the current pass in declaration order
    fn bind_textures(&mut self, textures: &[&dyn Texture]) -> Result<()>;

    /// Bind a range of the frame constant buffer
    fn bind_constants(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()>;

    /// Push constants to the pipeline
    fn push_constants(&mut self, offset: u32, data: &[u8]) -> Result<()>;

    /// Bind a vertex buffer
    fn bind_vertex_buffer(&mut self, buffer: &dyn Buffer, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &dyn Buffer, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    ///
    /// # Arguments
    ///
    /// * `index_count` - Number of indices to draw
    /// * `first_index` - Index of first index
    /// * `vertex_offset` - Value added to vertex index before indexing into the vertex buffer
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Copy a whole texture into another of identical size.
    /// Source must be in `CopySource`, destination in `CopyDest`.
    fn copy_texture(&mut self, src: &dyn Texture, dst: &dyn Texture) -> Result<()>;

    /// Backend downcast hook used by `GraphicsDevice::submit`.
    fn as_any(&self) -> &dyn Any;
}

/// Load operation for attachments at the start of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Keep existing contents
    Load,
    /// Clear to the pass clear value
    Clear,
    /// Contents will be fully overwritten
    DontCare,
}

/// Parameters of a render pass.
pub struct RenderPassBegin<'a> {
    /// Debug label
    pub label: &'a str,
    /// Color attachments
    pub color_targets: &'a [&'a dyn Texture],
    /// Optional depth attachment
    pub depth_target: Option<&'a dyn Texture>,
    /// Depth is tested but not written
    pub depth_read_only: bool,
    /// Load operation for every attachment
    pub load_op: LoadOp,
    /// Clear values used with `LoadOp::Clear`
    pub clear: ClearValue,
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Full-target viewport with the default depth range.
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0.0, y: 0.0, width: width as f32, height: height as f32, min_depth: 0.0, max_depth: 1.0 }
    }
}

/// Clear value for a render pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClearValue {
    /// Color clear value (RGBA)
    pub color: [f32; 4],
    /// Depth clear value
    pub depth: f32,
}

impl Default for ClearValue {
    fn default() -> Self {
        Self { color: [0.0, 0.0, 0.0, 1.0], depth: 1.0 }
    }
}
