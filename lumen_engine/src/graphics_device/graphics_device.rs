/// GraphicsDevice trait - main GPU factory and queue interface

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, CommandList, PipelineDesc, PipelineStateId, Texture, TextureDesc,
};

// ============================================================================
// Fence
// ============================================================================

/// Monotonically increasing GPU timeline.
///
/// The queue raises the completed value when it reaches a point signaled
/// with `GraphicsDevice::signal`. Values are never reused.
pub trait Fence: Send + Sync {
    /// Highest value the GPU has reached.
    fn completed_value(&self) -> u64;

    /// Block the calling thread until `completed_value() >= value`.
    fn wait(&self, value: u64) -> Result<()>;
}

// ============================================================================
// GraphicsDevice trait
// ============================================================================

/// Main graphics device trait
///
/// Central factory for GPU resources and owner of the single graphics
/// queue. Implemented by backends (see `headless` for the in-memory one).
pub trait GraphicsDevice: Send {
    /// Create a buffer
    ///
    /// # Arguments
    ///
    /// * `desc` - Buffer descriptor
    fn create_buffer(&mut self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture
    ///
    /// # Arguments
    ///
    /// * `desc` - Texture descriptor
    fn create_texture(&mut self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create (or look up) a pipeline state object
    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineStateId>;

    /// Create a command list with its own allocator
    fn create_command_list(&mut self) -> Result<Box<dyn CommandList>>;

    /// Submit a recorded command list to the graphics queue
    fn submit(&mut self, commands: &dyn CommandList) -> Result<()>;

    /// Enqueue a fence signal after all previously submitted work
    fn signal(&mut self, value: u64) -> Result<()>;

    /// The queue's timeline fence
    fn fence(&self) -> Arc<dyn Fence>;

    /// Block until the GPU is idle
    fn wait_idle(&mut self) -> Result<()>;
}
