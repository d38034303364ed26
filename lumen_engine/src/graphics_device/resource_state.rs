/// GPU resource usage states and transitions

use crate::graphics_device::Texture;

/// How a texture is being used at a point in the command stream.
///
/// Moving a texture between states requires an explicit transition
/// recorded on the command list before the new usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Contents are undefined (first use in a frame)
    Undefined,
    /// Bound as a color attachment
    ColorTarget,
    /// Bound as a depth attachment with writes enabled
    DepthWrite,
    /// Bound as a depth attachment for testing only
    DepthRead,
    /// Sampled by a shader
    ShaderRead,
    /// Source of a copy
    CopySource,
    /// Destination of a copy
    CopyDest,
    /// Handed to the presentation engine
    Present,
}

impl ResourceState {
    /// States in which a pass may write the resource.
    pub fn is_writable(self) -> bool {
        matches!(self, ResourceState::ColorTarget | ResourceState::DepthWrite | ResourceState::CopyDest)
    }

    /// States in which a pass may read the resource.
    pub fn is_readable(self) -> bool {
        matches!(
            self,
            ResourceState::DepthRead
                | ResourceState::ShaderRead
                | ResourceState::CopySource
                | ResourceState::Present
        )
    }
}

/// One state transition to record on a command list.
pub struct TextureBarrier<'a> {
    pub texture: &'a dyn Texture,
    pub before: ResourceState,
    pub after: ResourceState,
}
