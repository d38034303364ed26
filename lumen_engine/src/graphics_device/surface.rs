/// Surface trait - for window presentation

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Texture, TextureFormat};

/// Presentable surface bound to an external window.
///
/// The frame loop acquires one image per frame, copies the final color
/// into it, transitions it to `ResourceState::Present` and presents it.
pub trait Surface: Send {
    /// Acquire the next presentable image
    fn acquire_next_image(&mut self) -> Result<Arc<dyn Texture>>;

    /// Present the image acquired this frame
    fn present(&mut self) -> Result<()>;

    /// Recreate the presentable images (e.g., after window resize)
    fn resize(&mut self, width: u32, height: u32) -> Result<()>;

    /// Get the width of the images in pixels
    fn width(&self) -> u32;

    /// Get the height of the images in pixels
    fn height(&self) -> u32;

    /// Get the pixel format of the images
    fn format(&self) -> TextureFormat;
}
