//! GPU-visible per-frame data.
//!
//! Layout of the per-slot constant buffer:
//!
//! ```text
//! [ FrameConstants | GpuShadowView x MAX_SHADOW_VIEWS | GpuLight x max_lights ]
//! ```

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

/// Upper bound on shadow atlas tiles rendered per frame.
pub const MAX_SHADOW_VIEWS: usize = 16;

/// Camera, viewport and timing for one frame.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameConstants {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub inverse_view_projection: Mat4,
    /// Previous frame's view-projection, for motion vectors
    pub previous_view_projection: Mat4,
    /// xyz = camera world position, w = 1 when a camera is active
    pub camera_position: Vec4,
    /// width, height, 1/width, 1/height
    pub viewport: Vec4,
    /// elapsed seconds, delta seconds, frame index, light count
    pub time: Vec4,
    /// AO radius, AO enabled, shadows enabled, shadow view count
    pub pass_params: Vec4,
}

/// One shadow atlas tile.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuShadowView {
    pub view_projection: Mat4,
    /// Normalized atlas rectangle: x, y, width, height
    pub atlas_rect: Vec4,
}

/// One light as the lighting shaders read it.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct GpuLight {
    /// xyz = world position, w = range
    pub position_range: Vec4,
    /// xyz = world direction, w = kind (0 directional, 1 point, 2 spot)
    pub direction_kind: Vec4,
    /// rgb = color, a = intensity
    pub color_intensity: Vec4,
    /// cos(inner), cos(outer), first shadow view (-1 = none), shadow view count
    pub spot_shadow: Vec4,
}

/// Bytes needed for one slot's constant buffer.
pub fn constant_buffer_size(max_lights: usize) -> u64 {
    (std::mem::size_of::<FrameConstants>()
        + MAX_SHADOW_VIEWS * std::mem::size_of::<GpuShadowView>()
        + max_lights * std::mem::size_of::<GpuLight>()) as u64
}

/// Byte offset of the shadow view array.
pub fn shadow_views_offset() -> u64 {
    std::mem::size_of::<FrameConstants>() as u64
}

/// Byte offset of the light array.
pub fn lights_offset() -> u64 {
    shadow_views_offset() + (MAX_SHADOW_VIEWS * std::mem::size_of::<GpuShadowView>()) as u64
}

/// Serialize one frame's constants in buffer layout.
///
/// Slices longer than their fixed capacity are truncated by the caller.
pub fn encode_frame_block(
    constants: &FrameConstants,
    shadow_views: &[GpuShadowView],
    lights: &[GpuLight],
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(
        lights_offset() as usize + std::mem::size_of_val(lights));
    bytes.extend_from_slice(bytemuck::bytes_of(constants));
    let views = &shadow_views[..shadow_views.len().min(MAX_SHADOW_VIEWS)];
    bytes.extend_from_slice(bytemuck::cast_slice(views));
    bytes.resize(lights_offset() as usize, 0);
    bytes.extend_from_slice(bytemuck::cast_slice(lights));
    bytes
}
