//! Engine configuration.
//!
//! Plain data with sensible defaults. Validated once when the frame loop is
//! built; changing pass toggles later requires a full flush and a graph
//! rebuild (`FrameLoop::reconfigure`).

use bitflags::bitflags;
use crate::error::{Error, Result};
use crate::log::LogSeverity;

bitflags! {
    /// Optional full-screen stages of the post-process chain.
    ///
    /// Stages always run in the fixed order bloom, motion blur,
    /// anti-aliasing, outline. A cleared bit skips the stage and the color
    /// flows through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PostEffects: u32 {
        const BLOOM         = 1 << 0;
        const MOTION_BLUR   = 1 << 1;
        const ANTI_ALIASING = 1 << 2;
        const OUTLINE       = 1 << 3;
    }
}

/// Pass toggles for the render pass graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassConfig {
    /// Render the shadow atlas
    pub shadows: bool,
    /// Compute and blur screen-space ambient occlusion
    pub ambient_occlusion: bool,
    /// Render the forward group after the lighting composite
    pub forward: bool,
    /// Enabled post-process stages
    pub post_effects: PostEffects,
}

impl Default for PassConfig {
    fn default() -> Self {
        Self {
            shadows: true,
            ambient_occlusion: true,
            forward: true,
            post_effects: PostEffects::BLOOM | PostEffects::ANTI_ALIASING,
        }
    }
}

/// Shadow atlas layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowConfig {
    /// Side length of the square depth atlas in texels
    pub atlas_size: u32,
    /// Cascades per directional light (1..=4)
    pub cascade_count: u32,
    /// Blend between uniform (0.0) and logarithmic (1.0) cascade splits
    pub cascade_split_lambda: f32,
    /// Upper bound on shadow-casting lights per frame
    pub max_shadow_lights: u32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            atlas_size: 4096,
            cascade_count: 3,
            cascade_split_lambda: 0.75,
            max_shadow_lights: 4,
        }
    }
}

/// Screen-space ambient occlusion parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AoConfig {
    /// Sampling radius in view-space units
    pub radius: f32,
    /// Number of separable blur iterations (each is horizontal + vertical)
    pub blur_passes: u32,
}

impl Default for AoConfig {
    fn default() -> Self {
        Self { radius: 0.5, blur_passes: 1 }
    }
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Frames the CPU may record ahead of the GPU (2 or 3)
    pub frames_in_flight: usize,
    /// Initial surface width in pixels
    pub width: u32,
    /// Initial surface height in pixels
    pub height: u32,
    /// Pass toggles
    pub passes: PassConfig,
    /// Shadow atlas layout
    pub shadows: ShadowConfig,
    /// Ambient occlusion parameters
    pub ambient_occlusion: AoConfig,
    /// Lights uploaded per frame; extra lights are dropped with a warning
    pub max_lights: usize,
    /// Logger severity floor applied when the frame loop starts
    pub log_severity: LogSeverity,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            width: 1280,
            height: 720,
            passes: PassConfig::default(),
            shadows: ShadowConfig::default(),
            ambient_occlusion: AoConfig::default(),
            max_lights: 64,
            log_severity: LogSeverity::Info,
        }
    }
}

impl EngineConfig {
    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<()> {
        if !(2..=3).contains(&self.frames_in_flight) {
            return Err(Error::InvalidConfig(format!(
                "frames_in_flight must be 2 or 3, got {}", self.frames_in_flight)));
        }
        if self.width == 0 || self.height == 0 {
            return Err(Error::InvalidConfig(format!(
                "surface size must be non-zero, got {}x{}", self.width, self.height)));
        }
        if !(1..=4).contains(&self.shadows.cascade_count) {
            return Err(Error::InvalidConfig(format!(
                "cascade_count must be in 1..=4, got {}", self.shadows.cascade_count)));
        }
        if self.shadows.atlas_size == 0 {
            return Err(Error::InvalidConfig("shadow atlas_size must be non-zero".to_string()));
        }
        if !(0.0..=1.0).contains(&self.shadows.cascade_split_lambda) {
            return Err(Error::InvalidConfig(format!(
                "cascade_split_lambda must be in [0, 1], got {}",
                self.shadows.cascade_split_lambda)));
        }
        if self.max_lights == 0 {
            return Err(Error::InvalidConfig("max_lights must be non-zero".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
