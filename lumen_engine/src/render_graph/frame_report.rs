/// Per-frame statistics returned by the frame loop.

use super::render_target::ResourceId;

/// One executed step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub name: &'static str,
    pub draws: u32,
    pub culled: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame ring slot the frame was recorded into
    pub slot: usize,
    /// Fence value the frame signals on completion
    pub fence_value: u64,
    /// Executed steps in order
    pub steps: Vec<StepReport>,
    /// Color resource copied into the backbuffer
    pub presented_from: ResourceId,
    /// Shadow atlas tiles rendered
    pub shadow_views: usize,
    /// Submeshes dropped for missing mesh or material
    pub skipped_submeshes: usize,
}

impl FrameReport {
    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name).collect()
    }

    /// Draw calls over all steps.
    pub fn draw_calls(&self) -> u32 {
        self.steps.iter().map(|s| s.draws).sum()
    }

    /// Culled draws over all steps.
    pub fn culled(&self) -> u32 {
        self.steps.iter().map(|s| s.culled).sum()
    }
}
