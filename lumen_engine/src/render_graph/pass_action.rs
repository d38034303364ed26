/// Pass action trait and implementations.
///
/// Defines what a render step records between begin_render_pass() and
/// end_render_pass(). The graph opens the pass, sets the viewport and binds
/// the frame constants and the step's sampled inputs; the action records
/// pipelines and draws.

use crate::camera::RenderView;
use crate::error::Result;
use crate::graphics_device::{CommandList, PipelineStateId, Texture, Viewport};
use crate::resource::RenderGroup;
use crate::scene::{CameraCuller, Drawable, GuiElement, RenderQueues};
use super::shadow_layout::ShadowView;

/// Draw statistics of one step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepStats {
    pub draws: u32,
    pub culled: u32,
}

/// What an action may look at while recording.
pub struct PassContext<'a> {
    pub cmd: &'a mut dyn CommandList,
    pub queues: &'a RenderQueues,
    /// Main camera, if any
    pub view: Option<&'a RenderView>,
    pub shadow_views: &'a [ShadowView],
    /// Viewport of the step's targets
    pub viewport: Viewport,
}

/// Action executed by a render step
pub trait PassAction: Send {
    /// Record draw commands into the command list
    fn record(&mut self, ctx: &mut PassContext) -> Result<StepStats>;
}

/// Push the object's matrix, bind its buffers and draw one submesh.
fn draw_submesh(cmd: &mut dyn CommandList, drawable: &Drawable, submesh: usize) -> Result<bool> {
    let Some(range) = drawable.mesh.submeshes().get(submesh) else {
        return Ok(false);
    };
    cmd.push_constants(0, bytemuck::bytes_of(&drawable.world_matrix))?;
    cmd.bind_vertex_buffer(drawable.mesh.vertex_buffer().as_ref(), 0)?;
    cmd.bind_index_buffer(drawable.mesh.index_buffer().as_ref(), 0, drawable.mesh.index_type())?;
    cmd.draw_indexed(range.index_count, range.first_index, range.vertex_offset)?;
    Ok(true)
}

// ===== SHADOW =====

/// Renders the shadow-caster queue once per atlas tile.
pub struct ShadowAction;

impl PassAction for ShadowAction {
    fn record(&mut self, ctx: &mut PassContext) -> Result<StepStats> {
        let mut stats = StepStats::default();
        let casters = ctx.queues.shadow_casters();
        for (index, tile) in ctx.shadow_views.iter().enumerate() {
            ctx.cmd.set_viewport(Viewport {
                x: tile.x as f32,
                y: tile.y as f32,
                width: tile.size as f32,
                height: tile.size as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            })?;
            ctx.cmd.push_constants(64, &(index as u32).to_le_bytes())?;
            for bucket in casters.buckets() {
                let mut bound = false;
                for entry in bucket.entries() {
                    let Some(drawable) = ctx.queues.drawable(entry.drawable) else { continue };
                    if !tile.frustum.intersects_aabb(&drawable.world_bounds) {
                        stats.culled += 1;
                        continue;
                    }
                    if !bound {
                        ctx.cmd.bind_pipeline(bucket.pipeline())?;
                        bound = true;
                    }
                    if draw_submesh(ctx.cmd, drawable, entry.submesh)? {
                        stats.draws += 1;
                    }
                }
            }
        }
        Ok(stats)
    }
}

// ===== GEOMETRY =====

/// Draws one render group, culled against the main camera.
pub struct GeometryAction {
    group: RenderGroup,
    culler: Box<dyn CameraCuller>,
    visible: Vec<bool>,
}

impl GeometryAction {
    pub fn new(group: RenderGroup, culler: Box<dyn CameraCuller>) -> Self {
        Self { group, culler, visible: Vec::new() }
    }
}

impl PassAction for GeometryAction {
    fn record(&mut self, ctx: &mut PassContext) -> Result<StepStats> {
        let mut stats = StepStats::default();
        // Nothing to look through
        let Some(view) = ctx.view else {
            return Ok(stats);
        };
        self.culler.cull(view, ctx.queues.drawables(), &mut self.visible);

        for bucket in ctx.queues.group(self.group).buckets() {
            let mut bound = false;
            for entry in bucket.entries() {
                let Some(drawable) = ctx.queues.drawable(entry.drawable) else { continue };
                if !self.visible.get(entry.drawable).copied().unwrap_or(false) {
                    stats.culled += 1;
                    continue;
                }
                if !bound {
                    ctx.cmd.bind_pipeline(bucket.pipeline())?;
                    bound = true;
                }
                if let Some(material) = drawable.material(entry.submesh) {
                    if !material.textures().is_empty() {
                        let textures: Vec<&dyn Texture> = material.textures().iter().map(|t| t.as_ref()).collect();
                        ctx.cmd.bind_textures(&textures)?;
                    }
                }
                if draw_submesh(ctx.cmd, drawable, entry.submesh)? {
                    stats.draws += 1;
                }
            }
        }
        Ok(stats)
    }
}

// ===== FULLSCREEN =====

/// Fullscreen pass action (data-driven, no closure)
///
/// Binds a pipeline and draws a fullscreen triangle (3 vertices). Used
/// for ambient occlusion, the lighting composite and the post chain.
pub struct FullscreenAction {
    pipeline: PipelineStateId,
}

impl FullscreenAction {
    pub fn new(pipeline: PipelineStateId) -> Self {
        Self { pipeline }
    }
}

impl PassAction for FullscreenAction {
    fn record(&mut self, ctx: &mut PassContext) -> Result<StepStats> {
        ctx.cmd.bind_pipeline(self.pipeline)?;
        ctx.cmd.draw(3, 0)?;
        Ok(StepStats { draws: 1, culled: 0 })
    }
}

// ===== OVERLAY =====

/// Per-quad push constant block.
#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
struct GuiQuad {
    rect: [f32; 4],
    color: [f32; 4],
}

/// Draws GUI elements as screen-space quads, lowest layer first.
pub struct OverlayAction {
    pipeline: PipelineStateId,
}

impl OverlayAction {
    pub fn new(pipeline: PipelineStateId) -> Self {
        Self { pipeline }
    }
}

impl PassAction for OverlayAction {
    fn record(&mut self, ctx: &mut PassContext) -> Result<StepStats> {
        let mut elements: Vec<&GuiElement> = ctx.queues.gui().iter().collect();
        if elements.is_empty() {
            return Ok(StepStats::default());
        }
        // Stable: equal layers keep traversal order
        elements.sort_by_key(|e| e.layer);

        ctx.cmd.bind_pipeline(self.pipeline)?;
        let mut stats = StepStats::default();
        for element in elements {
            let offscreen = element.position.x >= ctx.viewport.width
                || element.position.y >= ctx.viewport.height
                || element.position.x + element.size.x <= 0.0
                || element.position.y + element.size.y <= 0.0;
            if offscreen {
                stats.culled += 1;
                continue;
            }
            let quad = GuiQuad {
                rect: [element.position.x, element.position.y, element.size.x, element.size.y],
                color: element.color,
            };
            ctx.cmd.push_constants(0, bytemuck::bytes_of(&quad))?;
            ctx.cmd.draw(6, 0)?;
            stats.draws += 1;
        }
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "pass_action_tests.rs"]
mod tests;
