/// Render pass graph: the fixed sequence of steps that renders a frame.
///
/// The sequence is shadow, G-buffer, ambient occlusion (with separable
/// blur), lighting composite, forward, post chain (bloom, motion blur,
/// anti-aliasing, outline) and presentation. Disabled steps are left out
/// at compile time and the color flows through unchanged.
///
/// Compilation walks the declared reads and writes in order and derives
/// every state transition. Transients and the backbuffer start each frame
/// `Undefined`, so the same barrier list is valid for every frame.

use rustc_hash::FxHashMap;

use crate::config::{AoConfig, EngineConfig, PassConfig, PostEffects, ShadowConfig};
use crate::error::Result;
use crate::graphics_device::{
    Buffer, ClearValue, CommandList, GraphicsDevice, LoadOp, PipelineDesc, PipelineKind,
    RenderPassBegin, ResourceState, Texture, TextureBarrier, TextureFormat, Viewport,
};
use crate::resource::RenderGroup;
use crate::scene::{FrustumCuller, RenderQueues, SceneGraph};
use crate::services::Overlay;
use crate::{engine_bail, engine_debug, engine_info};
use super::frame_report::StepReport;
use super::pass_action::{
    FullscreenAction, GeometryAction, OverlayAction, PassAction, PassContext, ShadowAction, StepStats,
};
use super::render_pass::{RenderStep, StepKind};
use super::render_target::{RenderTargets, ResourceId};
use super::shadow_layout::{layout_shadow_views, ShadowView};

const SOURCE: &str = "lumen::RenderPassGraph";

// ===== COMPILATION =====

/// One transition recorded before a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Barrier {
    pub resource: ResourceId,
    pub before: ResourceState,
    pub after: ResourceState,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStep {
    step: RenderStep,
    barriers: Vec<Barrier>,
}

impl CompiledStep {
    pub fn step(&self) -> &RenderStep {
        &self.step
    }

    /// Transitions recorded before the step.
    pub fn barriers(&self) -> &[Barrier] {
        &self.barriers
    }
}

/// Ordered steps with their derived transitions.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledGraph {
    steps: Vec<CompiledStep>,
    final_color: ResourceId,
    /// Transients in first-use order
    resources: Vec<ResourceId>,
    /// State of every resource after the last step
    final_states: FxHashMap<ResourceId, ResourceState>,
}

impl CompiledGraph {
    /// Declare the steps `passes` enables and compile them.
    pub fn compile(passes: &PassConfig, ao: &AoConfig) -> Result<Self> {
        let (steps, final_color) = declare_steps(passes, ao);
        Self::from_steps(steps, final_color)
    }

    /// Derive transitions from declarations.
    ///
    /// Fails when a step reads a resource nobody wrote this frame, or
    /// declares a read in a non-readable state (or a write in a
    /// non-writable one).
    pub(crate) fn from_steps(steps: Vec<RenderStep>, final_color: ResourceId) -> Result<Self> {
        let mut states: FxHashMap<ResourceId, ResourceState> = FxHashMap::default();
        let mut resources = Vec::new();
        let mut compiled = Vec::with_capacity(steps.len());

        for step in steps {
            let mut barriers = Vec::new();
            for access in step.reads() {
                if !access.state.is_readable() {
                    engine_bail!(SOURCE, "step '{}' reads '{}' in non-readable state {:?}",
                        step.name(), access.resource.name(), access.state);
                }
                let current = states.get(&access.resource).copied().unwrap_or(ResourceState::Undefined);
                if current == ResourceState::Undefined {
                    engine_bail!(SOURCE, "step '{}' reads '{}' before any step wrote it",
                        step.name(), access.resource.name());
                }
                if current != access.state {
                    barriers.push(Barrier { resource: access.resource, before: current, after: access.state });
                }
                states.insert(access.resource, access.state);
            }
            for access in step.writes() {
                if !access.state.is_writable() {
                    engine_bail!(SOURCE, "step '{}' writes '{}' in non-writable state {:?}",
                        step.name(), access.resource.name(), access.state);
                }
                let current = states.get(&access.resource).copied().unwrap_or(ResourceState::Undefined);
                if current != access.state {
                    barriers.push(Barrier { resource: access.resource, before: current, after: access.state });
                }
                states.insert(access.resource, access.state);
                if access.resource.is_transient() && !resources.contains(&access.resource) {
                    resources.push(access.resource);
                }
            }
            compiled.push(CompiledStep { step, barriers });
        }

        Ok(Self { steps: compiled, final_color, resources, final_states: states })
    }

    pub fn steps(&self) -> &[CompiledStep] {
        &self.steps
    }

    pub fn step(&self, kind: StepKind) -> Option<&CompiledStep> {
        self.steps.iter().find(|s| s.step.kind() == kind)
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.step.name()).collect()
    }

    /// Output of the last enabled color stage, copied into the backbuffer.
    pub fn final_color(&self) -> ResourceId {
        self.final_color
    }

    /// Transients the graph needs, in first-use order.
    pub fn resources(&self) -> &[ResourceId] {
        &self.resources
    }

    /// State a resource is left in at the end of the frame.
    pub fn final_state(&self, resource: ResourceId) -> Option<ResourceState> {
        self.final_states.get(&resource).copied()
    }
}

/// The fixed step order, minus what `passes` disables.
fn declare_steps(passes: &PassConfig, ao: &AoConfig) -> (Vec<RenderStep>, ResourceId) {
    use ResourceId::*;
    use ResourceState::{ColorTarget, CopyDest, CopySource, DepthRead, DepthWrite, ShaderRead};

    let mut steps = Vec::new();
    if passes.shadows {
        steps.push(RenderStep::new(StepKind::Shadow).write(ShadowAtlas, DepthWrite));
    }
    steps.push(
        RenderStep::new(StepKind::GBuffer)
            .write(GBufferAlbedo, ColorTarget)
            .write(GBufferNormal, ColorTarget)
            .write(GBufferMotion, ColorTarget)
            .write(Depth, DepthWrite),
    );
    if passes.ambient_occlusion {
        steps.push(
            RenderStep::new(StepKind::Ssao)
                .read(GBufferNormal, ShaderRead)
                .read(Depth, ShaderRead)
                .write(AoRaw, ColorTarget),
        );
        for _ in 0..ao.blur_passes {
            steps.push(RenderStep::new(StepKind::AoBlurHorizontal).read(AoRaw, ShaderRead).write(AoBlur, ColorTarget));
            steps.push(RenderStep::new(StepKind::AoBlurVertical).read(AoBlur, ShaderRead).write(AoRaw, ColorTarget));
        }
    }

    let mut lighting = RenderStep::new(StepKind::Lighting)
        .read(GBufferAlbedo, ShaderRead)
        .read(GBufferNormal, ShaderRead)
        .read(Depth, ShaderRead);
    if passes.shadows {
        lighting = lighting.read(ShadowAtlas, ShaderRead);
    }
    if passes.ambient_occlusion {
        lighting = lighting.read(AoRaw, ShaderRead);
    }
    steps.push(lighting.write(SceneColor, ColorTarget));

    if passes.forward {
        steps.push(RenderStep::new(StepKind::Forward).read(Depth, DepthRead).write(SceneColor, ColorTarget));
    }

    let stages = [
        (PostEffects::BLOOM, StepKind::BloomComposite),
        (PostEffects::MOTION_BLUR, StepKind::MotionBlur),
        (PostEffects::ANTI_ALIASING, StepKind::AntiAliasing),
        (PostEffects::OUTLINE, StepKind::Outline),
    ];
    let mut color = SceneColor;
    for (flag, kind) in stages {
        if !passes.post_effects.contains(flag) {
            continue;
        }
        let target = if color == PostPing { PostPong } else { PostPing };
        let step = match kind {
            StepKind::BloomComposite => {
                steps.push(RenderStep::new(StepKind::BloomExtract).read(color, ShaderRead).write(BloomScratch, ColorTarget));
                RenderStep::new(kind).read(color, ShaderRead).read(BloomScratch, ShaderRead)
            }
            StepKind::MotionBlur => RenderStep::new(kind).read(color, ShaderRead).read(GBufferMotion, ShaderRead),
            StepKind::Outline => RenderStep::new(kind).read(color, ShaderRead).read(Depth, ShaderRead),
            _ => RenderStep::new(kind).read(color, ShaderRead),
        };
        steps.push(step.write(target, ColorTarget));
        color = target;
    }

    steps.push(RenderStep::new(StepKind::PresentCopy).read(color, CopySource).write(Backbuffer, CopyDest));
    steps.push(RenderStep::new(StepKind::Overlay).write(Backbuffer, ColorTarget));
    steps.push(RenderStep::new(StepKind::Present).read(Backbuffer, ResourceState::Present));
    (steps, color)
}

// ===== EXECUTION =====

/// Everything one frame's execution reads.
pub struct FrameInputs<'a> {
    /// The slot's command list, between `begin` and `end`
    pub cmd: &'a mut dyn CommandList,
    pub queues: &'a RenderQueues,
    pub shadow_views: &'a [ShadowView],
    /// The slot's constant buffer, already written
    pub constants: &'a dyn Buffer,
    /// Surface image acquired for this frame
    pub backbuffer: &'a dyn Texture,
    /// Read-only scene for the overlay
    pub scene: &'a SceneGraph,
}

/// Compiled graph plus the GPU objects it records with.
pub struct RenderPassGraph {
    passes: PassConfig,
    shadows: ShadowConfig,
    ao: AoConfig,
    surface_format: TextureFormat,
    compiled: CompiledGraph,
    /// Parallel to `compiled.steps`; `None` for copy/present steps
    actions: Vec<Option<Box<dyn PassAction>>>,
    targets: RenderTargets,
}

impl RenderPassGraph {
    pub fn new(device: &mut dyn GraphicsDevice, config: &EngineConfig, surface_format: TextureFormat) -> Result<Self> {
        let compiled = CompiledGraph::compile(&config.passes, &config.ambient_occlusion)?;
        let targets = RenderTargets::create(
            device, compiled.resources(), config.width, config.height, config.shadows.atlas_size)?;
        let actions = create_actions(device, &compiled, surface_format)?;
        engine_info!(SOURCE, "compiled {} steps, presenting from '{}'",
            compiled.steps().len(), compiled.final_color().name());
        Ok(Self {
            passes: config.passes,
            shadows: config.shadows,
            ao: config.ambient_occlusion,
            surface_format,
            compiled,
            actions,
            targets,
        })
    }

    pub fn compiled(&self) -> &CompiledGraph {
        &self.compiled
    }

    pub fn targets(&self) -> &RenderTargets {
        &self.targets
    }

    pub fn passes(&self) -> &PassConfig {
        &self.passes
    }

    /// Recreate the transients. The GPU must be idle.
    pub fn resize(&mut self, device: &mut dyn GraphicsDevice, width: u32, height: u32) -> Result<()> {
        self.targets = RenderTargets::create(
            device, self.compiled.resources(), width, height, self.shadows.atlas_size)?;
        Ok(())
    }

    /// Recreate every graph-owned pipeline state. The GPU must be idle.
    pub fn reload_pipelines(&mut self, device: &mut dyn GraphicsDevice) -> Result<()> {
        self.actions = create_actions(device, &self.compiled, self.surface_format)?;
        engine_debug!(SOURCE, "pipelines reloaded");
        Ok(())
    }

    /// Recompile for new pass toggles. The GPU must be idle.
    pub fn reconfigure(&mut self, device: &mut dyn GraphicsDevice, passes: PassConfig) -> Result<()> {
        let compiled = CompiledGraph::compile(&passes, &self.ao)?;
        let (width, height) = self.targets.extent();
        let targets = RenderTargets::create(device, compiled.resources(), width, height, self.shadows.atlas_size)?;
        let actions = create_actions(device, &compiled, self.surface_format)?;
        self.passes = passes;
        self.compiled = compiled;
        self.targets = targets;
        self.actions = actions;
        engine_info!(SOURCE, "reconfigured: {}", self.compiled.step_names().join(" -> "));
        Ok(())
    }

    /// Atlas tiles for this frame; empty when the shadow step is disabled.
    /// Only the first `max_lights` lights are uploaded, so only they get tiles.
    pub fn prepare_shadows(&self, queues: &RenderQueues, max_lights: usize) -> Vec<ShadowView> {
        if !self.passes.shadows {
            return Vec::new();
        }
        let lights = queues.lights();
        let uploaded = &lights[..lights.len().min(max_lights)];
        layout_shadow_views(uploaded, queues.main_view().map(|c| &c.view), &self.shadows)
    }

    /// Record every step into `frame.cmd`.
    pub fn execute(
        &mut self,
        frame: FrameInputs<'_>,
        overlay: &mut Option<&mut dyn Overlay>,
    ) -> Result<Vec<StepReport>> {
        let FrameInputs { cmd, queues, shadow_views, constants, backbuffer, scene } = frame;
        let view = queues.main_view().map(|c| &c.view);
        let (width, height) = self.targets.extent();
        let atlas_size = self.shadows.atlas_size;
        let mut reports = Vec::with_capacity(self.compiled.steps.len());

        for (compiled, action) in self.compiled.steps.iter().zip(self.actions.iter_mut()) {
            let step = &compiled.step;
            for barrier in &compiled.barriers {
                let texture = self.targets.resolve(barrier.resource, backbuffer)?;
                cmd.transition(&TextureBarrier { texture, before: barrier.before, after: barrier.after })?;
            }

            let mut stats = StepStats::default();
            match step.kind() {
                StepKind::PresentCopy => {
                    let (Some(src), Some(dst)) = (step.reads().first(), step.writes().first()) else {
                        engine_bail!(SOURCE, "present copy declares no source or destination");
                    };
                    let src = self.targets.resolve(src.resource, backbuffer)?;
                    let dst = self.targets.resolve(dst.resource, backbuffer)?;
                    cmd.copy_texture(src, dst)?;
                }
                StepKind::Present => {}
                kind => {
                    let mut color_targets: Vec<&dyn Texture> = Vec::new();
                    let mut depth_target = None;
                    let mut depth_read_only = false;
                    for access in step.writes() {
                        match access.state {
                            ResourceState::ColorTarget => color_targets.push(self.targets.resolve(access.resource, backbuffer)?),
                            ResourceState::DepthWrite => depth_target = Some(self.targets.resolve(access.resource, backbuffer)?),
                            _ => {}
                        }
                    }
                    let mut inputs: Vec<&dyn Texture> = Vec::new();
                    for access in step.reads() {
                        match access.state {
                            ResourceState::ShaderRead => inputs.push(self.targets.resolve(access.resource, backbuffer)?),
                            ResourceState::DepthRead if depth_target.is_none() => {
                                depth_target = Some(self.targets.resolve(access.resource, backbuffer)?);
                                depth_read_only = true;
                            }
                            _ => {}
                        }
                    }

                    let (load_op, clear) = match kind {
                        StepKind::Shadow => (LoadOp::Clear, ClearValue::default()),
                        StepKind::GBuffer => (LoadOp::Clear, ClearValue {
                            color: view.map_or(ClearValue::default().color, |v| v.clear_color()),
                            depth: 1.0,
                        }),
                        StepKind::Forward | StepKind::Overlay => (LoadOp::Load, ClearValue::default()),
                        _ => (LoadOp::DontCare, ClearValue::default()),
                    };
                    let (w, h) = step
                        .writes()
                        .first()
                        .map_or((width, height), |w| w.resource.extent(width, height, atlas_size));
                    let viewport = Viewport::full(w, h);

                    cmd.begin_render_pass(&RenderPassBegin {
                        label: step.name(),
                        color_targets: &color_targets,
                        depth_target,
                        depth_read_only,
                        load_op,
                        clear,
                    })?;
                    cmd.set_viewport(viewport)?;
                    cmd.bind_constants(constants, 0)?;
                    if !inputs.is_empty() {
                        cmd.bind_textures(&inputs)?;
                    }
                    if let Some(action) = action {
                        stats = action.record(&mut PassContext {
                            cmd: &mut *cmd,
                            queues,
                            view,
                            shadow_views,
                            viewport,
                        })?;
                    }
                    if kind == StepKind::Overlay {
                        if let Some(overlay) = overlay.as_deref_mut() {
                            overlay.record(&mut *cmd, viewport, scene)?;
                        }
                    }
                    cmd.end_render_pass()?;
                }
            }
            reports.push(StepReport { name: step.name(), draws: stats.draws, culled: stats.culled });
        }
        Ok(reports)
    }
}

/// Build the action of every step, creating graph-owned pipelines.
fn create_actions(
    device: &mut dyn GraphicsDevice,
    compiled: &CompiledGraph,
    surface_format: TextureFormat,
) -> Result<Vec<Option<Box<dyn PassAction>>>> {
    let mut actions: Vec<Option<Box<dyn PassAction>>> = Vec::with_capacity(compiled.steps().len());
    for compiled_step in compiled.steps() {
        let step = compiled_step.step();
        let color_formats = |step: &RenderStep| -> Vec<TextureFormat> {
            step.writes()
                .iter()
                .filter(|w| w.state == ResourceState::ColorTarget)
                .map(|w| if w.resource == ResourceId::Backbuffer { surface_format } else { w.resource.format() })
                .collect()
        };
        let action: Option<Box<dyn PassAction>> = match step.kind() {
            StepKind::Shadow => Some(Box::new(ShadowAction)),
            StepKind::GBuffer => Some(Box::new(GeometryAction::new(RenderGroup::Deferred, Box::new(FrustumCuller::new())))),
            StepKind::Forward => Some(Box::new(GeometryAction::new(RenderGroup::Forward, Box::new(FrustumCuller::new())))),
            kind if !kind.is_render_pass() => None,
            StepKind::Overlay => {
                let pipeline = device.create_pipeline(&PipelineDesc {
                    name: step.name().to_string(),
                    kind: PipelineKind::Overlay,
                    color_formats: color_formats(step),
                    depth_format: None,
                })?;
                Some(Box::new(OverlayAction::new(pipeline)))
            }
            _ => {
                let pipeline = device.create_pipeline(&PipelineDesc {
                    name: step.name().to_string(),
                    kind: PipelineKind::Fullscreen,
                    color_formats: color_formats(step),
                    depth_format: None,
                })?;
                Some(Box::new(FullscreenAction::new(pipeline)))
            }
        };
        actions.push(action);
    }
    Ok(actions)
}

#[cfg(test)]
#[path = "render_graph_tests.rs"]
mod tests;
