/// Frame loop - drives one frame from slot acquisition to present.
///
/// The loop owns the graphics device, the presentation surface, the frame
/// resource ring and the render pass graph. The scene and the services are
/// lent to every frame; nothing here is a global.
///
/// Per frame, in order: acquire slot, collect garbage the GPU released,
/// update, post-update, validate transforms, build render queues, feed the
/// audio listener, upload constants, record the pass graph, submit,
/// present, close the frame on the fence.

use std::time::Instant;

use glam::{Mat4, Quat, Vec3, Vec4};

use crate::config::{EngineConfig, PassConfig};
use crate::error::{abort_on_fatal, Result};
use crate::frame::{
    constant_buffer_size, encode_frame_block, FrameClock, FrameConstants, FrameResourceRing, FrameTime,
    GpuLight, GpuShadowView,
};
use crate::graphics_device::{GraphicsDevice, Surface};
use crate::log;
use crate::render_graph::{FrameInputs, FrameReport, RenderPassGraph, ShadowView};
use crate::scene::{LightKind, LightView, RenderQueueBuilder, RenderQueues, SceneGraph};
use crate::services::{LoopMessage, MessagePump, Services};
use crate::{engine_debug, engine_info, engine_trace, engine_warn};

const SOURCE: &str = "lumen::FrameLoop";

/// Owner of the per-frame GPU machinery.
pub struct FrameLoop {
    config: EngineConfig,
    device: Box<dyn GraphicsDevice>,
    surface: Box<dyn Surface>,
    ring: FrameResourceRing,
    graph: RenderPassGraph,
    queue_builder: RenderQueueBuilder,
    clock: FrameClock,
    encoder: ConstantEncoder,
    /// Surface has a zero extent (minimized window); `run` renders nothing
    suspended: bool,
}

/// Builds the per-frame constant block; remembers what motion vectors and
/// budget warnings need across frames.
struct ConstantEncoder {
    max_lights: usize,
    ao_radius: f32,
    atlas_size: u32,
    /// Main camera's view-projection of the previous frame
    previous_view_projection: Option<Mat4>,
    /// Set once the light budget warning has been logged
    warned_light_budget: bool,
}

impl FrameLoop {
    /// Validate `config`, apply its log severity and create the ring and graph.
    pub fn new(config: EngineConfig, mut device: Box<dyn GraphicsDevice>, surface: Box<dyn Surface>) -> Result<Self> {
        config.validate()?;
        log::set_min_severity(config.log_severity);

        let ring = FrameResourceRing::new(
            device.as_mut(),
            config.frames_in_flight,
            constant_buffer_size(config.max_lights),
        )?;
        let mut graph_config = config.clone();
        graph_config.width = surface.width();
        graph_config.height = surface.height();
        let graph = RenderPassGraph::new(device.as_mut(), &graph_config, surface.format())?;

        engine_info!(SOURCE, "{} frames in flight, surface {}x{}",
            config.frames_in_flight, surface.width(), surface.height());
        Ok(Self {
            device,
            surface,
            ring,
            graph,
            queue_builder: RenderQueueBuilder::new(),
            clock: FrameClock::new(),
            encoder: ConstantEncoder {
                max_lights: config.max_lights,
                ao_radius: config.ambient_occlusion.radius,
                atlas_size: config.shadows.atlas_size,
                previous_view_projection: None,
                warned_light_budget: false,
            },
            config,
            suspended: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ring(&self) -> &FrameResourceRing {
        &self.ring
    }

    pub fn graph(&self) -> &RenderPassGraph {
        &self.graph
    }

    /// Queues built by the most recent frame.
    pub fn queues(&self) -> &RenderQueues {
        self.queue_builder.queues()
    }

    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Whether the last resize reported a zero-sized surface.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// Run one frame of `delta` seconds.
    pub fn run_frame(&mut self, scene: &mut SceneGraph, services: &mut Services, delta: f32) -> Result<FrameReport> {
        let slot = self.ring.acquire_next_slot()?;
        let freed = scene.collect_garbage(self.ring.completed_fence());
        if freed > 0 {
            engine_trace!(SOURCE, "freed {} retired item(s)", freed);
        }

        let time = self.clock.advance(delta);
        scene.update(time, services.input);
        scene.post_update(time, services.input);
        scene.validate_hierarchy();

        let (width, height) = (self.surface.width(), self.surface.height());
        let queues = self.queue_builder.build(scene, width, height);

        if let Some(camera) = queues.main_view() {
            let (position, orientation) = match scene.cached_world_matrix(camera.object) {
                Some(world) => {
                    let (_, rotation, translation) = world.to_scale_rotation_translation();
                    (translation, rotation)
                }
                None => (camera.view.position(), Quat::IDENTITY),
            };
            services.audio.update_listener(position, orientation);
        }

        let shadow_views = self.graph.prepare_shadows(queues, self.config.max_lights);
        let constants = self.encoder.encode(queues, &shadow_views, self.graph.passes(), time, (width, height));
        self.ring.write_constants(&constants)?;
        let skipped_submeshes = queues.skipped_submeshes();

        let image = self.surface.acquire_next_image()?;
        let constant_buffer = self.ring.current_slot()?.constants().clone();

        let steps = {
            let cmd = self.ring.current_slot_mut()?.command_list_mut();
            cmd.begin()?;
            let steps = self.graph.execute(
                FrameInputs {
                    cmd: &mut *cmd,
                    queues,
                    shadow_views: &shadow_views,
                    constants: constant_buffer.as_ref(),
                    backbuffer: image.as_ref(),
                    scene: &*scene,
                },
                &mut services.overlay,
            )?;
            cmd.end()?;
            steps
        };

        self.device.submit(self.ring.current_slot()?.command_list())?;
        self.surface.present()?;
        let signaled = self.ring.end_frame(self.device.as_mut())?;
        let report = FrameReport {
            slot,
            fence_value: signaled,
            steps,
            presented_from: self.graph.compiled().final_color(),
            shadow_views: shadow_views.len(),
            skipped_submeshes,
        };
        scene.seal_garbage(signaled);

        engine_trace!(SOURCE, "frame {} recorded into slot {}, fence {}", time.frame_index, slot, signaled);
        Ok(report)
    }

    /// Wait for the GPU, then recreate the surface images and the graph's targets.
    ///
    /// A zero width or height suspends rendering instead; the rebuild happens
    /// when a non-zero size arrives.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            if !self.suspended {
                engine_info!(SOURCE, "surface is {}x{}, rendering suspended", width, height);
            }
            self.suspended = true;
            return Ok(());
        }
        self.ring.flush()?;
        self.surface.resize(width, height)?;
        self.graph.resize(self.device.as_mut(), width, height)?;
        self.config.width = width;
        self.config.height = height;
        self.suspended = false;
        engine_info!(SOURCE, "resized to {}x{}", width, height);
        Ok(())
    }

    /// Wait for the GPU, then rebuild every graph-owned pipeline state.
    pub fn reload_pipelines(&mut self) -> Result<()> {
        self.ring.flush()?;
        self.graph.reload_pipelines(self.device.as_mut())
    }

    /// Wait for the GPU, then recompile the graph for new pass toggles.
    pub fn reconfigure(&mut self, passes: PassConfig) -> Result<()> {
        self.ring.flush()?;
        self.graph.reconfigure(self.device.as_mut(), passes)?;
        self.config.passes = passes;
        Ok(())
    }

    /// Render frames until `pump` asks to quit. Returns the frames rendered.
    ///
    /// Errors are returned untouched; see [`FrameLoop::run_until_quit`].
    pub fn run(&mut self, scene: &mut SceneGraph, services: &mut Services, pump: &mut dyn MessagePump) -> Result<u64> {
        let mut frames = 0;
        let mut last = Instant::now();
        loop {
            match pump.poll() {
                LoopMessage::Quit => break,
                LoopMessage::Resize { width, height } => self.resize(width, height)?,
                LoopMessage::ReloadPipelines => self.reload_pipelines()?,
                LoopMessage::Continue => {}
            }
            let now = Instant::now();
            let delta = now.duration_since(last).as_secs_f32();
            last = now;
            if self.suspended {
                continue;
            }
            self.run_frame(scene, services, delta)?;
            frames += 1;
        }
        engine_info!(SOURCE, "quit after {} frame(s)", frames);
        Ok(frames)
    }

    /// [`FrameLoop::run`], aborting the process on any error.
    pub fn run_until_quit(&mut self, scene: &mut SceneGraph, services: &mut Services, pump: &mut dyn MessagePump) -> u64 {
        abort_on_fatal(self.run(scene, services, pump))
    }

    /// Flush the GPU, free every retired object and release GPU objects
    /// before the device.
    pub fn shutdown(mut self, scene: &mut SceneGraph) -> Result<()> {
        self.ring.flush()?;
        self.device.wait_idle()?;
        let freed = scene.release_all_garbage();
        engine_debug!(SOURCE, "shutdown released {} retired item(s)", freed);

        let Self { device, surface, ring, graph, .. } = self;
        drop(graph);
        drop(ring);
        drop(surface);
        drop(device);
        engine_info!(SOURCE, "shut down");
        Ok(())
    }
}

impl ConstantEncoder {
    /// Lay out this frame's constant block.
    fn encode(
        &mut self,
        queues: &RenderQueues,
        shadow_views: &[ShadowView],
        passes: &PassConfig,
        time: FrameTime,
        (width, height): (u32, u32),
    ) -> Vec<u8> {
        let lights = queues.lights();
        if lights.len() > self.max_lights && !self.warned_light_budget {
            engine_warn!(SOURCE, "{} lights active, only the first {} are uploaded",
                lights.len(), self.max_lights);
            self.warned_light_budget = true;
        }
        let uploaded = &lights[..lights.len().min(self.max_lights)];

        let (view, projection, camera_position) = match queues.main_view() {
            Some(camera) => (
                *camera.view.view_matrix(),
                *camera.view.projection_matrix(),
                camera.view.position().extend(1.0),
            ),
            None => (Mat4::IDENTITY, Mat4::IDENTITY, Vec4::ZERO),
        };
        let view_projection = projection * view;
        let previous = self.previous_view_projection.replace(view_projection).unwrap_or(view_projection);

        let constants = FrameConstants {
            view,
            projection,
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            previous_view_projection: previous,
            camera_position,
            viewport: Vec4::new(width as f32, height as f32, 1.0 / width as f32, 1.0 / height as f32),
            time: Vec4::new(time.elapsed as f32, time.delta, time.frame_index as f32, uploaded.len() as f32),
            pass_params: Vec4::new(
                self.ao_radius,
                if passes.ambient_occlusion { 1.0 } else { 0.0 },
                if passes.shadows { 1.0 } else { 0.0 },
                shadow_views.len() as f32,
            ),
        };
        let gpu_views: Vec<GpuShadowView> = shadow_views.iter().map(|v| v.to_gpu(self.atlas_size)).collect();
        let gpu_lights: Vec<GpuLight> = uploaded
            .iter()
            .enumerate()
            .map(|(index, light)| gpu_light(light, index, shadow_views))
            .collect();
        encode_frame_block(&constants, &gpu_views, &gpu_lights)
    }
}

/// Pack one light, pointing at its first atlas tile if it has any.
fn gpu_light(light: &LightView, index: usize, shadow_views: &[ShadowView]) -> GpuLight {
    let first = shadow_views.iter().position(|v| v.light == index);
    let count = shadow_views.iter().filter(|v| v.light == index).count();
    let (cos_inner, cos_outer) = match light.light.kind {
        LightKind::Spot { inner_angle, outer_angle } => (inner_angle.cos(), outer_angle.cos()),
        _ => (0.0, 0.0),
    };
    let range = match light.light.kind {
        LightKind::Directional => 0.0,
        _ => light.light.range,
    };
    GpuLight {
        position_range: light.position.extend(range),
        direction_kind: light.direction.try_normalize().unwrap_or(Vec3::NEG_Z).extend(light.light.kind.gpu_tag()),
        color_intensity: light.light.color.extend(light.light.intensity),
        spot_shadow: Vec4::new(
            cos_inner,
            cos_outer,
            first.map_or(-1.0, |i| i as f32),
            count as f32,
        ),
    }
}

#[cfg(test)]
#[path = "frame_loop_tests.rs"]
mod tests;
