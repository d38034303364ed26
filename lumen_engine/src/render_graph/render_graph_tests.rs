use super::*;
use crate::graphics_device::headless::{HeadlessBuffer, HeadlessCommandList, HeadlessDevice, HeadlessTexture};
use crate::graphics_device::{TextureDesc, TextureUsage};
use crate::scene::{Light, RenderQueueBuilder};
use glam::Vec3;

// ============================================================================
// Helpers
// ============================================================================

fn passes(shadows: bool, ambient_occlusion: bool, forward: bool, post_effects: PostEffects) -> PassConfig {
    PassConfig { shadows, ambient_occlusion, forward, post_effects }
}

fn compile(passes: PassConfig) -> CompiledGraph {
    CompiledGraph::compile(&passes, &AoConfig::default()).unwrap()
}

fn small_config() -> EngineConfig {
    EngineConfig {
        width: 64,
        height: 32,
        shadows: ShadowConfig { atlas_size: 128, ..ShadowConfig::default() },
        ..EngineConfig::default()
    }
}

fn backbuffer() -> HeadlessTexture {
    HeadlessTexture::new(TextureDesc {
        name: "backbuffer0".to_string(),
        width: 64,
        height: 32,
        format: TextureFormat::B8G8R8A8_SRGB,
        usage: TextureUsage::SampledAndRenderTarget,
    })
}

// ============================================================================
// Compilation
// ============================================================================

#[test]
fn test_default_step_order() {
    let graph = compile(PassConfig::default());
    assert_eq!(
        graph.step_names(),
        vec![
            "shadow", "gbuffer", "ssao", "ao_blur_h", "ao_blur_v", "lighting", "forward",
            "bloom_extract", "bloom_composite", "anti_aliasing", "present_copy", "overlay", "present",
        ]
    );
    assert_eq!(graph.final_color(), ResourceId::PostPong);
}

#[test]
fn test_everything_disabled_presents_scene_color() {
    let graph = compile(passes(false, false, false, PostEffects::empty()));
    assert_eq!(
        graph.step_names(),
        vec!["gbuffer", "lighting", "present_copy", "overlay", "present"]
    );
    assert_eq!(graph.final_color(), ResourceId::SceneColor);
    assert!(!graph.resources().contains(&ResourceId::ShadowAtlas));
    assert!(!graph.resources().contains(&ResourceId::AoRaw));

    let lighting = graph.step(StepKind::Lighting).unwrap().step();
    assert!(!lighting.uses(ResourceId::ShadowAtlas));
    assert!(!lighting.uses(ResourceId::AoRaw));
}

#[test]
fn test_single_post_stage_writes_ping() {
    let graph = compile(passes(true, true, true, PostEffects::OUTLINE));
    assert_eq!(graph.final_color(), ResourceId::PostPing);
    let outline = graph.step(StepKind::Outline).unwrap().step();
    assert!(outline.reads().iter().any(|r| r.resource == ResourceId::SceneColor));
    assert!(outline.reads().iter().any(|r| r.resource == ResourceId::Depth));
}

#[test]
fn test_post_chain_alternates_ping_pong() {
    let graph = compile(passes(true, true, true, PostEffects::all()));
    assert_eq!(graph.final_color(), ResourceId::PostPong);

    let outputs: Vec<ResourceId> = [
        StepKind::BloomComposite,
        StepKind::MotionBlur,
        StepKind::AntiAliasing,
        StepKind::Outline,
    ]
    .iter()
    .map(|&kind| graph.step(kind).unwrap().step().writes()[0].resource)
    .collect();
    assert_eq!(
        outputs,
        vec![ResourceId::PostPing, ResourceId::PostPong, ResourceId::PostPing, ResourceId::PostPong]
    );

    let composite = graph.step(StepKind::BloomComposite).unwrap().step();
    assert!(composite.reads().iter().any(|r| r.resource == ResourceId::BloomScratch));
    let motion = graph.step(StepKind::MotionBlur).unwrap().step();
    assert!(motion.reads().iter().any(|r| r.resource == ResourceId::GBufferMotion));
}

#[test]
fn test_present_copy_reads_last_post_output() {
    for effects in [PostEffects::empty(), PostEffects::BLOOM, PostEffects::BLOOM | PostEffects::MOTION_BLUR] {
        let graph = compile(passes(true, true, true, effects));
        let copy = graph.step(StepKind::PresentCopy).unwrap();
        assert_eq!(copy.step().reads()[0].resource, graph.final_color());
        assert!(copy
            .barriers()
            .iter()
            .any(|b| b.resource == graph.final_color() && b.after == ResourceState::CopySource));
    }
}

#[test]
fn test_backbuffer_ends_in_present_state() {
    let graph = compile(PassConfig::default());
    assert_eq!(graph.final_state(ResourceId::Backbuffer), Some(ResourceState::Present));

    let barriers: Vec<(ResourceState, ResourceState)> = graph
        .steps()
        .iter()
        .flat_map(|s| s.barriers())
        .filter(|b| b.resource == ResourceId::Backbuffer)
        .map(|b| (b.before, b.after))
        .collect();
    assert_eq!(
        barriers,
        vec![
            (ResourceState::Undefined, ResourceState::CopyDest),
            (ResourceState::CopyDest, ResourceState::ColorTarget),
            (ResourceState::ColorTarget, ResourceState::Present),
        ]
    );
}

#[test]
fn test_blur_passes_repeat_and_transition_each_time() {
    let ao = AoConfig { blur_passes: 2, ..AoConfig::default() };
    let graph = CompiledGraph::compile(&PassConfig::default(), &ao).unwrap();
    let names = graph.step_names();
    assert_eq!(names.iter().filter(|n| **n == "ao_blur_h").count(), 2);
    assert_eq!(names.iter().filter(|n| **n == "ao_blur_v").count(), 2);

    // Every horizontal blur samples what the previous step rendered
    for step in graph.steps().iter().filter(|s| s.step().kind() == StepKind::AoBlurHorizontal) {
        assert!(step.barriers().contains(&Barrier {
            resource: ResourceId::AoRaw,
            before: ResourceState::ColorTarget,
            after: ResourceState::ShaderRead,
        }));
    }
}

#[test]
fn test_forward_uses_depth_read_only() {
    let graph = compile(PassConfig::default());
    let forward = graph.step(StepKind::Forward).unwrap();
    assert!(forward.barriers().contains(&Barrier {
        resource: ResourceId::Depth,
        before: ResourceState::ShaderRead,
        after: ResourceState::DepthRead,
    }));
    // Scene color is already a color target after the composite
    assert!(!forward.barriers().iter().any(|b| b.resource == ResourceId::SceneColor));
}

#[test]
fn test_transients_listed_in_first_use_order() {
    let graph = compile(PassConfig::default());
    assert_eq!(graph.resources()[0], ResourceId::ShadowAtlas);
    assert_eq!(graph.resources()[1], ResourceId::GBufferAlbedo);
    assert!(!graph.resources().contains(&ResourceId::Backbuffer));
    assert!(graph.resources().contains(&ResourceId::BloomScratch));
}

#[test]
fn test_read_before_write_rejected() {
    let steps = vec![
        RenderStep::new(StepKind::Lighting)
            .read(ResourceId::GBufferAlbedo, ResourceState::ShaderRead)
            .write(ResourceId::SceneColor, ResourceState::ColorTarget),
    ];
    assert!(CompiledGraph::from_steps(steps, ResourceId::SceneColor).is_err());
}

#[test]
fn test_invalid_access_states_rejected() {
    let write_as_read = vec![
        RenderStep::new(StepKind::GBuffer).write(ResourceId::Depth, ResourceState::ShaderRead),
    ];
    assert!(CompiledGraph::from_steps(write_as_read, ResourceId::SceneColor).is_err());

    let read_as_write = vec![
        RenderStep::new(StepKind::GBuffer).write(ResourceId::Depth, ResourceState::DepthWrite),
        RenderStep::new(StepKind::Ssao)
            .read(ResourceId::Depth, ResourceState::ColorTarget)
            .write(ResourceId::AoRaw, ResourceState::ColorTarget),
    ];
    assert!(CompiledGraph::from_steps(read_as_write, ResourceId::SceneColor).is_err());
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_new_creates_transients_and_pipelines() {
    let mut device = HeadlessDevice::new();
    let probe = device.probe();
    let graph = RenderPassGraph::new(&mut device, &small_config(), TextureFormat::B8G8R8A8_SRGB).unwrap();

    assert_eq!(graph.targets().len(), graph.compiled().resources().len());
    assert_eq!(graph.targets().texture(ResourceId::ShadowAtlas).unwrap().info().width, 128);
    assert_eq!(graph.targets().texture(ResourceId::BloomScratch).unwrap().info().width, 32);
    // Fullscreen steps and the overlay own a pipeline; shadow, gbuffer and forward draw material pipelines
    let owned = graph
        .compiled()
        .steps()
        .iter()
        .filter(|s| !matches!(
            s.step().kind(),
            StepKind::Shadow | StepKind::GBuffer | StepKind::Forward | StepKind::PresentCopy | StepKind::Present
        ))
        .count() as u64;
    assert_eq!(probe.pipelines_created(), owned);
}

#[test]
fn test_execute_records_balanced_passes() {
    let mut device = HeadlessDevice::new();
    let mut graph = RenderPassGraph::new(&mut device, &small_config(), TextureFormat::B8G8R8A8_SRGB).unwrap();
    let scene = SceneGraph::new(2);
    let mut builder = RenderQueueBuilder::new();
    let queues = builder.build(&scene, 64, 32);
    let constants = HeadlessBuffer::new("constants", 256);
    let image = backbuffer();

    let mut cmd = HeadlessCommandList::new();
    cmd.begin().unwrap();
    let reports = graph
        .execute(
            FrameInputs {
                cmd: &mut cmd,
                queues,
                shadow_views: &[],
                constants: &constants,
                backbuffer: &image,
                scene: &scene,
            },
            &mut None,
        )
        .unwrap();
    cmd.end().unwrap();

    assert_eq!(reports.len(), graph.compiled().steps().len());
    let commands = cmd.commands();
    let begins = commands.iter().filter(|c| c.starts_with("begin_render_pass")).count();
    let ends = commands.iter().filter(|c| *c == "end_render_pass").count();
    assert_eq!(begins, ends);
    assert_eq!(begins, graph.compiled().steps().len() - 2);
    assert!(commands.contains(&"begin_render_pass gbuffer clear".to_string()));
    assert!(commands.contains(&"begin_render_pass forward load".to_string()));
    assert!(commands.contains(&"copy_texture post_pong->backbuffer0".to_string()));
    assert_eq!(commands.last().unwrap(), "transition backbuffer0 ColorTarget->Present");
    // Lighting is a fullscreen triangle
    assert_eq!(reports.iter().find(|r| r.name == "lighting").unwrap().draws, 1);
}

struct CountingOverlay {
    calls: u32,
}

impl Overlay for CountingOverlay {
    fn record(&mut self, cmd: &mut dyn CommandList, _viewport: Viewport, _scene: &SceneGraph) -> Result<()> {
        self.calls += 1;
        cmd.draw(3, 0)
    }
}

#[test]
fn test_overlay_callback_runs_inside_overlay_pass() {
    let mut device = HeadlessDevice::new();
    let mut graph = RenderPassGraph::new(&mut device, &small_config(), TextureFormat::B8G8R8A8_SRGB).unwrap();
    let scene = SceneGraph::new(2);
    let mut builder = RenderQueueBuilder::new();
    let queues = builder.build(&scene, 64, 32);
    let constants = HeadlessBuffer::new("constants", 256);
    let image = backbuffer();
    let mut overlay = CountingOverlay { calls: 0 };

    let mut cmd = HeadlessCommandList::new();
    cmd.begin().unwrap();
    {
        let mut slot: Option<&mut dyn Overlay> = Some(&mut overlay);
        graph
            .execute(
                FrameInputs {
                    cmd: &mut cmd,
                    queues,
                    shadow_views: &[],
                    constants: &constants,
                    backbuffer: &image,
                    scene: &scene,
                },
                &mut slot,
            )
            .unwrap();
    }
    assert_eq!(overlay.calls, 1);

    let commands = cmd.commands();
    let begin = commands.iter().position(|c| c == "begin_render_pass overlay load").unwrap();
    let end = begin + commands[begin..].iter().position(|c| c == "end_render_pass").unwrap();
    assert!(commands[begin..end].contains(&"draw 3 0".to_string()));
}

#[test]
fn test_reconfigure_and_reload() {
    let mut device = HeadlessDevice::new();
    let probe = device.probe();
    let mut graph = RenderPassGraph::new(&mut device, &small_config(), TextureFormat::B8G8R8A8_SRGB).unwrap();

    graph
        .reconfigure(&mut device, passes(false, false, false, PostEffects::empty()))
        .unwrap();
    assert_eq!(graph.compiled().final_color(), ResourceId::SceneColor);
    assert!(graph.targets().texture(ResourceId::ShadowAtlas).is_none());

    let before = probe.pipelines_created();
    graph.reload_pipelines(&mut device).unwrap();
    // lighting + overlay
    assert_eq!(probe.pipelines_created() - before, 2);
}

#[test]
fn test_resize_recreates_targets() {
    let mut device = HeadlessDevice::new();
    let mut graph = RenderPassGraph::new(&mut device, &small_config(), TextureFormat::B8G8R8A8_SRGB).unwrap();
    graph.resize(&mut device, 200, 100).unwrap();
    assert_eq!(graph.targets().extent(), (200, 100));
    assert_eq!(graph.targets().texture(ResourceId::SceneColor).unwrap().info().height, 100);
    assert!(graph.resize(&mut device, 0, 100).is_err());
}

#[test]
fn test_prepare_shadows_disabled_is_empty() {
    let mut device = HeadlessDevice::new();
    let mut config = small_config();
    config.passes.shadows = false;
    let graph = RenderPassGraph::new(&mut device, &config, TextureFormat::B8G8R8A8_SRGB).unwrap();
    let builder = RenderQueueBuilder::new();
    assert!(graph.prepare_shadows(builder.queues(), 16).is_empty());
}

#[test]
fn test_prepare_shadows_skips_lights_over_budget() {
    let mut device = HeadlessDevice::new();
    let graph = RenderPassGraph::new(&mut device, &small_config(), TextureFormat::B8G8R8A8_SRGB).unwrap();
    let mut scene = SceneGraph::new(2);
    let root = scene.root();
    for name in ["spot_a", "spot_b"] {
        let object = scene.spawn(root, name).unwrap();
        scene.add_component(object, Light::spot(Vec3::ONE, 1.0, 10.0, 0.3, 0.5)).unwrap();
    }
    scene.validate_hierarchy();
    let mut builder = RenderQueueBuilder::new();
    let queues = builder.build(&scene, 64, 32);
    assert_eq!(queues.lights().len(), 2);

    let views = graph.prepare_shadows(queues, 1);
    assert_eq!(views.len(), 1);
    assert!(views.iter().all(|v| v.light == 0));
    assert_eq!(graph.prepare_shadows(queues, 2).len(), 2);
}

#[test]
fn test_only_presentation_steps_run_outside_render_passes() {
    let graph = compile(PassConfig::default());
    let outside: Vec<&str> = graph
        .steps()
        .iter()
        .filter(|s| !s.step().kind().is_render_pass())
        .map(|s| s.step().name())
        .collect();
    assert_eq!(outside, vec!["present_copy", "present"]);
}
