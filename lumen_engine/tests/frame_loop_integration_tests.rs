//! Integration tests for the frame loop on the headless backend
//!
//! These tests drive whole frames through FrameLoop: scene update, queue
//! build, pass graph recording, submission and fence pacing.
//! No GPU required.
//!
//! Run with: cargo test --test frame_loop_integration_tests

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use lumen_engine::glam::{Vec2, Vec3};
use lumen_engine::lumen::camera::Camera;
use lumen_engine::lumen::device::headless::{HeadlessBuffer, HeadlessDevice, HeadlessProbe, HeadlessSurface};
use lumen_engine::lumen::device::{Fence, IndexType, PipelineStateId};
use lumen_engine::lumen::render::ResourceId;
use lumen_engine::lumen::resource::{Aabb, Material, Mesh, MeshDesc, RenderGroup, SubMesh};
use lumen_engine::lumen::scene::{GuiElement, MeshRenderer, RendererKind, SceneGraph};
use lumen_engine::lumen::services::{NoAudio, NoInput, Services};
use lumen_engine::lumen::{EngineConfig, FrameLoop, PassConfig, PostEffects};

// ============================================================================
// HELPERS
// ============================================================================

fn config() -> EngineConfig {
    let mut config = EngineConfig { width: 64, height: 32, ..EngineConfig::default() };
    config.shadows.atlas_size = 256;
    config
}

fn create_loop(manual_fence: bool) -> (FrameLoop, HeadlessProbe) {
    let device = if manual_fence { HeadlessDevice::with_manual_fence() } else { HeadlessDevice::new() };
    let probe = device.probe();
    let frame_loop = FrameLoop::new(config(), Box::new(device), Box::new(HeadlessSurface::new(64, 32)))
        .expect("frame loop creation");
    (frame_loop, probe)
}

fn cube_renderer() -> MeshRenderer {
    let mesh = Arc::new(
        Mesh::new(MeshDesc {
            name: "cube".to_string(),
            vertex_buffer: Arc::new(HeadlessBuffer::new("cube_vb", 24 * 32)),
            index_buffer: Arc::new(HeadlessBuffer::new("cube_ib", 36 * 2)),
            index_type: IndexType::U16,
            submeshes: vec![SubMesh { first_index: 0, index_count: 36, vertex_offset: 0 }],
            bounds: Aabb::new(Vec3::splat(-0.5), Vec3::splat(0.5)),
        })
        .unwrap(),
    );
    let material = Arc::new(
        Material::new("stone", RenderGroup::Deferred, PipelineStateId(100))
            .with_shadow_pipeline(PipelineStateId(101)),
    );
    MeshRenderer::new(RendererKind::Mesh, Some(mesh), vec![Some(material)])
}

/// Scene with a camera at (0, 0, 10) looking down -Z.
fn scene_with_camera() -> SceneGraph {
    let mut scene = SceneGraph::new(2);
    let camera = scene.spawn(scene.root(), "camera").unwrap();
    scene.set_local_position(camera, Vec3::new(0.0, 0.0, 10.0)).unwrap();
    scene.add_component(camera, Camera::perspective(1.0, 0.1, 100.0)).unwrap();
    scene
}

// ============================================================================
// END-TO-END SCENARIO
// ============================================================================

#[test]
fn test_integration_hierarchy_visibility_and_deferred_free() {
    let (mut frame_loop, probe) = create_loop(true);
    let mut scene = scene_with_camera();
    let root = scene.root();
    let a = scene.spawn(root, "A").unwrap();
    scene.set_local_position(a, Vec3::new(1.0, 0.0, 0.0)).unwrap();
    let b = scene.spawn(a, "B").unwrap();
    scene.set_local_position(b, Vec3::new(0.0, 1.0, 0.0)).unwrap();
    scene.add_component(b, cube_renderer()).unwrap();

    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);

    // Frame 1 (slot 0, fence 1): B is drawn at (1, 1, 0)
    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    assert_eq!((report.slot, report.fence_value), (0, 1));
    assert!(scene.world_position(b).unwrap().abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-5));
    assert_eq!(frame_loop.queues().drawables().len(), 1);
    assert_eq!(report.step("gbuffer").unwrap().draws, 1);

    // Frame 2 (slot 1, fence 2): deactivating A hides B
    scene.set_active(a, false).unwrap();
    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    assert_eq!((report.slot, report.fence_value), (1, 2));
    assert!(frame_loop.queues().drawables().is_empty());
    assert_eq!(report.step("gbuffer").unwrap().draws, 0);

    // Slot 0 finished; B is destroyed during frame 3, which signals fence 3
    probe.fence().complete_up_to(1);
    scene.destroy(b).unwrap();
    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    assert_eq!((report.slot, report.fence_value), (0, 3));
    assert!(scene.object(b).is_some(), "B must survive while frame 3 is in flight");
    assert_eq!(scene.freed_object_count(), 0);

    // Fence 2 completing is not enough
    probe.fence().complete_up_to(2);
    frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    assert!(scene.object(b).is_some());

    // Once fence 3 completes the next frame releases it
    probe.fence().complete_up_to(3);
    frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    assert!(scene.object(b).is_none());
    assert_eq!(scene.freed_object_count(), 1);

    probe.fence().complete_all();
    frame_loop.shutdown(&mut scene).unwrap();
}

// ============================================================================
// RING SATURATION
// ============================================================================

#[test]
fn test_integration_ring_saturation_blocks_until_oldest_slot_completes() {
    let (mut frame_loop, probe) = create_loop(true);
    let mut scene = SceneGraph::new(2);
    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);

    frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    assert_eq!(probe.fence().blocking_waits(), 0);

    let gpu = Arc::clone(probe.fence());
    let releaser = thread::spawn(move || {
        thread::sleep(Duration::from_millis(50));
        gpu.complete_up_to(1);
    });

    let start = Instant::now();
    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    releaser.join().unwrap();

    assert!(start.elapsed() >= Duration::from_millis(40));
    assert_eq!(report.slot, 0);
    assert_eq!(probe.fence().blocking_waits(), 1);
    // Only the oldest slot was released
    assert_eq!(probe.fence().completed_value(), 1);
    assert_eq!(frame_loop.ring().stall_count(), 1);

    probe.fence().complete_all();
    frame_loop.shutdown(&mut scene).unwrap();
}

// ============================================================================
// PASS-THROUGH
// ============================================================================

#[test]
fn test_integration_presented_resource_follows_enabled_stages() {
    let cases = [
        (PostEffects::empty(), ResourceId::SceneColor, "scene_color"),
        (PostEffects::BLOOM, ResourceId::PostPing, "post_ping"),
        (PostEffects::BLOOM | PostEffects::OUTLINE, ResourceId::PostPong, "post_pong"),
        (PostEffects::all(), ResourceId::PostPong, "post_pong"),
    ];
    let (mut frame_loop, probe) = create_loop(false);
    let mut scene = scene_with_camera();
    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);

    for (effects, expected, name) in cases {
        frame_loop
            .reconfigure(PassConfig { post_effects: effects, ..PassConfig::default() })
            .unwrap();
        let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
        assert_eq!(report.presented_from, expected, "{:?}", effects);

        let commands = probe.last_commands();
        let copy = commands.iter().position(|c| c.starts_with("copy_texture")).unwrap();
        assert!(commands[copy].starts_with(&format!("copy_texture {}->", name)));
        // Made readable right before the copy
        assert!(commands[..copy].iter().rev().any(|c| c.starts_with(&format!("transition {} ", name))
            && c.ends_with("->CopySource")));
    }
}

#[test]
fn test_integration_everything_disabled_still_presents() {
    let (mut frame_loop, probe) = create_loop(false);
    frame_loop
        .reconfigure(PassConfig {
            shadows: false,
            ambient_occlusion: false,
            forward: false,
            post_effects: PostEffects::empty(),
        })
        .unwrap();
    let mut scene = scene_with_camera();
    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);

    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    assert_eq!(report.step_names(), vec!["gbuffer", "lighting", "present_copy", "overlay", "present"]);
    assert_eq!(report.presented_from, ResourceId::SceneColor);
    assert_eq!(probe.last_commands().last().map(String::as_str), Some("transition backbuffer0 ColorTarget->Present"));
}

// ============================================================================
// QUEUES AND CULLING
// ============================================================================

#[test]
fn test_integration_queues_identical_across_unchanged_frames() {
    let (mut frame_loop, _probe) = create_loop(false);
    let mut scene = scene_with_camera();
    for i in 0..4 {
        let object = scene.spawn(scene.root(), format!("cube{}", i)).unwrap();
        scene.set_local_position(object, Vec3::new(i as f32, 0.0, 0.0)).unwrap();
        scene.add_component(object, cube_renderer()).unwrap();
    }
    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);

    frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    let first = frame_loop.queues().group(RenderGroup::Deferred).buckets().to_vec();
    frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();
    let second = frame_loop.queues().group(RenderGroup::Deferred).buckets().to_vec();

    assert_eq!(first, second);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].entries().len(), 4);
}

#[test]
fn test_integration_objects_behind_camera_are_culled() {
    let (mut frame_loop, _probe) = create_loop(false);
    let mut scene = scene_with_camera();
    let front = scene.spawn(scene.root(), "front").unwrap();
    scene.add_component(front, cube_renderer()).unwrap();
    let behind = scene.spawn(scene.root(), "behind").unwrap();
    scene.set_local_position(behind, Vec3::new(0.0, 0.0, 30.0)).unwrap();
    scene.add_component(behind, cube_renderer()).unwrap();

    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);
    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();

    let gbuffer = report.step("gbuffer").unwrap();
    assert_eq!(gbuffer.draws, 1);
    assert_eq!(gbuffer.culled, 1);
}

#[test]
fn test_integration_missing_material_skips_draw() {
    let (mut frame_loop, _probe) = create_loop(false);
    let mut scene = scene_with_camera();
    let object = scene.spawn(scene.root(), "unfinished").unwrap();
    let mut renderer = cube_renderer();
    renderer.set_material(0, None);
    scene.add_component(object, renderer).unwrap();

    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);
    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();

    assert_eq!(report.skipped_submeshes, 1);
    assert_eq!(report.step("gbuffer").unwrap().draws, 0);
}

#[test]
fn test_integration_gui_drawn_in_overlay() {
    let (mut frame_loop, probe) = create_loop(false);
    let mut scene = SceneGraph::new(2);
    let hud = scene.spawn(scene.root(), "hud").unwrap();
    scene.add_component(hud, GuiElement::new(Vec2::new(4.0, 4.0), Vec2::new(16.0, 8.0))).unwrap();

    let input = NoInput;
    let mut audio = NoAudio;
    let mut services = Services::new(&input, &mut audio);
    let report = frame_loop.run_frame(&mut scene, &mut services, 0.016).unwrap();

    assert_eq!(report.step("overlay").unwrap().draws, 1);
    let commands = probe.last_commands();
    let overlay = commands.iter().position(|c| c == "begin_render_pass overlay load").unwrap();
    assert!(commands[overlay..].contains(&"draw 6 0".to_string()));
}
