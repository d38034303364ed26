/// Unit tests for the headless backend.

use super::*;
use crate::graphics_device::{BufferUsage, ClearValue, ResourceState};
use std::thread;
use std::time::Duration;

fn texture(name: &str) -> HeadlessTexture {
    HeadlessTexture::new(TextureDesc {
        name: name.to_string(),
        width: 4,
        height: 4,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::SampledAndRenderTarget,
    })
}

// ============================================================================
// Fence Tests
// ============================================================================

#[test]
fn test_auto_fence_completes_on_signal() {
    let mut device = HeadlessDevice::new();
    let fence = device.fence();
    assert_eq!(fence.completed_value(), 0);

    device.signal(1).unwrap();
    assert_eq!(fence.completed_value(), 1);
    fence.wait(1).unwrap();
}

#[test]
fn test_manual_fence_holds_until_completed() {
    let mut device = HeadlessDevice::with_manual_fence();
    let probe = device.probe();
    device.signal(1).unwrap();
    device.signal(2).unwrap();

    assert_eq!(device.fence().completed_value(), 0);
    probe.fence().complete_up_to(1);
    assert_eq!(device.fence().completed_value(), 1);

    // Completion never runs past the last signal
    probe.fence().complete_up_to(10);
    assert_eq!(device.fence().completed_value(), 2);
}

#[test]
fn test_fence_signal_must_increase() {
    let mut device = HeadlessDevice::new();
    device.signal(3).unwrap();
    assert!(device.signal(3).is_err());
    assert!(device.signal(2).is_err());
}

#[test]
fn test_wait_on_unsignaled_value_fails() {
    let device = HeadlessDevice::with_manual_fence();
    let result = device.fence().wait(1);
    assert!(matches!(result, Err(Error::BackendError(_))));
}

#[test]
fn test_wait_blocks_until_other_thread_completes() {
    let mut device = HeadlessDevice::with_manual_fence();
    let probe = device.probe();
    device.signal(1).unwrap();

    let gpu = {
        let fence = Arc::clone(probe.fence());
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            fence.complete_up_to(1);
        })
    };

    device.fence().wait(1).unwrap();
    assert_eq!(probe.fence().blocking_waits(), 1);
    gpu.join().unwrap();
}

// ============================================================================
// Buffer / Texture Tests
// ============================================================================

#[test]
fn test_buffer_update_bounds() {
    let buffer = HeadlessBuffer::new("constants", 8);
    buffer.update(4, &[1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.contents(), vec![0, 0, 0, 0, 1, 2, 3, 4]);
    assert!(matches!(buffer.update(6, &[0; 4]), Err(Error::InvalidResource(_))));
}

#[test]
fn test_device_rejects_empty_resources() {
    let mut device = HeadlessDevice::new();
    let buffer = device.create_buffer(BufferDesc {
        name: "empty".to_string(),
        size: 0,
        usage: BufferUsage::Constant,
    });
    assert!(buffer.is_err());

    let tex = device.create_texture(TextureDesc {
        name: "flat".to_string(),
        width: 0,
        height: 16,
        format: TextureFormat::R8_UNORM,
        usage: TextureUsage::Sampled,
    });
    assert!(tex.is_err());
}

#[test]
fn test_pipeline_ids_are_unique() {
    let mut device = HeadlessDevice::new();
    let desc = PipelineDesc {
        name: "lighting".to_string(),
        kind: crate::graphics_device::PipelineKind::Fullscreen,
        color_formats: vec![TextureFormat::R16G16B16A16_SFLOAT],
        depth_format: None,
    };
    let a = device.create_pipeline(&desc).unwrap();
    let b = device.create_pipeline(&desc).unwrap();
    assert_ne!(a, b);
    assert_eq!(device.probe().pipelines_created(), 2);
}

// ============================================================================
// CommandList Tests
// ============================================================================

#[test]
fn test_command_list_records_commands() {
    let color = texture("color");
    let mut cmd = HeadlessCommandList::new();
    cmd.begin().unwrap();
    cmd.transition(&TextureBarrier {
        texture: &color,
        before: ResourceState::Undefined,
        after: ResourceState::ColorTarget,
    })
    .unwrap();
    cmd.begin_render_pass(&RenderPassBegin {
        label: "test",
        color_targets: &[&color],
        depth_target: None,
        depth_read_only: false,
        load_op: LoadOp::Clear,
        clear: ClearValue::default(),
    })
    .unwrap();
    cmd.draw(3, 0).unwrap();
    cmd.end_render_pass().unwrap();
    cmd.end().unwrap();

    assert_eq!(
        cmd.commands(),
        &[
            "transition color Undefined->ColorTarget".to_string(),
            "begin_render_pass test clear".to_string(),
            "draw 3 0".to_string(),
            "end_render_pass".to_string(),
        ]
    );
}

#[test]
fn test_command_list_rejects_misplaced_commands() {
    let color = texture("color");
    let mut cmd = HeadlessCommandList::new();

    // Not recording
    assert!(cmd.draw(3, 0).is_err());

    cmd.begin().unwrap();
    // Draw outside a pass
    assert!(cmd.draw(3, 0).is_err());

    cmd.begin_render_pass(&RenderPassBegin {
        label: "p",
        color_targets: &[&color],
        depth_target: None,
        depth_read_only: false,
        load_op: LoadOp::Load,
        clear: ClearValue::default(),
    })
    .unwrap();
    // Transition and copy inside a pass
    let barrier = TextureBarrier {
        texture: &color,
        before: ResourceState::ColorTarget,
        after: ResourceState::ShaderRead,
    };
    assert!(cmd.transition(&barrier).is_err());
    assert!(cmd.copy_texture(&color, &color).is_err());
    // End with an open pass
    assert!(cmd.end().is_err());
}

#[test]
fn test_reset_clears_commands() {
    let mut cmd = HeadlessCommandList::new();
    cmd.begin().unwrap();
    assert!(cmd.reset().is_err());
    cmd.end().unwrap();
    cmd.reset().unwrap();
    assert!(cmd.commands().is_empty());
    assert_eq!(cmd.reset_count(), 1);
}

#[test]
fn test_submit_journal() {
    let mut device = HeadlessDevice::new();
    let probe = device.probe();
    let mut cmd = device.create_command_list().unwrap();

    cmd.begin().unwrap();
    assert!(device.submit(cmd.as_ref()).is_err());
    cmd.end().unwrap();
    device.submit(cmd.as_ref()).unwrap();
    device.signal(1).unwrap();

    assert_eq!(
        probe.journal(),
        vec![Submission::Commands(Vec::new()), Submission::Signal(1)]
    );
}

// ============================================================================
// Surface Tests
// ============================================================================

#[test]
fn test_surface_acquire_present_cycle() {
    let mut surface = HeadlessSurface::new(64, 32);
    let presented = surface.present_counter();

    assert!(surface.present().is_err());
    let first = surface.acquire_next_image().unwrap();
    assert!(surface.acquire_next_image().is_err());
    surface.present().unwrap();
    let second = surface.acquire_next_image().unwrap();
    surface.present().unwrap();

    assert_ne!(first.info().name, second.info().name);
    assert_eq!(first.info().width, 64);
    assert_eq!(presented.load(Ordering::SeqCst), 2);
}

#[test]
fn test_surface_resize() {
    let mut surface = HeadlessSurface::new(64, 32);
    surface.resize(128, 96).unwrap();
    assert_eq!((surface.width(), surface.height()), (128, 96));
    let image = surface.acquire_next_image().unwrap();
    assert_eq!(image.info().height, 96);
    assert!(surface.resize(0, 10).is_err());
}
