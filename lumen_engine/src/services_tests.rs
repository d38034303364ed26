//! Unit tests for services.rs

use std::sync::Arc;
use glam::{Vec2, Vec3};
use crate::graphics_device::headless::HeadlessBuffer;
use crate::graphics_device::{IndexType, PipelineStateId};
use crate::resource::{Aabb, Material, Mesh, MeshDesc, RenderGroup, SubMesh};
use crate::scene::{MeshRenderer, RendererKind};
use crate::services::{
    AssetSource, AudioListener, InputState, KeyCode, MemoryAssets, NoAudio, NoInput, PointerButton, Services,
};

fn triangle() -> Arc<Mesh> {
    Arc::new(Mesh::new(MeshDesc {
        name: "triangle".to_string(),
        vertex_buffer: Arc::new(HeadlessBuffer::new("triangle_vb", 96)),
        index_buffer: Arc::new(HeadlessBuffer::new("triangle_ib", 12)),
        index_type: IndexType::U32,
        submeshes: vec![SubMesh { first_index: 0, index_count: 3, vertex_offset: 0 }],
        bounds: Aabb::new(Vec3::ZERO, Vec3::ONE),
    }).unwrap())
}

// ============================================================================
// ASSETS
// ============================================================================

#[test]
fn test_memory_assets_lookup() {
    let mut assets = MemoryAssets::new();
    assets.insert_mesh("triangle", triangle());
    assets.insert_material("flat", Arc::new(Material::new("flat", RenderGroup::Deferred, PipelineStateId(1))));

    assert_eq!(assets.load_mesh("triangle").unwrap().name(), "triangle");
    assert_eq!(assets.load_material("flat").unwrap().pipeline(), PipelineStateId(1));
    assert!(assets.load_mesh("missing").is_none());
    assert!(assets.load_material("missing").is_none());
}

#[test]
fn test_renderer_from_assets_keeps_missing_slots() {
    let mut assets = MemoryAssets::new();
    assets.insert_mesh("triangle", triangle());
    assets.insert_material("flat", Arc::new(Material::new("flat", RenderGroup::Forward, PipelineStateId(2))));

    let renderer = MeshRenderer::from_assets(RendererKind::Mesh, &assets, "triangle", &["flat", "gone"]);
    assert!(renderer.mesh().is_some());
    assert_eq!(renderer.materials().len(), 2);
    assert!(renderer.material(0).is_some());
    assert!(renderer.material(1).is_none());

    let unresolved = MeshRenderer::from_assets(RendererKind::Prop, &assets, "gone", &[]);
    assert!(unresolved.mesh().is_none());
    assert!(!unresolved.casts_shadows());
}

// ============================================================================
// NULL COLLABORATORS
// ============================================================================

#[test]
fn test_no_input_reports_nothing_pressed() {
    let input = NoInput;
    assert!(!input.is_key_down(KeyCode(32)));
    assert!(!input.is_pointer_button_down(PointerButton::Left));
    assert_eq!(input.pointer_position(), Vec2::ZERO);
}

#[test]
fn test_services_start_without_overlay() {
    let input = NoInput;
    let mut audio = NoAudio;
    audio.update_listener(Vec3::ONE, glam::Quat::IDENTITY);
    let services = Services::new(&input, &mut audio);
    assert!(services.overlay.is_none());
}
