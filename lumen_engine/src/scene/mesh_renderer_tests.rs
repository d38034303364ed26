//! Unit tests for mesh_renderer.rs

use std::sync::Arc;
use glam::Vec3;
use crate::graphics_device::headless::HeadlessBuffer;
use crate::graphics_device::{IndexType, PipelineStateId};
use crate::resource::{Aabb, Material, Mesh, MeshDesc, RenderGroup, SubMesh};
use super::{MeshRenderer, RendererKind};

fn cube() -> Arc<Mesh> {
    Arc::new(Mesh::new(MeshDesc {
        name: "cube".to_string(),
        vertex_buffer: Arc::new(HeadlessBuffer::new("cube_vb", 256)),
        index_buffer: Arc::new(HeadlessBuffer::new("cube_ib", 144)),
        index_type: IndexType::U32,
        submeshes: vec![SubMesh { first_index: 0, index_count: 36, vertex_offset: 0 }],
        bounds: Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)),
    }).unwrap())
}

#[test]
fn test_shadow_default_depends_on_kind() {
    assert!(MeshRenderer::new(RendererKind::Mesh, None, Vec::new()).casts_shadows());
    assert!(MeshRenderer::new(RendererKind::RiggedMesh, None, Vec::new()).casts_shadows());
    assert!(!MeshRenderer::new(RendererKind::Prop, None, Vec::new()).casts_shadows());
    assert!(MeshRenderer::new(RendererKind::Prop, None, Vec::new()).with_shadows(true).casts_shadows());
}

#[test]
fn test_set_mesh_swaps_and_clears() {
    let mut renderer = MeshRenderer::new(RendererKind::Mesh, None, Vec::new());
    assert!(renderer.mesh().is_none());
    renderer.set_mesh(Some(cube()));
    assert_eq!(renderer.mesh().unwrap().name(), "cube");
    renderer.set_mesh(None);
    assert!(renderer.mesh().is_none());
}

#[test]
fn test_set_material_grows_slots() {
    let mut renderer = MeshRenderer::new(RendererKind::Mesh, Some(cube()), Vec::new());
    let material = Arc::new(Material::new("paint", RenderGroup::Deferred, PipelineStateId(4)));
    renderer.set_material(2, Some(material));
    assert_eq!(renderer.materials().len(), 3);
    assert!(renderer.material(0).is_none());
    assert_eq!(renderer.material(2).unwrap().name(), "paint");
}

#[test]
fn test_animation_speed_scales_rigged_clock() {
    let mut rigged = MeshRenderer::new(RendererKind::RiggedMesh, None, Vec::new()).with_animation_speed(2.0);
    rigged.advance(0.25);
    rigged.advance(0.25);
    assert_eq!(rigged.animation_time(), 1.0);

    let mut still = MeshRenderer::new(RendererKind::Mesh, None, Vec::new()).with_animation_speed(2.0);
    still.advance(0.25);
    assert_eq!(still.animation_time(), 0.0);
}
