//! Render queues: per-frame snapshot of what the passes draw.
//!
//! Built once per frame after transform validation by a single pre-order
//! walk of the scene. Entries are bucketed by render group and pipeline
//! state; buckets keep first-seen order and entries keep traversal order,
//! so an unchanged scene yields identical queues frame after frame.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use rustc_hash::FxHashMap;

use crate::camera::RenderView;
use crate::graphics_device::PipelineStateId;
use crate::resource::{Aabb, Material, Mesh, RenderGroup};
use crate::engine_debug;
use super::component::{ComponentData, ComponentKey};
use super::gui::GuiElement;
use super::light::Light;
use super::scene_graph::SceneGraph;
use super::scene_object::ObjectKey;

const SOURCE: &str = "lumen::RenderQueue";

/// A renderer resolved for this frame.
pub struct Drawable {
    pub object: ObjectKey,
    pub component: ComponentKey,
    pub world_matrix: Mat4,
    pub world_bounds: Aabb,
    pub mesh: Arc<Mesh>,
    /// One slot per submesh
    pub materials: Vec<Option<Arc<Material>>>,
}

impl Drawable {
    pub fn material(&self, submesh: usize) -> Option<&Arc<Material>> {
        self.materials.get(submesh).and_then(Option::as_ref)
    }
}

/// One submesh of one drawable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderQueueEntry {
    /// Index into `RenderQueues::drawables`
    pub drawable: usize,
    pub submesh: usize,
}

/// Entries sharing one pipeline state.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineBucket {
    pipeline: PipelineStateId,
    entries: Vec<RenderQueueEntry>,
}

impl PipelineBucket {
    pub fn pipeline(&self) -> PipelineStateId {
        self.pipeline
    }

    pub fn entries(&self) -> &[RenderQueueEntry] {
        &self.entries
    }
}

/// Pipeline state -> ordered entries.
#[derive(Debug, Default)]
pub struct BucketMap {
    buckets: Vec<PipelineBucket>,
    index: FxHashMap<PipelineStateId, usize>,
}

impl BucketMap {
    pub fn push(&mut self, pipeline: PipelineStateId, entry: RenderQueueEntry) {
        let slot = match self.index.get(&pipeline) {
            Some(&slot) => slot,
            None => {
                self.buckets.push(PipelineBucket { pipeline, entries: Vec::new() });
                self.index.insert(pipeline, self.buckets.len() - 1);
                self.buckets.len() - 1
            }
        };
        self.buckets[slot].entries.push(entry);
    }

    /// Buckets in first-seen order.
    pub fn buckets(&self) -> &[PipelineBucket] {
        &self.buckets
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(|b| b.entries.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
        self.index.clear();
    }
}

/// Active camera resolved for this frame.
#[derive(Debug, Clone)]
pub struct CameraView {
    pub object: ObjectKey,
    pub component: ComponentKey,
    pub priority: i32,
    pub view: RenderView,
}

/// Active light placed in world space.
#[derive(Debug, Clone)]
pub struct LightView {
    pub object: ObjectKey,
    pub component: ComponentKey,
    pub light: Light,
    pub position: Vec3,
    /// Owner's forward axis
    pub direction: Vec3,
}

#[derive(Default)]
pub struct RenderQueues {
    drawables: Vec<Drawable>,
    groups: [BucketMap; 2],
    shadow_casters: BucketMap,
    cameras: Vec<CameraView>,
    lights: Vec<LightView>,
    gui: Vec<GuiElement>,
    skipped_submeshes: usize,
}

impl RenderQueues {
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    pub fn drawable(&self, index: usize) -> Option<&Drawable> {
        self.drawables.get(index)
    }

    pub fn group(&self, group: RenderGroup) -> &BucketMap {
        &self.groups[group.index()]
    }

    /// Keyed by shadow pipeline state.
    pub fn shadow_casters(&self) -> &BucketMap {
        &self.shadow_casters
    }

    pub fn cameras(&self) -> &[CameraView] {
        &self.cameras
    }

    pub fn lights(&self) -> &[LightView] {
        &self.lights
    }

    /// GUI elements in traversal order.
    pub fn gui(&self) -> &[GuiElement] {
        &self.gui
    }

    /// Submeshes dropped this frame because a resource was missing.
    pub fn skipped_submeshes(&self) -> usize {
        self.skipped_submeshes
    }

    /// Highest-priority camera; the first one in traversal order on ties.
    pub fn main_view(&self) -> Option<&CameraView> {
        self.cameras.iter().fold(None, |best: Option<&CameraView>, camera| match best {
            Some(b) if b.priority >= camera.priority => Some(b),
            _ => Some(camera),
        })
    }

    fn clear(&mut self) {
        self.drawables.clear();
        for group in &mut self.groups {
            group.clear();
        }
        self.shadow_casters.clear();
        self.cameras.clear();
        self.lights.clear();
        self.gui.clear();
        self.skipped_submeshes = 0;
    }
}

/// Rebuilds `RenderQueues` from the scene, reusing allocations.
#[derive(Default)]
pub struct RenderQueueBuilder {
    queues: RenderQueues,
}

impl RenderQueueBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queues(&self) -> &RenderQueues {
        &self.queues
    }

    /// Walk the scene once. World matrices are read from the cache, so
    /// `validate_hierarchy` must have run this frame.
    pub fn build(&mut self, scene: &SceneGraph, width: u32, height: u32) -> &RenderQueues {
        let queues = &mut self.queues;
        queues.clear();

        for object_key in scene.traverse(scene.root()) {
            let Some(object) = scene.object(object_key) else { continue };
            let world = *object.transform().world_matrix();

            for &component_key in object.components() {
                let Some(component) = scene.component(component_key) else { continue };
                if !component.is_active() {
                    continue;
                }
                match component.data() {
                    ComponentData::Renderer(renderer) => {
                        let Some(mesh) = renderer.mesh() else {
                            engine_debug!(SOURCE, "'{}' has no mesh, renderer skipped", object.name());
                            queues.skipped_submeshes += 1;
                            continue;
                        };
                        let drawable = queues.drawables.len();
                        let mut queued = false;
                        for submesh in 0..mesh.submesh_count() {
                            let Some(material) = renderer.material(submesh) else {
                                engine_debug!(SOURCE, "'{}' submesh {} has no material, skipped", object.name(), submesh);
                                queues.skipped_submeshes += 1;
                                continue;
                            };
                            let entry = RenderQueueEntry { drawable, submesh };
                            queues.groups[material.group().index()].push(material.pipeline(), entry);
                            if renderer.casts_shadows() {
                                if let Some(shadow) = material.shadow_pipeline() {
                                    queues.shadow_casters.push(shadow, entry);
                                }
                            }
                            queued = true;
                        }
                        if queued {
                            queues.drawables.push(Drawable {
                                object: object_key,
                                component: component_key,
                                world_matrix: world,
                                world_bounds: mesh.bounds().transformed(&world),
                                mesh: mesh.clone(),
                                materials: renderer.materials().to_vec(),
                            });
                        }
                    }
                    ComponentData::Camera(camera) => queues.cameras.push(CameraView {
                        object: object_key,
                        component: component_key,
                        priority: camera.priority(),
                        view: camera.resolve(&world, width, height),
                    }),
                    ComponentData::Light(light) => queues.lights.push(LightView {
                        object: object_key,
                        component: component_key,
                        light: light.clone(),
                        position: object.transform().world_position(),
                        direction: object.transform().forward(),
                    }),
                    ComponentData::Gui(element) => queues.gui.push(element.clone()),
                    ComponentData::Behaviour(_) => {}
                }
            }
        }

        &self.queues
    }
}

#[cfg(test)]
#[path = "render_queue_tests.rs"]
mod tests;
